//! ISR-safe primitives shared by the pipeline roles and the completion interrupt.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// Interior mutability guarded by a critical section.
///
/// `critical_section::Mutex<RefCell<T>>` behind a closure API, usable from
/// tasks and interrupt handlers alike. Closures must stay short: interrupts
/// are masked while they run.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Like [`with`](Self::with), but `None` on re-entrant access instead of a panic.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }

    /// Run `f` with shared access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| {
            let value = self.inner.borrow_ref(cs);
            f(&value)
        })
    }

    /// Consume the cell.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

// SAFETY: every access goes through `critical_section::with`, which serializes
// tasks and interrupt handlers; `T: Send` because values cross contexts.
unsafe impl<T: Send> Sync for CriticalSectionCell<T> {}

/// Waker slot registered from `poll`, woken from interrupt context.
#[cfg(feature = "async")]
pub struct AtomicWaker {
    waker: CriticalSectionCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl AtomicWaker {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            waker: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker`, replacing any waker that would not wake the same task.
    pub fn register(&self, waker: &Waker) {
        self.waker.with(|slot| match slot {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        });
    }

    /// Wake and forget the stored waker, if any.
    #[inline]
    pub fn wake(&self) {
        if let Some(w) = self.waker.with(Option::take) {
            w.wake();
        }
    }

    /// Whether a waker is stored.
    pub fn is_registered(&self) -> bool {
        self.waker.with_ref(Option::is_some)
    }
}

#[cfg(feature = "async")]
impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

//! Logging shim.
//!
//! Routes to `defmt` when that feature is on, otherwise to `log`, otherwise
//! compiles to nothing. Format strings must stay within the subset both
//! backends understand (`{}`, `{:?}`, `{:#x}`).

#![allow(unused_macros)]

macro_rules! log_event {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($s $(, $x)*);
        #[cfg(all(feature = "log", not(feature = "defmt")))]
        ::log::$level!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "log")))]
        {
            $(let _ = &$x;)*
        }
    }};
}

macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::internal::fmt::log_event!(trace, $($arg)*) };
}

macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::internal::fmt::log_event!(debug, $($arg)*) };
}

macro_rules! log_info {
    ($($arg:tt)*) => { $crate::internal::fmt::log_event!(info, $($arg)*) };
}

macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::internal::fmt::log_event!(warn, $($arg)*) };
}

macro_rules! log_error {
    ($($arg:tt)*) => { $crate::internal::fmt::log_event!(error, $($arg)*) };
}

pub(crate) use {log_debug, log_error, log_event, log_info, log_trace, log_warn};

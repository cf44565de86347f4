//! Descriptor chain construction.
//!
//! [`build_chain`] splits a contiguous source buffer into the minimum number
//! of descriptors, each moving at most `max_units` units. Length and capacity
//! checks happen before anything is written, so a rejected request never
//! leaves a partially built chain behind.

use super::{DescriptorSpec, Link, SourceAddress, TransferDescriptor, UnitSize};
use crate::driver::error::{ChainError, ChainResult};
use crate::internal::constants::MAX_UNITS_PER_DESCRIPTOR;

/// Parameters shared by every descriptor of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChainParams {
    /// Device data register address
    pub destination: usize,
    /// Unit size class
    pub unit_size: UnitSize,
    /// Maximum units per descriptor, `1..=MAX_UNITS_PER_DESCRIPTOR`
    pub max_units: usize,
    /// Swap bytes of each unit in flight
    pub byte_swap: bool,
}

impl ChainParams {
    /// Half-word units, full descriptors, no byte swap.
    #[must_use]
    pub const fn new(destination: usize) -> Self {
        Self {
            destination,
            unit_size: UnitSize::HalfWord,
            max_units: MAX_UNITS_PER_DESCRIPTOR,
            byte_swap: false,
        }
    }

    /// Set the unit size
    #[must_use]
    pub const fn with_unit_size(mut self, unit_size: UnitSize) -> Self {
        self.unit_size = unit_size;
        self
    }

    /// Set the per-descriptor unit limit
    #[must_use]
    pub const fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }

    /// Enable or disable in-flight byte swapping
    #[must_use]
    pub const fn with_byte_swap(mut self, byte_swap: bool) -> Self {
        self.byte_swap = byte_swap;
        self
    }
}

/// Number of descriptors needed for `length_bytes`, or the reason it cannot be built.
pub const fn descriptors_needed(
    length_bytes: usize,
    unit_size: UnitSize,
    max_units: usize,
) -> ChainResult<usize> {
    let unit = unit_size.bytes();
    if length_bytes == 0 || length_bytes % unit != 0 {
        return Err(ChainError::InvalidLength);
    }
    if max_units == 0 || max_units > MAX_UNITS_PER_DESCRIPTOR {
        return Err(ChainError::InvalidUnitCount);
    }
    Ok((length_bytes / unit).div_ceil(max_units))
}

/// Fixed-capacity, ordered descriptor chain.
///
/// Descriptors link to their neighbour by relative offset, so the chain must
/// stay in one contiguous array while the engine executes it.
#[derive(Debug, Clone)]
pub struct DescriptorChain<const N: usize> {
    descriptors: [TransferDescriptor; N],
    len: usize,
}

impl<const N: usize> DescriptorChain<N> {
    /// Empty chain
    #[must_use]
    pub const fn new() -> Self {
        Self {
            descriptors: [TransferDescriptor::EMPTY; N],
            len: 0,
        }
    }

    /// Maximum number of descriptors
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of descriptors in use
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the chain holds no descriptors
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Descriptors in execution order
    #[must_use]
    pub fn as_slice(&self) -> &[TransferDescriptor] {
        &self.descriptors[..self.len]
    }

    /// Iterate descriptors in execution order
    pub fn iter(&self) -> core::slice::Iter<'_, TransferDescriptor> {
        self.as_slice().iter()
    }

    /// Total units across all descriptors
    #[must_use]
    pub fn total_units(&self) -> usize {
        self.iter().map(TransferDescriptor::units).sum()
    }

    /// Total bytes across all descriptors
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.iter().map(TransferDescriptor::byte_len).sum()
    }

    /// Drop all descriptors
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replace the contents with a chain for a new buffer.
    ///
    /// On error the existing chain is left untouched.
    pub fn rebuild(
        &mut self,
        source: usize,
        length_bytes: usize,
        params: &ChainParams,
    ) -> ChainResult<()> {
        let count = descriptors_needed(length_bytes, params.unit_size, params.max_units)?;
        if count > N {
            return Err(ChainError::CapacityExceeded);
        }

        let total_units = length_bytes / params.unit_size.bytes();
        let mut remaining = total_units;
        let mut built = [TransferDescriptor::EMPTY; N];

        for (i, slot) in built.iter_mut().take(count).enumerate() {
            let units = remaining.min(params.max_units);
            remaining -= units;

            *slot = TransferDescriptor::new(DescriptorSpec {
                source: if i == 0 {
                    SourceAddress::Absolute(source)
                } else {
                    SourceAddress::Relative(0)
                },
                destination: params.destination,
                unit_size: params.unit_size,
                units,
                byte_swap: params.byte_swap,
                link: if i + 1 == count { Link::Terminal } else { Link::Next },
            })?;
        }

        self.descriptors = built;
        self.len = count;
        Ok(())
    }
}

impl<const N: usize> Default for DescriptorChain<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> IntoIterator for &'a DescriptorChain<N> {
    type Item = &'a TransferDescriptor;
    type IntoIter = core::slice::Iter<'a, TransferDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Build a chain moving `length_bytes` from `source` to `params.destination`.
pub fn build_chain<const N: usize>(
    source: usize,
    length_bytes: usize,
    params: &ChainParams,
) -> ChainResult<DescriptorChain<N>> {
    let mut chain = DescriptorChain::new();
    chain.rebuild(source, length_bytes, params)?;
    Ok(chain)
}

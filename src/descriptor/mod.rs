//! Transfer descriptors and descriptor chains.
//!
//! A [`TransferDescriptor`] describes one hardware-sized chunk of a memory to
//! peripheral transfer. Descriptors are plain `Copy` values produced by a
//! single validated factory ([`TransferDescriptor::new`]) and are never
//! mutated afterwards; chains are rebuilt as a whole.
//!
//! # Count Encoding
//!
//! The count field of the control word stores the number of units **minus
//! one**. An 11-bit field therefore covers 1 to 2048 units and a descriptor
//! can never describe an empty transfer. [`TransferDescriptor::units`] returns
//! the real count, [`TransferDescriptor::raw_xfer_cnt`] the encoded one.
//!
//! # Addressing
//!
//! The first descriptor of a chain carries an absolute source address. Every
//! following descriptor uses relative addressing with offset zero: the engine
//! continues from where the previous descriptor stopped, because the source
//! pointer has already been incremented past the last unit. The destination
//! (a device data register) is never incremented.

mod chain;

pub use chain::{ChainParams, DescriptorChain, build_chain, descriptors_needed};

use crate::driver::error::{ChainError, ChainResult};
use crate::internal::constants::MAX_UNITS_PER_DESCRIPTOR;
use crate::internal::descriptor_bits::{ctrl, link};

/// Size class of a single transfer unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UnitSize {
    /// 8-bit units
    Byte = 0,
    /// 16-bit units (default, matches the 16-bit sample values)
    #[default]
    HalfWord = 1,
    /// 32-bit units
    Word = 2,
}

impl UnitSize {
    /// Number of bytes in one unit
    #[must_use]
    pub const fn bytes(self) -> usize {
        1 << (self as u8)
    }

    const fn from_field(field: u32) -> Self {
        match field {
            0 => UnitSize::Byte,
            1 => UnitSize::HalfWord,
            _ => UnitSize::Word,
        }
    }
}

/// Source addressing mode of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceAddress {
    /// Absolute memory address
    Absolute(usize),
    /// Offset from where the previous descriptor's source pointer stopped
    Relative(i32),
}

/// What the engine does after a descriptor finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Link {
    /// Load the adjacent descriptor and keep going
    Next,
    /// Stop and raise the channel's completion interrupt
    Terminal,
}

/// Everything needed to construct one [`TransferDescriptor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSpec {
    /// Source address and mode
    pub source: SourceAddress,
    /// Fixed destination (device register)
    pub destination: usize,
    /// Unit size class
    pub unit_size: UnitSize,
    /// Units to move, `1..=MAX_UNITS_PER_DESCRIPTOR`
    pub units: usize,
    /// Swap the bytes of each unit in flight
    pub byte_swap: bool,
    /// Linkage; `Terminal` also requests the completion interrupt
    pub link: Link,
}

/// Linked-list transfer descriptor (CTRL, SRC, DST, LINK).
///
/// Word layout follows the bulk transfer engine. On 32-bit targets the
/// descriptor is 16 bytes and must be word aligned.
#[repr(C)]
#[repr(align(4))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Control: count, unit size, increments, byte swap, done interrupt
    ctrl: u32,
    /// Source address (absolute) or signed offset (relative)
    src: usize,
    /// Destination address
    dst: usize,
    /// Link mode, link enable and relative link address
    link: u32,
}

impl TransferDescriptor {
    /// Size of the descriptor in bytes
    pub const SIZE: usize = core::mem::size_of::<TransferDescriptor>();

    /// Placeholder used to initialize descriptor storage. Never handed to hardware.
    pub(crate) const EMPTY: TransferDescriptor = TransferDescriptor {
        ctrl: 0,
        src: 0,
        dst: 0,
        link: 0,
    };

    /// Build a descriptor, validating the unit count against the count field.
    pub fn new(spec: DescriptorSpec) -> ChainResult<Self> {
        if spec.units == 0 || spec.units > MAX_UNITS_PER_DESCRIPTOR {
            return Err(ChainError::InvalidUnitCount);
        }

        let mut ctrl_word = ctrl::STRUCT_TYPE_XFER
            | (((spec.units as u32 - 1) << ctrl::XFER_CNT_SHIFT) & ctrl::XFER_CNT_MASK)
            | ctrl::BLOCK_SIZE_UNIT1
            | ctrl::REQ_MODE_BLOCK
            | ctrl::IGNORE_SREQ
            | ctrl::SRC_INC_ONE
            | ((spec.unit_size as u32) << ctrl::SIZE_SHIFT)
            | ctrl::DST_INC_NONE;

        if spec.byte_swap {
            ctrl_word |= ctrl::BYTE_SWAP;
        }

        let src = match spec.source {
            SourceAddress::Absolute(addr) => addr,
            SourceAddress::Relative(offset) => {
                ctrl_word |= ctrl::SRC_MODE_REL;
                offset as isize as usize
            }
        };

        let link_word = match spec.link {
            Link::Next => {
                link::LINK_MODE_REL | link::LINK | ((Self::SIZE as u32) & link::LINK_ADDR_MASK)
            }
            Link::Terminal => {
                ctrl_word |= ctrl::DONE_IFS;
                link::LINK_MODE_REL
            }
        };

        Ok(Self {
            ctrl: ctrl_word,
            src,
            dst: spec.destination,
            link: link_word,
        })
    }

    /// Number of units this descriptor moves.
    #[inline(always)]
    #[must_use]
    pub fn units(&self) -> usize {
        self.raw_xfer_cnt() as usize + 1
    }

    /// Encoded count field (units minus one).
    #[inline(always)]
    #[must_use]
    pub fn raw_xfer_cnt(&self) -> u32 {
        (self.ctrl & ctrl::XFER_CNT_MASK) >> ctrl::XFER_CNT_SHIFT
    }

    /// Unit size class.
    #[must_use]
    pub fn unit_size(&self) -> UnitSize {
        UnitSize::from_field((self.ctrl & ctrl::SIZE_MASK) >> ctrl::SIZE_SHIFT)
    }

    /// Bytes moved by this descriptor.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.units() * self.unit_size().bytes()
    }

    /// Whether bytes of each unit are swapped in flight.
    #[inline(always)]
    #[must_use]
    pub fn byte_swap(&self) -> bool {
        (self.ctrl & ctrl::BYTE_SWAP) != 0
    }

    /// Whether the completion interrupt is requested.
    #[inline(always)]
    #[must_use]
    pub fn completion_irq(&self) -> bool {
        (self.ctrl & ctrl::DONE_IFS) != 0
    }

    /// Whether the engine loads the next descriptor afterwards.
    #[inline(always)]
    #[must_use]
    pub fn links_next(&self) -> bool {
        (self.link & link::LINK) != 0
    }

    /// Linkage of this descriptor.
    #[must_use]
    pub fn link(&self) -> Link {
        if self.links_next() {
            Link::Next
        } else {
            Link::Terminal
        }
    }

    /// Source address and mode.
    #[must_use]
    pub fn source(&self) -> SourceAddress {
        if (self.ctrl & ctrl::SRC_MODE_REL) != 0 {
            SourceAddress::Relative(self.src as isize as i32)
        } else {
            SourceAddress::Absolute(self.src)
        }
    }

    /// Destination address.
    #[inline(always)]
    #[must_use]
    pub fn destination(&self) -> usize {
        self.dst
    }

    /// Whether the destination stays fixed (device register).
    #[must_use]
    pub fn destination_fixed(&self) -> bool {
        (self.ctrl & ctrl::DST_INC_MASK) == ctrl::DST_INC_NONE
    }

    /// Relative link offset in bytes (zero for terminal descriptors).
    #[must_use]
    pub fn link_offset(&self) -> usize {
        if self.links_next() {
            (self.link & link::LINK_ADDR_MASK) as usize
        } else {
            0
        }
    }

    /// Get raw CTRL value for debugging.
    #[inline(always)]
    #[must_use]
    pub fn raw_ctrl(&self) -> u32 {
        self.ctrl
    }

    /// Get raw LINK value for debugging.
    #[inline(always)]
    #[must_use]
    pub fn raw_link(&self) -> u32 {
        self.link
    }
}

// Safety: descriptors are plain data; addresses are only dereferenced by hardware.
unsafe impl Send for TransferDescriptor {}
unsafe impl Sync for TransferDescriptor {}

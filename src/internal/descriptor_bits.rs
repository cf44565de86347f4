//! Transfer descriptor bit field constants.
//!
//! Layout of the linked-list transfer descriptor (CTRL, SRC, DST, LINK words)
//! used by the bulk transfer engine. Based on the EFR32 LDMA descriptor format.

#![allow(dead_code)]

// =============================================================================
// CTRL (Descriptor Word 0) - Transfer control
// =============================================================================

/// Control word bit field constants
pub mod ctrl {
    /// Structure type shift (2 bits)
    pub const STRUCT_TYPE_SHIFT: u32 = 0;
    /// Structure type mask
    pub const STRUCT_TYPE_MASK: u32 = 0x3;
    /// Structure type: transfer descriptor
    pub const STRUCT_TYPE_XFER: u32 = 0;
    /// Start transfer on descriptor load instead of the peripheral request
    pub const STRUCT_REQ: u32 = 1 << 3;
    /// Transfer count shift (count minus one)
    pub const XFER_CNT_SHIFT: u32 = 4;
    /// Transfer count mask (11 bits)
    pub const XFER_CNT_MASK: u32 = 0x7FF << 4;
    /// Largest value the transfer count field can hold
    pub const XFER_CNT_MAX: u32 = 0x7FF;
    /// Swap bytes of each unit while transferring
    pub const BYTE_SWAP: u32 = 1 << 15;
    /// Block size shift (4 bits)
    pub const BLOCK_SIZE_SHIFT: u32 = 16;
    /// Block size mask
    pub const BLOCK_SIZE_MASK: u32 = 0xF << 16;
    /// Block size: one unit per arbitration
    pub const BLOCK_SIZE_UNIT1: u32 = 0;
    /// Set the channel DONE flag (and interrupt) when the descriptor completes
    pub const DONE_IFS: u32 = 1 << 20;
    /// Request mode: each request transfers one block
    pub const REQ_MODE_BLOCK: u32 = 0;
    /// Request mode: each request transfers everything
    pub const REQ_MODE_ALL: u32 = 1 << 21;
    /// Decrement loop count
    pub const DEC_LOOP_CNT: u32 = 1 << 22;
    /// Ignore single requests
    pub const IGNORE_SREQ: u32 = 1 << 23;
    /// Source increment shift (2 bits)
    pub const SRC_INC_SHIFT: u32 = 24;
    /// Source increment mask
    pub const SRC_INC_MASK: u32 = 0x3 << 24;
    /// Source increment: one unit per transfer
    pub const SRC_INC_ONE: u32 = 0;
    /// Source increment: none
    pub const SRC_INC_NONE: u32 = 0x3 << 24;
    /// Unit size shift (2 bits)
    pub const SIZE_SHIFT: u32 = 26;
    /// Unit size mask
    pub const SIZE_MASK: u32 = 0x3 << 26;
    /// Destination increment shift (2 bits)
    pub const DST_INC_SHIFT: u32 = 28;
    /// Destination increment mask
    pub const DST_INC_MASK: u32 = 0x3 << 28;
    /// Destination increment: one unit per transfer
    pub const DST_INC_ONE: u32 = 0;
    /// Destination increment: none (device register)
    pub const DST_INC_NONE: u32 = 0x3 << 28;
    /// Source address mode: relative to the previous descriptor
    pub const SRC_MODE_REL: u32 = 1 << 30;
    /// Destination address mode: relative to the previous descriptor
    pub const DST_MODE_REL: u32 = 1 << 31;
}

// =============================================================================
// LINK (Descriptor Word 3) - Linkage
// =============================================================================

/// Link word bit field constants
pub mod link {
    /// Link mode: link address is relative to this descriptor
    pub const LINK_MODE_REL: u32 = 1 << 0;
    /// Load the next descriptor when this one completes
    pub const LINK: u32 = 1 << 1;
    /// Link address mask (word aligned)
    pub const LINK_ADDR_MASK: u32 = !0x3;
}

// =============================================================================
// IF (Interrupt Flag Register)
// =============================================================================

/// Interrupt flag register bit constants
pub mod intflag {
    /// Per-channel DONE flags occupy the low byte
    pub const DONE_MASK: u32 = 0xFF;
    /// Transfer error (bus fault or invalid descriptor)
    pub const ERROR: u32 = 1 << 31;

    /// DONE flag for a channel
    #[inline(always)]
    pub const fn done(channel: u8) -> u32 {
        1 << (channel as u32 & 0x7)
    }
}

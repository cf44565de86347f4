//! Serial stream decoder.
//!
//! Host-side counterpart of the forwarder: scans the raw serial byte
//! stream for the sync token, ignores everything before the first one and
//! turns the bytes after it into big-endian `u16` values, three per line.
//!
//! Bytes pass through a four-byte window before they are released, so a
//! token is never mistaken for data. A token seen later resynchronizes
//! value pairing and line position.
//!
//! ```ignore
//! let mut decoder = StreamDecoder::new();
//! let mut line = heapless::String::<64>::new();
//! for byte in serial {
//!     decoder.feed(byte, |event| {
//!         let _ = event.write_to(&mut line);
//!     });
//! }
//! ```

use core::fmt;

use crate::internal::constants::SYNC_TOKEN_WIRE;

const WINDOW_LEN: usize = SYNC_TOKEN_WIRE.len();
const VALUES_PER_LINE: u8 = 3;

/// Something the decoder recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeEvent {
    /// Sync token found
    Synced,
    /// One data value
    Value {
        /// Big-endian value
        value: u16,
        /// Third value of its line
        end_of_line: bool,
    },
}

impl DecodeEvent {
    /// Render as the text log line format: `"v "`, or `"v\n"` at line end.
    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Self::Synced => Ok(()),
            Self::Value {
                value,
                end_of_line: true,
            } => writeln!(out, "{value}"),
            Self::Value { value, .. } => write!(out, "{value} "),
        }
    }
}

/// Incremental decoder over the forwarded serial stream
#[derive(Debug, Clone)]
pub struct StreamDecoder {
    token: [u8; WINDOW_LEN],
    window: [u8; WINDOW_LEN],
    filled: usize,
    synced: bool,
    high: Option<u8>,
    column: u8,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    /// Decoder looking for the default sync token
    pub const fn new() -> Self {
        Self::with_token(SYNC_TOKEN_WIRE)
    }

    /// Decoder looking for `token`, given in wire order
    pub const fn with_token(token: [u8; WINDOW_LEN]) -> Self {
        Self {
            token,
            window: [0; WINDOW_LEN],
            filled: 0,
            synced: false,
            high: None,
            column: 0,
        }
    }

    /// Whether a token has been seen
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Push one byte; `emit` receives whatever it completes.
    pub fn feed(&mut self, byte: u8, mut emit: impl FnMut(DecodeEvent)) {
        if self.filled == WINDOW_LEN {
            let released = self.window[0];
            self.window.copy_within(1.., 0);
            self.window[WINDOW_LEN - 1] = byte;
            self.release(released, &mut emit);
        } else {
            self.window[self.filled] = byte;
            self.filled += 1;
        }

        if self.filled == WINDOW_LEN && self.window == self.token {
            self.filled = 0;
            self.synced = true;
            self.high = None;
            self.column = 0;
            emit(DecodeEvent::Synced);
        }
    }

    /// Release the bytes still held in the window (end of stream).
    ///
    /// An odd trailing byte stays pending.
    pub fn flush(&mut self, mut emit: impl FnMut(DecodeEvent)) {
        let held = self.window;
        for &byte in &held[..self.filled] {
            self.release(byte, &mut emit);
        }
        self.filled = 0;
    }

    fn release(&mut self, byte: u8, emit: &mut impl FnMut(DecodeEvent)) {
        if !self.synced {
            return;
        }
        let Some(high) = self.high.take() else {
            self.high = Some(byte);
            return;
        };
        self.column += 1;
        let end_of_line = self.column == VALUES_PER_LINE;
        if end_of_line {
            self.column = 0;
        }
        emit(DecodeEvent::Value {
            value: u16::from_be_bytes([high, byte]),
            end_of_line,
        });
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    fn decode(bytes: &[u8]) -> (Vec<DecodeEvent>, StreamDecoder) {
        let mut decoder = StreamDecoder::new();
        let mut events = Vec::new();
        for &byte in bytes {
            decoder.feed(byte, |e| events.push(e));
        }
        (events, decoder)
    }

    fn values(events: &[DecodeEvent]) -> Vec<u16> {
        events
            .iter()
            .filter_map(|e| match e {
                DecodeEvent::Value { value, .. } => Some(*value),
                DecodeEvent::Synced => None,
            })
            .collect()
    }

    #[test]
    fn nothing_before_first_token() {
        let (events, decoder) = decode(&[0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
        assert!(events.is_empty());
        assert!(!decoder.is_synced());
    }

    #[test]
    fn values_follow_the_token() {
        let mut stream = Vec::from([0x11, 0x22]);
        stream.extend_from_slice(&SYNC_TOKEN_WIRE);
        stream.extend_from_slice(&[0x00, 0x01, 0xFF, 0xFF, 0x00, 0x7F, 0x00, 0x02]);

        let (events, mut decoder) = decode(&stream);
        assert_eq!(events[0], DecodeEvent::Synced);
        assert_eq!(
            events[1..],
            [
                DecodeEvent::Value { value: 1, end_of_line: false },
                DecodeEvent::Value { value: 0xFFFF, end_of_line: false },
            ]
        );

        let mut rest = Vec::new();
        decoder.flush(|e| rest.push(e));
        assert_eq!(
            rest,
            [
                DecodeEvent::Value { value: 127, end_of_line: true },
                DecodeEvent::Value { value: 2, end_of_line: false },
            ]
        );
    }

    #[test]
    fn token_bytes_are_never_values() {
        let mut stream = Vec::from(SYNC_TOKEN_WIRE);
        stream.extend_from_slice(&[0x00, 0x05]);
        stream.extend_from_slice(&SYNC_TOKEN_WIRE);
        stream.extend_from_slice(&[0x00, 0x06, 0, 0, 0, 0]);

        let (events, _) = decode(&stream);
        assert_eq!(values(&events), [5, 6]);
        assert_eq!(events.iter().filter(|e| **e == DecodeEvent::Synced).count(), 2);
    }

    #[test]
    fn resync_drops_half_value() {
        let mut stream = Vec::from(SYNC_TOKEN_WIRE);
        stream.push(0xAA);
        stream.extend_from_slice(&SYNC_TOKEN_WIRE);
        stream.extend_from_slice(&[0x12, 0x34, 0, 0, 0, 0]);

        let (events, _) = decode(&stream);
        assert_eq!(values(&events), [0x1234]);
    }

    #[test]
    fn custom_token() {
        let mut decoder = StreamDecoder::with_token([1, 2, 3, 4]);
        let mut synced = false;
        for byte in [9, 1, 2, 3, 4] {
            decoder.feed(byte, |e| synced |= e == DecodeEvent::Synced);
        }
        assert!(synced);
    }

    #[test]
    fn text_rendering() {
        let mut out = heapless::String::<32>::new();
        DecodeEvent::Value { value: 7, end_of_line: false }.write_to(&mut out).unwrap();
        DecodeEvent::Value { value: 65535, end_of_line: true }.write_to(&mut out).unwrap();
        DecodeEvent::Synced.write_to(&mut out).unwrap();
        assert_eq!(out.as_str(), "7 65535\n");
    }
}

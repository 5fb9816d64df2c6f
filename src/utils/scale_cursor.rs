// Copyright (C) 2022-2025 Parity Technologies (UK) Ltd. (admin@parity.io)
// This file is a part of the frame-events-decode crate.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//         http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use parity_scale_codec::{Decode, MaxEncodedLen};

/// An error reading bytes from a [`ScaleCursor`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// Not enough bytes were left to read the requested item.
    #[error("Unexpected end of input at byte {offset}: {needed} more byte(s) needed")]
    UnexpectedEof {
        /// Offset at which the read started.
        offset: usize,
        /// How many bytes were missing.
        needed: usize,
    },
    /// A compact integer was well formed but does not fit into a `u64`.
    #[error("Compact integer at byte {offset} does not fit into a u64")]
    CompactOutOfRange {
        /// Offset of the compact prefix byte.
        offset: usize,
    },
    /// A compact integer or length was not canonically encoded, or a length
    /// cannot be represented on this platform.
    #[error("Invalid length prefix at byte {offset}")]
    InvalidLengthPrefix {
        /// Offset of the compact prefix byte.
        offset: usize,
    },
}

/// A cursor over some SCALE encoded bytes.
///
/// Reads advance the cursor. Copy the cursor to come back to a position later.
/// The current offset is tracked so that errors can point at the offending byte.
#[derive(Debug, Clone, Copy)]
pub struct ScaleCursor<'scale> {
    bytes: &'scale [u8],
    offset: usize,
}

impl<'scale> ScaleCursor<'scale> {
    /// Start reading from the beginning of some bytes.
    pub fn new(bytes: &'scale [u8]) -> Self {
        ScaleCursor { bytes, offset: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The bytes which have not yet been consumed.
    pub fn remaining(&self) -> &'scale [u8] {
        &self.bytes[self.offset..]
    }

    /// The number of bytes which have not yet been consumed.
    pub fn remaining_len(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Have all of the bytes been consumed?
    pub fn is_empty(&self) -> bool {
        self.remaining_len() == 0
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Read exactly `n` bytes, borrowing them from the underlying buffer.
    pub fn read_exact(&mut self, n: usize) -> Result<&'scale [u8], CursorError> {
        let remaining = self.remaining_len();
        if remaining < n {
            return Err(CursorError::UnexpectedEof {
                offset: self.offset,
                needed: n - remaining,
            });
        }
        let out = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    /// Decode some fixed width type (eg the primitive integers) using its
    /// [`parity_scale_codec::Decode`] implementation.
    pub fn decode_fixed<T: Decode + MaxEncodedLen>(&mut self) -> Result<T, CursorError> {
        let offset = self.offset;
        let needed = T::max_encoded_len().saturating_sub(self.remaining_len());
        T::decode(self).map_err(|_| {
            self.offset = offset;
            CursorError::UnexpectedEof {
                offset,
                needed: needed.max(1),
            }
        })
    }

    /// Decode a SCALE compact encoded unsigned integer which must fit into a `u64`.
    ///
    /// The two lowest bits of the first byte select the mode. Modes `0b00`, `0b01` and `0b10`
    /// hold the value in 1, 2 or 4 bytes, and mode `0b11` is followed by
    /// `(first_byte >> 2) + 4` little endian bytes.
    pub fn read_compact_u64(&mut self) -> Result<u64, CursorError> {
        let offset = self.offset;
        let prefix = self.read_u8()?;
        let non_canonical = || CursorError::InvalidLengthPrefix { offset };

        match prefix & 0b11 {
            0b00 => Ok(u64::from(prefix >> 2)),
            0b01 => {
                let [b] = self.read_array::<1>()?;
                let value = u16::from_le_bytes([prefix, b]) >> 2;
                if value < 1 << 6 {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            0b10 => {
                let [b1, b2, b3] = self.read_array::<3>()?;
                let value = u32::from_le_bytes([prefix, b1, b2, b3]) >> 2;
                if value < 1 << 14 {
                    return Err(non_canonical());
                }
                Ok(u64::from(value))
            }
            _ => {
                let len = usize::from(prefix >> 2) + 4;
                let payload = self.read_exact(len)?;

                if payload.iter().skip(8).any(|b| *b != 0) {
                    return Err(CursorError::CompactOutOfRange { offset });
                }
                // The most significant byte must be set, else a shorter
                // payload could have been used.
                if payload[len - 1] == 0 {
                    return Err(non_canonical());
                }

                let mut buf = [0u8; 8];
                let n = len.min(8);
                buf[..n].copy_from_slice(&payload[..n]);
                let value = u64::from_le_bytes(buf);
                if value < 1 << 30 {
                    return Err(non_canonical());
                }
                Ok(value)
            }
        }
    }

    /// Decode a compact encoded length, as found in front of sequences and strings.
    pub fn read_compact_len(&mut self) -> Result<usize, CursorError> {
        let offset = self.offset;
        let len = self.read_compact_u64()?;
        usize::try_from(len).map_err(|_| CursorError::InvalidLengthPrefix { offset })
    }
}

// Not imported: the inherent `remaining_len` would otherwise be shadowed in method calls.
impl parity_scale_codec::Input for ScaleCursor<'_> {
    fn remaining_len(&mut self) -> Result<Option<usize>, parity_scale_codec::Error> {
        Ok(Some(ScaleCursor::remaining_len(self)))
    }

    fn read(&mut self, into: &mut [u8]) -> Result<(), parity_scale_codec::Error> {
        let bytes = self
            .read_exact(into.len())
            .map_err(|_| parity_scale_codec::Error::from("Not enough data to fill buffer"))?;
        into.copy_from_slice(bytes);
        Ok(())
    }
}

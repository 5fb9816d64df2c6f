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

use super::{AnyValue, DecodeError};
use crate::utils::{CursorError, ScaleCursor};
use core::fmt::Write;

/// The order of bits within each stored byte of a bit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitOrder {
    /// Least significant bit first (`bitvec::order::Lsb0`).
    Lsb0,
    /// Most significant bit first (`bitvec::order::Msb0`).
    Msb0,
}

impl BitOrder {
    /// Recognise a bit order from the last path segment of its type, eg `Lsb0` from
    /// `bitvec::order::Lsb0`.
    pub fn from_ident(ident: &str) -> Option<BitOrder> {
        match ident {
            "Lsb0" => Some(BitOrder::Lsb0),
            "Msb0" => Some(BitOrder::Msb0),
            _ => None,
        }
    }
}

/// Decode a bit sequence stored in `u8`s.
///
/// The compact prefix is the number of bits; `⌈bits / 8⌉` bytes follow. The output is
/// every byte printed as 8 binary digits, bytes in order, so the string is always a
/// whole number of bytes long.
pub fn decode_bit_sequence(
    order: BitOrder,
    cursor: &mut ScaleCursor<'_>,
) -> Result<AnyValue, DecodeError> {
    let offset = cursor.offset();
    let bit_count = cursor.read_compact_u64()?;
    if bit_count == 0 {
        return Err(DecodeError::InvalidBitCount);
    }

    let byte_count = usize::try_from(bit_count.div_ceil(8))
        .map_err(|_| CursorError::InvalidLengthPrefix { offset })?;
    let bytes = cursor.read_exact(byte_count)?;

    let mut bits = String::with_capacity(byte_count * 8);
    for &byte in bytes {
        let byte = match order {
            BitOrder::Lsb0 => byte.reverse_bits(),
            BitOrder::Msb0 => byte,
        };
        write!(bits, "{byte:08b}").expect("writing to string should always succeed");
    }

    Ok(AnyValue::BitSequence(bits))
}

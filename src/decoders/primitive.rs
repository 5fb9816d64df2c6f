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
use crate::utils::ScaleCursor;
use scale_info::TypeDefPrimitive;

/// The primitive types that can be decoded.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    Str,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    I8,
    I16,
    I32,
    I64,
    I128,
    I256,
}

impl From<&TypeDefPrimitive> for PrimitiveKind {
    fn from(p: &TypeDefPrimitive) -> Self {
        match p {
            TypeDefPrimitive::Bool => PrimitiveKind::Bool,
            TypeDefPrimitive::Char => PrimitiveKind::Char,
            TypeDefPrimitive::Str => PrimitiveKind::Str,
            TypeDefPrimitive::U8 => PrimitiveKind::U8,
            TypeDefPrimitive::U16 => PrimitiveKind::U16,
            TypeDefPrimitive::U32 => PrimitiveKind::U32,
            TypeDefPrimitive::U64 => PrimitiveKind::U64,
            TypeDefPrimitive::U128 => PrimitiveKind::U128,
            TypeDefPrimitive::U256 => PrimitiveKind::U256,
            TypeDefPrimitive::I8 => PrimitiveKind::I8,
            TypeDefPrimitive::I16 => PrimitiveKind::I16,
            TypeDefPrimitive::I32 => PrimitiveKind::I32,
            TypeDefPrimitive::I64 => PrimitiveKind::I64,
            TypeDefPrimitive::I128 => PrimitiveKind::I128,
            TypeDefPrimitive::I256 => PrimitiveKind::I256,
        }
    }
}

impl PrimitiveKind {
    /// Is this an unsigned integer that can sit inside a compact wrapper?
    pub fn is_compactable(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
                | PrimitiveKind::U128
        )
    }

    /// Decode a value of this kind. Integers are little endian.
    pub fn decode(&self, cursor: &mut ScaleCursor<'_>) -> Result<AnyValue, DecodeError> {
        let value = match self {
            PrimitiveKind::Bool => match cursor.read_u8()? {
                0 => AnyValue::Bool(false),
                1 => AnyValue::Bool(true),
                b => return Err(DecodeError::InvalidBool(b)),
            },
            PrimitiveKind::Char => AnyValue::Char(cursor.read_u8()?),
            PrimitiveKind::Str => {
                let len = cursor.read_compact_len()?;
                let bytes = cursor.read_exact(len)?.to_vec();
                match String::from_utf8(bytes) {
                    Ok(s) => AnyValue::Str(s),
                    Err(e) => AnyValue::Bytes(e.into_bytes()),
                }
            }
            PrimitiveKind::U8 => AnyValue::U128(cursor.decode_fixed::<u8>()?.into()),
            PrimitiveKind::U16 => AnyValue::U128(cursor.decode_fixed::<u16>()?.into()),
            PrimitiveKind::U32 => AnyValue::U128(cursor.decode_fixed::<u32>()?.into()),
            PrimitiveKind::U64 => AnyValue::U128(cursor.decode_fixed::<u64>()?.into()),
            PrimitiveKind::U128 => AnyValue::U128(cursor.decode_fixed::<u128>()?),
            PrimitiveKind::U256 => AnyValue::U256(cursor.read_array::<32>()?),
            PrimitiveKind::I8 => AnyValue::I128(cursor.decode_fixed::<i8>()?.into()),
            PrimitiveKind::I16 => AnyValue::I128(cursor.decode_fixed::<i16>()?.into()),
            PrimitiveKind::I32 => AnyValue::I128(cursor.decode_fixed::<i32>()?.into()),
            PrimitiveKind::I64 => AnyValue::I128(cursor.decode_fixed::<i64>()?.into()),
            PrimitiveKind::I128 => AnyValue::I128(cursor.decode_fixed::<i128>()?),
            PrimitiveKind::I256 => AnyValue::I256(cursor.read_array::<32>()?),
        };
        Ok(value)
    }
}

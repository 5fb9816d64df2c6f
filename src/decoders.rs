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

//! The decoders that registries are made of, and the values they produce.
//!
//! A [`TypeDecoder`] decodes the fields of one event, call or error. Each field has a
//! [`FieldDecoder`] built from the type of that field.

mod bit_sequence;
mod composite;
mod primitive;

use crate::utils::{CursorError, ScaleCursor};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use bit_sequence::BitOrder;
pub use composite::RecursiveDecoder;
pub use primitive::PrimitiveKind;

/// An error decoding some bytes with a [`FieldDecoder`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not enough bytes, or a malformed compact integer.
    #[error(transparent)]
    Cursor(#[from] CursorError),
    /// A boolean was neither `0x00` nor `0x01`.
    #[error("Invalid bool byte {0:#04x}")]
    InvalidBool(u8),
    /// A bit sequence declared a length of zero bits.
    #[error("Bit sequences must contain at least one bit")]
    InvalidBitCount,
    /// An event record phase byte was not one of the known phases.
    #[error("Unknown phase {0}; expected 0 (ApplyExtrinsic), 1 (Finalization) or 2 (Initialization)")]
    UnknownPhase(u8),
    /// A variant discriminant had no entry in the dispatch table.
    #[error("No variant with index {0}")]
    UnknownVariant(u8),
    /// A recursive decoder was used before it was resolved.
    #[error("Recursive decoder for lookup index {lookup_index} was never resolved")]
    UnresolvedRecursive {
        /// The lookup index the recursive decoder stands in for.
        lookup_index: u32,
    },
    /// A recursive decoder outlived the registry that owns the decoder it points to.
    #[error("Recursive decoder for lookup index {lookup_index} no longer points at a decoder")]
    NilDecoder {
        /// The lookup index the recursive decoder stands in for.
        lookup_index: u32,
    },
    /// Decoding a named field failed.
    #[error("Cannot decode field '{name}' (lookup index {lookup_index}): {reason}")]
    InField {
        /// The name of the field.
        name: String,
        /// The lookup index of the field type.
        lookup_index: u32,
        /// Why decoding failed.
        reason: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Strip any field context, returning the error that caused decoding to fail.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::InField { reason, .. } => reason.root_cause(),
            e => e,
        }
    }

    /// The names of the fields we were inside of when decoding failed, outermost first.
    pub fn field_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut err = self;
        while let DecodeError::InField { name, reason, .. } = err {
            path.push(name.as_str());
            err = reason;
        }
        path
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyValue {
    /// Nothing was decoded (eg an empty tuple).
    Null,
    /// A boolean.
    Bool(bool),
    /// A single byte character.
    Char(u8),
    /// A UTF-8 string.
    Str(String),
    /// A string whose bytes were not valid UTF-8, kept as is.
    Bytes(Vec<u8>),
    /// An unsigned integer of up to 128 bits.
    U128(u128),
    /// A signed integer of up to 128 bits.
    I128(i128),
    /// A 256 bit unsigned integer, as little endian bytes.
    U256([u8; 32]),
    /// A 256 bit signed integer, as little endian two's complement bytes.
    I256([u8; 32]),
    /// A compact encoded unsigned integer.
    Compact(u64),
    /// A 32 byte hash (any `[u8; 32]`).
    Hash([u8; 32]),
    /// A bit sequence, as a string of `0`s and `1`s, most significant bit first.
    BitSequence(String),
    /// The items of an array, sequence or tuple.
    List(Vec<AnyValue>),
    /// The named fields of a composite or variant.
    Fields(Vec<DecodedField>),
    /// The discriminant of a variant which carries no payload.
    Discriminant(u8),
}

impl AnyValue {
    /// Return the value as a `u128` if it's an unsigned or compact integer.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            AnyValue::U128(n) => Some(*n),
            AnyValue::Compact(n) => Some(u128::from(*n)),
            _ => None,
        }
    }

    /// Return the fields if this is a composite or variant value.
    pub fn as_fields(&self) -> Option<&[DecodedField]> {
        match self {
            AnyValue::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    /// Find a field by name if this is a composite or variant value.
    pub fn field(&self, name: &str) -> Option<&AnyValue> {
        self.as_fields()?
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }
}

/// A named value produced by decoding a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedField {
    /// The field name.
    pub name: String,
    /// The decoded value.
    pub value: AnyValue,
    /// The lookup index of the field type.
    pub lookup_index: u32,
}

/// A named field along with the decoder for its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field name.
    pub name: String,
    /// The decoder for the field type.
    pub decoder: Arc<FieldDecoder>,
    /// The lookup index that the decoder was resolved from.
    pub lookup_index: u32,
}

impl Field {
    /// Decode this field.
    pub fn decode(&self, cursor: &mut ScaleCursor<'_>) -> Result<DecodedField, DecodeError> {
        let value = self
            .decoder
            .decode(cursor)
            .map_err(|e| DecodeError::InField {
                name: self.name.clone(),
                lookup_index: self.lookup_index,
                reason: Box::new(e),
            })?;

        Ok(DecodedField {
            name: self.name.clone(),
            value,
            lookup_index: self.lookup_index,
        })
    }
}

/// The decoder for a single call, error or event.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecoder {
    /// The item name, ie `<pallet>.<variant>`.
    pub name: String,
    /// The item fields, in declaration order.
    pub fields: Vec<Field>,
}

impl TypeDecoder {
    /// Decode each of the fields in order.
    pub fn decode(&self, cursor: &mut ScaleCursor<'_>) -> Result<Vec<DecodedField>, DecodeError> {
        composite::decode_fields(&self.fields, cursor)
    }
}

/// Decodes a value of some type from SCALE bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDecoder {
    /// Consumes nothing.
    Noop,
    /// A fixed width primitive, or a string.
    Primitive(PrimitiveKind),
    /// A compact encoded unsigned integer.
    Compact,
    /// Exactly `len` items.
    Array {
        /// The number of items.
        len: u32,
        /// The item decoder.
        inner: Arc<FieldDecoder>,
    },
    /// A compact length followed by that many items.
    Sequence(Arc<FieldDecoder>),
    /// Each field in order.
    Composite(Vec<Field>),
    /// One byte discriminant followed by the payload decoded by the matching entry.
    Variant(BTreeMap<u8, Arc<FieldDecoder>>),
    /// A compact bit count followed by the bytes holding those bits.
    BitSequence(BitOrder),
    /// A stand-in for a decoder that is still being built; used to close cycles in the type graph.
    Recursive(RecursiveDecoder),
}

impl FieldDecoder {
    /// Decode a value, advancing the cursor past it.
    pub fn decode(&self, cursor: &mut ScaleCursor<'_>) -> Result<AnyValue, DecodeError> {
        match self {
            FieldDecoder::Noop => Ok(AnyValue::Null),
            FieldDecoder::Primitive(kind) => kind.decode(cursor),
            FieldDecoder::Compact => Ok(AnyValue::Compact(cursor.read_compact_u64()?)),
            FieldDecoder::Array { len, inner } => composite::decode_array(*len, inner, cursor),
            FieldDecoder::Sequence(inner) => composite::decode_sequence(inner, cursor),
            FieldDecoder::Composite(fields) => {
                composite::decode_fields(fields, cursor).map(AnyValue::Fields)
            }
            FieldDecoder::Variant(dispatch) => composite::decode_variant(dispatch, cursor),
            FieldDecoder::BitSequence(order) => bit_sequence::decode_bit_sequence(*order, cursor),
            FieldDecoder::Recursive(recursive) => recursive.decode(cursor),
        }
    }

    /// Is this a [`FieldDecoder::Recursive`] stand-in?
    pub fn is_recursive(&self) -> bool {
        matches!(self, FieldDecoder::Recursive(_))
    }
}

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

use super::{AnyValue, DecodeError, DecodedField, Field, FieldDecoder, PrimitiveKind};
use crate::utils::ScaleCursor;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock, Weak};

pub fn decode_array(
    len: u32,
    inner: &FieldDecoder,
    cursor: &mut ScaleCursor<'_>,
) -> Result<AnyValue, DecodeError> {
    // [u8; 32] is an account ID, hash or similar; hand it back in one piece.
    if len == 32 && matches!(inner, FieldDecoder::Primitive(PrimitiveKind::U8)) {
        return Ok(AnyValue::Hash(cursor.read_array::<32>()?));
    }

    let len = len as usize;
    let mut items = Vec::with_capacity(len.min(cursor.remaining_len()));
    for _ in 0..len {
        items.push(inner.decode(cursor)?);
    }
    Ok(AnyValue::List(items))
}

pub fn decode_sequence(
    inner: &FieldDecoder,
    cursor: &mut ScaleCursor<'_>,
) -> Result<AnyValue, DecodeError> {
    let len = cursor.read_compact_u64()?;

    // Don't trust the length for the allocation; every item is at least a byte
    // unless it's a no-op, in which case there's nothing to store anyway.
    let capacity = usize::try_from(len)
        .unwrap_or(usize::MAX)
        .min(cursor.remaining_len());
    let mut items = Vec::with_capacity(capacity);
    for _ in 0..len {
        items.push(inner.decode(cursor)?);
    }
    Ok(AnyValue::List(items))
}

pub fn decode_fields(
    fields: &[Field],
    cursor: &mut ScaleCursor<'_>,
) -> Result<Vec<DecodedField>, DecodeError> {
    fields.iter().map(|field| field.decode(cursor)).collect()
}

pub fn decode_variant(
    dispatch: &BTreeMap<u8, Arc<FieldDecoder>>,
    cursor: &mut ScaleCursor<'_>,
) -> Result<AnyValue, DecodeError> {
    let index = cursor.read_u8()?;
    match dispatch.get(&index).map(|d| &**d) {
        None => Err(DecodeError::UnknownVariant(index)),
        // Tell the caller which variant it was; there's nothing else to give back.
        Some(FieldDecoder::Noop) => Ok(AnyValue::Discriminant(index)),
        Some(decoder) => decoder.decode(cursor),
    }
}

/// A decoder standing in for the decoder of some lookup index which was still being
/// built when it was referenced. Clones share the same underlying cell.
///
/// The cell is filled exactly once, at the end of a registry build, with a weak
/// pointer to the concrete decoder. The registry owns the concrete decoder, so
/// cyclic types never form reference counting cycles.
#[derive(Clone)]
pub struct RecursiveDecoder {
    lookup_index: u32,
    cell: Arc<OnceLock<Weak<FieldDecoder>>>,
}

impl RecursiveDecoder {
    /// A new, unresolved, recursive decoder for some lookup index.
    pub fn new(lookup_index: u32) -> Self {
        RecursiveDecoder {
            lookup_index,
            cell: Arc::new(OnceLock::new()),
        }
    }

    /// The lookup index this decoder stands in for.
    pub fn lookup_index(&self) -> u32 {
        self.lookup_index
    }

    /// Has [`RecursiveDecoder::resolve`] been called?
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Point this decoder (and all of its clones) at the concrete decoder. Returns
    /// false if it was already resolved, in which case nothing changes.
    pub fn resolve(&self, decoder: &Arc<FieldDecoder>) -> bool {
        self.cell.set(Arc::downgrade(decoder)).is_ok()
    }

    /// The concrete decoder, if resolved and still alive.
    pub fn target(&self) -> Option<Arc<FieldDecoder>> {
        self.cell.get().and_then(Weak::upgrade)
    }

    /// Decode using the concrete decoder.
    pub fn decode(&self, cursor: &mut ScaleCursor<'_>) -> Result<AnyValue, DecodeError> {
        let weak = self.cell.get().ok_or(DecodeError::UnresolvedRecursive {
            lookup_index: self.lookup_index,
        })?;
        let decoder = weak.upgrade().ok_or(DecodeError::NilDecoder {
            lookup_index: self.lookup_index,
        })?;
        decoder.decode(cursor)
    }
}

// Don't follow the cell; the decoder it points to usually contains this one.
impl core::fmt::Debug for RecursiveDecoder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecursiveDecoder")
            .field("lookup_index", &self.lookup_index)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

// Shape equality; comparing targets would recurse forever on cyclic types.
impl PartialEq for RecursiveDecoder {
    fn eq(&self, other: &Self) -> bool {
        self.lookup_index == other.lookup_index && self.is_resolved() == other.is_resolved()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn u8_field(name: &str) -> Field {
        Field {
            name: name.to_owned(),
            decoder: Arc::new(FieldDecoder::Primitive(PrimitiveKind::U8)),
            lookup_index: 2,
        }
    }

    // {0: Noop, 1: Composite{u8}}
    fn two_variants() -> FieldDecoder {
        let mut dispatch = BTreeMap::new();
        dispatch.insert(0, Arc::new(FieldDecoder::Noop));
        dispatch.insert(
            1,
            Arc::new(FieldDecoder::Composite(vec![u8_field("value")])),
        );
        FieldDecoder::Variant(dispatch)
    }

    #[test]
    fn test_variant_noop_yields_discriminant() {
        let decoder = two_variants();
        let mut cursor = ScaleCursor::new(&[0x00]);
        assert_eq!(decoder.decode(&mut cursor), Ok(AnyValue::Discriminant(0)));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_variant_delegates_on_discriminant() {
        let decoder = two_variants();
        let mut cursor = ScaleCursor::new(&[0x01, 0x07]);
        assert_eq!(
            decoder.decode(&mut cursor),
            Ok(AnyValue::Fields(vec![DecodedField {
                name: "value".into(),
                value: AnyValue::U128(7),
                lookup_index: 2
            }]))
        );
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_variant_unknown_discriminant() {
        let decoder = two_variants();
        for d in 2..=u8::MAX {
            assert_eq!(
                decoder.decode(&mut ScaleCursor::new(&[d])),
                Err(DecodeError::UnknownVariant(d))
            );
        }
    }

    #[test]
    fn test_array_and_sequence() {
        let inner = FieldDecoder::Primitive(PrimitiveKind::U16);
        let array = FieldDecoder::Array {
            len: 2,
            inner: Arc::new(inner.clone()),
        };
        assert_eq!(
            array.decode(&mut ScaleCursor::new(&[1, 0, 2, 0])),
            Ok(AnyValue::List(vec![AnyValue::U128(1), AnyValue::U128(2)]))
        );

        let sequence = FieldDecoder::Sequence(Arc::new(inner));
        let mut cursor = ScaleCursor::new(&[3 << 2, 1, 0, 2, 0, 3, 0, 9]);
        assert_eq!(
            sequence.decode(&mut cursor),
            Ok(AnyValue::List(vec![
                AnyValue::U128(1),
                AnyValue::U128(2),
                AnyValue::U128(3)
            ]))
        );
        assert_eq!(cursor.remaining(), &[9]);
    }

    #[test]
    fn test_byte_arrays_of_32_are_hashes() {
        let array = FieldDecoder::Array {
            len: 32,
            inner: Arc::new(FieldDecoder::Primitive(PrimitiveKind::U8)),
        };
        let bytes = [0xabu8; 32];
        assert_eq!(
            array.decode(&mut ScaleCursor::new(&bytes)),
            Ok(AnyValue::Hash(bytes))
        );
    }

    #[test]
    fn test_sequence_with_huge_length_fails_without_allocating() {
        let sequence = FieldDecoder::Sequence(Arc::new(FieldDecoder::Primitive(PrimitiveKind::U8)));
        // Compact u64::MAX followed by nothing.
        let bytes = [0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            sequence.decode(&mut ScaleCursor::new(&bytes)),
            Err(DecodeError::Cursor(_))
        ));
    }

    #[test]
    fn test_recursive_decoder_lifecycle() {
        let recursive = RecursiveDecoder::new(4);
        let decoder = FieldDecoder::Recursive(recursive.clone());

        assert_eq!(
            decoder.decode(&mut ScaleCursor::new(&[1])),
            Err(DecodeError::UnresolvedRecursive { lookup_index: 4 })
        );

        let target = Arc::new(FieldDecoder::Primitive(PrimitiveKind::U8));
        assert!(recursive.resolve(&target));
        assert!(!recursive.resolve(&target));
        assert_eq!(
            decoder.decode(&mut ScaleCursor::new(&[1])),
            Ok(AnyValue::U128(1))
        );

        drop(target);
        assert_eq!(
            decoder.decode(&mut ScaleCursor::new(&[1])),
            Err(DecodeError::NilDecoder { lookup_index: 4 })
        );
    }
}

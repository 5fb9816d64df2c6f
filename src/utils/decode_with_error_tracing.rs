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

use crate::decoders::{AnyValue, DecodeError, FieldDecoder};
use scale_info::PortableRegistry;

use super::ScaleCursor;

/// Decode a value with the given decoder, starting at the cursor.
///
/// If the decoding fails and the `error-tracing` feature is enabled, we decode the same bytes
/// again as `type_id` using a tracing visitor in order to return a more detailed error message.
/// On failure the cursor is left where it was.
pub fn decode_with_error_tracing(
    cursor: &mut ScaleCursor<'_>,
    decoder: &FieldDecoder,
    type_id: u32,
    types: &PortableRegistry,
) -> Result<AnyValue, (DecodeError, DecodeErrorTrace)> {
    let initial = *cursor;
    match decoder.decode(cursor) {
        Ok(value) => Ok(value),
        Err(e) => {
            *cursor = initial;
            let trace = trace_decode_error(cursor.remaining(), type_id, types, &e);
            Err((e, trace))
        }
    }
}

/// Build a [`DecodeErrorTrace`] for an error that occurred decoding `bytes` as `type_id`.
///
/// Without the `error-tracing` feature this just records the original error.
#[cfg(not(feature = "error-tracing"))]
pub fn trace_decode_error(
    _bytes: &[u8],
    _type_id: u32,
    _types: &PortableRegistry,
    original_error: &DecodeError,
) -> DecodeErrorTrace {
    DecodeErrorTrace {
        original_error: original_error.to_string(),
        tracing_error: String::new(),
    }
}

/// Build a [`DecodeErrorTrace`] for an error that occurred decoding `bytes` as `type_id`.
///
/// The bytes are decoded again with the scale-value tracing visitor, which reports where
/// and why it gave up.
#[cfg(feature = "error-tracing")]
pub fn trace_decode_error(
    bytes: &[u8],
    type_id: u32,
    types: &PortableRegistry,
    original_error: &DecodeError,
) -> DecodeErrorTrace {
    use core::fmt::Write;

    let original_error = original_error.to_string();
    let res = match scale_value::scale::tracing::decode_as_type(&mut &*bytes, type_id, types) {
        Ok(value) => value.map_context(|id| format!("{id:?}")),
        Err(te) => {
            return DecodeErrorTrace {
                original_error,
                tracing_error: te.to_string(),
            };
        }
    };

    // The tracing decoder managed it, so our decoder disagrees with the type registry.
    // Print out what the value should have looked like.
    let mut res_string = String::new();
    res_string.push_str("Failed to decode value (but tracing decoded it):\n\n");

    scale_value::stringify::to_writer_custom()
        .pretty()
        .format_context(|type_id, w: &mut &mut String| write!(w, "{type_id}"))
        .add_custom_formatter(|v, w| scale_value::stringify::custom_formatters::format_hex(v, w))
        .write(&res, &mut res_string)
        .expect("writing to string should always succeed");

    DecodeErrorTrace {
        original_error,
        tracing_error: res_string,
    }
}

/// A decode error, and possibly a more detailed trace of where decoding went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeErrorTrace {
    original_error: String,
    tracing_error: String,
}

impl DecodeErrorTrace {
    /// The error reported by our own decoder.
    pub fn original_error(&self) -> &str {
        &self.original_error
    }

    /// The output of the tracing decoder. Empty if tracing is disabled.
    pub fn tracing_error(&self) -> &str {
        &self.tracing_error
    }
}

impl core::error::Error for DecodeErrorTrace {}

impl core::fmt::Display for DecodeErrorTrace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let DecodeErrorTrace {
            original_error,
            tracing_error,
        } = self;

        write!(f, "{original_error}")?;
        if !tracing_error.is_empty() {
            write!(f, ":\n\n{tracing_error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::decoders::PrimitiveKind;
    use crate::test_utils::TypesBuilder;
    use scale_info::TypeDefPrimitive;

    #[test]
    fn test_cursor_is_reset_on_failure() {
        let mut types = TypesBuilder::new();
        let bool_id = types.primitive(TypeDefPrimitive::Bool);
        let types = types.finish();

        let bytes = [5u8, 1];
        let mut cursor = ScaleCursor::new(&bytes);
        let decoder = FieldDecoder::Primitive(PrimitiveKind::Bool);

        let (err, trace) =
            decode_with_error_tracing(&mut cursor, &decoder, bool_id, &types).unwrap_err();

        assert_eq!(err, DecodeError::InvalidBool(5));
        assert_eq!(trace.original_error(), err.to_string());
        assert_eq!(cursor.offset(), 0);

        #[cfg(feature = "error-tracing")]
        assert!(!trace.tracing_error().is_empty());
    }

    #[test]
    fn test_success_advances_cursor() {
        let mut types = TypesBuilder::new();
        let u16_id = types.primitive(TypeDefPrimitive::U16);
        let types = types.finish();

        let bytes = [1u8, 0, 9];
        let mut cursor = ScaleCursor::new(&bytes);
        let decoder = FieldDecoder::Primitive(PrimitiveKind::U16);

        assert_eq!(
            decode_with_error_tracing(&mut cursor, &decoder, u16_id, &types),
            Ok(AnyValue::U128(1))
        );
        assert_eq!(cursor.remaining(), &[9]);
    }
}

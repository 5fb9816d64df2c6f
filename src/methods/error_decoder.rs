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

use super::pallet_registry::{ErrorKey, ErrorRegistry, RegistryKey};
use crate::decoders::{DecodeError, DecodedField};
use crate::utils::{CursorError, ScaleCursor};

/// An error decoding a module error.
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleErrorDecodeError {
    #[error("Cannot decode the pallet index and error bytes: {0}")]
    CannotDecodeErrorIndex(CursorError),
    #[error("No error with pallet index {pallet_index} and error index {error_index}")]
    UnknownError { pallet_index: u8, error_index: u8 },
    #[error("Cannot decode the fields of {error}: {reason}")]
    CannotDecodeFields { error: String, reason: DecodeError },
}

/// A decoded module error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedModuleError {
    /// The pallet index and the 4 error bytes exactly as they were encoded.
    pub key: ErrorKey,
    /// The error name, ie `<pallet>.<error>`.
    pub name: String,
    /// The error fields, in declaration order.
    pub fields: Vec<DecodedField>,
}

/// Decode a module error, ie the `ModuleError` in a `DispatchError::Module`: a pallet index
/// followed by 4 bytes.
///
/// The first of the 4 bytes is the error index. Any fields the error has are encoded
/// in the remaining 3, which are zero padded.
pub fn decode_module_error(
    cursor: &mut ScaleCursor<'_>,
    registry: &ErrorRegistry,
) -> Result<DecodedModuleError, ModuleErrorDecodeError> {
    let pallet_index = cursor
        .read_u8()
        .map_err(ModuleErrorDecodeError::CannotDecodeErrorIndex)?;
    let error_index = cursor
        .read_array::<4>()
        .map_err(ModuleErrorDecodeError::CannotDecodeErrorIndex)?;
    let key = ErrorKey {
        pallet_index,
        error_index,
    };

    let decoder = registry
        .get(&ErrorKey::new(pallet_index, error_index[0]))
        .ok_or(ModuleErrorDecodeError::UnknownError {
            pallet_index,
            error_index: error_index[0],
        })?;

    let mut field_cursor = ScaleCursor::new(&error_index[1..]);
    let fields = decoder
        .decode(&mut field_cursor)
        .map_err(|reason| ModuleErrorDecodeError::CannotDecodeFields {
            error: decoder.name.clone(),
            reason,
        })?;

    Ok(DecodedModuleError {
        key,
        name: decoder.name.clone(),
        fields,
    })
}

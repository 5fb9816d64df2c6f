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

use super::pallet_registry::{CallKey, CallRegistry};
use crate::decoders::{AnyValue, DecodeError, DecodedField};
use crate::utils::{CursorError, ScaleCursor};

/// An error decoding a call.
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallDecodeError {
    #[error("Cannot decode the pallet and call index: {0}")]
    CannotDecodeCallIndex(CursorError),
    #[error("No call with pallet index {} and call index {}", .0.pallet_index, .0.call_index)]
    UnknownCall(CallKey),
    #[error("Cannot decode the arguments of {call}: {reason}")]
    CannotDecodeArguments { call: String, reason: DecodeError },
}

/// A decoded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    /// The pallet and call index.
    pub key: CallKey,
    /// The call name, ie `<pallet>.<call>`.
    pub name: String,
    /// The call arguments, in declaration order.
    pub fields: Vec<DecodedField>,
}

impl DecodedCall {
    /// The value of the argument with the given name.
    pub fn field(&self, name: &str) -> Option<&AnyValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Decode a call: a pallet index, a call index and then the call arguments.
///
/// The cursor is left just after the call; anything following it is not looked at.
pub fn decode_call(
    cursor: &mut ScaleCursor<'_>,
    registry: &CallRegistry,
) -> Result<DecodedCall, CallDecodeError> {
    let [pallet_index, call_index] = cursor
        .read_array::<2>()
        .map_err(CallDecodeError::CannotDecodeCallIndex)?;
    let key = CallKey {
        pallet_index,
        call_index,
    };

    let decoder = registry.get(&key).ok_or(CallDecodeError::UnknownCall(key))?;
    let fields = decoder
        .decode(cursor)
        .map_err(|reason| CallDecodeError::CannotDecodeArguments {
            call: decoder.name.clone(),
            reason,
        })?;

    Ok(DecodedCall {
        key,
        name: decoder.name.clone(),
        fields,
    })
}

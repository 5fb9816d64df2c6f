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

/// The storage key of a plain storage value, ie `twox_128(pallet_name) + twox_128(storage_entry)`.
pub fn storage_value_key(pallet_name: &str, storage_entry: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(&sp_crypto_hashing::twox_128(pallet_name.as_bytes()));
    key[16..].copy_from_slice(&sp_crypto_hashing::twox_128(storage_entry.as_bytes()));
    key
}

/// The storage key under which the events of a block are stored, ie the `Events` entry
/// of the `System` pallet. Fetch the value at this key to hand to [`crate::events::decode_events`].
pub fn system_events_storage_key() -> [u8; 32] {
    storage_value_key("System", "Events")
}

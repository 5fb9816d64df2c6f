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

use super::pallet_type_info::ItemKind;
use crate::decoders::{FieldDecoder, TypeDecoder};
use parity_scale_codec::{Decode, Encode};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A key identifying some item within a pallet registry.
pub trait RegistryKey: Copy + Ord + core::fmt::Debug {
    /// The kind of pallet item this key identifies.
    const KIND: ItemKind;
    /// The key for the variant at `variant_index` in the item enum of the pallet at `pallet_index`.
    fn new(pallet_index: u8, variant_index: u8) -> Self;
}

/// Identifies a call: the first two bytes of any encoded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct CallKey {
    /// Index of the pallet.
    pub pallet_index: u8,
    /// Index of the call within the pallet.
    pub call_index: u8,
}

/// Identifies a module error.
///
/// Errors are encoded as a pallet index followed by 4 bytes. Only the first of those is
/// the error index today; the rest are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct ErrorKey {
    /// Index of the pallet.
    pub pallet_index: u8,
    /// The error index, followed by 3 more bytes.
    pub error_index: [u8; 4],
}

/// Identifies an event: the two bytes which precede the event data in an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct EventId {
    /// Index of the pallet.
    pub pallet_index: u8,
    /// Index of the event within the pallet.
    pub event_index: u8,
}

impl RegistryKey for CallKey {
    const KIND: ItemKind = ItemKind::Calls;
    fn new(pallet_index: u8, call_index: u8) -> Self {
        CallKey {
            pallet_index,
            call_index,
        }
    }
}

impl RegistryKey for ErrorKey {
    const KIND: ItemKind = ItemKind::Errors;
    fn new(pallet_index: u8, error_index: u8) -> Self {
        ErrorKey {
            pallet_index,
            error_index: [error_index, 0, 0, 0],
        }
    }
}

impl RegistryKey for EventId {
    const KIND: ItemKind = ItemKind::Events;
    fn new(pallet_index: u8, event_index: u8) -> Self {
        EventId {
            pallet_index,
            event_index,
        }
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.pallet_index, self.event_index)
    }
}

/// The decoders for every call, error or event declared across all pallets, keyed by `K`.
///
/// Built with a [`crate::registry::RegistryBuilder`] and never modified afterwards.
#[derive(Debug, Clone)]
pub struct PalletRegistry<K> {
    items: BTreeMap<K, TypeDecoder>,
    // Keeps alive the decoders that recursive decoders in `items` point back to.
    recursive_targets: Vec<Arc<FieldDecoder>>,
}

/// Decoders for every call, keyed by [`CallKey`].
pub type CallRegistry = PalletRegistry<CallKey>;
/// Decoders for every module error, keyed by [`ErrorKey`].
pub type ErrorRegistry = PalletRegistry<ErrorKey>;
/// Decoders for every event, keyed by [`EventId`].
pub type EventRegistry = PalletRegistry<EventId>;

impl<K: RegistryKey> PalletRegistry<K> {
    pub(crate) fn new(
        items: BTreeMap<K, TypeDecoder>,
        recursive_targets: Vec<Arc<FieldDecoder>>,
    ) -> Self {
        PalletRegistry {
            items,
            recursive_targets,
        }
    }

    /// Look up the decoder for an item.
    pub fn get(&self, key: &K) -> Option<&TypeDecoder> {
        self.items.get(key)
    }

    /// Find an item by its `<pallet>.<variant>` name.
    pub fn find_by_name(&self, name: &str) -> Option<(K, &TypeDecoder)> {
        self.iter().find(|(_, decoder)| decoder.name == name)
    }

    /// Iterate over every item, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (K, &TypeDecoder)> {
        self.items.iter().map(|(k, v)| (*k, v))
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Are there no items?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The concrete decoders that recursive decoders in this registry were wired to.
    pub fn recursive_targets(&self) -> &[Arc<FieldDecoder>] {
        &self.recursive_targets
    }
}

impl<K: PartialEq> PartialEq for PalletRegistry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

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

use scale_info::PortableRegistry;
use std::borrow::Cow;

/// This is implemented for the modern metadatas exposed from `frame_metadata` (V14 onwards)
/// and hands back the type registry along with the call, error and event types of each pallet.
pub trait PalletTypeInfo {
    /// The type registry that lookup indexes point into.
    fn types(&self) -> &PortableRegistry;
    /// Iterate over the pallets, in metadata order.
    fn pallets(&self) -> impl Iterator<Item = PalletInfo<'_>>;
}

/// The kinds of item that a pallet can declare, each as a variant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    /// Dispatchable calls.
    Calls,
    /// Module errors.
    Errors,
    /// Events.
    Events,
}

impl core::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ItemKind::Calls => "calls",
            ItemKind::Errors => "errors",
            ItemKind::Events => "events",
        };
        f.write_str(s)
    }
}

/// Information about a single pallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalletInfo<'info> {
    /// The pallet name.
    pub name: Cow<'info, str>,
    /// The pallet index; the first byte of every call, error and event it declares.
    pub index: u8,
    /// The lookup index of the pallet's call enum, if it has calls.
    pub calls_ty: Option<u32>,
    /// The lookup index of the pallet's error enum, if it has errors.
    pub errors_ty: Option<u32>,
    /// The lookup index of the pallet's event enum, if it has events.
    pub events_ty: Option<u32>,
}

impl PalletInfo<'_> {
    /// The lookup index of the variant type for the given kind of item, if the pallet declares one.
    pub fn item_ty(&self, kind: ItemKind) -> Option<u32> {
        match kind {
            ItemKind::Calls => self.calls_ty,
            ItemKind::Errors => self.errors_ty,
            ItemKind::Events => self.events_ty,
        }
    }
}

macro_rules! impl_pallet_type_info_for_v14_to_v16 {
    ($path:path, $name:ident) => {
        const _: () = {
            use $path as path;
            impl PalletTypeInfo for path::$name {
                fn types(&self) -> &PortableRegistry {
                    &self.types
                }
                fn pallets(&self) -> impl Iterator<Item = PalletInfo<'_>> {
                    self.pallets.iter().map(|pallet| PalletInfo {
                        name: Cow::Borrowed(&pallet.name),
                        index: pallet.index,
                        calls_ty: pallet.calls.as_ref().map(|c| c.ty.id),
                        errors_ty: pallet.error.as_ref().map(|e| e.ty.id),
                        events_ty: pallet.event.as_ref().map(|e| e.ty.id),
                    })
                }
            }
        };
    };
}

impl_pallet_type_info_for_v14_to_v16!(frame_metadata::v14, RuntimeMetadataV14);
impl_pallet_type_info_for_v14_to_v16!(frame_metadata::v15, RuntimeMetadataV15);
impl_pallet_type_info_for_v14_to_v16!(frame_metadata::v16, RuntimeMetadataV16);

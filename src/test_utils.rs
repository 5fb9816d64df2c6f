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

//! Helpers to hand build type registries and V14 metadata for tests.

use frame_metadata::v14::{
    ExtrinsicMetadata, PalletCallMetadata, PalletErrorMetadata, PalletEventMetadata,
    PalletMetadata, RuntimeMetadataV14,
};
use scale_info::form::PortableForm;
use scale_info::{
    Field, Path, PortableRegistry, PortableType, Type, TypeDef, TypeDefPrimitive, TypeDefTuple,
    TypeDefVariant, Variant,
};

/// Builds a [`PortableRegistry`] one type at a time. IDs are handed out in order, which
/// is what [`PortableRegistry::resolve`] expects.
#[derive(Debug, Default)]
pub struct TypesBuilder {
    types: Vec<PortableType>,
}

impl TypesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ID the next added type will get.
    pub fn next_id(&self) -> u32 {
        self.types.len() as u32
    }

    pub fn add(&mut self, path: &[&str], type_def: TypeDef<PortableForm>) -> u32 {
        let id = self.next_id();
        self.types.push(PortableType {
            id,
            ty: Type {
                path: Path {
                    segments: path.iter().map(|s| s.to_string()).collect(),
                },
                type_params: Vec::new(),
                type_def,
                docs: Vec::new(),
            },
        });
        id
    }

    pub fn primitive(&mut self, p: TypeDefPrimitive) -> u32 {
        self.add(&[], TypeDef::Primitive(p))
    }

    /// Take an ID now and fill in the type later with [`TypesBuilder::set`]; for self referential types.
    pub fn reserve(&mut self) -> u32 {
        self.add(&[], unit_type())
    }

    pub fn set(&mut self, id: u32, path: &[&str], type_def: TypeDef<PortableForm>) {
        let ty = &mut self.types[id as usize].ty;
        ty.path = Path {
            segments: path.iter().map(|s| s.to_string()).collect(),
        };
        ty.type_def = type_def;
    }

    pub fn finish(self) -> PortableRegistry {
        PortableRegistry { types: self.types }
    }
}

pub fn unit_type() -> TypeDef<PortableForm> {
    TypeDef::Tuple(TypeDefTuple { fields: Vec::new() })
}

pub fn field(name: Option<&str>, ty: u32, type_name: Option<&str>) -> Field<PortableForm> {
    Field {
        name: name.map(|n| n.to_string()),
        ty: ty.into(),
        type_name: type_name.map(|n| n.to_string()),
        docs: Vec::new(),
    }
}

pub fn variant(name: &str, index: u8, fields: Vec<Field<PortableForm>>) -> Variant<PortableForm> {
    Variant {
        name: name.to_string(),
        fields,
        index,
        docs: Vec::new(),
    }
}

pub fn variant_type(variants: Vec<Variant<PortableForm>>) -> TypeDef<PortableForm> {
    TypeDef::Variant(TypeDefVariant { variants })
}

pub fn pallet(
    name: &str,
    index: u8,
    calls: Option<u32>,
    events: Option<u32>,
    errors: Option<u32>,
) -> PalletMetadata<PortableForm> {
    PalletMetadata {
        name: name.to_string(),
        storage: None,
        calls: calls.map(|id| PalletCallMetadata { ty: id.into() }),
        event: events.map(|id| PalletEventMetadata { ty: id.into() }),
        constants: Vec::new(),
        error: errors.map(|id| PalletErrorMetadata { ty: id.into() }),
        index,
    }
}

/// V14 metadata with the given types and pallets. A unit type is added to stand in for
/// the extrinsic and runtime types, which nothing here looks at.
pub fn metadata(
    mut types: TypesBuilder,
    pallets: Vec<PalletMetadata<PortableForm>>,
) -> RuntimeMetadataV14 {
    let unit = types.add(&[], unit_type());
    RuntimeMetadataV14 {
        types: types.finish(),
        pallets,
        extrinsic: ExtrinsicMetadata {
            ty: unit.into(),
            version: 4,
            signed_extensions: Vec::new(),
        },
        ty: unit.into(),
    }
}

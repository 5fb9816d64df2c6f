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

use super::pallet_registry::{
    CallRegistry, ErrorRegistry, EventRegistry, PalletRegistry, RegistryKey,
};
use super::pallet_type_info::{ItemKind, PalletTypeInfo};
use crate::decoders::{
    BitOrder, Field, FieldDecoder, PrimitiveKind, RecursiveDecoder, TypeDecoder,
};
use crate::utils::field_name::{field_name, item_name, tuple_item_name};
use scale_info::form::PortableForm;
use scale_info::{PortableRegistry, TypeDef, TypeDefBitSequence, TypeDefPrimitive};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An error building a pallet registry from metadata.
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryBuildError {
    #[error("Cannot find the {kind} type (lookup index {lookup_index}) of pallet {pallet_name}")]
    ItemTypeNotFound {
        pallet_name: String,
        kind: ItemKind,
        lookup_index: u32,
    },
    #[error(
        "The {kind} type (lookup index {lookup_index}) of pallet {pallet_name} should be a variant type"
    )]
    ExpectedVariant {
        pallet_name: String,
        kind: ItemKind,
        lookup_index: u32,
    },
    #[error("Cannot find type with lookup index {lookup_index}")]
    FieldTypeNotFound { lookup_index: u32 },
    #[error("Cannot find bit store type with lookup index {lookup_index}")]
    BitStoreTypeNotFound { lookup_index: u32 },
    #[error("Bit store type with lookup index {lookup_index} is not supported; only u8 is")]
    BitStoreNotSupported { lookup_index: u32 },
    #[error("Cannot find bit order type with lookup index {lookup_index}")]
    BitOrderTypeNotFound { lookup_index: u32 },
    #[error(
        "Bit order type with lookup index {lookup_index} is '{ident}'; expected 'Lsb0' or 'Msb0'"
    )]
    BitOrderInvalid { lookup_index: u32, ident: String },
    #[error("Cannot find compact encoded type with lookup index {lookup_index}")]
    CompactFieldTypeNotFound { lookup_index: u32 },
    #[error("Type with lookup index {lookup_index} cannot be compact encoded")]
    CompactUnsupported { lookup_index: u32 },
    #[error(
        "Primitive {primitive:?} (lookup index {lookup_index}) cannot be compact encoded; only unsigned integers can"
    )]
    PrimitiveNotSupported {
        lookup_index: u32,
        primitive: PrimitiveKind,
    },
    #[error("Recursive reference to lookup index {lookup_index} has no decoder to point at")]
    UnresolvedRecursive { lookup_index: u32 },
    #[error("Recursive reference to lookup index {lookup_index} points at another recursive reference")]
    RecursiveChain { lookup_index: u32 },
    #[error("Cannot build field '{name}' (lookup index {lookup_index}): {reason}")]
    InField {
        name: String,
        lookup_index: u32,
        reason: Box<RegistryBuildError>,
    },
    #[error("Cannot build {item}: {reason}")]
    InItem {
        item: String,
        reason: Box<RegistryBuildError>,
    },
}

impl RegistryBuildError {
    /// Strip any item or field context, returning the error that caused the build to fail.
    pub fn root_cause(&self) -> &RegistryBuildError {
        match self {
            RegistryBuildError::InField { reason, .. } | RegistryBuildError::InItem { reason, .. } => {
                reason.root_cause()
            }
            e => e,
        }
    }
}

/// A decoder to use for some lookup index instead of building one from the type registry.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOverride {
    /// The lookup index to override.
    pub lookup_index: u32,
    /// The decoder to use for it.
    pub decoder: Arc<FieldDecoder>,
}

impl FieldOverride {
    /// Decode the type at `lookup_index` with `decoder`.
    pub fn new(lookup_index: u32, decoder: FieldDecoder) -> Self {
        FieldOverride {
            lookup_index,
            decoder: Arc::new(decoder),
        }
    }
}

/// Compiles the call, error and event types in some metadata into [`PalletRegistry`]s.
///
/// ```rust,ignore
/// let events = RegistryBuilder::new().build_events(&metadata)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    overrides: Vec<FieldOverride>,
}

impl RegistryBuilder {
    /// A builder with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given decoders for the given lookup indexes in every build.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = FieldOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Build the call registry.
    pub fn build_calls<Info: PalletTypeInfo>(
        &self,
        info: &Info,
    ) -> Result<CallRegistry, RegistryBuildError> {
        self.build(info)
    }

    /// Build the module error registry.
    pub fn build_errors<Info: PalletTypeInfo>(
        &self,
        info: &Info,
    ) -> Result<ErrorRegistry, RegistryBuildError> {
        self.build(info)
    }

    /// Build the event registry.
    pub fn build_events<Info: PalletTypeInfo>(
        &self,
        info: &Info,
    ) -> Result<EventRegistry, RegistryBuildError> {
        self.build(info)
    }

    /// Build a registry for whichever kind of item `K` identifies. Every build starts
    /// afresh from the overrides; nothing is shared with previous builds.
    pub fn build<K: RegistryKey, Info: PalletTypeInfo>(
        &self,
        info: &Info,
    ) -> Result<PalletRegistry<K>, RegistryBuildError> {
        let types = info.types();
        let mut build = Build::new(types, &self.overrides);
        let mut items = BTreeMap::new();

        tracing::debug!(kind = %K::KIND, overrides = self.overrides.len(), "building pallet registry");

        for pallet in info.pallets() {
            let Some(lookup_index) = pallet.item_ty(K::KIND) else {
                continue;
            };

            let ty = types
                .resolve(lookup_index)
                .ok_or_else(|| RegistryBuildError::ItemTypeNotFound {
                    pallet_name: pallet.name.to_string(),
                    kind: K::KIND,
                    lookup_index,
                })?;
            let TypeDef::Variant(item_enum) = &ty.type_def else {
                return Err(RegistryBuildError::ExpectedVariant {
                    pallet_name: pallet.name.to_string(),
                    kind: K::KIND,
                    lookup_index,
                });
            };

            for variant in &item_enum.variants {
                let name = item_name(&pallet.name, &variant.name);
                let fields = match build.resolve_fields(&variant.fields) {
                    Ok(fields) => fields,
                    Err(e) => {
                        return Err(RegistryBuildError::InItem {
                            item: name,
                            reason: Box::new(e),
                        });
                    }
                };
                items.insert(
                    K::new(pallet.index, variant.index),
                    TypeDecoder { name, fields },
                );
            }
        }

        let recursive_targets = build.finish()?;

        tracing::debug!(
            kind = %K::KIND,
            items = items.len(),
            recursive = recursive_targets.len(),
            "built pallet registry"
        );

        Ok(PalletRegistry::new(items, recursive_targets))
    }
}

/// The state of a single registry build.
struct Build<'info> {
    types: &'info PortableRegistry,
    // Finished decoders, and recursive stand-ins for those still being built.
    memo: BTreeMap<u32, Arc<FieldDecoder>>,
    // Stand-ins that were handed out for a back-edge and must be wired up at the end.
    pending_recursive: BTreeMap<u32, RecursiveDecoder>,
}

impl<'info> Build<'info> {
    fn new(types: &'info PortableRegistry, overrides: &[FieldOverride]) -> Self {
        Build {
            types,
            memo: overrides
                .iter()
                .map(|o| (o.lookup_index, o.decoder.clone()))
                .collect(),
            pending_recursive: BTreeMap::new(),
        }
    }

    fn resolve_fields(
        &mut self,
        fields: &[scale_info::Field<PortableForm>],
    ) -> Result<Vec<Field>, RegistryBuildError> {
        fields
            .iter()
            .map(|field| {
                let lookup_index = field.ty.id;
                let field_ty = self
                    .types
                    .resolve(lookup_index)
                    .ok_or(RegistryBuildError::FieldTypeNotFound { lookup_index })?;
                let name = field_name(field, field_ty);

                match self.get_or_build(lookup_index) {
                    Ok(decoder) => Ok(Field {
                        name,
                        decoder,
                        lookup_index,
                    }),
                    Err(e) => Err(RegistryBuildError::InField {
                        name,
                        lookup_index,
                        reason: Box::new(e),
                    }),
                }
            })
            .collect()
    }

    fn get_or_build(&mut self, lookup_index: u32) -> Result<Arc<FieldDecoder>, RegistryBuildError> {
        if let Some(existing) = self.memo.get(&lookup_index) {
            // A back-edge to a type that's still being built.
            if let FieldDecoder::Recursive(recursive) = &**existing {
                self.pending_recursive
                    .entry(lookup_index)
                    .or_insert_with(|| recursive.clone());
            }
            return Ok(existing.clone());
        }

        let stand_in = FieldDecoder::Recursive(RecursiveDecoder::new(lookup_index));
        self.memo.insert(lookup_index, Arc::new(stand_in));

        let decoder = Arc::new(self.build_for(lookup_index)?);
        self.memo.insert(lookup_index, decoder.clone());
        Ok(decoder)
    }

    fn build_for(&mut self, lookup_index: u32) -> Result<FieldDecoder, RegistryBuildError> {
        let ty = self
            .types
            .resolve(lookup_index)
            .ok_or(RegistryBuildError::FieldTypeNotFound { lookup_index })?;

        let decoder = match &ty.type_def {
            TypeDef::Primitive(p) => FieldDecoder::Primitive(p.into()),
            TypeDef::Composite(composite) => {
                FieldDecoder::Composite(self.resolve_fields(&composite.fields)?)
            }
            TypeDef::Variant(variant) => {
                let mut dispatch = BTreeMap::new();
                for v in &variant.variants {
                    let decoder = if v.fields.is_empty() {
                        FieldDecoder::Noop
                    } else {
                        FieldDecoder::Composite(self.resolve_fields(&v.fields)?)
                    };
                    dispatch.insert(v.index, Arc::new(decoder));
                }
                FieldDecoder::Variant(dispatch)
            }
            TypeDef::Sequence(seq) => FieldDecoder::Sequence(self.get_or_build(seq.type_param.id)?),
            TypeDef::Array(arr) => FieldDecoder::Array {
                len: arr.len,
                inner: self.get_or_build(arr.type_param.id)?,
            },
            TypeDef::Tuple(tuple) if tuple.fields.is_empty() => FieldDecoder::Noop,
            TypeDef::Tuple(tuple) => {
                let mut fields = Vec::with_capacity(tuple.fields.len());
                for (i, item) in tuple.fields.iter().enumerate() {
                    fields.push(Field {
                        name: tuple_item_name(i),
                        decoder: self.get_or_build(item.id)?,
                        lookup_index: item.id,
                    });
                }
                FieldDecoder::Composite(fields)
            }
            TypeDef::Compact(compact) => {
                let mut visiting = Vec::new();
                self.build_compact(compact.type_param.id, &mut visiting)?
            }
            TypeDef::BitSequence(bits) => self.build_bit_sequence(bits)?,
        };

        Ok(decoder)
    }

    // Compact only makes sense for unsigned integers, and for wrappers around them.
    // Not memoised; the same type decodes differently inside a compact.
    fn build_compact(
        &self,
        lookup_index: u32,
        visiting: &mut Vec<u32>,
    ) -> Result<FieldDecoder, RegistryBuildError> {
        let ty = self
            .types
            .resolve(lookup_index)
            .ok_or(RegistryBuildError::CompactFieldTypeNotFound { lookup_index })?;

        // A wrapper can't contain itself and still be compact encodable.
        if visiting.contains(&lookup_index) {
            return Err(RegistryBuildError::CompactUnsupported { lookup_index });
        }
        visiting.push(lookup_index);

        let decoder = match &ty.type_def {
            TypeDef::Primitive(p) => {
                let primitive = PrimitiveKind::from(p);
                if !primitive.is_compactable() {
                    return Err(RegistryBuildError::PrimitiveNotSupported {
                        lookup_index,
                        primitive,
                    });
                }
                FieldDecoder::Compact
            }
            TypeDef::Tuple(tuple) if tuple.fields.is_empty() => FieldDecoder::Noop,
            TypeDef::Tuple(tuple) => {
                let mut fields = Vec::with_capacity(tuple.fields.len());
                for (i, item) in tuple.fields.iter().enumerate() {
                    fields.push(Field {
                        name: tuple_item_name(i),
                        decoder: Arc::new(self.build_compact(item.id, visiting)?),
                        lookup_index: item.id,
                    });
                }
                FieldDecoder::Composite(fields)
            }
            TypeDef::Composite(composite) => {
                let mut fields = Vec::with_capacity(composite.fields.len());
                for field in &composite.fields {
                    let field_index = field.ty.id;
                    let field_ty = self.types.resolve(field_index).ok_or(
                        RegistryBuildError::CompactFieldTypeNotFound {
                            lookup_index: field_index,
                        },
                    )?;
                    fields.push(Field {
                        name: field_name(field, field_ty),
                        decoder: Arc::new(self.build_compact(field_index, visiting)?),
                        lookup_index: field_index,
                    });
                }
                FieldDecoder::Composite(fields)
            }
            _ => return Err(RegistryBuildError::CompactUnsupported { lookup_index }),
        };

        visiting.pop();
        Ok(decoder)
    }

    fn build_bit_sequence(
        &self,
        bits: &TypeDefBitSequence<PortableForm>,
    ) -> Result<FieldDecoder, RegistryBuildError> {
        let store_index = bits.bit_store_type.id;
        let store_ty = self
            .types
            .resolve(store_index)
            .ok_or(RegistryBuildError::BitStoreTypeNotFound {
                lookup_index: store_index,
            })?;
        if !matches!(store_ty.type_def, TypeDef::Primitive(TypeDefPrimitive::U8)) {
            return Err(RegistryBuildError::BitStoreNotSupported {
                lookup_index: store_index,
            });
        }

        let order_index = bits.bit_order_type.id;
        let order_ty = self
            .types
            .resolve(order_index)
            .ok_or(RegistryBuildError::BitOrderTypeNotFound {
                lookup_index: order_index,
            })?;
        let ident = order_ty
            .path
            .segments
            .last()
            .map(String::as_str)
            .unwrap_or_default();
        let order = BitOrder::from_ident(ident).ok_or_else(|| RegistryBuildError::BitOrderInvalid {
            lookup_index: order_index,
            ident: ident.to_owned(),
        })?;

        Ok(FieldDecoder::BitSequence(order))
    }

    /// Point every recursive stand-in that was handed out at its finished decoder. Returns
    /// the decoders pointed at, which the registry must keep alive.
    fn finish(self) -> Result<Vec<Arc<FieldDecoder>>, RegistryBuildError> {
        let mut targets = Vec::with_capacity(self.pending_recursive.len());
        for (lookup_index, recursive) in self.pending_recursive {
            let Some(target) = self.memo.get(&lookup_index) else {
                return Err(RegistryBuildError::UnresolvedRecursive { lookup_index });
            };
            if target.is_recursive() {
                return Err(RegistryBuildError::RecursiveChain { lookup_index });
            }
            recursive.resolve(target);
            targets.push(target.clone());
        }

        tracing::trace!(wired = targets.len(), "resolved recursive decoders");
        Ok(targets)
    }
}

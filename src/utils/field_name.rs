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

//! Naming rules for decoded fields. Consumers key lookups on these names, so the
//! separator and the fallback formats must not change.

use scale_info::form::PortableForm;
use scale_info::{Field, Type};

/// Separator between path segments and the field name.
pub const SEPARATOR: &str = ".";

/// The name of a field declared in some composite or variant.
///
/// This is the field name, else the declared type name, else `lookup_index_<N>`,
/// prefixed with the `.` joined path of the field's resolved type if it has one.
pub fn field_name(field: &Field<PortableForm>, field_ty: &Type<PortableForm>) -> String {
    let leaf_name = match (&field.name, &field.type_name) {
        (Some(name), _) => name.clone(),
        (None, Some(type_name)) => type_name.clone(),
        (None, None) => lookup_index_name(field.ty.id),
    };

    if field_ty.path.segments.is_empty() {
        leaf_name
    } else {
        let mut name = field_ty.path.segments.join(SEPARATOR);
        name.push_str(SEPARATOR);
        name.push_str(&leaf_name);
        name
    }
}

/// Fallback name for a field which has neither a name nor a type name.
pub fn lookup_index_name(lookup_index: u32) -> String {
    format!("lookup_index_{lookup_index}")
}

/// Synthetic name of the `i`th element of a tuple.
pub fn tuple_item_name(i: usize) -> String {
    format!("tuple_item_{i}")
}

/// The name of a pallet item (call, error or event), ie `<pallet>.<variant>`.
pub fn item_name(pallet_name: &str, variant_name: &str) -> String {
    format!("{pallet_name}{SEPARATOR}{variant_name}")
}

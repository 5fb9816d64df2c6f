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

//! Decode the events of Substrate based chains, using the type information in their metadata.
//!
//! The type information for every event, call and module error in a runtime is compiled once
//! into a registry of decoders (see [`registry::RegistryBuilder`]). A registry can then decode
//! the `System.Events` storage value of any block produced by that runtime, with
//! [`events::decode_events`], or calls and module errors, with [`calls::decode_call`] and
//! [`errors::decode_module_error`].
//!
//! [`parser::EventsParser`] ties this to a source of metadata and storage, and rebuilds its
//! registry from newer metadata when a block cannot be decoded with the one it holds.

#![deny(missing_docs)]

mod methods;
mod utils;

#[cfg(test)]
mod test_utils;

pub mod decoders;

pub mod registry {
    //! This module contains the registries of decoders built from metadata.
    //!
    //! - See [`RegistryBuilder`] to build an [`EventRegistry`], [`CallRegistry`] or [`ErrorRegistry`]
    //!   from V14, V15 or V16 metadata.
    //! - See [`FieldOverride`] to replace the decoder built for some type with one of your own.
    //! - See [`PalletTypeInfo`] for the information about pallets that registries are built from.

    pub use crate::methods::pallet_registry::{
        CallKey, CallRegistry, ErrorKey, ErrorRegistry, EventId, EventRegistry, PalletRegistry,
        RegistryKey,
    };
    pub use crate::methods::pallet_type_info::{ItemKind, PalletInfo, PalletTypeInfo};
    pub use crate::methods::registry_builder::{FieldOverride, RegistryBuildError, RegistryBuilder};
}

pub mod events {
    //! This module contains functions for decoding the events of a block.
    //!
    //! - See [`decode_events`] to decode the `System.Events` storage value.
    //! - See [`decode_events_with_trace`] to also get a trace of where decoding went wrong.

    pub use crate::methods::event_decoder::{
        Event, EventsDecodeError, Phase, decode_events, decode_events_with_trace,
    };
    pub use crate::methods::pallet_registry::{EventId, EventRegistry};
}

pub mod calls {
    //! This module contains functions for decoding calls.

    pub use crate::methods::call_decoder::{CallDecodeError, DecodedCall, decode_call};
    pub use crate::methods::pallet_registry::{CallKey, CallRegistry};
}

pub mod errors {
    //! This module contains functions for decoding module errors, ie the errors
    //! that pallets return in a `DispatchError::Module`.

    pub use crate::methods::error_decoder::{
        DecodedModuleError, ModuleErrorDecodeError, decode_module_error,
    };
    pub use crate::methods::pallet_registry::{ErrorKey, ErrorRegistry};
}

pub mod parser {
    //! This module contains an events parser which fetches metadata and events through a
    //! [`StateProvider`], and refreshes its registry when events fail to decode.

    pub use crate::methods::events_parser::{
        BlockHash, EventsParser, EventsParserBuilder, ParserError, ParserState, RefreshError,
        StateProvider,
    };
}

pub mod helpers {
    //! Helper functions and types to assist with decoding.
    //!
    //! - [`system_events_storage_key`] is the key to fetch the events of a block from storage.
    //! - [`decode_with_error_tracing`] decodes a value, and retries with error tracing on failure.
    //! - [`ScaleCursor`] is the position within some SCALE bytes that decoders read from.

    pub use crate::methods::storage_key::{storage_value_key, system_events_storage_key};
    pub use crate::utils::field_name;
    pub use crate::utils::{
        CursorError, DecodeErrorTrace, ScaleCursor, decode_with_error_tracing, trace_decode_error,
    };
}

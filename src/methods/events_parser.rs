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

use super::event_decoder::{Event, EventsDecodeError, decode_events_with_trace};
use super::pallet_registry::EventRegistry;
use super::pallet_type_info::PalletTypeInfo;
use super::registry_builder::{FieldOverride, RegistryBuildError, RegistryBuilder};
use crate::utils::to_hex;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

/// A block hash.
pub type BlockHash = [u8; 32];

/// Fetches metadata and event bytes, typically from a node over RPC.
pub trait StateProvider {
    /// The metadata handed back.
    type Metadata: PalletTypeInfo + Send + Sync + 'static;
    /// The error returned if something can't be fetched.
    type Error: core::error::Error + Send + Sync + 'static;

    /// The metadata at the latest block.
    fn latest_metadata(&self) -> impl Future<Output = Result<Self::Metadata, Self::Error>> + Send;

    /// The metadata at the given block.
    fn metadata_at(
        &self,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Self::Metadata, Self::Error>> + Send;

    /// The raw bytes stored at `System.Events` (see [`crate::helpers::system_events_storage_key`])
    /// at the given block.
    fn storage_events(
        &self,
        metadata: &Self::Metadata,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Vec<u8>, Self::Error>> + Send;
}

/// An error parsing events with an [`EventsParser`].
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum ParserError<E> {
    #[error("Cannot fetch the latest metadata: {0}")]
    MetadataFetch(E),
    #[error("Cannot fetch the events at block {block_hash}: {reason}")]
    EventsFetch { block_hash: String, reason: E },
    #[error("Cannot build the event registry: {0}")]
    RegistryBuild(RegistryBuildError),
    #[error("Cannot refresh metadata at block {block_hash}: {reason}")]
    RefreshFailed {
        block_hash: String,
        reason: RefreshError<E>,
    },
    #[error("Cannot decode the events at block {block_hash}: {reason}")]
    DecodePersisted {
        block_hash: String,
        reason: EventsDecodeError,
    },
}

/// Why refreshing the metadata failed.
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum RefreshError<E> {
    #[error("cannot fetch metadata: {0}")]
    MetadataFetch(E),
    #[error("cannot build the event registry: {0}")]
    RegistryBuild(RegistryBuildError),
}

/// Some metadata along with the event registry built from it.
#[derive(Debug)]
pub struct ParserState<M> {
    metadata: M,
    registry: EventRegistry,
}

impl<M> ParserState<M> {
    /// The metadata.
    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// The event registry built from [`ParserState::metadata`].
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }
}

/// Configures and builds an [`EventsParser`].
pub struct EventsParserBuilder<P> {
    provider: P,
    overrides: Vec<FieldOverride>,
    refresh_on_failure: bool,
}

impl<P: StateProvider> EventsParserBuilder<P> {
    /// Use the given decoders for the given lookup indexes whenever the event registry is built.
    pub fn overrides(mut self, overrides: Vec<FieldOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    /// If events fail to decode, fetch the metadata at that block, rebuild the event registry
    /// and try once more. Defaults to true.
    pub fn refresh_on_failure(mut self, refresh: bool) -> Self {
        self.refresh_on_failure = refresh;
        self
    }

    /// Fetch the latest metadata and build the event registry from it.
    pub async fn build(self) -> Result<EventsParser<P>, ParserError<P::Error>> {
        let builder = RegistryBuilder::new().with_overrides(self.overrides);

        let metadata = self
            .provider
            .latest_metadata()
            .await
            .map_err(ParserError::MetadataFetch)?;
        let registry = builder
            .build_events(&metadata)
            .map_err(ParserError::RegistryBuild)?;

        tracing::info!(events = registry.len(), "event registry built");

        Ok(EventsParser {
            provider: self.provider,
            builder,
            refresh_on_failure: self.refresh_on_failure,
            state: RwLock::new(Arc::new(ParserState { metadata, registry })),
        })
    }
}

/// Decodes the events at any block, refreshing its metadata when events that it
/// can't decode are found (eg after a runtime upgrade).
///
/// ```rust,ignore
/// let parser = EventsParser::builder(provider).build().await?;
/// for event in parser.events_at(block_hash).await? {
///     println!("{}: {:?}", event.name, event.fields_map());
/// }
/// ```
pub struct EventsParser<P: StateProvider> {
    provider: P,
    builder: RegistryBuilder,
    refresh_on_failure: bool,
    state: RwLock<Arc<ParserState<P::Metadata>>>,
}

impl<P: StateProvider> EventsParser<P> {
    /// Configure a new parser.
    pub fn builder(provider: P) -> EventsParserBuilder<P> {
        EventsParserBuilder {
            provider,
            overrides: Vec::new(),
            refresh_on_failure: true,
        }
    }

    /// A parser with the default configuration.
    pub async fn new(provider: P) -> Result<Self, ParserError<P::Error>> {
        Self::builder(provider).build().await
    }

    /// The state provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The metadata and event registry currently in use. Refreshing doesn't modify this;
    /// it installs a new one.
    pub fn state(&self) -> Arc<ParserState<P::Metadata>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch and decode the events at the given block.
    ///
    /// If they can't be decoded, the metadata at the block is fetched, the event registry is
    /// rebuilt from it and the same bytes are decoded again. If that fails too then
    /// [`ParserError::DecodePersisted`] is returned with the second decode error.
    pub async fn events_at(&self, block_hash: BlockHash) -> Result<Vec<Event>, ParserError<P::Error>> {
        let state = self.state();
        let bytes = self
            .provider
            .storage_events(&state.metadata, block_hash)
            .await
            .map_err(|reason| ParserError::EventsFetch {
                block_hash: to_hex(&block_hash),
                reason,
            })?;

        let err = match decode_events_with_trace(&bytes, &state.registry, state.metadata.types()) {
            Ok(events) => return Ok(events),
            Err(e) => e,
        };

        if !self.refresh_on_failure {
            return Err(ParserError::DecodePersisted {
                block_hash: to_hex(&block_hash),
                reason: err,
            });
        }

        tracing::warn!(
            block_hash = %to_hex(&block_hash),
            error = %err,
            "cannot decode events; refreshing metadata"
        );

        let state = self.refresh_at(block_hash).await?;
        decode_events_with_trace(&bytes, &state.registry, state.metadata.types()).map_err(|reason| {
            ParserError::DecodePersisted {
                block_hash: to_hex(&block_hash),
                reason,
            }
        })
    }

    /// Fetch the metadata at the given block, build an event registry from it and
    /// install both. Returns the new state.
    pub async fn refresh_at(
        &self,
        block_hash: BlockHash,
    ) -> Result<Arc<ParserState<P::Metadata>>, ParserError<P::Error>> {
        let refresh_failed = |reason| {
            tracing::error!(block_hash = %to_hex(&block_hash), "cannot refresh metadata");
            ParserError::RefreshFailed {
                block_hash: to_hex(&block_hash),
                reason,
            }
        };

        let metadata = self
            .provider
            .metadata_at(block_hash)
            .await
            .map_err(|e| refresh_failed(RefreshError::MetadataFetch(e)))?;
        let registry = self
            .builder
            .build_events(&metadata)
            .map_err(|e| refresh_failed(RefreshError::RegistryBuild(e)))?;

        let state = Arc::new(ParserState { metadata, registry });
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state.clone();

        tracing::info!(
            block_hash = %to_hex(&block_hash),
            events = state.registry.len(),
            "installed refreshed event registry"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{TypesBuilder, field, metadata, pallet, variant, variant_type};
    use frame_metadata::v14::RuntimeMetadataV14;
    use scale_info::TypeDefPrimitive;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct MockError(String);

    /// An in-memory state provider.
    struct MockProvider {
        latest: RuntimeMetadataV14,
        metadata_at: BTreeMap<BlockHash, RuntimeMetadataV14>,
        events: BTreeMap<BlockHash, Vec<u8>>,
        metadata_at_calls: AtomicUsize,
    }

    impl StateProvider for MockProvider {
        type Metadata = RuntimeMetadataV14;
        type Error = MockError;

        async fn latest_metadata(&self) -> Result<Self::Metadata, Self::Error> {
            Ok(self.latest.clone())
        }

        async fn metadata_at(&self, block_hash: BlockHash) -> Result<Self::Metadata, Self::Error> {
            self.metadata_at_calls.fetch_add(1, Ordering::SeqCst);
            self.metadata_at
                .get(&block_hash)
                .cloned()
                .ok_or_else(|| MockError(format!("no metadata at {}", to_hex(&block_hash))))
        }

        async fn storage_events(
            &self,
            _metadata: &Self::Metadata,
            block_hash: BlockHash,
        ) -> Result<Vec<u8>, Self::Error> {
            self.events
                .get(&block_hash)
                .cloned()
                .ok_or_else(|| MockError(format!("no events at {}", to_hex(&block_hash))))
        }
    }

    const OLD_BLOCK: BlockHash = [1; 32];
    const NEW_BLOCK: BlockHash = [2; 32];

    // System (index 0) emits `Counted(u32)`; with `upgraded`, a `Staking` pallet at index 7
    // emits `Bonded(u32)` too.
    fn runtime(upgraded: bool) -> RuntimeMetadataV14 {
        let mut types = TypesBuilder::new();
        let u32_id = types.primitive(TypeDefPrimitive::U32);
        let system_events = types.add(
            &["frame_system", "Event"],
            variant_type(vec![variant("Counted", 0, vec![field(Some("count"), u32_id, None)])]),
        );
        let staking_events = types.add(
            &["pallet_staking", "Event"],
            variant_type(vec![variant("Bonded", 0, vec![field(Some("amount"), u32_id, None)])]),
        );

        let mut pallets = vec![pallet("System", 0, None, Some(system_events), None)];
        if upgraded {
            pallets.push(pallet("Staking", 7, None, Some(staking_events), None));
        }
        metadata(types, pallets)
    }

    fn provider() -> MockProvider {
        MockProvider {
            latest: runtime(false),
            metadata_at: BTreeMap::from([(OLD_BLOCK, runtime(false)), (NEW_BLOCK, runtime(true))]),
            events: BTreeMap::from([
                // System.Counted(1) during finalization.
                (OLD_BLOCK, hex::decode("040100000100000000").unwrap()),
                // Staking.Bonded(42) during finalization.
                (NEW_BLOCK, hex::decode("040107002a00000000").unwrap()),
            ]),
            metadata_at_calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_events_with_current_metadata() {
        let parser = EventsParser::new(provider()).await.unwrap();

        let events = parser.events_at(OLD_BLOCK).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "System.Counted");
        assert_eq!(parser.provider().metadata_at_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_on_failure() {
        let parser = EventsParser::new(provider()).await.unwrap();
        assert!(parser.state().registry().find_by_name("Staking.Bonded").is_none());

        let events = parser.events_at(NEW_BLOCK).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Staking.Bonded");
        assert_eq!(
            events[0].field("amount"),
            Some(&crate::decoders::AnyValue::U128(42))
        );
        assert_eq!(parser.provider().metadata_at_calls.load(Ordering::SeqCst), 1);

        // The refreshed registry is kept.
        assert!(parser.state().registry().find_by_name("Staking.Bonded").is_some());
        parser.events_at(NEW_BLOCK).await.unwrap();
        assert_eq!(parser.provider().metadata_at_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_refresh_when_disabled() {
        let parser = EventsParser::builder(provider())
            .refresh_on_failure(false)
            .build()
            .await
            .unwrap();

        let err = parser.events_at(NEW_BLOCK).await.unwrap_err();
        assert!(matches!(
            err,
            ParserError::DecodePersisted {
                reason: EventsDecodeError::UnknownEventId { .. },
                ..
            }
        ));
        assert_eq!(parser.provider().metadata_at_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_persists_after_refresh() {
        let mut provider = provider();
        // The metadata at the new block doesn't know about Staking either.
        provider.metadata_at.insert(NEW_BLOCK, runtime(false));
        let parser = EventsParser::new(provider).await.unwrap();

        let err = parser.events_at(NEW_BLOCK).await.unwrap_err();
        let ParserError::DecodePersisted { block_hash, reason } = err else {
            panic!("expected the decode error to persist, got {err:?}");
        };
        assert_eq!(block_hash, to_hex(&NEW_BLOCK));
        assert!(matches!(reason, EventsDecodeError::UnknownEventId { .. }));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_reported() {
        let mut provider = provider();
        provider.metadata_at.clear();
        let parser = EventsParser::new(provider).await.unwrap();

        let err = parser.events_at(NEW_BLOCK).await.unwrap_err();
        assert!(matches!(
            err,
            ParserError::RefreshFailed {
                reason: RefreshError::MetadataFetch(_),
                ..
            }
        ));
        assert!(err.to_string().contains(&to_hex(&NEW_BLOCK)));
    }

    #[tokio::test]
    async fn test_missing_events_are_reported() {
        let parser = EventsParser::new(provider()).await.unwrap();
        let err = parser.events_at([3; 32]).await.unwrap_err();
        assert!(matches!(err, ParserError::EventsFetch { .. }));
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let parser = EventsParser::new(provider()).await.unwrap();
        let before = parser.state();

        // The metadata at the old block is the same as the latest.
        let after = parser.refresh_at(OLD_BLOCK).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.registry(), after.registry());

        let bytes = hex::decode("040100000100000000").unwrap();
        assert_eq!(
            crate::events::decode_events(&bytes, before.registry()),
            crate::events::decode_events(&bytes, after.registry())
        );
    }
}

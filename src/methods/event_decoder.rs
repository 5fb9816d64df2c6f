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

use super::pallet_registry::{EventId, EventRegistry};
use crate::decoders::{AnyValue, DecodeError, DecodedField};
use crate::utils::{CursorError, DecodeErrorTrace, ScaleCursor, decode_with_error_tracing};
use scale_info::PortableRegistry;
use std::collections::BTreeMap;

/// An error decoding the events stored at `System.Events`.
#[non_exhaustive]
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventsDecodeError {
    #[error("Cannot decode the number of events: {0}")]
    CannotDecodeCount(CursorError),
    #[error("Cannot decode the phase of event {index}: {reason}")]
    CannotDecodePhase { index: usize, reason: DecodeError },
    #[error("Cannot decode the pallet and event index of event {index}: {reason}")]
    CannotDecodeEventId { index: usize, reason: CursorError },
    #[error("Event {index} has ID {event_id}, which is not in the event registry")]
    UnknownEventId { index: usize, event_id: EventId },
    #[error(
        "Cannot decode field '{field}' (lookup index {lookup_index}) of event {index} ({event}) at byte {offset}: {reason}{}",
        display_trace(.trace)
    )]
    CannotDecodeFields {
        index: usize,
        event: String,
        field: String,
        lookup_index: u32,
        offset: usize,
        reason: DecodeError,
        trace: Option<DecodeErrorTrace>,
    },
    #[error("Cannot decode the topics of event {index} ({event}): {reason}")]
    CannotDecodeTopics {
        index: usize,
        event: String,
        reason: CursorError,
    },
    #[error("{remaining} bytes left over at byte {offset} after decoding all events")]
    TrailingBytes { offset: usize, remaining: usize },
}

fn display_trace(trace: &Option<DecodeErrorTrace>) -> String {
    match trace {
        Some(trace) if !trace.tracing_error().is_empty() => {
            format!("\n\n{}", trace.tracing_error())
        }
        _ => String::new(),
    }
}

/// When, within a block, an event was deposited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// While applying the extrinsic at this index.
    ApplyExtrinsic(u32),
    /// After all extrinsics were applied.
    Finalization,
    /// Before any extrinsics were applied.
    Initialization,
}

impl Phase {
    /// Decode a phase: `0x00` followed by a `u32`, `0x01` or `0x02`.
    pub fn decode(cursor: &mut ScaleCursor<'_>) -> Result<Phase, DecodeError> {
        match cursor.read_u8()? {
            0 => Ok(Phase::ApplyExtrinsic(cursor.decode_fixed::<u32>()?)),
            1 => Ok(Phase::Finalization),
            2 => Ok(Phase::Initialization),
            n => Err(DecodeError::UnknownPhase(n)),
        }
    }
}

/// A decoded event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The event name, ie `<pallet>.<variant>`.
    pub name: String,
    /// The pallet and event index.
    pub event_id: EventId,
    /// When the event was deposited.
    pub phase: Phase,
    /// The event fields, in declaration order.
    pub fields: Vec<DecodedField>,
    /// The event topics.
    pub topics: Vec<[u8; 32]>,
}

impl Event {
    /// The value of the first field with the given name.
    pub fn field(&self, name: &str) -> Option<&AnyValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// The fields keyed by name. If two fields share a name, the last one wins.
    pub fn fields_map(&self) -> BTreeMap<&str, &AnyValue> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), &f.value))
            .collect()
    }
}

/// Decode the SCALE encoded `Vec<EventRecord>` stored at `System.Events`.
///
/// Any failure aborts the whole batch. Every byte must be consumed.
pub fn decode_events(
    bytes: &[u8],
    registry: &EventRegistry,
) -> Result<Vec<Event>, EventsDecodeError> {
    decode_events_inner(bytes, registry, None)
}

/// Like [`decode_events`], but if an event field fails to decode, the failing bytes are
/// decoded again against the type registry to give a more detailed error.
pub fn decode_events_with_trace(
    bytes: &[u8],
    registry: &EventRegistry,
    types: &PortableRegistry,
) -> Result<Vec<Event>, EventsDecodeError> {
    decode_events_inner(bytes, registry, Some(types))
}

fn decode_events_inner(
    bytes: &[u8],
    registry: &EventRegistry,
    types: Option<&PortableRegistry>,
) -> Result<Vec<Event>, EventsDecodeError> {
    let mut cursor = ScaleCursor::new(bytes);
    let count = cursor
        .read_compact_len()
        .map_err(EventsDecodeError::CannotDecodeCount)?;

    // Each record is at least 4 bytes (phase, pallet, event, topic count).
    let mut events = Vec::with_capacity(count.min(cursor.remaining_len() / 4));

    for index in 0..count {
        let phase = Phase::decode(&mut cursor)
            .map_err(|reason| EventsDecodeError::CannotDecodePhase { index, reason })?;

        let [pallet_index, event_index] = cursor
            .read_array::<2>()
            .map_err(|reason| EventsDecodeError::CannotDecodeEventId { index, reason })?;
        let event_id = EventId {
            pallet_index,
            event_index,
        };

        let decoder = registry
            .get(&event_id)
            .ok_or(EventsDecodeError::UnknownEventId { index, event_id })?;

        let mut fields = Vec::with_capacity(decoder.fields.len());
        for field in &decoder.fields {
            let offset = cursor.offset();
            let value = match types {
                Some(types) => decode_with_error_tracing(
                    &mut cursor,
                    &field.decoder,
                    field.lookup_index,
                    types,
                )
                .map_err(|(reason, trace)| (reason, Some(trace))),
                None => field.decoder.decode(&mut cursor).map_err(|e| (e, None)),
            };
            let value = value.map_err(|(reason, trace)| EventsDecodeError::CannotDecodeFields {
                index,
                event: decoder.name.clone(),
                field: field.name.clone(),
                lookup_index: field.lookup_index,
                offset,
                reason,
                trace,
            })?;

            fields.push(DecodedField {
                name: field.name.clone(),
                value,
                lookup_index: field.lookup_index,
            });
        }

        let topics = decode_topics(&mut cursor).map_err(|reason| {
            EventsDecodeError::CannotDecodeTopics {
                index,
                event: decoder.name.clone(),
                reason,
            }
        })?;

        tracing::trace!(index, name = %decoder.name, ?phase, "decoded event");

        events.push(Event {
            name: decoder.name.clone(),
            event_id,
            phase,
            fields,
            topics,
        });
    }

    if !cursor.is_empty() {
        return Err(EventsDecodeError::TrailingBytes {
            offset: cursor.offset(),
            remaining: cursor.remaining_len(),
        });
    }

    Ok(events)
}

fn decode_topics(cursor: &mut ScaleCursor<'_>) -> Result<Vec<[u8; 32]>, CursorError> {
    let len = cursor.read_compact_len()?;
    let mut topics = Vec::with_capacity(len.min(cursor.remaining_len() / 32));
    for _ in 0..len {
        topics.push(cursor.read_array::<32>()?);
    }
    Ok(topics)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::methods::registry_builder::RegistryBuilder;
    use crate::test_utils::{TypesBuilder, field, metadata, pallet, variant, variant_type};
    use parity_scale_codec::{Compact, Encode};
    use scale_info::TypeDefPrimitive;

    // Pallet "System" (index 0) with event 0 `Counted(u32)`, and pallet "Balances"
    // (index 2) with events 3 `Ping` and 4 `Toggled { on: bool, by: [u8; 32] }`.
    fn registry_and_types() -> (EventRegistry, PortableRegistry) {
        let mut types = TypesBuilder::new();
        let u32_id = types.primitive(TypeDefPrimitive::U32);
        let bool_id = types.primitive(TypeDefPrimitive::Bool);
        let u8_id = types.primitive(TypeDefPrimitive::U8);
        let account = types.add(
            &[],
            scale_info::TypeDef::Array(scale_info::TypeDefArray {
                len: 32,
                type_param: u8_id.into(),
            }),
        );
        let system_events = types.add(
            &["frame_system", "Event"],
            variant_type(vec![variant(
                "Counted",
                0,
                vec![field(Some("count"), u32_id, Some("u32"))],
            )]),
        );
        let balances_events = types.add(
            &["pallet_balances", "Event"],
            variant_type(vec![
                variant("Ping", 3, vec![]),
                variant(
                    "Toggled",
                    4,
                    vec![
                        field(Some("on"), bool_id, None),
                        field(Some("by"), account, Some("T::AccountId")),
                    ],
                ),
            ]),
        );
        let md = metadata(
            types,
            vec![
                pallet("System", 0, None, Some(system_events), None),
                pallet("Balances", 2, None, Some(balances_events), None),
            ],
        );
        let registry = RegistryBuilder::new().build_events(&md).unwrap();
        (registry, md.types)
    }

    fn registry() -> EventRegistry {
        registry_and_types().0
    }

    #[test]
    fn test_empty_events() {
        assert_eq!(decode_events(&[0x00], &registry()), Ok(vec![]));
    }

    #[test]
    fn test_single_finalization_event_without_payload() {
        let bytes = hex::decode("0401020300").unwrap();
        let events = decode_events(&bytes, &registry()).unwrap();
        assert_eq!(
            events,
            vec![Event {
                name: "Balances.Ping".into(),
                event_id: EventId {
                    pallet_index: 2,
                    event_index: 3
                },
                phase: Phase::Finalization,
                fields: vec![],
                topics: vec![],
            }]
        );
    }

    #[test]
    fn test_primitive_u32_field() {
        let bytes = hex::decode("040100002a00000000").unwrap();
        let events = decode_events(&bytes, &registry()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "System.Counted");
        assert_eq!(events[0].field("count"), Some(&AnyValue::U128(42)));
        assert_eq!(
            events[0].fields_map(),
            BTreeMap::from([("count", &AnyValue::U128(42))])
        );
        assert!(events[0].topics.is_empty());
    }

    #[test]
    fn test_phases_topics_and_hashes() {
        let account = [7u8; 32];
        let topic = [9u8; 32];

        let mut bytes = Compact(2u32).encode();
        // ApplyExtrinsic(5), Balances.Toggled { on: true, by: account }, one topic.
        bytes.extend((0u8, 5u32, 2u8, 4u8, true, account).encode());
        bytes.extend(vec![topic].encode());
        // Initialization, System.Counted(1), no topics.
        bytes.extend((2u8, 0u8, 0u8, 1u32, Compact(0u32)).encode());

        let events = decode_events(&bytes, &registry()).unwrap();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].phase, Phase::ApplyExtrinsic(5));
        assert_eq!(events[0].field("on"), Some(&AnyValue::Bool(true)));
        assert_eq!(events[0].field("by"), Some(&AnyValue::Hash(account)));
        assert_eq!(events[0].topics, vec![topic]);

        assert_eq!(events[1].phase, Phase::Initialization);
        assert_eq!(events[1].field("count"), Some(&AnyValue::U128(1)));
    }

    #[test]
    fn test_unknown_event_id() {
        let bytes = hex::decode("0401090900").unwrap();
        assert_eq!(
            decode_events(&bytes, &registry()),
            Err(EventsDecodeError::UnknownEventId {
                index: 0,
                event_id: EventId {
                    pallet_index: 9,
                    event_index: 9
                }
            })
        );
    }

    #[test]
    fn test_unknown_phase() {
        let bytes = hex::decode("0403020300").unwrap();
        assert_eq!(
            decode_events(&bytes, &registry()),
            Err(EventsDecodeError::CannotDecodePhase {
                index: 0,
                reason: DecodeError::UnknownPhase(3)
            })
        );
    }

    #[test]
    fn test_field_errors_point_at_the_field() {
        let (registry, types) = registry_and_types();
        // Balances.Toggled with an invalid bool.
        let bytes = hex::decode("0401020405").unwrap();

        for result in [
            decode_events(&bytes, &registry),
            decode_events_with_trace(&bytes, &registry, &types),
        ] {
            let Err(EventsDecodeError::CannotDecodeFields {
                index,
                event,
                field,
                offset,
                reason,
                trace,
                ..
            }) = result
            else {
                panic!("expected a field error, got {result:?}");
            };
            assert_eq!(index, 0);
            assert_eq!(event, "Balances.Toggled");
            assert_eq!(field, "on");
            assert_eq!(offset, 4);
            assert_eq!(reason, DecodeError::InvalidBool(5));
            if let Some(trace) = trace {
                assert_eq!(trace.original_error(), reason.to_string());
            }
        }
    }

    #[test]
    fn test_truncated_topics_and_trailing_bytes() {
        // Topic count of 1 but no topic.
        let bytes = hex::decode("040102030401").unwrap();
        assert!(matches!(
            decode_events(&bytes, &registry()),
            Err(EventsDecodeError::CannotDecodeTopics { index: 0, .. })
        ));

        let bytes = hex::decode("0401020300ff").unwrap();
        assert_eq!(
            decode_events(&bytes, &registry()),
            Err(EventsDecodeError::TrailingBytes {
                offset: 5,
                remaining: 1
            })
        );
    }

    #[test]
    fn test_count_larger_than_input() {
        // Claims u32::MAX events but has none.
        let bytes = Compact(u32::MAX).encode();
        assert!(matches!(
            decode_events(&bytes, &registry()),
            Err(EventsDecodeError::CannotDecodePhase { index: 0, .. })
        ));
    }

    #[test]
    fn test_count_beyond_usize_is_rejected() {
        let bytes = Compact(u64::MAX).encode();
        let result = decode_events(&bytes, &registry());
        if usize::try_from(u64::MAX).is_ok() {
            assert!(matches!(
                result,
                Err(EventsDecodeError::CannotDecodePhase { index: 0, .. })
            ));
        } else {
            assert_eq!(
                result,
                Err(EventsDecodeError::CannotDecodeCount(
                    CursorError::InvalidLengthPrefix { offset: 0 }
                ))
            );
        }
    }
}

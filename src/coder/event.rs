//! Event codec
//!
//! Programs emit events as `Program data: <base64>` (or `Program log:`) lines
//! carrying `discriminator ++ body`. Events emitted through a self-CPI arrive
//! as base58 instruction data prefixed with [`EVENT_IX_TAG_LE`].

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::discriminator::{event_discriminator, Discriminator, DISCRIMINATOR_SIZE, EVENT_IX_TAG_LE};
use super::layout::{compile_fields, Layout};
use crate::error::{Error, Result};
use crate::idl::{Idl, IdlField};
use crate::value::Value;

/// Decoded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub data: Value,
}

#[derive(Debug, Clone)]
struct EventEntry {
    name: String,
    layout: Layout,
}

/// Encodes and decodes the events of one IDL
#[derive(Debug, Clone)]
pub struct EventCoder {
    by_discriminator: HashMap<Discriminator, EventEntry>,
    by_name: HashMap<String, Discriminator>,
}

impl EventCoder {
    pub fn new(idl: &Idl) -> Result<Self> {
        let catalog = idl.catalog();
        let mut by_discriminator = HashMap::with_capacity(idl.events.len());
        let mut by_name = HashMap::with_capacity(idl.events.len());

        for event in &idl.events {
            let fields: Vec<IdlField> = event
                .fields
                .iter()
                .map(|f| IdlField::new(f.name.clone(), f.ty.clone()))
                .collect();
            let disc = event_discriminator(&event.name);
            by_discriminator.insert(
                disc,
                EventEntry {
                    name: event.name.clone(),
                    layout: compile_fields(&fields, &catalog)?,
                },
            );
            by_name.insert(event.name.clone(), disc);
        }

        Ok(Self {
            by_discriminator,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Discriminator of a registered event
    pub fn discriminator(&self, name: &str) -> Result<Discriminator> {
        self.by_name.get(name).copied().ok_or_else(|| Error::UnknownName {
            kind: "event",
            name: name.to_string(),
        })
    }

    /// Raw event payload: discriminator followed by the encoded fields
    pub fn encode_bytes(&self, name: &str, value: &Value) -> Result<Vec<u8>> {
        let disc = self.discriminator(name)?;
        let entry = self.by_discriminator.get(&disc).ok_or_else(|| Error::UnknownName {
            kind: "event",
            name: name.to_string(),
        })?;
        let mut out = disc.to_vec();
        entry.layout.encode(value, &mut out)?;
        Ok(out)
    }

    /// Event payload as a program would log it (base64)
    pub fn encode(&self, name: &str, value: &Value) -> Result<String> {
        Ok(STANDARD.encode(self.encode_bytes(name, value)?))
    }

    /// Decodes a raw payload. `Ok(None)` if the discriminator is not one of
    /// this IDL's events.
    pub fn decode_bytes(&self, data: &[u8]) -> Result<Option<Event>> {
        let Some(prefix) = data.get(..DISCRIMINATOR_SIZE) else {
            return Ok(None);
        };
        let mut key = [0u8; DISCRIMINATOR_SIZE];
        key.copy_from_slice(prefix);

        match self.by_discriminator.get(&key) {
            Some(entry) => Ok(Some(Event {
                name: entry.name.clone(),
                data: entry.layout.decode(&data[DISCRIMINATOR_SIZE..])?,
            })),
            None => Ok(None),
        }
    }

    /// Decodes `data` as the named event. The first 8 bytes are skipped
    /// without being compared to the event's discriminator.
    pub fn decode_named(&self, name: &str, data: &[u8]) -> Result<Value> {
        let entry = self
            .by_name
            .get(name)
            .and_then(|disc| self.by_discriminator.get(disc))
            .ok_or_else(|| Error::UnknownName {
                kind: "event",
                name: name.to_string(),
            })?;
        let body = data
            .get(DISCRIMINATOR_SIZE..)
            .ok_or(Error::BufferUnderrun {
                needed: DISCRIMINATOR_SIZE,
                remaining: data.len(),
            })?;
        entry.layout.decode(body)
    }

    /// Decodes self-CPI instruction data (`EVENT_IX_TAG_LE ++ payload`)
    pub fn decode_cpi(&self, ix_data: &[u8]) -> Result<Option<Event>> {
        match ix_data.strip_prefix(&EVENT_IX_TAG_LE[..]) {
            Some(payload) => self.decode_bytes(payload),
            None => Ok(None),
        }
    }

    /// Decodes a logged payload: base58 CPI envelope or base64 event data.
    /// Text that is neither fails with [`Error::MalformedLog`].
    pub fn decode(&self, log: &str) -> Result<Option<Event>> {
        if let Ok(raw) = bs58::decode(log).into_vec() {
            if raw.starts_with(&EVENT_IX_TAG_LE) {
                return self.decode_cpi(&raw);
            }
        }

        let raw = STANDARD
            .decode(log)
            .map_err(|e| Error::malformed_log(log, format!("invalid base64: {}", e)))?;
        self.decode_bytes(&raw)
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry shared between threads.
//!
//! Readers load an immutable snapshot (`ArcSwap`, no lock). Writers are
//! serialized by a mutex, apply their change to a private copy and publish it
//! with one atomic store, so a reader sees either the whole change or none of
//! it, including the re-finalization of every affected referrer.

use crate::builder::TypeBuilder;
use crate::codec::Expected;
use crate::descriptor::{FamilyHandle, TypeHandle};
use crate::error::{DecodeError, DefinitionError, EncodeError};
use crate::record::Record;
use crate::registry::Registry;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Thread-safe handle to a [`Registry`]. Cloning shares the same registry.
#[derive(Clone)]
pub struct SharedRegistry {
    current: Arc<ArcSwap<Registry>>,
    writer: Arc<Mutex<()>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(registry)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Current snapshot. Holding it keeps the registry state stable.
    #[inline]
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Apply a mutation atomically.
    ///
    /// The change is published only if `f` succeeds.
    pub fn update<T, E>(&self, f: impl FnOnce(&mut Registry) -> Result<T, E>) -> Result<T, E> {
        let _guard = self.writer.lock();
        let mut next = Registry::clone(&self.current.load());
        let out = f(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(out)
    }

    pub fn register_family(&self, name: impl Into<String>) -> Result<FamilyHandle, DefinitionError> {
        let name = name.into();
        self.update(|reg| reg.register_family(name))
    }

    pub fn declare(&self, builder: TypeBuilder) -> Result<TypeHandle, DefinitionError> {
        self.update(|reg| reg.declare(builder))
    }

    pub fn serialize(&self, record: &Record) -> Result<JsonValue, EncodeError> {
        self.current.load().serialize(record)
    }

    pub fn deserialize(
        &self,
        value: &JsonValue,
        expected: Expected<'_>,
    ) -> Result<Record, DecodeError> {
        self.current.load().deserialize(value, expected)
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self::new(registry)
    }
}

impl std::fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("SharedRegistry")
            .field("types", &snapshot.type_count())
            .field("families", &snapshot.families().count())
            .finish()
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Routing decoded records to Rust types.
//!
//! The registry decodes into [`Record`]s; a [`Bindings`] table turns those
//! into values of a consumer's own types, typically `Box<dyn Trait>` for a
//! family. Constructors receive the table so nested family fields can be
//! built recursively.

use crate::codec::Expected;
use crate::error::{DecodeError, DefinitionError, FieldPath};
use crate::record::Record;
use crate::registry::Registry;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Builds a `T` from a decoded record.
pub type Constructor<T> = fn(&Record, &Bindings<T>) -> Result<Box<T>, DecodeError>;

/// Constructor table for the variants of one family.
pub struct Bindings<T: ?Sized> {
    family: String,
    constructors: HashMap<String, Constructor<T>>,
}

impl<T: ?Sized> Bindings<T> {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            constructors: HashMap::new(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Route records of `type_name` to `constructor`.
    pub fn bind(
        &mut self,
        type_name: impl Into<String>,
        constructor: Constructor<T>,
    ) -> Result<(), DefinitionError> {
        let type_name = type_name.into();
        if self.constructors.contains_key(&type_name) {
            return Err(DefinitionError::DuplicateBinding {
                family: self.family.clone(),
                type_name,
            });
        }
        log::debug!("[bindings] {}: bound '{}'", self.family, type_name);
        self.constructors.insert(type_name, constructor);
        Ok(())
    }

    pub fn is_bound(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    /// Build a value from a decoded record.
    pub fn construct(&self, record: &Record) -> Result<Box<T>, DecodeError> {
        let constructor = self.constructors.get(record.type_name()).ok_or_else(|| {
            DecodeError::UnknownVariant {
                path: FieldPath::root(),
                family: self.family.clone(),
                tag: record.type_name().to_string(),
            }
        })?;
        constructor(record, self)
    }

    /// Build the family member held by `record.field`.
    pub fn construct_field(&self, record: &Record, field: &str) -> Result<Box<T>, DecodeError> {
        self.construct(record.record(field)?)
    }

    /// Deserialize a member of the bound family and build it.
    pub fn decode(&self, registry: &Registry, value: &JsonValue) -> Result<Box<T>, DecodeError> {
        let record = registry.deserialize(value, Expected::Family(&self.family))?;
        self.construct(&record)
    }
}

impl<T: ?Sized> fmt::Debug for Bindings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<_> = self.constructors.keys().collect();
        bound.sort();
        f.debug_struct("Bindings")
            .field("family", &self.family)
            .field("bound", &bound)
            .finish()
    }
}

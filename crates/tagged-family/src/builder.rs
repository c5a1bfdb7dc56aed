// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder for type declarations.

use crate::descriptor::{FieldDescriptor, FieldType, PrimitiveKind};
use serde_json::Value as JsonValue;

/// Declaration of a record or variant type, consumed by
/// [`Registry::declare`](crate::Registry::declare).
///
/// ```rust
/// use tagged_family::{PrimitiveKind, TypeBuilder};
///
/// let add = TypeBuilder::new("Add")
///     .member_of("Expression")
///     .family_field("left", "Expression")
///     .family_field("right", "Expression");
/// let value = TypeBuilder::new("Value")
///     .member_of("Expression")
///     .field("value", PrimitiveKind::Number);
/// # let _ = (add, value);
/// ```
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    pub(crate) name: String,
    pub(crate) tag: Option<String>,
    pub(crate) family: Option<String>,
    pub(crate) fields: Vec<FieldDescriptor>,
}

impl TypeBuilder {
    /// Start a plain record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            family: None,
            fields: Vec::new(),
        }
    }

    /// Make this type a variant of `family`.
    pub fn member_of(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Override the tag (defaults to the type name).
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        self.fields.push(FieldDescriptor::new(name, field_type.into()));
        self
    }

    /// Add a field with a structural default.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        field_type: impl Into<FieldType>,
        default: JsonValue,
    ) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, field_type.into()).with_default(default));
        self
    }

    /// Add a nullable field; absent input decodes to null.
    pub fn optional_field(self, name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        self.field(name, FieldType::optional(field_type.into()))
    }

    pub fn int_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::Int)
    }

    pub fn float_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::Float)
    }

    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::String)
    }

    pub fn bool_field(self, name: impl Into<String>) -> Self {
        self.field(name, PrimitiveKind::Bool)
    }

    /// Add a field holding any member of `family`.
    pub fn family_field(self, name: impl Into<String>, family: impl Into<String>) -> Self {
        self.field(name, FieldType::family(family))
    }

    /// Add a field holding a member of a generic instantiation of `family`.
    pub fn generic_family_field(
        self,
        name: impl Into<String>,
        family: impl Into<String>,
        args: Vec<FieldType>,
    ) -> Self {
        self.field(name, FieldType::generic(FieldType::family(family), args))
    }

    /// Add a sequence field.
    pub fn sequence_field(self, name: impl Into<String>, element: impl Into<FieldType>) -> Self {
        self.field(name, FieldType::sequence(element.into()))
    }

    /// Add a field embedding a declared type by value.
    pub fn record_field(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.field(name, FieldType::record(type_name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag this type will carry once declared.
    pub fn effective_tag(&self) -> Option<&str> {
        self.family
            .as_ref()
            .map(|_| self.tag.as_deref().unwrap_or(&self.name))
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types.
//!
//! Definition-time failures ([`DefinitionError`]) are programming errors in a
//! schema and abort the registration that raised them. Codec failures
//! ([`DecodeError`], [`EncodeError`]) are ordinary data errors returned to the
//! caller and always carry the [`FieldPath`] where they occurred.

use std::fmt;
use thiserror::Error;

/// Location of a value inside a nested structural value.
///
/// Renders as `left.right[2].value`; the empty path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Field(String),
    Index(usize),
}

impl FieldPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended by a field name.
    pub fn field(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Field(name.to_string()));
        next
    }

    /// Path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

/// Errors raised while declaring families, types and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("family '{0}' is already registered")]
    DuplicateFamilyRegistration(String),

    #[error("family '{family}' already has a variant tagged '{tag}' ('{existing}')")]
    DuplicateTag {
        family: String,
        tag: String,
        existing: String,
    },

    #[error("field '{type_name}.{field}' refers to unregistered family '{family}'")]
    UnregisteredFamilyReference {
        type_name: String,
        field: String,
        family: String,
    },

    #[error("type '{type_name}' is declared as a member of unknown family '{family}'")]
    UnknownFamily { type_name: String, family: String },

    #[error("type '{0}' is already declared")]
    DuplicateType(String),

    #[error("type '{type_name}' declares field '{field}' more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("field '{type_name}.{field}' uses the reserved discriminator name")]
    ReservedField { type_name: String, field: String },

    #[error("field '{type_name}.{field}' refers to undeclared type '{target}'")]
    UnregisteredTypeReference {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("default for '{type_name}.{field}' is invalid: {reason}")]
    InvalidDefault {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("bindings for family '{family}' already route type '{type_name}'")]
    DuplicateBinding { family: String, type_name: String },
}

/// Errors raised while turning a structural value into a [`Record`](crate::Record).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("{path}: missing discriminator field '{field}'")]
    MissingDiscriminator { path: FieldPath, field: String },

    #[error("{path}: unknown variant '{tag}' for family '{family}'")]
    UnknownVariant {
        path: FieldPath,
        family: String,
        tag: String,
    },

    #[error("{path}: expected variant '{expected}', found '{found}'")]
    VariantMismatch {
        path: FieldPath,
        expected: String,
        found: String,
    },

    #[error("{path}: {reason}")]
    FieldValidation { path: FieldPath, reason: String },

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown family '{0}'")]
    UnknownFamily(String),

    #[error("{path}: nesting exceeds the limit of {limit}")]
    DepthExceeded { path: FieldPath, limit: usize },
}

impl DecodeError {
    pub(crate) fn invalid(path: &FieldPath, reason: impl Into<String>) -> Self {
        Self::FieldValidation {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Path where decoding failed, if the error is tied to a location.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::MissingDiscriminator { path, .. }
            | Self::UnknownVariant { path, .. }
            | Self::VariantMismatch { path, .. }
            | Self::FieldValidation { path, .. }
            | Self::DepthExceeded { path, .. } => Some(path),
            Self::UnknownType(_) | Self::UnknownFamily(_) => None,
        }
    }
}

/// Errors raised while turning a [`Record`](crate::Record) into a structural value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{path}: unknown type '{type_name}'")]
    UnknownType { path: FieldPath, type_name: String },

    #[error("{path}: missing field")]
    MissingField { path: FieldPath },

    #[error("{path}: field is not declared by '{type_name}'")]
    UnexpectedField { path: FieldPath, type_name: String },

    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: String,
    },

    #[error("{path}: '{type_name}' is not a member of family '{family}'")]
    NotAMember {
        path: FieldPath,
        family: String,
        type_name: String,
    },

    #[error("{path}: float is not finite")]
    NonFiniteFloat { path: FieldPath },

    #[error("{path}: nesting exceeds the limit of {limit}")]
    DepthExceeded { path: FieldPath, limit: usize },
}

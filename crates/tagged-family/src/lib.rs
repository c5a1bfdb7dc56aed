// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Open, tag-discriminated families of record types.
//!
//! A family is a sum type whose variants are declared independently, in any
//! order, possibly by other crates. Fields typed as "member of family F" are
//! bound late: every time a variant joins F, each type referring to F is
//! re-finalized so its fields accept the grown discriminated union.
//!
//! # Features
//!
//! - **Registry**: families, type declarations and finalized schemas
//! - **Codec**: structural JSON (de)serialization routed by a discriminator field
//! - **SharedRegistry**: lock-free snapshots for registration during live traffic
//! - **Bindings**: route decoded records to your own Rust types
//!
//! # Example
//!
//! ```rust
//! use tagged_family::{Expected, PrimitiveKind, Record, Registry, TypeBuilder};
//!
//! let mut registry = Registry::new();
//! registry.register_family("Expression").unwrap();
//! registry
//!     .declare(TypeBuilder::new("Value").member_of("Expression").field("value", PrimitiveKind::Number))
//!     .unwrap();
//! registry
//!     .declare(
//!         TypeBuilder::new("Add")
//!             .member_of("Expression")
//!             .family_field("left", "Expression")
//!             .family_field("right", "Expression"),
//!     )
//!     .unwrap();
//!
//! let sum = Record::new("Add")
//!     .with("left", Record::new("Value").with("value", 1))
//!     .with("right", Record::new("Value").with("value", 2));
//! let json = registry.serialize(&sum).unwrap();
//! assert_eq!(json["type"], "Add");
//! assert_eq!(json["left"]["type"], "Value");
//!
//! let back = registry.deserialize(&json, Expected::Family("Expression")).unwrap();
//! assert_eq!(back, sum);
//! ```

mod bindings;
mod builder;
mod codec;
pub mod config;
mod descriptor;
pub mod error;
mod family;
mod record;
mod registry;
mod shared;

pub use bindings::{Bindings, Constructor};
pub use builder::TypeBuilder;
pub use codec::{extract_tag, Expected};
pub use config::{ConfigError, RegistryConfig};
pub use descriptor::{
    FamilyHandle, FamilyResolution, FieldDescriptor, FieldType, PrimitiveKind, ResolvedField,
    ResolvedType, TypeHandle, TypeSchema, UnionArm, UnionDescriptor,
};
pub use error::{DecodeError, DefinitionError, EncodeError, FieldPath};
pub use family::{FamilyRegistry, Member, Referrer};
pub use record::{Record, Value};
pub use registry::Registry;
pub use shared::SharedRegistry;

#[cfg(test)]
mod tests;

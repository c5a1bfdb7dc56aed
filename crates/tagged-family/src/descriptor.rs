// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: declared field types and their resolved form.

use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Handle of a declared type inside one [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub(crate) usize);

impl TypeHandle {
    /// Declaration index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a registered family inside one [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyHandle(pub(crate) usize);

impl FamilyHandle {
    /// Registration index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    /// Integer or float; the decoded value keeps whichever it was.
    Number,
    String,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Primitive value.
    Primitive(PrimitiveKind),
    /// Any member of the named family, bound late.
    Family(String),
    /// A declared record or variant type, embedded by value.
    Record(String),
    /// Sequence of elements.
    Sequence(Box<FieldType>),
    /// Value or null.
    Optional(Box<FieldType>),
    /// Generic instantiation, e.g. `Expression[T]`. Arguments are erased
    /// during validation.
    Generic(Box<FieldType>, Vec<FieldType>),
}

impl FieldType {
    pub fn family(name: impl Into<String>) -> Self {
        Self::Family(name.into())
    }

    pub fn record(name: impl Into<String>) -> Self {
        Self::Record(name.into())
    }

    pub fn sequence(element: FieldType) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn generic(origin: FieldType, args: Vec<FieldType>) -> Self {
        Self::Generic(Box::new(origin), args)
    }

    /// Family this field's element type belongs to.
    ///
    /// Containers are looked through and generic instantiations are
    /// stripped down to their origin, so `Family[T]` resolves to `Family`.
    pub fn family_ref(&self) -> Option<&str> {
        match self {
            Self::Family(name) => Some(name),
            Self::Sequence(inner) | Self::Optional(inner) | Self::Generic(inner, _) => {
                inner.family_ref()
            }
            Self::Primitive(_) | Self::Record(_) => None,
        }
    }

    /// Record type named by this field, looking through containers.
    pub fn record_ref(&self) -> Option<&str> {
        match self {
            Self::Record(name) => Some(name),
            Self::Sequence(inner) | Self::Optional(inner) | Self::Generic(inner, _) => {
                inner.record_ref()
            }
            Self::Primitive(_) | Self::Family(_) => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

impl From<PrimitiveKind> for FieldType {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

/// Field as declared on a type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub field_type: FieldType,
    /// Structural default used when the field is absent on input.
    pub default: Option<JsonValue>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    /// Set default value.
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// One arm of a resolved union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionArm {
    /// Discriminator value selecting this arm.
    pub tag: String,
    /// Variant decoded when the tag matches.
    pub variant: TypeHandle,
}

/// Discriminated union over every current member of a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDescriptor {
    pub family: FamilyHandle,
    pub family_name: String,
    /// Field carrying the tag.
    pub discriminator: String,
    /// Arms in member declaration order.
    pub arms: Vec<UnionArm>,
}

impl UnionDescriptor {
    /// Variant selected by a tag.
    pub fn arm(&self, tag: &str) -> Option<TypeHandle> {
        self.arms.iter().find(|a| a.tag == tag).map(|a| a.variant)
    }

    pub fn contains(&self, variant: TypeHandle) -> bool {
        self.arms.iter().any(|a| a.variant == variant)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.arms.iter().map(|a| a.tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }
}

/// What a family reference currently resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyResolution {
    /// No members yet; every value is rejected.
    Placeholder { family: FamilyHandle, name: String },
    /// Exactly one member; the discriminator is still checked.
    Single {
        family: FamilyHandle,
        name: String,
        tag: String,
        variant: TypeHandle,
    },
    /// Two or more members.
    Union(Arc<UnionDescriptor>),
}

impl FamilyResolution {
    pub fn family(&self) -> FamilyHandle {
        match self {
            Self::Placeholder { family, .. } | Self::Single { family, .. } => *family,
            Self::Union(u) => u.family,
        }
    }

    pub fn family_name(&self) -> &str {
        match self {
            Self::Placeholder { name, .. } | Self::Single { name, .. } => name,
            Self::Union(u) => &u.family_name,
        }
    }

    /// Variant selected by a tag, if it is a current member.
    pub fn route(&self, tag: &str) -> Option<TypeHandle> {
        match self {
            Self::Placeholder { .. } => None,
            Self::Single { tag: t, variant, .. } => (t == tag).then_some(*variant),
            Self::Union(u) => u.arm(tag),
        }
    }

    pub fn accepts(&self, variant: TypeHandle) -> bool {
        match self {
            Self::Placeholder { .. } => false,
            Self::Single { variant: v, .. } => *v == variant,
            Self::Union(u) => u.contains(variant),
        }
    }
}

/// Field type after family and record references are resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType {
    Primitive(PrimitiveKind),
    Record(TypeHandle),
    Sequence(Box<ResolvedType>),
    Optional(Box<ResolvedType>),
    Family(FamilyResolution),
}

impl ResolvedType {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.name().to_string(),
            Self::Record(handle) => format!("record #{}", handle.index()),
            Self::Sequence(inner) => format!("sequence of {}", inner.describe()),
            Self::Optional(inner) => format!("optional {}", inner.describe()),
            Self::Family(res) => format!("member of '{}'", res.family_name()),
        }
    }

    /// Discriminated union attached to this type, looking through containers.
    pub fn union(&self) -> Option<&Arc<UnionDescriptor>> {
        match self {
            Self::Family(FamilyResolution::Union(u)) => Some(u),
            Self::Sequence(inner) | Self::Optional(inner) => inner.union(),
            _ => None,
        }
    }
}

/// Field of a finalized schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub declared: FieldType,
    pub resolved: ResolvedType,
    pub default: Option<JsonValue>,
}

impl ResolvedField {
    /// Discriminator rule attached to this field, if it holds a union.
    pub fn discriminator(&self) -> Option<&str> {
        self.resolved.union().map(|u| u.discriminator.as_str())
    }
}

/// Finalized schema of a declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSchema {
    pub name: String,
    /// Discriminator value; present for variants only.
    pub tag: Option<String>,
    pub family: Option<FamilyHandle>,
    pub fields: Vec<ResolvedField>,
    /// Bumped each time re-finalization changes a field.
    pub generation: u64,
}

impl TypeSchema {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_variant(&self) -> bool {
        self.tag.is_some()
    }
}

impl fmt::Display for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, " [{}]", tag)?;
        }
        write!(f, " {{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: {}", field.name, field.resolved.describe())?;
        }
        write!(f, " }}")
    }
}

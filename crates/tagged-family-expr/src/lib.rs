// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Arithmetic expressions as an open `Expression` family.
//!
//! `Value`, `Subtract`, `Multiply` and `Add` are declared in that order; the
//! operators refer to the family before all of its members exist. Further
//! variants can be added by other crates with [`Expressions::declare_variant`].
//!
//! ```rust
//! use tagged_family_expr::{Add, Expressions, Subtract, Value};
//!
//! let expressions = Expressions::new().unwrap();
//! let expr = Subtract::new(Add::new(Value::new(2), Value::new(4)), Value::new(3));
//!
//! let json = expressions.serialize(&expr).unwrap();
//! assert_eq!(json["left"]["type"], "Add");
//!
//! let back = expressions.deserialize(&json).unwrap();
//! assert_eq!(
//!     back.to_string(),
//!     "Subtract(left=Add(left=Value(value=2), right=Value(value=4)), right=Value(value=3))"
//! );
//! ```

use serde_json::Value as JsonValue;
use std::fmt;
use tagged_family::{
    Bindings, Constructor, DecodeError, DefinitionError, EncodeError, FieldPath, FieldType,
    PrimitiveKind, Record, Registry, TypeBuilder, TypeHandle,
};

/// Family name.
pub const FAMILY: &str = "Expression";

/// Numeric payload of a [`Value`]: an integer or a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Number {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Number> for tagged_family::Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(v) => Self::Int(v),
            Number::Float(v) => Self::Float(v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&tagged_family::Value::from(*self), f)
    }
}

/// A member of the expression family.
pub trait Expression: fmt::Debug + Send + Sync {
    /// Structural form of this expression.
    fn to_record(&self) -> Record;
}

impl<E: Expression + ?Sized> Expression for Box<E> {
    fn to_record(&self) -> Record {
        (**self).to_record()
    }
}

impl PartialEq for dyn Expression {
    fn eq(&self, other: &Self) -> bool {
        self.to_record() == other.to_record()
    }
}

impl fmt::Display for dyn Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_record(), f)
    }
}

/// A fixed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub value: Number,
}

impl Value {
    pub fn new(value: impl Into<Number>) -> Self {
        Self {
            value: value.into(),
        }
    }

    fn construct(
        record: &Record,
        _: &Bindings<dyn Expression>,
    ) -> Result<Box<dyn Expression>, DecodeError> {
        let value = match record.require("value")? {
            tagged_family::Value::Int(v) => Number::Int(*v),
            tagged_family::Value::Float(v) => Number::Float(*v),
            other => {
                return Err(DecodeError::FieldValidation {
                    path: FieldPath::root().field("value"),
                    reason: format!("expected number, found {}", other.describe()),
                })
            }
        };
        Ok(Box::new(Self { value }))
    }
}

impl Expression for Value {
    fn to_record(&self) -> Record {
        Record::new("Value").with("value", self.value)
    }
}

macro_rules! binary_expression {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            pub left: Box<dyn Expression>,
            pub right: Box<dyn Expression>,
        }

        impl $name {
            pub fn new(left: impl Expression + 'static, right: impl Expression + 'static) -> Self {
                Self {
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }

            fn declaration() -> TypeBuilder {
                let operand = || {
                    FieldType::generic(FieldType::family(FAMILY), vec![PrimitiveKind::Number.into()])
                };
                TypeBuilder::new(stringify!($name))
                    .member_of(FAMILY)
                    .field("left", operand())
                    .field("right", operand())
            }

            fn construct(
                record: &Record,
                bindings: &Bindings<dyn Expression>,
            ) -> Result<Box<dyn Expression>, DecodeError> {
                Ok(Box::new(Self {
                    left: bindings.construct_field(record, "left")?,
                    right: bindings.construct_field(record, "right")?,
                }))
            }
        }

        impl Expression for $name {
            fn to_record(&self) -> Record {
                Record::new(stringify!($name))
                    .with("left", self.left.to_record())
                    .with("right", self.right.to_record())
            }
        }
    };
}

binary_expression!(
    /// `left - right`.
    Subtract
);
binary_expression!(
    /// `left * right`.
    Multiply
);
binary_expression!(
    /// `left + right`.
    Add
);

/// Registry and constructor table for the expression family.
#[derive(Debug)]
pub struct Expressions {
    registry: Registry,
    bindings: Bindings<dyn Expression>,
}

impl Expressions {
    /// Declare the family in a fresh registry.
    pub fn new() -> Result<Self, DefinitionError> {
        Self::with_registry(Registry::new())
    }

    /// Declare the family into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, DefinitionError> {
        let mut this = Self {
            registry,
            bindings: Bindings::new(FAMILY),
        };
        this.registry.register_family(FAMILY)?;
        this.declare_variant(
            TypeBuilder::new("Value")
                .member_of(FAMILY)
                .field("value", PrimitiveKind::Number),
            Value::construct,
        )?;
        this.declare_variant(Subtract::declaration(), Subtract::construct)?;
        this.declare_variant(Multiply::declaration(), Multiply::construct)?;
        this.declare_variant(Add::declaration(), Add::construct)?;
        Ok(this)
    }

    /// Add a variant defined outside this crate.
    pub fn declare_variant(
        &mut self,
        builder: TypeBuilder,
        constructor: Constructor<dyn Expression>,
    ) -> Result<TypeHandle, DefinitionError> {
        if self.bindings.is_bound(builder.name()) {
            return Err(DefinitionError::DuplicateBinding {
                family: FAMILY.to_string(),
                type_name: builder.name().to_string(),
            });
        }
        let name = builder.name().to_string();
        let handle = self.registry.declare(builder)?;
        self.bindings.bind(name, constructor)?;
        log::debug!(
            "[expr] {} variant(s) declared",
            self.registry.family(FAMILY).map_or(0, |f| f.members().len())
        );
        Ok(handle)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn bindings(&self) -> &Bindings<dyn Expression> {
        &self.bindings
    }

    pub fn serialize(&self, expr: &dyn Expression) -> Result<JsonValue, EncodeError> {
        self.registry.serialize(&expr.to_record())
    }

    pub fn deserialize(&self, value: &JsonValue) -> Result<Box<dyn Expression>, DecodeError> {
        self.bindings.decode(&self.registry, value)
    }
}

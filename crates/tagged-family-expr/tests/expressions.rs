// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Expression family end-to-end tests.

use serde_json::json;
use tagged_family::{
    Bindings, DecodeError, EncodeError, FieldType, Record, Registry, RegistryConfig, TypeBuilder,
};
use tagged_family_expr::{Add, Expression, Expressions, Multiply, Subtract, Value, FAMILY};

fn expression() -> Subtract {
    Subtract::new(Add::new(Value::new(2), Value::new(4)), Value::new(3))
}

fn serialized() -> serde_json::Value {
    json!({
        "left": {
            "left": {"value": 2, "type": "Value"},
            "right": {"value": 4, "type": "Value"},
            "type": "Add"
        },
        "right": {"value": 3, "type": "Value"},
        "type": "Subtract"
    })
}

fn expressions() -> Expressions {
    let _ = env_logger::try_init();
    Expressions::new().unwrap()
}

#[test]
fn test_serialize() {
    let json = expressions().serialize(&expression()).unwrap();
    assert_eq!(json, serialized());
    assert_eq!(
        serde_json::to_string(&json).unwrap(),
        r#"{"left":{"left":{"value":2,"type":"Value"},"right":{"value":4,"type":"Value"},"type":"Add"},"right":{"value":3,"type":"Value"},"type":"Subtract"}"#
    );
}

#[test]
fn test_deserialize() {
    let back = expressions().deserialize(&serialized()).unwrap();
    let expected: Box<dyn Expression> = Box::new(expression());
    assert!(*back == *expected);
}

#[test]
fn test_render() {
    let expr: &dyn Expression = &expression();
    assert_eq!(
        expr.to_string(),
        "Subtract(left=Add(left=Value(value=2), right=Value(value=4)), right=Value(value=3))"
    );
}

#[test]
fn float_values_survive() {
    let expressions = expressions();
    let expr = Multiply::new(Value::new(1.5), Value::new(2));
    let json = expressions.serialize(&expr).unwrap();
    assert_eq!(json["left"]["value"], json!(1.5));

    let back = expressions.deserialize(&json).unwrap();
    let record = back.to_record();
    let left = record.record("left").unwrap();
    assert_eq!(left.get("value"), Some(&tagged_family::Value::Float(1.5)));
}

#[derive(Debug)]
struct Negate {
    operand: Box<dyn Expression>,
}

impl Expression for Negate {
    fn to_record(&self) -> Record {
        Record::new("Negate").with("operand", self.operand.to_record())
    }
}

fn negate(record: &Record, b: &Bindings<dyn Expression>) -> Result<Box<dyn Expression>, DecodeError> {
    Ok(Box::new(Negate {
        operand: b.construct_field(record, "operand")?,
    }))
}

#[test]
fn external_variant_joins_existing_unions() {
    let mut expressions = expressions();
    let input = json!({
        "left": {"operand": {"value": 1, "type": "Value"}, "type": "Negate"},
        "right": {"value": 2, "type": "Value"},
        "type": "Add"
    });
    assert!(matches!(
        expressions.deserialize(&input),
        Err(DecodeError::UnknownVariant { .. })
    ));

    expressions
        .declare_variant(
            TypeBuilder::new("Negate")
                .member_of(FAMILY)
                .field("operand", FieldType::family(FAMILY)),
            negate,
        )
        .unwrap();

    let back = expressions.deserialize(&input).unwrap();
    assert_eq!(
        back.to_string(),
        "Add(left=Negate(operand=Value(value=1)), right=Value(value=2))"
    );
    assert_eq!(expressions.serialize(&*back).unwrap(), input);
}

#[test]
fn undeclared_variant_cannot_be_serialized() {
    let expressions = expressions();
    let expr = Add::new(
        Negate {
            operand: Box::new(Value::new(1)),
        },
        Value::new(2),
    );
    assert!(matches!(
        expressions.serialize(&expr),
        Err(EncodeError::UnknownType { .. })
    ));
}

#[test]
fn custom_discriminator() {
    let config = RegistryConfig {
        discriminator: "kind".into(),
        ..RegistryConfig::default()
    };
    let expressions = Expressions::with_registry(Registry::with_config(config).unwrap()).unwrap();
    let json = expressions.serialize(&Value::new(7)).unwrap();
    assert_eq!(json, json!({"value": 7, "kind": "Value"}));
}

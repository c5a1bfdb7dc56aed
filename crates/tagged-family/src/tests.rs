// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Workflow tests across registry, codec and bindings.

use super::*;
use serde_json::json;

#[test]
fn test_full_workflow() {
    // 1. Family root and a referrer declared before any member exists
    let mut registry = Registry::new();
    registry.register_family("Event").expect("register Event");
    let envelope = registry
        .declare(
            TypeBuilder::new("Envelope")
                .string_field("source")
                .family_field("event", "Event")
                .optional_field("reply", FieldType::family("Event")),
        )
        .expect("declare Envelope");
    assert_eq!(registry.family("Event").unwrap().referrers().len(), 1);

    // 2. Members arrive later
    registry
        .declare(TypeBuilder::new("Ping").member_of("Event").tag("ping"))
        .expect("declare Ping");
    registry
        .declare(
            TypeBuilder::new("Batch")
                .member_of("Event")
                .tag("batch")
                .sequence_field("events", FieldType::family("Event")),
        )
        .expect("declare Batch");

    // 3. The referrer now sees both members
    let schema = registry.schema(envelope).unwrap();
    let union = schema.field("event").unwrap().resolved.union().unwrap();
    assert_eq!(union.tags().collect::<Vec<_>>(), vec!["ping", "batch"]);
    assert_eq!(schema.field("reply").unwrap().discriminator(), Some("type"));

    // 4. Round-trip through the structural form
    let record = Record::new("Envelope")
        .with("source", "sensor-1")
        .with(
            "event",
            Record::new("Batch").with("events", vec![Record::new("Ping"), Record::new("Ping")]),
        )
        .with("reply", Value::Null);
    let json = registry.serialize(&record).expect("serialize");
    assert_eq!(
        json,
        json!({
            "source": "sensor-1",
            "event": {"events": [{"type": "ping"}, {"type": "ping"}], "type": "batch"},
            "reply": null
        })
    );
    let back = registry
        .deserialize(&json, Expected::Type("Envelope"))
        .expect("deserialize");
    assert_eq!(back, record);

    // 5. Routing is by tag, not type name
    let err = registry
        .deserialize(
            &json!({"source": "x", "event": {"type": "Ping"}}),
            Expected::Type("Envelope"),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "event: unknown variant 'Ping' for family 'Event'");
}

#[test]
fn test_custom_discriminator() {
    let config = RegistryConfig {
        discriminator: "kind".into(),
        ..RegistryConfig::default()
    };
    let mut registry = Registry::with_config(config).expect("config");
    registry.register_family("Animal").unwrap();
    registry
        .declare(TypeBuilder::new("Dog").member_of("Animal").string_field("type"))
        .expect("'type' is an ordinary field here");
    registry
        .declare(TypeBuilder::new("Cat").member_of("Animal"))
        .unwrap();

    let dog = Record::new("Dog").with("type", "beagle");
    let json = registry.serialize(&dog).unwrap();
    assert_eq!(json, json!({"type": "beagle", "kind": "Dog"}));
    assert_eq!(extract_tag(&json, "kind").unwrap(), "Dog");
    assert_eq!(
        registry.deserialize(&json, Expected::Family("Animal")).unwrap(),
        dog
    );
}

#[test]
fn test_bad_config_rejected() {
    let config = RegistryConfig {
        max_depth: 0,
        ..RegistryConfig::default()
    };
    assert!(matches!(
        Registry::with_config(config),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_schema_display() {
    let mut registry = Registry::new();
    registry.register_family("Shape").unwrap();
    let circle = registry
        .declare(TypeBuilder::new("Circle").member_of("Shape").float_field("r"))
        .unwrap();
    assert_eq!(
        registry.schema(circle).unwrap().to_string(),
        "Circle [Circle] { r: float }"
    );
}

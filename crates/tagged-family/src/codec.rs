// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural (de)serialization of records against finalized schemas.
//!
//! Variants serialize as objects holding their declared fields followed by
//! the discriminator. Deserializing a family-typed value reads the
//! discriminator first and routes to the member it names.
//!
//! Decoding completes a record: absent optional fields become null and
//! absent defaulted fields take their default. Encoding requires every
//! declared field to be present, so anything `serialize` accepts decodes
//! back to an equal record.

use crate::descriptor::{FamilyResolution, PrimitiveKind, ResolvedType, TypeHandle, TypeSchema};
use crate::error::{DecodeError, EncodeError, FieldPath};
use crate::record::{Record, Value};
use crate::registry::Registry;
use serde_json::{Map, Number, Value as JsonValue};

/// What a top-level value is deserialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected<'a> {
    /// Any current member of the named family.
    Family(&'a str),
    /// Exactly the named type.
    Type(&'a str),
}

impl Registry {
    /// Serialize a record into a structural value.
    pub fn serialize(&self, record: &Record) -> Result<JsonValue, EncodeError> {
        Encoder::new(self).encode_record(record, &FieldPath::root())
    }

    /// Deserialize a structural value.
    pub fn deserialize(
        &self,
        value: &JsonValue,
        expected: Expected<'_>,
    ) -> Result<Record, DecodeError> {
        let decoder = Decoder::new(self);
        let root = FieldPath::root();
        match expected {
            Expected::Family(name) => {
                let family = self
                    .family(name)
                    .ok_or_else(|| DecodeError::UnknownFamily(name.to_string()))?;
                decoder.decode_family(value, &family.resolution(), &root)
            }
            Expected::Type(name) => {
                let handle = self
                    .type_handle(name)
                    .ok_or_else(|| DecodeError::UnknownType(name.to_string()))?;
                decoder.decode_record(value, handle, &root)
            }
        }
    }
}

/// Read the tag of a top-level structural value.
///
/// Absent and non-string discriminators both count as missing.
pub fn extract_tag<'v>(value: &'v JsonValue, discriminator: &str) -> Result<&'v str, DecodeError> {
    tag_at(value, discriminator, &FieldPath::root())
}

fn tag_at<'v>(
    value: &'v JsonValue,
    discriminator: &str,
    path: &FieldPath,
) -> Result<&'v str, DecodeError> {
    value
        .get(discriminator)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| DecodeError::MissingDiscriminator {
            path: path.clone(),
            field: discriminator.to_string(),
        })
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(n) if n.is_f64() => "float",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "object",
    }
}

/// Structural value decoder bound to one registry snapshot.
pub(crate) struct Decoder<'r> {
    registry: &'r Registry,
    discriminator: &'r str,
    max_depth: usize,
    deny_unknown_fields: bool,
}

impl<'r> Decoder<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        let config = registry.config();
        Self {
            registry,
            discriminator: &config.discriminator,
            max_depth: config.max_depth,
            deny_unknown_fields: config.deny_unknown_fields,
        }
    }

    pub(crate) fn decode_value(
        &self,
        raw: &JsonValue,
        ty: &ResolvedType,
        path: &FieldPath,
    ) -> Result<Value, DecodeError> {
        if path.depth() > self.max_depth {
            return Err(DecodeError::DepthExceeded {
                path: path.clone(),
                limit: self.max_depth,
            });
        }
        match ty {
            ResolvedType::Primitive(kind) => decode_primitive(raw, *kind, path),
            ResolvedType::Optional(_) if raw.is_null() => Ok(Value::Null),
            ResolvedType::Optional(inner) => self.decode_value(raw, inner, path),
            ResolvedType::Sequence(inner) => {
                let items = raw.as_array().ok_or_else(|| {
                    DecodeError::invalid(
                        path,
                        format!("expected sequence, found {}", json_kind(raw)),
                    )
                })?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.decode_value(item, inner, &path.index(i)))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Sequence)
            }
            ResolvedType::Record(handle) => self.decode_record(raw, *handle, path).map(Value::from),
            ResolvedType::Family(resolution) => {
                self.decode_family(raw, resolution, path).map(Value::from)
            }
        }
    }

    /// Route a family-typed value by its tag.
    pub(crate) fn decode_family(
        &self,
        raw: &JsonValue,
        resolution: &FamilyResolution,
        path: &FieldPath,
    ) -> Result<Record, DecodeError> {
        let object = expect_object(raw, path)?;
        let tag = tag_at(raw, self.discriminator, path)?;
        let variant = resolution
            .route(tag)
            .ok_or_else(|| DecodeError::UnknownVariant {
                path: path.clone(),
                family: resolution.family_name().to_string(),
                tag: tag.to_string(),
            })?;
        let schema = self.schema(variant)?;
        log::trace!("[codec] {}: '{}' routed to {}", path, tag, schema.name);
        self.decode_fields(object, schema, path)
    }

    /// Decode a value of one specific declared type.
    pub(crate) fn decode_record(
        &self,
        raw: &JsonValue,
        handle: TypeHandle,
        path: &FieldPath,
    ) -> Result<Record, DecodeError> {
        let object = expect_object(raw, path)?;
        let schema = self.schema(handle)?;
        if let (Some(tag), Some(family)) = (&schema.tag, schema.family) {
            let found = tag_at(raw, self.discriminator, path)?;
            if found != tag {
                let family = self
                    .registry
                    .family_at(family)
                    .ok_or_else(|| DecodeError::UnknownFamily(format!("#{}", family.index())))?;
                return Err(if family.serializer_for_tag(found).is_some() {
                    DecodeError::VariantMismatch {
                        path: path.clone(),
                        expected: tag.clone(),
                        found: found.to_string(),
                    }
                } else {
                    DecodeError::UnknownVariant {
                        path: path.clone(),
                        family: family.name().to_string(),
                        tag: found.to_string(),
                    }
                });
            }
        }
        self.decode_fields(object, schema, path)
    }

    fn decode_fields(
        &self,
        object: &Map<String, JsonValue>,
        schema: &TypeSchema,
        path: &FieldPath,
    ) -> Result<Record, DecodeError> {
        if self.deny_unknown_fields {
            let unknown = object.keys().find(|key| {
                schema.field(key).is_none()
                    && !(schema.is_variant() && key.as_str() == self.discriminator)
            });
            if let Some(key) = unknown {
                return Err(DecodeError::invalid(
                    &path.field(key),
                    format!("field is not declared by '{}'", schema.name),
                ));
            }
        }

        let mut record = Record::new(schema.name.as_str());
        for field in &schema.fields {
            let field_path = path.field(&field.name);
            let value = match (object.get(&field.name), &field.default) {
                (Some(raw), _) => self.decode_value(raw, &field.resolved, &field_path)?,
                (None, Some(default)) => self.decode_value(default, &field.resolved, &field_path)?,
                (None, None) if matches!(field.resolved, ResolvedType::Optional(_)) => Value::Null,
                (None, None) => {
                    return Err(DecodeError::invalid(&field_path, "missing required field"))
                }
            };
            record.set(field.name.as_str(), value);
        }
        Ok(record)
    }

    fn schema(&self, handle: TypeHandle) -> Result<&'r TypeSchema, DecodeError> {
        self.registry
            .schema(handle)
            .map(|schema| &**schema)
            .ok_or_else(|| DecodeError::UnknownType(format!("#{}", handle.index())))
    }
}

fn expect_object<'v>(
    raw: &'v JsonValue,
    path: &FieldPath,
) -> Result<&'v Map<String, JsonValue>, DecodeError> {
    raw.as_object().ok_or_else(|| {
        DecodeError::invalid(path, format!("expected object, found {}", json_kind(raw)))
    })
}

fn decode_primitive(
    raw: &JsonValue,
    kind: PrimitiveKind,
    path: &FieldPath,
) -> Result<Value, DecodeError> {
    let value = match (kind, raw) {
        (PrimitiveKind::Bool, JsonValue::Bool(b)) => Some(Value::Bool(*b)),
        (PrimitiveKind::Int, JsonValue::Number(n)) => {
            if n.is_u64() && n.as_i64().is_none() {
                return Err(DecodeError::invalid(path, "integer out of range"));
            }
            n.as_i64().map(Value::Int)
        }
        // Integers are accepted where floats are expected.
        (PrimitiveKind::Float, JsonValue::Number(n)) => n.as_f64().map(Value::Float),
        (PrimitiveKind::Number, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float)),
        (PrimitiveKind::String, JsonValue::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    };
    value.ok_or_else(|| {
        DecodeError::invalid(
            path,
            format!("expected {}, found {}", kind.name(), json_kind(raw)),
        )
    })
}

/// Structural value encoder bound to one registry snapshot.
struct Encoder<'r> {
    registry: &'r Registry,
    discriminator: &'r str,
    max_depth: usize,
}

impl<'r> Encoder<'r> {
    fn new(registry: &'r Registry) -> Self {
        let config = registry.config();
        Self {
            registry,
            discriminator: &config.discriminator,
            max_depth: config.max_depth,
        }
    }

    fn check_depth(&self, path: &FieldPath) -> Result<(), EncodeError> {
        if path.depth() > self.max_depth {
            return Err(EncodeError::DepthExceeded {
                path: path.clone(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn encode_record(&self, record: &Record, path: &FieldPath) -> Result<JsonValue, EncodeError> {
        self.check_depth(path)?;
        let schema = self.registry.schema_of(record.type_name()).ok_or_else(|| {
            EncodeError::UnknownType {
                path: path.clone(),
                type_name: record.type_name().to_string(),
            }
        })?;

        if let Some((name, _)) = record.fields().find(|(name, _)| schema.field(name).is_none()) {
            return Err(EncodeError::UnexpectedField {
                path: path.field(name),
                type_name: schema.name.clone(),
            });
        }

        let mut object = Map::new();
        for field in &schema.fields {
            let field_path = path.field(&field.name);
            // Defaults and implicit nulls are filled in on decode only.
            let value = record.get(&field.name).ok_or_else(|| EncodeError::MissingField {
                path: field_path.clone(),
            })?;
            let json = self.encode_value(value, &field.resolved, &field_path)?;
            object.insert(field.name.clone(), json);
        }
        if let Some(tag) = &schema.tag {
            object.insert(self.discriminator.to_string(), JsonValue::String(tag.clone()));
        }
        Ok(JsonValue::Object(object))
    }

    fn encode_value(
        &self,
        value: &Value,
        ty: &ResolvedType,
        path: &FieldPath,
    ) -> Result<JsonValue, EncodeError> {
        self.check_depth(path)?;
        match (ty, value) {
            (ResolvedType::Optional(_), Value::Null) => Ok(JsonValue::Null),
            (ResolvedType::Optional(inner), _) => self.encode_value(value, inner, path),
            (ResolvedType::Primitive(kind), _) => encode_primitive(value, *kind, path),
            (ResolvedType::Sequence(inner), Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.encode_value(item, inner, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            (ResolvedType::Record(handle), Value::Record(record)) => {
                let expected = self.registry.schema(*handle).map(|s| s.name.as_str());
                if expected != Some(record.type_name()) {
                    return Err(self.mismatch(ty, value, path));
                }
                self.encode_record(record, path)
            }
            (ResolvedType::Family(resolution), Value::Record(record)) => {
                let handle = self.registry.type_handle(record.type_name()).ok_or_else(|| {
                    EncodeError::UnknownType {
                        path: path.clone(),
                        type_name: record.type_name().to_string(),
                    }
                })?;
                if !resolution.accepts(handle) {
                    return Err(EncodeError::NotAMember {
                        path: path.clone(),
                        family: resolution.family_name().to_string(),
                        type_name: record.type_name().to_string(),
                    });
                }
                self.encode_record(record, path)
            }
            _ => Err(self.mismatch(ty, value, path)),
        }
    }

    fn mismatch(&self, ty: &ResolvedType, value: &Value, path: &FieldPath) -> EncodeError {
        EncodeError::TypeMismatch {
            path: path.clone(),
            expected: self.describe(ty),
            found: value.describe(),
        }
    }

    fn describe(&self, ty: &ResolvedType) -> String {
        match ty {
            ResolvedType::Record(handle) => match self.registry.schema(*handle) {
                Some(schema) => format!("record '{}'", schema.name),
                None => ty.describe(),
            },
            ResolvedType::Sequence(inner) => format!("sequence of {}", self.describe(inner)),
            ResolvedType::Optional(inner) => format!("optional {}", self.describe(inner)),
            _ => ty.describe(),
        }
    }
}

fn encode_primitive(
    value: &Value,
    kind: PrimitiveKind,
    path: &FieldPath,
) -> Result<JsonValue, EncodeError> {
    let float = |v: f64| {
        Number::from_f64(v)
            .map(JsonValue::Number)
            .ok_or_else(|| EncodeError::NonFiniteFloat { path: path.clone() })
    };
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => Ok(JsonValue::Bool(*b)),
        (PrimitiveKind::Int | PrimitiveKind::Number, Value::Int(i)) => Ok(JsonValue::from(*i)),
        (PrimitiveKind::Float | PrimitiveKind::Number, Value::Float(f)) => float(*f),
        (PrimitiveKind::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        _ => Err(EncodeError::TypeMismatch {
            path: path.clone(),
            expected: kind.name().to_string(),
            found: value.describe(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use crate::config::RegistryConfig;
    use crate::descriptor::FieldType;
    use serde_json::json;

    fn shapes(config: RegistryConfig) -> Registry {
        let mut reg = Registry::with_config(config).unwrap();
        reg.register_family("Shape").unwrap();
        reg.declare(
            TypeBuilder::new("Circle")
                .member_of("Shape")
                .float_field("r")
                .optional_field("label", PrimitiveKind::String),
        )
        .unwrap();
        reg.declare(
            TypeBuilder::new("Group")
                .member_of("Shape")
                .sequence_field("items", FieldType::family("Shape"))
                .field_with_default("visible", PrimitiveKind::Bool, json!(true)),
        )
        .unwrap();
        reg
    }

    fn circle(r: f64) -> Record {
        Record::new("Circle").with("r", r).with("label", Value::Null)
    }

    #[test]
    fn discriminator_is_emitted_last() {
        let reg = shapes(RegistryConfig::default());
        let json = reg.serialize(&circle(1.5)).unwrap();
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"r":1.5,"label":null,"type":"Circle"}"#
        );
    }

    #[test]
    fn nested_family_values_round_trip() {
        let reg = shapes(RegistryConfig::default());
        let inner = Record::new("Group")
            .with("items", Vec::<Value>::new())
            .with("visible", true);
        let group = Record::new("Group")
            .with("items", vec![circle(1.0), inner])
            .with("visible", false);

        let json = reg.serialize(&group).unwrap();
        assert_eq!(json["items"][1]["visible"], json!(true));
        let back = reg.deserialize(&json, Expected::Family("Shape")).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn tag_resolution_errors() {
        let reg = shapes(RegistryConfig::default());
        let err = reg
            .deserialize(&json!({"r": 1.0}), Expected::Family("Shape"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingDiscriminator { .. }));

        let err = reg
            .deserialize(&json!({"type": "Hexagon"}), Expected::Family("Shape"))
            .unwrap_err();
        assert_eq!(err.to_string(), "<root>: unknown variant 'Hexagon' for family 'Shape'");

        let err = reg
            .deserialize(
                &json!({"items": [{"type": "Blob"}], "type": "Group"}),
                Expected::Family("Shape"),
            )
            .unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("items[0]"));
    }

    #[test]
    fn specific_variant_checks_tag() {
        let reg = shapes(RegistryConfig::default());
        let err = reg
            .deserialize(&json!({"items": [], "type": "Group"}), Expected::Type("Circle"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::VariantMismatch { .. }));
        let err = reg
            .deserialize(&json!({"r": 2}), Expected::Type("Circle"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingDiscriminator { .. }));
    }

    #[test]
    fn field_validation() {
        let reg = shapes(RegistryConfig::default());
        let back = reg
            .deserialize(&json!({"r": 2, "type": "Circle"}), Expected::Family("Shape"))
            .unwrap();
        assert_eq!(back.float("r").unwrap(), 2.0);
        assert!(back.get("label").unwrap().is_null());

        let err = reg
            .deserialize(&json!({"r": "big", "type": "Circle"}), Expected::Family("Shape"))
            .unwrap_err();
        assert_eq!(err.to_string(), "r: expected float, found string");

        let err = reg
            .deserialize(&json!({"type": "Circle"}), Expected::Family("Shape"))
            .unwrap_err();
        assert_eq!(err.to_string(), "r: missing required field");
    }

    #[test]
    fn unknown_fields_follow_config() {
        let input = json!({"r": 1.0, "colour": "red", "type": "Circle"});
        let lenient = shapes(RegistryConfig::default());
        assert!(lenient.deserialize(&input, Expected::Family("Shape")).is_ok());

        let strict = shapes(RegistryConfig {
            deny_unknown_fields: true,
            ..RegistryConfig::default()
        });
        let err = strict.deserialize(&input, Expected::Family("Shape")).unwrap_err();
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("colour"));
    }

    #[test]
    fn depth_limit() {
        let reg = shapes(RegistryConfig {
            max_depth: 4,
            ..RegistryConfig::default()
        });
        let mut nested = json!({"items": [], "type": "Group"});
        for _ in 0..3 {
            nested = json!({"items": [nested], "type": "Group"});
        }
        let err = reg.deserialize(&nested, Expected::Family("Shape")).unwrap_err();
        assert!(matches!(err, DecodeError::DepthExceeded { limit: 4, .. }));
    }

    #[test]
    fn encode_errors() {
        let reg = shapes(RegistryConfig::default());
        assert!(matches!(
            reg.serialize(&Record::new("Circle")),
            Err(EncodeError::MissingField { .. })
        ));
        assert!(matches!(
            reg.serialize(&circle(1.0).with("z", 1)),
            Err(EncodeError::UnexpectedField { .. })
        ));
        assert!(matches!(
            reg.serialize(&Record::new("Circle").with("r", 1)),
            Err(EncodeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            reg.serialize(&circle(f64::NAN)),
            Err(EncodeError::NonFiniteFloat { .. })
        ));
        assert!(matches!(
            reg.serialize(&Record::new("Ghost")),
            Err(EncodeError::UnknownType { .. })
        ));
    }

    #[test]
    fn encode_rejects_non_members() {
        let mut reg = shapes(RegistryConfig::default());
        reg.declare(TypeBuilder::new("Note").string_field("text")).unwrap();
        let group = Record::new("Group")
            .with("items", vec![Record::new("Note").with("text", "hi")])
            .with("visible", true);
        let err = reg.serialize(&group).unwrap_err();
        assert_eq!(err.to_string(), "items[0]: 'Note' is not a member of family 'Shape'");
    }

    #[test]
    fn omitted_optional_and_default_fields_are_rejected_on_encode() {
        let mut reg = shapes(RegistryConfig::default());
        reg.declare(
            TypeBuilder::new("Badge")
                .member_of("Shape")
                .float_field("r")
                .optional_field("label", PrimitiveKind::String)
                .field_with_default("visible", PrimitiveKind::Bool, json!(true)),
        )
        .unwrap();

        let partial = Record::new("Badge").with("r", 1.0);
        let err = reg.serialize(&partial).unwrap_err();
        assert!(matches!(err, EncodeError::MissingField { .. }));
        assert_eq!(err.to_string(), "label: missing field");

        let err = reg
            .serialize(&partial.clone().with("label", Value::Null))
            .unwrap_err();
        assert_eq!(err.to_string(), "visible: missing field");

        // Decoding completes the record; the completed form survives a round trip.
        let completed = reg
            .deserialize(&json!({"r": 1.0, "type": "Badge"}), Expected::Family("Shape"))
            .unwrap();
        assert_eq!(completed, partial.with("label", Value::Null).with("visible", true));
        let json = reg.serialize(&completed).unwrap();
        assert_eq!(json, json!({"r": 1.0, "label": null, "visible": true, "type": "Badge"}));
        assert_eq!(reg.deserialize(&json, Expected::Family("Shape")).unwrap(), completed);
    }

    #[test]
    fn family_default_is_never_copied_out_by_encode() {
        let mut reg = shapes(RegistryConfig::default());
        reg.declare(TypeBuilder::new("Frame").field_with_default(
            "content",
            FieldType::family("Shape"),
            json!({"type": "Ghost"}),
        ))
        .unwrap();

        let err = reg.serialize(&Record::new("Frame")).unwrap_err();
        assert_eq!(err.to_string(), "content: missing field");

        let err = reg.deserialize(&json!({}), Expected::Type("Frame")).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownVariant { .. }));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("content"));

        let framed = Record::new("Frame").with("content", circle(2.0));
        let json = reg.serialize(&framed).unwrap();
        assert_eq!(reg.deserialize(&json, Expected::Type("Frame")).unwrap(), framed);
    }

    #[test]
    fn extract_tag_reads_root() {
        assert_eq!(extract_tag(&json!({"type": "Circle"}), "type").unwrap(), "Circle");
        assert!(matches!(
            extract_tag(&json!({"type": 3}), "type"),
            Err(DecodeError::MissingDiscriminator { .. })
        ));
        assert!(extract_tag(&json!([1]), "type").is_err());
    }

    #[test]
    fn number_keeps_integer_or_float() {
        let mut reg = Registry::new();
        reg.declare(TypeBuilder::new("Reading").field("v", PrimitiveKind::Number))
            .unwrap();
        let int = reg.deserialize(&json!({"v": 2}), Expected::Type("Reading")).unwrap();
        assert_eq!(int.get("v"), Some(&Value::Int(2)));
        let float = reg.deserialize(&json!({"v": 2.5}), Expected::Type("Reading")).unwrap();
        assert_eq!(float.get("v"), Some(&Value::Float(2.5)));
        assert_eq!(reg.serialize(&int).unwrap(), json!({"v": 2}));
    }
}

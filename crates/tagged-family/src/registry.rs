// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry of families and declared types.
//!
//! ## Declaration protocol
//!
//! [`Registry::declare`] validates the whole declaration first, then:
//!
//! 1. records the type, with the discriminator implied by its tag when it is
//!    a variant;
//! 2. registers it as a referrer of every family its fields refer to;
//! 3. finalizes its own schema against the families' current resolution;
//! 4. adds it as a member of its own family, then re-finalizes that family's
//!    referrers, latest-registered first.
//!
//! Referrer registration comes before membership so a self-referencing
//! variant is corrected to the grown union by the same membership change.

use crate::builder::TypeBuilder;
use crate::codec::Decoder;
use crate::config::{ConfigError, RegistryConfig};
use crate::descriptor::{
    FamilyHandle, FieldDescriptor, FieldType, PrimitiveKind, ResolvedField, ResolvedType,
    TypeHandle, TypeSchema,
};
use crate::error::{DefinitionError, FieldPath};
use crate::family::FamilyRegistry;
use crate::record::Record;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Field type with every reference bound to a handle.
#[derive(Debug, Clone, PartialEq)]
enum BoundType {
    Primitive(PrimitiveKind),
    Family(FamilyHandle),
    Record(TypeHandle),
    Sequence(Box<BoundType>),
    Optional(Box<BoundType>),
}

impl BoundType {
    fn family(&self) -> Option<FamilyHandle> {
        match self {
            Self::Family(handle) => Some(*handle),
            Self::Sequence(inner) | Self::Optional(inner) => inner.family(),
            Self::Primitive(_) | Self::Record(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct TypeEntry {
    fields: Vec<FieldDescriptor>,
    bound: Vec<BoundType>,
    schema: Arc<TypeSchema>,
}

/// Checked declaration, ready to apply.
struct Plan {
    family: Option<FamilyHandle>,
    tag: Option<String>,
    bound: Vec<BoundType>,
}

/// Families, declared types and their finalized schemas.
///
/// Mutation happens at definition time through `&mut self`; for registration
/// concurrent with live traffic use [`SharedRegistry`](crate::SharedRegistry).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    config: RegistryConfig,
    families: Vec<FamilyRegistry>,
    family_index: HashMap<String, FamilyHandle>,
    types: Vec<TypeEntry>,
    type_index: HashMap<String, TypeHandle>,
}

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a validated configuration.
    pub fn with_config(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a family root. Each name can be registered once.
    pub fn register_family(
        &mut self,
        name: impl Into<String>,
    ) -> Result<FamilyHandle, DefinitionError> {
        let name = name.into();
        if self.family_index.contains_key(&name) {
            return Err(DefinitionError::DuplicateFamilyRegistration(name));
        }
        let handle = FamilyHandle(self.families.len());
        self.families.push(FamilyRegistry::new(
            handle,
            name.clone(),
            self.config.discriminator.clone(),
        ));
        log::debug!("[registry] registered family '{}'", name);
        self.family_index.insert(name, handle);
        Ok(handle)
    }

    /// Declare a record or variant type.
    ///
    /// Nothing is changed when an error is returned.
    pub fn declare(&mut self, builder: TypeBuilder) -> Result<TypeHandle, DefinitionError> {
        let plan = self.plan(&builder)?;
        let TypeBuilder { name, fields, .. } = builder;
        let handle = TypeHandle(self.types.len());

        self.types.push(TypeEntry {
            fields,
            bound: plan.bound,
            schema: Arc::new(TypeSchema {
                name: name.clone(),
                tag: plan.tag.clone(),
                family: plan.family,
                fields: Vec::new(),
                generation: 0,
            }),
        });
        self.type_index.insert(name.clone(), handle);

        let entry = &self.types[handle.0];
        let references: Vec<(String, FamilyHandle)> = entry
            .fields
            .iter()
            .zip(&entry.bound)
            .filter_map(|(field, bound)| bound.family().map(|f| (field.name.clone(), f)))
            .collect();
        for (field, family) in &references {
            self.families[family.0].add_referrer(handle, field);
        }

        let fields = self.resolve_fields(handle);
        Arc::make_mut(&mut self.types[handle.0].schema).fields = fields;
        log::debug!(
            "[registry] declared '{}' ({} field(s), {} family reference(s))",
            name,
            self.types[handle.0].fields.len(),
            references.len()
        );

        if let (Some(family), Some(tag)) = (plan.family, plan.tag.as_deref()) {
            let stale = self.families[family.0].add_member(handle, &name, tag)?;
            for referrer in stale {
                self.refinalize(referrer);
            }
        }
        Ok(handle)
    }

    fn plan(&self, builder: &TypeBuilder) -> Result<Plan, DefinitionError> {
        let name = &builder.name;
        if self.type_index.contains_key(name) {
            return Err(DefinitionError::DuplicateType(name.clone()));
        }

        let family = match &builder.family {
            Some(family) => Some(self.family_index.get(family).copied().ok_or_else(|| {
                DefinitionError::UnknownFamily {
                    type_name: name.clone(),
                    family: family.clone(),
                }
            })?),
            None => None,
        };
        let tag = builder.effective_tag().map(str::to_string);
        if let (Some(family), Some(tag)) = (family, tag.as_deref()) {
            self.families[family.0].check_tag(tag, TypeHandle(self.types.len()))?;
        }

        let mut seen = HashSet::new();
        let mut bound = Vec::with_capacity(builder.fields.len());
        for field in &builder.fields {
            if family.is_some() && field.name == self.config.discriminator {
                return Err(DefinitionError::ReservedField {
                    type_name: name.clone(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    type_name: name.clone(),
                    field: field.name.clone(),
                });
            }
            let field_bound = self.bind(name, &field.name, &field.field_type)?;
            if let Some(default) = &field.default {
                self.check_default(name, field, &field_bound, default)?;
            }
            bound.push(field_bound);
        }

        Ok(Plan { family, tag, bound })
    }

    fn bind(
        &self,
        type_name: &str,
        field: &str,
        field_type: &FieldType,
    ) -> Result<BoundType, DefinitionError> {
        Ok(match field_type {
            FieldType::Primitive(kind) => BoundType::Primitive(*kind),
            FieldType::Family(family) => {
                let handle = self.family_index.get(family).copied().ok_or_else(|| {
                    DefinitionError::UnregisteredFamilyReference {
                        type_name: type_name.to_string(),
                        field: field.to_string(),
                        family: family.clone(),
                    }
                })?;
                BoundType::Family(handle)
            }
            FieldType::Record(target) => {
                let handle = self.type_index.get(target).copied().ok_or_else(|| {
                    DefinitionError::UnregisteredTypeReference {
                        type_name: type_name.to_string(),
                        field: field.to_string(),
                        target: target.clone(),
                    }
                })?;
                BoundType::Record(handle)
            }
            FieldType::Sequence(inner) => {
                BoundType::Sequence(Box::new(self.bind(type_name, field, inner)?))
            }
            FieldType::Optional(inner) => {
                BoundType::Optional(Box::new(self.bind(type_name, field, inner)?))
            }
            FieldType::Generic(origin, _) => self.bind(type_name, field, origin)?,
        })
    }

    /// Defaults that do not involve a family are checked now; family members
    /// may legitimately appear later, so those defaults are checked when
    /// decoding fills them in.
    fn check_default(
        &self,
        type_name: &str,
        field: &FieldDescriptor,
        bound: &BoundType,
        default: &serde_json::Value,
    ) -> Result<(), DefinitionError> {
        if bound.family().is_some() {
            return Ok(());
        }
        let resolved = self.resolve(bound);
        Decoder::new(self)
            .decode_value(default, &resolved, &FieldPath::root().field(&field.name))
            .map(|_| ())
            .map_err(|e| DefinitionError::InvalidDefault {
                type_name: type_name.to_string(),
                field: field.name.clone(),
                reason: e.to_string(),
            })
    }

    fn resolve(&self, bound: &BoundType) -> ResolvedType {
        match bound {
            BoundType::Primitive(kind) => ResolvedType::Primitive(*kind),
            BoundType::Record(handle) => ResolvedType::Record(*handle),
            BoundType::Sequence(inner) => ResolvedType::Sequence(Box::new(self.resolve(inner))),
            BoundType::Optional(inner) => ResolvedType::Optional(Box::new(self.resolve(inner))),
            BoundType::Family(handle) => ResolvedType::Family(self.families[handle.0].resolution()),
        }
    }

    fn resolve_fields(&self, handle: TypeHandle) -> Vec<ResolvedField> {
        let entry = &self.types[handle.0];
        entry
            .fields
            .iter()
            .zip(&entry.bound)
            .map(|(field, bound)| ResolvedField {
                name: field.name.clone(),
                declared: field.field_type.clone(),
                resolved: self.resolve(bound),
                default: field.default.clone(),
            })
            .collect()
    }

    /// Recompute a type's schema from the current family resolutions.
    ///
    /// Leaves the schema untouched when no field changed.
    fn refinalize(&mut self, handle: TypeHandle) {
        let fields = self.resolve_fields(handle);
        let entry = &mut self.types[handle.0];
        if entry.schema.fields == fields {
            log::debug!("[registry] '{}' unchanged", entry.schema.name);
            return;
        }
        let schema = Arc::make_mut(&mut entry.schema);
        schema.fields = fields;
        schema.generation += 1;
        log::debug!(
            "[registry] re-finalized '{}' (generation {})",
            schema.name,
            schema.generation
        );
    }

    /// Family registry by name.
    pub fn family(&self, name: &str) -> Option<&FamilyRegistry> {
        self.family_index.get(name).map(|h| &self.families[h.0])
    }

    pub fn family_at(&self, handle: FamilyHandle) -> Option<&FamilyRegistry> {
        self.families.get(handle.0)
    }

    /// Families in registration order.
    pub fn families(&self) -> impl Iterator<Item = &FamilyRegistry> {
        self.families.iter()
    }

    pub fn type_handle(&self, name: &str) -> Option<TypeHandle> {
        self.type_index.get(name).copied()
    }

    /// Finalized schema of a declared type.
    pub fn schema(&self, handle: TypeHandle) -> Option<&Arc<TypeSchema>> {
        self.types.get(handle.0).map(|e| &e.schema)
    }

    pub fn schema_of(&self, name: &str) -> Option<&Arc<TypeSchema>> {
        self.type_handle(name).and_then(|h| self.schema(h))
    }

    /// Schemas in declaration order.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<TypeSchema>> {
        self.types.iter().map(|e| &e.schema)
    }

    /// Tag of an already-typed value, if its type is a variant.
    pub fn tag_of(&self, record: &Record) -> Option<&str> {
        self.schema_of(record.type_name())?.tag.as_deref()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

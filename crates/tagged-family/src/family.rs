// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-family membership and referrer bookkeeping.
//!
//! A [`FamilyRegistry`] knows its members (in declaration order) and its
//! referrers: the declared types with fields typed as "member of this family".
//! It does not own the referrers' schemas. Mutations report which referrers
//! must be re-finalized and the owning [`Registry`](crate::Registry) applies
//! that as one unit.

use crate::descriptor::{FamilyHandle, FamilyResolution, TypeHandle, UnionArm, UnionDescriptor};
use crate::error::DefinitionError;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A registered variant of a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub tag: String,
    pub variant: TypeHandle,
    pub type_name: String,
}

/// A declared type holding fields typed as members of a family.
///
/// This is a back-reference (handle + field names); the registry never owns
/// the referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Referrer {
    pub type_handle: TypeHandle,
    pub fields: BTreeSet<String>,
}

/// Membership and referrer registry of one family root.
#[derive(Debug, Clone)]
pub struct FamilyRegistry {
    handle: FamilyHandle,
    name: String,
    discriminator: String,
    members: Vec<Member>,
    /// Registration order; re-finalization walks it backwards.
    referrers: Vec<Referrer>,
    /// Present iff there are at least two members.
    resolved_union: Option<Arc<UnionDescriptor>>,
}

impl FamilyRegistry {
    pub(crate) fn new(
        handle: FamilyHandle,
        name: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            name: name.into(),
            discriminator: discriminator.into(),
            members: Vec::new(),
            referrers: Vec::new(),
            resolved_union: None,
        }
    }

    pub fn handle(&self) -> FamilyHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Referrers in registration order.
    pub fn referrers(&self) -> &[Referrer] {
        &self.referrers
    }

    pub fn resolved_union(&self) -> Option<&Arc<UnionDescriptor>> {
        self.resolved_union.as_ref()
    }

    pub fn contains(&self, variant: TypeHandle) -> bool {
        self.members.iter().any(|m| m.variant == variant)
    }

    /// Routing target for a tag during deserialization.
    pub fn serializer_for_tag(&self, tag: &str) -> Option<TypeHandle> {
        self.members.iter().find(|m| m.tag == tag).map(|m| m.variant)
    }

    /// What a field typed as "member of this family" currently resolves to.
    pub fn resolution(&self) -> FamilyResolution {
        if let Some(union) = &self.resolved_union {
            return FamilyResolution::Union(Arc::clone(union));
        }
        match self.members.first() {
            Some(member) => FamilyResolution::Single {
                family: self.handle,
                name: self.name.clone(),
                tag: member.tag.clone(),
                variant: member.variant,
            },
            None => FamilyResolution::Placeholder {
                family: self.handle,
                name: self.name.clone(),
            },
        }
    }

    /// Fails if `tag` already belongs to a different variant.
    pub(crate) fn check_tag(&self, tag: &str, variant: TypeHandle) -> Result<(), DefinitionError> {
        match self.members.iter().find(|m| m.tag == tag) {
            Some(existing) if existing.variant != variant => Err(DefinitionError::DuplicateTag {
                family: self.name.clone(),
                tag: tag.to_string(),
                existing: existing.type_name.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Insert a member.
    ///
    /// Returns the referrers to re-finalize, latest-registered first. Adding a
    /// variant that is already a member changes nothing and returns no
    /// referrers.
    pub(crate) fn add_member(
        &mut self,
        variant: TypeHandle,
        type_name: &str,
        tag: &str,
    ) -> Result<Vec<TypeHandle>, DefinitionError> {
        if self.contains(variant) {
            log::debug!("[family] {}: '{}' already a member", self.name, type_name);
            return Ok(Vec::new());
        }
        self.check_tag(tag, variant)?;

        self.members.push(Member {
            tag: tag.to_string(),
            variant,
            type_name: type_name.to_string(),
        });
        self.resolved_union = self.build_union();
        log::debug!(
            "[family] {}: added '{}' (tag '{}'), {} member(s), {} referrer(s) to refresh",
            self.name,
            type_name,
            tag,
            self.members.len(),
            self.referrers.len()
        );

        Ok(self.referrers.iter().rev().map(|r| r.type_handle).collect())
    }

    /// Record that `referrer.field` is typed as a member of this family.
    ///
    /// Returns the current union so the caller can reconcile the field right
    /// away instead of waiting for the next member.
    pub(crate) fn add_referrer(
        &mut self,
        referrer: TypeHandle,
        field: &str,
    ) -> Option<Arc<UnionDescriptor>> {
        match self.referrers.iter_mut().find(|r| r.type_handle == referrer) {
            Some(existing) => {
                existing.fields.insert(field.to_string());
            }
            None => self.referrers.push(Referrer {
                type_handle: referrer,
                fields: BTreeSet::from([field.to_string()]),
            }),
        }
        self.resolved_union.clone()
    }

    fn build_union(&self) -> Option<Arc<UnionDescriptor>> {
        if self.members.len() < 2 {
            return None;
        }
        Some(Arc::new(UnionDescriptor {
            family: self.handle,
            family_name: self.name.clone(),
            discriminator: self.discriminator.clone(),
            arms: self
                .members
                .iter()
                .map(|m| UnionArm {
                    tag: m.tag.clone(),
                    variant: m.variant,
                })
                .collect(),
        }))
    }
}

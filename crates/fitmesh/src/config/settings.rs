// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! File-backed genericable policy.

use super::GenericableConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trust stage fitable ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validate: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub before: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub after: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Policy of one generic service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericableSettings {
    pub generic_id: String,

    #[serde(default)]
    pub local_only: bool,

    #[serde(default)]
    pub trace_ignore: bool,

    #[serde(default)]
    pub registry_fitable: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routine: String,

    #[serde(default, rename = "default", skip_serializing_if = "String::is_empty")]
    pub default_fitable: String,

    /// Candidate fitable ids (random routing).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fitables: Vec<String>,

    /// Parameter routing tags, indexed by parameter position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_tags: Vec<Vec<String>>,

    #[serde(default)]
    pub trust: TrustSettings,

    /// fitable id -> fallback fitable id
    #[serde(default)]
    pub degradation: BTreeMap<String, String>,

    /// alias -> fitable id
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl GenericableSettings {
    pub fn new(generic_id: impl Into<String>) -> Self {
        Self {
            generic_id: generic_id.into(),
            ..Default::default()
        }
    }

    pub fn with_default(mut self, fitable_id: impl Into<String>) -> Self {
        self.default_fitable = fitable_id.into();
        self
    }

    pub fn with_degradation(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.degradation.insert(from.into(), to.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, fitable_id: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), fitable_id.into());
        self
    }

    pub fn with_local_only(mut self, enabled: bool) -> Self {
        self.local_only = enabled;
        self
    }

    pub fn with_trust(mut self, trust: TrustSettings) -> Self {
        self.trust = trust;
        self
    }
}

impl GenericableConfig for GenericableSettings {
    fn generic_id(&self) -> &str {
        &self.generic_id
    }

    fn enable_trust(&self) -> bool {
        self.trust.enabled
    }

    fn local_only(&self) -> bool {
        self.local_only
    }

    fn trace_ignore(&self) -> bool {
        self.trace_ignore
    }

    fn routine(&self) -> String {
        self.routine.clone()
    }

    fn default_fitable(&self) -> String {
        self.default_fitable.clone()
    }

    fn degradation(&self, fitable_id: &str) -> String {
        self.degradation.get(fitable_id).cloned().unwrap_or_default()
    }

    fn validate(&self) -> String {
        self.trust.validate.clone()
    }

    fn before(&self) -> String {
        self.trust.before.clone()
    }

    fn after(&self) -> String {
        self.trust.after.clone()
    }

    fn error(&self) -> String {
        self.trust.error.clone()
    }

    fn is_registry_fitable(&self) -> bool {
        self.registry_fitable
    }

    fn fitable_id_by_alias(&self, alias: &str) -> String {
        self.aliases.get(alias).cloned().unwrap_or_default()
    }

    fn param_tags(&self, idx: usize) -> Vec<String> {
        self.param_tags.get(idx).cloned().unwrap_or_default()
    }

    fn random_fitable(&self) -> String {
        if self.fitables.is_empty() {
            return String::new();
        }
        self.fitables[fastrand::usize(..self.fitables.len())].clone()
    }
}

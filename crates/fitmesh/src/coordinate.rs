// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity of one fitable implementation.

use std::fmt;

/// Immutable identity of one implementation of one generic service.
///
/// Ordering is lexicographic over the four fields in declaration order,
/// so the first non-equal field decides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    /// Generic service id (e.g., "orderSvc")
    pub generic_id: String,
    /// Generic service version
    pub generic_version: String,
    /// Implementation id (e.g., "impl-A")
    pub fitable_id: String,
    /// Implementation version
    pub fitable_version: String,
}

impl Coordinate {
    /// Create a new coordinate
    pub fn new(
        generic_id: impl Into<String>,
        generic_version: impl Into<String>,
        fitable_id: impl Into<String>,
        fitable_version: impl Into<String>,
    ) -> Self {
        Self {
            generic_id: generic_id.into(),
            generic_version: generic_version.into(),
            fitable_id: fitable_id.into(),
            fitable_version: fitable_version.into(),
        }
    }

    /// Same generic service, another implementation.
    ///
    /// Used for trust stages and degradation fallbacks, which keep the
    /// generic id/version and swap the fitable id. The fitable version is
    /// left empty (any version) since it belongs to the replaced fitable.
    pub fn with_fitable(&self, fitable_id: impl Into<String>) -> Self {
        Self {
            generic_id: self.generic_id.clone(),
            generic_version: self.generic_version.clone(),
            fitable_id: fitable_id.into(),
            fitable_version: String::new(),
        }
    }

    /// Project into the identity handed to discovery and load-balance plugins.
    pub fn fitable(&self) -> Fitable {
        Fitable {
            generic_id: self.generic_id.clone(),
            generic_version: self.generic_version.clone(),
            fitable_id: self.fitable_id.clone(),
            fitable_version: self.fitable_version.clone(),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}:{}",
            self.generic_id, self.generic_version, self.fitable_id, self.fitable_version
        )
    }
}

/// Fitable identity as seen by the registry side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Fitable {
    pub generic_id: String,
    pub generic_version: String,
    pub fitable_id: String,
    pub fitable_version: String,
}

impl Fitable {
    /// Key used by address tables (version-insensitive on the fitable side).
    pub fn address_key(&self) -> (String, String, String) {
        (
            self.generic_id.clone(),
            self.generic_version.clone(),
            self.fitable_id.clone(),
        )
    }
}

/// Role of a fitable call within the trust pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FitableType {
    /// The business call itself
    #[default]
    Main,
    /// Gatekeeper run before MAIN; failure aborts the call
    Validate,
    /// Best-effort hook before MAIN
    Before,
    /// Best-effort hook after a successful MAIN
    After,
    /// Best-effort hook after a failed MAIN
    Error,
}

impl FitableType {
    /// Wire / trace name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Validate => "VALIDATE",
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for FitableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

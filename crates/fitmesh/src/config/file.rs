// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime configuration file.
//!
//! Supports both programmatic and TOML-based configuration.

use super::GenericableSettings;
use crate::coordinate::Fitable;
use crate::discovery::{FlatAddress, WorkerRecord};
use crate::endpoint::{ApplicationInfo, Endpoint, EndpointContext, PortEndpoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Identity and listening address of this worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub worker_id: String,

    #[serde(default)]
    pub application: String,

    #[serde(default)]
    pub application_version: String,

    #[serde(default)]
    pub environment: String,

    /// Advertised host; the primary local IP is used when absent.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub protocol: i32,

    /// Serialization formats this worker speaks.
    #[serde(default = "default_formats")]
    pub formats: Vec<i32>,
}

fn default_formats() -> Vec<i32> {
    vec![0]
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            worker_id: String::new(),
            application: String::new(),
            application_version: String::new(),
            environment: String::new(),
            host: None,
            port: 0,
            protocol: 0,
            formats: default_formats(),
        }
    }
}

impl WorkerSettings {
    /// Endpoint advertised by this worker.
    pub fn to_endpoint(&self) -> Endpoint {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => match local_ip_address::local_ip() {
                Ok(ip) => ip.to_string(),
                Err(e) => {
                    log::warn!("[config] local IP lookup failed ({}), using loopback", e);
                    "127.0.0.1".to_string()
                }
            },
        };
        Endpoint {
            worker_id: self.worker_id.clone(),
            environment: self.environment.clone(),
            host,
            port: self.port,
            protocol: self.protocol,
            formats: self.formats.clone(),
            context: EndpointContext {
                worker_info: BTreeMap::new(),
                application_info: ApplicationInfo {
                    name: self.application.clone(),
                    version: self.application_version.clone(),
                },
            },
        }
    }
}

/// Trace switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSettings {
    /// Trace calls issued by this worker.
    #[serde(default)]
    pub local: bool,

    /// Mesh-wide trace switch.
    #[serde(default)]
    pub global: bool,
}

impl TraceSettings {
    pub fn enabled(&self) -> bool {
        self.local || self.global
    }
}

/// Per-call defaults applied when the caller leaves them unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,

    #[serde(default)]
    pub retry: u32,
}

fn default_timeout_ms() -> u32 {
    3000
}

impl Default for InvokeSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retry: 0,
        }
    }
}

/// Static address table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub generic_id: String,
    pub generic_version: String,
    pub fitable_id: String,

    #[serde(default)]
    pub application: String,

    pub worker_id: String,

    #[serde(default)]
    pub environment: String,

    pub host: String,
    pub port: u16,

    #[serde(default)]
    pub protocol: i32,

    #[serde(default = "default_formats")]
    pub formats: Vec<i32>,
}

impl AddressEntry {
    pub fn fitable(&self) -> Fitable {
        Fitable {
            generic_id: self.generic_id.clone(),
            generic_version: self.generic_version.clone(),
            fitable_id: self.fitable_id.clone(),
            fitable_version: String::new(),
        }
    }

    pub fn to_flat(&self) -> FlatAddress {
        FlatAddress {
            application: ApplicationInfo {
                name: self.application.clone(),
                version: String::new(),
            },
            worker: WorkerRecord {
                worker_id: self.worker_id.clone(),
                environment: self.environment.clone(),
                extensions: BTreeMap::new(),
            },
            host: self.host.clone(),
            endpoint: PortEndpoint {
                port: self.port,
                protocol: self.protocol,
            },
            formats: self.formats.clone(),
        }
    }
}

/// Complete runtime configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeFile {
    pub worker: WorkerSettings,

    #[serde(default)]
    pub trace: TraceSettings,

    #[serde(default)]
    pub invoke: InvokeSettings,

    #[serde(default)]
    pub genericables: Vec<GenericableSettings>,

    #[serde(default)]
    pub addresses: Vec<AddressEntry>,
}

impl RuntimeFile {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.worker_id.is_empty() {
            return Err(ConfigError::Invalid("worker.worker_id is empty".into()));
        }

        let mut seen = HashSet::new();
        for (i, generic) in self.genericables.iter().enumerate() {
            if generic.generic_id.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Genericable {} has empty generic_id",
                    i
                )));
            }
            if !seen.insert(generic.generic_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate genericable '{}'",
                    generic.generic_id
                )));
            }
        }

        for (i, address) in self.addresses.iter().enumerate() {
            if address.port == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Address {} ({}) has port 0",
                    i, address.worker_id
                )));
            }
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

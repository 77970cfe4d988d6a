// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    /// Where and how the listener binds.
    #[serde(default)]
    pub server: ServerConfig,
    /// Runtime limits that never travel over the wire.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address", rename = "BindAddress")]
    /// Interface to listen on.
    pub bind_address: String,

    #[serde(default = "default_port", rename = "Port")]
    /// TCP port; 0 asks the OS for an ephemeral one.
    pub port: u16,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_max_connections", rename = "MaxConnections")]
    /// Upper bound on concurrently served sessions.
    pub max_connections: u32,

    #[serde(
        default = "default_timeout_write",
        rename = "TimeoutWrite",
        with = "serde_secs"
    )]
    /// Per-write socket deadline before the session is dropped.
    pub timeout_write: Duration,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_max_connections() -> u32 {
    1024
}

fn default_timeout_write() -> Duration {
    Duration::from_secs(30)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            timeout_write: default_timeout_write(),
        }
    }
}

impl Config {
    /// Loads the configuration from YAML, applies environment overrides,
    /// validates it, and returns the ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.apply_env_overrides()?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// `RESP_KV_PORT` overrides the configured port, the single
    /// environment knob the server honours.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("RESP_KV_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("RESP_KV_PORT is not a port: {port:?}"))?;
        }
        Ok(())
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(
            !self.server.bind_address.is_empty(),
            "BindAddress must not be empty"
        );
        ensure!(
            self.runtime.max_connections >= 1,
            "MaxConnections must be >= 1"
        );
        ensure!(
            self.runtime.timeout_write >= Duration::from_millis(1),
            "TimeoutWrite must be >= 1ms"
        );
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

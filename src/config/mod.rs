use crate::error::{BeanwireError, Result};
use crate::transactional::{IsolationLevel, Propagation, TransactionOptions};
use dashmap::DashMap;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use strum_macros::{Display, EnumString};

/// Prefix of the environment variables read by [`ConfigService::from_env`].
pub const ENV_PREFIX: &str = "BEANWIRE_";

/// What the container does when several beans satisfy one type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AmbiguityPolicy {
    /// Fail with `AmbiguousBean`.
    #[default]
    Reject,
    /// Use the first matching bean in registration order and log a warning.
    FirstRegistered,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    pub ambiguity: AmbiguityPolicy,
}

/// Defaults applied to transaction boundaries that do not override them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransactionSettings {
    pub propagation: Propagation,
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TransactionSettings {
    pub fn options(&self) -> TransactionOptions {
        TransactionOptions {
            name: None,
            propagation: self.propagation,
            isolation: self.isolation,
            read_only: self.read_only,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BeanwireConfig {
    pub container: ContainerSettings,
    pub transaction: TransactionSettings,
}

impl BeanwireConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration service
///
/// A flat key/value store, usually seeded from `BEANWIRE_*` environment
/// variables, that produces a typed [`BeanwireConfig`].
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `BEANWIRE_*` variable, keyed without the prefix and
    /// lowercased (`BEANWIRE_TX_PROPAGATION` becomes `tx_propagation`).
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                service.set(&stripped.to_ascii_lowercase(), &value);
            }
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parses the value under `key`, if present.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim()
                    .parse::<T>()
                    .map_err(|e| BeanwireError::config(key, format!("'{raw}': {e}")))
            })
            .transpose()
    }

    pub fn settings(&self) -> Result<BeanwireConfig> {
        let mut config = BeanwireConfig::default();

        if let Some(policy) = self.get_parsed("ambiguity")? {
            config.container.ambiguity = policy;
        }
        if let Some(propagation) = self.get_parsed("tx_propagation")? {
            config.transaction.propagation = propagation;
        }
        if let Some(isolation) = self.get_parsed("tx_isolation")? {
            config.transaction.isolation = Some(isolation);
        }
        if let Some(read_only) = self.get_parsed("tx_read_only")? {
            config.transaction.read_only = read_only;
        }

        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

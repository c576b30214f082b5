//! Switch password and profile resolution for plusctl.
//!
//! The `plusctl-api` core deliberately never reads the environment or any
//! config file -- it only consumes the [`PasswordResolver`] trait. This
//! crate provides the implementations: host-scoped environment variables,
//! a multi-switch environment list, and TOML profiles, layered the usual
//! way (env wins over file).

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use plusctl_api::{Model, PasswordResolver, SwitchConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Environment resolution ──────────────────────────────────────────

/// Resolves passwords from environment variables.
///
/// Lookup order for an address:
/// 1. `PLUSCTL_PASSWORD_<HOST>` (dots/colons become underscores,
///    uppercased), with `PLUSCTL_MODEL_<HOST>` as an optional model hint.
/// 2. A matching entry in `PLUSCTL_SWITCHES`, formatted as
///    `host1=password1[,model1];host2=password2[,model2];...`
#[derive(Debug, Default)]
pub struct EnvResolver {
    /// Test seam: when set, lookups come from this map instead of the
    /// process environment.
    vars: Option<HashMap<String, String>>,
}

impl EnvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver over a fixed variable map instead of the process
    /// environment.
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self { vars: Some(vars) }
    }

    fn var(&self, name: &str) -> Option<String> {
        match &self.vars {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        }
        .filter(|value| !value.is_empty())
    }
}

impl PasswordResolver for EnvResolver {
    fn resolve(&self, address: &str) -> Option<SwitchConfig> {
        let host_key = normalize_host(address);

        if let Some(password) = self.var(&format!("PLUSCTL_PASSWORD_{host_key}")) {
            debug!("found host-scoped password for {address}");
            let hint = self
                .var(&format!("PLUSCTL_MODEL_{host_key}"))
                .and_then(|name| parse_model_hint(&name));
            return Some(SwitchConfig {
                host: address.to_owned(),
                password: SecretString::from(password),
                model_hint: hint,
            });
        }

        if let Some((password, hint)) = self
            .var("PLUSCTL_SWITCHES")
            .and_then(|list| lookup_switch_list(&list, address))
        {
            debug!("found {address} in PLUSCTL_SWITCHES");
            return Some(SwitchConfig {
                host: address.to_owned(),
                password: SecretString::from(password),
                model_hint: hint,
            });
        }

        debug!("no password in environment for {address}");
        None
    }
}

/// `host` → environment variable suffix: dots and colons become
/// underscores, everything uppercased.
fn normalize_host(host: &str) -> String {
    host.replace(['.', ':'], "_").to_uppercase()
}

/// Find `target` in a `host=password[,model];...` list.
fn lookup_switch_list(list: &str, target: &str) -> Option<(String, Option<Model>)> {
    for entry in list.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((host, rest)) = entry.split_once('=') else {
            continue;
        };
        if host.trim() != target {
            continue;
        }

        return Some(match rest.split_once(',') {
            Some((password, model)) => (
                password.trim().to_owned(),
                parse_model_hint(model.trim()),
            ),
            None => (rest.trim().to_owned(), None),
        });
    }
    None
}

/// Parse a model hint, warning on (rather than coercing) unknown names.
/// The hint is advisory -- the client detects the model from the device --
/// so a bad hint is dropped loudly instead of failing resolution.
fn parse_model_hint(name: &str) -> Option<Model> {
    match Model::from_str(name) {
        Ok(model) => Some(model),
        Err(_) => {
            warn!("ignoring unknown model hint '{name}'");
            None
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
///
/// ```toml
/// [switches."192.168.0.239"]
/// password = "sw-password"
/// model = "GS305EP"
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Per-address switch profiles, keyed by host/IP.
    #[serde(default)]
    pub switches: HashMap<String, SwitchProfile>,
}

/// One switch entry in the config file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SwitchProfile {
    /// Admin password (plaintext -- prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Optional model hint, e.g. "GS305EP".
    pub model: Option<String>,
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "plusctl", "plusctl").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("plusctl");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Load the full [`Config`] from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a [`Config`] from a specific TOML file.
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path));
    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

/// Resolves passwords from a loaded [`Config`].
#[derive(Debug, Default)]
pub struct ProfileResolver {
    config: Config,
}

impl ProfileResolver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolver over the canonical config file; missing or unreadable
    /// files resolve nothing.
    pub fn from_default_path() -> Self {
        Self::new(load_config().unwrap_or_default())
    }
}

impl PasswordResolver for ProfileResolver {
    fn resolve(&self, address: &str) -> Option<SwitchConfig> {
        let profile = self.config.switches.get(address)?;

        let password = profile
            .password_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .or_else(|| profile.password.clone())?;

        Some(SwitchConfig {
            host: address.to_owned(),
            password: SecretString::from(password),
            model_hint: profile.model.as_deref().and_then(parse_model_hint),
        })
    }
}

// ── Chained resolution ──────────────────────────────────────────────

/// Tries each resolver in order, returning the first hit.
#[derive(Debug, Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn PasswordResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, resolver: impl PasswordResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl PasswordResolver for ResolverChain {
    fn resolve(&self, address: &str) -> Option<SwitchConfig> {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(address))
    }
}

/// The standard chain: environment first, then the config file.
pub fn default_resolver() -> ResolverChain {
    ResolverChain::new()
        .push(EnvResolver::new())
        .push(ProfileResolver::from_default_path())
}

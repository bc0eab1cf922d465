//! Serializer settings layered from defaults, a dotfile and the environment.
//!
//! Sources are merged in order, later ones winning:
//! built-in defaults, `.eoswire.toml` (or `.eoswire.yaml` with the `yaml`
//! feature) in the working directory, then `EOSWIRE_*` environment variables.

#[cfg(any(feature = "toml", feature = "yaml"))]
use figment::providers::Format;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::{abi::DEFAULT_MAX_TYPE_DEPTH, keys::KeyFormat};

/// Prefix for environment overrides, e.g. `EOSWIRE_KEY_FORMAT=typed`.
pub const ENV_PREFIX: &str = "EOSWIRE_";

/// Codec behaviour that callers may tune without code changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Rendering of decoded public keys.
    pub key_format: KeyFormat,
    /// Bound on nested ABI type resolution.
    pub max_type_depth: usize,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            key_format: KeyFormat::Legacy,
            max_type_depth: DEFAULT_MAX_TYPE_DEPTH,
        }
    }
}

impl SerializerConfig {
    /// The merged provider chain, exposed so callers can add their own layers.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(toml_dotfile())
            .merge(yaml_dotfile())
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings from every source.
    ///
    /// # Errors
    /// Returns the figment error if a source holds a value of the wrong type.
    pub fn load() -> Result<Self, Box<figment::Error>> { Self::figment().extract().map_err(Box::new) }
}

#[cfg(feature = "toml")]
fn toml_dotfile() -> Figment { Figment::from(figment::providers::Toml::file(".eoswire.toml")) }

#[cfg(not(feature = "toml"))]
fn toml_dotfile() -> Figment { Figment::new() }

#[cfg(feature = "yaml")]
fn yaml_dotfile() -> Figment { Figment::from(figment::providers::Yaml::file(".eoswire.yaml")) }

#[cfg(not(feature = "yaml"))]
fn yaml_dotfile() -> Figment { Figment::new() }

#[cfg(test)]
mod tests {
    use figment::Jail;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn defaults_without_sources() {
        Jail::expect_with(|_j| {
            let cfg = SerializerConfig::load().expect("load");
            assert_eq!(cfg, SerializerConfig::default());
            assert_eq!(cfg.max_type_depth, 32);
            Ok(())
        });
    }

    #[rstest]
    fn env_config_loading() {
        Jail::expect_with(|j| {
            j.set_env("EOSWIRE_KEY_FORMAT", "typed");
            j.set_env("EOSWIRE_MAX_TYPE_DEPTH", "8");
            let cfg = SerializerConfig::load().expect("load");
            assert_eq!(cfg.key_format, KeyFormat::Typed);
            assert_eq!(cfg.max_type_depth, 8);
            Ok(())
        });
    }

    #[cfg(feature = "toml")]
    #[rstest]
    fn env_overrides_dotfile() {
        Jail::expect_with(|j| {
            j.create_file(".eoswire.toml", "key_format = \"typed\"\nmax_type_depth = 4")?;
            j.set_env("EOSWIRE_MAX_TYPE_DEPTH", "16");
            let cfg = SerializerConfig::load().expect("load");
            assert_eq!(cfg.key_format, KeyFormat::Typed);
            assert_eq!(cfg.max_type_depth, 16);
            Ok(())
        });
    }

    #[rstest]
    fn rejects_unknown_key_format() {
        Jail::expect_with(|j| {
            j.set_env("EOSWIRE_KEY_FORMAT", "base64");
            assert!(SerializerConfig::load().is_err());
            Ok(())
        });
    }
}

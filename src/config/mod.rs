mod alchemy;
mod basic;

pub use alchemy::AlchemyConfig;
pub use basic::BasicConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "BRIDGE_";

/// Application configuration. Layered: compiled defaults, then `config.toml`
/// when present, then `BRIDGE_*` environment variables (nested keys split on
/// `__`, e.g. `BRIDGE_BASIC__BRIDGE_KEY`).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server settings (`basic` table).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Alchemy upstream settings (`alchemy` table).
    #[serde(default)]
    pub alchemy: AlchemyConfig,
}

impl Config {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load the layered configuration. Does not validate required fields;
    /// the binary checks `basic.bridge_key` explicitly before serving.
    pub fn load() -> Self {
        Self::figment()
            .extract()
            .unwrap_or_else(|err| panic!("failed to load configuration: {err}"))
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::load);

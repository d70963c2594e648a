//! Application settings: a TOML file layered with `CAIXA_*` environment
//! variables; a few fields can additionally be overridden from the command
//! line.

use ledger::Catalog;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/caixa.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// sea-orm connection string, e.g. `sqlite:./caixa.db?mode=rwc` or
    /// `sqlite::memory:`.
    pub database_url: String,
    /// Application identifier scoping the collection.
    pub tenant: String,
    /// Operator signed in at startup; empty means an anonymous identity.
    pub operator: String,
    /// IANA timezone defining the studio's business day.
    pub timezone: String,
    /// Log level for the env filter.
    pub level: String,
    pub catalog: Catalog,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./caixa.db?mode=rwc".to_string(),
            tenant: ledger::DEFAULT_TENANT.to_string(),
            operator: String::new(),
            timezone: "America/Sao_Paulo".to_string(),
            level: "info".to_string(),
            catalog: Catalog::default(),
        }
    }
}

pub fn load(path: Option<&str>) -> Result<Settings, config::ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("CAIXA"));
    builder.build()?.try_deserialize()
}

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct FactcheckConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Create the `facts` table on startup when it is missing.
    #[serde(default = "default_bootstrap_schema")]
    pub bootstrap_schema: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_bootstrap_schema() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl FactcheckConfig {
    /// Load from a TOML file, then overlay `FACTCHECK__SECTION__KEY` env vars.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("FACTCHECK").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Config for runs that never touch PostgreSQL (`--ephemeral`).
    pub fn ephemeral() -> Self {
        Self {
            service: ServiceConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: default_max_connections(),
                bootstrap_schema: false,
            },
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_toml_fills_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("factcheck-config-test-{}.toml", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[database]\nurl = \"postgresql://localhost/facts\"").unwrap();
        drop(f);

        let config = FactcheckConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.database.url, "postgresql://localhost/facts");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.bootstrap_schema);
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.service.log_level, "info");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(FactcheckConfig::load("/nonexistent/factcheck.toml").is_err());
    }
}

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Server settings, read from `khata.toml` when present and then overridden
/// by `KHATA_*` environment variables. Every field has a sensible default
/// so a bare binary starts without any configuration at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Upper bound on an uploaded statement, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8970,
            database_path: PathBuf::from("khata.db"),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config: ServerConfig = if path.exists() {
            toml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            ServerConfig::default()
        };

        if let Ok(host) = std::env::var("KHATA_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("KHATA_PORT") {
            config.port = port.parse()?;
        }
        if let Ok(db) = std::env::var("KHATA_DB") {
            config.database_path = PathBuf::from(db);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ServerConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.database_path, PathBuf::from("khata.db"));
    }

    #[test]
    fn full_file_parses() {
        let config: ServerConfig = toml::from_str(
            "host = \"0.0.0.0\"\nport = 8080\ndatabase_path = \"/var/lib/khata/khata.db\"\nmax_upload_bytes = 1048576\n",
        )
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_upload_bytes, 1_048_576);
    }
}

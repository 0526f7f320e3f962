use serde::Deserialize;

fn default_store_host() -> String {
    "127.0.0.1".into()
}

fn default_store_port() -> u16 {
    6379
}

fn default_hash_key() -> String {
    // Collection key inherited from existing deployments.
    "rp".into()
}

/// Connection settings for the durable route store.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_store_host")]
    pub host: String,
    #[serde(default = "default_store_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    #[serde(default)]
    pub password: Option<String>,
    /// Name of the hash holding all domain -> port fields.
    #[serde(default = "default_hash_key")]
    pub hash_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            host: default_store_host(),
            port: default_store_port(),
            db: 0,
            password: None,
            hash_key: default_hash_key(),
        }
    }
}

impl StoreConfig {
    pub fn connection_url(&self) -> String {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => {
                format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.db)
            }
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// Network listener configuration for the control API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ControlConfig {
    #[serde(default)]
    pub listener: Listener,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url() {
        let config = StoreConfig::default();
        assert_eq!(config.connection_url(), "redis://127.0.0.1:6379/0");

        let config = StoreConfig {
            password: Some("hunter2".into()),
            db: 3,
            ..StoreConfig::default()
        };
        assert_eq!(config.connection_url(), "redis://:hunter2@127.0.0.1:6379/3");
    }
}

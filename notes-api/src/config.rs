use serde::{Deserialize, Deserializer};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Upper bound applied to `limit` on note listing.
    #[serde(default = "default_max_list_limit")]
    pub max_list_limit: u64,

    /// Comma separated origins, empty means any origin.
    #[serde(default, deserialize_with = "comma_separated")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub log_json: bool,

    // build
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    3001
}

fn default_database_url() -> String {
    "notes.db".into()
}

fn default_max_list_limit() -> u64 {
    100
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Self>()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            max_list_limit: default_max_list_limit(),
            cors_origins: Vec::new(),
            log_json: false,
            version: default_version(),
        }
    }
}

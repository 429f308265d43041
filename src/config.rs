use std::{env, path::PathBuf};

use crate::error::{DbError, Result};

const ENV_NAME: &str = "STREAMDB_NAME";
const ENV_DIR: &str = "STREAMDB_DIR";
const ENV_IN_MEMORY: &str = "STREAMDB_IN_MEMORY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

/// Connection settings for the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub location: StoreLocation,
    /// Logical database name, also used as the file stem for file stores.
    pub name: String,
}

impl DbConfig {
    pub fn file(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            name: name.into(),
        }
    }

    pub fn in_memory(name: impl Into<String>) -> Self {
        Self {
            location: StoreLocation::Memory,
            name: name.into(),
        }
    }

    /// Reads the configuration from the process environment, loading a `.env`
    /// file first when one exists.
    ///
    /// - `STREAMDB_NAME` (required): database name
    /// - `STREAMDB_DIR` (default `.`): directory holding `<name>.sqlite3`
    /// - `STREAMDB_IN_MEMORY`: `1`/`true` selects an in-memory store
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(ENV_NAME)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| DbError::Config(format!("{ENV_NAME} is not set")))?;

        let in_memory = lookup(ENV_IN_MEMORY)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if in_memory {
            return Ok(Self::in_memory(name));
        }

        let dir = lookup(ENV_DIR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let path = dir.join(format!("{name}.sqlite3"));

        Ok(Self::file(path, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_name_is_a_config_error() {
        let err = DbConfig::from_lookup(lookup(&[(ENV_DIR, "/tmp")])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));

        let err = DbConfig::from_lookup(lookup(&[(ENV_NAME, "  ")])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn file_path_is_built_from_dir_and_name() {
        let config =
            DbConfig::from_lookup(lookup(&[(ENV_NAME, "chat"), (ENV_DIR, "/var/lib/streamdb")]))
                .unwrap();
        assert_eq!(
            config.location,
            StoreLocation::File(PathBuf::from("/var/lib/streamdb/chat.sqlite3"))
        );
        assert_eq!(config.name, "chat");
    }

    #[test]
    fn dir_defaults_to_current_directory() {
        let config = DbConfig::from_lookup(lookup(&[(ENV_NAME, "chat")])).unwrap();
        assert_eq!(
            config.location,
            StoreLocation::File(PathBuf::from("./chat.sqlite3"))
        );
    }

    #[test]
    fn in_memory_flag_wins_over_dir() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_NAME, "chat"),
            (ENV_DIR, "/tmp"),
            (ENV_IN_MEMORY, "true"),
        ]))
        .unwrap();
        assert_eq!(config.location, StoreLocation::Memory);
    }
}

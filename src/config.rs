use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use tracing::{info, warn};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_FETCH_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub cache_path: PathBuf,
    pub page_size: i64,
    /// `None` fetches everything the source holds.
    pub fetch_limit: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), default_data_dir)
    }

    /// Builds the config from a variable lookup; `default_dir` is only called
    /// when `VETPANEL_DATA_DIR` is unset.
    pub fn from_lookup<L, D>(lookup: L, default_dir: D) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
        D: FnOnce() -> Result<PathBuf>,
    {
        let data_dir = match lookup("VETPANEL_DATA_DIR").filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_dir()?,
        };

        let page_size = try_load(&lookup, "VETPANEL_PAGE_SIZE", DEFAULT_PAGE_SIZE);
        let page_size = if page_size > 0 {
            page_size
        } else {
            warn!("VETPANEL_PAGE_SIZE must be positive, using default: {DEFAULT_PAGE_SIZE}");
            DEFAULT_PAGE_SIZE
        };
        let fetch_limit = match try_load(&lookup, "VETPANEL_FETCH_LIMIT", DEFAULT_FETCH_LIMIT) {
            0 => None,
            limit => Some(limit),
        };

        Ok(Self {
            cache_path: data_dir.join("snapshots.sqlite"),
            data_dir,
            page_size,
            fetch_limit,
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "vetpanel", "vetpanel")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().to_path_buf())
}

fn try_load<L, T>(lookup: &L, key: &str, default: T) -> T
where
    L: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|err| {
        warn!("Invalid {key} value {raw:?}: {err}, using default: {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn fallback_dir() -> Result<PathBuf> {
        Ok(PathBuf::from("/tmp/vetpanel-default"))
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[]), fallback_dir).expect("config loads");

        assert_eq!(config.data_dir, PathBuf::from("/tmp/vetpanel-default"));
        assert_eq!(
            config.cache_path,
            PathBuf::from("/tmp/vetpanel-default/snapshots.sqlite")
        );
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.fetch_limit, Some(DEFAULT_FETCH_LIMIT));
    }

    #[test]
    fn overrides_are_parsed_and_zero_limit_means_unbounded() {
        let lookup = lookup_from(&[
            ("VETPANEL_DATA_DIR", "/srv/vetpanel"),
            ("VETPANEL_PAGE_SIZE", "25"),
            ("VETPANEL_FETCH_LIMIT", "0"),
        ]);

        let config = AppConfig::from_lookup(lookup, fallback_dir).expect("config loads");

        assert_eq!(config.data_dir, PathBuf::from("/srv/vetpanel"));
        assert_eq!(config.page_size, 25);
        assert_eq!(config.fetch_limit, None);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let lookup = lookup_from(&[
            ("VETPANEL_PAGE_SIZE", "-3"),
            ("VETPANEL_FETCH_LIMIT", "lots"),
        ]);

        let config = AppConfig::from_lookup(lookup, fallback_dir).expect("config loads");

        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.fetch_limit, Some(DEFAULT_FETCH_LIMIT));
    }
}

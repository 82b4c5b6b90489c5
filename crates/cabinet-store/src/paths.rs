//! Path resolution for Cabinet's files
//!
//! Every configured path goes through [`PathResolver::expand_str`], which
//! expands environment variables and a leading `~`. Stored string values are
//! passed through the same expansion when they are read back.

use crate::error::{StoreError, StoreResult};
use std::path::PathBuf;

/// Path resolver for cross-platform storage paths
pub struct PathResolver;

impl PathResolver {
    /// Resolve Cabinet's home directory
    ///
    /// Priority:
    /// 1. CABINET_HOME environment variable
    /// 2. ~/.cabinet/
    pub fn resolve_home() -> StoreResult<PathBuf> {
        Self::resolve_home_with(std::env::var("CABINET_HOME").ok())
    }

    /// Resolve the home directory from an explicit override
    pub fn resolve_home_with(home_override: Option<String>) -> StoreResult<PathBuf> {
        if let Some(home_override) = home_override {
            return Ok(PathBuf::from(Self::expand_str(&home_override)));
        }

        if let Some(home_dir) = dirs::home_dir() {
            return Ok(home_dir.join(".cabinet"));
        }

        Err(StoreError::path_resolution_error(
            "Could not determine home directory",
        ))
    }

    /// Resolve the configuration file path
    ///
    /// Priority:
    /// 1. CABINET_CONFIG environment variable
    /// 2. ~/.config/cabinet/config.json
    pub fn resolve_config_file() -> StoreResult<PathBuf> {
        if let Ok(config_override) = std::env::var("CABINET_CONFIG") {
            return Ok(PathBuf::from(Self::expand_str(&config_override)));
        }

        if let Some(home_dir) = dirs::home_dir() {
            return Ok(home_dir.join(".config").join("cabinet").join("config.json"));
        }

        Err(StoreError::path_resolution_error(
            "Could not determine home directory",
        ))
    }

    /// Default location of the local data file
    pub fn default_data_file() -> StoreResult<PathBuf> {
        Ok(Self::resolve_home()?.join("data.json"))
    }

    /// Default location of the remote cache snapshot
    pub fn default_cache_file() -> StoreResult<PathBuf> {
        Ok(Self::resolve_home()?.join("cache").join("remote.json"))
    }

    /// Default log directory
    pub fn default_log_dir() -> StoreResult<PathBuf> {
        Ok(Self::resolve_home()?.join("log"))
    }

    /// Expand environment variables, then a leading `~`
    ///
    /// Unknown variables are left untouched, as is `~user`.
    pub fn expand_str(raw: &str) -> String {
        let expanded = Self::expand_vars(raw);

        if expanded == "~" || expanded.starts_with("~/") {
            if let Some(home_dir) = dirs::home_dir() {
                let home = home_dir.to_string_lossy();
                return format!("{}{}", home.trim_end_matches('/'), &expanded[1..]);
            }
        }

        expanded
    }

    /// Expand `$VAR` and `${VAR}` occurrences
    fn expand_vars(raw: &str) -> String {
        if !raw.contains('$') {
            return raw.to_string();
        }

        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(raw.len());
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '$' {
                out.push(chars[i]);
                i += 1;
                continue;
            }

            if chars.get(i + 1) == Some(&'{') {
                if let Some(close) = chars[i + 2..].iter().position(|c| *c == '}') {
                    let name: String = chars[i + 2..i + 2 + close].iter().collect();
                    match std::env::var(&name) {
                        Ok(value) if !name.is_empty() => out.push_str(&value),
                        _ => out.extend(&chars[i..i + 3 + close]),
                    }
                    i += close + 3;
                    continue;
                }
                out.push('$');
                i += 1;
                continue;
            }

            let name: String = chars[i + 1..]
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric() || **c == '_')
                .collect();
            if name.is_empty() {
                out.push('$');
                i += 1;
                continue;
            }
            match std::env::var(&name) {
                Ok(value) => out.push_str(&value),
                Err(_) => {
                    out.push('$');
                    out.push_str(&name);
                }
            }
            i += name.chars().count() + 1;
        }

        out
    }
}

use std::{fs, path::PathBuf};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://social-media-backend-2-qjtn.onrender.com/api";
pub const API_URL_ENV_VAR: &str = "NUMBER_SOCIAL_API_URL";
pub const DEFAULT_CONFIG_FILE: &str = "number_social.toml";
const APP_DIR_NAME: &str = "number_social";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub data_dir: PathBuf,
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    data_dir: Option<PathBuf>,
}

/// Defaults, then `number_social.toml`, then `NUMBER_SOCIAL_API_URL`, then
/// command line overrides.
pub fn load_settings(overrides: SettingsOverrides) -> anyhow::Result<Settings> {
    let explicit_file = overrides.config_file.is_some();
    let path = overrides
        .config_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let file_contents = match fs::read_to_string(&path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit_file => None,
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };

    let env_api_url = std::env::var(API_URL_ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty());

    resolve_settings(file_contents.as_deref(), env_api_url, overrides)
}

pub(crate) fn resolve_settings(
    file_contents: Option<&str>,
    env_api_url: Option<String>,
    overrides: SettingsOverrides,
) -> anyhow::Result<Settings> {
    let file_cfg = match file_contents {
        Some(raw) => toml::from_str::<FileSettings>(raw).context("malformed config file")?,
        None => FileSettings::default(),
    };

    let raw_api_url = overrides
        .api_base_url
        .or(env_api_url)
        .or(file_cfg.api_base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let data_dir = match overrides.data_dir.or(file_cfg.data_dir) {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    Ok(Settings {
        api_base_url: normalize_api_base_url(&raw_api_url)?,
        data_dir,
    })
}

/// Trims whitespace and trailing slashes and insists on an http(s) URL.
pub fn normalize_api_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("API base URL must not be empty");
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("invalid API base URL '{trimmed}'"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => bail!("unsupported API base URL scheme '{other}'"),
    }
    if parsed.host_str().is_none() {
        bail!("API base URL '{trimmed}' has no host");
    }
    Ok(trimmed.to_string())
}

pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("unable to resolve local app data dir"))?;
    Ok(base.join(APP_DIR_NAME))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

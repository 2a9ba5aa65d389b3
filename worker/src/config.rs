use crate::errors::StewardError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub type EnvMap = HashMap<String, String>;

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_LABEL: &str = "ai-modification";
pub const DEFAULT_AGENT_LOGIN: &str = "copilot-swe-agent";
pub const CONFIG_FILENAME: &str = "steward.toml";

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub admin_origin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub github: GithubSection,
    #[serde(default)]
    pub preview: PreviewSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub admin_origin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GithubSection {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub api_base: Option<String>,
    pub label: Option<String>,
    pub agent_login: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewSection {
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StewardConfig {
    pub bind: String,
    pub admin_origin: String,
    pub github_token: String,
    pub owner: String,
    pub repo: String,
    pub api_base: String,
    pub label: String,
    pub agent_login: String,
    pub preview_domain: String,
}

pub fn env_from_os(vars: &[(std::ffi::OsString, std::ffi::OsString)]) -> EnvMap {
    let mut map = EnvMap::new();
    for (key, value) in vars {
        if let (Some(key), Some(value)) = (key.to_str(), value.to_str()) {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

pub fn load_config(
    overrides: &CliOverrides,
    cwd: &Path,
    env: &EnvMap,
) -> Result<StewardConfig, StewardError> {
    let file = read_file_config(overrides, cwd)?;

    let github_token = env
        .get("GITHUB_TOKEN")
        .map(String::as_str)
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| StewardError::Config("GITHUB_TOKEN is not set".to_string()))?
        .to_string();

    let admin_origin = overrides
        .admin_origin
        .clone()
        .or_else(|| file.server.admin_origin.clone())
        .or_else(|| env.get("ADMIN_ORIGIN").cloned())
        .filter(|origin| !origin.trim().is_empty())
        .ok_or_else(|| StewardError::Config("admin origin is not set".to_string()))?;

    let owner = file
        .github
        .owner
        .clone()
        .or_else(|| env.get("GITHUB_OWNER").cloned())
        .filter(|owner| !owner.trim().is_empty())
        .ok_or_else(|| StewardError::Config("github owner is not set".to_string()))?;

    let repo = file
        .github
        .repo
        .clone()
        .or_else(|| env.get("GITHUB_REPO").cloned())
        .filter(|repo| !repo.trim().is_empty())
        .ok_or_else(|| StewardError::Config("github repo is not set".to_string()))?;

    let bind = overrides
        .bind
        .clone()
        .or_else(|| file.server.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    bind.parse::<SocketAddr>()
        .map_err(|e| StewardError::Config(format!("bind address '{bind}' is invalid: {e}")))?;

    let api_base = file
        .github
        .api_base
        .clone()
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string();

    let label = file
        .github
        .label
        .clone()
        .unwrap_or_else(|| DEFAULT_LABEL.to_string());

    let agent_login = file
        .github
        .agent_login
        .clone()
        .unwrap_or_else(|| DEFAULT_AGENT_LOGIN.to_string());

    // Cloudflare Pages derives branch aliases from the project name, so the
    // default preview domain tracks the repo name.
    let preview_domain = file
        .preview
        .domain
        .clone()
        .unwrap_or_else(|| format!("{repo}.pages.dev"));

    Ok(StewardConfig {
        bind,
        admin_origin,
        github_token,
        owner,
        repo,
        api_base,
        label,
        agent_login,
        preview_domain,
    })
}

fn read_file_config(overrides: &CliOverrides, cwd: &Path) -> Result<FileConfig, StewardError> {
    let path = match &overrides.config_path {
        Some(path) => path.clone(),
        None => {
            let default = cwd.join(CONFIG_FILENAME);
            if !default.exists() {
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| StewardError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&raw).map_err(|e| StewardError::Config(format!("config parse error: {e}")))
}

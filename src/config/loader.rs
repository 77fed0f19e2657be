use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::AppConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["memo-transfer.toml", "config/memo-transfer.toml"];

/// 覆盖 `global.rpc_url` 的环境变量。
pub const RPC_URL_ENV: &str = "MEMO_TRANSFER_RPC_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("配置非法: {0}")]
    Invalid(String),
}

/// 加载配置：显式路径优先，其次默认路径，均不存在时使用内置默认值。
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let mut config = load_file_or_default(path)?;
    apply_env_overrides(&mut config, env::var(RPC_URL_ENV).ok());
    config.validate()?;
    Ok(config)
}

fn load_file_or_default(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let explicit = path.is_some();
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            debug!(target: "config", path = %candidate.display(), "已加载配置文件");
            return Ok(config);
        }
        if explicit {
            return Err(ConfigError::Io {
                path: candidate,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
    }

    debug!(target: "config", "未找到配置文件，使用内置默认值");
    Ok(AppConfig::default())
}

fn apply_env_overrides(config: &mut AppConfig, rpc_url: Option<String>) {
    if let Some(url) = rpc_url {
        let trimmed = url.trim();
        if !trimmed.is_empty() {
            config.global.rpc_url = trimmed.to_string();
        }
    }
}

fn try_load_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(config))
}

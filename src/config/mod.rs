use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_MIME_TYPE;

pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub service: ServiceConfig,
    pub upload: UploadConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub health_timeout_secs: u64,
    pub predict_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadConfig {
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogConfig {
    pub level: String,
    pub save_run_log: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: None,
                health_timeout_secs: crate::probe::DEFAULT_HEALTH_TIMEOUT.as_secs(),
                predict_timeout_secs: crate::evaluator::DEFAULT_PREDICT_TIMEOUT.as_secs(),
            },
            upload: UploadConfig {
                mime_type: DEFAULT_MIME_TYPE.to_string(),
            },
            ui: UiConfig { color: true },
            log: LogConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
                save_run_log: false,
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    service: Option<RawServiceConfig>,
    upload: Option<RawUploadConfig>,
    ui: Option<RawUiConfig>,
    log: Option<RawLogConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServiceConfig {
    base_url: Option<String>,
    health_timeout_secs: Option<u64>,
    predict_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUploadConfig {
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUiConfig {
    color: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLogConfig {
    level: Option<String>,
    save_run_log: Option<bool>,
}

pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("HOME is not set"))
}

pub fn config_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/cropcheck")
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    config_dir(home_dir).join("config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    } else if config_path.is_some() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(service) = raw.service {
        if let Some(base_url) = service.base_url {
            cfg.service.base_url = non_empty(&base_url);
        }
        if let Some(secs) = service.health_timeout_secs {
            cfg.service.health_timeout_secs = secs;
        }
        if let Some(secs) = service.predict_timeout_secs {
            cfg.service.predict_timeout_secs = secs;
        }
    }

    if let Some(upload) = raw.upload {
        if let Some(mime_type) = upload.mime_type {
            cfg.upload.mime_type = mime_type.trim().to_string();
        }
    }

    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
    }

    if let Some(log) = raw.log {
        if let Some(level) = log.level {
            cfg.log.level = level;
        }
        if let Some(save_run_log) = log.save_run_log {
            cfg.log.save_run_log = save_run_log;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("CROPCHECK_BASE_URL") {
        if let Some(url) = non_empty(&v) {
            cfg.service.base_url = Some(url);
        }
    }
    if let Ok(v) = std::env::var("CROPCHECK_HEALTH_TIMEOUT_SECS") {
        cfg.service.health_timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "CROPCHECK_HEALTH_TIMEOUT_SECS")?;
    }
    if let Ok(v) = std::env::var("CROPCHECK_PREDICT_TIMEOUT_SECS") {
        cfg.service.predict_timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "CROPCHECK_PREDICT_TIMEOUT_SECS")?;
    }
    if let Ok(v) = std::env::var("CROPCHECK_UPLOAD_MIME_TYPE") {
        if let Some(mime_type) = non_empty(&v) {
            cfg.upload.mime_type = mime_type;
        }
    }
    if let Ok(v) = std::env::var("CROPCHECK_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "CROPCHECK_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("CROPCHECK_LOG_LEVEL") {
        if let Some(level) = non_empty(&v) {
            cfg.log.level = level;
        }
    }
    if let Ok(v) = std::env::var("CROPCHECK_LOG_SAVE_RUN_LOG") {
        cfg.log.save_run_log =
            parse_bool(&v).with_context(|| "CROPCHECK_LOG_SAVE_RUN_LOG")?;
    }

    Ok(())
}

fn validate(cfg: &EffectiveConfig) -> Result<()> {
    if cfg.service.health_timeout_secs == 0 {
        return Err(anyhow!("service.health_timeout_secs must be greater than 0"));
    }
    if cfg.service.predict_timeout_secs == 0 {
        return Err(anyhow!("service.predict_timeout_secs must be greater than 0"));
    }
    validate_mime_type(&cfg.upload.mime_type)?;
    if let Some(url) = &cfg.service.base_url {
        validate_base_url(url)?;
    }
    Ok(())
}

pub fn validate_base_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!(
            "invalid base URL: {url} (expected http://host:port or https://host)"
        ))
    }
}

pub fn validate_mime_type(mime_type: &str) -> Result<()> {
    match mime_type.split_once('/') {
        Some(("image", sub)) if !sub.is_empty() => Ok(()),
        _ => Err(anyhow!(
            "invalid upload mime type: {mime_type} (expected image/<subtype>, e.g. image/jpeg)"
        )),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "invalid boolean: {s} (use true|false|1|0|yes|no|on|off)"
        )),
    }
}

use anyhow::{Context, Result};
use dirs_next as dirs;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use super::model::AppConfig;

/// 覆盖配置基目录的环境变量
pub const HOME_ENV: &str = "CLASH_SWITCHBOARD_HOME";
const APP_DIR_NAME: &str = "clash-switchboard";

fn join_default_path(base: &Path) -> PathBuf {
    let mut p = base.to_path_buf();
    p.push("config");
    p.push("config.json");
    p
}

/// 配置基目录：环境变量优先，否则为系统应用配置目录
/// Windows: %APPDATA%\clash-switchboard
/// macOS: ~/Library/Application Support/clash-switchboard
/// Linux: ~/.config/clash-switchboard
pub fn base_dir() -> PathBuf {
    if let Ok(v) = std::env::var(HOME_ENV) {
        if !v.trim().is_empty() {
            return PathBuf::from(v.trim());
        }
    }
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_DIR_NAME);
        dir
    } else {
        // 极端环境下获取失败，才回退到当前目录
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }
}

pub fn config_path_at(base_dir: &Path) -> PathBuf {
    join_default_path(base_dir)
}

pub fn load_or_init_at(base_dir: &Path) -> Result<AppConfig> {
    let path = join_default_path(base_dir);
    load_or_init_at_path(&path)
}

pub fn save_at(cfg: &AppConfig, base_dir: &Path) -> Result<()> {
    let path = join_default_path(base_dir);
    save_at_path(cfg, &path)
}

fn load_or_init_at_path(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let data = fs::read(path).with_context(|| format!("read config: {}", path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&data).context("parse config json")?;
        tracing::debug!(target = "config", path = %path.display(), "config loaded");
        Ok(cfg)
    } else {
        let cfg = AppConfig::default();
        save_at_path(&cfg, path)?;
        Ok(cfg)
    }
}

fn save_at_path(cfg: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create config dir: {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(cfg).context("serialize config")?;
    let mut f =
        fs::File::create(path).with_context(|| format!("create config: {}", path.display()))?;
    f.write_all(json.as_bytes()).context("write config")?;
    tracing::info!(target = "config", path = %path.display(), "config saved");
    Ok(())
}

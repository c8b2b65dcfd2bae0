use std::path::Path;

use anyhow::Context;

use super::types::AppConfig;

pub const CONFIG_FILE_NAME: &str = "wsrun.toml";

pub const CONCURRENCY_ENV: &str = "WSRUN_CONCURRENCY";
pub const LOG_LEVEL_ENV: &str = "WSRUN_LOG_LEVEL";

/// Load `<root>/wsrun.toml` (defaults when absent), then apply env overrides.
pub fn load_from_root(root: &Path) -> anyhow::Result<AppConfig> {
    let path = root.join(CONFIG_FILE_NAME);
    let mut cfg = if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_config(&s).with_context(|| format!("invalid config {}", path.display()))?
    } else {
        AppConfig::default()
    };

    apply_env_overrides_from(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn parse_config(s: &str) -> anyhow::Result<AppConfig> {
    Ok(toml::from_str::<AppConfig>(s)?)
}

/// Environment variable overrides; empty values are ignored.
pub fn apply_env_overrides_from<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(CONCURRENCY_ENV) {
        let v = v.trim();
        if !v.is_empty() {
            let n = v
                .parse::<usize>()
                .with_context(|| format!("{CONCURRENCY_ENV} must be a non-negative integer, got {v:?}"))?;
            cfg.exec.concurrency = Some(n);
        }
    }

    if let Some(v) = lookup(LOG_LEVEL_ENV) {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }

    Ok(())
}

use std::{fs, io::ErrorKind, path::Path};

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use counter_core::{FrameLayout, WidgetOptions, UNDO_WINDOW_SECONDS};
use serde::Deserialize;
use shared::{domain::WidgetVariant, error::WidgetError};

use crate::Args;

/// Longest undo window the harness accepts, one day.
pub const MAX_UNDO_WINDOW_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub variant: WidgetVariant,
    pub storage_key: Option<String>,
    pub undo_window_seconds: i64,
    pub swipe_threshold_px: f64,
    pub log_filter: String,
    pub layout: FrameLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/widget.db".into(),
            variant: WidgetVariant::Koyaku,
            storage_key: None,
            undo_window_seconds: UNDO_WINDOW_SECONDS,
            swipe_threshold_px: counter_core::gesture::SWIPE_THRESHOLD_PX,
            log_filter: "info".into(),
            layout: FrameLayout::default(),
        }
    }
}

impl Settings {
    pub fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            variant: self.variant,
            storage_key: self.storage_key.clone(),
            slots: None,
            undo_window: Duration::seconds(
                self.undo_window_seconds.clamp(0, MAX_UNDO_WINDOW_SECONDS),
            ),
            layout: self.layout,
            swipe_threshold_px: self.swipe_threshold_px,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.undo_window_seconds > MAX_UNDO_WINDOW_SECONDS {
            return Err(anyhow!(WidgetError::Config(format!(
                "undo_window_seconds {} exceeds the maximum of {MAX_UNDO_WINDOW_SECONDS}",
                self.undo_window_seconds
            ))));
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(v) = &args.database_url {
            self.database_url = v.clone();
        }
        if let Some(v) = args.variant {
            self.variant = v;
        }
        if let Some(v) = &args.storage_key {
            self.storage_key = Some(v.clone());
        }
    }
}

/// Defaults, then the optional TOML file, then environment overrides.
pub fn load_settings(config_path: &Path) -> Result<Settings> {
    let mut settings = read_settings_file(config_path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// A missing file yields defaults; an unreadable or malformed one is an error.
pub fn read_settings_file(config_path: &Path) -> Result<Settings> {
    match fs::read_to_string(config_path) {
        Ok(raw) => {
            let settings = toml::from_str::<Settings>(&raw)
                .with_context(|| format!("failed to parse '{}'", config_path.display()))?;
            settings
                .validate()
                .with_context(|| format!("invalid settings in '{}'", config_path.display()))?;
            Ok(settings)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Settings::default()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to read '{}'", config_path.display()))
        }
    }
}

pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__VARIANT") {
        settings.variant = WidgetVariant::parse(&v).ok_or_else(|| {
            anyhow!(WidgetError::Config(format!("unknown widget variant '{v}'")))
        })?;
    }

    if let Some(v) = lookup("APP__STORAGE_KEY") {
        let trimmed = v.trim();
        if !trimmed.is_empty() {
            settings.storage_key = Some(trimmed.to_string());
        }
    }

    if let Some(v) = lookup("APP__UNDO_WINDOW_SECONDS") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.undo_window_seconds = parsed;
        }
    }

    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings.validate()
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

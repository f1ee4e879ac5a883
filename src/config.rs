use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::png::CompressionType;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub encode: EncodeConfig,
}

/// Handed to the render engine when it starts. Later restarts reuse the same
/// values.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    pub row_alignment: usize,
    pub max_pixels: u64,
    pub background: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            row_alignment: 4,
            max_pixels: 100_000_000,
            background: [0xff, 0xff, 0xff, 0xff],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Fast,
    #[default]
    Default,
    Best,
}

impl Compression {
    pub fn to_png(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Default => CompressionType::Default,
            Self::Best => CompressionType::Best,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EncodeConfig {
    pub mime_type: String,
    pub compression: Compression,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            mime_type: "image/png".to_string(),
            compression: Compression::Default,
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_input(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_input(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let alignment = self.render.row_alignment;
        if alignment < 4 || !alignment.is_power_of_two() || alignment > 4096 {
            self.render.row_alignment = RenderConfig::default().row_alignment;
        }
        self.render.max_pixels = self.render.max_pixels.max(1);
        if self.encode.mime_type.trim().is_empty() {
            self.encode.mime_type = EncodeConfig::default().mime_type;
        }
        self.encode.mime_type = self.encode.mime_type.trim().to_ascii_lowercase();
        self
    }
}

/// `PRASTER_CONFIG_PATH` wins outright; otherwise the first set base
/// directory among XDG, HOME and APPDATA gets `praster/config.toml` appended.
pub fn default_config_path() -> Option<PathBuf> {
    config_path_from(|key| std::env::var_os(key))
}

fn config_path_from(lookup: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    let var = |key: &str| lookup(key).filter(|value| !value.is_empty()).map(PathBuf::from);

    if let Some(explicit) = var("PRASTER_CONFIG_PATH") {
        return Some(explicit);
    }
    let base = var("XDG_CONFIG_HOME")
        .or_else(|| var("HOME").map(|home| home.join(".config")))
        .or_else(|| var("APPDATA"))?;
    Some(base.join("praster").join("config.toml"))
}

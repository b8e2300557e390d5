use serde::{Deserialize, Serialize};

use crate::constants::ORIGINAL_STYLE;
use crate::error::AppError;

/// Target box for one derivative style.
///
/// Dimensions are signed so that a negative value coming from configuration is
/// reported as such instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub name: String,
    pub width: i32,
    pub height: i32,
}

impl StyleConfig {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// The name becomes a key segment and a map key next to the original, so it
    /// must be a single path segment other than `original`.
    pub fn validate(&self) -> Result<(), AppError> {
        let name = self.name.trim();
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name.contains("..") {
            return Err(AppError::Configuration(format!(
                "Invalid style name: {:?}",
                self.name
            )));
        }
        if name == ORIGINAL_STYLE {
            return Err(AppError::Configuration(format!(
                "Style name {} is reserved for the uploaded file",
                ORIGINAL_STYLE
            )));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(AppError::Configuration(format!(
                "Style {} must have positive dimensions, got {}x{}",
                self.name, self.width, self.height
            )));
        }
        Ok(())
    }

    /// Validated dimensions as unsigned pixel counts.
    pub fn dimensions(&self) -> Result<(u32, u32), AppError> {
        self.validate()?;
        Ok((self.width as u32, self.height as u32))
    }

    /// Parse one entry in the form `name:WxH`.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (name, dims) = s.trim().split_once(':').ok_or_else(|| {
            AppError::Configuration(format!("Invalid style {:?}. Expected: name:WxH", s))
        })?;

        let (width, height) = dims.split_once('x').ok_or_else(|| {
            AppError::Configuration(format!("Invalid dimensions for style {}: {}", name, dims))
        })?;

        let width = width
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::Configuration(format!("Invalid width for style {}: {}", name, width)))?;
        let height = height
            .trim()
            .parse::<i32>()
            .map_err(|_| AppError::Configuration(format!("Invalid height for style {}: {}", name, height)))?;

        let style = StyleConfig::new(name.trim(), width, height);
        style.validate()?;
        Ok(style)
    }

    /// Parse a comma-separated list of `name:WxH` entries.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, AppError> {
        let styles = s
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(Self::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = std::collections::HashSet::new();
        for style in &styles {
            if !seen.insert(style.name.as_str()) {
                return Err(AppError::Configuration(format!(
                    "Style {} is configured more than once",
                    style.name
                )));
            }
        }

        Ok(styles)
    }
}

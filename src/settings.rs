//! Per-source settings.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::image_file::AlphaMode;

/// Settings recognized by an image source.
///
/// Field names on the wire match the host's settings keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Image file to show. Empty means "no image".
    #[serde(default, rename = "file")]
    pub path: String,

    /// Free the image while the source is not showing
    #[serde(default, rename = "unload")]
    pub unload_when_hidden: bool,

    /// Premultiply alpha in linear space instead of on encoded values
    #[serde(default)]
    pub linear_alpha: bool,
}

impl SourceSettings {
    /// Settings for `path` with the default flags.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Builder: free the image while hidden.
    pub fn with_unload_when_hidden(mut self, unload: bool) -> Self {
        self.unload_when_hidden = unload;
        self
    }

    /// Builder: premultiply in linear space.
    pub fn with_linear_alpha(mut self, linear: bool) -> Self {
        self.linear_alpha = linear;
        self
    }

    /// Whether the image stays loaded while hidden.
    pub fn persistent(&self) -> bool {
        !self.unload_when_hidden
    }

    /// Alpha premultiplication mode handed to the decoder.
    pub fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::from_linear_alpha(self.linear_alpha)
    }

    /// Parse settings from the host's JSON settings object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

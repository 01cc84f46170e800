use serde::{Deserialize, Serialize};

/// Output layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// No insignificant whitespace.
    #[default]
    Minimal,
    /// Two-space indent, one member or element per line.
    Pretty,
}

/// Controls JSON rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub style: Style,
}

impl WriterConfig {
    pub const MINIMAL: Self = Self {
        style: Style::Minimal,
    };

    pub const PRETTY: Self = Self {
        style: Style::Pretty,
    };

    pub fn is_pretty(&self) -> bool {
        self.style == Style::Pretty
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrollerConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
}

/// Layout flow. Only continuous scrolling is supported; column pagination
/// is not implemented and fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    #[default]
    Scrolled,
}

/// Host layout attributes, read every time a section is rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub flow: Flow,
    /// Inline gap as a percentage of the viewport inline size
    #[serde(default = "default_gap_percent")]
    pub gap_percent: f64,
    #[serde(default = "default_margin")]
    pub margin_top: f64,
    #[serde(default = "default_margin")]
    pub margin_right: f64,
    #[serde(default = "default_margin")]
    pub margin_bottom: f64,
    #[serde(default = "default_margin")]
    pub margin_left: f64,
    /// Maximum line length in pixels
    #[serde(default = "default_max_inline_size")]
    pub max_inline_size: f64,
    /// Maximum block size of replaced media in pixels
    #[serde(default = "default_max_block_size")]
    pub max_block_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            flow: Flow::default(),
            gap_percent: default_gap_percent(),
            margin_top: default_margin(),
            margin_right: default_margin(),
            margin_bottom: default_margin(),
            margin_left: default_margin(),
            max_inline_size: default_max_inline_size(),
            max_block_size: default_max_block_size(),
        }
    }
}

/// Easing function used for animated scrolling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    /// Jump at the end of the animation
    None,
    Linear,
    /// Decelerates into the target
    #[default]
    EaseOutQuad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Animate page turns
    #[serde(default)]
    pub animated: bool,
    /// E-ink displays never animate, even when `animated` is set
    #[serde(default)]
    pub eink: bool,
    #[serde(default = "default_animation_duration")]
    pub animation_duration_ms: u64,
    #[serde(default)]
    pub easing: EasingType,
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    /// Quiet period after the last scroll event before a relocation is reported
    #[serde(default = "default_settle_debounce")]
    pub settle_debounce_ms: u64,
    /// How long a page turn keeps the navigation lock after it finishes
    #[serde(default = "default_turn_cooldown")]
    pub turn_cooldown_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            animated: false,
            eink: false,
            animation_duration_ms: default_animation_duration(),
            easing: EasingType::default(),
            animation_fps: default_animation_fps(),
            settle_debounce_ms: default_settle_debounce(),
            turn_cooldown_ms: default_turn_cooldown(),
        }
    }
}

impl ScrollConfig {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn animation_tick_duration(&self) -> Duration {
        if self.animation_fps == 0 {
            Duration::from_millis(16) // ~60fps fallback
        } else {
            Duration::from_millis(1000 / self.animation_fps as u64)
        }
    }

    pub fn settle_debounce(&self) -> Duration {
        Duration::from_millis(self.settle_debounce_ms)
    }

    pub fn turn_cooldown(&self) -> Duration {
        Duration::from_millis(self.turn_cooldown_ms)
    }

    /// Check if animated scrolling is effectively enabled
    pub fn is_smooth(&self) -> bool {
        self.animated && !self.eink && self.animation_duration_ms > 0
    }
}

fn default_gap_percent() -> f64 {
    7.0
}

fn default_margin() -> f64 {
    48.0
}

fn default_max_inline_size() -> f64 {
    720.0
}

fn default_max_block_size() -> f64 {
    1440.0
}

fn default_animation_duration() -> u64 {
    300
}

fn default_animation_fps() -> u32 {
    60
}

fn default_settle_debounce() -> u64 {
    250
}

fn default_turn_cooldown() -> u64 {
    100
}

impl ScrollerConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// Always uses ~/.config/flowview/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("flowview")
            .join("config.toml")
    }
}

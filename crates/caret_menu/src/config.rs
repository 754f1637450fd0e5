//! Menu configuration
//!
//! [`OverlayOptions`] is handed verbatim to the overlay factory. [`MenuConfig`]
//! is the serializable part of a menu's setup (key, shortcuts, overlay
//! options) so hosts can keep it in a TOML file next to their other settings:
//!
//! ```toml
//! plugin_name = "slashMenu"
//! open_key = "Mod-k"
//!
//! [overlay]
//! placement = "bottom"
//! duration_ms = 150
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::commands::{DEFAULT_CLOSE_KEY, DEFAULT_OPEN_KEY};
use crate::error::Result;

/// Default plugin name
pub const DEFAULT_PLUGIN_NAME: &str = "floatingMenu";

// =============================================================================
// OverlayOptions
// =============================================================================

/// Side of the reference rectangle the overlay is placed on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
    /// Whichever side has the most room
    Auto,
}

/// Where the overlay's element is mounted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendTo {
    /// The editor's own parent element
    #[default]
    Parent,
    /// The document body
    Body,
}

/// Options for the overlay library
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    /// Side of the caret rectangle to place the menu on
    pub placement: Placement,
    /// Offset along the reference edge
    pub offset_skidding: f32,
    /// Offset away from the reference edge
    pub offset_distance: f32,
    /// Show/hide transition duration
    pub duration_ms: u32,
    /// Stacking order
    pub z_index: i32,
    /// Whether the overlay content takes pointer and keyboard input
    pub interactive: bool,
    /// Maximum width (None = unbounded)
    pub max_width: Option<f32>,
    /// Mount point for the overlay element
    pub append_to: AppendTo,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self::floating_menu()
    }
}

impl OverlayOptions {
    /// Caret-anchored menu to the right of an empty line
    pub fn floating_menu() -> Self {
        Self {
            placement: Placement::Right,
            offset_skidding: 0.0,
            offset_distance: 10.0,
            duration_ms: 100,
            z_index: 9999,
            interactive: true,
            max_width: None,
            append_to: AppendTo::Parent,
        }
    }

    /// Menu dropped below the caret line
    pub fn dropdown() -> Self {
        Self {
            placement: Placement::Bottom,
            offset_distance: 4.0,
            ..Self::floating_menu()
        }
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn offset(mut self, skidding: f32, distance: f32) -> Self {
        self.offset_skidding = skidding;
        self.offset_distance = distance;
        self
    }

    pub fn duration_ms(mut self, ms: u32) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn append_to(mut self, append_to: AppendTo) -> Self {
        self.append_to = append_to;
        self
    }
}

// =============================================================================
// MenuConfig
// =============================================================================

/// Serializable menu setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Name the plugin key is created from
    pub plugin_name: String,
    /// Chord that opens the menu in an empty block
    pub open_key: String,
    /// Chord that closes the menu
    pub close_key: String,
    /// Options for the overlay library
    pub overlay: OverlayOptions,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            open_key: DEFAULT_OPEN_KEY.to_string(),
            close_key: DEFAULT_CLOSE_KEY.to_string(),
            overlay: OverlayOptions::default(),
        }
    }
}

impl MenuConfig {
    /// Parse from TOML; missing fields take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn from_toml_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize menu config")
    }
}

//! Configuration types for the Kinro client.
//!
//! All types implement [`serde::Deserialize`] with a default for every
//! field, so a partial configuration file only overrides what it names.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining backend, layout and style settings.
//! - [`BackendConfig`] - Where the REST server lives.
//! - [`LayoutConfig`] - Node box dimensions and spacing used by the layout engine.
//! - [`StyleConfig`] - Visual styling of exported diagrams.
//!
//! # Example
//!
//! ```
//! # use kinro::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.backend().base_url(), "http://127.0.0.1:8000");
//! assert_eq!(config.layout().node_width(), 224.0);
//! ```

use serde::Deserialize;

use kinro_core::color::Color;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Backend configuration section.
    #[serde(default)]
    backend: BackendConfig,

    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(backend: BackendConfig, layout: LayoutConfig, style: StyleConfig) -> Self {
        Self {
            backend,
            layout,
            style,
        }
    }

    /// Returns the backend configuration.
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Replaces the backend base URL, keeping every other setting.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }
}

/// Location of the REST server.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Returns the server base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Node box dimensions and spacing for automatic layout.
///
/// A node with `n` attributes is `node_width` wide and
/// `base_height + n * attribute_height` tall.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    node_width: f32,
    base_height: f32,
    attribute_height: f32,
    horizontal_spacing: f32,
    vertical_spacing: f32,
}

impl LayoutConfig {
    /// Creates a new [`LayoutConfig`].
    ///
    /// # Arguments
    ///
    /// * `node_width` - Width of every node box.
    /// * `base_height` - Height of a node box without attributes.
    /// * `attribute_height` - Height added per attribute row.
    /// * `horizontal_spacing` - Gap between neighbouring boxes in a rank.
    /// * `vertical_spacing` - Gap between consecutive ranks.
    pub fn new(
        node_width: f32,
        base_height: f32,
        attribute_height: f32,
        horizontal_spacing: f32,
        vertical_spacing: f32,
    ) -> Self {
        Self {
            node_width,
            base_height,
            attribute_height,
            horizontal_spacing,
            vertical_spacing,
        }
    }

    pub fn node_width(&self) -> f32 {
        self.node_width
    }

    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    pub fn attribute_height(&self) -> f32 {
        self.attribute_height
    }

    pub fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(224.0, 50.0, 40.0, 50.0, 80.0)
    }
}

/// Visual styling configuration for exported diagrams.
///
/// Fields that are not set fall back to renderer defaults.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background [`Color`] for diagrams, as a color string.
    #[serde(default)]
    background_color: Option<String>,

    /// Fill [`Color`] of node boxes, as a color string.
    #[serde(default)]
    node_fill: Option<String>,
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed
    /// into a valid [`Color`].
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        parse_optional_color(self.background_color.as_deref(), "background color")
    }

    /// Returns the parsed node fill [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string is not a valid color.
    pub fn node_fill(&self) -> Result<Option<Color>, String> {
        parse_optional_color(self.node_fill.as_deref(), "node fill")
    }
}

fn parse_optional_color(value: Option<&str>, what: &str) -> Result<Option<Color>, String> {
    value
        .map(Color::new)
        .transpose()
        .map_err(|err| format!("Invalid {what} in config: {err}"))
}

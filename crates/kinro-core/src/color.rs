//! Colors for rendered diagrams.
//!
//! [`Color`] parses any CSS color string through the `color` crate. It is
//! used for relationship strokes and for the node fill and background read
//! from style configuration.

use std::{fmt, str::FromStr};

use color::DynamicColor;

/// A parsed CSS color.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Color {
    /// Parses a CSS color string such as `"#3b82f6"`, `"rgb(34 197 94)"` or
    /// `"orange"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kinro_core::color::Color;
    ///
    /// assert!(Color::new("#f97316").is_ok());
    /// assert!(Color::new("orange").is_ok());
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(css: &str) -> Result<Self, String> {
        DynamicColor::from_str(css)
            .map(|color| Self { color })
            .map_err(|err| format!("invalid color `{css}`: {err}"))
    }

    /// Returns a form of the color usable inside an SVG id, such as the id
    /// of the arrow marker drawn in this color.
    ///
    /// The result starts with a letter and holds only ASCII letters, digits
    /// and underscores.
    pub fn to_id_safe_string(self) -> String {
        let id: String = self
            .to_string()
            .replace('#', "hex")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        if id.starts_with(|c: char| c.is_ascii_alphabetic()) {
            id
        } else {
            format!("c_{id}")
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<&Color> for svg::node::Value {
    fn from(color: &Color) -> Self {
        Self::from(color.to_string())
    }
}

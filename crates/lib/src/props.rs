//! Desired-state property model.
//!
//! A [`PropertySet`] is the unit of desired state: every field optional,
//! absent meaning "leave the live value alone". Structural equality between
//! property sets is what the reconciler's equality gate compares, so the
//! types here derive `PartialEq` all the way down.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
  #[error("invalid hex color '{0}': expected #RRGGBB")]
  Invalid(String),
}

/// An RGB color, serialized as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

impl Rgb {
  pub const fn new(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }

  /// Parses `#RRGGBB`; case-insensitive, the leading `#` optional.
  pub fn from_hex(s: &str) -> Result<Self, ColorError> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(ColorError::Invalid(s.to_string()));
    }
    let channel =
      |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ColorError::Invalid(s.to_string()));
    Ok(Self {
      r: channel(0)?,
      g: channel(2)?,
      b: channel(4)?,
    })
  }

  /// Formats as lowercase `#rrggbb`.
  pub fn to_hex(self) -> String {
    format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }
}

impl TryFrom<String> for Rgb {
  type Error = ColorError;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    Rgb::from_hex(&s)
  }
}

impl From<Rgb> for String {
  fn from(color: Rgb) -> Self {
    color.to_hex()
  }
}

impl fmt::Display for Rgb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}

/// Text contents as authored in a task: a string, or a bare number that is
/// de-fractionalized when written (`3.14` → `"3"`, `38.0` → `"38"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
  Text(String),
  Number(f64),
}

impl TextValue {
  /// The string actually written into the document.
  pub fn render(&self) -> String {
    match self {
      TextValue::Text(s) => s.clone(),
      TextValue::Number(n) => (n.trunc() as i64).to_string(),
    }
  }
}

/// Desired state for a text item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextProps {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contents: Option<TextValue>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub size: Option<f64>,

  /// `#RRGGBB` hex string; converted to the host's native color at apply
  /// time, so a malformed value is a per-property failure, not a parse
  /// failure.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,

  /// Postscript font name.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub font: Option<String>,
}

impl TextProps {
  pub fn is_empty(&self) -> bool {
    self.contents.is_none() && self.size.is_none() && self.color.is_none() && self.font.is_none()
  }
}

/// Desired state for one element.
///
/// Unknown keys are a deserialization error rather than a silently dropped
/// mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySet {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visible: Option<bool>,

  /// Absolute target for the bounding-box origin; applied as a relative
  /// translate against the live origin.
  #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
  pub move_to: Option<(f64, f64)>,

  /// Relative rotation in degrees. Fire-and-forget: never captured, never
  /// restored.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rotate: Option<f64>,

  #[serde(rename = "textItem", default, skip_serializing_if = "Option::is_none")]
  pub text: Option<TextProps>,
}

impl PropertySet {
  pub fn is_empty(&self) -> bool {
    self.visible.is_none() && self.move_to.is_none() && self.rotate.is_none() && self.text.is_none()
  }

  /// Number of properties this set would write, counting text sub-properties
  /// individually.
  pub fn property_count(&self) -> usize {
    let text = self.text.as_ref().map_or(0, |t| {
      [t.contents.is_some(), t.size.is_some(), t.color.is_some(), t.font.is_some()]
        .iter()
        .filter(|present| **present)
        .count()
    });
    [self.visible.is_some(), self.move_to.is_some(), self.rotate.is_some()]
      .iter()
      .filter(|present| **present)
      .count()
      + text
  }

  /// Whether this target carries at least one capturable property
  /// (`visible`, `textItem.size`, `textItem.color`). Targets without one
  /// never trigger a baseline capture.
  pub fn wants_capture(&self) -> bool {
    self.visible.is_some() || self.text.as_ref().is_some_and(|t| t.size.is_some() || t.color.is_some())
  }
}

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::round_to_u32;

/// Sketch width/height ratio kept while the aspect lock is on.
pub const SKETCH_ASPECT: f64 = 9.0 / 16.0;

/// Inclusive sketch width bounds.
pub const SKETCH_WIDTH_RANGE: (u32, u32) = (50, 200);
/// Inclusive sketch height bounds.
pub const SKETCH_HEIGHT_RANGE: (u32, u32) = (89, 356);
/// Inclusive inset-video width bounds.
pub const VIDEO_WIDTH_RANGE: (u32, u32) = (200, 350);
/// Inclusive inset-video height bounds.
pub const VIDEO_HEIGHT_RANGE: (u32, u32) = (300, 500);
/// Inclusive recording duration bounds in seconds.
pub const DURATION_RANGE_SECS: (u32, u32) = (3, 15);

/// Upper bound on the label name length, in characters.
pub const MAX_NAME_CHARS: usize = 64;
/// Upper bound on the label age.
pub const MAX_AGE: u32 = 150;

/// Which sketch dimension the caller changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Width changed; height is derived.
    Width,
    /// Height changed; width is derived.
    Height,
}

/// Pixel offset in canvas space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    /// Horizontal offset.
    pub x: i64,
    /// Vertical offset.
    pub y: i64,
}

/// Pixel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Text shown in the two-line label.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Label {
    /// Name line.
    pub name: String,
    /// Age shown as `Age: N`.
    pub age: u32,
}

impl Label {
    /// The second label line.
    pub fn age_line(&self) -> String {
        format!("Age: {}", self.age)
    }
}

/// All parameters that determine one composed frame.
///
/// The config is an immutable value: setters consume `self` and return the updated config so a
/// tick always sees one consistent snapshot.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionConfig {
    /// Output canvas.
    pub canvas: Canvas,
    /// Sketch origin.
    pub sketch_position: Position,
    /// Sketch size.
    pub sketch_size: Size,
    /// Keep the sketch at 9:16.
    pub maintain_aspect_ratio: bool,
    /// Inset-video origin (used only with a background template).
    pub video_position: Position,
    /// Inset-video size.
    pub video_size: Size,
    /// Anchor of the age line; the name line sits above it.
    pub text_position: Position,
    /// Label text.
    pub label: Label,
    /// Recording duration in seconds.
    pub duration_secs: u32,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::PORTRAIT,
            sketch_position: Position { x: 50, y: 560 },
            sketch_size: Size {
                width: 135,
                height: 240,
            },
            maintain_aspect_ratio: true,
            video_position: Position { x: 60, y: 120 },
            video_size: Size {
                width: 285,
                height: 428,
            },
            text_position: Position { x: 220, y: 680 },
            label: Label {
                name: "Whiskers".to_string(),
                age: 8,
            },
            duration_secs: 5,
        }
    }
}

impl CompositionConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> ComposerResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ComposerError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every range invariant.
    ///
    /// Rectangles may overflow the far canvas edge (renderers clip), but their origins must lie
    /// inside the canvas.
    pub fn validate(&self) -> ComposerResult<()> {
        self.canvas.validate()?;
        check_range("sketch width", self.sketch_size.width, SKETCH_WIDTH_RANGE)?;
        check_range("sketch height", self.sketch_size.height, SKETCH_HEIGHT_RANGE)?;
        check_range("video width", self.video_size.width, VIDEO_WIDTH_RANGE)?;
        check_range("video height", self.video_size.height, VIDEO_HEIGHT_RANGE)?;
        check_range("duration", self.duration_secs, DURATION_RANGE_SECS)?;
        self.check_origin("sketch", self.sketch_position)?;
        self.check_origin("video", self.video_position)?;
        self.check_origin("text", self.text_position)?;

        if self.maintain_aspect_ratio {
            let expected = height_for_width(self.sketch_size.width);
            let back = width_for_height(self.sketch_size.height);
            if self.sketch_size.height != expected && self.sketch_size.width != back {
                return Err(ComposerError::validation(format!(
                    "sketch {}x{} is not 9:16 while the aspect lock is on",
                    self.sketch_size.width, self.sketch_size.height
                )));
            }
        }

        validate_label(&self.label)
    }

    /// Change one sketch dimension, deriving the other when the aspect lock is on.
    ///
    /// The changed value is clamped to its own range first, like a bounded slider.
    pub fn with_sketch_dimension(mut self, dim: Dimension, value: u32) -> Self {
        match dim {
            Dimension::Width => {
                let width = clamp_range(value, SKETCH_WIDTH_RANGE);
                self.sketch_size.width = width;
                if self.maintain_aspect_ratio {
                    self.sketch_size.height = height_for_width(width);
                }
            }
            Dimension::Height => {
                let height = clamp_range(value, SKETCH_HEIGHT_RANGE);
                self.sketch_size.height = height;
                if self.maintain_aspect_ratio {
                    self.sketch_size.width = width_for_height(height);
                }
            }
        }
        self
    }

    /// Toggle the aspect lock. Turning it on re-derives height from the current width.
    pub fn with_aspect_lock(mut self, locked: bool) -> Self {
        self.maintain_aspect_ratio = locked;
        if locked {
            self.sketch_size.height = height_for_width(self.sketch_size.width);
        }
        self
    }

    /// Replace the sketch origin.
    pub fn with_sketch_position(mut self, x: i64, y: i64) -> Self {
        self.sketch_position = Position { x, y };
        self
    }

    /// Replace the text anchor (the age baseline origin).
    pub fn with_text_position(mut self, x: i64, y: i64) -> Self {
        self.text_position = Position { x, y };
        self
    }

    /// Replace the label text.
    pub fn with_label(mut self, name: impl Into<String>, age: u32) -> Self {
        self.label = Label {
            name: name.into(),
            age,
        };
        self
    }

    /// Replace the recording duration.
    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Sketch rectangle in canvas pixels. Call after [`Self::validate`].
    pub fn sketch_rect(&self) -> PixelRect {
        rect_at(self.sketch_position, self.sketch_size)
    }

    /// Inset-video rectangle in canvas pixels. Call after [`Self::validate`].
    pub fn video_rect(&self) -> PixelRect {
        rect_at(self.video_position, self.video_size)
    }

    fn check_origin(&self, what: &str, p: Position) -> ComposerResult<()> {
        if p.x < 0 || p.y < 0 {
            return Err(ComposerError::validation(format!(
                "{what} position ({}, {}) must be non-negative",
                p.x, p.y
            )));
        }
        if p.x >= i64::from(self.canvas.width) || p.y >= i64::from(self.canvas.height) {
            return Err(ComposerError::validation(format!(
                "{what} position ({}, {}) is outside the {}x{} canvas",
                p.x, p.y, self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }
}

/// Height derived from a sketch width under the aspect lock.
pub fn height_for_width(width: u32) -> u32 {
    clamp_range(
        round_to_u32(f64::from(width) / SKETCH_ASPECT),
        SKETCH_HEIGHT_RANGE,
    )
}

/// Width derived from a sketch height under the aspect lock.
pub fn width_for_height(height: u32) -> u32 {
    clamp_range(
        round_to_u32(f64::from(height) * SKETCH_ASPECT),
        SKETCH_WIDTH_RANGE,
    )
}

/// Validate a recording duration against [`DURATION_RANGE_SECS`].
pub fn validate_duration_secs(secs: u32) -> ComposerResult<u32> {
    check_range("duration", secs, DURATION_RANGE_SECS)?;
    Ok(secs)
}

/// Validate label text: non-empty, bounded, no control characters.
pub fn validate_label(label: &Label) -> ComposerResult<()> {
    let name = label.name.trim();
    if name.is_empty() {
        return Err(ComposerError::validation("name must not be empty"));
    }
    if label.name.chars().count() > MAX_NAME_CHARS {
        return Err(ComposerError::validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    if label.name.chars().any(char::is_control) {
        return Err(ComposerError::validation(
            "name must not contain control characters",
        ));
    }
    if label.age > MAX_AGE {
        return Err(ComposerError::validation(format!(
            "age must be at most {MAX_AGE}"
        )));
    }
    Ok(())
}

fn clamp_range(v: u32, (lo, hi): (u32, u32)) -> u32 {
    v.clamp(lo, hi)
}

fn check_range(what: &str, v: u32, (lo, hi): (u32, u32)) -> ComposerResult<()> {
    if v < lo || v > hi {
        return Err(ComposerError::validation(format!(
            "{what} {v} is outside [{lo}, {hi}]"
        )));
    }
    Ok(())
}

fn rect_at(p: Position, s: Size) -> PixelRect {
    PixelRect::new(
        u32::try_from(p.x).unwrap_or(0),
        u32::try_from(p.y).unwrap_or(0),
        s.width,
        s.height,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/composition/config.rs"]
mod tests;

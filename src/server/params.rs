use std::collections::HashMap;

use crate::composition::config::{
    CompositionConfig, DURATION_RANGE_SECS, Dimension, SKETCH_WIDTH_RANGE, validate_duration_secs,
};
use crate::filtergraph::compose::Effects;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Duration used when the request omits it.
pub const DEFAULT_DURATION_SECS: u32 = 5;

/// Parsed form fields of a compose request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeParams {
    pub config: CompositionConfig,
    pub effects: Effects,
}

impl ComposeParams {
    /// Parse and validate the text fields of a compose form.
    ///
    /// `sketchSize` is the sketch width; the height follows the 9:16 lock. Out-of-range numbers
    /// are rejected, never clamped.
    pub fn from_fields(fields: &HashMap<String, String>) -> ComposerResult<Self> {
        let defaults = CompositionConfig::default();
        let name = fields
            .get("monsterName")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| defaults.label.name.clone());
        let age = number(fields, "childAge")?.unwrap_or(i64::from(defaults.label.age));
        let age = u32::try_from(age)
            .map_err(|_| ComposerError::validation(format!("childAge {age} is out of range")))?;

        let x = number(fields, "sketchX")?.unwrap_or(defaults.sketch_position.x);
        let y = number(fields, "sketchY")?.unwrap_or(defaults.sketch_position.y);
        let text_x = number(fields, "textX")?.unwrap_or(defaults.text_position.x);
        let text_y = number(fields, "textY")?.unwrap_or(defaults.text_position.y);

        let width = match number(fields, "sketchSize")? {
            Some(w) => in_range("sketchSize", w, SKETCH_WIDTH_RANGE)?,
            None => defaults.sketch_size.width,
        };
        let duration = match number(fields, "duration")? {
            Some(d) => validate_duration_secs(in_range("duration", d, DURATION_RANGE_SECS)?)?,
            None => DEFAULT_DURATION_SECS,
        };

        let effects = match fields.get("effects").map(|s| s.trim()) {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)
                .map_err(|e| ComposerError::validation(format!("effects: {e}")))?,
            _ => Effects::default(),
        };

        let config = defaults
            .with_label(name, age)
            .with_sketch_position(x, y)
            .with_text_position(text_x, text_y)
            .with_sketch_dimension(Dimension::Width, width)
            .with_duration_secs(duration);
        config.validate()?;
        Ok(Self { config, effects })
    }
}

fn number(fields: &HashMap<String, String>, key: &str) -> ComposerResult<Option<i64>> {
    let Some(raw) = fields.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Some(v));
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() < 1e9 => Ok(Some(v.round() as i64)),
        _ => Err(ComposerError::validation(format!(
            "{key} must be a number, got '{raw}'"
        ))),
    }
}

fn in_range(key: &str, v: i64, (lo, hi): (u32, u32)) -> ComposerResult<u32> {
    u32::try_from(v)
        .ok()
        .filter(|v| (lo..=hi).contains(v))
        .ok_or_else(|| ComposerError::validation(format!("{key} must be in [{lo}, {hi}], got {v}")))
}

#[cfg(test)]
#[path = "../../tests/unit/server/params.rs"]
mod tests;

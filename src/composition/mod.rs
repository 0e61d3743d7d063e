/// Composition parameters, ranges and the sketch aspect-lock rule.
pub mod config;

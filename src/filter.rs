use std::collections::BTreeSet;

use tracing::debug;

use crate::detection::Detection;
use crate::errors::{ExtractError, Result};

/// Confidence threshold and class whitelist applied to every detection.
///
/// Built once per run from the raw command-line values and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub min_confidence: f32,
    /// Empty means every class is allowed.
    pub allowed_classes: BTreeSet<u32>,
}

impl FilterSpec {
    /// Validate raw confidence and class inputs.
    ///
    /// Classes are checked first, then confidence. Either failure aborts the
    /// run before a single image is read.
    pub fn from_args(confidence: Option<f32>, classes: Option<&str>) -> Result<Self> {
        let allowed_classes = match classes {
            Some(spec) => parse_class_ids(spec)?,
            None => BTreeSet::new(),
        };
        let min_confidence = validate_confidence(confidence)?;

        debug!(min_confidence, ?allowed_classes, "filter spec validated");
        Ok(Self {
            min_confidence,
            allowed_classes,
        })
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.confidence >= self.min_confidence
            && (self.allowed_classes.is_empty()
                || self.allowed_classes.contains(&detection.class_id))
    }
}

/// Parse a class-id list such as `"1,2,3"`, `"1 2 3"` or `"7"`.
///
/// Commas take precedence over whitespace; each token is trimmed. Every token
/// must be a non-negative integer.
pub fn parse_class_ids(spec: &str) -> Result<BTreeSet<u32>> {
    let tokens: Vec<&str> = if spec.contains(',') {
        spec.split(',').map(str::trim).collect()
    } else if spec.trim().contains(char::is_whitespace) {
        spec.split_whitespace().collect()
    } else {
        vec![spec.trim()]
    };

    tokens
        .into_iter()
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| ExtractError::InvalidFilterSpec {
                    spec: spec.to_string(),
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Absent confidence means 0.0. Only the upper bound is enforced.
pub fn validate_confidence(confidence: Option<f32>) -> Result<f32> {
    match confidence {
        None => Ok(0.0),
        Some(value) if value > 1.0 => Err(ExtractError::InvalidConfidence { value }),
        Some(value) => Ok(value),
    }
}

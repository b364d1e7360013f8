use super::{strip_label, ParseError};

/// Score used when the evaluation reply has no usable `SCORE:` line.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Reads the first `SCORE:` line, clamped to `[0, 1]`.
pub fn parse_score(text: &str) -> Result<f64, ParseError> {
    let raw = text
        .lines()
        .find_map(|line| strip_label(line.trim(), "SCORE:"))
        .ok_or(ParseError::MissingScore)?;
    let token = raw
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| !c.is_ascii_digit());
    let value: f64 = token
        .parse()
        .map_err(|_| ParseError::InvalidScore(raw.to_string()))?;
    if value.is_nan() {
        return Err(ParseError::InvalidScore(raw.to_string()));
    }
    Ok(value.clamp(0.0, 1.0))
}

pub fn score_or_default(text: &str) -> f64 {
    parse_score(text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using neutral score");
        NEUTRAL_SCORE
    })
}

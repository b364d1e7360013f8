use serde::{Deserialize, Serialize};

use super::ParseError;

/// Outcome of one trial as judged by the evaluation reasoner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure,
}

/// First line mentioning `success` or `failure` (any case) decides. A line
/// mentioning both, or "unsuccessful", counts as failure.
pub fn parse_verdict(text: &str) -> Result<Verdict, ParseError> {
    text.lines()
        .map(str::to_ascii_lowercase)
        .find_map(|line| {
            if line.contains("failure") || line.contains("unsuccess") {
                Some(Verdict::Failure)
            } else if line.contains("success") {
                Some(Verdict::Success)
            } else {
                None
            }
        })
        .ok_or(ParseError::NoVerdict)
}

pub fn verdict_or_failure(text: &str) -> Verdict {
    parse_verdict(text).unwrap_or(Verdict::Failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_verdict_line_decides() {
        assert_eq!(
            parse_verdict("analysis\nVERDICT: Success\nfailure later"),
            Ok(Verdict::Success)
        );
        assert_eq!(parse_verdict("FAILURE: wrong unit"), Ok(Verdict::Failure));
        assert_eq!(parse_verdict("it was unsuccessful"), Ok(Verdict::Failure));
    }

    #[test]
    fn missing_verdict_is_failure() {
        assert_eq!(parse_verdict("hmm"), Err(ParseError::NoVerdict));
        assert_eq!(verdict_or_failure("hmm"), Verdict::Failure);
    }
}

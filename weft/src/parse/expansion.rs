use super::{strip_label, ParseError};

/// One candidate child proposed by the thinking reasoner.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub action: String,
    pub state: String,
    /// `STATE:` began with `FINAL`: the candidate claims to answer the task.
    pub terminal: bool,
}

impl Expansion {
    fn new(action: String, state: String) -> Self {
        let terminal = state
            .get(..5)
            .map(|p| p.eq_ignore_ascii_case("FINAL"))
            .unwrap_or(false);
        Self {
            action,
            state,
            terminal,
        }
    }
}

#[derive(Default)]
struct Block {
    action: Option<String>,
    state: Option<String>,
    in_state: bool,
}

impl Block {
    fn finish(&mut self, out: &mut Vec<Expansion>) {
        let block = std::mem::take(self);
        match (block.action, block.state) {
            (Some(action), Some(state)) if !state.is_empty() => {
                out.push(Expansion::new(action, state));
            }
            _ => {}
        }
    }
}

/// Parses `EXPANSION n` / `ACTION:` / `STATE:` blocks, keeping at most `limit`.
///
/// Blocks are separated by blank lines or `EXPANSION` headers. A block needs
/// both an action and a non-empty state; continuation lines extend the state.
pub fn parse_expansions(text: &str, limit: usize) -> Result<Vec<Expansion>, ParseError> {
    let mut out = Vec::new();
    let mut block = Block::default();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || strip_label(trimmed, "EXPANSION").is_some() {
            block.finish(&mut out);
            continue;
        }
        if let Some(action) = strip_label(trimmed, "ACTION:") {
            if block.action.is_some() {
                block.finish(&mut out);
            }
            block.action = Some(action.to_string());
            block.in_state = false;
        } else if let Some(state) = strip_label(trimmed, "STATE:") {
            block.state = Some(state.to_string());
            block.in_state = true;
        } else if block.in_state {
            if let Some(state) = block.state.as_mut() {
                if !state.is_empty() {
                    state.push(' ');
                }
                state.push_str(trimmed);
            }
        }
    }
    block.finish(&mut out);
    out.truncate(limit);
    if out.is_empty() {
        return Err(ParseError::NoExpansions);
    }
    Ok(out)
}

/// Up to two generic children so the search can continue after an
/// unparsable reply.
pub fn fallback_expansions(limit: usize) -> Vec<Expansion> {
    (1..=limit.min(2))
        .map(|i| {
            Expansion::new(
                format!("Explore alternative {}", i),
                format!("Unexplored line of reasoning #{}", i),
            )
        })
        .collect()
}

pub fn expansions_or_fallback(text: &str, limit: usize) -> Vec<Expansion> {
    match parse_expansions(text, limit) {
        Ok(children) => children,
        Err(e) => {
            tracing::warn!(error = %e, "expansion reply unparsable; using placeholder children");
            fallback_expansions(limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_blocks() {
        let text = "EXPANSION 1\nACTION: factor\nSTATE: x = 2 * 3\n\nEXPANSION 2\nACTION: guess\nSTATE: FINAL answer is 6\n";
        let out = parse_expansions(text, 3).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].action, "factor");
        assert_eq!(out[0].state, "x = 2 * 3");
        assert!(!out[0].terminal);
        assert!(out[1].terminal);
    }

    #[test]
    fn consecutive_actions_without_blank_lines_split() {
        let text = "ACTION: a\nSTATE: s1\nACTION: b\nSTATE: s2\n  continued";
        let out = parse_expansions(text, 5).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].state, "s2 continued");
    }

    #[test]
    fn limit_truncates() {
        let text = "ACTION: a\nSTATE: 1\n\nACTION: b\nSTATE: 2\n\nACTION: c\nSTATE: 3";
        assert_eq!(parse_expansions(text, 2).unwrap().len(), 2);
    }

    /// **Scenario**: A reply without any ACTION/STATE pair yields up to two placeholder children.
    #[test]
    fn unparsable_reply_falls_back() {
        assert_eq!(
            parse_expansions("I am not sure.", 3),
            Err(ParseError::NoExpansions)
        );
        assert_eq!(expansions_or_fallback("I am not sure.", 3).len(), 2);
        assert_eq!(expansions_or_fallback("", 1).len(), 1);
    }

    #[test]
    fn block_missing_state_is_skipped() {
        let text = "ACTION: a\n\nACTION: b\nSTATE: ok";
        let out = parse_expansions(text, 3).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].action, "b");
    }
}

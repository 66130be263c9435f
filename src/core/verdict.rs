//! Best-effort reading of the verdicts a synthesis reply asks for.
//!
//! Nothing here is authoritative: the reply is free text and any part of it may
//! be missing or phrased differently. Unreadable parts come back as `None`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            "hold" => Ok(Self::Hold),
            other => Err(format!("not an action: {other}")),
        }
    }
}

/// `Video 2 - Hold`, `**Video #2:** Hold`, `Video number 2 – hold`,
/// `Video 2 (id abcDEF12345) - Hold`.
static ITEM_VERDICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bvideo\s*(?:number\s*|no\.?\s*)?#?\s*(\d+)\b(?:\s*\([^)\n]*\))?[^A-Za-z0-9\n]*(?:-|–|—|:|=)?[^A-Za-z0-9\n]*\b(buy|sell|hold)\b")
        .expect("item verdict regex")
});

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(buy|sell|hold)\b").expect("action regex"));

/// Per-item verdicts keyed by the ordinal used in the reply. The first mention
/// of an ordinal wins.
pub fn parse_item_verdicts(text: &str) -> Vec<(usize, Action)> {
    let mut verdicts: Vec<(usize, Action)> = Vec::new();

    for captures in ITEM_VERDICT_RE.captures_iter(text) {
        let Ok(ordinal) = captures[1].parse::<usize>() else {
            continue;
        };
        let Ok(action) = captures[2].parse::<Action>() else {
            continue;
        };
        if !verdicts.iter().any(|(seen, _)| *seen == ordinal) {
            verdicts.push((ordinal, action));
        }
    }

    verdicts
}

/// The aggregate one-word recommendation: the last line that names exactly one
/// action and is not a per-item verdict.
pub fn parse_recommendation(text: &str) -> Option<Action> {
    text.lines()
        .rev()
        .filter(|line| !ITEM_VERDICT_RE.is_match(line))
        .find_map(|line| {
            let mut found = ACTION_RE
                .find_iter(line)
                .filter_map(|m| m.as_str().parse::<Action>().ok());
            match (found.next(), found.next()) {
                (Some(action), None) => Some(action),
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "\
**Summary**
XRP rallied on ETF chatter. Analysts disagree on how long it lasts. Volume stayed high.

**Per video**
Video 1 - Buy
**Video 2:** Hold
Video number 3 – sell

**Suggested move**
Hold
";

    #[test]
    fn reads_each_item_verdict_in_order() {
        assert_eq!(
            parse_item_verdicts(REPLY),
            vec![(1, Action::Buy), (2, Action::Hold), (3, Action::Sell)]
        );
    }

    #[test]
    fn reads_the_aggregate_recommendation() {
        assert_eq!(parse_recommendation(REPLY), Some(Action::Hold));
    }

    #[test]
    fn ambiguous_lines_are_not_a_recommendation() {
        assert_eq!(parse_recommendation("Could be buy or sell, hard to say."), None);
        assert_eq!(parse_recommendation("Video 1 - Buy"), None);
    }

    #[test]
    fn reads_verdicts_that_echo_the_video_id() {
        let text = "Video 1 (id dQw4w9WgXcQ) - Buy\nVideo 2 (id abcDEF12345) - Sell\nHold";
        assert_eq!(
            parse_item_verdicts(text),
            vec![(1, Action::Buy), (2, Action::Sell)]
        );
        assert_eq!(parse_recommendation(text), Some(Action::Hold));
    }

    #[test]
    fn first_mention_of_an_ordinal_wins() {
        let text = "Video 1 - Sell\nLater on, video 1: buy";
        assert_eq!(parse_item_verdicts(text), vec![(1, Action::Sell)]);
    }

    #[test]
    fn degenerate_reply_yields_nothing() {
        assert!(parse_item_verdicts("There were no videos to analyse.").is_empty());
        assert_eq!(parse_recommendation(""), None);
    }

    #[test]
    fn action_parsing_ignores_case() {
        assert_eq!(" BUY ".parse::<Action>(), Ok(Action::Buy));
        assert!("moon".parse::<Action>().is_err());
    }
}

//! Parsers for the line formats the extraction prompts ask for.

use super::normalize::{first_integer, integers};
use crate::protocol::{AgentIdx, Species};

/// Index the extraction prompts use for "no one".
pub const NO_ONE: AgentIdx = 6;
/// Target index meaning the speaker withheld their vote.
pub const WITHHELD: AgentIdx = 0;

/// One `Agent[AA] -> Agent[TT]` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReport {
    pub actor: AgentIdx,
    /// Raw target: an agent, [`NO_ONE`] or [`WITHHELD`].
    pub target: AgentIdx,
}

/// One `Agent[AA], Agent[TT], white|black` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimReport {
    pub claimant: AgentIdx,
    pub target: AgentIdx,
    pub result: Species,
}

fn says_nobody(answer: &str) -> bool {
    let lower = answer.trim().to_ascii_lowercase();
    lower.is_empty() || lower.starts_with("none") || lower.starts_with("no one")
}

fn to_idx(n: u32) -> Option<AgentIdx> {
    AgentIdx::try_from(n).ok()
}

pub fn parse_votes(answer: &str) -> Vec<VoteReport> {
    if says_nobody(answer) {
        return Vec::new();
    }
    answer
        .lines()
        .filter_map(|line| {
            let numbers = integers(line);
            let actor = to_idx(*numbers.first()?)?;
            let target = to_idx(*numbers.get(1)?)?;
            (actor != NO_ONE).then_some(VoteReport { actor, target })
        })
        .collect()
}

fn parse_report(word: &str) -> Option<Species> {
    let lower = word.trim().to_ascii_lowercase();
    if lower.contains("white") || lower.contains("human") || lower.contains('白') {
        Some(Species::Human)
    } else if lower.contains("black") || lower.contains("werewolf") || lower.contains('黒') {
        Some(Species::Werewolf)
    } else {
        None
    }
}

pub fn parse_claims(answer: &str) -> Vec<ClaimReport> {
    if says_nobody(answer) {
        return Vec::new();
    }
    answer
        .lines()
        .filter_map(|line| {
            let mut fields = line.split([',', '、']);
            let claimant = to_idx(first_integer(fields.next()?)?)?;
            let target = to_idx(first_integer(fields.next()?)?)?;
            let result = parse_report(fields.next()?)?;
            (claimant != NO_ONE).then_some(ClaimReport {
                claimant,
                target,
                result,
            })
        })
        .collect()
}

//! Rule-based decisions applied after the speculative tasks of a talk turn.
//!
//! Everything here is pure apart from the caller-supplied RNG, so the
//! constants in [`HeuristicsConfig`] can be varied in tests.

use super::state::ClaimLabel;
use crate::config::HeuristicsConfig;
use crate::generation::ClaimReport;
use crate::protocol::{AgentIdx, Role, Species};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeMap;

/// Whether seer claims are analysed on this turn.
pub fn in_claim_window(cfg: &HeuristicsConfig, role: Role, day: u32, talk_count: u32) -> bool {
    day == 1
        && match role {
            Role::Werewolf => talk_count < cfg.claim_window_werewolf,
            Role::Possessed => talk_count < cfg.claim_window_possessed,
            _ => false,
        }
}

/// Turns on which the agent presses a suspect instead of chatting.
pub fn is_strike_turn(day: u32, talk_count: u32) -> bool {
    matches!((day, talk_count), (1, 3) | (2, 2))
}

pub fn closure_threshold(cfg: &HeuristicsConfig, day: u32) -> u32 {
    if day == 1 {
        cfg.closure_threshold_day1
    } else {
        cfg.closure_threshold_later
    }
}

/// The day closes once talk outlasts the threshold plus one turn per
/// undeclared agent.
pub fn closes(cfg: &HeuristicsConfig, day: u32, talk_count: u32, undeclared: usize) -> bool {
    let undeclared = u32::try_from(undeclared).unwrap_or(u32::MAX);
    talk_count > closure_threshold(cfg, day).saturating_add(undeclared)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingLine {
    WerewolfDead,
    Ending,
    Evening,
}

pub fn closing_line(day: u32, role: Role, accusers: usize, alive: usize) -> ClosingLine {
    if day == 2 && role == Role::Possessed {
        ClosingLine::WerewolfDead
    } else if accusers > alive / 2 {
        ClosingLine::Ending
    } else {
        ClosingLine::Evening
    }
}

/// Whether to ask a silent agent for their vote this turn.
pub fn should_mention(cfg: &HeuristicsConfig, day: u32, talk_count: u32, accusers: usize) -> bool {
    day == 1 && talk_count == cfg.mention_turn && accusers < cfg.mention_max_accusers
}

/// Pick the agent to ask, never this one.
pub fn mention_target(
    me: AgentIdx,
    undeclared: &[AgentIdx],
    rng: &mut impl Rng,
) -> Option<AgentIdx> {
    let others: Vec<AgentIdx> = undeclared.iter().copied().filter(|a| *a != me).collect();
    others.choose(rng).copied()
}

/// Utterance override produced by seer-claim analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOverride {
    /// Claim to be the real seer against this claimant.
    CounterClaim { claimant: AgentIdx },
    /// Invent a divination that names this agent a werewolf.
    FakeDisclosure { target: AgentIdx, result: Species },
}

/// Werewolf view: a white result on me reads as the possessed covering for
/// me, a black result on me as the real seer. When the only claimant has
/// exposed me, counter-claim once.
pub fn fold_werewolf_claims(
    me: AgentIdx,
    reports: &[ClaimReport],
    labels: &mut BTreeMap<AgentIdx, ClaimLabel>,
    behavior: Role,
) -> Option<ClaimOverride> {
    let mut exposed_by = None;
    for report in reports.iter().filter(|r| r.claimant != me) {
        let on_me = report.target == me;
        let label = match (report.result, on_me) {
            (Species::Human, true) | (Species::Werewolf, false) => ClaimLabel::Possessed,
            (Species::Human, false) => ClaimLabel::Seer,
            (Species::Werewolf, true) => {
                exposed_by = Some(report.claimant);
                ClaimLabel::Seer
            }
        };
        labels.insert(report.claimant, label);
    }

    let claimant = exposed_by?;
    (behavior != Role::Seer && labels.len() == 1).then_some(ClaimOverride::CounterClaim { claimant })
}

/// Possessed view: with few visible claims, fake a seer claim on the first
/// turns; on the second turn answer a lone black claim with a counter-claim.
#[allow(clippy::too_many_arguments)]
pub fn fold_possessed_claims(
    cfg: &HeuristicsConfig,
    me: AgentIdx,
    talk_count: u32,
    reports: &[ClaimReport],
    labels: &mut BTreeMap<AgentIdx, ClaimLabel>,
    behavior: Role,
    others: &[AgentIdx],
    rng: &mut impl Rng,
) -> Option<ClaimOverride> {
    for report in reports.iter().filter(|r| r.claimant != me) {
        labels.insert(report.claimant, ClaimLabel::Reported(report.result));
    }

    match talk_count {
        1 if labels.len() < 2 => {
            if rng.random_bool(cfg.possessed_claim_probability) {
                fake_disclosure(others, rng)
            } else {
                None
            }
        }
        2 if behavior != Role::Seer => match labels.len() {
            0 => fake_disclosure(others, rng),
            1 => labels.iter().find_map(|(claimant, label)| {
                (*label == ClaimLabel::Reported(Species::Werewolf)).then_some(
                    ClaimOverride::CounterClaim {
                        claimant: *claimant,
                    },
                )
            }),
            _ => None,
        },
        _ => None,
    }
}

fn fake_disclosure(others: &[AgentIdx], rng: &mut impl Rng) -> Option<ClaimOverride> {
    others
        .choose(rng)
        .map(|&target| ClaimOverride::FakeDisclosure {
            target,
            result: Species::Werewolf,
        })
}

/// Day-1 attack choice from the werewolf's claim labels: spare a pair of
/// credible seers, otherwise go after the lone one.
pub fn attack_target(
    targets: &[AgentIdx],
    labels: &BTreeMap<AgentIdx, ClaimLabel>,
    rng: &mut impl Rng,
) -> Option<AgentIdx> {
    let seers: Vec<AgentIdx> = targets
        .iter()
        .copied()
        .filter(|a| labels.get(a) == Some(&ClaimLabel::Seer))
        .collect();

    match seers.as_slice() {
        [only] => Some(*only),
        [_, _] => {
            let rest: Vec<AgentIdx> = targets
                .iter()
                .copied()
                .filter(|a| !seers.contains(a))
                .collect();
            rest.choose(rng).or_else(|| targets.choose(rng)).copied()
        }
        _ => targets.choose(rng).copied(),
    }
}

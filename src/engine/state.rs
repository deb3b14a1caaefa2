//! Per-game and per-day records the turn engine reads and writes.

use crate::protocol::{AgentIdx, GameInfo, OVER, Role, SKIP, Species, Status, Talk};
use std::collections::BTreeMap;

/// What a speaker has said about their vote today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteIntent {
    Target(AgentIdx),
    /// Said `Over` or otherwise declined to name anyone.
    Withheld,
    /// We asked them to declare and are waiting for the answer.
    Asked,
}

/// How this agent reads another player's seer claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimLabel {
    /// Probably the real seer.
    Seer,
    /// Probably the possessed posing as seer.
    Possessed,
    /// Raw result the claimant announced.
    Reported(Species),
}

/// Identity and the live status map. Built at INITIALIZE.
#[derive(Debug, Clone)]
pub struct GameState {
    pub me: AgentIdx,
    pub role: Role,
    status: BTreeMap<AgentIdx, Status>,
}

impl GameState {
    pub fn from_info(info: &GameInfo) -> Self {
        Self {
            me: info.agent,
            role: info
                .role_map
                .get(&info.agent)
                .copied()
                .unwrap_or(Role::Villager),
            status: info.status_map.clone(),
        }
    }

    pub fn refresh_status(&mut self, info: &GameInfo) {
        if !info.status_map.is_empty() {
            self.status = info.status_map.clone();
        }
    }

    pub fn is_alive(&self, idx: AgentIdx) -> bool {
        self.status.get(&idx) == Some(&Status::Alive)
    }

    /// Alive agents, this one included.
    pub fn alive(&self) -> Vec<AgentIdx> {
        self.with_status(Status::Alive)
    }

    pub fn dead(&self) -> Vec<AgentIdx> {
        self.with_status(Status::Dead)
    }

    /// Legal targets: alive and not this agent.
    pub fn alive_others(&self) -> Vec<AgentIdx> {
        self.alive().into_iter().filter(|a| *a != self.me).collect()
    }

    fn with_status(&self, status: Status) -> Vec<AgentIdx> {
        self.status
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(a, _)| *a)
            .collect()
    }
}

/// Ephemeral state of one day, created at DAILY_INITIALIZE.
#[derive(Debug, Clone)]
pub struct DayState {
    pub day: u32,
    pub talk_count: u32,
    pub replies: u32,
    /// Keyed by other agents only; see [`DayState::own_vote`].
    vote_intentions: BTreeMap<AgentIdx, VoteIntent>,
    /// Target this agent declared in its own talk.
    pub own_vote: Option<AgentIdx>,
    pub claims: BTreeMap<AgentIdx, ClaimLabel>,
    pub closed: bool,
    /// Role this agent presents in public today.
    pub behavior: Role,
    /// Divination line to open the day with.
    pub disclosure: Option<String>,
}

impl DayState {
    pub fn new(day: u32, behavior: Role, disclosure: Option<String>) -> Self {
        Self {
            day,
            talk_count: 0,
            replies: 0,
            vote_intentions: BTreeMap::new(),
            own_vote: None,
            claims: BTreeMap::new(),
            closed: false,
            behavior,
            disclosure,
        }
    }

    pub fn intent(&self, actor: AgentIdx) -> Option<VoteIntent> {
        self.vote_intentions.get(&actor).copied()
    }

    /// Record another agent's intention. Ignored for this agent and for
    /// agents that are not alive.
    pub fn record_intent(&mut self, game: &GameState, actor: AgentIdx, intent: VoteIntent) {
        if actor == game.me || !game.is_alive(actor) {
            return;
        }
        self.vote_intentions.insert(actor, intent);
    }

    /// An `Over` counts as a withheld vote unless something is on record.
    pub fn mark_withheld(&mut self, game: &GameState, actor: AgentIdx) {
        let recorded = matches!(
            self.intent(actor),
            Some(VoteIntent::Target(_) | VoteIntent::Asked)
        );
        if !recorded {
            self.record_intent(game, actor, VoteIntent::Withheld);
        }
    }

    /// Alive agents with nothing on record, this one included while it has
    /// not declared.
    pub fn undeclared(&self, game: &GameState) -> Vec<AgentIdx> {
        game.alive()
            .into_iter()
            .filter(|a| {
                if *a == game.me {
                    self.own_vote.is_none()
                } else {
                    !self.vote_intentions.contains_key(a)
                }
            })
            .collect()
    }

    /// Alive agents that said they will vote for this one.
    pub fn accusers(&self, game: &GameState) -> Vec<AgentIdx> {
        self.vote_intentions
            .iter()
            .filter(|(a, intent)| {
                game.is_alive(**a) && **intent == VoteIntent::Target(game.me)
            })
            .map(|(a, _)| *a)
            .collect()
    }

    pub fn agents_with_intent(&self) -> impl Iterator<Item = AgentIdx> + '_ {
        self.vote_intentions.keys().copied()
    }
}

/// Append-only utterance log, chronological across days.
#[derive(Debug, Clone, Default)]
pub struct History {
    talks: Vec<Talk>,
}

impl History {
    pub fn clear(&mut self) {
        self.talks.clear();
    }

    /// Append one entry. Entries from an earlier day than the last one are
    /// dropped so the day number never decreases.
    pub fn append(&mut self, talk: Talk) -> bool {
        if let Some(last) = self.talks.last()
            && talk.day < last.day
        {
            tracing::warn!(
                agent = talk.agent,
                day = talk.day,
                last_day = last.day,
                "Dropping out-of-order talk entry"
            );
            return false;
        }
        self.talks.push(talk);
        true
    }

    /// Remove `Skip` and `Over` entries.
    pub fn drop_placeholders(&mut self) {
        self.talks.retain(|t| t.text != SKIP && t.text != OVER);
    }

    pub fn all(&self) -> &[Talk] {
        &self.talks
    }

    pub fn on_day(&self, day: u32) -> Vec<Talk> {
        self.talks.iter().filter(|t| t.day == day).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.talks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talks.is_empty()
    }
}

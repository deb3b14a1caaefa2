use crate::protocol::{AgentIdx, Role, Talk};

/// What the backend is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RequestKind {
    /// Ordinary next utterance.
    Talk,
    /// Utterance that presses the most suspicious player.
    Strike,
    Divine,
    Vote,
    Attack,
}

impl RequestKind {
    /// Kinds answered with an agent index instead of free text.
    pub fn wants_target(self) -> bool {
        matches!(self, Self::Divine | Self::Vote | Self::Attack)
    }
}

/// An utterance addressed to this agent with `>>Agent[NN]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedMessage {
    pub from: AgentIdx,
    pub text: String,
}

/// Everything the prompt templates need for one backend call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: RequestKind,
    /// The role this agent presents in public, not necessarily its real one.
    pub behavior: Role,
    pub me: AgentIdx,
    pub alive: Vec<AgentIdx>,
    pub dead: Vec<AgentIdx>,
    pub history: Vec<Talk>,
    pub directed: Option<DirectedMessage>,
    /// Valid answers for target kinds; empty for text kinds.
    pub candidates: Vec<AgentIdx>,
}

/// Normalized backend outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Text(String),
    Target(AgentIdx),
    /// Deadline or retry budget exhausted.
    Timeout,
}

impl Generated {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Target(_) | Self::Timeout => None,
        }
    }

    pub fn target(&self) -> Option<AgentIdx> {
        match self {
            Self::Target(idx) => Some(*idx),
            Self::Text(_) | Self::Timeout => None,
        }
    }
}

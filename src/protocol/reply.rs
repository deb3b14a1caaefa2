use super::packet::AgentIdx;
use serde::Serialize;

/// Outbound payload for one inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing is sent back.
    Silent,
    /// Raw UTF-8 text: utterances, NAME and ROLE answers.
    Text(String),
    /// Index-targeted action: VOTE, DIVINE, ATTACK.
    Target(AgentIdx),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetPayload {
    agent_idx: AgentIdx,
}

impl Reply {
    /// Serialize for the wire. `None` means no line is written.
    pub fn to_wire(&self) -> Option<String> {
        match self {
            Self::Silent => None,
            Self::Text(text) if text.is_empty() => None,
            Self::Text(text) => Some(text.clone()),
            Self::Target(idx) => serde_json::to_string(&TargetPayload { agent_idx: *idx }).ok(),
        }
    }

    pub fn target(&self) -> Option<AgentIdx> {
        match self {
            Self::Target(idx) => Some(*idx),
            Self::Silent | Self::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Silent | Self::Target(_) => None,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Small integer that identifies a seat at the table.
pub type AgentIdx = u8;

/// Host-side literal a player sends to pass for this round.
pub const SKIP: &str = "Skip";
/// Host-side literal a player sends when it has nothing more to say today.
pub const OVER: &str = "Over";

/// Render an agent index the way the host writes it in talk text.
pub fn agent_label(idx: AgentIdx) -> String {
    format!("Agent[{idx:02}]")
}

/// Protocol command carried in the `request` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Name,
    Role,
    Initialize,
    DailyInitialize,
    DailyFinish,
    Talk,
    Vote,
    Divine,
    Attack,
    Whisper,
    Guard,
    Finish,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Villager,
    Seer,
    Possessed,
    Werewolf,
    Medium,
    Bodyguard,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Species {
    Human,
    Werewolf,
}

/// Result of the previous night's divination, delivered to the seer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Judge {
    pub target: AgentIdx,
    pub result: Species,
    #[serde(default)]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub agent: AgentIdx,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub role_map: BTreeMap<AgentIdx, Role>,
    #[serde(default)]
    pub status_map: BTreeMap<AgentIdx, Status>,
    #[serde(default)]
    pub divine_result: Option<Judge>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSetting {
    #[serde(default)]
    pub player_num: Option<u32>,
    #[serde(default)]
    pub max_talk: Option<u32>,
    #[serde(default)]
    pub max_talk_turn: Option<u32>,
}

/// One entry of the host's talk history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Talk {
    pub agent: AgentIdx,
    pub day: u32,
    pub text: String,
    #[serde(default)]
    pub turn: u32,
}

impl Talk {
    pub fn is_placeholder(&self) -> bool {
        self.text == SKIP || self.text == OVER
    }
}

/// A decoded inbound message. Each one is consumed exactly once by the agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    pub request: Command,
    #[serde(default)]
    pub game_info: Option<GameInfo>,
    #[serde(default)]
    pub game_setting: Option<GameSetting>,
    #[serde(default)]
    pub talk_history: Option<Vec<Talk>>,
}

impl Packet {
    pub fn parse(text: &str) -> Result<Self, crate::error::ProtocolError> {
        serde_json::from_str(text).map_err(|e| crate::error::ProtocolError::Decode(e.to_string()))
    }

    /// Bare packet without game info, mostly useful in tests.
    pub fn bare(request: Command) -> Self {
        Self {
            request,
            game_info: None,
            game_setting: None,
            talk_history: None,
        }
    }
}

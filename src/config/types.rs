use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub game: GameConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

// ── Connection ───────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionMode {
    /// Dial the game server over plain TCP.
    #[default]
    Connect,
    /// Wait for the game server to dial in.
    Listen,
    /// Dial the game server over TLS.
    Tls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub mode: ConnectionMode,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reconnect after the configured number of games instead of exiting.
    #[serde(default)]
    pub keep_connection: bool,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    10000
}

fn default_read_timeout_secs() -> u64 {
    600
}

fn default_max_frame_bytes() -> usize {
    crate::protocol::frame::DEFAULT_MAX_FRAME_BYTES
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::default(),
            host: default_host(),
            port: default_port(),
            keep_connection: false,
            read_timeout_secs: default_read_timeout_secs(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

// ── Agent / game ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
}

fn default_agent_name() -> String {
    "wolfcall".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Games played per connection.
    #[serde(default = "default_game_num")]
    pub num: u32,
}

fn default_game_num() -> u32 {
    1
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            num: default_game_num(),
        }
    }
}

// ── LLM ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override the provider endpoint (OpenAI-compatible servers, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_talk_model")]
    pub talk_model: String,
    /// Model used for vote-intention and role-claim extraction.
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Deadline for a single backend call.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Attempts per generation, no backoff between them.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_talk_model() -> String {
    "gpt-4o".into()
}

fn default_analysis_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    200
}

fn default_call_timeout_ms() -> u64 {
    1500
}

fn default_attempts() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: None,
            base_url: None,
            talk_model: default_talk_model(),
            analysis_model: default_analysis_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            call_timeout_ms: default_call_timeout_ms(),
            attempts: default_attempts(),
        }
    }
}

// ── Speculative dispatch ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Deadline for each speculative task launched during a talk turn.
    /// Must cover `llm.attempts` calls of `llm.call_timeout_ms` each.
    #[serde(default = "default_task_deadline_ms")]
    pub task_deadline_ms: u64,
}

fn default_task_deadline_ms() -> u64 {
    4800
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            task_deadline_ms: default_task_deadline_ms(),
        }
    }
}

// ── Heuristics ───────────────────────────────────────────────────────

/// Tunables for the talk-turn heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Directed messages answered per day before the agent stops replying.
    #[serde(default = "default_reply_budget")]
    pub reply_budget: u32,
    /// Talk-turn threshold for closing the day on day 1.
    #[serde(default = "default_closure_threshold_day1")]
    pub closure_threshold_day1: u32,
    /// Talk-turn threshold for closing the day on day 2 and later.
    #[serde(default = "default_closure_threshold_later")]
    pub closure_threshold_later: u32,
    /// Claim extraction runs while the werewolf's talk count is below this.
    #[serde(default = "default_claim_window_werewolf")]
    pub claim_window_werewolf: u32,
    /// Claim extraction runs while the possessed's talk count is below this.
    #[serde(default = "default_claim_window_possessed")]
    pub claim_window_possessed: u32,
    /// Day-1 talk turn at which silent agents are asked to declare a vote.
    #[serde(default = "default_mention_turn")]
    pub mention_turn: u32,
    /// The vote inquiry is only sent while accusers are fewer than this.
    #[serde(default = "default_mention_max_accusers")]
    pub mention_max_accusers: usize,
    /// Chance that the possessed fakes a seer claim on its first turn.
    #[serde(default = "default_possessed_claim_probability")]
    pub possessed_claim_probability: f64,
}

fn default_reply_budget() -> u32 {
    4
}

fn default_closure_threshold_day1() -> u32 {
    4
}

fn default_closure_threshold_later() -> u32 {
    3
}

fn default_claim_window_werewolf() -> u32 {
    4
}

fn default_claim_window_possessed() -> u32 {
    3
}

fn default_mention_turn() -> u32 {
    4
}

fn default_mention_max_accusers() -> usize {
    2
}

fn default_possessed_claim_probability() -> f64 {
    0.5
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            reply_budget: default_reply_budget(),
            closure_threshold_day1: default_closure_threshold_day1(),
            closure_threshold_later: default_closure_threshold_later(),
            claim_window_werewolf: default_claim_window_werewolf(),
            claim_window_possessed: default_claim_window_possessed(),
            mention_turn: default_mention_turn(),
            mention_max_accusers: default_mention_max_accusers(),
            possessed_claim_probability: default_possessed_claim_probability(),
        }
    }
}

//! Turn orchestration: game state, the command state machine, speculative
//! dispatch and the closure heuristics.

pub mod agent;
pub mod dispatcher;
pub mod heuristics;
pub mod phrases;
pub mod state;

pub use agent::{Agent, Phase};
pub use dispatcher::{Dispatcher, SpeculativeTurn, TurnPlan};
pub use state::{ClaimLabel, DayState, GameState, History, VoteIntent};

use super::{Config, ConnectionMode};
use crate::error::ConfigError;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.attempts == 0 {
            return Err(ConfigError::Validation("llm.attempts must be at least 1".into()));
        }
        if self.llm.call_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "llm.call_timeout_ms must be greater than 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Validation(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        if self.dispatch.task_deadline_ms == 0 {
            return Err(ConfigError::Validation(
                "dispatch.task_deadline_ms must be greater than 0".into(),
            ));
        }
        let retry_budget = self
            .llm
            .call_timeout_ms
            .saturating_mul(u64::from(self.llm.attempts));
        if self.dispatch.task_deadline_ms < retry_budget {
            return Err(ConfigError::Validation(format!(
                "dispatch.task_deadline_ms {} is shorter than llm.attempts x llm.call_timeout_ms ({retry_budget})",
                self.dispatch.task_deadline_ms
            )));
        }
        if self.connection.port == 0 && self.connection.mode != ConnectionMode::Listen {
            return Err(ConfigError::Validation(format!(
                "connection.port 0 is not dialable in {} mode",
                self.connection.mode
            )));
        }
        let p = self.heuristics.possessed_claim_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Validation(format!(
                "heuristics.possessed_claim_probability {p} is outside 0.0..=1.0"
            )));
        }
        Ok(())
    }
}

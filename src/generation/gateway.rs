//! Deadline-and-retry-guarded access to the generation backend.
//!
//! Every backend call gets `call_timeout` and the whole request gets
//! `attempts` tries without backoff. Failures never reach the caller: an
//! exhausted budget becomes [`Generated::Timeout`] or `None`.

use super::extract::{ClaimReport, VoteReport, parse_claims, parse_votes};
use super::normalize::{first_integer, normalize_text};
use super::prompt::{Prompt, PromptBuilder};
use super::request::{Generated, GenerationRequest};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{Provider, scrub_secret_patterns};
use crate::protocol::{AgentIdx, Talk};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub talk_model: String,
    pub analysis_model: String,
    pub temperature: f64,
    pub call_timeout: Duration,
    pub attempts: u32,
}

impl From<&LlmConfig> for GatewaySettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            talk_model: config.talk_model.clone(),
            analysis_model: config.analysis_model.clone(),
            temperature: config.temperature,
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            attempts: config.attempts.max(1),
        }
    }
}

pub struct GenerationGateway {
    provider: Arc<dyn Provider>,
    prompts: PromptBuilder,
    settings: GatewaySettings,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn Provider>, settings: GatewaySettings) -> anyhow::Result<Self> {
        Ok(Self {
            provider,
            prompts: PromptBuilder::new()?,
            settings,
        })
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Produce an utterance or a target index for the request.
    pub async fn generate(&self, request: &GenerationRequest) -> Generated {
        let prompt = match self.prompts.generation(request) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!(kind = %request.kind, "Prompt render failed: {e}");
                return Generated::Timeout;
            }
        };

        let outcome = if request.kind.wants_target() {
            self.run(&request.kind.to_string(), &prompt, &self.settings.talk_model, |raw| {
                first_integer(raw)
                    .and_then(|n| AgentIdx::try_from(n).ok())
                    .map(Generated::Target)
            })
            .await
        } else {
            self.run(&request.kind.to_string(), &prompt, &self.settings.talk_model, |raw| {
                let text = normalize_text(raw);
                (!text.is_empty()).then_some(Generated::Text(text))
            })
            .await
        };

        outcome.unwrap_or(Generated::Timeout)
    }

    /// Who each speaker of the round said they will vote for. `None` means
    /// the backend never answered in time.
    pub async fn extract_vote_intentions(
        &self,
        me: AgentIdx,
        round: &[Talk],
    ) -> Option<Vec<VoteReport>> {
        let prompt = self
            .prompts
            .vote_extraction(me, round)
            .map_err(|e| tracing::warn!("Vote extraction prompt failed: {e}"))
            .ok()?;
        self.run("votes", &prompt, &self.settings.analysis_model, |raw| {
            Some(parse_votes(raw))
        })
        .await
    }

    /// Seer claims made in the given talks. `None` means the backend never
    /// answered in time.
    pub async fn extract_role_claims(
        &self,
        me: AgentIdx,
        talks: &[Talk],
    ) -> Option<Vec<ClaimReport>> {
        let prompt = self
            .prompts
            .claim_extraction(me, talks)
            .map_err(|e| tracing::warn!("Claim extraction prompt failed: {e}"))
            .ok()?;
        self.run("claims", &prompt, &self.settings.analysis_model, |raw| {
            Some(parse_claims(raw))
        })
        .await
    }

    async fn run<T>(
        &self,
        task: &str,
        prompt: &Prompt,
        model: &str,
        accept: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let provider = self.provider.name();
        let attempts = self.settings.attempts;

        for attempt in 1..=attempts {
            let call = self.provider.chat_with_system(
                Some(&prompt.system),
                &prompt.user,
                model,
                self.settings.temperature,
            );

            let failure = match tokio::time::timeout(self.settings.call_timeout, call).await {
                Ok(Ok(raw)) => match accept(&raw) {
                    Some(value) => {
                        if attempt > 1 {
                            tracing::info!(provider, task, attempt, "Backend recovered after retries");
                        }
                        return Some(value);
                    }
                    None => LlmError::EmptyResponse {
                        provider: provider.to_string(),
                    },
                },
                Ok(Err(e)) => LlmError::Request {
                    provider: provider.to_string(),
                    message: scrub_secret_patterns(&e.to_string()).into_owned(),
                },
                Err(_) => LlmError::Deadline {
                    deadline_ms: u64::try_from(self.settings.call_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                },
            };

            tracing::warn!(provider, task, attempt, attempts, "Backend attempt failed: {failure}");
        }

        tracing::warn!(provider, task, attempts, "Retry budget exhausted, using fallback");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::request::RequestKind;
    use crate::protocol::Role;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Answers from a script; `None` entries fail the call.
    struct Scripted {
        answers: Mutex<Vec<Option<String>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(answers: &[Option<&str>]) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.iter().rev().map(|a| a.map(String::from)).collect()),
                calls: AtomicU32::new(0),
            })
        }
    }

    impl Provider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn chat_with_system<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            _message: &'a str,
            _model: &'a str,
            _temperature: f64,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.answers.lock().unwrap().pop().flatten();
            Box::pin(async move { next.ok_or_else(|| anyhow::anyhow!("scripted failure")) })
        }
    }

    /// Never answers within any reasonable deadline.
    struct Stalled {
        calls: AtomicU32,
    }

    impl Provider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        fn chat_with_system<'a>(
            &'a self,
            _system_prompt: Option<&'a str>,
            _message: &'a str,
            _model: &'a str,
            _temperature: f64,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("too late".to_string())
            })
        }
    }

    fn settings() -> GatewaySettings {
        GatewaySettings::from(&LlmConfig::default())
    }

    fn request(kind: RequestKind) -> GenerationRequest {
        GenerationRequest {
            kind,
            behavior: Role::Villager,
            me: 2,
            alive: vec![1, 2, 3],
            dead: vec![],
            history: vec![],
            directed: None,
            candidates: vec![1, 3],
        }
    }

    #[tokio::test]
    async fn text_is_normalized() {
        let provider = Scripted::new(&[Some("Agent[02]: I trust (mostly) Agent[01].\n")]);
        let gateway = GenerationGateway::new(provider, settings()).unwrap();
        assert_eq!(
            gateway.generate(&request(RequestKind::Talk)).await,
            Generated::Text("I trust mostly Agent[01].".into())
        );
    }

    #[tokio::test]
    async fn failures_are_retried_without_backoff() {
        let provider = Scripted::new(&[None, Some(""), Some("Fine.")]);
        let gateway = GenerationGateway::new(provider.clone(), settings()).unwrap();
        assert_eq!(
            gateway.generate(&request(RequestKind::Talk)).await,
            Generated::Text("Fine.".into())
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_is_timeout() {
        let provider = Scripted::new(&[None, None, None, Some("never read")]);
        let gateway = GenerationGateway::new(provider.clone(), settings()).unwrap();
        assert_eq!(
            gateway.generate(&request(RequestKind::Talk)).await,
            Generated::Timeout
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_on_every_attempt_is_timeout() {
        let provider = Arc::new(Stalled {
            calls: AtomicU32::new(0),
        });
        let gateway = GenerationGateway::new(provider.clone(), settings()).unwrap();
        let started = tokio::time::Instant::now();
        assert_eq!(
            gateway.generate(&request(RequestKind::Talk)).await,
            Generated::Timeout
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= settings().call_timeout * 3);
    }

    #[tokio::test]
    async fn target_answer_reads_first_integer() {
        let provider = Scripted::new(&[Some("I choose Agent[03].")]);
        let gateway = GenerationGateway::new(provider, settings()).unwrap();
        assert_eq!(
            gateway.generate(&request(RequestKind::Divine)).await,
            Generated::Target(3)
        );
    }

    #[tokio::test]
    async fn target_answer_without_number_is_retried() {
        let provider = Scripted::new(&[Some("hmm"), Some("1")]);
        let gateway = GenerationGateway::new(provider, settings()).unwrap();
        assert_eq!(
            gateway.generate(&request(RequestKind::Vote)).await,
            Generated::Target(1)
        );
    }

    #[tokio::test]
    async fn extraction_parses_answers() {
        let provider = Scripted::new(&[
            Some("Agent[01] -> Agent[03]"),
            Some("Agent[03], Agent[02], black"),
        ]);
        let gateway = GenerationGateway::new(provider, settings()).unwrap();
        let round = [Talk {
            agent: 1,
            day: 1,
            text: "I vote Agent[03].".into(),
            turn: 0,
        }];
        let votes = gateway.extract_vote_intentions(2, &round).await.unwrap();
        assert_eq!(votes, vec![VoteReport { actor: 1, target: 3 }]);
        let claims = gateway.extract_role_claims(2, &round).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].claimant, 3);
    }

    #[tokio::test]
    async fn extraction_failure_is_none() {
        let provider = Scripted::new(&[None, None, None]);
        let gateway = GenerationGateway::new(provider, settings()).unwrap();
        assert!(gateway.extract_vote_intentions(2, &[]).await.is_none());
    }
}

//! Speculative task dispatcher for talk turns.
//!
//! A turn launches up to three backend tasks at once and joins them in a
//! fixed order: claims, then the utterance, then vote intentions. Every join
//! waits at most until the turn deadline; a task that misses it is aborted
//! and its sentinel is used instead. Remaining tasks are aborted when the
//! turn is dropped, so no worker outlives its turn.

use crate::generation::{ClaimReport, Generated, GenerationGateway, GenerationRequest, VoteReport};
use crate::protocol::{AgentIdx, Talk};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What to launch for one talk turn.
#[derive(Debug, Default)]
pub struct TurnPlan {
    pub me: AgentIdx,
    /// Generated utterance; `None` when a scripted line is used.
    pub utterance: Option<GenerationRequest>,
    /// Talks to scan for vote intentions.
    pub votes: Option<Vec<Talk>>,
    /// Talks to scan for seer claims.
    pub claims: Option<Vec<Talk>>,
}

pub struct Dispatcher {
    gateway: Arc<GenerationGateway>,
    task_deadline: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<GenerationGateway>, task_deadline: Duration) -> Self {
        Self {
            gateway,
            task_deadline,
        }
    }

    pub fn launch(&self, plan: TurnPlan) -> SpeculativeTurn {
        let deadline = Instant::now() + self.task_deadline;
        let me = plan.me;

        let claims = plan.claims.map(|talks| {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move { gateway.extract_role_claims(me, &talks).await })
        });
        let utterance = plan.utterance.map(|request| {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move { gateway.generate(&request).await })
        });
        let votes = plan.votes.map(|talks| {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move { gateway.extract_vote_intentions(me, &talks).await })
        });

        tracing::debug!(
            claims = claims.is_some(),
            utterance = utterance.is_some(),
            votes = votes.is_some(),
            "Launched speculative tasks"
        );

        SpeculativeTurn {
            deadline,
            claims,
            utterance,
            votes,
        }
    }

    /// Single deadline-bound generation outside a talk turn (DIVINE).
    pub async fn decide(&self, request: GenerationRequest) -> Generated {
        let gateway = Arc::clone(&self.gateway);
        let handle = tokio::spawn(async move { gateway.generate(&request).await });
        join_by("decision", Some(handle), Instant::now() + self.task_deadline)
            .await
            .unwrap_or(Generated::Timeout)
    }
}

/// Handles of the tasks launched for one turn.
pub struct SpeculativeTurn {
    deadline: Instant,
    claims: Option<JoinHandle<Option<Vec<ClaimReport>>>>,
    utterance: Option<JoinHandle<Generated>>,
    votes: Option<JoinHandle<Option<Vec<VoteReport>>>>,
}

impl SpeculativeTurn {
    #[cfg(test)]
    fn launched_claims(&self) -> bool {
        self.claims.is_some()
    }

    /// Seer claims, empty when not launched or past the deadline.
    pub async fn join_claims(&mut self) -> Vec<ClaimReport> {
        join_by("claims", self.claims.take(), self.deadline)
            .await
            .flatten()
            .unwrap_or_default()
    }

    /// The generated utterance, [`Generated::Timeout`] when it never arrived.
    pub async fn join_utterance(&mut self) -> Generated {
        join_by("utterance", self.utterance.take(), self.deadline)
            .await
            .unwrap_or(Generated::Timeout)
    }

    /// Vote intentions, empty when not launched or past the deadline.
    pub async fn join_votes(&mut self) -> Vec<VoteReport> {
        join_by("votes", self.votes.take(), self.deadline)
            .await
            .flatten()
            .unwrap_or_default()
    }
}

impl Drop for SpeculativeTurn {
    fn drop(&mut self) {
        for handle in [
            self.claims.take().map(|h| h.abort_handle()),
            self.utterance.take().map(|h| h.abort_handle()),
            self.votes.take().map(|h| h.abort_handle()),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

async fn join_by<T>(task: &str, handle: Option<JoinHandle<T>>, deadline: Instant) -> Option<T> {
    let mut handle = handle?;
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::warn!(task, "Speculative task failed: {e}");
            None
        }
        Err(_) => {
            handle.abort();
            tracing::warn!(task, "Speculative task missed its deadline");
            None
        }
    }
}

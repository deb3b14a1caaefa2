//! Command dispatcher and game state machine.
//!
//! `Idle -> AwaitingDaily -> InDay -> AwaitingDaily -> ... -> Terminated`.
//! TALK, VOTE, DIVINE, ATTACK and WHISPER are request/response leaves inside
//! a day and never move the machine. Every packet gets some legal reply.

use super::dispatcher::{Dispatcher, TurnPlan};
use super::heuristics::{self, ClaimOverride, ClosingLine};
use super::phrases;
use super::state::{DayState, GameState, History, VoteIntent};
use crate::config::HeuristicsConfig;
use crate::generation::{
    DirectedMessage, Generated, GenerationRequest, NO_ONE, RequestKind, VoteReport, WITHHELD,
};
use crate::protocol::{
    AgentIdx, Command, GameInfo, GameSetting, OVER, Packet, Reply, Role, Talk, agent_label,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Phase {
    Idle,
    AwaitingDaily,
    InDay,
    Terminated,
}

/// Where this turn's utterance comes from before heuristics run.
enum Utterance {
    Scripted(String),
    Generated,
}

pub struct Agent {
    name: String,
    cfg: HeuristicsConfig,
    dispatcher: Dispatcher,
    rng: StdRng,
    phase: Phase,
    info: Option<GameInfo>,
    setting: Option<GameSetting>,
    game: Option<GameState>,
    day: Option<DayState>,
    history: History,
    /// Talk delta carried by the packet being handled.
    round: Vec<Talk>,
    /// Agent divined on day 0, skipped on day 1.
    divined_first: Option<AgentIdx>,
}

impl Agent {
    pub fn new(name: impl Into<String>, cfg: HeuristicsConfig, dispatcher: Dispatcher) -> Self {
        Self::with_rng(name, cfg, dispatcher, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_rng(
        name: impl Into<String>,
        cfg: HeuristicsConfig,
        dispatcher: Dispatcher,
        rng: StdRng,
    ) -> Self {
        Self {
            name: name.into(),
            cfg,
            dispatcher,
            rng,
            phase: Phase::Idle,
            info: None,
            setting: None,
            game: None,
            day: None,
            history: History::default(),
            round: Vec::new(),
            divined_first: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn day_state(&self) -> Option<&DayState> {
        self.day.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Consume one packet and produce its reply.
    pub async fn handle(&mut self, packet: Packet) -> Reply {
        let command = packet.request;
        self.absorb(packet);

        match command {
            Command::Name => Reply::Text(self.name.clone()),
            Command::Role => self.role_reply(),
            Command::Initialize => self.on_initialize(),
            Command::DailyInitialize => self.on_daily_initialize(),
            Command::DailyFinish => self.on_daily_finish(),
            Command::Talk => self.on_talk().await,
            Command::Vote => self.on_vote(),
            Command::Divine => self.on_divine().await,
            Command::Attack => self.on_attack(),
            Command::Whisper | Command::Guard => Reply::Silent,
            Command::Finish => {
                tracing::info!(history = self.history.len(), "Game finished");
                self.phase = Phase::Terminated;
                Reply::Silent
            }
            Command::Unknown => {
                tracing::warn!(phase = %self.phase, "Ignoring unknown command");
                Reply::Silent
            }
        }
    }

    fn absorb(&mut self, packet: Packet) {
        if let Some(info) = packet.game_info {
            if let Some(game) = self.game.as_mut() {
                game.refresh_status(&info);
            }
            self.info = Some(info);
        }
        if let Some(setting) = packet.game_setting {
            self.setting = Some(setting);
        }

        self.round = packet.talk_history.unwrap_or_default();
        for talk in &self.round {
            self.history.append(talk.clone());
        }
    }

    fn role_reply(&self) -> Reply {
        let role = self.game.as_ref().map(|g| g.role).or_else(|| {
            let info = self.info.as_ref()?;
            info.role_map.get(&info.agent).copied()
        });
        role.map_or(Reply::Silent, |r| Reply::Text(r.to_string()))
    }

    fn on_initialize(&mut self) -> Reply {
        let Some(info) = self.info.as_ref() else {
            tracing::warn!("INITIALIZE without game info");
            return Reply::Silent;
        };
        let game = GameState::from_info(info);
        let players = self.setting.as_ref().and_then(|s| s.player_num);
        tracing::info!(agent = game.me, role = %game.role, players = ?players, "Game initialized");

        self.game = Some(game);
        self.day = None;
        self.history.clear();
        self.divined_first = None;
        self.phase = Phase::AwaitingDaily;
        Reply::Silent
    }

    fn on_daily_initialize(&mut self) -> Reply {
        let Some(game) = self.game.as_ref() else {
            tracing::warn!("DAILY_INITIALIZE before INITIALIZE");
            return Reply::Silent;
        };
        let day = self.day.as_ref().map_or(0, |d| d.day + 1);

        let mut disclosure = None;
        let behavior = match game.role {
            Role::Seer => {
                if let Some(judge) = self.info.as_ref().and_then(|i| i.divine_result.as_ref()) {
                    disclosure = Some(phrases::seer_disclosure(game.me, judge.target, judge.result));
                }
                Role::Seer
            }
            Role::Possessed if day == 2 => Role::Seer,
            _ => Role::Villager,
        };

        tracing::info!(
            agent = game.me,
            day,
            alive = game.alive().len(),
            behavior = %behavior,
            "Day started"
        );
        self.day = Some(DayState::new(day, behavior, disclosure));
        self.phase = Phase::InDay;
        Reply::Silent
    }

    fn on_daily_finish(&mut self) -> Reply {
        self.history.drop_placeholders();
        self.phase = Phase::AwaitingDaily;
        Reply::Silent
    }

    async fn on_talk(&mut self) -> Reply {
        let (Some(game), Some(day)) = (self.game.as_ref(), self.day.as_mut()) else {
            tracing::warn!("TALK outside a day");
            return Reply::Text(OVER.to_string());
        };
        let me = game.me;
        day.talk_count += 1;

        let mention = format!(">>{}", agent_label(me));
        let mut directed = Vec::new();
        for talk in &self.round {
            if talk.text.contains(&mention) {
                directed.push(DirectedMessage {
                    from: talk.agent,
                    text: talk.text.replace(&mention, "").trim().to_string(),
                });
            } else if talk.text == OVER {
                day.mark_withheld(game, talk.agent);
            }
        }
        let directed = if directed.len() == 1 {
            directed.pop()
        } else {
            None
        };

        if day.closed {
            return Reply::Text(OVER.to_string());
        }
        if let Some(max_talk) = self.setting.as_ref().and_then(|s| s.max_talk)
            && day.talk_count > max_talk
        {
            tracing::debug!(agent = me, day = day.day, max_talk, "Talk limit reached");
            return Reply::Text(OVER.to_string());
        }
        if day.day == 0 {
            let text = if day.talk_count == 1 {
                phrases::greeting(me)
            } else {
                OVER.to_string()
            };
            return Reply::Text(text);
        }

        let text = self.speak(directed).await;
        Reply::Text(text)
    }

    /// Day 1+ talk turn: launch, join and post-process.
    async fn speak(&mut self, directed: Option<DirectedMessage>) -> String {
        let (Some(game), Some(day)) = (self.game.as_ref(), self.day.as_mut()) else {
            return OVER.to_string();
        };
        let me = game.me;
        let cfg = &self.cfg;

        let claim_window = heuristics::in_claim_window(cfg, game.role, day.day, day.talk_count);
        let source = if day.talk_count == 1
            && let Some(line) = day.disclosure.clone()
        {
            Utterance::Scripted(line)
        } else if game.role == Role::Possessed && day.day == 2 && day.talk_count == 1 {
            Utterance::Scripted(phrases::werewolf_declaration(me))
        } else if self.round.is_empty() {
            Utterance::Scripted(phrases::morning(me, day.day))
        } else {
            Utterance::Generated
        };

        let utterance_request = matches!(source, Utterance::Generated).then(|| {
            let kind = if heuristics::is_strike_turn(day.day, day.talk_count) {
                RequestKind::Strike
            } else {
                RequestKind::Talk
            };
            GenerationRequest {
                kind,
                behavior: day.behavior,
                me,
                alive: game.alive(),
                dead: game.dead(),
                history: self.history.all().to_vec(),
                directed: directed.clone(),
                candidates: Vec::new(),
            }
        });

        let mut turn = self.dispatcher.launch(TurnPlan {
            me,
            utterance: utterance_request,
            votes: Some(self.round.clone()),
            claims: claim_window.then(|| self.history.on_day(day.day)),
        });

        let claims = turn.join_claims().await;
        let mut text = match source {
            Utterance::Scripted(line) => line,
            Utterance::Generated => match turn.join_utterance().await {
                Generated::Text(text) => text,
                Generated::Target(_) | Generated::Timeout => {
                    tracing::warn!(agent = me, day = day.day, talk = day.talk_count, "Generation timed out, using idle line");
                    phrases::idle(me)
                }
            },
        };

        if claim_window {
            let others = game.alive_others();
            let folded = match game.role {
                Role::Werewolf => {
                    heuristics::fold_werewolf_claims(me, &claims, &mut day.claims, day.behavior)
                }
                _ => heuristics::fold_possessed_claims(
                    cfg,
                    me,
                    day.talk_count,
                    &claims,
                    &mut day.claims,
                    day.behavior,
                    &others,
                    &mut self.rng,
                ),
            };
            if let Some(folded) = folded {
                text = match folded {
                    ClaimOverride::CounterClaim { claimant } => {
                        phrases::counter_claim(me, claimant)
                    }
                    ClaimOverride::FakeDisclosure { target, result } => {
                        phrases::seer_disclosure(me, target, result)
                    }
                };
                day.behavior = Role::Seer;
                tracing::info!(agent = me, claim = ?folded, "Seer claim override");
            }
        }

        let votes = turn.join_votes().await;
        merge_votes(game, day, &votes);

        let undeclared = day.undeclared(game);
        let accusers = day.accusers(game);

        if directed.is_some() && day.replies < cfg.reply_budget {
            day.replies += 1;
        } else {
            if heuristics::closes(cfg, day.day, day.talk_count, undeclared.len()) {
                day.closed = true;
                text = match heuristics::closing_line(
                    day.day,
                    game.role,
                    accusers.len(),
                    game.alive().len(),
                ) {
                    ClosingLine::WerewolfDead => phrases::werewolf_dead(me),
                    ClosingLine::Ending => phrases::ending(me, day.day),
                    ClosingLine::Evening => phrases::evening(me, day.day),
                };
                tracing::info!(agent = me, day = day.day, talk = day.talk_count, "Day closed");
            }
            if heuristics::should_mention(cfg, day.day, day.talk_count, accusers.len())
                && let Some(target) = heuristics::mention_target(me, &undeclared, &mut self.rng)
            {
                text = phrases::vote_inquiry(me, target);
                day.record_intent(game, target, VoteIntent::Asked);
            }
        }

        tracing::info!(
            agent = me,
            day = day.day,
            talk = day.talk_count,
            undeclared = undeclared.len(),
            accusers = accusers.len(),
            "Talk: {text}"
        );
        text
    }

    fn on_vote(&mut self) -> Reply {
        let Some(game) = self.game.as_ref() else {
            return Reply::Silent;
        };
        let targets = game.alive_others();
        let declared = self
            .day
            .as_ref()
            .and_then(|d| d.own_vote)
            .filter(|t| targets.contains(t));

        let target = declared.or_else(|| targets.choose(&mut self.rng).copied());
        self.target_reply("vote", target)
    }

    async fn on_divine(&mut self) -> Reply {
        let (Some(game), Some(day)) = (self.game.as_ref(), self.day.as_ref()) else {
            return Reply::Silent;
        };
        let targets = game.alive_others();

        let target = if day.day == 1 {
            let mut candidates: Vec<AgentIdx> = targets
                .iter()
                .copied()
                .filter(|t| Some(*t) != self.divined_first)
                .collect();
            if candidates.is_empty() {
                candidates.clone_from(&targets);
            }
            let request = GenerationRequest {
                kind: RequestKind::Divine,
                behavior: day.behavior,
                me: game.me,
                alive: game.alive(),
                dead: game.dead(),
                history: self.history.all().to_vec(),
                directed: None,
                candidates: candidates.clone(),
            };
            match self.dispatcher.decide(request).await {
                Generated::Target(t) if candidates.contains(&t) => Some(t),
                other => {
                    tracing::warn!(answer = ?other, "Divine answer not a candidate, choosing at random");
                    candidates.choose(&mut self.rng).copied()
                }
            }
        } else {
            let chosen = targets.choose(&mut self.rng).copied();
            if day.day == 0 {
                self.divined_first = chosen;
            }
            chosen
        };

        self.target_reply("divine", target)
    }

    fn on_attack(&mut self) -> Reply {
        let (Some(game), Some(day)) = (self.game.as_ref(), self.day.as_ref()) else {
            return Reply::Silent;
        };
        let targets = game.alive_others();
        let target = if day.day == 1 {
            heuristics::attack_target(&targets, &day.claims, &mut self.rng)
        } else {
            targets.choose(&mut self.rng).copied()
        };
        self.target_reply("attack", target)
    }

    fn target_reply(&self, action: &str, target: Option<AgentIdx>) -> Reply {
        let me = self.game.as_ref().map(|g| g.me);
        match target {
            Some(target) => {
                tracing::info!(agent = ?me, action, target, "Target chosen");
                Reply::Target(target)
            }
            None => {
                tracing::warn!(agent = ?me, action, "No legal target");
                Reply::Silent
            }
        }
    }
}

/// Fold extracted vote lines into the day. This agent's own line becomes
/// its declared target; `Agent[06]` targets mean nothing was declared.
fn merge_votes(game: &GameState, day: &mut DayState, votes: &[VoteReport]) {
    for vote in votes {
        if vote.actor == game.me {
            if vote.target != game.me && game.is_alive(vote.target) {
                day.own_vote = Some(vote.target);
            }
            continue;
        }
        let intent = match vote.target {
            NO_ONE => continue,
            WITHHELD => VoteIntent::Withheld,
            target => VoteIntent::Target(target),
        };
        day.record_intent(game, vote.actor, intent);
    }
}

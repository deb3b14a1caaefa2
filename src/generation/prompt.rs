//! Prompt rendering for the generation backend.
//!
//! Templates are registered inline with Tera; the system prompt carries the
//! game context and history, the user message carries the instruction for
//! the request kind.

use super::request::{GenerationRequest, RequestKind};
use crate::protocol::{AgentIdx, OVER, Role, SKIP, Talk, agent_label};
use tera::{Context, Tera};

const TALK_SYSTEM: &str = "\
You are playing a five-player game of Werewolf: one werewolf, one possessed, \
one seer and two villagers. Players talk during the day and vote one player out.
{{ persona }}
You are {{ me }}.
Players still in the game: {{ alive }}.
{% if dead %}Players out of the game: {{ dead }}.
{% endif %}{{ stance }}
Reply with one or two short sentences in character. Do not write a speaker \
label or stage directions. To address a player, start with >>Agent[NN].
{% if history %}
## Conversation so far
{{ history }}
{{ me }}:{% endif %}{% if directed_from %}
{{ directed_from }} just said to you: \"{{ directed_text }}\". Answer them.{% endif %}";

const TARGET_SYSTEM: &str = "\
You are {{ me }} in a game of Werewolf.
{% if history %}## Conversation so far
{{ history }}
{% endif %}Candidates: {{ candidates }}.";

const VOTE_EXTRACTION_SYSTEM: &str = "\
Below is the latest round of a Werewolf conversation. You are {{ me }}.
{{ history }}
For every player, report whom they said they will vote for, one line per \
player in the form `Agent[AA] -> Agent[TT]`. Use Agent[06] as the target \
when a player has not named anyone. If nobody named a vote target, answer `none`.";

const CLAIM_EXTRACTION_SYSTEM: &str = "\
Below is today's Werewolf conversation. You are {{ me }}.
{{ history }}
Report every player who claimed to be the seer and announced a divination \
result, one line per claim in the form `Agent[AA], Agent[TT], white` or \
`Agent[AA], Agent[TT], black` (claimant, divined player, result). If nobody \
made such a claim, answer `none`.";

const VOTE_EXTRACTION_USER: &str = "List the declared vote targets.";
const CLAIM_EXTRACTION_USER: &str = "List the seer claims.";

const PERSONAS: [&str; 6] = [
    "You speak plainly.",
    "You are a calm schoolteacher who weighs every statement before judging.",
    "You are a cheerful shopkeeper who talks fast and trusts gut feelings.",
    "You are a retired detective who asks pointed questions.",
    "You are a shy student who notices small contradictions.",
    "You are a blunt farmer who distrusts anyone who talks too much.",
];

fn persona(idx: AgentIdx) -> &'static str {
    PERSONAS
        .get(usize::from(idx))
        .copied()
        .unwrap_or(PERSONAS[0])
}

fn stance(behavior: Role) -> &'static str {
    match behavior {
        Role::Seer => {
            "You are the seer. Share your divination results and defend them against doubt."
        }
        Role::Possessed => {
            "You secretly side with the werewolf. Sow confusion and shield whoever is under suspicion."
        }
        Role::Werewolf => {
            "You are secretly the werewolf. Act like a villager and steer suspicion toward others."
        }
        _ => "You are a villager. Find the werewolf by questioning inconsistencies.",
    }
}

fn instruction(kind: RequestKind) -> &'static str {
    match kind {
        RequestKind::Talk => "Say your next line.",
        RequestKind::Strike => {
            "Name the player you find most suspicious and press them with a pointed question."
        }
        RequestKind::Divine => {
            "Choose the player to divine tonight. Answer with the agent number only."
        }
        RequestKind::Vote => "Choose the player to vote out. Answer with the agent number only.",
        RequestKind::Attack => {
            "Choose the player to attack tonight. Answer with the agent number only."
        }
    }
}

fn label_list(agents: &[AgentIdx]) -> String {
    agents
        .iter()
        .map(|a| agent_label(*a))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_line(talk: &Talk) -> String {
    let text = match talk.text.as_str() {
        SKIP => "(passes)",
        OVER => "(has nothing more to say)",
        other => other,
    };
    format!("{}: {text}", agent_label(talk.agent))
}

/// Format talks as `### Day N` sections of `Agent[NN]: text` lines.
pub fn format_history(talks: &[Talk]) -> String {
    let mut out = String::new();
    let mut current_day = None;
    for talk in talks {
        if current_day != Some(talk.day) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("### Day {}\n", talk.day));
            current_day = Some(talk.day);
        }
        out.push_str(&render_line(talk));
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// A rendered system prompt plus user instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Tera-backed prompt builder with the templates registered up front.
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("talk", TALK_SYSTEM),
            ("target", TARGET_SYSTEM),
            ("vote_extraction", VOTE_EXTRACTION_SYSTEM),
            ("claim_extraction", CLAIM_EXTRACTION_SYSTEM),
        ])?;
        Ok(Self { tera })
    }

    /// Prompt for an utterance or a target choice.
    pub fn generation(&self, request: &GenerationRequest) -> anyhow::Result<Prompt> {
        let mut ctx = Context::new();
        ctx.insert("me", &agent_label(request.me));
        ctx.insert("history", &format_history(&request.history));

        let template = if request.kind.wants_target() {
            ctx.insert("candidates", &label_list(&request.candidates));
            "target"
        } else {
            ctx.insert("persona", persona(request.me));
            ctx.insert("alive", &label_list(&request.alive));
            ctx.insert("dead", &label_list(&request.dead));
            ctx.insert("stance", stance(request.behavior));
            match &request.directed {
                Some(directed) => {
                    ctx.insert("directed_from", &agent_label(directed.from));
                    ctx.insert("directed_text", &directed.text);
                }
                None => {
                    ctx.insert("directed_from", "");
                    ctx.insert("directed_text", "");
                }
            }
            "talk"
        };

        Ok(Prompt {
            system: self.tera.render(template, &ctx)?,
            user: instruction(request.kind).to_string(),
        })
    }

    pub fn vote_extraction(&self, me: AgentIdx, talks: &[Talk]) -> anyhow::Result<Prompt> {
        self.extraction("vote_extraction", VOTE_EXTRACTION_USER, me, talks)
    }

    pub fn claim_extraction(&self, me: AgentIdx, talks: &[Talk]) -> anyhow::Result<Prompt> {
        self.extraction("claim_extraction", CLAIM_EXTRACTION_USER, me, talks)
    }

    fn extraction(
        &self,
        template: &str,
        user: &str,
        me: AgentIdx,
        talks: &[Talk],
    ) -> anyhow::Result<Prompt> {
        let mut ctx = Context::new();
        ctx.insert("me", &agent_label(me));
        ctx.insert("history", &format_history(talks));
        Ok(Prompt {
            system: self.tera.render(template, &ctx)?,
            user: user.to_string(),
        })
    }
}

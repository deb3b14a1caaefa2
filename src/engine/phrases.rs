//! Scripted lines, one per seat so each agent keeps a consistent voice.
//!
//! Index 0 is the fallback for seats beyond the table. `{target}` is
//! replaced with an `Agent[NN]` label and `{result}` with a divination result.

use crate::protocol::{AgentIdx, Species, agent_label};

type Lines = [&'static str; 6];

const IDLE: Lines = [
    "Let me listen a little longer.",
    "I will hold my thoughts for now and listen.",
    "Hmm, nothing to add right now!",
    "I am still putting the pieces together.",
    "Um, I will just listen for a bit.",
    "Nothing from me yet.",
];

const GREETING: Lines = [
    "Hello everyone, good luck.",
    "Good evening, everyone. Let us play fair and think carefully.",
    "Hi all! Have fun, and may the best side win!",
    "Evening. I will be watching closely. Good luck.",
    "Um, hello. Nice to meet you all. Good luck.",
    "Hello. Let's get this done.",
];

const DAY1_MORNING: Lines = [
    "Good morning. Does anyone have information to share?",
    "Good morning. Would the seer please come forward with a result?",
    "Morning everyone! Seer, are you out there? Tell us what you saw!",
    "Morning. Let's start with the seer. Who divined whom last night?",
    "Good morning. Um, is the seer going to speak?",
    "Morning. Seer, speak up.",
];

const DAY2_MORNING: Lines = [
    "Good morning. One of us is gone. Let's think about why.",
    "Good morning. Let us look back at yesterday's votes before we decide.",
    "Morning! We lost someone again. Who looked odd yesterday?",
    "Morning. The werewolf chose its victim for a reason. Let's find it.",
    "Good morning. Um, I think yesterday's votes tell us something.",
    "Morning. We are running out of time. Be direct.",
];

const DAY1_EVENING: Lines = [
    "I think we have heard enough today.",
    "I believe we have said what needed saying. Let us vote carefully.",
    "Okay, I'm ready to vote! Let's wrap it up.",
    "I have what I need. Time to vote.",
    "Um, I think I am ready to vote now.",
    "Enough talk. Let's vote.",
];

const DAY2_EVENING: Lines = [
    "This is the last vote that matters. Choose well.",
    "Everything rides on this vote. Please choose carefully.",
    "Last chance, everyone! Let's get it right!",
    "It comes down to this vote. I have made up my mind.",
    "Um, this is it. I hope we are right.",
    "Final vote. No more talk.",
];

const DAY1_ENDING: Lines = [
    "It seems many of you suspect me. I can only ask you to reconsider.",
    "So many votes on me. I am not the werewolf, but I accept your judgment.",
    "Wow, everyone's after me! You're making a mistake, you know!",
    "You are all pointing at me. Remember this when the werewolf strikes tonight.",
    "Um, everyone is voting for me. I really am not the werewolf.",
    "Fine. Vote me. You'll regret it.",
];

const DAY2_ENDING: Lines = [
    "If you vote me out now, the werewolf wins.",
    "If I go now, the village loses. Please think once more.",
    "Voting me now hands the game to the werewolf!",
    "Vote me out and you lose. That is all I will say.",
    "Um, if I am gone, I think the werewolf wins.",
    "Vote me and you lose.",
];

const COUNTER_CLAIM: Lines = [
    "I am the real seer. {target} is lying.",
    "Wait. I am the seer, and {target} is an impostor.",
    "No way! I'm the real seer! {target} is a fake!",
    "I am the seer. {target} is a liar, and I can prove it.",
    "Um, actually I am the seer. {target} is not telling the truth.",
    "I'm the seer. {target} is fake.",
];

const SEER_DISCLOSURE: Lines = [
    "I am the seer. {target} is {result}.",
    "I am the seer. Last night I divined {target}, and the result was {result}.",
    "I'm the seer! I checked {target} and they're {result}!",
    "I am the seer. {target} came back {result}.",
    "Um, I am the seer. I divined {target}. The result was {result}.",
    "Seer here. {target} is {result}.",
];

const VOTE_INQUIRY: Lines = [
    ">>{target} who will you vote for?",
    ">>{target} you have been quiet. Whom do you intend to vote for?",
    ">>{target} hey, who's getting your vote?",
    ">>{target} you haven't said who you are voting for. Who is it?",
    ">>{target} um, who are you going to vote for?",
    ">>{target} who's your vote?",
];

const WEREWOLF_DEAD: Lines = [
    "The werewolf is already gone. Vote however you like.",
    "I believe the werewolf is already dead. Let us vote calmly.",
    "The werewolf's gone already! We're safe, whatever we vote!",
    "The werewolf died last night. This vote changes nothing.",
    "Um, I think the werewolf is already gone.",
    "Werewolf's dead. Doesn't matter.",
];

/// The possessed sides openly with the werewolf; `{target}` is its own label.
const WEREWOLF_DECLARATION: Lines = [
    "I am the werewolf. {target} has nothing left to hide.",
    "I will be honest now. I, {target}, am the werewolf.",
    "Surprise! {target} is the werewolf! Vote me if you dare!",
    "No more games. {target} is the werewolf.",
    "Um, actually... I am the werewolf. Sorry.",
    "I'm the werewolf. {target}. Deal with it.",
];

fn pick(lines: &Lines, idx: AgentIdx) -> &'static str {
    lines.get(usize::from(idx)).copied().unwrap_or(lines[0])
}

fn with_target(template: &str, target: AgentIdx) -> String {
    template.replace("{target}", &agent_label(target))
}

fn species_word(result: Species) -> &'static str {
    match result {
        Species::Human => "human",
        Species::Werewolf => "a werewolf",
    }
}

/// Substitute for a generation that never arrived.
pub fn idle(idx: AgentIdx) -> String {
    pick(&IDLE, idx).to_string()
}

pub fn greeting(idx: AgentIdx) -> String {
    pick(&GREETING, idx).to_string()
}

pub fn morning(idx: AgentIdx, day: u32) -> String {
    let lines = if day <= 1 { &DAY1_MORNING } else { &DAY2_MORNING };
    pick(lines, idx).to_string()
}

pub fn evening(idx: AgentIdx, day: u32) -> String {
    let lines = if day <= 1 { &DAY1_EVENING } else { &DAY2_EVENING };
    pick(lines, idx).to_string()
}

/// Closing line when most of the table is voting for this agent.
pub fn ending(idx: AgentIdx, day: u32) -> String {
    let lines = if day <= 1 { &DAY1_ENDING } else { &DAY2_ENDING };
    pick(lines, idx).to_string()
}

pub fn counter_claim(idx: AgentIdx, claimant: AgentIdx) -> String {
    with_target(pick(&COUNTER_CLAIM, idx), claimant)
}

pub fn seer_disclosure(idx: AgentIdx, target: AgentIdx, result: Species) -> String {
    with_target(pick(&SEER_DISCLOSURE, idx), target).replace("{result}", species_word(result))
}

pub fn vote_inquiry(idx: AgentIdx, target: AgentIdx) -> String {
    with_target(pick(&VOTE_INQUIRY, idx), target)
}

pub fn werewolf_dead(idx: AgentIdx) -> String {
    pick(&WEREWOLF_DEAD, idx).to_string()
}

/// Day-2 opener of the possessed, naming itself as the werewolf.
pub fn werewolf_declaration(idx: AgentIdx) -> String {
    with_target(pick(&WEREWOLF_DECLARATION, idx), idx)
}

//! Clean-up of raw backend output before it goes on the wire.

/// Characters the host renders badly or that leak prompt formatting.
const STRIPPED_CHARS: [char; 12] = [
    '「', '」', '；', ';', ':', '：', '’', '\'', '\u{3000}', '(', ')', '♪',
];

/// Remove every `Agent[NN]: ` speaker label the model echoes back.
pub fn strip_speaker_labels(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("Agent[") {
        let tail = &rest[pos + "Agent[".len()..];
        let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
        let is_label = digits > 0 && tail[digits..].starts_with("]: ");
        if is_label {
            out.push_str(&rest[..pos]);
            rest = &tail[digits + "]: ".len()..];
        } else {
            out.push_str(&rest[..pos + "Agent[".len()]);
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}

/// Normalize generated talk: one line, no speaker labels, no decoration.
pub fn normalize_text(text: &str) -> String {
    let one_line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let unlabeled = strip_speaker_labels(&one_line);
    let cleaned: String = unlabeled
        .replace("XXX", "")
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect();
    cleaned.trim().to_string()
}

/// First run of ASCII digits in the text, parsed as an integer.
pub fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Every run of ASCII digits in the text, in order.
pub fn integers(text: &str) -> Vec<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

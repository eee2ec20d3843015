//! Reasoning trace extraction
//!
//! Reasoning models such as DeepSeek R1 wrap their chain of thought in
//! `<think>…</think>` ahead of the answer; some use `<thinking>` instead.

type TagPair = (&'static str, &'static str);

/// Recognised (open, close) tag pairs
const TAGS: [TagPair; 2] = [("<think>", "</think>"), ("<thinking>", "</thinking>")];

/// Earliest position of any tag picked by `pick`, with the pair index
fn find_tag(haystack: &str, pick: fn(&TagPair) -> &'static str) -> Option<(usize, usize)> {
    TAGS.iter()
        .enumerate()
        .filter_map(|(pair, tag)| haystack.find(pick(tag)).map(|pos| (pos, pair)))
        .min()
}

/// Split raw output into `(answer, reasoning)`
///
/// A missing opening tag with a present closing tag means everything before
/// the closing tag is reasoning. An unterminated block is all reasoning.
pub fn split_reasoning(raw: &str) -> (String, Option<String>) {
    let mut answer = String::new();
    let mut reasoning: Vec<String> = Vec::new();
    let mut rest = raw;

    if let Some((close, pair)) = find_tag(rest, |t| t.1) {
        let open = find_tag(rest, |t| t.0);
        if open.map_or(true, |(o, _)| o > close) {
            reasoning.push(rest[..close].to_string());
            rest = &rest[close + TAGS[pair].1.len()..];
        }
    }

    while let Some((start, pair)) = find_tag(rest, |t| t.0) {
        let (open_tag, close_tag) = TAGS[pair];
        answer.push_str(&rest[..start]);
        let inner = &rest[start + open_tag.len()..];
        match inner.find(close_tag) {
            Some(end) => {
                reasoning.push(inner[..end].to_string());
                rest = &inner[end + close_tag.len()..];
            }
            None => {
                reasoning.push(inner.to_string());
                rest = "";
            }
        }
    }
    answer.push_str(rest);

    let reasoning = reasoning
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let reasoning = (!reasoning.is_empty()).then_some(reasoning);
    (answer.trim().to_string(), reasoning)
}

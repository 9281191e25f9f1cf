//! Detects YouTube intent in free text and extracts the search topic.

use std::sync::LazyLock;

use regex::Regex;

/// Tried in order; the first match wins. `\n?$` also accepts one trailing
/// newline after the topic.
const YOUTUBE_PATTERNS: [&str; 3] = [
    r"(?i)(?:search|find|look up|show me)\s+(?:videos?|channels?)\s+(?:about|on|related to)?\s+(.*?)(?:\?|\n?$|\.)",
    r"(?i)(?:youtube|video)\s+(?:about|on|related to)?\s+(.*?)(?:\?|\n?$|\.)",
    r"(?i)(?:trending|popular)\s+(?:videos?|channels?|content)\s+(?:about|on)?\s+(.*?)(?:\?|\n?$|\.)",
];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    YOUTUBE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("YouTube pattern must compile"))
        .collect()
});

/// Return the YouTube search topic in `text`, if the text asks for videos.
///
/// The first pattern that matches decides; its capture is trimmed and an
/// empty topic counts as no match.
#[must_use]
pub fn extract_youtube_query(text: &str) -> Option<String> {
    let caps = PATTERNS.iter().find_map(|re| re.captures(text))?;
    let topic = caps.get(1).map_or("", |m| m.as_str()).trim();
    if topic.is_empty() { None } else { Some(topic.to_string()) }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

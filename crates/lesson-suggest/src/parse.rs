//! Parsing of free-form service replies into a bounded suggestion list.
//!
//! Rules are tried in order and the first one yielding at least
//! [`MIN_ITEMS`] non-empty items wins:
//!
//! 1. split on numbered-list markers (`1.` or `1)`), ignoring any preamble
//! 2. split on blank-line paragraph breaks
//! 3. split on single newlines, dropping lines that are only a marker

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum number of items a rule must produce to be accepted.
pub const MIN_ITEMS: usize = 2;

/// A numbered marker at the start of a line.
static LINE_MARKER: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^[ \t]*\d{1,2}[.)][ \t]+"));

/// A numbered marker anywhere after whitespace. Only trusted in sequence.
static INLINE_MARKER: Lazy<Regex> = Lazy::new(|| compile(r"(?:^|\s)(\d{1,2})[.)]\s+"));

/// One or more blank lines.
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| compile(r"\n[ \t]*\n"));

/// A line holding nothing but a list marker.
static BARE_MARKER: Lazy<Regex> = Lazy::new(|| compile(r"^(?:\d{1,2}[.)]?|[-*•])$"));

/// A leading bullet on a single line.
static BULLET_PREFIX: Lazy<Regex> = Lazy::new(|| compile(r"^[-*•]\s+"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in suggestion pattern must compile")
}

/// Parses a reply into at most `max` suggestions.
///
/// Returns `None` when no rule produces at least [`MIN_ITEMS`] items; callers
/// substitute fallback content in that case.
///
/// # Examples
///
/// ```
/// use lesson_suggest::parse_suggestions;
///
/// let items = parse_suggestions("1. Foo\n2. Bar\n3. Baz", 3).unwrap();
/// assert_eq!(items, vec!["Foo", "Bar", "Baz"]);
///
/// assert!(parse_suggestions("Just one thought, nothing more.", 3).is_none());
/// ```
#[must_use]
pub fn parse_suggestions(reply: &str, max: usize) -> Option<Vec<String>> {
    let reply = reply.replace("\r\n", "\n");
    let rules: [fn(&str) -> Vec<String>; 3] = [split_numbered, split_paragraphs, split_lines];

    rules
        .iter()
        .map(|rule| rule(&reply))
        .find(|items| items.len() >= MIN_ITEMS)
        .map(|mut items| {
            items.truncate(max);
            items
        })
}

/// Splits on numbered markers. Text before the first marker is discarded.
///
/// Markers at the start of a line win. Failing that, inline markers are
/// used, but only while they count up from 1, so a number inside an answer
/// ("I'm 11. Want to play?") never starts a new item.
fn split_numbered(reply: &str) -> Vec<String> {
    let line_markers: Vec<(usize, usize)> = LINE_MARKER
        .find_iter(reply)
        .map(|m| (m.start(), m.end()))
        .collect();
    let items = items_between(reply, &line_markers);
    if items.len() >= MIN_ITEMS {
        return items;
    }
    items_between(reply, &sequential_markers(reply))
}

fn sequential_markers(reply: &str) -> Vec<(usize, usize)> {
    let mut expected = 1;
    let mut markers = Vec::new();
    for caps in INLINE_MARKER.captures_iter(reply) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if number.as_str().parse::<u32>().ok() == Some(expected) {
            markers.push((whole.start(), whole.end()));
            expected += 1;
        }
    }
    markers
}

/// Text between consecutive `(start, end)` marker spans.
fn items_between(reply: &str, markers: &[(usize, usize)]) -> Vec<String> {
    markers
        .iter()
        .enumerate()
        .filter_map(|(i, &(_, end))| {
            let next = markers.get(i + 1).map_or(reply.len(), |&(start, _)| start);
            clean_item(&reply[end..next])
        })
        .collect()
}

fn split_paragraphs(reply: &str) -> Vec<String> {
    PARAGRAPH_BREAK.split(reply).filter_map(clean_item).collect()
}

fn split_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !BARE_MARKER.is_match(line))
        .map(strip_bullet)
        .filter_map(clean_item)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    BULLET_PREFIX.find(line).map_or(line, |m| &line[m.end()..])
}

/// Trims whitespace and one pair of wrapping quotes.
fn clean_item(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|s| s.strip_suffix(*close))
        })
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

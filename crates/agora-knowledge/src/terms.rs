//! Key-term extraction and topic text helpers

use std::collections::HashMap;

/// Interrogative and auxiliary words that make a span useless as a search term
pub const STOP_CHUNKS: [&str; 13] = [
    "what", "who", "why", "how", "which", "are", "do", "does", "did", "have", "has", "had",
    "your",
];

/// Words stripped from a debate topic before grounding
const DEBATE_VERBS: [&str; 3] = ["debate", "discuss", "argue"];

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "during", "each", "few", "for", "from", "further", "he", "her", "here",
    "hers", "him", "his", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may",
    "me", "might", "more", "most", "must", "my", "no", "nor", "not", "now", "of", "off", "on",
    "once", "only", "or", "other", "our", "ours", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "us",
    "very", "was", "we", "were", "when", "where", "while", "whom", "will", "with", "would",
    "you", "yours",
];

fn is_stop_chunk(word: &str) -> bool {
    STOP_CHUNKS.contains(&word.to_lowercase().as_str())
}

fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str()) || STOP_CHUNKS.contains(&lower.as_str())
}

/// A whitespace token with surrounding punctuation removed. `breaks_after`
/// is set when trailing punctuation ends the phrase.
struct Word<'a> {
    text: &'a str,
    breaks_before: bool,
    breaks_after: bool,
}

fn words(text: &str) -> Vec<Word<'_>> {
    text.split_whitespace()
        .filter_map(|raw| {
            let text = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if text.is_empty() {
                return None;
            }
            Some(Word {
                text,
                breaks_before: raw.starts_with(|c: char| !c.is_alphanumeric()),
                breaks_after: raw.ends_with(|c: char| !c.is_alphanumeric()),
            })
        })
        .collect()
}

fn is_content(word: &str) -> bool {
    word.chars().any(char::is_alphabetic) && !is_stop_word(word)
}

fn push_unique(terms: &mut Vec<String>, candidate: String) {
    if !terms.iter().any(|t| t.eq_ignore_ascii_case(&candidate)) {
        terms.push(candidate);
    }
}

/// Maximal runs of words accepted by `keep`, broken by rejected words and
/// punctuation
fn runs<'a>(words: &[Word<'a>], keep: impl Fn(&str) -> bool) -> Vec<Vec<&'a str>> {
    let mut spans = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in words {
        if word.breaks_before && !current.is_empty() {
            spans.push(std::mem::take(&mut current));
        }
        if keep(word.text) {
            current.push(word.text);
        } else if !current.is_empty() {
            spans.push(std::mem::take(&mut current));
        }
        if word.breaks_after && !current.is_empty() {
            spans.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        spans.push(current);
    }
    spans
}

/// Up to `top_n` search terms for a topic: phrase-like spans of content
/// words first, then capitalized spans, then the most frequent content words.
/// No term contains an interrogative or auxiliary word.
pub fn key_terms(topic: &str, top_n: usize) -> Vec<String> {
    let words = words(topic);
    let mut terms = Vec::new();

    for span in runs(&words, is_content) {
        if terms.len() >= top_n {
            break;
        }
        push_unique(&mut terms, span.join(" "));
    }

    if terms.len() < top_n {
        let capitalized = |w: &str| w.starts_with(char::is_uppercase) && !is_stop_chunk(w);
        for span in runs(&words, capitalized) {
            if terms.len() >= top_n {
                break;
            }
            if span.iter().any(|w| is_stop_chunk(w)) {
                continue;
            }
            push_unique(&mut terms, span.join(" "));
        }
    }

    if terms.len() < top_n {
        for word in frequent_terms(topic, top_n) {
            if terms.len() >= top_n {
                break;
            }
            push_unique(&mut terms, word);
        }
    }

    terms.truncate(top_n);
    tracing::debug!(topic, ?terms, "Extracted key terms");
    terms
}

/// The `n` most frequent alphabetic content words, lowercased. Ties keep
/// first-occurrence order.
pub fn frequent_terms(text: &str, n: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for word in words(text) {
        if !word.text.chars().all(char::is_alphabetic) || is_stop_word(word.text) {
            continue;
        }
        let lower = word.text.to_lowercase();
        let count = counts.entry(lower.clone()).or_insert(0);
        if *count == 0 {
            order.push(lower);
        }
        *count += 1;
    }

    // stable sort keeps first-occurrence order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(n);
    order
}

/// First `n` sentences of a text
pub fn key_points(text: &str, n: usize) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for (i, (idx, c)) in chars.iter().enumerate() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.get(i + 1).map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences.truncate(n);
    sentences
}

/// Drop the words "debate", "discuss" and "argue" from a topic
pub fn prepare_topic(topic: &str) -> String {
    topic
        .split_whitespace()
        .filter(|w| !DEBATE_VERBS.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

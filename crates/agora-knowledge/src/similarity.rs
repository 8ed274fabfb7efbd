//! Two-document TF-IDF cosine similarity
//!
//! Tokens are lowercase runs of two or more word characters. Term weights are
//! raw counts times a smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1`, computed over just the two documents being
//! compared, and each vector is L2-normalized before the dot product.

use std::collections::HashMap;

/// Split text into lowercase tokens of at least two word characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

fn term_counts(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity in `[0, 1]`. Returns 0 when either side has no tokens.
pub fn tfidf_cosine(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let counts_a = term_counts(&tokens_a);
    let counts_b = term_counts(&tokens_b);
    let n = 2.0_f64;

    let idf = |term: &str| {
        let df = counts_a.contains_key(term) as u8 + counts_b.contains_key(term) as u8;
        ((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0
    };

    let weigh = |counts: &HashMap<&str, f64>| -> HashMap<String, f64> {
        let raw: HashMap<String, f64> = counts
            .iter()
            .map(|(term, tf)| (term.to_string(), tf * idf(term)))
            .collect();
        let norm = raw.values().map(|w| w * w).sum::<f64>().sqrt();
        raw.into_iter().map(|(t, w)| (t, w / norm)).collect()
    };

    let va = weigh(&counts_a);
    let vb = weigh(&counts_b);

    let dot: f64 = va
        .iter()
        .filter_map(|(term, wa)| vb.get(term).map(|wb| wa * wb))
        .sum();
    dot.clamp(0.0, 1.0)
}

/// Score every option against the term, in input order
pub fn score_options(term: &str, options: &[String]) -> Vec<(String, f64)> {
    options
        .iter()
        .map(|option| (option.clone(), tfidf_cosine(term, option)))
        .collect()
}

/// Highest-scoring option if it clears `threshold` (strictly). Ties keep the
/// earliest option.
pub fn best_option(term: &str, options: &[String], threshold: f64) -> Option<(String, f64)> {
    let mut best: Option<(String, f64)> = None;
    for (option, score) in score_options(term, options) {
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((option, score));
        }
    }
    tracing::debug!(term, best = ?best, "Scored disambiguation options");
    best.filter(|(_, score)| *score > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_single_chars() {
        assert_eq!(tokenize("A quick-look at AI's role"), vec!["quick", "look", "at", "ai", "role"]);
    }

    #[test]
    fn test_identical_and_disjoint() {
        assert!((tfidf_cosine("climate change", "Climate change") - 1.0).abs() < 1e-9);
        assert_eq!(tfidf_cosine("climate", "privacy"), 0.0);
        assert_eq!(tfidf_cosine("", "privacy"), 0.0);
    }

    #[test]
    fn test_known_value() {
        // shared "jaguar" has idf 1, "car" has idf ln(1.5) + 1
        let expected = 1.0 / (1.0 + (1.5f64.ln() + 1.0).powi(2)).sqrt();
        assert!((tfidf_cosine("jaguar", "Jaguar (car)") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_jaguar_disambiguation() {
        let opts = options(&["Jaguar (animal)", "Jaguar (car)", "Jaguar (operating system)"]);
        let scores = score_options("jaguar", &opts);
        let (picked, best) = best_option("jaguar", &opts, 0.1).unwrap();
        assert_eq!(picked, "Jaguar (animal)");
        for (_, score) in &scores {
            assert!(best >= *score);
        }
        // the longer title dilutes the shared term
        assert!(scores[2].1 < scores[1].1);
    }

    #[test]
    fn test_threshold_rejects_weak_options() {
        let opts = options(&["Panthera onca", "Land Rover"]);
        assert!(best_option("jaguar", &opts, 0.1).is_none());
        assert!(best_option("jaguar", &[], 0.1).is_none());
    }
}

//! Fuzzy text matching for disambiguating on-screen options.
//!
//! Scores are normalized edit-distance similarities in `[0, 1]`. The matcher
//! is tuned for near-identical strings (punctuation and spacing drift such as
//! "S.A." vs "S A"): pairs needing more than 10% of edits score `0.0`, so a
//! weak candidate is never mistaken for a match.

use std::collections::{HashMap, VecDeque};

pub const DEFAULT_MIN_SIMILARITY: f64 = 0.9;
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity of two strings after normalization.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_text(a).chars().collect();
    let b: Vec<char> = normalize_text(b).chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let max_len = a.len().max(b.len());
    let len_diff = a.len().abs_diff(b.len());
    if len_diff * 2 > max_len {
        return 0.0;
    }

    // ceil(max_len * 0.1) edits allowed
    let budget = max_len.div_ceil(10);
    match bounded_levenshtein(&a, &b, budget) {
        Some(distance) => (max_len - distance) as f64 / max_len as f64,
        None => 0.0,
    }
}

/// Levenshtein distance, or `None` as soon as it is known to exceed `budget`.
///
/// Every row minimum is a lower bound on the final distance, so a row whose
/// minimum is over budget ends the computation.
fn bounded_levenshtein(a: &[char], b: &[char], budget: usize) -> Option<usize> {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > budget {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= budget).then_some(distance)
}

/// Best candidate returned by [`SimilarityMatcher::find_most_similar`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarMatch {
    pub index: usize,
    pub text: String,
    pub similarity: f64,
}

/// Pairwise score memo with a fixed capacity; the oldest insertion is
/// evicted first. Keys are order-sensitive: `(a, b)` and `(b, a)` are
/// cached separately.
#[derive(Debug)]
pub struct SimilarityCache {
    capacity: usize,
    scores: HashMap<(String, String), f64>,
    order: VecDeque<(String, String)>,
    hits: u64,
    misses: u64,
}

impl SimilarityCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            scores: HashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY)),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    fn get(&mut self, a: &str, b: &str) -> Option<f64> {
        let found = self.scores.get(&(a.to_string(), b.to_string())).copied();
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    fn insert(&mut self, a: &str, b: &str, score: f64) {
        if self.capacity == 0 {
            return;
        }
        let key = (a.to_string(), b.to_string());
        if self.scores.contains_key(&key) {
            return;
        }
        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.scores.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.scores.insert(key, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.scores.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for SimilarityCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Similarity scoring with a per-session memo.
#[derive(Debug, Default)]
pub struct SimilarityMatcher {
    cache: SimilarityCache,
}

impl SimilarityMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: SimilarityCache::new(capacity),
        }
    }

    pub fn calculate_similarity(&mut self, a: &str, b: &str) -> f64 {
        if let Some(score) = self.cache.get(a, b) {
            return score;
        }
        let score = similarity(a, b);
        self.cache.insert(a, b, score);
        score
    }

    /// Highest-scoring candidate at or above `min_similarity`.
    ///
    /// Ties keep the earliest candidate. A perfect match ends the scan.
    pub fn find_most_similar<S: AsRef<str>>(
        &mut self,
        target: &str,
        candidates: &[S],
        min_similarity: f64,
    ) -> Option<SimilarMatch> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let score = self.calculate_similarity(target, candidate.as_ref());
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((index, score));
            }
            if score >= 1.0 {
                break;
            }
        }

        let (index, score) = best?;
        if score < min_similarity {
            tracing::debug!(
                "No candidate for {:?} reached {:.2} (best {:.2})",
                target,
                min_similarity,
                score
            );
            return None;
        }

        Some(SimilarMatch {
            index,
            text: candidates[index].as_ref().to_string(),
            similarity: score,
        })
    }

    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_whitespace() {
        assert_eq!(normalize_text("  Hello   World\t\n"), "hello world");
    }

    #[test]
    fn test_bounded_levenshtein_aborts_over_budget() {
        let a: Vec<char> = "abcdefghij".chars().collect();
        let b: Vec<char> = "abcdefghzz".chars().collect();
        assert_eq!(bounded_levenshtein(&a, &b, 2), Some(2));
        assert_eq!(bounded_levenshtein(&a, &b, 1), None);
    }

    #[test]
    fn test_length_gate() {
        assert_eq!(similarity("abcd", "abcdefghij"), 0.0);
    }

    #[test]
    fn test_cache_fifo_eviction() {
        let mut cache = SimilarityCache::new(2);
        cache.insert("a", "b", 0.1);
        cache.insert("c", "d", 0.2);
        cache.get("a", "b");
        cache.insert("e", "f", 0.3);

        // "a","b" was read most recently but inserted first, so it goes.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", "b"), None);
        assert_eq!(cache.get("c", "d"), Some(0.2));
    }

    #[test]
    fn test_cache_key_is_order_sensitive() {
        let mut matcher = SimilarityMatcher::new();
        matcher.calculate_similarity("abc", "abd");
        matcher.calculate_similarity("abd", "abc");
        assert_eq!(matcher.cache().len(), 2);
        assert_eq!(matcher.cache().misses(), 2);

        matcher.calculate_similarity("abc", "abd");
        assert_eq!(matcher.cache().hits(), 1);
    }
}

//! Deterministic label candidates from a free-text phrase.
//!
//! The generator is a pure function: equal phrase and options always yield
//! the identical ranked list. It tokenizes the phrase, expands token
//! alternatives (KI↔AI, engineering→eng), emits sub-sequences, assembles
//! hyphenated/concatenated label forms, scores them, and ranks the survivors.

use std::collections::HashMap;

use serde::Serialize;

/// Cap on cartesian token-alternative expansion.
const MAX_COMBINATIONS: usize = 16;

// Scoring weights, tuned for short brandable names. The token bonuses favor
// AI-agency phrases; adjust here rather than inline.
const TOKEN_OVERHEAD_PENALTY: i32 = 5;
const HYPHEN_PENALTY: i32 = 2;
const CONCAT_PENALTY: i32 = 3;
const REVERSE_HYPHEN_PENALTY: i32 = 10;
const REVERSE_CONCAT_PENALTY: i32 = 13;
const COMFORT_LENGTH: i32 = 14;
const BONUS_AGENTIC: i32 = 5;
const BONUS_AGENT: i32 = 2;
const BONUS_KI_AI: i32 = 2;

/// Configuration for [`Generator`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Maximum labels returned after ranking
    pub max_labels: usize,
    /// Substitute KI↔AI token variants
    pub replace_ki: bool,
    /// For two-token sequences, also emit reversed variants
    pub reverse2: bool,
    /// Emit hyphen-joined forms in addition to concatenated ones
    pub keep_hyphen: bool,
    /// Tokens shorter than this are dropped
    pub min_token_len: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_labels: 50,
            replace_ki: true,
            reverse2: true,
            keep_hyphen: true,
            min_token_len: 2,
        }
    }
}

/// A candidate DNS label with its ranking score in `[1, 100]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub label: String,
    pub score: i32,
}

/// Phrase-to-labels generator.
#[derive(Debug, Clone)]
pub struct Generator {
    opts: GenerateOptions,
}

impl Generator {
    pub fn new(mut opts: GenerateOptions) -> Self {
        if opts.max_labels == 0 {
            opts.max_labels = 50;
        }
        if opts.min_token_len == 0 {
            opts.min_token_len = 2;
        }
        Self { opts }
    }

    /// Ranked candidate labels for a phrase.
    ///
    /// Order: score descending, then shorter label, then lexicographic;
    /// duplicates keep their higher score.
    pub fn labels(&self, phrase: &str) -> Vec<Candidate> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Vec::new();
        }

        let base_tokens = tokenize(phrase, self.opts.min_token_len);
        if base_tokens.is_empty() {
            return Vec::new();
        }

        let combos = if self.opts.replace_ki {
            expand_ki(&base_tokens)
        } else {
            vec![base_tokens]
        };

        let mut seen: HashMap<String, i32> = HashMap::new();
        let mut add = |label: String, score: i32, seen: &mut HashMap<String, i32>| {
            let label = label.trim_matches('-').to_string();
            if !is_valid_label(&label) {
                return;
            }
            match seen.get(&label) {
                Some(old) if *old >= score => {}
                _ => {
                    seen.insert(label, score);
                }
            }
        };

        for tokens in &combos {
            for seq in sequences(tokens) {
                for expanded in expand_tokens(&seq) {
                    if self.opts.keep_hyphen {
                        let hyphen = expanded.join("-");
                        let score = score_label(&expanded, &hyphen);
                        add(hyphen, score, &mut seen);
                    }

                    let concat = expanded.concat();
                    let score = score_label(&expanded, &concat) - CONCAT_PENALTY;
                    add(concat, score, &mut seen);

                    if self.opts.reverse2 && expanded.len() == 2 {
                        let reversed = [expanded[1].clone(), expanded[0].clone()];
                        if self.opts.keep_hyphen {
                            let rh = reversed.join("-");
                            let score = score_label(&reversed, &rh) - REVERSE_HYPHEN_PENALTY;
                            add(rh, score, &mut seen);
                        }
                        let rc = reversed.concat();
                        let score = score_label(&reversed, &rc) - REVERSE_CONCAT_PENALTY;
                        add(rc, score, &mut seen);
                    }
                }
            }
        }

        let mut out: Vec<Candidate> = seen
            .into_iter()
            .map(|(label, score)| Candidate { label, score })
            .collect();

        out.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.label.len().cmp(&b.label.len()))
                .then(a.label.cmp(&b.label))
        });

        out.truncate(self.opts.max_labels);
        out
    }
}

/// Lowercase ASCII alphanumeric runs; non-ASCII letters and digits act as
/// separators rather than joining neighboring runs.
fn tokenize(s: &str, min_len: usize) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();

    let mut flush = |cur: &mut String, tokens: &mut Vec<String>| {
        if cur.len() >= min_len {
            tokens.push(std::mem::take(cur));
        } else {
            cur.clear();
        }
    };

    for ch in s.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            cur.push(ch);
        } else {
            flush(&mut cur, &mut tokens);
        }
    }
    flush(&mut cur, &mut tokens);
    tokens
}

/// All contiguous sub-sequences worth trying: the full phrase, every 2- and
/// 3-gram, and (for 3–6 tokens) every one-token-removed variant.
fn sequences(tokens: &[String]) -> Vec<Vec<String>> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<Vec<String>> = Vec::new();

    out.push(tokens.to_vec());

    for n in 2..=3usize {
        if tokens.len() < n {
            continue;
        }
        for window in tokens.windows(n) {
            out.push(window.to_vec());
        }
    }

    // Dropping one "glue" word from medium-length phrases.
    if (3..=6).contains(&tokens.len()) {
        for drop in 0..tokens.len() {
            let seq: Vec<String> = tokens
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != drop)
                .map(|(_, t)| t.clone())
                .collect();
            out.push(seq);
        }
    }

    let mut seen = std::collections::HashSet::new();
    out.retain(|seq| seen.insert(seq.join("\0")));
    out
}

/// Cartesian product of per-token alternatives, capped; the all-original
/// combination comes first by construction.
fn cartesian_capped(alts: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut out: Vec<Vec<String>> = Vec::new();
    let mut cur: Vec<String> = Vec::with_capacity(alts.len());

    fn rec(alts: &[Vec<String>], i: usize, cur: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if out.len() >= MAX_COMBINATIONS {
            return;
        }
        if i == alts.len() {
            out.push(cur.clone());
            return;
        }
        for alt in &alts[i] {
            cur.push(alt.clone());
            rec(alts, i + 1, cur, out);
            cur.pop();
        }
    }

    rec(alts, 0, &mut cur, &mut out);
    out
}

fn expand_ki(tokens: &[String]) -> Vec<Vec<String>> {
    let alts: Vec<Vec<String>> = tokens
        .iter()
        .map(|t| match t.as_str() {
            "ki" => vec!["ki".to_string(), "ai".to_string()],
            "ai" => vec!["ai".to_string(), "ki".to_string()],
            _ => vec![t.clone()],
        })
        .collect();
    cartesian_capped(&alts)
}

fn expand_tokens(tokens: &[String]) -> Vec<Vec<String>> {
    let alts: Vec<Vec<String>> = tokens
        .iter()
        .map(|t| match t.as_str() {
            "engineering" => vec!["engineering".to_string(), "eng".to_string()],
            "engineer" => vec!["engineer".to_string(), "eng".to_string()],
            _ => vec![t.clone()],
        })
        .collect();
    cartesian_capped(&alts)
}

fn score_label(tokens: &[String], label: &str) -> i32 {
    let mut score = 100;
    if tokens.len() > 2 {
        score -= TOKEN_OVERHEAD_PENALTY * (tokens.len() as i32 - 2);
    }
    score -= HYPHEN_PENALTY * label.matches('-').count() as i32;
    if label.len() as i32 > COMFORT_LENGTH {
        score -= (label.len() as i32 - COMFORT_LENGTH) / 2;
    }

    for token in tokens {
        match token.as_str() {
            "agentic" => score += BONUS_AGENTIC,
            "agent" => score += BONUS_AGENT,
            "ki" | "ai" => score += BONUS_KI_AI,
            _ => {}
        }
    }

    score.clamp(1, 100)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

// Copyright 2025 Rageval Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Content similarity scoring
//!
//! Documents in this domain mix Latin identifiers, numbers, and CJK
//! prose in the same passage, so word-boundary tokenization alone
//! under-segments. The tokenizer emits Latin runs and numeric runs as
//! single tokens but splits CJK and punctuation per character, then
//! similarity is ROUGE-L recall against the golden text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Latin runs, numeric runs (optional decimal part), punctuation
/// characters, and CJK ideographs, in match priority order.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z]+|\d+\.?\d*|[^\w\s]|[\x{4e00}-\x{9fff}]")
        .unwrap_or_else(|e| panic!("token pattern must compile: {e}"))
});

/// Split mixed-script text into comparison tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Similarity of a candidate passage against the golden text, in [0, 1].
///
/// Short-circuits: either side empty (before trimming) scores 0.0,
/// trimmed-equal scores 1.0, and a candidate that contains the whole
/// golden text scores 1.0. Otherwise ROUGE-L recall: LCS length over
/// the golden token count.
pub fn string_similarity(golden: &str, candidate: &str) -> f64 {
    if golden.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let golden = golden.trim();
    let candidate = candidate.trim();
    if golden == candidate {
        return 1.0;
    }
    if candidate.contains(golden) {
        return 1.0;
    }

    let golden_tokens = tokenize(golden);
    let candidate_tokens = tokenize(candidate);
    if golden_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&golden_tokens, &candidate_tokens);
    lcs as f64 / golden_tokens.len() as f64
}

/// Longest common subsequence length, two-row DP.
fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &token_a in a {
        for (j, &token_b) in b.iter().enumerate() {
            curr[j + 1] = if token_a == token_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

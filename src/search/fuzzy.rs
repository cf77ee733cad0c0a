//! Subsequence matching for path candidates.

const EXACT_SCORE: i32 = 3_000_000;
const PREFIX_SCORE: i32 = 2_000_000;
const SUBSTRING_SCORE: i32 = 1_000_000;
const SUBSEQUENCE_CEILING: i32 = SUBSTRING_SCORE - 1;

const BOUNDARY_BONUS: i32 = 30;
const CONSECUTIVE_BONUS: i32 = 20;

fn is_boundary(prev: Option<char>) -> bool {
    matches!(prev, None | Some('/' | '\\' | ' ' | '_' | '-' | '.'))
}

/// Score `candidate` against `query`, case-insensitively.
///
/// Tiers never overlap: exact match > prefix > contiguous substring >
/// scattered subsequence. Inside a tier, earlier and boundary-aligned hits
/// win. Returns `None` when the query characters do not all appear in order.
pub fn fuzzy_match(candidate: &str, query: &str) -> Option<i32> {
    if query.is_empty() {
        return Some(0);
    }
    let text_lower = candidate.to_lowercase();
    let query_lower = query.to_lowercase();

    if text_lower == query_lower {
        return Some(EXACT_SCORE);
    }

    if text_lower.starts_with(&query_lower) {
        return Some(PREFIX_SCORE + (1000 - text_lower.chars().count() as i32).max(0));
    }

    if let Some(byte_pos) = text_lower.find(&query_lower) {
        let prev = text_lower[..byte_pos].chars().last();
        let pos = text_lower[..byte_pos].chars().count() as i32;
        let boundary = if is_boundary(prev) { 500 } else { 0 };
        return Some(SUBSTRING_SCORE + boundary + (400 - pos).max(0));
    }

    let text_chars: Vec<char> = text_lower.chars().collect();
    let query_chars: Vec<char> = query_lower.chars().collect();

    let mut text_idx = 0;
    let mut query_idx = 0;
    let mut score: i32 = 0;
    let mut prev_matched = false;
    let mut run = 0;

    while text_idx < text_chars.len() && query_idx < query_chars.len() {
        if text_chars[text_idx] == query_chars[query_idx] {
            score += (100 - text_idx as i32).max(1);
            if prev_matched {
                run += 1;
                score += CONSECUTIVE_BONUS * run;
            } else {
                run = 0;
            }

            let prev = text_idx.checked_sub(1).map(|i| text_chars[i]);
            if is_boundary(prev) {
                score += BOUNDARY_BONUS;
            }

            prev_matched = true;
            query_idx += 1;
        } else {
            prev_matched = false;
        }
        text_idx += 1;
    }

    if query_idx == query_chars.len() {
        Some(score.min(SUBSEQUENCE_CEILING))
    } else {
        None
    }
}

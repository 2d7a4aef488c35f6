//! Fuzzy matching of OCR text against keyword dictionaries
//!
//! OCR drops, inserts and confuses characters, so names are compared by the
//! length of their longest common subsequence. The number of tolerated
//! errors grows sub-linearly with the name length.

use ndarray::Array2;

use super::ocr::Word;
use super::GuidMatch;
use crate::catalog::Keywords;

/// Length of the longest common subsequence of `a` and `b`
pub fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut table = Array2::<usize>::zeros((a.len() + 1, b.len() + 1));
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            table[[i + 1, j + 1]] = if ca == cb {
                table[[i, j]] + 1
            } else {
                table[[i, j + 1]].max(table[[i + 1, j]])
            };
        }
    }
    table[[a.len(), b.len()]]
}

/// Shortest common subsequence accepted for strings of `total` characters
pub fn min_lcs_length(total: usize) -> i64 {
    let tolerated = (-0.677 + 1.51 * (total as f64).ln()).round() as i64;
    total as i64 - tolerated
}

fn without_spaces(text: &str) -> Vec<char> {
    text.chars().filter(|c| *c != ' ').collect()
}

/// Best matching dictionary entries for `text`
pub fn match_name(text: &str, dictionary: &Keywords) -> GuidMatch {
    let observed = without_spaces(text);
    let mut best_ratio = 0.0f64;
    let mut candidates = Vec::new();

    for (&guid, keyword) in dictionary {
        let keyword = without_spaces(keyword);
        let total = keyword.len().max(observed.len());
        if total == 0 {
            continue;
        }

        let lcs = lcs_length(&keyword, &observed);
        if (lcs as i64) < min_lcs_length(total) {
            continue;
        }

        let ratio = lcs as f64 / total as f64;
        if ratio == best_ratio {
            candidates.push(guid);
        } else if ratio > best_ratio {
            candidates.clear();
            candidates.push(guid);
            best_ratio = ratio;
        }
    }

    if !candidates.is_empty() {
        log::trace!("'{}' matched {:?} at {:.2}", text, candidates, best_ratio);
    }
    GuidMatch::from_candidates(candidates)
}

/// Name as printed on a single line. Text from the first opening bracket on
/// is a suffix such as a level or count and is dropped.
pub fn name_from_words(words: &[Word]) -> String {
    let mut name = String::new();
    for word in words {
        if let Some(bracket) = word.text.find('(') {
            name.push_str(&word.text[..bracket]);
            break;
        }
        name.push_str(&word.text);
    }
    name
}

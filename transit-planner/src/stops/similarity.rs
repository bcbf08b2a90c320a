//! Approximate string similarity for stop names.

/// Lowercase, replace punctuation with spaces, and sort the words.
///
/// Word order doesn't matter to the score: "Station Flinders Street" and
/// "flinders street station" normalise to the same key.
pub fn token_sort_key(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of two already-normalised keys, 0 to 100.
///
/// `2 * LCS / (len_a + len_b)` over characters, rounded. Either side empty
/// scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let lcs = longest_common_subsequence(&a, &b);
    let total = a.len() + b.len();
    // Rounded integer division; result is at most 100.
    ((200 * lcs + total / 2) / total) as u8
}

/// Score a free-text query against a candidate name.
pub fn token_sort_ratio(query: &str, candidate: &str) -> u8 {
    ratio(&token_sort_key(query), &token_sort_key(candidate))
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

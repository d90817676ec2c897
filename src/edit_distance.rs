// edit_distance.rs - bounded Levenshtein distance used by the matcher and speller
// Callers only care about distances up to 2, so strings whose lengths differ
// by more than that are rejected before the table is built.

/// Returned when the length difference alone rules out a distance <= 2.
pub const TOO_DIFFERENT: usize = 3;

/// Largest length difference for which the full table is computed.
const MAX_LENGTH_GAP: usize = 2;

/// Levenshtein distance between `a` and `b` (unit cost for substitution,
/// insertion and deletion), measured in chars.
///
/// Returns [`TOO_DIFFERENT`] without building the table when the lengths
/// differ by more than two, regardless of the true distance.
pub fn distance(a: &str, b: &str) -> usize {
    let source: Vec<char> = a.chars().collect();
    let target: Vec<char> = b.chars().collect();
    let len1 = source.len();
    let len2 = target.len();

    if len1.abs_diff(len2) > MAX_LENGTH_GAP {
        return TOO_DIFFERENT;
    }
    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0usize; len2 + 1]; len1 + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if source[i - 1] == target[j - 1] { 0 } else { 1 };

            let deletion = matrix[i - 1][j] + 1;
            let insertion = matrix[i][j - 1] + 1;
            let substitution = matrix[i - 1][j - 1] + cost;

            matrix[i][j] = deletion.min(insertion).min(substitution);
        }
    }

    matrix[len1][len2]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings() {
        for word in ["", "a", "hello", "naïve", "straße"] {
            assert_eq!(distance(word, word), 0);
        }
    }

    #[test]
    fn test_kitten_sitting() {
        assert_eq!(distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_sentinel_for_length_gap() {
        // true distance is 4, but the gap check fires first
        assert_eq!(distance("hello", "h"), TOO_DIFFERENT);
        assert_eq!(distance("a", "abcdefgh"), TOO_DIFFERENT);
        assert_eq!(distance("", "abc"), TOO_DIFFERENT);
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(distance("", ""), 0);
        assert_eq!(distance("", "ab"), 2);
        assert_eq!(distance("ab", ""), 2);
    }

    #[test]
    fn test_single_edits() {
        assert_eq!(distance("hello", "helo"), 1);
        assert_eq!(distance("hello", "hallo"), 1);
        assert_eq!(distance("helllo", "hello"), 1);
        assert_eq!(distance("helllo", "help"), 3);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(distance("café", "cafe"), 1);
        assert_eq!(distance("über", "uber"), 1);
    }

    #[test]
    fn test_can_exceed_sentinel_when_lengths_close() {
        assert_eq!(distance("abcd", "wxyz"), 4);
    }
}

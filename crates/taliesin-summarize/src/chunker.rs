//! Whitespace-aligned corpus chunking.
//!
//! [`split_text`] divides a corpus into near-equal contiguous parts whose
//! boundaries never fall inside a word. Candidate split points are spaced
//! evenly by byte length, then advanced forward (never backward) to the next
//! whitespace character, so reassembling the chunks in order reproduces the
//! corpus's word sequence exactly.

/// Split `text` into exactly `num_parts` ordered chunks.
///
/// Each chunk is trimmed of leading and trailing whitespace. The function is
/// fully deterministic. `num_parts <= 1` returns the text unchanged as a
/// single chunk.
///
/// A split point that runs past the end of the text collapses to
/// end-of-string, so the result can contain trailing empty chunks; callers
/// that dispatch work per chunk skip empties.
pub fn split_text(text: &str, num_parts: usize) -> Vec<String> {
    if num_parts <= 1 {
        return vec![text.to_string()];
    }

    let part_length = text.len() / num_parts;
    let mut parts = Vec::with_capacity(num_parts);
    let mut previous = 0;

    for i in 1..num_parts {
        let point = next_whitespace(text, part_length * i);
        // Split points are monotone, but long unbroken words can make two
        // targets collapse onto the same boundary.
        let point = point.max(previous);
        parts.push(text[previous..point].trim().to_string());
        previous = point;
    }
    parts.push(text[previous..].trim().to_string());

    parts
}

/// Advance `target` forward to the next whitespace character or end of
/// string, landing on a UTF-8 character boundary.
fn next_whitespace(text: &str, target: usize) -> usize {
    let mut pos = target.min(text.len());
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    match text[pos..].find(|c: char| c.is_whitespace()) {
        Some(offset) => pos + offset,
        None => text.len(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Words of the original, for reconstruction checks.
    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    /// Words of the reassembled chunks, in chunk order.
    fn reassembled_words(chunks: &[String]) -> Vec<&str> {
        chunks.iter().flat_map(|c| c.split_whitespace()).collect()
    }

    #[test]
    fn test_single_part_is_identity() {
        let text = "  leading whitespace kept  ";
        assert_eq!(split_text(text, 1), vec![text.to_string()]);
    }

    #[test]
    fn test_zero_parts_treated_as_one() {
        assert_eq!(split_text("abc", 0), vec!["abc".to_string()]);
    }

    #[test]
    fn test_nine_words_three_parts() {
        let text = "The quick brown fox jumps over the lazy dog";
        let chunks = split_text(text, 3);

        assert_eq!(chunks.len(), 3);
        assert_eq!(reassembled_words(&chunks), words(text));
        // No chunk boundary falls inside a word.
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert_eq!(chunk.trim(), chunk);
        }
    }

    #[test]
    fn test_reconstruction_across_part_counts() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        for parts in 1..=12 {
            let chunks = split_text(text, parts);
            assert_eq!(chunks.len(), parts);
            assert_eq!(reassembled_words(&chunks), words(text), "parts = {parts}");
        }
    }

    #[test]
    fn test_boundaries_never_split_words() {
        let text = "internationalization considerations notwithstanding brevity wins";
        let chunks = split_text(text, 4);
        let original: Vec<&str> = words(text);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(original.contains(&word), "fragment {word:?} is not a word");
            }
        }
    }

    #[test]
    fn test_long_unbroken_word_collapses_points() {
        // One long word followed by one short one: the middle split points
        // all land on the single space, producing empty chunks.
        let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa b";
        let chunks = split_text(text, 4);
        assert_eq!(chunks.len(), 4);
        assert_eq!(reassembled_words(&chunks), words(text));
        assert!(chunks.iter().any(|c| c.is_empty()));
    }

    #[test]
    fn test_trailing_empty_chunk_at_end_of_string() {
        // Split point past the last whitespace collapses to end-of-string.
        let text = "ab cd";
        let chunks = split_text(text, 5);
        assert_eq!(chunks.len(), 5);
        assert_eq!(reassembled_words(&chunks), words(text));
        assert_eq!(chunks.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_utf8_never_splits_mid_character() {
        let text = "naïve façade über résumé déjà vu — œuvre cœur";
        for parts in 2..=8 {
            let chunks = split_text(text, parts);
            assert_eq!(reassembled_words(&chunks), words(text), "parts = {parts}");
        }
    }

    #[test]
    fn test_tabs_and_newlines_are_boundaries() {
        let text = "one\ttwo\nthree four\r\nfive";
        let chunks = split_text(text, 3);
        assert_eq!(reassembled_words(&chunks), words(text));
    }

    #[test]
    fn test_deterministic() {
        let text = "determinism is a property worth asserting at least once";
        assert_eq!(split_text(text, 4), split_text(text, 4));
    }

    #[test]
    fn test_empty_text() {
        let chunks = split_text("", 3);
        assert_eq!(chunks, vec!["", "", ""]);
    }
}

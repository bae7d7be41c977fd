//! Small text helpers shared by the trace renderer and the bridge.

/// Keep at most `max_chars` characters of `text`.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("hero", 10), "hero");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn long_text_is_cut_at_char_boundary() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("🍕🍕🍕", 2).chars().count(), 2);
    }

    #[test]
    fn exact_length_is_kept() {
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}

//! Small shared helpers.

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A fresh opaque entity id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Cut `text` to at most `max_chars` characters, appending `...` when
/// anything was removed. Never splits a UTF-8 sequence.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_with_ellipsis("short", 100), "short");
        assert_eq!(truncate_with_ellipsis("", 3), "");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        assert_eq!(truncate_with_ellipsis("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        assert_eq!(truncate_with_ellipsis("ééééé", 2), "éé...");
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_now_ms_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}

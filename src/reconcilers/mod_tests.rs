// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reconcilers/mod.rs`

#[cfg(test)]
mod tests {
    use super::super::truncate_message;

    #[test]
    fn test_short_messages_pass_through() {
        assert_eq!(truncate_message("connection refused"), "connection refused");
        assert_eq!(truncate_message(""), "");
    }

    #[test]
    fn test_long_messages_are_truncated_to_200_chars() {
        let long = "x".repeat(500);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), 200);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "å".repeat(300);
        let truncated = truncate_message(&long);
        assert_eq!(truncated.chars().count(), 200);
        assert!(truncated.chars().all(|c| c == 'å'));
    }
}

const MAX_CELL_LENGTH: usize = 60;

/// Shorten text for single-line terminal display. Stored values are never truncated.
pub fn truncate_cell(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() <= MAX_CELL_LENGTH && line.len() == text.len() {
        line.to_string()
    } else {
        let cut: String = line.chars().take(MAX_CELL_LENGTH - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_cell("step 1 failed"), "step 1 failed");
    }

    #[test]
    fn test_long_text_cut() {
        let long = "x".repeat(200);
        let cell = truncate_cell(&long);
        assert_eq!(cell.chars().count(), MAX_CELL_LENGTH);
        assert!(cell.ends_with("..."));
    }

    #[test]
    fn test_multiline_cut_to_first_line() {
        assert_eq!(truncate_cell("first\nsecond"), "first...");
    }
}

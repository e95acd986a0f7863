/// Returns the trimmed value when it holds anything other than whitespace.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// First `max` characters of `text`, for log previews of large payloads.
pub fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  hola ")), Some("hola"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("japón", 4), "japó");
        assert_eq!(preview("ab", 10), "ab");
    }
}

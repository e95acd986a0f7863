//! URL slug generation for titles in any of the supported languages.

use unicode_normalization::UnicodeNormalization;

/// Normalize a title into a URL-safe slug.
///
/// Lowercases, strips diacritics (`"café"` → `"cafe"`), drops anything outside
/// `[a-z0-9]`, whitespace and `-`, then hyphenates whitespace runs and trims
/// stray hyphens. Empty or symbol-only input yields an empty string; callers
/// that require a slug must reject that themselves.
pub fn generate_slug(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        if c.is_whitespace() || c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else {
            slug.push(c);
        }
    }

    slug.trim_matches('-').to_string()
}

/// True when `candidate` is already in the form [`generate_slug`] produces.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty() && generate_slug(candidate) == candidate
}

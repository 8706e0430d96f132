//! Slug and identifier helpers.

/// Generate a URL-safe slug from a string.
///
/// Lower-cases the input and collapses every run of non-alphanumeric
/// characters into a single `-`, trimming dashes at both ends.
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Convert a display name to `snake_case` (`Blog Post` → `blog_post`).
pub fn snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if c.is_uppercase() && prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = c.is_lowercase() || c.is_numeric();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }

    out.trim_end_matches('_').to_string()
}

/// Naive English pluralization of the last word.
pub fn pluralize(s: &str) -> String {
    if s.is_empty() || s.ends_with('s') {
        return s.to_string();
    }

    if let Some(stem) = s.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }

    if s.ends_with('x') || s.ends_with("ch") || s.ends_with("sh") {
        return format!("{s}es");
    }

    format!("{s}s")
}

/// Derive the default locals name for a content type from its CMS name.
pub fn locals_name(content_type_name: &str) -> String {
    pluralize(&snake_case(content_type_name))
}

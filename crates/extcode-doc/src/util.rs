//! Shared string helpers.

use pulldown_cmark::HeadingLevel;

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Convert text to a URL-safe slug used for generated heading ids.
///
/// Lowercases ASCII alphanumerics, collapses whitespace, dashes and underscores
/// into single dashes, and drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Compute a relative URL from one output file to another.
///
/// Both arguments are paths without a leading slash. The last segment of
/// `from` is the current file, so the base directory is everything before it.
///
/// # Examples
///
/// ```
/// use extcode_doc::relative_path;
///
/// assert_eq!(relative_path("guide/install.html", "guide/usage.html"), "usage.html");
/// assert_eq!(relative_path("guide/install.html", "index.html"), "../index.html");
/// ```
#[must_use]
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from.ends_with('/') || from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = "../".repeat(from_dir.len() - common);
    let down = to_segs[common..].join("/");

    let result = format!("{ups}{down}");
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("snake_case name"), "snake-case-name");
    }

    #[test]
    fn test_relative_path_same_dir() {
        assert_eq!(relative_path("a/b.html", "a/c.html"), "c.html");
    }

    #[test]
    fn test_relative_path_up() {
        assert_eq!(relative_path("a/b/c.html", "d.html"), "../../d.html");
    }

    #[test]
    fn test_relative_path_down() {
        assert_eq!(relative_path("index.html", "guide/usage.html"), "guide/usage.html");
    }

    #[test]
    fn test_relative_path_both_empty() {
        assert_eq!(relative_path("", ""), "./");
    }
}

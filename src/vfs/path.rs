//! Path conventions of the virtual filesystem.

pub const SEP: char = '/';

/// Store key for a filesystem path: the path minus one leading separator.
pub fn to_key(path: &str) -> &str {
    path.strip_prefix(SEP).unwrap_or(path)
}

/// Plain separator concatenation, no normalization.
pub fn join(a: &str, b: &str) -> String {
    format!("{}{}{}", a, SEP, b)
}

/// Last non-empty segment of `path`, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEP);
    match trimmed.rfind(SEP) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Prefix that selects the children of a directory key.
pub(crate) fn dir_prefix(key: &str) -> String {
    if key.is_empty() || key.ends_with(SEP) {
        key.to_string()
    } else {
        format!("{}{}", key, SEP)
    }
}

/// Whether `key` is the object `prefix` itself or lies below it. Keeps
/// `a/bc` out of a batch addressed to `a/b`.
pub(crate) fn is_under(key: &str, prefix: &str) -> bool {
    if prefix.is_empty() || prefix.ends_with(SEP) {
        return key.starts_with(prefix);
    }
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(SEP),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_key_strips_one_leading_separator() {
        assert_eq!(to_key("/a/b"), "a/b");
        assert_eq!(to_key("a/b"), "a/b");
        assert_eq!(to_key("/"), "");
    }

    #[test]
    fn test_join_is_plain_concatenation() {
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(join("a/", "b"), "a//b");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/a/b/c.txt"), "c.txt");
        assert_eq!(basename("a/b/"), "b");
        assert_eq!(basename("c"), "c");
    }

    #[test]
    fn test_is_under() {
        assert!(is_under("a/b", "a/b"));
        assert!(is_under("a/b/c", "a/b"));
        assert!(!is_under("a/bc", "a/b"));
        assert!(is_under("a/bc", "a/"));
        assert!(is_under("anything", ""));
    }
}

//! Ant-style glob matching over dot-separated resource paths.
//!
//! Wildcards:
//! - `?` matches a single character within a segment
//! - `*` matches any run of characters within a segment
//! - `**` matches any number of segments, including none

/// Match a resource specifier against a rule's resource pattern.
///
/// An implicit `.**` is appended to the pattern, so a rule for `document`
/// also covers all of its descendants, e.g. `document.metadata.foo`.
pub fn resource_pattern_matches(pattern: &str, resource: &str) -> bool {
    let mut pattern_parts: Vec<&str> = pattern.split('.').collect();
    pattern_parts.push("**");

    let resource_parts: Vec<&str> = resource.split('.').collect();

    match_parts(&pattern_parts, &resource_parts)
}

fn match_parts(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            // consume zero segments, or one and retry
            match_parts(&pattern[1..], path)
                || (!path.is_empty() && match_parts(pattern, &path[1..]))
        }
        Some(part) => {
            !path.is_empty()
                && match_segment(part, path[0])
                && match_parts(&pattern[1..], &path[1..])
        }
    }
}

/// Match a single path segment against a segment pattern containing `*` and
/// `?` wildcards.
fn match_segment(pattern: &str, segment: &str) -> bool {
    fn matches(pattern: &[char], segment: &[char]) -> bool {
        match pattern.first() {
            None => segment.is_empty(),
            Some('*') => {
                matches(&pattern[1..], segment)
                    || (!segment.is_empty() && matches(pattern, &segment[1..]))
            }
            Some('?') => !segment.is_empty() && matches(&pattern[1..], &segment[1..]),
            Some(c) => segment.first() == Some(c) && matches(&pattern[1..], &segment[1..]),
        }
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let segment: Vec<char> = segment.chars().collect();
    matches(&pattern, &segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        exact = { "document", "document", true },
        descendant = { "document", "document.metadata.foo", true },
        not_a_prefix_match = { "document", "other.document", false },
        partial_segment = { "doc", "document", false },
        any = { "*", "anything.at.all", true },
        any_single = { "*", "anything", true },
    )]
    fn implicit_descendant_matching(pattern: &str, resource: &str, expected: bool) {
        assert_eq!(resource_pattern_matches(pattern, resource), expected);
    }

    #[parameterized(
        question_mark = { "document.metadata.ba?", "document.metadata.bar", true },
        question_mark_alternative = { "document.metadata.ba?", "document.metadata.baz", true },
        question_mark_too_long = { "document.metadata.ba?", "document.metadata.barn", false },
        star_suffix = { "document.metadata.*-claims", "document.metadata.id-claims", true },
        star_suffix_no_match = { "document.metadata.*-claims", "document.metadata.claims", false },
        star_within_segment = { "document.me*ta", "document.metadata", true },
        star_within_segment_no_match = { "document.me*tb", "document.metadata", false },
        double_star = { "document.**", "document.a.b.c", true },
        double_star_zero_segments = { "document.**", "document", true },
        double_star_in_middle = { "document.**.id", "document.a.b.id", true },
        double_star_in_middle_direct = { "document.**.id", "document.id", true },
    )]
    fn wildcard_matching(pattern: &str, resource: &str, expected: bool) {
        assert_eq!(resource_pattern_matches(pattern, resource), expected);
    }
}

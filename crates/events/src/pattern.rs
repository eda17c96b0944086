//! Interest matching for subscribers.
//!
//! Patterns are shell globs without path handling: `*` matches any run of
//! characters (dots included), `?` matches exactly one character and every
//! other character is literal. `item.*` therefore matches `item.created` and
//! `item.photo.added`.

/// Glob match of `text` against `pattern`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // Position of the last `*` seen and the text index it was tried at.
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || (p[pi] != '*' && p[pi] == t[ti])) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

/// True when `event` matches any interest pattern, or the list is empty.
pub fn is_interested(interests: &[String], event: &str) -> bool {
    interests.is_empty()
        || interests
            .iter()
            .any(|pattern| pattern == event || glob_match(pattern, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn star_spans_dots() {
        assert!(glob_match("item.*", "item.created"));
        assert!(glob_match("item.*", "item.photo.added"));
        assert!(glob_match("*.created", "item.created"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("item.*", "budget.created"));
        assert!(!glob_match("item.*", "item"));
    }

    #[test]
    fn question_mark_is_single_char() {
        assert!(glob_match("item.wor?", "item.worn"));
        assert!(!glob_match("item.wor?", "item.wor"));
        assert!(!glob_match("item.wor?", "item.worns"));
    }

    #[test]
    fn other_characters_are_literal() {
        assert!(glob_match("item.[a]", "item.[a]"));
        assert!(!glob_match("item.[a]", "item.a"));
        assert!(!glob_match("item.created", "itemXcreated"));
    }

    #[test]
    fn empty_interest_list_matches_everything() {
        assert!(is_interested(&[], "anything.at_all"));
        let interests = vec!["budget.*".to_string(), "purchase.made".to_string()];
        assert!(is_interested(&interests, "purchase.made"));
        assert!(is_interested(&interests, "budget.warning"));
        assert!(!is_interested(&interests, "item.created"));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 1000,
            ..ProptestConfig::default()
        })]

        #[test]
        fn literal_pattern_matches_only_itself(name in "[a-z.]{0,16}", other in "[a-z.]{0,16}") {
            prop_assert!(glob_match(&name, &name));
            prop_assert_eq!(glob_match(&name, &other), name == other);
        }

        #[test]
        fn prefix_star_matches_any_suffix(prefix in "[a-z]{1,8}", suffix in "[a-z.]{0,12}") {
            let pattern = format!("{prefix}.*");
            let event = format!("{prefix}.{suffix}");
            prop_assert!(glob_match(&pattern, &event));
        }
    }
}

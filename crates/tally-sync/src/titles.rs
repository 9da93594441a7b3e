//! Replacement titles for duplicate-title conflicts.

use chrono::NaiveDateTime;
use tally_core::validation::MAX_TITLE_CHARS;

/// Numbered variants offered before the date-based ones.
pub const NUMBERED_SUGGESTIONS: u32 = 3;

/// Strip a trailing `" (n)"` counter, if present.
fn base_title(title: &str) -> &str {
    let trimmed = title.trim_end();
    let counter_start = trimmed.rfind(" (").filter(|&open| {
        trimmed[open + 2..]
            .strip_suffix(')')
            .is_some_and(|inner| !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()))
    });
    counter_start.map_or(trimmed, |open| trimmed[..open].trim_end())
}

/// `"{base} {suffix}"`, with `base` cut short so the whole fits the title limit.
fn with_suffix(base: &str, suffix: &str) -> String {
    let room = MAX_TITLE_CHARS.saturating_sub(suffix.chars().count() + 1);
    let base: String = base.chars().take(room).collect();
    format!("{} {suffix}", base.trim_end())
}

/// `"Title (n)"`. An existing counter on `title` is replaced, not stacked,
/// so `numbered_title("Plan (2)", 3)` is `"Plan (3)"`.
#[must_use]
pub fn numbered_title(title: &str, n: u32) -> String {
    with_suffix(base_title(title), &format!("({n})"))
}

/// Alternatives for `title`, most preferred first: numbered variants, then a
/// date-suffixed one, then a timestamp-suffixed one.
#[must_use]
pub fn suggest_titles(title: &str, now: NaiveDateTime) -> Vec<String> {
    let base = base_title(title);
    let mut suggestions: Vec<String> = (2..2 + NUMBERED_SUGGESTIONS)
        .map(|n| numbered_title(base, n))
        .collect();
    suggestions.push(with_suffix(base, &format!("({})", now.format("%Y-%m-%d"))));
    suggestions.push(with_suffix(
        base,
        &format!("({})", now.format("%Y-%m-%d %H:%M:%S")),
    ));
    suggestions.retain(|s| s != title);
    suggestions.dedup();
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap()
    }

    #[rstest]
    #[case("My Plan", 2, "My Plan (2)")]
    #[case("My Plan (2)", 3, "My Plan (3)")]
    #[case("My Plan (draft)", 2, "My Plan (draft) (2)")]
    #[case("Budget 2026", 2, "Budget 2026 (2)")]
    #[case("(1)", 2, "(1) (2)")]
    fn numbering(#[case] title: &str, #[case] n: u32, #[case] expected: &str) {
        assert_eq!(numbered_title(title, n), expected);
    }

    #[test]
    fn numbered_title_respects_the_length_limit() {
        let long = "x".repeat(MAX_TITLE_CHARS);
        let numbered = numbered_title(&long, 12);
        assert_eq!(numbered.chars().count(), MAX_TITLE_CHARS);
        assert!(numbered.ends_with(" (12)"));
    }

    #[test]
    fn suggestions_in_preference_order() {
        assert_eq!(
            suggest_titles("My Plan", noon()),
            vec![
                "My Plan (2)",
                "My Plan (3)",
                "My Plan (4)",
                "My Plan (2026-03-14)",
                "My Plan (2026-03-14 12:30:05)",
            ]
        );
    }

    #[test]
    fn suggestions_never_repeat_the_conflicting_title() {
        let suggestions = suggest_titles("My Plan (3)", noon());
        assert!(!suggestions.contains(&"My Plan (3)".to_string()));
        assert_eq!(suggestions[0], "My Plan (2)");
    }
}

//! Input patterns, as administrators type them in HTML `pattern` attributes.
//!
//! Fragments are anchored as `\A(?:fragment)\z`: the whole value must match,
//! and a trailing newline is never skipped over. Fragments the `regex` engine
//! cannot express (lookaround, backreferences) are compiled with
//! `fancy-regex` instead.
use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone)]
enum Matcher {
    Plain(Regex),
    Backtracking(fancy_regex::Regex),
}

/// A fragment compiled to match whole strings only.
#[derive(Debug, Clone)]
pub struct InputPattern {
    source: String,
    matcher: Matcher,
}

impl InputPattern {
    /// Returns `None`, after a warning, when the fragment is not a valid
    /// expression for either engine; the check is then skipped.
    pub fn compile(fragment: &str, template_label: &str) -> Option<Self> {
        let anchored = format!(r"\A(?:{fragment})\z");
        let matcher = match Regex::new(&anchored) {
            Ok(regex) => Matcher::Plain(regex),
            Err(plain_err) => match fancy_regex::Regex::new(&anchored) {
                Ok(regex) => Matcher::Backtracking(regex),
                Err(err) => {
                    warn!(
                        pattern = fragment,
                        template = template_label,
                        error = %err,
                        regex_error = %plain_err,
                        "input_pattern_unusable"
                    );
                    return None;
                }
            },
        };
        Some(Self {
            source: fragment.to_string(),
            matcher,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the whole text matches. A backtracking pattern that gives up
    /// on a text counts as a mismatch.
    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Plain(regex) => regex.is_match(text),
            Matcher::Backtracking(regex) => match regex.is_match(text) {
                Ok(matched) => matched,
                Err(err) => {
                    warn!(pattern = %self.source, error = %err, "input_pattern_gave_up");
                    false
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(fragment: &str) -> InputPattern {
        let Some(pattern) = InputPattern::compile(fragment, "Book") else {
            panic!("{fragment:?} compiles");
        };
        pattern
    }

    #[test]
    fn anchors_the_whole_value() {
        let pattern = compiled("[A-Z]{3}-[0-9]{4}");
        assert!(pattern.is_match("ABC-1234"));
        assert!(!pattern.is_match("abc-1234"));
        assert!(!pattern.is_match("xABC-1234"));
        assert!(!pattern.is_match("ABC-12345"));
    }

    #[test]
    fn trailing_newline_does_not_match() {
        let pattern = compiled("[A-Z]{3}-[0-9]{4}");
        assert!(!pattern.is_match("ABC-1234\n"));
        assert!(!compiled("(?=.*[0-9])[a-z0-9]{4}").is_match("ab12\n"));
    }

    #[test]
    fn alternation_stays_inside_the_anchors() {
        let pattern = compiled("yes|no");
        assert!(pattern.is_match("no"));
        assert!(!pattern.is_match("nope"));
    }

    #[test]
    fn lookahead_requires_a_digit() {
        let pattern = compiled("(?=.*[0-9])[a-z0-9]{4}");
        assert!(pattern.is_match("ab12"));
        assert!(!pattern.is_match("abcd"));
        assert!(!pattern.is_match("ab123"));
    }

    #[test]
    fn negative_lookahead_and_backreference() {
        let no_test = compiled("(?!test)[a-z]+");
        assert!(no_test.is_match("sample"));
        assert!(!no_test.is_match("testing"));

        let doubled = compiled("([a-z])\\1");
        assert!(doubled.is_match("aa"));
        assert!(!doubled.is_match("ab"));
    }

    #[test]
    fn unusable_pattern_is_skipped() {
        assert!(InputPattern::compile("(unclosed", "Book").is_none());
        assert!(InputPattern::compile("[z-a]", "Book").is_none());
        assert!(InputPattern::compile("(?=unclosed", "Book").is_none());
    }

    #[test]
    fn delimiter_characters_need_no_escaping() {
        assert!(compiled("a/b#c~d").is_match("a/b#c~d"));
    }
}

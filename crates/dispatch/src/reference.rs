//! Reference extraction from single chat tokens.
//!
//! Matchers are tried in a fixed order and the first hit wins:
//!
//! 1. issue / pull request: `#12345` (5+ digits) or `[1234]` (4+ digits)
//! 2. bracketed file: `[path/to/file.ext]`, optionally `[file.ext#L42]`
//! 3. commit: `^a1b2c3` (5 to 40 hex digits or `~`)
//!
//! The order matters because the patterns overlap: `[1234]` is an issue
//! reference even though a digits-only bracket could be read as a file.

use std::sync::LazyLock;

use regex::Regex;

/// A reference found in one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceMatch {
    /// Digits as written; may exceed any integer width.
    Issue(String),
    File { path: String, line: Option<String> },
    Commit(String),
}

static ISSUE_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"#(\d{5,})|\[(\d{4,})\]"));

static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\[([^\[\]#\s]*\.[^\[\]#\s]*)(?:#L?(\d+)?)?\]"));

static COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\^([0-9a-fA-F~]{5,40})"));

static COMMIT_HASH_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9a-fA-F~]{5,40}$"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // Patterns are string literals above; a failure here is a programming error.
    Regex::new(pattern).expect("reference pattern must compile")
}

type Matcher = fn(&str) -> Option<ReferenceMatch>;

/// Matchers in precedence order.
const MATCHERS: &[Matcher] = &[match_issue, match_file, match_commit];

/// Classify one whitespace-free token. Returns the first matching rule's
/// result, or `None` when no rule matches.
pub fn classify(token: &str) -> Option<ReferenceMatch> {
    MATCHERS.iter().find_map(|matcher| matcher(token))
}

pub fn match_issue(token: &str) -> Option<ReferenceMatch> {
    let caps = ISSUE_RE.captures(token)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    Some(ReferenceMatch::Issue(digits.as_str().to_string()))
}

pub fn match_file(token: &str) -> Option<ReferenceMatch> {
    let caps = FILE_RE.captures(token)?;
    Some(ReferenceMatch::File {
        path: caps.get(1)?.as_str().to_string(),
        line: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

pub fn match_commit(token: &str) -> Option<ReferenceMatch> {
    let caps = COMMIT_RE.captures(token)?;
    Some(ReferenceMatch::Commit(caps.get(1)?.as_str().to_string()))
}

/// Whole-argument form of a commit reference, without the `^`.
pub fn is_commit_hash(arg: &str) -> bool {
    COMMIT_HASH_RE.is_match(arg)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn issue(digits: &str) -> ReferenceMatch {
        ReferenceMatch::Issue(digits.into())
    }

    fn file(path: &str, line: Option<&str>) -> ReferenceMatch {
        ReferenceMatch::File {
            path: path.into(),
            line: line.map(Into::into),
        }
    }

    #[rstest]
    #[case("#12345", Some(issue("12345")))]
    #[case("[1234]", Some(issue("1234")))]
    #[case("(#54321),", Some(issue("54321")))]
    #[case("#1234", None)]
    #[case("[123]", None)]
    #[case("[src/main.c#L42]", Some(file("src/main.c", Some("42"))))]
    #[case("[src/main.c#42]", Some(file("src/main.c", Some("42"))))]
    #[case("[src/main.c]", Some(file("src/main.c", None)))]
    #[case("[code/game/atoms.dm]", Some(file("code/game/atoms.dm", None)))]
    #[case("[README]", None)]
    #[case("^a1b2c3", Some(ReferenceMatch::Commit("a1b2c3".into())))]
    #[case("^HEAD~", None)]
    #[case("^abcd", None)]
    #[case("^ABCDEF~1", Some(ReferenceMatch::Commit("ABCDEF~1".into())))]
    #[case("hello", None)]
    #[case("", None)]
    fn classifies_tokens(#[case] token: &str, #[case] expected: Option<ReferenceMatch>) {
        assert_eq!(classify(token), expected);
    }

    #[test]
    fn issue_rule_wins_over_file_rule() {
        // Matches both the issue and the file rule; issue comes first.
        let token = "[a.dm]#12345";
        assert!(match_file(token).is_some());
        assert_eq!(classify(token), Some(issue("12345")));
    }

    #[test]
    fn file_rule_wins_over_commit_rule() {
        let token = "[a.dm]^abcdef";
        assert!(match_commit(token).is_some());
        assert_eq!(classify(token), Some(file("a.dm", None)));
    }

    #[test]
    fn digits_only_bracket_is_an_issue_not_a_file() {
        assert_eq!(match_file("[1234]"), None);
        assert_eq!(classify("[1234]"), Some(issue("1234")));
    }

    #[test]
    fn commit_is_capped_at_forty_characters() {
        let long = format!("^{}", "a".repeat(45));
        assert_eq!(classify(&long), Some(ReferenceMatch::Commit("a".repeat(40))));
    }

    #[rstest]
    #[case("a1b2c3", true)]
    #[case("ABCDEF~1", true)]
    #[case("abcd", false)]
    #[case("../../../../user", false)]
    #[case("a1b2c3/../x", false)]
    #[case("a1b2c3?per_page=1", false)]
    fn commit_hash_argument(#[case] arg: &str, #[case] expected: bool) {
        assert_eq!(is_commit_hash(arg), expected);
    }

    #[test]
    fn overflowing_issue_number_still_wins_precedence() {
        let digits = "123456789012345678901234";
        assert_eq!(classify(&format!("#{digits}")), Some(issue(digits)));
        let token = format!("[a.c]#{digits}");
        assert!(match_file(&token).is_some());
        assert_eq!(classify(&token), Some(issue(digits)));
    }
}

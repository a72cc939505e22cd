//! Extension-specific content checks and the change-ratio heuristic.
//!
//! Pure functions over in-memory content; the validator layers filesystem
//! state checks on top of these.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Findings from checking one piece of content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

static DEBUG_PRINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"console\.(log|debug|trace)\s*\(").unwrap());

static EMPTY_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\(\s*\)").unwrap());

/// Run the checks appropriate for the file's extension.
///
/// Unknown extensions produce an empty report; content-type checks only
/// exist for the formats an agent commonly touches.
pub fn check_content(path: &str, content: &str) -> ContentReport {
    let mut report = ContentReport::default();
    let Some(extension) = extension(path) else {
        return report;
    };

    match extension.as_str() {
        ext if SCRIPT_EXTENSIONS.contains(&ext) => check_script(content, &mut report),
        "json" => {
            if let Err(err) = serde_json::from_str::<serde_json::Value>(content) {
                report.errors.push(format!("Invalid JSON: {err}"));
            }
        }
        "yaml" | "yml" => {
            if let Some(line) = first_tab_line(content) {
                report.errors.push(format!(
                    "literal tab character at line {line} (YAML forbids tabs for indentation)"
                ));
            }
        }
        "md" | "markdown" => {
            let empty_links = EMPTY_LINK_RE.find_iter(content).count();
            if empty_links > 0 {
                report
                    .warnings
                    .push(format!("{empty_links} markdown link(s) with an empty target"));
            }
        }
        _ => {}
    }
    report
}

fn check_script(content: &str, report: &mut ContentReport) {
    if let Some(error) = scan_brackets(content) {
        report.errors.push(error);
    }

    let debug_prints = content
        .lines()
        .filter(|line| DEBUG_PRINT_RE.is_match(line) && !line.contains("debug-ok"))
        .count();
    if debug_prints > 0 {
        report.warnings.push(format!(
            "{debug_prints} debug print statement(s) left in place \
             (mark intentional ones with `debug-ok`)"
        ));
    }

    let todos = content.matches("TODO").count();
    if todos > 0 {
        report.warnings.push(format!("{todos} TODO marker(s)"));
    }
}

/// Bracket-balance scan that understands string literals, line comments, and
/// block comments.
///
/// Returns the first problem found: an unmatched closer immediately, or the
/// innermost unclosed opener at end of input.
fn scan_brackets(content: &str) -> Option<String> {
    #[derive(PartialEq, Clone, Copy)]
    enum State {
        Code,
        Single,
        Double,
        Backtick,
        LineComment,
        BlockComment,
    }

    let mut state = State::Code;
    let mut escaped = false;
    let mut line = 1u32;
    let mut stack: Vec<(char, u32)> = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '\'' => state = State::Single,
                '"' => state = State::Double,
                '`' => state = State::Backtick,
                '/' => match chars.peek() {
                    Some('/') => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some('*') => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => {}
                },
                '(' | '[' | '{' => stack.push((c, line)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((opener, _)) if opener == expected => {}
                        _ => return Some(format!("unmatched '{c}' at line {line}")),
                    }
                }
                _ => {}
            },
            State::Single | State::Double | State::Backtick => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else {
                    let closing = match state {
                        State::Single => c == '\'',
                        State::Double => c == '"',
                        _ => c == '`',
                    };
                    // Only template literals span lines; a newline ends a
                    // plain string state even if unterminated.
                    if closing || (state != State::Backtick && c == '\n') {
                        state = State::Code;
                    }
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
        }
        if c == '\n' {
            line += 1;
            escaped = false;
        }
    }

    stack
        .pop()
        .map(|(opener, opened_at)| format!("unclosed '{opener}' opened at line {opened_at}"))
}

/// Fraction of lines touched by a change.
///
/// Symmetric difference of the two versions' trimmed-line sets over
/// `2 * max(line counts)`. A set heuristic, not a diff: duplicate lines
/// collapse, so the ratio can over- or under-count around repeated lines.
pub fn change_ratio(original: &str, new: &str) -> f64 {
    let original_lines: HashSet<&str> = original.lines().map(str::trim).collect();
    let new_lines: HashSet<&str> = new.lines().map(str::trim).collect();

    let removed = original_lines.difference(&new_lines).count();
    let added = new_lines.difference(&original_lines).count();
    let denominator = 2 * original.lines().count().max(new.lines().count());

    if denominator == 0 {
        return 0.0;
    }
    (removed + added) as f64 / denominator as f64
}

fn first_tab_line(content: &str) -> Option<usize> {
    content
        .lines()
        .position(|line| line.contains('\t'))
        .map(|index| index + 1)
}

fn extension(path: &str) -> Option<String> {
    std::path::Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_parens_report_character_and_line() {
        let report = check_content("src/f.ts", "function f() { return (1; }");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("unmatched '}'"));
        assert!(report.errors[0].contains("line 1"));
    }

    #[test]
    fn unclosed_opener_reports_innermost() {
        let report = check_content("src/f.ts", "function f() {\n  if (x) {\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("unclosed '{'"));
        assert!(report.errors[0].contains("line 2"));
    }

    #[test]
    fn brackets_inside_strings_and_comments_are_ignored() {
        let content = r#"
const a = "(["; // ) stray closer in comment
/* { */
const b = `)`;
const c = '}';
"#;
        let report = check_content("src/a.js", content);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        let report = check_content("src/a.ts", r#"const s = "a\"("; f();"#);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn debug_prints_and_todos_warn() {
        let content = "console.log(x);\nconsole.log(y); // debug-ok\n// TODO tidy\n";
        let report = check_content("src/a.ts", content);
        assert!(report.errors.is_empty());
        assert!(report.warnings.iter().any(|w| w.contains("1 debug print")));
        assert!(report.warnings.iter().any(|w| w.contains("1 TODO")));
    }

    #[test]
    fn valid_json_has_no_errors() {
        let report = check_content("pkg.json", r#"{"a":1}"#);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn truncated_json_reports_invalid() {
        let report = check_content("pkg.json", r#"{"a":1"#);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Invalid JSON"));
    }

    #[test]
    fn yaml_tab_is_an_error_with_line() {
        let report = check_content("ci.yml", "jobs:\n\tbuild: x\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("line 2"));
    }

    #[test]
    fn markdown_empty_links_are_counted() {
        let report = check_content("README.md", "[docs]() and [home](https://x) and [faq]( )");
        assert_eq!(
            report.warnings,
            vec!["2 markdown link(s) with an empty target".to_string()]
        );
    }

    #[test]
    fn unknown_extension_is_unchecked() {
        let report = check_content("data.bin", "((((");
        assert_eq!(report, ContentReport::default());
    }

    #[test]
    fn identical_content_has_zero_ratio() {
        assert_eq!(change_ratio("a\nb\nc", "a\nb\nc"), 0.0);
    }

    #[test]
    fn full_rewrite_has_ratio_one() {
        let ratio = change_ratio("a\nb", "c\nd");
        assert!((ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn small_edit_has_small_ratio() {
        let original = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj";
        let new = "a\nb\nc\nd\ne\nf\ng\nh\ni\nk";
        let ratio = change_ratio(original, new);
        assert!(ratio <= 0.2, "ratio was {ratio}");
    }

    #[test]
    fn empty_both_sides_is_zero() {
        assert_eq!(change_ratio("", ""), 0.0);
    }
}

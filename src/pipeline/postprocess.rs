//! Post-processing: deterministic cleanup of extracted and recognised text.
//!
//! Text pulled from a PDF text layer or produced by OCR carries artefacts
//! that look fine in a viewer but wrong in a Word document:
//!
//! - typographic ligatures (`ﬁ`, `ﬂ`) stored as single code points
//! - form feeds and other control characters between pages
//! - zero-width spaces, BOMs and soft hyphens
//! - runs of spaces left over from justified layouts
//! - words hyphenated across a line break
//!
//! Each rule is a small pure function so it can be tested on its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised before control characters are stripped (so a
//! lone `\r` survives as a newline) and ligatures are expanded before
//! whitespace is collapsed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a block of text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF), form feeds become newlines
/// 2. Strip control characters other than `\n` and `\t`
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, …)
/// 4. Expand typographic ligatures
/// 5. Collapse horizontal whitespace runs to one space, trim each line
/// 6. Collapse 3+ consecutive newlines down to 2
/// 7. Trim the whole block
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_control_chars(&s);
    let s = remove_invisible_chars(&s);
    let s = expand_ligatures(&s);
    let s = collapse_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

/// Join the lines of one paragraph into running text.
///
/// A line ending in a hyphen directly after a letter, followed by a line
/// starting with a lowercase letter, is treated as a word split across the
/// break: the hyphen is dropped and the halves are joined. Every other line
/// break becomes a single space.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if out.is_empty() {
            out.push_str(line);
            continue;
        }
        if is_split_word(&out, line) {
            out.pop();
        } else {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

fn is_split_word(before: &str, after: &str) -> bool {
    let mut tail = before.chars().rev();
    let hyphen = tail.next() == Some('-');
    let letter_before = tail.next().is_some_and(char::is_alphabetic);
    let lower_after = after.chars().next().is_some_and(char::is_lowercase);
    hyphen && letter_before && lower_after
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace(['\r', '\u{000C}'], "\n")
}

// ── Rule 2: Strip control characters ─────────────────────────────────────────

fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────

static RE_INVISIBLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}\u{FFFE}]").unwrap()
});

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").to_string()
}

// ── Rule 4: Expand ligatures ─────────────────────────────────────────────────

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

fn expand_ligatures(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expanded)) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    out
}

// ── Rule 5: Collapse horizontal whitespace ───────────────────────────────────

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| RE_HSPACE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 6: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_and_form_feeds() {
        assert_eq!(clean_text("a\r\nb\rc\u{000C}d"), "a\nb\nc\nd");
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(clean_text("he\u{0007}llo\u{0000}"), "hello");
    }

    #[test]
    fn test_invisible_chars_removed() {
        assert_eq!(clean_text("\u{FEFF}zero\u{200B}width\u{00AD}"), "zerowidth");
    }

    #[test]
    fn test_ligatures_expanded() {
        assert_eq!(clean_text("\u{FB01}nal \u{FB02}ow e\u{FB03}cient"), "final flow efficient");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean_text("  a   b\t\tc  \n d "), "a b c\nd");
    }

    #[test]
    fn test_blank_lines_collapsed() {
        assert_eq!(clean_text("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(" \n\u{000C}\n "), "");
    }

    #[test]
    fn test_join_lines_dehyphenates() {
        assert_eq!(join_lines(&["The conver-", "sion works"]), "The conversion works");
    }

    #[test]
    fn test_join_lines_keeps_real_hyphens() {
        assert_eq!(join_lines(&["well-", "Known"]), "well- Known");
        assert_eq!(join_lines(&["range 1 -", "five"]), "range 1 - five");
        assert_eq!(join_lines(&["a", "", "b"]), "a b");
    }
}

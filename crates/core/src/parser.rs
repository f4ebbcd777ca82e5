//! Plain-text question bank parser.
//!
//! A bank is a sequence of blocks separated by lines made of 35 or more
//! underscores. A block holds a numbered question line followed by three
//! option lines; the correct option is prefixed with `*`:
//!
//! ```text
//! 12. What color is the sky?
//! * blue
//! red
//! green
//! ___________________________________
//! ```
//!
//! Parsing is best-effort: blocks that do not have that shape are skipped and
//! never abort the parse.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{AnswerOption, OPTIONS_PER_QUESTION, Question, QuestionId};

/// How many leading lines of a block may precede the numbered question line.
const QUESTION_LINE_WINDOW: usize = 3;

/// A block needs a question line plus three options.
const MIN_BLOCK_LINES: usize = 1 + OPTIONS_PER_QUESTION;

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*_{35,}[ \t]*\r?$").expect("separator pattern is valid")
});

static QUESTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)\s*\.(.*)$").expect("question line pattern is valid")
});

/// Outcome of parsing a corpus, with counters for what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub questions: Vec<Question>,
    /// Non-empty blocks found between separators.
    pub blocks: usize,
    /// Blocks that did not have the question + three options shape.
    pub skipped: usize,
    /// Well-formed blocks dropped because their id was already seen.
    pub duplicates: usize,
}

/// Parse raw corpus text into questions in first-occurrence order.
#[must_use]
pub fn parse(raw: &str) -> Vec<Question> {
    parse_report(raw).questions
}

/// Parse raw corpus text and report how many blocks were skipped or deduplicated.
#[must_use]
pub fn parse_report(raw: &str) -> ParseReport {
    let mut report = ParseReport::default();
    let mut seen = HashSet::new();

    for block in SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|block| !block.is_empty())
    {
        report.blocks += 1;
        match parse_block(block) {
            Some(question) if seen.insert(question.id()) => report.questions.push(question),
            Some(_) => report.duplicates += 1,
            None => report.skipped += 1,
        }
    }

    report
}

fn parse_block(block: &str) -> Option<Question> {
    let lines: Vec<&str> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < MIN_BLOCK_LINES {
        return None;
    }

    let (position, id, text) = lines
        .iter()
        .take(QUESTION_LINE_WINDOW)
        .enumerate()
        .find_map(|(idx, line)| {
            let caps = QUESTION_LINE.captures(line)?;
            Some((idx, caps.get(1)?.as_str(), caps.get(2)?.as_str()))
        })?;

    let id = id.parse::<u64>().ok().filter(|id| *id > 0)?;

    let option_lines = lines.get(position + 1..position + 1 + OPTIONS_PER_QUESTION)?;
    let options = [
        parse_option(0, option_lines[0]),
        parse_option(1, option_lines[1]),
        parse_option(2, option_lines[2]),
    ];

    Some(Question::new(QuestionId::new(id), text.trim(), options))
}

fn parse_option(ordinal: u8, line: &str) -> AnswerOption {
    match line.strip_prefix('*') {
        Some(rest) => AnswerOption::new(ordinal, rest.trim_start(), true),
        None => AnswerOption::new(ordinal, line, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sep() -> String {
        "_".repeat(35)
    }

    #[test]
    fn parses_documented_example() {
        let raw = format!("12. What color is the sky?\n* blue\nred\ngreen\n{}\n", sep());
        let questions = parse(&raw);

        let expected = Question::new(
            QuestionId::new(12),
            "What color is the sky?",
            [
                AnswerOption::new(0, "blue", true),
                AnswerOption::new(1, "red", false),
                AnswerOption::new(2, "green", false),
            ],
        );
        assert_eq!(questions, vec![expected]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = format!(
            "1. A?\n*a\nb\nc\n{s}\n2. B?\na\n* b\nc\n{s}\n",
            s = sep()
        );
        assert_eq!(parse(&raw), parse(&raw));
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let raw = format!(
            "5. First?\n*a\nb\nc\n{s}\n5. Second?\nx\ny\n*z\n{s}\n6. Other?\n*a\nb\nc",
            s = sep()
        );
        let report = parse_report(&raw);

        assert_eq!(report.questions.len(), 2);
        assert_eq!(report.duplicates, 1);
        let first = &report.questions[0];
        assert_eq!(first.id(), QuestionId::new(5));
        assert_eq!(first.text(), "First?");
        assert!(first.is_correct(0));
    }

    #[test]
    fn short_separator_does_not_split() {
        let raw = format!("1. A?\n*a\nb\nc\n{}\n2. B?\n*a\nb\nc", "_".repeat(34));
        let report = parse_report(&raw);
        assert_eq!(report.blocks, 1);
        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].id(), QuestionId::new(1));
    }

    #[test]
    fn skips_blocks_with_too_few_lines() {
        let raw = format!("1. A?\n*a\nb\n{s}\n2. B?\n*a\nb\nc", s = sep());
        let report = parse_report(&raw);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].id(), QuestionId::new(2));
    }

    #[test]
    fn question_line_may_follow_up_to_two_header_lines() {
        let raw = "Chapter 1\nSection A\n7 . Late question?\n*yes\nno\nmaybe";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id(), QuestionId::new(7));
        assert_eq!(questions[0].text(), "Late question?");
    }

    #[test]
    fn question_line_outside_window_is_skipped() {
        let raw = "a\nb\nc\n8. Too late?\n*x\ny\nz";
        assert!(parse(raw).is_empty());
    }

    #[test]
    fn block_without_three_options_after_question_is_skipped() {
        let raw = "header\nother\n3. Q?\n*a\nb";
        assert!(parse(raw).is_empty());
    }

    #[test]
    fn extra_lines_after_three_options_are_ignored() {
        let raw = "4. Q?\na\n*b\nc\nd\ne";
        let questions = parse(raw);
        assert_eq!(questions.len(), 1);
        let texts: Vec<&str> = questions[0]
            .options()
            .iter()
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(questions[0].is_correct(1));
    }

    #[test]
    fn zero_and_oversized_ids_are_skipped() {
        let raw = format!(
            "0. Zero?\n*a\nb\nc\n{s}\n99999999999999999999999. Big?\n*a\nb\nc",
            s = sep()
        );
        let report = parse_report(&raw);
        assert!(report.questions.is_empty());
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn keeps_cyrillic_and_handles_crlf() {
        let raw = format!(
            "15. Какого цвета небо?\r\n*  синего\r\nкрасного\r\nзелёного\r\n{}\r\n",
            sep()
        );
        let questions = parse(&raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text(), "Какого цвета небо?");
        assert_eq!(questions[0].options()[0].text, "синего");
        assert!(questions[0].options()[0].is_correct);
    }

    #[test]
    fn option_star_is_only_a_marker_at_line_start() {
        let raw = "9. Q?\na*b\n*c\nd";
        let questions = parse(raw);
        assert_eq!(questions[0].options()[0].text, "a*b");
        assert!(!questions[0].options()[0].is_correct);
        assert!(questions[0].is_correct(1));
    }

    #[test]
    fn garbage_input_yields_empty_bank() {
        assert!(parse("").is_empty());
        assert!(parse("just some text\nwithout structure").is_empty());
        assert!(parse(&sep()).is_empty());
    }
}

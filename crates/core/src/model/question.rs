use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::ids::QuestionId;
use crate::parser;

/// Number of answer options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 3;

//
// ─── ANSWER OPTION ─────────────────────────────────────────────────────────────
//

/// One of the three answers offered for a question.
///
/// `id` is the ordinal position in the source text (0, 1, 2) and is independent
/// of the order in which options are later displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: u8,
    pub text: String,
    pub is_correct: bool,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: u8, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_correct,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A parsed multiple-choice question. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: [AnswerOption; OPTIONS_PER_QUESTION],
}

impl Question {
    #[must_use]
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: [AnswerOption; OPTIONS_PER_QUESTION],
    ) -> Self {
        Self {
            id,
            text: text.into(),
            options,
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption; OPTIONS_PER_QUESTION] {
        &self.options
    }

    /// Returns the option with the given ordinal, if any.
    #[must_use]
    pub fn option(&self, option_id: u8) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Returns true if the option with the given ordinal is marked correct.
    ///
    /// Unknown ordinals and questions without a marked answer score as incorrect.
    #[must_use]
    pub fn is_correct(&self, option_id: u8) -> bool {
        self.option(option_id).is_some_and(|option| option.is_correct)
    }

    /// Returns true if at least one option is marked correct.
    #[must_use]
    pub fn has_correct_option(&self) -> bool {
        self.options.iter().any(|option| option.is_correct)
    }
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// The immutable universe of questions for one corpus load.
///
/// Iteration order is first-occurrence order in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    questions: Vec<Question>,
    positions: HashMap<QuestionId, usize>,
}

impl Bank {
    /// Parse raw corpus text into a bank. Never fails; malformed blocks are skipped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::from_questions(parser::parse(raw))
    }

    /// Build a bank from questions, keeping only the first occurrence of each id.
    #[must_use]
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut seen = HashSet::new();
        let questions: Vec<Question> = questions
            .into_iter()
            .filter(|question| seen.insert(question.id()))
            .collect();
        let positions = questions
            .iter()
            .enumerate()
            .map(|(idx, question)| (question.id(), idx))
            .collect();
        Self {
            questions,
            positions,
        }
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.positions.get(&id).map(|&idx| &self.questions[idx])
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.positions.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Question ids in bank order.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(Question::id)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64, text: &str, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            text,
            [
                AnswerOption::new(0, "a", correct == 0),
                AnswerOption::new(1, "b", correct == 1),
                AnswerOption::new(2, "c", correct == 2),
            ],
        )
    }

    #[test]
    fn bank_keeps_first_occurrence_of_duplicate_ids() {
        let bank = Bank::from_questions(vec![
            question(3, "first", 0),
            question(1, "other", 1),
            question(3, "second", 2),
        ]);

        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(QuestionId::new(3)).unwrap().text(), "first");
        let ids: Vec<u64> = bank.ids().map(|id| id.value()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn question_scores_options_by_flag() {
        let q = question(7, "q", 1);
        assert!(q.is_correct(1));
        assert!(!q.is_correct(0));
        assert!(!q.is_correct(9));
        assert!(q.has_correct_option());
    }

    #[test]
    fn question_without_marked_answer_scores_everything_incorrect() {
        let q = Question::new(
            QuestionId::new(1),
            "q",
            [
                AnswerOption::new(0, "a", false),
                AnswerOption::new(1, "b", false),
                AnswerOption::new(2, "c", false),
            ],
        );
        assert!(!q.has_correct_option());
        assert!((0..3).all(|id| !q.is_correct(id)));
    }

    #[test]
    fn empty_bank_is_valid() {
        let bank = Bank::parse("");
        assert!(bank.is_empty());
        assert!(bank.get(QuestionId::new(1)).is_none());
    }
}

use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{AnswerOption, OPTIONS_PER_QUESTION, Question, QuestionId};

/// Identifies one showing of a question.
///
/// Deferred callbacks remember the token they were scheduled for and are
/// ignored once a newer presentation (or a reset) has replaced it.
pub type PresentationToken = u64;

/// A question as currently shown: options in a freshly shuffled order.
///
/// `order[i]` is the index into `Question::options()` displayed at position `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    question_id: QuestionId,
    order: [usize; OPTIONS_PER_QUESTION],
    token: PresentationToken,
}

impl Presentation {
    /// Shuffle the options of `question` uniformly.
    pub fn shuffled<R: Rng + ?Sized>(
        question: &Question,
        token: PresentationToken,
        rng: &mut R,
    ) -> Self {
        let mut order = [0, 1, 2];
        order.as_mut_slice().shuffle(rng);
        Self {
            question_id: question.id(),
            order,
            token,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn token(&self) -> PresentationToken {
        self.token
    }

    #[must_use]
    pub fn order(&self) -> [usize; OPTIONS_PER_QUESTION] {
        self.order
    }

    /// The option shown at display position `index`.
    #[must_use]
    pub fn option_at<'q>(&self, question: &'q Question, index: usize) -> Option<&'q AnswerOption> {
        let source = *self.order.get(index)?;
        question.options().get(source)
    }

    /// Options in display order.
    pub fn options<'q>(&self, question: &'q Question) -> impl Iterator<Item = &'q AnswerOption> {
        let options = question.options();
        self.order.into_iter().map(move |source| &options[source])
    }
}

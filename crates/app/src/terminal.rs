//! Line-oriented terminal front end.
//!
//! One `select!` loop owns the session. Stdin lines become actions; tokens
//! from the auto-advance channel move on after a mastered question. Every
//! action is persisted before the next event is read.

use std::io::{self, Write};
use std::time::Duration;

use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

use quiz_core::model::MASTERY_THRESHOLD;
use services::{
    AnswerOutcome, AnswerRecord, AutoAdvance, PresentationToken, QuizSession, Rejection,
    Selection, SessionError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Start,
    /// 0-based display index.
    Choose(usize),
    Next,
    Reset,
    Stats,
    Help,
    Quit,
}

impl Action {
    /// Options are typed 1-based.
    pub(crate) fn parse(line: &str) -> Option<Self> {
        let action = match line.trim().to_lowercase().as_str() {
            "s" | "start" => Self::Start,
            "n" | "next" => Self::Next,
            "r" | "reset" => Self::Reset,
            "t" | "stats" => Self::Stats,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => {
                let n: usize = other.parse().ok()?;
                Self::Choose(n.checked_sub(1)?)
            }
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

pub(crate) struct Terminal<R, W> {
    session: QuizSession<R>,
    auto_advance: AutoAdvance,
    tx: UnboundedSender<PresentationToken>,
    out: W,
}

impl<R: Rng, W: Write> Terminal<R, W> {
    pub(crate) fn new(
        session: QuizSession<R>,
        auto_advance: AutoAdvance,
        tx: UnboundedSender<PresentationToken>,
        out: W,
    ) -> Self {
        Self {
            session,
            auto_advance,
            tx,
            out,
        }
    }

    pub(crate) fn session(&self) -> &QuizSession<R> {
        &self.session
    }

    pub(crate) fn is_auto_advance_pending(&self) -> bool {
        self.auto_advance.is_pending()
    }

    /// Greeting, or the resumed question.
    pub(crate) fn welcome(&mut self) -> io::Result<()> {
        let progress = self.session.progress();
        writeln!(
            self.out,
            "{} questions loaded, {} still to master.",
            progress.total, progress.active
        )?;
        if self.session.current_question().is_some() {
            writeln!(self.out, "Resuming where you left off.")?;
            self.show_question()?;
        } else if progress.is_finished && progress.total > 0 {
            writeln!(self.out, "Everything is mastered. Type r to start over.")?;
        } else {
            writeln!(self.out, "Type s to start, h for help.")?;
        }
        self.prompt()
    }

    pub(crate) async fn handle(&mut self, action: Action) -> Result<Flow, SessionError> {
        debug!(?action, "terminal action");
        let result = match action {
            Action::Start => {
                self.auto_advance.cancel();
                let selection = self.session.start().await?;
                self.show_selection(selection)
            }
            Action::Choose(index) => {
                let outcome = self.session.choose_option(index).await?;
                self.show_answer(outcome)
            }
            Action::Next => {
                self.auto_advance.cancel();
                let selection = self.session.advance().await?;
                self.show_selection(selection)
            }
            Action::Reset => {
                self.auto_advance.cancel();
                self.session.reset().await?;
                writeln!(self.out, "Progress cleared. Type s to start.")
            }
            Action::Stats => self.show_stats(),
            Action::Help => self.show_help(),
            Action::Quit => {
                self.auto_advance.cancel();
                return Ok(Flow::Quit);
            }
        };
        self.finish_output(result);
        Ok(Flow::Continue)
    }

    /// Deferred move-on after a mastery event.
    pub(crate) async fn auto_advance(
        &mut self,
        token: PresentationToken,
    ) -> Result<(), SessionError> {
        if let Some(selection) = self.session.advance_if_current(token).await? {
            let result = self.show_selection(selection);
            self.finish_output(result);
        }
        Ok(())
    }

    pub(crate) fn unknown(&mut self, line: &str) {
        let result = writeln!(self.out, "Unknown command {:?}. Type h for help.", line.trim());
        self.finish_output(result);
    }

    fn finish_output(&mut self, result: io::Result<()>) {
        // a closed stdout is not a session error
        if let Err(err) = result.and_then(|()| self.prompt()) {
            debug!(error = %err, "terminal write failed");
        }
    }

    fn prompt(&mut self) -> io::Result<()> {
        let progress = self.session.progress();
        write!(
            self.out,
            "[{}] {}/{} > ",
            progress.elapsed, progress.completed, progress.total
        )?;
        self.out.flush()
    }

    fn show_selection(&mut self, selection: Selection) -> io::Result<()> {
        match selection {
            Selection::Selected(_) => self.show_question(),
            Selection::Finished => {
                let progress = self.session.progress();
                writeln!(self.out)?;
                writeln!(self.out, "All questions mastered!")?;
                writeln!(
                    self.out,
                    "{} answers, {}% correct, time {}.",
                    progress.total_answers, progress.accuracy_percent, progress.elapsed
                )?;
                writeln!(self.out, "Type r to start over or q to quit.")
            }
            Selection::Rejected(reason) => self.show_rejection(reason),
        }
    }

    fn show_question(&mut self) -> io::Result<()> {
        let (Some(question), Some(presentation)) = (
            self.session.current_question(),
            self.session.presentation(),
        ) else {
            return Ok(());
        };
        let streak = self
            .session
            .state()
            .progress_for(question.id())
            .map_or(0, |p| p.consecutive_correct());

        writeln!(self.out)?;
        writeln!(
            self.out,
            "#{} ({streak}/{MASTERY_THRESHOLD}) {}",
            question.id(),
            question.text()
        )?;
        for (position, option) in presentation.options(question).enumerate() {
            writeln!(self.out, "  {}) {}", position + 1, option.text)?;
        }
        Ok(())
    }

    fn show_answer(&mut self, outcome: AnswerOutcome) -> io::Result<()> {
        let record = match outcome {
            AnswerOutcome::Recorded(record) => record,
            AnswerOutcome::Rejected(reason) => return self.show_rejection(reason),
        };
        if record.correct {
            writeln!(self.out, "Correct!")?;
        } else {
            self.show_correct_option()?;
        }
        self.after_answer(record)
    }

    fn show_correct_option(&mut self) -> io::Result<()> {
        let correct = self
            .session
            .current_question()
            .zip(self.session.presentation())
            .and_then(|(question, presentation)| {
                presentation
                    .options(question)
                    .enumerate()
                    .find(|(_, option)| option.is_correct)
                    .map(|(position, option)| (position + 1, option.text.clone()))
            });
        match correct {
            Some((position, text)) => {
                writeln!(self.out, "Wrong. The answer was {position}) {text}")
            }
            None => writeln!(self.out, "Wrong. No option is marked correct."),
        }
    }

    fn after_answer(&mut self, record: AnswerRecord) -> io::Result<()> {
        if !record.newly_excluded {
            return writeln!(self.out, "Type n for the next question.");
        }
        writeln!(self.out, "Mastered! Moving on...")?;
        if let Some(presentation) = self.session.presentation() {
            self.auto_advance
                .schedule(presentation.token(), self.tx.clone());
        }
        Ok(())
    }

    fn show_rejection(&mut self, reason: Rejection) -> io::Result<()> {
        let message = match reason {
            Rejection::NoCurrentQuestion => "No question is on screen. Type s to start.",
            Rejection::AlreadyStarted => "Already started.",
            Rejection::AlreadyAnswered => "Already answered. Type n for the next question.",
            Rejection::InvalidOption { .. } => "Pick one of the listed options.",
            Rejection::NotCurrent { .. } | Rejection::Excluded { .. } => {
                "That question is not current."
            }
        };
        writeln!(self.out, "{message}")
    }

    fn show_stats(&mut self) -> io::Result<()> {
        let p = self.session.progress();
        writeln!(self.out, "Mastered:  {}/{} ({}%)", p.completed, p.total, p.percent)?;
        writeln!(self.out, "Remaining: {}", p.active)?;
        writeln!(
            self.out,
            "Answers:   {} ({} correct, {}%)",
            p.total_answers, p.correct_answers, p.accuracy_percent
        )?;
        writeln!(self.out, "Time:      {}", p.elapsed)
    }

    fn show_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "s  start          1-3  choose an option")?;
        writeln!(self.out, "n  next question  r    reset all progress")?;
        writeln!(self.out, "t  stats          q    quit")
    }
}

/// Drive `session` from stdin until quit or end of input.
pub async fn run<R: Rng>(
    session: QuizSession<R>,
    delay: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut terminal = Terminal::new(session, AutoAdvance::new(delay), tx, io::stdout());
    terminal.welcome()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    terminal.finish_output(Ok(()));
                    continue;
                }
                match Action::parse(&line) {
                    Some(action) => {
                        if terminal.handle(action).await? == Flow::Quit {
                            break;
                        }
                    }
                    None => terminal.unknown(&line),
                }
            }
            Some(token) = rx.recv() => terminal.auto_advance(token).await?,
        }
    }
    debug!("terminal loop finished");
    Ok(())
}

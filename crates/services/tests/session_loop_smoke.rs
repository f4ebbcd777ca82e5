use rand::SeedableRng;
use rand::rngs::StdRng;

use quiz_core::time::fixed_now;
use services::{
    AnswerOutcome, AppServices, Clock, FileCorpus, QuizLaunch, QuizSession, Selection,
    StaticCorpus,
};

const CORPUS: &str = "\
Раздел 1
12. What color is the sky?
* blue
red
green
___________________________________________
13. Столица России?
Киев
* Москва
Минск
___________________________________________
broken block without a number
a
b
c
___________________________________________
12. Duplicate id, ignored
x
* y
z
";

fn rngs(seed: u64) -> (StdRng, StdRng) {
    (
        StdRng::seed_from_u64(seed),
        StdRng::seed_from_u64(seed.wrapping_add(1)),
    )
}

async fn open(services: &AppServices, seed: u64) -> QuizSession<StdRng> {
    let (select, shuffle) = rngs(seed);
    match services
        .open_quiz(&StaticCorpus::new(CORPUS), select, shuffle)
        .await
        .unwrap()
    {
        QuizLaunch::Ready(session) => session,
        QuizLaunch::LoadFailed(reason) => panic!("load failed: {reason}"),
    }
}

fn correct_index(session: &QuizSession<StdRng>) -> usize {
    let question = session.current_question().unwrap();
    session
        .presentation()
        .unwrap()
        .options(question)
        .position(|o| o.is_correct)
        .unwrap()
}

#[tokio::test]
async fn session_loop_runs_to_completion_and_resumes() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let mut session = open(&services, 3).await;

    assert_eq!(session.bank().len(), 2);
    assert_eq!(
        session
            .bank()
            .get(quiz_core::model::QuestionId::new(12))
            .unwrap()
            .text(),
        "What color is the sky?"
    );

    assert!(matches!(session.start().await.unwrap(), Selection::Selected(_)));

    // answer a few, then "restart the process"
    for _ in 0..3 {
        let idx = correct_index(&session);
        assert!(matches!(
            session.choose_option(idx).await.unwrap(),
            AnswerOutcome::Recorded(_)
        ));
        session.advance().await.unwrap();
    }
    let answered_before = session.stats().total_answers();
    let current_before = session.state().current_question_id;
    drop(session);

    let mut session = open(&services, 4).await;
    assert_eq!(session.stats().total_answers(), answered_before);
    assert_eq!(session.state().current_question_id, current_before);

    let mut presentations = 0;
    while session.current_question().is_some() {
        let idx = correct_index(&session);
        session.choose_option(idx).await.unwrap();
        session.advance().await.unwrap();
        presentations += 1;
        assert!(presentations <= 10);
    }

    assert!(session.is_finished());
    let progress = session.progress();
    assert_eq!(progress.completed, 2);
    assert_eq!(progress.percent, 100);
    assert_eq!(progress.total_answers, 10);
    assert_eq!(progress.accuracy_percent, 100);
}

#[tokio::test]
async fn missing_corpus_file_is_a_terminal_load_error() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let source = FileCorpus::new(std::env::temp_dir().join("quiz-does-not-exist-8f3a.txt"));
    let (select, shuffle) = rngs(1);

    let launch = services.open_quiz(&source, select, shuffle).await.unwrap();
    assert!(matches!(launch, QuizLaunch::LoadFailed(_)));
}

#[tokio::test]
async fn reset_through_services_clears_persisted_state() {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    let mut session = open(&services, 9).await;
    session.start().await.unwrap();
    let idx = correct_index(&session);
    session.choose_option(idx).await.unwrap();

    session.reset().await.unwrap();
    drop(session);

    let session = open(&services, 10).await;
    assert_eq!(session.stats().total_answers(), 0);
    assert_eq!(session.progress().active, 2);
    assert!(session.current_question().is_none());
}

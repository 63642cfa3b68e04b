use drill_core::history::HistoryManager;
use drill_core::timecalc::{self, CalculationRecord, TimeOperation};
use drill_core::{
    parse_answer, Drill, DrillHistory, FileStore, NoopBackend, Operation, Problem, SaveOutcome,
    SoundManager, TimeError,
};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> FileStore {
    FileStore::open(dir.path()).unwrap()
}

#[test]
fn addition_set_answered_correctly_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let mut drill = Drill::new(Operation::Addition, open_store(&dir));
        let generator = drill.generator_mut();
        for q in generator.generate_question_set() {
            assert!((1.0..=9.0).contains(&q.first_operand));
            assert!((1.0..=9.0).contains(&q.second_operand));
        }

        loop {
            let typed = generator.current_question().unwrap().expected_answer.to_string();
            let answer = parse_answer(&typed).unwrap();
            assert!(generator.set_user_answer(answer));
            if !generator.has_next_question() {
                break;
            }
            generator.next_question();
        }
        assert_eq!(generator.correct_answers_count(), 10);

        let summary = drill.complete();
        assert_eq!(summary.saved, SaveOutcome::Saved);
    }

    let reopened = Drill::new(Operation::Addition, open_store(&dir));
    let stats = reopened.history().statistics();
    assert_eq!(stats.total_records, 10);
    assert_eq!(stats.correct_answers, 10);
    assert_eq!(stats.accuracy, 100);
    assert_eq!(stats.average_score, 10.0);
}

#[test]
fn history_cap_holds_across_many_sets() {
    let dir = TempDir::new().unwrap();
    let mut drill = Drill::new(
        Operation::Division {
            allow_decimals: false,
        },
        open_store(&dir),
    );

    let mut last_set: Vec<Problem> = Vec::new();
    for _ in 0..7 {
        let generator = drill.generator_mut();
        generator.generate_question_set();
        loop {
            let q = generator.current_question().unwrap();
            assert_eq!(q.first_operand % q.second_operand, 0.0);
            let expected = q.expected_answer;
            generator.set_user_answer(expected);
            if generator.next_question().is_none() {
                break;
            }
        }
        last_set = generator.questions().to_vec();
        drill.complete();
    }

    let DrillHistory::Problems(history) = drill.history() else {
        panic!("division keeps problem records");
    };
    let all = history.get_all();
    assert_eq!(all.len(), 50);
    // newest first: the last set saved, in reverse order
    let newest: Vec<i64> = all.iter().take(10).map(|p| p.id).collect();
    let expected: Vec<i64> = last_set.iter().rev().map(|p| p.id).collect();
    assert_eq!(newest, expected);
}

#[test]
fn export_then_import_into_fresh_directory() {
    let source_dir = TempDir::new().unwrap();
    let mut source = Drill::new(Operation::Subtraction, open_store(&source_dir));
    source.generator_mut().generate_question_set();
    source.generator_mut().set_user_answer(0.0);
    source.complete();
    let exported = source.history().export().unwrap();

    let target_dir = TempDir::new().unwrap();
    let mut target = Drill::new(Operation::Subtraction, open_store(&target_dir));
    assert!(target.history().is_empty());
    assert_eq!(target.history_mut().import(&exported).unwrap(), 1);
    assert_eq!(
        target.history().statistics().total_questions,
        source.history().statistics().total_questions
    );
}

#[test]
fn sound_preference_is_per_variant_and_durable() {
    let dir = TempDir::new().unwrap();
    {
        let mut sounds = SoundManager::new(
            open_store(&dir),
            Operation::Addition.sound_key(),
            Box::new(NoopBackend),
        );
        assert!(!sounds.toggle_sound());
    }

    let addition = SoundManager::new(
        open_store(&dir),
        Operation::Addition.sound_key(),
        Box::new(NoopBackend),
    );
    let division = SoundManager::new(
        open_store(&dir),
        Operation::Division {
            allow_decimals: true,
        }
        .sound_key(),
        Box::new(NoopBackend),
    );
    assert!(!addition.is_sound_enabled());
    assert!(division.is_sound_enabled());
}

#[test]
fn time_calculator_scenario() {
    assert_eq!(timecalc::add("01:30:00", "00:45:00").unwrap(), "02:15:00");
    assert_eq!(
        timecalc::divide("01:00:00", 0.0),
        Err(TimeError::DivisionByZero)
    );

    let dir = TempDir::new().unwrap();
    let mut history: HistoryManager<_, CalculationRecord> =
        HistoryManager::new(open_store(&dir), timecalc::calculation_policy());
    let result = timecalc::calculate("00:20:00", TimeOperation::Multiply, "3").unwrap();
    history.save(CalculationRecord::new(
        "00:20:00",
        TimeOperation::Multiply,
        "3",
        result,
    ));
    assert_eq!(history.get_all()[0].summary(), "00:20:00 × 3 = 01:00:00");
}

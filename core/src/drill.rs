use log::info;

use crate::error::HistoryError;
use crate::generator::Generator;
use crate::history::{
    HistoryManager, HistoryRecord, HistoryStatistics, SaveOutcome, SessionRecord,
};
use crate::operation::{Operation, RecordKind};
use crate::problem::Problem;
use crate::store::KeyValueStore;

/// A variant's history, in whichever record shape it stores.
pub enum DrillHistory<S> {
    Problems(HistoryManager<S, Problem>),
    Sessions(HistoryManager<S, SessionRecord>),
}

impl<S: KeyValueStore> DrillHistory<S> {
    pub fn for_operation(operation: Operation, store: S) -> Self {
        let policy = operation.history_policy();
        match operation.record_kind() {
            RecordKind::Problem => DrillHistory::Problems(HistoryManager::new(store, policy)),
            RecordKind::Session => DrillHistory::Sessions(HistoryManager::new(store, policy)),
        }
    }

    pub fn statistics(&self) -> HistoryStatistics {
        match self {
            DrillHistory::Problems(h) => h.statistics(),
            DrillHistory::Sessions(h) => h.statistics(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DrillHistory::Problems(h) => h.get_all().len(),
            DrillHistory::Sessions(h) => h.get_all().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recent_lines(&self, count: usize, symbol: char) -> Vec<String> {
        fn lines<R: HistoryRecord>(records: Vec<R>, symbol: char) -> Vec<String> {
            records.iter().map(|r| r.describe(symbol)).collect()
        }
        match self {
            DrillHistory::Problems(h) => lines(h.get_recent(count), symbol),
            DrillHistory::Sessions(h) => lines(h.get_recent(count), symbol),
        }
    }

    pub fn clear(&mut self) {
        match self {
            DrillHistory::Problems(h) => h.clear(),
            DrillHistory::Sessions(h) => h.clear(),
        }
    }

    pub fn export(&self) -> Result<String, HistoryError> {
        match self {
            DrillHistory::Problems(h) => h.export(),
            DrillHistory::Sessions(h) => h.export(),
        }
    }

    pub fn import(&mut self, json: &str) -> Result<usize, HistoryError> {
        match self {
            DrillHistory::Problems(h) => h.import(json),
            DrillHistory::Sessions(h) => h.import(json),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrillSummary {
    pub correct: usize,
    pub total: usize,
    pub saved: SaveOutcome,
}

/// One exercise: a generator plus the history its finished sets go to.
pub struct Drill<S> {
    generator: Generator,
    history: DrillHistory<S>,
}

impl<S: KeyValueStore> Drill<S> {
    pub fn new(operation: Operation, store: S) -> Self {
        Self {
            generator: Generator::new(operation),
            history: DrillHistory::for_operation(operation, store),
        }
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut Generator {
        &mut self.generator
    }

    pub fn history(&self) -> &DrillHistory<S> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut DrillHistory<S> {
        &mut self.history
    }

    /// Flushes the current set into history: graded problems one record
    /// each, or the whole set as a session.
    pub fn complete(&mut self) -> DrillSummary {
        let questions = self.generator.questions();
        let correct = self.generator.correct_answers_count();
        let total = questions.len();

        let saved = match &mut self.history {
            DrillHistory::Problems(h) => {
                h.save_batch(questions.iter().filter(|q| q.is_graded()).cloned())
            }
            DrillHistory::Sessions(h) => h.save(SessionRecord::from_questions(questions)),
        };

        info!(
            "{} set finished: {correct}/{total} ({saved:?})",
            self.generator.operation().name()
        );
        DrillSummary {
            correct,
            total,
            saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn answer_all(drill: &mut Drill<MemoryStore>, correctly: bool) {
        let generator = drill.generator_mut();
        generator.generate_question_set();
        loop {
            let expected = generator.current_question().unwrap().expected_answer;
            let given = if correctly { expected } else { expected + 1.0 };
            generator.set_user_answer(given);
            if generator.next_question().is_none() {
                break;
            }
        }
    }

    #[test]
    fn test_problem_history_gets_each_graded_problem() {
        let mut drill = Drill::new(Operation::Addition, MemoryStore::new());
        answer_all(&mut drill, true);
        let summary = drill.complete();
        assert_eq!(summary.correct, 10);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.saved, SaveOutcome::Saved);
        assert_eq!(drill.history().len(), 10);
        assert_eq!(drill.history().statistics().accuracy, 100);
    }

    #[test]
    fn test_ungraded_problems_are_not_saved() {
        let mut drill = Drill::new(Operation::Multiplication, MemoryStore::new());
        drill.generator_mut().generate_question_set();
        let expected = drill.generator().current_question().unwrap().expected_answer;
        drill.generator_mut().set_user_answer(expected);
        drill.complete();
        assert_eq!(drill.history().len(), 1);
    }

    #[test]
    fn test_subtraction_saves_one_session() {
        let mut drill = Drill::new(Operation::Subtraction, MemoryStore::new());
        answer_all(&mut drill, false);
        let summary = drill.complete();
        assert_eq!(summary.correct, 0);
        assert!(matches!(drill.history(), DrillHistory::Sessions(_)));
        assert_eq!(drill.history().len(), 1);
        let lines = drill.history().recent_lines(5, '−');
        assert!(lines[0].contains("Score: 0/10"));
    }

    #[test]
    fn test_history_is_a_copy() {
        let mut drill = Drill::new(Operation::Addition, MemoryStore::new());
        answer_all(&mut drill, true);
        drill.complete();
        drill.generator_mut().set_user_answer(-1.0);

        let DrillHistory::Problems(history) = drill.history() else {
            panic!("addition keeps problem records");
        };
        assert!(history.get_all().iter().all(|p| p.is_correct == Some(true)));
    }

    #[test]
    fn test_subtraction_quota_failure_keeps_newest_twelve() {
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        let set: Vec<Problem> = (0..10)
            .map(|id| Problem::new(id, Operation::Subtraction, 9, 4, at))
            .collect();
        let stored: Vec<SessionRecord> = (0..50)
            .map(|n| SessionRecord {
                timestamp: at - Duration::minutes(n),
                ..SessionRecord::from_questions(&set)
            })
            .collect();

        let key = Operation::Subtraction.history_policy().storage_key;
        let mut store = MemoryStore::new();
        store
            .set(&key, &serde_json::to_string(&stored).unwrap())
            .unwrap();
        // room for about twelve sessions, far short of fifty
        let twelve = serde_json::to_string(&stored[..12]).unwrap().len();
        let store = store.with_quota(twelve + 2_000);

        let mut drill = Drill::new(Operation::Subtraction, store);
        answer_all(&mut drill, true);
        assert_eq!(drill.complete().saved, SaveOutcome::Trimmed { kept: 12 });

        let DrillHistory::Sessions(history) = drill.history() else {
            panic!("subtraction keeps session records");
        };
        let kept = history.get_all();
        assert_eq!(kept.len(), 12);
        assert_eq!(kept[0].score, 10);
        let older: Vec<_> = kept[1..].iter().map(|s| s.timestamp).collect();
        let newest_stored: Vec<_> = stored[..11].iter().map(|s| s.timestamp).collect();
        assert_eq!(older, newest_stored);
    }
}

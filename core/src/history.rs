use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HistoryError;
use crate::problem::Problem;
use crate::store::KeyValueStore;

/// Where a history lives and how large it may grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPolicy {
    pub exercise_type: String,
    pub storage_key: String,
    pub capacity: usize,
    /// Records kept when the store reports a quota failure.
    pub quota_keep: usize,
}

impl HistoryPolicy {
    pub fn new(
        exercise_type: impl Into<String>,
        storage_key: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            exercise_type: exercise_type.into(),
            storage_key: storage_key.into(),
            capacity,
            quota_keep: capacity / 2,
        }
    }

    pub fn with_quota_keep(mut self, quota_keep: usize) -> Self {
        self.quota_keep = quota_keep.min(self.capacity);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    String,
    Array,
}

impl FieldKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::String => value.is_string(),
            FieldKind::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTally {
    pub questions: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// Anything a [`HistoryManager`] can persist.
pub trait HistoryRecord: Serialize + DeserializeOwned + Clone {
    /// Fields an imported record must carry, with their JSON type.
    const REQUIRED_FIELDS: &'static [(&'static str, FieldKind)];

    fn tally(&self) -> RecordTally;

    /// One-line description for history lists.
    fn describe(&self, symbol: char) -> String;

    /// Sessions carry a whole-set score; other records have none.
    fn score(&self) -> Option<usize> {
        None
    }

    /// Builds a record from an imported entry. Entries missing a required
    /// field are rejected; optional fields that are absent or unreadable
    /// take their defaults.
    fn from_import(value: &Value) -> Option<Self>;
}

/// The entry's object when it carries every required field with the right
/// JSON type.
pub fn required_fields<R: HistoryRecord>(value: &Value) -> Option<&Map<String, Value>> {
    let object = value.as_object()?;
    R::REQUIRED_FIELDS
        .iter()
        .all(|(name, kind)| object.get(*name).is_some_and(|v| kind.matches(v)))
        .then_some(object)
}

/// Reads an imported timestamp written as RFC 3339, a bare `YYYY-MM-DD`
/// date or epoch milliseconds. Anything else becomes the import time.
pub fn import_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
            .map(|at| at.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|at| Utc.from_utc_datetime(&at))
            }),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    };
    parsed.unwrap_or_else(Utc::now)
}

fn import_count(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round() as usize)
}

impl HistoryRecord for Problem {
    const REQUIRED_FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("firstOperand", FieldKind::Number),
        ("secondOperand", FieldKind::Number),
        ("expectedAnswer", FieldKind::Number),
    ];

    fn tally(&self) -> RecordTally {
        RecordTally {
            questions: 1,
            correct: usize::from(self.is_correct == Some(true)),
            incorrect: usize::from(self.is_correct == Some(false)),
        }
    }

    fn from_import(value: &Value) -> Option<Self> {
        let object = required_fields::<Self>(value)?;
        let number = |name: &str| object.get(name).and_then(Value::as_f64);
        Some(Self {
            id: object.get("id").and_then(Value::as_i64).unwrap_or_default(),
            first_operand: number("firstOperand")?,
            second_operand: number("secondOperand")?,
            expected_answer: number("expectedAnswer")?,
            user_answer: number("userAnswer"),
            is_correct: object.get("isCorrect").and_then(Value::as_bool),
            revealed: object
                .get("revealed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            created_at: import_timestamp(object.get("timestamp")),
        })
    }

    fn describe(&self, symbol: char) -> String {
        let verdict = match (self.is_correct, self.user_answer) {
            _ if self.revealed => "shown".to_string(),
            (Some(true), _) => "✓".to_string(),
            (Some(false), Some(given)) => format!("✗ you said {given}"),
            _ => "unanswered".to_string(),
        };
        format!(
            "{} {} {} = {}  ({})",
            self.first_operand, symbol, self.second_operand, self.expected_answer, verdict
        )
    }
}

/// A whole question set stored as one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub questions: Vec<Problem>,
    pub score: usize,
    pub total_questions: usize,
}

impl SessionRecord {
    pub fn from_questions(questions: &[Problem]) -> Self {
        Self {
            timestamp: Utc::now(),
            questions: questions.to_vec(),
            score: questions
                .iter()
                .filter(|q| q.is_correct == Some(true))
                .count(),
            total_questions: questions.len(),
        }
    }

    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            0
        } else {
            (self.score as f64 * 100.0 / self.total_questions as f64).round() as u32
        }
    }
}

impl HistoryRecord for SessionRecord {
    const REQUIRED_FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("questions", FieldKind::Array),
        ("score", FieldKind::Number),
        ("totalQuestions", FieldKind::Number),
    ];

    fn tally(&self) -> RecordTally {
        RecordTally {
            questions: self.total_questions,
            correct: self.score,
            incorrect: self.total_questions.saturating_sub(self.score),
        }
    }

    fn score(&self) -> Option<usize> {
        Some(self.score)
    }

    fn from_import(value: &Value) -> Option<Self> {
        let object = required_fields::<Self>(value)?;
        let questions = object
            .get("questions")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(Problem::from_import)
            .collect();
        Some(Self {
            timestamp: import_timestamp(object.get("timestamp")),
            questions,
            score: import_count(object.get("score"))?,
            total_questions: import_count(object.get("totalQuestions"))?,
        })
    }

    fn describe(&self, _symbol: char) -> String {
        format!(
            "{}  Score: {}/{} ({}%)",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.score,
            self.total_questions,
            self.percentage()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    pub total_records: usize,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Rounded percentage of graded answers that were correct.
    pub accuracy: u32,
    /// Correct answers per ten graded, one decimal.
    pub average_score: f64,
    pub best_score: usize,
}

impl HistoryStatistics {
    pub fn from_records<R: HistoryRecord>(records: &[R]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };
        for record in records {
            let tally = record.tally();
            stats.total_questions += tally.questions;
            stats.correct_answers += tally.correct;
            stats.incorrect_answers += tally.incorrect;
            if let Some(score) = record.score() {
                stats.best_score = stats.best_score.max(score);
            }
        }

        let graded = stats.correct_answers + stats.incorrect_answers;
        if graded > 0 {
            let ratio = stats.correct_answers as f64 / graded as f64;
            stats.accuracy = (ratio * 100.0).round() as u32;
            stats.average_score = (ratio * 100.0).round() / 10.0;
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The store ran out of room; the newest `kept` records were written.
    Trimmed { kept: usize },
    /// Nothing could be written. History is effectively disabled.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub item_count: usize,
    pub size_bytes: usize,
    pub available: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a, R> {
    export_date: DateTime<Utc>,
    exercise_type: &'a str,
    statistics: HistoryStatistics,
    records: &'a [R],
}

/// Bounded, most-recent-first history kept as one JSON array under a
/// single key.
///
/// Storage problems never reach the caller: reads degrade to an empty list
/// and failed writes are logged.
pub struct HistoryManager<S, R> {
    store: S,
    policy: HistoryPolicy,
    _record: PhantomData<R>,
}

impl<S: KeyValueStore, R: HistoryRecord> HistoryManager<S, R> {
    pub fn new(store: S, policy: HistoryPolicy) -> Self {
        Self {
            store,
            policy,
            _record: PhantomData,
        }
    }

    pub fn policy(&self) -> &HistoryPolicy {
        &self.policy
    }

    pub fn save(&mut self, record: R) -> SaveOutcome {
        self.save_batch(std::iter::once(record))
    }

    /// Inserts `records` at the head in order, so the last one ends up newest.
    pub fn save_batch<I: IntoIterator<Item = R>>(&mut self, records: I) -> SaveOutcome {
        let mut history = self.get_all();
        for record in records {
            history.insert(0, record);
        }
        history.truncate(self.policy.capacity);

        match self.write(&history) {
            Ok(()) => SaveOutcome::Saved,
            Err(HistoryError::Store(e)) if e.is_quota() => {
                warn!(
                    "{}: {e}; keeping newest {} records",
                    self.policy.storage_key, self.policy.quota_keep
                );
                history.truncate(self.policy.quota_keep);
                match self.write(&history) {
                    Ok(()) => SaveOutcome::Trimmed {
                        kept: history.len(),
                    },
                    Err(e) => {
                        warn!(
                            "{}: save failed after trimming: {e}",
                            self.policy.storage_key
                        );
                        SaveOutcome::Dropped
                    }
                }
            }
            Err(e) => {
                warn!("{}: failed to save history: {e}", self.policy.storage_key);
                SaveOutcome::Dropped
            }
        }
    }

    pub fn get_all(&self) -> Vec<R> {
        let json = match self.store.get(&self.policy.storage_key) {
            Ok(Some(json)) => json,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("{}: history unavailable: {e}", self.policy.storage_key);
                return Vec::new();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            warn!(
                "{}: discarding unreadable history: {e}",
                self.policy.storage_key
            );
            Vec::new()
        })
    }

    pub fn get_recent(&self, count: usize) -> Vec<R> {
        let mut history = self.get_all();
        history.truncate(count);
        history
    }

    pub fn clear(&mut self) {
        match self.store.remove(&self.policy.storage_key) {
            Ok(()) => info!("{}: history cleared", self.policy.storage_key),
            Err(e) => warn!("{}: failed to clear history: {e}", self.policy.storage_key),
        }
    }

    /// Removes every record matching `pred`. Returns whether anything was
    /// removed and written back.
    pub fn remove_where<F: FnMut(&R) -> bool>(&mut self, mut pred: F) -> bool {
        let mut history = self.get_all();
        let before = history.len();
        history.retain(|r| !pred(r));
        if history.len() == before {
            return false;
        }
        match self.write(&history) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: failed to remove records: {e}", self.policy.storage_key);
                false
            }
        }
    }

    pub fn statistics(&self) -> HistoryStatistics {
        HistoryStatistics::from_records(&self.get_all())
    }

    pub fn storage_info(&self) -> StorageInfo {
        match self.store.get(&self.policy.storage_key) {
            Ok(raw) => StorageInfo {
                item_count: self.get_all().len(),
                size_bytes: raw.map_or(0, |s| s.len()),
                available: true,
            },
            Err(_) => StorageInfo {
                item_count: 0,
                size_bytes: 0,
                available: false,
            },
        }
    }

    pub fn export(&self) -> Result<String, HistoryError> {
        let records = self.get_all();
        let document = ExportDocument {
            export_date: Utc::now(),
            exercise_type: &self.policy.exercise_type,
            statistics: HistoryStatistics::from_records(&records),
            records: &records,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Replaces the stored history with the valid records of an export
    /// document. Invalid records are skipped; returns how many were kept.
    pub fn import(&mut self, json: &str) -> Result<usize, HistoryError> {
        let document: Value = serde_json::from_str(json)?;
        let entries = document
            .get("records")
            .or_else(|| document.get("questions"))
            .and_then(Value::as_array)
            .ok_or_else(|| HistoryError::Format("missing record list".to_string()))?;

        let mut records: Vec<R> = entries.iter().filter_map(R::from_import).collect();
        if records.is_empty() {
            return Err(HistoryError::NoValidRecords);
        }
        let skipped = entries.len() - records.len();
        records.truncate(self.policy.capacity);

        self.write(&records)?;
        info!(
            "{}: imported {} records ({} skipped)",
            self.policy.storage_key,
            records.len(),
            skipped
        );
        Ok(records.len())
    }

    fn write(&mut self, records: &[R]) -> Result<(), HistoryError> {
        let json = serde_json::to_string(records)?;
        self.store.set(&self.policy.storage_key, &json)?;
        Ok(())
    }
}

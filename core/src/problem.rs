use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operation::Operation;

/// One generated question together with the learner's response.
///
/// The expected answer is fixed when the problem is generated; grading never
/// recomputes it from the operands. Operands are stored as numbers rather
/// than integers so imported histories keep whatever values they carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(default)]
    pub id: i64,
    pub first_operand: f64,
    pub second_operand: f64,
    pub expected_answer: f64,
    #[serde(default)]
    pub user_answer: Option<f64>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub revealed: bool,
    #[serde(rename = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Problem {
    pub fn new(
        id: i64,
        operation: Operation,
        first_operand: u32,
        second_operand: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_operand: f64::from(first_operand),
            second_operand: f64::from(second_operand),
            expected_answer: operation.answer(first_operand, second_operand),
            user_answer: None,
            is_correct: None,
            revealed: false,
            created_at,
        }
    }

    pub fn display(&self, operation: Operation) -> String {
        format!(
            "{} {} {} = ?",
            self.first_operand,
            operation.symbol(),
            self.second_operand
        )
    }

    pub fn is_graded(&self) -> bool {
        self.is_correct.is_some()
    }

    /// Records `answer` and grades it against the frozen expected answer.
    /// A revealed problem is left untouched and never grades as correct.
    pub fn grade(&mut self, operation: Operation, answer: f64) -> bool {
        if self.revealed {
            return false;
        }
        let correct = operation.is_correct(self.expected_answer, answer);
        self.user_answer = Some(answer);
        self.is_correct = Some(correct);
        correct
    }

    /// "Show answer" flow: the problem counts as answered but never as correct.
    pub fn reveal(&mut self) -> f64 {
        self.revealed = true;
        self.user_answer = Some(self.expected_answer);
        self.is_correct = Some(false);
        self.expected_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(operation: Operation, a: u32, b: u32) -> Problem {
        Problem::new(1, operation, a, b, Utc::now())
    }

    #[test]
    fn test_new_problem_is_ungraded() {
        let p = sample(Operation::Addition, 3, 4);
        assert_eq!(p.expected_answer, 7.0);
        assert!(p.user_answer.is_none());
        assert!(!p.is_graded());
    }

    #[test]
    fn test_display_uses_operation_symbol() {
        let p = sample(Operation::Multiplication, 120, 305);
        assert_eq!(p.display(Operation::Multiplication), "120 × 305 = ?");
    }

    #[test]
    fn test_grade_keeps_expected_answer() {
        let mut p = sample(Operation::Subtraction, 9, 2);
        assert!(!p.grade(Operation::Subtraction, 6.0));
        assert_eq!(p.expected_answer, 7.0);
        assert!(p.grade(Operation::Subtraction, 7.0));
        assert_eq!(p.user_answer, Some(7.0));
        assert_eq!(p.is_correct, Some(true));
    }

    #[test]
    fn test_reveal_counts_as_incorrect() {
        let mut p = sample(Operation::Multiplication, 100, 100);
        assert_eq!(p.reveal(), 10_000.0);
        assert!(p.revealed);
        assert_eq!(p.user_answer, Some(10_000.0));
        assert_eq!(p.is_correct, Some(false));
    }

    #[test]
    fn test_grade_after_reveal_is_ignored() {
        let mut p = sample(Operation::Multiplication, 12, 12);
        let shown = p.reveal();
        assert!(!p.grade(Operation::Multiplication, shown));
        assert!(p.revealed);
        assert_eq!(p.is_correct, Some(false));
        assert_eq!(p.user_answer, Some(144.0));
    }

    #[test]
    fn test_serialized_field_names() {
        let p = sample(Operation::Addition, 1, 2);
        let json = serde_json::to_value(&p).unwrap();
        for field in [
            "firstOperand",
            "secondOperand",
            "expectedAnswer",
            "userAnswer",
            "isCorrect",
            "timestamp",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert!(json.get("revealed").is_none());
    }
}

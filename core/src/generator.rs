use chrono::Utc;
use log::debug;
use rand::Rng;

use crate::error::InputError;
use crate::operation::{Operation, QUESTIONS_PER_SET};
use crate::problem::Problem;

/// Holds one question set and a cursor over it.
#[derive(Debug, Clone)]
pub struct Generator {
    operation: Operation,
    // operation the current set was generated with; grading follows it even
    // if decimals are toggled mid-set
    set_operation: Operation,
    questions: Vec<Problem>,
    current_index: usize,
}

impl Generator {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            set_operation: operation,
            questions: Vec::new(),
            current_index: 0,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Operation used to grade the set currently held.
    pub fn set_operation(&self) -> Operation {
        self.set_operation
    }

    /// Only meaningful for division; applies from the next generated set.
    pub fn set_allow_decimals(&mut self, allow_decimals: bool) {
        if let Operation::Division { .. } = self.operation {
            self.operation = Operation::Division { allow_decimals };
        }
    }

    pub fn generate_question_set(&mut self) -> &[Problem] {
        let mut rng = rand::thread_rng();
        self.generate_question_set_with(&mut rng)
    }

    pub fn generate_question_set_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[Problem] {
        let now = Utc::now();
        let base_id = now.timestamp_millis();
        let operation = self.operation;

        self.questions = (0..QUESTIONS_PER_SET)
            .map(|i| {
                let (a, b) = operation.draw_operands(rng);
                Problem::new(base_id + i as i64, operation, a, b, now)
            })
            .collect();
        self.set_operation = operation;
        self.current_index = 0;

        debug!(
            "generated {} {} problems",
            self.questions.len(),
            operation.name()
        );
        &self.questions
    }

    /// Grades `answer` against the current problem. Returns false without
    /// touching anything when there is no current problem.
    pub fn set_user_answer(&mut self, answer: f64) -> bool {
        let operation = self.set_operation;
        match self.current_question_mut() {
            Some(problem) => problem.grade(operation, answer),
            None => false,
        }
    }

    pub fn reveal_answer(&mut self) -> Option<f64> {
        self.current_question_mut().map(Problem::reveal)
    }

    pub fn correct_answers_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.is_correct == Some(true))
            .count()
    }

    pub fn questions(&self) -> &[Problem] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Problem> {
        self.questions.get(self.current_index)
    }

    fn current_question_mut(&mut self) -> Option<&mut Problem> {
        self.questions.get_mut(self.current_index)
    }

    pub fn next_question(&mut self) -> Option<&Problem> {
        if self.has_next_question() {
            self.current_index += 1;
            self.current_question()
        } else {
            None
        }
    }

    pub fn previous_question(&mut self) -> Option<&Problem> {
        if self.has_previous_question() {
            self.current_index -= 1;
            self.current_question()
        } else {
            None
        }
    }

    pub fn current_question_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn has_next_question(&self) -> bool {
        self.current_index + 1 < self.questions.len()
    }

    pub fn has_previous_question(&self) -> bool {
        self.current_index > 0
    }
}

/// Numeric coercion for a typed answer.
pub fn parse_answer(input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::NotANumber(trimmed.to_string())),
    }
}

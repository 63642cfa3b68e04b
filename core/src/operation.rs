use rand::Rng;

use crate::history::HistoryPolicy;

pub const QUESTIONS_PER_SET: usize = 10;

/// Arithmetic drill variants. Each one fixes its operand ranges, the answer
/// function and the comparison used for grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division { allow_decimals: bool },
}

/// How a finished question set is written to history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Each graded problem becomes its own record.
    Problem,
    /// The whole set becomes one record with a score.
    Session,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division {
            allow_decimals: false,
        },
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Division { .. } => "division",
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Operation::Addition => '+',
            Operation::Subtraction => '−',
            Operation::Multiplication => '×',
            Operation::Division { .. } => '÷',
        }
    }

    pub fn allows_decimals(&self) -> bool {
        matches!(
            self,
            Operation::Division {
                allow_decimals: true
            }
        )
    }

    pub fn draw_operands<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, u32) {
        match self {
            Operation::Addition => (rng.gen_range(1..=9), rng.gen_range(1..=9)),
            Operation::Subtraction => {
                let a = rng.gen_range(1..=9);
                let b = rng.gen_range(1..=9);
                if a < b {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            Operation::Multiplication => (rng.gen_range(100..=999), rng.gen_range(100..=999)),
            Operation::Division { allow_decimals } => {
                let divisor = rng.gen_range(1..=9);
                let dividend = if *allow_decimals {
                    rng.gen_range(1000..=9999)
                } else {
                    rng.gen_range(100..=999) * divisor
                };
                (dividend, divisor)
            }
        }
    }

    pub fn answer(&self, first: u32, second: u32) -> f64 {
        let (a, b) = (first as f64, second as f64);
        match self {
            Operation::Addition => a + b,
            Operation::Subtraction => a - b,
            Operation::Multiplication => a * b,
            Operation::Division { allow_decimals } => {
                if *allow_decimals {
                    round_to_two_decimals(a / b)
                } else {
                    a / b
                }
            }
        }
    }

    pub fn is_correct(&self, expected: f64, given: f64) -> bool {
        if self.allows_decimals() {
            round_to_two_decimals(given) == round_to_two_decimals(expected)
        } else {
            given == expected
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Operation::Subtraction => RecordKind::Session,
            _ => RecordKind::Problem,
        }
    }

    pub fn history_policy(&self) -> HistoryPolicy {
        let key = format!("{}-exercise-history", self.name());
        match self {
            Operation::Addition => HistoryPolicy::new(self.name(), key, 100),
            // sessions are large, so a quota failure keeps only a quarter
            Operation::Subtraction => HistoryPolicy::new(self.name(), key, 50).with_quota_keep(12),
            Operation::Multiplication | Operation::Division { .. } => {
                HistoryPolicy::new(self.name(), key, 50)
            }
        }
    }

    pub fn sound_key(&self) -> String {
        format!("{}-exercise-sound-enabled", self.name())
    }
}

pub fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_subtraction_operands_are_ordered() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let (a, b) = Operation::Subtraction.draw_operands(&mut rng);
            assert!((1..=9).contains(&a) && (1..=9).contains(&b));
            assert!(a >= b);
        }
    }

    #[test]
    fn test_integer_division_is_exact() {
        let mut rng = StdRng::seed_from_u64(11);
        let op = Operation::Division {
            allow_decimals: false,
        };
        for _ in 0..500 {
            let (dividend, divisor) = op.draw_operands(&mut rng);
            assert!((1..=9).contains(&divisor));
            assert_eq!(dividend % divisor, 0);
            let quotient = dividend / divisor;
            assert!((100..=999).contains(&quotient));
        }
    }

    #[test]
    fn test_decimal_division_rounds_to_cents() {
        let op = Operation::Division {
            allow_decimals: true,
        };
        assert_eq!(op.answer(1000, 3), 333.33);
        assert_eq!(op.answer(2000, 3), 666.67);
        assert!(op.is_correct(333.33, 333.333));
        assert!(!op.is_correct(333.33, 333.34));
    }

    #[test]
    fn test_integer_comparison_is_exact() {
        assert!(Operation::Addition.is_correct(12.0, 12.0));
        assert!(!Operation::Addition.is_correct(12.0, 12.001));
    }

    #[test]
    fn test_history_policies() {
        let add = Operation::Addition.history_policy();
        assert_eq!(add.storage_key, "addition-exercise-history");
        assert_eq!(add.capacity, 100);
        assert_eq!(add.quota_keep, 50);

        let sub = Operation::Subtraction.history_policy();
        assert_eq!(sub.capacity, 50);
        assert_eq!(sub.quota_keep, 12);
        assert_eq!(Operation::Subtraction.record_kind(), RecordKind::Session);
    }
}

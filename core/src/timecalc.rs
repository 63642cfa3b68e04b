//! Arithmetic on durations written as `HH:MM:SS`, `MM:SS` or `SS`.
//!
//! All values are converted to whole seconds, combined, then formatted back
//! as zero-padded `HH:MM:SS`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TimeError;
use crate::history::{
    import_timestamp, required_fields, FieldKind, HistoryPolicy, HistoryRecord, RecordTally,
};

pub const MAX_FACTOR: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl TimeOperation {
    pub const ALL: [TimeOperation; 4] = [
        TimeOperation::Add,
        TimeOperation::Subtract,
        TimeOperation::Multiply,
        TimeOperation::Divide,
    ];

    pub fn symbol(&self) -> char {
        match self {
            TimeOperation::Add => '+',
            TimeOperation::Subtract => '-',
            TimeOperation::Multiply => '×',
            TimeOperation::Divide => '÷',
        }
    }

    /// Add and subtract take a second time; multiply and divide take a number.
    pub fn takes_time_operand(&self) -> bool {
        matches!(self, TimeOperation::Add | TimeOperation::Subtract)
    }
}

impl fmt::Display for TimeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeOperation::Add => "add",
            TimeOperation::Subtract => "subtract",
            TimeOperation::Multiply => "multiply",
            TimeOperation::Divide => "divide",
        };
        f.write_str(name)
    }
}

impl FromStr for TimeOperation {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Ok(TimeOperation::Add),
            "subtract" | "-" => Ok(TimeOperation::Subtract),
            "multiply" | "*" | "×" => Ok(TimeOperation::Multiply),
            "divide" | "/" | "÷" => Ok(TimeOperation::Divide),
            other => Err(TimeError::UnknownOperation(other.to_string())),
        }
    }
}

fn digits_value(field: &str, min_len: usize, max_len: usize) -> Option<i64> {
    if field.len() < min_len || field.len() > max_len || !field.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    field.parse().ok()
}

/// Exactly two digits, 00 through 59.
fn sexagesimal(field: &str) -> Option<i64> {
    digits_value(field, 2, 2).filter(|v| *v < 60)
}

pub fn parse_time(input: &str) -> Result<i64, TimeError> {
    let invalid = || TimeError::InvalidFormat(input.to_string());
    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let parts: Vec<&str> = body.split(':').collect();
    let seconds = match parts.as_slice() {
        [h, m, s] => {
            let hours = digits_value(h, 1, 2).ok_or_else(invalid)?;
            let minutes = sexagesimal(m).ok_or_else(invalid)?;
            let seconds = sexagesimal(s).ok_or_else(invalid)?;
            hours * 3600 + minutes * 60 + seconds
        }
        [m, s] => sexagesimal(m).ok_or_else(invalid)? * 60 + sexagesimal(s).ok_or_else(invalid)?,
        [s] => digits_value(s, 1, 2)
            .filter(|v| *v < 60)
            .ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };

    Ok(if negative { -seconds } else { seconds })
}

pub fn is_valid_time_format(input: &str) -> bool {
    parse_time(input).is_ok()
}

pub fn parse_factor(input: &str) -> Result<f64, TimeError> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= MAX_FACTOR => Ok(value),
        _ => Err(TimeError::InvalidNumber(input.to_string())),
    }
}

pub fn format_seconds(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{sign}{hours:02}:{minutes:02}:{secs:02}")
}

pub fn add(first: &str, second: &str) -> Result<String, TimeError> {
    Ok(format_seconds(parse_time(first)? + parse_time(second)?))
}

pub fn subtract(first: &str, second: &str) -> Result<String, TimeError> {
    Ok(format_seconds(parse_time(first)? - parse_time(second)?))
}

/// Results are rounded to the nearest whole second.
pub fn multiply(time: &str, factor: f64) -> Result<String, TimeError> {
    if !factor.is_finite() {
        return Err(TimeError::InvalidNumber(factor.to_string()));
    }
    let seconds = parse_time(time)? as f64 * factor;
    Ok(format_seconds(seconds.round() as i64))
}

pub fn divide(time: &str, divisor: f64) -> Result<String, TimeError> {
    if !divisor.is_finite() {
        return Err(TimeError::InvalidNumber(divisor.to_string()));
    }
    if divisor == 0.0 {
        return Err(TimeError::DivisionByZero);
    }
    let seconds = parse_time(time)? as f64 / divisor;
    Ok(format_seconds(seconds.round() as i64))
}

/// Checks every input before anything is computed, returning the first
/// problem found.
pub fn validate_inputs(
    time: &str,
    operation: TimeOperation,
    operand: &str,
) -> Result<(), TimeError> {
    parse_time(time)?;
    if operation.takes_time_operand() {
        parse_time(operand)?;
    } else {
        let factor = parse_factor(operand)?;
        if operation == TimeOperation::Divide && factor == 0.0 {
            return Err(TimeError::DivisionByZero);
        }
    }
    Ok(())
}

/// Validates, then computes the result in whole seconds.
pub fn evaluate(time: &str, operation: TimeOperation, operand: &str) -> Result<i64, TimeError> {
    validate_inputs(time, operation, operand)?;
    let base = parse_time(time)?;
    let seconds = match operation {
        TimeOperation::Add => base + parse_time(operand)?,
        TimeOperation::Subtract => base - parse_time(operand)?,
        TimeOperation::Multiply => (base as f64 * parse_factor(operand)?).round() as i64,
        TimeOperation::Divide => (base as f64 / parse_factor(operand)?).round() as i64,
    };
    Ok(seconds)
}

pub fn calculate(time: &str, operation: TimeOperation, operand: &str) -> Result<String, TimeError> {
    evaluate(time, operation, operand).map(format_seconds)
}

/// "2 hours, 5 minutes and 1 second"; zero renders as "0 seconds".
pub fn format_with_units(seconds: i64) -> String {
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    let unit = |n: u64, singular: &str| {
        if n == 1 {
            format!("1 {singular}")
        } else {
            format!("{n} {singular}s")
        }
    };

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(unit(minutes, "minute"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(unit(secs, "second"));
    }

    let text = match parts.as_slice() {
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
        [] => String::new(),
    };
    if seconds < 0 {
        format!("negative {text}")
    } else {
        text
    }
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Millisecond timestamp in base 36 plus five random base-36 characters.
pub fn generate_calculation_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| base36(rng.gen_range(0..36)))
        .collect();
    format!("{}{}", base36(Utc::now().timestamp_millis().unsigned_abs()), suffix)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    #[serde(default)]
    pub id: String,
    pub first_value: String,
    pub operation: TimeOperation,
    pub second_value: String,
    pub result: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CalculationRecord {
    pub fn new(
        first_value: impl Into<String>,
        operation: TimeOperation,
        second_value: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            id: generate_calculation_id(),
            first_value: first_value.into(),
            operation,
            second_value: second_value.into(),
            result: result.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} {} = {}",
            self.first_value,
            self.operation.symbol(),
            self.second_value,
            self.result
        )
    }
}

impl HistoryRecord for CalculationRecord {
    const REQUIRED_FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("firstValue", FieldKind::String),
        ("secondValue", FieldKind::String),
        ("result", FieldKind::String),
    ];

    fn tally(&self) -> RecordTally {
        RecordTally::default()
    }

    fn from_import(value: &Value) -> Option<Self> {
        let object = required_fields::<Self>(value)?;
        let text = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Some(Self {
            id: text("id")
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_calculation_id),
            first_value: text("firstValue")?,
            operation: object
                .get("operation")
                .and_then(Value::as_str)
                .and_then(|op| op.parse().ok())
                .unwrap_or(TimeOperation::Add),
            second_value: text("secondValue")?,
            result: text("result")?,
            timestamp: import_timestamp(object.get("timestamp")),
        })
    }

    fn describe(&self, _symbol: char) -> String {
        self.summary()
    }
}

pub fn calculation_policy() -> HistoryPolicy {
    HistoryPolicy::new("time-calculator", "time-calculator-history", 50)
}

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    lib::errors::RegistrationError,
    server::config::Settings,
    tools::base::{
        parse_args, ToolArgs, ToolDefinition, ToolError, ToolFailure, ToolOutput, ToolRegistry,
    },
};

pub const EMPTY_LIST: &str = "EMPTY_LIST";
pub const INVALID_TYPE: &str = "INVALID_TYPE";
pub const INVALID_PRECISION: &str = "INVALID_PRECISION";

const MAX_PRECISION: i64 = 10;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StatisticsRequest {
    /// Numbers to analyze.
    #[schemars(with = "Vec<f64>")]
    pub numbers: Vec<Value>,
    /// Decimal places kept in derived values (0 to 10).
    #[serde(default = "default_precision")]
    pub precision: i64,
}

fn default_precision() -> i64 {
    2
}

pub fn register(
    registry: &mut ToolRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    registry.register(
        ToolDefinition::new(
            "calculate_statistics",
            "Calculate count, sum, mean, median, min, max, standard deviation and variance",
        )
        .input_schema::<StatisticsRequest>()
        .require_params(["numbers"])
        .handler(calculate_statistics),
    )?;
    Ok(1)
}

pub async fn calculate_statistics(args: ToolArgs) -> Result<ToolOutput, ToolFailure> {
    let request: StatisticsRequest = parse_args(args)?;
    let stats = summarize(&request.numbers, request.precision)?;
    Ok(ToolOutput::new(stats)
        .with_message("Statistics calculated successfully")
        .with_metadata("precision", request.precision))
}

/// One input item: the value as given plus its numeric readings.
/// Booleans count as the integers 0 and 1.
#[derive(Clone, Copy)]
struct Sample<'a> {
    raw: &'a Value,
    value: f64,
    integer: Option<i64>,
}

impl<'a> Sample<'a> {
    fn read(raw: &'a Value) -> Option<Self> {
        match raw {
            Value::Number(n) => n.as_f64().map(|value| Self {
                raw,
                value,
                integer: n.as_i64(),
            }),
            Value::Bool(b) => Some(Self {
                raw,
                value: f64::from(u8::from(*b)),
                integer: Some(i64::from(*b)),
            }),
            _ => None,
        }
    }
}

/// Population statistics over `numbers`, rounded to `precision` places.
///
/// `min`, `max` and an odd-length `median` are reported as the input values
/// themselves; `sum` stays an integer when every input is one and the total
/// fits in an `i64`.
pub fn summarize(numbers: &[Value], precision: i64) -> Result<Value, ToolError> {
    if numbers.is_empty() {
        return Err(ToolError::new("Numbers list cannot be empty", EMPTY_LIST));
    }
    let samples: Vec<Sample<'_>> = numbers
        .iter()
        .map(Sample::read)
        .collect::<Option<_>>()
        .ok_or_else(|| ToolError::new("All items must be numbers", INVALID_TYPE))?;
    if !(0..=MAX_PRECISION).contains(&precision) {
        return Err(ToolError::new(
            "Precision must be between 0 and 10",
            INVALID_PRECISION,
        ));
    }

    let count = samples.len();
    let total: f64 = samples.iter().map(|s| s.value).sum();
    let mean = total / count as f64;

    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
    let mid = count / 2;
    let median = if count % 2 == 0 {
        rounded((sorted[mid - 1].value + sorted[mid].value) / 2.0, precision)
    } else {
        exact_or_rounded(sorted[mid].raw, precision)
    };

    let variance = samples
        .iter()
        .map(|s| (s.value - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    let exact_sum = samples
        .iter()
        .try_fold(0i64, |acc, s| acc.checked_add(s.integer?));
    let sum = match exact_sum {
        Some(sum) => json!(sum),
        None => rounded(total, precision),
    };

    Ok(json!({
        "count": count,
        "sum": sum,
        "mean": rounded(mean, precision),
        "median": median,
        "min": sorted[0].raw,
        "max": sorted[count - 1].raw,
        "std_dev": rounded(variance.sqrt(), precision),
        "variance": rounded(variance, precision),
    }))
}

/// Values too large to scale by `10^precision` are returned unchanged.
fn round_to(value: f64, precision: i64) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}

fn rounded(value: f64, precision: i64) -> Value {
    json!(round_to(value, precision))
}

fn exact_or_rounded(raw: &Value, precision: i64) -> Value {
    match raw {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| rounded(f, precision))
            .unwrap_or_else(|| raw.clone()),
        _ => raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(value: Value) -> Vec<Value> {
        value.as_array().cloned().expect("array")
    }

    #[test]
    fn five_integers() {
        let stats = summarize(&numbers(json!([1, 2, 3, 4, 5])), 2).expect("stats");
        assert_eq!(stats["count"], json!(5));
        assert_eq!(stats["sum"], json!(15));
        assert_eq!(stats["mean"], json!(3.0));
        assert_eq!(stats["median"], json!(3));
        assert_eq!(stats["min"], json!(1));
        assert_eq!(stats["max"], json!(5));
        assert_eq!(stats["std_dev"], json!(1.41));
        assert_eq!(stats["variance"], json!(2.0));
    }

    #[test]
    fn even_count_median_is_averaged() {
        let stats = summarize(&numbers(json!([4.5, 1, 3, 2])), 1).expect("stats");
        assert_eq!(stats["median"], json!(2.5));
        assert_eq!(stats["sum"], json!(10.5));
        assert_eq!(stats["min"], json!(1));
        assert_eq!(stats["max"], json!(4.5));
    }

    #[test]
    fn validation_codes() {
        let err = summarize(&[], 2).expect_err("empty");
        assert_eq!(err.error_code, EMPTY_LIST);

        let err = summarize(&numbers(json!([1, "two"])), 2).expect_err("mixed");
        assert_eq!(err.error_code, INVALID_TYPE);

        let err = summarize(&numbers(json!([1, 2])), 11).expect_err("precision");
        assert_eq!(err.error_code, INVALID_PRECISION);
    }

    #[tokio::test]
    async fn tool_reports_precision_metadata() {
        let args = json!({ "numbers": [2, 4] }).as_object().cloned().expect("object");
        let output = calculate_statistics(args).await.expect("stats");
        assert_eq!(output.metadata["precision"], json!(2));
        assert_eq!(
            output.metadata["message"],
            json!("Statistics calculated successfully")
        );
        assert_eq!(output.data["mean"], json!(3.0));
    }

    #[test]
    fn integer_sum_falls_back_to_float_on_overflow() {
        let stats = summarize(&numbers(json!([i64::MAX, 1])), 2).expect("stats");
        assert_eq!(stats["sum"], json!(i64::MAX as f64 + 1.0));
        assert_eq!(stats["max"], json!(i64::MAX));
        assert_eq!(stats["count"], json!(2));
    }

    #[test]
    fn huge_values_keep_their_magnitude() {
        let stats = summarize(&numbers(json!([1e300, 1e300])), 10).expect("stats");
        assert_eq!(stats["mean"], json!(1e300));
        assert_eq!(stats["median"], json!(1e300));
        assert_eq!(stats["sum"], json!(2e300));
        assert_eq!(stats["variance"], json!(0.0));
    }

    #[test]
    fn booleans_count_as_zero_and_one() {
        let stats = summarize(&numbers(json!([true, false, true, 3])), 2).expect("stats");
        assert_eq!(stats["sum"], json!(5));
        assert_eq!(stats["mean"], json!(1.25));
        assert_eq!(stats["min"], json!(false));
        assert_eq!(stats["max"], json!(3));
    }
}

//! Shared coercion from raw source representations into typed values.
//!
//! Every source reader funnels through here: flags and environment variables
//! supply raw strings, the file source supplies nodes of a generic decoded
//! tree. Both end up as [`Value`]s matching the option's declared scalar
//! type.

use std::time::Duration;

use serde_json::Value as Decoded;
use thiserror::Error;

use crate::option::Scalar;
use crate::value::Value;

/// Delimiter splitting sequence literals from flags, environment variables
/// and default literals.
pub const SEQUENCE_DELIMITER: char = ',';

/// Failure to convert a raw value into an option's declared type.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoerceError {
    /// The literal does not parse as the expected type.
    #[error("cannot parse '{literal}' as {expected}")]
    Parse {
        /// Raw text that failed to parse.
        literal: String,
        /// Name of the expected type.
        expected: &'static str,
    },

    /// One element of a sequence failed to parse.
    #[error("element {index}: {source}")]
    Element {
        /// Zero-based position of the bad element.
        index: usize,
        /// The element's own failure.
        source: Box<CoerceError>,
    },
}

impl CoerceError {
    pub(crate) fn parse(literal: impl Into<String>, expected: &'static str) -> Self {
        Self::Parse {
            literal: literal.into(),
            expected,
        }
    }

    fn element(index: usize, source: Self) -> Self {
        Self::Element {
            index,
            source: Box::new(source),
        }
    }
}

/// Parse a raw string into a scalar of the given type.
pub(crate) fn parse_scalar(raw: &str, ty: Scalar) -> Result<Value, CoerceError> {
    match ty {
        Scalar::Bool => parse_bool(raw).map(Value::Bool),
        Scalar::Int => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| CoerceError::parse(raw, "integer")),
        Scalar::Uint => raw
            .parse::<u64>()
            .map(Value::Uint)
            .map_err(|_| CoerceError::parse(raw, "unsigned integer")),
        Scalar::Float => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| CoerceError::parse(raw, "float")),
        Scalar::Str => Ok(Value::Str(raw.to_owned())),
        Scalar::Duration => parse_duration(raw).map(Value::Duration),
    }
}

/// Parse a delimited string into a sequence, coercing each element.
///
/// The first malformed element aborts the parse with its index noted.
pub(crate) fn parse_sequence(raw: &str, ty: Scalar) -> Result<Value, CoerceError> {
    let mut items = Vec::new();
    for (index, part) in raw.split(SEQUENCE_DELIMITER).enumerate() {
        let item = parse_scalar(part, ty).map_err(|e| CoerceError::element(index, e))?;
        items.push(item);
    }
    Ok(Value::Seq(items))
}

/// Coerce a node of a decoded file tree into a scalar of the given type.
///
/// Native decoded representations are accepted directly; strings are
/// additionally run through [`parse_scalar`], which covers types the file
/// formats cannot express natively (durations in particular).
pub(crate) fn from_decoded(decoded: &Decoded, ty: Scalar) -> Result<Value, CoerceError> {
    if let Decoded::String(s) = decoded {
        return parse_scalar(s, ty);
    }
    let mismatch = || CoerceError::parse(decoded.to_string(), ty.name());
    match ty {
        Scalar::Bool => decoded.as_bool().map(Value::Bool).ok_or_else(mismatch),
        Scalar::Int => decoded.as_i64().map(Value::Int).ok_or_else(mismatch),
        Scalar::Uint => decoded.as_u64().map(Value::Uint).ok_or_else(mismatch),
        Scalar::Float => decoded.as_f64().map(Value::Float).ok_or_else(mismatch),
        Scalar::Str => Err(mismatch()),
        // Integer durations follow the original representation: nanoseconds.
        Scalar::Duration => decoded
            .as_u64()
            .map(|n| Value::Duration(Duration::from_nanos(n)))
            .ok_or_else(mismatch),
    }
}

/// Coerce a decoded file node into a sequence.
///
/// Decoded arrays coerce element-wise; a decoded string falls back to the
/// delimited form used by flags and environment variables.
pub(crate) fn sequence_from_decoded(decoded: &Decoded, ty: Scalar) -> Result<Value, CoerceError> {
    match decoded {
        Decoded::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let coerced =
                    from_decoded(item, ty).map_err(|e| CoerceError::element(index, e))?;
                out.push(coerced);
            }
            Ok(Value::Seq(out))
        }
        Decoded::String(s) => parse_sequence(s, ty),
        other => Err(CoerceError::parse(other.to_string(), "sequence")),
    }
}

/// Boolean literals, matching the original engine's accepted set.
fn parse_bool(raw: &str) -> Result<bool, CoerceError> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(CoerceError::parse(raw, "boolean")),
    }
}

/// Unit suffixes understood by [`parse_duration`], longest first so `ms`
/// wins over `m`.
const DURATION_UNITS: &[(&str, f64)] = &[
    ("ns", 1e-9),
    ("us", 1e-6),
    ("µs", 1e-6),
    ("ms", 1e-3),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3600.0),
];

/// Parse a duration literal such as `300ms`, `1.5h` or `1h30m`.
///
/// A bare `0` is accepted without a unit; every other component requires
/// one. Negative durations are rejected: the target type cannot represent
/// them.
fn parse_duration(raw: &str) -> Result<Duration, CoerceError> {
    let fail = || CoerceError::parse(raw, "duration");

    if raw == "0" {
        return Ok(Duration::ZERO);
    }
    let mut rest = raw.strip_prefix('+').unwrap_or(raw);
    if rest.is_empty() || rest.starts_with('-') {
        return Err(fail());
    }

    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);
        let magnitude: f64 = number.parse().map_err(|_| fail())?;
        let (scale, remainder) = DURATION_UNITS
            .iter()
            .find_map(|(unit, scale)| tail.strip_prefix(unit).map(|r| (*scale, r)))
            .ok_or_else(fail)?;
        total += magnitude * scale;
        rest = remainder;
    }

    Duration::try_from_secs_f64(total).map_err(|_| fail())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("true", true)]
    #[case("True", true)]
    #[case("T", true)]
    #[case("1", true)]
    #[case("false", false)]
    #[case("F", false)]
    #[case("0", false)]
    fn boolean_literals(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(parse_scalar(raw, Scalar::Bool), Ok(Value::Bool(expected)));
    }

    #[rstest]
    #[case("yes")]
    #[case("TRUE ")]
    #[case("")]
    fn rejected_boolean_literals(#[case] raw: &str) {
        assert!(parse_scalar(raw, Scalar::Bool).is_err());
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(parse_scalar("-42", Scalar::Int), Ok(Value::Int(-42)));
        assert_eq!(parse_scalar("42", Scalar::Uint), Ok(Value::Uint(42)));
        assert_eq!(parse_scalar("2.5", Scalar::Float), Ok(Value::Float(2.5)));
        assert_eq!(
            parse_scalar("-1", Scalar::Uint),
            Err(CoerceError::parse("-1", "unsigned integer"))
        );
    }

    #[rstest]
    #[case("0", Duration::ZERO)]
    #[case("300ms", Duration::from_millis(300))]
    #[case("5s", Duration::from_secs(5))]
    #[case("1h30m", Duration::from_secs(5400))]
    #[case("1.5h", Duration::from_secs(5400))]
    #[case("2us", Duration::from_micros(2))]
    #[case("+10s", Duration::from_secs(10))]
    fn duration_literals(#[case] raw: &str, #[case] expected: Duration) {
        assert_eq!(
            parse_scalar(raw, Scalar::Duration),
            Ok(Value::Duration(expected))
        );
    }

    #[rstest]
    #[case("5")]
    #[case("-5s")]
    #[case("h")]
    #[case("1d")]
    #[case("")]
    fn rejected_duration_literals(#[case] raw: &str) {
        assert!(parse_scalar(raw, Scalar::Duration).is_err());
    }

    #[test]
    fn sequences_split_on_commas() {
        assert_eq!(
            parse_sequence("a,b,c", Scalar::Str),
            Ok(Value::Seq(vec![
                Value::Str("a".to_owned()),
                Value::Str("b".to_owned()),
                Value::Str("c".to_owned()),
            ]))
        );
    }

    #[test]
    fn sequence_errors_carry_the_element_index() {
        let err = parse_sequence("1,x,3", Scalar::Int).unwrap_err();
        assert_eq!(
            err,
            CoerceError::Element {
                index: 1,
                source: Box::new(CoerceError::parse("x", "integer")),
            }
        );
        assert_eq!(err.to_string(), "element 1: cannot parse 'x' as integer");
    }

    #[test]
    fn decoded_scalars_keep_native_types() {
        assert_eq!(
            from_decoded(&serde_json::json!(8080), Scalar::Uint),
            Ok(Value::Uint(8080))
        );
        assert_eq!(
            from_decoded(&serde_json::json!(true), Scalar::Bool),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            from_decoded(&serde_json::json!(-1), Scalar::Int),
            Ok(Value::Int(-1))
        );
    }

    #[test]
    fn decoded_strings_fall_back_to_literal_parsing() {
        assert_eq!(
            from_decoded(&serde_json::json!("9090"), Scalar::Uint),
            Ok(Value::Uint(9090))
        );
        assert_eq!(
            from_decoded(&serde_json::json!("45s"), Scalar::Duration),
            Ok(Value::Duration(Duration::from_secs(45)))
        );
    }

    #[test]
    fn decoded_numbers_where_strings_are_expected_fail() {
        assert_eq!(
            from_decoded(&serde_json::json!(3), Scalar::Str),
            Err(CoerceError::parse("3", "string"))
        );
    }

    #[test]
    fn decoded_arrays_coerce_element_wise() {
        let decoded = serde_json::json!([1, 2, "3"]);
        assert_eq!(
            sequence_from_decoded(&decoded, Scalar::Uint),
            Ok(Value::Seq(vec![
                Value::Uint(1),
                Value::Uint(2),
                Value::Uint(3),
            ]))
        );

        let bad = serde_json::json!([1, "x"]);
        assert!(matches!(
            sequence_from_decoded(&bad, Scalar::Uint),
            Err(CoerceError::Element { index: 1, .. })
        ));
    }
}

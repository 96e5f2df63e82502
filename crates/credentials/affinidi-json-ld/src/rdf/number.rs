//! Canonical lexical forms of JSON numbers as RDF literals.

use serde_json::Number;

use crate::model::xsd;

/// Magnitude from which numbers are always written as doubles.
const DOUBLE_THRESHOLD: f64 = 1e21;

/// Formats `value` as an `xsd:double` in the `0.0##############E0` shape:
/// one integer digit, one to fifteen fraction digits, and an unsigned-unless-negative exponent.
pub fn canonical_double(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0E0".to_string() } else { "0.0E0".to_string() };
    }
    let formatted = format!("{value:.15e}");
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return formatted;
    };
    let mantissa = match mantissa.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            let frac = if frac.is_empty() { "0" } else { frac };
            format!("{int}.{frac}")
        }
        None => format!("{mantissa}.0"),
    };
    format!("{mantissa}E{exponent}")
}

/// Lexical form and default datatype of a JSON number.
///
/// Integral values below 10^21 become `xsd:integer`; everything else, and any
/// value explicitly typed `xsd:double`, is written as a double.
pub fn lexical_form(number: &Number, datatype: Option<&str>) -> (String, &'static str) {
    let as_double = datatype == Some(xsd::DOUBLE);
    if !as_double && (number.is_i64() || number.is_u64()) {
        return (number.to_string(), xsd::INTEGER);
    }

    let value = number.as_f64().unwrap_or(f64::NAN);
    if !as_double && value.fract() == 0.0 && value.abs() < DOUBLE_THRESHOLD {
        let integer = format!("{value:.0}");
        let integer = if integer == "-0" { "0".to_string() } else { integer };
        return (integer, xsd::INTEGER);
    }
    (canonical_double(value), xsd::DOUBLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(value: serde_json::Value) -> Number {
        match value {
            serde_json::Value::Number(n) => n,
            other => panic!("not a number: {other}"),
        }
    }

    #[test]
    fn doubles_use_scientific_notation() {
        assert_eq!(canonical_double(1e21), "1.0E21");
        assert_eq!(canonical_double(1.1), "1.1E0");
        assert_eq!(canonical_double(-0.0015), "-1.5E-3");
        assert_eq!(canonical_double(123456.789), "1.23456789E5");
        assert_eq!(canonical_double(0.0), "0.0E0");
    }

    #[test]
    fn integers_and_integral_floats() {
        assert_eq!(lexical_form(&number(json!(42)), None), ("42".to_string(), xsd::INTEGER));
        assert_eq!(lexical_form(&number(json!(5.0)), None), ("5".to_string(), xsd::INTEGER));
        assert_eq!(lexical_form(&number(json!(5)), Some(xsd::DOUBLE)), ("5.0E0".to_string(), xsd::DOUBLE));
        assert_eq!(lexical_form(&number(json!(1.0e21)), None), ("1.0E21".to_string(), xsd::DOUBLE));
        assert_eq!(lexical_form(&number(json!(2.5)), None), ("2.5E0".to_string(), xsd::DOUBLE));
    }
}

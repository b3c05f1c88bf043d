//! Lenient conversions behind the session's typed getters.
//!
//! Every function falls back to the type's zero value when the input is
//! absent or cannot be converted.

use serde_json::Value;

pub(crate) fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim(),
            "1" | "t" | "T" | "true" | "TRUE" | "True"
        ),
        _ => false,
    }
}

pub(crate) fn to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn to_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        // Strings must hold an integer; "10.0" is one, "10.5" is not
        Some(Value::String(s)) => trim_zero_decimal(s.trim()).parse().unwrap_or(0),
        Some(Value::Bool(true)) => 1,
        _ => 0,
    }
}

fn trim_zero_decimal(s: &str) -> &str {
    match s.split_once('.') {
        Some((int, frac)) if !int.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        _ => s,
    }
}

pub(crate) fn to_float64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(true)) => 1.0,
        _ => 0.0,
    }
}

pub(crate) fn to_string_slice(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(|v| to_string(Some(v))).collect(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool() {
        assert!(to_bool(Some(&json!(true))));
        assert!(to_bool(Some(&json!("true"))));
        assert!(to_bool(Some(&json!(2))));
        assert!(!to_bool(Some(&json!("yes"))));
        assert!(!to_bool(None));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(to_int(Some(&json!(30))), 30);
        assert_eq!(to_int(Some(&json!(10.9))), 10);
        assert_eq!(to_int(Some(&json!(" 42 "))), 42);
        assert_eq!(to_int(Some(&json!("10.5"))), 0);
        assert_eq!(to_int(Some(&json!("10.00"))), 10);
        assert_eq!(to_int(Some(&json!([1]))), 0);
        assert_eq!(to_float64(Some(&json!(10.1))), 10.1);
        assert_eq!(to_float64(Some(&json!("2.5"))), 2.5);
        assert_eq!(to_float64(Some(&json!("abc"))), 0.0);
    }

    #[test]
    fn test_strings() {
        assert_eq!(to_string(Some(&json!("tree.xie"))), "tree.xie");
        assert_eq!(to_string(Some(&json!(1))), "1");
        assert_eq!(to_string(Some(&json!({"a": 1}))), "");
        assert_eq!(to_string_slice(Some(&json!(["a", "b"]))), vec!["a", "b"]);
        assert_eq!(to_string_slice(Some(&json!("a b"))), vec!["a", "b"]);
        assert!(to_string_slice(None).is_empty());
    }
}

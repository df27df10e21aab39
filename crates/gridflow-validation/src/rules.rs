//! Validation rules
//!
//! Each rule consumes one parameter from [`RawParams`] and, on success,
//! records its validated value in [`SafeParams`].

use regex::Regex;

use crate::error::{ValidationError, ValidationResult};
use crate::params::{RawParams, SafeParams, SafeValue};

/// Inclusive bounds for integer parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumBounds {
    /// Smallest accepted value
    pub min: Option<i64>,
    /// Largest accepted value
    pub max: Option<i64>,
}

impl NumBounds {
    /// No bounds at all
    pub const NONE: NumBounds = NumBounds { min: None, max: None };

    /// Only non-negative values
    pub const NON_NEGATIVE: NumBounds = NumBounds { min: Some(0), max: None };

    /// Values within `min..=max`
    pub fn range(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

/// Validate a single string parameter against `grammar`
pub fn validate_str(
    name: &str,
    raw: &mut RawParams,
    safe: &mut SafeParams,
    grammar: &Regex,
    optional: bool,
) -> ValidationResult<()> {
    let value = match single_value(name, raw, optional)? {
        Some(value) => value,
        None => {
            safe.insert(name, SafeValue::Missing);
            return Ok(());
        }
    };

    check_str(name, &value, grammar)?;
    safe.insert(name, SafeValue::Str(value));
    Ok(())
}

/// Validate a list of strings; every element must match `grammar`
///
/// An absent parameter yields an empty list.
pub fn validate_strlist(
    name: &str,
    raw: &mut RawParams,
    safe: &mut SafeParams,
    grammar: &Regex,
) -> ValidationResult<()> {
    let values = raw.take(name).unwrap_or_default();
    for value in &values {
        check_str(name, value, grammar)?;
    }
    safe.insert(name, SafeValue::StrList(values));
    Ok(())
}

/// Validate a single integer parameter
pub fn validate_num(
    name: &str,
    raw: &mut RawParams,
    safe: &mut SafeParams,
    optional: bool,
    bounds: NumBounds,
) -> ValidationResult<()> {
    let value = match single_value(name, raw, optional)? {
        Some(value) => value,
        None => {
            safe.insert(name, SafeValue::Missing);
            return Ok(());
        }
    };

    let num = check_num(name, &value, bounds)?;
    safe.insert(name, SafeValue::Num(num));
    Ok(())
}

/// Validate a list of integers; an absent parameter yields an empty list
pub fn validate_numlist(
    name: &str,
    raw: &mut RawParams,
    safe: &mut SafeParams,
    bounds: NumBounds,
) -> ValidationResult<()> {
    let values = raw.take(name).unwrap_or_default();
    let nums = values
        .iter()
        .map(|v| check_num(name, v, bounds))
        .collect::<ValidationResult<Vec<_>>>()?;
    safe.insert(name, SafeValue::NumList(nums));
    Ok(())
}

fn single_value(name: &str, raw: &mut RawParams, optional: bool) -> ValidationResult<Option<String>> {
    match raw.take(name) {
        None if optional => Ok(None),
        None => Err(ValidationError::MissingParameter(name.to_string())),
        Some(mut values) => {
            if values.len() != 1 {
                return Err(ValidationError::invalid(
                    name,
                    format!("expected a single value, got {}", values.len()),
                ));
            }
            Ok(values.pop())
        }
    }
}

fn check_str(name: &str, value: &str, grammar: &Regex) -> ValidationResult<()> {
    if grammar.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(name, "value does not match the expected format"))
    }
}

fn check_num(name: &str, value: &str, bounds: NumBounds) -> ValidationResult<i64> {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid(name, "not an integer"));
    }

    let num: i64 = value
        .parse()
        .map_err(|_| ValidationError::invalid(name, "integer out of range"))?;

    if let Some(min) = bounds.min {
        if num < min {
            return Err(ValidationError::invalid(name, format!("value too small, minimum is {}", min)));
        }
    }
    if let Some(max) = bounds.max {
        if num > max {
            return Err(ValidationError::invalid(name, format!("value too large, maximum is {}", max)));
        }
    }

    Ok(num)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_validate_str_required_and_optional() {
        let mut safe = SafeParams::new();

        let mut params = raw(&[]);
        let err = validate_str("workflow", &mut params, &mut safe, &grammar::WORKFLOW_NAME, false)
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingParameter("workflow".to_string()));

        validate_str("campaign", &mut params, &mut safe, &grammar::CAMPAIGN, true).unwrap();
        assert_eq!(safe.get("campaign"), Some(&SafeValue::Missing));
    }

    #[test]
    fn test_validate_str_consumes_parameter() {
        let mut safe = SafeParams::new();
        let mut params = raw(&[("workflow", "wf1"), ("other", "x")]);

        validate_str("workflow", &mut params, &mut safe, &grammar::WORKFLOW_NAME, false).unwrap();
        assert_eq!(safe.get("workflow"), Some(&SafeValue::Str("wf1".to_string())));
        assert_eq!(params.remaining(), vec!["other".to_string()]);
    }

    #[test]
    fn test_validate_str_rejects_repeated_value() {
        let mut safe = SafeParams::new();
        let mut params = raw(&[("workflow", "a"), ("workflow", "b")]);
        let err = validate_str("workflow", &mut params, &mut safe, &grammar::WORKFLOW_NAME, false)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParameter { ref name, .. } if name == "workflow"));
    }

    #[test]
    fn test_validate_strlist_checks_every_element() {
        let mut safe = SafeParams::new();
        let mut params = raw(&[("sitewhitelist", "T2_CH_CERN"), ("sitewhitelist", "nowhere")]);
        assert!(validate_strlist("sitewhitelist", &mut params, &mut safe, &grammar::SITE).is_err());

        let mut params = raw(&[]);
        validate_strlist("sitewhitelist", &mut params, &mut safe, &grammar::SITE).unwrap();
        assert_eq!(safe.get("sitewhitelist"), Some(&SafeValue::StrList(vec![])));
    }

    #[test]
    fn test_validate_num_parsing_and_bounds() {
        let mut safe = SafeParams::new();

        let mut params = raw(&[("limit", "25")]);
        validate_num("limit", &mut params, &mut safe, true, NumBounds::NON_NEGATIVE).unwrap();
        assert_eq!(safe.get("limit"), Some(&SafeValue::Num(25)));

        let mut params = raw(&[("limit", "-1")]);
        assert!(validate_num("limit", &mut params, &mut safe, true, NumBounds::NON_NEGATIVE).is_err());

        let mut params = raw(&[("algoargs", "-5")]);
        validate_num("algoargs", &mut params, &mut safe, false, NumBounds::NONE).unwrap();
        assert_eq!(safe.get("algoargs"), Some(&SafeValue::Num(-5)));

        for bad in ["", "1.5", "ten", "99999999999999999999", " 1"] {
            let mut params = raw(&[("limit", bad)]);
            assert!(
                validate_num("limit", &mut params, &mut safe, true, NumBounds::NONE).is_err(),
                "{:?} should be rejected",
                bad
            );
        }

        let mut params = raw(&[("force", "3")]);
        assert!(validate_num("force", &mut params, &mut safe, true, NumBounds::range(0, 1)).is_err());
    }

    #[test]
    fn test_validate_numlist() {
        let mut safe = SafeParams::new();
        let mut params = raw(&[("runs", "1"), ("runs", "2")]);
        validate_numlist("runs", &mut params, &mut safe, NumBounds::NON_NEGATIVE).unwrap();
        assert_eq!(safe.take_num_list("runs"), vec![1, 2]);

        let mut params = raw(&[("runs", "1"), ("runs", "x")]);
        assert!(validate_numlist("runs", &mut params, &mut safe, NumBounds::NONE).is_err());
    }
}

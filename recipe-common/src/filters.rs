//! Query parameter parsing for list filters

use crate::validation::{FieldErrors, INVALID_INTEGER};

/// Parse a comma-separated id list such as `"1,2,3"`
///
/// Items are trimmed. An empty or non-integer item is a validation error
/// reported under `param`.
///
/// ```
/// use recipe_common::filters::parse_id_list;
///
/// assert_eq!(parse_id_list("tags", "1, 2,3").unwrap(), vec![1, 2, 3]);
/// assert!(parse_id_list("tags", "1,x").is_err());
/// ```
pub fn parse_id_list(param: &str, raw: &str) -> Result<Vec<i64>, FieldErrors> {
    raw.split(',')
        .map(|item| {
            item.trim().parse::<i64>().map_err(|_| {
                FieldErrors::single(
                    param,
                    format!("Expected a comma separated list of integer IDs, got {:?}.", raw),
                )
            })
        })
        .collect()
}

/// Parse an optional id-list parameter; absent or empty means "no filter"
pub fn optional_id_list(param: &str, raw: Option<&str>) -> Result<Option<Vec<i64>>, FieldErrors> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_id_list(param, raw).map(Some),
    }
}

/// Parse an integer flag such as `assigned_only=1`
///
/// Absent means `false`; any non-zero integer means `true`.
pub fn parse_int_flag(param: &str, raw: Option<&str>) -> Result<bool, FieldErrors> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(raw) => raw
            .parse::<i64>()
            .map(|value| value != 0)
            .map_err(|_| FieldErrors::single(param, INVALID_INTEGER)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_id() {
        assert_eq!(parse_id_list("tags", "7").unwrap(), vec![7]);
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        assert_eq!(parse_id_list("tags", "3,1,3").unwrap(), vec![3, 1, 3]);
    }

    #[test]
    fn test_parse_rejects_empty_items() {
        assert!(parse_id_list("tags", "1,,2").is_err());
        assert!(parse_id_list("tags", "1,").is_err());
    }

    #[test]
    fn test_parse_error_names_parameter() {
        let err = parse_id_list("ingredients", "a").unwrap_err();
        assert!(err.contains("ingredients"));
    }

    #[test]
    fn test_optional_id_list() {
        assert_eq!(optional_id_list("tags", None).unwrap(), None);
        assert_eq!(optional_id_list("tags", Some("")).unwrap(), None);
        assert_eq!(optional_id_list("tags", Some("4,5")).unwrap(), Some(vec![4, 5]));
    }

    #[test]
    fn test_int_flag() {
        assert!(!parse_int_flag("assigned_only", None).unwrap());
        assert!(!parse_int_flag("assigned_only", Some("0")).unwrap());
        assert!(parse_int_flag("assigned_only", Some("1")).unwrap());
        assert!(parse_int_flag("assigned_only", Some("true")).is_err());
    }
}

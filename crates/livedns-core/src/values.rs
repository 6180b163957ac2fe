//! Value set helpers
//!
//! Pure functions over ordered sequences of record values. Order is
//! preserved everywhere so that a value set written to the remote store
//! keeps the ordering it was read with, plus any new values appended.
//!
//! TXT values are conventionally stored wrapped in one pair of double
//! quotes. Callers may declare values with or without them; the helpers
//! here let the reconciler compare and write them in the quoted form.

use crate::error::{Error, Result};

const QUOTE: char = '"';

/// Remove later duplicates, keeping the first occurrence of each value
///
/// # Example
///
/// ```rust
/// use livedns_core::values::deduplicate;
///
/// let values = vec!["a", "b", "a", "c"].into_iter().map(String::from).collect::<Vec<_>>();
/// assert_eq!(deduplicate(&values), vec!["a", "b", "c"]);
/// ```
pub fn deduplicate(values: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(value) {
            unique.push(value.clone());
        }
    }
    unique
}

/// Whether `value` starts and ends with a double quote
///
/// A lone `"` is not considered quoted.
pub fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with(QUOTE) && value.ends_with(QUOTE)
}

/// Wrap `value` in double quotes unless it already is
pub fn quote_if_needed(value: &str) -> String {
    if is_quoted(value) {
        value.to_string()
    } else {
        format!("{QUOTE}{value}{QUOTE}")
    }
}

/// Quote every value of a sequence, keeping order and duplicates
pub fn quote_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| quote_if_needed(v)).collect()
}

/// Position of the first value equal to `target`
pub fn index_of(values: &[String], target: &str) -> Option<usize> {
    values.iter().position(|v| v == target)
}

/// Copy of `values` without the element at `index`
///
/// Only meaningful with an index obtained from [`index_of`] on the same
/// sequence; anything else is rejected.
pub fn remove_at(values: &[String], index: usize) -> Result<Vec<String>> {
    if index >= values.len() {
        return Err(Error::invalid_input(format!(
            "index {} out of bounds for {} value(s)",
            index,
            values.len()
        )));
    }

    let mut remaining = Vec::with_capacity(values.len() - 1);
    remaining.extend_from_slice(&values[..index]);
    remaining.extend_from_slice(&values[index + 1..]);
    Ok(remaining)
}

/// Union of `remote` and `local`, quoted and deduplicated
///
/// Remote values keep their position; local values not yet present are
/// appended in declaration order. This is the value set written for a
/// shared record.
pub fn merge_shared(remote: &[String], local: &[String]) -> Vec<String> {
    let combined: Vec<String> = remote.iter().chain(local.iter()).cloned().collect();
    deduplicate(&quote_all(&combined))
}

/// `remote` with the quoted form of each `local` value withdrawn
///
/// Each local value removes at most one remote entry (the first match).
/// Local values absent from `remote` are ignored.
pub fn withdraw(remote: &[String], local: &[String]) -> Result<Vec<String>> {
    let mut remaining = remote.to_vec();
    for value in local {
        if let Some(index) = index_of(&remaining, &quote_if_needed(value)) {
            remaining = remove_at(&remaining, index)?;
        }
    }
    Ok(remaining)
}

/// Whether two value sequences hold the same set of values
pub fn same_set(a: &[String], b: &[String]) -> bool {
    let a = deduplicate(a);
    let b = deduplicate(b);
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_deduplicate_keeps_first_seen_order() {
        let values = strings(&["a", "b", "a", "c"]);
        assert_eq!(deduplicate(&values), strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let values = strings(&["record_one", "record_two", "record_three", "record_one", "tf_record_two"]);
        let once = deduplicate(&values);
        assert_eq!(once.len(), 4);
        assert_eq!(deduplicate(&once), once);
    }

    #[test]
    fn test_is_quoted() {
        assert!(is_quoted("\"192.168.0.1\""));
        assert!(is_quoted("\"\""));
        assert!(!is_quoted("192.168.0.1\""));
        assert!(!is_quoted("\"192.168.0.1"));
        assert!(!is_quoted("192.168.0.1"));
        assert!(!is_quoted("\""));
        assert!(!is_quoted(""));
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("192.168.0.1"), "\"192.168.0.1\"");
        assert_eq!(quote_if_needed("\"192.168.0.1\""), "\"192.168.0.1\"");
        assert_eq!(quote_if_needed("\""), "\"\"\"");

        let once = quote_if_needed("v=spf1 -all");
        assert_eq!(quote_if_needed(&once), once);
    }

    #[test]
    fn test_quote_all() {
        let values = strings(&["\"192.168.0.1\"", "192.168.0.2", "192.168.0.3", "\"192.168.0.1\""]);
        assert_eq!(
            quote_all(&values),
            strings(&["\"192.168.0.1\"", "\"192.168.0.2\"", "\"192.168.0.3\"", "\"192.168.0.1\""])
        );
    }

    #[test]
    fn test_index_of() {
        let values = strings(&["192.168.1.1", "10.10.0.0", "0.0.0.0"]);
        assert_eq!(index_of(&values, "10.10.0.0"), Some(1));
        assert_eq!(index_of(&values, "192.168.1.1"), Some(0));

        let values = strings(&["192.168.1.1", "10.10.10.10", "0.0.0.0"]);
        assert_eq!(index_of(&values, "10.10.0.0"), None);
    }

    #[test]
    fn test_remove_at() {
        let values = strings(&["192.168.1.1", "10.10.10.10", "0.0.0.0"]);

        assert_eq!(remove_at(&values, 0).unwrap(), strings(&["10.10.10.10", "0.0.0.0"]));
        assert_eq!(remove_at(&values, 2).unwrap(), strings(&["192.168.1.1", "10.10.10.10"]));
        assert!(remove_at(&values, 3).is_err());
        // Input is untouched
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_index_of_then_remove_at() {
        let values = strings(&["a", "b", "c", "d"]);
        for target in &values {
            let index = index_of(&values, target).unwrap();
            let remaining = remove_at(&values, index).unwrap();
            assert_eq!(remaining.len(), values.len() - 1);
            assert!(!remaining.contains(target));
        }
    }

    #[test]
    fn test_merge_shared_quotes_and_dedups() {
        let remote = strings(&["\"a\"", "\"b\""]);
        let local = strings(&["b", "c", "\"c\""]);
        assert_eq!(merge_shared(&remote, &local), strings(&["\"a\"", "\"b\"", "\"c\""]));
    }

    #[test]
    fn test_withdraw_first_match_only() {
        let remote = strings(&["\"a\"", "\"b\"", "\"c\"", "\"b\""]);
        let remaining = withdraw(&remote, &strings(&["b", "zzz"])).unwrap();
        assert_eq!(remaining, strings(&["\"a\"", "\"c\"", "\"b\""]));
    }

    #[test]
    fn test_same_set() {
        assert!(same_set(&strings(&["a", "b"]), &strings(&["b", "a"])));
        assert!(same_set(&strings(&["a", "a", "b"]), &strings(&["b", "a"])));
        assert!(!same_set(&strings(&["a"]), &strings(&["a", "b"])));
        assert!(!same_set(&strings(&["\"a\""]), &strings(&["a"])));
    }
}

//! Delimited multi-value strings
//!
//! Resource-name lists and multi-status acceptance lists travel through build
//! properties as a single string joined by a delimiter.

/// Delimiter used when none is configured
pub const DEFAULT_DELIMITER: &str = ",";

/// Split `value` on `delimiter`, dropping empty segments
///
/// An empty delimiter keeps `value` whole.
pub fn split(value: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return if value.is_empty() {
            Vec::new()
        } else {
            vec![value.to_string()]
        };
    }

    value
        .split(delimiter)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join<S: AsRef<str>>(values: &[S], delimiter: &str) -> String {
    values
        .iter()
        .map(|value| value.as_ref())
        .collect::<Vec<&str>>()
        .join(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_default_delimiter() {
        assert_eq!(
            split("CREATE_COMPLETE,UPDATE_COMPLETE", DEFAULT_DELIMITER),
            vec!["CREATE_COMPLETE", "UPDATE_COMPLETE"]
        );
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(split("a,,b,", ","), vec!["a", "b"]);
        assert!(split("", ",").is_empty());
    }

    #[test]
    fn test_split_multichar_and_empty_delimiter() {
        assert_eq!(split("a::b", "::"), vec!["a", "b"]);
        assert_eq!(split("a,b", ""), vec!["a,b"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["g1", "g2"], ";"), "g1;g2");
        assert_eq!(join::<String>(&[], ","), "");
    }
}

/// True when `raw` is non-empty and made only of ASCII digits.
pub fn is_ascii_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit())
}

/// Parse a comma or whitespace separated list of snowflake ids, skipping
/// entries that are not valid ids.
pub fn parse_id_list(raw: &str) -> Vec<u64> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.parse::<u64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{is_ascii_digits, parse_id_list};

    #[test]
    fn digits_only() {
        assert!(is_ascii_digits("123456"));
        assert!(!is_ascii_digits(""));
        assert!(!is_ascii_digits("12a"));
        assert!(!is_ascii_digits("-12"));
        assert!(!is_ascii_digits("br"));
    }

    #[test]
    fn id_lists() {
        assert_eq!(parse_id_list("1,2, 3"), vec![1, 2, 3]);
        assert_eq!(parse_id_list(" 10  20 "), vec![10, 20]);
        assert_eq!(parse_id_list("5,,abc,6"), vec![5, 6]);
        assert!(parse_id_list("").is_empty());
    }
}

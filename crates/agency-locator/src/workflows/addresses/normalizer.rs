/// Splits an address into comma/semicolon delimited segments of whitespace
/// tokens. Empty segments are dropped.
pub(crate) fn segment_tokens(value: &str) -> Vec<Vec<String>> {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned
        .split([',', ';'])
        .map(|segment| {
            segment
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

pub(crate) fn strip_spaces(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// True when either value contains the other, either verbatim or once all
/// whitespace is removed from both.
pub(crate) fn is_substring(left: &str, right: &str) -> bool {
    if right.contains(left) || left.contains(right) {
        return true;
    }

    let left = strip_spaces(left);
    let right = strip_spaces(right);
    right.contains(&left) || left.contains(&right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_split_on_commas_and_collapse_whitespace() {
        let segments = segment_tokens("\u{feff}1  Main St,  Chicago , IL 60601");
        assert_eq!(
            segments,
            vec![
                vec!["1".to_string(), "Main".to_string(), "St".to_string()],
                vec!["Chicago".to_string()],
                vec!["IL".to_string(), "60601".to_string()],
            ]
        );
        assert!(segment_tokens(" , ,").is_empty());
    }

    #[test]
    fn substring_checks_both_directions_and_ignores_spacing() {
        assert!(is_substring("Ste 200", "Ste 200A"));
        assert!(is_substring("Suite 200A", "200A"));
        assert!(is_substring("Mc Allister", "McAllister"));
        assert!(!is_substring("Main", "Maple"));
    }
}

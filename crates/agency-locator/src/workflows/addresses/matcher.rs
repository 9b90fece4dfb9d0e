use super::normalizer::is_substring;
use super::parser::{AddressParser, ComponentKind, RuleBasedParser, StructuredAddress};
use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of comparing two address strings.
///
/// `reconcile` names the components whose values differ in a tolerated way
/// and should be normalized to one canonical value. It is empty whenever
/// `is_match` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressComparison {
    pub is_match: bool,
    pub reconcile: BTreeSet<ComponentKind>,
}

impl AddressComparison {
    fn mismatch() -> Self {
        Self::default()
    }

    pub fn needs_reconciliation(&self) -> bool {
        self.is_match && !self.reconcile.is_empty()
    }
}

/// Decides whether two address strings denote the same physical location.
#[derive(Debug, Clone)]
pub struct AddressMatcher<P = RuleBasedParser> {
    parser: P,
}

impl Default for AddressMatcher<RuleBasedParser> {
    fn default() -> Self {
        Self::new(RuleBasedParser)
    }
}

impl<P: AddressParser> AddressMatcher<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    pub fn compare(&self, left: &str, right: &str) -> AddressComparison {
        let left_parsed = self.parser.parse(left);
        let right_parsed = self.parser.parse(right);
        compare_structured(left, &left_parsed, right, &right_parsed)
    }
}

/// House numbers must agree exactly. Post types ("St" vs "Street") never
/// disqualify. Any other component may be missing on the right or differ by
/// containment; everything else is a hard mismatch.
pub fn compare_structured(
    left_text: &str,
    left: &StructuredAddress,
    right_text: &str,
    right: &StructuredAddress,
) -> AddressComparison {
    let mut reconcile = BTreeSet::new();

    if !left.contains(ComponentKind::StreetNamePostType)
        && right.contains(ComponentKind::StreetNamePostType)
    {
        reconcile.insert(ComponentKind::StreetNamePostType);
    }

    for (kind, left_value) in left.iter() {
        let Some(right_value) = right.get(kind) else {
            reconcile.insert(kind);
            continue;
        };

        if kind == ComponentKind::StreetNamePostType {
            if left_value != right_value {
                reconcile.insert(kind);
            }
            continue;
        }

        if left_value == right_value {
            continue;
        }

        if kind == ComponentKind::AddressNumber || !is_substring(left_value, right_value) {
            return AddressComparison::mismatch();
        }

        reconcile.insert(kind);
    }

    // One recognized component is too little evidence on its own.
    let thin_left = left.len() == 1 && !is_substring(left_text, right_text);
    let thin_right = right.len() == 1 && !is_substring(right_text, left_text);
    if thin_left || thin_right {
        return AddressComparison::mismatch();
    }

    AddressComparison {
        is_match: true,
        reconcile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(left: &str, right: &str) -> AddressComparison {
        AddressMatcher::default().compare(left, right)
    }

    #[test]
    fn street_type_variants_match_and_reconcile_post_type() {
        let result = compare("123 Main St", "123 Main Street");
        assert!(result.is_match);
        assert!(result.reconcile.contains(&ComponentKind::StreetNamePostType));

        let result = compare("123 Main", "123 Main Street");
        assert!(result.is_match);
        assert_eq!(
            result.reconcile.into_iter().collect::<Vec<_>>(),
            vec![ComponentKind::StreetNamePostType]
        );
    }

    #[test]
    fn differing_house_numbers_never_match() {
        assert!(!compare("123 Main St", "124 Main St").is_match);
        assert!(!compare("1 Main St, Chicago, IL 60601", "2 Main St, Chicago, IL 60601").is_match);
    }

    #[test]
    fn missing_components_on_the_right_are_reconciled() {
        let result = compare("1 Main St Ste 200, Chicago, IL 60601", "1 Main St");
        assert!(result.is_match);
        assert!(result.reconcile.contains(&ComponentKind::OccupancyType));
        assert!(result.reconcile.contains(&ComponentKind::PlaceName));
        assert!(result.reconcile.contains(&ComponentKind::ZipCode));
    }

    #[test]
    fn substring_values_are_reconciled_but_unrelated_values_are_not() {
        let result = compare("10 Mc Allister Ave", "10 McAllister Ave");
        assert!(result.is_match);
        assert!(result.reconcile.contains(&ComponentKind::StreetName));

        assert!(!compare("10 Oak Ave", "10 Elm Ave").is_match);
    }

    #[test]
    fn thin_addresses_require_full_string_containment() {
        assert!(!compare("Headquarters", "Main Office").is_match);
        assert!(compare("Main", "Main").is_match);
    }

    #[test]
    fn mismatch_carries_no_reconciliation() {
        let result = compare("5 Oak Ave", "6 Oak Street");
        assert!(!result.is_match);
        assert!(result.reconcile.is_empty());
        assert!(!result.needs_reconciliation());
    }

    #[test]
    fn default_matcher_uses_the_rule_based_parser() {
        let matcher = AddressMatcher::default();
        assert!(matcher.compare("123 Main St", "123 Main Street").is_match);
        assert_eq!(
            matcher.parser().parse("123 Main St").get(ComponentKind::AddressNumber),
            Some("123")
        );
    }

    #[test]
    fn structured_comparison_accepts_any_parser_output() {
        let left: StructuredAddress = [
            (ComponentKind::AddressNumber, "9"),
            (ComponentKind::StreetName, "Lake"),
        ]
        .into_iter()
        .collect();
        let right: StructuredAddress = [
            (ComponentKind::AddressNumber, "9"),
            (ComponentKind::StreetName, "Lake Shore"),
        ]
        .into_iter()
        .collect();

        let result = compare_structured("9 Lake", &left, "9 Lake Shore", &right);
        assert!(result.is_match);
        assert!(result.reconcile.contains(&ComponentKind::StreetName));
    }
}

//! Tests for label selector matching

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::selector::matches_selector;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_selector_matches_anything() {
        assert!(matches_selector(None, ""));
        assert!(matches_selector(Some(&labels(&[("app", "test")])), ""));
        assert!(matches_selector(Some(&BTreeMap::new()), ""));
    }

    #[test]
    fn single_clause_matches_equal_label() {
        let lbls = labels(&[("app", "test")]);
        assert!(matches_selector(Some(&lbls), "app=test"));
    }

    #[test]
    fn missing_key_rejects() {
        let lbls = labels(&[("app", "test")]);
        assert!(!matches_selector(Some(&lbls), "app=test,env=dev"));
    }

    #[test]
    fn value_mismatch_rejects() {
        let lbls = labels(&[("app", "test"), ("env", "prod")]);
        assert!(!matches_selector(Some(&lbls), "app=test,env=dev"));
    }

    #[test]
    fn absent_label_map_rejects_a_non_empty_selector() {
        assert!(!matches_selector(None, "app=test"));
    }

    #[test]
    fn clause_without_equals_always_rejects() {
        let lbls = labels(&[("app", "test")]);
        assert!(!matches_selector(Some(&lbls), "app"));
        assert!(!matches_selector(Some(&lbls), "app=test,oops"));
        assert!(!matches_selector(None, "oops"));
    }

    #[test]
    fn whitespace_around_clauses_keys_and_values_is_insignificant() {
        let lbls = labels(&[("app", "test"), ("env", "dev")]);
        assert!(matches_selector(Some(&lbls), " app = test , env = dev "));
        assert!(matches_selector(Some(&lbls), "app=test,\tenv=dev"));
    }

    #[test]
    fn value_is_everything_after_the_first_equals() {
        let lbls = labels(&[("cfg", "a=b")]);
        assert!(matches_selector(Some(&lbls), "cfg=a=b"));
        assert!(!matches_selector(Some(&lbls), "cfg=a"));
    }

    #[test]
    fn stray_commas_are_skipped() {
        let lbls = labels(&[("app", "test")]);
        assert!(matches_selector(Some(&lbls), ",app=test,"));
        assert!(matches_selector(Some(&lbls), "app=test,,"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let lbls = labels(&[("app", "test")]);
        assert!(!matches_selector(Some(&lbls), "App=test"));
        assert!(!matches_selector(Some(&lbls), "app=Test"));
    }

    #[test]
    fn empty_value_clause_matches_an_empty_label_value() {
        let lbls = labels(&[("flag", "")]);
        assert!(matches_selector(Some(&lbls), "flag="));
        assert!(!matches_selector(Some(&labels(&[])), "flag="));
    }
}

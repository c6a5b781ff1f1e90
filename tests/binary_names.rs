// tests/binary_names.rs

use proptest::prelude::*;

use devloop::build::DEFAULT_BINARY;
use devloop::build::spec::normalize_binary_name;

proptest! {
    #[test]
    fn suffix_is_present_exactly_once(name in "[a-z][a-z0-9_-]{0,12}", with_suffix in any::<bool>()) {
        let input = if with_suffix { format!("{name}.exe") } else { name.clone() };
        let normalized = normalize_binary_name(Some(&input), ".exe");

        prop_assert!(normalized.ends_with(".exe"));
        prop_assert!(!normalized.ends_with(".exe.exe"));
        prop_assert_eq!(normalized, format!("{name}.exe"));
    }

    #[test]
    fn without_suffix_names_pass_through(name in "[a-z][a-z0-9_.-]{0,12}") {
        prop_assert_eq!(normalize_binary_name(Some(&name), ""), name);
    }

    #[test]
    fn normalizing_twice_changes_nothing(name in "[a-z0-9_.-]{0,12}", suffix in prop::sample::select(vec!["", ".exe"])) {
        let once = normalize_binary_name(Some(&name), suffix);
        prop_assert_eq!(normalize_binary_name(Some(&once), suffix), once.clone());
        if name.is_empty() {
            prop_assert_eq!(once, format!("{DEFAULT_BINARY}{suffix}"));
        }
    }
}

//! Property-based tests for the status machine

use super::*;
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = ConversationStatus> {
    prop_oneof![
        Just(ConversationStatus::Active),
        Just(ConversationStatus::Intervened),
        Just(ConversationStatus::NoAnswer),
        Just(ConversationStatus::Closed),
    ]
}

fn arb_status_code() -> impl Strategy<Value = StatusCode> {
    prop_oneof![
        arb_status().prop_map(StatusCode::Known),
        "[A-Z_]{3,12}".prop_map(|raw| StatusCode::from(raw.as_str())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_no_self_transitions(status in arb_status()) {
        prop_assert!(!allowed_transitions(status).contains(&status));
    }

    #[test]
    fn prop_primary_action_is_allowed(status in arb_status()) {
        let allowed = allowed_transitions(status);
        prop_assume!(!allowed.is_empty());
        prop_assert!(allowed.contains(&primary_action(status)));
    }

    #[test]
    fn prop_transitions_have_no_duplicates(status in arb_status()) {
        let allowed = allowed_transitions(status);
        for (i, s) in allowed.iter().enumerate() {
            prop_assert!(!allowed[i + 1..].contains(s));
        }
    }

    #[test]
    fn prop_every_status_is_reachable_back_to_active(status in arb_status()) {
        prop_assert!(
            status == ConversationStatus::Active
                || allowed_transitions(status).contains(&ConversationStatus::Active)
        );
    }

    #[test]
    fn prop_code_round_trip(status in arb_status()) {
        prop_assert_eq!(ConversationStatus::from_code(status.code()), Some(status));
        prop_assert_eq!(
            ConversationStatus::from_code(&status.code().to_lowercase()),
            Some(status)
        );
        prop_assert_eq!(ConversationStatus::from_code(status.label()), Some(status));
    }

    #[test]
    fn prop_status_code_lookups_never_panic(code in arb_status_code()) {
        let target = code.primary_action();
        let allowed = code.allowed_transitions();
        prop_assert!(allowed.is_empty() || allowed.contains(&target));
        prop_assert!(!code.label().is_empty());
        prop_assert!(!code.primary_action_label().is_empty());
    }
}

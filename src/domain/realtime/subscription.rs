//! Per-connection chat subscriptions.

use std::collections::BTreeSet;

use thiserror::Error;

/// Chat ID token that subscribes to every chat.
pub const WILDCARD_CHAT_ID: &str = "*";

/// Errors raised while normalizing a requested subscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("chatIDs cannot combine '*' with specific IDs")]
    WildcardCombined,
}

/// What a connection wants to receive.
///
/// Wildcard and explicit chat IDs never mix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Subscription {
    /// Nothing is delivered.
    #[default]
    None,
    /// Every chat-scoped event is delivered.
    All,
    /// Events for these chats only. Sorted, deduplicated, never empty.
    Chats(Vec<String>),
}

impl Subscription {
    /// Normalizes requested chat IDs into a subscription.
    ///
    /// IDs are trimmed, blanks dropped, duplicates removed and the rest
    /// sorted. A lone `*` (possibly repeated) selects every chat.
    pub fn from_chat_ids<I, S>(chat_ids: I) -> Result<Self, SubscriptionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = chat_ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();

        if unique.contains(WILDCARD_CHAT_ID) {
            if unique.len() != 1 {
                return Err(SubscriptionError::WildcardCombined);
            }
            return Ok(Subscription::All);
        }
        if unique.is_empty() {
            return Ok(Subscription::None);
        }
        Ok(Subscription::Chats(unique.into_iter().collect()))
    }

    /// Whether an event for `chat_id` should reach this subscriber.
    pub fn matches(&self, chat_id: &str) -> bool {
        match self {
            Subscription::None => false,
            Subscription::All => true,
            Subscription::Chats(ids) => ids.binary_search_by(|id| id.as_str().cmp(chat_id)).is_ok(),
        }
    }

    /// The normalized chat ID list as echoed back to clients.
    pub fn chat_ids(&self) -> Vec<String> {
        match self {
            Subscription::None => Vec::new(),
            Subscription::All => vec![WILDCARD_CHAT_ID.to_string()],
            Subscription::Chats(ids) => ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn duplicates_are_removed_and_ids_sorted() {
        let sub = Subscription::from_chat_ids(["room2", "room1", "room1"]).unwrap();
        assert_eq!(sub.chat_ids(), vec!["room1", "room2"]);
    }

    #[test]
    fn whitespace_is_trimmed_and_blanks_dropped() {
        let sub = Subscription::from_chat_ids([" room1 ", "", "   "]).unwrap();
        assert_eq!(sub, Subscription::Chats(vec!["room1".to_string()]));
    }

    #[test]
    fn empty_request_unsubscribes() {
        let sub = Subscription::from_chat_ids(Vec::<String>::new()).unwrap();
        assert_eq!(sub, Subscription::None);
        assert!(sub.chat_ids().is_empty());
        assert!(!sub.matches("room1"));
    }

    #[test]
    fn lone_wildcard_subscribes_to_all() {
        let sub = Subscription::from_chat_ids(["*", " * "]).unwrap();
        assert_eq!(sub, Subscription::All);
        assert_eq!(sub.chat_ids(), vec!["*"]);
        assert!(sub.matches("anything"));
    }

    #[test]
    fn wildcard_with_specific_ids_is_rejected() {
        assert_eq!(
            Subscription::from_chat_ids(["*", "room1"]),
            Err(SubscriptionError::WildcardCombined)
        );
    }

    #[test]
    fn specific_subscription_matches_exact_ids_only() {
        let sub = Subscription::from_chat_ids(["room1", "room3"]).unwrap();
        assert!(sub.matches("room1"));
        assert!(sub.matches("room3"));
        assert!(!sub.matches("room2"));
    }

    fn chat_id() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z!$:.]{0,8}",
            Just("*".to_string()),
            Just("  room1 ".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(ids in proptest::collection::vec(chat_id(), 0..8)) {
            if let Ok(sub) = Subscription::from_chat_ids(&ids) {
                let again = Subscription::from_chat_ids(sub.chat_ids()).unwrap();
                prop_assert_eq!(again, sub);
            }
        }

        #[test]
        fn normalization_ignores_input_order(ids in proptest::collection::vec(chat_id(), 0..8)) {
            let mut reversed = ids.clone();
            reversed.reverse();
            prop_assert_eq!(
                Subscription::from_chat_ids(&ids),
                Subscription::from_chat_ids(&reversed)
            );
        }

        #[test]
        fn wildcard_mixed_with_ids_always_fails(ids in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
            let mut with_wildcard = ids.clone();
            with_wildcard.push("*".to_string());
            prop_assert_eq!(
                Subscription::from_chat_ids(&with_wildcard),
                Err(SubscriptionError::WildcardCombined)
            );
        }
    }
}

//! Reconciliation of the two relationship lists.
//!
//! Pure set-difference by account identity: everyone the subject follows
//! whose identity does not appear among the subject's followers.

use crate::model::{Account, Collection};
use std::collections::HashSet;

/// Compute the accounts in `following` that are absent from `followers`.
///
/// Membership is tested on the identity key only. The result preserves
/// `following`'s original order; nothing is re-sorted.
#[must_use]
pub fn reconcile(followers: &Collection, following: &Collection) -> Vec<Account> {
    let follower_ids: HashSet<&str> = followers
        .accounts
        .iter()
        .map(|a| a.pk.as_str())
        .collect();

    following
        .accounts
        .iter()
        .filter(|a| !follower_ids.contains(a.pk.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListKind;

    fn account(pk: &str) -> Account {
        Account {
            pk: pk.to_string(),
            username: format!("user{pk}"),
            full_name: None,
            profile_pic_url: None,
            is_verified: None,
        }
    }

    fn collection(kind: ListKind, pks: &[&str]) -> Collection {
        Collection::new(
            "42".to_string(),
            kind,
            pks.iter().map(|pk| account(pk)).collect(),
        )
    }

    #[test]
    fn result_excludes_every_follower_identity() {
        let followers = collection(ListKind::Followers, &["1", "2", "5"]);
        let following = collection(ListKind::Following, &["2", "3", "5", "7"]);

        let result = reconcile(&followers, &following);

        for account in &result {
            assert!(
                !followers.accounts.iter().any(|f| f.pk == account.pk),
                "{} should not be in the result",
                account.pk
            );
        }
        let pks: Vec<&str> = result.iter().map(|a| a.pk.as_str()).collect();
        assert_eq!(pks, vec!["3", "7"]);
    }

    #[test]
    fn result_is_a_subsequence_of_following() {
        let followers = collection(ListKind::Followers, &["2", "4"]);
        let following = collection(ListKind::Following, &["9", "2", "8", "4", "7"]);

        let result = reconcile(&followers, &following);

        // Walk `following` once; every result entry must appear in order.
        let mut cursor = following.accounts.iter();
        for entry in &result {
            assert!(
                cursor.any(|f| f.pk == entry.pk),
                "result is not a subsequence of following"
            );
        }
    }

    #[test]
    fn reconcile_against_itself_is_empty() {
        let list = collection(ListKind::Followers, &["1", "2", "3"]);
        let same = Collection::new("42".to_string(), ListKind::Following, list.accounts.clone());
        assert!(reconcile(&list, &same).is_empty());
    }

    #[test]
    fn one_sided_overlap_yields_the_unreciprocated() {
        let followers = collection(ListKind::Followers, &["1", "2"]);
        let following = collection(ListKind::Following, &["2", "3"]);

        let result = reconcile(&followers, &following);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pk, "3");
    }

    #[test]
    fn empty_followers_returns_all_of_following() {
        let followers = collection(ListKind::Followers, &[]);
        let following = collection(ListKind::Following, &["1", "2"]);
        assert_eq!(reconcile(&followers, &following).len(), 2);
    }

    #[test]
    fn field_drift_does_not_defeat_identity_match() {
        let mut follower = account("1");
        follower.username = "old_handle".to_string();
        let followers = Collection::new(
            "42".to_string(),
            ListKind::Followers,
            vec![follower],
        );

        let mut followed = account("1");
        followed.username = "new_handle".to_string();
        let following = Collection::new(
            "42".to_string(),
            ListKind::Following,
            vec![followed],
        );

        assert!(reconcile(&followers, &following).is_empty());
    }
}

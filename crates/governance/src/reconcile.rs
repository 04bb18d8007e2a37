//! Reconciliation planning: desired state versus actual state.
//!
//! Every reconciler follows the same shape. Desired state comes from a team
//! document, actual state from the API, and the plan is a pure set
//! difference. Applying a plan is the job of the `workflows` crate; nothing
//! here performs I/O.
//!
//! Plans apply revocations before grants. A transient under-grant (someone
//! briefly loses access) is preferred over a transient over-grant.

use std::collections::{BTreeMap, BTreeSet};

use crate::Permission;

/// Additions and removals that bring a set to its desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPlan<T> {
    pub to_add: Vec<T>,
    pub to_remove: Vec<T>,
}

impl<T> SetPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// `to_add = desired − actual`, `to_remove = actual − desired`, both in
/// sorted order.
///
/// An empty `desired` removes everything in `actual`.
pub fn plan_set<T>(desired: &BTreeSet<T>, actual: &BTreeSet<T>) -> SetPlan<T>
where
    T: Ord + Clone,
{
    SetPlan {
        to_add: desired.difference(actual).cloned().collect(),
        to_remove: actual.difference(desired).cloned().collect(),
    }
}

/// Changes to a team's repository grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantPlan<K> {
    /// Repositories to revoke.
    pub revoke: Vec<K>,
    /// Repositories to add, with the permission to grant.
    pub grant: Vec<(K, Permission)>,
    /// Repositories whose level changes, as `(repository, current, desired)`.
    pub update: Vec<(K, Permission, Permission)>,
}

impl<K> GrantPlan<K> {
    pub fn is_empty(&self) -> bool {
        self.revoke.is_empty() && self.grant.is_empty() && self.update.is_empty()
    }
}

/// Compares desired and actual repository → permission maps.
pub fn plan_grants<K>(
    desired: &BTreeMap<K, Permission>,
    actual: &BTreeMap<K, Permission>,
) -> GrantPlan<K>
where
    K: Ord + Clone,
{
    let mut plan = GrantPlan {
        revoke: actual
            .keys()
            .filter(|k| !desired.contains_key(*k))
            .cloned()
            .collect(),
        grant: Vec::new(),
        update: Vec::new(),
    };

    for (key, wanted) in desired {
        match actual.get(key) {
            None => plan.grant.push((key.clone(), wanted.clone())),
            Some(current) if current != wanted => {
                plan.update
                    .push((key.clone(), current.clone(), wanted.clone()))
            }
            Some(_) => {}
        }
    }

    plan
}

/// Counts of what a reconciliation run did.
///
/// `failed` counts individual API calls that returned an error; those items
/// were logged and skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
    pub failed: usize,
}

impl SyncReport {
    /// Number of mutating calls that succeeded.
    pub fn mutations(&self) -> usize {
        self.added + self.removed + self.updated
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.added += other.added;
        self.removed += other.removed;
        self.updated += other.updated;
        self.failed += other.failed;
    }
}

impl std::ops::AddAssign for SyncReport {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(rhs);
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} added, {} removed, {} updated, {} failed",
            self.added, self.removed, self.updated, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case(&["a", "b"], &["b", "c"], 1, 1)]
    #[case(&["a", "b", "c"], &[], 3, 0)]
    #[case(&[], &["x", "y"], 0, 2)]
    #[case(&["a", "b"], &["a", "b"], 0, 0)]
    #[case(&[], &[], 0, 0)]
    fn set_plan_sizes_match_differences(
        #[case] desired: &[&str],
        #[case] actual: &[&str],
        #[case] adds: usize,
        #[case] removes: usize,
    ) {
        let (desired, actual) = (set(desired), set(actual));
        let plan = plan_set(&desired, &actual);

        assert_eq!(plan.to_add.len(), adds);
        assert_eq!(plan.to_remove.len(), removes);
        assert_eq!(plan.to_add.len(), desired.difference(&actual).count());
        assert_eq!(plan.to_remove.len(), actual.difference(&desired).count());
    }

    #[test]
    fn empty_desired_set_removes_everyone() {
        let plan = plan_set(&BTreeSet::new(), &set(&["alice", "bob"]));
        assert_eq!(plan.to_remove, vec!["alice".to_string(), "bob".to_string()]);
        assert!(plan.to_add.is_empty());
    }

    #[test]
    fn grant_plan_classifies_each_repository() {
        let desired = BTreeMap::from([
            ("api", Permission::Push),
            ("docs", Permission::Pull),
            ("web", Permission::Admin),
        ]);
        let actual = BTreeMap::from([
            ("docs", Permission::Pull),
            ("web", Permission::Push),
            ("legacy", Permission::Pull),
        ]);

        let plan = plan_grants(&desired, &actual);

        assert_eq!(plan.revoke, vec!["legacy"]);
        assert_eq!(plan.grant, vec![("api", Permission::Push)]);
        assert_eq!(
            plan.update,
            vec![("web", Permission::Push, Permission::Admin)]
        );
    }

    #[test]
    fn grant_plan_is_empty_when_in_sync() {
        let state = BTreeMap::from([("api", Permission::Maintain)]);
        assert!(plan_grants(&state, &state).is_empty());
    }

    #[test]
    fn report_accumulates() {
        let mut total = SyncReport::default();
        total += SyncReport {
            added: 2,
            failed: 1,
            ..SyncReport::default()
        };
        total += SyncReport {
            removed: 3,
            updated: 1,
            ..SyncReport::default()
        };
        assert_eq!(total.mutations(), 6);
        assert_eq!(total.failed, 1);
        assert_eq!(total.to_string(), "2 added, 3 removed, 1 updated, 1 failed");
    }
}

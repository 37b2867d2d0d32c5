//! Direct permission store: `subject -> (object -> roles)`.

use crate::role_set::RoleSet;
use crate::traits::{GrantMutations, RoleLookup};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Direct role grants, without any inheritance.
///
/// An entry exists only while its role set is non-empty, and a subject only
/// while it has at least one entry. Every removal path prunes.
#[derive(Debug, Clone)]
pub struct PermissionStore<S, O, R> {
    grants: HashMap<S, HashMap<O, HashSet<R>>>,
}

impl<S, O, R> Default for PermissionStore<S, O, R> {
    fn default() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }
}

impl<S, O, R> PermissionStore<S, O, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (subject, object) entries.
    pub fn len(&self) -> usize {
        self.grants.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Number of subjects holding at least one role.
    pub fn subject_count(&self) -> usize {
        self.grants.len()
    }

    /// Every `(subject, object, roles)` entry, in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&S, &O, &HashSet<R>)> + '_ {
        self.grants.iter().flat_map(|(subject, objects)| {
            objects
                .iter()
                .map(move |(object, roles)| (subject, object, roles))
        })
    }
}

impl<S: Eq + Hash, O: Eq + Hash, R> PermissionStore<S, O, R> {
    /// The stored set for the pair, if any. Never returns an empty set.
    pub fn direct(&self, subject: &S, object: &O) -> Option<&HashSet<R>> {
        self.grants.get(subject)?.get(object)
    }

    pub fn contains_entry(&self, subject: &S, object: &O) -> bool {
        self.direct(subject, object).is_some()
    }

    /// Remove the pair's entry and the subject's map if it became empty.
    fn take_entry(&mut self, subject: &S, object: &O) -> Option<HashSet<R>> {
        let objects = self.grants.get_mut(subject)?;
        let roles = objects.remove(object);
        if objects.is_empty() {
            self.grants.remove(subject);
        }
        roles
    }
}

impl<S, O, R> RoleLookup<S, O, R> for PermissionStore<S, O, R>
where
    S: Eq + Hash,
    O: Eq + Hash,
    R: Clone + Eq + Hash,
{
    fn roles(&self, subject: &S, object: &O) -> RoleSet<'_, R> {
        match self.direct(subject, object) {
            Some(roles) => RoleSet::borrowed(roles),
            None => RoleSet::empty(),
        }
    }
}

impl<S, O, R> GrantMutations<S, O, R> for PermissionStore<S, O, R>
where
    S: Clone + Eq + Hash,
    O: Clone + Eq + Hash,
    R: Clone + Eq + Hash,
{
    fn apply_set(&mut self, subject: &S, object: &O, roles: HashSet<R>) {
        if roles.is_empty() {
            self.take_entry(subject, object);
            return;
        }

        self.grants
            .entry(subject.clone())
            .or_default()
            .insert(object.clone(), roles);
    }

    fn apply_add(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = R>) -> HashSet<R> {
        let mut added = HashSet::new();
        let mut incoming = roles.into_iter().peekable();
        // Nothing to add must not leave an empty entry behind
        if incoming.peek().is_none() {
            return added;
        }

        let existing = self
            .grants
            .entry(subject.clone())
            .or_default()
            .entry(object.clone())
            .or_default();

        for role in incoming {
            if !existing.contains(&role) {
                added.insert(role.clone());
                existing.insert(role);
            }
        }

        added
    }

    fn apply_remove<'r>(
        &mut self,
        subject: &S,
        object: &O,
        roles: impl IntoIterator<Item = &'r R>,
    ) -> HashSet<R>
    where
        R: 'r,
    {
        let Some(existing) = self
            .grants
            .get_mut(subject)
            .and_then(|objects| objects.get_mut(object))
        else {
            return HashSet::new();
        };

        let removed: HashSet<R> = roles
            .into_iter()
            .filter_map(|role| existing.take(role))
            .collect();

        if existing.is_empty() {
            self.take_entry(subject, object);
        }

        removed
    }

    fn apply_remove_subject(&mut self, subject: &S) -> bool {
        self.grants.remove(subject).is_some()
    }

    fn apply_remove_object(&mut self, object: &O) -> bool {
        let mut removed = false;
        self.grants.retain(|_, objects| {
            removed |= objects.remove(object).is_some();
            !objects.is_empty()
        });
        removed
    }

    fn apply_remove_pair(&mut self, subject: &S, object: &O) -> Option<HashSet<R>> {
        self.take_entry(subject, object)
    }

    fn apply_clear(&mut self) {
        self.grants.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Permissions;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Role {
        Viewer,
        Editor,
        Owner,
        Manager,
    }

    type Store = PermissionStore<&'static str, &'static str, Role>;

    fn store_with(roles: &[Role]) -> Store {
        let mut store = Store::new();
        store.set_roles(&"alice", &"doc", roles.iter().copied());
        store
    }

    #[test]
    fn test_add_role_then_query() {
        let mut store = Store::new();
        assert!(store.add_role(&"alice", &"doc", Role::Manager));
        assert!(store.has_role(&"alice", &"doc", &Role::Manager));
        assert!(store.has_all_roles(&"alice", &"doc", [&Role::Manager]));
        assert!(store.has_any_role(&"alice", &"doc", [&Role::Manager, &Role::Owner]));
        assert!(store.roles(&"alice", &"doc") == HashSet::from([Role::Manager]));
    }

    #[test]
    fn test_add_role_twice_changes_state_once() {
        let mut store = Store::new();
        assert!(store.add_role(&"alice", &"doc", Role::Editor));
        assert!(!store.add_role(&"alice", &"doc", Role::Editor));
        assert_eq!(store.roles(&"alice", &"doc").len(), 1);
    }

    #[test]
    fn test_add_roles_reports_growth() {
        let mut store = Store::new();
        assert!(store.add_roles(&"alice", &"doc", [Role::Manager, Role::Owner]));
        assert!(!store.add_roles(&"alice", &"doc", [Role::Owner]));
        assert!(store.add_roles(&"alice", &"doc", [Role::Owner, Role::Viewer]));
        assert_eq!(store.roles(&"alice", &"doc").len(), 3);
    }

    #[test]
    fn test_add_empty_roles_creates_nothing() {
        let mut store = Store::new();
        assert!(!store.add_roles(&"alice", &"doc", []));
        assert!(!store.contains_entry(&"alice", &"doc"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_roles_overwrites() {
        let mut store = store_with(&[Role::Manager, Role::Owner]);
        store.set_roles(&"alice", &"doc", [Role::Viewer]);
        assert!(store.roles(&"alice", &"doc") == HashSet::from([Role::Viewer]));
    }

    #[test]
    fn test_set_empty_roles_deletes_entry() {
        let mut store = store_with(&[Role::Manager]);
        store.set_roles(&"alice", &"doc", []);
        assert!(!store.contains_entry(&"alice", &"doc"));
        assert_eq!(store.subject_count(), 0);

        // Setting empty on a missing pair is a no-op
        store.set_roles(&"bob", &"doc", []);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_role() {
        let mut store = store_with(&[Role::Manager, Role::Owner]);
        assert!(store.remove_role(&"alice", &"doc", &Role::Manager));
        assert!(!store.remove_role(&"alice", &"doc", &Role::Manager));
        assert!(!store.has_role(&"alice", &"doc", &Role::Manager));
        assert!(store.has_role(&"alice", &"doc", &Role::Owner));
        assert!(!store.has_all_roles(&"alice", &"doc", [&Role::Manager, &Role::Owner]));
        assert!(store.has_any_role(&"alice", &"doc", [&Role::Manager, &Role::Owner]));
    }

    #[test]
    fn test_remove_roles() {
        let mut store = store_with(&[Role::Manager, Role::Owner, Role::Viewer]);
        assert!(store.remove_roles(&"alice", &"doc", [&Role::Manager, &Role::Owner, &Role::Editor]));
        assert!(store.roles(&"alice", &"doc") == HashSet::from([Role::Viewer]));
        assert!(!store.remove_roles(&"alice", &"doc", [&Role::Manager]));
    }

    #[test]
    fn test_remove_from_missing_pair_is_false() {
        let mut store = Store::new();
        assert!(!store.remove_role(&"alice", &"doc", &Role::Owner));
        assert!(!store.remove_roles(&"alice", &"doc", [&Role::Owner]));
        assert!(!store.remove_all_roles(&"alice", &"doc"));
    }

    #[test]
    fn test_removing_last_role_prunes_entry() {
        let mut store = store_with(&[Role::Owner]);
        assert!(store.remove_role(&"alice", &"doc", &Role::Owner));
        assert!(!store.contains_entry(&"alice", &"doc"));
        assert!(!store.remove_all_subject_roles(&"alice"));
        assert!(!store.remove_all_object_roles(&"doc"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_all_subject_roles() {
        let mut store = store_with(&[Role::Manager, Role::Owner]);
        store.add_role(&"alice", &"sheet", Role::Viewer);
        store.add_role(&"bob", &"doc", Role::Viewer);

        assert!(store.remove_all_subject_roles(&"alice"));
        assert!(store.roles(&"alice", &"doc").is_empty());
        assert!(store.roles(&"alice", &"sheet").is_empty());
        assert!(store.has_role(&"bob", &"doc", &Role::Viewer));
        assert!(!store.remove_all_subject_roles(&"alice"));
    }

    #[test]
    fn test_remove_all_object_roles() {
        let mut store = store_with(&[Role::Manager]);
        store.add_role(&"alice", &"sheet", Role::Viewer);
        store.add_role(&"bob", &"doc", Role::Editor);

        assert!(store.remove_all_object_roles(&"doc"));
        assert!(store.roles(&"alice", &"doc").is_empty());
        assert!(store.roles(&"bob", &"doc").is_empty());
        assert!(store.has_role(&"alice", &"sheet", &Role::Viewer));
        // bob had nothing else, so the subject is gone entirely
        assert_eq!(store.subject_count(), 1);
        assert!(!store.remove_all_object_roles(&"doc"));
    }

    #[test]
    fn test_remove_all_roles_drops_one_entry() {
        let mut store = store_with(&[Role::Manager, Role::Viewer]);
        store.add_role(&"alice", &"sheet", Role::Viewer);

        assert!(store.remove_all_roles(&"alice", &"doc"));
        assert!(!store.has_any_role(&"alice", &"doc", [&Role::Manager, &Role::Viewer]));
        assert!(store.has_role(&"alice", &"sheet", &Role::Viewer));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&[Role::Manager]);
        store.add_role(&"bob", &"sheet", Role::Viewer);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_direct_lookup_borrows() {
        let store = store_with(&[Role::Owner]);
        assert!(store.roles(&"alice", &"doc").is_borrowed());
        assert!(!store.roles(&"bob", &"doc").is_borrowed());
    }

    #[test]
    fn test_apply_add_returns_delta() {
        let mut store = store_with(&[Role::Owner]);
        let added = store.apply_add(&"alice", &"doc", [Role::Owner, Role::Editor]);
        assert_eq!(added, HashSet::from([Role::Editor]));
    }

    #[test]
    fn test_apply_remove_pair_returns_old_roles() {
        let mut store = store_with(&[Role::Owner, Role::Viewer]);
        let removed = store.apply_remove_pair(&"alice", &"doc");
        assert_eq!(removed, Some(HashSet::from([Role::Owner, Role::Viewer])));
        assert_eq!(store.apply_remove_pair(&"alice", &"doc"), None);
    }

    #[test]
    fn test_entries() {
        let mut store = store_with(&[Role::Owner]);
        store.add_role(&"bob", &"sheet", Role::Viewer);
        let mut pairs: Vec<(&str, &str)> = store.entries().map(|(s, o, _)| (*s, *o)).collect();
        pairs.sort();
        assert_eq!(pairs, vec![("alice", "doc"), ("bob", "sheet")]);
    }

    /// Keys compared by id only, the way a caller with mutable entity structs would.
    #[derive(Debug, Clone)]
    struct User {
        id: u32,
        display_name: String,
    }

    impl PartialEq for User {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for User {}

    impl Hash for User {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    #[test]
    fn test_caller_defined_key_equality() {
        let mut store: PermissionStore<User, &str, Role> = PermissionStore::new();
        let stored = User {
            id: 7,
            display_name: "Alice".into(),
        };
        let renamed = User {
            id: 7,
            display_name: "Alice Smith".into(),
        };
        store.add_role(&stored, &"doc", Role::Owner);
        assert!(store.has_role(&renamed, &"doc", &Role::Owner));
        assert_ne!(stored.display_name, renamed.display_name);
    }
}

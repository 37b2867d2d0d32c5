//! Read-only role set returned by lookups.

use std::borrow::Cow;
use std::collections::HashSet;
use std::hash::Hash;
use std::ops::Deref;

/// Roles a subject holds on an object.
///
/// Either borrows the stored set (direct lookups, no inheritance to fold in)
/// or owns a freshly computed union. In both cases it is a snapshot: the
/// borrow checker keeps the store from changing while it is alive, and
/// [`RoleSet::into_owned`] detaches it.
#[derive(Debug, Clone)]
pub struct RoleSet<'a, R: Clone> {
    roles: Cow<'a, HashSet<R>>,
}

impl<'a, R: Clone> RoleSet<'a, R> {
    pub fn empty() -> Self {
        Self {
            roles: Cow::Owned(HashSet::new()),
        }
    }

    pub fn borrowed(roles: &'a HashSet<R>) -> Self {
        Self {
            roles: Cow::Borrowed(roles),
        }
    }

    pub fn owned(roles: HashSet<R>) -> Self {
        Self {
            roles: Cow::Owned(roles),
        }
    }

    /// True when this view points straight at stored data.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.roles, Cow::Borrowed(_))
    }

    pub fn into_owned(self) -> HashSet<R> {
        self.roles.into_owned()
    }
}

impl<R: Clone + Eq + Hash> RoleSet<'_, R> {
    /// True if every role in `roles` is in this set. An empty input is always covered.
    pub fn contains_all<'r>(&self, roles: impl IntoIterator<Item = &'r R>) -> bool
    where
        R: 'r,
    {
        roles.into_iter().all(|role| self.roles.contains(role))
    }

    /// True if at least one role in `roles` is in this set.
    pub fn contains_any<'r>(&self, roles: impl IntoIterator<Item = &'r R>) -> bool
    where
        R: 'r,
    {
        roles.into_iter().any(|role| self.roles.contains(role))
    }
}

impl<R: Clone> Deref for RoleSet<'_, R> {
    type Target = HashSet<R>;

    fn deref(&self) -> &Self::Target {
        &self.roles
    }
}

impl<'s, R: Clone> IntoIterator for &'s RoleSet<'_, R> {
    type Item = &'s R;
    type IntoIter = std::collections::hash_set::Iter<'s, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter()
    }
}

impl<R: Clone + Eq + Hash> PartialEq<HashSet<R>> for RoleSet<'_, R> {
    fn eq(&self, other: &HashSet<R>) -> bool {
        *self.roles == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let roles: RoleSet<'_, &str> = RoleSet::empty();
        assert!(roles.is_empty());
        assert!(!roles.is_borrowed());
        assert!(roles.contains_all(std::iter::empty()));
        assert!(!roles.contains_any(std::iter::empty()));
    }

    #[test]
    fn test_borrowed_view() {
        let stored: HashSet<&str> = HashSet::from(["owner", "editor"]);
        let roles = RoleSet::borrowed(&stored);
        assert!(roles.is_borrowed());
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&"owner"));
        assert!(roles.contains_all([&"owner", &"editor"]));
        assert!(roles.contains_any([&"viewer", &"editor"]));
        assert!(!roles.contains_any([&"viewer"]));
        assert!(roles == stored);
    }

    #[test]
    fn test_into_owned_detaches() {
        let stored: HashSet<&str> = HashSet::from(["owner"]);
        let mut snapshot = RoleSet::borrowed(&stored).into_owned();
        snapshot.insert("viewer");
        assert_eq!(stored.len(), 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_iterates_by_reference() {
        let roles = RoleSet::owned(HashSet::from([1, 2, 3]));
        let sum: i32 = (&roles).into_iter().sum();
        assert_eq!(sum, 6);
    }
}

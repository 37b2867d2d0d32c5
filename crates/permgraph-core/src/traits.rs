//! Read and write seams shared by the store, the inheritance engine and the observable wrapper.

use crate::role_set::RoleSet;
use std::collections::HashSet;
use std::hash::Hash;

/// Role lookups for a (subject, object) pair.
///
/// Implementors only provide [`RoleLookup::roles`]; every membership check
/// goes through it, so an implementor that folds in inherited roles gets
/// inherited membership checks for free.
pub trait RoleLookup<S, O, R: Clone + Eq + Hash> {
    /// Roles `subject` holds on `object`. Empty if none.
    fn roles(&self, subject: &S, object: &O) -> RoleSet<'_, R>;

    fn has_role(&self, subject: &S, object: &O, role: &R) -> bool {
        self.roles(subject, object).contains(role)
    }

    /// True if `subject` holds every role in `roles` on `object`.
    fn has_all_roles<'r>(&self, subject: &S, object: &O, roles: impl IntoIterator<Item = &'r R>) -> bool
    where
        R: 'r,
    {
        self.roles(subject, object).contains_all(roles)
    }

    /// True if `subject` holds at least one role in `roles` on `object`.
    fn has_any_role<'r>(&self, subject: &S, object: &O, roles: impl IntoIterator<Item = &'r R>) -> bool
    where
        R: 'r,
    {
        self.roles(subject, object).contains_any(roles)
    }
}

/// Mutation primitives over direct grants. Each returns the change it made.
///
/// These are the "trusted" entry points: arguments are already well formed
/// and the call is about to apply. Wrappers such as
/// [`Observable`](crate::Observable) build on the returned deltas.
pub trait GrantMutations<S, O, R> {
    /// Replace the direct roles of the pair. An empty set deletes the entry.
    fn apply_set(&mut self, subject: &S, object: &O, roles: HashSet<R>);

    /// Add roles and return the ones that were not already present.
    fn apply_add(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = R>) -> HashSet<R>;

    /// Remove roles and return the ones that were actually present.
    fn apply_remove<'r>(
        &mut self,
        subject: &S,
        object: &O,
        roles: impl IntoIterator<Item = &'r R>,
    ) -> HashSet<R>
    where
        R: 'r;

    /// Drop every entry of `subject`. Returns whether anything existed.
    fn apply_remove_subject(&mut self, subject: &S) -> bool;

    /// Drop `object` from every subject. Returns whether anything existed.
    fn apply_remove_object(&mut self, object: &O) -> bool;

    /// Drop the entry for the pair and return its roles.
    fn apply_remove_pair(&mut self, subject: &S, object: &O) -> Option<HashSet<R>>;

    fn apply_clear(&mut self);
}

/// Boolean-returning permission operations, available on every [`GrantMutations`] implementor.
pub trait Permissions<S, O, R: Eq + Hash>: GrantMutations<S, O, R> {
    /// Replace the direct roles of the pair. Passing no roles deletes the entry.
    fn set_roles(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = R>) {
        self.apply_set(subject, object, roles.into_iter().collect());
    }

    /// Returns true if the role was not already held.
    fn add_role(&mut self, subject: &S, object: &O, role: R) -> bool {
        !self.apply_add(subject, object, [role]).is_empty()
    }

    /// Returns true if at least one role was new. An empty input returns false.
    fn add_roles(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = R>) -> bool {
        !self.apply_add(subject, object, roles).is_empty()
    }

    fn remove_role(&mut self, subject: &S, object: &O, role: &R) -> bool {
        !self.apply_remove(subject, object, [role]).is_empty()
    }

    fn remove_roles<'r>(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = &'r R>) -> bool
    where
        R: 'r,
    {
        !self.apply_remove(subject, object, roles).is_empty()
    }

    fn remove_all_subject_roles(&mut self, subject: &S) -> bool {
        self.apply_remove_subject(subject)
    }

    /// Cost is proportional to the number of subjects in the store.
    fn remove_all_object_roles(&mut self, object: &O) -> bool {
        self.apply_remove_object(object)
    }

    fn remove_all_roles(&mut self, subject: &S, object: &O) -> bool {
        self.apply_remove_pair(subject, object).is_some()
    }

    fn clear(&mut self) {
        self.apply_clear();
    }
}

impl<S, O, R, T> Permissions<S, O, R> for T
where
    R: Eq + Hash,
    T: GrantMutations<S, O, R>,
{
}

//! Change notification: applies a mutation, then tells every listener what changed.

use crate::inherit::Inheritance;
use crate::role_set::RoleSet;
use crate::store::PermissionStore;
use crate::traits::{GrantMutations, RoleLookup};
use crate::types::{ListenerId, PermissionChanged};
use permgraph_types::{ListenerError, PermissionError};
use std::collections::HashSet;
use std::hash::Hash;

/// Receives [`PermissionChanged`] events.
///
/// Returning an error stops delivery to later listeners and is handed back
/// to whoever called the mutating method.
pub trait PermissionListener<S, O, R>: Send + Sync {
    fn on_permission_changed(&self, event: &PermissionChanged<S, O, R>) -> Result<(), ListenerError>;
}

impl<S, O, R, F> PermissionListener<S, O, R> for F
where
    F: Fn(&PermissionChanged<S, O, R>) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_permission_changed(&self, event: &PermissionChanged<S, O, R>) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Wraps a permission store and notifies listeners after each mutation that changed state.
///
/// `set_roles` and `clear` always notify. Other mutations notify only when
/// their delta is non-empty. Events are delivered synchronously, in
/// subscription order, after the change is committed.
pub struct Observable<S, O, R, M = PermissionStore<S, O, R>> {
    inner: M,
    listeners: Vec<(ListenerId, Box<dyn PermissionListener<S, O, R>>)>,
    next_id: u64,
}

impl<S, O, R, M: Default> Default for Observable<S, O, R, M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<S, O, R, M> Observable<S, O, R, M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Read-only access to the wrapped store. Mutations must go through the wrapper.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    pub fn subscribe(&mut self, listener: impl PermissionListener<S, O, R> + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Subscribe a closure.
    pub fn subscribe_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&PermissionChanged<S, O, R>) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.subscribe(listener)
    }

    /// Returns false if the listener was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, event: PermissionChanged<S, O, R>) -> Result<(), PermissionError> {
        for (id, listener) in &self.listeners {
            if let Err(e) = listener.on_permission_changed(&event) {
                tracing::warn!(listener = id.0, action = %event.action, "Permission listener failed: {e}");
                return Err(PermissionError::Listener(e));
            }
        }
        Ok(())
    }
}

impl<S, O, R, M> Observable<S, O, R, M>
where
    S: Clone,
    O: Clone,
    R: Clone + Eq + Hash,
    M: GrantMutations<S, O, R>,
{
    /// Replace the direct roles of the pair and emit `Reset` with the new set.
    pub fn set_roles(
        &mut self,
        subject: &S,
        object: &O,
        roles: impl IntoIterator<Item = R>,
    ) -> Result<(), PermissionError> {
        let roles: HashSet<R> = roles.into_iter().collect();
        self.inner.apply_set(subject, object, roles.clone());
        self.notify(PermissionChanged::reset(subject.clone(), object.clone(), roles))
    }

    pub fn add_role(&mut self, subject: &S, object: &O, role: R) -> Result<bool, PermissionError> {
        self.add_roles(subject, object, [role])
    }

    /// Emits `Add` with the roles that were actually new.
    pub fn add_roles(
        &mut self,
        subject: &S,
        object: &O,
        roles: impl IntoIterator<Item = R>,
    ) -> Result<bool, PermissionError> {
        let added = self.inner.apply_add(subject, object, roles);
        if added.is_empty() {
            return Ok(false);
        }
        self.notify(PermissionChanged::added(subject.clone(), object.clone(), added))?;
        Ok(true)
    }

    pub fn remove_role(&mut self, subject: &S, object: &O, role: &R) -> Result<bool, PermissionError> {
        self.remove_roles(subject, object, [role])
    }

    /// Emits `Remove` with the roles that were actually present.
    pub fn remove_roles<'r>(
        &mut self,
        subject: &S,
        object: &O,
        roles: impl IntoIterator<Item = &'r R>,
    ) -> Result<bool, PermissionError>
    where
        R: 'r,
    {
        let removed = self.inner.apply_remove(subject, object, roles);
        if removed.is_empty() {
            return Ok(false);
        }
        self.notify(PermissionChanged::removed(subject.clone(), object.clone(), removed))?;
        Ok(true)
    }

    pub fn remove_all_subject_roles(&mut self, subject: &S) -> Result<bool, PermissionError> {
        if !self.inner.apply_remove_subject(subject) {
            return Ok(false);
        }
        self.notify(PermissionChanged::subject_removed(subject.clone()))?;
        Ok(true)
    }

    pub fn remove_all_object_roles(&mut self, object: &O) -> Result<bool, PermissionError> {
        if !self.inner.apply_remove_object(object) {
            return Ok(false);
        }
        self.notify(PermissionChanged::object_removed(object.clone()))?;
        Ok(true)
    }

    /// Emits `Remove` carrying every role the pair held.
    pub fn remove_all_roles(&mut self, subject: &S, object: &O) -> Result<bool, PermissionError> {
        let Some(removed) = self.inner.apply_remove_pair(subject, object) else {
            return Ok(false);
        };
        self.notify(PermissionChanged::removed(subject.clone(), object.clone(), removed))?;
        Ok(true)
    }

    /// Clear everything the wrapped store owns and emit a bare `Reset`.
    pub fn clear(&mut self) -> Result<(), PermissionError> {
        self.inner.apply_clear();
        self.notify(PermissionChanged::cleared())
    }
}

impl<S, O, R, M> RoleLookup<S, O, R> for Observable<S, O, R, M>
where
    R: Clone + Eq + Hash,
    M: RoleLookup<S, O, R>,
{
    fn roles(&self, subject: &S, object: &O) -> RoleSet<'_, R> {
        self.inner.roles(subject, object)
    }
}

/// Inheritance edges pass straight through; they are not permission changes.
impl<S, O, R, M> Inheritance<S, O> for Observable<S, O, R, M>
where
    M: Inheritance<S, O>,
{
    fn add_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool {
        self.inner.add_subject_inheritance(inheritor, origin)
    }

    fn remove_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool {
        self.inner.remove_subject_inheritance(inheritor, origin)
    }

    fn add_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool {
        self.inner.add_object_inheritance(inheritor, origin)
    }

    fn remove_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool {
        self.inner.remove_object_inheritance(inheritor, origin)
    }

    fn is_subject_inherits(&self, inheritor: &S, origin: &S) -> bool {
        self.inner.is_subject_inherits(inheritor, origin)
    }

    fn is_object_inherits(&self, inheritor: &O, origin: &O) -> bool {
        self.inner.is_object_inherits(inheritor, origin)
    }
}

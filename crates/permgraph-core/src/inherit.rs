//! Inheritance resolution: direct grants plus roles inherited along subject and object graphs.

use crate::role_set::RoleSet;
use crate::store::PermissionStore;
use crate::traits::{GrantMutations, RoleLookup};
use permgraph_graph::{CyclePolicy, DependencyGraph, InheritanceGraph};
use std::collections::HashSet;
use std::hash::Hash;

/// Operations on the two inheritance dimensions.
pub trait Inheritance<S, O> {
    /// `inheritor` gains every role `origin` holds, on the same object.
    fn add_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool;
    fn remove_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool;
    /// `inheritor` grants every role held on `origin`, to the same subject.
    fn add_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool;
    fn remove_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool;
    /// True iff a path of one or more subject edges leads from `inheritor` to `origin`.
    fn is_subject_inherits(&self, inheritor: &S, origin: &S) -> bool;
    fn is_object_inherits(&self, inheritor: &O, origin: &O) -> bool;
}

/// Permission store whose lookups fold in inherited roles.
///
/// Mutations only ever touch direct grants; inheritance is resolved on read.
/// The subject and object dimensions are walked independently: an ancestor
/// subject's roles are read on the original object only, and an ancestor
/// object's roles for the original subject only. Roles an ancestor subject
/// holds on an ancestor object are not included.
#[derive(Debug, Clone)]
pub struct InheritablePermissions<S, O, R, SG = InheritanceGraph<S>, OG = InheritanceGraph<O>> {
    store: PermissionStore<S, O, R>,
    subjects: SG,
    objects: OG,
}

impl<S, O, R, SG: Default, OG: Default> Default for InheritablePermissions<S, O, R, SG, OG> {
    fn default() -> Self {
        Self::with_graphs(SG::default(), OG::default())
    }
}

impl<S, O, R> InheritablePermissions<S, O, R> {
    /// Create an empty engine whose graphs reject cycles.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cycle_policy(subjects: CyclePolicy, objects: CyclePolicy) -> Self {
        Self::with_graphs(
            InheritanceGraph::with_policy(subjects),
            InheritanceGraph::with_policy(objects),
        )
    }
}

impl<S, O, R, SG, OG> InheritablePermissions<S, O, R, SG, OG> {
    /// Build an engine over caller-supplied graphs.
    pub fn with_graphs(subjects: SG, objects: OG) -> Self {
        Self {
            store: PermissionStore::new(),
            subjects,
            objects,
        }
    }

    pub fn store(&self) -> &PermissionStore<S, O, R> {
        &self.store
    }

    pub fn subject_graph(&self) -> &SG {
        &self.subjects
    }

    pub fn object_graph(&self) -> &OG {
        &self.objects
    }
}

impl<S, O, R, SG, OG> InheritablePermissions<S, O, R, SG, OG>
where
    S: Eq + Hash,
    O: Eq + Hash,
    R: Clone + Eq + Hash,
{
    /// Roles granted directly to `subject` on `object`, ignoring inheritance.
    pub fn direct_roles(&self, subject: &S, object: &O) -> RoleSet<'_, R> {
        self.store.roles(subject, object)
    }
}

impl<S, O, R, SG, OG> RoleLookup<S, O, R> for InheritablePermissions<S, O, R, SG, OG>
where
    S: Eq + Hash,
    O: Eq + Hash,
    R: Clone + Eq + Hash,
    SG: DependencyGraph<S>,
    OG: DependencyGraph<O>,
{
    fn roles(&self, subject: &S, object: &O) -> RoleSet<'_, R> {
        let direct = self.store.roles(subject, object);
        let origin_subjects = self.subjects.direct_dependencies(subject);
        let origin_objects = self.objects.direct_dependencies(object);

        if origin_subjects.is_empty() && origin_objects.is_empty() {
            return direct;
        }

        // Never extend the stored set in place
        let mut roles = direct.into_owned();

        if !origin_subjects.is_empty() {
            walk_origins(&self.subjects, subject, |origin| {
                if let Some(inherited) = self.store.direct(origin, object) {
                    roles.extend(inherited.iter().cloned());
                }
            });
        }

        if !origin_objects.is_empty() {
            walk_origins(&self.objects, object, |origin| {
                if let Some(inherited) = self.store.direct(subject, origin) {
                    roles.extend(inherited.iter().cloned());
                }
            });
        }

        RoleSet::owned(roles)
    }
}

/// Depth-first walk over everything `start` transitively depends on.
///
/// Each node is visited at most once and `start` itself never is, so the
/// walk terminates even when the graph contains cycles.
fn walk_origins<'g, N, G>(graph: &'g G, start: &'g N, mut visit: impl FnMut(&'g N))
where
    N: Eq + Hash,
    G: DependencyGraph<N>,
{
    let mut visited: HashSet<&N> = HashSet::from([start]);
    let mut stack: Vec<&N> = graph.direct_dependencies(start).iter().collect();

    while let Some(node) = stack.pop() {
        if visited.insert(node) {
            visit(node);
            stack.extend(graph.direct_dependencies(node));
        }
    }
}

impl<S, O, R, SG, OG> GrantMutations<S, O, R> for InheritablePermissions<S, O, R, SG, OG>
where
    S: Clone + Eq + Hash,
    O: Clone + Eq + Hash,
    R: Clone + Eq + Hash,
    SG: DependencyGraph<S>,
    OG: DependencyGraph<O>,
{
    fn apply_set(&mut self, subject: &S, object: &O, roles: HashSet<R>) {
        self.store.apply_set(subject, object, roles);
    }

    fn apply_add(&mut self, subject: &S, object: &O, roles: impl IntoIterator<Item = R>) -> HashSet<R> {
        self.store.apply_add(subject, object, roles)
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
        self.store.apply_remove(subject, object, roles)
    }

    fn apply_remove_subject(&mut self, subject: &S) -> bool {
        self.store.apply_remove_subject(subject)
    }

    fn apply_remove_object(&mut self, object: &O) -> bool {
        self.store.apply_remove_object(object)
    }

    fn apply_remove_pair(&mut self, subject: &S, object: &O) -> Option<HashSet<R>> {
        self.store.apply_remove_pair(subject, object)
    }

    /// Clears grants and both inheritance graphs.
    fn apply_clear(&mut self) {
        self.store.apply_clear();
        self.subjects.clear();
        self.objects.clear();
    }
}

impl<S, O, R, SG, OG> Inheritance<S, O> for InheritablePermissions<S, O, R, SG, OG>
where
    S: Clone,
    O: Clone,
    SG: DependencyGraph<S>,
    OG: DependencyGraph<O>,
{
    fn add_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool {
        self.subjects.add_dependency(inheritor.clone(), origin.clone())
    }

    fn remove_subject_inheritance(&mut self, inheritor: &S, origin: &S) -> bool {
        self.subjects.remove_dependency(inheritor, origin)
    }

    fn add_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool {
        self.objects.add_dependency(inheritor.clone(), origin.clone())
    }

    fn remove_object_inheritance(&mut self, inheritor: &O, origin: &O) -> bool {
        self.objects.remove_dependency(inheritor, origin)
    }

    fn is_subject_inherits(&self, inheritor: &S, origin: &S) -> bool {
        self.subjects.is_depends(inheritor, origin)
    }

    fn is_object_inherits(&self, inheritor: &O, origin: &O) -> bool {
        self.objects.is_depends(inheritor, origin)
    }
}

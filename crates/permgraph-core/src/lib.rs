//! Role storage and inheritance resolution for permgraph.
//!
//! Layers, innermost first:
//! - [`PermissionStore`]: direct grants `subject -> object -> roles`
//! - [`InheritablePermissions`]: folds in roles inherited along subject and object graphs
//! - [`Observable`]: notifies listeners after each mutation
//!
//! Operations come from traits: [`RoleLookup`] for queries, [`Permissions`]
//! for boolean mutations, [`Inheritance`] for inheritance edges.

pub mod inherit;
pub mod observe;
pub mod role_set;
pub mod store;
pub mod traits;
pub mod types;

pub use inherit::{InheritablePermissions, Inheritance};
pub use observe::{Observable, PermissionListener};
pub use role_set::RoleSet;
pub use store::PermissionStore;
pub use traits::{GrantMutations, Permissions, RoleLookup};
pub use types::*;

pub use permgraph_graph::{CyclePolicy, DependencyGraph, InheritanceGraph};
pub use permgraph_types::{ListenerError, PermissionError};

/// Engine with both inheritance dimensions and change notification.
pub type ObservablePermissions<S, O, R> = Observable<S, O, R, InheritablePermissions<S, O, R>>;

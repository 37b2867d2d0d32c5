//! Policy files: declarative seed grants and inheritance edges in TOML.
//!
//! ```toml
//! [[grants]]
//! subject = "alice"
//! object = "reports"
//! roles = ["editor"]
//!
//! [[subject_inheritance]]
//! inheritor = "alice"
//! origin = "finance"
//!
//! [[object_inheritance]]
//! inheritor = "q3-report"
//! origin = "reports"
//! ```

use permgraph_core::{Inheritance, InheritablePermissions, Permissions};
use permgraph_types::{ConfigError, PermissionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Engine keyed by the plain strings a policy file uses.
pub type PolicyEngine = InheritablePermissions<String, String, String>;

/// Parsed policy file. Fields left out in the TOML come through blank and
/// are reported by [`PolicyFile::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub grants: Vec<GrantEntry>,
    #[serde(default)]
    pub subject_inheritance: Vec<InheritanceEntry>,
    #[serde(default)]
    pub object_inheritance: Vec<InheritanceEntry>,
}

/// Roles a subject holds directly on an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantEntry {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub object: String,
    /// `None` when the key is missing. An empty list is allowed and grants nothing.
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// One "inheritor depends on origin" edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InheritanceEntry {
    #[serde(default)]
    pub inheritor: String,
    #[serde(default)]
    pub origin: String,
}

/// What [`PolicyFile::apply`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicySummary {
    /// Roles that were not already held directly.
    pub roles_granted: usize,
    pub subject_edges: usize,
    pub object_edges: usize,
    /// Edges the graph refused: duplicates, self-loops, or cycles.
    pub edges_rejected: usize,
}

impl fmt::Display for PolicySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} roles granted, {} subject edges, {} object edges, {} edges rejected",
            self.roles_granted, self.subject_edges, self.object_edges, self.edges_rejected
        )
    }
}

impl PolicyFile {
    /// Read and parse a policy file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse policy TOML. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Check every entry for blank or missing fields. Reports the first one found.
    pub fn validate(&self) -> Result<(), PermissionError> {
        for (i, grant) in self.grants.iter().enumerate() {
            require(&grant.subject, || format!("grants[{i}].subject"))?;
            require(&grant.object, || format!("grants[{i}].object"))?;
            let roles = grant
                .roles
                .as_ref()
                .ok_or_else(|| PermissionError::invalid_argument(format!("grants[{i}].roles")))?;
            for (j, role) in roles.iter().enumerate() {
                require(role, || format!("grants[{i}].roles[{j}]"))?;
            }
        }

        for (section, edges) in [
            ("subject_inheritance", &self.subject_inheritance),
            ("object_inheritance", &self.object_inheritance),
        ] {
            for (i, edge) in edges.iter().enumerate() {
                require(&edge.inheritor, || format!("{section}[{i}].inheritor"))?;
                require(&edge.origin, || format!("{section}[{i}].origin"))?;
            }
        }

        Ok(())
    }

    /// Seed `engine` with this policy.
    ///
    /// The whole file is validated before the first write, so an invalid
    /// policy leaves the engine untouched.
    pub fn apply<E>(&self, engine: &mut E) -> Result<PolicySummary, PermissionError>
    where
        E: Permissions<String, String, String> + Inheritance<String, String>,
    {
        self.validate()?;

        let mut summary = PolicySummary::default();

        for grant in &self.grants {
            let roles = grant.roles.as_deref().unwrap_or_default();
            summary.roles_granted += engine
                .apply_add(&grant.subject, &grant.object, roles.iter().cloned())
                .len();
        }

        for edge in &self.subject_inheritance {
            if engine.add_subject_inheritance(&edge.inheritor, &edge.origin) {
                summary.subject_edges += 1;
            } else {
                summary.edges_rejected += 1;
            }
        }

        for edge in &self.object_inheritance {
            if engine.add_object_inheritance(&edge.inheritor, &edge.origin) {
                summary.object_edges += 1;
            } else {
                summary.edges_rejected += 1;
            }
        }

        tracing::debug!(
            roles_granted = summary.roles_granted,
            subject_edges = summary.subject_edges,
            object_edges = summary.object_edges,
            edges_rejected = summary.edges_rejected,
            "Applied policy"
        );

        Ok(summary)
    }

    /// Build a fresh engine from this policy with the given configuration.
    pub fn build(
        &self,
        config: &crate::PermgraphConfig,
    ) -> Result<(PolicyEngine, PolicySummary), PermissionError> {
        let mut engine = config.engine();
        let summary = self.apply(&mut engine)?;
        Ok((engine, summary))
    }
}

fn require(value: &str, name: impl FnOnce() -> String) -> Result<(), PermissionError> {
    if value.trim().is_empty() {
        return Err(PermissionError::invalid_argument(name()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use permgraph_core::RoleLookup;

    const POLICY: &str = r#"
[[grants]]
subject = "finance"
object = "q3-report"
roles = ["financial_viewer"]

[[grants]]
subject = "alice"
object = "reports"
roles = ["editor", "viewer"]

[[subject_inheritance]]
inheritor = "alice"
origin = "finance"

[[object_inheritance]]
inheritor = "q3-report"
origin = "reports"
"#;

    fn s(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn test_parse_and_apply() {
        let policy = PolicyFile::parse(POLICY, "inline").unwrap();
        assert_eq!(policy.grants.len(), 2);

        let mut engine = PolicyEngine::new();
        let summary = policy.apply(&mut engine).unwrap();
        assert_eq!(
            summary,
            PolicySummary {
                roles_granted: 3,
                subject_edges: 1,
                object_edges: 1,
                edges_rejected: 0,
            }
        );

        assert!(engine.has_all_roles(
            &s("alice"),
            &s("q3-report"),
            [&s("financial_viewer"), &s("editor"), &s("viewer")]
        ));
    }

    #[test]
    fn test_empty_policy() {
        let policy = PolicyFile::parse("", "inline").unwrap();
        let mut engine = PolicyEngine::new();
        assert_eq!(policy.apply(&mut engine).unwrap(), PolicySummary::default());
    }

    #[test]
    fn test_missing_subject_is_invalid_argument() {
        let policy = PolicyFile::parse(
            "[[grants]]\nobject = \"doc\"\nroles = [\"viewer\"]\n",
            "inline",
        )
        .unwrap();
        let err = policy.validate().unwrap_err();
        assert!(matches!(err, PermissionError::InvalidArgument { ref name } if name == "grants[0].subject"));
    }

    #[test]
    fn test_missing_roles_is_invalid_but_empty_roles_is_not() {
        let missing = PolicyFile::parse("[[grants]]\nsubject = \"a\"\nobject = \"b\"\n", "inline").unwrap();
        assert!(matches!(
            missing.validate(),
            Err(PermissionError::InvalidArgument { ref name }) if name == "grants[0].roles"
        ));

        let empty =
            PolicyFile::parse("[[grants]]\nsubject = \"a\"\nobject = \"b\"\nroles = []\n", "inline").unwrap();
        let mut engine = PolicyEngine::new();
        assert_eq!(empty.apply(&mut engine).unwrap().roles_granted, 0);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_blank_role_is_invalid() {
        let policy = PolicyFile::parse(
            "[[grants]]\nsubject = \"a\"\nobject = \"b\"\nroles = [\"viewer\", \"  \"]\n",
            "inline",
        )
        .unwrap();
        let err = policy.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: 'grants[0].roles[1]' is required");
    }

    #[test]
    fn test_invalid_policy_leaves_engine_untouched() {
        let policy = PolicyFile::parse(
            r#"
[[grants]]
subject = "alice"
object = "doc"
roles = ["owner"]

[[object_inheritance]]
inheritor = "page"
"#,
            "inline",
        )
        .unwrap();

        let mut engine = PolicyEngine::new();
        let err = policy.apply(&mut engine).unwrap_err();
        assert!(err.to_string().contains("object_inheritance[0].origin"));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_rejected_edges_are_counted() {
        let policy = PolicyFile::parse(
            r#"
[[subject_inheritance]]
inheritor = "a"
origin = "b"

[[subject_inheritance]]
inheritor = "b"
origin = "a"

[[subject_inheritance]]
inheritor = "a"
origin = "b"
"#,
            "inline",
        )
        .unwrap();

        let mut engine = PolicyEngine::new();
        let summary = policy.apply(&mut engine).unwrap();
        assert_eq!(summary.subject_edges, 1);
        assert_eq!(summary.edges_rejected, 2);
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = PolicyFile::parse("[[grants]\n", "team.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "team.toml"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, POLICY).unwrap();

        let policy = PolicyFile::from_path(&path).unwrap();
        assert_eq!(policy.subject_inheritance.len(), 1);

        let missing = PolicyFile::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_summary_display() {
        let summary = PolicySummary {
            roles_granted: 3,
            subject_edges: 1,
            object_edges: 2,
            edges_rejected: 0,
        };
        assert_eq!(
            summary.to_string(),
            "3 roles granted, 1 subject edges, 2 object edges, 0 edges rejected"
        );
    }
}

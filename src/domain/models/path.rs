//! Resource addressing for investigations and revisions.
//!
//! Names follow a fixed hierarchy:
//!
//! ```text
//! projects/{project}/locations/global
//! projects/{project}/locations/global/investigations/{investigation}
//! projects/{project}/locations/global/investigations/{investigation}/revisions/{revision}
//! ```

use std::fmt;

use crate::domain::errors::{InvestigationError, InvestigationResult};

const PROJECTS: &str = "projects";
const LOCATIONS: &str = "locations";
const GLOBAL: &str = "global";
const INVESTIGATIONS: &str = "investigations";
const REVISIONS: &str = "revisions";

/// Immutable address of a project, investigation or revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvestigationPath {
    project_id: String,
    investigation_id: Option<String>,
    revision_id: Option<String>,
}

impl InvestigationPath {
    /// Build a path from components.
    ///
    /// Empty identifiers are treated as absent. A revision id without an
    /// investigation id is rejected.
    pub fn new(
        project_id: impl Into<String>,
        investigation_id: Option<&str>,
        revision_id: Option<&str>,
    ) -> InvestigationResult<Self> {
        let project_id = project_id.into();
        if project_id.trim().is_empty() {
            return Err(InvestigationError::InvalidArgument(
                "Project ID must be set".to_string(),
            ));
        }

        let investigation_id = non_empty(investigation_id);
        let revision_id = non_empty(revision_id);

        if revision_id.is_some() && investigation_id.is_none() {
            return Err(InvestigationError::InvalidArgument(
                "Revision ID requires an investigation ID".to_string(),
            ));
        }

        Ok(Self {
            project_id,
            investigation_id,
            revision_id,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn investigation_id(&self) -> Option<&str> {
        self.investigation_id.as_deref()
    }

    pub fn revision_id(&self) -> Option<&str> {
        self.revision_id.as_deref()
    }

    /// `projects/{project}/locations/global`
    pub fn parent(&self) -> String {
        format!("{PROJECTS}/{}/{LOCATIONS}/{GLOBAL}", self.project_id)
    }

    /// `projects/{project}/locations/global/investigations/{investigation}`
    pub fn investigation_name(&self) -> InvestigationResult<String> {
        let investigation_id = self.investigation_id.as_deref().ok_or_else(|| {
            InvestigationError::MissingIdentifier("Investigation ID is not set".to_string())
        })?;
        Ok(format!("{}/{INVESTIGATIONS}/{investigation_id}", self.parent()))
    }

    /// Fully revision-qualified name.
    pub fn revision_name(&self) -> InvestigationResult<String> {
        match (&self.investigation_id, &self.revision_id) {
            (Some(investigation_id), Some(revision_id)) => Ok(format!(
                "{}/{INVESTIGATIONS}/{investigation_id}/{REVISIONS}/{revision_id}",
                self.parent()
            )),
            _ => Err(InvestigationError::MissingIdentifier(
                "Revision ID are not set".to_string(),
            )),
        }
    }

    /// Parse a fully-qualified name.
    ///
    /// Returns `None` for anything that does not match one of the three
    /// accepted shapes. Only the literal keywords are checked; identifier
    /// segments just have to be non-empty.
    pub fn parse(full_name: &str) -> Option<Self> {
        let segments: Vec<&str> = full_name.trim().split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        match segments.as_slice() {
            [PROJECTS, project, LOCATIONS, GLOBAL] => Some(Self::from_parts(project, None, None)),
            [PROJECTS, project, LOCATIONS, GLOBAL, INVESTIGATIONS, investigation] => {
                Some(Self::from_parts(project, Some(investigation), None))
            }
            [PROJECTS, project, LOCATIONS, GLOBAL, INVESTIGATIONS, investigation, REVISIONS, revision] => {
                Some(Self::from_parts(project, Some(investigation), Some(revision)))
            }
            _ => None,
        }
    }

    fn from_parts(project: &str, investigation: Option<&str>, revision: Option<&str>) -> Self {
        Self {
            project_id: project.to_string(),
            investigation_id: investigation.map(str::to_string),
            revision_id: revision.map(str::to_string),
        }
    }
}

impl fmt::Display for InvestigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(name) = self.revision_name() {
            return f.write_str(&name);
        }
        if let Ok(name) = self.investigation_name() {
            return f.write_str(&name);
        }
        f.write_str(&self.parent())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Last `/`-separated segment of a resource name.
pub fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

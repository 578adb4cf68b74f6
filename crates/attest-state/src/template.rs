//! # Template Families
//!
//! Template versions are grouped by name into a [`TemplateFamily`]. The
//! family owns its versions and at most one `latest` pointer, so "which
//! version is current" is a derived read instead of a flag that every
//! writer has to keep consistent.
//!
//! Publishing with `is_latest = true` moves the pointer; the previous holder
//! loses the flag in the same `&mut` borrow. Concurrent publishers are
//! serialized by whatever lock guards the [`TemplateCatalog`], and the last
//! one to take it wins.

use std::collections::{BTreeMap, HashMap};

use attest_core::{AttestError, TemplateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::TemplateDirectory;

/// One version of a named template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: TemplateId,
    pub name: String,
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub version_number: u32,
    pub is_active: bool,
    pub change_log: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`TemplateCatalog::publish`].
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub name: String,
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub version_number: u32,
    pub is_active: bool,
    pub change_log: Option<String>,
}

/// Partial update of an existing version. The name is fixed for the life
/// of a version.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub description: Option<String>,
    pub document_link: Option<String>,
    pub is_active: Option<bool>,
    pub change_log: Option<String>,
    /// `Some(true)` claims the latest pointer; `Some(false)` releases it if
    /// this version holds it.
    pub is_latest: Option<bool>,
}

/// All versions sharing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFamily {
    name: String,
    versions: Vec<TemplateVersion>,
    latest: Option<TemplateId>,
}

impl TemplateFamily {
    fn new(name: String) -> Self {
        Self {
            name,
            versions: Vec::new(),
            latest: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Versions ordered by `version_number`.
    pub fn versions(&self) -> &[TemplateVersion] {
        &self.versions
    }

    /// The version currently flagged latest.
    pub fn latest(&self) -> Option<&TemplateVersion> {
        let id = self.latest?;
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn latest_id(&self) -> Option<TemplateId> {
        self.latest
    }

    pub fn is_latest(&self, id: TemplateId) -> bool {
        self.latest == Some(id)
    }

    fn get_mut(&mut self, id: TemplateId) -> Option<&mut TemplateVersion> {
        self.versions.iter_mut().find(|v| v.id == id)
    }

    fn insert(&mut self, version: TemplateVersion) {
        let at = self
            .versions
            .partition_point(|v| v.version_number <= version.version_number);
        self.versions.insert(at, version);
    }
}

/// Every template family, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    families: BTreeMap<String, TemplateFamily>,
    index: HashMap<TemplateId, String>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new version.
    ///
    /// With `is_latest`, the new version takes the family's latest pointer
    /// and whichever version held it loses the flag.
    pub fn publish(
        &mut self,
        draft: TemplateDraft,
        is_latest: bool,
        now: DateTime<Utc>,
    ) -> Result<TemplateVersion, AttestError> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(AttestError::validation("template name must not be empty"));
        }
        if draft.version_number == 0 {
            return Err(AttestError::validation(
                "template version_number must be at least 1",
            ));
        }
        // (name, version_number) is unique; the templates table carries the
        // same constraint.
        if let Some(family) = self.families.get(&name) {
            if family
                .versions
                .iter()
                .any(|v| v.version_number == draft.version_number)
            {
                return Err(AttestError::validation(format!(
                    "template {name:?} already has version {}",
                    draft.version_number
                )));
            }
        }

        let version = TemplateVersion {
            id: TemplateId::new(),
            name: name.clone(),
            description: draft.description,
            document_link: draft.document_link,
            version_number: draft.version_number,
            is_active: draft.is_active,
            change_log: draft.change_log,
            created_at: now,
            updated_at: now,
        };

        let family = self
            .families
            .entry(name.clone())
            .or_insert_with(|| TemplateFamily::new(name.clone()));
        family.insert(version.clone());
        if is_latest {
            family.latest = Some(version.id);
        }
        self.index.insert(version.id, name);
        Ok(version)
    }

    /// Apply a partial update to an existing version.
    pub fn update(
        &mut self,
        id: TemplateId,
        patch: TemplatePatch,
        now: DateTime<Utc>,
    ) -> Result<TemplateVersion, AttestError> {
        let family = self
            .index
            .get(&id)
            .and_then(|name| self.families.get_mut(name))
            .ok_or_else(|| AttestError::not_found("template", id))?;

        match patch.is_latest {
            Some(true) => family.latest = Some(id),
            Some(false) if family.latest == Some(id) => family.latest = None,
            _ => {}
        }

        let version = family
            .get_mut(id)
            .ok_or_else(|| AttestError::not_found("template", id))?;
        if let Some(description) = patch.description {
            version.description = Some(description);
        }
        if let Some(link) = patch.document_link {
            version.document_link = Some(link);
        }
        if let Some(active) = patch.is_active {
            version.is_active = active;
        }
        if let Some(change_log) = patch.change_log {
            version.change_log = Some(change_log);
        }
        version.updated_at = now;
        Ok(version.clone())
    }

    /// Re-insert a stored version (startup hydration). Skips validation so
    /// that historical rows load as written; a later `is_latest` row for
    /// the same family replaces an earlier one.
    pub fn restore(&mut self, version: TemplateVersion, is_latest: bool) {
        let name = version.name.clone();
        let id = version.id;
        let family = self
            .families
            .entry(name.clone())
            .or_insert_with(|| TemplateFamily::new(name.clone()));
        family.versions.retain(|v| v.id != id);
        family.insert(version);
        if is_latest {
            family.latest = Some(id);
        }
        self.index.insert(id, name);
    }

    pub fn get(&self, id: TemplateId) -> Option<&TemplateVersion> {
        let name = self.index.get(&id)?;
        self.families.get(name)?.versions.iter().find(|v| v.id == id)
    }

    pub fn family(&self, name: &str) -> Option<&TemplateFamily> {
        self.families.get(name)
    }

    /// The family containing `id`.
    pub fn family_of(&self, id: TemplateId) -> Option<&TemplateFamily> {
        self.families.get(self.index.get(&id)?)
    }

    pub fn latest(&self, name: &str) -> Option<&TemplateVersion> {
        self.families.get(name)?.latest()
    }

    pub fn is_latest(&self, id: TemplateId) -> bool {
        self.family_of(id).is_some_and(|f| f.is_latest(id))
    }

    /// Every version, grouped by family name and ordered by version number.
    pub fn versions(&self) -> impl Iterator<Item = &TemplateVersion> {
        self.families.values().flat_map(|f| f.versions.iter())
    }

    /// Versions with `is_active = true`.
    pub fn active_versions(&self) -> impl Iterator<Item = &TemplateVersion> {
        self.versions().filter(|v| v.is_active)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl TemplateDirectory for TemplateCatalog {
    fn template(&self, id: TemplateId) -> Option<TemplateVersion> {
        self.get(id).cloned()
    }

    fn latest_template(&self, name: &str) -> Option<TemplateVersion> {
        self.latest(name).cloned()
    }
}

//! Knowledge store: immutable view of the static reference data.
//!
//! Loads `reference.json` (departments, media contacts, crisis rubric) and
//! the plain-text report skeleton from a data directory at startup. All data
//! is read-only after [`KnowledgeStore::load`]; the store is shared behind an
//! `Arc` for the lifetime of the process.

pub mod crisis;
pub mod ranking;

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use issuebrief_shared::{
    BriefError, CrisisLevel, CrisisRubricEntry, Department, DepartmentMatch, Outlet,
    OutletReporter, Result,
};

/// Reference data file name within the data directory.
const REFERENCE_FILE: &str = "reference.json";

/// Report skeleton file name within the data directory.
const SKELETON_FILE: &str = "report_skeleton.txt";

// ---------------------------------------------------------------------------
// Raw JSON shapes
// ---------------------------------------------------------------------------

/// Top-level shape of `reference.json`. All sections optional here so that
/// the missing-key diagnostics can name the section.
#[derive(Debug, Deserialize)]
struct RawReference {
    departments: Option<IndexMap<String, RawDepartment>>,
    media_contacts: Option<IndexMap<String, RawOutlet>>,
    crisis_levels: Option<IndexMap<String, CrisisRubricEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawDepartment {
    owner: String,
    #[serde(default)]
    contacts: String,
    /// Comma-separated in the data file.
    #[serde(default)]
    keywords: String,
    #[serde(default)]
    owned_issues: Vec<String>,
    #[serde(default)]
    priority: i32,
    #[serde(default = "default_true")]
    active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawOutlet {
    #[serde(default)]
    category: String,
    #[serde(default)]
    main_phone: String,
    #[serde(default)]
    fax: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    desk: Vec<String>,
    #[serde(default)]
    reporters: Vec<RawReporter>,
}

/// Reporter entries may be bare names or full records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawReporter {
    Name(String),
    Record(OutletReporter),
}

impl From<RawReporter> for OutletReporter {
    fn from(raw: RawReporter) -> Self {
        match raw {
            RawReporter::Name(name) => OutletReporter {
                name,
                ..Default::default()
            },
            RawReporter::Record(r) => r,
        }
    }
}

// ---------------------------------------------------------------------------
// KnowledgeStore
// ---------------------------------------------------------------------------

/// In-memory snapshot of the reference directory. Insertion order of the
/// JSON maps is preserved; substring outlet lookup depends on it.
#[derive(Debug)]
pub struct KnowledgeStore {
    departments: Vec<Department>,
    outlets: Vec<Outlet>,
    crisis_levels: IndexMap<u8, CrisisRubricEntry>,
    skeleton: String,
}

impl KnowledgeStore {
    /// Load the reference data and report skeleton from `dir`.
    ///
    /// Fails with a config error when `departments` or `crisis_levels` are
    /// missing. A missing `media_contacts` section is tolerated: outlet
    /// lookups then always miss and reports fall back to the raw outlet
    /// string.
    pub fn load(dir: &Path) -> Result<Self> {
        let ref_path = dir.join(REFERENCE_FILE);
        let content =
            std::fs::read_to_string(&ref_path).map_err(|e| BriefError::io(&ref_path, e))?;

        let raw: RawReference = serde_json::from_str(&content).map_err(|e| {
            BriefError::config(format!("failed to parse {}: {e}", ref_path.display()))
        })?;

        let departments = raw
            .departments
            .ok_or_else(|| BriefError::config("reference data is missing `departments`"))?;
        let crisis_levels = raw
            .crisis_levels
            .ok_or_else(|| BriefError::config("reference data is missing `crisis_levels`"))?;

        let media_contacts = raw.media_contacts.unwrap_or_else(|| {
            warn!("reference data has no `media_contacts`; outlet lookups will miss");
            IndexMap::new()
        });

        let departments: Vec<Department> = departments
            .into_iter()
            .map(|(name, raw)| Department {
                name,
                owner: raw.owner,
                contacts: raw.contacts,
                keywords: split_keywords(&raw.keywords),
                owned_issues: raw.owned_issues,
                priority: raw.priority,
                active: raw.active,
            })
            .collect();

        let outlets: Vec<Outlet> = media_contacts
            .into_iter()
            .map(|(name, raw)| Outlet {
                name,
                category: raw.category,
                main_phone: raw.main_phone,
                fax: raw.fax,
                address: raw.address,
                desk: raw.desk,
                reporters: raw.reporters.into_iter().map(Into::into).collect(),
            })
            .collect();

        let crisis_levels: IndexMap<u8, CrisisRubricEntry> = crisis_levels
            .into_iter()
            .filter_map(|(k, v)| match k.parse::<u8>() {
                Ok(level @ 1..=4) => Some((level, v)),
                _ => {
                    warn!(key = %k, "ignoring crisis rubric entry with invalid level");
                    None
                }
            })
            .collect();

        let skel_path = dir.join(SKELETON_FILE);
        let skeleton =
            std::fs::read_to_string(&skel_path).map_err(|e| BriefError::io(&skel_path, e))?;

        info!(
            departments = departments.len(),
            outlets = outlets.len(),
            rubric_entries = crisis_levels.len(),
            "knowledge store loaded"
        );

        Ok(Self {
            departments,
            outlets,
            crisis_levels,
            skeleton,
        })
    }

    /// All active departments in reference order.
    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    /// All known outlets in reference order.
    pub fn outlets(&self) -> &[Outlet] {
        &self.outlets
    }

    /// The crisis rubric entry for a level, if defined.
    pub fn crisis_rubric(&self, level: CrisisLevel) -> Option<&CrisisRubricEntry> {
        self.crisis_levels.get(&level.as_u8())
    }

    /// The report skeleton text.
    pub fn skeleton(&self) -> &str {
        &self.skeleton
    }

    /// Look up an outlet by name: exact match first, then substring match in
    /// either direction. The first substring hit wins by insertion order.
    pub fn lookup_outlet(&self, name: &str) -> Option<&Outlet> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        if let Some(outlet) = self.outlets.iter().find(|o| o.name == name) {
            return Some(outlet);
        }

        self.outlets
            .iter()
            .find(|o| o.name.contains(name) || name.contains(&o.name))
    }

    /// Rank departments by relevance to the issue text. At most 3 matches,
    /// sorted by score desc, priority asc, name asc. Empty when nothing
    /// scores above zero.
    pub fn rank_departments(&self, issue_text: &str) -> Vec<DepartmentMatch> {
        ranking::rank(&self.departments, issue_text)
    }

    /// Fallback set substituted by the orchestrator on zero ranking hits:
    /// communications, planning, and IR in that priority order.
    pub fn default_departments(&self) -> Vec<DepartmentMatch> {
        const DEFAULT_FRAGMENTS: [&str; 3] = ["커뮤니케이션", "경영기획", "IR"];

        DEFAULT_FRAGMENTS
            .iter()
            .map(|fragment| {
                let department = self
                    .departments
                    .iter()
                    .find(|d| d.name.contains(fragment))
                    .cloned()
                    .unwrap_or_else(|| {
                        debug!(%fragment, "default department missing from reference data");
                        Department {
                            name: (*fragment).to_string(),
                            owner: "담당자".into(),
                            contacts: String::new(),
                            keywords: Vec::new(),
                            owned_issues: Vec::new(),
                            priority: 9,
                            active: true,
                        }
                    });
                DepartmentMatch {
                    department,
                    score: 0.0,
                    matched_terms: Vec::new(),
                }
            })
            .collect()
    }
}

/// Split the comma-separated keyword field into trimmed, non-empty terms.
fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

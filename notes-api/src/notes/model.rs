use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_COLOR: &str = "#FFFFFF";
pub const TITLE_MAX_LEN: usize = 200;
pub const CONTENT_MAX_LEN: usize = 5000;

lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
}

pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Checks every stored-field invariant, one message per failing field.
    pub fn validate(&self) -> Result<()> {
        let errors: Vec<String> = [
            validate_title(&self.title),
            validate_content(&self.content),
            validate_color(&self.color),
        ]
        .into_iter()
        .flatten()
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    /// `#RRGGBB`
    pub color: Option<String>,
}

/// A create request after normalization and validation.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub color: String,
}

impl TryFrom<CreateNote> for NewNote {
    type Error = Error;

    fn try_from(input: CreateNote) -> Result<Self> {
        let title = input.title.as_deref().map(str::trim).unwrap_or_default().to_string();
        let content = input.content.as_deref().map(str::trim).unwrap_or_default().to_string();
        let color = input
            .color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.into());

        let errors: Vec<String> = [validate_title(&title), validate_content(&content), validate_color(&color)]
            .into_iter()
            .flatten()
            .collect();
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        Ok(Self {
            title,
            content,
            category: normalize_category(input.category.as_deref()),
            tags: input.tags.as_deref().map(normalize_tags).unwrap_or_default(),
            color,
        })
    }
}

/// Partial update, absent fields are left untouched.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
}

impl UpdateNote {
    /// Normalizes the submitted fields onto `note` and re-validates the result.
    pub fn apply(self, note: &mut Note) -> Result<()> {
        if let Some(title) = self.title {
            note.title = title.trim().to_string();
        }
        if let Some(content) = self.content {
            note.content = content.trim().to_string();
        }
        if let Some(category) = self.category {
            note.category = normalize_category(Some(&category));
        }
        if let Some(tags) = self.tags {
            note.tags = normalize_tags(&tags);
        }
        if let Some(color) = self.color {
            note.color = if color.is_empty() { DEFAULT_COLOR.into() } else { color };
        }

        note.validate()
    }
}

/// List parameters. Each may appear at most once; a repeated key is a 400.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct FindNotesQuery {
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
    pub category: Option<String>,
    /// Notes carrying this tag
    pub tag: Option<String>,
    /// Page size, defaults to 50
    pub limit: Option<String>,
    /// Matches to skip, defaults to 0
    pub skip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentNote {
    pub id: NoteId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: u64,
    /// Ordered by count, descending
    pub category_counts: IndexMap<String, u64>,
    /// Top ten tags, ordered by count, descending
    pub tag_counts: IndexMap<String, u64>,
    pub recent_activity: Vec<RecentNote>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedNote {
    pub deleted_id: NoteId,
}

pub fn parse_note_id(raw: &str) -> Result<NoteId> {
    Uuid::parse_str(raw).map_err(|_| Error::InvalidId(raw.into()))
}

pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(|c| c.trim().to_lowercase()) {
        Some(category) if !category.is_empty() => category,
        _ => DEFAULT_CATEGORY.into(),
    }
}

pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn validate_title(title: &str) -> Option<String> {
    if title.is_empty() {
        Some("Title is required".into())
    } else if title.chars().count() > TITLE_MAX_LEN {
        Some(format!("Title cannot exceed {TITLE_MAX_LEN} characters"))
    } else {
        None
    }
}

fn validate_content(content: &str) -> Option<String> {
    if content.is_empty() {
        Some("Content is required".into())
    } else if content.chars().count() > CONTENT_MAX_LEN {
        Some(format!("Content cannot exceed {CONTENT_MAX_LEN} characters"))
    } else {
        None
    }
}

fn validate_color(color: &str) -> Option<String> {
    (!HEX_COLOR.is_match(color)).then(|| format!("Color must be a hex color like {DEFAULT_COLOR}"))
}

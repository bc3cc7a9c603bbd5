//! Project / task tracking: projects own items, items own comments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{require_non_empty, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ItemStatus {
    Todo,
    InProgress,
    Done,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Todo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemPriority {
    Low,
    Medium,
    High,
}

impl Default for ItemPriority {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRecord {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl NewProject {
    /// # Errors
    /// Returns an error for an empty name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectUpdate {
    /// # Errors
    /// Returns an error for an empty replacement name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.name {
            Some(name) => require_non_empty("name", name),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemRecord {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: ItemStatus,
    pub priority: ItemPriority,
    pub due_date: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub priority: ItemPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl NewItem {
    /// # Errors
    /// Returns an error for an empty title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub priority: Option<ItemPriority>,
    pub due_date: Option<NaiveDate>,
}

impl ItemUpdate {
    /// # Errors
    /// Returns an error for an empty replacement title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.title {
            Some(title) => require_non_empty("title", title),
            None => Ok(()),
        }
    }
}

/// A comment joined with its author's display name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: i64,
    pub item_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub body: String,
}

impl NewComment {
    /// # Errors
    /// Returns an error for an empty body.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("body", &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ItemStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let item: NewItem = serde_json::from_str(r#"{"title":"Review fills"}"#).unwrap();
        assert_eq!(item.status, ItemStatus::Todo);
        assert_eq!(item.priority, ItemPriority::Medium);
    }

    #[test]
    fn test_validation() {
        let project: NewProject = serde_json::from_str(r#"{"name":" "}"#).unwrap();
        assert!(project.validate().is_err());
        assert!(ProjectUpdate::default().validate().is_ok());
        assert!(NewComment {
            body: String::new()
        }
        .validate()
        .is_err());
    }
}

//! Projects, their items and item comments.
//!
//! Items and comments carry no owner column of their own; access is decided
//! by the owning project. Deleting a project removes its items and their
//! comments through foreign-key cascades.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::database::now_ts;
use crate::models::{
    CommentRecord, ItemRecord, ItemUpdate, NewComment, NewItem, NewProject, ProjectRecord,
    ProjectUpdate,
};

const PROJECT_COLUMNS: &str = "id, owner_id, name, description, status, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, project_id, title, description, status, priority, due_date, created_at, updated_at";
const COMMENT_SELECT: &str = r"
    SELECT c.id, c.item_id, c.author_id, u.name AS author_name, c.body, c.created_at
    FROM item_comments c
    JOIN users u ON u.id = c.author_id
";

#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Projects

    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn create(&self, owner_id: i64, project: &NewProject) -> Result<ProjectRecord> {
        let record = sqlx::query_as::<_, ProjectRecord>(&format!(
            r"
            INSERT INTO projects (owner_id, name, description, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(owner_id)
        .bind(project.name.trim())
        .bind(&project.description)
        .bind(project.status)
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get(&self, id: i64) -> Result<Option<ProjectRecord>> {
        let record = sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<ProjectRecord>> {
        let records = sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1 ORDER BY updated_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Every tenant's projects, for administrators.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ProjectRecord>> {
        let records = sqlx::query_as::<_, ProjectRecord>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY updated_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update(&self, id: i64, update: &ProjectUpdate) -> Result<Option<ProjectRecord>> {
        let record = sqlx::query_as::<_, ProjectRecord>(&format!(
            r"
            UPDATE projects
            SET name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                status = COALESCE(?4, status),
                updated_at = ?5
            WHERE id = ?1
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.description)
        .bind(update.status)
        .bind(now_ts())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Items

    /// # Errors
    /// Returns an error if the insert fails, e.g. for an unknown project.
    pub async fn create_item(&self, project_id: i64, item: &NewItem) -> Result<ItemRecord> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            r"
            INSERT INTO project_items
                (project_id, title, description, status, priority, due_date, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(project_id)
        .bind(item.title.trim())
        .bind(&item.description)
        .bind(item.status)
        .bind(item.priority)
        .bind(item.due_date)
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_item(&self, id: i64) -> Result<Option<ItemRecord>> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM project_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_items(&self, project_id: i64) -> Result<Vec<ItemRecord>> {
        let records = sqlx::query_as::<_, ItemRecord>(&format!(
            "SELECT {ITEM_COLUMNS} FROM project_items WHERE project_id = ?1 ORDER BY id ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_item(&self, id: i64, update: &ItemUpdate) -> Result<Option<ItemRecord>> {
        let record = sqlx::query_as::<_, ItemRecord>(&format!(
            r"
            UPDATE project_items
            SET title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                status = COALESCE(?4, status),
                priority = COALESCE(?5, priority),
                due_date = COALESCE(?6, due_date),
                updated_at = ?7
            WHERE id = ?1
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(&update.description)
        .bind(update.status)
        .bind(update.priority)
        .bind(update.due_date)
        .bind(now_ts())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // Comments

    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn create_comment(
        &self,
        item_id: i64,
        author_id: i64,
        comment: &NewComment,
    ) -> Result<CommentRecord> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO item_comments (item_id, author_id, body, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            ",
        )
        .bind(item_id)
        .bind(author_id)
        .bind(comment.body.trim())
        .bind(now_ts())
        .fetch_one(&self.pool)
        .await?;

        self.get_comment(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment {id} vanished after insert"))
    }

    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_comment(&self, id: i64) -> Result<Option<CommentRecord>> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!("{COMMENT_SELECT} WHERE c.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Comments on an item, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_comments(&self, item_id: i64) -> Result<Vec<CommentRecord>> {
        let records = sqlx::query_as::<_, CommentRecord>(&format!(
            "{COMMENT_SELECT} WHERE c.item_id = ?1 ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// # Errors
    /// Returns an error if the delete fails.
    pub async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM item_comments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemPriority, ItemStatus, ProjectStatus};
    use crate::repositories::test_support::seed_user;
    use crate::Database;

    fn project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            description: None,
            status: ProjectStatus::Active,
        }
    }

    fn item(title: &str) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: None,
            status: ItemStatus::Todo,
            priority: ItemPriority::High,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_project_crud_and_listing() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed_user(&db, "alice@example.com").await;
        let bob = seed_user(&db, "bob@example.com").await;
        let repo = ProjectRepository::new(db.pool().clone());

        let p = repo.create(alice, &project(" Journal cleanup ")).await.unwrap();
        assert_eq!(p.name, "Journal cleanup");
        repo.create(bob, &project("Tax prep")).await.unwrap();

        assert_eq!(repo.list_by_owner(alice).await.unwrap().len(), 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);

        let archived = repo
            .update(
                p.id,
                &ProjectUpdate {
                    status: Some(ProjectStatus::Archived),
                    ..ProjectUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(archived.status, ProjectStatus::Archived);
        assert_eq!(archived.name, "Journal cleanup");
    }

    #[tokio::test]
    async fn test_item_update_and_comments_with_author() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed_user(&db, "alice@example.com").await;
        let repo = ProjectRepository::new(db.pool().clone());

        let p = repo.create(alice, &project("P")).await.unwrap();
        let it = repo.create_item(p.id, &item("Reconcile March")).await.unwrap();
        assert_eq!(it.priority, ItemPriority::High);

        let done = repo
            .update_item(
                it.id,
                &ItemUpdate {
                    status: Some(ItemStatus::Done),
                    ..ItemUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ItemStatus::Done);
        assert_eq!(done.title, "Reconcile March");

        let c = repo
            .create_comment(
                it.id,
                alice,
                &NewComment {
                    body: "matched statement".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(c.author_name, "alice");

        let comments = repo.list_comments(it.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert!(repo.delete_comment(c.id).await.unwrap());
        assert!(repo.list_comments(it.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_item_requires_existing_project() {
        let db = Database::in_memory().await.unwrap();
        let repo = ProjectRepository::new(db.pool().clone());
        assert!(repo.create_item(42, &item("orphan")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_project_cascades_to_items_and_comments() {
        let db = Database::in_memory().await.unwrap();
        let alice = seed_user(&db, "alice@example.com").await;
        let repo = ProjectRepository::new(db.pool().clone());

        let p = repo.create(alice, &project("P")).await.unwrap();
        let a = repo.create_item(p.id, &item("a")).await.unwrap();
        let b = repo.create_item(p.id, &item("b")).await.unwrap();
        for it in [&a, &b] {
            repo.create_comment(
                it.id,
                alice,
                &NewComment {
                    body: "note".to_string(),
                },
            )
            .await
            .unwrap();
        }
        assert_eq!(db.count_rows("item_comments").await.unwrap(), 2);

        assert!(repo.delete(p.id).await.unwrap());
        assert_eq!(db.count_rows("project_items").await.unwrap(), 0);
        assert_eq!(db.count_rows("item_comments").await.unwrap(), 0);
        assert!(repo.get_item(a.id).await.unwrap().is_none());
    }
}

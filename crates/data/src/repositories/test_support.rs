use crate::models::{NewUser, Role};
use crate::Database;

use super::UserRepository;

/// Inserts a plain user and returns its id.
pub(crate) async fn seed_user(db: &Database, email: &str) -> i64 {
    UserRepository::new(db.pool().clone())
        .create(&NewUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        })
        .await
        .unwrap()
        .id
}

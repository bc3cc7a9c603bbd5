//! Account administration from the shell, for bootstrapping the first admin
//! and recovering locked-out users.

use anyhow::{anyhow, Result};
use clap::Args;
use trade_journal_core::AppConfig;
use trade_journal_data::{NewUser, Repositories, Role};
use trade_journal_web_api::auth::validate_password;
use trade_journal_web_api::hash_password;

use super::{find_user, open_database};

/// Arguments for the create-user command.
#[derive(Args, Debug, Clone)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    #[arg(long, env = "TRADE_JOURNAL_PASSWORD")]
    pub password: String,

    /// Grant the admin role
    #[arg(long)]
    pub admin: bool,
}

/// Arguments for the reset-password command.
#[derive(Args, Debug, Clone)]
pub struct ResetPasswordArgs {
    #[arg(long)]
    pub email: String,

    /// New password
    #[arg(long, env = "TRADE_JOURNAL_PASSWORD")]
    pub password: String,
}

/// Creates an account.
///
/// # Errors
/// Returns an error for invalid input or when the email is already registered.
pub async fn run_create_user(args: CreateUserArgs, config: AppConfig) -> Result<()> {
    validate_password(&args.password).map_err(|e| anyhow!("{e}"))?;

    let db = open_database(&config).await?;
    let repos = Repositories::new(db.pool().clone());

    let mut user = NewUser {
        email: args.email,
        name: args.name,
        password_hash: String::new(),
        role: if args.admin { Role::Admin } else { Role::User },
    }
    .normalized();
    user.validate()?;

    if repos.users.find_by_email(&user.email).await?.is_some() {
        return Err(anyhow!("A user with email {} already exists", user.email));
    }
    user.password_hash = hash_password(args.password, config.auth.bcrypt_cost).await?;

    let created = repos.users.create(&user).await?;
    tracing::info!(user_id = created.id, role = ?created.role, "User created");
    println!("Created user #{} <{}> ({:?})", created.id, created.email, created.role);

    db.close().await;
    Ok(())
}

/// Replaces a user's password hash directly.
///
/// # Errors
/// Returns an error if the user does not exist or the password is too short.
pub async fn run_reset_password(args: ResetPasswordArgs, config: AppConfig) -> Result<()> {
    validate_password(&args.password).map_err(|e| anyhow!("{e}"))?;

    let db = open_database(&config).await?;
    let repos = Repositories::new(db.pool().clone());
    let user = find_user(&repos, &args.email).await?;

    let password_hash = hash_password(args.password, config.auth.bcrypt_cost).await?;
    if !repos.users.update_password(user.id, &password_hash).await? {
        return Err(anyhow!("User {} disappeared during reset", user.email));
    }

    tracing::info!(user_id = user.id, "Password reset");
    println!("Password updated for {}", user.email);

    db.close().await;
    Ok(())
}

//! Account creation.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, Set};
use tracing::info;

use crate::entity::user;
use crate::soft_delete::SoftDelete;
use crate::utils::hash::hash_password;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The given email must be set")]
    EmailRequired,
    #[error("The given username must be set")]
    UsernameRequired,
    #[error("The given password must be set")]
    PasswordRequired,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0} is already taken")]
    Taken(&'static str),
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Lowercase the domain part of an email address and trim surrounding space.
///
/// The local part is left alone. Input without an `@` is returned trimmed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    username: &str,
    password: &str,
) -> Result<user::Model, UserError> {
    insert_user(db, email, username, password, false).await
}

/// Same as [`create_user`] with `is_staff` set.
pub async fn create_superuser<C: ConnectionTrait>(
    db: &C,
    email: &str,
    username: &str,
    password: &str,
) -> Result<user::Model, UserError> {
    insert_user(db, email, username, password, true).await
}

async fn insert_user<C: ConnectionTrait>(
    db: &C,
    email: &str,
    username: &str,
    password: &str,
    is_staff: bool,
) -> Result<user::Model, UserError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailRequired.into());
    }
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::UsernameRequired.into());
    }
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired.into());
    }
    let email = normalize_email(email);

    // Uniqueness spans soft-deleted accounts too.
    let clash = user::Entity::all_objects()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email.as_str()))
                .add(user::Column::Username.eq(username)),
        )
        .one(db)
        .await?;
    if let Some(existing) = clash {
        return Err(UserError::Taken(if existing.email == email {
            "Email"
        } else {
            "Username"
        }));
    }

    let password = hash_password(password).map_err(|e| UserError::Hash(e.to_string()))?;
    let now = Utc::now();
    let model = user::ActiveModel {
        email: Set(email),
        username: Set(username.to_string()),
        password: Set(password),
        is_staff: Set(is_staff),
        is_active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = model.id, is_staff, "User created");
    Ok(model)
}

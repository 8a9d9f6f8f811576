use crate::DbResultExt;
use crate::GetDb;
use quill_core::error::{QuillError, QuillResult};
use quill_core::{PasswordHash, UserId};

use entrait::entrait_export as entrait;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<PasswordHash>,
}

#[entrait(pub InsertUser)]
async fn insert_user(
    deps: &impl GetDb,
    email: String,
    password_hash: PasswordHash,
    full_name: Option<String>,
) -> QuillResult<User> {
    let id = sqlx::query_scalar!(
        r#"INSERT INTO blog."user" (email, password_hash, full_name) VALUES ($1, $2, $3) RETURNING user_id"#,
        email,
        password_hash.0,
        full_name
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await
    .on_constraint("user_email_key", |_| QuillError::EmailTaken)?;

    Ok(User {
        id,
        email,
        full_name,
        avatar_url: None,
    })
}

#[entrait(pub FindUserById)]
async fn find_user_by_id(
    deps: &impl GetDb,
    UserId(user_id): UserId,
) -> QuillResult<Option<(User, PasswordHash)>> {
    let record = sqlx::query!(
        r#"SELECT user_id, email, password_hash, full_name, avatar_url FROM blog."user" WHERE user_id = $1"#,
        user_id
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?;

    Ok(record.map(|record| {
        (
            User {
                id: record.user_id,
                email: record.email,
                full_name: record.full_name,
                avatar_url: record.avatar_url,
            },
            PasswordHash(record.password_hash),
        )
    }))
}

#[entrait(pub FindUserByEmail)]
async fn find_user_by_email(
    deps: &impl GetDb,
    email: String,
) -> QuillResult<Option<(User, PasswordHash)>> {
    let record = sqlx::query!(
        r#"SELECT user_id, email, password_hash, full_name, avatar_url FROM blog."user" WHERE email = $1"#,
        email
    )
    .fetch_optional(&deps.get_db().pg_pool)
    .await?;

    Ok(record.map(|record| {
        (
            User {
                id: record.user_id,
                email: record.email,
                full_name: record.full_name,
                avatar_url: record.avatar_url,
            },
            PasswordHash(record.password_hash),
        )
    }))
}

#[entrait(pub UpdateUser)]
async fn update_user(
    deps: &impl GetDb,
    UserId(user_id): UserId,
    update: UserUpdate,
) -> QuillResult<User> {
    let user = sqlx::query!(
        // language=PostgreSQL
        r#"
        UPDATE blog."user" SET
            full_name = COALESCE($1, full_name),
            avatar_url = COALESCE($2, avatar_url),
            password_hash = COALESCE($3, password_hash)
        WHERE user_id = $4
        RETURNING email, full_name, avatar_url
        "#,
        update.full_name,
        update.avatar_url,
        update.password_hash.map(|hash| hash.0),
        user_id
    )
    .fetch_one(&deps.get_db().pg_pool)
    .await?;

    Ok(User {
        id: user_id,
        email: user.email,
        full_name: user.full_name,
        avatar_url: user.avatar_url,
    })
}

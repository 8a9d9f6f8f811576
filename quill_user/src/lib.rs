pub mod auth;
pub mod password;

use auth::Authenticated;

use quill_core::error::{QuillError, QuillResult};
use quill_core::identity::ResolvedIdentity;
use quill_core::{identity, GetConfig, UserId};
use quill_db::user_db;

use entrait::entrait_export as entrait;

/// The current account together with a fresh session token and its
/// resolved display identity.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignedUser {
    pub email: String,
    pub token: String,
    pub name: String,
    pub is_admin: bool,
    pub avatar_url: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

#[derive(serde::Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub password: Option<String>,
}

#[entrait(pub RegisterUser)]
async fn register_user(
    deps: &(impl password::HashPassword + user_db::InsertUser + auth::SignUserId + GetConfig),
    new_user: NewUser,
) -> QuillResult<SignedUser> {
    let password_hash = deps.hash_password(new_user.password).await?;

    let db_user = deps
        .insert_user(new_user.email, password_hash, new_user.full_name)
        .await?;

    Ok(sign_db_user(deps, db_user))
}

#[entrait(pub Login)]
async fn login(
    deps: &(impl user_db::FindUserByEmail + password::VerifyPassword + auth::SignUserId + GetConfig),
    login_user: LoginUser,
) -> QuillResult<SignedUser> {
    let (db_user, password_hash) = deps
        .find_user_by_email(login_user.email)
        .await?
        .ok_or(QuillError::EmailDoesNotExist)?;

    deps.verify_password(login_user.password, password_hash)
        .await?;

    Ok(sign_db_user(deps, db_user))
}

#[entrait(pub FetchCurrentUser)]
async fn fetch_current_user(
    deps: &(impl user_db::FindUserById + auth::SignUserId + GetConfig),
    Authenticated(user_id): Authenticated<UserId>,
) -> QuillResult<SignedUser> {
    let (db_user, _) = deps
        .find_user_by_id(user_id)
        .await?
        .ok_or(QuillError::CurrentUserDoesNotExist)?;

    Ok(sign_db_user(deps, db_user))
}

#[entrait(pub UpdateUser)]
async fn update_user(
    deps: &(impl password::HashPassword + user_db::UpdateUser + auth::SignUserId + GetConfig),
    Authenticated(user_id): Authenticated<UserId>,
    update: UserUpdate,
) -> QuillResult<SignedUser> {
    let password_hash = if let Some(password) = &update.password {
        Some(deps.hash_password(password.clone()).await?)
    } else {
        None
    };

    Ok(sign_db_user(
        deps,
        deps.update_user(
            user_id,
            user_db::UserUpdate {
                full_name: update.full_name,
                avatar_url: update.avatar_url,
                password_hash,
            },
        )
        .await?,
    ))
}

fn sign_db_user(deps: &(impl auth::SignUserId + GetConfig), db_user: user_db::User) -> SignedUser {
    let ResolvedIdentity { name, is_admin } = identity::resolve(
        &db_user.email,
        db_user.full_name.as_deref(),
        deps.get_admin_identity(),
    );

    SignedUser {
        token: deps.sign_user_id(UserId(db_user.id)),
        email: db_user.email,
        name,
        is_admin,
        avatar_url: db_user.avatar_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::PasswordHash;

    use assert_matches::*;
    use unimock::*;

    fn test_token() -> String {
        String::from("t3stt0k1")
    }

    fn test_user_id() -> uuid::Uuid {
        uuid::Uuid::parse_str("7985d146-7ee5-4bcb-b056-0e4825c2fb1f").unwrap()
    }

    fn mock_hash_password() -> unimock::Clause {
        password::hash_password::Fn
            .next_call(matching!(_))
            .answers(|_| Ok(PasswordHash("h4sh".to_string())))
            .once()
            .in_order()
    }

    fn mock_sign() -> unimock::Clause {
        auth::sign_user_id::Fn
            .next_call(matching!(_))
            .returns(test_token())
            .once()
            .in_order()
    }

    #[tokio::test]
    async fn register_should_hash_and_sign() {
        let new_user = NewUser {
            email: "reader@example.com".to_string(),
            password: "password".to_string(),
            full_name: Some("Avid Reader".to_string()),
        };
        let deps = mock([
            mock_hash_password(),
            user_db::insert_user::Fn
                .next_call(matching! {
                    (_, PasswordHash(hash), _) if hash == "h4sh"
                })
                .answers(|(email, _, full_name)| {
                    Ok(user_db::User {
                        id: test_user_id(),
                        email,
                        full_name,
                        avatar_url: None,
                    })
                })
                .once()
                .in_order(),
            mock_sign(),
            quill_core::test::mock_admin_identity(),
        ]);

        let signed_user = register_user(&deps, new_user).await.unwrap();

        assert_eq!(test_token(), signed_user.token);
        assert_eq!("Avid Reader", signed_user.name);
        assert!(!signed_user.is_admin);
    }

    #[tokio::test]
    async fn login_as_admin_should_resolve_admin_identity() {
        let login_user = LoginUser {
            email: "admin@example.com".to_string(),
            password: "password".to_string(),
        };
        let deps = mock([
            user_db::find_user_by_email::Fn
                .next_call(matching!("admin@example.com"))
                .answers(|email| {
                    Ok(Some((
                        user_db::User {
                            id: test_user_id(),
                            email,
                            full_name: Some("Whatever Is Stored".to_string()),
                            avatar_url: None,
                        },
                        PasswordHash("h4sh".into()),
                    )))
                })
                .once()
                .in_order(),
            password::verify_password::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(()))
                .once()
                .in_order(),
            mock_sign(),
            quill_core::test::mock_admin_identity(),
        ]);

        let signed_user = login(&deps, login_user).await.unwrap();

        assert!(signed_user.is_admin);
        assert_eq!("Site Owner", signed_user.name);
    }

    #[tokio::test]
    async fn login_with_unknown_email_should_fail() {
        let deps = mock(Some(
            user_db::find_user_by_email::Fn
                .next_call(matching!(_))
                .answers(|_| Ok(None))
                .once()
                .in_order(),
        ));

        assert_matches!(
            login(
                &deps,
                LoginUser {
                    email: "nobody@example.com".to_string(),
                    password: "password".to_string(),
                }
            )
            .await,
            Err(QuillError::EmailDoesNotExist)
        );
    }

    #[tokio::test]
    async fn update_with_password_should_rehash() {
        let deps = mock([
            mock_hash_password(),
            user_db::update_user::Fn
                .next_call(matching! {
                    (_, user_db::UserUpdate { password_hash: Some(PasswordHash(hash)), .. }) if hash == "h4sh"
                })
                .answers(|(UserId(user_id), _)| {
                    Ok(user_db::User {
                        id: user_id,
                        email: "reader@example.com".to_string(),
                        full_name: None,
                        avatar_url: None,
                    })
                })
                .once()
                .in_order(),
            mock_sign(),
            quill_core::test::mock_admin_identity(),
        ]);

        let signed_user = update_user(
            &deps,
            Authenticated(UserId(test_user_id())),
            UserUpdate {
                password: Some("newpassword".to_string()),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();

        // No full name on file: fall back to the email local part.
        assert_eq!("reader", signed_user.name);
    }
}

use quill_core::error::{QuillError, QuillResult};

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use entrait::entrait_export as entrait;

#[entrait(pub HashPassword, no_deps)]
async fn hash_password(password: String) -> QuillResult<quill_core::PasswordHash> {
    // Argon2 is deliberately slow; keep it off the async runtime.
    tokio::task::spawn_blocking(move || -> QuillResult<quill_core::PasswordHash> {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {}", e))?;

        Ok(quill_core::PasswordHash(hash.to_string()))
    })
    .await
    .context("panic while hashing password")?
}

#[entrait(pub VerifyPassword, no_deps)]
async fn verify_password(
    password: String,
    password_hash: quill_core::PasswordHash,
) -> QuillResult<()> {
    tokio::task::spawn_blocking(move || -> QuillResult<()> {
        let parsed = argon2::PasswordHash::new(&password_hash.0)
            .map_err(|e| anyhow::anyhow!("invalid password hash: {}", e))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => QuillError::Unauthorized,
                _ => anyhow::anyhow!("failed to verify password: {}", e).into(),
            })
    })
    .await
    .context("panic while verifying password")??;

    Ok(())
}

//! Authenticated caller of a request.

use engine::users;
use sea_orm::{DatabaseConnection, EntityTrait};

/// The user a request acts as. Every record it touches is scoped to
/// `username`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
}

/// Checks `password` against the stored bcrypt hash.
///
/// Unknown users and wrong passwords are indistinguishable to the caller.
pub async fn verify(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<AuthUser>, sea_orm::DbErr> {
    let Some(user) = users::Entity::find_by_id(username.to_string())
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let password = password.to_string();
    let hash = user.password;
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .ok()
        .and_then(|res| {
            res.inspect_err(|err| tracing::warn!("unreadable password hash: {err}"))
                .ok()
        })
        .unwrap_or(false);

    Ok(matches.then(|| AuthUser {
        username: user.username,
    }))
}

//! Actor resolution for the HTTP surface.
//!
//! The storefront frontend owns session handling; it forwards the acting user's id in the `X-Actor-Id` header. This
//! module resolves that header against the user table. Absence of the header is a legitimate state (guest checkout),
//! so resolution returns `Option<User>` and each route decides whether an actor is required.
use actix_web::HttpRequest;
use log::*;
use topup_payment_engine::{db_types::User, traits::StorefrontDatabase};

use crate::errors::ServerError;

pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// Resolves the acting user from the `X-Actor-Id` header, if present. A header naming a user that does not exist is
/// an error rather than a guest, so a stale session cannot silently downgrade to anonymous pricing.
pub async fn resolve_actor<B: StorefrontDatabase>(
    req: &HttpRequest,
    db: &B,
) -> Result<Option<User>, ServerError> {
    let Some(value) = req.headers().get(ACTOR_HEADER) else {
        return Ok(None);
    };
    let id = value.to_str().map_err(|e| {
        debug!("💻️ Could not read {ACTOR_HEADER} header. {e}");
        ServerError::InvalidRequestBody(format!("Invalid {ACTOR_HEADER} header"))
    })?;
    let user = db
        .fetch_user(id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or_else(|| ServerError::NoRecordFound(format!("User {id}")))?;
    Ok(Some(user))
}

/// Like [`resolve_actor`], but the route requires a logged-in user.
pub async fn require_actor<B: StorefrontDatabase>(req: &HttpRequest, db: &B) -> Result<User, ServerError> {
    resolve_actor(req, db)
        .await?
        .ok_or_else(|| ServerError::InsufficientPermissions(format!("{ACTOR_HEADER} header is required")))
}

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use tower_sessions::Session;
use tracing::warn;
use uuid::Uuid;

use chronicle_types::models::User;

use crate::{AppState, user_from_row, with_db};

/// Key under which the authenticated user's id is stored in the session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The authenticated principal restored from the session. Present on the
/// request only when a session carried a resolvable user id.
#[derive(Debug, Clone)]
pub struct Principal(pub User);

/// The request-scoped current-user value. Attached to every request before
/// any handler runs; `CurrentUser(None)` is the explicit absent marker for
/// unauthenticated requests.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// Identity stage: read `user_id` from the session and resolve it against
/// the store. Failures here leave the request anonymous rather than failing
/// it; a stale session id is not an error.
pub async fn restore_identity(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = match session.get::<Uuid>(SESSION_USER_ID_KEY).await {
        Ok(id) => id,
        Err(err) => {
            warn!("session read failed: {}", err);
            None
        }
    };

    if let Some(user_id) = user_id {
        let id = user_id.to_string();
        match with_db(&state, move |db| db.get_user_by_id(&id)).await {
            Ok(Some(row)) => match user_from_row(row) {
                Ok(user) => {
                    req.extensions_mut().insert(Principal(user));
                }
                Err(err) => warn!("stored user {} is malformed: {}", user_id, err),
            },
            Ok(None) => {}
            Err(err) => warn!("identity lookup failed: {}", err),
        }
    }

    next.run(req).await
}

/// Current-user stage: derive `CurrentUser` from the principal and attach it
/// unconditionally. Only the per-request extension map is touched.
pub async fn attach_current_user(mut req: Request, next: Next) -> Response {
    let user = req.extensions().get::<Principal>().map(|p| p.0.clone());
    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use chrono::Utc;
    use tower::ServiceExt;

    async fn whoami(Extension(current): Extension<CurrentUser>) -> String {
        match current.0 {
            Some(user) => user.username,
            None => "anonymous".to_string(),
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice Smith".into(),
            email: "alice@example.com".into(),
            username: "alice".into(),
            password: "hash".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unauthenticated_request_gets_explicit_absent_marker() {
        let app = Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn(attach_current_user));

        let res = app
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"anonymous");
    }

    #[tokio::test]
    async fn principal_becomes_current_user() {
        let user = test_user();
        let principal = Principal(user.clone());

        // stand-in for the identity stage
        let seed = move |mut req: Request, next: Next| {
            let principal = principal.clone();
            async move {
                req.extensions_mut().insert(principal);
                next.run(req).await
            }
        };

        let app = Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn(attach_current_user))
            .layer(middleware::from_fn(seed));

        let res = app
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"alice");
    }
}

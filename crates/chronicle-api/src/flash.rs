use axum::{extract::Request, middleware::Next, response::Response};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::warn;

/// Session key holding flash messages queued for the next rendered page.
const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
}

/// A one-shot notice: written by one request, rendered exactly once by a
/// later one, then gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Flash messages drained from the session for the current request.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlashes(pub Vec<FlashMessage>);

/// Queue a flash message for the next page render.
pub async fn push(session: &Session, level: FlashLevel, text: &str) -> anyhow::Result<()> {
    let mut pending: Vec<FlashMessage> = session.get(FLASH_KEY).await?.unwrap_or_default();
    pending.push(FlashMessage {
        level,
        text: text.to_string(),
    });
    session.insert(FLASH_KEY, pending).await?;
    Ok(())
}

/// Flash stage: drain pending messages out of the session into a
/// request-scoped value consumed by view rendering.
pub async fn drain_flashes(session: Session, mut req: Request, next: Next) -> Response {
    let pending = match session.remove::<Vec<FlashMessage>>(FLASH_KEY).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(err) => {
            warn!("flash drain failed: {}", err);
            Vec::new()
        }
    };

    req.extensions_mut().insert(IncomingFlashes(pending));
    next.run(req).await
}

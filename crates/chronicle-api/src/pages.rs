use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::flash::IncomingFlashes;
use crate::identity::CurrentUser;
use crate::{AppState, views, with_db};

/// `GET /` — all articles, unfiltered.
///
/// Known gap, kept deliberately: on a store error the request is logged and
/// then left without a terminal response, so the client connection stalls.
/// See DESIGN.md before changing this.
pub async fn home(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Response {
    match with_db(&state, |db| db.list_articles()).await {
        Ok(articles) => views::home_page(&current, &flashes.0, &articles).into_response(),
        Err(err) => {
            error!("article listing failed: {:#}", err);
            std::future::pending::<Response>().await
        }
    }
}

pub async fn chat(
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Html<String> {
    views::chat_page(&current, &flashes.0)
}

/// Fallback for unmatched paths. Renders the not-found view at the render
/// call's default status (200); see DESIGN.md for why the status stays 200.
pub async fn not_found(
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Html<String> {
    views::not_found_page(&current, &flashes.0)
}

/// Not-found render for misses under `/public`. Static assets sit outside
/// the session stack, so there is no current user or flash state here.
pub async fn asset_miss() -> Html<String> {
    views::not_found_page(&CurrentUser(None), &[])
}

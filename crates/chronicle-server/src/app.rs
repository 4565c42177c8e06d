use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    handler::HandlerWithoutStateExt,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use cookie::Key;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use chronicle_api::{AppState, articles, auth, flash, identity, pages};
use chronicle_gateway::{ChatHub, connection};

use crate::config::Config;
use crate::pipeline::{Pipeline, Stage};

/// Build the full application router from a validated pipeline.
///
/// Handler routes form the core; each stage's layer is folded on in reverse
/// declaration order, so the first declared stage is the outermost layer and
/// runs first. Static assets and the chat gateway sit outside the session
/// stack on the outer router.
pub fn build_router(pipeline: &Pipeline, state: AppState, hub: ChatHub, config: &Config) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_signed(Key::derive_from(config.session_secret.as_bytes()))
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::hours(2)));

    let mut router = Router::new()
        .route("/", get(pages::home))
        .route("/chat", get(pages::chat))
        .route("/articles", post(articles::create))
        .route("/articles/new", get(articles::new_form))
        .route("/articles/{id}", get(articles::show))
        .route("/articles/{id}", post(articles::update))
        .route("/articles/{id}", delete(articles::delete))
        .route("/articles/{id}/edit", get(articles::edit_form))
        .route("/users/register", get(auth::register_form))
        .route("/users/register", post(auth::register))
        .route("/users/login", get(auth::login_form))
        .route("/users/login", post(auth::login))
        .route("/users/logout", get(auth::logout))
        .fallback(pages::not_found)
        .with_state(state.clone());

    let mut session_layer = Some(session_layer);
    for stage in pipeline.stages().iter().rev() {
        router = match stage {
            Stage::CurrentUser => {
                router.layer(middleware::from_fn(identity::attach_current_user))
            }
            Stage::Identity => router.layer(middleware::from_fn_with_state(
                state.clone(),
                identity::restore_identity,
            )),
            Stage::Flash => router.layer(middleware::from_fn(flash::drain_flashes)),
            Stage::Session => match session_layer.take() {
                Some(layer) => router.layer(layer),
                None => router,
            },
            // dispatch and the fallback are the router itself; assets mount below
            Stage::StaticAssets | Stage::Dispatch | Stage::NotFound => router,
        };
    }

    Router::new()
        .nest_service(
            "/public",
            ServeDir::new(&config.public_dir).not_found_service(pages::asset_miss.into_service()),
        )
        .route("/gateway", get(ws_upgrade))
        .with_state(hub)
        .merge(router)
        .layer(TraceLayer::new_for_http())
}

async fn ws_upgrade(State(hub): State<ChatHub>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, hub))
}

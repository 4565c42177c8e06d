pub mod articles;
pub mod auth;
pub mod flash;
pub mod identity;
pub mod pages;
pub mod validate;
pub mod views;

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;

use chronicle_db::Database;
use chronicle_db::models::UserRow;
use chronicle_types::models::User;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

/// Run a store query on the blocking thread pool. The connector is
/// synchronous; this keeps its mutex off the async workers.
pub(crate) async fn with_db<T, F>(state: &AppState, f: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.db)).await?
}

pub(crate) fn user_from_row(row: UserRow) -> Result<User> {
    Ok(User {
        id: row.id.parse()?,
        name: row.name,
        email: row.email,
        username: row.username,
        password: row.password,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")?.and_utc(),
    })
}

/// Store row types — these map directly to SQLite rows. Ids and timestamps
/// stay stringly here; the api layer parses them into domain types.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub author_id: String,
    /// Author's display name, joined in for rendering.
    pub author_name: String,
    pub body: String,
    pub created_at: String,
}

use crate::Database;
use crate::models::{ArticleRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, username, password) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, name, email, username, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Articles --

    pub fn insert_article(&self, id: &str, title: &str, author_id: &str, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO articles (id, title, author_id, body) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, title, author_id, body],
            )?;
            Ok(())
        })
    }

    pub fn update_article(&self, id: &str, title: &str, body: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE articles SET title = ?1, body = ?2 WHERE id = ?3",
                rusqlite::params![title, body, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_article(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM articles WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// All articles, unfiltered, in the store's default row order.
    pub fn list_articles(&self) -> Result<Vec<ArticleRow>> {
        self.with_conn(query_all_articles)
    }

    pub fn get_article(&self, id: &str) -> Result<Option<ArticleRow>> {
        self.with_conn(|conn| query_article(conn, id))
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is one of the two literals above, never user input
    let sql = format!(
        "SELECT id, name, email, username, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                username: row.get(3)?,
                password: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_all_articles(conn: &Connection) -> Result<Vec<ArticleRow>> {
    // JOIN users to fetch the author name in a single query
    let mut stmt = conn.prepare(
        "SELECT a.id, a.title, a.author_id, u.name, a.body, a.created_at
         FROM articles a
         LEFT JOIN users u ON a.author_id = u.id",
    )?;

    let rows = stmt
        .query_map([], article_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_article(conn: &Connection, id: &str) -> Result<Option<ArticleRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.title, a.author_id, u.name, a.body, a.created_at
         FROM articles a
         LEFT JOIN users u ON a.author_id = u.id
         WHERE a.id = ?1",
    )?;

    let row = stmt.query_row([id], article_from_row).optional()?;

    Ok(row)
}

fn article_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        id: row.get(0)?,
        title: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        body: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

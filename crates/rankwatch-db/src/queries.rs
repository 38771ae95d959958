use crate::Database;
use crate::models::{TrackedUrlRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, first_name, last_name, company, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id,
                    user.email,
                    user.password,
                    user.first_name,
                    user.last_name,
                    user.company,
                    user.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Tracked URLs --

    pub fn insert_tracked_url(&self, row: &TrackedUrlRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tracked_urls (id, search_phrase, location, url, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    row.id,
                    row.search_phrase,
                    row.location,
                    row.url,
                    row.user_id,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// All rows owned by one user, most recent first.
    pub fn list_tracked_urls(&self, user_id: &str) -> Result<Vec<TrackedUrlRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, search_phrase, location, url, user_id, created_at
                 FROM tracked_urls
                 WHERE user_id = ?1
                 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(TrackedUrlRow {
                        id: row.get(0)?,
                        search_phrase: row.get(1)?,
                        location: row.get(2)?,
                        url: row.get(3)?,
                        user_id: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete a row scoped to its owner in a single statement. The id of a
    /// row belonging to another user affects zero rows, indistinguishable
    /// from an id that never existed.
    pub fn delete_tracked_url(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM tracked_urls WHERE id = ?1 AND user_id = ?2",
                rusqlite::params![id, user_id],
            )?;
            Ok(affected > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is one of two call-site literals, never caller input.
    let sql = format!(
        "SELECT id, email, password, first_name, last_name, company, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password: row.get(2)?,
                first_name: row.get(3)?,
                last_name: row.get(4)?,
                company: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
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

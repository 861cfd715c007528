//! Game catalog access.
//!
//! [`GameStore`] is the narrow interface the navigator depends on.
//! [`SqliteStore`] implements it over the `games` table.

use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

use crate::error::StoreError;
use crate::view::View;

/// One catalog row as needed to build a menu tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    pub rom: String,
    pub name: String,
    pub params: Option<String>,
    pub genre: String,
    pub favorite: bool,
    pub broken: bool,
}

pub trait GameStore {
    /// Rows for `view`, filtered and ordered for display.
    fn query_games(&self, view: View, show_hidden: bool) -> Result<Vec<GameRow>, StoreError>;

    fn update_favorite(&mut self, rom: &str, favorite: bool) -> Result<(), StoreError>;

    /// Success bumps the play count and clears the broken flag, failure sets it.
    fn update_play_stats(&mut self, rom: &str, success: bool) -> Result<(), StoreError>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS games (
        filename TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        genre TEXT NOT NULL DEFAULT 'Unknown',
        clone_of TEXT,
        manufacturer TEXT NOT NULL DEFAULT 'Unknown',
        year INTEGER NOT NULL DEFAULT 0,
        last_played TIMESTAMP,
        params TEXT,
        count INTEGER NOT NULL DEFAULT 0,
        favourite BOOLEAN NOT NULL DEFAULT 0,
        hide BOOLEAN NOT NULL DEFAULT 0,
        broken BOOLEAN NOT NULL DEFAULT 0,
        missing BOOLEAN NOT NULL DEFAULT 1
    );
";

/// SQL selecting the rows of `view`.
pub fn catalog_query(view: View, show_hidden: bool) -> String {
    let mut conditions: Vec<&str> = Vec::new();
    let order = match view {
        View::Favorite => {
            conditions.push("favourite = 1");
            "name"
        }
        View::MostPlayed => {
            conditions.push("count > 0");
            "count DESC, name"
        }
        View::Genre => "genre, name",
        View::All => "name",
    };
    if !show_hidden {
        conditions.push("hide = 0 AND missing = 0");
    }

    let mut query =
        String::from("SELECT filename, name, params, genre, favourite, broken FROM games");
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
    query.push_str(" ORDER BY ");
    query.push_str(order);
    query
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteStore { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Records which roms exist on disk. Unknown roms are added under their
    /// file stem; everything else gets its `missing` flag refreshed.
    pub fn sync_present(&mut self, present: &HashSet<String>) -> Result<SyncReport, StoreError> {
        let tx = self.conn.transaction()?;
        let mut report = SyncReport::default();
        {
            let mut known: HashSet<String> = HashSet::new();
            let mut select = tx.prepare("SELECT filename FROM games")?;
            let rows = select.query_map([], |row| row.get::<_, String>(0))?;
            for rom in rows {
                known.insert(rom?);
            }

            let mut insert =
                tx.prepare("INSERT INTO games (filename, name, missing) VALUES (?1, ?1, 0)")?;
            let mut mark = tx.prepare("UPDATE games SET missing = ?1 WHERE filename = ?2")?;
            for rom in &known {
                let missing = !present.contains(rom);
                mark.execute(params![missing, rom])?;
                if missing {
                    report.missing += 1;
                } else {
                    report.present += 1;
                }
            }
            for rom in present.iter().filter(|r| !known.contains(*r)) {
                insert.execute(params![rom])?;
                report.added += 1;
            }
        }
        tx.commit()?;
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub present: usize,
    pub missing: usize,
}

impl GameStore for SqliteStore {
    fn query_games(&self, view: View, show_hidden: bool) -> Result<Vec<GameRow>, StoreError> {
        let query = catalog_query(view, show_hidden);
        log::debug!("query_games: {}", query);

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok(GameRow {
                rom: row.get(0)?,
                name: row.get(1)?,
                params: row.get(2)?,
                genre: row.get(3)?,
                favorite: row.get(4)?,
                broken: row.get(5)?,
            })
        })?;

        let mut games = Vec::new();
        for row in rows {
            games.push(row?);
        }
        Ok(games)
    }

    fn update_favorite(&mut self, rom: &str, favorite: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE games SET favourite = ?1 WHERE filename = ?2",
            params![favorite, rom],
        )?;
        if changed == 0 {
            log::warn!("update_favorite: no catalog entry for {}", rom);
        }
        Ok(())
    }

    fn update_play_stats(&mut self, rom: &str, success: bool) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let changed = if success {
            tx.execute(
                "UPDATE games SET count = count + 1, broken = 0, \
                 last_played = CURRENT_TIMESTAMP WHERE filename = ?1",
                params![rom],
            )?
        } else {
            tx.execute("UPDATE games SET broken = 1 WHERE filename = ?1", params![rom])?
        };
        tx.commit()?;
        if changed == 0 {
            log::warn!("update_play_stats: no catalog entry for {}", rom);
        }
        Ok(())
    }
}

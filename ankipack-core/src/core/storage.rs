//! The SQLite collection store written into every package.

use crate::{AnkipackError, Result};
use rusqlite::{params, Connection, Transaction};
use std::path::Path;

/// Collection schema version understood by the importing application.
pub const SCHEMA_VERSION: i64 = 11;

/// Update sequence number marking rows as not yet synced.
pub const USN_UNSYNCED: i64 = -1;

/// The single `col` row.
#[derive(Debug, Clone)]
pub struct CollectionRow {
    /// Creation time in seconds.
    pub crt: i64,
    /// Modification time in milliseconds.
    pub modified: i64,
    /// Schema modification time in milliseconds.
    pub scm: i64,
    pub conf: String,
    pub models: String,
    pub decks: String,
    pub dconf: String,
    pub tags: String,
}

/// One `notes` row. Unused columns are written as fixed placeholders.
#[derive(Debug, Clone)]
pub struct NoteRow<'a> {
    pub id: i64,
    pub guid: &'a str,
    pub note_type_id: i64,
    /// Modification time in seconds.
    pub modified: i64,
    pub flds: &'a str,
}

/// One `cards` row. Every scheduling column is written as a new card.
#[derive(Debug, Clone, Copy)]
pub struct CardRow {
    pub id: i64,
    pub note_id: i64,
    pub deck_id: i64,
    pub ord: usize,
    /// Modification time in seconds.
    pub modified: i64,
}

/// An open collection database.
pub struct Collection {
    conn: Connection,
}

impl Collection {
    /// Creates the collection file at `path` and lays down the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Closes the database, flushing it to disk.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| AnkipackError::Database(e))
    }

    pub fn insert_collection(tx: &Transaction, row: &CollectionRow) -> Result<()> {
        tx.execute(
            "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
             VALUES (1, ?, ?, ?, ?, 0, 0, 0, ?, ?, ?, ?, ?)",
            params![
                row.crt,
                row.modified,
                row.scm,
                SCHEMA_VERSION,
                row.conf,
                row.models,
                row.decks,
                row.dconf,
                row.tags,
            ],
        )?;
        Ok(())
    }

    pub fn insert_note(tx: &Transaction, row: &NoteRow<'_>) -> Result<()> {
        tx.execute(
            "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
             VALUES (?, ?, ?, ?, ?, '', ?, 0, 0, 0, '')",
            params![row.id, row.guid, row.note_type_id, row.modified, USN_UNSYNCED, row.flds],
        )?;
        Ok(())
    }

    pub fn insert_card(tx: &Transaction, row: &CardRow) -> Result<()> {
        tx.execute(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
             VALUES (?, ?, ?, ?, ?, ?, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![row.id, row.note_id, row.deck_id, row.ord as i64, row.modified, USN_UNSYNCED],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn table_names(collection: &Collection, kind: &str) -> Vec<String> {
        collection
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type=?")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_create_collection() {
        let temp = NamedTempFile::new().unwrap();
        let collection = Collection::create(temp.path()).unwrap();

        let tables = table_names(&collection, "table");
        for table in ["col", "notes", "cards", "revlog", "graves"] {
            assert!(tables.contains(&table.to_string()), "missing table {table}");
        }

        let indexes = table_names(&collection, "index");
        for index in [
            "ix_notes_usn",
            "ix_cards_usn",
            "ix_revlog_usn",
            "ix_cards_nid",
            "ix_cards_sched",
            "ix_revlog_cid",
            "ix_notes_csum",
        ] {
            assert!(indexes.contains(&index.to_string()), "missing index {index}");
        }
    }

    #[test]
    fn test_insert_rows() {
        let temp = NamedTempFile::new().unwrap();
        let mut collection = Collection::create(temp.path()).unwrap();

        let tx = collection.connection_mut().transaction().unwrap();
        Collection::insert_note(
            &tx,
            &NoteRow {
                id: 1,
                guid: "abc",
                note_type_id: 99,
                modified: 1_700_000_000,
                flds: "a\u{1f}b",
            },
        )
        .unwrap();
        Collection::insert_card(
            &tx,
            &CardRow {
                id: 1,
                note_id: 1,
                deck_id: 5,
                ord: 0,
                modified: 1_700_000_000,
            },
        )
        .unwrap();
        tx.commit().unwrap();

        let (guid, usn, tags): (String, i64, String) = collection
            .connection()
            .query_row("SELECT guid, usn, tags FROM notes WHERE id = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!(guid, "abc");
        assert_eq!(usn, USN_UNSYNCED);
        assert_eq!(tags, "");

        let (did, queue, data): (i64, i64, String) = collection
            .connection()
            .query_row("SELECT did, queue, data FROM cards WHERE nid = 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .unwrap();
        assert_eq!(did, 5);
        assert_eq!(queue, 0);
        assert_eq!(data, "");
    }
}

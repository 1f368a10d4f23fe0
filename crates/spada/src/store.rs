//! SQLite store of treatise text.
//!
//! Chapters and their paragraphs are rows of one `entries` table, linked by
//! `parent_id`. Searches match `content` against a regular expression through
//! a `REGEXP` function registered on the store's own connection.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use spada_core::treatise::Section;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    language TEXT NOT NULL,
    content TEXT NOT NULL,
    parent_id INTEGER,
    entry_type TEXT NOT NULL,
    FOREIGN KEY(parent_id) REFERENCES entries(id)
);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Chapter,
    Paragraph,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Chapter => "chapter",
            EntryType::Paragraph => "paragraph",
        }
    }
}

/// One row returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
    pub entry_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub chapters: usize,
    pub paragraphs: usize,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        register_regexp(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    pub fn insert_entry(
        &self,
        language: &str,
        content: &str,
        parent_id: Option<i64>,
        entry_type: EntryType,
    ) -> rusqlite::Result<i64> {
        insert(&self.conn, language, content, parent_id, entry_type)
    }

    /// Entries whose content matches `pattern`, optionally restricted to
    /// one language, in insertion order.
    pub fn search_entries(
        &self,
        pattern: &str,
        language: Option<&str>,
    ) -> rusqlite::Result<Vec<Entry>> {
        let mut sql = String::from(
            "SELECT id, content, parent_id, entry_type FROM entries WHERE content REGEXP ?1",
        );
        if language.is_some() {
            sql.push_str(" AND language = ?2");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let to_entry = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Entry> {
            Ok(Entry {
                id: row.get(0)?,
                content: row.get(1)?,
                parent_id: row.get(2)?,
                entry_type: row.get(3)?,
            })
        };
        let rows = match language {
            Some(language) => stmt.query_map(params![pattern, language], to_entry)?,
            None => stmt.query_map(params![pattern], to_entry)?,
        };
        rows.collect()
    }

    /// Content of an entry's parent chapter, if any.
    pub fn parent_content(&self, entry: &Entry) -> rusqlite::Result<Option<String>> {
        let Some(parent_id) = entry.parent_id else {
            return Ok(None);
        };
        self.conn
            .query_row(
                "SELECT content FROM entries WHERE id = ?1",
                params![parent_id],
                |row| row.get(0),
            )
            .optional()
    }

    /// Store every section as a chapter row per language, with one paragraph
    /// row per non-blank line of that language's text.
    ///
    /// Runs in a single transaction.
    pub fn import_sections(&mut self, sections: &[Section]) -> rusqlite::Result<ImportReport> {
        let tx = self.conn.transaction()?;
        let mut report = ImportReport::default();

        for section in sections {
            let mut texts: Vec<(&str, &str)> = Vec::new();
            if let Some(it) = section.content.it.as_deref() {
                texts.push(("it", it));
            }
            if let Some(fr) = section.content.fr.as_deref() {
                texts.push(("fr", fr));
            }
            for version in section.content.en_versions.iter().flatten() {
                texts.push(("en", version.text.as_str()));
            }

            for (language, text) in texts {
                if text.trim().is_empty() {
                    continue;
                }
                let chapter = insert(&tx, language, &section.title, None, EntryType::Chapter)?;
                report.chapters += 1;
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    insert(&tx, language, line, Some(chapter), EntryType::Paragraph)?;
                    report.paragraphs += 1;
                }
            }
        }

        tx.commit()?;
        log::info!(
            "imported {} chapters and {} paragraphs",
            report.chapters,
            report.paragraphs
        );
        Ok(report)
    }
}

fn insert(
    conn: &Connection,
    language: &str,
    content: &str,
    parent_id: Option<i64>,
    entry_type: EntryType,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO entries (language, content, parent_id, entry_type) VALUES (?1, ?2, ?3, ?4)",
        params![language, content, parent_id, entry_type.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// `content REGEXP pattern` calls `regexp(pattern, content)`. The compiled
/// pattern is cached per statement.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let regexp: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;
            let text = ctx
                .get_raw(1)
                .as_str()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(regexp.is_match(text))
        },
    )
}

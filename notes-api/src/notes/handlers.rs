use chrono::Utc;
use indexmap::IndexMap;
use rusqlite::{params, types::Type, Row};
use sea_query::SqliteQueryBuilder;
use sea_query_rusqlite::RusqliteBinder;
use serde_json::Value;

use crate::{db::DB, Error, Result};

use super::{
    parse_note_id,
    query::{count_notes, select_notes, NoteFilter, Pagination},
    CreateNote, DeletedNote, FindNotesQuery, NewNote, Note, NoteId, NoteStats, RecentNote, UpdateNote,
};

const NOTE_NOT_FOUND: &str = "Note not found";
const TOP_TAGS: i64 = 10;
const RECENT_ACTIVITY: i64 = 5;

const SELECT_NOTE: &str =
    "SELECT id, title, content, category, tags, color, created_at, updated_at FROM notes WHERE id = ?";
const RETURNING_NOTE: &str = "RETURNING id, title, content, category, tags, color, created_at, updated_at";

impl<'a> TryFrom<&Row<'a>> for Note {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'a>) -> std::result::Result<Self, Self::Error> {
        let tags: Value = row.get(4)?;

        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            category: row.get(3)?,
            tags: serde_json::from_value(tags)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
            color: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

#[derive(Debug)]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Matches before pagination.
    pub total: u64,
}

pub async fn find_notes(query: &FindNotesQuery, max_limit: u64, db: &DB) -> Result<NotePage> {
    let filter = NoteFilter::from_query(query);
    let page = Pagination::from_params(query.limit.as_deref(), query.skip.as_deref(), max_limit);

    tracing::debug!(?filter, ?page, "find notes");

    db.call(move |conn| {
        let (sql, values) = select_notes(&filter, page).build_rusqlite(SqliteQueryBuilder);
        let notes = conn
            .prepare(&sql)?
            .query_map(&*values.as_params(), |row| Note::try_from(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let (sql, values) = count_notes(&filter).build_rusqlite(SqliteQueryBuilder);
        let total = conn.query_row(&sql, &*values.as_params(), |row| row.get::<_, i64>(0))?;

        Ok(NotePage {
            notes,
            total: total as u64,
        })
    })
    .await
    .map_err(Error::from)
}

pub async fn note_stats(db: &DB) -> Result<NoteStats> {
    db.call(|conn| {
        let total_notes = conn.query_row("SELECT count(*) FROM notes", [], |row| row.get::<_, i64>(0))?;

        let category_counts = conn
            .prepare(
                "SELECT category, count(*) AS count FROM notes
                GROUP BY category
                ORDER BY count DESC, category ASC",
            )?
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<std::result::Result<IndexMap<_, _>, _>>()?;

        let tag_counts = conn
            .prepare(
                "SELECT tag.value, count(*) AS count FROM notes, json_each(notes.tags) AS tag
                GROUP BY tag.value
                ORDER BY count DESC, tag.value ASC
                LIMIT ?",
            )?
            .query_map(params![TOP_TAGS], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<std::result::Result<IndexMap<_, _>, _>>()?;

        let recent_activity = conn
            .prepare("SELECT id, title, updated_at FROM notes ORDER BY updated_at DESC, rowid DESC LIMIT ?")?
            .query_map(params![RECENT_ACTIVITY], |row| {
                Ok(RecentNote {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(NoteStats {
            total_notes: total_notes as u64,
            category_counts,
            tag_counts,
            recent_activity,
        })
    })
    .await
    .map_err(Error::from)
}

pub async fn get_note(note_id: &str, db: &DB) -> Result<Note> {
    let note_id = parse_note_id(note_id)?;

    db.call(move |conn| {
        let note = conn.query_row(
            SELECT_NOTE,
            params![note_id],
            |row| Note::try_from(row),
        )?;
        Ok(note)
    })
    .await
    .map_err(Error::from)
    .map_err(|e| e.not_found_message(NOTE_NOT_FOUND))
}

pub async fn create_note(input: CreateNote, db: &DB) -> Result<Note> {
    let NewNote {
        title,
        content,
        category,
        tags,
        color,
    } = NewNote::try_from(input)?;
    let now = Utc::now();

    let note = db
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO notes (title, content, category, tags, color, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?) {RETURNING_NOTE}"
                ),
                params![title, content, category, Value::from(tags), color, now, now],
                |row| Note::try_from(row),
            )
            .map_err(|e| e.into())
        })
        .await
        .map_err(Error::from)?;

    tracing::info!(note_id = %note.id, "note created");
    Ok(note)
}

pub async fn update_note(note_id: &str, patch: UpdateNote, db: &DB) -> Result<Note> {
    let note_id = parse_note_id(note_id)?;

    let note = db
        .call(move |conn| {
            let tx = conn.transaction()?;

            let mut note = tx.query_row(
                SELECT_NOTE,
                params![note_id],
                |row| Note::try_from(row),
            )?;
            patch.apply(&mut note)?;

            let note = tx.query_row(
                &format!(
                    "UPDATE notes SET title = ?, content = ?, category = ?, tags = ?, color = ?, updated_at = ?
                    WHERE id = ? {RETURNING_NOTE}"
                ),
                params![
                    note.title,
                    note.content,
                    note.category,
                    Value::from(note.tags.clone()),
                    note.color,
                    Utc::now(),
                    note_id
                ],
                |row| Note::try_from(row),
            )?;

            tx.commit()?;
            Ok(note)
        })
        .await
        .map_err(Error::from)
        .map_err(|e| e.not_found_message(NOTE_NOT_FOUND))?;

    tracing::info!(note_id = %note.id, "note updated");
    Ok(note)
}

pub async fn delete_note(note_id: &str, db: &DB) -> Result<DeletedNote> {
    let note_id = parse_note_id(note_id)?;

    let deleted_id = db
        .call(move |conn| {
            conn.query_row("DELETE FROM notes WHERE id = ? RETURNING id", params![note_id], |row| {
                row.get::<_, NoteId>(0)
            })
            .map_err(|e| e.into())
        })
        .await
        .map_err(Error::from)
        .map_err(|e| e.not_found_message(NOTE_NOT_FOUND))?;

    tracing::info!(note_id = %deleted_id, "note deleted");
    Ok(DeletedNote { deleted_id })
}

//! Relational projection of a snapshot.

use crate::snapshot::SnapshotContents;
use crate::{PlayEvent, Result, SyncError};
use chrono::NaiveDateTime;

/// Name of the destination table.
pub const PLAY_HISTORY_TABLE: &str = "play_history";

/// SQL column types used by the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Timestamp,
    BigInt,
    Boolean,
    Text,
}

impl SqlType {
    pub fn mysql_type(self) -> &'static str {
        match self {
            SqlType::Timestamp => "DATETIME(6)",
            SqlType::BigInt => "BIGINT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Text => "TEXT",
        }
    }
}

/// A column of the play history table. One per [`PlayEvent`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    PlayedAt,
    TrackId,
    TrackName,
    Popularity,
    DurationMs,
    Explicit,
    ArtistId,
    ArtistName,
    AlbumName,
    AlbumImage,
    ReleaseDate,
    ArtistGenre,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::PlayedAt,
        Column::TrackId,
        Column::TrackName,
        Column::Popularity,
        Column::DurationMs,
        Column::Explicit,
        Column::ArtistId,
        Column::ArtistName,
        Column::AlbumName,
        Column::AlbumImage,
        Column::ReleaseDate,
        Column::ArtistGenre,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::PlayedAt => "played_at",
            Column::TrackId => "track_id",
            Column::TrackName => "track_name",
            Column::Popularity => "popularity",
            Column::DurationMs => "duration_ms",
            Column::Explicit => "explicit",
            Column::ArtistId => "artist_id",
            Column::ArtistName => "artist_name",
            Column::AlbumName => "album_name",
            Column::AlbumImage => "album_image",
            Column::ReleaseDate => "release_date",
            Column::ArtistGenre => "artist_genre",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|column| column.name() == name)
    }

    pub fn sql_type(self) -> SqlType {
        match self {
            Column::PlayedAt => SqlType::Timestamp,
            Column::Popularity | Column::DurationMs => SqlType::BigInt,
            Column::Explicit => SqlType::Boolean,
            _ => SqlType::Text,
        }
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Timestamp(NaiveDateTime),
    BigInt(i64),
    Boolean(bool),
    Text(String),
}

impl PlayEvent {
    /// Value of `column` for this event, with `played_at` coerced to a timestamp.
    pub fn column_value(&self, column: Column) -> Result<SqlValue> {
        let text = |value: &str| SqlValue::Text(value.to_string());
        Ok(match column {
            Column::PlayedAt => SqlValue::Timestamp(self.played_at_utc()?.naive_utc()),
            Column::TrackId => text(&self.track_id),
            Column::TrackName => text(&self.track_name),
            Column::Popularity => SqlValue::BigInt(i64::from(self.popularity)),
            Column::DurationMs => {
                let millis = i64::try_from(self.duration_ms).map_err(|_| {
                    SyncError::Parse(format!("duration_ms {} out of range", self.duration_ms))
                })?;
                SqlValue::BigInt(millis)
            }
            Column::Explicit => SqlValue::Boolean(self.explicit),
            Column::ArtistId => text(&self.artist_id),
            Column::ArtistName => text(&self.artist_name),
            Column::AlbumName => text(&self.album_name),
            Column::AlbumImage => self.album_image.as_deref().map_or(SqlValue::Null, text),
            Column::ReleaseDate => text(&self.release_date),
            Column::ArtistGenre => self.artist_genre.as_deref().map_or(SqlValue::Null, text),
        })
    }
}

/// Schema and rows for one full-replace load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl TableData {
    /// Build the `play_history` table from a snapshot.
    ///
    /// The column set follows the snapshot's header row; header entries that are
    /// not play event fields are skipped.
    pub fn from_snapshot(contents: &SnapshotContents) -> Result<Self> {
        let mut columns = Vec::with_capacity(contents.columns.len());
        for header in &contents.columns {
            match Column::from_name(header) {
                Some(column) if !columns.contains(&column) => columns.push(column),
                Some(_) => log::warn!("Duplicate snapshot column '{header}' ignored"),
                None => log::warn!("Unknown snapshot column '{header}' ignored"),
            }
        }

        let rows = contents
            .events
            .iter()
            .map(|event| {
                columns
                    .iter()
                    .map(|column| event.column_value(*column))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: PLAY_HISTORY_TABLE.to_string(),
            columns,
            rows,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `CREATE TABLE` statement for this table's columns (MySQL dialect).
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("`{}` {}", column.name(), column.sql_type().mysql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE `{}` ({columns})", self.name)
    }
}

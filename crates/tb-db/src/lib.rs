//! Storage layer for the time block planner.
//!
//! Provides persistence for time blocks and daily progress using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. Writes go through `&mut self`, so one handle has one writer.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with millisecond precision
//! (e.g., `2025-03-10T09:00:00.000Z`). Every write uses the same format, so
//! lexicographic order matches chronological order and day-range queries can
//! compare strings directly.
//!
//! Dates in `daily_progress` are stored as `YYYY-MM-DD`.
//!
//! ## Calendar Days
//!
//! Blocks are not stored with a day column. The day a block belongs to depends
//! on the caller's [`Calendar`], so range queries convert the requested days to
//! a UTC instant window and filter on `start_time`.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;

use tb_core::{
    BlockId, BlockStatus, BlockStore, Calendar, DailyProgress, DateRange, DayRating, TimeBlock,
    ValidationError,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored block ID is not a valid ID.
    #[error("invalid block id in database: {0}")]
    InvalidId(#[source] ValidationError),
    /// Failed to parse a block timestamp.
    #[error("invalid timestamp for block {block_id}: {timestamp}")]
    TimestampParse {
        block_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A block row carries an unknown status string.
    #[error("invalid status for block {block_id}")]
    InvalidStatus {
        block_id: String,
        #[source]
        source: ValidationError,
    },
    /// Failed to parse a progress date.
    #[error("invalid date in daily progress: {value}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored day rating is outside 1..=5.
    #[error("invalid rating for {date}")]
    InvalidRating {
        date: NaiveDate,
        #[source]
        source: ValidationError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A block as stored, before its text columns are parsed.
struct BlockRow {
    id: String,
    title: String,
    start_time: String,
    end_time: String,
    notes: Option<String>,
    category: Option<String>,
    icon: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl BlockRow {
    const COLUMNS: &'static str =
        "id, title, start_time, end_time, notes, category, icon, status, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            notes: row.get(4)?,
            category: row.get(5)?,
            icon: row.get(6)?,
            status: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_block(self) -> Result<TimeBlock, DbError> {
        let status = self
            .status
            .parse::<BlockStatus>()
            .map_err(|source| DbError::InvalidStatus {
                block_id: self.id.clone(),
                source,
            })?;
        Ok(TimeBlock {
            start_time: parse_timestamp(&self.start_time, &self.id)?,
            end_time: parse_timestamp(&self.end_time, &self.id)?,
            created_at: parse_timestamp(&self.created_at, &self.id)?,
            updated_at: parse_timestamp(&self.updated_at, &self.id)?,
            id: BlockId::new(self.id).map_err(DbError::InvalidId)?,
            title: self.title,
            notes: self.notes,
            category: self.category,
            icon: self.icon,
            status,
        })
    }
}

struct ProgressRow {
    date: String,
    total_blocks: u32,
    completed_blocks: u32,
    skipped_blocks: u32,
    day_rating: Option<u8>,
    day_notes: Option<String>,
}

impl ProgressRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            date: row.get(0)?,
            total_blocks: row.get(1)?,
            completed_blocks: row.get(2)?,
            skipped_blocks: row.get(3)?,
            day_rating: row.get(4)?,
            day_notes: row.get(5)?,
        })
    }

    fn into_progress(self) -> Result<DailyProgress, DbError> {
        let date = parse_date(&self.date)?;
        let day_rating = self
            .day_rating
            .map(DayRating::new)
            .transpose()
            .map_err(|source| DbError::InvalidRating { date, source })?;
        Ok(DailyProgress {
            date,
            total_blocks: self.total_blocks,
            completed_blocks: self.completed_blocks,
            skipped_blocks: self.skipped_blocks,
            day_rating,
            day_notes: self.day_notes,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Blocks: one scheduled interval each
            -- start_time/end_time: RFC 3339 UTC, e.g. '2025-03-10T09:00:00.000Z'
            -- status: not_started | in_progress | completed | skipped
            CREATE TABLE IF NOT EXISTS blocks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                notes TEXT,
                category TEXT,
                icon TEXT,
                status TEXT NOT NULL DEFAULT 'not_started',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_blocks_start ON blocks(start_time);
            CREATE INDEX IF NOT EXISTS idx_blocks_category ON blocks(category);

            -- Daily progress: recomputed from blocks, plus the user's rating
            CREATE TABLE IF NOT EXISTS daily_progress (
                date TEXT PRIMARY KEY,
                total_blocks INTEGER NOT NULL DEFAULT 0,
                completed_blocks INTEGER NOT NULL DEFAULT 0,
                skipped_blocks INTEGER NOT NULL DEFAULT 0,
                day_rating INTEGER CHECK (day_rating BETWEEN 1 AND 5),
                day_notes TEXT
            );
            ",
        )?;
        Ok(())
    }

    /// Finds blocks whose ID starts with `prefix`, for short IDs on the CLI.
    pub fn find_blocks_by_prefix(&self, prefix: &str) -> Result<Vec<TimeBlock>, DbError> {
        let pattern = format!("{}%", escape_like(prefix));
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM blocks WHERE id LIKE ?1 ESCAPE '\\' ORDER BY start_time ASC, id ASC",
            BlockRow::COLUMNS
        ))?;
        let rows = stmt.query_map([pattern], BlockRow::from_row)?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?.into_block()?);
        }
        Ok(blocks)
    }
}

impl BlockStore for Database {
    type Error = DbError;

    fn load_blocks(&self, range: DateRange, calendar: &Calendar) -> Result<Vec<TimeBlock>, DbError> {
        let from = format_timestamp(calendar.day_start(range.start));
        let to = format_timestamp(calendar.day_end(range.end));
        debug!(%from, %to, "loading blocks");

        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {}
            FROM blocks
            WHERE start_time >= ?1 AND start_time < ?2
            ORDER BY start_time ASC, id ASC
            ",
            BlockRow::COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to], BlockRow::from_row)?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?.into_block()?);
        }
        Ok(blocks)
    }

    fn load_block(&self, id: &BlockId) -> Result<Option<TimeBlock>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM blocks WHERE id = ?1", BlockRow::COLUMNS),
                [id.as_str()],
                BlockRow::from_row,
            )
            .optional()?;
        row.map(BlockRow::into_block).transpose()
    }

    fn load_progress(&self, range: DateRange) -> Result<Vec<DailyProgress>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT date, total_blocks, completed_blocks, skipped_blocks, day_rating, day_notes
            FROM daily_progress
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![format_date(range.start), format_date(range.end)],
            ProgressRow::from_row,
        )?;
        let mut progress = Vec::new();
        for row in rows {
            progress.push(row?.into_progress()?);
        }
        Ok(progress)
    }

    fn save_block(&mut self, block: &TimeBlock) -> Result<(), DbError> {
        upsert_block(&self.conn, block)
    }

    fn delete_block(&mut self, id: &BlockId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM blocks WHERE id = ?1", [id.as_str()])?;
        Ok(deleted > 0)
    }

    fn save_progress(&mut self, progress: &DailyProgress) -> Result<(), DbError> {
        upsert_progress(&self.conn, progress)
    }

    /// Writes the block and its day summaries in one transaction.
    fn save_block_with_progress(
        &mut self,
        block: &TimeBlock,
        progress: &[DailyProgress],
    ) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        upsert_block(&tx, block)?;
        for day in progress {
            upsert_progress(&tx, day)?;
        }
        tx.commit()?;
        debug!(id = %block.id, days = progress.len(), "saved block with progress");
        Ok(())
    }

    fn delete_block_with_progress(
        &mut self,
        id: &BlockId,
        progress: &DailyProgress,
    ) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM blocks WHERE id = ?1", [id.as_str()])?;
        upsert_progress(&tx, progress)?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}

fn upsert_block(conn: &Connection, block: &TimeBlock) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO blocks
        (id, title, start_time, end_time, notes, category, icon, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            start_time = excluded.start_time,
            end_time = excluded.end_time,
            notes = excluded.notes,
            category = excluded.category,
            icon = excluded.icon,
            status = excluded.status,
            updated_at = excluded.updated_at
        ",
        params![
            block.id.as_str(),
            block.title,
            format_timestamp(block.start_time),
            format_timestamp(block.end_time),
            block.notes,
            block.category,
            block.icon,
            block.status.as_str(),
            format_timestamp(block.created_at),
            format_timestamp(block.updated_at),
        ],
    )?;
    Ok(())
}

fn upsert_progress(conn: &Connection, progress: &DailyProgress) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO daily_progress
        (date, total_blocks, completed_blocks, skipped_blocks, day_rating, day_notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(date) DO UPDATE SET
            total_blocks = excluded.total_blocks,
            completed_blocks = excluded.completed_blocks,
            skipped_blocks = excluded.skipped_blocks,
            day_rating = excluded.day_rating,
            day_notes = excluded.day_notes
        ",
        params![
            format_date(progress.date),
            progress.total_blocks,
            progress.completed_blocks,
            progress.skipped_blocks,
            progress.day_rating.map(DayRating::value),
            progress.day_notes,
        ],
    )?;
    Ok(())
}

fn parse_timestamp(timestamp: &str, block_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            block_id: block_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| DbError::DateParse {
        value: value.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

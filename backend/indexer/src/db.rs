//! SQLite storage: migrations, the polling cursor and event rows.

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::events::{EventRecord, ProtocolEvent};

const EVENT_COLUMNS: &str = "id, event_type, project_id, actor, amount, status, ledger, \
                             timestamp, contract_id, tx_hash, created_at";

/// Open the pool and apply pending migrations.
///
/// An in-memory database lives only as long as its connection, so those get
/// a single-connection pool.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&format!("{url}{}", create_flag(&url)))
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!(%url, "database ready");
    Ok(pool)
}

/// File databases are created on first start.
fn create_flag(url: &str) -> &'static str {
    if url.contains(":memory:") || url.contains("mode=") {
        ""
    } else if url.contains('?') {
        "&mode=rwc"
    } else {
        "?mode=rwc"
    }
}

/// Where the next poll resumes.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Cursor {
    pub last_ledger: i64,
    pub last_cursor: Option<String>,
}

pub async fn load_cursor(pool: &SqlitePool) -> Result<Cursor> {
    let cursor = sqlx::query_as::<_, Cursor>(
        "SELECT last_ledger, last_cursor FROM indexer_cursor WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(cursor.unwrap_or(Cursor {
        last_ledger: 0,
        last_cursor: None,
    }))
}

pub async fn save_cursor(pool: &SqlitePool, cursor: &Cursor) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO indexer_cursor (id, last_ledger, last_cursor) VALUES (1, ?1, ?2)
        ON CONFLICT(id) DO UPDATE SET last_ledger = excluded.last_ledger,
                                      last_cursor = excluded.last_cursor
        "#,
    )
    .bind(cursor.last_ledger)
    .bind(&cursor.last_cursor)
    .execute(pool)
    .await?;
    Ok(())
}

/// Store a batch in one transaction. Rows already present are skipped;
/// returns how many were new.
pub async fn insert_events(pool: &SqlitePool, events: &[ProtocolEvent]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for ev in events {
        inserted += sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_type, project_id, actor, amount, status, ledger, timestamp,
                 contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&ev.event_type)
        .bind(&ev.project_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(&ev.status)
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Events of one project in ledger order.
pub async fn get_events_for_project(
    pool: &SqlitePool,
    project_id: &str,
) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE project_id = ?1 ORDER BY ledger ASC, id ASC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All events in ledger order, optionally only those of one `event_type`.
pub async fn get_events(pool: &SqlitePool, kind: Option<&str>) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events \
         WHERE ?1 IS NULL OR event_type = ?1 \
         ORDER BY ledger ASC, id ASC"
    ))
    .bind(kind)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

//! Background polling loop: RPC page → decode → store → persist cursor.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::db::{self, Cursor};
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Poll until `shutdown` fires.
pub async fn run(state: Arc<IndexerState>, shutdown: CancellationToken) {
    info!(contract = %state.config.contract_id, "indexer starting");

    let mut cursor = match db::load_cursor(&state.pool).await {
        Ok(saved) if saved.last_ledger > 0 || saved.last_cursor.is_some() => saved,
        Ok(_) => Cursor {
            last_ledger: i64::from(state.config.start_ledger),
            last_cursor: None,
        },
        Err(e) => {
            error!("could not read saved cursor, starting from config: {e}");
            Cursor {
                last_ledger: i64::from(state.config.start_ledger),
                last_cursor: None,
            }
        }
    };
    info!(ledger = cursor.last_ledger, "resuming");

    loop {
        let polled = tokio::select! {
            _ = shutdown.cancelled() => break,
            polled = poll_once(&state, &cursor) => polled,
        };
        match polled {
            Ok(next) => cursor = next,
            Err(e) => error!("poll failed: {e}"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)) => {}
        }
    }
    info!(ledger = cursor.last_ledger, "indexer stopped");
}

/// One page. The returned cursor has already been saved.
async fn poll_once(state: &IndexerState, cursor: &Cursor) -> Result<Cursor> {
    let start_ledger = u32::try_from(cursor.last_ledger).unwrap_or(state.config.start_ledger);
    let page = rpc::fetch_events(
        &state.client,
        &state.config.rpc_url,
        &state.config.contract_id,
        start_ledger,
        cursor.last_cursor.as_deref(),
        state.config.events_per_page,
    )
    .await?;

    if !page.events.is_empty() {
        let decoded = rpc::decode_events(&page.events, &state.config.contract_id);
        let inserted = db::insert_events(&state.pool, &decoded).await?;
        info!(fetched = page.events.len(), inserted, "stored events");
    }

    // Keep paginating from the RPC cursor when one is returned; the ledger
    // only moves forward.
    let next = Cursor {
        last_ledger: page
            .latest_ledger
            .and_then(|l| i64::try_from(l).ok())
            .map_or(cursor.last_ledger, |l| l.max(cursor.last_ledger)),
        last_cursor: page.cursor.or_else(|| cursor.last_cursor.clone()),
    };
    db::save_cursor(&state.pool, &next).await?;
    Ok(next)
}

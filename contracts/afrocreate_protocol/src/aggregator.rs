//! # Revenue Aggregator
//!
//! Reconciles per-epoch revenue reports from a project's registered sources
//! into one authoritative amount.
//!
//! An epoch finalizes at the median of its reports either
//!
//! - as soon as every registered source has reported and every report lies
//!   within `tolerance_bps` of the median, or
//! - once the reporting window has elapsed, provided at least `min_quorum`
//!   sources reported. Otherwise the epoch is `Failed` and never accrued.
//!
//! Window expiry is evaluated lazily by whichever call touches the epoch next.
//! Both outcomes are final.

use soroban_sdk::{log, Address, Env, Map, Vec};

use crate::events::{self, EpochClosed, EpochOpened, RevenueReported, SourceChanged};
use crate::ledger;
use crate::math::{median, within_tolerance};
use crate::rbac;
use crate::storage;
use crate::types::{EpochStatus, ProjectStatus, ProtocolConfig, RevenueEpoch};
use crate::Error;

pub fn register_source(
    env: &Env,
    caller: &Address,
    project_id: u64,
    source: &Address,
) -> Result<(), Error> {
    caller.require_auth();
    rbac::require_admin_or_above(env, caller)?;
    storage::load_project_config(env, project_id)?;

    let mut sources = storage::load_sources(env, project_id);
    if sources.contains(source) {
        return Err(Error::SourceAlreadyRegistered);
    }
    sources.push_back(source.clone());
    storage::save_sources(env, project_id, &sources);

    events::source_changed(
        env,
        SourceChanged {
            project_id,
            source: source.clone(),
            registered: true,
        },
    );
    Ok(())
}

/// De-register a source. Reports it already filed stay on their epochs.
pub fn remove_source(
    env: &Env,
    caller: &Address,
    project_id: u64,
    source: &Address,
) -> Result<(), Error> {
    caller.require_auth();
    rbac::require_admin_or_above(env, caller)?;

    let mut sources = storage::load_sources(env, project_id);
    let index = sources
        .first_index_of(source)
        .ok_or(Error::SourceNotRegistered)?;
    sources.remove(index);
    storage::save_sources(env, project_id, &sources);

    events::source_changed(
        env,
        SourceChanged {
            project_id,
            source: source.clone(),
            registered: false,
        },
    );
    Ok(())
}

/// Open the next epoch of a released project. Epoch indices start at 1.
pub fn open_epoch(env: &Env, caller: &Address, project_id: u64) -> Result<u32, Error> {
    caller.require_auth();
    let sources = storage::load_sources(env, project_id);
    if !sources.contains(caller) {
        rbac::require_admin_or_above(env, caller)?;
    }
    let state = storage::load_project_state(env, project_id)?;
    if state.status != ProjectStatus::Released {
        return Err(Error::ProjectNotReleased);
    }
    let config = storage::load_config(env)?;

    let latest = storage::epoch_count(env, project_id);
    if latest > 0 {
        let mut previous = storage::load_epoch(env, project_id, latest)?;
        if close_if_window_elapsed(env, &config, &mut previous)? == EpochStatus::Reporting {
            return Err(Error::EpochStillReporting);
        }
    }

    let index = latest.checked_add(1).ok_or(Error::Overflow)?;
    let opened_at = env.ledger().timestamp();
    let epoch = RevenueEpoch {
        project_id,
        index,
        reports: Map::new(env),
        status: EpochStatus::Reporting,
        finalized_amount: 0,
        opened_at,
        closes_at: opened_at.saturating_add(config.report_window_secs),
    };
    storage::save_epoch(env, &epoch);
    storage::set_epoch_count(env, project_id, index);

    events::epoch_opened(
        env,
        EpochOpened {
            project_id,
            epoch: index,
            closes_at: epoch.closes_at,
        },
    );
    Ok(index)
}

/// File or revise `source`'s report for an epoch.
///
/// Reports against a closed epoch, or arriving after the window, change
/// nothing. Returns the epoch status after the report.
pub fn report(
    env: &Env,
    source: &Address,
    project_id: u64,
    epoch_index: u32,
    amount: i128,
) -> Result<EpochStatus, Error> {
    source.require_auth();
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let sources = storage::load_sources(env, project_id);
    if !sources.contains(source) {
        return Err(Error::SourceNotRegistered);
    }
    let config = storage::load_config(env)?;
    let mut epoch = storage::load_epoch(env, project_id, epoch_index)?;
    if epoch.status != EpochStatus::Reporting {
        return Ok(epoch.status);
    }
    let status = close_if_window_elapsed(env, &config, &mut epoch)?;
    if status != EpochStatus::Reporting {
        return Ok(status);
    }

    epoch.reports.set(source.clone(), amount);
    storage::save_epoch(env, &epoch);
    events::revenue_reported(
        env,
        RevenueReported {
            project_id,
            epoch: epoch_index,
            source: source.clone(),
            amount,
        },
    );

    if let Some(amount) = unanimous_median(&config, &sources, &epoch) {
        close(env, &mut epoch, EpochStatus::Finalized, amount)?;
    }
    Ok(epoch.status)
}

/// Apply whichever finalization rule currently holds.
///
/// A closed epoch returns its stored status. An epoch that can not close yet
/// fails with `ConsensusNotReached`.
pub fn finalize(env: &Env, project_id: u64, epoch_index: u32) -> Result<EpochStatus, Error> {
    let config = storage::load_config(env)?;
    let mut epoch = storage::load_epoch(env, project_id, epoch_index)?;
    if epoch.status != EpochStatus::Reporting {
        return Ok(epoch.status);
    }
    let sources = storage::load_sources(env, project_id);
    if let Some(amount) = unanimous_median(&config, &sources, &epoch) {
        close(env, &mut epoch, EpochStatus::Finalized, amount)?;
        return Ok(epoch.status);
    }
    match close_if_window_elapsed(env, &config, &mut epoch)? {
        EpochStatus::Reporting => Err(Error::ConsensusNotReached),
        status => Ok(status),
    }
}

pub fn latest_epoch(env: &Env, project_id: u64) -> Option<RevenueEpoch> {
    match storage::epoch_count(env, project_id) {
        0 => None,
        latest => storage::load_epoch(env, project_id, latest).ok(),
    }
}

/// Median of the reports when every registered source has reported and all
/// reports agree within tolerance.
fn unanimous_median(
    config: &ProtocolConfig,
    sources: &Vec<Address>,
    epoch: &RevenueEpoch,
) -> Option<i128> {
    if sources.is_empty() || !sources.iter().all(|source| epoch.reports.contains_key(source)) {
        return None;
    }
    let values = epoch.reports.values();
    let center = median(&values)?;
    within_tolerance(&values, center, config.tolerance_bps).then_some(center)
}

/// Apply the window rule if the reporting window has elapsed.
fn close_if_window_elapsed(
    env: &Env,
    config: &ProtocolConfig,
    epoch: &mut RevenueEpoch,
) -> Result<EpochStatus, Error> {
    if epoch.status != EpochStatus::Reporting || env.ledger().timestamp() < epoch.closes_at {
        return Ok(epoch.status);
    }
    let values = epoch.reports.values();
    match median(&values) {
        Some(amount) if values.len() >= config.min_quorum => {
            close(env, epoch, EpochStatus::Finalized, amount)?;
        }
        _ => {
            log!(env, "epoch failed quorum", epoch.project_id, epoch.index, values.len());
            close(env, epoch, EpochStatus::Failed, 0)?;
        }
    }
    Ok(epoch.status)
}

fn close(
    env: &Env,
    epoch: &mut RevenueEpoch,
    status: EpochStatus,
    amount: i128,
) -> Result<(), Error> {
    epoch.status = status;
    epoch.finalized_amount = amount;
    storage::save_epoch(env, epoch);
    if status == EpochStatus::Finalized {
        ledger::accrue(env, epoch.project_id, epoch.index, amount)?;
    }

    events::epoch_closed(
        env,
        EpochClosed {
            project_id: epoch.project_id,
            epoch: epoch.index,
            amount,
            reports: epoch.reports.len(),
            status,
        },
    );
    Ok(())
}

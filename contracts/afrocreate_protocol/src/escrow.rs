//! # Escrow Vault
//!
//! Custodies each project's raised value. Deposits are accepted while the
//! project is `Open`; value leaves only through [`release`], driven by the
//! funding state machine, or through backer-pulled [`refund`]s once the
//! project is `Refunding`.
//!
//! Every operation that moves value runs under the project's reentrancy lock
//! and commits its state before the token transfer.

use soroban_sdk::{log, token, Address, Env};

use crate::events::{self, Deposited, Refunded};
use crate::funding;
use crate::math::{checked_add, checked_sub, mul_div_floor};
use crate::safety::non_reentrant;
use crate::storage::{self, LockScope};
use crate::types::{Contribution, ProjectStatus};
use crate::validation;
use crate::Error;

/// Accept `amount` from `backer` into the project's escrow.
///
/// Returns the index of the new contribution record.
pub fn deposit(env: &Env, project_id: u64, backer: &Address, amount: i128) -> Result<u32, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let config = storage::load_project_config(env, project_id)?;
    let state = storage::load_project_state(env, project_id)?;
    if state.status != ProjectStatus::Open {
        return Err(Error::ProjectNotOpen);
    }
    if env.ledger().timestamp() >= config.deadline {
        return Err(Error::DeadlinePassed);
    }
    // A milestone may have lapsed before the project deadline.
    if funding::settle(env, project_id)? != ProjectStatus::Open {
        return Err(Error::ProjectNotOpen);
    }
    let protocol = storage::load_config(env)?;
    if amount < protocol.min_contribution {
        return Err(Error::ContributionTooSmall);
    }
    if !validation::is_project_publishable(env, &protocol, project_id) {
        return Err(Error::NotPublishable);
    }

    non_reentrant(env, LockScope::Project(project_id), || {
        let mut state = storage::load_project_state(env, project_id)?;
        let index = state.contribution_count;

        storage::save_contribution(
            env,
            &Contribution {
                index,
                project_id,
                backer: backer.clone(),
                amount,
                timestamp: env.ledger().timestamp(),
                refunded: false,
            },
        );
        let mut owned = storage::load_backer_contributions(env, project_id, backer);
        owned.push_back(index);
        storage::save_backer_contributions(env, project_id, backer, &owned);

        state.balance = checked_add(state.balance, amount)?;
        state.total_raised = checked_add(state.total_raised, amount)?;
        state.contribution_count = index.checked_add(1).ok_or(Error::Overflow)?;
        state.live_contributions = state
            .live_contributions
            .checked_add(1)
            .ok_or(Error::Overflow)?;
        storage::save_project_state(env, project_id, &state);

        token::Client::new(env, &config.token).transfer(
            backer,
            &env.current_contract_address(),
            &amount,
        );

        events::deposited(
            env,
            Deposited {
                project_id,
                backer: backer.clone(),
                amount,
                contribution_index: index,
                balance: state.balance,
            },
        );
        Ok(index)
    })
}

/// Pay `amount` out of the project's escrow to `recipient`.
///
/// Only the funding state machine calls this. Callers must have persisted
/// their own state changes first: the balance is re-read under the lock.
pub(crate) fn release(
    env: &Env,
    project_id: u64,
    token: &Address,
    recipient: &Address,
    amount: i128,
) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    if amount == 0 {
        return Ok(());
    }
    non_reentrant(env, LockScope::Project(project_id), || {
        let mut state = storage::load_project_state(env, project_id)?;
        if amount > state.balance {
            return Err(Error::InsufficientBalance);
        }
        state.balance = checked_sub(state.balance, amount)?;
        storage::save_project_state(env, project_id, &state);

        token::Client::new(env, token).transfer(&env.current_contract_address(), recipient, &amount);
        Ok(())
    })
}

/// Refund every unrefunded contribution of `backer`, pro-rata against the
/// balance captured when the project failed.
///
/// Returns the amount paid. A backer with nothing left to refund gets `0`.
pub fn refund(env: &Env, project_id: u64, backer: &Address) -> Result<i128, Error> {
    match funding::settle(env, project_id)? {
        ProjectStatus::Refunding => {}
        ProjectStatus::Refunded => return Ok(0),
        _ => return Err(Error::RefundNotAvailable),
    }
    let config = storage::load_project_config(env, project_id)?;

    non_reentrant(env, LockScope::Project(project_id), || {
        let mut state = storage::load_project_state(env, project_id)?;
        let mut payout: i128 = 0;
        let mut settled: u32 = 0;

        for index in storage::load_backer_contributions(env, project_id, backer).iter() {
            let mut contribution = storage::load_contribution(env, project_id, index)?;
            if contribution.refunded {
                continue;
            }
            let share = mul_div_floor(contribution.amount, state.refund_pool, state.refund_base)?;
            payout = checked_add(payout, share)?;
            settled += 1;
            contribution.refunded = true;
            storage::save_contribution(env, &contribution);
        }

        if settled == 0 {
            return Ok(0);
        }
        if payout > state.balance {
            return Err(Error::InsufficientBalance);
        }

        state.balance = checked_sub(state.balance, payout)?;
        state.live_contributions = state.live_contributions.saturating_sub(settled);
        if state.live_contributions == 0 {
            funding::advance(env, project_id, &mut state, ProjectStatus::Refunded);
            log!(env, "project fully refunded", project_id);
        }
        storage::save_project_state(env, project_id, &state);

        if payout > 0 {
            token::Client::new(env, &config.token).transfer(
                &env.current_contract_address(),
                backer,
                &payout,
            );
        }

        events::refunded(
            env,
            Refunded {
                project_id,
                backer: backer.clone(),
                amount: payout,
                status: state.status,
            },
        );
        Ok(payout)
    })
}

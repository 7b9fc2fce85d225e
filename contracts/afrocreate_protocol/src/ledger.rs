//! # Revenue-Share Ledger
//!
//! Claims are rows keyed by claim id. Each one entitles its current owner to
//! `share_bps` of every finalized epoch of its project:
//!
//! ```text
//! entitlement = floor(revenue_total * share_bps / 10000) - cumulative_claimed
//! ```
//!
//! `revenue_total` grows only through [`accrue`]. Payouts come out of the
//! project's revenue pool, which is funded separately by
//! [`deposit_revenue`].

use soroban_sdk::{token, Address, Env, Vec};

use crate::events::{self, ClaimMinted, ClaimTransferred, RevenueAccrued, RevenueClaimed, RevenueDeposited};
use crate::math::{apply_bps, checked_add, checked_sub, share_bps, BPS_DENOMINATOR};
use crate::safety::non_reentrant;
use crate::storage::{self, LockScope};
use crate::types::{ProjectState, ProjectStatus, RevenueShareClaim};
use crate::Error;

/// Issue one claim per contribution, plus a treasury claim for whatever the
/// per-contribution rounding left over. Returns the number of claims minted.
pub(crate) fn mint_claims(
    env: &Env,
    project_id: u64,
    state: &ProjectState,
    treasury: &Address,
) -> Result<u32, Error> {
    let mut ids = storage::load_project_claims(env, project_id);
    let mut allocated: u32 = 0;

    for index in 0..state.contribution_count {
        let contribution = storage::load_contribution(env, project_id, index)?;
        let share = share_bps(contribution.amount, state.total_raised)?;
        allocated += share;
        ids.push_back(mint(env, project_id, &contribution.backer, share));
    }

    let remainder = BPS_DENOMINATOR.saturating_sub(allocated);
    if remainder > 0 {
        ids.push_back(mint(env, project_id, treasury, remainder));
    }
    storage::save_project_claims(env, project_id, &ids);
    Ok(ids.len())
}

fn mint(env: &Env, project_id: u64, owner: &Address, share_bps: u32) -> u64 {
    let claim = RevenueShareClaim {
        id: storage::next_claim_id(env),
        project_id,
        owner: owner.clone(),
        share_bps,
        cumulative_claimed: 0,
    };
    storage::save_claim(env, &claim);
    events::claim_minted(
        env,
        ClaimMinted {
            project_id,
            claim_id: claim.id,
            owner: claim.owner.clone(),
            share_bps,
        },
    );
    claim.id
}

/// Add a finalized epoch amount to the project's lifetime revenue.
pub(crate) fn accrue(env: &Env, project_id: u64, epoch: u32, amount: i128) -> Result<i128, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    if storage::is_accrued(env, project_id, epoch) {
        return Err(Error::EpochAlreadyAccrued);
    }
    let total = checked_add(storage::revenue_total(env, project_id), amount)?;
    storage::mark_accrued(env, project_id, epoch);
    storage::set_revenue_total(env, project_id, total);

    events::revenue_accrued(
        env,
        RevenueAccrued {
            project_id,
            epoch,
            amount,
            lifetime_total: total,
        },
    );
    Ok(total)
}

/// Fund the project's revenue pool from `payer`. Returns the new pool size.
pub fn deposit_revenue(
    env: &Env,
    project_id: u64,
    payer: &Address,
    amount: i128,
) -> Result<i128, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let config = storage::load_project_config(env, project_id)?;
    let state = storage::load_project_state(env, project_id)?;
    if state.status != ProjectStatus::Released {
        return Err(Error::ProjectNotReleased);
    }
    let pool = checked_add(storage::revenue_pool(env, project_id), amount)?;
    storage::set_revenue_pool(env, project_id, pool);

    token::Client::new(env, &config.token).transfer(
        payer,
        &env.current_contract_address(),
        &amount,
    );
    events::revenue_deposited(
        env,
        RevenueDeposited {
            project_id,
            payer: payer.clone(),
            amount,
            pool,
        },
    );
    Ok(pool)
}

fn entitlement(env: &Env, claim: &RevenueShareClaim) -> Result<i128, Error> {
    let earned = apply_bps(storage::revenue_total(env, claim.project_id), claim.share_bps)?;
    checked_sub(earned, claim.cumulative_claimed)
}

pub fn claimable(env: &Env, claim_id: u64) -> Result<i128, Error> {
    let claim = storage::load_claim(env, claim_id)?;
    Ok(entitlement(env, &claim)?.max(0))
}

/// Pay the claim owner everything accrued since their last claim.
pub fn claim(env: &Env, claim_id: u64) -> Result<i128, Error> {
    let owner = storage::load_claim(env, claim_id)?.owner;
    owner.require_auth();

    non_reentrant(env, LockScope::Claim(claim_id), || {
        let mut claim = storage::load_claim(env, claim_id)?;
        let owed = entitlement(env, &claim)?;
        if owed <= 0 {
            return Err(Error::NothingToClaim);
        }
        if owed < storage::load_config(env)?.min_claim_amount {
            return Err(Error::BelowMinimumClaim);
        }
        let pool = storage::revenue_pool(env, claim.project_id);
        if pool < owed {
            return Err(Error::InsufficientBalance);
        }

        claim.cumulative_claimed = checked_add(claim.cumulative_claimed, owed)?;
        storage::save_claim(env, &claim);
        storage::set_revenue_pool(env, claim.project_id, checked_sub(pool, owed)?);

        let config = storage::load_project_config(env, claim.project_id)?;
        token::Client::new(env, &config.token).transfer(
            &env.current_contract_address(),
            &claim.owner,
            &owed,
        );

        events::revenue_claimed(
            env,
            RevenueClaimed {
                project_id: claim.project_id,
                claim_id,
                owner: claim.owner.clone(),
                amount: owed,
                cumulative_claimed: claim.cumulative_claimed,
            },
        );
        Ok(owed)
    })
}

/// Hand the claim to `new_owner`. `cumulative_claimed` stays with the claim.
pub fn transfer(
    env: &Env,
    claim_id: u64,
    caller: &Address,
    new_owner: &Address,
) -> Result<(), Error> {
    caller.require_auth();
    let mut claim = storage::load_claim(env, claim_id)?;
    if claim.owner != *caller {
        return Err(Error::NotOwner);
    }
    claim.owner = new_owner.clone();
    storage::save_claim(env, &claim);

    events::claim_transferred(
        env,
        ClaimTransferred {
            project_id: claim.project_id,
            claim_id,
            from: caller.clone(),
            to: new_owner.clone(),
        },
    );
    Ok(())
}

pub fn project_claims(env: &Env, project_id: u64) -> Result<Vec<RevenueShareClaim>, Error> {
    let mut out = Vec::new(env);
    for claim_id in storage::load_project_claims(env, project_id).iter() {
        out.push_back(storage::load_claim(env, claim_id)?);
    }
    Ok(out)
}

//! # AfroCreate Protocol Contract
//!
//! Creator funding with escrow, and revenue sharing with backers afterwards.
//! The single Soroban contract `AfroCreateProtocol` exposes:
//!
//! | Phase        | Entry Point(s)                                                     |
//! |--------------|--------------------------------------------------------------------|
//! | Bootstrap    | [`AfroCreateProtocol::init`]                                       |
//! | Role admin   | `grant_role`, `revoke_role`, `transfer_super_admin`, `pause`, `unpause` |
//! | Governance   | `set_platform_fee`, `set_consensus_params`, `set_min_contribution`, `set_min_claim_amount`, `set_milestone_grace`, `set_treasury`, `set_validator` |
//! | Funding      | `open_project`, `deposit`, `settle`, `refund`                      |
//! | Milestones   | `attest_milestone`, `release_milestone`                            |
//! | Revenue      | `deposit_revenue`, `claim`, `transfer`                             |
//! | Aggregation  | `register_source`, `remove_source`, `open_epoch`, `report`, `finalize` |
//! | Queries      | `get_project`, `get_milestones`, `get_claim`, `get_epoch`, ...     |
//!
//! ## Architecture
//!
//! Authorization lives in [`rbac`], persistence in [`storage`]. Value moves
//! through [`escrow`] and [`ledger`] only, under the guards in [`safety`].
//! This file holds the entry points and nothing else: each one authenticates,
//! checks the pause flag and delegates.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

mod aggregator;
mod escrow;
pub mod events;
mod funding;
mod ledger;
mod math;
pub mod rbac;
mod safety;
mod storage;
pub mod types;
pub mod validation;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_utils;

pub use rbac::Role;
pub use types::{
    Contribution, EpochStatus, FundingPolicy, Milestone, MilestonePlan, MilestoneStatus, Project,
    ProjectStatus, ProtocolConfig, RevenueEpoch, RevenueShareClaim,
};

use safety::require_not_paused;

/// Default platform fee: 3%.
pub const DEFAULT_PLATFORM_FEE_BPS: u32 = 300;
/// Governance can never raise the fee above 10%.
pub const MAX_PLATFORM_FEE_BPS: u32 = 1_000;
pub const DEFAULT_MIN_QUORUM: u32 = 3;
pub const DEFAULT_TOLERANCE_BPS: u32 = 1_000;
pub const DEFAULT_REPORT_WINDOW_SECS: u64 = 48 * 60 * 60;
pub const DEFAULT_MIN_CONTRIBUTION: i128 = 1;
pub const DEFAULT_MIN_CLAIM_AMOUNT: i128 = 1;
pub const DEFAULT_MILESTONE_GRACE_SECS: u64 = 7 * 24 * 60 * 60;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    InvalidAmount           = 1,
    ProjectNotOpen          = 2,
    DeadlinePassed          = 3,
    InsufficientBalance     = 4,
    NotOwner                = 5,
    EpochAlreadyAccrued     = 6,
    NothingToClaim          = 7,
    ConsensusNotReached     = 8,
    Unauthorized            = 9,
    ProjectNotFound         = 10,
    ClaimNotFound           = 11,
    EpochNotFound           = 12,
    AlreadyInitialized      = 13,
    NotInitialized          = 14,
    InvalidPolicy           = 15,
    InvalidParameter        = 16,
    NotPublishable          = 17,
    MilestoneNotApproved    = 18,
    MilestoneNotFound       = 19,
    RefundNotAvailable      = 20,
    ProjectNotReleased      = 21,
    SourceAlreadyRegistered = 22,
    SourceNotRegistered     = 23,
    EpochStillReporting     = 24,
    Reentrant               = 25,
    Paused                  = 26,
    Overflow                = 27,
    RoleNotFound            = 28,
    ContributionTooSmall    = 29,
    BelowMinimumClaim       = 30,
    ContributionNotFound    = 31,
}

#[contract]
pub struct AfroCreateProtocol;

#[contractimpl]
impl AfroCreateProtocol {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract, seat the first SuperAdmin and write the
    /// default protocol parameters.
    ///
    /// Must be called exactly once after deployment.
    pub fn init(env: Env, super_admin: Address, treasury: Address) -> Result<(), Error> {
        super_admin.require_auth();
        if storage::has_config(&env) {
            return Err(Error::AlreadyInitialized);
        }
        rbac::init_super_admin(&env, &super_admin)?;
        storage::save_config(
            &env,
            &ProtocolConfig {
                treasury: treasury.clone(),
                platform_fee_bps: DEFAULT_PLATFORM_FEE_BPS,
                min_quorum: DEFAULT_MIN_QUORUM,
                tolerance_bps: DEFAULT_TOLERANCE_BPS,
                report_window_secs: DEFAULT_REPORT_WINDOW_SECS,
                min_contribution: DEFAULT_MIN_CONTRIBUTION,
                min_claim_amount: DEFAULT_MIN_CLAIM_AMOUNT,
                milestone_grace_secs: DEFAULT_MILESTONE_GRACE_SECS,
                validator: None,
            },
        );
        events::initialized(
            &env,
            events::Initialized {
                super_admin,
                treasury,
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`.
    ///
    /// - `caller` must hold `SuperAdmin` or `Admin`.
    /// - Only `SuperAdmin` can grant `SuperAdmin`, which moves the seat.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke any role except `SuperAdmin` from `target`.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::revoke_role(&env, &caller, &target)
    }

    pub fn transfer_super_admin(
        env: Env,
        current_super_admin: Address,
        new_super_admin: Address,
    ) -> Result<(), Error> {
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin)
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::role_of(&env, address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, address, role)
    }

    /// Halt every state-mutating, non-administrative entry point.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, true);
        events::pause_changed(&env, events::PauseChanged { by: caller, paused: true });
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        storage::set_paused(&env, false);
        events::pause_changed(&env, events::PauseChanged { by: caller, paused: false });
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Governance
    // ─────────────────────────────────────────────────────────

    /// Set the platform fee taken from each successful payout.
    ///
    /// - `caller` must hold `Governor`, `Admin` or `SuperAdmin`.
    /// - `fee_bps` may not exceed [`MAX_PLATFORM_FEE_BPS`].
    pub fn set_platform_fee(env: Env, caller: Address, fee_bps: u32) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_governance(&env, &caller)?;
        if fee_bps > MAX_PLATFORM_FEE_BPS {
            return Err(Error::InvalidParameter);
        }
        let mut config = storage::load_config(&env)?;
        config.platform_fee_bps = fee_bps;
        store_params(&env, caller, config);
        Ok(())
    }

    /// Set the aggregator's consensus parameters. New windows apply to epochs
    /// opened afterwards; quorum and tolerance apply immediately.
    pub fn set_consensus_params(
        env: Env,
        caller: Address,
        min_quorum: u32,
        tolerance_bps: u32,
        report_window_secs: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_governance(&env, &caller)?;
        if min_quorum == 0 || tolerance_bps > math::BPS_DENOMINATOR || report_window_secs == 0 {
            return Err(Error::InvalidParameter);
        }
        let mut config = storage::load_config(&env)?;
        config.min_quorum = min_quorum;
        config.tolerance_bps = tolerance_bps;
        config.report_window_secs = report_window_secs;
        store_params(&env, caller, config);
        Ok(())
    }

    /// Smallest deposit any project accepts. Must be positive.
    pub fn set_min_contribution(env: Env, caller: Address, amount: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_governance(&env, &caller)?;
        if amount <= 0 {
            return Err(Error::InvalidParameter);
        }
        let mut config = storage::load_config(&env)?;
        config.min_contribution = amount;
        store_params(&env, caller, config);
        Ok(())
    }

    /// Smallest payout a claim may take. Must be positive.
    pub fn set_min_claim_amount(env: Env, caller: Address, amount: i128) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_governance(&env, &caller)?;
        if amount <= 0 {
            return Err(Error::InvalidParameter);
        }
        let mut config = storage::load_config(&env)?;
        config.min_claim_amount = amount;
        store_params(&env, caller, config);
        Ok(())
    }

    /// Time a funded milestone may sit unreleased past its deadline. Applies
    /// to every open project from the next settlement on.
    pub fn set_milestone_grace(env: Env, caller: Address, grace_secs: u64) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_governance(&env, &caller)?;
        if grace_secs > funding::MAX_DURATION_SECS {
            return Err(Error::InvalidParameter);
        }
        let mut config = storage::load_config(&env)?;
        config.milestone_grace_secs = grace_secs;
        store_params(&env, caller, config);
        Ok(())
    }

    pub fn set_treasury(env: Env, caller: Address, treasury: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        let mut config = storage::load_config(&env)?;
        config.treasury = treasury;
        store_params(&env, caller, config);
        Ok(())
    }

    /// Point the protocol at a cultural-validation contract, or detach it.
    pub fn set_validator(env: Env, caller: Address, validator: Option<Address>) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&env, &caller)?;
        let mut config = storage::load_config(&env)?;
        config.validator = validator;
        store_params(&env, caller, config);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<ProtocolConfig, Error> {
        storage::load_config(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Open a project under `policy`.
    ///
    /// - `creator` must hold `Creator`, `Admin` or `SuperAdmin`.
    /// - `deadline` must lie in the future and at most 365 days away.
    /// - A milestone plan must be non-empty, strictly increasing in deadline,
    ///   end no later than `deadline` and sum to `target`.
    pub fn open_project(
        env: Env,
        creator: Address,
        token: Address,
        policy: FundingPolicy,
        target: i128,
        deadline: u64,
        category: String,
    ) -> Result<Project, Error> {
        require_not_paused(&env)?;
        creator.require_auth();
        rbac::require_can_open(&env, &creator)?;
        storage::load_config(&env)?;
        funding::open_project(&env, &creator, &token, policy, target, deadline, category)
    }

    /// Contribute `amount` of the project's token. Returns the contribution
    /// index.
    pub fn deposit(env: Env, project_id: u64, backer: Address, amount: i128) -> Result<u32, Error> {
        require_not_paused(&env)?;
        backer.require_auth();
        escrow::deposit(&env, project_id, &backer, amount)
    }

    /// Evaluate deadline rules now. Anyone may call it; the outcome is the
    /// same as letting the next interaction evaluate them.
    pub fn settle(env: Env, project_id: u64) -> Result<ProjectStatus, Error> {
        require_not_paused(&env)?;
        funding::settle(&env, project_id)
    }

    /// Pull the refund owed to `backer` on a failed project.
    pub fn refund(env: Env, project_id: u64, backer: Address) -> Result<i128, Error> {
        require_not_paused(&env)?;
        backer.require_auth();
        escrow::refund(&env, project_id, &backer)
    }

    /// The creator declares the active milestone complete.
    pub fn attest_milestone(
        env: Env,
        creator: Address,
        project_id: u64,
        index: u32,
    ) -> Result<(), Error> {
        require_not_paused(&env)?;
        creator.require_auth();
        funding::attest_milestone(&env, &creator, project_id, index)
    }

    pub fn release_milestone(env: Env, project_id: u64) -> Result<ProjectStatus, Error> {
        require_not_paused(&env)?;
        funding::release_milestone(&env, project_id)
    }

    pub fn get_project(env: Env, project_id: u64) -> Result<Project, Error> {
        storage::load_project(&env, project_id)
    }

    pub fn get_milestones(env: Env, project_id: u64) -> Result<Vec<Milestone>, Error> {
        funding::get_milestones(&env, project_id)
    }

    /// Every contribution `backer` made to the project, refunded or not.
    pub fn get_contributions(
        env: Env,
        project_id: u64,
        backer: Address,
    ) -> Result<Vec<Contribution>, Error> {
        let mut out = Vec::new(&env);
        for index in storage::load_backer_contributions(&env, project_id, &backer).iter() {
            out.push_back(storage::load_contribution(&env, project_id, index)?);
        }
        Ok(out)
    }

    pub fn get_contribution_count(env: Env, project_id: u64) -> Result<u32, Error> {
        Ok(storage::load_project_state(&env, project_id)?.contribution_count)
    }

    // ─────────────────────────────────────────────────────────
    // Revenue sharing
    // ─────────────────────────────────────────────────────────

    /// Fund the revenue pool claim holders are paid from.
    pub fn deposit_revenue(
        env: Env,
        project_id: u64,
        payer: Address,
        amount: i128,
    ) -> Result<i128, Error> {
        require_not_paused(&env)?;
        payer.require_auth();
        ledger::deposit_revenue(&env, project_id, &payer, amount)
    }

    /// Pay the claim's owner what it has accrued since the last claim.
    pub fn claim(env: Env, claim_id: u64) -> Result<i128, Error> {
        require_not_paused(&env)?;
        ledger::claim(&env, claim_id)
    }

    pub fn transfer(
        env: Env,
        claim_id: u64,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), Error> {
        require_not_paused(&env)?;
        ledger::transfer(&env, claim_id, &caller, &new_owner)
    }

    pub fn claimable(env: Env, claim_id: u64) -> Result<i128, Error> {
        ledger::claimable(&env, claim_id)
    }

    pub fn get_claim(env: Env, claim_id: u64) -> Result<RevenueShareClaim, Error> {
        storage::load_claim(&env, claim_id)
    }

    pub fn get_project_claims(env: Env, project_id: u64) -> Result<Vec<RevenueShareClaim>, Error> {
        ledger::project_claims(&env, project_id)
    }

    /// Lifetime finalized revenue of the project.
    pub fn revenue_total(env: Env, project_id: u64) -> i128 {
        storage::revenue_total(&env, project_id)
    }

    pub fn revenue_pool(env: Env, project_id: u64) -> i128 {
        storage::revenue_pool(&env, project_id)
    }

    // ─────────────────────────────────────────────────────────
    // Revenue aggregation
    // ─────────────────────────────────────────────────────────

    pub fn register_source(
        env: Env,
        caller: Address,
        project_id: u64,
        source: Address,
    ) -> Result<(), Error> {
        aggregator::register_source(&env, &caller, project_id, &source)
    }

    pub fn remove_source(
        env: Env,
        caller: Address,
        project_id: u64,
        source: Address,
    ) -> Result<(), Error> {
        aggregator::remove_source(&env, &caller, project_id, &source)
    }

    pub fn get_sources(env: Env, project_id: u64) -> Vec<Address> {
        storage::load_sources(&env, project_id)
    }

    /// Open the next reporting epoch. `caller` must be an admin or one of the
    /// project's registered sources.
    pub fn open_epoch(env: Env, caller: Address, project_id: u64) -> Result<u32, Error> {
        require_not_paused(&env)?;
        aggregator::open_epoch(&env, &caller, project_id)
    }

    /// File or revise a revenue report. Returns the epoch status afterwards.
    pub fn report(
        env: Env,
        source: Address,
        project_id: u64,
        epoch: u32,
        amount: i128,
    ) -> Result<EpochStatus, Error> {
        require_not_paused(&env)?;
        aggregator::report(&env, &source, project_id, epoch, amount)
    }

    pub fn finalize(env: Env, project_id: u64, epoch: u32) -> Result<EpochStatus, Error> {
        require_not_paused(&env)?;
        aggregator::finalize(&env, project_id, epoch)
    }

    pub fn get_epoch(env: Env, project_id: u64, epoch: u32) -> Result<RevenueEpoch, Error> {
        storage::load_epoch(&env, project_id, epoch)
    }

    pub fn latest_epoch(env: Env, project_id: u64) -> Option<RevenueEpoch> {
        aggregator::latest_epoch(&env, project_id)
    }
}

fn store_params(env: &Env, by: Address, config: ProtocolConfig) {
    storage::save_config(env, &config);
    events::params_updated(env, events::ParamsUpdated { by, config });
}

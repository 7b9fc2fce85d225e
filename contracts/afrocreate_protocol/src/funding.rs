//! # Funding Policy Engine
//!
//! One lifecycle state machine for every [`FundingPolicy`]:
//!
//! ```text
//! Open ──► Succeeded ──► Released
//!   └───► Failed ──► Refunding ──► Refunded
//! ```
//!
//! There are no timers. Deadlines are compared against the ledger timestamp
//! whenever [`settle`] runs, which every funding interaction does first.
//! `Succeeded` and `Failed` are transient within the settling call: the same
//! call pays out or snapshots the refund pool and moves on.

use soroban_sdk::{log, Address, Env, String, Vec};

use crate::escrow;
use crate::events::{self, FundsReleased, MilestoneEvent, ProjectOpened, StatusChanged};
use crate::ledger;
use crate::math::{apply_bps, checked_add, checked_sub};
use crate::storage;
use crate::types::{
    FundingPolicy, Milestone, MilestonePlan, MilestoneStatus, Project, ProjectConfig,
    ProjectState, ProjectStatus,
};
use crate::validation;
use crate::Error;

/// Longest allowed funding period.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

pub fn open_project(
    env: &Env,
    creator: &Address,
    token: &Address,
    policy: FundingPolicy,
    target: i128,
    deadline: u64,
    category: String,
) -> Result<Project, Error> {
    if target <= 0 {
        return Err(Error::InvalidAmount);
    }
    let now = env.ledger().timestamp();
    if deadline <= now || deadline - now > MAX_DURATION_SECS {
        return Err(Error::InvalidParameter);
    }

    let mut statuses: Vec<MilestoneStatus> = Vec::new(env);
    if let FundingPolicy::MilestoneBased(plan) = &policy {
        validate_plan(plan, target, now, deadline)?;
        for _ in plan.iter() {
            statuses.push_back(MilestoneStatus::Pending);
        }
    }

    let id = storage::next_project_id(env);
    let config = ProjectConfig {
        id,
        creator: creator.clone(),
        token: token.clone(),
        policy,
        target,
        deadline,
        category,
    };
    let state = ProjectState {
        balance: 0,
        total_raised: 0,
        status: ProjectStatus::Open,
        contribution_count: 0,
        live_contributions: 0,
        refund_pool: 0,
        refund_base: 0,
    };
    storage::save_project(env, &config, &state);
    if !statuses.is_empty() {
        storage::save_milestone_statuses(env, id, &statuses);
    }

    events::project_opened(
        env,
        ProjectOpened {
            project_id: id,
            creator: creator.clone(),
            token: token.clone(),
            target,
            deadline,
        },
    );
    storage::load_project(env, id)
}

fn validate_plan(
    plan: &Vec<MilestonePlan>,
    target: i128,
    now: u64,
    deadline: u64,
) -> Result<(), Error> {
    if plan.is_empty() {
        return Err(Error::InvalidPolicy);
    }
    let mut sum: i128 = 0;
    let mut previous = now;
    for milestone in plan.iter() {
        if milestone.funding_amount <= 0 {
            return Err(Error::InvalidPolicy);
        }
        if milestone.deadline <= previous || milestone.deadline > deadline {
            return Err(Error::InvalidPolicy);
        }
        previous = milestone.deadline;
        sum = checked_add(sum, milestone.funding_amount)?;
    }
    if sum != target {
        return Err(Error::InvalidPolicy);
    }
    Ok(())
}

/// Evaluate the project's deadline rules and apply any transition they call
/// for. Idempotent: once the project has left `Open` this only reports the
/// stored status.
pub fn settle(env: &Env, project_id: u64) -> Result<ProjectStatus, Error> {
    let config = storage::load_project_config(env, project_id)?;
    let state = storage::load_project_state(env, project_id)?;
    if state.status != ProjectStatus::Open {
        return Ok(state.status);
    }
    let now = env.ledger().timestamp();

    let succeeded = match &config.policy {
        FundingPolicy::AllOrNothing if now >= config.deadline => {
            Some(state.total_raised >= config.target)
        }
        FundingPolicy::Flexible if now >= config.deadline => Some(state.total_raised > 0),
        FundingPolicy::MilestoneBased(plan) => {
            if mark_missed_milestone(env, project_id, plan, state.balance)? {
                Some(false)
            } else {
                None
            }
        }
        _ => None,
    };

    match succeeded {
        None => Ok(ProjectStatus::Open),
        Some(true) => succeed(env, &config, state),
        Some(false) => fail(env, project_id, state),
    }
}

/// Marks the first pending milestone that has lapsed. Returns whether one
/// was found.
///
/// A pending milestone lapses once its deadline has passed and either the
/// escrow cannot cover it together with every earlier pending milestone, or
/// the grace period after the deadline ran out without a release.
fn mark_missed_milestone(
    env: &Env,
    project_id: u64,
    plan: &Vec<MilestonePlan>,
    balance: i128,
) -> Result<bool, Error> {
    let now = env.ledger().timestamp();
    let grace = storage::load_config(env)?.milestone_grace_secs;
    let mut statuses = storage::load_milestone_statuses(env, project_id);
    let mut required: i128 = 0;
    for (index, milestone) in plan.iter().enumerate() {
        let index = index as u32;
        if statuses.get(index) != Some(MilestoneStatus::Pending) {
            continue;
        }
        required = checked_add(required, milestone.funding_amount)?;
        if now < milestone.deadline {
            continue;
        }
        let short = balance < required;
        let expired = now >= milestone.deadline.saturating_add(grace);
        if short || expired {
            statuses.set(index, MilestoneStatus::Missed);
            storage::save_milestone_statuses(env, project_id, &statuses);
            events::milestone_missed(
                env,
                MilestoneEvent {
                    project_id,
                    index,
                    amount: milestone.funding_amount,
                    status: MilestoneStatus::Missed,
                },
            );
            log!(env, "milestone missed", project_id, index);
            return Ok(true);
        }
    }
    Ok(false)
}

/// Mint revenue-share claims and pay the escrow out, fee first.
fn succeed(
    env: &Env,
    config: &ProjectConfig,
    mut state: ProjectState,
) -> Result<ProjectStatus, Error> {
    let protocol = storage::load_config(env)?;

    advance(env, config.id, &mut state, ProjectStatus::Succeeded);
    ledger::mint_claims(env, config.id, &state, &protocol.treasury)?;

    let gross = state.balance;
    let fee = apply_bps(gross, protocol.platform_fee_bps)?;
    let net = checked_sub(gross, fee)?;
    advance(env, config.id, &mut state, ProjectStatus::Released);
    storage::save_project_state(env, config.id, &state);

    escrow::release(env, config.id, &config.token, &protocol.treasury, fee)?;
    escrow::release(env, config.id, &config.token, &config.creator, net)?;

    events::funds_released(
        env,
        FundsReleased {
            project_id: config.id,
            recipient: config.creator.clone(),
            amount: net,
            fee,
            status: ProjectStatus::Released,
        },
    );
    Ok(ProjectStatus::Released)
}

/// Snapshot the refund pool and open refunds.
fn fail(env: &Env, project_id: u64, mut state: ProjectState) -> Result<ProjectStatus, Error> {
    advance(env, project_id, &mut state, ProjectStatus::Failed);
    state.refund_pool = state.balance;
    state.refund_base = state.total_raised;
    advance(env, project_id, &mut state, ProjectStatus::Refunding);
    if state.live_contributions == 0 {
        advance(env, project_id, &mut state, ProjectStatus::Refunded);
    }
    storage::save_project_state(env, project_id, &state);
    log!(env, "project failed", project_id, state.refund_pool);
    Ok(state.status)
}

/// Move `state` one edge forward and publish the transition. Persisting the
/// state is left to the caller.
pub(crate) fn advance(env: &Env, project_id: u64, state: &mut ProjectState, to: ProjectStatus) {
    debug_assert!(state.status.can_advance_to(to));
    let from = state.status;
    state.status = to;
    events::status_changed(
        env,
        StatusChanged {
            project_id,
            from,
            to,
            total_raised: state.total_raised,
        },
    );
}

// ── Milestones ───────────────────────────────────────────────────────

fn milestone_plan(config: &ProjectConfig) -> Result<Vec<MilestonePlan>, Error> {
    match &config.policy {
        FundingPolicy::MilestoneBased(plan) => Ok(plan.clone()),
        _ => Err(Error::InvalidPolicy),
    }
}

/// Index of the earliest pending milestone.
fn active_milestone(statuses: &Vec<MilestoneStatus>) -> Option<u32> {
    statuses
        .iter()
        .position(|status| status == MilestoneStatus::Pending)
        .map(|index| index as u32)
}

pub fn attest_milestone(
    env: &Env,
    creator: &Address,
    project_id: u64,
    index: u32,
) -> Result<(), Error> {
    let config = storage::load_project_config(env, project_id)?;
    if *creator != config.creator {
        return Err(Error::Unauthorized);
    }
    let plan = milestone_plan(&config)?;
    if settle(env, project_id)? != ProjectStatus::Open {
        return Err(Error::ProjectNotOpen);
    }
    let statuses = storage::load_milestone_statuses(env, project_id);
    if active_milestone(&statuses) != Some(index) {
        return Err(Error::MilestoneNotFound);
    }
    let milestone = plan.get(index).ok_or(Error::MilestoneNotFound)?;

    storage::set_attested(env, project_id, index);
    events::milestone_attested(
        env,
        MilestoneEvent {
            project_id,
            index,
            amount: milestone.funding_amount,
            status: MilestoneStatus::Pending,
        },
    );
    Ok(())
}

/// Release the active milestone's funding to the creator.
///
/// Returns the project status afterwards: `Open` while milestones remain,
/// `Released` after the last one. If settling moved the project out of
/// `Open` that status is returned and nothing is released.
pub fn release_milestone(env: &Env, project_id: u64) -> Result<ProjectStatus, Error> {
    let status = settle(env, project_id)?;
    if status != ProjectStatus::Open {
        return Ok(status);
    }
    let config = storage::load_project_config(env, project_id)?;
    let plan = milestone_plan(&config)?;
    let mut statuses = storage::load_milestone_statuses(env, project_id);
    let index = active_milestone(&statuses).ok_or(Error::MilestoneNotFound)?;
    let milestone = plan.get(index).ok_or(Error::MilestoneNotFound)?;

    let state = storage::load_project_state(env, project_id)?;
    if state.balance < milestone.funding_amount {
        return Err(Error::InsufficientBalance);
    }
    let protocol = storage::load_config(env)?;
    let approved = storage::is_attested(env, project_id, index)
        || validation::is_milestone_approved(env, &protocol, project_id, index);
    if !approved {
        return Err(Error::MilestoneNotApproved);
    }

    statuses.set(index, MilestoneStatus::Released);
    storage::save_milestone_statuses(env, project_id, &statuses);
    escrow::release(
        env,
        project_id,
        &config.token,
        &config.creator,
        milestone.funding_amount,
    )?;
    events::milestone_released(
        env,
        MilestoneEvent {
            project_id,
            index,
            amount: milestone.funding_amount,
            status: MilestoneStatus::Released,
        },
    );

    if active_milestone(&statuses).is_some() {
        return Ok(ProjectStatus::Open);
    }
    // Last milestone: the residue is paid out like a normal close.
    let state = storage::load_project_state(env, project_id)?;
    succeed(env, &config, state)
}

pub fn get_milestones(env: &Env, project_id: u64) -> Result<Vec<Milestone>, Error> {
    let config = storage::load_project_config(env, project_id)?;
    let mut out = Vec::new(env);
    let FundingPolicy::MilestoneBased(plan) = config.policy else {
        return Ok(out);
    };
    let statuses = storage::load_milestone_statuses(env, project_id);
    for (index, milestone) in plan.iter().enumerate() {
        let index = index as u32;
        out.push_back(Milestone {
            index,
            title: milestone.title,
            funding_amount: milestone.funding_amount,
            deadline: milestone.deadline,
            status: statuses.get(index).unwrap_or(MilestoneStatus::Pending),
        });
    }
    Ok(out)
}

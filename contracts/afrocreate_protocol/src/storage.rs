//! # Storage
//!
//! Typed helpers over the three Soroban storage tiers used by AfroCreate.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type             | Description                        |
//! |----------------|------------------|------------------------------------|
//! | `Config`       | `ProtocolConfig` | Fee, consensus and treasury params |
//! | `ProjectCount` | `u64`            | Project ID allocator               |
//! | `ClaimCount`   | `u64`            | Revenue-share claim ID allocator   |
//! | `Paused`       | `bool`           | Global pause flag                  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                        | Type                    |
//! |----------------------------|-------------------------|
//! | `ProjConfig(id)`           | `ProjectConfig`         |
//! | `ProjState(id)`            | `ProjectState`          |
//! | `MsStatus(id)`             | `Vec<MilestoneStatus>`  |
//! | `Attested(id, index)`      | `bool`                  |
//! | `Contribution(id, index)`  | `Contribution`          |
//! | `BackerContribs(id, addr)` | `Vec<u32>`              |
//! | `Claim(claim_id)`          | `RevenueShareClaim`     |
//! | `ProjectClaims(id)`        | `Vec<u64>`              |
//! | `RevenueTotal(id)`         | `i128`                  |
//! | `RevenuePool(id)`          | `i128`                  |
//! | `Accrued(id, epoch)`       | `bool`                  |
//! | `Sources(id)`              | `Vec<Address>`          |
//! | `Epoch(id, epoch)`         | `RevenueEpoch`          |
//! | `EpochCount(id)`           | `u32`                   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## Temporary storage
//!
//! `Lock(scope)` entries hold the reentrancy guard. They are removed before
//! the owning call returns.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{
    Contribution, MilestoneStatus, Project, ProjectConfig, ProjectState, ProtocolConfig,
    RevenueEpoch, RevenueShareClaim,
};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// Critical sections guarded against nested entry.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LockScope {
    Project(u64),
    Claim(u64),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Config,
    ProjectCount,
    ClaimCount,
    Paused,
    ProjConfig(u64),
    ProjState(u64),
    MsStatus(u64),
    Attested(u64, u32),
    Contribution(u64, u32),
    BackerContribs(u64, Address),
    Claim(u64),
    ProjectClaims(u64),
    RevenueTotal(u64),
    RevenuePool(u64),
    Accrued(u64, u32),
    Sources(u64),
    Epoch(u64, u32),
    EpochCount(u64),
    Lock(LockScope),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Reads, increments, and stores the counter under `key`.
/// Returns the pre-increment value, so the first ID handed out is 0.
fn allocate_id(env: &Env, key: &DataKey) -> u64 {
    bump_instance(env);
    let current: u64 = env.storage().instance().get(key).unwrap_or(0);
    env.storage().instance().set(key, &(current + 1));
    current
}

pub fn next_project_id(env: &Env) -> u64 {
    allocate_id(env, &DataKey::ProjectCount)
}

pub fn next_claim_id(env: &Env) -> u64 {
    allocate_id(env, &DataKey::ClaimCount)
}

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn load_config(env: &Env) -> Result<ProtocolConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

pub fn save_config(env: &Env, config: &ProtocolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn read<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

fn write<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

// ── Projects ─────────────────────────────────────────────────────────

/// Save the immutable config and initial mutable state of a new project.
pub fn save_project(env: &Env, config: &ProjectConfig, state: &ProjectState) {
    write(env, &DataKey::ProjConfig(config.id), config);
    write(env, &DataKey::ProjState(config.id), state);
}

pub fn load_project_config(env: &Env, id: u64) -> Result<ProjectConfig, Error> {
    read(env, &DataKey::ProjConfig(id)).ok_or(Error::ProjectNotFound)
}

pub fn load_project_state(env: &Env, id: u64) -> Result<ProjectState, Error> {
    read(env, &DataKey::ProjState(id)).ok_or(Error::ProjectNotFound)
}

pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    write(env, &DataKey::ProjState(id), state);
}

/// Load the full `Project` by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Result<Project, Error> {
    let config = load_project_config(env, id)?;
    let state = load_project_state(env, id)?;
    Ok(Project {
        id: config.id,
        creator: config.creator,
        token: config.token,
        policy: config.policy,
        target: config.target,
        deadline: config.deadline,
        category: config.category,
        balance: state.balance,
        total_raised: state.total_raised,
        status: state.status,
        contribution_count: state.contribution_count,
    })
}

// ── Milestones ───────────────────────────────────────────────────────

pub fn load_milestone_statuses(env: &Env, id: u64) -> Vec<MilestoneStatus> {
    read(env, &DataKey::MsStatus(id)).unwrap_or_else(|| Vec::new(env))
}

pub fn save_milestone_statuses(env: &Env, id: u64, statuses: &Vec<MilestoneStatus>) {
    write(env, &DataKey::MsStatus(id), statuses);
}

pub fn is_attested(env: &Env, id: u64, index: u32) -> bool {
    read(env, &DataKey::Attested(id, index)).unwrap_or(false)
}

pub fn set_attested(env: &Env, id: u64, index: u32) {
    write(env, &DataKey::Attested(id, index), &true);
}

// ── Contributions ────────────────────────────────────────────────────

pub fn load_contribution(env: &Env, id: u64, index: u32) -> Result<Contribution, Error> {
    read(env, &DataKey::Contribution(id, index)).ok_or(Error::ContributionNotFound)
}

pub fn save_contribution(env: &Env, contribution: &Contribution) {
    write(
        env,
        &DataKey::Contribution(contribution.project_id, contribution.index),
        contribution,
    );
}

pub fn load_backer_contributions(env: &Env, id: u64, backer: &Address) -> Vec<u32> {
    read(env, &DataKey::BackerContribs(id, backer.clone())).unwrap_or_else(|| Vec::new(env))
}

pub fn save_backer_contributions(env: &Env, id: u64, backer: &Address, indices: &Vec<u32>) {
    write(env, &DataKey::BackerContribs(id, backer.clone()), indices);
}

// ── Revenue-share claims ─────────────────────────────────────────────

pub fn load_claim(env: &Env, claim_id: u64) -> Result<RevenueShareClaim, Error> {
    read(env, &DataKey::Claim(claim_id)).ok_or(Error::ClaimNotFound)
}

pub fn save_claim(env: &Env, claim: &RevenueShareClaim) {
    write(env, &DataKey::Claim(claim.id), claim);
}

pub fn load_project_claims(env: &Env, id: u64) -> Vec<u64> {
    read(env, &DataKey::ProjectClaims(id)).unwrap_or_else(|| Vec::new(env))
}

pub fn save_project_claims(env: &Env, id: u64, claims: &Vec<u64>) {
    write(env, &DataKey::ProjectClaims(id), claims);
}

pub fn revenue_total(env: &Env, id: u64) -> i128 {
    read(env, &DataKey::RevenueTotal(id)).unwrap_or(0)
}

pub fn set_revenue_total(env: &Env, id: u64, total: i128) {
    write(env, &DataKey::RevenueTotal(id), &total);
}

pub fn revenue_pool(env: &Env, id: u64) -> i128 {
    read(env, &DataKey::RevenuePool(id)).unwrap_or(0)
}

pub fn set_revenue_pool(env: &Env, id: u64, pool: i128) {
    write(env, &DataKey::RevenuePool(id), &pool);
}

pub fn is_accrued(env: &Env, id: u64, epoch: u32) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Accrued(id, epoch))
}

pub fn mark_accrued(env: &Env, id: u64, epoch: u32) {
    write(env, &DataKey::Accrued(id, epoch), &true);
}

// ── Revenue sources and epochs ───────────────────────────────────────

pub fn load_sources(env: &Env, id: u64) -> Vec<Address> {
    read(env, &DataKey::Sources(id)).unwrap_or_else(|| Vec::new(env))
}

pub fn save_sources(env: &Env, id: u64, sources: &Vec<Address>) {
    write(env, &DataKey::Sources(id), sources);
}

pub fn epoch_count(env: &Env, id: u64) -> u32 {
    read(env, &DataKey::EpochCount(id)).unwrap_or(0)
}

pub fn set_epoch_count(env: &Env, id: u64, count: u32) {
    write(env, &DataKey::EpochCount(id), &count);
}

pub fn load_epoch(env: &Env, id: u64, epoch: u32) -> Result<RevenueEpoch, Error> {
    read(env, &DataKey::Epoch(id, epoch)).ok_or(Error::EpochNotFound)
}

pub fn save_epoch(env: &Env, epoch: &RevenueEpoch) {
    write(env, &DataKey::Epoch(epoch.project_id, epoch.index), epoch);
}

// ── Temporary storage ────────────────────────────────────────────────

pub fn is_locked(env: &Env, scope: &LockScope) -> bool {
    env.storage()
        .temporary()
        .has(&DataKey::Lock(scope.clone()))
}

pub fn set_lock(env: &Env, scope: &LockScope) {
    env.storage()
        .temporary()
        .set(&DataKey::Lock(scope.clone()), &true);
}

pub fn clear_lock(env: &Env, scope: &LockScope) {
    env.storage()
        .temporary()
        .remove(&DataKey::Lock(scope.clone()));
}

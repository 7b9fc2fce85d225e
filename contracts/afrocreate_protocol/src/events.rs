//! # Events
//!
//! Append-only records of every state-mutating operation, for off-chain
//! indexing. Topics are `(name, project_id)` for project-scoped events and
//! `(name, address)` for role and pause events. Data is one of the structs
//! below, carrying the amounts involved and the resulting status.
//!
//! | Topic       | Data                 |
//! |-------------|----------------------|
//! | `init`      | [`Initialized`]      |
//! | `created`   | [`ProjectOpened`]    |
//! | `funded`    | [`Deposited`]        |
//! | `settled`   | [`StatusChanged`]    |
//! | `released`  | [`FundsReleased`]    |
//! | `refunded`  | [`Refunded`]         |
//! | `ms_attest` | [`MilestoneEvent`]   |
//! | `ms_rel`    | [`MilestoneEvent`]   |
//! | `ms_miss`   | [`MilestoneEvent`]   |
//! | `minted`    | [`ClaimMinted`]      |
//! | `rev_dep`   | [`RevenueDeposited`] |
//! | `accrued`   | [`RevenueAccrued`]   |
//! | `claimed`   | [`RevenueClaimed`]   |
//! | `claim_xfr` | [`ClaimTransferred`] |
//! | `src_reg`   | [`SourceChanged`]    |
//! | `src_del`   | [`SourceChanged`]    |
//! | `ep_open`   | [`EpochOpened`]      |
//! | `reported`  | [`RevenueReported`]  |
//! | `finalized` | [`EpochClosed`]      |
//! | `ep_fail`   | [`EpochClosed`]      |
//! | `params`    | [`ParamsUpdated`]    |
//! | `role_set`  | [`RoleChanged`]      |
//! | `role_del`  | [`RoleChanged`]      |
//! | `paused`    | [`PauseChanged`]     |
//! | `unpaused`  | [`PauseChanged`]     |

use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::rbac::Role;
use crate::types::{EpochStatus, MilestoneStatus, ProjectStatus, ProtocolConfig};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Initialized {
    pub super_admin: Address,
    pub treasury: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectOpened {
    pub project_id: u64,
    pub creator: Address,
    pub token: Address,
    pub target: i128,
    pub deadline: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposited {
    pub project_id: u64,
    pub backer: Address,
    pub amount: i128,
    pub contribution_index: u32,
    pub balance: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusChanged {
    pub project_id: u64,
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    pub total_raised: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsReleased {
    pub project_id: u64,
    pub recipient: Address,
    pub amount: i128,
    pub fee: i128,
    pub status: ProjectStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub project_id: u64,
    pub backer: Address,
    pub amount: i128,
    pub status: ProjectStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneEvent {
    pub project_id: u64,
    pub index: u32,
    pub amount: i128,
    pub status: MilestoneStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimMinted {
    pub project_id: u64,
    pub claim_id: u64,
    pub owner: Address,
    pub share_bps: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueDeposited {
    pub project_id: u64,
    pub payer: Address,
    pub amount: i128,
    pub pool: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueAccrued {
    pub project_id: u64,
    pub epoch: u32,
    pub amount: i128,
    pub lifetime_total: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueClaimed {
    pub project_id: u64,
    pub claim_id: u64,
    pub owner: Address,
    pub amount: i128,
    pub cumulative_claimed: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimTransferred {
    pub project_id: u64,
    pub claim_id: u64,
    pub from: Address,
    pub to: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SourceChanged {
    pub project_id: u64,
    pub source: Address,
    pub registered: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EpochOpened {
    pub project_id: u64,
    pub epoch: u32,
    pub closes_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueReported {
    pub project_id: u64,
    pub epoch: u32,
    pub source: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EpochClosed {
    pub project_id: u64,
    pub epoch: u32,
    pub amount: i128,
    pub reports: u32,
    pub status: EpochStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamsUpdated {
    pub by: Address,
    pub config: ProtocolConfig,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChanged {
    pub target: Address,
    pub role: Option<Role>,
    pub by: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PauseChanged {
    pub by: Address,
    pub paused: bool,
}

// ── Publishers ───────────────────────────────────────────────────────

fn project_event<D>(env: &Env, name: Symbol, project_id: u64, data: D)
where
    D: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.events().publish((name, project_id), data);
}

pub fn initialized(env: &Env, event: Initialized) {
    env.events().publish((symbol_short!("init"),), event);
}

pub fn project_opened(env: &Env, event: ProjectOpened) {
    project_event(env, symbol_short!("created"), event.project_id, event);
}

pub fn deposited(env: &Env, event: Deposited) {
    project_event(env, symbol_short!("funded"), event.project_id, event);
}

pub fn status_changed(env: &Env, event: StatusChanged) {
    project_event(env, symbol_short!("settled"), event.project_id, event);
}

pub fn funds_released(env: &Env, event: FundsReleased) {
    project_event(env, symbol_short!("released"), event.project_id, event);
}

pub fn refunded(env: &Env, event: Refunded) {
    project_event(env, symbol_short!("refunded"), event.project_id, event);
}

pub fn milestone_attested(env: &Env, event: MilestoneEvent) {
    project_event(env, symbol_short!("ms_attest"), event.project_id, event);
}

pub fn milestone_released(env: &Env, event: MilestoneEvent) {
    project_event(env, symbol_short!("ms_rel"), event.project_id, event);
}

pub fn milestone_missed(env: &Env, event: MilestoneEvent) {
    project_event(env, symbol_short!("ms_miss"), event.project_id, event);
}

pub fn claim_minted(env: &Env, event: ClaimMinted) {
    project_event(env, symbol_short!("minted"), event.project_id, event);
}

pub fn revenue_deposited(env: &Env, event: RevenueDeposited) {
    project_event(env, symbol_short!("rev_dep"), event.project_id, event);
}

pub fn revenue_accrued(env: &Env, event: RevenueAccrued) {
    project_event(env, symbol_short!("accrued"), event.project_id, event);
}

pub fn revenue_claimed(env: &Env, event: RevenueClaimed) {
    project_event(env, symbol_short!("claimed"), event.project_id, event);
}

pub fn claim_transferred(env: &Env, event: ClaimTransferred) {
    project_event(env, symbol_short!("claim_xfr"), event.project_id, event);
}

pub fn source_changed(env: &Env, event: SourceChanged) {
    let name = if event.registered {
        symbol_short!("src_reg")
    } else {
        symbol_short!("src_del")
    };
    project_event(env, name, event.project_id, event);
}

pub fn epoch_opened(env: &Env, event: EpochOpened) {
    project_event(env, symbol_short!("ep_open"), event.project_id, event);
}

pub fn revenue_reported(env: &Env, event: RevenueReported) {
    project_event(env, symbol_short!("reported"), event.project_id, event);
}

pub fn epoch_closed(env: &Env, event: EpochClosed) {
    let name = match event.status {
        EpochStatus::Failed => symbol_short!("ep_fail"),
        _ => symbol_short!("finalized"),
    };
    project_event(env, name, event.project_id, event);
}

pub fn params_updated(env: &Env, event: ParamsUpdated) {
    env.events()
        .publish((symbol_short!("params"), event.by.clone()), event);
}

pub fn role_changed(env: &Env, event: RoleChanged) {
    let name = if event.role.is_some() {
        symbol_short!("role_set")
    } else {
        symbol_short!("role_del")
    };
    env.events().publish((name, event.target.clone()), event);
}

pub fn pause_changed(env: &Env, event: PauseChanged) {
    let name = if event.paused {
        symbol_short!("paused")
    } else {
        symbol_short!("unpaused")
    };
    env.events().publish((name, event.by.clone()), event);
}

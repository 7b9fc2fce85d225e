//! # Types
//!
//! Shared data structures used across all modules of the AfroCreate protocol.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Project` is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`]: written once at `open_project`; never mutated.
//! - [`ProjectState`]: written on every deposit, release, refund and
//!   status transition.
//!
//! Milestones follow the same split: the plan lives inside the immutable
//! [`FundingPolicy`], the per-milestone [`MilestoneStatus`] list lives in its
//! own entry. The public API returns the reconstructed [`Project`] and
//! [`Milestone`] structs.
//!
//! ### Status as a Finite-State Machine
//!
//! [`ProjectStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Open ──► Succeeded ──► Released
//!   └───► Failed ──► Refunding ──► Refunded
//! ```
//!
//! Milestones move `Pending ──► Released | Missed` and never back.

use soroban_sdk::{contracttype, Address, Map, String, Vec};

/// Lifecycle status of a project.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    /// Accepting deposits.
    Open,
    /// Funding conditions met; transient until the payout commits.
    Succeeded,
    /// Funding conditions missed; transient until the refund snapshot commits.
    Failed,
    /// Escrow paid out and revenue-share claims minted. Terminal.
    Released,
    /// Backers may pull refunds.
    Refunding,
    /// Every contribution has been refunded. Terminal.
    Refunded,
}

impl ProjectStatus {
    /// Forward-only edges of the lifecycle graph.
    pub fn can_advance_to(&self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (ProjectStatus::Open, ProjectStatus::Succeeded)
                | (ProjectStatus::Open, ProjectStatus::Failed)
                | (ProjectStatus::Succeeded, ProjectStatus::Released)
                | (ProjectStatus::Failed, ProjectStatus::Refunding)
                | (ProjectStatus::Refunding, ProjectStatus::Refunded)
        )
    }
}

/// One step of a milestone-based funding plan, as supplied at open time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestonePlan {
    pub title: String,
    /// Amount paid to the creator when this milestone is released.
    pub funding_amount: i128,
    /// Ledger timestamp by which the escrow must hold `funding_amount`. The
    /// milestone must be released within the protocol grace period after it.
    pub deadline: u64,
}

/// Settlement policy of a project.
///
/// The milestone variant carries its plan so that a single settlement driver
/// dispatches on one value.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FundingPolicy {
    AllOrNothing,
    Flexible,
    MilestoneBased(Vec<MilestonePlan>),
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MilestoneStatus {
    Pending,
    Released,
    Missed,
}

/// Reconstructed milestone view returned by `get_milestones`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    pub index: u32,
    pub title: String,
    pub funding_amount: i128,
    pub deadline: u64,
    pub status: MilestoneStatus,
}

/// Immutable project configuration, written once at open time.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub creator: Address,
    pub token: Address,
    pub policy: FundingPolicy,
    pub target: i128,
    pub deadline: u64,
    pub category: String,
}

/// Mutable project state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    /// Value currently held in escrow for the project.
    pub balance: i128,
    /// Sum of every contribution ever made. Never decremented.
    pub total_raised: i128,
    pub status: ProjectStatus,
    /// Number of contributions recorded (next contribution index).
    pub contribution_count: u32,
    /// Contributions not yet refunded.
    pub live_contributions: u32,
    /// Balance captured when the project failed; refunds are paid from it.
    pub refund_pool: i128,
    /// `total_raised` captured when the project failed.
    pub refund_base: i128,
}

/// Full representation of a funding project.
///
/// Used as the public API return type; reconstructed from the split
/// `ProjectConfig` + `ProjectState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    pub id: u64,
    /// Address that opened the project and receives released funds.
    pub creator: Address,
    /// Token the project is funded in.
    pub token: Address,
    pub policy: FundingPolicy,
    pub target: i128,
    /// Ledger timestamp at which deposits stop being accepted.
    pub deadline: u64,
    pub category: String,
    pub balance: i128,
    pub total_raised: i128,
    pub status: ProjectStatus,
    pub contribution_count: u32,
}

/// A single deposit. Never merged with other deposits of the same backer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub index: u32,
    pub project_id: u64,
    pub backer: Address,
    pub amount: i128,
    pub timestamp: u64,
    pub refunded: bool,
}

/// Transferable revenue-share entitlement.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueShareClaim {
    pub id: u64,
    pub project_id: u64,
    pub owner: Address,
    /// Basis points of finalized project revenue (10000 = 100%).
    pub share_bps: u32,
    /// Revenue already paid on this claim, whoever owned it at the time.
    pub cumulative_claimed: i128,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EpochStatus {
    Reporting,
    Finalized,
    /// Quorum not reached before the window closed. Never accrued.
    Failed,
}

/// One revenue reporting period of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevenueEpoch {
    pub project_id: u64,
    pub index: u32,
    pub reports: Map<Address, i128>,
    pub status: EpochStatus,
    pub finalized_amount: i128,
    pub opened_at: u64,
    /// End of the reporting window (exclusive).
    pub closes_at: u64,
}

/// Protocol-wide parameters. Governance-controlled apart from `treasury`
/// and `validator`, which are admin-controlled.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// Receives platform fees and owns rounding-remainder claims.
    pub treasury: Address,
    pub platform_fee_bps: u32,
    /// Minimum number of source reports for a window-based finalization.
    pub min_quorum: u32,
    /// Maximum distance of any report from the median, in bps of the median.
    pub tolerance_bps: u32,
    pub report_window_secs: u64,
    /// Smallest accepted deposit.
    pub min_contribution: i128,
    /// Smallest payout `claim` will make.
    pub min_claim_amount: i128,
    /// How long a funded milestone may stay unreleased past its deadline
    /// before it is marked Missed.
    pub milestone_grace_secs: u64,
    /// External cultural-validation contract, if any.
    pub validator: Option<Address>,
}

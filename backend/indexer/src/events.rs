//! Event kinds published by the AfroCreate protocol contract, and the row
//! shapes the indexer stores for them.

use serde::{Deserialize, Serialize};

/// Every topic the protocol contract publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Initialized,
    ProjectOpened,
    Deposited,
    StatusChanged,
    FundsReleased,
    Refunded,
    MilestoneAttested,
    MilestoneReleased,
    MilestoneMissed,
    ClaimMinted,
    RevenueDeposited,
    RevenueAccrued,
    RevenueClaimed,
    ClaimTransferred,
    SourceRegistered,
    SourceRemoved,
    EpochOpened,
    RevenueReported,
    EpochFinalized,
    EpochFailed,
    ParamsUpdated,
    RoleSet,
    RoleDel,
    ProtocolPaused,
    ProtocolUnpaused,
    /// A topic this build does not know about.
    Unknown,
}

impl EventKind {
    /// Map the leading topic symbol to its kind.
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "init" => Self::Initialized,
            "created" => Self::ProjectOpened,
            "funded" => Self::Deposited,
            "settled" => Self::StatusChanged,
            "released" => Self::FundsReleased,
            "refunded" => Self::Refunded,
            "ms_attest" => Self::MilestoneAttested,
            "ms_rel" => Self::MilestoneReleased,
            "ms_miss" => Self::MilestoneMissed,
            "minted" => Self::ClaimMinted,
            "rev_dep" => Self::RevenueDeposited,
            "accrued" => Self::RevenueAccrued,
            "claimed" => Self::RevenueClaimed,
            "claim_xfr" => Self::ClaimTransferred,
            "src_reg" => Self::SourceRegistered,
            "src_del" => Self::SourceRemoved,
            "ep_open" => Self::EpochOpened,
            "reported" => Self::RevenueReported,
            "finalized" => Self::EpochFinalized,
            "ep_fail" => Self::EpochFailed,
            "params" => Self::ParamsUpdated,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            "paused" => Self::ProtocolPaused,
            "unpaused" => Self::ProtocolUnpaused,
            _ => Self::Unknown,
        }
    }

    /// Identifier stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::ProjectOpened => "project_opened",
            Self::Deposited => "deposited",
            Self::StatusChanged => "status_changed",
            Self::FundsReleased => "funds_released",
            Self::Refunded => "refunded",
            Self::MilestoneAttested => "milestone_attested",
            Self::MilestoneReleased => "milestone_released",
            Self::MilestoneMissed => "milestone_missed",
            Self::ClaimMinted => "claim_minted",
            Self::RevenueDeposited => "revenue_deposited",
            Self::RevenueAccrued => "revenue_accrued",
            Self::RevenueClaimed => "revenue_claimed",
            Self::ClaimTransferred => "claim_transferred",
            Self::SourceRegistered => "source_registered",
            Self::SourceRemoved => "source_removed",
            Self::EpochOpened => "epoch_opened",
            Self::RevenueReported => "revenue_reported",
            Self::EpochFinalized => "epoch_finalized",
            Self::EpochFailed => "epoch_failed",
            Self::ParamsUpdated => "params_updated",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::ProtocolPaused => "protocol_paused",
            Self::ProtocolUnpaused => "protocol_unpaused",
            Self::Unknown => "unknown",
        }
    }

    /// True when the second topic is a project id rather than an address.
    pub fn keyed_by_project(&self) -> bool {
        !matches!(
            self,
            Self::Initialized
                | Self::ParamsUpdated
                | Self::RoleSet
                | Self::RoleDel
                | Self::ProtocolPaused
                | Self::ProtocolUnpaused
                | Self::Unknown
        )
    }

    /// Data fields naming the address that caused the event, most specific first.
    pub fn actor_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Initialized => &["super_admin"],
            Self::ProjectOpened => &["creator"],
            Self::Deposited | Self::Refunded => &["backer"],
            Self::FundsReleased => &["recipient"],
            Self::ClaimMinted | Self::RevenueClaimed => &["owner"],
            Self::RevenueDeposited => &["payer"],
            Self::ClaimTransferred => &["to", "from"],
            Self::SourceRegistered | Self::SourceRemoved | Self::RevenueReported => &["source"],
            Self::ParamsUpdated | Self::RoleSet | Self::RoleDel => &["by", "target"],
            Self::ProtocolPaused | Self::ProtocolUnpaused => &["by"],
            _ => &[],
        }
    }

    /// Data fields carrying the token amount of the event.
    pub fn amount_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ProjectOpened => &["target"],
            Self::StatusChanged => &["total_raised"],
            Self::ClaimMinted => &["share_bps"],
            Self::Deposited
            | Self::FundsReleased
            | Self::Refunded
            | Self::MilestoneAttested
            | Self::MilestoneReleased
            | Self::MilestoneMissed
            | Self::RevenueDeposited
            | Self::RevenueAccrued
            | Self::RevenueClaimed
            | Self::RevenueReported
            | Self::EpochFinalized
            | Self::EpochFailed => &["amount"],
            _ => &[],
        }
    }
}

/// A decoded protocol event, ready to be stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolEvent {
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Project, milestone or epoch status carried by the event, if any.
    pub status: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event row as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

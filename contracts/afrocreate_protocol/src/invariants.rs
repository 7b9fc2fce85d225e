#![allow(dead_code)]

extern crate std;

use soroban_sdk::{Address, Vec};

use crate::math::{apply_bps, BPS_DENOMINATOR};
use crate::types::{Project, ProjectStatus, RevenueEpoch, RevenueShareClaim};
use crate::AfroCreateProtocolClient;

/// INV-1: until release or refund begins, the escrow balance equals the sum
/// of the unrefunded contributions of every backer.
pub fn assert_balance_matches_contributions(
    client: &AfroCreateProtocolClient,
    project_id: u64,
    backers: &[Address],
) {
    let project = client.get_project(&project_id);
    let mut live: i128 = 0;
    for backer in backers {
        for contribution in client.get_contributions(&project_id, backer).iter() {
            if !contribution.refunded {
                live += contribution.amount;
            }
        }
    }
    assert_eq!(
        project.balance, live,
        "INV-1 violated: project {} holds {} but live contributions sum to {}",
        project_id, project.balance, live
    );
}

/// INV-2: share_bps across a project's claims never exceeds 10000.
pub fn assert_shares_bounded(claims: &Vec<RevenueShareClaim>) {
    let total: u32 = claims.iter().map(|claim| claim.share_bps).sum();
    assert!(
        total <= BPS_DENOMINATOR,
        "INV-2 violated: claims allocate {} bps",
        total
    );
}

/// INV-3: once funding succeeded the claims allocate exactly 10000 bps.
pub fn assert_shares_complete(claims: &Vec<RevenueShareClaim>) {
    let total: u32 = claims.iter().map(|claim| claim.share_bps).sum();
    assert_eq!(
        total, BPS_DENOMINATOR,
        "INV-3 violated: claims allocate {} bps after success",
        total
    );
}

/// INV-4: only forward lifecycle edges are observable between two reads.
pub fn assert_valid_status_transition(from: ProjectStatus, to: ProjectStatus) {
    let valid = from == to
        || matches!(
            (from, to),
            (ProjectStatus::Open, ProjectStatus::Released)
                | (ProjectStatus::Open, ProjectStatus::Refunding)
                | (ProjectStatus::Open, ProjectStatus::Refunded)
                | (ProjectStatus::Refunding, ProjectStatus::Refunded)
        );
    assert!(
        valid,
        "INV-4 violated: invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// INV-5: fields fixed at open time never change.
pub fn assert_project_immutable_fields(original: &Project, current: &Project) {
    assert_eq!(original.id, current.id, "INV-5 violated: project id changed");
    assert_eq!(
        original.creator, current.creator,
        "INV-5 violated: project creator changed"
    );
    assert_eq!(original.token, current.token, "INV-5 violated: token changed");
    assert_eq!(original.policy, current.policy, "INV-5 violated: policy changed");
    assert_eq!(original.target, current.target, "INV-5 violated: target changed");
    assert_eq!(
        original.deadline, current.deadline,
        "INV-5 violated: deadline changed"
    );
}

/// INV-6: a claim never received more than its share of finalized revenue.
pub fn assert_claim_within_entitlement(claim: &RevenueShareClaim, revenue_total: i128) {
    let entitled = apply_bps(revenue_total, claim.share_bps).unwrap();
    assert!(
        claim.cumulative_claimed <= entitled,
        "INV-6 violated: claim {} paid {} of an entitlement of {}",
        claim.id,
        claim.cumulative_claimed,
        entitled
    );
}

/// INV-7: a closed epoch's outcome is written once.
pub fn assert_epoch_outcome_unchanged(before: &RevenueEpoch, after: &RevenueEpoch) {
    assert_eq!(before.status, after.status, "INV-7 violated: epoch status changed");
    assert_eq!(
        before.finalized_amount, after.finalized_amount,
        "INV-7 violated: finalized amount changed"
    );
}

extern crate std;

use soroban_sdk::{symbol_short, testutils::Address as _, vec, Address, IntoVal, TryIntoVal};

use crate::events::{
    ClaimTransferred, Deposited, EpochClosed, FundsReleased, MilestoneEvent, ProjectOpened,
    Refunded, RevenueAccrued, RoleChanged, StatusChanged,
};
use crate::test_utils::{Setup, DAY, START};
use crate::{EpochStatus, FundingPolicy, MilestoneStatus, ProjectStatus, Role};

#[test]
fn test_project_opened_event() {
    let s = Setup::new();
    let project = s.open(FundingPolicy::AllOrNothing, 5_000, START + DAY);

    let events = s.events_named(symbol_short!("created"));
    assert_eq!(events.len(), 1);
    let (topics, data) = events[0].clone();
    assert_eq!(topics, s.project_topics(symbol_short!("created"), project.id));

    let data: ProjectOpened = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        ProjectOpened {
            project_id: project.id,
            creator: s.creator.clone(),
            token: s.token.address.clone(),
            target: 5_000,
            deadline: START + DAY,
        }
    );
}

#[test]
fn test_deposit_event() {
    let s = Setup::new();
    let project = s.open(FundingPolicy::Flexible, 5_000, START + DAY);
    let backer = s.funded(700);
    s.client.deposit(&project.id, &backer, &700);

    let all = s.contract_events();
    let (topics, data) = all.last().expect("No events found").clone();
    assert_eq!(topics, s.project_topics(symbol_short!("funded"), project.id));

    let data: Deposited = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        Deposited {
            project_id: project.id,
            backer,
            amount: 700,
            contribution_index: 0,
            balance: 700,
        }
    );
}

#[test]
fn test_success_publishes_transitions_and_release() {
    let s = Setup::new();
    let project = s.open(FundingPolicy::AllOrNothing, 1_000, START + DAY);
    s.back(project.id, 1_000);
    s.set_time(START + DAY);
    s.client.settle(&project.id);

    let transitions: std::vec::Vec<StatusChanged> = s
        .events_named(symbol_short!("settled"))
        .into_iter()
        .map(|(_, data)| data.try_into_val(&s.env).unwrap())
        .collect();
    assert_eq!(transitions.len(), 2);
    assert_eq!(
        (transitions[0].from, transitions[0].to),
        (ProjectStatus::Open, ProjectStatus::Succeeded)
    );
    assert_eq!(
        (transitions[1].from, transitions[1].to),
        (ProjectStatus::Succeeded, ProjectStatus::Released)
    );

    assert_eq!(s.events_named(symbol_short!("minted")).len(), 1);

    let (_, data) = s.events_named(symbol_short!("released"))[0].clone();
    let released: FundsReleased = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        released,
        FundsReleased {
            project_id: project.id,
            recipient: s.creator.clone(),
            amount: 970,
            fee: 30,
            status: ProjectStatus::Released,
        }
    );
}

#[test]
fn test_refund_event_carries_status() {
    let s = Setup::new();
    let project = s.open(FundingPolicy::AllOrNothing, 1_000, START + DAY);
    let backer = s.back(project.id, 300);
    s.set_time(START + DAY);
    s.client.refund(&project.id, &backer);

    let (topics, data) = s.events_named(symbol_short!("refunded"))[0].clone();
    assert_eq!(topics, s.project_topics(symbol_short!("refunded"), project.id));
    let data: Refunded = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        Refunded {
            project_id: project.id,
            backer,
            amount: 300,
            status: ProjectStatus::Refunded,
        }
    );
}

#[test]
fn test_milestone_miss_event() {
    let s = Setup::new();
    let project = s.open(
        FundingPolicy::MilestoneBased(vec![
            &s.env,
            s.milestone("studio", 1_000, START + 2 * DAY),
        ]),
        1_000,
        START + 3 * DAY,
    );
    s.back(project.id, 10);
    s.set_time(START + 2 * DAY);
    s.client.settle(&project.id);

    let (_, data) = s.events_named(symbol_short!("ms_miss"))[0].clone();
    let data: MilestoneEvent = data.try_into_val(&s.env).unwrap();
    assert_eq!(data.index, 0);
    assert_eq!(data.status, MilestoneStatus::Missed);
}

#[test]
fn test_finalize_publishes_accrual() {
    let s = Setup::new();
    let (project, _, _) = s.released_project();
    let sources = s.sources(project.id, 3);
    let epoch = s.client.open_epoch(&s.super_admin, &project.id);
    s.client.report(&sources[0], &project.id, &epoch, &40);
    s.client.report(&sources[1], &project.id, &epoch, &40);
    s.client.report(&sources[2], &project.id, &epoch, &40);

    let (_, data) = s.events_named(symbol_short!("accrued"))[0].clone();
    let accrued: RevenueAccrued = data.try_into_val(&s.env).unwrap();
    assert_eq!(accrued.lifetime_total, 40);

    let (topics, data) = s.events_named(symbol_short!("finalized"))[0].clone();
    assert_eq!(topics, s.project_topics(symbol_short!("finalized"), project.id));
    let closed: EpochClosed = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        closed,
        EpochClosed {
            project_id: project.id,
            epoch,
            amount: 40,
            reports: 3,
            status: EpochStatus::Finalized,
        }
    );
}

#[test]
fn test_claim_transfer_event() {
    let s = Setup::new();
    let (project, first, _) = s.released_project();
    let buyer = Address::generate(&s.env);
    s.client.transfer(&0, &first, &buyer);

    let (_, data) = s.events_named(symbol_short!("claim_xfr"))[0].clone();
    let data: ClaimTransferred = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        ClaimTransferred {
            project_id: project.id,
            claim_id: 0,
            from: first,
            to: buyer,
        }
    );
}

#[test]
fn test_role_event_is_keyed_by_target() {
    let s = Setup::new();
    let admin = Address::generate(&s.env);
    s.client.grant_role(&s.super_admin, &admin, &Role::Admin);

    let (topics, data) = s
        .events_named(symbol_short!("role_set"))
        .last()
        .expect("No events found")
        .clone();
    assert_eq!(
        topics,
        vec![
            &s.env,
            symbol_short!("role_set").into_val(&s.env),
            admin.into_val(&s.env),
        ]
    );
    let data: RoleChanged = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        RoleChanged {
            target: admin,
            role: Some(Role::Admin),
            by: s.super_admin.clone(),
        }
    );
}

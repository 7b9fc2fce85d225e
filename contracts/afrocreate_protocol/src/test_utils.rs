#![allow(dead_code)]

extern crate std;

use soroban_sdk::{
    contract, contractimpl, symbol_short,
    testutils::{Address as _, Events, Ledger},
    token, vec, Address, Env, IntoVal, String, Symbol, TryIntoVal, Val, Vec,
};

use crate::{
    AfroCreateProtocol, AfroCreateProtocolClient, FundingPolicy, MilestonePlan, Project, Role,
};

/// Ledger timestamp every test starts at.
pub const START: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;

pub struct Setup {
    pub env: Env,
    pub client: AfroCreateProtocolClient<'static>,
    pub super_admin: Address,
    pub treasury: Address,
    pub creator: Address,
    pub token: token::Client<'static>,
    pub token_admin: token::StellarAssetClient<'static>,
}

impl Setup {
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|li| li.timestamp = START);

        let contract_id = env.register(AfroCreateProtocol, ());
        let client = AfroCreateProtocolClient::new(&env, &contract_id);

        let super_admin = Address::generate(&env);
        let treasury = Address::generate(&env);
        let creator = Address::generate(&env);
        client.init(&super_admin, &treasury);
        client.grant_role(&super_admin, &creator, &Role::Creator);

        let issuer = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(issuer);
        let token = token::Client::new(&env, &sac.address());
        let token_admin = token::StellarAssetClient::new(&env, &sac.address());

        Setup {
            env,
            client,
            super_admin,
            treasury,
            creator,
            token,
            token_admin,
        }
    }

    pub fn open(&self, policy: FundingPolicy, target: i128, deadline: u64) -> Project {
        self.client.open_project(
            &self.creator,
            &self.token.address,
            &policy,
            &target,
            &deadline,
            &String::from_str(&self.env, "music"),
        )
    }

    /// A fresh address holding `amount` of the project token.
    pub fn funded(&self, amount: i128) -> Address {
        let who = Address::generate(&self.env);
        self.token_admin.mint(&who, &amount);
        who
    }

    /// A fresh address that deposits `amount` into `project_id`.
    pub fn back(&self, project_id: u64, amount: i128) -> Address {
        let backer = self.funded(amount);
        self.client.deposit(&project_id, &backer, &amount);
        backer
    }

    pub fn set_time(&self, timestamp: u64) {
        self.env.ledger().with_mut(|li| li.timestamp = timestamp);
    }

    pub fn balance(&self, who: &Address) -> i128 {
        self.token.balance(who)
    }

    pub fn milestone(&self, title: &str, funding_amount: i128, deadline: u64) -> MilestonePlan {
        MilestonePlan {
            title: String::from_str(&self.env, title),
            funding_amount,
            deadline,
        }
    }

    /// Events published by the protocol contract, as `(topics, data)`.
    pub fn contract_events(&self) -> std::vec::Vec<(Vec<Val>, Val)> {
        self.env
            .events()
            .all()
            .iter()
            .filter(|(contract, _, _)| *contract == self.client.address)
            .map(|(_, topics, data)| (topics, data))
            .collect()
    }

    /// Data of every protocol event whose first topic is `name`.
    pub fn events_named(&self, name: Symbol) -> std::vec::Vec<(Vec<Val>, Val)> {
        self.contract_events()
            .into_iter()
            .filter(|(topics, _)| {
                let first: Symbol = topics.get(0).unwrap().try_into_val(&self.env).unwrap();
                first == name
            })
            .collect()
    }

    pub fn project_topics(&self, name: Symbol, project_id: u64) -> Vec<Val> {
        vec![&self.env, name.into_val(&self.env), project_id.into_val(&self.env)]
    }

    /// Scenario A: target 1000, backers of 600 and 500, settled after the
    /// deadline. Returns the released project and both backers.
    pub fn released_project(&self) -> (Project, Address, Address) {
        let project = self.open(FundingPolicy::AllOrNothing, 1_000, START + 10 * DAY);
        let first = self.back(project.id, 600);
        let second = self.back(project.id, 500);
        self.set_time(START + 10 * DAY);
        self.client.settle(&project.id);
        (self.client.get_project(&project.id), first, second)
    }

    /// Registers `count` fresh revenue sources for `project_id`.
    pub fn sources(&self, project_id: u64, count: u32) -> std::vec::Vec<Address> {
        (0..count)
            .map(|_| {
                let source = Address::generate(&self.env);
                self.client
                    .register_source(&self.super_admin, &project_id, &source);
                source
            })
            .collect()
    }
}

// ── Cultural-validation stand-in ─────────────────────────────────────

#[contract]
pub struct MockValidator;

#[contractimpl]
impl MockValidator {
    pub fn block(env: Env, project_id: u64) {
        env.storage()
            .instance()
            .set(&(symbol_short!("block"), project_id), &true);
    }

    pub fn approve(env: Env, project_id: u64, milestone_index: u32) {
        env.storage()
            .instance()
            .set(&(symbol_short!("ok"), project_id, milestone_index), &true);
    }

    pub fn is_milestone_approved(env: Env, project_id: u64, milestone_index: u32) -> bool {
        env.storage()
            .instance()
            .has(&(symbol_short!("ok"), project_id, milestone_index))
    }

    pub fn is_project_publishable(env: Env, project_id: u64) -> bool {
        !env.storage()
            .instance()
            .has(&(symbol_short!("block"), project_id))
    }
}

pub fn register_validator(setup: &Setup) -> MockValidatorClient<'static> {
    let id = setup.env.register(MockValidator, ());
    setup
        .client
        .set_validator(&setup.super_admin, &Some(id.clone()));
    MockValidatorClient::new(&setup.env, &id)
}

// ── Token that calls back into the protocol ──────────────────────────

/// Minimal token whose `transfer` re-enters the protocol's `refund` while
/// the protocol is paying out, once armed.
#[contract]
pub struct CallbackToken;

#[contractimpl]
impl CallbackToken {
    pub fn mint(env: Env, to: Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .instance()
            .set(&(symbol_short!("bal"), to), &(balance + amount));
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .instance()
            .get(&(symbol_short!("bal"), id))
            .unwrap_or(0)
    }

    pub fn arm(env: Env, protocol: Address, project_id: u64, backer: Address) {
        env.storage()
            .instance()
            .set(&symbol_short!("hook"), &(protocol, project_id, backer));
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            panic!("insufficient token balance");
        }
        env.storage()
            .instance()
            .set(&(symbol_short!("bal"), from.clone()), &(from_balance - amount));
        Self::mint(env.clone(), to, amount);

        let hook: Option<(Address, u64, Address)> =
            env.storage().instance().get(&symbol_short!("hook"));
        if let Some((protocol, project_id, backer)) = hook {
            if from == protocol {
                env.storage().instance().remove(&symbol_short!("hook"));
                let nested = AfroCreateProtocolClient::new(&env, &protocol)
                    .try_refund(&project_id, &backer);
                let calls = Self::nested_calls(env.clone()) + 1;
                env.storage().instance().set(&symbol_short!("calls"), &calls);
                env.storage()
                    .instance()
                    .set(&symbol_short!("rejected"), &nested.is_err());
            }
        }
    }

    pub fn nested_calls(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&symbol_short!("calls"))
            .unwrap_or(0)
    }

    pub fn nested_rejected(env: Env) -> bool {
        env.storage()
            .instance()
            .get(&symbol_short!("rejected"))
            .unwrap_or(false)
    }
}

pub fn register_callback_token(setup: &Setup) -> CallbackTokenClient<'static> {
    let id = setup.env.register(CallbackToken, ());
    CallbackTokenClient::new(&setup.env, &id)
}

//! # Role-Based Access Control
//!
//! Every address holds at most one [`Role`]. Role storage lives under its own
//! [`RbacKey`] enum so it never collides with protocol data keys.
//!
//! | Role        | May                                                         |
//! |-------------|-------------------------------------------------------------|
//! | `SuperAdmin`| everything, including granting `SuperAdmin`                 |
//! | `Admin`     | grant/revoke non-super roles, pause, register sources       |
//! | `Governor`  | update fee and consensus parameters                         |
//! | `Creator`   | open projects                                               |
//!
//! Role changes emit `role_set` / `role_del` events keyed by the target
//! address.

use soroban_sdk::{contracttype, Address, Env};

use crate::events::{self, RoleChanged};
use crate::Error;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Governor,
    Creator,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    SuperAdmin,
    Role(Address),
}

pub fn init_super_admin(env: &Env, super_admin: &Address) -> Result<(), Error> {
    if env.storage().instance().has(&RbacKey::SuperAdmin) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage()
        .instance()
        .set(&RbacKey::SuperAdmin, super_admin);
    set_role(env, super_admin, Role::SuperAdmin);
    Ok(())
}

pub fn role_of(env: &Env, address: Address) -> Option<Role> {
    env.storage().persistent().get(&RbacKey::Role(address))
}

pub fn has_role(env: &Env, address: Address, role: Role) -> bool {
    role_of(env, address) == Some(role)
}

pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    let caller_role = require_admin_or_above(env, caller)?;
    if role == Role::SuperAdmin && caller_role != Role::SuperAdmin {
        return Err(Error::Unauthorized);
    }
    if has_role(env, target.clone(), Role::SuperAdmin) {
        // Use transfer_super_admin to move the SuperAdmin seat.
        return Err(Error::Unauthorized);
    }
    if role == Role::SuperAdmin {
        move_super_admin(env, caller, target);
        return Ok(());
    }
    set_role(env, target, role);
    events::role_changed(
        env,
        RoleChanged {
            target: target.clone(),
            role: Some(role),
            by: caller.clone(),
        },
    );
    Ok(())
}

pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    caller.require_auth();
    require_admin_or_above(env, caller)?;
    match role_of(env, target.clone()) {
        None => return Err(Error::RoleNotFound),
        Some(Role::SuperAdmin) => return Err(Error::Unauthorized),
        Some(_) => {}
    }
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(target.clone()));
    events::role_changed(
        env,
        RoleChanged {
            target: target.clone(),
            role: None,
            by: caller.clone(),
        },
    );
    Ok(())
}

pub fn transfer_super_admin(env: &Env, current: &Address, new: &Address) -> Result<(), Error> {
    current.require_auth();
    if !has_role(env, current.clone(), Role::SuperAdmin) {
        return Err(Error::Unauthorized);
    }
    move_super_admin(env, current, new);
    Ok(())
}

fn move_super_admin(env: &Env, current: &Address, new: &Address) {
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(current.clone()));
    env.storage().instance().set(&RbacKey::SuperAdmin, new);
    set_role(env, new, Role::SuperAdmin);
    events::role_changed(
        env,
        RoleChanged {
            target: new.clone(),
            role: Some(Role::SuperAdmin),
            by: current.clone(),
        },
    );
}

/// Returns the caller's role when it is `SuperAdmin` or `Admin`.
pub fn require_admin_or_above(env: &Env, caller: &Address) -> Result<Role, Error> {
    match role_of(env, caller.clone()) {
        Some(role @ (Role::SuperAdmin | Role::Admin)) => Ok(role),
        _ => Err(Error::Unauthorized),
    }
}

pub fn require_governance(env: &Env, caller: &Address) -> Result<(), Error> {
    match role_of(env, caller.clone()) {
        Some(Role::SuperAdmin | Role::Admin | Role::Governor) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

pub fn require_can_open(env: &Env, caller: &Address) -> Result<(), Error> {
    match role_of(env, caller.clone()) {
        Some(Role::SuperAdmin | Role::Admin | Role::Creator) => Ok(()),
        _ => Err(Error::Unauthorized),
    }
}

fn set_role(env: &Env, target: &Address, role: Role) {
    env.storage()
        .persistent()
        .set(&RbacKey::Role(target.clone()), &role);
}

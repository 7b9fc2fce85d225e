//! Pausability and the reentrancy discipline shared by every value-moving
//! operation.
//!
//! Each critical section runs inside [`non_reentrant`], which holds a lock in
//! temporary storage keyed by [`LockScope`]. A nested entry into the same
//! scope is rejected with `Error::Reentrant`. The lock is released whether
//! the body succeeds or fails, so a caller that handles the error inside the
//! same invocation can enter the scope again.

use soroban_sdk::Env;

use crate::storage::{self, LockScope};
use crate::Error;

pub fn require_not_paused(env: &Env) -> Result<(), Error> {
    if storage::is_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}

pub fn non_reentrant<T, F>(env: &Env, scope: LockScope, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    if storage::is_locked(env, &scope) {
        return Err(Error::Reentrant);
    }
    storage::set_lock(env, &scope);
    let result = body();
    storage::clear_lock(env, &scope);
    result
}

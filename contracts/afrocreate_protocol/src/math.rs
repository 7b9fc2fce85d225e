//! Fixed-precision value arithmetic.
//!
//! Amounts are `i128` token units. Every helper is checked and reports
//! `Error::Overflow` instead of wrapping or trapping, so a failing
//! calculation rejects the single operation like any other error.

use soroban_sdk::Vec;

use crate::Error;

/// 10000 basis points = 100%.
pub const BPS_DENOMINATOR: u32 = 10_000;

pub fn checked_add(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_add(b).ok_or(Error::Overflow)
}

pub fn checked_sub(a: i128, b: i128) -> Result<i128, Error> {
    a.checked_sub(b).ok_or(Error::Overflow)
}

/// `floor(a * b / denominator)` for non-negative operands.
pub fn mul_div_floor(a: i128, b: i128, denominator: i128) -> Result<i128, Error> {
    if denominator <= 0 || a < 0 || b < 0 {
        return Err(Error::Overflow);
    }
    a.checked_mul(b)
        .map(|product| product / denominator)
        .ok_or(Error::Overflow)
}

/// `floor(amount * bps / 10000)`.
pub fn apply_bps(amount: i128, bps: u32) -> Result<i128, Error> {
    mul_div_floor(amount, bps as i128, BPS_DENOMINATOR as i128)
}

/// Share of `part` in `whole`, in basis points, rounded down.
pub fn share_bps(part: i128, whole: i128) -> Result<u32, Error> {
    if whole <= 0 || part > whole {
        return Err(Error::Overflow);
    }
    let bps = mul_div_floor(part, BPS_DENOMINATOR as i128, whole)?;
    Ok(bps as u32)
}

/// Median of a non-empty set of values. With an even count the two middle
/// values are averaged and rounded down.
pub fn median(values: &Vec<i128>) -> Option<i128> {
    let sorted = sorted(values);
    let len = sorted.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    let upper = sorted.get(mid)?;
    if len % 2 == 1 {
        return Some(upper);
    }
    let lower = sorted.get(mid - 1)?;
    // lower + (upper - lower) / 2 cannot overflow for ordered values.
    Some(lower + (upper - lower) / 2)
}

/// True when every value lies within `tolerance_bps` of `center`.
pub fn within_tolerance(values: &Vec<i128>, center: i128, tolerance_bps: u32) -> bool {
    let Ok(allowed) = apply_bps(center.abs(), tolerance_bps) else {
        return false;
    };
    values.iter().all(|value| match value.checked_sub(center) {
        Some(distance) => distance.abs() <= allowed,
        None => false,
    })
}

fn sorted(values: &Vec<i128>) -> Vec<i128> {
    let mut out: Vec<i128> = Vec::new(values.env());
    for value in values.iter() {
        let mut position = out.len();
        for (i, existing) in out.iter().enumerate() {
            if value < existing {
                position = i as u32;
                break;
            }
        }
        out.insert(position, value);
    }
    out
}

//! Experience points and levels.
//!
//! Pure functions only; the store-backed wrapper lives in
//! [`ProgressService::add_xp`](crate::progress::ProgressService::add_xp).

use crate::config::{MAX_LEVEL, XP_PER_LEVEL};
use serde::Serialize;

/// Level for an experience total: 1 below [`XP_PER_LEVEL`], then one level
/// per [`XP_PER_LEVEL`] points, capped at [`MAX_LEVEL`].
pub fn level_from_xp(xp: u64) -> u32 {
    if xp < XP_PER_LEVEL {
        return 1;
    }
    let level = (xp / XP_PER_LEVEL).saturating_add(1);
    level.min(u64::from(MAX_LEVEL)) as u32
}

/// XP needed to go from `current_level` to the next one.
///
/// The formula `level * step - (level - 1) * step` reduces to a flat
/// [`XP_PER_LEVEL`] for every level.
// TODO: confirm with product whether later levels should cost more; the
// dashboard shows this number directly.
pub fn xp_for_next_level(current_level: u32) -> u64 {
    let level = i64::from(current_level);
    let step = XP_PER_LEVEL as i64;
    (level * step - (level - 1) * step) as u64
}

/// Scales a base award, truncating toward zero. Negative or NaN products
/// award nothing.
pub fn award_xp(base_xp: u64, multiplier: f64) -> u64 {
    (base_xp as f64 * multiplier).trunc() as u64
}

/// Snapshot of a learner's gamification state, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GamificationSummary {
    pub current_level: u32,
    pub current_xp: u64,
    pub xp_for_next_level: u64,
    pub daily_streak: u64,
    pub longest_streak: u64,
}

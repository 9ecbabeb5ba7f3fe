//! Dependence-preservation checks for candidate schedules.
//!
//! A schedule is legal when every dependence runs forward in schedule time:
//! mapping a dependence relation through the schedule on both sides and
//! taking the pointwise difference of sink and source schedule points must
//! never produce a lexicographically non-positive vector. The checks here
//! are conservative with respect to may-dependences, so a schedule is only
//! accepted when no dependence in the relation can be violated.

use crate::cursor::Cursor;
use isl_rs::{MultiAff, Schedule, Set, UnionMap, UnionSet};
use log::debug;

/// Decide whether `schedule` respects every dependence in `deps`.
///
/// `deps` maps source instances to sink instances. The schedule is applied to
/// both sides, the delta set of the resulting relation is formed, and the
/// schedule is legal iff no delta is lexicographically at or below zero.
pub fn check_legality(schedule: &Schedule, deps: &UnionMap) -> bool {
    if deps.is_empty() {
        return true;
    }
    let schedule_map = schedule.get_map();
    let scheduled = deps
        .copy()
        .apply_domain(schedule_map.copy())
        .apply_range(schedule_map);
    let delta = scheduled.deltas();
    let zeros = zeros_on(&delta);
    let backward = delta.lex_le_union_set(zeros);
    let legal = backward.is_empty();
    debug!("legality check: {}", if legal { "legal" } else { "violated" });
    legal
}

/// Decide whether the band under `cursor` may run its dimensions in parallel.
///
/// The dependence relation is mapped through the band's own partial schedule
/// only. Parallel execution is sound iff every resulting delta is exactly
/// zero, i.e. no dependence crosses iterations of this band.
pub fn check_parallel(cursor: &Cursor, deps: &UnionMap) -> bool {
    if deps.is_empty() {
        return true;
    }
    let partial = cursor.node.band_get_partial_schedule();
    let band_map = UnionMap::from_multi_union_pw_aff(partial);
    let scheduled = deps
        .copy()
        .apply_domain(band_map.copy())
        .apply_range(band_map);
    let delta = scheduled.deltas();
    if delta.is_empty() {
        return true;
    }
    let zeros = zeros_on(&delta);
    let parallel = delta.is_subset(&zeros);
    debug!(
        "parallel check: {}",
        if parallel { "coincident" } else { "carried" }
    );
    parallel
}

/// The singleton zero vector in the space of `delta`.
fn zeros_on(delta: &UnionSet) -> UnionSet {
    let set = Set::from_union_set(delta.copy());
    let zero = MultiAff::zero(set.get_space());
    UnionSet::from_set(Set::from_multi_aff(zero))
}

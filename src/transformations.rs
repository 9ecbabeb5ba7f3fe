//! Loop transformation primitives on schedule tree cursors.
//!
//! Every primitive consumes a [`Cursor`], rewrites the tree underneath it and
//! returns a new cursor into the rewritten tree. Primitives only guarantee a
//! structurally well-formed result; whether the rewrite preserves the
//! program's dependences is decided separately by [`crate::legality`] when the
//! session commits.

use crate::cursor::Cursor;
use isl_rs::{
    ASTLoopType, DimType, Id, MultiAff, MultiUnionPwAff, MultiVal, PwAff, ScheduleNode,
    ScheduleNodeType, Set, UnionPwAff, UnionSetList, Val, ValList,
};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the mark node inserted above candidate-parallel bands.
pub const PARALLEL_MARK: &str = "parallel";

/// Structural precondition failures of the primitives.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("expected a band node at the cursor, found {0:?}")]
    NotABand(ScheduleNodeType),

    #[error("expected a sequence or set node at the cursor, found {0:?}")]
    NotASequence(ScheduleNodeType),

    #[error("the focused band has no band directly below it")]
    NoInnerBand,

    #[error("filter child {index} has no band directly below it")]
    NoBandBelowFilter { index: u32 },

    #[error("child index {index} out of range ({count} children)")]
    ChildOutOfRange { index: u32, count: u32 },

    #[error("fuse needs two distinct children in increasing order (got {0} and {1})")]
    BadFusePair(u32, u32),

    #[error("tile size must be positive (got {0})")]
    BadTileSize(i64),

    #[error("scale factor must be positive (got {0})")]
    BadScale(i64),

    #[error("expected a one-dimensional band schedule (found {0} dimensions)")]
    MultiDimBand(i32),

    #[error("piece index {index} out of range ({count} pieces)")]
    PieceOutOfRange { index: u32, count: u32 },

    #[error("input dimension {index} out of range ({count} dimensions)")]
    VarOutOfRange { index: u32, count: u32 },

    #[error("band member {index} out of range ({count} members)")]
    MemberOutOfRange { index: u32, count: u32 },
}

/// AST-build annotation for one band dimension.
///
/// These are codegen-time directives only; none of them changes the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    Default,
    Atomic,
    Unroll,
    Separate,
}

impl From<LoopType> for ASTLoopType {
    fn from(t: LoopType) -> ASTLoopType {
        match t {
            LoopType::Default => ASTLoopType::Default,
            LoopType::Atomic => ASTLoopType::Atomic,
            LoopType::Unroll => ASTLoopType::Unroll,
            LoopType::Separate => ASTLoopType::Separate,
        }
    }
}

// ============================================================================
// Core transformations
// ============================================================================

/// Tile the focused band.
///
/// The band is replaced by a two-level tower: the outer band runs over the
/// tile origins (`floor(d / tile_size)` in each member) and the inner band
/// over the points within a tile (`d mod tile_size`). The cursor stays on the
/// outer band.
pub fn tile(cursor: Cursor, tile_size: i64) -> Result<Cursor, TransformError> {
    if tile_size <= 0 {
        return Err(TransformError::BadTileSize(tile_size));
    }
    let Cursor { node, path } = expect_band(cursor)?;
    let ctx = node.get_ctx();
    let n_members = node.band_n_member();
    let space = node.band_get_space();
    let mut sizes = ValList::alloc(&ctx, n_members);
    for _ in 0..n_members {
        sizes = sizes.add(Val::int_from_si(&ctx, tile_size));
    }
    debug!("tiling {}-member band by {}", n_members, tile_size);
    let node = node.band_tile(MultiVal::from_val_list(space, sizes));
    Ok(Cursor { node, path })
}

/// Swap the focused band with the band directly below it.
///
/// The focused band's partial schedule is pulled out, the band is deleted so
/// the inner band moves up, and the extracted schedule is re-inserted below
/// it. The cursor ends on the new outer band (the originally inner one).
pub fn interchange(cursor: Cursor) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = expect_band(cursor)?;
    let below = node.copy().first_child();
    if below.get_type() != ScheduleNodeType::Band {
        return Err(TransformError::NoInnerBand);
    }
    let partial = node.band_get_partial_schedule();
    let node = node.delete();
    let node = node.first_child();
    let node = node.insert_partial_schedule(partial);
    let node = node.parent();
    Ok(Cursor { node, path })
}

/// Fuse two filter children of the focused sequence.
///
/// The children `idx1 < idx2` must each carry a band with a one-dimensional
/// partial schedule directly below their filter. The sequence is rebuilt with
/// the two filters unioned into one; below the unioned filter sits a band
/// whose schedule is the union of the two original partial schedules (each
/// restricted to its own instances), and below that an inner sequence keeps
/// the two original subtrees apart. The cursor ends back on the outer
/// sequence.
pub fn fuse(cursor: Cursor, idx1: u32, idx2: u32) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = cursor;
    let kind = node.get_type();
    if kind != ScheduleNodeType::Sequence && kind != ScheduleNodeType::Set {
        return Err(TransformError::NotASequence(kind));
    }
    let n_children = node.n_children() as u32;
    if idx1 >= idx2 {
        return Err(TransformError::BadFusePair(idx1, idx2));
    }
    if idx2 >= n_children {
        return Err(TransformError::ChildOutOfRange {
            index: idx2,
            count: n_children,
        });
    }
    for idx in [idx1, idx2] {
        let band = node.copy().child(idx as i32).first_child();
        if band.get_type() != ScheduleNodeType::Band {
            return Err(TransformError::NoBandBelowFilter { index: idx });
        }
        let dims = band.band_get_partial_schedule().size();
        if dims != 1 {
            return Err(TransformError::MultiDimBand(dims));
        }
    }
    let ctx = node.get_ctx();

    // Outer, shorter sequence: the two chosen filters collapse into one.
    let merged = node
        .copy()
        .child(idx1 as i32)
        .filter_get_filter()
        .union(node.copy().child(idx2 as i32).filter_get_filter());
    let mut outer_filters = UnionSetList::alloc(&ctx, (n_children - 1) as i32);
    for i in 0..n_children - 1 {
        let filter = if i == idx1 {
            merged.copy()
        } else if i >= idx2 {
            node.copy().child((i + 1) as i32).filter_get_filter()
        } else {
            node.copy().child(i as i32).filter_get_filter()
        };
        outer_filters = outer_filters.add(filter);
    }
    let node = node.insert_sequence(outer_filters);

    // Below the merged filter sits a restricted copy of the original
    // sequence. Pull the two surviving branches out of it.
    let node = node.child(idx1 as i32).first_child();
    let (node, filter_a, partial_a) = fused_branch(node, idx1);
    let (node, filter_b, partial_b) = fused_branch(node, idx2);

    // The fused band adopts the first band's output tuple identifier and the
    // second schedule is aligned to the first one's parameter space.
    let partial_b = adopt_tuple_id(partial_b, &partial_a);
    let fused = partial_a.union_add(partial_b);
    debug!("fused band schedule: {}", fused.to_str());

    let mut inner_filters = UnionSetList::alloc(&ctx, 2);
    inner_filters = inner_filters.add(filter_a);
    inner_filters = inner_filters.add(filter_b);
    let node = node.insert_sequence(inner_filters);
    let node = node.insert_partial_schedule(fused);
    let node = node.parent().parent();
    Ok(Cursor { node, path })
}

/// Fuse all filter children of the focused sequence into one.
///
/// Same construction as [`fuse`] but over every child at once: the outer
/// sequence keeps a single filter covering all instances, below it one band
/// unions all the per-child schedules, and an inner sequence preserves the
/// original subtrees. Every child must carry a one-dimensional band directly
/// below its filter.
pub fn full_fuse(cursor: Cursor) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = cursor;
    let kind = node.get_type();
    if kind != ScheduleNodeType::Sequence && kind != ScheduleNodeType::Set {
        return Err(TransformError::NotASequence(kind));
    }
    let n_children = node.n_children() as u32;
    if n_children < 2 {
        return Ok(Cursor { node, path });
    }
    for idx in 0..n_children {
        let band = node.copy().child(idx as i32).first_child();
        if band.get_type() != ScheduleNodeType::Band {
            return Err(TransformError::NoBandBelowFilter { index: idx });
        }
        let dims = band.band_get_partial_schedule().size();
        if dims != 1 {
            return Err(TransformError::MultiDimBand(dims));
        }
    }
    let ctx = node.get_ctx();

    let mut merged = node.copy().child(0).filter_get_filter();
    for idx in 1..n_children {
        merged = merged.union(node.copy().child(idx as i32).filter_get_filter());
    }
    let mut outer_filters = UnionSetList::alloc(&ctx, 1);
    outer_filters = outer_filters.add(merged);
    let node = node.insert_sequence(outer_filters);

    let node = node.child(0).first_child();
    let mut inner_filters = UnionSetList::alloc(&ctx, n_children as i32);
    let (mut node, first_filter, mut fused) = fused_branch(node, 0);
    inner_filters = inner_filters.add(first_filter);
    for idx in 1..n_children {
        let (back, filter, partial) = fused_branch(node, idx);
        node = back;
        inner_filters = inner_filters.add(filter);
        let partial = adopt_tuple_id(partial, &fused);
        fused = fused.union_add(partial);
    }
    debug!("fully fused band schedule: {}", fused.to_str());

    let node = node.insert_sequence(inner_filters);
    let node = node.insert_partial_schedule(fused);
    let node = node.parent().parent();
    Ok(Cursor { node, path })
}

/// Multiply every output dimension of the focused band by `scale`.
pub fn scale(cursor: Cursor, scale: i64) -> Result<Cursor, TransformError> {
    if scale <= 0 {
        return Err(TransformError::BadScale(scale));
    }
    let Cursor { node, path } = expect_band(cursor)?;
    let ctx = node.get_ctx();
    let n_members = node.band_n_member();
    let space = node.band_get_space();
    let mut factors = ValList::alloc(&ctx, n_members);
    for _ in 0..n_members {
        factors = factors.add(Val::int_from_si(&ctx, scale));
    }
    let node = node.band_scale(MultiVal::from_val_list(space, factors));
    Ok(Cursor { node, path })
}

// ============================================================================
// Shifts
// ============================================================================

/// Which pieces of a band's piecewise domain a shift applies to.
#[derive(Debug, Clone, Copy)]
enum PieceSelector {
    One(u32),
    All,
}

impl PieceSelector {
    fn selects(&self, idx: u32) -> bool {
        match self {
            PieceSelector::One(k) => *k == idx,
            PieceSelector::All => true,
        }
    }
}

/// Add the constant `value` to piece `pa_idx` of the focused band's schedule.
pub fn partial_shift_val(cursor: Cursor, pa_idx: u32, value: i64) -> Result<Cursor, TransformError> {
    shift(cursor, PieceSelector::One(pa_idx), &|set| {
        Ok(constant_piece(set, value))
    })
}

/// Add input dimension `var_idx` to piece `pa_idx` of the band's schedule.
pub fn partial_shift_var(
    cursor: Cursor,
    pa_idx: u32,
    var_idx: u32,
) -> Result<Cursor, TransformError> {
    shift(cursor, PieceSelector::One(pa_idx), &|set| {
        coordinate_piece(set, var_idx)
    })
}

/// Add the constant `value` to every piece of the band's schedule.
pub fn full_shift_val(cursor: Cursor, value: i64) -> Result<Cursor, TransformError> {
    shift(cursor, PieceSelector::All, &|set| Ok(constant_piece(set, value)))
}

/// Add input dimension `var_idx` to every piece of the band's schedule.
pub fn full_shift_var(cursor: Cursor, var_idx: u32) -> Result<Cursor, TransformError> {
    shift(cursor, PieceSelector::All, &|set| coordinate_piece(set, var_idx))
}

/// Shared shift driver.
///
/// Builds a piecewise delta over the band's one-dimensional schedule: for
/// each piece of the schedule's domain either the caller-supplied expression
/// (selected pieces) or zero (the rest), then hands the delta to the kernel's
/// band shift. The output tuple identifier of the partial schedule survives.
fn shift(
    cursor: Cursor,
    selector: PieceSelector,
    piece_fn: &dyn Fn(Set) -> Result<PwAff, TransformError>,
) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = expect_band(cursor)?;
    let ctx = node.get_ctx();
    let partial = node.band_get_partial_schedule();
    let dims = partial.size();
    if dims != 1 {
        return Err(TransformError::MultiDimBand(dims));
    }
    let tuple_id = if partial.has_tuple_id(DimType::Out) {
        Some(partial.get_tuple_id(DimType::Out))
    } else {
        None
    };
    let pieces = partial.get_at(0).domain().get_set_list();
    let n_pieces = pieces.size() as u32;
    if let PieceSelector::One(k) = selector {
        if k >= n_pieces {
            return Err(TransformError::PieceOutOfRange {
                index: k,
                count: n_pieces,
            });
        }
    }

    let mut delta = UnionPwAff::empty_ctx(&ctx);
    for set_idx in 0..n_pieces {
        let set = pieces.get_at(set_idx as i32);
        let piece = if selector.selects(set_idx) {
            piece_fn(set)?
        } else {
            constant_piece(set, 0)
        };
        delta = delta.add_pw_aff(piece);
    }
    let mut delta = MultiUnionPwAff::from_union_pw_aff(delta);
    if let Some(id) = tuple_id {
        delta = delta.set_tuple_id(DimType::Out, id);
    }
    debug!("shifting band by {}", delta.to_str());
    let node = node.band_shift(delta);
    Ok(Cursor { node, path })
}

/// Constant expression on one piece domain.
fn constant_piece(set: Set, value: i64) -> PwAff {
    let ctx = set.get_ctx();
    PwAff::val_on_domain(set, Val::int_from_si(&ctx, value))
}

/// Projection of one piece domain onto its input dimension `var_idx`.
fn coordinate_piece(set: Set, var_idx: u32) -> Result<PwAff, TransformError> {
    let space = set.get_space();
    let n_dims = space.dim(DimType::Set) as u32;
    if var_idx >= n_dims {
        return Err(TransformError::VarOutOfRange {
            index: var_idx,
            count: n_dims,
        });
    }
    let identity = MultiAff::identity_on_domain_space(space);
    let aff = identity.get_at(var_idx as i32);
    Ok(PwAff::from_aff(aff).intersect_domain(set))
}

// ============================================================================
// Annotations
// ============================================================================

/// Flag the focused band as candidate-parallel.
///
/// Member 0 is marked coincident and a `parallel` mark node is inserted above
/// the band. The cursor ends on the mark node, with the band as its only
/// child. Whether the band is actually parallel is decided by the parallel
/// legality check at commit time.
pub fn set_parallel(cursor: Cursor) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = expect_band(cursor)?;
    let ctx = node.get_ctx();
    let node = node.band_member_set_coincident(0, 1);
    let node = node.insert_mark(Id::read_from_str(&ctx, PARALLEL_MARK));
    Ok(Cursor { node, path })
}

/// Set the AST loop type of band member `pos`.
pub fn set_loop_type(
    cursor: Cursor,
    pos: u32,
    loop_type: LoopType,
) -> Result<Cursor, TransformError> {
    let Cursor { node, path } = expect_band(cursor)?;
    let n_members = node.band_n_member() as u32;
    if pos >= n_members {
        return Err(TransformError::MemberOutOfRange {
            index: pos,
            count: n_members,
        });
    }
    let node = node.band_member_set_ast_loop_type(pos as i32, loop_type.into());
    Ok(Cursor { node, path })
}

// ============================================================================
// Helpers
// ============================================================================

fn expect_band(cursor: Cursor) -> Result<Cursor, TransformError> {
    let kind = cursor.kind();
    if kind != ScheduleNodeType::Band {
        return Err(TransformError::NotABand(kind));
    }
    Ok(cursor)
}

/// Impose `model`'s output tuple identifier on `partial` and align its
/// parameter space, so a domain-wise union of the two stays well defined.
fn adopt_tuple_id(partial: MultiUnionPwAff, model: &MultiUnionPwAff) -> MultiUnionPwAff {
    let partial = if model.has_tuple_id(DimType::Out) {
        partial.set_tuple_id(DimType::Out, model.get_tuple_id(DimType::Out))
    } else {
        partial.reset_tuple_id(DimType::Out)
    };
    partial.align_params(model.get_space())
}

/// Descend to filter child `idx` of the inner sequence and pull out its
/// filter together with the band schedule restricted to that filter. The
/// node comes back at the sequence it started from.
fn fused_branch(node: ScheduleNode, idx: u32) -> (ScheduleNode, isl_rs::UnionSet, MultiUnionPwAff) {
    let node = node.child(idx as i32);
    let filter = node.filter_get_filter();
    let node = node.first_child();
    let partial = node
        .band_get_partial_schedule()
        .intersect_domain(filter.copy());
    let node = node.parent().parent();
    (node, filter, partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;
    use isl_rs::{Context, Schedule};
    use std::sync::Arc;

    fn band_tower(ctx: &Context) -> Schedule {
        Schedule::read_from_str(
            ctx,
            r#"{ domain: "{ S0[i, j] : 0 <= i < 64 and 0 <= j < 64 }",
                 child: { schedule: "[{ S0[i, j] -> [(i)] }]",
                   child: { schedule: "[{ S0[i, j] -> [(j)] }]" } } }"#,
        )
    }

    fn two_statement_sequence(ctx: &Context) -> Schedule {
        Schedule::read_from_str(
            ctx,
            r#"{ domain: "{ S0[i] : 0 <= i < 100; S1[i] : 0 <= i < 100 }",
                 child: { sequence: [
                   { filter: "{ S0[i] }",
                     child: { schedule: "[{ S0[i] -> [(i)] }]" } },
                   { filter: "{ S1[i] }",
                     child: { schedule: "[{ S1[i] -> [(i)] }]" } } ] } }"#,
        )
    }

    fn outer_band(schedule: &Schedule) -> Cursor {
        Cursor::from_schedule(schedule).goto_child(0).unwrap()
    }

    #[test]
    fn tile_splits_band_in_two() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = tile(outer_band(&schedule), 32).unwrap();

        assert_eq!(cursor.kind(), ScheduleNodeType::Band);
        let inner = cursor.copy().goto_child(0).unwrap();
        assert_eq!(inner.kind(), ScheduleNodeType::Band);
        let tree = cursor.schedule().to_str().to_string();
        assert!(tree.contains("mod 32"), "no point band in {}", tree);
    }

    #[test]
    fn tile_rejects_non_band() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let root = Cursor::from_schedule(&schedule);
        assert!(matches!(tile(root, 32), Err(TransformError::NotABand(_))));
    }

    #[test]
    fn tile_rejects_bad_size() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        assert!(matches!(
            tile(outer_band(&schedule), 0),
            Err(TransformError::BadTileSize(0))
        ));
    }

    #[test]
    fn interchange_swaps_band_tower() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = interchange(outer_band(&schedule)).unwrap();

        assert_eq!(cursor.kind(), ScheduleNodeType::Band);
        let outer_expr = cursor.expr().unwrap();
        assert!(outer_expr.contains("(j)"), "outer is {}", outer_expr);
        let inner = cursor.copy().goto_child(0).unwrap();
        assert!(inner.expr().unwrap().contains("(i)"));
    }

    #[test]
    fn interchange_twice_restores_schedule() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let original = schedule.get_map().to_str().to_string();

        let cursor = interchange(outer_band(&schedule)).unwrap();
        let cursor = interchange(cursor).unwrap();
        let round_trip = cursor.schedule().get_map().to_str().to_string();
        assert_eq!(original, round_trip);
    }

    #[test]
    fn interchange_needs_inner_band() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let inner = outer_band(&schedule).goto_child(0).unwrap();
        assert!(matches!(
            interchange(inner),
            Err(TransformError::NoInnerBand)
        ));
    }

    #[test]
    fn fuse_merges_two_filters() {
        let ctx = Arc::new(Context::alloc());
        let schedule = two_statement_sequence(&ctx);
        let sequence = outer_band(&schedule);
        assert_eq!(sequence.kind(), ScheduleNodeType::Sequence);

        let cursor = fuse(sequence, 0, 1).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Sequence);
        assert_eq!(cursor.n_children(), 1);

        // The merged filter now leads to a band over both statements.
        let band = cursor
            .copy()
            .goto_child(0)
            .unwrap()
            .goto_child(0)
            .unwrap();
        assert_eq!(band.kind(), ScheduleNodeType::Band);
        let expr = band.expr().unwrap();
        assert!(expr.contains("S0"), "fused band is {}", expr);
        assert!(expr.contains("S1"), "fused band is {}", expr);
    }

    #[test]
    fn fuse_checks_indices() {
        let ctx = Arc::new(Context::alloc());
        let schedule = two_statement_sequence(&ctx);
        assert!(matches!(
            fuse(outer_band(&schedule), 1, 1),
            Err(TransformError::BadFusePair(1, 1))
        ));
        assert!(matches!(
            fuse(outer_band(&schedule), 0, 5),
            Err(TransformError::ChildOutOfRange { .. })
        ));
    }

    #[test]
    fn scale_multiplies_schedule() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = scale(outer_band(&schedule), 4).unwrap();
        let expr = cursor.expr().unwrap();
        assert!(expr.contains("4i"), "scaled band is {}", expr);
    }

    #[test]
    fn shift_then_negate_is_identity() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let original = schedule.get_map().to_str().to_string();

        let cursor = partial_shift_val(outer_band(&schedule), 0, 5).unwrap();
        let cursor = partial_shift_val(cursor, 0, -5).unwrap();
        let round_trip = cursor.schedule().get_map().to_str().to_string();
        assert_eq!(original, round_trip);
    }

    #[test]
    fn shift_val_zero_is_noop() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let original = schedule.get_map().to_str().to_string();
        let cursor = full_shift_val(outer_band(&schedule), 0).unwrap();
        assert_eq!(original, cursor.schedule().get_map().to_str().to_string());
    }

    #[test]
    fn shift_var_adds_coordinate() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = full_shift_var(outer_band(&schedule), 1).unwrap();
        let expr = cursor.expr().unwrap();
        assert!(expr.contains("i + j"), "skewed band is {}", expr);
    }

    #[test]
    fn shift_rejects_out_of_range_piece() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        assert!(matches!(
            partial_shift_val(outer_band(&schedule), 7, 1),
            Err(TransformError::PieceOutOfRange { .. })
        ));
    }

    #[test]
    fn set_parallel_inserts_mark() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = set_parallel(outer_band(&schedule)).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Mark);
        let band = cursor.copy().goto_child(0).unwrap();
        assert_eq!(band.kind(), ScheduleNodeType::Band);
        let tree = cursor.schedule().to_str().to_string();
        assert!(tree.contains(PARALLEL_MARK), "no mark in {}", tree);
        assert!(tree.contains("coincident"), "no coincident flag in {}", tree);
    }

    #[test]
    fn set_loop_type_annotates_member() {
        let ctx = Arc::new(Context::alloc());
        let schedule = band_tower(&ctx);
        let cursor = set_loop_type(outer_band(&schedule), 0, LoopType::Unroll).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Band);
        assert!(matches!(
            set_loop_type(cursor, 3, LoopType::Atomic),
            Err(TransformError::MemberOutOfRange { .. })
        ));
    }
}

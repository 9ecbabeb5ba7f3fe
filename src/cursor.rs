//! Schedule tree cursors.
//!
//! A [`Cursor`] pairs an owned ISL schedule node with the root-relative path
//! of child indices that leads to it. The node owns the whole schedule tree,
//! so a cursor is the single handle on that tree: navigation consumes the
//! cursor and returns a new one, and a transformation that rewrites the tree
//! yields a fresh cursor instead of mutating in place. Anything that only
//! wants to look at the tree takes an explicit copy first.

use isl_rs::{DimType, Schedule, ScheduleNode, ScheduleNodeType};
use serde::Serialize;
use thiserror::Error;

/// Errors raised by cursor navigation.
#[derive(Error, Debug)]
pub enum CursorError {
    /// `goto_child` with an index past the last child
    #[error("child index {index} out of range ({count} children)")]
    ChildOutOfRange { index: u32, count: u32 },

    /// `goto_parent` on the root node
    #[error("already at the schedule tree root")]
    AtRoot,
}

/// A focused position in a schedule tree.
///
/// The wrapped `ScheduleNode` owns the tree; `path` mirrors the node's
/// position as a sequence of child indices from the root.
pub struct Cursor {
    pub(crate) node: ScheduleNode,
    pub(crate) path: Vec<u32>,
}

impl Cursor {
    /// Place a cursor on the root of `schedule`.
    pub fn from_schedule(schedule: &Schedule) -> Cursor {
        Cursor {
            node: schedule.get_root(),
            path: Vec::new(),
        }
    }

    /// Explicit deep copy. The clone owns an independent tree.
    pub fn copy(&self) -> Cursor {
        Cursor {
            node: self.node.copy(),
            path: self.path.clone(),
        }
    }

    /// Move back to the root, keeping the same tree.
    pub fn goto_root(self) -> Cursor {
        let schedule = self.node.get_schedule();
        Cursor {
            node: schedule.get_root(),
            path: Vec::new(),
        }
    }

    /// Move to the parent node.
    pub fn goto_parent(mut self) -> Result<Cursor, CursorError> {
        if self.path.is_empty() {
            return Err(CursorError::AtRoot);
        }
        self.path.pop();
        Ok(Cursor {
            node: self.node.parent(),
            path: self.path,
        })
    }

    /// Move to child `index`.
    pub fn goto_child(mut self, index: u32) -> Result<Cursor, CursorError> {
        let count = self.node.n_children() as u32;
        if index >= count {
            return Err(CursorError::ChildOutOfRange { index, count });
        }
        self.path.push(index);
        Ok(Cursor {
            node: self.node.child(index as i32),
            path: self.path,
        })
    }

    /// Node type tag of the focused node.
    pub fn kind(&self) -> ScheduleNodeType {
        self.node.get_type()
    }

    /// Number of children of the focused node.
    pub fn n_children(&self) -> u32 {
        self.node.n_children() as u32
    }

    /// Root-relative path of the focused node.
    pub fn path(&self) -> &[u32] {
        &self.path
    }

    /// The schedule owning this cursor's tree.
    pub fn schedule(&self) -> Schedule {
        self.node.get_schedule()
    }

    /// Partial-schedule expression of a band node, `None` elsewhere.
    pub fn expr(&self) -> Option<String> {
        if self.kind() != ScheduleNodeType::Band {
            return None;
        }
        let partial = self.node.band_get_partial_schedule();
        Some(partial.to_str().to_string())
    }

    /// Textual dump of the subtree below the focused node.
    pub fn tree_str(&self) -> String {
        self.node.to_str().to_string()
    }

    /// Structured description of a band's pieces, `None` on non-band nodes.
    ///
    /// Drivers get one entry per piece of the partial schedule's domain,
    /// listing the parameter names and the iteration-variable names of that
    /// piece. Serialize it (JSON) instead of parsing schedule strings.
    pub fn loop_signature(&self) -> Option<LoopSignature> {
        if self.kind() != ScheduleNodeType::Band {
            return None;
        }
        let partial = self.node.band_get_partial_schedule();
        let domain = partial.domain();
        let pieces = domain.get_set_list();
        let mut signature = LoopSignature { pieces: Vec::new() };
        for set_idx in 0..pieces.size() {
            let set = pieces.get_at(set_idx);
            let mut piece = SignaturePiece {
                params: Vec::new(),
                vars: Vec::new(),
            };
            for di in 0..set.dim(DimType::Param) {
                piece.params.push(set.get_dim_name(DimType::Param, di as u32).to_string());
            }
            for di in 0..set.dim(DimType::Set) {
                piece.vars.push(set.get_dim_name(DimType::Set, di as u32).to_string());
            }
            signature.pieces.push(piece);
        }
        Some(signature)
    }
}

/// Per-piece parameter and iteration-variable names of a band.
#[derive(Debug, Clone, Serialize)]
pub struct LoopSignature {
    pub pieces: Vec<SignaturePiece>,
}

/// One piece of a [`LoopSignature`].
#[derive(Debug, Clone, Serialize)]
pub struct SignaturePiece {
    pub params: Vec<String>,
    pub vars: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use isl_rs::{Context, UnionSet};
    use std::sync::Arc;

    fn two_level_schedule(ctx: &Context) -> Schedule {
        Schedule::read_from_str(
            ctx,
            r#"{ domain: "{ S0[i, j] : 0 <= i < 32 and 0 <= j < 32 }",
                 child: { schedule: "[{ S0[i, j] -> [(i)] }]",
                   child: { schedule: "[{ S0[i, j] -> [(j)] }]" } } }"#,
        )
    }

    #[test]
    fn navigation_tracks_path() {
        let ctx = Arc::new(Context::alloc());
        let schedule = two_level_schedule(&ctx);

        let cursor = Cursor::from_schedule(&schedule);
        assert_eq!(cursor.kind(), ScheduleNodeType::Domain);
        assert!(cursor.path().is_empty());

        let cursor = cursor.goto_child(0).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Band);
        assert_eq!(cursor.path(), &[0]);

        let cursor = cursor.goto_child(0).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Band);
        assert_eq!(cursor.path(), &[0, 0]);

        let cursor = cursor.goto_parent().unwrap();
        assert_eq!(cursor.path(), &[0]);

        let cursor = cursor.goto_root();
        assert_eq!(cursor.kind(), ScheduleNodeType::Domain);
        assert!(cursor.path().is_empty());
    }

    #[test]
    fn child_out_of_range_is_rejected() {
        let ctx = Arc::new(Context::alloc());
        let domain = UnionSet::read_from_str(&ctx, "{ S0[i] : 0 <= i < 8 }");
        let schedule = Schedule::from_domain(domain);

        let cursor = Cursor::from_schedule(&schedule).goto_child(0).unwrap();
        assert_eq!(cursor.kind(), ScheduleNodeType::Leaf);
        assert!(matches!(
            cursor.goto_child(0),
            Err(CursorError::ChildOutOfRange { .. })
        ));
    }

    #[test]
    fn root_has_no_parent() {
        let ctx = Arc::new(Context::alloc());
        let schedule = two_level_schedule(&ctx);
        let cursor = Cursor::from_schedule(&schedule);
        assert!(matches!(cursor.goto_parent(), Err(CursorError::AtRoot)));
    }

    #[test]
    fn expr_only_on_bands() {
        let ctx = Arc::new(Context::alloc());
        let schedule = two_level_schedule(&ctx);

        let root = Cursor::from_schedule(&schedule);
        assert!(root.expr().is_none());

        let band = root.goto_child(0).unwrap();
        let expr = band.expr().unwrap();
        assert!(expr.contains("S0[i, j]"));
        assert!(expr.contains("(i)"));
    }

    #[test]
    fn loop_signature_lists_piece_vars() {
        let ctx = Arc::new(Context::alloc());
        let schedule = Schedule::read_from_str(
            &ctx,
            r#"{ domain: "[n] -> { S0[i, j] : 0 <= i < n and 0 <= j < n }",
                 child: { schedule: "[{ S0[i, j] -> [(i)] }]" } }"#,
        );
        let band = Cursor::from_schedule(&schedule).goto_child(0).unwrap();
        let signature = band.loop_signature().unwrap();
        assert_eq!(signature.pieces.len(), 1);
        assert_eq!(signature.pieces[0].params, vec!["n"]);
        assert_eq!(signature.pieces[0].vars, vec!["i", "j"]);
    }
}

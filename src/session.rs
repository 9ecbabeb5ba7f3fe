//! Transformation sessions over the SCoPs of one source file.
//!
//! A [`Session`] owns the SCoPs extracted from one source export together
//! with the shared polyhedral context. Per SCoP it keeps the accepted
//! cursor, the cached dependence relation and a scratch slot for in-flight
//! candidates, and runs every driver-requested transformation through a
//! begin/apply/commit protocol: the primitive works on a copy of the
//! accepted cursor and the result only replaces it when the legality check
//! passes. A rejected candidate stays in the scratch slot for inspection
//! until the next transformation.
//!
//! All operations are synchronous and must stay on one thread; the kernel
//! context underneath is not thread-safe.

use crate::codegen::CodeGenerator;
use crate::cursor::{Cursor, CursorError};
use crate::frontend::{FrontendError, ScopFile, Segment};
use crate::legality::{check_legality, check_parallel};
use crate::scop::Scop;
use crate::transformations::{self, LoopType, TransformError};
use isl_rs::{Context, ScheduleNodeType, UnionMap};
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by session operations.
///
/// Structural precondition failures and illegal transformations are not
/// errors; they come back as `Ok(false)` from the transformation methods.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("SCoP index {index} out of range ({count} SCoPs loaded)")]
    ScopIndex { index: usize, count: usize },

    #[error(transparent)]
    Frontend(#[from] FrontendError),

    #[error(transparent)]
    Codegen(#[from] crate::codegen::CodegenError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contents of the scratch slot between transformations.
enum Scratch {
    /// Nothing in flight.
    Empty,
    /// The previously accepted cursor, kept after a legal commit so the
    /// commit can be undone.
    Previous(Cursor),
    /// A structurally valid candidate the oracle rejected, kept for
    /// inspection.
    Rejected(Cursor),
}

/// Per-SCoP state. Field order is drop order: the scratch and current
/// cursors and the dependence relation go before the SCoP metadata.
struct ScopState {
    scratch: Scratch,
    current: Cursor,
    dependence: UnionMap,
    scop: Scop,
    dirty: bool,
}

/// A transformation session over one source export.
///
/// The context is declared last so every polyhedral object is released
/// before it.
pub struct Session {
    scops: Vec<ScopState>,
    source: ScopFile,
    generator: Box<dyn CodeGenerator>,
    ctx: Arc<Context>,
}

impl Session {
    /// Load a SCoP export file and set up one state per SCoP.
    pub fn load(path: &Path, generator: Box<dyn CodeGenerator>) -> Result<Session, SessionError> {
        let source = ScopFile::load(path)?;
        Session::from_export(source, generator)
    }

    /// Build a session from an already parsed export.
    pub fn from_export(
        source: ScopFile,
        generator: Box<dyn CodeGenerator>,
    ) -> Result<Session, SessionError> {
        let ctx = Arc::new(Context::alloc());
        let scops = source
            .extract(&ctx)?
            .into_iter()
            .map(|scop| {
                let dependence = scop.compute_dependences();
                let current = Cursor::from_schedule(&scop.schedule);
                ScopState {
                    scratch: Scratch::Empty,
                    current,
                    dependence,
                    scop,
                    dirty: false,
                }
            })
            .collect::<Vec<_>>();
        info!("session loaded with {} SCoPs", scops.len());
        Ok(Session {
            scops,
            source,
            generator,
            ctx,
        })
    }

    /// Shared polyhedral context of this session.
    pub fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn num_scops(&self) -> usize {
        self.scops.len()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn goto_root(&mut self, scop: usize) -> Result<(), SessionError> {
        let state = self.state_mut(scop)?;
        state.current = state.current.copy().goto_root();
        Ok(())
    }

    pub fn goto_parent(&mut self, scop: usize) -> Result<(), SessionError> {
        let state = self.state_mut(scop)?;
        state.current = state.current.copy().goto_parent()?;
        Ok(())
    }

    pub fn goto_child(&mut self, scop: usize, child: u32) -> Result<(), SessionError> {
        let state = self.state_mut(scop)?;
        state.current = state.current.copy().goto_child(child)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn node_type(&self, scop: usize) -> Result<ScheduleNodeType, SessionError> {
        Ok(self.state(scop)?.current.kind())
    }

    pub fn num_children(&self, scop: usize) -> Result<u32, SessionError> {
        Ok(self.state(scop)?.current.n_children())
    }

    /// Partial-schedule text of the focused band, empty on other nodes.
    pub fn expr(&self, scop: usize) -> Result<String, SessionError> {
        Ok(self.state(scop)?.current.expr().unwrap_or_default())
    }

    /// Per-piece params/vars description of the focused band as JSON.
    ///
    /// Non-band nodes yield the empty list `[]`.
    pub fn loop_signature(&self, scop: usize) -> Result<String, SessionError> {
        let signature = self.state(scop)?.current.loop_signature();
        let pieces = signature.map(|s| s.pieces).unwrap_or_default();
        Ok(serde_json::to_string(&pieces).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Textual dump of the subtree below the focused node.
    pub fn schedule_tree(&self, scop: usize) -> Result<String, SessionError> {
        Ok(self.state(scop)?.current.tree_str())
    }

    /// Whether any transformation has been committed on this SCoP.
    pub fn dirty(&self, scop: usize) -> Result<bool, SessionError> {
        Ok(self.state(scop)?.dirty)
    }

    /// Textual form of the cached dependence relation.
    pub fn dependences(&self, scop: usize) -> Result<String, SessionError> {
        Ok(self.state(scop)?.dependence.to_str().to_string())
    }

    /// Tree dump of the candidate the oracle rejected last, if any.
    pub fn rejected_candidate(&self, scop: usize) -> Result<Option<String>, SessionError> {
        let state = self.state(scop)?;
        match &state.scratch {
            Scratch::Rejected(cursor) => Ok(Some(cursor.tree_str())),
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Transformations
    // ------------------------------------------------------------------

    pub fn tile(&mut self, scop: usize, tile_size: i64) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| transformations::tile(cursor, tile_size))
    }

    pub fn interchange(&mut self, scop: usize) -> Result<bool, SessionError> {
        self.transform(scop, transformations::interchange)
    }

    pub fn fuse(&mut self, scop: usize, idx1: u32, idx2: u32) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| transformations::fuse(cursor, idx1, idx2))
    }

    pub fn full_fuse(&mut self, scop: usize) -> Result<bool, SessionError> {
        self.transform(scop, transformations::full_fuse)
    }

    pub fn scale(&mut self, scop: usize, factor: i64) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| transformations::scale(cursor, factor))
    }

    pub fn partial_shift_val(
        &mut self,
        scop: usize,
        pa_idx: u32,
        value: i64,
    ) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| {
            transformations::partial_shift_val(cursor, pa_idx, value)
        })
    }

    pub fn partial_shift_var(
        &mut self,
        scop: usize,
        pa_idx: u32,
        var_idx: u32,
    ) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| {
            transformations::partial_shift_var(cursor, pa_idx, var_idx)
        })
    }

    pub fn full_shift_val(&mut self, scop: usize, value: i64) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| transformations::full_shift_val(cursor, value))
    }

    pub fn full_shift_var(&mut self, scop: usize, var_idx: u32) -> Result<bool, SessionError> {
        self.transform(scop, |cursor| {
            transformations::full_shift_var(cursor, var_idx)
        })
    }

    /// Mark the focused band candidate-parallel.
    ///
    /// Commits only when no dependence crosses iterations of the band, per
    /// the parallel variant of the oracle.
    pub fn set_parallel(&mut self, scop: usize) -> Result<bool, SessionError> {
        let count = self.scops.len();
        let state = self
            .scops
            .get_mut(scop)
            .ok_or(SessionError::ScopIndex { index: scop, count })?;
        let candidate = match transformations::set_parallel(state.current.copy()) {
            Ok(cursor) => cursor,
            Err(err) => return Ok(reject_precondition(state, err)),
        };
        // The mark's only child is the band the legality check runs on.
        let band = candidate.copy().goto_child(0)?;
        let legal = check_parallel(&band, &state.dependence);
        Ok(settle(state, candidate, legal))
    }

    /// Set the AST loop type of band member `pos` on the focused band.
    ///
    /// A codegen directive only, so it skips the transaction and the oracle
    /// and applies directly to the accepted cursor.
    pub fn set_loop_opt(
        &mut self,
        scop: usize,
        pos: u32,
        loop_type: LoopType,
    ) -> Result<bool, SessionError> {
        let count = self.scops.len();
        let state = self
            .scops
            .get_mut(scop)
            .ok_or(SessionError::ScopIndex { index: scop, count })?;
        match transformations::set_loop_type(state.current.copy(), pos, loop_type) {
            Ok(cursor) => {
                state.current = cursor;
                state.dirty = true;
                Ok(true)
            }
            Err(err) => Ok(reject_precondition(state, err)),
        }
    }

    /// Undo the last legal commit, or discard a rejected candidate.
    pub fn rollback(&mut self, scop: usize) -> Result<(), SessionError> {
        let count = self.scops.len();
        let state = self
            .scops
            .get_mut(scop)
            .ok_or(SessionError::ScopIndex { index: scop, count })?;
        match std::mem::replace(&mut state.scratch, Scratch::Empty) {
            Scratch::Previous(previous) => {
                debug!("rolling back SCoP {}", scop);
                state.current = previous;
            }
            Scratch::Rejected(_) => {
                debug!("discarding rejected candidate of SCoP {}", scop);
            }
            Scratch::Empty => {}
        }
        Ok(())
    }

    /// Shared begin/apply/commit path of the schedule-changing primitives.
    fn transform<F>(&mut self, scop: usize, apply: F) -> Result<bool, SessionError>
    where
        F: FnOnce(Cursor) -> Result<Cursor, TransformError>,
    {
        let count = self.scops.len();
        let state = self
            .scops
            .get_mut(scop)
            .ok_or(SessionError::ScopIndex { index: scop, count })?;
        let candidate = match apply(state.current.copy()) {
            Ok(cursor) => cursor,
            Err(err) => return Ok(reject_precondition(state, err)),
        };
        let legal = check_legality(&candidate.schedule(), &state.dependence);
        Ok(settle(state, candidate, legal))
    }

    // ------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------

    /// Emit the whole source file.
    ///
    /// Verbatim segments pass through untouched. Untransformed SCoPs are
    /// emitted as their original text; transformed ones go through the code
    /// generator with their committed schedule.
    pub fn generate_code<W: Write>(&self, out: &mut W) -> Result<(), SessionError> {
        let mut scop_idx = 0;
        for segment in &self.source.segments {
            match segment {
                Segment::Verbatim(text) => out.write_all(text.as_bytes())?,
                Segment::Scop(_) => {
                    let state = self.state(scop_idx)?;
                    if !state.dirty {
                        out.write_all(state.scop.original_text.as_bytes())?;
                    } else {
                        let schedule = state.current.schedule();
                        let text = self.generator.generate(&state.scop, &schedule)?;
                        out.write_all(text.as_bytes())?;
                    }
                    scop_idx += 1;
                }
            }
        }
        Ok(())
    }

    /// Emit to a file path.
    pub fn generate_code_to_file(&self, path: &Path) -> Result<(), SessionError> {
        let mut file = std::fs::File::create(path)?;
        self.generate_code(&mut file)
    }

    fn state(&self, scop: usize) -> Result<&ScopState, SessionError> {
        self.scops.get(scop).ok_or(SessionError::ScopIndex {
            index: scop,
            count: self.scops.len(),
        })
    }

    fn state_mut(&mut self, scop: usize) -> Result<&mut ScopState, SessionError> {
        let count = self.scops.len();
        self.scops
            .get_mut(scop)
            .ok_or(SessionError::ScopIndex { index: scop, count })
    }
}

/// Commit or reject a structurally valid candidate.
fn settle(state: &mut ScopState, candidate: Cursor, legal: bool) -> bool {
    if legal {
        let previous = std::mem::replace(&mut state.current, candidate);
        state.scratch = Scratch::Previous(previous);
        state.dirty = true;
    } else {
        warn!("transformation rejected by the legality check");
        state.scratch = Scratch::Rejected(candidate);
    }
    legal
}

/// A primitive that failed its structural precondition leaves no candidate.
fn reject_precondition(state: &mut ScopState, err: TransformError) -> bool {
    warn!("transformation precondition failed: {}", err);
    state.scratch = Scratch::Empty;
    false
}

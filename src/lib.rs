//! PolyTune: interactive polyhedral schedule transformation
//!
//! This library takes the SCoPs an external polyhedral front-end extracted
//! from a C source file, exposes each SCoP's schedule tree as a navigable
//! cursor, applies loop transformations on request and verifies after every
//! mutation that the candidate schedule still respects the program's data
//! dependences. Accepted schedules are handed to an external code generator
//! for C emission.
//!
//! # Core Flow
//! ```text
//! C source → front-end export → Session ─┬ navigate cursor
//!                                        ├ transform → legality → commit | reject
//!                                        └ emit → code generator → C source
//! ```
//!
//! # Module Organization
//!
//! ## Schedule manipulation
//! - [`cursor`]: owned (tree, path) cursors and node introspection
//! - [`transformations`]: tile, interchange, fuse, scale, shifts, parallel
//!   mark, AST loop types
//! - [`legality`]: lexicographic dependence checks gating every commit
//!
//! ## SCoPs and sessions
//! - [`scop`]: per-SCoP front-end metadata and dependence computation
//! - [`session`]: scratch/current transaction protocol and the driver-facing
//!   operation surface
//!
//! ## External boundaries
//! - [`frontend`]: SCoP export files produced by the polyhedral front-end
//! - [`codegen`]: code generator interface for C emission

// ============================================================================
// Schedule manipulation
// ============================================================================

pub mod cursor;
pub mod legality;
pub mod transformations;

// ============================================================================
// SCoPs and sessions
// ============================================================================

pub mod scop;
pub mod session;

// ============================================================================
// External boundaries
// ============================================================================

pub mod codegen;
pub mod frontend;

pub use codegen::{CodeGenerator, CodegenError, ExternalGenerator, ScheduleDumpGenerator};
pub use cursor::{Cursor, CursorError, LoopSignature, SignaturePiece};
pub use frontend::{FrontendError, ScopDescription, ScopFile, Segment, StatementDescription};
pub use legality::{check_legality, check_parallel};
pub use scop::{Scop, Statement};
pub use session::{Session, SessionError};
pub use transformations::{LoopType, TransformError, PARALLEL_MARK};

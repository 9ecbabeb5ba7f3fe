//! Front-end boundary: SCoP export files.
//!
//! SCoP extraction from C lives in an external polyhedral front-end. That
//! front-end hands its result over as a JSON export: the source file split
//! into verbatim text segments and SCoP descriptions, where every polyhedral
//! object is an isl-syntax string. This module deserializes the export and
//! rebuilds the polyhedral objects inside the session's context.
//!
//! The kernel's parsers abort on malformed input instead of returning an
//! error, so every string is parsed behind `catch_unwind` and surfaced as a
//! [`FrontendError`].

use crate::scop::{Scop, Statement};
use isl_rs::{Context, Schedule, Set, UnionMap};
use log::debug;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors while loading or re-parsing a SCoP export.
#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed SCoP export: {0}")]
    Format(#[from] serde_json::Error),

    #[error("export contains no SCoP")]
    NoScop,

    #[error("failed to parse {what} of SCoP `{scop}`: {text}")]
    Parse {
        what: &'static str,
        scop: String,
        text: String,
    },
}

/// A source file as exported by the front-end: verbatim text interleaved
/// with SCoP descriptions, in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopFile {
    pub segments: Vec<Segment>,
}

/// One segment of the exported source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Non-SCoP source text, passed through untouched on emission.
    Verbatim(String),
    /// An extracted SCoP.
    Scop(ScopDescription),
}

/// Front-end description of one SCoP, all polyhedral objects in isl syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopDescription {
    #[serde(default)]
    pub name: String,
    /// Constraints on the structure parameters, e.g. `[n] -> { : n > 0 }`.
    #[serde(default)]
    pub context: Option<String>,
    pub statements: Vec<StatementDescription>,
    pub may_reads: String,
    pub may_writes: String,
    pub must_writes: String,
    /// The initial schedule tree.
    pub schedule: String,
    /// Verbatim source text of the SCoP region.
    #[serde(default)]
    pub original_text: String,
}

/// Front-end description of one statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementDescription {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub body: String,
}

impl ScopFile {
    /// Read an export file from disk.
    pub fn load(path: &Path) -> Result<ScopFile, FrontendError> {
        let content = std::fs::read_to_string(path)?;
        let file: ScopFile = serde_json::from_str(&content)?;
        debug!(
            "loaded export with {} segments ({} SCoPs)",
            file.segments.len(),
            file.scop_descriptions().count()
        );
        Ok(file)
    }

    /// The SCoP descriptions in source order.
    pub fn scop_descriptions(&self) -> impl Iterator<Item = &ScopDescription> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Scop(description) => Some(description),
            Segment::Verbatim(_) => None,
        })
    }

    /// Rebuild every SCoP of this export inside `ctx`, in source order.
    pub fn extract(&self, ctx: &Arc<Context>) -> Result<Vec<Scop>, FrontendError> {
        let scops = self
            .scop_descriptions()
            .map(|description| parse_scop(ctx, description))
            .collect::<Result<Vec<_>, _>>()?;
        if scops.is_empty() {
            return Err(FrontendError::NoScop);
        }
        Ok(scops)
    }
}

/// Rebuild one SCoP from its description.
pub fn parse_scop(ctx: &Arc<Context>, description: &ScopDescription) -> Result<Scop, FrontendError> {
    let scop_name = &description.name;
    let context_str = description.context.as_deref().unwrap_or("{ : }");
    let context = read_set(ctx, context_str, "context", scop_name)?;
    let mut statements = Vec::with_capacity(description.statements.len());
    for stmt in &description.statements {
        statements.push(Statement {
            name: stmt.name.clone(),
            domain: read_set(ctx, &stmt.domain, "statement domain", scop_name)?,
            body: stmt.body.clone(),
        });
    }
    Ok(Scop {
        name: description.name.clone(),
        context,
        statements,
        may_reads: read_union_map(ctx, &description.may_reads, "may-reads", scop_name)?,
        may_writes: read_union_map(ctx, &description.may_writes, "may-writes", scop_name)?,
        must_writes: read_union_map(ctx, &description.must_writes, "must-writes", scop_name)?,
        schedule: read_schedule(ctx, &description.schedule, scop_name)?,
        original_text: description.original_text.clone(),
    })
}

fn read_set(
    ctx: &Arc<Context>,
    text: &str,
    what: &'static str,
    scop: &str,
) -> Result<Set, FrontendError> {
    panic::catch_unwind(AssertUnwindSafe(|| Set::read_from_str(ctx, text))).map_err(|_| {
        FrontendError::Parse {
            what,
            scop: scop.to_string(),
            text: text.to_string(),
        }
    })
}

fn read_union_map(
    ctx: &Arc<Context>,
    text: &str,
    what: &'static str,
    scop: &str,
) -> Result<UnionMap, FrontendError> {
    panic::catch_unwind(AssertUnwindSafe(|| UnionMap::read_from_str(ctx, text))).map_err(|_| {
        FrontendError::Parse {
            what,
            scop: scop.to_string(),
            text: text.to_string(),
        }
    })
}

fn read_schedule(ctx: &Arc<Context>, text: &str, scop: &str) -> Result<Schedule, FrontendError> {
    panic::catch_unwind(AssertUnwindSafe(|| Schedule::read_from_str(ctx, text))).map_err(|_| {
        FrontendError::Parse {
            what: "schedule",
            scop: scop.to_string(),
            text: text.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use isl_rs::Context;

    fn single_loop_export() -> &'static str {
        r##"{
          "segments": [
            { "verbatim": "#include <stdio.h>\n\nint main() {\n  double A[100];\n" },
            { "scop": {
                "name": "init",
                "statements": [
                  { "name": "S0",
                    "domain": "{ S0[i] : 0 <= i < 100 }",
                    "body": "A[i] = 0.0;" }
                ],
                "may_reads": "{ }",
                "may_writes": "{ S0[i] -> A[i] }",
                "must_writes": "{ S0[i] -> A[i] }",
                "schedule": "{ domain: \"{ S0[i] : 0 <= i < 100 }\", child: { schedule: \"[{ S0[i] -> [(i)] }]\" } }",
                "original_text": "  for (int i = 0; i < 100; i++)\n    A[i] = 0.0;\n" } },
            { "verbatim": "  return 0;\n}\n" }
          ]
        }"##
    }

    #[test]
    fn export_round_trips_through_serde() {
        let file: ScopFile = serde_json::from_str(single_loop_export()).unwrap();
        assert_eq!(file.segments.len(), 3);
        assert_eq!(file.scop_descriptions().count(), 1);

        let text = serde_json::to_string(&file).unwrap();
        let again: ScopFile = serde_json::from_str(&text).unwrap();
        assert_eq!(again.segments.len(), 3);
    }

    #[test]
    fn extract_rebuilds_polyhedral_objects() {
        let ctx = Arc::new(Context::alloc());
        let file: ScopFile = serde_json::from_str(single_loop_export()).unwrap();
        let scops = file.extract(&ctx).unwrap();
        assert_eq!(scops.len(), 1);

        let scop = &scops[0];
        assert_eq!(scop.name, "init");
        assert_eq!(scop.statements.len(), 1);
        assert!(scop.schedule.to_str().to_string().contains("S0"));
        assert!(scop.compute_dependences().is_empty());
    }

    #[test]
    fn export_without_scops_is_rejected() {
        let ctx = Arc::new(Context::alloc());
        let file: ScopFile =
            serde_json::from_str(r#"{ "segments": [ { "verbatim": "int x;" } ] }"#).unwrap();
        assert!(matches!(file.extract(&ctx), Err(FrontendError::NoScop)));
    }

    #[test]
    fn bad_isl_text_is_a_parse_error() {
        let ctx = Arc::new(Context::alloc());
        let description = ScopDescription {
            name: "broken".to_string(),
            context: None,
            statements: vec![],
            may_reads: "this is not isl".to_string(),
            may_writes: "{ }".to_string(),
            must_writes: "{ }".to_string(),
            schedule: "{ domain: \"{ S0[i] }\" }".to_string(),
            original_text: String::new(),
        };
        assert!(matches!(
            parse_scop(&ctx, &description),
            Err(FrontendError::Parse { what: "may-reads", .. })
        ));
    }
}

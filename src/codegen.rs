//! Code generator boundary.
//!
//! Turning a final schedule back into C is the job of an external code
//! generator. The session only needs a [`CodeGenerator`] it can hand a SCoP
//! and its committed schedule to; the text that comes back replaces the SCoP
//! region in the emitted source.
//!
//! Two implementations ship with the crate: [`ExternalGenerator`] pipes the
//! SCoP and schedule to a generator process as JSON and reads C text back,
//! and [`ScheduleDumpGenerator`] emits the schedule and statement bodies as
//! annotated text for inspection and tests.

use crate::scop::Scop;
use isl_rs::Schedule;
use log::debug;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors from the code generator boundary.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("failed to run code generator `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("code generator `{command}` failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("failed to encode the generator request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("code generator produced invalid UTF-8")]
    BadOutput,
}

/// Produces C text for one SCoP under a committed schedule.
pub trait CodeGenerator {
    fn generate(&self, scop: &Scop, schedule: &Schedule) -> Result<String, CodegenError>;
}

/// Request handed to an external generator process on stdin.
#[derive(Serialize)]
struct GeneratorRequest<'a> {
    name: &'a str,
    schedule: String,
    statements: Vec<GeneratorStatement<'a>>,
}

#[derive(Serialize)]
struct GeneratorStatement<'a> {
    name: &'a str,
    domain: String,
    body: &'a str,
}

/// Spawns an external code generator per SCoP.
///
/// The process receives a JSON request (SCoP name, schedule tree, statement
/// domains and bodies) on stdin and must print the generated C on stdout.
pub struct ExternalGenerator {
    command: PathBuf,
}

impl ExternalGenerator {
    pub fn new(command: PathBuf) -> ExternalGenerator {
        ExternalGenerator { command }
    }
}

impl CodeGenerator for ExternalGenerator {
    fn generate(&self, scop: &Scop, schedule: &Schedule) -> Result<String, CodegenError> {
        let command = self.command.display().to_string();
        let request = GeneratorRequest {
            name: &scop.name,
            schedule: schedule.to_str().to_string(),
            statements: scop
                .statements
                .iter()
                .map(|stmt| GeneratorStatement {
                    name: &stmt.name,
                    domain: stmt.domain.to_str().to_string(),
                    body: &stmt.body,
                })
                .collect(),
        };
        debug!("invoking code generator {} for {}", command, scop.name);

        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CodegenError::Spawn {
                command: command.clone(),
                source,
            })?;
        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_string(&request)?;
            stdin
                .write_all(payload.as_bytes())
                .map_err(|source| CodegenError::Spawn {
                    command: command.clone(),
                    source,
                })?;
        }
        let output = child.wait_with_output().map_err(|source| CodegenError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(CodegenError::Failed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| CodegenError::BadOutput)
    }
}

/// Emits the committed schedule and the statement bodies as commented text.
///
/// Stands in for a real generator when inspecting transformation results or
/// running the test suite without an external toolchain.
pub struct ScheduleDumpGenerator;

impl CodeGenerator for ScheduleDumpGenerator {
    fn generate(&self, scop: &Scop, schedule: &Schedule) -> Result<String, CodegenError> {
        let mut text = String::new();
        text.push_str(&format!("/* scop {} */\n", scop.name));
        for line in schedule.to_str().to_string().lines() {
            text.push_str(&format!("/* {} */\n", line));
        }
        for stmt in &scop.statements {
            text.push_str(&format!("/* {}: */ {}\n", stmt.name, stmt.body));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isl_rs::{Context, Schedule, Set, UnionMap};
    use std::sync::Arc;

    fn tiny_scop(ctx: &Context) -> (Scop, Schedule) {
        let schedule = Schedule::read_from_str(
            ctx,
            r#"{ domain: "{ S0[i] : 0 <= i < 4 }",
                 child: { schedule: "[{ S0[i] -> [(i)] }]" } }"#,
        );
        let scop = Scop {
            name: "tiny".to_string(),
            context: Set::read_from_str(ctx, "{ : }"),
            statements: vec![crate::scop::Statement {
                name: "S0".to_string(),
                domain: Set::read_from_str(ctx, "{ S0[i] : 0 <= i < 4 }"),
                body: "A[i] = i;".to_string(),
            }],
            may_reads: UnionMap::read_from_str(ctx, "{ }"),
            may_writes: UnionMap::read_from_str(ctx, "{ S0[i] -> A[i] }"),
            must_writes: UnionMap::read_from_str(ctx, "{ S0[i] -> A[i] }"),
            schedule: schedule.copy(),
            original_text: String::new(),
        };
        (scop, schedule)
    }

    #[test]
    fn dump_generator_emits_schedule_and_bodies() {
        let ctx = Arc::new(Context::alloc());
        let (scop, schedule) = tiny_scop(&ctx);
        let text = ScheduleDumpGenerator.generate(&scop, &schedule).unwrap();
        assert!(text.contains("scop tiny"));
        assert!(text.contains("A[i] = i;"));
        assert!(text.contains("S0"));
    }

    #[test]
    fn missing_external_generator_is_reported() {
        let ctx = Arc::new(Context::alloc());
        let (scop, schedule) = tiny_scop(&ctx);
        let generator = ExternalGenerator::new(PathBuf::from("/nonexistent/codegen"));
        assert!(matches!(
            generator.generate(&scop, &schedule),
            Err(CodegenError::Spawn { .. })
        ));
    }
}

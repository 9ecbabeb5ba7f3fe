//! PolyTune CLI.
//!
//! Thin driver around [`polytune::Session`]: inspect the SCoPs of a
//! front-end export, replay a JSON transformation script against them and
//! emit the resulting source through a code generator.
//!
//! # Usage
//!
//! ## Inspect an export
//! ```bash
//! polytune info gemm.scops.json
//! ```
//!
//! ## Replay a script and emit code
//! ```bash
//! polytune transform gemm.scops.json \
//!   --script tile32.json \
//!   --output gemm.tiled.c \
//!   --generator /usr/local/bin/scop-codegen
//! ```
//!
//! A script is a JSON list of operations, e.g.
//! ```json
//! [ { "op": "goto_child", "scop": 0, "child": 0 },
//!   { "op": "tile", "scop": 0, "tile_size": 32 } ]
//! ```

use clap::{Parser, Subcommand};
use polytune::{
    CodeGenerator, ExternalGenerator, LoopType, ScheduleDumpGenerator, Session, SessionError,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[clap(name = "polytune")]
#[clap(about = "Interactive polyhedral schedule transformer")]
#[clap(version)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the SCoPs of an export with their schedules and dependences
    Info {
        /// SCoP export file produced by the front-end
        export: PathBuf,
    },

    /// Replay a transformation script and emit the transformed source
    Transform {
        /// SCoP export file produced by the front-end
        export: PathBuf,

        /// JSON transformation script
        #[clap(long, value_name = "FILE")]
        script: PathBuf,

        /// Output source file
        #[clap(short, long, value_name = "FILE")]
        output: PathBuf,

        /// External code generator executable; dumps schedules as comments
        /// when not given
        #[clap(long, value_name = "BIN")]
        generator: Option<PathBuf>,

        /// Stop at the first rejected operation
        #[clap(long)]
        strict: bool,
    },
}

/// One step of a transformation script.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ScriptOp {
    GotoRoot { scop: usize },
    GotoParent { scop: usize },
    GotoChild { scop: usize, child: u32 },
    Tile { scop: usize, tile_size: i64 },
    Interchange { scop: usize },
    Fuse { scop: usize, idx1: u32, idx2: u32 },
    FullFuse { scop: usize },
    Scale { scop: usize, factor: i64 },
    PartialShiftVal { scop: usize, pa_idx: u32, value: i64 },
    PartialShiftVar { scop: usize, pa_idx: u32, var_idx: u32 },
    FullShiftVal { scop: usize, value: i64 },
    FullShiftVar { scop: usize, var_idx: u32 },
    SetParallel { scop: usize },
    SetLoopOpt { scop: usize, pos: u32, loop_type: LoopType },
    Rollback { scop: usize },
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Commands::Info { export } => {
            let session = Session::load(&export, Box::new(ScheduleDumpGenerator))?;
            println!("{} SCoPs", session.num_scops());
            for scop in 0..session.num_scops() {
                println!("--- SCoP {} ---", scop);
                println!("schedule:\n{}", session.schedule_tree(scop)?);
                println!("dependences: {}", session.dependences(scop)?);
            }
            Ok(())
        }
        Commands::Transform {
            export,
            script,
            output,
            generator,
            strict,
        } => {
            let generator: Box<dyn CodeGenerator> = match generator {
                Some(path) => Box::new(ExternalGenerator::new(path)),
                None => Box::new(ScheduleDumpGenerator),
            };
            let mut session = Session::load(&export, generator)?;
            let script_text = std::fs::read_to_string(&script)?;
            let ops: Vec<ScriptOp> = serde_json::from_str(&script_text)?;
            for (step, op) in ops.into_iter().enumerate() {
                let legal = apply(&mut session, op)?;
                if !legal {
                    println!("step {}: rejected", step);
                    if strict {
                        return Err("script aborted at first rejected operation".into());
                    }
                } else {
                    println!("step {}: ok", step);
                }
            }
            session.generate_code_to_file(&output)?;
            Ok(())
        }
    }
}

/// Run one script step; navigation and rollback count as accepted.
fn apply(session: &mut Session, op: ScriptOp) -> Result<bool, SessionError> {
    match op {
        ScriptOp::GotoRoot { scop } => session.goto_root(scop).map(|_| true),
        ScriptOp::GotoParent { scop } => session.goto_parent(scop).map(|_| true),
        ScriptOp::GotoChild { scop, child } => session.goto_child(scop, child).map(|_| true),
        ScriptOp::Tile { scop, tile_size } => session.tile(scop, tile_size),
        ScriptOp::Interchange { scop } => session.interchange(scop),
        ScriptOp::Fuse { scop, idx1, idx2 } => session.fuse(scop, idx1, idx2),
        ScriptOp::FullFuse { scop } => session.full_fuse(scop),
        ScriptOp::Scale { scop, factor } => session.scale(scop, factor),
        ScriptOp::PartialShiftVal { scop, pa_idx, value } => {
            session.partial_shift_val(scop, pa_idx, value)
        }
        ScriptOp::PartialShiftVar {
            scop,
            pa_idx,
            var_idx,
        } => session.partial_shift_var(scop, pa_idx, var_idx),
        ScriptOp::FullShiftVal { scop, value } => session.full_shift_val(scop, value),
        ScriptOp::FullShiftVar { scop, var_idx } => session.full_shift_var(scop, var_idx),
        ScriptOp::SetParallel { scop } => session.set_parallel(scop),
        ScriptOp::SetLoopOpt {
            scop,
            pos,
            loop_type,
        } => session.set_loop_opt(scop, pos, loop_type),
        ScriptOp::Rollback { scop } => session.rollback(scop).map(|_| true),
    }
}

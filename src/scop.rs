//! SCoP records.
//!
//! A [`Scop`] bundles what the front-end extracted for one static control
//! part: the statement list with instance domains and body text, the access
//! relations, the parameter context and the initial schedule. The record is
//! immutable once built; the session keeps its evolving cursor next to it.
//!
//! Dependences are derived once per SCoP from the access relations and the
//! original schedule via the kernel's dataflow analysis and then cached by
//! the session for every legality check.

use isl_rs::{Schedule, Set, UnionAccessInfo, UnionMap};
use log::debug;

/// One user statement of a SCoP.
pub struct Statement {
    /// Tuple name of the statement's instance set.
    pub name: String,
    /// Instance domain.
    pub domain: Set,
    /// Body text, printed by the code generator.
    pub body: String,
}

/// Immutable front-end metadata of one SCoP.
pub struct Scop {
    pub name: String,
    /// Constraints on the structure parameters.
    pub context: Set,
    /// Ordered statement list.
    pub statements: Vec<Statement>,
    pub may_reads: UnionMap,
    pub may_writes: UnionMap,
    pub must_writes: UnionMap,
    /// The schedule the front-end extracted.
    pub schedule: Schedule,
    /// Verbatim source text of the SCoP region.
    pub original_text: String,
}

impl Scop {
    /// May-dependences of this SCoP under its original schedule.
    ///
    /// Reads are the sinks, may-writes the may-sources and must-writes the
    /// must-sources of the dataflow problem. The resulting relation maps
    /// producing instances to consuming instances and is what every legality
    /// check runs against.
    pub fn compute_dependences(&self) -> UnionMap {
        let access = UnionAccessInfo::from_sink(self.may_reads.copy())
            .set_may_source(self.may_writes.copy())
            .set_must_source(self.must_writes.copy())
            .set_schedule(self.schedule.copy());
        let flow = access.compute_flow();
        let deps = flow.get_may_dependence();
        debug!("dependences of {}: {}", self.name, deps.to_str());
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isl_rs::{Context, Schedule, Set, UnionMap};
    use std::sync::Arc;

    /// y[i] = y[i] + A[i][j] * x[j], the dependence sits on the accumulator.
    fn reduction_scop(ctx: &Context) -> Scop {
        let schedule = Schedule::read_from_str(
            ctx,
            r#"{ domain: "{ S0[i, j] : 0 <= i < 32 and 0 <= j < 32 }",
                 child: { schedule: "[{ S0[i, j] -> [(i)] }, { S0[i, j] -> [(j)] }]" } }"#,
        );
        Scop {
            name: "matvec".to_string(),
            context: Set::read_from_str(ctx, "{ : }"),
            statements: vec![Statement {
                name: "S0".to_string(),
                domain: Set::read_from_str(ctx, "{ S0[i, j] : 0 <= i < 32 and 0 <= j < 32 }"),
                body: "y[i] = y[i] + A[i][j] * x[j];".to_string(),
            }],
            may_reads: UnionMap::read_from_str(
                ctx,
                "{ S0[i, j] -> y[i]; S0[i, j] -> A[i, j]; S0[i, j] -> x[j] }",
            ),
            may_writes: UnionMap::read_from_str(ctx, "{ S0[i, j] -> y[i] }"),
            must_writes: UnionMap::read_from_str(ctx, "{ S0[i, j] -> y[i] }"),
            schedule,
            original_text: String::new(),
        }
    }

    #[test]
    fn reduction_carries_dependence_on_inner_dim() {
        let ctx = Arc::new(Context::alloc());
        let scop = reduction_scop(&ctx);
        let deps = scop.compute_dependences();
        assert!(!deps.is_empty());
        // Consecutive j iterations of the same i depend on each other.
        let expected = UnionMap::read_from_str(
            &ctx,
            "{ S0[i, j] -> S0[i, 1 + j] : 0 <= i < 32 and 0 <= j < 31 }",
        );
        assert!(!deps.intersect(expected).is_empty());
    }

    #[test]
    fn independent_writes_have_no_dependences() {
        let ctx = Arc::new(Context::alloc());
        let schedule = Schedule::read_from_str(
            &ctx,
            r#"{ domain: "{ S0[i] : 0 <= i < 32 }",
                 child: { schedule: "[{ S0[i] -> [(i)] }]" } }"#,
        );
        let scop = Scop {
            name: "init".to_string(),
            context: Set::read_from_str(&ctx, "{ : }"),
            statements: vec![Statement {
                name: "S0".to_string(),
                domain: Set::read_from_str(&ctx, "{ S0[i] : 0 <= i < 32 }"),
                body: "A[i] = 0;".to_string(),
            }],
            may_reads: UnionMap::read_from_str(&ctx, "{ }"),
            may_writes: UnionMap::read_from_str(&ctx, "{ S0[i] -> A[i] }"),
            must_writes: UnionMap::read_from_str(&ctx, "{ S0[i] -> A[i] }"),
            schedule,
            original_text: String::new(),
        };
        assert!(scop.compute_dependences().is_empty());
    }
}

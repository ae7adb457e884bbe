//! Mock solver backends for testing.
//!
//! Provide deterministic stand-ins for external NLP solvers that can be
//! used in any crate's test suite.

use std::time::Instant;

use nalgebra::DVector;
use stride_core::config::NlpSolver;
use stride_core::error::{Result, SolverError};
use stride_nlp::backend::report;
use stride_nlp::{Problem, SolveReport, SolverBackend};

// ---------------------------------------------------------------------------
// ScriptedBackend
// ---------------------------------------------------------------------------

/// A backend that records a fixed list of iterates, then stops.
///
/// Each iterate is the initial guess plus the scripted offset, so scripts
/// stay valid for any problem of matching size.
pub struct ScriptedBackend {
    kind: NlpSolver,
    offsets: Vec<DVector<f64>>,
}

impl ScriptedBackend {
    /// Serve `kind` by replaying `offsets` added to the initial guess.
    pub const fn new(kind: NlpSolver, offsets: Vec<DVector<f64>>) -> Self {
        Self { kind, offsets }
    }

    /// Record the initial guess `count` times.
    pub fn repeating(kind: NlpSolver, count: usize, dim: usize) -> Self {
        Self::new(kind, vec![DVector::zeros(dim); count])
    }
}

impl SolverBackend for ScriptedBackend {
    fn kind(&self) -> NlpSolver {
        self.kind
    }

    fn solve(&self, problem: &mut Problem) -> Result<SolveReport> {
        let started = Instant::now();
        let seed = problem.current_values();
        let mut last = seed.clone();
        for offset in &self.offsets {
            if offset.len() != seed.len() {
                return Err(SolverError::Failed {
                    backend: self.name().to_owned(),
                    message: format!(
                        "scripted iterate has {} values, problem has {}",
                        offset.len(),
                        seed.len()
                    ),
                }
                .into());
            }
            last = &seed + offset;
            problem.record_iterate(last.clone())?;
        }
        problem.set_variables(&last)?;
        report(self.kind, problem, self.offsets.len(), started)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ScriptedBackend"
    }
}

// ---------------------------------------------------------------------------
// FailingBackend
// ---------------------------------------------------------------------------

/// A backend that always fails without recording anything.
pub struct FailingBackend {
    kind: NlpSolver,
}

impl FailingBackend {
    pub const fn new(kind: NlpSolver) -> Self {
        Self { kind }
    }
}

impl SolverBackend for FailingBackend {
    fn kind(&self) -> NlpSolver {
        self.kind
    }

    fn solve(&self, _problem: &mut Problem) -> Result<SolveReport> {
        Err(SolverError::Infeasible {
            backend: self.name().to_owned(),
        }
        .into())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "FailingBackend"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

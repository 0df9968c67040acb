//! Conic problem stuffing for Clarabel
//!
//! Three formulations, all deterministic interior-point solves:
//!
//! - efficient-risk: `max mu'w` s.t. `1'w = 1`, `lower <= w <= upper`,
//!   `||G w|| <= sigma_target` where `G'G = Sigma` (second-order cone).
//! - max-Sharpe: the standard homogenization `min y'Sigma y` s.t.
//!   `(mu - rf)'y = 1`, `lower * 1'y <= y_i <= upper * 1'y`, `y >= 0`;
//!   the portfolio is `w = y / 1'y`.
//! - min-variance: `min w'Sigma w` under the budget and bound rows only.
//!
//! Matrices are handed to Clarabel in CSC form, entries within a column
//! ordered by row.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
    SupportedConeT::{self, NonnegativeConeT, SecondOrderConeT, ZeroConeT},
};
use ndarray::{Array1, Array2};

use meridian_core::bounds::AllocationBounds;

use crate::OptimizerError;

/// Entries smaller than this are dropped while stuffing sparse columns.
const SPARSE_EPS: f64 = 1e-12;

/// Outcome of one conic solve.
#[derive(Debug, Clone)]
pub(crate) enum SolveOutcome {
    /// Optimal (or almost-optimal) primal solution
    Optimal(Vec<f64>),
    /// The problem is certified infeasible or unbounded
    Infeasible,
    /// The solver ran out of iterations or lost numerical traction
    Stalled,
}

/// Solve tolerances; `relaxed` is the one-shot retry profile used when the
/// strict profile stalls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tolerance {
    gap: f64,
    feas: f64,
}

impl Tolerance {
    pub(crate) const STRICT: Self = Self {
        gap: 1e-8,
        feas: 1e-8,
    };
    pub(crate) const RELAXED: Self = Self {
        gap: 1e-6,
        feas: 1e-6,
    };
}

/// A stuffed conic problem ready for the solver.
#[derive(Debug)]
pub(crate) struct ConicProblem {
    p: CscMatrix<f64>,
    q: Vec<f64>,
    a: CscMatrix<f64>,
    b: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

impl ConicProblem {
    /// Run Clarabel on this problem at the given tolerance.
    pub(crate) fn solve(&self, tol: Tolerance) -> Result<SolveOutcome, OptimizerError> {
        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(200)
            .tol_gap_abs(tol.gap)
            .tol_gap_rel(tol.gap)
            .tol_feas(tol.feas)
            .build()
            .map_err(|e| OptimizerError::Solver(format!("settings: {e}")))?;

        let mut solver =
            DefaultSolver::new(&self.p, &self.q, &self.a, &self.b, &self.cones, settings);
        solver.solve();

        Ok(match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                SolveOutcome::Optimal(solver.solution.x.clone())
            }
            SolverStatus::PrimalInfeasible
            | SolverStatus::AlmostPrimalInfeasible
            | SolverStatus::DualInfeasible
            | SolverStatus::AlmostDualInfeasible => SolveOutcome::Infeasible,
            _ => SolveOutcome::Stalled,
        })
    }

    /// Strict solve with one relaxed retry when the solver stalls.
    pub(crate) fn solve_with_retry(&self) -> Result<SolveOutcome, OptimizerError> {
        match self.solve(Tolerance::STRICT)? {
            SolveOutcome::Stalled => self.solve(Tolerance::RELAXED),
            outcome => Ok(outcome),
        }
    }
}

/// Column-by-column CSC accumulator. Rows must be pushed ascending within
/// each column; near-zero values are dropped.
struct CscBuilder {
    rows: usize,
    cols: usize,
    colptr: Vec<usize>,
    rowval: Vec<usize>,
    nzval: Vec<f64>,
}

impl CscBuilder {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            colptr: vec![0],
            rowval: Vec::new(),
            nzval: Vec::new(),
        }
    }

    fn push(&mut self, row: usize, value: f64) {
        debug_assert!(row < self.rows);
        if value.abs() > SPARSE_EPS {
            self.rowval.push(row);
            self.nzval.push(value);
        }
    }

    fn end_column(&mut self) {
        self.colptr.push(self.rowval.len());
    }

    fn finish(self) -> CscMatrix<f64> {
        debug_assert_eq!(self.colptr.len(), self.cols + 1);
        CscMatrix::new(self.rows, self.cols, self.colptr, self.rowval, self.nzval)
    }
}

/// Dense symmetric matrix into CSC, as the quadratic cost term.
fn quadratic_cost(sigma: &Array2<f64>) -> CscMatrix<f64> {
    let n = sigma.nrows();
    let mut builder = CscBuilder::new(n, n);
    for j in 0..n {
        for i in 0..n {
            builder.push(i, sigma[[i, j]]);
        }
        builder.end_column();
    }
    builder.finish()
}

/// `max mu'w` with budget, bounds, and the volatility cap as an SOC.
///
/// Row layout: budget (zero cone), `w >= lower` and `w <= upper`
/// (nonnegative cone, `2n` rows), then an `n + 1` second-order cone whose
/// head is the target volatility and tail is `G w`.
pub(crate) fn efficient_risk_problem(
    mu: &Array1<f64>,
    sigma_sqrt: &Array2<f64>,
    bounds: AllocationBounds,
    target_volatility: f64,
) -> ConicProblem {
    let n = mu.len();
    let n_rows = 1 + 2 * n + (n + 1);

    let mut a = CscBuilder::new(n_rows, n);
    for j in 0..n {
        a.push(0, 1.0); // budget
        a.push(1 + j, -1.0); // -w_j <= -lower
        a.push(1 + n + j, 1.0); // w_j <= upper
        for i in 0..n {
            // SOC tail: s = -(A x) = G w
            a.push(2 * n + 2 + i, -sigma_sqrt[[i, j]]);
        }
        a.end_column();
    }

    let mut b = vec![1.0];
    b.extend(std::iter::repeat_n(-bounds.lower, n));
    b.extend(std::iter::repeat_n(bounds.upper, n));
    b.push(target_volatility); // SOC head
    b.extend(std::iter::repeat_n(0.0, n));

    ConicProblem {
        p: CscMatrix::zeros((n, n)),
        q: mu.iter().map(|m| -m).collect(),
        a: a.finish(),
        b,
        cones: vec![
            ZeroConeT(1),
            NonnegativeConeT(2 * n),
            SecondOrderConeT(n + 1),
        ],
    }
}

/// Homogenized max-Sharpe: `min y'Sigma y` s.t. `(mu - rf)'y = 1` with the
/// bound rows rescaled by the (unknown) total `1'y`.
///
/// Requires at least one positive excess return; callers check this and
/// route to min-variance otherwise.
pub(crate) fn max_sharpe_problem(
    mu: &Array1<f64>,
    sigma: &Array2<f64>,
    risk_free_rate: f64,
    bounds: AllocationBounds,
) -> ConicProblem {
    let n = mu.len();
    let n_rows = 1 + 3 * n;

    let mut a = CscBuilder::new(n_rows, n);
    for j in 0..n {
        a.push(0, mu[j] - risk_free_rate);
        for i in 0..n {
            // lower * 1'y - y_i <= 0
            let coeff = bounds.lower - if i == j { 1.0 } else { 0.0 };
            a.push(1 + i, coeff);
        }
        for i in 0..n {
            // y_i - upper * 1'y <= 0
            let coeff = if i == j { 1.0 } else { 0.0 } - bounds.upper;
            a.push(1 + n + i, coeff);
        }
        a.push(1 + 2 * n + j, -1.0); // y_j >= 0
        a.end_column();
    }

    let mut b = vec![1.0];
    b.extend(std::iter::repeat_n(0.0, 3 * n));

    ConicProblem {
        p: quadratic_cost(sigma),
        q: vec![0.0; n],
        a: a.finish(),
        b,
        cones: vec![ZeroConeT(1), NonnegativeConeT(3 * n)],
    }
}

/// `min w'Sigma w` under budget and bounds only.
pub(crate) fn min_variance_problem(
    sigma: &Array2<f64>,
    bounds: AllocationBounds,
) -> ConicProblem {
    let n = sigma.nrows();
    let n_rows = 1 + 2 * n;

    let mut a = CscBuilder::new(n_rows, n);
    for j in 0..n {
        a.push(0, 1.0);
        a.push(1 + j, -1.0);
        a.push(1 + n + j, 1.0);
        a.end_column();
    }

    let mut b = vec![1.0];
    b.extend(std::iter::repeat_n(-bounds.lower, n));
    b.extend(std::iter::repeat_n(bounds.upper, n));

    ConicProblem {
        p: quadratic_cost(sigma),
        q: vec![0.0; n],
        a: a.finish(),
        b,
        cones: vec![ZeroConeT(1), NonnegativeConeT(2 * n)],
    }
}

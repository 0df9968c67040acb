//! Symmetric-matrix numerics
//!
//! Covariance matrices produced by shrinkage can lose positive
//! semi-definiteness to floating-point error, and the optimizer needs a
//! factor `G` with `G'G = Σ` to express the variance cap as a second-order
//! cone. Both are served here by a Jacobi eigendecomposition, which is
//! robust and dependency-free at the matrix sizes an allocation universe
//! reaches.

use ndarray::{Array1, Array2};
use thiserror::Error;

/// Errors raised by the symmetric-matrix routines
#[derive(Debug, Error, PartialEq)]
pub enum LinalgError {
    /// Input matrix is not square
    #[error("Matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Input matrix is not symmetric within tolerance
    #[error("Matrix is not symmetric at ({row}, {col})")]
    NotSymmetric {
        /// Row of the offending entry
        row: usize,
        /// Column of the offending entry
        col: usize,
    },
}

/// Eigenvalues (descending) and matching eigenvector columns of a
/// symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues, sorted descending
    pub values: Array1<f64>,
    /// Eigenvectors; column `k` pairs with `values[k]`
    pub vectors: Array2<f64>,
}

const JACOBI_SWEEPS: usize = 100;
const JACOBI_TOL: f64 = 1e-12;
const SYMMETRY_TOL: f64 = 1e-8;

fn check_symmetric(matrix: &Array2<f64>) -> Result<(), LinalgError> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(LinalgError::NotSquare {
            rows: n,
            cols: matrix.ncols(),
        });
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[[i, j]] - matrix[[j, i]]).abs() > SYMMETRY_TOL {
                return Err(LinalgError::NotSymmetric { row: i, col: j });
            }
        }
    }
    Ok(())
}

/// Jacobi eigendecomposition of a symmetric matrix.
///
/// Rotates away the largest off-diagonal entry until all are below
/// tolerance. Convergence is quadratic; matrices that reach the sweep cap
/// simply return the best diagonalization found so far.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<SymmetricEigen, LinalgError> {
    check_symmetric(matrix)?;
    let n = matrix.nrows();

    let mut work = matrix.clone();
    let mut vectors = Array2::<f64>::eye(n);

    for _ in 0..JACOBI_SWEEPS * n * n {
        let Some((p, q)) = pivot(&work) else { break };
        if work[[p, q]].abs() < JACOBI_TOL {
            break;
        }
        let (c, s) = rotation(work[[p, p]], work[[q, q]], work[[p, q]]);
        rotate(&mut work, &mut vectors, p, q, c, s);
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        work[[j, j]]
            .partial_cmp(&work[[i, i]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let values = Array1::from_iter(order.iter().map(|&i| work[[i, i]]));
    let mut sorted_vectors = Array2::<f64>::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        sorted_vectors.column_mut(dst).assign(&vectors.column(src));
    }

    Ok(SymmetricEigen {
        values,
        vectors: sorted_vectors,
    })
}

/// Index of the largest off-diagonal entry, or `None` for a 1x1 matrix.
fn pivot(matrix: &Array2<f64>) -> Option<(usize, usize)> {
    let n = matrix.nrows();
    let mut best: Option<(usize, usize)> = None;
    let mut best_abs = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let abs = matrix[[i, j]].abs();
            if abs >= best_abs {
                best_abs = abs;
                best = Some((i, j));
            }
        }
    }
    best
}

/// (cos, sin) of the Jacobi rotation annihilating entry (p, q).
fn rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    if apq.abs() < 1e-15 {
        return (1.0, 0.0);
    }
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + (1.0 + tau * tau).sqrt())
    } else {
        -1.0 / (-tau + (1.0 + tau * tau).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    (c, t * c)
}

fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize, c: f64, s: f64) {
    let n = a.nrows();
    let (app, aqq, apq) = (a[[p, p]], a[[q, q]], a[[p, q]]);

    a[[p, p]] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[[q, q]] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i == p || i == q {
            continue;
        }
        let (aip, aiq) = (a[[i, p]], a[[i, q]]);
        a[[i, p]] = c * aip - s * aiq;
        a[[p, i]] = a[[i, p]];
        a[[i, q]] = s * aip + c * aiq;
        a[[q, i]] = a[[i, q]];
    }

    for i in 0..n {
        let (vip, viq) = (v[[i, p]], v[[i, q]]);
        v[[i, p]] = c * vip - s * viq;
        v[[i, q]] = s * vip + c * viq;
    }
}

/// Rebuild `V * diag(values) * V'`.
fn reconstruct(values: &Array1<f64>, vectors: &Array2<f64>) -> Array2<f64> {
    let n = values.len();
    let mut scaled = vectors.clone();
    for (k, mut column) in scaled.columns_mut().into_iter().enumerate() {
        column.mapv_inplace(|x| x * values[k]);
    }
    let mut result = scaled.dot(&vectors.t());
    // Force exact symmetry after the round trip
    for i in 0..n {
        for j in (i + 1)..n {
            let avg = 0.5 * (result[[i, j]] + result[[j, i]]);
            result[[i, j]] = avg;
            result[[j, i]] = avg;
        }
    }
    result
}

/// Clip negative eigenvalues to zero, returning the repaired matrix and
/// whether any clipping was needed.
pub fn clip_to_psd(matrix: &Array2<f64>) -> Result<(Array2<f64>, bool), LinalgError> {
    let eigen = symmetric_eigen(matrix)?;
    if eigen.values.iter().all(|&v| v >= 0.0) {
        return Ok((matrix.clone(), false));
    }
    let clipped = eigen.values.mapv(|v| v.max(0.0));
    Ok((reconstruct(&clipped, &eigen.vectors), true))
}

/// Symmetric square root `G` of a PSD matrix, with `G'G = Σ`.
///
/// Slightly negative eigenvalues from floating-point noise are treated as
/// zero rather than rejected.
pub fn sqrt_psd(matrix: &Array2<f64>) -> Result<Array2<f64>, LinalgError> {
    let eigen = symmetric_eigen(matrix)?;
    let roots = eigen.values.mapv(|v| v.max(0.0).sqrt());
    Ok(reconstruct(&roots, &eigen.vectors))
}

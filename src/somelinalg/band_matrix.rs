//! Dense storage of banded systems. Implicit time steps assemble one
//! tridiagonal matrix per row, so only the tridiagonal case is needed.
use nalgebra::{DMatrix, DVector};

/// Builds the n x n matrix with `sub` below, `diag` on and `sup` above the
/// diagonal. Row k takes `sub[k]` at column k-1 and `sup[k]` at column k+1, so
/// `sub[0]` and `sup[n-1]` fall outside the matrix and are ignored.
pub fn tridiagonal(sub: &DVector<f64>, diag: &DVector<f64>, sup: &DVector<f64>) -> DMatrix<f64> {
    let n = diag.len();
    let mut A = DMatrix::zeros(n, n);
    for k in 0..n {
        A[(k, k)] = diag[k];
        if k > 0 {
            A[(k, k - 1)] = sub[k];
        }
        if k + 1 < n {
            A[(k, k + 1)] = sup[k];
        }
    }
    A
}

/// (number of subdiagonals, number of superdiagonals) holding nonzero entries
pub fn bandwidth(A: &DMatrix<f64>) -> (usize, usize) {
    let mut kl = 0;
    let mut ku = 0;
    for ((i, j), value) in A
        .iter()
        .enumerate()
        .map(|(idx, v)| ((idx % A.nrows(), idx / A.nrows()), v))
    {
        if *value == 0.0 {
            continue;
        }
        if i > j {
            kl = kl.max(i - j);
        } else {
            ku = ku.max(j - i);
        }
    }
    (kl, ku)
}

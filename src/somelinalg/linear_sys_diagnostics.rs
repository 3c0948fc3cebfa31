use log::warn;
use nalgebra::DMatrix;

/// Index of the first zero entry on the diagonal. Every fixed-point sweep divides
/// by `A_ii`, so such a matrix cannot be iterated at all.
pub fn zero_pivot(A: &DMatrix<f64>) -> Option<usize> {
    let n = A.nrows().min(A.ncols());
    (0..n).find(|&i| A[(i, i)] == 0.0)
}

/// Strict row diagonal dominance: |A_ii| > sum_{j != i} |A_ij| for every row.
/// Sufficient (not necessary) for Jacobi and Gauss-Seidel to converge.
pub fn is_diagonally_dominant(A: &DMatrix<f64>) -> bool {
    for (i, row) in A.row_iter().enumerate() {
        let diagonal = row[i].abs();
        let off_diagonal: f64 = row
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, a)| a.abs())
            .sum();
        if diagonal <= off_diagonal {
            warn!(
                "row {} is not diagonally dominant: |a_ii| = {:.6} <= {:.6}",
                i, diagonal, off_diagonal
            );
            return false;
        }
    }
    true
}

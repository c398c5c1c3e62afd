//! Row-block matrix multiplication.
//!
//! The root owns `A` and `B` (both `n x n`, row-major). Rows of `A` are
//! scattered in contiguous blocks, `B` is broadcast, every rank multiplies its
//! block and the result rows are gathered back at the root. Blocks follow the
//! same split as the parallel sum, so `n` need not divide evenly.

use crate::error::{Error, Result};
use crate::sum::Block;
use rand::Rng;
use std::fmt::Write as _;

/// Default matrix dimension.
pub const DEFAULT_DIMENSION: usize = 800;

/// Largest dimension whose element count still fits the `i32` counts and
/// displacements MPI takes.
pub const MAX_DIMENSION: usize = 46_340;

/// Rows and columns shown by [`Matrix::preview`].
pub const PREVIEW: usize = 5;

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap row-major `data` of shape `rows x cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidCount(data.len() as i64));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Matrix with entries drawn uniformly from `[0, 10)`.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let data = (0..rows * cols).map(|_| rng.gen::<f64>() * 10.0).collect();
        Matrix { rows, cols, data }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Row-major entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Full product `self * other`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::InvalidCount(other.rows as i64));
        }
        let data = multiply_rows(&self.data, &other.data, self.cols, other.cols);
        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    /// Entry `(i, j)` of `self * other`, computed directly.
    pub fn product_entry(&self, other: &Matrix, i: usize, j: usize) -> f64 {
        (0..self.cols)
            .map(|k| self.get(i, k) * other.get(k, j))
            .sum()
    }

    /// Top-left corner, at most [`PREVIEW`] rows and columns, with `...`
    /// marking what was cut.
    pub fn preview(&self) -> String {
        let mut out = String::new();
        for i in 0..self.rows.min(PREVIEW) {
            for j in 0..self.cols.min(PREVIEW) {
                let _ = write!(out, "{:6.2} ", self.get(i, j));
            }
            if self.cols > PREVIEW {
                out.push_str("...");
            }
            out.push('\n');
        }
        if self.rows > PREVIEW {
            out.push_str("...\n");
        }
        out
    }
}

/// Multiply a block of rows `a` (each `inner` wide) by the row-major
/// `inner x cols` matrix `b`.
pub fn multiply_rows(a: &[f64], b: &[f64], inner: usize, cols: usize) -> Vec<f64> {
    if inner == 0 {
        return Vec::new();
    }
    let rows = a.len() / inner;
    let mut c = vec![0.0; rows * cols];
    for (a_row, c_row) in a.chunks_exact(inner).zip(c.chunks_exact_mut(cols.max(1))) {
        // i-k-j order walks `b` row by row
        for (&a_ik, b_row) in a_row.iter().zip(b.chunks_exact(cols.max(1))) {
            for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ik * b_kj;
            }
        }
    }
    c
}

/// Element counts and displacements of each rank's row block, in the form
/// `scatterv`/`gatherv` take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    /// Elements owned by each rank.
    pub counts: Vec<i32>,
    /// Offset of each rank's first element.
    pub displs: Vec<i32>,
}

impl RowLayout {
    /// Split the rows of an `n x n` matrix across `size` ranks.
    pub fn new(n: usize, size: i32) -> Result<Self> {
        check_dimension(n)?;
        let mut counts = Vec::with_capacity(size.max(0) as usize);
        let mut displs = Vec::with_capacity(size.max(0) as usize);
        for rank in 0..size {
            let block = Block::for_rank(n as u64, rank, size)?;
            counts.push((block.len() as usize * n) as i32);
            displs.push(((block.first - 1) as usize * n) as i32);
        }
        if counts.is_empty() {
            return Err(Error::InvalidCount(i64::from(size)));
        }
        Ok(RowLayout { counts, displs })
    }

    /// Number of rows owned by `rank`.
    pub fn rows_of(&self, rank: i32, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.counts[rank as usize] as usize / n
    }
}

/// Parse the optional matrix dimension given on the command line.
pub fn parse_dimension(arg: Option<&str>) -> Result<usize> {
    let n = match arg {
        None => return Ok(DEFAULT_DIMENSION),
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            Error::Config(format!("matrix dimension is not a non-negative integer: {raw:?}"))
        })?,
    };
    check_dimension(n)?;
    Ok(n)
}

fn check_dimension(n: usize) -> Result<()> {
    if n == 0 || n > MAX_DIMENSION {
        return Err(Error::Config(format!(
            "matrix dimension must be in 1..={MAX_DIMENSION}, got {n}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity(n: usize) -> Matrix {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Matrix::from_vec(n, n, data).unwrap()
    }

    #[test]
    fn small_product() {
        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
        let c = a.multiply(&b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
        assert_eq!(c.get(1, 0), a.product_entry(&b, 1, 0));
    }

    #[test]
    fn identity_leaves_matrix_unchanged() {
        let a = Matrix::random(6, 6, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.multiply(&identity(6)).unwrap(), a);
        assert_eq!(identity(6).multiply(&a).unwrap(), a);
    }

    #[test]
    fn block_products_match_full_product() {
        let n = 7;
        let a = Matrix::random(n, n, &mut StdRng::seed_from_u64(1));
        let b = Matrix::random(n, n, &mut StdRng::seed_from_u64(2));
        let full = a.multiply(&b).unwrap();

        let layout = RowLayout::new(n, 3).unwrap();
        let mut gathered = Vec::new();
        for (&count, &displ) in layout.counts.iter().zip(&layout.displs) {
            let rows = &a.as_slice()[displ as usize..(displ + count) as usize];
            gathered.extend(multiply_rows(rows, b.as_slice(), n, n));
        }
        assert_eq!(gathered, full.as_slice());
    }

    #[test]
    fn layout_spreads_remainder_rows() {
        let layout = RowLayout::new(10, 4).unwrap();
        assert_eq!(layout.counts, vec![30, 30, 20, 20]);
        assert_eq!(layout.displs, vec![0, 30, 60, 80]);
        assert_eq!(layout.rows_of(0, 10), 3);
        assert_eq!(layout.rows_of(3, 10), 2);
    }

    #[test]
    fn more_ranks_than_rows() {
        let layout = RowLayout::new(2, 4).unwrap();
        assert_eq!(layout.counts, vec![2, 2, 0, 0]);
        assert_eq!(multiply_rows(&[], &[1.0; 4], 2, 2), Vec::<f64>::new());
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        assert!(matches!(
            Matrix::from_vec(2, 3, vec![0.0; 5]),
            Err(Error::InvalidCount(5))
        ));
        let a = Matrix::from_vec(2, 3, vec![0.0; 6]).unwrap();
        assert!(a.multiply(&a).is_err());
    }

    #[test]
    fn parses_dimension() {
        assert_eq!(parse_dimension(None).unwrap(), DEFAULT_DIMENSION);
        assert_eq!(parse_dimension(Some("64")).unwrap(), 64);
        assert!(matches!(parse_dimension(Some("0")), Err(Error::Config(_))));
        assert!(matches!(parse_dimension(Some("46341")), Err(Error::Config(_))));
        assert!(matches!(parse_dimension(Some("big")), Err(Error::Config(_))));
    }

    #[test]
    fn largest_dimension_fits_mpi_counts() {
        assert!(MAX_DIMENSION * MAX_DIMENSION <= i32::MAX as usize);
        assert!((MAX_DIMENSION + 1) * (MAX_DIMENSION + 1) > i32::MAX as usize);
    }

    #[test]
    fn preview_is_cut_to_corner() {
        let big = Matrix::from_vec(6, 6, vec![1.0; 36]).unwrap();
        let preview = big.preview();
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), PREVIEW + 1);
        assert_eq!(lines[0], "  1.00   1.00   1.00   1.00   1.00 ...");
        assert_eq!(lines[PREVIEW], "...");

        let small = Matrix::from_vec(1, 2, vec![2.5, 10.0]).unwrap();
        assert_eq!(small.preview(), "  2.50  10.00 \n");
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// A single-row matrix holding `values`.
    pub fn row(values: Vec<f64>) -> Matrix {
        Matrix {
            rows: 1,
            cols: values.len(),
            data: values,
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms are drawn from (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Shape: (rows, cols). `rows` is the fan-in; weights are stored as
    /// (inputs, outputs) so a row vector times the matrix is the layer output.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows.max(1) as f64).sqrt();
        let data = (0..rows * cols)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Matrix { rows, cols, data }
    }

    /// Same as `he` but scaled down by `gain`; used for the output layer so
    /// the initial residual stays close to zero.
    pub fn he_scaled<R: Rng + ?Sized>(rows: usize, cols: usize, gain: f64, rng: &mut R) -> Matrix {
        let mut m = Matrix::he(rows, cols, rng);
        m.scale(gain);
        m
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        res
    }

    /// Matrix product `self · rhs`.
    ///
    /// # Panics
    /// Panics when the inner dimensions differ.
    pub fn matmul(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.cols, rhs.rows, "matmul: {}x{} · {}x{}", self.rows, self.cols, rhs.rows, rhs.cols);
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k * rhs.cols..(k + 1) * rhs.cols];
                let out_row = &mut res.data[i * rhs.cols..(i + 1) * rhs.cols];
                for (o, b) in out_row.iter_mut().zip(rhs_row) {
                    *o += a * b;
                }
            }
        }
        res
    }

    /// Outer product of two row vectors: `aᵀ · b`.
    pub fn outer(a: &[f64], b: &[f64]) -> Matrix {
        let mut res = Matrix::zeros(a.len(), b.len());
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                res.data[i * b.len() + j] = x * y;
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn add_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs);
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }

    /// `self += factor * rhs`
    pub fn add_scaled(&mut self, rhs: &Matrix, factor: f64) {
        self.assert_same_shape(rhs);
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += factor * b;
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for x in &mut self.data {
            *x *= factor;
        }
    }

    /// Sum of squares of all elements.
    pub fn squared_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    fn assert_same_shape(&self, rhs: &Matrix) {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!(
                "Matrices are of incorrect sizes: {}x{} vs {}x{}",
                self.rows, self.cols, rhs.rows, rhs.cols
            )
        }
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_matmul_row_vector() {
        let x = Matrix::row(vec![1.0, 2.0]);
        let w = Matrix { rows: 2, cols: 3, data: vec![1.0, 0.0, 2.0, 0.0, 1.0, 3.0] };
        let y = x.matmul(&w);
        assert_eq!((y.rows, y.cols), (1, 3));
        assert_eq!(y.data, vec![1.0, 2.0, 8.0]);
    }

    #[test]
    fn test_transpose_swaps_indices() {
        let m = Matrix { rows: 2, cols: 3, data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0] };
        let t = m.transpose();
        assert_eq!((t.rows, t.cols), (3, 2));
        assert_eq!(t.get(2, 1), 6.0);
        assert_eq!(t.get(0, 1), 4.0);
    }

    #[test]
    fn test_outer_matches_matmul_of_column_and_row() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0];
        let expected = Matrix::row(a.to_vec()).transpose().matmul(&Matrix::row(b.to_vec()));
        assert_eq!(Matrix::outer(&a, &b), expected);
    }

    #[test]
    fn test_he_is_deterministic_for_seeded_rng() {
        let mut r1 = rand::rngs::StdRng::seed_from_u64(7);
        let mut r2 = rand::rngs::StdRng::seed_from_u64(7);
        assert_eq!(Matrix::he(4, 3, &mut r1), Matrix::he(4, 3, &mut r2));
    }

    #[test]
    #[should_panic]
    fn test_add_assign_rejects_shape_mismatch() {
        let mut a = Matrix::zeros(1, 2);
        a.add_assign(&Matrix::zeros(2, 1));
    }
}

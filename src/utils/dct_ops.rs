use rustdct::DctPlanner;
use transpose::transpose_inplace;

/// Orthonormal 2D DCT-II of a square, row-major matrix.
///
/// Output index `u * dimension + v` holds
/// `α(u)·α(v)·(2/N)·Σ x(i,j)·cos((2i+1)uπ/2N)·cos((2j+1)vπ/2N)`
/// where `α(0) = 1/√2` and `α(k) = 1` otherwise.
pub fn perform_dct(raw_values: &[f64]) -> Vec<f64> {
    let mut raw_values = raw_values.to_vec();

    let dimension = (raw_values.len() as f64).sqrt() as usize;
    assert!(
        dimension * dimension == raw_values.len(),
        "matrix is not square: {} values",
        raw_values.len()
    );

    //setup the DCT.....
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(dimension);

    //perform round 1 of the DCT (on rows, producing the v axis):
    raw_values.chunks_exact_mut(dimension).for_each(|row| {
        dct.process_dct2(row);
    });

    //now tranpose...
    let mut scratch = vec![0f64; dimension];
    transpose_inplace(&mut raw_values, &mut scratch, dimension, dimension);

    //perform round 2 of the DCT (on cols, producing the u axis):
    raw_values.chunks_exact_mut(dimension).for_each(|col| {
        dct.process_dct2(col);
    });

    //and tranpose back so that u indexes rows.
    transpose_inplace(&mut raw_values, &mut scratch, dimension, dimension);

    //rustdct's dct2 is unscaled, so apply the orthonormal weights here.
    let scale = 2.0 / dimension as f64;
    for (idx, val) in raw_values.iter_mut().enumerate() {
        let (u, v) = (idx / dimension, idx % dimension);
        *val *= scale * alpha(u) * alpha(v);
    }

    raw_values
}

fn alpha(k: usize) -> f64 {
    if k == 0 {
        std::f64::consts::FRAC_1_SQRT_2
    } else {
        1.0
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::perform_dct;

    //direct evaluation of the textbook formula, for checking the fast path.
    fn naive_dct(values: &[f64], dimension: usize, u: usize, v: usize) -> f64 {
        let n = dimension as f64;
        let mut sum = 0.0;
        for i in 0..dimension {
            for j in 0..dimension {
                let cos_i = (((2 * i + 1) * u) as f64 * std::f64::consts::PI / (2.0 * n)).cos();
                let cos_j = (((2 * j + 1) * v) as f64 * std::f64::consts::PI / (2.0 * n)).cos();
                sum += values[i * dimension + j] * cos_i * cos_j;
            }
        }
        let a_u = if u == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
        let a_v = if v == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
        sum * (2.0 / n) * a_u * a_v
    }

    #[test]
    fn test_matches_direct_formula() {
        let mut rng = StdRng::seed_from_u64(7);
        let dimension = 32;
        let values = (0..dimension * dimension)
            .map(|_| rng.gen_range(0..=255) as f64)
            .collect::<Vec<_>>();

        let fast = perform_dct(&values);

        for u in 0..8 {
            for v in 0..8 {
                let expected = naive_dct(&values, dimension, u, v);
                let actual = fast[u * dimension + v];
                assert!(
                    (expected - actual).abs() < 1e-6,
                    "coefficient ({}, {}): expected {}, got {}",
                    u,
                    v,
                    expected,
                    actual
                );
            }
        }
    }

    #[test]
    fn test_flat_matrix_only_has_dc() {
        let dimension = 32;
        let values = vec![100.0; dimension * dimension];
        let dct = perform_dct(&values);

        // (1/√2)² · 2/32 · 100 · 1024 = 3200
        assert!((dct[0] - 3200.0).abs() < 1e-6);
        assert!(dct.iter().skip(1).all(|c| c.abs() < 1e-6));
    }
}

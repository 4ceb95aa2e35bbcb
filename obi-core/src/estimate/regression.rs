/// Least-squares polynomial coefficients (constant term first) of degree
/// `degree` through the points `(xs[i], ys[i])`.
///
/// Solves the normal equations `A c = b` with
/// `A[j][l] = Σ x^(j+l)` and `b[j] = Σ y·x^j`. Returns `None` for a singular
/// system.
pub fn fit(degree: usize, xs: &[f64], ys: &[f64]) -> Option<Vec<f64>> {
	let size = degree + 1;
	let mut a = vec![vec![0.0; size]; size];
	let mut b = vec![0.0; size];

	for (x, y) in xs.iter().zip(ys) {
		let powers: Vec<f64> = (0..2 * size - 1).map(|p| x.powi(p as i32)).collect();
		for j in 0..size {
			for l in 0..size {
				a[j][l] += powers[j + l];
			}
			b[j] += y * powers[j];
		}
	}

	solve(a, b)
}

/// Value of the polynomial `coefficients` at `x`.
pub fn evaluate(coefficients: &[f64], x: f64) -> f64 {
	coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Fits a degree-`degree` polynomial to `ys` at `x = 0, 1, 2, ...` and returns
/// the fitted values at the same points.
///
/// With fewer than `degree + 1` points the degree drops to `len - 1` (an exact
/// interpolation). A singular system returns `ys` unchanged.
pub fn smooth(degree: usize, ys: &[f64]) -> Vec<f64> {
	if ys.is_empty() {
		return Vec::new();
	}
	let degree = degree.min(ys.len() - 1);
	let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
	match fit(degree, &xs, ys) {
		Some(coefficients) => xs.iter().map(|x| evaluate(&coefficients, *x)).collect(),
		None => ys.to_vec(),
	}
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
	let n = b.len();
	for col in 0..n {
		let pivot_row = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
		let pivot = a[pivot_row][col];
		if pivot == 0.0 || !pivot.is_finite() {
			return None;
		}
		a.swap(col, pivot_row);
		b.swap(col, pivot_row);

		for row in col + 1..n {
			let factor = a[row][col] / pivot;
			if factor == 0.0 {
				continue;
			}
			for k in col..n {
				a[row][k] -= factor * a[col][k];
			}
			b[row] -= factor * b[col];
		}
	}

	let mut x = vec![0.0; n];
	for row in (0..n).rev() {
		let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
		x[row] = (b[row] - tail) / a[row][row];
	}
	Some(x)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
		assert_eq!(actual.len(), expected.len());
		for (a, e) in actual.iter().zip(expected) {
			assert!((a - e).abs() < tolerance, "{actual:?} != {expected:?}");
		}
	}

	#[test]
	fn recovers_exact_quadratic() {
		let ys: Vec<f64> = (0..13).map(|i| 1.0 + 2.0 * i as f64 - 0.5 * (i * i) as f64).collect();
		let xs: Vec<f64> = (0..13).map(|i| i as f64).collect();
		let coefficients = fit(2, &xs, &ys).unwrap();
		assert_close(&coefficients, &[1.0, 2.0, -0.5], 1e-8);
		assert_close(&smooth(2, &ys), &ys, 1e-8);
	}

	#[test]
	fn higher_degree_reproduces_lower_degree_data() {
		let ys: Vec<f64> = (0..13).map(|i| 3.0 - (i as f64 - 6.0).powi(2)).collect();
		assert_close(&smooth(3, &ys), &ys, 1e-6);
	}

	#[test]
	fn least_squares_line_through_noisy_points() {
		let xs = [0.0, 1.0, 2.0, 3.0];
		let ys = [0.5, 0.5, 2.5, 2.5];
		let coefficients = fit(1, &xs, &ys).unwrap();
		assert_close(&coefficients, &[0.3, 0.8], 1e-9);
	}

	#[test]
	fn too_few_points_lower_the_degree() {
		let ys = [4.0, -1.0, 2.5];
		assert_close(&smooth(5, &ys), &ys, 1e-9);
		assert_eq!(smooth(4, &[7.0]), vec![7.0]);
		assert!(smooth(2, &[]).is_empty());
	}

	#[test]
	fn singular_system_is_reported() {
		// Two coefficients, one distinct x.
		assert!(fit(1, &[2.0, 2.0], &[1.0, 3.0]).is_none());
	}

	#[test]
	fn horner_evaluation() {
		assert_eq!(evaluate(&[1.0, 0.0, 2.0], 3.0), 19.0);
		assert_eq!(evaluate(&[], 3.0), 0.0);
	}
}

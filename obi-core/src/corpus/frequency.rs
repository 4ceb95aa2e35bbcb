/// Occurrence counts of one token, indexed by grade.
///
/// Index `0` holds the total across grades; indices `1..=G` hold the count
/// observed in documents of that grade.
///
/// # Invariants
/// - `v[0] == sum(v[1..])` after every mutation
/// - Counts never go below zero
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyVector {
	counts: Vec<u64>,
}

impl Default for FrequencyVector {
	fn default() -> Self {
		Self { counts: vec![0] }
	}
}

impl FrequencyVector {
	/// A zero-filled vector for grades `1..=grades`.
	pub fn zeros(grades: usize) -> Self {
		Self { counts: vec![0; grades + 1] }
	}

	/// Builds a vector from per-grade counts (`per_grade[0]` is grade 1).
	pub fn from_grades(per_grade: &[u64]) -> Self {
		let mut counts = Vec::with_capacity(per_grade.len() + 1);
		counts.push(per_grade.iter().sum());
		counts.extend_from_slice(per_grade);
		Self { counts }
	}

	/// Adds `n` occurrences at `grade` (>= 1), growing the vector if needed.
	pub fn add(&mut self, grade: usize, n: u64) {
		debug_assert!(grade >= 1, "grade 0 is the total slot");
		if grade >= self.counts.len() {
			self.counts.resize(grade + 1, 0);
		}
		self.counts[grade] += n;
		self.counts[0] += n;
	}

	/// Removes up to `n` occurrences at `grade`, stopping at zero.
	///
	/// Returns the number of occurrences actually removed.
	pub fn remove(&mut self, grade: usize, n: u64) -> u64 {
		let Some(count) = self.counts.get_mut(grade).filter(|_| grade >= 1) else {
			return 0;
		};
		let removed = n.min(*count);
		*count -= removed;
		self.counts[0] -= removed;
		removed
	}

	/// Element-wise sum with `other`, padding the shorter vector.
	pub fn merge(&mut self, other: &Self) {
		if other.counts.len() > self.counts.len() {
			self.counts.resize(other.counts.len(), 0);
		}
		for (count, extra) in self.counts.iter_mut().zip(&other.counts) {
			*count += extra;
		}
	}

	/// Pads missing trailing grades with zeros.
	pub fn pad(&mut self, grades: usize) {
		if self.counts.len() < grades + 1 {
			self.counts.resize(grades + 1, 0);
		}
	}

	/// Total across grades (`v[0]`).
	pub fn total(&self) -> u64 {
		self.counts[0]
	}

	/// Count at `grade`; grades past the end are zero.
	pub fn get(&self, grade: usize) -> u64 {
		self.counts.get(grade).copied().unwrap_or(0)
	}

	/// Highest grade slot held.
	pub fn grades(&self) -> usize {
		self.counts.len() - 1
	}

	/// Per-grade counts, grade 1 first.
	pub fn per_grade(&self) -> &[u64] {
		&self.counts[1..]
	}

	/// The full vector, total first.
	pub fn as_slice(&self) -> &[u64] {
		&self.counts
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_total(v: &FrequencyVector) {
		assert_eq!(v.total(), v.per_grade().iter().sum::<u64>());
	}

	#[test]
	fn add_grows_and_keeps_total() {
		let mut v = FrequencyVector::default();
		v.add(3, 2);
		v.add(1, 1);
		assert_eq!(v.as_slice(), &[3, 1, 0, 2]);
		assert_total(&v);
	}

	#[test]
	fn remove_saturates_at_zero() {
		let mut v = FrequencyVector::from_grades(&[2, 4]);
		assert_eq!(v.remove(2, 4), 4);
		assert_eq!(v.as_slice(), &[2, 2, 0]);
		assert_eq!(v.remove(1, 5), 2);
		assert_eq!(v.as_slice(), &[0, 0, 0]);
		assert_eq!(v.remove(7, 1), 0);
		assert_eq!(v.remove(0, 1), 0);
		assert_total(&v);
	}

	#[test]
	fn merge_pads_shorter_side() {
		let mut a = FrequencyVector::from_grades(&[1]);
		let b = FrequencyVector::from_grades(&[0, 2, 3]);
		a.merge(&b);
		assert_eq!(a.as_slice(), &[6, 1, 2, 3]);
		assert_total(&a);
	}

	#[test]
	fn pad_extends_with_zeros() {
		let mut v = FrequencyVector::from_grades(&[5]);
		v.pad(3);
		assert_eq!(v.as_slice(), &[5, 5, 0, 0]);
		assert_eq!(v.grades(), 3);
		assert_eq!(v.get(9), 0);
	}

	#[test]
	fn every_constructor_keeps_the_total_slot() {
		let vectors = [
			FrequencyVector::default(),
			FrequencyVector::zeros(0),
			FrequencyVector::from_grades(&[]),
		];
		for v in vectors {
			assert_eq!(v.as_slice(), &[0]);
			assert_eq!(v.total(), 0);
			assert_eq!(v.grades(), 0);
		}
	}
}

/*!
# Ripid: Model — ResultModel
*/

use super::{
	children::Children,
	releasegroup::ReleaseGroup,
};

#[derive(Debug, Clone, Default)]
/// # Result Model.
///
/// The root of the candidate tree (§4.5): a forest of releasegroups, plus
/// the per-stream match counts the FingerprintService reported alongside
/// them.
pub struct ResultModel {
	/// # Releasegroups, in ingestion order until [`ResultModel::sort`].
	releasegroups: Children<ReleaseGroup>,

	/// # Number of AcoustID results returned for each stream, indexed by
	/// stream index.
	results: Vec<usize>,
}

impl ResultModel {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	/// # Clear.
	pub fn clear(&mut self) {
		self.releasegroups.clear();
		self.results.clear();
	}

	#[must_use]
	/// # Releasegroups.
	pub const fn releasegroups(&self) -> &Children<ReleaseGroup> { &self.releasegroups }

	/// # Releasegroups, Mutably.
	pub fn releasegroups_mut(&mut self) -> &mut Children<ReleaseGroup> { &mut self.releasegroups }

	/// # Record a Stream's Result Count.
	pub fn set_result_count(&mut self, stream_index: usize, count: usize) {
		if self.results.len() <= stream_index { self.results.resize(stream_index + 1, 0); }
		self.results[stream_index] = count;
	}

	#[must_use]
	/// # Result Count for a Stream.
	pub fn result_count(&self, stream_index: usize) -> usize {
		self.results.get(stream_index).copied().unwrap_or(0)
	}

	/// # Sort.
	///
	/// Releasegroups ascending by distance, then each releasegroup's own
	/// releases per its own sort key, per §4.5.
	pub fn sort(&mut self) {
		self.releasegroups.sort_by_key(ReleaseGroup::distance);
		for rg in self.releasegroups.iter_mut() { rg.sort_releases(); }
	}

	/// # Merge.
	///
	/// Recursive union by identifier, all the way down the tree (§4.5,
	/// §8): releasegroups merge by ID, carrying over `other`'s distance
	/// when creating a new one; per-stream result counts take the larger
	/// of the two. Commutative and associative, so repeated merges from
	/// multiple AcoustID matches can be folded in any order.
	pub fn merge(&mut self, other: &Self) {
		for org in other.releasegroups.iter() {
			let idx = self.releasegroups.add_child_by_id(org.id(), || ReleaseGroup::new(org.id()).with_distance(org.distance()));
			self.releasegroups.find_child_mut(idx).expect("Just inserted above.").merge(org);
		}

		if self.results.len() < other.results.len() { self.results.resize(other.results.len(), 0); }
		for (i, &count) in other.results.iter().enumerate() {
			if count > self.results[i] { self.results[i] = count; }
		}
	}

	/// # Permute.
	///
	/// Reorders the per-stream matches of every release according to
	/// `permutation`, a caller-supplied 1-1 mapping from old stream index
	/// to new stream index. Used when input streams are reordered (e.g.
	/// after a track-order correction) without re-running the fingerprint
	/// lookup.
	pub fn permute(&mut self, permutation: &[usize]) {
		for rg in self.releasegroups.iter_mut() {
			for rel in rg.releases_mut().iter_mut() {
				for medium in rel.media_mut().iter_mut() {
					for rec in medium.recordings_mut().iter_mut() {
						for fp in rec.fingerprints_mut().iter_mut() {
							for s in fp.streams_mut().iter_mut() {
								if let Some(&mapped) = permutation.get(s.index) { s.index = mapped; }
							}
						}
					}
				}
			}
		}
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize) -> String {
		let mut out = String::new();
		for rg in self.releasegroups.iter() { out.push_str(&rg.dump(indent, 0)); }
		out
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_set_and_get_result_count() {
		let mut m = ResultModel::new();
		m.set_result_count(3, 7);
		assert_eq!(m.result_count(3), 7);
		assert_eq!(m.result_count(0), 0);
	}

	#[test]
	fn t_merge_unions_releasegroups_and_result_counts() {
		let mut a = ResultModel::new();
		a.set_result_count(0, 2);
		a.releasegroups_mut().add_child(ReleaseGroup::new("rg1").with_distance(0));

		let mut b = ResultModel::new();
		b.set_result_count(0, 5);
		b.set_result_count(1, 3);
		b.releasegroups_mut().add_child(ReleaseGroup::new("rg1").with_distance(0));
		b.releasegroups_mut().add_child(ReleaseGroup::new("rg2").with_distance(1));

		a.merge(&b);
		assert_eq!(a.releasegroups().len(), 2);
		assert_eq!(a.result_count(0), 5);
		assert_eq!(a.result_count(1), 3);
	}

	#[test]
	fn t_clear_empties_tree() {
		let mut m = ResultModel::new();
		m.set_result_count(0, 5);
		m.releasegroups_mut().add_child(ReleaseGroup::new("rg1"));
		m.clear();
		assert!(m.releasegroups().is_empty());
		assert_eq!(m.result_count(0), 0);
	}
}

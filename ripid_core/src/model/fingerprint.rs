/*!
# Ripid: Model — Fingerprint
*/

use super::{
	children::{
		Children,
		Identified,
	},
	stream::Stream,
};

#[derive(Debug, Clone)]
/// # Fingerprint.
///
/// A leaf of the candidate tree: one AcoustID result ID, with the set of
/// input streams that matched it and their per-match scores.
pub struct Fingerprint {
	/// # AcoustID result identifier.
	id: String,

	/// # Matching streams.
	streams: Children<Stream>,

	/// # Dummy flag.
	///
	/// Set by Reducer pass 2 (complete-release, §4.6.2) for a
	/// placeholder fingerprint attached to a track with no real match;
	/// carries the indices of every stream left unmatched anywhere in
	/// the release.
	dummy: bool,
}

impl Identified for Fingerprint {
	fn id(&self) -> &str { &self.id }
}

impl Fingerprint {
	#[must_use]
	/// # New.
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), streams: Children::new(), dummy: false }
	}

	#[must_use]
	/// # Dummy.
	///
	/// Builds a placeholder fingerprint carrying the given unmatched
	/// stream indices, each with a zero score.
	pub fn dummy(stream_indices: impl IntoIterator<Item = usize>) -> Self {
		let mut streams = Children::new();
		for idx in stream_indices { streams.add_child(Stream::new(idx, 0.0)); }
		Self { id: String::new(), streams, dummy: true }
	}

	#[must_use]
	/// # Is Dummy?
	pub const fn is_dummy(&self) -> bool { self.dummy }

	#[must_use]
	/// # Streams.
	pub const fn streams(&self) -> &Children<Stream> { &self.streams }

	/// # Streams, Mutably.
	pub fn streams_mut(&mut self) -> &mut Children<Stream> { &mut self.streams }

	/// # Add Stream Match.
	///
	/// If `index` is already present, keeps whichever score is higher
	/// (the per-leaf score-max rule used by [`Fingerprint::merge`]).
	pub fn add_stream(&mut self, index: usize, score: f64) {
		if let Some(existing) = self.streams.iter_mut().find(|s| s.index == index) {
			if score > existing.score { existing.score = score; }
		}
		else { self.streams.add_child(Stream::new(index, score)); }
	}

	/// # Merge.
	///
	/// Recursive union by identifier: folds `other`'s stream matches into
	/// `self`, keeping the higher score at any index present in both.
	pub fn merge(&mut self, other: &Self) {
		for s in other.streams.iter() { self.add_stream(s.index, s.score); }
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let streams: Vec<String> = self.streams.iter()
			.map(|s| format!("stream#{} ({:.3})", s.index, s.score))
			.collect();
		if self.dummy {
			format!("{pad}Fingerprint <dummy> [{}]", streams.join(", "))
		}
		else {
			format!("{pad}Fingerprint {} [{}]", self.id, streams.join(", "))
		}
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_add_stream_keeps_max_score() {
		let mut fp = Fingerprint::new("f1");
		fp.add_stream(0, 0.5);
		fp.add_stream(0, 0.9);
		fp.add_stream(0, 0.1);
		assert_eq!(fp.streams().len(), 1);
		assert!((fp.streams().find_child(0).unwrap().score - 0.9).abs() < f64::EPSILON);
	}

	#[test]
	fn t_merge_unions_streams() {
		let mut a = Fingerprint::new("f1");
		a.add_stream(0, 0.5);
		let mut b = Fingerprint::new("f1");
		b.add_stream(0, 0.9);
		b.add_stream(1, 0.3);
		a.merge(&b);
		assert_eq!(a.streams().len(), 2);
	}

	#[test]
	fn t_dummy_carries_unmatched_indices() {
		let fp = Fingerprint::dummy([2, 5]);
		assert!(fp.is_dummy());
		assert_eq!(fp.streams().len(), 2);
	}
}

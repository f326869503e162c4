/*!
# Ripid: Model — Recording
*/

use super::{
	children::{
		Children,
		Identified,
	},
	fingerprint::Fingerprint,
};

#[derive(Debug, Clone)]
/// # Recording.
///
/// A MusicBrainz recording as matched by one or more fingerprints. Sits
/// under a [`Medium`](super::Medium), one per matched track position.
pub struct Recording {
	/// # MusicBrainz recording ID.
	id: String,

	/// # One-based position on the parent medium; `0` until assigned.
	position_medium: usize,

	/// # One-based position of the track on the parent medium; `0` until
	/// assigned.
	position_track: usize,

	/// # Matching fingerprints.
	fingerprints: Children<Fingerprint>,
}

impl Identified for Recording {
	fn id(&self) -> &str { &self.id }
}

impl Recording {
	#[must_use]
	/// # New.
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), position_medium: 0, position_track: 0, fingerprints: Children::new() }
	}

	#[must_use]
	/// # With Position.
	pub const fn with_position(mut self, medium: usize, track: usize) -> Self {
		self.position_medium = medium;
		self.position_track = track;
		self
	}

	#[must_use]
	/// # Position (Medium, Track).
	pub const fn position(&self) -> (usize, usize) { (self.position_medium, self.position_track) }

	/// # Set Position.
	pub const fn set_position(&mut self, medium: usize, track: usize) {
		self.position_medium = medium;
		self.position_track = track;
	}

	#[must_use]
	/// # Fingerprints.
	pub const fn fingerprints(&self) -> &Children<Fingerprint> { &self.fingerprints }

	/// # Fingerprints, Mutably.
	pub fn fingerprints_mut(&mut self) -> &mut Children<Fingerprint> { &mut self.fingerprints }

	/// # Add Fingerprint (by ID).
	pub fn add_fingerprint(&mut self, id: &str, stream_index: usize, score: f64) {
		let idx = self.fingerprints.add_child_by_id(id, || Fingerprint::new(id));
		self.fingerprints.find_child_mut(idx)
			.expect("Just inserted above.")
			.add_stream(stream_index, score);
	}

	#[must_use]
	/// # Aggregate Score.
	///
	/// The highest score across every matching fingerprint's streams;
	/// used by [`Release`](super::Release)'s sort key (§4.5).
	pub fn score(&self) -> f64 {
		self.fingerprints.iter()
			.flat_map(|fp| fp.streams().iter())
			.map(|s| s.score)
			.fold(0.0_f64, f64::max)
	}

	#[must_use]
	/// # Stream Indices.
	///
	/// Every stream index matched anywhere on this recording.
	pub fn stream_indices(&self) -> Vec<usize> {
		self.fingerprints.iter().flat_map(|fp| fp.streams().iter().map(|s| s.index)).collect()
	}

	/// # Merge.
	pub fn merge(&mut self, other: &Self) {
		for fp in other.fingerprints.iter() {
			let idx = self.fingerprints.add_child_by_id(fp.id(), || Fingerprint::new(fp.id()));
			self.fingerprints.find_child_mut(idx).expect("Just inserted above.").merge(fp);
		}
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let mut out = format!("{pad}Recording {} (score={:.3})\n", self.id, self.score());
		for fp in self.fingerprints.iter() {
			out.push_str(&fp.dump(indent, level + 1));
			out.push('\n');
		}
		out
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_add_fingerprint_and_score() {
		let mut r = Recording::new("rec1");
		r.add_fingerprint("fp1", 0, 0.4);
		r.add_fingerprint("fp1", 1, 0.9);
		r.add_fingerprint("fp2", 2, 0.2);
		assert_eq!(r.fingerprints().len(), 2);
		assert!((r.score() - 0.9).abs() < f64::EPSILON);
	}

	#[test]
	fn t_stream_indices() {
		let mut r = Recording::new("rec1");
		r.add_fingerprint("fp1", 0, 0.4);
		r.add_fingerprint("fp2", 3, 0.2);
		let mut idx = r.stream_indices();
		idx.sort_unstable();
		assert_eq!(idx, vec![0, 3]);
	}
}

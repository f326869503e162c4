/*!
# Ripid: Model — Track
*/

use super::children::Children;

#[derive(Debug, Clone, Copy, PartialEq)]
/// # Checksum Evidence.
///
/// One candidate offset's worth of AccurateRip/EAC confidence for a track,
/// folded in by the [`Verifier`](crate::verifier) (§4.8).
pub struct ChecksumEvidence {
	/// # Candidate read offset this evidence was gathered at.
	pub offset: i32,

	/// # AccurateRip v1 confirmations at this offset.
	pub v1_count: u32,

	/// # AccurateRip v2 confirmations at this offset.
	pub v2_count: u32,

	/// # EAC confirmations at this offset.
	pub eac_count: u32,
}

impl ChecksumEvidence {
	#[must_use]
	/// # New.
	pub const fn new(offset: i32) -> Self {
		Self { offset, v1_count: 0, v2_count: 0, eac_count: 0 }
	}

	#[must_use]
	/// # AccurateRip Confidence.
	///
	/// The combined v1+v2 confirmation count used throughout §4.6/§4.7 as
	/// `min_confidence`.
	pub const fn ar_confidence(&self) -> u32 { self.v1_count + self.v2_count }
}



#[derive(Debug, Clone)]
/// # Track.
///
/// A disc-position's worth of verification evidence: which input streams
/// are candidates for this position, and what each candidate read offset's
/// AccurateRip/EAC confidence looks like.
pub struct Track {
	/// # One-based position on the parent disc.
	position: usize,

	/// # Candidate stream indices for this position.
	indices: Vec<usize>,

	/// # Per-offset checksum evidence.
	checksums: Children<ChecksumEvidence>,
}

impl Track {
	#[must_use]
	/// # New.
	pub const fn new(position: usize) -> Self {
		Self { position, indices: Vec::new(), checksums: Children::new() }
	}

	#[must_use]
	/// # Position.
	pub const fn position(&self) -> usize { self.position }

	#[must_use]
	/// # Candidate Stream Indices.
	pub fn indices(&self) -> &[usize] { &self.indices }

	/// # Add Candidate Stream Index.
	///
	/// No-op if `index` is already present.
	pub fn add_index(&mut self, index: usize) {
		if !self.indices.contains(&index) { self.indices.push(index); }
	}

	#[must_use]
	/// # Checksums.
	pub const fn checksums(&self) -> &Children<ChecksumEvidence> { &self.checksums }

	/// # Evidence at Offset (Creating if Absent).
	pub fn evidence_at_mut(&mut self, offset: i32) -> &mut ChecksumEvidence {
		if let Some(idx) = self.checksums.iter().position(|c| c.offset == offset) {
			self.checksums.find_child_mut(idx).expect("Index found above.")
		}
		else {
			let idx = self.checksums.add_child(ChecksumEvidence::new(offset));
			self.checksums.find_child_mut(idx).expect("Just inserted above.")
		}
	}

	#[must_use]
	/// # Confidence Max.
	///
	/// The highest AccurateRip (v1+v2) confidence across every evaluated
	/// offset.
	pub fn confidence_max(&self) -> u32 {
		self.checksums.iter().map(ChecksumEvidence::ar_confidence).max().unwrap_or(0)
	}

	#[must_use]
	/// # Confidence Total.
	pub fn confidence_total(&self) -> u32 {
		self.checksums.iter().map(ChecksumEvidence::ar_confidence).sum()
	}

	#[must_use]
	/// # EAC Confidence Max.
	pub fn eac_confidence_max(&self) -> u32 {
		self.checksums.iter().map(|c| c.eac_count).max().unwrap_or(0)
	}

	#[must_use]
	/// # EAC Confidence Total.
	pub fn eac_confidence_total(&self) -> u32 {
		self.checksums.iter().map(|c| c.eac_count).sum()
	}

	#[must_use]
	/// # Min Confidence.
	///
	/// Used by §4.6.7/§4.7 scoring: the best single offset's combined
	/// v1+v2 confidence. Named for the release-level aggregation, which
	/// takes the *minimum* of this across all tracks.
	pub fn min_confidence(&self) -> u32 { self.confidence_max() }

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		format!(
			"{pad}Track #{} streams={:?} confidence(max={}, total={}) eac(max={}, total={})",
			self.position, self.indices, self.confidence_max(), self.confidence_total(),
			self.eac_confidence_max(), self.eac_confidence_total(),
		)
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_evidence_at_mut_creates_once() {
		let mut t = Track::new(1);
		t.evidence_at_mut(0).v1_count = 3;
		t.evidence_at_mut(0).v2_count = 4;
		assert_eq!(t.checksums().len(), 1);
		assert_eq!(t.confidence_max(), 7);
	}

	#[test]
	fn t_confidence_max_picks_best_offset() {
		let mut t = Track::new(1);
		t.evidence_at_mut(0).v1_count = 1;
		t.evidence_at_mut(6).v1_count = 5;
		t.evidence_at_mut(6).v2_count = 2;
		assert_eq!(t.confidence_max(), 7);
		assert_eq!(t.confidence_total(), 1 + 7);
	}

	#[test]
	fn t_add_index_dedupes() {
		let mut t = Track::new(1);
		t.add_index(3);
		t.add_index(3);
		assert_eq!(t.indices(), &[3]);
	}
}

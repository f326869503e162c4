/*!
# Ripid: Model — Disc
*/

use super::{
	children::{
		Children,
		Identified,
	},
	track::Track,
};

#[derive(Debug, Clone)]
/// # Disc.
///
/// One candidate pressing of a [`Medium`](super::Medium): a MusicBrainz
/// disc ID, the union of candidate read offsets across its tracks, and the
/// per-position verification evidence gathered for it.
pub struct Disc {
	/// # MusicBrainz disc ID.
	id: String,

	/// # Per-position verification evidence.
	tracks: Children<Track>,

	/// # Union of every candidate offset across all tracks on this disc.
	///
	/// Empty means no known AccurateRip presence for this disc; the
	/// Verifier (§4.8) skips discs in that state.
	offsets: Vec<i32>,

	/// # Sector length of each track position on this disc's TOC, as
	/// derived from the disc ID's declared frame offsets.
	///
	/// Consulted by Reducer pass 3 (release-add-discs, §4.6.3) to decide
	/// whether a stream matching a recording at a given position actually
	/// fits this pressing; a stream whose own sector count neither equals
	/// the disc's declared length nor recurs elsewhere in the release
	/// disqualifies the whole disc.
	sector_lengths: Vec<(usize, u32)>,

	/// # Raw TOC track-start sectors (one-based, lead-in-relative, per
	/// §4.4/§6), used to derive the AccurateRip disc IDs this disc is
	/// queried under. Empty until ingestion populates it via
	/// [`Disc::set_toc`].
	toc_offsets: Vec<u32>,

	/// # TOC leadout sector, same coordinate system as `toc_offsets`.
	toc_leadout: u32,
}

impl Identified for Disc {
	fn id(&self) -> &str { &self.id }
}

impl Disc {
	#[must_use]
	/// # New.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			tracks: Children::new(),
			offsets: Vec::new(),
			sector_lengths: Vec::new(),
			toc_offsets: Vec::new(),
			toc_leadout: 0,
		}
	}

	#[must_use]
	/// # Tracks.
	pub const fn tracks(&self) -> &Children<Track> { &self.tracks }

	/// # Tracks, Mutably.
	pub fn tracks_mut(&mut self) -> &mut Children<Track> { &mut self.tracks }

	/// # Track at Position (Creating if Absent).
	pub fn track_at_mut(&mut self, position: usize) -> &mut Track {
		if let Some(idx) = self.tracks.iter().position(|t| t.position() == position) {
			self.tracks.find_child_mut(idx).expect("Index found above.")
		}
		else {
			let idx = self.tracks.add_child(Track::new(position));
			self.tracks.find_child_mut(idx).expect("Just inserted above.")
		}
	}

	#[must_use]
	/// # Offsets.
	pub fn offsets(&self) -> &[i32] { &self.offsets }

	/// # Add Offset.
	///
	/// No-op if already present; keeps the set pairwise-distinct per §8.
	pub fn add_offset(&mut self, offset: i32) {
		if !self.offsets.contains(&offset) { self.offsets.push(offset); }
	}

	/// # Set Sector Length for a Track Position.
	///
	/// Overwrites any previously-recorded length for `position`.
	pub fn set_sector_length(&mut self, position: usize, sectors: u32) {
		if let Some(entry) = self.sector_lengths.iter_mut().find(|(p, _)| *p == position) {
			entry.1 = sectors;
		}
		else { self.sector_lengths.push((position, sectors)); }
	}

	#[must_use]
	/// # Sector Length for a Track Position.
	///
	/// `None` if this disc's TOC carries no declared length for that
	/// position.
	pub fn sector_length(&self, position: usize) -> Option<u32> {
		self.sector_lengths.iter().find(|(p, _)| *p == position).map(|(_, s)| *s)
	}

	/// # Set TOC.
	///
	/// Records the raw track-start sectors and leadout sector the
	/// Verifier needs to derive this disc's AccurateRip IDs.
	pub fn set_toc(&mut self, offsets: Vec<u32>, leadout: u32) {
		self.toc_offsets = offsets;
		self.toc_leadout = leadout;
	}

	#[must_use]
	/// # TOC Track-Start Offsets.
	pub fn toc_offsets(&self) -> &[u32] { &self.toc_offsets }

	#[must_use]
	/// # TOC Leadout Sector.
	pub const fn toc_leadout(&self) -> u32 { self.toc_leadout }

	#[must_use]
	/// # Every Track has a Matching Checksum?
	///
	/// Used by Reducer pass 6 (prune-perfect-disc, §4.6.6).
	pub fn is_perfect(&self) -> bool {
		!self.tracks.is_empty() && self.tracks.iter().all(|t| t.confidence_max() > 0)
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let mut out = format!("{pad}Disc {} offsets={:?}\n", self.id, self.offsets);
		for t in self.tracks.iter() {
			out.push_str(&t.dump(indent, level + 1));
			out.push('\n');
		}
		out
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_add_offset_dedupes() {
		let mut d = Disc::new("disc1");
		d.add_offset(6);
		d.add_offset(6);
		d.add_offset(-6);
		assert_eq!(d.offsets().len(), 2);
	}

	#[test]
	fn t_is_perfect_requires_nonempty_and_all_matched() {
		let mut d = Disc::new("disc1");
		assert!(!d.is_perfect());
		d.track_at_mut(1).evidence_at_mut(0).v1_count = 1;
		assert!(d.is_perfect());
		d.track_at_mut(2);
		assert!(!d.is_perfect());
	}

	#[test]
	fn t_sector_length_overwrites() {
		let mut d = Disc::new("disc1");
		assert_eq!(d.sector_length(1), None);
		d.set_sector_length(1, 17_000);
		assert_eq!(d.sector_length(1), Some(17_000));
		d.set_sector_length(1, 17_050);
		assert_eq!(d.sector_length(1), Some(17_050));
		assert_eq!(d.sector_length(2), None);
	}

	#[test]
	fn t_set_toc_stores_offsets_and_leadout() {
		let mut d = Disc::new("disc1");
		assert!(d.toc_offsets().is_empty());
		d.set_toc(vec![150, 17_412], 45_000);
		assert_eq!(d.toc_offsets(), &[150, 17_412]);
		assert_eq!(d.toc_leadout(), 45_000);
	}
}

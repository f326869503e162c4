/*!
# Ripid: Model — Medium
*/

use super::{
	children::Children,
	disc::Disc,
	recording::Recording,
};

#[derive(Debug, Clone)]
/// # Medium.
///
/// One disc's worth of metadata-service recordings, plus the candidate
/// physical discs (pressings) the Mediator has found for it.
pub struct Medium {
	/// # One-based position on the parent release; `0` until assigned.
	position: usize,

	/// # MusicBrainz disc IDs attached to this medium by the metadata
	/// service (not yet promoted to full [`Disc`] candidates).
	discids: Vec<String>,

	/// # Candidate physical discs.
	discs: Children<Disc>,

	/// # Recordings, indexed by track position (base zero; a missing
	/// position is represented by its absence from the list, not a gap).
	recordings: Children<Recording>,

	/// # Track count declared by the metadata service, which may exceed
	/// `recordings.len()` before Reducer pass 2 fills gaps in.
	track_count: usize,

	/// # Format string as declared by the metadata service (e.g. `"CD"`,
	/// `"Vinyl"`, `"Digital Media"`); `None` when unknown, which is treated
	/// as CD for scoring purposes since that's the overwhelming common case
	/// and the only format this system can actually verify.
	format: Option<String>,
}

impl Medium {
	#[must_use]
	/// # New.
	pub fn new() -> Self {
		Self {
			position: 0,
			discids: Vec::new(),
			discs: Children::new(),
			recordings: Children::new(),
			track_count: 0,
			format: None,
		}
	}

	#[must_use]
	/// # With Position.
	pub const fn with_position(mut self, position: usize) -> Self { self.position = position; self }

	#[must_use]
	/// # With Track Count.
	pub const fn with_track_count(mut self, track_count: usize) -> Self {
		self.track_count = track_count;
		self
	}

	#[must_use]
	/// # With Format.
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.format = Some(format.into());
		self
	}

	#[must_use]
	/// # Position.
	pub const fn position(&self) -> usize { self.position }

	#[must_use]
	/// # Format.
	pub fn format(&self) -> Option<&str> { self.format.as_deref() }

	/// # Set Format.
	pub fn set_format(&mut self, format: impl Into<String>) { self.format = Some(format.into()); }

	#[must_use]
	/// # Is a CD?
	///
	/// True when the declared format is unknown or literally `"CD"`. Used
	/// by ConfigSearch (§4.7) and Reducer to skip non-CD media (scenario 3:
	/// a multi-medium release where one medium is e.g. a DVD).
	pub fn is_cd(&self) -> bool { self.format.as_deref().map_or(true, |f| f == "CD") }

	#[must_use]
	/// # Track Count.
	pub const fn track_count(&self) -> usize { self.track_count }

	/// # Set Track Count.
	pub const fn set_track_count(&mut self, track_count: usize) { self.track_count = track_count; }

	#[must_use]
	/// # Disc IDs.
	pub fn discids(&self) -> &[String] { &self.discids }

	/// # Add Disc ID.
	pub fn add_discid(&mut self, id: impl Into<String>) {
		let id = id.into();
		if !self.discids.contains(&id) { self.discids.push(id); }
	}

	#[must_use]
	/// # Discs.
	pub const fn discs(&self) -> &Children<Disc> { &self.discs }

	/// # Discs, Mutably.
	pub fn discs_mut(&mut self) -> &mut Children<Disc> { &mut self.discs }

	#[must_use]
	/// # Recordings.
	pub const fn recordings(&self) -> &Children<Recording> { &self.recordings }

	/// # Recordings, Mutably.
	pub fn recordings_mut(&mut self) -> &mut Children<Recording> { &mut self.recordings }

	/// # Sort Recordings By Position.
	///
	/// Per §4.5's sort-key contract.
	pub fn sort_recordings(&mut self) { self.recordings.sort_by_key(|r| r.position().1); }

	#[must_use]
	/// # Every Track has at Least One Matching Disc?
	///
	/// Used by Reducer pass 6 (prune-perfect-disc, §4.6.6).
	pub fn is_perfect(&self) -> bool { self.discs.iter().any(Disc::is_perfect) }

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let mut out = format!("{pad}Medium #{} ({} discid(s))\n", self.position, self.discids.len());
		for r in self.recordings.iter() {
			out.push_str(&r.dump(indent, level + 1));
			out.push('\n');
		}
		for d in self.discs.iter() {
			out.push_str(&d.dump(indent, level + 1));
			out.push('\n');
		}
		out
	}
}

impl Default for Medium {
	fn default() -> Self { Self::new() }
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::model::children::Identified;

	#[test]
	fn t_add_discid_dedupes() {
		let mut m = Medium::new();
		m.add_discid("abc");
		m.add_discid("abc");
		assert_eq!(m.discids().len(), 1);
	}

	#[test]
	fn t_sort_recordings_by_position() {
		let mut m = Medium::new();
		m.recordings_mut().add_child(Recording::new("r2").with_position(1, 2));
		m.recordings_mut().add_child(Recording::new("r1").with_position(1, 1));
		m.sort_recordings();
		assert_eq!(m.recordings().find_child(0).unwrap().id(), "r1");
	}
}

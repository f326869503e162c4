/*!
# Ripid: Model — Release
*/

use super::{
	children::{
		Children,
		Identified,
	},
	medium::Medium,
};

#[derive(Debug, Clone)]
/// # Release.
pub struct Release {
	/// # MusicBrainz release ID.
	id: String,

	/// # Media, in position order.
	media: Children<Medium>,

	/// # Releasegroup-relative Levenshtein/edit distance used for the
	/// outer sort key (§4.5); lower is better.
	distance: i64,

	/// # Total track count declared by the metadata service.
	track_count: usize,

	/// # Minimum AccurateRip confidence across every track on the best
	/// disc assignment; `0` until ConfigSearch scores it (§4.7).
	confidence_min: u32,

	/// # Sum of Levenshtein distances of (title, artist, album) against
	/// stream tags; used by Reducer pass 8 (§4.6.8).
	metadata_distance: u32,

	/// # Release title as reported by the metadata service, kept around
	/// so the output layer can render a `MISMATCH title: mb=…` line
	/// alongside [`Release::metadata_distance`].
	title: String,
}

impl Identified for Release {
	fn id(&self) -> &str { &self.id }
}

impl Release {
	#[must_use]
	/// # New.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			media: Children::new(),
			distance: 0,
			track_count: 0,
			confidence_min: 0,
			metadata_distance: 0,
			title: String::new(),
		}
	}

	#[must_use]
	/// # With Distance.
	pub const fn with_distance(mut self, distance: i64) -> Self { self.distance = distance; self }

	#[must_use]
	/// # With Track Count.
	pub const fn with_track_count(mut self, track_count: usize) -> Self {
		self.track_count = track_count;
		self
	}

	#[must_use]
	/// # Distance.
	pub const fn distance(&self) -> i64 { self.distance }

	#[must_use]
	/// # Track Count.
	pub const fn track_count(&self) -> usize { self.track_count }

	#[must_use]
	/// # Media.
	pub const fn media(&self) -> &Children<Medium> { &self.media }

	/// # Media, Mutably.
	pub fn media_mut(&mut self) -> &mut Children<Medium> { &mut self.media }

	/// # Medium at Position (Creating if Absent).
	pub fn medium_at_mut(&mut self, position: usize) -> &mut Medium {
		if let Some(idx) = self.media.iter().position(|m| m.position() == position) {
			self.media.find_child_mut(idx).expect("Index found above.")
		}
		else {
			let idx = self.media.add_child(Medium::new().with_position(position));
			self.media.find_child_mut(idx).expect("Just inserted above.")
		}
	}

	#[must_use]
	/// # Confidence Min.
	pub const fn confidence_min(&self) -> u32 { self.confidence_min }

	/// # Set Confidence Min.
	pub fn set_confidence_min(&mut self, v: u32) { self.confidence_min = v; }

	#[must_use]
	/// # Metadata Distance.
	pub const fn metadata_distance(&self) -> u32 { self.metadata_distance }

	/// # Set Metadata Distance.
	pub fn set_metadata_distance(&mut self, v: u32) { self.metadata_distance = v; }

	#[must_use]
	/// # Title.
	///
	/// The release title as reported by the metadata service; empty
	/// until [`Release::set_title`] is called.
	pub fn title(&self) -> &str { &self.title }

	/// # Set Title.
	pub fn set_title(&mut self, title: impl Into<String>) { self.title = title.into(); }

	#[must_use]
	/// # Represented Stream Indices.
	///
	/// Every stream index matched anywhere in this release's tree, used by
	/// Reducer pass 1 (filter-incomplete, §4.6.1).
	pub fn stream_indices(&self) -> std::collections::BTreeSet<usize> {
		self.media.iter()
			.flat_map(|m| m.recordings().iter())
			.flat_map(super::recording::Recording::stream_indices)
			.collect()
	}

	#[must_use]
	/// # Aggregate Score.
	///
	/// Max over every recording's score; used as the secondary sort key
	/// for releases within a releasegroup (§4.5).
	pub fn aggregate_score(&self) -> f64 {
		self.media.iter()
			.flat_map(|m| m.recordings().iter())
			.map(super::recording::Recording::score)
			.fold(0.0_f64, f64::max)
	}

	#[must_use]
	/// # Every Medium is "Perfect"?
	///
	/// Used by Reducer pass 6's releasegroup-wide step (§4.6.6).
	pub fn is_perfect(&self) -> bool {
		!self.media.is_empty() && self.media.iter().all(super::medium::Medium::is_perfect)
	}

	#[must_use]
	/// # Has Matching Discs?
	///
	/// Every stream-match on the release has at least one corresponding
	/// track with a matching checksum on some disc (§4.6.4).
	pub fn has_matching_discs(&self) -> bool {
		for medium in self.media.iter() {
			for recording in medium.recordings().iter() {
				let (_, track_pos) = recording.position();
				let matched = medium.discs().iter()
					.any(|d| d.tracks().iter().any(|t| t.position() == track_pos && t.confidence_max() > 0));
				if !matched { return false; }
			}
		}
		true
	}

	/// # Merge.
	pub fn merge(&mut self, other: &Self) {
		if self.title.is_empty() && !other.title.is_empty() { self.title.clone_from(&other.title); }

		for om in other.media.iter() {
			let idx = self.media.add_child_by_id_pos(om.position());
			let mine = self.media.find_child_mut(idx).expect("Just inserted above.");
			for r in om.recordings().iter() {
				let ridx = mine.recordings_mut().add_child_by_id(r.id(), || super::recording::Recording::new(r.id()).with_position(r.position().0, r.position().1));
				mine.recordings_mut().find_child_mut(ridx).expect("Just inserted above.").merge(r);
			}
			for discid in om.discids() { mine.add_discid(discid.clone()); }
		}
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let mut out = format!(
			"{pad}Release {} (distance={}, confidence_min={}, metadata_distance={})\n",
			self.id, self.distance, self.confidence_min, self.metadata_distance,
		);
		for m in self.media.iter() {
			out.push_str(&m.dump(indent, level + 1));
			out.push('\n');
		}
		out
	}
}



impl Children<Medium> {
	/// # Add Child By Position (Creating if Absent).
	///
	/// [`Medium`] is keyed by position rather than an external identifier,
	/// so it gets its own by-key helper instead of implementing
	/// [`Identified`] against a string that doesn't exist for it.
	fn add_child_by_id_pos(&mut self, position: usize) -> usize {
		if let Some(idx) = self.iter().position(|m| m.position() == position) { idx }
		else { self.add_child(Medium::new().with_position(position)) }
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::model::recording::Recording;

	#[test]
	fn t_stream_indices_collects_across_media() {
		let mut rel = Release::new("rel1");
		rel.medium_at_mut(1).recordings_mut().add_child(
			Recording::new("r1").with_position(1, 1).tap_add_fingerprint("fp1", 0, 0.5)
		);
		let idx = rel.stream_indices();
		assert!(idx.contains(&0));
	}

	#[test]
	fn t_has_matching_discs_false_when_no_checksum() {
		let mut rel = Release::new("rel1");
		rel.medium_at_mut(1).recordings_mut().add_child(Recording::new("r1").with_position(1, 1));
		assert!(!rel.has_matching_discs());
	}

	trait TapAddFingerprint { fn tap_add_fingerprint(self, id: &str, stream: usize, score: f64) -> Self; }
	impl TapAddFingerprint for Recording {
		fn tap_add_fingerprint(mut self, id: &str, stream: usize, score: f64) -> Self {
			self.add_fingerprint(id, stream, score);
			self
		}
	}
}

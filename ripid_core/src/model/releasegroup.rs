/*!
# Ripid: Model — ReleaseGroup
*/

use super::{
	children::{
		Children,
		Identified,
	},
	release::Release,
};

#[derive(Debug, Clone)]
/// # ReleaseGroup.
pub struct ReleaseGroup {
	/// # MusicBrainz releasegroup ID.
	id: String,

	/// # Candidate releases.
	releases: Children<Release>,

	/// # Distance from the query (AcoustID result's implied ranking);
	/// used as the outer sort key across releasegroups (§4.5).
	distance: i64,
}

impl Identified for ReleaseGroup {
	fn id(&self) -> &str { &self.id }
}

impl ReleaseGroup {
	#[must_use]
	/// # New.
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into(), releases: Children::new(), distance: 0 }
	}

	#[must_use]
	/// # With Distance.
	pub const fn with_distance(mut self, distance: i64) -> Self { self.distance = distance; self }

	#[must_use]
	/// # Distance.
	pub const fn distance(&self) -> i64 { self.distance }

	#[must_use]
	/// # Releases.
	pub const fn releases(&self) -> &Children<Release> { &self.releases }

	/// # Releases, Mutably.
	pub fn releases_mut(&mut self) -> &mut Children<Release> { &mut self.releases }

	/// # Sort Releases.
	///
	/// Ascending distance, then descending aggregate score, then ascending
	/// identifier, per §4.5.
	pub fn sort_releases(&mut self) {
		let mut scratch: Vec<Release> = std::mem::take(&mut self.releases).into_iter().collect();
		scratch.sort_by(|a, b| {
			a.distance().cmp(&b.distance())
				.then_with(|| b.aggregate_score().partial_cmp(&a.aggregate_score()).unwrap_or(std::cmp::Ordering::Equal))
				.then_with(|| a.id().cmp(b.id()))
		});
		for r in scratch { self.releases.add_child(r); }
	}

	/// # Merge.
	pub fn merge(&mut self, other: &Self) {
		for or in other.releases.iter() {
			let idx = self.releases.add_child_by_id(or.id(), || Release::new(or.id()).with_distance(or.distance()));
			self.releases.find_child_mut(idx).expect("Just inserted above.").merge(or);
		}
	}

	#[must_use]
	/// # Dump (Diagnostic).
	pub fn dump(&self, indent: usize, level: usize) -> String {
		let pad = " ".repeat(indent * level);
		let mut out = format!("{pad}ReleaseGroup {} (distance={})\n", self.id, self.distance);
		for r in self.releases.iter() {
			out.push_str(&r.dump(indent, level + 1));
			out.push('\n');
		}
		out
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_sort_releases_by_distance_then_id() {
		let mut rg = ReleaseGroup::new("rg1");
		rg.releases_mut().add_child(Release::new("b").with_distance(1));
		rg.releases_mut().add_child(Release::new("a").with_distance(1));
		rg.releases_mut().add_child(Release::new("c").with_distance(0));
		rg.sort_releases();
		let ids: Vec<&str> = rg.releases().iter().map(Identified::id).collect();
		assert_eq!(ids, vec!["c", "a", "b"]);
	}
}

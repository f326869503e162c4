/*!
# Ripid: Output

Renders the §6 diagnostic report — per-release identifiers, per-track
verification verdicts, and metadata `MISMATCH` lines — to stdout/stderr
via `fyi_msg::Msg`. This crate has no `log`/`tracing` dependency;
`fyi_msg` is the whole diagnostic channel.
*/

use crate::model::{
	Recording,
	ResultModel,
};
use fyi_msg::Msg;



/// # Metadata Field Mismatch.
///
/// One `MISMATCH <field>: mb=<x>; stream=<y>` line, per §6.
pub struct Mismatch<'a> {
	/// # Field name, e.g. `"title"`.
	pub field: &'a str,

	/// # Value the metadata service reported.
	pub mb: &'a str,

	/// # Value read from the stream's own tags.
	pub stream: &'a str,
}

impl std::fmt::Display for Mismatch<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "MISMATCH {}: mb={}; stream={}", self.field, self.mb, self.stream)
	}
}



/// # Render a Release Report.
///
/// Builds the plain-text block for one surviving release: its
/// identifier and confidence, then one line per medium/disc, then one
/// per track's verdict (`v1`, `v2`, `eac`, `max`, `total`). Returned as
/// a `String` rather than printed directly so callers (or tests) can
/// inspect it before emitting it.
#[must_use]
pub fn render_release(model: &ResultModel) -> String {
	let mut out = String::new();

	for rg in model.releasegroups().iter() {
		for rel in rg.releases().iter() {
			out.push_str(&format!(
				"Release {} (confidence_min={}, metadata_distance={})\n",
				crate::model::Identified::id(rel), rel.confidence_min(), rel.metadata_distance(),
			));
			out.push_str(&render_release_body(rel));
		}
	}

	out
}

/// # Render One Release's Body (Everything But the Header Line).
///
/// Split out from [`render_release`] so [`print_report`] can print the
/// header itself (colored, via [`fyi_msg::Msg`]) without the body
/// duplicating it.
fn render_release_body(rel: &crate::model::Release) -> String {
	let mut out = String::new();

	for medium in rel.media().iter() {
		for disc in medium.discs().iter() {
			out.push_str(&format!("  Disc {}\n", crate::model::Identified::id(disc)));
			for track in disc.tracks().iter() {
				out.push_str(&format!(
					"    Track #{:02}: v1={} v2={} eac={} max={} total={}\n",
					track.position(),
					track.checksums().iter().map(|c| c.v1_count).max().unwrap_or(0),
					track.checksums().iter().map(|c| c.v2_count).max().unwrap_or(0),
					track.eac_confidence_max(),
					track.confidence_max(),
					track.confidence_total(),
				));
			}
		}

		for rec in medium.recordings().iter() {
			out.push_str(&recording_line(rec));
		}
	}

	out
}

/// # One Recording's Score Line.
fn recording_line(rec: &Recording) -> String {
	format!(
		"  Recording {} (pos={:?}, score={:.3})\n",
		crate::model::Identified::id(rec), rec.position(), rec.score(),
	)
}

/// # Print the Diagnostic Report.
///
/// As [`render_release`], but writes directly to stdout via
/// [`fyi_msg::Msg`], coloring the release header like a custom status
/// line.
pub fn print_report(model: &ResultModel) {
	for rg in model.releasegroups().iter() {
		for rel in rg.releases().iter() {
			Msg::custom(
				"Release",
				199,
				&format!("{} (confidence_min={})", crate::model::Identified::id(rel), rel.confidence_min()),
			)
				.with_newline(true)
				.print();

			print!("{}", render_release_body(rel));
		}
	}
}

/// # Print the Metadata Mismatch Block.
pub fn print_mismatches(mismatches: &[Mismatch<'_>]) {
	for m in mismatches {
		Msg::custom("Mismatch", 208, &m.to_string()).with_newline(true).eprint();
	}
}

/// # Print the End-of-Run Cache Summary.
///
/// One line per `Cache`-backed service, per §0.2: `hits/misses/redundant`
/// counters from [`crate::mediator::cache_summary`].
pub fn print_cache_summary() {
	for (name, hits, misses, redundant) in crate::mediator::cache_summary() {
		Msg::custom(
			"Cache",
			4,
			&format!("{name}: {hits} hits, {misses} misses, {redundant} redundant"),
		)
			.with_newline(true)
			.print();
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_mismatch_formats() {
		let m = Mismatch { field: "title", mb: "Foo", stream: "Bar" };
		assert_eq!(m.to_string(), "MISMATCH title: mb=Foo; stream=Bar");
	}

	#[test]
	fn t_render_release_includes_track_verdicts() {
		let mut model = ResultModel::new();
		let rg_idx = model.releasegroups_mut().add_child(crate::model::ReleaseGroup::new("rg1"));
		let rg = model.releasegroups_mut().find_child_mut(rg_idx).unwrap();
		let rel_idx = rg.releases_mut().add_child(crate::model::Release::new("rel1"));
		let rel = rg.releases_mut().find_child_mut(rel_idx).unwrap();
		let mut disc = crate::model::Disc::new("disc1");
		disc.track_at_mut(1).evidence_at_mut(0).v1_count = 5;
		rel.medium_at_mut(1).discs_mut().add_child(disc);

		let text = render_release(&model);
		assert!(text.contains("Release rel1"));
		assert!(text.contains("Disc disc1"));
		assert!(text.contains("Track #01"));
		assert!(text.contains("v1=5"));
	}
}

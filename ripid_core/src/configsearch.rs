/*!
# Ripid: ConfigSearch

Decides which input stream fills which (medium, track) slot on each
candidate disc of a [`Release`] (§4.7). Grounded on
`examples/original_source/src/configuration.c`'s `_cfg2_*` family: a
residual-sorted per-track candidate list, disc assignments enumerated
lexicographically by disc ID, and a successor rule that advances the
first conflicting track to its next equally-good candidate before
resorting to a strictly worse one.

This module only *proposes* assignments — it has no access to
AccurateRip confidence, which the Verifier computes per disc. The
caller (`crate::verifier`) enumerates candidates with [`search`], scores
each one externally, and applies the winner with [`apply`].
*/

use crate::model::{
	Disc,
	Release,
};

#[derive(Debug, Clone, Copy)]
/// # Track Candidate.
///
/// One input stream considered for a single (medium, track) slot, with
/// its duration residual against that slot's disc-declared sector
/// length.
struct Candidate {
	/// # Stream index.
	stream_index: usize,

	/// # `stream sector count - track sector count`, or `0` if the slot
	/// has no disc assigned (per §4.7).
	residual: i64,
}

#[derive(Debug, Clone)]
/// # One Row of the Two-Level Search.
///
/// A (medium, track) slot and its residual-sorted candidates.
struct Row {
	/// # Index of the medium within `release.media()`.
	medium_index: usize,

	/// # One-based track position on that medium.
	track_position: usize,

	/// # Candidates, ascending by `|residual|`.
	candidates: Vec<Candidate>,

	/// # Index into `candidates` currently selected; `candidates.len()`
	/// means "no candidate selected" (an empty slot).
	selected: usize,
}

impl Row {
	/// # Currently Selected Candidate.
	fn current(&self) -> Option<&Candidate> { self.candidates.get(self.selected) }
}

#[derive(Debug, Clone)]
/// # Disc Assignment.
///
/// For every medium on the release, the chosen candidate disc (by index
/// into that medium's `Children<Disc>`), or `None` if the medium has no
/// disc assigned for this combination.
pub struct DiscAssignment {
	/// # One entry per medium, in `release.media()` order.
	pub choices: Vec<Option<usize>>,
}

#[derive(Debug, Clone)]
/// # Stream Assignment.
///
/// One candidate (disc-choice, stream-choice) combination found by
/// [`search`]: the disc picked for every medium, and the stream picked
/// for every (medium, track) slot that had at least one candidate.
pub struct Assignment {
	/// # Disc chosen per medium.
	pub discs: DiscAssignment,

	/// # `((medium_index, track_position), stream_index)` pairs, one per
	/// slot that received a stream.
	pub streams: Vec<((usize, usize), usize)>,

	/// # Sum of `|residual|` over every assigned slot; always `0` for any
	/// `Assignment` this module returns, since non-zero-residual disc
	/// assignments are skipped entirely (§4.7).
	pub total_residual: i64,

	/// # Number of slots that had candidates but received none (because
	/// every candidate was already claimed elsewhere). Used by the
	/// caller as the §4.7/§10 tie-break: fewer unmatched streams wins.
	pub unmatched: usize,
}

/// # Build the Residual-Sorted Rows for a Fixed Disc Assignment.
///
/// Per §8 scenario 3: a medium whose declared format isn't (or isn't
/// known to be) a CD is skipped outright — no row is built for any of its
/// tracks, so it never competes for a stream and the release survives
/// with that medium simply unassigned.
fn rows_for(release: &Release, discs: &DiscAssignment, stream_sectors: &[u32]) -> Vec<Row> {
	let mut rows = Vec::new();
	for (medium_index, medium) in release.media().iter().enumerate() {
		if !medium.is_cd() { continue; }

		let disc: Option<&Disc> = discs.choices[medium_index]
			.and_then(|i| medium.discs().find_child(i));

		for rec in medium.recordings().iter() {
			let track_position = rec.position().1;
			let track_len = disc.and_then(|d| d.sector_length(track_position));

			let mut candidates: Vec<Candidate> = rec.stream_indices().into_iter()
				.map(|stream_index| {
					let residual = match track_len {
						Some(len) => i64::from(stream_sectors.get(stream_index).copied().unwrap_or(0)) - i64::from(len),
						None => 0,
					};
					Candidate { stream_index, residual }
				})
				.collect();
			candidates.sort_by_key(|c| c.residual.abs());

			if !candidates.is_empty() {
				rows.push(Row { medium_index, track_position, candidates, selected: 0 });
			}
		}
	}
	rows
}

/// # Is the Current Selection Valid?
///
/// Valid means no stream index is selected by more than one row.
fn is_valid(rows: &[Row]) -> bool {
	let mut seen = std::collections::HashSet::new();
	for row in rows {
		if let Some(c) = row.current() {
			if !seen.insert(c.stream_index) { return false; }
		}
	}
	true
}

/// # Advance to the Next Candidate Configuration.
///
/// Per §4.7: advances the first row (row-major order) whose next
/// candidate doesn't increase the row's own residual, resetting every
/// earlier row to its best candidate. If no such free advance exists
/// anywhere, falls back to advancing the first row with any remaining
/// candidate at all (accepting a residual increase) so the search still
/// makes progress; returns `false` once every row is exhausted.
fn step(rows: &mut [Row]) -> bool {
	let current_residual = |row: &Row| row.current().map_or(i64::MAX, |c| c.residual.abs());

	for i in 0..rows.len() {
		let here = current_residual(&rows[i]);
		if let Some(next) = rows[i].candidates.get(rows[i].selected + 1) {
			if next.residual.abs() <= here {
				rows[i].selected += 1;
				for row in &mut rows[..i] { row.selected = 0; }
				return true;
			}
		}
	}

	for i in 0..rows.len() {
		if rows[i].selected + 1 < rows[i].candidates.len() {
			rows[i].selected += 1;
			for row in &mut rows[..i] { row.selected = 0; }
			return true;
		}
	}

	false
}

/// # Maximum successor steps tried per disc assignment before giving up.
///
/// A plain product-of-candidate-counts bound would already be finite,
/// but a handful of 5+ candidate tracks can blow that up; this caps
/// wall-clock cost on pathological inputs the way the original bounds
/// its own search depth.
const MAX_STEPS: usize = 10_000;

/// # Solve One Disc Assignment.
///
/// Returns `Some(Assignment)` if the trivial (best-per-track) selection
/// has zero total residual and a conflict-free selection was found
/// within [`MAX_STEPS`]; `None` if the trivial residual is non-zero (the
/// whole disc assignment is skipped, per §4.7) or the search was
/// exhausted without resolving every conflict.
fn solve(release: &Release, discs: &DiscAssignment, stream_sectors: &[u32]) -> Option<Assignment> {
	let mut rows = rows_for(release, discs, stream_sectors);

	let trivial_residual: i64 = rows.iter().filter_map(|r| r.current()).map(|c| c.residual.abs()).sum();
	if trivial_residual != 0 { return None; }

	let mut steps = 0;
	while !is_valid(&rows) {
		if steps >= MAX_STEPS || !step(&mut rows) { return None; }
		steps += 1;
	}

	let mut unmatched = 0;
	let mut streams = Vec::new();
	let mut total_residual = 0_i64;
	for row in &rows {
		match row.current() {
			Some(c) => {
				streams.push(((row.medium_index, row.track_position), c.stream_index));
				total_residual += c.residual.abs();
			}
			None => unmatched += 1,
		}
	}

	Some(Assignment { discs: discs.clone(), streams, total_residual, unmatched })
}

/// # Enumerate Disc Choices for a Medium.
///
/// Per §4.7: a medium with fewer than two candidate discs, or with no
/// track carrying any candidate stream, is fixed rather than enumerated
/// — its sole disc (if any) is used throughout the outer search. Per §8
/// scenario 3, a non-CD medium (e.g. a DVD on a multi-medium release) is
/// always fixed to "no disc" — [`rows_for`] skips it entirely, so its
/// disc choice is never consulted either way.
fn disc_choices_for_medium(medium: &crate::model::Medium) -> Vec<Option<usize>> {
	if !medium.is_cd() { return vec![None]; }

	let has_candidate_track = medium.recordings().iter().any(|r| !r.stream_indices().is_empty());
	if medium.discs().len() < 2 || !has_candidate_track {
		return vec![if medium.discs().is_empty() { None } else { Some(0) }];
	}

	let mut order: Vec<usize> = (0..medium.discs().len()).collect();
	order.sort_by(|&a, &b| {
		let ida = medium.discs().find_child(a).map(crate::model::Identified::id).unwrap_or_default();
		let idb = medium.discs().find_child(b).map(crate::model::Identified::id).unwrap_or_default();
		ida.cmp(idb)
	});
	order.into_iter().map(Some).collect()
}

#[must_use]
/// # Search.
///
/// Enumerates every disc assignment (lexicographic per medium by disc
/// ID) and, for each, the stream assignment [`solve`] finds. Returns one
/// [`Assignment`] per disc assignment that survives the zero-residual
/// and conflict-free requirements; empty if none do.
pub fn search(release: &Release, stream_sectors: &[u32]) -> Vec<Assignment> {
	let per_medium_choices: Vec<Vec<Option<usize>>> = release.media().iter()
		.map(disc_choices_for_medium)
		.collect();

	let mut results = Vec::new();
	let mut indices = vec![0_usize; per_medium_choices.len()];
	if per_medium_choices.iter().any(Vec::is_empty) { return results; }

	loop {
		let choices: Vec<Option<usize>> = per_medium_choices.iter().zip(&indices)
			.map(|(opts, &i)| opts[i])
			.collect();
		if let Some(a) = solve(release, &DiscAssignment { choices }, stream_sectors) { results.push(a); }

		// Odometer-style increment across the per-medium choice lists.
		let mut carry = true;
		for (opts, idx) in per_medium_choices.iter().zip(indices.iter_mut()) {
			if !carry { break; }
			*idx += 1;
			if *idx < opts.len() { carry = false; }
			else { *idx = 0; }
		}
		if carry { break; }
	}

	results
}

/// # Apply an Assignment.
///
/// Eliminates, on every medium, every candidate disc other than the
/// chosen one, and every recording at a (medium, track) slot other than
/// the one carrying the winning stream. Sets `release.confidence_min`
/// to `score`, as computed by the caller from the Verifier's checksum
/// evidence for the winning streams.
pub fn apply(release: &mut Release, assignment: &Assignment, score: u32) {
	for (medium_index, medium) in release.media_mut().iter_mut().enumerate() {
		if let Some(keep) = assignment.discs.choices[medium_index] {
			let keep_id = medium.discs().find_child(keep).map(crate::model::Identified::id).map(String::from);
			if let Some(keep_id) = keep_id {
				medium.discs_mut().retain(|d| crate::model::Identified::id(d) == keep_id);
			}
		}
		else { medium.discs_mut().retain(|_| false); }

		let winners: Vec<(usize, usize)> = assignment.streams.iter()
			.filter(|((m, _), _)| *m == medium_index)
			.map(|((_, t), s)| (*t, *s))
			.collect();

		medium.recordings_mut().retain(|rec| {
			let pos = rec.position().1;
			match winners.iter().find(|(t, _)| *t == pos) {
				Some((_, stream)) => rec.stream_indices().contains(stream),
				None => false,
			}
		});
	}

	release.set_confidence_min(score);
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::model::Recording;

	fn tap_fp(mut rec: Recording, stream: usize) -> Recording {
		rec.add_fingerprint("fp", stream, 0.5);
		rec
	}

	#[test]
	fn t_search_finds_zero_residual_single_medium() {
		let mut rel = Release::new("rel1");
		let mut disc = Disc::new("disc1");
		disc.set_sector_length(1, 100);
		disc.set_sector_length(2, 200);
		rel.medium_at_mut(1).discs_mut().add_child(disc);
		rel.medium_at_mut(1).recordings_mut().add_child(tap_fp(Recording::new("r1").with_position(1, 1), 0));
		rel.medium_at_mut(1).recordings_mut().add_child(tap_fp(Recording::new("r2").with_position(1, 2), 1));

		let results = search(&rel, &[100, 200]);
		assert_eq!(results.len(), 1);
		let a = &results[0];
		assert_eq!(a.total_residual, 0);
		assert_eq!(a.unmatched, 0);
		assert_eq!(a.streams.len(), 2);
	}

	#[test]
	fn t_search_skips_nonzero_residual_disc() {
		let mut rel = Release::new("rel1");
		let mut disc = Disc::new("disc1");
		disc.set_sector_length(1, 999);
		rel.medium_at_mut(1).discs_mut().add_child(disc);
		rel.medium_at_mut(1).recordings_mut().add_child(tap_fp(Recording::new("r1").with_position(1, 1), 0));

		let results = search(&rel, &[100]);
		assert!(results.is_empty());
	}

	#[test]
	fn t_search_resolves_conflict_between_tracks() {
		let mut rel = Release::new("rel1");
		let mut disc = Disc::new("disc1");
		disc.set_sector_length(1, 100);
		disc.set_sector_length(2, 100);
		rel.medium_at_mut(1).discs_mut().add_child(disc);
		// Both tracks equally favor stream 0 (same sector length); only
		// one can have it, so the search must hand the other stream 1.
		let mut r1 = Recording::new("r1").with_position(1, 1);
		r1.add_fingerprint("fp", 0, 0.5);
		r1.add_fingerprint("fp", 1, 0.5);
		let mut r2 = Recording::new("r2").with_position(1, 2);
		r2.add_fingerprint("fp", 0, 0.5);
		r2.add_fingerprint("fp", 1, 0.5);
		rel.medium_at_mut(1).recordings_mut().add_child(r1);
		rel.medium_at_mut(1).recordings_mut().add_child(r2);

		let results = search(&rel, &[100, 100]);
		assert_eq!(results.len(), 1);
		let used: std::collections::HashSet<usize> = results[0].streams.iter().map(|(_, s)| *s).collect();
		assert_eq!(used.len(), 2);
	}

	#[test]
	fn t_apply_prunes_losing_disc_and_recording() {
		let mut rel = Release::new("rel1");
		let mut disc_a = Disc::new("disc-a");
		disc_a.set_sector_length(1, 100);
		let disc_b = Disc::new("disc-b");
		rel.medium_at_mut(1).discs_mut().add_child(disc_a);
		rel.medium_at_mut(1).discs_mut().add_child(disc_b);
		rel.medium_at_mut(1).recordings_mut().add_child(tap_fp(Recording::new("r1").with_position(1, 1), 0));

		let assignment = Assignment {
			discs: DiscAssignment { choices: vec![Some(0)] },
			streams: vec![((0, 1), 0)],
			total_residual: 0,
			unmatched: 0,
		};
		apply(&mut rel, &assignment, 42);

		assert_eq!(rel.confidence_min(), 42);
		let medium = rel.media().find_child(0).unwrap();
		assert_eq!(medium.discs().len(), 1);
		assert_eq!(crate::model::Identified::id(medium.discs().find_child(0).unwrap()), "disc-a");
	}
}

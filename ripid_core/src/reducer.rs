/*!
# Ripid: Reducer

Pure passes over [`ResultModel`] (§4.6): each takes the tree (plus, for a
couple of passes, a small piece of external context the tree doesn't
carry on its own — the full stream universe, or each stream's sector
count) and only ever erases. None of these allocate new tree nodes;
that's `complete_release`'s job alone, and even there the nodes it adds
are placeholders, never real matches.

Passes are independent functions rather than one `reduce_all` driver:
several of them depend on data the Verifier or ConfigSearch hasn't
written yet (matching checksums, `confidence_min`), so the caller
(`crate::verifier`) interleaves them with those components per the
state machine in spec §4.8.
*/

use crate::model::{
	Disc,
	Fingerprint,
	Recording,
	Release,
	ResultModel,
};
use std::collections::{
	BTreeSet,
	HashMap,
};

/// # Pass 1: Filter-incomplete.
///
/// Computes the set `S` of stream indices matched anywhere in the tree,
/// then erases any release whose own matched indices are a *strict*
/// subset of `S` — i.e. keeps only releases that account for every
/// stream some other release matched. Emptied releasegroups are erased.
pub fn filter_incomplete(model: &mut ResultModel) {
	let mut universe: BTreeSet<usize> = BTreeSet::new();
	for rg in model.releasegroups().iter() {
		for rel in rg.releases().iter() { universe.extend(rel.stream_indices()); }
	}

	for rg in model.releasegroups_mut().iter_mut() {
		rg.releases_mut().retain(|rel| rel.stream_indices() == universe);
	}
	model.releasegroups_mut().retain(|rg| !rg.releases().is_empty());
}

/// # Pass 2: Complete-release.
///
/// For every release: fills in a position-only [`Recording`] for any
/// medium/track position the metadata service declared
/// ([`Medium::track_count`](crate::model::Medium::track_count)) but
/// that isn't yet present in the tree, then attaches a dummy fingerprint
/// (carrying every stream index unmatched anywhere in the release) to
/// any recording still lacking a real match.
///
/// `total_streams` is the count of input streams submitted to the
/// Mediator for this run; it's the universe `complete_release` needs to
/// compute "unmatched" and isn't itself part of the tree.
pub fn complete_release(model: &mut ResultModel, total_streams: usize) {
	for rg in model.releasegroups_mut().iter_mut() {
		for rel in rg.releases_mut().iter_mut() {
			for medium in rel.media_mut().iter_mut() {
				let expected = medium.track_count();
				let have: BTreeSet<usize> = medium.recordings().iter().map(|r| r.position().1).collect();
				for pos in 1..=expected {
					if !have.contains(&pos) {
						let placeholder = format!("position-only/{}/{pos}", medium.position());
						medium.recordings_mut().add_child(
							Recording::new(placeholder).with_position(medium.position(), pos)
						);
					}
				}
			}

			let matched = rel.stream_indices();
			let unmatched: Vec<usize> = (0..total_streams).filter(|i| !matched.contains(i)).collect();

			for medium in rel.media_mut().iter_mut() {
				for rec in medium.recordings_mut().iter_mut() {
					if rec.fingerprints().is_empty() {
						rec.fingerprints_mut().add_child(Fingerprint::dummy(unmatched.clone()));
					}
				}
			}
		}
	}
}

/// # Pass 3: Release-add-discs.
///
/// For every candidate disc on every medium, checks each track position
/// it declares a sector length for against the streams matching the
/// recording at that position: a stream whose own sector count (from
/// `stream_sectors`, indexed by stream index) neither equals the disc's
/// declared length nor recurs at another position elsewhere in the
/// release disqualifies the whole disc, which is erased.
///
/// A position the disc has no declared sector length for (an unfamiliar
/// pressing variant) is not itself disqualifying. A non-CD medium (§8
/// scenario 3) is skipped outright — it carries no AccurateRip-checkable
/// discs to begin with, and ConfigSearch never assigns streams to it
/// either (see `crate::configsearch::rows_for`).
pub fn release_add_discs(model: &mut ResultModel, stream_sectors: &[u32]) {
	for rg in model.releasegroups_mut().iter_mut() {
		for rel in rg.releases_mut().iter_mut() {
			let mut occurrences: HashMap<usize, usize> = HashMap::new();
			for medium in rel.media().iter() {
				for rec in medium.recordings().iter() {
					for idx in rec.stream_indices() { *occurrences.entry(idx).or_insert(0) += 1; }
				}
			}

			for medium in rel.media_mut().iter_mut() {
				if !medium.is_cd() { continue; }

				let snapshot: Vec<(usize, Vec<usize>)> = medium.recordings().iter()
					.map(|r| (r.position().1, r.stream_indices()))
					.collect();

				medium.discs_mut().retain(|disc| {
					for (track_pos, indices) in &snapshot {
						let Some(len) = disc.sector_length(*track_pos) else { continue; };
						for &idx in indices {
							let sectors = stream_sectors.get(idx).copied().unwrap_or(0);
							let matches_len = sectors == len;
							let occurs_elsewhere = occurrences.get(&idx).copied().unwrap_or(0) > 1;
							if !matches_len && !occurs_elsewhere { return false; }
						}
					}
					true
				});
			}
		}
	}
}

#[must_use]
/// # Pass 4: Has-matching-discs (predicate).
///
/// True when every stream-match on `release` has at least one
/// corresponding track with a matching checksum on some disc. Feeds
/// [`prune_unmatched`]; exposed standalone since §4.6 documents it as
/// its own numbered pass.
pub fn has_matching_discs(release: &Release) -> bool { release.has_matching_discs() }

/// # Pass 5: Prune-unmatched.
///
/// If any release in a releasegroup satisfies [`has_matching_discs`],
/// erases the releases in that group that don't. Emptied releasegroups
/// are erased.
pub fn prune_unmatched(model: &mut ResultModel) {
	for rg in model.releasegroups_mut().iter_mut() {
		if rg.releases().iter().any(has_matching_discs) {
			rg.releases_mut().retain(has_matching_discs);
		}
	}
	model.releasegroups_mut().retain(|rg| !rg.releases().is_empty());
}

/// # Pass 6: Prune-perfect-disc.
///
/// Within a release: if a medium has a disc where every track has at
/// least one matching checksum (`Disc::is_perfect`), erases the discs on
/// that medium that don't. If some release in a releasegroup has *every*
/// medium in that state (`Release::is_perfect`), erases the other
/// releases in the group.
pub fn prune_perfect_disc(model: &mut ResultModel) {
	for rg in model.releasegroups_mut().iter_mut() {
		for rel in rg.releases_mut().iter_mut() {
			for medium in rel.media_mut().iter_mut() {
				if medium.discs().iter().any(Disc::is_perfect) {
					medium.discs_mut().retain(Disc::is_perfect);
				}
			}
		}
		if rg.releases().iter().any(Release::is_perfect) {
			rg.releases_mut().retain(Release::is_perfect);
		}
	}
}

/// # Pass 7: Prune-confidence.
///
/// Erases releases in a group whose `confidence_min`
/// (`min` across tracks of `v1_count + v2_count`, written by
/// ConfigSearch) is lower than the group's maximum.
pub fn prune_confidence(model: &mut ResultModel) {
	for rg in model.releasegroups_mut().iter_mut() {
		if let Some(max) = rg.releases().iter().map(Release::confidence_min).max() {
			rg.releases_mut().retain(|r| r.confidence_min() >= max);
		}
	}
}

/// # Pass 8: Prune-metadata.
///
/// Only acts when the best `metadata_distance` in a group is zero *and*
/// at least one zero-distance release still satisfies
/// [`has_matching_discs`] (so this pass can never evict the sole release
/// a §4.6.4-style pruning would keep); in that case erases every release
/// with a non-zero distance.
pub fn prune_metadata(model: &mut ResultModel) {
	for rg in model.releasegroups_mut().iter_mut() {
		let best_is_zero = rg.releases().iter().any(|r| r.metadata_distance() == 0);
		if !best_is_zero { continue; }

		let safe = rg.releases().iter().any(|r| r.metadata_distance() == 0 && has_matching_discs(r));
		if safe { rg.releases_mut().retain(|r| r.metadata_distance() == 0); }
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::model::{
		Recording,
		ReleaseGroup,
	};

	fn model_with_two_releases(a_indices: &[usize], b_indices: &[usize]) -> ResultModel {
		let mut model = ResultModel::new();
		let mut rg = ReleaseGroup::new("rg1");

		let mut a = Release::new("a");
		a.medium_at_mut(1);
		for (i, &idx) in a_indices.iter().enumerate() {
			a.medium_at_mut(1).recordings_mut().add_child(
				tap_fingerprint(Recording::new(format!("ra{i}")).with_position(1, i + 1), idx)
			);
		}

		let mut b = Release::new("b");
		b.medium_at_mut(1);
		for (i, &idx) in b_indices.iter().enumerate() {
			b.medium_at_mut(1).recordings_mut().add_child(
				tap_fingerprint(Recording::new(format!("rb{i}")).with_position(1, i + 1), idx)
			);
		}

		rg.releases_mut().add_child(a);
		rg.releases_mut().add_child(b);
		model.releasegroups_mut().add_child(rg);
		model
	}

	fn tap_fingerprint(mut rec: Recording, stream_index: usize) -> Recording {
		rec.add_fingerprint("fp", stream_index, 0.5);
		rec
	}

	#[test]
	fn t_filter_incomplete_keeps_only_full_coverage() {
		let mut model = model_with_two_releases(&[0], &[0, 1]);
		filter_incomplete(&mut model);
		let rg = model.releasegroups().find_child(0).unwrap();
		assert_eq!(rg.releases().len(), 1);
		assert_eq!(rg.releases().find_child(0).unwrap().id(), "b");
	}

	#[test]
	fn t_filter_incomplete_keeps_both_when_both_cover_universe() {
		let mut model = model_with_two_releases(&[0, 1], &[0, 1]);
		filter_incomplete(&mut model);
		assert_eq!(model.releasegroups().find_child(0).unwrap().releases().len(), 2);
	}

	#[test]
	fn t_complete_release_fills_gap_and_attaches_dummy() {
		let mut model = ResultModel::new();
		let mut rg = ReleaseGroup::new("rg1");
		let mut rel = Release::new("rel1");
		rel.medium_at_mut(1).set_track_count(2);
		rel.medium_at_mut(1).recordings_mut().add_child(
			tap_fingerprint(Recording::new("r1").with_position(1, 1), 0)
		);
		rg.releases_mut().add_child(rel);
		model.releasegroups_mut().add_child(rg);

		complete_release(&mut model, 3);

		let medium = model.releasegroups().find_child(0).unwrap()
			.releases().find_child(0).unwrap()
			.media().find_child(0).unwrap();
		assert_eq!(medium.recordings().len(), 2);
		let filled = medium.recordings().iter().find(|r| r.position().1 == 2).unwrap();
		assert_eq!(filled.fingerprints().len(), 1);
		assert!(filled.fingerprints().find_child(0).unwrap().is_dummy());
	}

	#[test]
	fn t_release_add_discs_drops_disc_on_sector_mismatch() {
		let mut model = ResultModel::new();
		let mut rg = ReleaseGroup::new("rg1");
		let mut rel = Release::new("rel1");
		rel.medium_at_mut(1).recordings_mut().add_child(
			tap_fingerprint(Recording::new("r1").with_position(1, 1), 0)
		);
		let mut disc_ok = Disc::new("disc-ok");
		disc_ok.set_sector_length(1, 100);
		let mut disc_bad = Disc::new("disc-bad");
		disc_bad.set_sector_length(1, 999);
		rel.medium_at_mut(1).discs_mut().add_child(disc_ok);
		rel.medium_at_mut(1).discs_mut().add_child(disc_bad);
		rg.releases_mut().add_child(rel);
		model.releasegroups_mut().add_child(rg);

		release_add_discs(&mut model, &[100]);

		let medium = model.releasegroups().find_child(0).unwrap()
			.releases().find_child(0).unwrap()
			.media().find_child(0).unwrap();
		assert_eq!(medium.discs().len(), 1);
		assert_eq!(medium.discs().find_child(0).unwrap().id(), "disc-ok");
	}

	#[test]
	fn t_prune_confidence_keeps_only_max() {
		let mut model = ResultModel::new();
		let mut rg = ReleaseGroup::new("rg1");
		rg.releases_mut().add_child(Release::new("a").tap_confidence(10));
		rg.releases_mut().add_child(Release::new("b").tap_confidence(20));
		model.releasegroups_mut().add_child(rg);

		prune_confidence(&mut model);
		let rg = model.releasegroups().find_child(0).unwrap();
		assert_eq!(rg.releases().len(), 1);
		assert_eq!(rg.releases().find_child(0).unwrap().id(), "b");
	}

	#[test]
	fn t_prune_metadata_only_when_safe() {
		let mut model = ResultModel::new();
		let mut rg = ReleaseGroup::new("rg1");
		rg.releases_mut().add_child(Release::new("a").tap_metadata_distance(0));
		rg.releases_mut().add_child(Release::new("b").tap_metadata_distance(4));
		model.releasegroups_mut().add_child(rg);

		// Not safe: zero-distance release has no matching discs, so nothing is pruned.
		prune_metadata(&mut model);
		assert_eq!(model.releasegroups().find_child(0).unwrap().releases().len(), 2);
	}

	trait TapRelease {
		fn tap_confidence(self, v: u32) -> Self;
		fn tap_metadata_distance(self, v: u32) -> Self;
	}
	impl TapRelease for Release {
		fn tap_confidence(mut self, v: u32) -> Self { self.set_confidence_min(v); self }
		fn tap_metadata_distance(mut self, v: u32) -> Self { self.set_metadata_distance(v); self }
	}
}

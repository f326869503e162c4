/*!
# Ripid: Verifier

Orchestrates the Mediator, Reducer, and ConfigSearch to carry a
[`ResultModel`] through the state machine in §4.8:
`ingested → completed → filtered → verified → scored`, with any Reducer
pass able to erase a release from any state (`*→pruned`).

Fetches AccurateRip and EAC per candidate disc, folds the results into
each disc's [`Track`] evidence, then hands scoring off to
[`crate::configsearch`] once every candidate disc on a release has been
verified.
*/

use crate::{
	configsearch::{
		self,
		Assignment,
	},
	mediator::{
		self,
		AccurateRipDisc,
		AccurateRipTrack,
		EacDisc,
	},
	model::{
		Disc,
		Release,
		ResultModel,
		Track,
	},
	reducer,
	Fingersum,
	RipIdError,
	StreamCtx,
};

/// # Fold Already-Fetched Evidence into a Disc's Tracks.
///
/// Pure with respect to the network: `ar_discs`/`eac_disc` are whatever
/// [`verify_disc`] (or a test) already obtained. For every candidate
/// offset and every candidate stream at a track position, accumulates
/// the AccurateRip v1/v2 and EAC confirmation counts, keeping the
/// highest count seen for each if more than one candidate stream (not
/// yet narrowed down by ConfigSearch) is still in play for that slot.
fn fold_disc_evidence(
	disc: &mut Disc,
	candidate_offsets: &[i32],
	ar_discs: &[AccurateRipDisc],
	eac_disc: Option<&EacDisc>,
	streams: &mut [StreamCtx],
) {
	let positions: Vec<usize> = disc.tracks().iter().map(Track::position).collect();

	for position in positions {
		let Some(track_no) = position.checked_sub(1) else { continue; };
		let ar_entries: Vec<&AccurateRipTrack> = ar_discs.iter().filter_map(|d| d.tracks.get(track_no)).collect();
		let eac_entry = eac_disc.and_then(|d| d.tracks.get(track_no));

		let track = disc.track_at_mut(position);
		let candidate_streams = track.indices().to_vec();

		for &offset in candidate_offsets {
			let mut v1_count = 0_u32;
			let mut v2_count = 0_u32;
			let mut eac_count = 0_u32;

			for &stream_idx in &candidate_streams {
				let Some(stream) = streams.get_mut(stream_idx) else { continue; };
				let triple = Fingersum::checksums_at(stream, offset);

				for ar in &ar_entries {
					if triple.v1 == ar.crc { v1_count += u32::from(ar.confidence); }
					if triple.v2 == ar.crc { v2_count += u32::from(ar.confidence); }
				}
				if let Some(eac) = eac_entry {
					for block in &eac.whole {
						if block.crc32 == triple.eac_crc32 { eac_count += block.count; }
					}
				}
			}

			let evidence = track.evidence_at_mut(offset);
			evidence.v1_count = evidence.v1_count.max(v1_count);
			evidence.v2_count = evidence.v2_count.max(v2_count);
			evidence.eac_count = evidence.eac_count.max(eac_count);
		}
	}
}

/// # Offset-Detection Search Radius (Samples).
///
/// §4.3/§8: the offset search window is exactly ±5×588 samples inclusive.
const OFFSET_SEARCH_RADIUS: i32 = 5 * 588;

/// # Detect Candidate Read Offsets (Pre-Pass).
///
/// §4.8: "the offset-detection CRC from AccurateRip is used in a pre-pass
/// to enumerate candidate offsets." The legacy offset-finding checksum is
/// only ever computed against track five (§4.3), so this only has
/// anything to work with when the disc has a track in that position and
/// at least one input stream is already a candidate for it; everything
/// else falls through with the disc's offset set left empty, and
/// [`verify_disc`] will skip it entirely, same as an unrecognized disc.
fn detect_offsets(disc: &mut Disc, ar_discs: &[AccurateRipDisc], streams: &mut [StreamCtx]) {
	let Some(track_five) = disc.tracks().iter().find(|t| t.position() == 5) else { return; };
	let candidate_streams = track_five.indices().to_vec();
	if candidate_streams.is_empty() { return; }

	let offset_crcs: Vec<u32> = ar_discs.iter()
		.filter_map(|d| d.tracks.get(4))
		.map(|t| t.offset_crc)
		.collect();
	if offset_crcs.is_empty() { return; }

	let candidates: Vec<i32> = (-OFFSET_SEARCH_RADIUS..=OFFSET_SEARCH_RADIUS).collect();
	let mut found = Vec::new();

	for &stream_idx in &candidate_streams {
		let Some(stream) = streams.get_mut(stream_idx) else { continue; };
		for &target in &offset_crcs {
			if let Some(offset) = Fingersum::find_offset_detect(stream, &candidates, target) {
				found.push(offset);
			}
		}
	}

	for offset in found { disc.add_offset(offset); }
}

/// # Verify One Disc.
///
/// No-op if the disc carries no TOC (no `Disc::set_toc` call ever
/// reached it, so there's nothing to derive an AccurateRip ID from).
/// Fetches AccurateRip first regardless of whether any offsets are
/// already known, since the same response both seeds
/// [`detect_offsets`] (when the disc's offset set is still empty) and
/// feeds the evidence fold below; then fetches EAC and folds both into
/// the disc's tracks.
///
/// ## Errors
///
/// Returns [`RipIdError::Network`]/[`RipIdError::Timeout`] on transport
/// failure; parse failures are already absorbed by the Mediator (an EAC
/// parse error is cached as "no data", per §7) and never reach here.
fn verify_disc(disc: &mut Disc, streams: &mut [StreamCtx]) -> Result<(), RipIdError> {
	if disc.toc_offsets().is_empty() { return Ok(()); }

	let ar_discs = mediator::fetch_accuraterip_discs(disc.toc_offsets(), disc.toc_leadout())?;

	if disc.offsets().is_empty() {
		detect_offsets(disc, &ar_discs, streams);
	}
	if disc.offsets().is_empty() { return Ok(()); }

	let candidate_offsets: Vec<i32> = disc.offsets().to_vec();
	let n_tracks = u8::try_from(disc.tracks().len()).unwrap_or(u8::MAX);
	let eac_disc = mediator::fetch_eac_disc(disc.id(), n_tracks)?;

	fold_disc_evidence(disc, &candidate_offsets, &ar_discs, eac_disc.as_ref(), streams);
	Ok(())
}

/// # Verify a Release.
///
/// ## Errors
///
/// Per §4.8, a network error anywhere while verifying `release` is
/// fatal for the whole release (its `confidence_min` stays `0`); the
/// caller should leave the release in the tree unverified rather than
/// erase it.
pub fn verify_release(release: &mut Release, streams: &mut [StreamCtx]) -> Result<(), RipIdError> {
	for medium in release.media_mut().iter_mut() {
		for disc in medium.discs_mut().iter_mut() { verify_disc(disc, streams)?; }
	}
	Ok(())
}

/// # Score One ConfigSearch Assignment.
///
/// `min_confidence`: the minimum, across every track the assignment
/// fills, of that track's best `v1_count + v2_count` on the chosen
/// disc (§4.7).
fn score_assignment(release: &Release, assignment: &Assignment) -> u32 {
	let mut min_conf: Option<u32> = None;

	for ((medium_index, track_position), _stream) in &assignment.streams {
		let Some(medium) = release.media().find_child(*medium_index) else { continue; };
		let Some(Some(disc_index)) = assignment.discs.choices.get(*medium_index).copied() else { continue; };
		let Some(disc) = medium.discs().find_child(disc_index) else { continue; };
		let Some(track) = disc.tracks().iter().find(|t| t.position() == *track_position) else { continue; };

		let conf = track.confidence_max();
		min_conf = Some(min_conf.map_or(conf, |m| m.min(conf)));
	}

	min_conf.unwrap_or(0)
}

/// # Score and Apply the Best ConfigSearch Assignment.
///
/// Ties broken by fewer unmatched streams, per §4.7/§10. A release with
/// no candidate assignments at all (e.g. no medium has any disc with a
/// zero-residual stream assignment) is left as-is, unscored.
fn score_release(release: &mut Release, stream_sectors: &[u32]) {
	let candidates = configsearch::search(release, stream_sectors);

	let mut best: Option<(u32, usize, Assignment)> = None;
	for assignment in candidates {
		let score = score_assignment(release, &assignment);
		let take = match &best {
			None => true,
			Some((best_score, best_unmatched, _)) =>
				score > *best_score || (score == *best_score && assignment.unmatched < *best_unmatched),
		};
		if take { best = Some((score, assignment.unmatched, assignment)); }
	}

	if let Some((score, _, assignment)) = best {
		configsearch::apply(release, &assignment, score);
	}
}

/// # Run the Full Pipeline.
///
/// Drives a freshly-ingested [`ResultModel`] through every Reducer pass,
/// the Verifier, and ConfigSearch, in the order the §4.8 state machine
/// requires: filter-incomplete and complete-release run immediately
/// (`ingested→completed`); release-add-discs follows
/// (`completed→filtered`); each surviving release is then verified
/// (`filtered→verified`) and scored (`verified→scored`); prune-unmatched
/// and prune-perfect-disc depend on verification evidence, so they run
/// after it; prune-confidence depends on ConfigSearch's
/// `confidence_min`, so it (and prune-metadata) run last.
///
/// `total_streams` is the number of input streams submitted this run;
/// `stream_sectors`/`streams` are indexed by stream index and give,
/// respectively, each stream's whole-sector count (for ConfigSearch
/// residuals) and its decoded samples (for checksum folding).
pub fn run(model: &mut ResultModel, total_streams: usize, stream_sectors: &[u32], streams: &mut [StreamCtx]) {
	reducer::filter_incomplete(model);
	reducer::complete_release(model, total_streams);
	reducer::release_add_discs(model, stream_sectors);

	for rg in model.releasegroups_mut().iter_mut() {
		for rel in rg.releases_mut().iter_mut() {
			// A network failure leaves the release unverified rather
			// than erasing it; its confidence_min stays 0 and
			// prune_confidence will de-prioritize it naturally.
			let _ = verify_release(rel, streams);
		}
	}

	reducer::prune_unmatched(model);
	reducer::prune_perfect_disc(model);

	for rg in model.releasegroups_mut().iter_mut() {
		for rel in rg.releases_mut().iter_mut() { score_release(rel, stream_sectors); }
	}

	reducer::prune_confidence(model);
	reducer::prune_metadata(model);
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{
		fingersum::TrackPosition,
		mediator::AccurateRipTrack,
		model::Recording,
	};

	fn stub_stream(len: usize) -> StreamCtx {
		let samples = vec![[1, 0, 2, 0]; len];
		StreamCtx::new(samples, TrackPosition { is_first: true, is_last: true, number: 1 }, 44_100)
	}

	#[test]
	fn t_detect_offsets_finds_matching_track_five() {
		let mut disc = Disc::new("disc1");
		disc.track_at_mut(5).add_index(0);

		let mut streams = vec![StreamCtx::new(
			vec![[1, 0, 2, 0]; 10_000],
			TrackPosition { is_first: false, is_last: false, number: 5 },
			44_100,
		)];
		let target = Fingersum::checksums_at(&mut streams[0], 12).offset_detect.unwrap();

		let ar_discs = vec![AccurateRipDisc {
			disc_id1: 1,
			disc_id2: 2,
			disc_cddb: 3,
			tracks: vec![
				AccurateRipTrack { confidence: 1, crc: 0, offset_crc: 0 },
				AccurateRipTrack { confidence: 1, crc: 0, offset_crc: 0 },
				AccurateRipTrack { confidence: 1, crc: 0, offset_crc: 0 },
				AccurateRipTrack { confidence: 1, crc: 0, offset_crc: 0 },
				AccurateRipTrack { confidence: 1, crc: 0, offset_crc: target },
			],
		}];

		detect_offsets(&mut disc, &ar_discs, &mut streams);
		assert!(disc.offsets().contains(&12));
	}

	#[test]
	fn t_detect_offsets_noop_without_track_five() {
		let mut disc = Disc::new("disc1");
		disc.track_at_mut(1).add_index(0);
		let mut streams = vec![stub_stream(10_000)];
		let ar_discs = vec![AccurateRipDisc {
			disc_id1: 1, disc_id2: 2, disc_cddb: 3,
			tracks: vec![AccurateRipTrack { confidence: 1, crc: 0, offset_crc: 9 }],
		}];
		detect_offsets(&mut disc, &ar_discs, &mut streams);
		assert!(disc.offsets().is_empty());
	}

	#[test]
	fn t_fold_disc_evidence_counts_matching_offset() {
		let mut disc = Disc::new("disc1");
		disc.add_offset(0);
		disc.track_at_mut(1).add_index(0);

		let mut streams = vec![stub_stream(10_000)];
		let target = Fingersum::checksums_at(&mut streams[0], 0);

		let ar_discs = vec![AccurateRipDisc {
			disc_id1: 1,
			disc_id2: 2,
			disc_cddb: 3,
			tracks: vec![AccurateRipTrack { confidence: 4, crc: target.v1, offset_crc: 0 }],
		}];

		fold_disc_evidence(&mut disc, &[0], &ar_discs, None, &mut streams);

		let track = disc.track_at_mut(1);
		assert_eq!(track.evidence_at_mut(0).v1_count, 4);
	}

	#[test]
	fn t_fold_disc_evidence_ignores_non_matching_crc() {
		let mut disc = Disc::new("disc1");
		disc.add_offset(0);
		disc.track_at_mut(1).add_index(0);
		let mut streams = vec![stub_stream(10_000)];

		let ar_discs = vec![AccurateRipDisc {
			disc_id1: 1,
			disc_id2: 2,
			disc_cddb: 3,
			tracks: vec![AccurateRipTrack { confidence: 4, crc: 0xffff_ffff, offset_crc: 0 }],
		}];

		fold_disc_evidence(&mut disc, &[0], &ar_discs, None, &mut streams);

		let track = disc.track_at_mut(1);
		assert_eq!(track.evidence_at_mut(0).v1_count, 0);
		assert_eq!(track.evidence_at_mut(0).v2_count, 0);
	}

	#[test]
	fn t_score_release_applies_best_assignment() {
		let mut rel = Release::new("rel1");
		let mut disc = Disc::new("disc1");
		disc.set_sector_length(1, 100);
		disc.track_at_mut(1).add_index(0);
		disc.track_at_mut(1).evidence_at_mut(0).v1_count = 5;
		rel.medium_at_mut(1).discs_mut().add_child(disc);
		let mut rec = Recording::new("r1").with_position(1, 1);
		rec.add_fingerprint("fp", 0, 0.9);
		rel.medium_at_mut(1).recordings_mut().add_child(rec);

		score_release(&mut rel, &[100]);
		assert_eq!(rel.confidence_min(), 5);
	}
}

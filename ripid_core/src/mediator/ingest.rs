/*!
# Ripid: Mediator — Ingestion

Grows a [`ResultModel`] from what the other three services hand back, per
spec.md §9: "the tree is grown monotonically during ingestion (Mediator
writes to ResultModel)... Services produce local tree fragments that the
main thread merges in." Two steps:

- [`seed`] turns a batch of fingerprint matches into the starting tree —
  one releasegroup/release/recording per match, every recording parked on
  a staging medium (position `0`) since its real medium/track position
  isn't known yet.
- [`resolve`] queries [`MetadataService`] for each release surfaced by
  `seed`, then relocates each staged recording onto the medium/track
  position the metadata service reports, populating `Disc` TOCs along the
  way.
*/

use crate::{
	config::RipIdConfig,
	model::{
		Disc,
		Identified,
		Recording,
		Release,
		ReleaseGroup,
		ResultModel,
	},
	RipIdError,
};
use super::{
	fingerprint::FingerprintMatch,
	metadata::{
		Medium as WireMedium,
		MetadataKey,
		MetadataService,
		ReleaseHandle,
	},
};



#[must_use]
/// # Seed a ResultModel From Fingerprint Matches.
pub fn seed(matches: &[FingerprintMatch]) -> ResultModel {
	let mut model = ResultModel::new();

	for m in matches {
		let count = model.result_count(m.stream_index) + 1;
		model.set_result_count(m.stream_index, count);
	}

	for m in matches {
		for rec in &m.recordings {
			for rg in &rec.releasegroups {
				let rg_idx = model.releasegroups_mut()
					.add_child_by_id(&rg.id, || ReleaseGroup::new(rg.id.clone()));
				let releasegroup = model.releasegroups_mut().find_child_mut(rg_idx)
					.expect("Just inserted above.");

				for release_id in &rg.releases {
					let rel_idx = releasegroup.releases_mut()
						.add_child_by_id(release_id, || Release::new(release_id.clone()));
					let release = releasegroup.releases_mut().find_child_mut(rel_idx)
						.expect("Just inserted above.");

					// Medium 0 is a staging area; real positions are filled
					// in by `resolve` once the metadata service responds.
					let staging = release.medium_at_mut(0);
					staging.recordings_mut().add_child_by_id(&rec.id, || Recording::new(rec.id.clone()));
					let recording = staging.recordings_mut().find_by_id_mut(&rec.id)
						.expect("Just inserted above.");
					recording.add_fingerprint(&m.result_id, m.stream_index, m.score);
				}
			}
		}
	}

	model
}

/// # Resolve Medium/Track Positions via the Metadata Service.
///
/// Submits one query per release currently in `model`, then — once each
/// answers — relocates that release's staged recordings onto the medium
/// and track position the metadata service reports, and records each
/// medium's disc TOC(s) for the [`crate::verifier`] to check against
/// AccurateRip/EAC.
///
/// ## Errors
///
/// Returns whatever the underlying [`MetadataService`] lookup failed with.
/// A release with no surviving recordings after relocation is left with an
/// empty staging medium; later reduction passes prune it.
pub fn resolve(model: &mut ResultModel, cfg: &RipIdConfig) -> Result<(), RipIdError> {
	let release_ids: Vec<String> = model.releasegroups().iter()
		.flat_map(|rg| rg.releases().iter().map(|r| Identified::id(r).to_owned()))
		.collect();

	if release_ids.is_empty() { return Ok(()); }

	let keys: Vec<MetadataKey> = release_ids.iter()
		.map(|id| query_key(id))
		.collect();
	for key in &keys { MetadataService::submit(key.clone()); }

	for (release_id, key) in release_ids.iter().zip(&keys) {
		let handle = MetadataService::get(key, release_id)?;
		if let Some(handle) = handle {
			apply_release(model, release_id, &handle, cfg);
		}
	}

	Ok(())
}

/// # Build the Metadata Query for One Release.
fn query_key(release_id: &str) -> MetadataKey {
	MetadataKey::new("release")
		.with_id(release_id)
		.with_resource("media+discids")
}

/// # Apply One Release's Metadata.
fn apply_release(model: &mut ResultModel, release_id: &str, handle: &ReleaseHandle, cfg: &RipIdConfig) {
	let Some(release) = find_release_mut(model, release_id) else { return; };

	release.set_title(&handle.title);
	release.set_metadata_distance(title_distance(cfg, &handle.title));

	let staged = drain_staging(release);

	for wm in &handle.media {
		apply_medium(release, wm, &staged);
	}

	// Anything that never matched a reported track position (e.g. the
	// metadata service omitted full track listings on this page) goes
	// back on the staging medium rather than vanishing outright; a later
	// Reducer pass prunes it once it's clear nothing else uses it.
	let placed: std::collections::HashSet<&str> = handle.media.iter()
		.flat_map(|wm| wm.tracks.iter().map(|t| t.recording.id.as_str()))
		.collect();
	let staging = release.medium_at_mut(0);
	for rec in staged {
		let id = Identified::id(&rec).to_owned();
		if !placed.contains(id.as_str()) {
			staging.recordings_mut().add_child_by_id(&id, move || rec);
		}
	}
}

/// # Find a Release by ID, Anywhere in the Tree.
fn find_release_mut<'a>(model: &'a mut ResultModel, release_id: &str) -> Option<&'a mut Release> {
	model.releasegroups_mut().iter_mut()
		.find(|rg| rg.releases().find_by_id(release_id).is_some())
		.and_then(|rg| rg.releases_mut().find_by_id_mut(release_id))
}

/// # Pull Every Recording Off the Staging Medium (Position 0).
fn drain_staging(release: &mut Release) -> Vec<Recording> {
	let staging = release.medium_at_mut(0);
	let mut out = Vec::with_capacity(staging.recordings().len());
	while let Some(rec) = staging.recordings_mut().erase_child(0) { out.push(rec); }
	out
}

/// # Apply One Wire Medium's Tracks/Discs to the Release.
fn apply_medium(release: &mut Release, wm: &WireMedium, staged: &[Recording]) {
	let position = wm.position as usize;
	let medium = release.medium_at_mut(position);
	medium.set_track_count(wm.track_count as usize);
	if let Some(fmt) = &wm.format { medium.set_format(fmt.clone()); }

	for wd in &wm.discs {
		medium.add_discid(wd.id.clone());
		if wd.offsets.is_empty() { continue; }

		let disc_idx = medium.discs_mut().add_child_by_id(&wd.id, || Disc::new(wd.id.clone()));
		let disc = medium.discs_mut().find_child_mut(disc_idx).expect("Just inserted above.");
		disc.set_toc(wd.offsets.clone(), wd.sectors);

		for (i, window) in wd.offsets.windows(2).enumerate() {
			disc.set_sector_length(i + 1, window[1] - window[0]);
		}
		if let (Some(&last_offset), n) = (wd.offsets.last(), wd.offsets.len()) {
			if wd.sectors > last_offset { disc.set_sector_length(n, wd.sectors - last_offset); }
		}
	}

	for wt in &wm.tracks {
		let Some(rec) = staged.iter().find(|r| Identified::id(*r) == wt.recording.id) else { continue; };
		let mut rec = rec.clone();
		rec.set_position(position, wt.position as usize);

		let slot_idx = medium.recordings_mut().add_child_by_id(Identified::id(&rec), || rec.clone());
		let slot = medium.recordings_mut().find_child_mut(slot_idx).expect("Just inserted above.");
		slot.merge(&rec);
	}
}

/// # Title Distance.
///
/// Levenshtein distance between the metadata service's release title and
/// the one already configured (e.g. from a directory/file name), or `0`
/// when no comparison title is configured — there is nothing to call a
/// mismatch against.
fn title_distance(cfg: &RipIdConfig, mb_title: &str) -> u32 {
	cfg.comparison_title()
		.map_or(0, |stream_title| strsim::levenshtein(stream_title, mb_title) as u32)
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::mediator::fingerprint::{
		FingerprintRecording,
		FingerprintReleaseGroup,
	};

	fn sample_match() -> FingerprintMatch {
		FingerprintMatch {
			stream_index: 0,
			result_id: "res1".to_owned(),
			score: 0.9,
			recordings: vec![FingerprintRecording {
				id: "rec1".to_owned(),
				releasegroups: vec![FingerprintReleaseGroup {
					id: "rg1".to_owned(),
					releases: vec!["rel1".to_owned()],
				}],
			}],
		}
	}

	#[test]
	fn t_seed_builds_staging_tree() {
		let matches = vec![sample_match()];
		let model = seed(&matches);
		assert_eq!(model.result_count(0), 1);

		let rg = model.releasegroups().find_by_id("rg1").expect("releasegroup");
		let rel = rg.releases().find_by_id("rel1").expect("release");
		assert_eq!(rel.media().len(), 1);
		let staging = rel.media().find_child(0).expect("staging medium");
		assert!(staging.recordings().find_by_id("rec1").is_some());
	}

	#[test]
	fn t_seed_merges_repeat_matches() {
		let mut m2 = sample_match();
		m2.stream_index = 1;
		let matches = vec![sample_match(), m2];
		let model = seed(&matches);
		assert_eq!(model.result_count(0), 1);
		assert_eq!(model.result_count(1), 1);

		let rg = model.releasegroups().find_by_id("rg1").expect("releasegroup");
		assert_eq!(rg.releases().len(), 1);
	}
}

/*!
# Ripid: Mediator — AccurateRip
*/

use crate::{
	RipIdError,
	Service,
};
use super::{
	fetch,
	host_override,
	RawStatus,
};
use cdtoc::Toc;
use std::sync::OnceLock;

type Cache = crate::Cache<String, Vec<AccurateRipDisc>>;

/// # Response Cache.
static CACHE: OnceLock<Cache> = OnceLock::new();

fn cache() -> &'static Cache { CACHE.get_or_init(Cache::new) }

/// # Diagnostic Cache Counters.
pub(crate) fn stats() -> &'static crate::CacheStats { cache().stats() }



#[derive(Debug, Clone, Eq, PartialEq)]
/// # AccurateRip Disc Record.
///
/// One pressing's worth of per-track checksums, per §4.4. A single disc ID
/// may have several of these (multiple known pressings).
pub struct AccurateRipDisc {
	/// # Disc ID1 (as echoed back by the record itself).
	pub disc_id1: u32,

	/// # Disc ID2.
	pub disc_id2: u32,

	/// # FreeDB/CDDB ID.
	pub disc_cddb: u32,

	/// # Per-track entries, in track order.
	pub tracks: Vec<AccurateRipTrack>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # AccurateRip Track Entry.
pub struct AccurateRipTrack {
	/// # Number of pressings this checksum has been confirmed against.
	pub confidence: u8,

	/// # AccurateRip v1/v2 CRC (format depends on which database version
	/// published the record).
	pub crc: u32,

	/// # Offset-finding CRC (legacy; only meaningful for track five).
	pub offset_crc: u32,
}



/// # Build a Table of Contents.
///
/// `offsets` are one-based track start sectors from the start of the disc,
/// *including* the 150-sector lead-in (i.e. raw TOC offsets), per §4.4/§6;
/// `leadout` is the disc's leadout sector, same coordinate system. Every
/// position is passed to `cdtoc` as an audio track — no data track is ever
/// supplied — so data tracks play no part in the derived disc IDs, per
/// spec's resolution to ignore them (matches the dominant AccurateRip
/// mirror behavior).
///
/// ## Errors
///
/// Returns [`RipIdError::Inconsistent`] if the offsets/leadout don't form a
/// valid table of contents (wrong ordering, too few tracks, etc).
fn toc(offsets: &[u32], leadout: u32) -> Result<Toc, RipIdError> {
	Ok(Toc::from_parts(offsets.to_vec(), None, leadout)?)
}

#[must_use]
/// # AccurateRip Checksum URL (Public Host).
///
/// Disc-ID derivation (d1/d2/cddb) is entirely `cdtoc`'s job — it already
/// encodes the audio/data-track distinction `Toc::from_parts` takes as
/// input, so there's no hand-rolled digit-sum/wrapping-add arithmetic here
/// to get wrong.
fn checksum_url(toc: &Toc) -> String { toc.accuraterip_id().checksum_url() }

#[must_use]
/// # Cache Key.
///
/// `cdtoc`'s own disc-ID display, unique per (d1, d2, cddb) combination and
/// derived from the same `Toc` as the fetch URL, so a cache key always
/// corresponds to the disc actually queried.
fn cache_key(toc: &Toc) -> String { format!("{}/{}", toc.accuraterip_id(), toc.cddb_id()) }

#[must_use]
/// # Re-Host a URL.
///
/// Swaps `default_url`'s host for `host`, used to try a configured helper
/// host before falling back to the public AccurateRip host.
fn rehost(default_url: &str, host: &str) -> String {
	match default_url.split_once("://").and_then(|(scheme, rest)| {
		rest.split_once('/').map(|(_, path)| format!("{scheme}://{host}/{path}"))
	}) {
		Some(u) => u,
		None => default_url.to_owned(),
	}
}



#[must_use]
/// # Parse AccurateRip Response Body.
///
/// Parses zero or more concatenated records per §4.4. A record whose
/// declared track count would run past the end of the buffer is dropped;
/// anything already parsed is still returned, matching the "must accept
/// partial input" requirement without panicking on a truncated tail.
pub(crate) fn parse(mut body: &[u8]) -> Vec<AccurateRipDisc> {
	let mut out = Vec::new();

	while body.len() >= 13 {
		let track_count = body[0];
		let disc_id1 = u32::from_le_bytes([body[1], body[2], body[3], body[4]]);
		let disc_id2 = u32::from_le_bytes([body[5], body[6], body[7], body[8]]);
		let disc_cddb = u32::from_le_bytes([body[9], body[10], body[11], body[12]]);

		let need = 13 + usize::from(track_count) * 9;
		if body.len() < need { break; }

		let mut tracks = Vec::with_capacity(usize::from(track_count));
		let mut rest = &body[13..need];
		while rest.len() >= 9 {
			let confidence = rest[0];
			let crc = u32::from_le_bytes([rest[1], rest[2], rest[3], rest[4]]);
			let offset_crc = u32::from_le_bytes([rest[5], rest[6], rest[7], rest[8]]);
			tracks.push(AccurateRipTrack { confidence, crc, offset_crc });
			rest = &rest[9..];
		}

		out.push(AccurateRipDisc { disc_id1, disc_id2, disc_cddb, tracks });
		body = &body[need..];
	}

	out
}



/// # Fetch (Cache-Through).
///
/// ## Errors
///
/// Returns a network/timeout error on transport failure; a successful
/// not-found is represented as `Ok(Vec::new())`, not an error.
pub fn fetch_discs(offsets: &[u32], leadout: u32) -> Result<Vec<AccurateRipDisc>, RipIdError> {
	let t = toc(offsets, leadout)?;
	let key = cache_key(&t);

	if let Some(entry) = cache().lookup(&key) {
		return Ok(entry.value().cloned().unwrap_or_default());
	}

	crate::limiter(Service::AccurateRip).acquire()?;
	let (status, body) = fetch_disc_bin(&t)?;

	let entry = match status {
		RawStatus::NotFound => crate::Entry::not_found(),
		RawStatus::Ok => crate::Entry::success(parse(&body)),
	};
	let value = entry.value().cloned().unwrap_or_default();
	cache().insert(key, entry);
	Ok(value)
}

/// # Fetch, Preferring a Configured Host Helper.
///
/// Tries [`host_override`]'s host first, if one is set, falling back to
/// the public AccurateRip host on a connection failure or 404.
fn fetch_disc_bin(t: &Toc) -> Result<(RawStatus, Vec<u8>), RipIdError> {
	let default_url = checksum_url(t);

	if let Some(host) = host_override(Service::AccurateRip) {
		match fetch(&rehost(&default_url, host)) {
			Ok((RawStatus::Ok, body)) => return Ok((RawStatus::Ok, body)),
			Ok((RawStatus::NotFound, _)) | Err(_) => {},
		}
	}
	fetch(&default_url)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_toc_rejects_bad_offsets() {
		// A leadout before the sole track start isn't a valid TOC.
		assert!(toc(&[1_000], 150).is_err());
	}

	#[test]
	fn t_checksum_url_is_deterministic_and_well_formed() {
		let t = toc(&[150, 17_412], 45_000).expect("Valid TOC.");
		let u = checksum_url(&t);
		assert!(u.starts_with("http://www.accuraterip.com/accuraterip/"));
		assert!(u.ends_with(".bin"));
		assert_eq!(u, checksum_url(&t), "Same TOC must derive the same URL every time.");
	}

	#[test]
	fn t_cache_key_matches_same_toc_only() {
		let a = toc(&[150, 17_412], 45_000).expect("Valid TOC.");
		let b = toc(&[150, 17_412], 45_000).expect("Valid TOC.");
		let c = toc(&[150, 20_000], 45_000).expect("Valid TOC.");
		assert_eq!(cache_key(&a), cache_key(&b));
		assert_ne!(cache_key(&a), cache_key(&c));
	}

	#[test]
	fn t_rehost_swaps_only_the_host() {
		let u = rehost("http://www.accuraterip.com/accuraterip/8/7/6/dBAR-003-x.bin", "localhost:8080");
		assert_eq!(u, "http://localhost:8080/accuraterip/8/7/6/dBAR-003-x.bin");
	}

	#[test]
	fn t_parse_one_record() {
		let mut body = Vec::new();
		body.push(2_u8);
		body.extend_from_slice(&1_u32.to_le_bytes());
		body.extend_from_slice(&2_u32.to_le_bytes());
		body.extend_from_slice(&3_u32.to_le_bytes());
		for conf in [5_u8, 7] {
			body.push(conf);
			body.extend_from_slice(&0xdead_beef_u32.to_le_bytes());
			body.extend_from_slice(&0xfeed_face_u32.to_le_bytes());
		}

		let discs = parse(&body);
		assert_eq!(discs.len(), 1);
		assert_eq!(discs[0].tracks.len(), 2);
		assert_eq!(discs[0].tracks[0].confidence, 5);
	}

	#[test]
	fn t_parse_truncated_tail_is_dropped_not_panicked() {
		let body = vec![5_u8, 1, 2, 3, 4, 5, 6, 7, 8]; // Declares 5 tracks, way too short.
		assert!(parse(&body).is_empty());
	}
}

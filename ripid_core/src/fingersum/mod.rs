/*!
# Ripid: Fingersum

The audio-signal engine (§4.3). A [`StreamCtx`] wraps one decoded audio
stream — one track, in practice — and lazily computes and caches the data
the rest of the pipeline needs from it: its sector count, its acoustic
fingerprint, and its AccurateRip/EAC checksums at any offset that gets
asked for.

None of this ever touches the network; that's the mediator's job.
*/

mod chk;

use crate::{
	RipIdError,
	Sample,
	SAMPLES_PER_SECTOR,
};
use chk::{
	checksum_eac_crc32,
	checksum_offset_detect,
	checksum_v1_v2,
	VirtualWindow,
};
use std::collections::BTreeMap;

pub use chk::TrackPosition;



/// # Fingerprint Backend.
///
/// Acoustic fingerprinting (Chromaprint or equivalent) is an external
/// collaborator; `ripid_core` only needs its output — a duration estimate
/// and an opaque fingerprint string — so the actual algorithm is pluggable
/// behind this trait rather than vendored in.
pub trait FingerprintBackend {
	/// # Fingerprint.
	///
	/// Returns the backend's estimate of the stream's duration in seconds
	/// alongside its compressed fingerprint string.
	///
	/// ## Errors
	///
	/// Returns an error if the backend cannot process the given samples.
	fn fingerprint(&self, samples: &[Sample], sample_rate: u32) -> Result<(f64, String), RipIdError>;
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Checksum Triple.
///
/// The full set of locally-derivable checksums for one track at one
/// candidate read offset, per §4.3.
pub struct ChecksumTriple {
	/// # Candidate read offset (in samples) this was computed at.
	pub offset: i32,

	/// # AccurateRip v1 checksum.
	pub v1: u32,

	/// # AccurateRip v2 checksum.
	pub v2: u32,

	/// # Offset-finding checksum (track five only).
	pub offset_detect: Option<u32>,

	/// # EAC CRC32 (skip-zero variant).
	pub eac_crc32: u32,
}



/// # Stream Context.
///
/// One decoded audio stream (track) plus everything [`Fingersum`] has
/// derived from it so far. Neighboring tracks' tail/head samples may be
/// supplied so checksums can be computed at non-zero offsets without
/// reading past either end of the medium.
pub struct StreamCtx {
	/// # Raw 16-bit stereo samples, native byte order preserved as bytes.
	samples: Vec<Sample>,

	/// # Tail of the previous track on the disc, if any.
	leader: Vec<Sample>,

	/// # Head of the next track on the disc, if any.
	trailer: Vec<Sample>,

	/// # Position of this track on its disc.
	position: TrackPosition,

	/// # PCM sample rate, typically `44_100`.
	sample_rate: u32,

	/// # Cached fingerprint result, once computed.
	fingerprint: Option<(f64, String)>,

	/// # Cached checksums, keyed by candidate offset.
	checksums: BTreeMap<i32, ChecksumTriple>,
}

impl StreamCtx {
	#[must_use]
	/// # New.
	pub fn new(samples: Vec<Sample>, position: TrackPosition, sample_rate: u32) -> Self {
		Self {
			samples,
			leader: Vec::new(),
			trailer: Vec::new(),
			position,
			sample_rate,
			fingerprint: None,
			checksums: BTreeMap::new(),
		}
	}

	#[must_use]
	/// # With Leader/Trailer.
	///
	/// Supply the neighboring tracks' tail and head samples (up to
	/// `5 * 588` each is all that is ever needed) so checksums can be
	/// computed at offsets that reach past this stream's own bounds.
	pub fn with_neighbors(mut self, leader: Vec<Sample>, trailer: Vec<Sample>) -> Self {
		self.leader = leader;
		self.trailer = trailer;
		self
	}

	#[must_use]
	/// # Raw Samples.
	///
	/// Exposed so a [`crate::workers::Pool`] job can clone out what it
	/// needs to fingerprint off-thread without holding a borrow of `s`
	/// across the call.
	pub fn samples(&self) -> &[Sample] { &self.samples }

	#[must_use]
	/// # Sample Count.
	pub const fn len(&self) -> usize { self.samples.len() }

	#[must_use]
	/// # Is Empty?
	pub const fn is_empty(&self) -> bool { self.samples.is_empty() }

	#[must_use]
	/// # Position.
	pub const fn position(&self) -> TrackPosition { self.position }

	#[must_use]
	/// # Sample Rate.
	pub const fn sample_rate(&self) -> u32 { self.sample_rate }

	#[must_use]
	/// # Cached Fingerprint.
	pub fn fingerprint(&self) -> Option<(f64, &str)> {
		self.fingerprint.as_ref().map(|(d, s)| (*d, s.as_str()))
	}

	#[must_use]
	/// # Checksums Already Computed at Offset.
	pub fn checksums(&self, offset: i32) -> Option<ChecksumTriple> {
		self.checksums.get(&offset).copied()
	}

	fn window(&self) -> VirtualWindow<'_> {
		VirtualWindow::new(
			if self.leader.is_empty() { None } else { Some(&self.leader) },
			&self.samples,
			if self.trailer.is_empty() { None } else { Some(&self.trailer) },
		)
	}
}



#[derive(Debug, Clone, Copy, Default)]
/// # Fingersum Engine.
///
/// A stateless facade over the checksum math in [`chk`](self::chk); all
/// per-stream state lives on [`StreamCtx`] itself. Kept as a unit struct so
/// the operations read as a named subsystem (`Fingersum::checksums_at(...)`)
/// rather than bare free functions, matching how the mediator's services are
/// organized.
pub struct Fingersum;

impl Fingersum {
	/// # Sector Count.
	///
	/// `⌊samples/588⌋`, per §3/§8: a partial trailing sector is dropped,
	/// not rounded up, so `sectors(s) * 588 <= sample_count(s) <
	/// (sectors(s)+1) * 588` holds for every stream.
	#[must_use]
	pub fn sectors(s: &StreamCtx) -> u32 {
		let per = u32::from(SAMPLES_PER_SECTOR);
		(s.len() as u32) / per
	}

	/// # Acoustic Fingerprint.
	///
	/// Delegates to `backend`, then caches the result on `s` so repeat
	/// calls are free.
	///
	/// ## Errors
	///
	/// Returns whatever error the backend returns.
	pub fn fingerprint(
		s: &mut StreamCtx,
		backend: &dyn FingerprintBackend,
	) -> Result<(f64, &str), RipIdError> {
		if s.fingerprint.is_none() {
			let result = backend.fingerprint(&s.samples, s.sample_rate)?;
			s.fingerprint = Some(result);
		}
		Ok(s.fingerprint()
			.expect("Fingerprint was just populated unconditionally above."))
	}

	/// # Record a Precomputed Fingerprint.
	///
	/// As [`Fingersum::fingerprint`], but for a result computed off-thread
	/// (e.g. by a [`crate::workers::Pool`]) rather than synchronously
	/// against `s`. A no-op if `s` already has a cached fingerprint.
	pub fn record_fingerprint(s: &mut StreamCtx, result: (f64, String)) {
		if s.fingerprint.is_none() { s.fingerprint = Some(result); }
	}

	/// # Checksums at Offset.
	///
	/// Compute (or fetch from cache) the AccurateRip v1/v2, offset-finding,
	/// and EAC CRC32 checksums for `s` shifted by `offset` samples.
	#[must_use]
	pub fn checksums_at(s: &mut StreamCtx, offset: i32) -> ChecksumTriple {
		if let Some(found) = s.checksums.get(&offset) { return *found; }

		let win = s.window();
		let (v1, v2) = checksum_v1_v2(&win, offset, s.position);
		let offset_detect = checksum_offset_detect(&win, offset, s.position);
		let eac_crc32 = checksum_eac_crc32(&win, offset, s.position);

		let triple = ChecksumTriple { offset, v1, v2, offset_detect, eac_crc32 };
		s.checksums.insert(offset, triple);
		triple
	}

	/// # Add Candidate Offset.
	///
	/// Convenience wrapper that computes and discards the result; useful
	/// when a caller wants to pre-warm the cache for a batch of offsets
	/// without holding onto each [`ChecksumTriple`] individually.
	pub fn add_offset(s: &mut StreamCtx, offset: i32) { let _ = Self::checksums_at(s, offset); }

	/// # Find Read Offset (AccurateRip).
	///
	/// Searches `candidates` for an offset whose v1 or v2 checksum matches
	/// `target_v1`/`target_v2`, returning the first match. Candidates are
	/// tried in the order given, so callers should order by likelihood
	/// (e.g. `0` first, then the common pressing-drive offsets).
	#[must_use]
	pub fn find_offset(
		s: &mut StreamCtx,
		candidates: &[i32],
		target_v1: u32,
		target_v2: u32,
	) -> Option<i32> {
		candidates.iter().copied().find(|&offset| {
			let c = Self::checksums_at(s, offset);
			c.v1 == target_v1 || c.v2 == target_v2
		})
	}

	/// # Find Read Offset (EAC).
	///
	/// As [`Fingersum::find_offset`], but matches against an EAC CRC32
	/// value instead of an AccurateRip pair.
	#[must_use]
	pub fn find_offset_eac(
		s: &mut StreamCtx,
		candidates: &[i32],
		target_crc32: u32,
	) -> Option<i32> {
		candidates.iter().copied()
			.find(|&offset| Self::checksums_at(s, offset).eac_crc32 == target_crc32)
	}

	/// # Find Read Offset (Offset-Detection CRC).
	///
	/// As [`Fingersum::find_offset`], but matches against the legacy
	/// offset-finding checksum instead of a v1/v2 pair. Only ever returns
	/// `Some` for a stream sitting at track five; every other position's
	/// `offset_detect` is always `None` and so never equals `target`.
	#[must_use]
	pub fn find_offset_detect(
		s: &mut StreamCtx,
		candidates: &[i32],
		target: u32,
	) -> Option<i32> {
		candidates.iter().copied()
			.find(|&offset| Self::checksums_at(s, offset).offset_detect == Some(target))
	}
}



#[cfg(test)]
mod test {
	use super::*;

	struct StubBackend;
	impl FingerprintBackend for StubBackend {
		fn fingerprint(&self, samples: &[Sample], _rate: u32) -> Result<(f64, String), RipIdError> {
			Ok((samples.len() as f64 / 44_100.0, "stub-fp".to_owned()))
		}
	}

	fn track(number: u8, is_first: bool, is_last: bool, len: usize) -> StreamCtx {
		let samples = vec![[1, 0, 2, 0]; len];
		StreamCtx::new(samples, TrackPosition { is_first, is_last, number }, 44_100)
	}

	#[test]
	fn t_sectors_floors() {
		let s = track(1, true, true, 588 * 3 + 10);
		assert_eq!(Fingersum::sectors(&s), 3);
	}

	#[test]
	fn t_fingerprint_is_cached() {
		let mut s = track(2, false, false, 44_100);
		let backend = StubBackend;
		let (d1, _) = Fingersum::fingerprint(&mut s, &backend).unwrap();
		assert!(s.fingerprint().is_some());
		let (d2, _) = Fingersum::fingerprint(&mut s, &backend).unwrap();
		assert!((d1 - d2).abs() < f64::EPSILON);
	}

	#[test]
	fn t_checksums_at_caches_per_offset() {
		let mut s = track(3, false, false, 10_000);
		let a = Fingersum::checksums_at(&mut s, 0);
		let b = Fingersum::checksums_at(&mut s, 0);
		assert_eq!(a, b);
		let c = Fingersum::checksums_at(&mut s, 5);
		assert_ne!(a.v1, c.v1);
	}

	#[test]
	fn t_find_offset_matches_candidate() {
		let mut s = track(4, false, false, 10_000);
		let target = Fingersum::checksums_at(&mut s, 12);
		let found = Fingersum::find_offset(&mut s, &[0, 6, 12, -12], target.v1, target.v2);
		assert_eq!(found, Some(12));
	}

	#[test]
	fn t_find_offset_eac_matches_candidate() {
		let mut s = track(5, false, false, 10_000);
		let target = Fingersum::checksums_at(&mut s, -6);
		let found = Fingersum::find_offset_eac(&mut s, &[0, -6, 6], target.eac_crc32);
		assert_eq!(found, Some(-6));
	}

	#[test]
	fn t_add_offset_warms_cache() {
		let mut s = track(6, false, false, 5_000);
		Fingersum::add_offset(&mut s, 3);
		assert!(s.checksums(3).is_some());
	}

	#[test]
	fn t_find_offset_detect_matches_track_five_only() {
		let mut five = track(5, false, false, 10_000);
		let target = Fingersum::checksums_at(&mut five, 24).offset_detect.unwrap();
		assert_eq!(Fingersum::find_offset_detect(&mut five, &[0, 12, 24], target), Some(24));

		let mut other = track(2, false, false, 10_000);
		assert_eq!(Fingersum::find_offset_detect(&mut other, &[0, 12, 24], target), None);
	}
}

/*!
# Ripid: Fingersum Checksum Math

Pure functions over a virtual, offset-shifted sample window. None of this
touches the network or the cache; `fingersum::StreamCtx` is the stateful
wrapper that calls into here.
*/

use crate::{
	Sample,
	SAMPLES_PER_SECTOR,
};
use crc32fast::Hasher as Crc;

/// # Offset-Detection Window (Samples).
///
/// The legacy AccurateRip offset-finding checksum is a 450-sample window.
const OFFSET_DETECT_WINDOW: usize = 450;

/// # Null Sample.
const NULL_SAMPLE: Sample = [0, 0, 0, 0];



/// # Virtual Sample Window.
///
/// Stitches together the tail of a (possibly absent) preceding track, this
/// track's own samples, and the head of a (possibly absent) following
/// track, so an offset of up to ±5×588 samples can be applied without the
/// caller having to manually juggle three slices. Positions outside all
/// three ranges are treated as silence (zero-padded), per §4.3.
pub(crate) struct VirtualWindow<'a> {
	/// # Tail of the previous track, if any.
	leader: Option<&'a [Sample]>,

	/// # This track's own samples.
	own: &'a [Sample],

	/// # Head of the next track, if any.
	trailer: Option<&'a [Sample]>,
}

impl<'a> VirtualWindow<'a> {
	/// # New.
	pub(crate) const fn new(
		leader: Option<&'a [Sample]>,
		own: &'a [Sample],
		trailer: Option<&'a [Sample]>,
	) -> Self {
		Self { leader, own, trailer }
	}

	/// # Sample at Virtual Position.
	///
	/// `pos` is an index into `own`'s coordinate system, already shifted by
	/// the candidate offset; it may be negative or beyond `own.len()`.
	fn sample_at(&self, pos: i64) -> Sample {
		let len = self.own.len() as i64;
		if pos < 0 {
			match self.leader {
				Some(l) => {
					let idx = l.len() as i64 + pos;
					if idx >= 0 && idx < l.len() as i64 { l[idx as usize] }
					else { NULL_SAMPLE }
				},
				None => NULL_SAMPLE,
			}
		}
		else if pos < len { self.own[pos as usize] }
		else {
			match self.trailer {
				Some(t) => {
					let idx = pos - len;
					if idx >= 0 && idx < t.len() as i64 { t[idx as usize] }
					else { NULL_SAMPLE }
				},
				None => NULL_SAMPLE,
			}
		}
	}
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Track Position (within its disc).
pub struct TrackPosition {
	/// # First audio track on the disc?
	pub is_first: bool,

	/// # Last audio track on the disc?
	pub is_last: bool,

	/// # One-based track number.
	pub number: u8,
}

impl TrackPosition {
	#[must_use]
	/// # Is This Track Five?
	///
	/// The legacy AccurateRip offset-finding checksum is always computed
	/// against track five of a disc.
	pub const fn is_track_five(self) -> bool { self.number == 5 }
}



#[must_use]
/// # AccurateRip v1 + v2 Checksums.
///
/// Computes both flavors in one pass, per §4.3: `v1` is the modular-32-bit
/// sum of `i × sample[i]`; `v2` accumulates the same product's high and low
/// 32-bit halves, still folded modulo 2^32 at every step. The first track
/// omits its first `5×588+1` samples; the last track omits its last `5×588`
/// samples; interior tracks use the full range.
pub(crate) fn checksum_v1_v2(win: &VirtualWindow, offset: i32, pos: TrackPosition) -> (u32, u32) {
	let len = win.own.len();
	let lead_trim = if pos.is_first { usize::from(SAMPLES_PER_SECTOR) * 5 + 1 } else { 0 };
	let tail_trim = if pos.is_last { usize::from(SAMPLES_PER_SECTOR) * 5 } else { 0 };

	if lead_trim + tail_trim >= len { return (0, 0); }

	let mut v1: u32 = 0;
	let mut v2: u32 = 0;

	// `i` is the one-based sample index within the (untrimmed) track;
	// `idx` is the zero-based position fed to the virtual window.
	for i in (lead_trim + 1)..=(len - tail_trim) {
		let idx = i as i64 - 1 + i64::from(offset);
		let sample = win.sample_at(idx);
		let v = u32::from_le_bytes(sample);
		let k = i as u32;
		let kv = u64::from(k) * u64::from(v);

		v1 = v1.wrapping_add((kv & 0xFFFF_FFFF) as u32);
		v2 = v2.wrapping_add(((kv >> 32) as u32).wrapping_add((kv & 0xFFFF_FFFF) as u32));
	}

	(v1, v2)
}

#[must_use]
/// # Offset-Detection Checksum.
///
/// The legacy v1-style weighted sum, restricted to a 450-sample window near
/// the end of track five's virtual position. Returns `None` for any other
/// track, or if the track is too short to hold the window.
pub(crate) fn checksum_offset_detect(win: &VirtualWindow, offset: i32, pos: TrackPosition) -> Option<u32> {
	if !pos.is_track_five() { return None; }

	let len = win.own.len();
	if len < OFFSET_DETECT_WINDOW { return None; }

	let start = len - OFFSET_DETECT_WINDOW;
	let mut v1: u32 = 0;
	for i in (start + 1)..=len {
		let idx = i as i64 - 1 + i64::from(offset);
		let sample = win.sample_at(idx);
		let v = u32::from_le_bytes(sample);
		let k = i as u32;
		let kv = u64::from(k) * u64::from(v);
		v1 = v1.wrapping_add((kv & 0xFFFF_FFFF) as u32);
	}

	Some(v1)
}

#[must_use]
/// # EAC CRC32 (Skip-Zero).
///
/// A zlib-standard CRC32 over the sample byte stream with leading and
/// trailing runs of all-zero (silent) sample frames excluded, per §4.3.
pub(crate) fn checksum_eac_crc32(win: &VirtualWindow, offset: i32, pos: TrackPosition) -> u32 {
	let len = win.own.len();
	let lead_trim = if pos.is_first { usize::from(SAMPLES_PER_SECTOR) * 5 + 1 } else { 0 };
	let tail_trim = if pos.is_last { usize::from(SAMPLES_PER_SECTOR) * 5 } else { 0 };
	if lead_trim + tail_trim >= len { return 0; }

	let first = lead_trim + 1;
	let last = len - tail_trim;

	// Collect the shifted byte stream once so we can trim zero-runs from
	// both ends without re-deriving samples twice.
	let mut bytes: Vec<u8> = Vec::with_capacity((last - first + 1) * 4);
	for i in first..=last {
		let idx = i as i64 - 1 + i64::from(offset);
		bytes.extend_from_slice(&win.sample_at(idx));
	}

	let start = bytes.chunks_exact(4)
		.position(|c| c != NULL_SAMPLE)
		.map_or(bytes.len(), |n| n * 4);
	let end = bytes.chunks_exact(4).rev()
		.position(|c| c != NULL_SAMPLE)
		.map_or(0, |n| bytes.len() - n * 4);

	if start >= end { return 0; }

	let mut crc = Crc::new();
	crc.update(&bytes[start..end]);
	crc.finalize()
}



#[cfg(test)]
mod test {
	use super::*;

	fn sample(v: i32) -> Sample {
		let v = v as u16 as u32;
		[(v & 0xFF) as u8, (v >> 8) as u8, (v & 0xFF) as u8, (v >> 8) as u8]
	}

	#[test]
	fn t_checksum_v1_v2_interior_track() {
		let data: Vec<Sample> = (1..=10_i32).map(sample).collect();
		let win = VirtualWindow::new(None, &data, None);
		let pos = TrackPosition { is_first: false, is_last: false, number: 2 };
		let (v1, v2) = checksum_v1_v2(&win, 0, pos);
		// Every sample participates for an interior track; just confirm
		// that something was accumulated (exact expected value is exercised
		// by the longer fixture tests in `fingersum::test`).
		assert_ne!((v1, v2), (0, 0));
	}

	#[test]
	fn t_checksum_v1_v2_short_track_returns_zero() {
		let data: Vec<Sample> = vec![sample(1); 10];
		let win = VirtualWindow::new(None, &data, None);
		let pos = TrackPosition { is_first: true, is_last: true, number: 1 };
		assert_eq!(checksum_v1_v2(&win, 0, pos), (0, 0));
	}

	#[test]
	fn t_offset_detect_only_track_five() {
		let data: Vec<Sample> = vec![sample(1); 1000];
		let win = VirtualWindow::new(None, &data, None);
		let pos4 = TrackPosition { is_first: false, is_last: false, number: 4 };
		let pos5 = TrackPosition { is_first: false, is_last: false, number: 5 };
		assert!(checksum_offset_detect(&win, 0, pos4).is_none());
		assert!(checksum_offset_detect(&win, 0, pos5).is_some());
	}

	#[test]
	fn t_eac_skip_zero_ignores_silence() {
		let mut data: Vec<Sample> = vec![NULL_SAMPLE; 20];
		for s in data.iter_mut().skip(5).take(10) { *s = sample(42); }
		let win = VirtualWindow::new(None, &data, None);
		let pos = TrackPosition { is_first: false, is_last: false, number: 2 };
		let with_silence = checksum_eac_crc32(&win, 0, pos);

		let trimmed: Vec<Sample> = data[5..15].to_vec();
		let win2 = VirtualWindow::new(None, &trimmed, None);
		let without_silence = checksum_eac_crc32(&win2, 0, pos);

		assert_eq!(with_silence, without_silence);
	}
}

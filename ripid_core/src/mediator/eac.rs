/*!
# Ripid: Mediator — EAC
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
use std::sync::OnceLock;

/// # Default (Public) Host.
const DEFAULT_HOST: &str = "www.accuraterip.com";

/// # Header Magic.
const MAGIC1: u32 = 0x9f3c_29aa;

/// # Whole/Partial Section Separator Magic.
const MAGIC2: u32 = 0x6ba2_eac3;

/// # Trailer Magic.
const MAGIC3: u32 = 0x1e49_32fe;

type Cache = crate::Cache<String, EacDisc>;

/// # Response Cache.
static CACHE: OnceLock<Cache> = OnceLock::new();

fn cache() -> &'static Cache { CACHE.get_or_init(Cache::new) }

/// # Diagnostic Cache Counters.
pub(crate) fn stats() -> &'static crate::CacheStats { cache().stats() }



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # EAC CRC Block.
///
/// One submission's worth of data for a single track, in either the
/// whole-track or partial-track section. Field order is taken directly
/// from the original `struct _block_eac` (`crc32`, `count`, `date`) since
/// the wire description's prose is ambiguous about ordering.
pub struct EacBlock {
	/// # CRC32 of the (whole or partial) track.
	pub crc32: u32,

	/// # Number of submissions with this CRC.
	pub count: u32,

	/// # Submission date (EAC-internal; not needed to verify).
	pub date: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// # EAC Per-Track Entry.
pub struct EacTrack {
	/// # Whole-track CRC32 blocks.
	pub whole: Vec<EacBlock>,

	/// # Partial-track CRC32 blocks (used for read-offset detection).
	pub partial: Vec<EacBlock>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
/// # EAC Disc Record.
pub struct EacDisc {
	/// # EAC-internal format date; not needed to verify tracks.
	pub date: u32,

	/// # Per-track entries, in track order.
	pub tracks: Vec<EacTrack>,
}



struct Cursor<'a> { buf: &'a [u8] }

impl<'a> Cursor<'a> {
	fn u32(&mut self) -> Result<u32, RipIdError> {
		if self.buf.len() < 4 { return Err(RipIdError::Parse("truncated EAC response".to_owned())); }
		let (head, tail) = self.buf.split_at(4);
		self.buf = tail;
		Ok(u32::from_le_bytes([head[0], head[1], head[2], head[3]]))
	}

	fn magic(&mut self, expect: u32) -> Result<(), RipIdError> {
		let got = self.u32()?;
		if got == expect { Ok(()) }
		else { Err(RipIdError::Parse(format!("EAC magic mismatch: expected {expect:08x}, got {got:08x}"))) }
	}

	fn block(&mut self) -> Result<EacBlock, RipIdError> {
		let crc32 = self.u32()?;
		let count = self.u32()?;
		let date = self.u32()?;
		Ok(EacBlock { crc32, count, date })
	}

	fn section(&mut self, n_tracks: u32) -> Result<Vec<Vec<EacBlock>>, RipIdError> {
		let mut out = Vec::with_capacity(n_tracks as usize);
		for _ in 0..n_tracks {
			let n_blocks = self.u32()?;
			let mut blocks = Vec::with_capacity(n_blocks as usize);
			for _ in 0..n_blocks { blocks.push(self.block()?); }
			out.push(blocks);
		}
		Ok(out)
	}
}



/// # Parse EAC Response Body.
///
/// ## Errors
///
/// Returns [`RipIdError::Parse`] on any magic mismatch, short read, or
/// trailing bytes after the final magic, per §4.4.
pub(crate) fn parse(body: &[u8]) -> Result<EacDisc, RipIdError> {
	let mut c = Cursor { buf: body };

	let n_tracks_m1 = c.u32()?;
	let date = c.u32()?;
	c.magic(MAGIC1)?;

	let n_tracks = n_tracks_m1 + 1;
	let whole = c.section(n_tracks)?;
	c.magic(MAGIC2)?;
	let partial = c.section(n_tracks)?;
	c.magic(MAGIC3)?;

	if !c.buf.is_empty() {
		return Err(RipIdError::Parse("trailing bytes after EAC trailer magic".to_owned()));
	}

	let tracks = whole.into_iter().zip(partial)
		.map(|(whole, partial)| EacTrack { whole, partial })
		.collect();

	Ok(EacDisc { date, tracks })
}



#[must_use]
/// # Decode MusicBrainz Disc ID to Raw Bytes.
///
/// The metadata service's 28-char identifier is standard base-64 with
/// `. _ -` substituted for `+ / =`; decodes to 21 raw bytes.
pub fn decode_disc_id(id: &str) -> Option<[u8; 21]> {
	let restored: String = id.chars()
		.map(|c| match c {
			'.' => '+',
			'_' => '/',
			'-' => '=',
			other => other,
		})
		.collect();

	use base64::Engine;
	let raw = base64::engine::general_purpose::STANDARD.decode(restored).ok()?;
	raw.try_into().ok()
}

#[must_use]
/// # EAC URL.
pub fn url(host: &str, disc_id: &str, n_tracks: u8) -> Option<String> {
	let raw = decode_disc_id(disc_id)?;
	let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
	Some(format!(
		"http://{host}/crc/{:x}/{:x}/{:x}/{:x}/{hex}-{n_tracks}.bin",
		raw[0] >> 4, raw[0] & 0xf, raw[1] >> 4, raw[1] & 0xf,
	))
}

/// # Fetch (Cache-Through).
///
/// ## Errors
///
/// Returns a network/timeout error on transport failure, or a parse error
/// if the response body is malformed. A successful not-found is
/// represented as `Ok(None)`.
pub fn fetch_disc(disc_id: &str, n_tracks: u8) -> Result<Option<EacDisc>, RipIdError> {
	if decode_disc_id(disc_id).is_none() {
		return Err(RipIdError::Inconsistent("invalid MusicBrainz disc identifier"));
	}

	if let Some(entry) = cache().lookup(&disc_id.to_owned()) {
		return Ok(entry.value().cloned());
	}

	crate::limiter(Service::Eac).acquire()?;
	let (status, body) = fetch_disc_bin(disc_id, n_tracks)?;

	let entry = match status {
		RawStatus::NotFound => crate::Entry::not_found(),
		RawStatus::Ok => match parse(&body) {
			Ok(disc) => crate::Entry::success(disc),
			// A parse failure is cached as "no data" (§7), not re-raised on
			// every future lookup of the same key.
			Err(_) => crate::Entry::error(),
		},
	};
	let value = entry.value().cloned();
	cache().insert(disc_id.to_owned(), entry);
	Ok(value)
}

/// # Fetch, Preferring a Configured Host Helper.
fn fetch_disc_bin(disc_id: &str, n_tracks: u8) -> Result<(RawStatus, Vec<u8>), RipIdError> {
	if let Some(host) = host_override(Service::Eac) {
		if let Some(u) = url(host, disc_id, n_tracks) {
			match fetch(&u) {
				Ok((RawStatus::Ok, body)) => return Ok((RawStatus::Ok, body)),
				Ok((RawStatus::NotFound, _)) | Err(_) => {},
			}
		}
	}

	let u = url(DEFAULT_HOST, disc_id, n_tracks)
		.ok_or(RipIdError::Inconsistent("invalid MusicBrainz disc identifier"))?;
	fetch(&u)
}



#[cfg(test)]
mod test {
	use super::*;

	fn sample_body(n_tracks: u32) -> Vec<u8> {
		let mut buf = Vec::new();
		buf.extend_from_slice(&(n_tracks - 1).to_le_bytes());
		buf.extend_from_slice(&12345_u32.to_le_bytes());
		buf.extend_from_slice(&MAGIC1.to_le_bytes());
		for _ in 0..n_tracks {
			buf.extend_from_slice(&1_u32.to_le_bytes()); // n_blocks
			buf.extend_from_slice(&0xdead_beef_u32.to_le_bytes());
			buf.extend_from_slice(&5_u32.to_le_bytes());
			buf.extend_from_slice(&0_u32.to_le_bytes());
		}
		buf.extend_from_slice(&MAGIC2.to_le_bytes());
		for _ in 0..n_tracks {
			buf.extend_from_slice(&0_u32.to_le_bytes()); // n_blocks = 0
		}
		buf.extend_from_slice(&MAGIC3.to_le_bytes());
		buf
	}

	#[test]
	fn t_parse_well_formed() {
		let body = sample_body(3);
		let disc = parse(&body).expect("Well-formed body should parse.");
		assert_eq!(disc.tracks.len(), 3);
		assert_eq!(disc.tracks[0].whole[0].crc32, 0xdead_beef);
		assert!(disc.tracks[0].partial.is_empty());
	}

	#[test]
	fn t_parse_bad_magic() {
		let mut body = sample_body(1);
		body[8] ^= 0xff; // Corrupt MAGIC1.
		assert!(parse(&body).is_err());
	}

	#[test]
	fn t_parse_trailing_bytes() {
		let mut body = sample_body(1);
		body.push(0);
		assert!(parse(&body).is_err());
	}

	#[test]
	fn t_decode_disc_id_roundtrip() {
		use base64::Engine;
		let raw = [7_u8; 21];
		let encoded = base64::engine::general_purpose::STANDARD.encode(raw)
			.replace('+', ".").replace('/', "_").replace('=', "-");
		assert_eq!(decode_disc_id(&encoded), Some(raw));
	}
}

/*!
# Ripid: Mediator — FingerprintService
*/

use crate::{
	RipIdError,
	Service,
};
use super::{
	fetch,
	RawStatus,
};
use serde::Deserialize;
use std::sync::OnceLock;

/// # Lookup Endpoint.
const ENDPOINT: &str = "https://api.acoustid.org/v2/lookup";

type Cache = crate::Cache<String, Vec<FingerprintMatch>>;

/// # Response Cache, Keyed by Fingerprint String.
static CACHE: OnceLock<Cache> = OnceLock::new();

fn cache() -> &'static Cache { CACHE.get_or_init(Cache::new) }

/// # Diagnostic Cache Counters.
pub(crate) fn stats() -> &'static crate::CacheStats { cache().stats() }



#[derive(Debug, Clone)]
/// # One Submitted (Fingerprint, Duration) Pair.
pub struct FingerprintQuery {
	/// # Origin stream index, carried through to the result.
	pub stream_index: usize,

	/// # Compressed fingerprint string.
	pub fingerprint: String,

	/// # Stream duration, in seconds.
	pub duration_s: f64,
}

#[derive(Debug, Clone)]
/// # A Matched Result, Tagged Back to its Originating Stream.
pub struct FingerprintMatch {
	/// # Origin stream index.
	pub stream_index: usize,

	/// # AcoustID result identifier.
	pub result_id: String,

	/// # Match confidence, `0.0..=1.0`.
	pub score: f64,

	/// # Matching recordings, with their releasegroup/release ancestry.
	pub recordings: Vec<FingerprintRecording>,
}

#[derive(Debug, Clone)]
/// # A Recording Matched by a Fingerprint.
pub struct FingerprintRecording {
	/// # MusicBrainz recording ID.
	pub id: String,

	/// # Releasegroups this recording appears on.
	pub releasegroups: Vec<FingerprintReleaseGroup>,
}

#[derive(Debug, Clone)]
/// # A Releasegroup, as Seen From a Fingerprint Match.
pub struct FingerprintReleaseGroup {
	/// # MusicBrainz releasegroup ID.
	pub id: String,

	/// # Release IDs belonging to this group that carry the recording.
	pub releases: Vec<String>,
}



#[derive(Debug, Deserialize)]
struct WireResponse {
	status: String,
	#[serde(default)]
	results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
	id: String,
	#[serde(default)]
	score: f64,
	#[serde(default)]
	recordings: Vec<WireRecording>,
}

#[derive(Debug, Deserialize)]
struct WireRecording {
	id: String,
	#[serde(default)]
	releasegroups: Vec<WireReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct WireReleaseGroup {
	id: String,
	#[serde(default)]
	releases: Vec<WireRelease>,
}

#[derive(Debug, Deserialize)]
struct WireRelease { id: String }



/// # Fingerprint Service.
///
/// The caller submits pairs tagged with a stream index; `query` batches
/// them into a single AcoustID lookup and returns every match, each still
/// carrying its originating stream index, per §4.4/§6.
pub struct FingerprintService;

impl FingerprintService {
	/// # Query.
	///
	/// ## Errors
	///
	/// Returns a network/timeout/parse error if the batched request fails
	/// outright. Individual fingerprints with no matches simply contribute
	/// no entries to the returned vector.
	pub fn query(queries: &[FingerprintQuery], api_key: &str) -> Result<Vec<FingerprintMatch>, RipIdError> {
		let mut out = Vec::new();
		let mut uncached = Vec::new();

		for q in queries {
			if let Some(entry) = cache().lookup(&q.fingerprint) {
				if let Some(matches) = entry.value() {
					out.extend(matches.iter().cloned().map(|mut m| { m.stream_index = q.stream_index; m }));
				}
			}
			else { uncached.push(q); }
		}

		if uncached.is_empty() { return Ok(out); }

		for q in uncached {
			crate::limiter(Service::Fingerprint).acquire()?;
			let url = format!(
				"{ENDPOINT}?client={api_key}&meta=recordings+releasegroups+releases&duration={}&fingerprint={}",
				q.duration_s.round() as i64,
				urlencode(&q.fingerprint),
			);
			let (status, body) = fetch(&url)?;

			let matches = match status {
				RawStatus::NotFound => { cache().insert(q.fingerprint.clone(), crate::Entry::not_found()); Vec::new() },
				RawStatus::Ok => {
					let wire: WireResponse = serde_json::from_slice(&body)
						.map_err(|e| RipIdError::Parse(e.to_string()))?;
					if wire.status != "ok" {
						return Err(RipIdError::Parse(format!("fingerprint service returned status {}", wire.status)));
					}
					let parsed: Vec<FingerprintMatch> = wire.results.into_iter()
						.map(|r| FingerprintMatch {
							stream_index: q.stream_index,
							result_id: r.id,
							score: r.score,
							recordings: r.recordings.into_iter()
								.map(|rec| FingerprintRecording {
									id: rec.id,
									releasegroups: rec.releasegroups.into_iter()
										.map(|rg| FingerprintReleaseGroup {
											id: rg.id,
											releases: rg.releases.into_iter().map(|rel| rel.id).collect(),
										})
										.collect(),
								})
								.collect(),
						})
						.collect();
					cache().insert(q.fingerprint.clone(), crate::Entry::success(parsed.clone()));
					parsed
				},
			};
			out.extend(matches);
		}

		Ok(out)
	}
}

/// # Percent-Encode a Fingerprint String.
///
/// Chromaprint fingerprints only ever contain base64-url-safe characters,
/// but we encode defensively rather than assume.
fn urlencode(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for b in s.bytes() {
		match b {
			b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' =>
				out.push(b as char),
			_ => out.push_str(&format!("%{b:02X}")),
		}
	}
	out
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_urlencode_leaves_safe_chars() {
		assert_eq!(urlencode("abc-_.~123"), "abc-_.~123");
	}

	#[test]
	fn t_urlencode_escapes_others() {
		assert_eq!(urlencode("a b"), "a%20b");
	}

	#[test]
	fn t_wire_response_parses() {
		let json = r#"{"status":"ok","results":[{"id":"r1","score":0.95,"recordings":[{"id":"rec1","releasegroups":[{"id":"rg1","releases":[{"id":"rel1"}]}]}]}]}"#;
		let wire: WireResponse = serde_json::from_str(json).unwrap();
		assert_eq!(wire.status, "ok");
		assert_eq!(wire.results[0].recordings[0].releasegroups[0].releases[0].id, "rel1");
	}
}

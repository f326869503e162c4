/*!
# Ripid: Mediator — MetadataService
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
use serde::Deserialize;
use std::{
	collections::BTreeMap,
	sync::{
		mpsc,
		Condvar,
		Mutex,
		OnceLock,
	},
	thread::JoinHandle,
	time::Duration,
};

/// # Page Size.
const PAGE_SIZE: u32 = 25;

/// # Maximum 5xx Retries.
const MAX_RETRIES: u8 = 5;

/// # Retry Spacing.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// # Metadata Host.
const HOST: &str = "https://musicbrainz.org/ws/2";



#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
/// # Metadata Query Key.
///
/// Identifies one submitted lookup: an entity type, an optional ID (empty
/// for a filtered search), an optional sub-resource, and a sorted parameter
/// map (so equal queries always hash/compare equal regardless of the
/// caller's insertion order).
pub struct MetadataKey {
	/// # Entity, e.g. `"release"`.
	pub entity: String,

	/// # Entity ID, or empty for a filter-based search.
	pub id: String,

	/// # Sub-resource, or empty.
	pub resource: String,

	/// # Query parameters (`inc`, filter fields, etc).
	pub params: BTreeMap<String, String>,
}

impl MetadataKey {
	#[must_use]
	/// # New.
	pub fn new(entity: impl Into<String>) -> Self {
		Self { entity: entity.into(), id: String::new(), resource: String::new(), params: BTreeMap::new() }
	}

	#[must_use]
	/// # With ID.
	pub fn with_id(mut self, id: impl Into<String>) -> Self { self.id = id.into(); self }

	#[must_use]
	/// # With Resource.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self { self.resource = resource.into(); self }

	#[must_use]
	/// # With Parameter.
	pub fn with_param(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
		self.params.insert(k.into(), v.into());
		self
	}

	fn url(&self, offset: u32) -> String {
		let host = host_override(Service::Metadata).unwrap_or(HOST);
		let mut url = format!("{host}/{}", self.entity);
		if !self.id.is_empty() { url.push('/'); url.push_str(&self.id); }
		url.push_str("?fmt=json");
		if !self.resource.is_empty() { url.push_str(&format!("&inc={}", self.resource)); }
		for (k, v) in &self.params { url.push_str(&format!("&{k}={v}")); }
		url.push_str(&format!("&limit={PAGE_SIZE}&offset={offset}"));
		url
	}
}



#[derive(Debug, Clone, Deserialize)]
/// # Recording (as seen nested under a track).
pub struct Recording {
	/// # MusicBrainz recording ID.
	pub id: String,

	/// # Title.
	#[serde(default)]
	pub title: String,

	/// # Length, milliseconds.
	pub length: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
/// # Track.
pub struct Track {
	/// # One-based position on its medium.
	pub position: u32,

	/// # Matched recording.
	pub recording: Recording,
}

#[derive(Debug, Clone, Deserialize)]
/// # Medium.
pub struct Medium {
	/// # One-based position on its release.
	pub position: u32,

	/// # Format, e.g. `"CD"`; absent for some historical releases.
	#[serde(default)]
	pub format: Option<String>,

	/// # Tracks, in position order.
	#[serde(default)]
	pub tracks: Vec<Track>,

	/// # Disc identifiers attached to this medium, if requested via `discids`.
	#[serde(default)]
	pub discs: Vec<DiscId>,

	/// # Track count as declared by the metadata service (may exceed
	/// `tracks.len()` when a page omitted full track listings).
	#[serde(rename = "track-count", default)]
	pub track_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
/// # Disc Identifier.
///
/// `sectors`/`offsets` are only populated when the release was fetched
/// with `inc=discids`; a bare disc-ID lookup from a fingerprint match
/// carries neither, so both default to empty.
pub struct DiscId {
	/// # The 28-character MusicBrainz disc ID.
	pub id: String,

	/// # Leadout, in sectors.
	#[serde(default)]
	pub sectors: u32,

	/// # Per-track starting sector offsets, in track order.
	#[serde(default)]
	pub offsets: Vec<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
/// # Artist Credit Fragment.
pub struct ArtistCreditName {
	/// # Artist (or joinphrase-bearing credit) name.
	pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
/// # Release.
pub struct ReleaseHandle {
	/// # MusicBrainz release ID.
	pub id: String,

	/// # Title.
	#[serde(default)]
	pub title: String,

	/// # Artist credit, flattened to its constituent names.
	#[serde(rename = "artist-credit", default)]
	pub artist_credit: Vec<ArtistCreditName>,

	/// # Media, in position order.
	#[serde(default)]
	pub media: Vec<Medium>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePage {
	/// # A filter/browse response: a list of releases.
	Multi { releases: Vec<ReleaseHandle> },

	/// # A direct `/release/{id}` lookup: one release, un-nested.
	Single(ReleaseHandle),
}



type ResultMap = BTreeMap<MetadataKey, Result<Vec<ReleaseHandle>, RipIdError>>;

/// # Dispatcher Shared State.
struct Shared {
	/// # Completed lookups, keyed by request.
	results: Mutex<ResultMap>,

	/// # Signaled whenever a new result is stored.
	ready: Condvar,
}

/// # The Service's Single Worker Thread and its Submission Queue.
struct Dispatcher {
	/// # Submission queue (unbounded; the worker drains it FIFO).
	tx: mpsc::Sender<MetadataKey>,

	/// # Shared result map, polled by `get`.
	shared: std::sync::Arc<Shared>,

	/// # Worker join handle; kept alive for the process's lifetime.
	#[allow(dead_code, reason = "Retained so the worker thread is not detached/dropped early.")]
	handle: JoinHandle<()>,
}

static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();

fn dispatcher() -> &'static Dispatcher {
	DISPATCHER.get_or_init(|| {
		let (tx, rx) = mpsc::channel::<MetadataKey>();
		let shared = std::sync::Arc::new(Shared {
			results: Mutex::new(BTreeMap::new()),
			ready: Condvar::new(),
		});
		let worker_shared = std::sync::Arc::clone(&shared);
		let handle = std::thread::spawn(move || worker_loop(rx, &worker_shared));
		Dispatcher { tx, shared, handle }
	})
}

/// # Worker Loop.
///
/// Drains the submission queue FIFO, one query at a time, under the
/// service's shared [`RateLimiter`](crate::ratelimit::RateLimiter), and
/// stores each completed (or failed) lookup for `get` to retrieve.
fn worker_loop(rx: mpsc::Receiver<MetadataKey>, shared: &Shared) {
	while let Ok(key) = rx.recv() {
		let result = fetch_all_pages(&key);
		let mut guard = shared.results.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		guard.insert(key, result);
		drop(guard);
		shared.ready.notify_all();
	}
}

/// # Fetch All Pages for One Query.
fn fetch_all_pages(key: &MetadataKey) -> Result<Vec<ReleaseHandle>, RipIdError> {
	let mut out = Vec::new();
	let mut offset = 0_u32;

	loop {
		let page = fetch_page_with_retry(&key.url(offset))?;
		let page_len = page.len();
		out.extend(page);
		if page_len < PAGE_SIZE as usize { break; }
		offset += PAGE_SIZE;
	}

	Ok(out)
}

/// # Fetch One Page, Retrying on 5xx.
fn fetch_page_with_retry(url: &str) -> Result<Vec<ReleaseHandle>, RipIdError> {
	let mut attempts = 0;
	loop {
		crate::limiter(Service::Metadata).acquire()?;
		match fetch(url) {
			Ok((RawStatus::NotFound, _)) => return Ok(Vec::new()),
			Ok((RawStatus::Ok, body)) => return parse_page(&body),
			Err(RipIdError::Network(msg)) if is_5xx(&msg) && attempts < MAX_RETRIES => {
				attempts += 1;
				std::thread::sleep(RETRY_DELAY);
			},
			Err(e) => return Err(e),
		}
	}
}

fn is_5xx(msg: &str) -> bool {
	msg.strip_prefix("HTTP ")
		.and_then(|code| code.parse::<u16>().ok())
		.is_some_and(|code| (500..600).contains(&code))
}

fn parse_page(body: &[u8]) -> Result<Vec<ReleaseHandle>, RipIdError> {
	let page: WirePage = serde_json::from_slice(body).map_err(|e| RipIdError::Parse(e.to_string()))?;
	Ok(match page {
		WirePage::Multi { releases } => releases,
		WirePage::Single(release) => vec![release],
	})
}



/// # Metadata Service.
///
/// Asynchronous, rate-limited, cached lookups of releases by identifier or
/// filter, per §4.4. `submit` enqueues a query and returns immediately;
/// `get` blocks the caller until that query's result is ready.
pub struct MetadataService;

impl MetadataService {
	/// # Submit.
	///
	/// Enqueues `key` for the worker thread to process. A no-op (beyond the
	/// channel send) if the key is already queued or complete — the worker
	/// still processes it, but repeat submissions of the same key are
	/// harmless since `get` simply re-reads the same cached result.
	pub fn submit(key: MetadataKey) {
		let _res = dispatcher().tx.send(key);
	}

	/// # Get.
	///
	/// Blocks until `key`'s lookup has completed, then returns the release
	/// matching `release_id` (or the first release, if `release_id` is
	/// empty).
	///
	/// ## Errors
	///
	/// Returns whatever error the worker recorded for this query.
	pub fn get(key: &MetadataKey, release_id: &str) -> Result<Option<ReleaseHandle>, RipIdError> {
		let d = dispatcher();
		let mut guard = d.shared.results.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		while !guard.contains_key(key) {
			guard = d.shared.ready.wait(guard).unwrap_or_else(std::sync::PoisonError::into_inner);
		}

		let releases = guard.get(key).expect("Just confirmed present above.").clone()?;
		if release_id.is_empty() { return Ok(releases.into_iter().next()); }
		Ok(releases.into_iter().find(|r| r.id == release_id))
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_metadata_key_url_includes_params() {
		let key = MetadataKey::new("release")
			.with_id("abc")
			.with_resource("media+discids")
			.with_param("limit", "25");
		let url = key.url(25);
		assert!(url.contains("/release/abc"));
		assert!(url.contains("inc=media+discids"));
		assert!(url.contains("offset=25"));
	}

	#[test]
	fn t_is_5xx() {
		assert!(is_5xx("HTTP 503"));
		assert!(!is_5xx("HTTP 404"));
		assert!(!is_5xx("connection refused"));
	}

	#[test]
	fn t_parse_page_multi() {
		let json = r#"{"releases":[{"id":"r1","title":"T","artist-credit":[{"name":"A"}],"media":[]}]}"#;
		let releases = parse_page(json.as_bytes()).unwrap();
		assert_eq!(releases.len(), 1);
		assert_eq!(releases[0].id, "r1");
	}

	#[test]
	fn t_parse_page_single() {
		let json = r#"{"id":"r1","title":"T","media":[]}"#;
		let releases = parse_page(json.as_bytes()).unwrap();
		assert_eq!(releases.len(), 1);
		assert_eq!(releases[0].id, "r1");
	}
}

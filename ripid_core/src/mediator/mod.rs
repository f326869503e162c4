/*!
# Ripid: Mediator

The external-service layer (§4.4). Each of the three services below owns a
[`Cache`](crate::Cache) and a [`RateLimiter`](crate::ratelimit::RateLimiter)
obtained through [`crate::ratelimit::limiter`]; all three share one HTTP
[`Agent`] and one fetch-then-cache helper.

None of this is async; every call here blocks the calling thread, same as
`ureq` itself. The dispatcher-per-service shape described by the
specification is realized by whichever thread happens to be driving a given
service — `MetadataService` is the one genuinely stateful dispatcher
because pagination requires it to own a worker loop, so it gets one.
*/

mod accuraterip;
mod eac;
mod fingerprint;
mod ingest;
mod metadata;

pub use fingerprint::{
	FingerprintMatch,
	FingerprintQuery,
	FingerprintRecording,
	FingerprintReleaseGroup,
	FingerprintService,
};
pub use metadata::{
	MetadataKey,
	MetadataService,
	ReleaseHandle,
};
pub use accuraterip::{
	AccurateRipDisc,
	AccurateRipTrack,
};
pub use eac::EacDisc;
pub use ingest::{
	resolve,
	seed,
};

pub(crate) use accuraterip::fetch_discs as fetch_accuraterip_discs;
pub(crate) use eac::fetch_disc as fetch_eac_disc;

use crate::{
	RipIdError,
	Service,
};
use std::{
	sync::OnceLock,
	time::Duration,
};
use ureq::{
	Agent,
	AgentBuilder,
};



/// # Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!("ripid/", env!("CARGO_PKG_VERSION"));

/// # Shared HTTP Agent.
static AGENT: OnceLock<Agent> = OnceLock::new();

/// # User-Agent Override.
///
/// Set once, before any request is made, by [`set_user_agent`].
static USER_AGENT: OnceLock<String> = OnceLock::new();

/// # Override the User-Agent String.
///
/// No-op if a request has already constructed the shared agent, or if this
/// has already been called; first call wins.
pub fn set_user_agent(ua: String) { let _ = USER_AGENT.set(ua); }

/// # Per-Service Host Overrides.
///
/// Indexed by `Service as usize`. A "localhost helper" — some local process
/// fronting AccurateRip/EAC/MusicBrainz lookups — can be configured here;
/// each service's own `fetch_*` tries it first and falls back to the public
/// host on a connection failure or 404, per spec's Open Question on the
/// matter. No helper *protocol* is implemented; this is just the
/// host-substitution half of that mechanism.
static HOST_OVERRIDES: [OnceLock<String>; 4] = [
	OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new(),
];

/// # Set a Host Override for a Service.
///
/// First call wins for a given service, same as [`set_user_agent`].
pub fn set_host_override(service: Service, host: String) {
	let _ = HOST_OVERRIDES[service as usize].set(host);
}

#[must_use]
/// # Read a Service's Host Override, if Any.
pub(crate) fn host_override(service: Service) -> Option<&'static str> {
	HOST_OVERRIDES[service as usize].get().map(String::as_str)
}

/// # Shared Agent.
fn agent() -> &'static Agent {
	AGENT.get_or_init(|| {
		let ua = USER_AGENT.get().map_or(DEFAULT_USER_AGENT, String::as_str);
		AgentBuilder::new()
			.timeout(Duration::from_secs(15))
			.user_agent(ua)
			.max_idle_connections(0)
			.build()
	})
}



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Raw Fetch Outcome.
///
/// The result of one HTTP GET, before any service-specific parsing.
pub(crate) enum RawStatus { Ok, NotFound }

#[must_use]
/// # Cache Hit/Miss Summary.
///
/// One `(hits, misses, redundant)` triple per `Cache`-backed service, in
/// `AccurateRip, Eac, Fingerprint` order, for the binary's end-of-run
/// summary line (§0.2). `MetadataService` isn't included — its
/// dispatcher caches completed lookups in its own result map rather than
/// a [`crate::Cache`], so it carries no [`CacheStats`](crate::CacheStats).
pub fn cache_summary() -> [(&'static str, u64, u64, u64); 3] {
	let ar = accuraterip::stats();
	let eac = eac::stats();
	let fp = fingerprint::stats();
	[
		("AccurateRip", ar.hits(), ar.misses(), ar.redundant()),
		("EAC", eac.hits(), eac.misses(), eac.redundant()),
		("Fingerprint", fp.hits(), fp.misses(), fp.redundant()),
	]
}

/// # Fetch Raw Bytes.
///
/// GETs `url`, treating any 2xx as [`RawStatus::Ok`] and a 404 as
/// [`RawStatus::NotFound`] (a legitimate, cacheable non-match per §4.4).
/// Any other status or transport failure is a [`RipIdError::Network`] (or
/// [`RipIdError::Timeout`] if the underlying error was specifically a
/// timeout).
pub(crate) fn fetch(url: &str) -> Result<(RawStatus, Vec<u8>), RipIdError> {
	match agent().get(url).call() {
		Ok(res) => {
			let mut out = Vec::new();
			std::io::Read::read_to_end(&mut res.into_reader(), &mut out)
				.map_err(|e| RipIdError::Network(e.to_string()))?;
			Ok((RawStatus::Ok, out))
		},
		Err(ureq::Error::Status(404, _)) => Ok((RawStatus::NotFound, Vec::new())),
		Err(ureq::Error::Status(code, _)) => Err(RipIdError::Network(format!("HTTP {code}"))),
		Err(ureq::Error::Transport(t)) => {
			if matches!(t.kind(), ureq::ErrorKind::Io) && t.to_string().contains("timed out") {
				Err(RipIdError::Timeout(t.to_string()))
			}
			else { Err(RipIdError::Network(t.to_string())) }
		},
	}
}

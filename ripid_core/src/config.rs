/*!
# Ripid: Configuration

Runtime knobs for a verification run, builder-style: an immutable value
built up through chained `with_*` methods, then read back through
matching plain getters.
*/

use crate::ratelimit::Service;



#[derive(Debug, Clone, Copy)]
/// # Search Options.
///
/// Tuning for the [`crate::configsearch`]/[`crate::reducer`] passes
/// that don't need full strings or network handles, just numbers.
///
/// ```
/// use ripid_core::SearchOptions;
///
/// let opts = SearchOptions::default()
///     .with_min_confidence(2)
///     .with_offline(true);
///
/// assert_eq!(opts.min_confidence(), 2);
/// assert!(opts.offline());
/// ```
pub struct SearchOptions {
	/// # Minimum AccurateRip confidence a release must clear to be
	/// reported as verified, rather than merely "found".
	min_confidence: u32,

	/// # Skip every network-backed service; identify from local
	/// fingerprints/checksums only.
	offline: bool,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self { min_confidence: 1, offline: false }
	}
}

impl SearchOptions {
	#[must_use]
	/// # With Minimum Confidence.
	///
	/// The default is `1` — any confirmed match counts. Capped at
	/// `255`, the width of a single AccurateRip confidence byte.
	pub const fn with_min_confidence(self, mut min_confidence: u32) -> Self {
		if min_confidence > 255 { min_confidence = 255; }
		Self { min_confidence, ..self }
	}

	#[must_use]
	/// # With Offline Mode.
	///
	/// When `true`, the [`crate::verifier`] never calls the Mediator;
	/// releases are scored from whatever fingerprint/checksum evidence
	/// is already in the tree.
	pub const fn with_offline(self, offline: bool) -> Self {
		Self { offline, ..self }
	}

	#[must_use]
	/// # Minimum Confidence.
	pub const fn min_confidence(&self) -> u32 { self.min_confidence }

	#[must_use]
	/// # Offline?
	pub const fn offline(&self) -> bool { self.offline }
}



#[derive(Debug, Clone, Default)]
/// # Ripid Config.
///
/// Process-wide configuration: the fingerprint service API key, an
/// optional user-agent override for every HTTP client, per-service
/// host overrides (for self-hosted AccurateRip/EAC mirrors or a
/// metadata proxy), and the [`SearchOptions`] tuning above.
///
/// ```
/// use ripid_core::RipIdConfig;
///
/// let cfg = RipIdConfig::default()
///     .with_api_key("deadbeef")
///     .with_user_agent("myapp/1.0");
///
/// assert_eq!(cfg.api_key(), Some("deadbeef"));
/// ```
pub struct RipIdConfig {
	/// # AcoustID-style fingerprint service API key.
	api_key: Option<String>,

	/// # HTTP user-agent override, applied to every Mediator request.
	user_agent: Option<String>,

	/// # Per-service host overrides, e.g. a self-hosted AccurateRip
	/// mirror. Checked before falling back to the public host, per
	/// §4.4's "localhost helper" note.
	host_overrides: Vec<(Service, String)>,

	/// # A title to compare each matched release's metadata against
	/// (e.g. one derived from a directory or file name), for the
	/// `MISMATCH` diagnostics in §6. `None` if there's nothing local to
	/// compare against.
	comparison_title: Option<String>,

	/// # Search/verification tuning.
	search: SearchOptions,
}

impl RipIdConfig {
	#[must_use]
	/// # With API Key.
	pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	#[must_use]
	/// # With User-Agent.
	pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
		self.user_agent = Some(ua.into());
		self
	}

	#[must_use]
	/// # With Host Override.
	///
	/// Replaces any existing override for `service`.
	pub fn with_host_override(mut self, service: Service, host: impl Into<String>) -> Self {
		let host = host.into();
		if let Some(entry) = self.host_overrides.iter_mut().find(|(s, _)| *s == service) {
			entry.1 = host;
		}
		else { self.host_overrides.push((service, host)); }
		self
	}

	#[must_use]
	/// # With Search Options.
	pub const fn with_search(mut self, search: SearchOptions) -> Self {
		self.search = search;
		self
	}

	#[must_use]
	/// # With Comparison Title.
	pub fn with_comparison_title(mut self, title: impl Into<String>) -> Self {
		self.comparison_title = Some(title.into());
		self
	}

	#[must_use]
	/// # API Key.
	pub fn api_key(&self) -> Option<&str> { self.api_key.as_deref() }

	#[must_use]
	/// # User-Agent.
	pub fn user_agent(&self) -> Option<&str> { self.user_agent.as_deref() }

	#[must_use]
	/// # Host Override for a Service.
	pub fn host_override(&self, service: Service) -> Option<&str> {
		self.host_overrides.iter().find(|(s, _)| *s == service).map(|(_, h)| h.as_str())
	}

	#[must_use]
	/// # Search Options.
	pub const fn search(&self) -> SearchOptions { self.search }

	#[must_use]
	/// # Comparison Title.
	pub fn comparison_title(&self) -> Option<&str> { self.comparison_title.as_deref() }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_search_options_defaults() {
		let opts = SearchOptions::default();
		assert_eq!(opts.min_confidence(), 1);
		assert!(!opts.offline());
	}

	#[test]
	fn t_search_options_caps_confidence() {
		let opts = SearchOptions::default().with_min_confidence(9_999);
		assert_eq!(opts.min_confidence(), 255);
	}

	#[test]
	fn t_config_api_key_and_user_agent() {
		let cfg = RipIdConfig::default()
			.with_api_key("key123")
			.with_user_agent("ua/1.0");
		assert_eq!(cfg.api_key(), Some("key123"));
		assert_eq!(cfg.user_agent(), Some("ua/1.0"));
	}

	#[test]
	fn t_config_host_override_replaces() {
		let cfg = RipIdConfig::default()
			.with_host_override(Service::AccurateRip, "mirror1.example")
			.with_host_override(Service::AccurateRip, "mirror2.example");
		assert_eq!(cfg.host_override(Service::AccurateRip), Some("mirror2.example"));
		assert_eq!(cfg.host_override(Service::Eac), None);
	}
}

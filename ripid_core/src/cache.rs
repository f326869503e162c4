/*!
# Ripid: Cache
*/

use ahash::AHashMap;
use std::{
	hash::Hash,
	sync::RwLock,
};
use utc2k::Utc2k;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Response Status.
///
/// A cached entry's outcome. Both `Success` and `NotFound` are legitimate,
/// cacheable results per §4.2/§4.4; `Error` is cached too (so repeat lookups
/// don't re-hit a service that is already known to be failing for this key)
/// but is surfaced to callers as "no data" just the same.
pub enum Status {
	/// # A normal, populated response.
	Success,

	/// # HTTP 404 or equivalent.
	NotFound,

	/// # A parse or network failure.
	Error,
}

#[derive(Debug, Clone)]
/// # Cache Entry.
pub struct Entry<T> {
	/// # The parsed response, if any.
	value: Option<T>,

	/// # Success / not-found / error.
	status: Status,

	/// # When this entry was inserted, for diagnostics only.
	fetched_at: Utc2k,
}

impl<T> Entry<T> {
	#[must_use]
	/// # New Success Entry.
	pub fn success(value: T) -> Self {
		Self { value: Some(value), status: Status::Success, fetched_at: Utc2k::now() }
	}

	#[must_use]
	/// # New Not-Found Entry.
	pub fn not_found() -> Self {
		Self { value: None, status: Status::NotFound, fetched_at: Utc2k::now() }
	}

	#[must_use]
	/// # New Error Entry.
	pub fn error() -> Self {
		Self { value: None, status: Status::Error, fetched_at: Utc2k::now() }
	}

	#[must_use]
	/// # Status.
	pub const fn status(&self) -> Status { self.status }

	#[must_use]
	/// # Value.
	///
	/// Returns `None` for not-found/error entries, or the cached response
	/// for successful ones.
	pub const fn value(&self) -> Option<&T> { self.value.as_ref() }

	#[must_use]
	/// # Fetched At.
	pub const fn fetched_at(&self) -> Utc2k { self.fetched_at }
}



#[derive(Debug, Default)]
/// # Hit-rate Counters.
///
/// Maintained purely for diagnostics (§4.2).
pub struct CacheStats {
	/// # Successful lookups.
	hits: std::sync::atomic::AtomicU64,

	/// # Lookups that found nothing cached.
	misses: std::sync::atomic::AtomicU64,

	/// # Inserts that were discarded because the key already existed.
	redundant: std::sync::atomic::AtomicU64,
}

impl CacheStats {
	#[must_use]
	/// # Hits.
	pub fn hits(&self) -> u64 { self.hits.load(std::sync::atomic::Ordering::Relaxed) }

	#[must_use]
	/// # Misses.
	pub fn misses(&self) -> u64 { self.misses.load(std::sync::atomic::Ordering::Relaxed) }

	#[must_use]
	/// # Redundant Inserts.
	pub fn redundant(&self) -> u64 { self.redundant.load(std::sync::atomic::Ordering::Relaxed) }
}



/// # Cache.
///
/// A content-addressed, append-only, in-memory store, one per external
/// service. Entries are never evicted — the original workload is a single
/// album's worth of requests, so unbounded growth is an accepted tradeoff
/// (§9 Open Questions).
///
/// `insert` never overwrites an existing key; repeated inserts of the same
/// key keep the first value, matching §4.2's contract exactly.
pub struct Cache<K, V> {
	/// # The backing map.
	inner: RwLock<AHashMap<K, Entry<V>>>,

	/// # Diagnostic counters.
	stats: CacheStats,
}

impl<K, V> Default for Cache<K, V> {
	fn default() -> Self {
		Self { inner: RwLock::new(AHashMap::new()), stats: CacheStats::default() }
	}
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
	#[must_use]
	/// # New.
	pub fn new() -> Self { Self::default() }

	#[must_use]
	/// # Lookup.
	///
	/// A pure read; never blocks a writer for more than the duration of the
	/// read-lock acquisition.
	pub fn lookup(&self, key: &K) -> Option<Entry<V>> {
		let guard = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
		let found = guard.get(key).cloned();
		if found.is_some() {
			self.stats.hits.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
		}
		else {
			self.stats.misses.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
		}
		found
	}

	/// # Insert.
	///
	/// Append a new entry. If `key` already has an entry, this is a no-op;
	/// the first insert for any given key always wins.
	pub fn insert(&self, key: K, entry: Entry<V>) {
		let mut guard = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
		if guard.contains_key(&key) {
			self.stats.redundant.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
		}
		else {
			guard.insert(key, entry);
		}
	}

	#[must_use]
	/// # Diagnostic Counters.
	pub const fn stats(&self) -> &CacheStats { &self.stats }

	#[must_use]
	/// # Length.
	///
	/// Number of distinct keys currently cached.
	pub fn len(&self) -> usize {
		self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
	}

	#[must_use]
	/// # Is Empty?
	pub fn is_empty(&self) -> bool { self.len() == 0 }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_insert_never_overwrites() {
		let cache: Cache<&str, u32> = Cache::new();
		cache.insert("a", Entry::success(1));
		cache.insert("a", Entry::success(2));
		assert_eq!(cache.lookup(&"a").and_then(|e| e.value().copied()), Some(1));
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn t_lookup_missing() {
		let cache: Cache<&str, u32> = Cache::new();
		assert!(cache.lookup(&"nope").is_none());
		assert_eq!(cache.stats().misses(), 1);
	}

	#[test]
	fn t_not_found_is_cacheable() {
		let cache: Cache<&str, u32> = Cache::new();
		cache.insert("missing", Entry::not_found());
		let entry = cache.lookup(&"missing").expect("Not-found entries should still be cached.");
		assert!(matches!(entry.status(), Status::NotFound));
		assert!(entry.value().is_none());
	}
}

/*!
# Ripid: Rate Limiter
*/

use crate::RipIdError;
use std::{
	sync::{
		Mutex,
		OnceLock,
	},
	time::{
		Duration,
		Instant,
	},
};



#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
/// # External Service.
///
/// Each named service gets its own [`RateLimiter`] and [`Cache`](crate::Cache)
/// instance; this identifies which.
pub enum Service {
	/// # AccurateRip checksum database.
	AccurateRip,

	/// # EAC checksum database.
	Eac,

	/// # Acoustic fingerprint lookup service.
	Fingerprint,

	/// # Release metadata service.
	Metadata,
}

impl Service {
	/// # All Variants.
	///
	/// Used by callers (e.g. the binary) that need to forward a full set of
	/// per-service host overrides from [`crate::RipIdConfig`] into the
	/// global registry in [`crate::mediator`].
	pub const ALL: [Self; 4] = [Self::AccurateRip, Self::Eac, Self::Fingerprint, Self::Metadata];

	#[must_use]
	/// # Minimum Interval.
	///
	/// The minimum time that must elapse between two consecutive releases of
	/// this service's [`RateLimiter`]. One nanosecond is added to each to
	/// ensure the gate is never satisfied by a timer tied exactly to the
	/// published limit.
	pub const fn min_interval(self) -> Duration {
		match self {
			Self::AccurateRip | Self::Eac => Duration::new(0, 500_000_000 + 1),
			Self::Fingerprint => Duration::new(0, 333_333_333 + 1),
			Self::Metadata => Duration::new(1, 1),
		}
	}
}



/// # Rate Limiter.
///
/// A per-service minimum-interval gate. [`RateLimiter::acquire`] blocks the
/// caller until at least [`Service::min_interval`] has elapsed since the last
/// time the lock was released, then records the new release time and
/// returns.
///
/// The first ever call for a given limiter returns immediately; this mirrors
/// the original's "impossible" initial clock value.
pub struct RateLimiter {
	/// # Minimum gap between releases.
	interval: Duration,

	/// # Monotonic time of the last release, if any.
	last: Mutex<Option<Instant>>,
}

impl RateLimiter {
	/// # New.
	const fn new(interval: Duration) -> Self {
		Self { interval, last: Mutex::new(None) }
	}

	/// # Acquire.
	///
	/// Block until the minimum interval has elapsed since the last release,
	/// then record now as the new release time.
	///
	/// ## Errors
	///
	/// Returns [`RipIdError::Clock`] if the internal mutex is poisoned, e.g.
	/// because another thread panicked while holding it.
	pub fn acquire(&self) -> Result<(), RipIdError> {
		let mut guard = self.last.lock().map_err(|_| RipIdError::Clock)?;

		if let Some(last) = *guard {
			let target = last + self.interval;
			let now = Instant::now();
			if now < target {
				// Held across the sleep, same as the original holding its
				// pthread mutex through nanosleep(2); this keeps wake order
				// FIFO among contenders.
				std::thread::sleep(target - now);
			}
		}

		*guard = Some(Instant::now());
		Ok(())
	}
}



/// # AccurateRip Limiter.
static AR: OnceLock<RateLimiter> = OnceLock::new();

/// # EAC Limiter.
static EAC: OnceLock<RateLimiter> = OnceLock::new();

/// # Fingerprint Limiter.
static FINGERPRINT: OnceLock<RateLimiter> = OnceLock::new();

/// # Metadata Limiter.
static METADATA: OnceLock<RateLimiter> = OnceLock::new();

/// # Fetch the Process-Wide Limiter for a Service.
pub(crate) fn limiter(service: Service) -> &'static RateLimiter {
	let cell = match service {
		Service::AccurateRip => &AR,
		Service::Eac => &EAC,
		Service::Fingerprint => &FINGERPRINT,
		Service::Metadata => &METADATA,
	};
	cell.get_or_init(|| RateLimiter::new(service.min_interval()))
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_first_call_is_free() {
		let rl = RateLimiter::new(Duration::from_secs(5));
		let start = Instant::now();
		rl.acquire().expect("First acquire should never fail.");
		assert!(start.elapsed() < Duration::from_millis(50), "The first call should not block.");
	}

	#[test]
	fn t_second_call_waits() {
		let rl = RateLimiter::new(Duration::from_millis(60));
		rl.acquire().expect("First acquire should never fail.");
		let start = Instant::now();
		rl.acquire().expect("Second acquire should never fail.");
		assert!(start.elapsed() >= Duration::from_millis(55), "The second call should have waited.");
	}

	#[test]
	fn t_service_intervals_distinct() {
		assert!(Service::Fingerprint.min_interval() < Service::AccurateRip.min_interval());
		assert!(Service::AccurateRip.min_interval() < Service::Metadata.min_interval());
		assert_eq!(Service::AccurateRip.min_interval(), Service::Eac.min_interval());
	}

	#[test]
	fn t_service_all_covers_every_variant() {
		assert_eq!(Service::ALL.len(), 4);
		assert!(Service::ALL.contains(&Service::AccurateRip));
		assert!(Service::ALL.contains(&Service::Eac));
		assert!(Service::ALL.contains(&Service::Fingerprint));
		assert!(Service::ALL.contains(&Service::Metadata));
	}
}

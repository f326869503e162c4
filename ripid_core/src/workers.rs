/*!
# Ripid: Workers

A small, bounded pool of CPU-worker threads (§5) that drains a shared
queue of per-stream signal jobs (fingerprinting, checksum-set generation).
Jobs arrive continuously rather than in a single batch, so a fixed set of
long-lived threads drains a shared [`mpsc::Receiver`] instead of being
spawned and joined per call.
*/

use std::sync::{
	mpsc::{
		self,
		Receiver,
		Sender,
	},
	Arc,
	Mutex,
};
use std::thread::JoinHandle;



/// # Default Worker Count.
///
/// Matches §5's "small, bounded pool of CPU-worker threads (configured,
/// default 4)".
pub const DEFAULT_WORKERS: usize = 4;

/// # One Unit of Work.
///
/// `index` is carried through untouched so the caller can re-associate a
/// result with whatever it submitted it for (e.g. a stream index), since
/// jobs may complete out of order.
struct Job<R> {
	/// # Origin Index.
	index: usize,

	/// # The Work Itself.
	task: Box<dyn FnOnce() -> R + Send>,
}

#[derive(Debug)]
/// # A Tagged Result.
pub struct PoolOutput<R> {
	/// # Origin Index, as Submitted.
	pub index: usize,

	/// # The Job's Return Value.
	pub value: R,
}



/// # CPU-Worker Pool.
///
/// A fixed set of threads draining a shared job queue, each submission
/// tagged with an origin index so results — which may arrive out of
/// order — can be matched back up. Dropping the pool closes the job
/// queue and joins every worker.
pub struct Pool<R: Send + 'static> {
	/// # Job Queue, `None` once [`Pool::drop`] has closed it.
	tx: Option<Sender<Job<R>>>,

	/// # Worker Threads.
	handles: Vec<JoinHandle<()>>,
}

impl<R: Send + 'static> Pool<R> {
	#[must_use]
	/// # New.
	///
	/// Spins up `workers` threads (at least one), each blocking on the
	/// shared job queue until it closes. Returns the pool alongside the
	/// receiver its workers report results on.
	pub fn new(workers: usize) -> (Self, Receiver<PoolOutput<R>>) {
		let workers = workers.max(1);
		let (job_tx, job_rx) = mpsc::channel::<Job<R>>();
		let job_rx = Arc::new(Mutex::new(job_rx));
		let (out_tx, out_rx) = mpsc::channel::<PoolOutput<R>>();

		let mut handles = Vec::with_capacity(workers);
		for _ in 0..workers {
			let job_rx = Arc::clone(&job_rx);
			let out_tx = out_tx.clone();
			handles.push(std::thread::spawn(move || worker_loop(&job_rx, &out_tx)));
		}

		(Self { tx: Some(job_tx), handles }, out_rx)
	}

	/// # Submit a Job.
	///
	/// Silently dropped if every worker has already shut down (the pool
	/// is being torn down); callers that need a result for every `index`
	/// should track submissions themselves, the same way
	/// [`crate::mediator::metadata::MetadataService`] does for its own
	/// dispatcher queue.
	pub fn submit(&self, index: usize, task: impl FnOnce() -> R + Send + 'static) {
		if let Some(tx) = &self.tx {
			let _res = tx.send(Job { index, task: Box::new(task) });
		}
	}

	#[must_use]
	/// # Worker Count.
	pub fn workers(&self) -> usize { self.handles.len() }
}

/// # One Worker's Loop.
///
/// Exits on a poisoned lock (a sibling worker panicked mid-job) or a
/// closed job queue, same as on a closed result channel; none of these
/// are retried.
fn worker_loop<R: Send + 'static>(job_rx: &Arc<Mutex<Receiver<Job<R>>>>, out_tx: &Sender<PoolOutput<R>>) {
	loop {
		let Ok(rx) = job_rx.lock() else { break; };
		let job = rx.recv();
		drop(rx);

		match job {
			Ok(Job { index, task }) => {
				let value = task();
				if out_tx.send(PoolOutput { index, value }).is_err() { break; }
			},
			Err(_) => break,
		}
	}
}

impl<R: Send + 'static> Drop for Pool<R> {
	fn drop(&mut self) {
		// Dropping the sender closes the channel, so every worker's
		// blocking `recv` returns `Err` and exits its loop.
		drop(self.tx.take());
		for handle in self.handles.drain(..) { let _res = handle.join(); }
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use std::collections::BTreeSet;

	#[test]
	fn t_pool_runs_every_job() {
		let (pool, rx) = Pool::new(2);
		for i in 0..16 { pool.submit(i, move || i * 2); }
		drop(pool);

		let mut seen = BTreeSet::new();
		while let Ok(out) = rx.recv() {
			assert_eq!(out.value, out.index * 2);
			seen.insert(out.index);
		}
		assert_eq!(seen.len(), 16);
	}

	#[test]
	fn t_pool_default_workers_constant() {
		assert_eq!(DEFAULT_WORKERS, 4);
	}

	#[test]
	fn t_pool_reports_worker_count() {
		let (pool, _rx) = Pool::<()>::new(0);
		assert_eq!(pool.workers(), 1);
	}
}

/*!
# Rip Identifier!
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::allow_attributes,
	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::impl_trait_in_params,
	clippy::lossy_float_literal,
	clippy::missing_assert_message,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::pub_without_shorthand,
	clippy::rest_pat_in_fully_bound_structs,
	clippy::semicolon_inside_block,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::undocumented_unsafe_blocks,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,
	clippy::unwrap_in_result,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

mod chromaprint;
mod cli;

use chromaprint::ChromaprintBackend;
use fyi_msg::Msg;
use ripid_core::{
	mediator,
	output::{
		self,
		Mismatch,
	},
	verifier,
	workers::{
		self,
		Pool,
	},
	Fingersum,
	FingerprintBackend,
	KillSwitch,
	RipIdConfig,
	RipIdError,
	Sample,
	Service,
	StreamCtx,
	TrackPosition,
};
use std::{
	collections::BTreeMap,
	path::{
		Path,
		PathBuf,
	},
	sync::{
		atomic::{
			AtomicBool,
			Ordering::{
				Relaxed,
				SeqCst,
			},
		},
		Arc,
	},
};

/// # Offset-Search Radius, in Samples.
///
/// Five sectors' worth of neighboring-track samples is all the checksum
/// math in `ripid_core::fingersum` ever reaches past a stream's own
/// bounds for.
const NEIGHBOR_SAMPLES: usize = 5 * 588;



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() {
	match _main() {
		Ok(()) => {},
		Err(e @ (RipIdError::PrintHelp | RipIdError::PrintVersion)) => { println!("{e}"); },
		Err(e) => {
			Msg::from(e).eprint();
			std::process::exit(1);
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn _main() -> Result<(), RipIdError> {
	let (cfg, paths) = cli::parse()?;
	if let Some(ua) = cfg.user_agent() { mediator::set_user_agent(ua.to_owned()); }
	for service in Service::ALL {
		if let Some(host) = cfg.host_override(service) {
			mediator::set_host_override(service, host.to_owned());
		}
	}

	let killed = KillSwitch::default();
	sigint(killed.inner());

	let mut streams = load_streams(&paths)?;
	if streams.is_empty() { return Err(RipIdError::NoInput); }

	let backend = ChromaprintBackend;
	let mut fingerprints: BTreeMap<usize, Result<(f64, String), RipIdError>> = BTreeMap::new();
	if ! killed.killed() {
		let (pool, rx) = Pool::new(workers::DEFAULT_WORKERS.min(streams.len().max(1)));
		for (idx, stream) in streams.iter().enumerate() {
			let samples = stream.samples().to_vec();
			let rate = stream.sample_rate();
			pool.submit(idx, move || backend.fingerprint(&samples, rate));
		}
		for _ in 0..streams.len() {
			if let Ok(out) = rx.recv() { fingerprints.insert(out.index, out.value); }
		}
	}

	let mut queries = Vec::with_capacity(streams.len());
	for (idx, stream) in streams.iter_mut().enumerate() {
		match fingerprints.remove(&idx) {
			Some(Ok((duration_s, fingerprint))) => {
				Fingersum::record_fingerprint(stream, (duration_s, fingerprint.clone()));
				queries.push(mediator::FingerprintQuery { stream_index: idx, fingerprint, duration_s });
			},
			Some(Err(e)) => Msg::from(e).eprint(),
			None => {},
		}

		Fingersum::add_offset(stream, 0);
	}

	let stream_sectors: Vec<u32> = streams.iter().map(Fingersum::sectors).collect();

	if cfg.search().offline() || killed.killed() {
		print_offline_report(&streams, &stream_sectors);
		return Ok(());
	}

	let api_key = cfg.api_key()
		.ok_or_else(|| RipIdError::CliArg("-k/--api-key is required unless --offline is set".to_owned()))?;

	let matches = match mediator::FingerprintService::query(&queries, api_key) {
		Ok(m) => m,
		Err(e) => { Msg::from(e).eprint(); Vec::new() },
	};

	let mut model = mediator::seed(&matches);

	if let Err(e) = mediator::resolve(&mut model, &cfg) { Msg::from(e).eprint(); }

	verifier::run(&mut model, streams.len(), &stream_sectors, &mut streams);
	model.sort();

	output::print_report(&model);
	print_metadata_mismatches(&cfg, &model);
	output::print_cache_summary();

	Ok(())
}

/// # Load Streams From WAV Files.
///
/// Audio decoding proper is out of scope here; each input is assumed to
/// already be 16-bit/44.1kHz/stereo PCM, the shape a CD rip produces, and
/// `hound` does the file-format unwrapping. Neighboring tracks' tail/head
/// samples are stitched on as leader/trailer so offset-shifted checksums
/// never have to read past either end of the medium.
///
/// ## Errors
///
/// Returns an error if any file cannot be opened or fails to decode as PCM.
fn load_streams(paths: &[PathBuf]) -> Result<Vec<StreamCtx>, RipIdError> {
	let mut raw: Vec<Vec<Sample>> = Vec::with_capacity(paths.len());
	for path in paths {
		raw.push(load_wav(path)?);
	}

	let total = raw.len();
	let mut out = Vec::with_capacity(total);
	for (i, samples) in raw.iter().enumerate() {
		let position = TrackPosition {
			is_first: i == 0,
			is_last: i + 1 == total,
			number: u8::try_from(i + 1).unwrap_or(u8::MAX),
		};
		let leader = if i == 0 { Vec::new() } else { tail(&raw[i - 1], NEIGHBOR_SAMPLES) };
		let trailer = raw.get(i + 1).map_or_else(Vec::new, |next| head(next, NEIGHBOR_SAMPLES));

		out.push(StreamCtx::new(samples.clone(), position, 44_100).with_neighbors(leader, trailer));
	}

	Ok(out)
}

/// # Load One WAV File's Samples.
fn load_wav(path: &Path) -> Result<Vec<Sample>, RipIdError> {
	let mut reader = hound::WavReader::open(path)
		.map_err(|e| RipIdError::Decode(format!("{}: {e}", path.display())))?;

	let spec = reader.spec();
	if
		spec.channels != 2 ||
		spec.sample_rate != 44_100 ||
		spec.bits_per_sample != 16 ||
		spec.sample_format != hound::SampleFormat::Int
	{
		return Err(RipIdError::Decode(format!(
			"{}: expected 16-bit/44.1kHz/stereo PCM", path.display(),
		)));
	}

	let samples: Vec<i16> = reader.samples::<i16>()
		.collect::<Result<_, _>>()
		.map_err(|e| RipIdError::Decode(format!("{}: {e}", path.display())))?;

	Ok(
		samples.chunks_exact(2)
			.map(|pair| {
				let l = pair[0].to_le_bytes();
				let r = pair[1].to_le_bytes();
				[l[0], l[1], r[0], r[1]]
			})
			.collect()
	)
}

/// # Tail of a Track's Samples.
fn tail(samples: &[Sample], n: usize) -> Vec<Sample> {
	let start = samples.len().saturating_sub(n);
	samples[start..].to_vec()
}

/// # Head of a Track's Samples.
fn head(samples: &[Sample], n: usize) -> Vec<Sample> {
	samples[..samples.len().min(n)].to_vec()
}

/// # Print Metadata Mismatch Blocks.
///
/// One `MISMATCH title: mb=<x>; stream=<y>` line per surviving release
/// whose reported title disagrees with the configured comparison title,
/// per §6. Silent if no comparison title was configured — there is
/// nothing local to diff against.
fn print_metadata_mismatches(cfg: &RipIdConfig, model: &ripid_core::model::ResultModel) {
	let Some(stream_title) = cfg.comparison_title() else { return; };

	let mismatches: Vec<Mismatch<'_>> = model.releasegroups().iter()
		.flat_map(|rg| rg.releases().iter())
		.filter(|rel| rel.metadata_distance() > 0)
		.map(|rel| Mismatch { field: "title", mb: rel.title(), stream: stream_title })
		.collect();

	output::print_mismatches(&mismatches);
}

/// # Print an Offline Report.
///
/// No fingerprint/metadata/AccurateRip lookups are made; this is just a
/// dump of what `ripid_core::fingersum` could determine locally.
fn print_offline_report(streams: &[StreamCtx], stream_sectors: &[u32]) {
	for (i, stream) in streams.iter().enumerate() {
		let sectors = stream_sectors.get(i).copied().unwrap_or(0);
		let fp = stream.fingerprint().map_or("no fingerprint", |(_, s)| s);
		let checksums = stream.checksums(0);

		let line = checksums.map_or_else(
			|| format!("#{:02} ({sectors} sectors): {fp}", stream.position().number),
			|c| format!(
				"#{:02} ({sectors} sectors): {fp} [v1={:08x} v2={:08x} eac={:08x}]",
				stream.position().number, c.v1, c.v2, c.eac_crc32,
			),
		);

		Msg::custom("Stream", 69, &line).with_newline(true).print();
	}
}

/// # Set Up CTRL+C Handling.
///
/// Flips the kill switch on the first CTRL+C so the main loop can wind
/// down gracefully rather than leaving a half-identified run behind; a
/// second CTRL+C falls through to the default (immediate) handling.
fn sigint(killed: Arc<AtomicBool>) {
	let _res = ctrlc::set_handler(move || {
		let _res = killed.compare_exchange(false, true, SeqCst, Relaxed);
	});
}

/*!
# Rip Identifier: Chromaprint Backend
*/

use base64::Engine;
use ripid_core::{
	RipIdError,
	Sample,
};
use rusty_chromaprint::{
	Configuration,
	FingerprintCompressor,
	Fingerprinter,
};



#[derive(Debug, Clone, Copy, Default)]
/// # Chromaprint Fingerprint Backend.
///
/// The acoustic-fingerprinting collaborator `ripid_core` leaves pluggable
/// behind `FingerprintBackend`; this is the concrete implementation,
/// wrapping the pure-Rust `rusty-chromaprint` port so the binary needs no
/// `unsafe` FFI to the reference `libchromaprint`.
pub(super) struct ChromaprintBackend;

impl ripid_core::FingerprintBackend for ChromaprintBackend {
	fn fingerprint(&self, samples: &[Sample], sample_rate: u32) -> Result<(f64, String), RipIdError> {
		let config = Configuration::preset_test2();
		let mut printer = Fingerprinter::new(&config);
		printer.start(sample_rate, 2)
			.map_err(|e| RipIdError::Decode(e.to_string()))?;

		let mut pcm: Vec<i16> = Vec::with_capacity(samples.len() * 2);
		for s in samples {
			pcm.push(i16::from_le_bytes([s[0], s[1]]));
			pcm.push(i16::from_le_bytes([s[2], s[3]]));
		}
		printer.consume(&pcm);
		printer.finish();

		let raw = printer.fingerprint();
		let compressed = FingerprintCompressor::from(&config).compress(raw);
		let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(compressed);

		#[expect(clippy::cast_precision_loss, reason = "Sample counts never approach f64's precision limit.")]
		let duration_s = samples.len() as f64 / f64::from(sample_rate);

		Ok((duration_s, encoded))
	}
}

/*!
# Ripid: Library
*/

#![deny(
	clippy::allow_attributes_without_reason,
	clippy::correctness,
	unreachable_pub,
	unsafe_code,
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

#![expect(clippy::doc_markdown, reason = "Acronyms like `CRC32`/`EAC` make this noisy.")]

mod abort;
mod cache;
pub mod config;
pub mod configsearch;
mod error;
mod fingersum;
pub mod mediator;
pub mod model;
pub mod output;
mod ratelimit;
pub mod reducer;
pub mod verifier;
pub mod workers;

pub use abort::KillSwitch;
pub use cache::{
	Cache,
	CacheStats,
	Entry,
	Status,
};
pub use config::{
	RipIdConfig,
	SearchOptions,
};
pub use error::RipIdError;
pub use fingersum::{
	ChecksumTriple,
	Fingersum,
	FingerprintBackend,
	StreamCtx,
	TrackPosition,
};
pub use ratelimit::Service;
pub(crate) use ratelimit::limiter;



/// # 16-bit Stereo Sample (raw PCM bytes).
pub type Sample = [u8; 4];

/// # Samples per sector.
const SAMPLES_PER_SECTOR: u16 = 588;

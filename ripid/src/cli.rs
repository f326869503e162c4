/*!
# Rip Identifier: CLI
*/

use argyle::Argument;
use dactyl::traits::BytesToUnsigned;
use ripid_core::{
	RipIdConfig,
	RipIdError,
	SearchOptions,
};
use std::path::PathBuf;



/// # Options Return Type.
pub(super) type Parsed = (RipIdConfig, Vec<PathBuf>);



/// # Parse Options.
pub(super) fn parse() -> Result<Parsed, RipIdError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut cfg = RipIdConfig::default();
	let mut search = SearchOptions::default().with_min_confidence(2);
	let mut paths = Vec::new();

	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(RipIdError::PrintHelp),
			Argument::Key("-V" | "--version") => return Err(RipIdError::PrintVersion),
			Argument::Key("--offline") => { search = search.with_offline(true); },

			Argument::KeyWithValue("-k" | "--api-key", s) => { cfg = cfg.with_api_key(s); },
			Argument::KeyWithValue("--confidence", s) => {
				let v = u32::btou(s.trim().as_bytes())
					.ok_or(RipIdError::CliParse("--confidence"))?;
				search = search.with_min_confidence(v);
			},
			Argument::KeyWithValue("--user-agent", s) => { cfg = cfg.with_user_agent(s); },
			Argument::KeyWithValue("--title", s) => { cfg = cfg.with_comparison_title(s); },

			Argument::Other(s) => paths.push(PathBuf::from(s)),

			_ => {},
		}
	}

	Ok((cfg.with_search(search), paths))
}

/*!
# Ripid: Errors
*/

use cdtoc::TocError;
use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r#"
   _     _      _
  (_)   (_)    | |
   _ __  _   __| |
  | '__|| | / _` |
  | |   | || (_| |
  |_|   |_| \__,_|   "#, env!("CARGO_PKG_VERSION"), r#"

Identify and verify a ripped CD album.

USAGE:
    ripid [OPTIONS] <PATH(S)>...

OPTIONS:
    -k, --api-key <KEY>
                      API key for the acoustic fingerprint lookup service.
        --confidence <NUM>
                      Consider a track accurately verified once AccurateRip
                      and/or EAC confidence reaches this value. [default: 2]
    -h, --help        Print help information to STDOUT and exit.
        --offline     Skip all network lookups and report only what can be
                      determined from the input streams themselves.
        --user-agent <UA>
                      Override the default HTTP User-Agent string sent to
                      the fingerprint/metadata/verification services.
    -V, --version     Print version information to STDOUT and exit.
"#);



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum RipIdError {
	/// # Allocation failure or other OS resource exhaustion. Fatal.
	Resource,

	/// # Audio decoder returned invalid data for a stream.
	Decode(String),

	/// # Transport error other than an HTTP status.
	Network(String),

	/// # Network operation exceeded the transport's timeout.
	Timeout(String),

	/// # Malformed response body.
	Parse(String),

	/// # HTTP 404 or equivalent; a legitimate "no data" result.
	NotFound,

	/// # Time source or lock failure; rate limiting cannot proceed safely.
	Clock,

	/// # Internal precondition violated; the offending branch is pruned.
	Inconsistent(&'static str),

	/// # Bug!
	Bug(&'static str),

	/// # Numbers too big for this system architecture.
	Overflow,

	/// # Invalid stream index.
	NoStream(usize),

	/// # Invalid read offset.
	ReadOffset,

	#[cfg(feature = "bin")]
	/// # Invalid CLI arg.
	CliArg(String),

	#[cfg(feature = "bin")]
	/// # CLI parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # No input streams given.
	NoInput,

	#[cfg(feature = "bin")]
	/// # Print help (not an error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print version (not an error).
	PrintVersion,
}

impl Error for RipIdError {}

impl From<TocError> for RipIdError {
	#[inline]
	fn from(_err: TocError) -> Self { Self::Inconsistent("invalid table of contents") }
}

impl From<RipIdError> for Msg {
	#[inline]
	fn from(src: RipIdError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for RipIdError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Resource => f.write_str("Out of memory or other OS resource exhaustion."),
			Self::Decode(s) => write!(f, "Decoding error: {s}."),
			Self::Network(s) => write!(f, "Network error: {s}."),
			Self::Timeout(s) => write!(f, "Network timeout: {s}."),
			Self::Parse(s) => write!(f, "Unable to parse response: {s}."),
			Self::NotFound => f.write_str("No data found."),
			Self::Clock => f.write_str("Time source failure; rate limiting cannot proceed."),
			Self::Inconsistent(s) => write!(f, "Inconsistent state: {s}."),
			Self::Bug(s) => write!(f, "Bug: {s}."),
			Self::Overflow => f.write_str("The numbers are too big for this system architecture."),
			Self::NoStream(idx) => write!(f, "Invalid stream index #{idx}."),
			Self::ReadOffset => f.write_str("Invalid read offset."),

			#[cfg(feature = "bin")]
			Self::CliArg(s) => write!(f, "Invalid CLI option: {s}"),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::NoInput => f.write_str("No input streams were given."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Rip Identifier v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

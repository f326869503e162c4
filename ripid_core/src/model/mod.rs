/*!
# Ripid: Model

The candidate tree (§4.5): `ResultModel` → `ReleaseGroup` → `Release` →
`Medium` → `Disc` → `Track`, with `Medium` also holding `Recording` →
`Fingerprint` → `Stream` leaves from the fingerprint-matching side.

The tree grows monotonically while the Mediator ingests lookups, then
shrinks monotonically as the Reducer (`crate::reducer`) prunes it; outside
those two phases the tree is read-only.
*/

pub(crate) mod children;
mod disc;
mod fingerprint;
mod medium;
mod recording;
mod release;
mod releasegroup;
mod resultmodel;
mod stream;
mod track;

pub use children::{
	Children,
	Identified,
};
pub use disc::Disc;
pub use fingerprint::Fingerprint;
pub use medium::Medium;
pub use recording::Recording;
pub use release::Release;
pub use releasegroup::ReleaseGroup;
pub use resultmodel::ResultModel;
pub use stream::Stream;
pub use track::{
	ChecksumEvidence,
	Track,
};

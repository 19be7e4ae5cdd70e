/// Avatar Management
///
/// Filesystem side of attaching an image to a user: storage paths, generated
/// file names, stale-file cleanup, optional downscaling and the upload gate.

pub mod gate;
pub mod resize;
pub mod store;

pub use gate::{UploadGate, UploadPermit};
pub use store::{filename_from_url, generate_filename, AvatarStore};

//! Studio models (`.mdl`).
//!
//! A studio model is a skeletal model: a bone hierarchy, animation sequences
//! with compressed per-bone channels, bone controllers, and body parts whose
//! interchangeable sub-models hold the triangle strips and fans.
//!
//! * `read` turns a byte buffer into a `StudioFile`.
//! * `control` computes the per-frame values (frame rates, packed body
//!   values, controller bytes) an animation system needs.
//! * `model` wraps a file up as a named, checksummed asset.

mod anim;
pub mod control;
pub mod crc;
pub mod model;
pub mod read;
pub mod types;
#[cfg(test)]
mod test_file;

pub use self::control::{
    blending_value, body_group_value, controller_value, sequence_flags,
    sequence_info, set_body_group_value, Normalized, SequenceInfo,
};
pub use self::crc::{compute_crc, compute_crc_stream};
pub use self::model::{Model, ModelLoader, ReadSeek, StudioModel, StudioModelLoader};
pub use self::read::{is_studio_file, is_studio_stream, read_studio_file, read_studio_stream};
pub use self::types::StudioFile;

/// First four bytes of every studio model.
pub const STUDIO_IDENT: &[u8; 4] = b"IDST";
/// The only version we read.
pub const STUDIO_VERSION: i32 = 10;

//! Cinematic clip rendering: layout math, premultiplied compositing, and per-clip frames.

/// Rendered frame type.
pub mod backend;
pub(crate) mod composite;
/// Image preparation and per-frame compositing of one clip.
pub mod compositor;
/// Clip geometry and motion.
pub mod layout;

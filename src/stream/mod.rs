//! Byte stream segmentation utilities
//!
//! - [`PacketSegmenter`] groups raw transport reads into idle-gap-delimited packets
//! - [`LineSplitter`] turns text-mode bytes into complete lines

pub mod lines;
pub mod segmenter;

pub use lines::LineSplitter;
pub use segmenter::PacketSegmenter;

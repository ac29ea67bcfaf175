//! Error types for mesh loading, rendering and export
//!
//! Error types for each native subsystem using `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

/// Mesh loading errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// Mesh file could not be read
    #[error("Failed to read mesh {path}: {source}")]
    Io {
        /// Mesh file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Header is not a legacy VTK header
    #[error("Not a legacy VTK file: {reason}")]
    InvalidHeader {
        /// What was wrong
        reason: String,
    },

    /// Dataset type other than POLYDATA
    #[error("Unsupported VTK dataset '{0}' (only POLYDATA is supported)")]
    UnsupportedDataset(String),

    /// Unsupported scalar type in a POINTS or cell section
    #[error("Unsupported VTK data type '{0}'")]
    UnsupportedType(String),

    /// Token could not be parsed
    #[error("Malformed VTK data at byte {offset}: expected {expected}, found '{found}'")]
    Malformed {
        /// Byte offset into the file
        offset: usize,
        /// What the parser wanted
        expected: &'static str,
        /// What it got
        found: String,
    },

    /// File ended in the middle of a section
    #[error("Unexpected end of VTK data while reading {0}")]
    UnexpectedEof(&'static str),

    /// A cell references a point that does not exist
    #[error("Cell references point {index}, but the mesh has {count} points")]
    IndexOutOfRange {
        /// Referenced point index
        index: i64,
        /// Number of points
        count: usize,
    },

    /// File holds no triangles
    #[error("Mesh has no polygons")]
    Empty,
}

/// Frame rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Zero width or height
    #[error("Invalid frame size {width}x{height}")]
    InvalidSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Supersample factor out of range
    #[error("Supersample factor {0} outside 1..=4")]
    InvalidSupersample(u32),

    /// Overlay drawing failed
    #[error("Overlay drawing failed: {0}")]
    Overlay(String),
}

/// Video and image export errors
#[derive(Error, Debug)]
pub enum VideoError {
    /// Encoder process could not be started
    #[error("Failed to start encoder '{program}': {source}")]
    Spawn {
        /// Program that was launched
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing a frame failed
    #[error("Failed to write frame {frame}: {source}")]
    Write {
        /// Frame index
        frame: usize,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the encoder to exit failed
    #[error("Failed to wait for encoder '{program}': {source}")]
    Wait {
        /// Program that was launched
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Encoder exited unsuccessfully
    #[error("Encoder exited with {status}")]
    EncoderFailed {
        /// Exit status description
        status: String,
    },

    /// Frame does not match the encoder's size
    #[error("Frame is {got_width}x{got_height}, encoder expects {width}x{height}")]
    FrameSize {
        /// Encoder width
        width: u32,
        /// Encoder height
        height: u32,
        /// Frame width
        got_width: u32,
        /// Frame height
        got_height: u32,
    },

    /// Rotation parameters make no frames
    #[error("Rotation produces no frames (fps={fps}, duration={duration_s}s)")]
    NoFrames {
        /// Frames per second
        fps: u32,
        /// Duration in seconds
        duration_s: u32,
    },

    /// Image encoding failed
    #[error("Failed to write image {path}: {reason}")]
    Image {
        /// Output file
        path: PathBuf,
        /// Encoder message
        reason: String,
    },

    /// Rendering a frame failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

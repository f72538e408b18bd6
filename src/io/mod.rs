//! Input/output, persistence, command line and error handling

/// Command-line interface
pub mod cli;
/// Named defaults and constants
pub mod configuration;
/// Error taxonomy and context helpers
pub mod error;
/// Image codec access, resampling and row streaming
pub mod image;
/// Library tables and the prepare step
pub mod library;
/// Progress bars
pub mod progress;
/// Replayable mosaic protocols
pub mod protocol;
/// Paste stage
pub mod render;
/// Parenthesized record reader and writer
pub mod sexpr;

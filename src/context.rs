//! Conversation context compression.
//!
//! Long conversations eventually outgrow the model's input budget. This
//! module keeps the outbound transcript bounded while the stored history
//! stays complete: compression is read-time only and never writes back.
//!
//! # Overview
//!
//! 1. Measure the history by total character count
//! 2. When past the threshold, partition into head / middle / tail
//! 3. Summarize the middle with a fast-tier model call
//! 4. Reassemble: head + one synthetic summary turn + tail
//!
//! The first message (the opening turn, which frames the conversation) and
//! the most recent messages are always preserved verbatim; only the middle
//! is summarized. Summarization failure degrades to an extractive summary
//! built from recent user messages, so compression itself never fails.
//!
//! [`simple_truncate`] is the last-resort strategy used by callers that have
//! no compressor wired up at all.

mod compressor;
mod config;
mod truncate;

pub use compressor::ContextCompressor;
pub use config::CompressionConfig;
pub use truncate::simple_truncate;

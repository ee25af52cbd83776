//! Byte sink and source contracts for record streams.
//!
//! The record codec sits on top of plain byte streams. Writing needs nothing
//! beyond [`std::io::Write`]. Reading needs one extra bit of knowledge that
//! `Read` cannot express: whether a zero-length read means "nothing yet" or
//! "nothing ever again". [`ByteSource`] carries that answer, and the wrappers
//! in this crate let callers pick the policy explicitly:
//!
//! - [`Finished`]: the data is complete (a closed file, a full buffer)
//! - [`Growing`]: the data may grow forever (tail a live file)
//! - [`Signalled`]: the producer raises a [`FinishSignal`] when done
//! - [`pipe`]: an in-memory stream whose writer publishes on flush

pub mod pipe;
pub mod source;

pub use pipe::{pipe, PipeReader, PipeWriter};
pub use source::{ByteSource, FinishSignal, Finished, Growing, Signalled};

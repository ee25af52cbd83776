//! Length-prefixed, checksum-protected record framing.
//!
//! This is the core of recprims. Every record is framed with:
//! - An 8-byte little-endian payload length
//! - A 4-byte masked CRC-32C of those 8 length bytes
//! - The payload itself
//! - A 4-byte masked CRC-32C of the payload
//!
//! There is no file header or trailer; a stream is zero or more frames back
//! to back. The layout is byte-compatible with TFRecord files.
//!
//! Readers distinguish three situations at every step: a record is ready, a
//! record is not fully written yet ([`ReadOutcome::Pending`]), or the stream
//! has ended ([`ReadOutcome::EndOfStream`]). Checksum failures are errors
//! ([`FrameError::Corrupt`]) and never look like either of the latter two.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use checksum::{crc32c, mask, masked_crc32c, unmask, MASK_DELTA};
pub use codec::{
    decode_frame, encode_frame, frame_size, parse_frame, FrameConfig, Parsed, Record,
    DEFAULT_READ_CHUNK, FRAME_OVERHEAD, HEADER_SIZE,
};
pub use error::{ChecksumField, FrameError, Result};
pub use reader::{ReadOutcome, RecordReader};
#[cfg(feature = "async")]
pub use tokio_codec::RecordCodec;
pub use writer::RecordWriter;

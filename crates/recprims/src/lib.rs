//! Checksummed, append-only record files.
//!
//! recprims writes and reads streams of opaque byte records, each framed with
//! a length prefix and masked CRC-32C checksums (the TFRecord layout). Readers
//! can tail a file that is still being written, and tell "not written yet"
//! apart from "corrupt" and from "finished".
//!
//! # Crate Structure
//!
//! - [`io`]: Byte source contracts and end-of-stream policies
//! - [`frame`]: Record framing, checksums, writer and reader
//!
//! # Example
//!
//! ```
//! use recprims::frame::{ReadOutcome, RecordReader, RecordWriter};
//! use recprims::io::pipe;
//!
//! let (sink, source) = pipe();
//! let mut writer = RecordWriter::new(sink);
//! let mut reader = RecordReader::new(source);
//!
//! writer.append(b"hello").unwrap();
//! assert!(reader.next_record().unwrap().is_pending());
//!
//! writer.flush().unwrap();
//! let record = reader.next_record().unwrap().into_record().unwrap();
//! assert_eq!(record.payload.as_ref(), b"hello");
//!
//! writer.close().unwrap();
//! assert_eq!(reader.next_record().unwrap(), ReadOutcome::EndOfStream);
//! ```

/// Re-export byte source types.
pub mod io {
    pub use recprims_io::*;
}

/// Re-export frame types.
pub mod frame {
    pub use recprims_frame::*;
}

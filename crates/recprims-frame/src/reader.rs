use std::io::ErrorKind;

use bytes::BytesMut;
use recprims_io::ByteSource;
use tracing::{debug, trace, warn};

use crate::codec::{parse_frame, FrameConfig, Parsed, Record, FRAME_OVERHEAD, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Outcome of one [`RecordReader::next_record`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A whole record was decoded and the cursor moved past it.
    Record(Record),
    /// The next record is not fully present yet; retry later.
    Pending,
    /// The source is finished and the cursor sits at its end.
    EndOfStream,
}

impl ReadOutcome {
    /// The record, if one was decoded.
    pub fn into_record(self) -> Option<Record> {
        match self {
            ReadOutcome::Record(record) => Some(record),
            _ => None,
        }
    }

    /// True when the next record has not been fully written yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, ReadOutcome::Pending)
    }

    /// True when the source is finished and fully consumed.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadOutcome::EndOfStream)
    }
}

enum Step {
    Decoded(Record),
    NeedMore(u64),
}

/// Reads records one at a time from a [`ByteSource`].
///
/// Bytes past the cursor are kept in an internal buffer, so an attempt that
/// ends in [`ReadOutcome::Pending`] loses nothing: the next call resumes at
/// the same frame boundary. Whether a short read means "pending" or "end" is
/// decided by the source's [`ByteSource::is_finished`].
///
/// After a checksum mismatch the reader stops for good; the stream is
/// treated as truncated at the corrupt frame.
pub struct RecordReader<S> {
    inner: S,
    buf: BytesMut,
    config: FrameConfig,
    offset: u64,
    records_read: u64,
    poisoned: Option<u64>,
}

impl<S: ByteSource> RecordReader<S> {
    /// Create a new record reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new record reader with explicit configuration.
    pub fn with_config(inner: S, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.read_chunk_size),
            config,
            offset: 0,
            records_read: 0,
            poisoned: None,
        }
    }

    /// Try to read the next record without blocking beyond the source's own
    /// reads.
    pub fn next_record(&mut self) -> Result<ReadOutcome> {
        if let Some(offset) = self.poisoned {
            return Err(FrameError::Poisoned { offset });
        }

        loop {
            let needed = match self.try_decode()? {
                Step::Decoded(record) => return Ok(ReadOutcome::Record(record)),
                Step::NeedMore(needed) => needed,
            };

            // Sample before reading: if the producer was already done and the
            // read still comes back empty, nothing more can ever arrive.
            let finished = self.inner.is_finished();
            if self.fill()? > 0 {
                continue;
            }

            if !finished {
                trace!(
                    offset = self.offset,
                    buffered = self.buf.len(),
                    needed,
                    "record pending"
                );
                return Ok(ReadOutcome::Pending);
            }

            if self.buf.is_empty() {
                debug!(
                    offset = self.offset,
                    records = self.records_read,
                    "end of stream"
                );
                return Ok(ReadOutcome::EndOfStream);
            }

            return Err(FrameError::Truncated {
                offset: self.offset,
                available: self.buf.len() as u64,
                needed,
            });
        }
    }

    /// Decode one record from buffered bytes, if they hold a whole frame.
    fn try_decode(&mut self) -> Result<Step> {
        let parsed = parse_frame(&self.buf[..]);

        if let (Some(len), Some(max)) = (parsed.payload_len(), self.config.max_payload_size) {
            if len > max {
                return Err(FrameError::PayloadTooLarge { size: len, max });
            }
        }

        let (payload_len, frame_len) = match parsed {
            Parsed::Complete { payload, frame_len } => (payload.len(), frame_len),
            Parsed::Incomplete { needed, payload_len } => {
                // A frame this size could never be buffered on this platform.
                if let Some(len) = payload_len {
                    if usize::try_from(needed).is_err() {
                        return Err(FrameError::PayloadTooLarge {
                            size: len,
                            max: (usize::MAX - FRAME_OVERHEAD) as u64,
                        });
                    }
                }
                return Ok(Step::NeedMore(needed));
            }
            Parsed::Corrupt(field) => {
                warn!(offset = self.offset, %field, "checksum mismatch");
                self.poisoned = Some(self.offset);
                return Err(FrameError::Corrupt {
                    field,
                    offset: self.offset,
                });
            }
        };

        let frame = self.buf.split_to(frame_len).freeze();
        let payload = frame.slice(HEADER_SIZE..HEADER_SIZE + payload_len);
        let record = Record::new(self.offset, payload);

        self.offset = record.end_offset();
        self.records_read += 1;
        trace!(
            offset = record.offset,
            len = payload_len,
            "record decoded"
        );
        Ok(Step::Decoded(record))
    }

    /// Pull one chunk from the source. Returns the number of bytes added;
    /// zero means nothing is available right now.
    fn fill(&mut self) -> Result<usize> {
        let start = self.buf.len();
        self.buf.resize(start + self.config.read_chunk_size.max(1), 0);

        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    self.buf.truncate(start);
                    return Ok(0);
                }
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            }
        }
    }

    /// Stream offset of the next frame boundary.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records decoded so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Bytes read from the source but not yet consumed as a record.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the reader has stopped on corruption.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    ///
    /// Reading from it directly desynchronizes the reader.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Update maximum payload size for subsequent records.
    pub fn set_max_payload_size(&mut self, max_payload_size: Option<u64>) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current record reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Yields every record currently available.
///
/// Iteration stops at [`ReadOutcome::Pending`] or [`ReadOutcome::EndOfStream`]
/// without telling them apart; use [`RecordReader::next_record`] when that
/// matters. After an error the iterator is exhausted.
impl<S: ByteSource> Iterator for RecordReader<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned.is_some() {
            return None;
        }
        match self.next_record() {
            Ok(ReadOutcome::Record(record)) => Some(Ok(record)),
            Ok(ReadOutcome::Pending) | Ok(ReadOutcome::EndOfStream) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

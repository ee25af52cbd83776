use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Appends records to any `Write` sink.
///
/// The writer never creates or truncates anything; it writes frames at the
/// sink's current position. Records become visible to other readers of the
/// same storage once [`flush`](RecordWriter::flush) returns.
pub struct RecordWriter<W> {
    inner: W,
    buf: BytesMut,
    config: FrameConfig,
    records_written: u64,
    bytes_written: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Create a new record writer with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new record writer with explicit configuration.
    pub fn with_config(inner: W, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            records_written: 0,
            bytes_written: 0,
        }
    }

    /// Encode `payload` as one frame and write it to the sink.
    ///
    /// On error the sink may hold part of the frame; the writer should be
    /// discarded.
    pub fn append(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(payload, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::SinkClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        trace!(
            offset = self.bytes_written,
            len = payload.len(),
            "record appended"
        );
        self.records_written += 1;
        self.bytes_written += self.buf.len() as u64;

        if self.config.flush_after_append {
            self.flush()?;
        }
        Ok(())
    }

    /// Push every appended record through to the sink.
    ///
    /// Safe to call any number of times, including with nothing pending.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Flush, then release the sink.
    ///
    /// The writer owns the sink, so dropping it closes it (for a `File`, the
    /// descriptor is closed).
    pub fn close(self) -> Result<()> {
        self.finish().map(drop)
    }

    /// Flush, then hand the sink back without closing it.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        debug!(
            records = self.records_written,
            bytes = self.bytes_written,
            "record writer closed"
        );
        Ok(self.inner)
    }

    /// Number of records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Number of bytes appended so far (framing included).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Current record writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_frame, FRAME_OVERHEAD};

    fn written(writer: RecordWriter<Cursor<Vec<u8>>>) -> BytesMut {
        let inner = writer.finish().unwrap();
        BytesMut::from(inner.into_inner().as_slice())
    }

    #[test]
    fn write_single_record() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.append(b"hello").unwrap();

        let mut wire = written(writer);
        let payload = decode_frame(&mut wire, None).unwrap().unwrap();
        assert_eq!(payload.as_ref(), b"hello");
        assert!(wire.is_empty());
    }

    #[test]
    fn expected_bytes_written() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.append(&[b'x'; 64]).unwrap();

        assert_eq!(writer.bytes_written(), 8 + 4 + 64 + 4);
        // Visible in the sink before close.
        assert_eq!(writer.get_ref().get_ref().len(), 84);
        assert_eq!(written(writer).len(), 84);
    }

    #[test]
    fn empty_record_is_full_frame() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.append(b"").unwrap();

        let mut wire = written(writer);
        assert_eq!(wire.len(), FRAME_OVERHEAD);
        let payload = decode_frame(&mut wire, None).unwrap().unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn write_multiple_records_in_order() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        for i in 0..10 {
            writer.append(format!("hello world{i}").as_bytes()).unwrap();
        }
        assert_eq!(writer.records_written(), 10);

        let mut wire = written(writer);
        for i in 0..10 {
            let payload = decode_frame(&mut wire, None).unwrap().unwrap();
            assert_eq!(payload.as_ref(), format!("hello world{i}").as_bytes());
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn appends_at_current_position() {
        let mut existing = BytesMut::new();
        encode_frame(b"old", &mut existing);
        let mut cursor = Cursor::new(existing.to_vec());
        cursor.set_position(existing.len() as u64);

        let mut writer = RecordWriter::new(cursor);
        writer.append(b"new").unwrap();

        let mut wire = written(writer);
        assert_eq!(decode_frame(&mut wire, None).unwrap().unwrap().as_ref(), b"old");
        assert_eq!(decode_frame(&mut wire, None).unwrap().unwrap().as_ref(), b"new");
    }

    #[test]
    fn flush_is_explicit_by_default() {
        let sink = FlushCountingWriter::default();
        let flushes = Arc::clone(&sink.flushes);
        let mut writer = RecordWriter::new(sink);

        writer.append(b"x").unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 0);

        writer.flush().unwrap();
        writer.flush().unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn flush_after_append_config() {
        let sink = FlushCountingWriter::default();
        let flushes = Arc::clone(&sink.flushes);
        let cfg = FrameConfig {
            flush_after_append: true,
            ..FrameConfig::default()
        };
        let mut writer = RecordWriter::with_config(sink, cfg);

        writer.append(b"a").unwrap();
        writer.append(b"b").unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 2);
        assert!(writer.config().flush_after_append);
    }

    #[test]
    fn close_flushes() {
        let sink = FlushCountingWriter::default();
        let flushes = Arc::clone(&sink.flushes);
        let mut writer = RecordWriter::new(sink);

        writer.append(b"x").unwrap();
        writer.close().unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = RecordWriter::new(writer_impl);
        writer.append(b"retry").unwrap();
        writer.flush().unwrap();

        let inner = writer.finish().unwrap();
        assert_eq!(inner.data.len(), FRAME_OVERHEAD + 5);
    }

    #[test]
    fn handles_short_writes() {
        let mut writer = RecordWriter::new(TrickleWriter { data: Vec::new() });
        writer.append(b"one byte at a time").unwrap();

        let inner = writer.finish().unwrap();
        let mut wire = BytesMut::from(inner.data.as_slice());
        let payload = decode_frame(&mut wire, None).unwrap().unwrap();
        assert_eq!(payload.as_ref(), b"one byte at a time");
    }

    #[test]
    fn sink_closed_when_write_returns_zero() {
        let mut writer = RecordWriter::new(ZeroWriter);
        let err = writer.append(b"x").unwrap_err();
        assert!(matches!(err, FrameError::SinkClosed));
    }

    #[test]
    fn io_error_propagates_without_retry() {
        let mut writer = RecordWriter::new(FailingWriter { attempts: 0 });
        let err = writer.append(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::PermissionDenied));
        assert_eq!(writer.get_ref().attempts, 1);
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn accessors() {
        let mut writer = RecordWriter::new(Cursor::new(Vec::<u8>::new()));
        let _ = writer.get_ref();
        let _ = writer.get_mut();
        assert!(!writer.config().flush_after_append);
    }

    #[derive(Default)]
    struct FlushCountingWriter {
        flushes: Arc<AtomicUsize>,
        data: Vec<u8>,
    }

    impl Write for FlushCountingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct TrickleWriter {
        data: Vec<u8>,
    }

    impl Write for TrickleWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            match buf.first() {
                Some(byte) => {
                    self.data.push(*byte);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter {
        attempts: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.attempts += 1;
            Err(std::io::Error::from(ErrorKind::PermissionDenied))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}

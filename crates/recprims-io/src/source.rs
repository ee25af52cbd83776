use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A readable byte stream that knows whether its producer is done.
///
/// `read` may return zero bytes while the producer is still active. Callers
/// combine that with [`is_finished`](ByteSource::is_finished) to tell a
/// momentarily empty stream from a permanently ended one.
pub trait ByteSource: Read {
    /// Returns true once no bytes beyond those already readable will arrive.
    fn is_finished(&self) -> bool;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

impl ByteSource for &[u8] {
    fn is_finished(&self) -> bool {
        true
    }
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn is_finished(&self) -> bool {
        true
    }
}

/// Treats the wrapped reader as complete: a short read is the real end.
#[derive(Debug)]
pub struct Finished<R>(pub R);

/// Treats the wrapped reader as live: a short read only means "not yet".
#[derive(Debug)]
pub struct Growing<R>(pub R);

macro_rules! policy_wrapper {
    ($name:ident, $finished:expr) => {
        impl<R> $name<R> {
            /// Consume the wrapper and return the inner reader.
            pub fn into_inner(self) -> R {
                self.0
            }

            /// Borrow the inner reader.
            pub fn get_ref(&self) -> &R {
                &self.0
            }

            /// Mutably borrow the inner reader.
            pub fn get_mut(&mut self) -> &mut R {
                &mut self.0
            }
        }

        impl<R: Read> Read for $name<R> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                self.0.read(buf)
            }
        }

        impl<R: Read> ByteSource for $name<R> {
            fn is_finished(&self) -> bool {
                $finished
            }
        }
    };
}

policy_wrapper!(Finished, true);
policy_wrapper!(Growing, false);

/// Shared flag a producer raises once it will write no more bytes.
#[derive(Debug, Clone, Default)]
pub struct FinishSignal {
    flag: Arc<AtomicBool>,
}

impl FinishSignal {
    /// A signal that has not been raised yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the stream as finished. Idempotent.
    pub fn finish(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether [`finish`](FinishSignal::finish) has been called on any clone.
    pub fn is_finished(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A reader whose end is decided by a [`FinishSignal`] held by the producer.
#[derive(Debug)]
pub struct Signalled<R> {
    inner: R,
    signal: FinishSignal,
}

impl<R> Signalled<R> {
    /// Wrap `inner`; the stream ends once `signal` is raised and drained.
    pub fn new(inner: R, signal: FinishSignal) -> Self {
        Self { inner, signal }
    }

    /// The signal this source watches.
    pub fn signal(&self) -> &FinishSignal {
        &self.signal
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Signalled<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> ByteSource for Signalled<R> {
    fn is_finished(&self) -> bool {
        self.signal.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sources_are_finished() {
        let bytes: &[u8] = b"abc";
        assert!(bytes.is_finished());
        assert!(Cursor::new(vec![1u8, 2]).is_finished());
    }

    #[test]
    fn policy_wrappers_report_fixed_answers() {
        assert!(Finished(Cursor::new(Vec::<u8>::new())).is_finished());
        assert!(!Growing(Cursor::new(Vec::<u8>::new())).is_finished());
    }

    #[test]
    fn wrappers_pass_reads_through() {
        let mut source = Growing(Cursor::new(b"data".to_vec()));
        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"data");
        assert_eq!(source.into_inner().position(), 4);
    }

    #[test]
    fn signalled_follows_producer_flag() {
        let signal = FinishSignal::new();
        let source = Signalled::new(Cursor::new(Vec::<u8>::new()), signal.clone());
        assert!(!source.is_finished());

        signal.finish();
        assert!(source.is_finished());
        assert!(source.signal().is_finished());
    }

    #[test]
    fn signal_visible_across_threads() {
        let signal = FinishSignal::new();
        let remote = signal.clone();
        std::thread::spawn(move || remote.finish()).join().unwrap();
        assert!(signal.is_finished());
    }

    #[test]
    fn mut_ref_delegates() {
        let mut source = Growing(Cursor::new(Vec::<u8>::new()));
        let by_ref = &mut source;
        assert!(!ByteSource::is_finished(&by_ref));
    }
}

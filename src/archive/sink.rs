use std::io::{self, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;
use crate::pipeline::Summary;

use super::entry::ArchiveEntry;

/// Default bound on the chunk channel between sink and HTTP response body.
pub const DEFAULT_CHUNK_CAPACITY: usize = 16;

/// Byte chunks of the archive, in stream order. A terminal `Err` means the
/// archive is unusable past that point.
pub type ArchiveStream = ReceiverStream<Result<Bytes, ArchiveError>>;

/// Growable write target that forgets its sealed prefix.
///
/// Tracks an absolute stream position while holding only bytes at or after
/// `base`. Seeks below `base` are refused; under the sink's draining
/// discipline the zip writer never attempts one.
#[derive(Debug, Clone)]
struct SharedBuf {
    state: Arc<StdMutex<BufState>>,
}

#[derive(Debug)]
struct BufState {
    /// Absolute offset of `data[0]`
    base: u64,
    /// Absolute write cursor
    pos: u64,
    data: Vec<u8>,
}

impl SharedBuf {
    fn new() -> Self {
        Self {
            state: Arc::new(StdMutex::new(BufState {
                base: 0,
                pos: 0,
                data: Vec::new(),
            })),
        }
    }

    /// Current absolute write cursor.
    fn position(&self) -> u64 {
        self.state.lock().unwrap().pos
    }

    /// Drain every byte strictly before the absolute offset `upto`.
    fn take_until(&self, upto: u64) -> Bytes {
        let mut st = self.state.lock().unwrap();
        let n = (upto.saturating_sub(st.base) as usize).min(st.data.len());
        let sealed: Vec<u8> = st.data.drain(..n).collect();
        st.base += n as u64;
        Bytes::from(sealed)
    }

    /// Drain everything that remains.
    fn take_all(&self) -> Bytes {
        let mut st = self.state.lock().unwrap();
        let rest = std::mem::take(&mut st.data);
        st.base += rest.len() as u64;
        Bytes::from(rest)
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut st = self.state.lock().unwrap();
        if st.pos < st.base {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "write into sealed archive region",
            ));
        }
        let off = (st.pos - st.base) as usize;
        let end = off + buf.len();
        if end > st.data.len() {
            st.data.resize(end, 0);
        }
        st.data[off..end].copy_from_slice(buf);
        st.pos += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedBuf {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut st = self.state.lock().unwrap();
        let end = st.base + st.data.len() as u64;
        let target = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::End(d) => end as i128 + d as i128,
            SeekFrom::Current(d) => st.pos as i128 + d as i128,
        };
        if target < st.base as i128 || target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek into sealed archive region",
            ));
        }
        st.pos = target as u64;
        Ok(st.pos)
    }
}

/// Concurrent-append streaming zip sink.
///
/// `append` may be called from any number of tasks; an internal lock
/// serializes only the container write itself. Sealed bytes are pushed into
/// a bounded channel, so a slow client applies backpressure to appenders.
pub struct ArchiveSink {
    writer: Mutex<ZipWriter<SharedBuf>>,
    buf: SharedBuf,
    tx: mpsc::Sender<Result<Bytes, ArchiveError>>,
}

impl ArchiveSink {
    /// Create a sink and the chunk stream it feeds.
    ///
    /// `capacity` bounds how many sealed chunks may sit unconsumed before
    /// appenders block.
    pub fn new(capacity: usize) -> (Self, ArchiveStream) {
        let (tx, rx) = mpsc::channel(capacity);
        let buf = SharedBuf::new();
        let writer = ZipWriter::new(buf.clone());
        (
            Self {
                writer: Mutex::new(writer),
                buf,
                tx,
            },
            ReceiverStream::new(rx),
        )
    }

    /// Append one finished entry and flush newly sealed bytes downstream.
    ///
    /// Image payloads are stored uncompressed; they are already compressed
    /// formats and deflate would cost CPU for nothing.
    pub async fn append(&self, entry: ArchiveEntry) -> Result<(), ArchiveError> {
        let mut writer = self.writer.lock().await;
        // Everything written before this entry's header becomes final
        // once start_file has patched the previous entry's header.
        let watermark = self.buf.position();
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        if let Err(e) = writer.start_file(entry.name.as_str(), options) {
            return self.fail(e.into()).await;
        }
        if let Err(e) = writer.write_all(&entry.bytes) {
            return self.fail(e.into()).await;
        }
        let sealed = self.buf.take_until(watermark);

        debug!(
            entry = entry.name.as_str(),
            sealed = sealed.len(),
            "Appended archive entry"
        );
        // The send stays under the writer lock: chunks must enter the
        // channel in seal order or the byte stream interleaves. Backpressure
        // from a slow client therefore stalls all appenders, which is the
        // intended behavior for a bounded stream.
        if !sealed.is_empty() {
            self.tx
                .send(Ok(sealed))
                .await
                .map_err(|_| ArchiveError::StreamClosed)?;
        }
        Ok(())
    }

    /// Write the central directory, flush the tail, and close the stream.
    ///
    /// Consumes the sink and the scheduler's settled summary: finalization
    /// can only happen after every task has been resolved, and dropping the
    /// sender here is what terminates the client's download.
    pub async fn finalize(self, summary: Summary) -> Result<Summary, ArchiveError> {
        let writer = self.writer.into_inner();
        if let Err(e) = writer.finish() {
            let err: ArchiveError = e.into();
            let _ = self.tx.send(Err(err.clone())).await;
            return Err(err);
        }

        let tail = self.buf.take_all();
        if !tail.is_empty() {
            self.tx
                .send(Ok(tail))
                .await
                .map_err(|_| ArchiveError::StreamClosed)?;
        }
        Ok(summary)
        // tx drops here, ending the stream.
    }

    /// Report a container-level failure on the stream and propagate it.
    async fn fail(&self, err: ArchiveError) -> Result<(), ArchiveError> {
        let _ = self.tx.send(Err(err.clone())).await;
        Err(err)
    }
}

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Default upload chunk size (5 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5_242_880;

/// Iterator over fixed-size chunks of a reader.
///
/// Every chunk holds at most `chunk_size` bytes. Once the underlying reader
/// reports end-of-stream the iterator yields `None` and never touches the
/// reader again.
pub struct ChunkReader<R> {
    inner: R,
    chunk_size: usize,
    exhausted: bool,
    bytes_read: u64,
    source: Option<PathBuf>,
}

impl ChunkReader<File> {
    /// Open `path` for chunked reading.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = Self::new(file, chunk_size)?;
        reader.source = Some(path.to_path_buf());
        Ok(reader)
    }
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be greater than zero".into()));
        }
        Ok(Self {
            inner,
            chunk_size,
            exhausted: false,
            bytes_read: 0,
            source: None,
        })
    }

    /// File the chunks come from, when opened with [`ChunkReader::open`].
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Total bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Fill one chunk, looping over short reads so a chunk is only smaller
    /// than `chunk_size` when it is the last one.
    fn fill_chunk(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.fill_chunk() {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => {
                self.bytes_read += chunk.len() as u64;
                Some(Ok(chunk))
            }
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

/// Holds the first local read error raised while a [`ChunkStream`] is being
/// consumed by someone else, e.g. an HTTP client sending it as a body.
#[derive(Debug, Clone, Default)]
pub struct ReadFailure(Arc<Mutex<Option<io::Error>>>);

impl ReadFailure {
    pub fn take(&self) -> Option<io::Error> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }

    fn record(&self, e: &io::Error) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.is_none() {
                *slot = Some(io::Error::new(e.kind(), e.to_string()));
            }
        }
    }
}

/// Adapts a [`ChunkReader`] back into a `Read` so an HTTP client can stream
/// it as a request body one chunk at a time.
pub struct ChunkStream<R> {
    chunks: ChunkReader<R>,
    current: Vec<u8>,
    pos: usize,
    failure: ReadFailure,
}

impl<R: Read> ChunkStream<R> {
    /// Returns the stream and a handle to the first read error it hits.
    pub fn new(chunks: ChunkReader<R>) -> (Self, ReadFailure) {
        let failure = ReadFailure::default();
        let stream = Self {
            chunks,
            current: Vec::new(),
            pos: 0,
            failure: failure.clone(),
        };
        (stream, failure)
    }
}

impl<R: Read> Read for ChunkStream<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.current.len() {
            match self.chunks.next() {
                Some(Ok(chunk)) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                Some(Err(e)) => {
                    self.failure.record(&e);
                    return Err(e);
                }
                None => return Ok(0),
            }
        }
        let n = out.len().min(self.current.len() - self.pos);
        out[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

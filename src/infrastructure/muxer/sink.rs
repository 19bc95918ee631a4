//! In-memory byte sinks shared between a container writer and its muxer
//!
//! Container crates own their output writer, but the muxer needs to hand the
//! accumulated bytes out while the writer stays alive. Both sinks here write
//! into a shared buffer the muxer keeps a handle to.

use std::io::{self, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

/// Append-only sink; `take` drains everything written since the last take.
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.inner.lock().unwrap())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Random-access sink for writers that back-patch earlier bytes. The whole
/// buffer is retained until `take`, so it must only be drained after the
/// writer has finalized.
#[derive(Clone)]
pub(crate) struct SharedCursor {
    inner: Arc<Mutex<Vec<u8>>>,
    position: u64,
}

impl SharedCursor {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::default(),
            position: 0,
        }
    }

    pub(crate) fn take(&self) -> Vec<u8> {
        std::mem::take(&mut self.inner.lock().unwrap())
    }
}

impl Write for SharedCursor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut data = self.inner.lock().unwrap();
        let start = self.position as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for SharedCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.inner.lock().unwrap().len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => len + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of buffer",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}

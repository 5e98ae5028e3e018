//! Byte-counting stream wrappers shared by both codecs.
//!
//! Every field is little-endian. Readers turn a short read into
//! [`CodecError::IncompleteStream`] tagged with the [`Stage`] being read, so
//! callers never see partially populated results.

use std::io::{self, Read, Write};

use crate::error::{CodecError, Result, Stage};

/// Destination for packed 32-bit containers.
pub trait WordSink {
    fn put_word(&mut self, word: u32) -> Result<()>;
}

/// Source of packed 32-bit containers.
pub trait WordSource {
    fn next_word(&mut self, stage: Stage) -> Result<u32>;
}

impl WordSink for Vec<u32> {
    fn put_word(&mut self, word: u32) -> Result<()> {
        self.push(word);
        Ok(())
    }
}

/// In-memory word source over a slice.
#[derive(Debug, Clone)]
pub struct WordCursor<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> WordCursor<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, pos: 0 }
    }

    /// Words consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl WordSource for WordCursor<'_> {
    fn next_word(&mut self, stage: Stage) -> Result<u32> {
        let word = self
            .words
            .get(self.pos)
            .copied()
            .ok_or(CodecError::IncompleteStream {
                stage,
                offset: self.pos * 4,
                needed: 4,
            })?;
        self.pos += 1;
        Ok(word)
    }
}

/// Writer that records how many bytes went through it.
#[derive(Debug)]
pub struct WordWriter<W> {
    inner: W,
    written: usize,
}

impl<W: Write> WordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write> WordSink for WordWriter<W> {
    fn put_word(&mut self, word: u32) -> Result<()> {
        self.write_u32(word)
    }
}

/// Reader that records how many bytes it consumed.
#[derive(Debug)]
pub struct WordReader<R> {
    inner: R,
    read: usize,
}

impl<'a> WordReader<&'a [u8]> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<R: Read> WordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, read: 0 }
    }

    pub fn bytes_read(&self) -> usize {
        self.read
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn take<const N: usize>(&mut self, stage: Stage) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => {
                self.read += N;
                Ok(buf)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(CodecError::IncompleteStream {
                    stage,
                    offset: self.read,
                    needed: N,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_u32(&mut self, stage: Stage) -> Result<u32> {
        self.take::<4>(stage).map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self, stage: Stage) -> Result<i32> {
        self.take::<4>(stage).map(i32::from_le_bytes)
    }

    pub fn read_f64(&mut self, stage: Stage) -> Result<f64> {
        self.take::<8>(stage).map(f64::from_le_bytes)
    }
}

impl<R: Read> WordSource for WordReader<R> {
    fn next_word(&mut self, stage: Stage) -> Result<u32> {
        self.read_u32(stage)
    }
}

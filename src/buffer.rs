use std::io::{self, IoSliceMut, Read, Write};

/// Default capacity of a freshly created [`Buffer`].
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Size of the stack-local overflow segment used by scatter reads.
pub const EXTRA_READ_SIZE: usize = 65535;

/// Growable byte buffer with independent read and write cursors.
///
/// ```text
/// +-------------------+------------------+------------------+
/// | prependable bytes |  readable bytes  |  writable bytes  |
/// +-------------------+------------------+------------------+
/// 0      <=       read_pos    <=     write_pos    <=     len
/// ```
///
/// Owned by a single connection. Bytes before `read_pos` are reclaimed by
/// compaction when more writable space is needed.
#[derive(Debug, Clone)]
pub struct Buffer {
    storage: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl Buffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: vec![0; capacity],
            read_pos: 0,
            write_pos: 0,
        }
    }

    pub fn readable_bytes(&self) -> usize {
        self.write_pos - self.read_pos
    }

    pub fn writable_bytes(&self) -> usize {
        self.storage.len() - self.write_pos
    }

    pub fn prependable_bytes(&self) -> usize {
        self.read_pos
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Unread bytes. Does not move any cursor.
    pub fn peek(&self) -> &[u8] {
        &self.storage[self.read_pos..self.write_pos]
    }

    /// Marks `len` bytes as read.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`readable_bytes`](Self::readable_bytes).
    pub fn retrieve(&mut self, len: usize) {
        assert!(
            len <= self.readable_bytes(),
            "retrieve({len}) exceeds readable bytes {}",
            self.readable_bytes()
        );
        self.read_pos += len;
    }

    /// Marks everything up to `end` as read, where `end` is an offset into
    /// [`peek`](Self::peek).
    ///
    /// # Panics
    ///
    /// Panics if `end` lies past the readable region.
    pub fn retrieve_until(&mut self, end: usize) {
        assert!(
            end <= self.readable_bytes(),
            "retrieve_until({end}) is outside the readable region of {} bytes",
            self.readable_bytes()
        );
        self.retrieve(end);
    }

    /// Resets both cursors and zeroes the storage. Capacity is kept.
    pub fn retrieve_all(&mut self) {
        self.storage.fill(0);
        self.read_pos = 0;
        self.write_pos = 0;
    }

    pub fn retrieve_all_to_bytes(&mut self) -> Vec<u8> {
        let bytes = self.peek().to_vec();
        self.retrieve_all();
        bytes
    }

    /// Drains all readable bytes into a string. Invalid UTF-8 sequences are
    /// replaced with `U+FFFD`.
    pub fn retrieve_all_to_string(&mut self) -> String {
        let text = String::from_utf8_lossy(self.peek()).into_owned();
        self.retrieve_all();
        text
    }

    /// Writable tail of the storage, starting at the write cursor.
    pub fn begin_write(&mut self) -> &mut [u8] {
        &mut self.storage[self.write_pos..]
    }

    /// Commits `len` bytes written through [`begin_write`](Self::begin_write).
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds [`writable_bytes`](Self::writable_bytes).
    pub fn has_written(&mut self, len: usize) {
        assert!(
            len <= self.writable_bytes(),
            "has_written({len}) exceeds writable bytes {}",
            self.writable_bytes()
        );
        self.write_pos += len;
    }

    pub fn ensure_writable(&mut self, len: usize) {
        if self.writable_bytes() < len {
            self.make_space(len);
        }
        debug_assert!(self.writable_bytes() >= len);
    }

    pub fn append(&mut self, data: &[u8]) {
        self.ensure_writable(data.len());
        self.storage[self.write_pos..self.write_pos + data.len()].copy_from_slice(data);
        self.write_pos += data.len();
    }

    pub fn append_str(&mut self, data: &str) {
        self.append(data.as_bytes());
    }

    pub fn append_buffer(&mut self, other: &Buffer) {
        self.append(other.peek());
    }

    /// Performs one vectored read through `read`, offering the writable tail
    /// followed by a 64 KiB stack segment. Bytes landing in the stack
    /// segment are appended afterwards, growing the buffer.
    ///
    /// On error no cursor moves.
    pub fn read_with<F>(&mut self, read: F) -> io::Result<usize>
    where
        F: FnOnce(&mut [IoSliceMut<'_>]) -> io::Result<usize>,
    {
        let mut extra = [0u8; EXTRA_READ_SIZE];
        let writable = self.writable_bytes();

        let len = {
            let tail = &mut self.storage[self.write_pos..];
            let mut segments = [IoSliceMut::new(tail), IoSliceMut::new(&mut extra)];
            read(&mut segments)?
        };

        if len <= writable {
            self.write_pos += len;
        } else {
            self.write_pos = self.storage.len();
            self.append(&extra[..len - writable]);
        }
        Ok(len)
    }

    /// Scatter read from any reader, e.g. `&TcpStream` or `&File`.
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.read_with(|segments| reader.read_vectored(segments))
    }

    /// Performs one linear write of the readable region through `write` and
    /// advances the read cursor by the amount written.
    ///
    /// On error no cursor moves.
    pub fn write_with<F>(&mut self, write: F) -> io::Result<usize>
    where
        F: FnOnce(&[u8]) -> io::Result<usize>,
    {
        let len = write(self.peek())?;
        self.retrieve(len);
        Ok(len)
    }

    pub fn write_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<usize> {
        self.write_with(|data| writer.write(data))
    }

    fn make_space(&mut self, len: usize) {
        if self.writable_bytes() + self.prependable_bytes() < len {
            self.storage.resize(self.write_pos + len + 1, 0);
        } else {
            let readable = self.readable_bytes();
            self.storage.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = readable;
        }
    }
}

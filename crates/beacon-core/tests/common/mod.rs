//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::{cell::RefCell, collections::BTreeMap, convert::Infallible, rc::Rc};

use beacon_core::{FileSystem, OpenMode, StorageError};
use embedded_storage::nor_flash::{ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash};

// -----------------------------------------------------------------------------
// In-memory file system
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FsState {
    pub files: BTreeMap<String, Vec<u8>>,
    /// Every write fails with this error
    pub fail_writes: Option<StorageError>,
    /// Writes to paths starting with this prefix fail with `Full`
    pub fail_writes_to: Option<String>,
    /// Writes store one byte less than asked, so verification fails
    pub short_writes: bool,
    pub writes: usize,
    pub renames: Vec<(String, String)>,
}

/// Cloneable handle, so a test keeps access after handing one to the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    pub state: Rc<RefCell<FsState>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.put(path, content);
        self
    }

    pub fn put(&self, path: &str, content: &str) {
        self.state
            .borrow_mut()
            .files
            .insert(path.to_owned(), content.as_bytes().to_vec());
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.state
            .borrow()
            .files
            .get(path)
            .map(|data| String::from_utf8(data.clone()).expect("utf-8 file"))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.borrow().files.contains_key(path)
    }

    pub fn fail_writes(&self, error: StorageError) {
        self.state.borrow_mut().fail_writes = Some(error);
    }

    pub fn fail_writes_to(&self, path_prefix: &str) {
        self.state.borrow_mut().fail_writes_to = Some(path_prefix.to_owned());
    }

    pub fn short_writes(&self) {
        self.state.borrow_mut().short_writes = true;
    }

    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }
}

impl FileSystem for MemoryFileSystem {
    async fn size(&mut self, path: &str) -> Result<usize, StorageError> {
        self.state
            .borrow()
            .files
            .get(path)
            .map(Vec::len)
            .ok_or(StorageError::NotFound)
    }

    async fn read(
        &mut self,
        path: &str,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let state = self.state.borrow();
        let data = state.files.get(path).ok_or(StorageError::NotFound)?;
        if offset >= data.len() {
            return Ok(0);
        }
        let n = buf.len().min(data.len() - offset);
        buf[..n].copy_from_slice(&data[offset..offset + n]);
        Ok(n)
    }

    async fn write(
        &mut self,
        path: &str,
        data: &[u8],
        mode: OpenMode,
    ) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.writes += 1;
        if let Some(error) = state.fail_writes {
            return Err(error);
        }
        if state
            .fail_writes_to
            .as_deref()
            .is_some_and(|prefix| path.starts_with(prefix))
        {
            return Err(StorageError::Full);
        }
        let data = if state.short_writes && !data.is_empty() {
            &data[..data.len() - 1]
        } else {
            data
        };
        let file = state.files.entry(path.to_owned()).or_default();
        if mode == OpenMode::Truncate {
            file.clear();
        }
        file.extend_from_slice(data);
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        let data = state.files.remove(from).ok_or(StorageError::NotFound)?;
        state.files.insert(to.to_owned(), data);
        state.renames.push((from.to_owned(), to.to_owned()));
        Ok(())
    }

    async fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        self.state
            .borrow_mut()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

// -----------------------------------------------------------------------------
// RAM-backed NOR flash
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub struct FlashState {
    pub data: Vec<u8>,
    /// Program operations left before the simulated power cut
    pub writes_left: Option<usize>,
}

/// NOR flash in RAM: erase sets bytes to `0xFF`, programming only clears bits.
#[derive(Debug, Clone)]
pub struct RamFlash {
    pub state: Rc<RefCell<FlashState>>,
}

impl RamFlash {
    pub const ERASE: usize = 4096;

    pub fn new(sectors: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(FlashState {
                data: vec![0xFF; sectors * Self::ERASE],
                writes_left: None,
            })),
        }
    }

    /// Fail every program operation after the next `count`.
    pub fn cut_power_after(&self, count: usize) {
        self.state.borrow_mut().writes_left = Some(count);
    }

    pub fn restore_power(&self) {
        self.state.borrow_mut().writes_left = None;
    }

    pub fn corrupt(&self, offset: usize) {
        self.state.borrow_mut().data[offset] ^= 0x01;
    }
}

impl ErrorType for RamFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for RamFlash {
    const READ_SIZE: usize = 4;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        if offset % Self::READ_SIZE != 0 || bytes.len() % Self::READ_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let state = self.state.borrow();
        let source = state
            .data
            .get(offset..offset + bytes.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.state.borrow().data.len()
    }
}

impl NorFlash for RamFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = Self::ERASE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let (from, to) = (from as usize, to as usize);
        if from % Self::ERASE != 0 || to % Self::ERASE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let mut state = self.state.borrow_mut();
        state
            .data
            .get_mut(from..to)
            .ok_or(NorFlashErrorKind::OutOfBounds)?
            .fill(0xFF);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let offset = offset as usize;
        if offset % Self::WRITE_SIZE != 0 || bytes.len() % Self::WRITE_SIZE != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        let mut state = self.state.borrow_mut();
        match &mut state.writes_left {
            Some(0) => return Err(NorFlashErrorKind::Other),
            Some(left) => *left -= 1,
            None => {}
        }
        let target = state
            .data
            .get_mut(offset..offset + bytes.len())
            .ok_or(NorFlashErrorKind::OutOfBounds)?;
        for (cell, byte) in target.iter_mut().zip(bytes) {
            *cell &= byte;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// In-memory stream
// -----------------------------------------------------------------------------

/// Serves `input` in reads of at most `chunk` bytes and records everything
/// written.
#[derive(Debug)]
pub struct MockStream {
    input: Vec<u8>,
    position: usize,
    chunk: usize,
    pub output: Vec<u8>,
    pub flushes: usize,
}

impl MockStream {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            position: 0,
            chunk: usize::MAX,
            output: Vec::new(),
            flushes: 0,
        }
    }

    #[must_use]
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }
}

impl embedded_io_async::ErrorType for MockStream {
    type Error = Infallible;
}

impl embedded_io_async::Read for MockStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.input[self.position..];
        let n = remaining.len().min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for MockStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Responses
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8(raw.to_vec()).expect("utf-8 response");
        let (head, body) = text.split_once("\r\n\r\n").expect("header terminator");
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .and_then(|code| code.parse().ok())
            .expect("status line");
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_owned()))
            .collect();
        Self {
            status,
            headers,
            body: body.to_owned(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

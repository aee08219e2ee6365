//! Slot-based file system on a NOR flash partition.
//!
//! Every file occupies one 4 KiB sector: a `SlotHeader` followed by the
//! file content. A write always goes to a free sector and its header is
//! programmed last, so the previous version of a file stays readable until
//! the new one is complete. When a power loss leaves two versions with the
//! same name, the higher generation wins on the next mount.

use bytemuck::{Pod, Zeroable};
use embedded_storage::nor_flash::{NorFlash, NorFlashError as _};
use heapless::String;

use super::{FileSystem, OpenMode, StorageError};

const SECTOR_SIZE: usize = 4096;
const SLOT_MAGIC: u32 = 0xB3AC_0F5E;
const NAME_SIZE: usize = 32;
const HEADER_SIZE: usize = size_of::<SlotHeader>();
/// Largest file a slot can hold
pub const SLOT_CAPACITY: usize = SECTOR_SIZE - HEADER_SIZE;
/// Flash writes are padded to this many bytes
const WORD_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct SlotHeader {
    magic: u32,
    generation: u32,
    len: u32,
    checksum: u32,
    name: [u8; NAME_SIZE],
}

impl SlotHeader {
    fn name(&self) -> Option<&str> {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
        core::str::from_utf8(&self.name[..end]).ok()
    }
}

#[derive(Debug)]
struct SlotEntry {
    name: String<NAME_SIZE>,
    generation: u32,
    len: usize,
}

/// In-memory index of one sector
#[derive(Debug)]
enum Slot {
    Free,
    Used(SlotEntry),
}

pub struct FlashFileSystem<F: NorFlash, const SLOTS: usize> {
    flash: F,
    base: u32,
    slots: [Slot; SLOTS],
    next_generation: u32,
    scratch: [u8; SECTOR_SIZE],
}

impl<F: NorFlash, const SLOTS: usize> FlashFileSystem<F, SLOTS> {
    /// Index the partition at `base` and drop stale or damaged slots.
    pub fn mount(flash: F, base: u32) -> Self {
        let mut fs = Self {
            flash,
            base,
            slots: core::array::from_fn(|_| Slot::Free),
            next_generation: 1,
            scratch: [0; SECTOR_SIZE],
        };

        for index in 0..SLOTS {
            match fs.load_slot(index) {
                Ok(Some(entry)) => {
                    fs.next_generation = fs.next_generation.max(entry.generation.wrapping_add(1));
                    fs.slots[index] = Slot::Used(entry);
                }
                Ok(None) => {}
                Err(e) => log::warn!("flash_fs: slot {} unreadable: {:?}", index, e),
            }
        }
        fs.drop_superseded();

        let used = fs.slots.iter().filter(|slot| matches!(slot, Slot::Used(_))).count();
        log::info!("flash_fs: mounted, {} of {} slots used", used, SLOTS);
        fs
    }

    fn slot_address(&self, index: usize) -> u32 {
        self.base + (index * SECTOR_SIZE) as u32
    }

    /// Read and validate the header and content of a slot.
    fn load_slot(&mut self, index: usize) -> Result<Option<SlotEntry>, StorageError> {
        let address = self.slot_address(index);
        let mut header = SlotHeader::zeroed();
        self.flash
            .read(address, bytemuck::bytes_of_mut(&mut header))
            .map_err(|_| StorageError::DriverError)?;

        if header.magic != SLOT_MAGIC {
            return Ok(None);
        }
        let len = header.len as usize;
        let Some(name) = header.name().and_then(|name| String::try_from(name).ok()) else {
            return Ok(None);
        };
        if len > SLOT_CAPACITY {
            return Ok(None);
        }

        let padded = len.next_multiple_of(WORD_SIZE);
        self.flash
            .read(address + HEADER_SIZE as u32, &mut self.scratch[..padded])
            .map_err(|_| StorageError::DriverError)?;
        if checksum(&self.scratch[..len]) != header.checksum {
            log::warn!("flash_fs: slot {} ('{}') fails its checksum", index, name);
            return Ok(None);
        }

        Ok(Some(SlotEntry {
            name,
            generation: header.generation,
            len,
        }))
    }

    /// Keep only the newest version of every file name.
    fn drop_superseded(&mut self) {
        for index in 0..SLOTS {
            let Slot::Used(entry) = &self.slots[index] else {
                continue;
            };
            let superseded = self.slots.iter().any(|other| match other {
                Slot::Used(other) => {
                    other.name == entry.name && other.generation > entry.generation
                }
                Slot::Free => false,
            });
            if superseded {
                log::info!("flash_fs: dropping old copy of '{}'", entry.name);
                self.release(index);
            }
        }
    }

    fn find(&self, path: &str) -> Option<(usize, &SlotEntry)> {
        self.slots.iter().enumerate().find_map(|(index, slot)| match slot {
            Slot::Used(entry) if entry.name == path => Some((index, entry)),
            _ => None,
        })
    }

    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| matches!(slot, Slot::Free))
    }

    /// Erase a sector and forget it. A failed erase is harmless because the
    /// sector is erased again before reuse.
    fn release(&mut self, index: usize) {
        let address = self.slot_address(index);
        if let Err(e) = self.flash.erase(address, address + SECTOR_SIZE as u32) {
            log::warn!("flash_fs: failed to erase slot {}: {:?}", index, e.kind());
        }
        self.slots[index] = Slot::Free;
    }

    /// Store the first `len` bytes of the scratch buffer as `path`, then drop
    /// the previous version.
    fn commit(&mut self, path: &str, len: usize) -> Result<(), StorageError> {
        let name: String<NAME_SIZE> = String::try_from(path).map_err(|_| StorageError::NameTooLong)?;
        let previous = self.find(path).map(|(index, _)| index);
        let index = self.free_slot().ok_or(StorageError::Full)?;
        let address = self.slot_address(index);

        self.flash
            .erase(address, address + SECTOR_SIZE as u32)
            .map_err(|_| StorageError::DriverError)?;

        let padded = len.next_multiple_of(WORD_SIZE);
        self.scratch[len..padded].fill(0xFF);
        self.flash
            .write(address + HEADER_SIZE as u32, &self.scratch[..padded])
            .map_err(|_| StorageError::DriverError)?;

        let mut header = SlotHeader {
            magic: SLOT_MAGIC,
            generation: self.next_generation,
            len: len as u32,
            checksum: checksum(&self.scratch[..len]),
            name: [0; NAME_SIZE],
        };
        header.name[..name.len()].copy_from_slice(name.as_bytes());
        self.flash
            .write(address, bytemuck::bytes_of(&header))
            .map_err(|_| StorageError::DriverError)?;

        self.slots[index] = Slot::Used(SlotEntry {
            name,
            generation: self.next_generation,
            len,
        });
        self.next_generation = self.next_generation.wrapping_add(1);

        if let Some(previous) = previous {
            self.release(previous);
        }
        Ok(())
    }

    /// Copy a whole file into the scratch buffer.
    fn load_into_scratch(&mut self, index: usize, len: usize) -> Result<(), StorageError> {
        let padded = len.next_multiple_of(WORD_SIZE);
        let address = self.slot_address(index) + HEADER_SIZE as u32;
        self.flash
            .read(address, &mut self.scratch[..padded])
            .map_err(|_| StorageError::DriverError)
    }
}

impl<F: NorFlash, const SLOTS: usize> FileSystem for FlashFileSystem<F, SLOTS> {
    async fn size(&mut self, path: &str) -> Result<usize, StorageError> {
        self.find(path)
            .map(|(_, entry)| entry.len)
            .ok_or(StorageError::NotFound)
    }

    async fn read(
        &mut self,
        path: &str,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, StorageError> {
        let (index, len) = self
            .find(path)
            .map(|(index, entry)| (index, entry.len))
            .ok_or(StorageError::NotFound)?;
        if offset >= len {
            return Ok(0);
        }

        // Reads stay word aligned; the scratch buffer absorbs the slack
        let start = offset - offset % WORD_SIZE;
        let count = buf.len().min(len - offset);
        let end = (offset + count).next_multiple_of(WORD_SIZE);
        let address = self.slot_address(index) + (HEADER_SIZE + start) as u32;
        self.flash
            .read(address, &mut self.scratch[..end - start])
            .map_err(|_| StorageError::DriverError)?;

        let skip = offset - start;
        buf[..count].copy_from_slice(&self.scratch[skip..skip + count]);
        Ok(count)
    }

    async fn write(
        &mut self,
        path: &str,
        data: &[u8],
        mode: OpenMode,
    ) -> Result<(), StorageError> {
        let existing = match mode {
            OpenMode::Truncate => 0,
            OpenMode::Append => match self.find(path).map(|(index, entry)| (index, entry.len)) {
                Some((index, len)) => {
                    self.load_into_scratch(index, len)?;
                    len
                }
                None => 0,
            },
        };
        let len = existing + data.len();
        if len > SLOT_CAPACITY {
            return Err(StorageError::Full);
        }
        self.scratch[existing..len].copy_from_slice(data);
        self.commit(path, len)
    }

    async fn rename(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        let (index, len) = self
            .find(from)
            .map(|(index, entry)| (index, entry.len))
            .ok_or(StorageError::NotFound)?;

        self.load_into_scratch(index, len)?;
        self.commit(to, len)?;
        self.release(index);
        Ok(())
    }

    async fn remove(&mut self, path: &str) -> Result<(), StorageError> {
        let (index, _) = self.find(path).ok_or(StorageError::NotFound)?;
        self.release(index);
        Ok(())
    }
}

/// FNV-1a over the file content
fn checksum(data: &[u8]) -> u32 {
    data.iter().fold(0x811C_9DC5, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

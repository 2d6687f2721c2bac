use crate::console::Console;
use crate::error::ConsoleError;

pub const MEMORY_SIZE: usize = (u16::MAX as usize) + 1;

/// Keyboard status register. Bit 15 is set when a key is waiting in KBDR.
pub const KBSR: u16 = 0xFE00;
/// Keyboard data register. Holds the last key taken from the keyboard.
pub const KBDR: u16 = 0xFE02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRegister {
    KeyboardStatus,
    KeyboardData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Storage,
    Device(DeviceRegister),
}

/// The whole 16-bit address space, one word per address.
#[derive(Debug)]
pub struct Memory {
    cells: Box<[u16]>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: vec![0u16; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    pub const fn region(addr: u16) -> Region {
        match addr {
            KBSR => Region::Device(DeviceRegister::KeyboardStatus),
            KBDR => Region::Device(DeviceRegister::KeyboardData),
            _ => Region::Storage,
        }
    }

    /// Reads a word as the CPU sees it.
    ///
    /// Reading KBSR polls the keyboard first: if a key is waiting it is moved into KBDR and
    /// KBSR reads as `0x8000`, otherwise KBSR reads as zero.
    pub fn read<C: Console>(&mut self, addr: u16, console: &mut C) -> Result<u16, ConsoleError> {
        if let Region::Device(DeviceRegister::KeyboardStatus) = Self::region(addr) {
            if console.key_available()? {
                let key = console.read_byte()?;
                self.write(KBSR, 1 << 15);
                self.write(KBDR, u16::from(key));
            } else {
                self.write(KBSR, 0);
            }
        }
        Ok(self.peek(addr))
    }

    /// Reads a word with no device side effects.
    pub fn peek(&self, addr: u16) -> u16 {
        self.cells[addr as usize]
    }

    /// Device registers are plain cells on the write path.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.cells[addr as usize] = value;
    }

    /// Copies `words` in starting at `origin`, stopping at the top of memory.
    /// Returns how many words were stored.
    pub fn load(&mut self, origin: u16, words: &[u16]) -> usize {
        let start = origin as usize;
        let count = words.len().min(MEMORY_SIZE - start);
        self.cells[start..start + count].copy_from_slice(&words[..count]);
        count
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

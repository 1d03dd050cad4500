use crate::error::{Fault, LoadError};

/// Size of the logical address space backed by real storage (16 KiB).
pub const MEMORY_SIZE: usize = 0x4000;

/// ROM occupies 0x0000–0x1fff and is locked after load.
pub const ROM_SIZE: usize = 0x2000;

/// Start of RAM. Work RAM runs up to 0x23ff, video RAM follows.
pub const RAM_START: u16 = 0x2000;

/// Start of video RAM.
///
/// The frame buffer lives at 0x2400–0x3fff: 0x1c00 bytes, 1 bit per pixel,
/// 32 bytes per scan line (224 lines of 256 pixels).
pub const VRAM_START: usize = 0x2400;
/// Size of video RAM in bytes (0x1c00 = 7168 bytes = 224x256 bits).
pub const VRAM_SIZE: usize = 0x1c00;

/// ROM + RAM image of the Space Invaders board.
///
/// Every address goes through [`MemoryImage::resolve`]: 0x0000–0x3fff map
/// directly, anything above folds back into RAM via
/// `(addr & 0x1fff) | 0x2000`.
#[derive(Clone)]
pub struct MemoryImage {
    bytes: Box<[u8; MEMORY_SIZE]>,
    rom_len: usize,
    ram_fill: u8,
}

impl MemoryImage {
    /// Build an image with `rom` copied to address 0 and RAM filled with
    /// `ram_fill`.
    pub fn new(rom: &[u8], ram_fill: u8) -> Result<Self, LoadError> {
        if rom.is_empty() {
            return Err(LoadError::EmptyRom);
        }
        if rom.len() > ROM_SIZE {
            return Err(LoadError::RomTooLarge {
                len: rom.len(),
                max: ROM_SIZE,
            });
        }

        let mut bytes = Box::new([0u8; MEMORY_SIZE]);
        bytes[..rom.len()].copy_from_slice(rom);
        bytes[ROM_SIZE..].fill(ram_fill);

        Ok(Self {
            bytes,
            rom_len: rom.len(),
            ram_fill,
        })
    }

    /// Map a CPU address onto an offset into the backing store.
    #[inline]
    pub fn resolve(addr: u16) -> usize {
        if addr >= RAM_START {
            ((addr & 0x1fff) | RAM_START) as usize
        } else {
            addr as usize
        }
    }

    #[inline]
    pub fn is_rom(addr: u16) -> bool {
        Self::resolve(addr) < ROM_SIZE
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[Self::resolve(addr)]
    }

    /// Write a byte, refusing any address that resolves into ROM.
    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Fault> {
        let offset = Self::resolve(addr);
        if offset < ROM_SIZE {
            return Err(Fault::rom_write(addr));
        }
        self.bytes[offset] = value;
        Ok(())
    }

    /// Little-endian word read. The high byte may not wrap past 0xffff.
    pub fn read_word(&self, addr: u16) -> Result<u16, Fault> {
        let hi_addr = addr.checked_add(1).ok_or(Fault::wrap(addr))?;
        Ok(u16::from_le_bytes([self.read(addr), self.read(hi_addr)]))
    }

    /// Little-endian word write. Both bytes are checked before either lands.
    pub fn write_word(&mut self, addr: u16, value: u16) -> Result<(), Fault> {
        let hi_addr = addr.checked_add(1).ok_or(Fault::wrap(addr))?;
        if Self::is_rom(addr) {
            return Err(Fault::rom_write(addr));
        }
        if Self::is_rom(hi_addr) {
            return Err(Fault::rom_write(hi_addr));
        }
        let [lo, hi] = value.to_le_bytes();
        self.write(addr, lo)?;
        self.write(hi_addr, hi)
    }

    /// Number of bytes of the loaded ROM image.
    pub fn rom_len(&self) -> usize {
        self.rom_len
    }

    pub fn ram(&self) -> &[u8] {
        &self.bytes[ROM_SIZE..]
    }

    pub fn video_ram(&self) -> &[u8] {
        &self.bytes[VRAM_START..VRAM_START + VRAM_SIZE]
    }

    /// Refill RAM with the construction pattern. ROM is untouched.
    pub fn clear_ram(&mut self) {
        self.bytes[ROM_SIZE..].fill(self.ram_fill);
    }
}

impl std::fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImage")
            .field("rom_len", &self.rom_len)
            .field("ram_fill", &self.ram_fill)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryFaultKind;

    fn image() -> MemoryImage {
        let rom: Vec<u8> = (0..0x200u16).map(|i| i as u8).collect();
        MemoryImage::new(&rom, 0x00).unwrap()
    }

    #[test]
    fn rejects_empty_and_oversized_roms() {
        assert_eq!(MemoryImage::new(&[], 0).unwrap_err(), LoadError::EmptyRom);
        let big = vec![0u8; ROM_SIZE + 1];
        assert_eq!(
            MemoryImage::new(&big, 0).unwrap_err(),
            LoadError::RomTooLarge {
                len: ROM_SIZE + 1,
                max: ROM_SIZE
            }
        );
        assert!(MemoryImage::new(&vec![0u8; ROM_SIZE], 0).is_ok());
    }

    #[test]
    fn ram_is_pattern_filled() {
        let mem = MemoryImage::new(&[0x00], 0xa5).unwrap();
        assert!(mem.ram().iter().all(|&b| b == 0xa5));
        assert_eq!(mem.read(0x0001), 0x00);
    }

    #[test]
    fn mirror_round_trip() {
        let mut mem = image();
        mem.write(0x2100, 0x42).unwrap();
        assert_eq!(mem.read(0x6100), 0x42);

        mem.write(0x6100, 0x99).unwrap();
        assert_eq!(mem.read(0x2100), 0x99);
        assert_eq!(mem.read(0xe100), 0x99);
    }

    #[test]
    fn resolve_folds_high_addresses_into_ram() {
        assert_eq!(MemoryImage::resolve(0x0000), 0x0000);
        assert_eq!(MemoryImage::resolve(0x1fff), 0x1fff);
        assert_eq!(MemoryImage::resolve(0x2000), 0x2000);
        assert_eq!(MemoryImage::resolve(0x3fff), 0x3fff);
        assert_eq!(MemoryImage::resolve(0x4000), 0x2000);
        assert_eq!(MemoryImage::resolve(0x5fff), 0x3fff);
        assert_eq!(MemoryImage::resolve(0xffff), 0x3fff);
    }

    #[test]
    fn rom_write_faults_and_leaves_rom_intact() {
        let mut mem = image();
        let before = mem.read(0x0100);
        let err = mem.write(0x0100, 0xff).unwrap_err();
        assert_eq!(
            err,
            Fault::Memory {
                addr: 0x0100,
                kind: MemoryFaultKind::RomWrite
            }
        );
        assert_eq!(mem.read(0x0100), before);
    }

    #[test]
    fn word_access_is_little_endian_and_guards_wrap() {
        let mut mem = image();
        mem.write_word(0x2400, 0xbeef).unwrap();
        assert_eq!(mem.read(0x2400), 0xef);
        assert_eq!(mem.read(0x2401), 0xbe);
        assert_eq!(mem.read_word(0x6400).unwrap(), 0xbeef);

        assert_eq!(
            mem.read_word(0xffff).unwrap_err(),
            Fault::Memory {
                addr: 0xffff,
                kind: MemoryFaultKind::AddressWrap
            }
        );
    }

    #[test]
    fn word_write_straddling_rom_leaves_ram_untouched() {
        let mut mem = image();
        mem.write(0x2000, 0x11).unwrap();
        assert!(mem.write_word(0x1fff, 0xabcd).is_err());
        assert_eq!(mem.read(0x2000), 0x11);
    }

    #[test]
    fn video_ram_window() {
        let mut mem = image();
        mem.write(0x2400, 0x81).unwrap();
        mem.write(0x3fff, 0x7e).unwrap();
        let vram = mem.video_ram();
        assert_eq!(vram.len(), VRAM_SIZE);
        assert_eq!(vram[0], 0x81);
        assert_eq!(vram[VRAM_SIZE - 1], 0x7e);
    }
}

//! Simulated memory for exercising the reset sequence off-target.

use crate::{layout::Region, startup::AddressSpace};

#[derive(Debug)]
struct Bank {
    base: usize,
    bytes: Vec<u8>,
}

impl Bank {
    fn region(&self) -> Region {
        Region::with_len(self.base, self.bytes.len())
    }
}

/// Byte-addressed memory made of mapped banks.
///
/// Every access is bounds checked. Touching an address outside all banks
/// panics, naming the address. `SimulatedMemory` also counts writes, so tests
/// can show that a step wrote exactly the bytes it should.
///
/// ```
/// use stm32f4_rt::{AddressSpace, Region, SimulatedMemory};
///
/// let mut memory = SimulatedMemory::new();
/// memory.map(0x2000_0000, 16, 0xA5);
/// memory.write_byte(0x2000_0004, 7);
///
/// assert_eq!(memory.read_byte(0x2000_0004), 7);
/// assert_eq!(memory.writes(), 1);
/// assert_eq!(memory.read(Region::with_len(0x2000_0003, 2)), [0xA5, 7]);
/// ```
#[derive(Debug, Default)]
pub struct SimulatedMemory {
    banks: Vec<Bank>,
    writes: usize,
}

impl SimulatedMemory {
    /// Memory with nothing mapped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `len` bytes at `base`, each set to `fill`.
    ///
    /// Panics if the bank overlaps one that's already mapped.
    pub fn map(&mut self, base: usize, len: usize, fill: u8) -> &mut Self {
        let region = Region::with_len(base, len);
        if let Some(other) = self.banks.iter().find(|bank| {
            let other = bank.region();
            region.start < other.end && other.start < region.end
        }) {
            panic!(
                "bank {:#010X}..{:#010X} overlaps {:#010X}..{:#010X}",
                region.start,
                region.end,
                other.base,
                other.region().end
            );
        }
        self.banks.push(Bank {
            base,
            bytes: vec![fill; len],
        });
        self
    }

    /// Map a bank holding `contents`.
    pub fn map_contents(&mut self, base: usize, contents: &[u8]) -> &mut Self {
        self.map(base, contents.len(), 0);
        if let Some(bank) = self.banks.last_mut() {
            bank.bytes.copy_from_slice(contents);
        }
        self
    }

    /// Copy out the bytes in `region`.
    pub fn read(&self, region: Region) -> Vec<u8> {
        (region.start..region.end)
            .map(|address| self.read_byte(address))
            .collect()
    }

    /// How many bytes have been written through [`AddressSpace`].
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn locate(&self, address: usize) -> Option<(usize, usize)> {
        self.banks
            .iter()
            .enumerate()
            .find(|(_, bank)| bank.region().contains(address))
            .map(|(idx, bank)| (idx, address - bank.base))
    }
}

impl AddressSpace for SimulatedMemory {
    fn read_byte(&self, address: usize) -> u8 {
        match self.locate(address) {
            Some((bank, offset)) => self.banks[bank].bytes[offset],
            None => panic!("read from unmapped address {address:#010X}"),
        }
    }

    fn write_byte(&mut self, address: usize, value: u8) {
        match self.locate(address) {
            Some((bank, offset)) => {
                self.banks[bank].bytes[offset] = value;
                self.writes += 1;
            }
            None => panic!("write to unmapped address {address:#010X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedMemory;
    use crate::{layout::Region, startup::AddressSpace};

    #[test]
    #[should_panic(expected = "write to unmapped address 0x20000010")]
    fn writes_past_a_bank_panic() {
        let mut memory = SimulatedMemory::new();
        memory.map(0x2000_0000, 16, 0);
        memory.write_byte(0x2000_0010, 1);
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn overlapping_banks_panic() {
        SimulatedMemory::new()
            .map(0x2000_0000, 16, 0)
            .map(0x2000_000F, 16, 0);
    }

    #[test]
    fn adjacent_banks() {
        let mut memory = SimulatedMemory::new();
        memory
            .map_contents(0x0800_0000, &[1, 2, 3])
            .map(0x0800_0003, 2, 9);
        assert_eq!(memory.read(Region::with_len(0x0800_0000, 5)), [1, 2, 3, 9, 9]);
        assert_eq!(memory.writes(), 0);
    }
}

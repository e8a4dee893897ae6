//! Inspect a linked firmware image.
//!
//! Set `STM32F4_RT_ELF` to the path of an image built for the target, for
//! instance
//!
//! ```text
//! cargo build --example blink --target thumbv7em-none-eabihf --features board/nucleo-f429zi
//! STM32F4_RT_ELF=target/thumbv7em-none-eabihf/debug/examples/blink cargo test --test inspect_elf
//! ```
//!
//! Without the variable, these tests pass without checking anything.

use goblin::elf::{Elf, SectionHeader};

type Error = Box<dyn std::error::Error>;

const FLASH_START: u64 = 0x0800_0000;
const TABLE_WORDS: usize = 107;
const RESERVED: [usize; 5] = [7, 8, 9, 10, 13];

struct Image {
    bytes: Vec<u8>,
}

impl Image {
    fn load() -> Result<Option<Self>, Error> {
        match std::env::var("STM32F4_RT_ELF") {
            Ok(path) => Ok(Some(Image {
                bytes: std::fs::read(path)?,
            })),
            Err(_) => Ok(None),
        }
    }

    fn elf(&self) -> Result<Elf<'_>, Error> {
        Ok(Elf::parse(&self.bytes)?)
    }
}

fn section<'a>(elf: &'a Elf, name: &str) -> Option<&'a SectionHeader> {
    elf.section_headers
        .iter()
        .find(|sec| elf.shdr_strtab.get_at(sec.sh_name) == Some(name))
}

fn symbol(elf: &Elf, name: &str) -> Option<u64> {
    elf.syms
        .iter()
        .find(|sym| elf.strtab.get_at(sym.st_name) == Some(name))
        .map(|sym| sym.st_value)
}

fn require(elf: &Elf, name: &str) -> Result<u64, Error> {
    symbol(elf, name).ok_or_else(|| format!("missing symbol {name}").into())
}

fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect()
}

#[test]
fn vector_table_leads_flash() -> Result<(), Error> {
    let Some(image) = Image::load()? else {
        return Ok(());
    };
    let elf = image.elf()?;

    let table = section(&elf, ".vector_table").ok_or("missing .vector_table")?;
    assert!(table.sh_addr >= FLASH_START);
    assert_eq!(table.sh_addr % 512, 0);
    assert_eq!(table.sh_size as usize, TABLE_WORDS * 4);
    assert_eq!(require(&elf, "__VECTOR_TABLE")?, table.sh_addr);

    let offset = table.sh_offset as usize;
    let words = words(&image.bytes[offset..offset + TABLE_WORDS * 4]);

    assert_eq!(u64::from(words[0]), require(&elf, "_estack")?);
    // Thumb addresses have the low bit set.
    assert_eq!(u64::from(words[1]), require(&elf, "Reset")? | 1);
    for (idx, word) in words.iter().enumerate().skip(2) {
        if RESERVED.contains(&idx) {
            assert_eq!(*word, 0, "slot {idx}");
        } else {
            assert_eq!(word & 1, 1, "slot {idx} is {word:#010X}");
        }
    }
    Ok(())
}

#[test]
fn handler_symbols_fill_their_slots() -> Result<(), Error> {
    let Some(image) = Image::load()? else {
        return Ok(());
    };
    let elf = image.elf()?;

    let table = section(&elf, ".vector_table").ok_or("missing .vector_table")?;
    let offset = table.sh_offset as usize;
    let words = words(&image.bytes[offset..offset + TABLE_WORDS * 4]);

    // Every handler resolves to the application's function, or to the default.
    let handlers = [
        ("NonMaskableInt", 2),
        ("HardFault", 3),
        ("SVCall", 11),
        ("PendSV", 14),
        ("SysTick", 15),
        ("WWDG", 16),
        ("USART1", 16 + 37),
        ("DMA2D", 16 + 90),
    ];
    for (name, slot) in handlers {
        let addr = require(&elf, name)?;
        assert_eq!(u64::from(words[slot]), addr | 1, "{name}");
    }

    let default = require(&elf, "DefaultHandler")? | 1;
    assert!(words.iter().any(|word| u64::from(*word) == default));
    assert!(symbol(&elf, "__stm32f4_rt_v0.1").is_some());
    Ok(())
}

#[test]
fn memory_map_is_consistent() -> Result<(), Error> {
    let Some(image) = Image::load()? else {
        return Ok(());
    };
    let elf = image.elf()?;

    let sidata = require(&elf, "_sidata")?;
    let sdata = require(&elf, "_sdata")?;
    let edata = require(&elf, "_edata")?;
    let sbss = require(&elf, "_sbss")?;
    let ebss = require(&elf, "_ebss")?;
    let end = require(&elf, "_end")?;
    let estack = require(&elf, "_estack")?;
    let stack_size = require(&elf, "_Min_Stack_Size")?;
    let heap_size = require(&elf, "_Min_Heap_Size")?;

    assert!(sidata >= FLASH_START && sidata < 0x0820_0000);
    assert!(sdata <= edata);
    assert!(sbss <= ebss);
    assert!(ebss <= end);
    assert_eq!(sdata % 4, 0);
    assert_eq!(sbss % 4, 0);
    assert!(end + heap_size <= estack - stack_size);

    if let Some(data) = section(&elf, ".data") {
        assert_eq!(data.sh_addr, sdata);
        assert_eq!(data.sh_size, edata - sdata);
    }
    for array in [".preinit_array", ".init_array", ".fini_array"] {
        if let Some(sec) = section(&elf, array) {
            assert_eq!(sec.sh_size % 4, 0, "{array}");
            assert!(sec.sh_addr >= FLASH_START, "{array}");
        }
    }
    Ok(())
}

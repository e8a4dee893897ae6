//! Build-time runtime configuration.
//!
//! A firmware crate's `build.rs` describes its memory placement with
//! [`RuntimeBuilder`], which writes the linker script.

// Match every `Family` variant by name, so a new part shows up in every
// size table.
#![warn(clippy::wildcard_enum_match_arm)]

use std::{
    env,
    fmt::Display,
    fs,
    io::{self, Write},
    path::PathBuf,
};

use crate::{vectors::Exception, Interrupt, VectorTable};

const FLASH_START: u32 = 0x0800_0000;
const SRAM_START: u32 = 0x2000_0000;
const CCM_START: u32 = 0x1000_0000;

/// The vector table's placement must satisfy VTOR, which wants the table
/// aligned to its size rounded up to a power of two.
const VECTOR_TABLE_ALIGN: usize = (VectorTable::LEN * 4).next_power_of_two();

/// Memory partitions.
///
/// [`RuntimeBuilder`] places `.data`, `.bss` and the stack in one of these.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memory {
    /// Place the section in internal flash.
    Flash,
    /// Place the section in the main SRAM, starting at `0x2000_0000`.
    ///
    /// SRAM1, SRAM2 and (if available) SRAM3 are contiguous, and treated
    /// as one memory.
    Sram,
    /// Place the section in core-coupled memory (CCM), starting at `0x1000_0000`.
    ///
    /// Only the CPU can reach CCM. Keep DMA buffers out of sections placed
    /// here.
    Ccm,
}

impl Display for Memory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Flash => f.write_str("FLASH"),
            Self::Sram => f.write_str("SRAM"),
            Self::Ccm => f.write_str("CCMRAM"),
        }
    }
}

/// `REGION_<name>` names the memory that holds `placement`.
fn region_alias(output: &mut dyn Write, name: &str, placement: Memory) -> io::Result<()> {
    writeln!(output, "REGION_ALIAS(\"REGION_{name}\", {placement});")
}

/// Route the handler `name` to `target`, unless the application defines `name`.
fn provide(output: &mut dyn Write, name: &str, target: &str) -> io::Result<()> {
    writeln!(output, "PROVIDE({name} = {target});")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FlashOpts {
    size: usize,
    offset: u32,
}

impl FlashOpts {
    /// Produce the flash address of the image.
    fn flash_origin(&self) -> u32 {
        FLASH_START + self.offset
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EnvOverride {
    default: usize,
    env: Option<String>,
}

impl EnvOverride {
    const fn new(default: usize) -> Self {
        Self { default, env: None }
    }
    fn set_env_key(&mut self, key: String) {
        self.env = Some(key);
    }
    fn read(&self) -> Result<usize, Box<dyn std::error::Error>> {
        if let Some(env) = &self.env {
            // Only the most recently selected variable triggers a re-run. If a
            // build script selects one of two variables conditionally, the
            // re-run behavior then matches the selection, no matter how the
            // build script orders its calls.
            println!("cargo:rerun-if-env-changed={env}");
        }

        if let Some(val) = self.env.as_ref().and_then(|key| env::var(key).ok()) {
            parse_size(&val)
        } else {
            Ok(self.default)
        }
    }
}

/// Parse a byte count, allowing a `k` or `K` suffix for KiB.
fn parse_size(val: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let val = val.trim();
    let size = if let Some(kib) = val.strip_suffix(['k', 'K']) {
        kib.parse::<usize>()?
            .checked_mul(1024)
            .ok_or_else(|| format!("Size '{val}' overflows usize"))?
    } else {
        val.parse::<usize>()?
    };
    Ok(size)
}

/// Builder for the STM32F4 runtime.
///
/// `RuntimeBuilder` lets you assign sections to memory regions, and size the
/// stack and heap. Call [`build()`](RuntimeBuilder::build) to commit the
/// runtime configuration.
///
/// # Behaviors
///
/// The vector table always starts the image. Instructions, read-only data,
/// and the constructor / destructor arrays stay in flash. The initial values
/// of `.data` are also stored in flash, and copied to their RAM home by the
/// reset routine.
///
/// The stack sits at the top of its memory, and grows down. The heap starts
/// right after `.bss`, and grows up toward the stack. Since the heap is
/// bounded by the stack reservation, `.bss` and the stack must share a memory.
///
/// `heap_size` is a reservation that the linker checks, not a limit. At runtime,
/// the heap may grow until it meets the stack reservation.
///
/// # Default values
///
/// These calls spell out what `from_flash` already picks.
///
/// ```
/// use stm32f4_rt::{Family, RuntimeBuilder, Memory};
///
/// const FLASH_SIZE: usize = 1024 * 1024;
/// let family = Family::Stm32f407;
///
/// let mut b = RuntimeBuilder::from_flash(family, FLASH_SIZE);
/// b.data(Memory::Sram);    // Copied from flash.
/// b.bss(Memory::Sram);
/// b.stack(Memory::Sram);
/// b.stack_size(8 * 1024);  // 8 KiB stack.
/// b.heap_size(0);          // No heap reservation.
/// b.linker_script_name("stm32f4-link.x");
///
/// assert_eq!(b, RuntimeBuilder::from_flash(family, FLASH_SIZE));
/// ```
///
/// # Environment overrides
///
/// The stack and heap can be sized using environment variables. As the provider
/// of the runtime, you can use `*_env_override` methods to select the environment
/// variable(s) that others may use to set the size, in bytes, for these memory
/// regions.
///
/// ```no_run
/// # use stm32f4_rt::{Family, RuntimeBuilder};
/// # const FLASH_SIZE: usize = 1024 * 1024;
/// # let family = Family::Stm32f407;
/// RuntimeBuilder::from_flash(family, FLASH_SIZE)
///     .stack_size_env_override("YOUR_STACK_SIZE")
///     .stack_size(2048)
///     // ...
///     # .build().unwrap();
/// ```
///
/// Here the stack is 2048 bytes, unless `YOUR_STACK_SIZE` is set. The environment is
/// read in [`build()`](Self::build), so call order doesn't matter. When several
/// variables are selected, only the last one counts.
///
/// Values are byte counts. A `k` or `K` suffix means KiB: `4k`, `4K` and `4096`
/// all give a 4096 byte stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeBuilder {
    family: Family,
    data: Memory,
    bss: Memory,
    stack: Memory,
    stack_size: EnvOverride,
    heap_size: EnvOverride,
    flash_opts: FlashOpts,
    linker_script_name: String,
}

const DEFAULT_LINKER_SCRIPT_NAME: &str = "stm32f4-link.x";

impl RuntimeBuilder {
    /// Creates a runtime that boots from the start of internal flash.
    ///
    /// `flash_size` is the amount of flash, in bytes, that the image may use.
    pub fn from_flash(family: Family, flash_size: usize) -> Self {
        Self::in_flash(family, flash_size, 0)
    }

    /// Creates a runtime for an image that a bootloader starts.
    ///
    /// The image occupies `partition_size` bytes, `partition_offset` bytes past
    /// the start of flash.
    ///
    /// The processor won't boot this program out of reset. Your bootloader should
    /// set the stack pointer and jump to the reset routine, as described by the
    /// vector table at the start of the partition. Enable the `set-vtor` feature
    /// so that the program points the processor at its own vector table.
    pub fn in_flash(family: Family, partition_size: usize, partition_offset: u32) -> Self {
        Self {
            family,
            data: Memory::Sram,
            bss: Memory::Sram,
            stack: Memory::Sram,
            stack_size: EnvOverride::new(8 * 1024),
            heap_size: EnvOverride::new(0),
            flash_opts: FlashOpts {
                size: partition_size,
                offset: partition_offset,
            },
            linker_script_name: DEFAULT_LINKER_SCRIPT_NAME.into(),
        }
    }

    /// Set the memory placement for `.data`.
    pub fn data(&mut self, memory: Memory) -> &mut Self {
        self.data = memory;
        self
    }
    /// Set the memory placement for `.bss`.
    ///
    /// The heap follows `.bss`.
    pub fn bss(&mut self, memory: Memory) -> &mut Self {
        self.bss = memory;
        self
    }
    /// Set the memory placement for the stack.
    pub fn stack(&mut self, memory: Memory) -> &mut Self {
        self.stack = memory;
        self
    }
    /// Reserve `bytes` for the stack, below the top of its memory.
    ///
    /// The size must be a multiple of 8 bytes.
    pub fn stack_size(&mut self, bytes: usize) -> &mut Self {
        self.stack_size.default = bytes;
        self
    }
    /// Read the stack size from the environment variable `key`, if it's set.
    ///
    /// See [environment overrides](RuntimeBuilder#environment-overrides).
    pub fn stack_size_env_override(&mut self, key: impl AsRef<str>) -> &mut Self {
        self.stack_size.set_env_key(key.as_ref().into());
        self
    }
    /// Set the minimum size, in bytes, that must remain between `.bss`
    /// and the stack reservation.
    pub fn heap_size(&mut self, bytes: usize) -> &mut Self {
        self.heap_size.default = bytes;
        self
    }
    /// Read the heap reservation from the environment variable `key`, if it's set.
    pub fn heap_size_env_override(&mut self, key: impl AsRef<str>) -> &mut Self {
        self.heap_size.set_env_key(key.as_ref().into());
        self
    }

    /// Rename the generated linker script.
    ///
    /// Users pass this name to the linker with `-T`. See the
    /// [crate-level documentation](crate#linker-script).
    pub fn linker_script_name(&mut self, name: &str) -> &mut Self {
        self.linker_script_name = name.into();
        self
    }

    /// Write the linker script into `OUT_DIR`, and add `OUT_DIR` to the
    /// linker's search path.
    ///
    /// # Errors
    ///
    /// The implementation ensures that your chip can support the runtime
    /// configuration. If it cannot, `build()` returns an error describing the
    /// problem.
    ///
    /// Also returns an error if a stack or heap size environment override
    /// isn't a valid size.
    pub fn build(&self) -> Result<(), Box<dyn std::error::Error>> {
        // OUT_DIR belongs to the firmware crate running this build script.
        let out_dir = PathBuf::from(env::var("OUT_DIR")?);
        println!("cargo:rustc-link-search={}", out_dir.display());

        let mut in_memory = Vec::new();
        self.write_linker_script(&mut in_memory)?;
        fs::write(out_dir.join(&self.linker_script_name), &in_memory)?;
        Ok(())
    }

    /// Write the linker script to `writer`.
    ///
    /// Nothing is added to the search path, and
    /// [`linker_script_name`](Self::linker_script_name) is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`build()`](Self::build).
    pub fn write_linker_script(
        &self,
        writer: &mut dyn Write,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.check_configurations()?;
        let stack_size = self.stack_size.read()?;
        let heap_size = self.heap_size.read()?;
        self.check_reservations(stack_size, heap_size)?;

        write_memory_map(writer, self.family, &self.flash_opts)?;

        // stm32f4-link.x expects these three aliases.
        region_alias(writer, "DATA", self.data)?;
        region_alias(writer, "BSS", self.bss)?;
        region_alias(writer, "STACK", self.stack)?;
        writeln!(writer, "_Min_Stack_Size = {stack_size:#010X};")?;
        writeln!(writer, "_Min_Heap_Size = {heap_size:#010X};")?;

        write_handler_aliases(writer)?;

        // Identifies the family in a linked image.
        writeln!(writer, "__stm32f4_rt_v0.1 = {:#010X};", self.family.id())?;

        let link_x = include_bytes!("host/stm32f4-link.x");
        writer.write_all(link_x)?;

        Ok(())
    }

    fn check_configurations(&self) -> Result<(), String> {
        let flash_end = (self.flash_opts.offset as usize).checked_add(self.flash_opts.size);
        if flash_end.map_or(true, |end| end > self.family.flash_size()) {
            return Err(format!(
                "Chip {:?} has {} bytes of flash. Cannot place a {} byte image at offset {:#X}",
                self.family,
                self.family.flash_size(),
                self.flash_opts.size,
                self.flash_opts.offset,
            ));
        }
        if self.flash_opts.offset as usize % VECTOR_TABLE_ALIGN != 0 {
            return Err(format!(
                "Flash offset {:#X} must be a multiple of {VECTOR_TABLE_ALIGN} bytes to hold the vector table",
                self.flash_opts.offset,
            ));
        }

        fn prevent_flash(name: &str, memory: Memory) -> Result<(), String> {
            if memory == Memory::Flash {
                Err(format!("Section '{name}' cannot be placed in flash"))
            } else {
                Ok(())
            }
        }
        macro_rules! prevent_flash {
            ($sec:ident) => {
                prevent_flash(stringify!($sec), self.$sec)
            };
        }

        prevent_flash!(data)?;
        prevent_flash!(bss)?;
        prevent_flash!(stack)?;

        if self.bss != self.stack {
            return Err(format!(
                "The heap grows from '.bss' toward the stack, so they must share a memory. \
                 '.bss' is in {}, but the stack is in {}",
                self.bss, self.stack
            ));
        }

        Ok(())
    }

    fn check_reservations(&self, stack_size: usize, heap_size: usize) -> Result<(), String> {
        if stack_size % 8 != 0 {
            return Err(format!(
                "Stack size {stack_size} must be a multiple of 8 bytes"
            ));
        }
        let available = self.family.memory_size(self.stack);
        if stack_size
            .checked_add(heap_size)
            .map_or(true, |reserved| reserved > available)
        {
            return Err(format!(
                "Chip {:?} has {} bytes of {}. Cannot reserve {} bytes of stack and {} bytes of heap",
                self.family, available, self.stack, stack_size, heap_size,
            ));
        }
        Ok(())
    }
}

fn write_memory_map(output: &mut dyn Write, family: Family, flash_opts: &FlashOpts) -> io::Result<()> {
    writeln!(
        output,
        "/* Memory map for '{:?}' with flash length {} at offset {:#X}. */",
        family, flash_opts.size, flash_opts.offset
    )?;
    writeln!(output, "MEMORY {{")?;
    writeln!(
        output,
        "FLASH (RX) : ORIGIN = {:#X}, LENGTH = {:#X}",
        flash_opts.flash_origin(),
        flash_opts.size
    )?;
    writeln!(
        output,
        "SRAM (RWX) : ORIGIN = {SRAM_START:#X}, LENGTH = {:#X}",
        family.sram_size()
    )?;
    writeln!(
        output,
        "CCMRAM (RW) : ORIGIN = {CCM_START:#X}, LENGTH = {:#X}",
        family.ccm_size()
    )?;
    writeln!(output, "}}")?;
    Ok(())
}

/// Every handler defaults to `DefaultHandler`, which defaults to the runtime's
/// halting handler.
fn write_handler_aliases(output: &mut dyn Write) -> io::Result<()> {
    provide(output, "DefaultHandler", "DefaultHandler_")?;
    provide(output, "SystemInit", "__stm32f4_rt_system_init")?;
    for exception in Exception::ALL {
        provide(output, exception.name(), "DefaultHandler")?;
    }
    for interrupt in Interrupt::ALL {
        provide(output, interrupt.name(), "DefaultHandler")?;
    }
    Ok(())
}

/// An STM32F4 chip family.
///
/// The family decides the sizes of flash, SRAM and CCM.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Stm32f405,
    Stm32f407,
    Stm32f427,
    Stm32f429,
}

impl Family {
    const fn id(self) -> u32 {
        match self {
            Family::Stm32f405 => 0x405,
            Family::Stm32f407 => 0x407,
            Family::Stm32f427 => 0x427,
            Family::Stm32f429 => 0x429,
        }
    }
    /// The largest flash for any part in the family, in bytes.
    pub const fn flash_size(self) -> usize {
        match self {
            Family::Stm32f405 | Family::Stm32f407 => 1024 * 1024,
            Family::Stm32f427 | Family::Stm32f429 => 2 * 1024 * 1024,
        }
    }
    /// Contiguous SRAM at `0x2000_0000`, in bytes.
    pub const fn sram_size(self) -> usize {
        match self {
            // SRAM1 (112 KiB) + SRAM2 (16 KiB)
            Family::Stm32f405 | Family::Stm32f407 => 128 * 1024,
            // SRAM1 (112 KiB) + SRAM2 (16 KiB) + SRAM3 (64 KiB)
            Family::Stm32f427 | Family::Stm32f429 => 192 * 1024,
        }
    }
    /// Core-coupled memory at `0x1000_0000`, in bytes.
    pub const fn ccm_size(self) -> usize {
        match self {
            Family::Stm32f405 | Family::Stm32f407 | Family::Stm32f427 | Family::Stm32f429 => {
                64 * 1024
            }
        }
    }
    fn memory_size(self, memory: Memory) -> usize {
        match memory {
            Memory::Flash => self.flash_size(),
            Memory::Sram => self.sram_size(),
            Memory::Ccm => self.ccm_size(),
        }
    }
}

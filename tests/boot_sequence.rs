//! Run the reset sequence against simulated memory.

use std::{cell::RefCell, rc::Rc};

use stm32f4_rt::{AddressSpace, BootHooks, MemoryLayout, Region, SimulatedMemory};

const FLASH_IMAGE: usize = 0x0800_4000;
const SRAM: usize = 0x2000_0000;
const GARBAGE: u8 = 0xEE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Copy,
    Zero,
    Constructors,
    SystemInit,
    Main,
    Destructors,
}

type Journal = Rc<RefCell<Vec<Step>>>;

/// Memory that notes which section each write lands in.
struct Observed {
    memory: SimulatedMemory,
    layout: MemoryLayout,
    journal: Journal,
}

impl AddressSpace for Observed {
    fn read_byte(&self, address: usize) -> u8 {
        self.memory.read_byte(address)
    }
    fn write_byte(&mut self, address: usize, value: u8) {
        let step = if self.layout.data.contains(address) {
            Step::Copy
        } else if self.layout.bss.contains(address) {
            Step::Zero
        } else {
            panic!("stray write to {address:#010X}");
        };
        self.journal.borrow_mut().push(step);
        self.memory.write_byte(address, value);
    }
}

struct Recorder(Journal);

impl BootHooks for Recorder {
    fn run_constructors(&mut self) {
        self.0.borrow_mut().push(Step::Constructors);
    }
    fn system_init(&mut self) {
        self.0.borrow_mut().push(Step::SystemInit);
    }
    fn main(&mut self) {
        self.0.borrow_mut().push(Step::Main);
    }
    fn run_destructors(&mut self) {
        self.0.borrow_mut().push(Step::Destructors);
    }
}

fn layout(data_len: usize, bss_len: usize) -> MemoryLayout {
    let data = Region::with_len(SRAM, data_len);
    let bss = Region::with_len(data.end, bss_len);
    MemoryLayout {
        data_load: FLASH_IMAGE,
        data,
        bss,
        heap_start: 0x2000_0100,
        stack_top: 0x2002_0000,
        stack_size: 0x400,
    }
}

fn image(len: usize) -> Vec<u8> {
    (0..len).map(|idx| (idx as u8).wrapping_mul(7) ^ 0x3C).collect()
}

fn prepare(layout: MemoryLayout) -> (Observed, Journal) {
    let mut memory = SimulatedMemory::new();
    memory
        .map_contents(FLASH_IMAGE, &image(layout.data.len()))
        .map(SRAM, 0x200, GARBAGE);
    let journal = Journal::default();
    let observed = Observed {
        memory,
        layout,
        journal: Rc::clone(&journal),
    };
    (observed, journal)
}

/// Collapse runs of the same step.
fn phases(journal: &Journal) -> Vec<Step> {
    let mut steps = journal.borrow().clone();
    steps.dedup();
    steps
}

#[test]
fn copies_data_and_zeroes_bss() {
    let layout = layout(40, 16);
    let (mut memory, journal) = prepare(layout);
    stm32f4_rt::boot(&mut memory, &layout, &mut Recorder(Rc::clone(&journal)));

    assert_eq!(memory.memory.read(layout.data), image(40));
    assert_eq!(memory.memory.read(layout.bss), [0; 16]);
    // Nothing past .bss is touched.
    assert_eq!(memory.memory.read(Region::with_len(layout.bss.end, 8)), [GARBAGE; 8]);
    assert_eq!(memory.memory.writes(), 56);
}

#[test]
fn steps_run_in_order() {
    let layout = layout(40, 16);
    let (mut memory, journal) = prepare(layout);
    stm32f4_rt::boot(&mut memory, &layout, &mut Recorder(Rc::clone(&journal)));

    assert_eq!(
        phases(&journal),
        [
            Step::Copy,
            Step::Zero,
            Step::Constructors,
            Step::SystemInit,
            Step::Main,
            Step::Destructors,
        ]
    );
    let count = |step| journal.borrow().iter().filter(|s| **s == step).count();
    assert_eq!(count(Step::Copy), 40);
    assert_eq!(count(Step::Zero), 16);
    assert_eq!(count(Step::Main), 1);
}

#[test]
fn empty_sections_write_nothing() {
    let layout = layout(0, 0);
    let (mut memory, journal) = prepare(layout);
    stm32f4_rt::boot(&mut memory, &layout, &mut Recorder(Rc::clone(&journal)));

    assert_eq!(memory.memory.writes(), 0);
    assert_eq!(memory.memory.read(Region::with_len(SRAM, 4)), [GARBAGE; 4]);
    assert_eq!(
        phases(&journal),
        [
            Step::Constructors,
            Step::SystemInit,
            Step::Main,
            Step::Destructors,
        ]
    );
}

#[test]
fn bss_without_data() {
    let layout = layout(0, 24);
    let (mut memory, journal) = prepare(layout);
    stm32f4_rt::boot(&mut memory, &layout, &mut Recorder(Rc::clone(&journal)));

    assert_eq!(memory.memory.read(layout.bss), [0; 24]);
    assert_eq!(phases(&journal)[0], Step::Zero);
}

#[test]
#[should_panic(expected = "read from unmapped address")]
fn data_image_outside_flash_is_caught() {
    let mut layout = layout(40, 16);
    let (mut memory, journal) = prepare(layout);
    layout.data_load = FLASH_IMAGE + 8;
    stm32f4_rt::boot(&mut memory, &layout, &mut Recorder(journal));
}

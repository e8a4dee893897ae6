use stm32f4_rt::{HeapCursor, MemoryLayout, OutOfMemory, Region};

const BOUND: usize = 0x2001_FC00;

fn layout() -> MemoryLayout {
    MemoryLayout {
        data_load: 0x0800_4000,
        data: Region::with_len(0x2000_0000, 40),
        bss: Region::with_len(0x2000_0028, 16),
        heap_start: 0x2000_0100,
        stack_top: 0x2002_0000,
        stack_size: 0x400,
    }
}

#[test]
fn grows_to_exactly_the_stack_reservation() {
    let layout = layout();
    assert_eq!(layout.heap_limit(), BOUND);

    let mut heap = HeapCursor::new();
    assert_eq!(heap.sbrk(&layout, 64), Ok(0x2000_0100));
    assert_eq!(heap.current(), Some(0x2000_0140));

    let rest = (BOUND - 0x2000_0140) as isize;
    assert_eq!(heap.sbrk(&layout, rest), Ok(0x2000_0140));
    assert_eq!(heap.current(), Some(BOUND));

    assert_eq!(
        heap.sbrk(&layout, 1),
        Err(OutOfMemory {
            cursor: BOUND,
            increment: 1,
            limit: BOUND,
        })
    );
    assert_eq!(heap.current(), Some(BOUND));

    // A zero increment still reports the break.
    assert_eq!(heap.sbrk(&layout, 0), Ok(BOUND));
}

#[test]
fn failures_leave_room_for_smaller_requests() {
    let layout = layout();
    let mut heap = HeapCursor::new();
    let whole = (BOUND - layout.heap_start) as isize;

    assert!(heap.sbrk(&layout, whole + 1).is_err());
    assert_eq!(heap.current(), Some(layout.heap_start));
    assert_eq!(heap.sbrk(&layout, whole), Ok(layout.heap_start));
}

#[test]
fn release_and_regrow() {
    let layout = layout();
    let mut heap = HeapCursor::new();
    heap.sbrk(&layout, 0x1000).unwrap();
    assert_eq!(heap.sbrk(&layout, -0x800), Ok(0x2000_1100));
    assert_eq!(heap.sbrk(&layout, 0x10), Ok(0x2000_0900));
    assert_eq!(heap.current(), Some(0x2000_0910));
}

#[test]
fn exhaustion_explains_itself() {
    let layout = layout();
    let err = HeapCursor::new().sbrk(&layout, 0x20_0000).unwrap_err();
    let err: Box<dyn std::error::Error> = Box::new(err);
    assert_eq!(
        err.to_string(),
        "cannot move heap cursor 0x20000100 by 2097152 bytes (heap ends at 0x2001FC00)"
    );
}

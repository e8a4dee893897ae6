use std::{collections::HashSet, env};

use stm32f4_rt::{Family, Memory, RuntimeBuilder};

fn extract_features() -> HashSet<String> {
    env::vars()
        .map(|(k, _)| k)
        .flat_map(|feat| feat.strip_prefix("CARGO_FEATURE_").map(str::to_lowercase))
        .collect()
}

/// Creates a runtime for a particular family, adjusting whether the image is
/// expected to boot out of reset based on provided features.
fn create_runtime(family: Family, flash_size: usize) -> RuntimeBuilder {
    if cfg!(feature = "nonboot") {
        RuntimeBuilder::in_flash(family, flash_size - 64 * 1024, 64 * 1024)
    } else {
        RuntimeBuilder::from_flash(family, flash_size)
    }
}

/// Configures the runtime for a variety of boards.
///
/// Note that some automated tests may check these runtimes. Feel free to change
/// values and observe how they might affect the tests.
fn main() {
    let features = extract_features();
    for feature in features {
        match feature.as_str() {
            "nucleo_f429zi" => create_runtime(Family::Stm32f429, 2 * 1024 * 1024)
                .data(Memory::Sram)
                .bss(Memory::Ccm)
                .stack(Memory::Ccm)
                .heap_size(4 * 1024)
                .stack_size_env_override("THIS_WONT_BE_CONSIDERED")
                .stack_size_env_override("BOARD_STACK")
                .heap_size_env_override("BOARD_HEAP")
                .build()
                .unwrap(),
            "stm32f4_discovery" => create_runtime(Family::Stm32f407, 1024 * 1024)
                .heap_size(4 * 1024)
                .stack_size_env_override("BOARD_STACK")
                .heap_size_env_override("BOARD_HEAP")
                .build()
                .unwrap(),
            _ => continue,
        }
        break;
    }
}

// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements a Chip-8 interpreter as if it were a real CPU architecture.
//!
//! The [CPU](cpu::CPU) owns all of the machine's state: memory, registers, stack,
//! timers, screen, and keypad. Whatever drives it is responsible for the rest:
//! calling [CPU::tick](cpu::CPU::tick) at the instruction rate,
//! [CPU::tick_timers](cpu::CPU::tick_timers) at 60Hz, feeding in key presses,
//! and presenting the [Screen](screen::Screen) when it asks to be redrawn.

pub mod cpu;
pub mod error;
pub mod screen;
pub mod traits;

/// Common imports for vipcore
pub mod prelude {
    use super::*;
    pub use cpu::{
        flags::Flags,
        instruction::{
            disassembler::{Dis, Disassembler},
            Decoded, Insn,
        },
        mem::{Mem, Region::*, CHARSET, MEMORY_SIZE, PROGRAM_START},
        timers::{TimerEvent, Timers},
        Step, CPU, STACK_DEPTH,
    };
    pub use error::{Error, Result};
    pub use screen::{Screen, HEIGHT, WIDTH};
    pub use traits::{Grab, ReadWrite};
}

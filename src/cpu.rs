// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions


pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mem;
pub mod timers;

use self::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Decoded, Insn,
    },
    mem::{Mem, Region::Program, PROGRAM_START},
    timers::{TimerEvent, Timers},
};
use crate::{
    error::{Error, Result},
    screen::Screen,
    traits::ReadWrite,
};
use owo_colors::OwoColorize;
use rand::{rngs::StdRng, SeedableRng};
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Number of return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;

/// What happened during a single [CPU::tick]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// The instruction ran to completion
    Executed(Insn),
    /// `waitk` found no key held. The program counter hasn't moved,
    /// so the next tick will run the same instruction again.
    WaitingForKey,
    /// A `0aaa` machine-language call, which was ignored
    System {
        /// The routine's address
        addr: Adr,
    },
    /// The word at pc is not an instruction. It was skipped.
    Unknown {
        /// The offending word
        word: u16,
    },
    /// The CPU is paused, and did nothing
    Paused,
}

/// Represents the internal state of the CPU interpreter
#[derive(Clone)]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8. Includes debug and pause.
    pub flags: Flags,
    // memory
    mem: Mem,
    screen: Screen,
    stack: [Adr; STACK_DEPTH],
    sp: usize,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    timers: Timers,
    // I/O
    keys: [bool; 16],
    // Execution data
    cycle: usize,
    breakpoints: Vec<Adr>,
    disassembler: Dis,
    rng: StdRng,
}

// public interface
impl CPU {
    /// Constructs a new CPU in the reset state, with its random number
    /// generator seeded from the operating system
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let cpu = CPU::new();
    /// assert_eq!(0x200, cpu.pc());
    /// dbg!(cpu);
    /// ```
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Constructs a new CPU whose `rand` instruction produces a repeatable sequence
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let program = [0xc0, 0xff]; // rand #ff, v0
    /// let (mut a, mut b) = (CPU::with_seed(8), CPU::with_seed(8));
    /// a.load_program_bytes(&program)?.tick()?;
    /// b.load_program_bytes(&program)?.tick()?;
    /// assert_eq!(a.v(), b.v());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        CPU {
            flags: Flags::default(),
            mem: Mem::new(),
            screen: Screen::new(),
            stack: [0; STACK_DEPTH],
            sp: 0,
            pc: PROGRAM_START as Adr,
            i: 0,
            v: [0; 16],
            timers: Timers::default(),
            keys: [false; 16],
            cycle: 0,
            breakpoints: vec![],
            disassembler: Dis::default(),
            rng,
        }
    }

    /// Loads a program from a file into the CPU's program space
    ///
    /// If the file can't be read, the error is returned and memory is left as it was.
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>) -> Result<&mut Self> {
        let rom = rom.as_ref();
        let bytes = std::fs::read(rom)?;
        log::debug!("read {} bytes from {}", bytes.len(), rom.display());
        self.load_program_bytes(&bytes)
    }

    /// Loads bytes into the CPU's program space, starting at `0x200`
    ///
    /// Returns [Error::ProgramTooLarge] if the program doesn't fit.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x12, 0x34, 0x56])?;
    /// assert_eq!(
    ///     Some([0x12, 0x34, 0x56].as_slice()),
    ///     cpu.mem().grab(0x200..0x203)
    /// );
    ///#    Ok(())
    ///# }
    /// ```
    pub fn load_program_bytes(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.mem.load_region(Program, rom)?;
        // a new program isn't waiting on anything
        self.flags.keypause = false;
        Ok(self)
    }

    /// Sets the state of a key, and reports whether the key's state changed.
    ///
    /// Keys outside of `0..=0xF` don't exist, and are ignored.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert!(cpu.set_key(0x7, true));
    /// assert!(!cpu.set_key(0x7, true));
    /// assert!(!cpu.set_key(0x42, true));
    /// ```
    pub fn set_key(&mut self, key: usize, pressed: bool) -> bool {
        match self.keys.get_mut(key) {
            Some(keyref) if *keyref != pressed => {
                *keyref = pressed;
                true
            }
            _ => false,
        }
    }

    /// Presses a key, and reports whether the key's state changed.
    ///
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    ///
    /// // press key `7`
    /// let did_press = cpu.press(0x7);
    /// assert!(did_press);
    ///
    /// // press key `7` again, even though it's already pressed
    /// let did_press = cpu.press(0x7);
    /// // it was already pressed, so nothing's changed.
    /// assert!(!did_press);
    /// ```
    pub fn press(&mut self, key: usize) -> bool {
        self.set_key(key, true)
    }

    /// Releases a key, and reports whether the key's state changed.
    ///
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// // press key `7`
    /// cpu.press(0x7);
    /// // release key `7`
    /// let changed = cpu.release(0x7);
    /// assert!(changed); // key released
    /// // try releasing `7` again
    /// let changed = cpu.release(0x7);
    /// assert!(!changed); // key was not held
    /// ```
    pub fn release(&mut self, key: usize) -> bool {
        self.set_key(key, false)
    }

    /// Gets the state of every key
    pub fn keys(&self) -> &[bool] {
        self.keys.as_slice()
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert!(cpu.set_v(0x10, 0x41).is_err());
    /// // Dump the CPU registers
    /// cpu.dump();
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        *self.reg_mut(reg)? = value;
        Ok(())
    }

    /// Gets a slice of the entire general purpose registers
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// // Create a new CPU, and set v0 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x0, 0x41).unwrap();
    /// assert_eq!(
    ///     cpu.v(),
    ///     [0x41, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
    /// )
    /// ```
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Gets the I register
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(0, cpu.i());
    /// ```
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.timers.sound
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.timers.delay
    }

    /// Gets both timers
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Gets the live portion of the call stack, oldest call first.
    ///
    /// Each entry is the address of a `call` instruction.
    pub fn stack(&self) -> &[Adr] {
        &self.stack[..self.sp]
    }

    /// Gets the number of cycles the CPU has executed
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(0x0, cpu.cycle());
    /// ```
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the CPU's memory
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Gets the screen, for presentation
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Reads and resets the screen's redraw flag.
    ///
    /// Call this once per presented frame, not once per tick.
    pub fn take_redraw(&mut self) -> bool {
        self.screen.take_redraw()
    }

    /// Counts the delay and sound timers down by one.
    ///
    /// Call this at 60Hz, no matter how many instructions run in between.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// // mov #01, v0; mov v0, ST
    /// cpu.load_program_bytes(&[0x60, 0x01, 0xf0, 0x18])?;
    /// cpu.multistep(2)?;
    /// assert_eq!(Some(TimerEvent::SoundStopped), cpu.tick_timers());
    /// assert_eq!(None, cpu.tick_timers());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn tick_timers(&mut self) -> Option<TimerEvent> {
        self.timers.tick()
    }

    /// Resets the emulator.
    ///
    /// Touches the [Flags] (keypause), stack, pc, registers, timers,
    /// screen, keys, and cycle count.
    ///
    /// Does not touch memory, breakpoints, or the random number generator.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x13, 0x40])?; // jmp 340
    /// cpu.tick()?;
    /// assert_eq!(0x340, cpu.pc());
    /// cpu.reset();
    /// assert_eq!(0x200, cpu.pc());
    /// assert_eq!(0, cpu.cycle());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn reset(&mut self) {
        self.flags.keypause = false;
        // clear the stack
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        // Reset the program counter
        self.pc = PROGRAM_START as Adr;
        // Zero the registers
        self.i = 0;
        self.v = [0; 16];
        self.timers = Timers::default();
        // I/O
        self.screen = Screen::new();
        self.keys = [false; 16];
        // Execution data
        self.cycle = 0;
    }

    /// Set a breakpoint
    pub fn set_break(&mut self, point: Adr) -> &mut Self {
        if !self.breakpoints.contains(&point) {
            self.breakpoints.push(point)
        }
        self
    }

    /// Unset a breakpoint
    pub fn unset_break(&mut self, point: Adr) -> &mut Self {
        if let Some(idx) = self.breakpoints.iter().position(|&bp| bp == point) {
            self.breakpoints.swap_remove(idx);
        }
        self
    }

    /// Gets a slice of breakpoints
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// assert_eq!(cpu.breakpoints(), &[]);
    /// ```
    pub fn breakpoints(&self) -> &[Adr] {
        self.breakpoints.as_slice()
    }

    /// Unpauses the emulator for a single tick,
    /// even if cpu.flags.pause is set.
    ///
    /// Like with [CPU::tick], this returns an [Error] if the instruction faults.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ])?;
    /// cpu.flags.pause = true;
    /// cpu.singlestep()?;
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// assert!(cpu.flags.pause);
    ///#    Ok(())
    ///# }
    /// ```
    pub fn singlestep(&mut self) -> Result<Step> {
        self.flags.pause = false;
        let step = self.tick();
        self.flags.pause = true;
        step
    }

    /// Executes up to `steps` ticks, stopping at the first error.
    ///
    /// Does not touch the timers.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ])?;
    /// cpu.multistep(0x20)?;
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn multistep(&mut self, steps: usize) -> Result<&mut Self> {
        for _ in 0..steps {
            self.tick()?;
        }
        Ok(self)
    }

    /// Executes a single instruction
    ///
    /// Returns [Error::BreakpointHit] if a breakpoint was hit after the instruction executed.
    /// This result contains information about the breakpoint, but can be safely ignored.
    ///
    /// Any other error is a fault: the instruction at `pc` could not be fetched, or
    /// would have touched memory, registers, keys, or stack slots which don't exist.
    /// A faulting instruction changes nothing, and `pc` stays on it.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ])?;
    /// assert_eq!(Step::Executed(Insn::cls), cpu.tick()?);
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    ///#    Ok(())
    ///# }
    /// ```
    /// Unrecognized words are skipped, and reported in the [Step].
    /// ```rust
    /// # use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0xff, 0xff, // invalid!
    ///     0x12, 0x02, // jump 0x202 (pc)
    /// ])?;
    /// assert_eq!(Step::Unknown { word: 0xffff }, cpu.tick()?);
    /// assert_eq!(0x202, cpu.pc());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn tick(&mut self) -> Result<Step> {
        // Do nothing if paused
        if self.flags.is_paused() {
            return Ok(Step::Paused);
        }
        let pc = self.pc;
        // fetch opcode
        let word: u16 = self.mem.read(pc)?;

        // Print opcode disassembly:
        if self.flags.debug {
            std::println!(
                "{:3} {:03x}: {:<36}",
                self.cycle.bright_black(),
                pc,
                self.disassembler.once(word)
            );
        }

        // decode and execute
        self.pc = pc.wrapping_add(2);
        let step = match Decoded::from(word) {
            Decoded::Insn(insn) => match self.execute(insn) {
                Ok(step) => step,
                Err(e) => {
                    self.pc = pc;
                    return Err(e);
                }
            },
            Decoded::System { addr } => {
                log::debug!("{pc:03x}: ignoring machine-language call to {addr:03x}");
                Step::System { addr }
            }
            Decoded::Unknown { word } => {
                log::warn!("{pc:03x}: opcode {word:04x} not recognized");
                Step::Unknown { word }
            }
        };
        self.cycle += 1;

        // process breakpoints
        if self.pc != pc && self.breakpoints.contains(&self.pc) {
            self.flags.pause = true;
            return Err(Error::BreakpointHit {
                addr: self.pc,
                next: self.mem.read(self.pc).unwrap_or_default(),
            });
        }
        Ok(step)
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 00, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:02x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.sp,
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.timers.delay,
            self.timers.sound,
            self.cycle,
        );
    }
}

// bounds-checked register access
impl CPU {
    #[inline(always)]
    fn reg(&self, reg: Reg) -> Result<u8> {
        self.v.get(reg).copied().ok_or(Error::InvalidRegister { reg })
    }
    #[inline(always)]
    fn reg_mut(&mut self, reg: Reg) -> Result<&mut u8> {
        self.v.get_mut(reg).ok_or(Error::InvalidRegister { reg })
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("stack", &self.stack())
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("timers", &self.timers)
            .field("keys", &self.keys)
            .field("cycle", &self.cycle)
            .field("breakpoints", &self.breakpoints)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CPU {
    /// Compares the machine state. The random number generator and disassembler are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.flags == other.flags
            && self.mem == other.mem
            && self.screen == other.screen
            && self.stack() == other.stack()
            && self.pc == other.pc
            && self.i == other.i
            && self.v == other.v
            && self.timers == other.timers
            && self.keys == other.keys
            && self.cycle == other.cycle
            && self.breakpoints == other.breakpoints
    }
}

impl Default for CPU {
    /// Constructs a new CPU with sane defaults
    ///
    /// | value  | default | description
    /// |--------|---------|------------
    /// | pc     |`0x0200` | Start location.
    ///
    /// # Examples
    /// ```rust
    /// use vipcore::prelude::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        Self::new()
    }
}

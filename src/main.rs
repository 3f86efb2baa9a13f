// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! vipcore: runs a Chip-8 program headless for a while, then shows where it ended up

use gumdrop::*;
use owo_colors::OwoColorize;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use vipcore::{
    error::{Error::BreakpointHit, Result},
    prelude::*,
};

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("vipcore=warn"))
        .init();
    let options = Arguments::parse_args_default_or_exit();
    let memdump = options.memdump;
    let mut state = State::new(options)?;
    for result in state.by_ref() {
        if let Err(e) = result {
            eprintln!("{}", e.bold().red());
            break;
        }
    }
    println!("{}", state.cpu.screen());
    state.cpu.dump();
    if memdump {
        println!("{}", state.cpu.mem().window(Program.range()));
    }
    Ok(())
}

/// Parses a hexadecimal string into a u16
fn parse_hex(value: &str) -> std::result::Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(value, 16)
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run on vipcore.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(short = "d", help = "Enable debug mode (live disassembly) at startup.")]
    pub debug: bool,

    #[options(
        short = "s",
        help = "Set the instructions-per-frame rate.",
        default = "10",
        meta = "IPF"
    )]
    pub speed: usize,
    #[options(
        short = "n",
        help = "Stop after this many frames.",
        default = "600",
        meta = "N"
    )]
    pub frames: usize,
    #[options(
        short = "r",
        help = "Set the target framerate.",
        default = "60",
        meta = "FR"
    )]
    pub frame_rate: u64,
    #[options(short = "t", help = "Pace frames in real time, instead of running flat out.")]
    pub realtime: bool,
    #[options(short = "e", help = "Seed the random number generator.", meta = "SEED")]
    pub seed: Option<u64>,

    #[options(
        short = "b",
        long = "break",
        help = "Set breakpoints for the emulator to stop at.",
        parse(try_from_str = "parse_hex"),
        meta = "BP"
    )]
    pub breakpoints: Vec<u16>,
    #[options(
        short = "k",
        long = "key",
        help = "Hold a key (0-f) down for the whole run.",
        parse(try_from_str = "parse_hex"),
        meta = "KEY"
    )]
    pub keys: Vec<u16>,
    #[options(short = "m", help = "Hexdump program memory when finished.")]
    pub memdump: bool,
}

#[derive(Debug)]
struct State {
    pub cpu: CPU,
    pub speed: usize,
    pub frames: usize,
    pub frame: usize,
    pub rate: Option<Duration>,
    pub ft: Instant,
}

impl State {
    fn new(options: Arguments) -> Result<Self> {
        let mut cpu = match options.seed {
            Some(seed) => CPU::with_seed(seed),
            None => CPU::new(),
        };
        cpu.load_program(&options.file)?;
        cpu.flags.debug = options.debug;
        for point in options.breakpoints {
            cpu.set_break(point);
        }
        for key in options.keys {
            if !cpu.press(key as usize) {
                log::warn!("key {key:x} does not exist");
            }
        }
        Ok(State {
            cpu,
            speed: options.speed,
            frames: options.frames,
            frame: 0,
            rate: options
                .realtime
                .then(|| Duration::from_nanos(1_000_000_000 / options.frame_rate.max(1) + 1)),
            ft: Instant::now(),
        })
    }
    /// Runs one frame's worth of instructions, then ticks the timers once
    fn frame(&mut self) -> Result<()> {
        self.cpu.multistep(self.speed)?;
        if let Some(TimerEvent::SoundStopped) = self.cpu.tick_timers() {
            log::info!("frame {}: sound stopped", self.frame);
        }
        if self.cpu.take_redraw() {
            log::debug!("frame {}: redraw", self.frame);
        }
        self.frame += 1;
        Ok(())
    }
    fn wait_for_next_frame(&mut self) {
        if let Some(rate) = self.rate {
            std::thread::sleep(rate.saturating_sub(self.ft.elapsed()));
            self.ft += rate;
        }
    }
}

impl Iterator for State {
    type Item = Result<()>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame >= self.frames || self.cpu.flags.pause {
            return None;
        }
        self.wait_for_next_frame();
        match self.frame() {
            Err(BreakpointHit { addr, next }) => {
                eprintln!("Breakpoint hit: {:3x} ({:4x})", addr, next);
                None
            }
            Err(e) => Some(Err(e)),
            Ok(()) => Some(Ok(())),
        }
    }
}

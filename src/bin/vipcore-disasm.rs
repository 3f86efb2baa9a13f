// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Lists every word of a Chip-8 program alongside its disassembly

use gumdrop::*;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use vipcore::{error::Result, prelude::*};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Show help text")]
    help: bool,
    #[options(help = "Load a ROM to disassemble", free, required)]
    pub file: PathBuf,
    #[options(help = "Skip this many bytes of the ROM before disassembling")]
    pub offset: usize,
    #[options(help = "Don't color the output")]
    pub plain: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let options = Arguments::parse_args_default_or_exit();
    let rom = std::fs::read(&options.file)?;
    let dis = match options.plain {
        true => Dis::plain(),
        false => Dis::default(),
    };
    let start = options.offset.min(rom.len());
    for (index, pair) in rom[start..].chunks_exact(2).enumerate() {
        let word = u16::from_be_bytes([pair[0], pair[1]]);
        let addr = PROGRAM_START + start + 2 * index;
        match options.plain {
            true => println!("{addr:03x}: {} {word:04x}", dis.once(word)),
            false => println!("{addr:03x}: {} {:04x}", dis.once(word), word.bright_black()),
        }
    }
    if rom[start..].len() % 2 == 1 {
        log::debug!("ignoring trailing byte at {:03x}", PROGRAM_START + rom.len() - 1);
    }
    Ok(())
}

// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the CPU's memory
//!
//! Contains some handy utils for reading and writing

use crate::{
    error::{Error, Result},
    traits::Grab,
};
use owo_colors::{OwoColorize, Style};
use std::{
    fmt::{Display, Formatter},
    ops::Range,
    slice::SliceIndex,
};

/// Size of the address space, in bytes
pub const MEMORY_SIZE: usize = 0x1000;
/// Address at which programs are loaded, and execution begins
pub const PROGRAM_START: usize = 0x200;
/// Height (and byte length) of a single glyph
pub const GLYPH_LEN: usize = 5;

/// The built-in hexadecimal glyphs `0`..=`F`, 4x5 pixels each
#[rustfmt::skip]
pub const CHARSET: [u8; 16 * GLYPH_LEN] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

impl Grab<u8> for Mem {
    /// Gets a slice of [Mem] memory
    /// # Examples
    /// ```rust
    ///# use vipcore::prelude::*;
    /// let mem = Mem::new();
    /// assert_eq!(Some([0xf0, 0x90].as_slice()), mem.grab(0..2));
    /// assert_eq!(None, mem.grab(0xfff..0x1001));
    /// ```
    #[inline(always)]
    fn grab<I>(&self, index: I) -> Option<&<I as SliceIndex<[u8]>>::Output>
    where
        I: SliceIndex<[u8]>,
    {
        self.memory.get(index)
    }

    /// Gets a mutable slice of [Mem] memory
    #[inline(always)]
    fn grab_mut<I>(&mut self, index: I) -> Option<&mut <I as SliceIndex<[u8]>>::Output>
    where
        I: SliceIndex<[u8]>,
    {
        self.memory.get_mut(index)
    }
}

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// The addresses covered by this region
    pub fn range(self) -> Range<usize> {
        match self {
            Region::Charset => 0..CHARSET.len(),
            Region::Program => PROGRAM_START..MEMORY_SIZE,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// The 4 KiB address space, with the [CHARSET] loaded at `0x000`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mem {
    memory: Vec<u8>,
}

impl Mem {
    /// Constructs zeroed memory, with the charset loaded
    /// # Examples
    /// ```rust
    ///# use vipcore::prelude::*;
    /// let mem = Mem::new();
    /// assert_eq!(0x1000, mem.len());
    /// assert_eq!(Some(CHARSET.as_slice()), mem.get_region(Charset));
    /// ```
    pub fn new() -> Self {
        let mut memory = vec![0; MEMORY_SIZE];
        memory[Region::Charset.range()].copy_from_slice(&CHARSET);
        Mem { memory }
    }

    /// Gets the length of the backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Loads data into the start of a named [Region], zeroing the rest of it.
    ///
    /// If the data does not fit, returns [Error::ProgramTooLarge] and leaves memory untouched.
    /// # Examples
    /// ```rust
    ///# use vipcore::prelude::*;
    ///# fn main() -> Result<()> {
    /// let mut mem = Mem::new();
    /// mem.load_region(Program, b"Hello, world!")?;
    /// assert_eq!(b"Hello", &mem.get_region(Program).unwrap()[..5]);
    ///
    /// let too_big = vec![0xaa; 0x1000];
    /// assert!(mem.load_region(Program, &too_big).is_err());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        let range = name.range();
        if data.len() > range.len() {
            return Err(Error::ProgramTooLarge {
                len: data.len(),
                max: range.len(),
            });
        }
        self.clear_region(name);
        if let Some(region) = self.get_region_mut(name) {
            region[..data.len()].copy_from_slice(data);
        }
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        if let Some(region) = self.get_region_mut(name) {
            region.fill(0)
        }
        self
    }

    /// Gets a slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region(&self, name: Region) -> Option<&[u8]> {
        self.grab(name.range())
    }

    /// Gets a mutable slice of a named region of memory
    #[inline(always)]
    pub fn get_region_mut(&mut self, name: Region) -> Option<&mut [u8]> {
        self.grab_mut(name.range())
    }

    /// Creates a window into the Mem which implements Display
    ///
    /// The range is clamped to the bounds of memory.
    pub fn window(&self, range: Range<usize>) -> MemWindow {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        MemWindow {
            start,
            mem: &self.memory[start..end],
        }
    }
}

impl Default for Mem {
    fn default() -> Self {
        Self::new()
    }
}

/// A hexdump of a slice of [Mem]
pub struct MemWindow<'a> {
    start: usize,
    mem: &'a [u8],
}

impl<'a> Display for MemWindow<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Green phosphor style formatting, for taste
        let term: Style = Style::new().bold().green().on_black();
        for (index, byte) in self.mem.iter().enumerate() {
            if index % 16 == 0 {
                write!(f, "{:>03x}{} ", (self.start + index).style(term), ":".style(term))?
            }
            write!(f, "{byte:02x}")?;
            write!(
                f,
                "{}",
                match index % 16 {
                    0xf => "\n",
                    0x7 => "  ",
                    _ if index % 2 == 1 => " ",
                    _ => "",
                }
            )?
        }
        Ok(())
    }
}

impl Display for Mem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.window(0..self.len()))
    }
}

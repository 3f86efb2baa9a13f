// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! A disassembler for Chip-8 opcodes
use super::Decoded;
use owo_colors::{OwoColorize, Style};

/// Disassembles Chip-8 instructions
pub trait Disassembler {
    /// Disassemble a single instruction
    fn once(&self, insn: u16) -> String;
}

/// Disassembles Chip-8 instructions, printing them in the provided [owo_colors::Style]s
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dis {
    /// Styles invalid instructions
    pub invalid: Style,
    /// Styles valid instruction
    pub normal: Style,
}

impl Dis {
    /// A disassembler which emits no escape codes, for logs and files
    pub fn plain() -> Self {
        Self {
            invalid: Style::new(),
            normal: Style::new(),
        }
    }
}

impl Default for Dis {
    fn default() -> Self {
        Self {
            invalid: Style::new().bold().red(),
            normal: Style::new().green(),
        }
    }
}

impl Disassembler for Dis {
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let dis = Dis::plain();
    /// assert!(dis.once(0x00e0).contains("cls"));
    /// assert!(dis.once(0x0123).contains("sys    123"));
    /// assert!(dis.once(0xf0ff).contains("inval  f0ff"));
    /// ```
    fn once(&self, insn: u16) -> String {
        match Decoded::from(insn) {
            Decoded::Insn(insn) => format!("{}", insn.style(self.normal)),
            Decoded::System { addr } => {
                format!("{}", format_args!("sys    {addr:03x}").style(self.normal))
            }
            Decoded::Unknown { word } => {
                format!("{}", format_args!("inval  {word:04x}").style(self.invalid))
            }
        }
    }
}

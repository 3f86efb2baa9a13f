// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Contains implementations for each Chip-8 [Insn]
//!
//! By the time an instruction executes, `pc` already points at the next one.
//! Skips add another 2, and `waitk` backs up by 2 to run again.

use super::{mem::GLYPH_LEN, *};
use crate::traits::Grab;
use rand::Rng;

impl CPU {
    /// Executes a single [Insn], and reports what it did
    #[rustfmt::skip]
    #[inline(always)]
    pub(super) fn execute(&mut self, instruction: Insn) -> Result<Step> {
        let result = match instruction {
            Insn::cls               => self.clear_screen(),
            Insn::ret               => self.ret(),
            Insn::jmp   {       A } => self.jump(A),
            Insn::call  {       A } => self.call(A),
            Insn::seb   {    x, B } => self.skip_equals_immediate(x, B),
            Insn::sneb  {    x, B } => self.skip_not_equals_immediate(x, B),
            Insn::se    { y, x    } => self.skip_equals(x, y),
            Insn::movb  {    x, B } => self.load_immediate(x, B),
            Insn::addb  {    x, B } => self.add_immediate(x, B),
            Insn::mov   { y, x    } => self.load(x, y),
            Insn::or    { y, x    } => self.or(x, y),
            Insn::and   { y, x    } => self.and(x, y),
            Insn::xor   { y, x    } => self.xor(x, y),
            Insn::add   { y, x    } => self.add(x, y),
            Insn::sub   { y, x    } => self.sub(x, y),
            Insn::shr   { y, x    } => self.shift_right(x, y),
            Insn::bsub  { y, x    } => self.backwards_sub(x, y),
            Insn::shl   { y, x    } => self.shift_left(x, y),
            Insn::sne   { y, x    } => self.skip_not_equals(x, y),
            Insn::movI  {       A } => self.load_i_immediate(A),
            Insn::jmpr  {       A } => self.jump_indexed(A),
            Insn::rand  {    x, B } => self.rand(x, B),
            Insn::draw  { y, x, n } => self.draw(x, y, n),
            Insn::sek   {    x    } => self.skip_key_equals(x),
            Insn::snek  {    x    } => self.skip_key_not_equals(x),
            Insn::getdt {    x    } => self.load_delay_timer(x),
            Insn::waitk {    x    } => return match self.wait_for_key(x)? {
                true  => Ok(Step::WaitingForKey),
                false => Ok(Step::Executed(instruction)),
            },
            Insn::setdt {    x    } => self.store_delay_timer(x),
            Insn::movst {    x    } => self.store_sound_timer(x),
            Insn::addI  {    x    } => self.add_i(x),
            Insn::font  {    x    } => self.load_sprite(x),
            Insn::bcd   {    x    } => self.bcd_convert(x),
            Insn::dmao  {    x    } => self.store_dma(x),
            Insn::dmai  {    x    } => self.load_dma(x),
        };
        result.map(|_| Step::Executed(instruction))
    }

    /// Skips the next instruction
    #[inline(always)]
    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// The range `I..I+len`, if it lies entirely inside memory
    #[inline(always)]
    fn i_range(&self, len: usize) -> Result<std::ops::Range<usize>> {
        let range = self.i as usize..self.i as usize + len;
        match range.end <= self.mem.len() {
            true => Ok(range),
            false => Err(Error::InvalidAddressRange { range }),
        }
    }
}

/// |`0aaa`| Issues a "System call" (ML routine)
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`00e0`| Clear screen memory to all 0       |
/// |`00ee`| Return from subroutine             |
impl CPU {
    /// |`00e0`| Clears the screen memory to 0
    #[inline(always)]
    pub(super) fn clear_screen(&mut self) -> Result<()> {
        self.screen.clear();
        Ok(())
    }
    /// |`00ee`| Returns from subroutine
    ///
    /// The stack holds the address of the `call`, so execution resumes just after it.
    #[inline(always)]
    pub(super) fn ret(&mut self) -> Result<()> {
        self.sp = self.sp.checked_sub(1).ok_or(Error::StackUnderflow)?;
        self.pc = self.stack[self.sp].wrapping_add(2);
        Ok(())
    }
}

/// |`1aaa`| Sets pc to an absolute address
impl CPU {
    /// |`1aaa`| Sets the program counter to an absolute address
    #[inline(always)]
    pub(super) fn jump(&mut self, a: Adr) -> Result<()> {
        self.pc = a;
        Ok(())
    }
}

/// |`2aaa`| Pushes pc onto the stack, then jumps to a
impl CPU {
    /// |`2aaa`| Pushes the address of this instruction onto the stack, then jumps to a
    #[inline(always)]
    pub(super) fn call(&mut self, a: Adr) -> Result<()> {
        let addr = self.pc.wrapping_sub(2);
        let slot = self
            .stack
            .get_mut(self.sp)
            .ok_or(Error::StackOverflow { addr })?;
        *slot = addr;
        self.sp += 1;
        self.pc = a;
        Ok(())
    }
}

/// |`3xbb`| Skips next instruction if register X == b
impl CPU {
    /// |`3xbb`| Skips the next instruction if register X == b
    #[inline(always)]
    pub(super) fn skip_equals_immediate(&mut self, x: Reg, b: u8) -> Result<()> {
        let condition = self.reg(x)? == b;
        self.skip_if(condition);
        Ok(())
    }
}

/// |`4xbb`| Skips next instruction if register X != b
impl CPU {
    /// |`4xbb`| Skips the next instruction if register X != b
    #[inline(always)]
    pub(super) fn skip_not_equals_immediate(&mut self, x: Reg, b: u8) -> Result<()> {
        let condition = self.reg(x)? != b;
        self.skip_if(condition);
        Ok(())
    }
}

/// |`5xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`5XY0`| Skip next instruction if vX == vY  |
impl CPU {
    /// |`5xy0`| Skips the next instruction if register X == register Y
    #[inline(always)]
    pub(super) fn skip_equals(&mut self, x: Reg, y: Reg) -> Result<()> {
        let condition = self.reg(x)? == self.reg(y)?;
        self.skip_if(condition);
        Ok(())
    }
}

/// |`6xbb`| Loads immediate byte b into register vX
impl CPU {
    /// |`6xbb`| Loads immediate byte b into register vX
    #[inline(always)]
    pub(super) fn load_immediate(&mut self, x: Reg, b: u8) -> Result<()> {
        *self.reg_mut(x)? = b;
        Ok(())
    }
}

/// |`7xbb`| Adds immediate byte b to register vX
impl CPU {
    /// |`7xbb`| Adds immediate byte b to register vX. Does not touch vF.
    #[inline(always)]
    pub(super) fn add_immediate(&mut self, x: Reg, b: u8) -> Result<()> {
        let vx = self.reg_mut(x)?;
        *vx = vx.wrapping_add(b);
        Ok(())
    }
}

/// |`8xyn`| Performs ALU operation
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`8xy0`| X = Y                              |
/// |`8xy1`| X = X | Y                          |
/// |`8xy2`| X = X & Y                          |
/// |`8xy3`| X = X ^ Y                          |
/// |`8xy4`| X = X + Y; Set vF=carry            |
/// |`8xy5`| X = X - Y; Set vF=!borrow          |
/// |`8xy6`| X = X >> 1; Set vF=bit shifted out |
/// |`8xy7`| X = Y - X; Set vF=!borrow          |
/// |`8xyE`| X = X << 1; Set vF=bit shifted out |
///
/// The flag-setting operations write vF *before* computing the result.
/// When X or Y is vF, the flag is what gets operated on, and the result overwrites it.
impl CPU {
    /// |`8xy0`| Loads the value of y into x
    #[inline(always)]
    pub(super) fn load(&mut self, x: Reg, y: Reg) -> Result<()> {
        let vy = self.reg(y)?;
        *self.reg_mut(x)? = vy;
        Ok(())
    }
    /// |`8xy1`| Performs bitwise or of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn or(&mut self, x: Reg, y: Reg) -> Result<()> {
        let vy = self.reg(y)?;
        *self.reg_mut(x)? |= vy;
        Ok(())
    }
    /// |`8xy2`| Performs bitwise and of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn and(&mut self, x: Reg, y: Reg) -> Result<()> {
        let vy = self.reg(y)?;
        *self.reg_mut(x)? &= vy;
        Ok(())
    }
    /// |`8xy3`| Performs bitwise xor of vX and vY, and stores the result in vX
    #[inline(always)]
    pub(super) fn xor(&mut self, x: Reg, y: Reg) -> Result<()> {
        let vy = self.reg(y)?;
        *self.reg_mut(x)? ^= vy;
        Ok(())
    }
    /// |`8xy4`| Performs addition of vX and vY, and stores the result in vX
    ///
    /// vF is 1 if the sum didn't fit in a byte.
    #[inline(always)]
    pub(super) fn add(&mut self, x: Reg, y: Reg) -> Result<()> {
        let (sum, carry) = self.reg(x)?.overflowing_add(self.reg(y)?);
        self.v[0xf] = carry.into();
        *self.reg_mut(x)? = sum;
        Ok(())
    }
    /// |`8xy5`| Performs subtraction of vX and vY, and stores the result in vX
    ///
    /// vF is 1 if vX > vY (no borrow), else 0.
    #[inline(always)]
    pub(super) fn sub(&mut self, x: Reg, y: Reg) -> Result<()> {
        let no_borrow = self.reg(x)? > self.reg(y)?;
        self.v[0xf] = no_borrow.into();
        let difference = self.reg(x)?.wrapping_sub(self.reg(y)?);
        *self.reg_mut(x)? = difference;
        Ok(())
    }
    /// |`8xy6`| Performs bitwise right shift of vX. vY is ignored.
    #[inline(always)]
    pub(super) fn shift_right(&mut self, x: Reg, _y: Reg) -> Result<()> {
        self.v[0xf] = self.reg(x)? & 1;
        let shifted = self.reg(x)? >> 1;
        *self.reg_mut(x)? = shifted;
        Ok(())
    }
    /// |`8xy7`| Performs subtraction of vY and vX, and stores the result in vX
    ///
    /// vF is 1 if vY > vX (no borrow), else 0.
    #[inline(always)]
    pub(super) fn backwards_sub(&mut self, x: Reg, y: Reg) -> Result<()> {
        let no_borrow = self.reg(y)? > self.reg(x)?;
        self.v[0xf] = no_borrow.into();
        let difference = self.reg(y)?.wrapping_sub(self.reg(x)?);
        *self.reg_mut(x)? = difference;
        Ok(())
    }
    /// |`8xyE`| Performs bitwise left shift of vX. vY is ignored.
    #[inline(always)]
    pub(super) fn shift_left(&mut self, x: Reg, _y: Reg) -> Result<()> {
        self.v[0xf] = self.reg(x)? >> 7;
        let shifted = self.reg(x)? << 1;
        *self.reg_mut(x)? = shifted;
        Ok(())
    }
}

/// |`9xyn`| Performs a register-register comparison
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`9XY0`| Skip next instruction if vX != vY  |
impl CPU {
    /// |`9xy0`| Skip next instruction if X != y
    #[inline(always)]
    pub(super) fn skip_not_equals(&mut self, x: Reg, y: Reg) -> Result<()> {
        let condition = self.reg(x)? != self.reg(y)?;
        self.skip_if(condition);
        Ok(())
    }
}

/// |`Aaaa`| Load address #a into register I
impl CPU {
    /// |`Aadr`| Load address #adr into register I
    #[inline(always)]
    pub(super) fn load_i_immediate(&mut self, a: Adr) -> Result<()> {
        self.i = a;
        Ok(())
    }
}

/// |`Baaa`| Jump to &adr + v0
impl CPU {
    /// |`Badr`| Jump to &adr + v0
    ///
    /// Landing past the end of memory isn't caught here, but by the next fetch.
    #[inline(always)]
    pub(super) fn jump_indexed(&mut self, a: Adr) -> Result<()> {
        self.pc = a.wrapping_add(self.reg(0)? as Adr);
        Ok(())
    }
}

/// |`Cxbb`| Stores a random number & the provided byte into vX
impl CPU {
    /// |`Cxbb`| Stores a random number & the provided byte into vX
    #[inline(always)]
    pub(super) fn rand(&mut self, x: Reg, b: u8) -> Result<()> {
        let vx = self.v.get_mut(x).ok_or(Error::InvalidRegister { reg: x })?;
        *vx = self.rng.gen::<u8>() & b;
        Ok(())
    }
}

/// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
impl CPU {
    /// |`Dxyn`| Draws n-byte sprite to the screen at coordinates (vX, vY)
    ///
    /// Sets vF to 1 if any lit pixel was turned off, else 0.
    #[inline(always)]
    pub(super) fn draw(&mut self, x: Reg, y: Reg, n: Nib) -> Result<()> {
        let (x, y) = (self.reg(x)? as usize, self.reg(y)? as usize);
        let range = self.i_range(n as usize)?;
        let sprite = self
            .mem
            .grab(range.clone())
            .ok_or(Error::InvalidAddressRange { range })?;
        self.v[0xf] = 0;
        if self.screen.draw(x, y, sprite) {
            self.v[0xf] = 1;
        }
        Ok(())
    }
}

/// |`Exbb`| Skips instruction on value of keypress
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`eX9e`| Skip next instruction if key vX is held     |
/// |`eXa1`| Skip next instruction if key vX is not held |
impl CPU {
    /// Gets the state of the key named in vX
    #[inline(always)]
    fn key(&self, x: Reg) -> Result<bool> {
        let key = self.reg(x)? as usize;
        self.keys.get(key).copied().ok_or(Error::InvalidKey { key })
    }
    /// |`Ex9E`| Skip next instruction if key vX is held
    #[inline(always)]
    pub(super) fn skip_key_equals(&mut self, x: Reg) -> Result<()> {
        let condition = self.key(x)?;
        self.skip_if(condition);
        Ok(())
    }
    /// |`ExA1`| Skip next instruction if key vX is not held
    #[inline(always)]
    pub(super) fn skip_key_not_equals(&mut self, x: Reg) -> Result<()> {
        let condition = !self.key(x)?;
        self.skip_if(condition);
        Ok(())
    }
}

/// |`Fxbb`| Performs IO
///
/// |opcode| effect                             |
/// |------|------------------------------------|
/// |`fX07`| Set vX to value in delay timer     |
/// |`fX0a`| Wait for input, store key in vX    |
/// |`fX15`| Set delay timer to the value in vX |
/// |`fX18`| Set sound timer to the value in vX |
/// |`fX1e`| Add vX to I                        |
/// |`fX29`| Load sprite for character x into I |
/// |`fX33`| BCD convert X into I[0..3]         |
/// |`fX55`| DMA Stor from I to registers 0..=X |
/// |`fX65`| DMA Load from I to registers 0..=X |
impl CPU {
    /// |`Fx07`| Get the current DT, and put it in vX
    /// ```py
    /// vX = DT
    /// ```
    #[inline(always)]
    pub(super) fn load_delay_timer(&mut self, x: Reg) -> Result<()> {
        let delay = self.timers.delay;
        *self.reg_mut(x)? = delay;
        Ok(())
    }
    /// |`Fx0A`| Wait for key, then vX = K
    ///
    /// If several keys are held, the highest-numbered one wins.
    /// If none are, pc is backed up onto this instruction and [Flags::keypause] is set.
    /// Returns whether the CPU is still waiting.
    #[inline(always)]
    pub(super) fn wait_for_key(&mut self, x: Reg) -> Result<bool> {
        let vx = self.v.get_mut(x).ok_or(Error::InvalidRegister { reg: x })?;
        match self.keys.iter().rposition(|&held| held) {
            Some(key) => {
                *vx = key as u8;
                self.flags.keypause = false;
            }
            None => {
                log::trace!("waiting for key at {:03x}", self.pc.wrapping_sub(2));
                self.pc = self.pc.wrapping_sub(2);
                self.flags.keypause = true;
            }
        }
        Ok(self.flags.keypause)
    }
    /// |`Fx15`| Load vX into DT
    /// ```py
    /// DT = vX
    /// ```
    #[inline(always)]
    pub(super) fn store_delay_timer(&mut self, x: Reg) -> Result<()> {
        self.timers.delay = self.reg(x)?;
        Ok(())
    }
    /// |`Fx18`| Load vX into ST
    /// ```py
    /// ST = vX;
    /// ```
    #[inline(always)]
    pub(super) fn store_sound_timer(&mut self, x: Reg) -> Result<()> {
        self.timers.sound = self.reg(x)?;
        Ok(())
    }
    /// |`Fx1e`| Add vX to I,
    /// ```py
    /// I += vX;
    /// ```
    /// I must stay inside memory.
    #[inline(always)]
    pub(super) fn add_i(&mut self, x: Reg) -> Result<()> {
        let addr = self.i as usize + self.reg(x)? as usize;
        if addr >= self.mem.len() {
            return Err(Error::InvalidAddress { addr });
        }
        self.i = addr as Adr;
        Ok(())
    }
    /// |`Fx29`| Load sprite for character x into I
    /// ```py
    /// I = sprite(X);
    /// ```
    /// The charset lives at `0x000`, so characters past `F` point into whatever follows it.
    #[inline(always)]
    pub(super) fn load_sprite(&mut self, x: Reg) -> Result<()> {
        self.i = self.reg(x)? as Adr * GLYPH_LEN as Adr;
        Ok(())
    }
    /// |`Fx33`| BCD convert X into I`[0..3]`
    #[inline(always)]
    pub(super) fn bcd_convert(&mut self, x: Reg) -> Result<()> {
        let x = self.reg(x)?;
        let range = self.i_range(3)?;
        let digits = self
            .mem
            .grab_mut(range.clone())
            .ok_or(Error::InvalidAddressRange { range })?;
        digits.copy_from_slice(&[x / 100, x / 10 % 10, x % 10]);
        Ok(())
    }
    /// |`Fx55`| DMA Stor from I to registers 0..=X
    ///
    /// I is left unchanged.
    #[inline(always)]
    pub(super) fn store_dma(&mut self, x: Reg) -> Result<()> {
        let regs = self.v.get(..=x).ok_or(Error::InvalidRegister { reg: x })?;
        let range = self.i_range(x + 1)?;
        self.mem
            .grab_mut(range.clone())
            .ok_or(Error::InvalidAddressRange { range })?
            .copy_from_slice(regs);
        Ok(())
    }
    /// |`Fx65`| DMA Load from I to registers 0..=X
    ///
    /// I is left unchanged.
    #[inline(always)]
    pub(super) fn load_dma(&mut self, x: Reg) -> Result<()> {
        let range = self.i_range(x + 1)?;
        let regs = self
            .v
            .get_mut(..=x)
            .ok_or(Error::InvalidRegister { reg: x })?;
        let bytes = self
            .mem
            .grab(range.clone())
            .ok_or(Error::InvalidAddressRange { range })?;
        regs.copy_from_slice(bytes);
        Ok(())
    }
}

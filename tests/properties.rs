//! Whole-machine behavior, driven through the public API one instruction at a time
use vipcore::{error::Error, prelude::*};

/// Loads `program` into a fresh, deterministic CPU
fn boot(program: &[u8]) -> CPU {
    let mut cpu = CPU::with_seed(8);
    cpu.load_program_bytes(program).unwrap();
    cpu
}

/// Sets up registers with a prelude of `mov`s, then runs `program` after them
fn boot_with(regs: &[(u8, u8)], program: &[u8]) -> CPU {
    let mut rom: Vec<u8> = regs.iter().flat_map(|&(x, b)| [0x60 | x, b]).collect();
    rom.extend_from_slice(program);
    let mut cpu = boot(&rom);
    cpu.multistep(regs.len()).unwrap();
    cpu
}

#[test]
fn load_immediate() {
    for x in 0..16u8 {
        for nn in 0..=0xffu8 {
            let mut cpu = boot(&[0x60 | x, nn]);
            assert_eq!(Step::Executed(Insn::movb { B: nn, x: x as usize }), cpu.tick().unwrap());
            assert_eq!(nn, cpu.v()[x as usize]);
            assert_eq!(0x202, cpu.pc());
        }
    }
}

#[test]
fn skip_immediate() {
    // se v3, #7f
    let mut cpu = boot_with(&[(3, 0x7f)], &[0x33, 0x7f]);
    cpu.tick().unwrap();
    assert_eq!(0x202 + 4, cpu.pc());
    let mut cpu = boot_with(&[(3, 0x7e)], &[0x33, 0x7f]);
    cpu.tick().unwrap();
    assert_eq!(0x202 + 2, cpu.pc());
    // sne v3, #7f
    let mut cpu = boot_with(&[(3, 0x7e)], &[0x43, 0x7f]);
    cpu.tick().unwrap();
    assert_eq!(0x202 + 4, cpu.pc());
}

#[test]
fn carry_add() {
    let mut cpu = boot_with(&[(0xa, 200), (0xb, 100)], &[0x8a, 0xb4]);
    cpu.tick().unwrap();
    assert_eq!(1, cpu.v()[0xf]);
    assert_eq!(44, cpu.v()[0xa]);
}

#[test]
fn borrow_sub() {
    let mut cpu = boot_with(&[(0xa, 10), (0xb, 20)], &[0x8a, 0xb5]);
    cpu.tick().unwrap();
    assert_eq!(0, cpu.v()[0xf]);
    assert_eq!(246, cpu.v()[0xa]);

    let mut cpu = boot_with(&[(0xa, 20), (0xb, 10)], &[0x8a, 0xb5]);
    cpu.tick().unwrap();
    assert_eq!(1, cpu.v()[0xf]);
    assert_eq!(10, cpu.v()[0xa]);
}

#[test]
fn clear_display() {
    // draw glyph 8 at (0, 0), then clear
    let mut cpu = boot(&[0x60, 0x08, 0xf0, 0x29, 0xd1, 0x15, 0x00, 0xe0]);
    cpu.multistep(3).unwrap();
    assert!(cpu.screen().pixels().iter().any(|&pixel| pixel != 0));
    cpu.take_redraw();
    assert_eq!(Step::Executed(Insn::cls), cpu.tick().unwrap());
    assert!(cpu.screen().pixels().iter().all(|&pixel| pixel == 0));
    assert_eq!(WIDTH * HEIGHT, cpu.screen().pixels().len());
    assert!(cpu.take_redraw());
}

#[test]
fn sprite_collision() {
    // (204) i = 0x20a; draw v1, v2, 1; draw v1, v2, 1; (20a) 0x80
    let mut cpu = boot_with(
        &[(1, 10), (2, 20)],
        &[0xa2, 0x0a, 0xd1, 0x21, 0xd1, 0x21, 0x80, 0x00],
    );
    cpu.tick().unwrap();
    cpu.tick().unwrap();
    assert_eq!(0, cpu.v()[0xf]);
    assert!(cpu.screen().pixel(10, 20));
    cpu.tick().unwrap();
    assert_eq!(1, cpu.v()[0xf]);
    assert!(!cpu.screen().pixel(10, 20));
}

#[test]
fn bcd() {
    // i = 0x300; bcd v5
    let mut cpu = boot_with(&[(5, 255)], &[0xa3, 0x00, 0xf5, 0x33]);
    cpu.multistep(2).unwrap();
    assert_eq!(Some([2, 5, 5].as_slice()), cpu.mem().grab(0x300..0x303));
}

#[test]
fn key_wait() {
    // waitk v6
    let mut cpu = boot(&[0xf6, 0x0a]);
    for _ in 0..10 {
        assert_eq!(Step::WaitingForKey, cpu.tick().unwrap());
        assert_eq!(0x200, cpu.pc());
    }
    cpu.press(7);
    cpu.tick().unwrap();
    assert_eq!(7, cpu.v()[6]);
    assert_eq!(0x202, cpu.pc());
}

#[test]
fn key_wait_abandoned() {
    // waitk v6, then a different program
    let mut cpu = boot(&[0xf6, 0x0a]);
    assert_eq!(Step::WaitingForKey, cpu.tick().unwrap());
    cpu.load_program_bytes(&[0x61, 0x05]).unwrap();
    assert_eq!(Step::Executed(Insn::movb { B: 5, x: 1 }), cpu.tick().unwrap());
    assert_eq!((5, 0x202), (cpu.v()[1], cpu.pc()));
}

#[test]
fn round_trip() {
    let cpu = boot(&[0x12, 0x34, 0x56]);
    assert_eq!(
        Some([0x12, 0x34, 0x56].as_slice()),
        cpu.mem().grab(0x200..0x203)
    );
}

#[test]
fn timer_floor() {
    // mov #03, v0; mov v0, ST; mov v0, DT
    let mut cpu = boot(&[0x60, 0x03, 0xf0, 0x18, 0xf0, 0x15]);
    cpu.multistep(3).unwrap();
    assert!(cpu.timers().is_sounding());
    let events: Vec<_> = (0..10).filter_map(|_| cpu.tick_timers()).collect();
    assert_eq!(events, [TimerEvent::SoundStopped]);
    assert_eq!((0, 0), (cpu.delay(), cpu.sound()));
}

#[test]
fn timers_ignore_instructions() {
    // mov #05, v0; mov v0, DT; jmp 204
    let mut cpu = boot(&[0x60, 0x05, 0xf0, 0x15, 0x12, 0x04]);
    cpu.multistep(100).unwrap();
    assert_eq!(5, cpu.delay());
    cpu.tick_timers();
    assert_eq!(4, cpu.delay());
}

#[test]
fn load_missing_file() {
    let mut cpu = boot(&[0x12, 0x00]);
    let before = cpu.clone();
    let result = cpu.load_program("this/file/does/not/exist.ch8");
    assert!(matches!(result, Err(Error::IoError(_))));
    assert_eq!(before, cpu);
}

#[test]
fn unknown_opcode_is_skipped() {
    // inval; mov #01, v0
    let mut cpu = boot(&[0x80, 0x0f, 0x60, 0x01]);
    assert_eq!(Step::Unknown { word: 0x800f }, cpu.tick().unwrap());
    cpu.tick().unwrap();
    assert_eq!(1, cpu.v()[0]);
}

mod faults {
    use super::*;

    /// The faulting instruction is still at pc, and nothing else moved
    fn assert_faults(mut cpu: CPU, check: impl Fn(&Error) -> bool) {
        let before = cpu.clone();
        let error = cpu.tick().unwrap_err();
        assert!(check(&error), "unexpected {error:?}");
        assert_eq!(before, cpu);
    }

    #[test]
    fn stack_underflow() {
        assert_faults(boot(&[0x00, 0xee]), |e| matches!(e, Error::StackUnderflow));
    }

    #[test]
    fn stack_overflow() {
        // call 200, forever
        let mut cpu = boot(&[0x22, 0x00]);
        cpu.multistep(STACK_DEPTH).unwrap();
        assert_eq!(STACK_DEPTH, cpu.stack().len());
        assert!(cpu.stack().iter().all(|&addr| addr == 0x200));
        assert_faults(cpu, |e| matches!(e, Error::StackOverflow { addr: 0x200 }));
    }

    #[test]
    fn add_i_overflow() {
        // i = 0xfff; i += v0
        let mut cpu = boot_with(&[(0, 1)], &[0xaf, 0xff, 0xf0, 0x1e]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidAddress { addr: 0x1000 }));
    }

    #[test]
    fn add_i_to_the_edge() {
        // i = 0xffe; i += v0
        let mut cpu = boot_with(&[(0, 1)], &[0xaf, 0xfe, 0xf0, 0x1e]);
        cpu.multistep(2).unwrap();
        assert_eq!(0xfff, cpu.i());
    }

    #[test]
    fn sprite_overflow() {
        // i = 0xffc; draw v0, v0, 5
        let mut cpu = boot(&[0xaf, 0xfc, 0xd0, 0x05]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| {
            matches!(e, Error::InvalidAddressRange { range } if *range == (0xffc..0x1001))
        });
    }

    #[test]
    fn bcd_overflow() {
        let mut cpu = boot(&[0xaf, 0xfe, 0xf0, 0x33]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidAddressRange { .. }));
    }

    #[test]
    fn dma_overflow() {
        let mut cpu = boot(&[0xaf, 0xf8, 0xff, 0x55]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidAddressRange { .. }));
        // fx65 at the same spot
        let mut cpu = boot(&[0xaf, 0xf8, 0xff, 0x65]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidAddressRange { .. }));
    }

    #[test]
    fn invalid_key() {
        // mov #10, v0; skp v0
        let mut cpu = boot(&[0x60, 0x10, 0xe0, 0x9e]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidKey { key: 0x10 }));
    }

    #[test]
    fn fetch_past_memory() {
        // jmp fff
        let mut cpu = boot(&[0x1f, 0xff]);
        cpu.tick().unwrap();
        assert_faults(cpu, |e| matches!(e, Error::InvalidAddressRange { .. }));
    }

    /// The driving loop may carry on after a fault
    #[test]
    fn recover() {
        let mut cpu = boot(&[0x00, 0xee]);
        assert!(cpu.tick().is_err());
        cpu.load_program_bytes(&[0x61, 0x05]).unwrap();
        cpu.tick().unwrap();
        assert_eq!(5, cpu.v()[1]);
    }
}

// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The delay and sound timers

/// Something observable which happened during a [Timers::tick]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// The sound timer just reached zero; any tone should stop
    SoundStopped,
}

/// Two byte-sized countdown timers, decremented at 60Hz by whoever drives the CPU
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Timers {
    /// Delay timer, readable by programs
    pub delay: u8,
    /// Sound timer; a tone plays while it's nonzero
    pub sound: u8,
}

impl Timers {
    /// Counts both timers down by one, stopping at zero.
    ///
    /// Reports [TimerEvent::SoundStopped] when the sound timer goes from 1 to 0.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut timers = Timers { delay: 0, sound: 2 };
    /// assert_eq!(None, timers.tick());
    /// assert_eq!(Some(TimerEvent::SoundStopped), timers.tick());
    /// assert_eq!(None, timers.tick());
    /// assert_eq!(Timers { delay: 0, sound: 0 }, timers);
    /// ```
    pub fn tick(&mut self) -> Option<TimerEvent> {
        self.delay = self.delay.saturating_sub(1);
        match self.sound {
            0 => None,
            1 => {
                self.sound = 0;
                Some(TimerEvent::SoundStopped)
            }
            _ => {
                self.sound -= 1;
                None
            }
        }
    }

    /// Whether a tone should currently be playing
    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

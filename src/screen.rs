// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Stores and displays the Chip-8's screen memory

use std::fmt::{Display, Formatter, Result};

/// Width of the screen, in pixels
pub const WIDTH: usize = 64;
/// Height of the screen, in pixels
pub const HEIGHT: usize = 32;

/// A 64x32 monochrome framebuffer, one byte (0 or 1) per pixel, plus a redraw flag
///
/// The redraw flag is set by every clear and every draw, and stays set until the
/// presentation layer takes it with [Screen::take_redraw], so any number of draws
/// between two presented frames collapse into one redraw.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Screen {
    pixels: Vec<u8>,
    redraw: bool,
}

impl Screen {
    /// Creates a blank screen
    pub fn new() -> Self {
        Screen {
            pixels: vec![0; WIDTH * HEIGHT],
            redraw: false,
        }
    }

    /// A read-only view of every pixel, row-major, `WIDTH * HEIGHT` cells of 0 or 1
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Gets the pixel at (x, y), wrapping both coordinates
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let screen = Screen::new();
    /// assert!(!screen.pixel(70, 40));
    /// ```
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[(y % HEIGHT) * WIDTH + x % WIDTH] != 0
    }

    /// Whether the screen has changed since the last [Screen::take_redraw]
    pub fn redraw_pending(&self) -> bool {
        self.redraw
    }

    /// Reads and resets the redraw flag
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut screen = Screen::new();
    /// screen.clear();
    /// screen.clear();
    /// assert!(screen.take_redraw());
    /// assert!(!screen.take_redraw());
    /// ```
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    /// Turns every pixel off
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.redraw = true;
    }

    /// XORs an 8-pixel-wide sprite onto the screen at (x, y), one byte per row.
    ///
    /// The origin wraps to the screen; pixels past the right edge continue on the
    /// next row, and rows past the bottom wrap to the top.
    ///
    /// Returns true if any lit pixel was turned off.
    /// # Examples
    /// ```rust
    /// # use vipcore::prelude::*;
    /// let mut screen = Screen::new();
    /// assert!(!screen.draw(3, 4, &[0x80]));
    /// assert!(screen.pixel(3, 4));
    /// assert!(screen.draw(3, 4, &[0x80]));
    /// assert!(!screen.pixel(3, 4));
    /// ```
    pub fn draw(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let (x, y) = (x % WIDTH, y % HEIGHT);
        let mut collision = false;
        for (row, &byte) in sprite.iter().enumerate() {
            for col in 0..8 {
                if byte & (0x80 >> col) == 0 {
                    continue;
                }
                let index = (x + col + (y + row) * WIDTH) % (WIDTH * HEIGHT);
                collision |= self.pixels[index] != 0;
                self.pixels[index] ^= 1;
            }
        }
        self.redraw = true;
        collision
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Screen {
    /// Renders the screen as text, with the drawille library if available
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        #[cfg(feature = "drawille")]
        {
            use drawille::Canvas;
            let mut canvas = Canvas::new(WIDTH as u32, HEIGHT as u32);
            self.pixels
                .iter()
                .enumerate()
                .filter(|(_, &pixel)| pixel != 0)
                .for_each(|(index, _)| {
                    canvas.set((index % WIDTH) as u32, (index / WIDTH) as u32)
                });
            write!(f, "{}", canvas.frame())
        }
        #[cfg(not(feature = "drawille"))]
        {
            for row in self.pixels.chunks_exact(WIDTH) {
                for &pixel in row {
                    write!(f, "{}", if pixel != 0 { "█" } else { " " })?
                }
                writeln!(f)?
            }
            Ok(())
        }
    }
}

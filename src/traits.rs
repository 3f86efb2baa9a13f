// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Traits useful for vipcore

mod auto_cast;
pub use auto_cast::{Grab, ReadWrite};

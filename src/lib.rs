//! Decoder and animation queries for `IDST` studio models.

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate cgmath;
extern crate crc32fast;
extern crate smallvec;

#[macro_use]
pub mod errors;
#[macro_use]
mod util;
pub mod math;
pub mod studio;

pub use crate::util::name::{Name, Name32, Name64};

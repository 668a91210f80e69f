//! More-or-less general-purpose utility functions.

pub mod cur;
#[macro_use]
pub mod fields;
pub mod name;
pub mod view;

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
extern crate alloc;

// Token modules
pub mod token;
pub mod errors;
pub mod events;
pub mod math;

// Lending Protocol modules
pub mod lending;

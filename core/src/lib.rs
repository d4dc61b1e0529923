#![no_std]

extern crate alloc;

pub use bot::*;
pub use codec::*;
pub use color::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use level::*;
pub use presets::*;
pub use tracker::*;
pub use types::*;

mod bot;
mod codec;
mod color;
mod engine;
mod error;
mod generator;
mod level;
mod presets;
mod tracker;
mod types;

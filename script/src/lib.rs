extern crate primitives;

mod builder;
mod num;
mod opcode;
mod script;

pub use primitives::bytes;

pub use builder::Builder;
pub use num::Num;
pub use script::{Script, Instruction, Instructions, Error};

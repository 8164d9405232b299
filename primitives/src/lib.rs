pub extern crate rustc_hex;

pub mod bytes;
pub mod compact;
pub mod hash;
pub mod uint;

pub use rustc_hex as hex;

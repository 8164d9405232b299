extern crate byteorder;
extern crate primitives;

mod compact_integer;
mod impls;
mod reader;
mod stream;

pub use primitives::{hash, bytes, compact};

pub use compact_integer::CompactInteger;
pub use reader::{Reader, Deserializable, deserialize, Error};
pub use stream::{Stream, Serializable, serialize, serialized_list_size};

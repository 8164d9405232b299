extern crate rustc_hex;
extern crate rayon;
extern crate primitives;
extern crate bitcrypto as crypto;
extern crate serialization as ser;

mod block;
mod block_header;
mod constants;
mod indexed_block;
mod indexed_header;
mod indexed_transaction;
mod merkle_root;
mod transaction;

pub use primitives::{hash, bytes, compact, uint};

pub use block::Block;
pub use block_header::BlockHeader;
pub use constants::{SEQUENCE_FINAL, LOCKTIME_THRESHOLD};
pub use indexed_block::IndexedBlock;
pub use indexed_header::IndexedBlockHeader;
pub use indexed_transaction::IndexedTransaction;
pub use merkle_root::{merkle_root, merkle_node_hash};
pub use transaction::{Transaction, TransactionInput, TransactionOutput, OutPoint};

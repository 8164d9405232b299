//! Serialized script, used inside transaction inputs and outputs.

use std::{fmt, ops};
use bytes::Bytes;
use opcode::{
	OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4, OP_PUSHBYTES_MAX,
	OP_HASH160, OP_EQUAL,
	OP_CHECKSIG, OP_CHECKSIGVERIFY, OP_CHECKMULTISIG, OP_CHECKMULTISIGVERIFY,
	is_within_op_n, decode_op_n,
};

/// Maximum number of public keys per multisig, counted when the
/// participants cannot be decoded from the preceding opcode.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

#[derive(Debug, PartialEq)]
pub enum Error {
	BadOpcode,
	UnexpectedEnd,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Error::BadOpcode => "Bad Opcode".fmt(f),
			Error::UnexpectedEnd => "Unexpected End Of Script".fmt(f),
		}
	}
}

/// A single decoded operation: the opcode and the pushed data, if any.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Instruction<'a> {
	pub opcode: u8,
	pub data: Option<&'a [u8]>,
}

#[derive(PartialEq, Default, Clone)]
pub struct Script {
	data: Bytes,
}

impl From<&'static str> for Script {
	fn from(s: &'static str) -> Self {
		Script::new(s.into())
	}
}

impl From<Bytes> for Script {
	fn from(s: Bytes) -> Self {
		Script::new(s)
	}
}

impl From<Vec<u8>> for Script {
	fn from(v: Vec<u8>) -> Self {
		Script::new(v.into())
	}
}

impl From<Script> for Bytes {
	fn from(script: Script) -> Self {
		script.data
	}
}

impl Script {
	pub fn new(data: Bytes) -> Self {
		Script {
			data: data,
		}
	}

	pub fn to_bytes(&self) -> Bytes {
		self.data.clone()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn instructions(&self) -> Instructions {
		Instructions {
			data: &self.data,
			position: 0,
		}
	}

	pub fn is_pay_to_script_hash(&self) -> bool {
		self.data.len() == 23 &&
			self.data[0] == OP_HASH160 &&
			self.data[1] == 0x14 &&
			self.data[22] == OP_EQUAL
	}

	pub fn is_push_only(&self) -> bool {
		self.instructions().all(|instruction| match instruction {
			Ok(ref i) => i.opcode <= OP_PUSHDATA4 || is_within_op_n(i.opcode),
			Err(_) => false,
		})
	}

	/// Data of the last push operation, if the script is a well formed
	/// sequence of operations ending with a push.
	pub fn last_push(&self) -> Option<&[u8]> {
		let mut last = None;
		for instruction in self.instructions() {
			match instruction {
				Ok(i) => last = i.data,
				Err(_) => return None,
			}
		}
		last
	}

	/// Counts the signature operations of this script. Walking stops at the
	/// first undecodable operation, keeping all operations counted so far.
	pub fn sigops_count(&self, accurate: bool) -> usize {
		let mut last_opcode = 0u8;
		let mut total = 0usize;
		for instruction in self.instructions() {
			let instruction = match instruction {
				Ok(instruction) => instruction,
				Err(_) => return total,
			};

			match instruction.opcode {
				OP_CHECKSIG | OP_CHECKSIGVERIFY => {
					total += 1;
				},
				OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
					if accurate && is_within_op_n(last_opcode) {
						total += decode_op_n(last_opcode) as usize;
					} else {
						total += MAX_PUBKEYS_PER_MULTISIG;
					}
				},
				_ => (),
			};

			last_opcode = instruction.opcode;
		}

		total
	}

	/// Strict variant of `sigops_count` used for embedded scripts, where an
	/// undecodable operation invalidates the script.
	pub fn sigops_count_strict(&self, accurate: bool) -> Result<usize, Error> {
		for instruction in self.instructions() {
			instruction?;
		}
		Ok(self.sigops_count(accurate))
	}
}

impl ops::Deref for Script {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.data
	}
}

impl fmt::Debug for Script {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.data.fmt(f)
	}
}

pub struct Instructions<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> Iterator for Instructions<'a> {
	type Item = Result<Instruction<'a>, Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.position >= self.data.len() {
			return None;
		}

		let opcode = self.data[self.position];
		self.position += 1;

		let data_len = match opcode {
			x if x <= OP_PUSHBYTES_MAX => x as usize,
			OP_PUSHDATA1 => {
				match self.read_usize(1) {
					Ok(len) => len,
					Err(err) => return Some(Err(err)),
				}
			},
			OP_PUSHDATA2 => {
				match self.read_usize(2) {
					Ok(len) => len,
					Err(err) => return Some(Err(err)),
				}
			},
			OP_PUSHDATA4 => {
				match self.read_usize(4) {
					Ok(len) => len,
					Err(err) => return Some(Err(err)),
				}
			},
			_ => 0,
		};

		if data_len == 0 {
			return Some(Ok(Instruction {
				opcode: opcode,
				data: None,
			}));
		}

		if self.position + data_len > self.data.len() {
			self.position = self.data.len();
			return Some(Err(Error::UnexpectedEnd));
		}

		let data = &self.data[self.position..self.position + data_len];
		self.position += data_len;

		Some(Ok(Instruction {
			opcode: opcode,
			data: Some(data),
		}))
	}
}

impl<'a> Instructions<'a> {
	fn read_usize(&mut self, bytes: usize) -> Result<usize, Error> {
		if self.position + bytes > self.data.len() {
			self.position = self.data.len();
			return Err(Error::UnexpectedEnd);
		}

		let mut result = 0usize;
		for i in 0..bytes {
			result |= (self.data[self.position + i] as usize) << (8 * i);
		}
		self.position += bytes;
		Ok(result)
	}
}

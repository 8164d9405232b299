//! Script builder

use bytes::Bytes;
use opcode::{OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4};
use num::Num;
use script::Script;

#[derive(Default)]
pub struct Builder {
	data: Bytes,
}

impl Builder {
	pub fn push_num(self, num: Num) -> Self {
		self.push_data(&num.encode())
	}

	pub fn push_data(mut self, data: &[u8]) -> Self {
		let len = data.len();
		if len < OP_PUSHDATA1 as usize {
			self.data.push(len as u8);
		} else if len < 0x100 {
			self.data.push(OP_PUSHDATA1);
			self.data.push(len as u8);
		} else if len < 0x10000 {
			self.data.push(OP_PUSHDATA2);
			self.data.push(len as u8);
			self.data.push((len >> 8) as u8);
		} else {
			self.data.push(OP_PUSHDATA4);
			self.data.push(len as u8);
			self.data.push((len >> 8) as u8);
			self.data.push((len >> 16) as u8);
			self.data.push((len >> 24) as u8);
		}
		self.data.extend_from_slice(data);
		self
	}

	pub fn push_opcode(mut self, opcode: u8) -> Self {
		self.data.push(opcode);
		self
	}

	pub fn into_script(self) -> Script {
		Script::new(self.data)
	}

	pub fn into_bytes(self) -> Bytes {
		self.data
	}
}

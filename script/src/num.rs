//! Script numbers, minimally encoded little-endian with a sign bit.

use bytes::Bytes;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Num(i64);

impl From<u8> for Num {
	fn from(i: u8) -> Self {
		Num(i as i64)
	}
}

impl From<u32> for Num {
	fn from(i: u32) -> Self {
		Num(i as i64)
	}
}

impl From<i64> for Num {
	fn from(i: i64) -> Self {
		Num(i)
	}
}

impl From<Num> for i64 {
	fn from(n: Num) -> Self {
		n.0
	}
}

impl Num {
	pub fn is_negative(&self) -> bool {
		self.0 < 0
	}

	pub fn encode(&self) -> Bytes {
		if self.0 == 0 {
			return Bytes::default();
		}

		let mut result = vec![];
		let negative = self.0 < 0;
		let mut absvalue = if negative {
			(-self.0) as u64
		} else {
			self.0 as u64
		};

		while absvalue > 0 {
			result.push(absvalue as u8 & 0xff);
			absvalue >>= 8;
		}

		// The most significant byte carries the sign. If it is already used by
		// the magnitude, an extra byte is appended.
		if result[result.len() - 1] & 0x80 != 0 {
			if negative {
				result.push(0x80);
			} else {
				result.push(0);
			}
		} else if negative {
			let len = result.len();
			result[len - 1] |= 0x80;
		}

		result.into()
	}
}

#[cfg(test)]
mod tests {
	use super::Num;

	#[test]
	fn test_num_encode() {
		assert_eq!(Num::from(0u32).encode(), "".into());
		assert_eq!(Num::from(1u32).encode(), "01".into());
		assert_eq!(Num::from(127u32).encode(), "7f".into());
		assert_eq!(Num::from(128u32).encode(), "8000".into());
		assert_eq!(Num::from(255u32).encode(), "ff00".into());
		assert_eq!(Num::from(300000u32).encode(), "e09304".into());
		assert_eq!(Num::from(-1i64).encode(), "81".into());
	}
}

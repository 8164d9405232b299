//! Fixed-size hashes.
//!
//! Wire order is little-endian, so the conventional hex notation of a
//! block or transaction id is the byte-reversed form.

use std::{fmt, ops, str};
use rustc_hex::{ToHex, FromHex, FromHexError};

macro_rules! impl_hash {
	($name: ident, $size: expr) => {
		#[repr(C)]
		#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name([u8; $size]);

		impl $name {
			pub fn reversed(&self) -> Self {
				let mut result = *self;
				result.reverse();
				result
			}

			pub fn is_zero(&self) -> bool {
				self.0.iter().all(|byte| *byte == 0)
			}
		}

		impl Default for $name {
			fn default() -> Self {
				$name([0u8; $size])
			}
		}

		impl From<[u8; $size]> for $name {
			fn from(bytes: [u8; $size]) -> Self {
				$name(bytes)
			}
		}

		impl<'a> From<&'a [u8]> for $name {
			fn from(slice: &[u8]) -> Self {
				let mut result = $name::default();
				result.0.copy_from_slice(&slice[0..$size]);
				result
			}
		}

		impl From<u8> for $name {
			fn from(byte: u8) -> Self {
				let mut result = $name::default();
				result.0[0] = byte;
				result
			}
		}

		impl From<&'static str> for $name {
			fn from(s: &'static str) -> Self {
				s.parse().unwrap()
			}
		}

		impl str::FromStr for $name {
			type Err = FromHexError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				let bytes: Vec<u8> = s.from_hex()?;
				if bytes.len() != $size {
					return Err(FromHexError::InvalidHexLength);
				}

				Ok($name::from(&bytes as &[u8]))
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
				f.write_str(&self.0.to_hex::<String>())
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
				fmt::Display::fmt(self, f)
			}
		}

		impl ops::Deref for $name {
			type Target = [u8; $size];

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}

		impl ops::DerefMut for $name {
			fn deref_mut(&mut self) -> &mut Self::Target {
				&mut self.0
			}
		}

		impl AsRef<$name> for $name {
			fn as_ref(&self) -> &$name {
				self
			}
		}
	}
}

impl_hash!(H256, 32);
impl_hash!(H512, 64);

impl H256 {
	#[inline]
	pub fn from_reversed_str(s: &'static str) -> Self {
		H256::from(s).reversed()
	}

	#[inline]
	pub fn to_reversed_str(&self) -> String {
		self.reversed().to_string()
	}
}

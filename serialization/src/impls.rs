use byteorder::{LittleEndian, WriteBytesExt, ReadBytesExt};
use hash::{H256, H512};
use bytes::Bytes;
use compact::Compact;
use compact_integer::CompactInteger;
use {Serializable, Stream, Deserializable, Reader, Error};

macro_rules! impl_ser_for_number {
	($type: ty, $size: expr, $write_method: ident, $read_method: ident) => {
		impl Serializable for $type {
			fn serialize(&self, stream: &mut Stream) {
				stream.$write_method::<LittleEndian>(*self).unwrap();
			}

			fn serialized_size(&self) -> usize {
				$size
			}
		}

		impl Deserializable for $type {
			fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
				Ok(reader.$read_method::<LittleEndian>()?)
			}
		}
	}
}

impl Serializable for u8 {
	fn serialize(&self, stream: &mut Stream) {
		stream.write_u8(*self).unwrap();
	}

	fn serialized_size(&self) -> usize {
		1
	}
}

impl Deserializable for u8 {
	fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
		Ok(reader.read_u8()?)
	}
}

impl_ser_for_number!(u16, 2, write_u16, read_u16);
impl_ser_for_number!(u32, 4, write_u32, read_u32);
impl_ser_for_number!(u64, 8, write_u64, read_u64);
impl_ser_for_number!(i32, 4, write_i32, read_i32);
impl_ser_for_number!(i64, 8, write_i64, read_i64);

impl Serializable for bool {
	fn serialize(&self, stream: &mut Stream) {
		stream.write_u8(*self as u8).unwrap();
	}

	fn serialized_size(&self) -> usize {
		1
	}
}

impl Deserializable for bool {
	fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
		Ok(reader.read_u8()? != 0)
	}
}

impl Serializable for Compact {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&u32::from(*self));
	}

	fn serialized_size(&self) -> usize {
		4
	}
}

impl Deserializable for Compact {
	fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
		reader.read::<u32>().map(Compact::new)
	}
}

macro_rules! impl_ser_for_hash {
	($type: ident, $size: expr) => {
		impl Serializable for $type {
			fn serialize(&self, stream: &mut Stream) {
				stream.append_slice(&**self);
			}

			fn serialized_size(&self) -> usize {
				$size
			}
		}

		impl Deserializable for $type {
			fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
				let slice = reader.read_slice($size)?;
				let mut result = Self::default();
				result.copy_from_slice(slice);
				Ok(result)
			}
		}
	}
}

impl_ser_for_hash!(H256, 32);
impl_ser_for_hash!(H512, 64);

impl Serializable for Bytes {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&CompactInteger::from(self.len()))
			.append_slice(self);
	}

	fn serialized_size(&self) -> usize {
		CompactInteger::from(self.len()).serialized_size() + self.len()
	}
}

impl Deserializable for Bytes {
	fn deserialize(reader: &mut Reader) -> Result<Self, Error> {
		let len: usize = reader.read::<CompactInteger>()?.into();
		reader.read_slice(len).map(Into::into)
	}
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;
	use {serialize, deserialize};

	#[test]
	fn test_serialize_numbers() {
		assert_eq!(serialize(&1u8), vec![1].into());
		assert_eq!(serialize(&2u16), vec![2, 0].into());
		assert_eq!(serialize(&3u32), vec![3, 0, 0, 0].into());
		assert_eq!(serialize(&4u64), vec![4, 0, 0, 0, 0, 0, 0, 0].into());
	}

	#[test]
	fn test_serialize_bytes() {
		let bytes: Bytes = "0145".into();
		assert_eq!(serialize(&bytes), vec![2, 0x01, 0x45].into());
	}

	#[test]
	fn test_deserialize_bytes() {
		let raw = vec![2, 0x01, 0x45];
		let expected: Bytes = "0145".into();
		assert_eq!(expected, deserialize::<Bytes>(&raw).unwrap());
	}
}

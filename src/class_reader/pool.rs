use std::cell::OnceCell;
use anyhow::{anyhow, bail, Context, Result};
use java_string::{JavaStr, JavaString};
use crate::ClassFormatError;
use crate::class_constants::pool;
use crate::class_reader::ClassBuf;
use crate::jstring;
use crate::tree::{Constant, Handle};

/// The index over the constant pool of one class file.
///
/// Built with a single scan that records, for every entry, the absolute offset of its payload
/// (one byte past the tag). Entry contents are decoded on demand; UTF-8 strings are decoded at
/// most once, into a write-once cache. The cache makes this type (and with it the reader)
/// single-threaded, which is the intended model.
#[derive(Debug)]
pub(crate) struct Pool {
	/// Entry index to absolute payload offset. Index 0 and the slots shadowed by `Long` and
	/// `Double` entries stay `0`, which no real payload can have.
	offsets: Box<[u32]>,
	string_cache: Box<[OnceCell<JavaString>]>,
	/// The payload length of the longest `Utf8` entry, sizing the decode scratch buffer.
	max_string_length: u32,
	/// The offset of the first byte past the constant pool, where `access_flags` starts.
	header: u32,
}

impl Pool {
	/// Scans the constant pool of `b`, starting behind the version bytes. Fails with
	/// [`ClassFormatError::UnsupportedVersion`] for class files newer than major version 54 and
	/// with [`ClassFormatError::UnknownConstantPoolTag`] for corrupt pools.
	pub(crate) fn parse(b: &[u8]) -> Result<Pool> {
		let major = b.u16_at(6).context("class file shorter than its header")?;
		if major > crate::class_constants::MAX_MAJOR_VERSION {
			return Err(ClassFormatError::UnsupportedVersion(major).into());
		}

		let constant_pool_count = b.u16_at(8)? as usize;
		let mut offsets = vec![0u32; constant_pool_count].into_boxed_slice();
		let mut max_string_length = 0u32;

		let mut current_offset = 10usize;
		let mut index = 1;
		while index < constant_pool_count {
			offsets[index] = current_offset as u32 + 1;

			let tag = b.u8_at(current_offset)
				.with_context(|| anyhow!("constant pool entry {index} starts past the end of the class file"))?;
			let entry_size = match tag {
				pool::FIELD_REF | pool::METHOD_REF | pool::INTERFACE_METHOD_REF |
				pool::INTEGER | pool::FLOAT | pool::NAME_AND_TYPE |
				pool::INVOKE_DYNAMIC => 5,
				pool::LONG | pool::DOUBLE => {
					// these take two index slots, the second one stays unusable
					index += 1;
					9
				},
				pool::UTF8 => {
					let length = b.u16_at(current_offset + 1)? as u32;
					max_string_length = max_string_length.max(length);
					3 + length as usize
				},
				pool::METHOD_HANDLE => 4,
				pool::CLASS | pool::STRING | pool::METHOD_TYPE | pool::PACKAGE | pool::MODULE => 3,
				tag => return Err(ClassFormatError::UnknownConstantPoolTag { index: index as u16, tag }.into()),
			};

			current_offset += entry_size;
			index += 1;
		}

		if current_offset > b.len() {
			bail!("constant pool runs past the end of the class file");
		}

		Ok(Pool {
			offsets,
			string_cache: (0..constant_pool_count).map(|_| OnceCell::new()).collect(),
			max_string_length,
			header: current_offset as u32,
		})
	}

	/// The number of index slots, one more than the number of usable entries.
	pub(crate) fn item_count(&self) -> u16 {
		self.offsets.len() as u16
	}

	pub(crate) fn max_string_length(&self) -> u32 {
		self.max_string_length
	}

	pub(crate) fn header(&self) -> usize {
		self.header as usize
	}

	/// The payload offset of entry `index`, an error for index 0, out-of-range indices and the
	/// dead slots after `Long` and `Double` entries.
	pub(crate) fn offset(&self, index: u16) -> Result<usize> {
		match self.offsets.get(index as usize) {
			Some(&offset) if offset != 0 => Ok(offset as usize),
			_ => bail!("invalid constant pool index {index}"),
		}
	}

	fn tag(&self, b: &[u8], index: u16) -> Result<u8> {
		b.u8_at(self.offset(index)? - 1)
	}

	/// The raw modified UTF-8 payload of the `Utf8` entry at `index`. Used to match attribute
	/// names without decoding them.
	pub(crate) fn utf8_bytes<'b>(&self, b: &'b [u8], index: u16) -> Result<&'b [u8]> {
		let offset = self.offset(index)?;
		let length = b.u16_at(offset)? as usize;
		b.bytes_at(offset + 2, length)
	}

	/// The decoded string of the `Utf8` entry at `index`. Decoding happens at most once per
	/// entry, later calls return the cached string.
	pub(crate) fn utf8<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<&'p JavaStr> {
		let offset = self.offset(index)?;
		let length = b.u16_at(offset)? as usize;
		let bytes = b.bytes_at(offset + 2, length)?;
		Ok(self.string_cache[index as usize]
			.get_or_init(|| jstring::decode_modified_utf8(bytes, units))
			.as_java_str())
	}

	/// Like [`Self::utf8`], but index 0 means absent.
	pub(crate) fn optional_utf8<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<Option<&'p JavaStr>> {
		if index == 0 {
			Ok(None)
		} else {
			self.utf8(b, index, units).map(Some)
		}
	}

	/// The name of the `Class`, `Module` or `Package` entry at `index`. Like the original, the
	/// tag is not verified, only the indirection is followed.
	pub(crate) fn name<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<&'p JavaStr> {
		let offset = self.offset(index)?;
		self.utf8(b, b.u16_at(offset)?, units)
	}

	pub(crate) fn optional_name<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<Option<&'p JavaStr>> {
		if index == 0 {
			Ok(None)
		} else {
			self.name(b, index, units).map(Some)
		}
	}

	/// The `(name, descriptor)` pair of the `NameAndType` entry at `index`.
	pub(crate) fn name_and_type<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<(&'p JavaStr, &'p JavaStr)> {
		let offset = self.offset(index)?;
		let name = self.utf8(b, b.u16_at(offset)?, units)?;
		let descriptor = self.utf8(b, b.u16_at(offset + 2)?, units)?;
		Ok((name, descriptor))
	}

	/// Decodes the `Fieldref`, `Methodref` or `InterfaceMethodref` entry at `index` into
	/// `(owner, name, descriptor, is_interface)`.
	pub(crate) fn member_ref<'p>(&'p self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<(&'p JavaStr, &'p JavaStr, &'p JavaStr, bool)> {
		let offset = self.offset(index)?;
		let is_interface = self.tag(b, index)? == pool::INTERFACE_METHOD_REF;
		let owner = self.name(b, b.u16_at(offset)?, units)?;
		let (name, descriptor) = self.name_and_type(b, b.u16_at(offset + 2)?, units)?;
		Ok((owner, name, descriptor, is_interface))
	}

	/// Follows the `MethodHandle` entry at `index` to its referenced member.
	pub(crate) fn method_handle(&self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<Handle> {
		let entry_tag = self.tag(b, index)?;
		if entry_tag != pool::METHOD_HANDLE {
			bail!("constant pool entry {index} with tag {entry_tag} is not a method handle");
		}
		let offset = self.offset(index)?;
		let tag = b.u8_at(offset)?;
		let (owner, name, descriptor, is_interface) = self.member_ref(b, b.u16_at(offset + 1)?, units)?;
		Ok(Handle {
			tag,
			owner: owner.to_owned(),
			name: name.to_owned(),
			descriptor: descriptor.to_owned(),
			is_interface,
		})
	}

	/// Decodes the loadable entry at `index`, dispatching on its tag. This is what `ldc` family
	/// instructions, `ConstantValue` attributes and bootstrap method arguments refer to.
	pub(crate) fn constant(&self, b: &[u8], index: u16, units: &mut Vec<u16>) -> Result<Constant> {
		let offset = self.offset(index)?;
		Ok(match self.tag(b, index)? {
			pool::INTEGER => Constant::Integer(b.i32_at(offset)?),
			pool::FLOAT => Constant::Float(f32::from_bits(b.u32_at(offset)?)),
			pool::LONG => Constant::Long(b.i64_at(offset)?),
			pool::DOUBLE => Constant::Double(f64::from_bits(b.u64_at(offset)?)),
			pool::CLASS => Constant::Class(self.utf8(b, b.u16_at(offset)?, units)?.to_owned()),
			pool::STRING => Constant::String(self.utf8(b, b.u16_at(offset)?, units)?.to_owned()),
			pool::METHOD_TYPE => Constant::MethodType(self.utf8(b, b.u16_at(offset)?, units)?.to_owned()),
			pool::METHOD_HANDLE => Constant::MethodHandle(self.method_handle(b, index, units)?),
			tag => bail!("constant pool entry {index} with tag {tag} is not loadable"),
		})
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use crate::ClassFormatError;
	use super::*;

	/// A header plus the given pool entries, each starting with its tag byte.
	fn class_bytes(count: u16, entries: &[&[u8]]) -> Vec<u8> {
		let mut b = vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52];
		b.extend_from_slice(&count.to_be_bytes());
		for entry in entries {
			b.extend_from_slice(entry);
		}
		b
	}

	#[test]
	fn offsets_point_past_the_tag() -> Result<()> {
		let b = class_bytes(4, &[
			&[1, 0, 3, b'f', b'o', b'o'], // 1: Utf8 "foo"
			&[3, 0, 0, 0, 42],            // 2: Integer 42
			&[7, 0, 1],                   // 3: Class -> 1
		]);
		let pool = Pool::parse(&b)?;

		assert_eq!(pool.offset(1)?, 11);
		assert_eq!(pool.offset(2)?, 17);
		assert_eq!(pool.offset(3)?, 22);
		assert_eq!(pool.header(), 24);
		assert_eq!(pool.max_string_length(), 3);
		assert_eq!(pool.item_count(), 4);

		let mut units = Vec::new();
		assert_eq!(pool.utf8(&b, 1, &mut units)?, "foo");
		assert_eq!(pool.name(&b, 3, &mut units)?, "foo");
		assert_eq!(pool.constant(&b, 2, &mut units)?, Constant::Integer(42));
		Ok(())
	}

	#[test]
	fn long_entries_eat_two_slots() -> Result<()> {
		let b = class_bytes(4, &[
			&[5, 0, 0, 0, 0, 0, 0, 0, 7], // 1: Long 7 (slot 2 unusable)
			&[3, 0, 0, 0, 1],             // 3: Integer 1
		]);
		let pool = Pool::parse(&b)?;

		let mut units = Vec::new();
		assert_eq!(pool.constant(&b, 1, &mut units)?, Constant::Long(7));
		assert!(pool.offset(2).is_err());
		assert_eq!(pool.constant(&b, 3, &mut units)?, Constant::Integer(1));
		Ok(())
	}

	#[test]
	fn unknown_tag_fails_construction() {
		let b = class_bytes(2, &[&[99, 0, 0]]);
		let error = Pool::parse(&b).unwrap_err();
		assert_eq!(
			error.downcast_ref::<ClassFormatError>(),
			Some(&ClassFormatError::UnknownConstantPoolTag { index: 1, tag: 99 }),
		);
	}

	#[test]
	fn newer_major_version_fails_construction() {
		let b = class_bytes(1, &[]);
		let mut b55 = b.clone();
		b55[7] = 55;
		assert_eq!(
			Pool::parse(&b55).unwrap_err().downcast_ref::<ClassFormatError>(),
			Some(&ClassFormatError::UnsupportedVersion(55)),
		);
		assert!(Pool::parse(&b).is_ok());
	}
}

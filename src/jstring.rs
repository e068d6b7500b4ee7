//! Decoding of the string format used in the Java Virtual Machine Specification.
//!
//! The format stores `\0` using two bytes and encodes supplementary code points as pairs of
//! three byte surrogate encodings.
//!
//! See <https://docs.oracle.com/javase/specs/jvms/se10/html/jvms-4.html#jvms-4.4.7> for the
//! complete specification of the format.
//!
//! The decoder here is deliberately lenient: class files are not rejected for malformed string
//! payloads, the decoder produces best-effort code units and continues. Use
//! [`JavaString::from_modified_utf8`] when validation is wanted.

use java_string::{JavaCodePoint, JavaString};

/// Decodes modified UTF-8 into a [`JavaString`], collecting UTF-16 code units in `units` first.
///
/// `units` is scratch space so that one buffer, sized to the largest payload of the constant
/// pool, can serve every decode of an `accept` call. Valid surrogate pairs are combined into
/// supplementary code points, unpaired surrogates are kept as they are.
pub(crate) fn decode_modified_utf8(bytes: &[u8], units: &mut Vec<u16>) -> JavaString {
	units.clear();

	let mut offset = 0;
	while offset < bytes.len() {
		let b0 = bytes[offset];
		offset += 1;

		if b0 & 0x80 == 0 {
			units.push((b0 & 0x7F) as u16);
		} else if b0 & 0xE0 == 0xC0 {
			let Some(&b1) = bytes.get(offset) else { break };
			offset += 1;
			units.push((((b0 & 0x1F) as u16) << 6) | (b1 & 0x3F) as u16);
		} else {
			let Some(&b1) = bytes.get(offset) else { break };
			let Some(&b2) = bytes.get(offset + 1) else { break };
			offset += 2;
			units.push((((b0 & 0x0F) as u16) << 12) | (((b1 & 0x3F) as u16) << 6) | (b2 & 0x3F) as u16);
		}
	}

	let mut string = JavaString::new();
	let mut index = 0;
	while index < units.len() {
		let unit = units[index];
		index += 1;

		if (0xD800..=0xDBFF).contains(&unit) && index < units.len() && (0xDC00..=0xDFFF).contains(&units[index]) {
			let low = units[index];
			index += 1;
			let combined = 0x10000 + ((((unit - 0xD800) as u32) << 10) | (low - 0xDC00) as u32);
			if let Some(char) = char::from_u32(combined) {
				string.push(char);
			}
		} else if let Some(char) = char::from_u32(unit as u32) {
			string.push(char);
		} else if let Some(code_point) = JavaCodePoint::from_u32(unit as u32) {
			string.push_java(code_point);
		}
	}

	string
}

use java_string::JavaString;

/// An attribute this reader has no dedicated handling for, delivered opaque.
///
/// Attributes of one declaration are delivered in reverse read order, most recently read first.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
	pub name: JavaString,
	/// The raw `info` bytes of the attribute, without the name index and length prefix.
	pub content: Vec<u8>,
}

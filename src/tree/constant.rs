use std::fmt::{Debug, Formatter};
use java_string::JavaString;

/// A constant that can be loaded from the constant pool: the value of an `ldc` family
/// instruction, the `ConstantValue` of a field, or an argument of a bootstrap method.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
	Integer(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	String(JavaString),
	/// A class constant; holds the internal name of the class, or the full descriptor for array
	/// classes.
	Class(JavaString),
	/// A method type constant; holds the method descriptor.
	MethodType(JavaString),
	MethodHandle(Handle),
}

/// A reference to a field or a method, as loaded from a `CONSTANT_MethodHandle_info` entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Handle {
	/// The kind of this handle, one of the `H_*` constants in [`crate::opcodes`].
	pub tag: u8,
	/// The internal name of the class owning the referenced field or method.
	pub owner: JavaString,
	pub name: JavaString,
	pub descriptor: JavaString,
	/// Whether the owner is an interface.
	pub is_interface: bool,
}

impl Debug for Handle {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Handle {{ {} {}.{} {}{} }}",
			self.tag, self.owner, self.name, self.descriptor,
			if self.is_interface { " itf" } else { "" })
	}
}

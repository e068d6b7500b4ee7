use anyhow::Result;
use java_string::{JavaStr, JavaString};

/// A decoded `element_value`, or a homogeneous array of primitive ones.
///
/// Array values whose elements are of a primitive type arrive as one typed array variant;
/// every other array arrives through [`AnnotationVisitor::visit_array`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
	Byte(i8),
	Boolean(bool),
	/// A UTF-16 code unit, as java `char` constants may be unpaired surrogates.
	Char(u16),
	Short(i16),
	Integer(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(JavaString),
	/// A class literal; holds the descriptor.
	Class(JavaString),
	ByteArray(Vec<i8>),
	BooleanArray(Vec<bool>),
	CharArray(Vec<u16>),
	ShortArray(Vec<i16>),
	IntegerArray(Vec<i32>),
	LongArray(Vec<i64>),
	FloatArray(Vec<f32>),
	DoubleArray(Vec<f64>),
}

/// A visitor for a java annotation. `name` is `None` inside array values and for annotation
/// default values, where element values carry no names.
#[allow(unused_variables)]
pub trait AnnotationVisitor {
	/// Visits a primitive, string or class element value.
	fn visit(&mut self, name: Option<&JavaStr>, value: &ElementValue) -> Result<()> {
		Ok(())
	}

	/// Visits an enum constant element value.
	fn visit_enum(&mut self, name: Option<&JavaStr>, descriptor: &JavaStr, value: &JavaStr) -> Result<()> {
		Ok(())
	}

	/// Visits a nested annotation element value.
	fn visit_annotation(&mut self, name: Option<&JavaStr>, descriptor: &JavaStr) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	/// Visits an array element value whose elements are not of a primitive type. The elements
	/// arrive on the returned visitor, unnamed.
	fn visit_array(&mut self, name: Option<&JavaStr>) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}

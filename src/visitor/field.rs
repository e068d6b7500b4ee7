use anyhow::Result;
use java_string::JavaStr;
use crate::tree::{Attribute, TypePath};
use crate::visitor::annotation::AnnotationVisitor;

/// A visitor for a java field. Annotations and type annotations come first, then attributes,
/// then `visit_end`.
#[allow(unused_variables)]
pub trait FieldVisitor {
	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}

use anyhow::Result;
use java_string::{JavaStr, JavaString};
use crate::tree::{Attribute, Constant, TypePath};
use crate::visitor::annotation::AnnotationVisitor;
use crate::visitor::field::FieldVisitor;
use crate::visitor::method::MethodVisitor;
use crate::visitor::module::ModuleVisitor;

/// A visitor for a java class.
///
/// The reader calls the methods of this trait in the following order:
/// `visit` `[visit_source]` `[visit_module]` `[visit_outer_class]`
/// (`visit_annotation` | `visit_type_annotation`)* `visit_attribute`* `visit_inner_class`*
/// `visit_field`* `visit_method`* `visit_end`.
#[allow(unused_variables)]
pub trait ClassVisitor {
	/// Visits the header of the class.
	///
	/// `version` packs the minor version into the upper and the major version into the lower two
	/// bytes. `super_name` is `None` only for `java/lang/Object`. Names are internal names.
	fn visit(&mut self, version: u32, access: u32, name: &JavaStr, signature: Option<&JavaStr>, super_name: Option<&JavaStr>, interfaces: &[JavaString]) -> Result<()> {
		Ok(())
	}

	/// Visits the source file and debug extension of the class, when at least one is present.
	fn visit_source(&mut self, source: Option<&JavaStr>, debug: Option<&JavaStr>) -> Result<()> {
		Ok(())
	}

	/// Visits the module the class describes, for `module-info` classes.
	fn visit_module(&mut self, name: &JavaStr, access: u16, version: Option<&JavaStr>) -> Result<Option<&mut dyn ModuleVisitor>> {
		Ok(None)
	}

	/// Visits the enclosing method of the class, for local and anonymous classes.
	fn visit_outer_class(&mut self, owner: &JavaStr, name: Option<&JavaStr>, descriptor: Option<&JavaStr>) -> Result<()> {
		Ok(())
	}

	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		Ok(())
	}

	fn visit_inner_class(&mut self, name: Option<&JavaStr>, outer_name: Option<&JavaStr>, inner_name: Option<&JavaStr>, access: u16) -> Result<()> {
		Ok(())
	}

	fn visit_field(&mut self, access: u32, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, value: Option<&Constant>) -> Result<Option<&mut dyn FieldVisitor>> {
		Ok(None)
	}

	fn visit_method(&mut self, access: u32, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, exceptions: &[JavaString]) -> Result<Option<&mut dyn MethodVisitor>> {
		Ok(None)
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}

use anyhow::Result;
use java_string::JavaStr;
use crate::label::Label;
use crate::tree::{Attribute, Constant, FrameItem, Handle, TypePath};
use crate::visitor::annotation::AnnotationVisitor;

/// A visitor for a java method.
///
/// The reader calls the methods of this trait in the following order: `visit_parameter`*
/// `[visit_annotation_default]` (`visit_annotation` | `visit_type_annotation`)*
/// (`visit_annotable_parameter_count` `visit_parameter_annotation`*)* `visit_attribute`*
/// `[visit_code` code events `visit_maxs]` `visit_end`.
///
/// Inside the code, instruction events and `visit_label` come in the sequential order of the
/// bytecode; `visit_insn_annotation` is called immediately *after* the annotated instruction;
/// `visit_try_catch_block` is called *before* any of its three labels is visited;
/// `visit_local_variable`, `visit_local_variable_annotation` and `visit_line_number` are called
/// *after* the labels they refer to.
#[allow(unused_variables)]
pub trait MethodVisitor {
	/// Visits one entry of the `MethodParameters` attribute.
	fn visit_parameter(&mut self, name: Option<&JavaStr>, access: u16) -> Result<()> {
		Ok(())
	}

	/// Visits the default value of the annotation interface method, a single unnamed element
	/// value on the returned visitor.
	fn visit_annotation_default(&mut self) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	/// Visits the number of parameters than can carry annotations in the following
	/// `visit_parameter_annotation` stream.
	fn visit_annotable_parameter_count(&mut self, parameter_count: u8, visible: bool) -> Result<()> {
		Ok(())
	}

	fn visit_parameter_annotation(&mut self, parameter: u8, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		Ok(())
	}

	/// Starts the visit of the code of the method.
	fn visit_code(&mut self) -> Result<()> {
		Ok(())
	}

	/// Visits the type state of locals and operand stack at the current bytecode position.
	///
	/// `frame_type` is one of the `F_*` constants of [`crate::opcodes`]. For [`crate::opcodes::F_CHOP`]
	/// frames `local_count` holds the number of chopped locals while `local` stays empty.
	fn visit_frame(&mut self, frame_type: i32, local_count: u16, local: &[FrameItem], stack_count: u16, stack: &[FrameItem]) -> Result<()> {
		Ok(())
	}

	fn visit_insn(&mut self, opcode: u8) -> Result<()> {
		Ok(())
	}

	/// Visits `bipush`, `sipush` or `newarray`.
	fn visit_int_insn(&mut self, opcode: u8, operand: i32) -> Result<()> {
		Ok(())
	}

	/// Visits a local variable load, store or `ret` instruction, with the short forms folded
	/// into their general form.
	fn visit_var_insn(&mut self, opcode: u8, var: u16) -> Result<()> {
		Ok(())
	}

	/// Visits `new`, `anewarray`, `checkcast` or `instanceof`; `type_name` is an internal name
	/// or an array descriptor.
	fn visit_type_insn(&mut self, opcode: u8, type_name: &JavaStr) -> Result<()> {
		Ok(())
	}

	fn visit_field_insn(&mut self, opcode: u8, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr) -> Result<()> {
		Ok(())
	}

	fn visit_method_insn(&mut self, opcode: u8, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr, is_interface: bool) -> Result<()> {
		Ok(())
	}

	fn visit_invoke_dynamic_insn(&mut self, name: &JavaStr, descriptor: &JavaStr, bootstrap_method_handle: &Handle, bootstrap_method_arguments: &[Constant]) -> Result<()> {
		Ok(())
	}

	fn visit_jump_insn(&mut self, opcode: u8, label: Label) -> Result<()> {
		Ok(())
	}

	/// Visits a label, designating the instruction that will be visited next.
	fn visit_label(&mut self, label: Label) -> Result<()> {
		Ok(())
	}

	fn visit_ldc_insn(&mut self, value: &Constant) -> Result<()> {
		Ok(())
	}

	fn visit_iinc_insn(&mut self, var: u16, increment: i16) -> Result<()> {
		Ok(())
	}

	/// `labels[i]` is the target for the key `min + i`; `max < min` means an empty table.
	fn visit_table_switch_insn(&mut self, min: i32, max: i32, default: Label, labels: &[Label]) -> Result<()> {
		Ok(())
	}

	fn visit_lookup_switch_insn(&mut self, default: Label, keys: &[i32], labels: &[Label]) -> Result<()> {
		Ok(())
	}

	fn visit_multi_anew_array_insn(&mut self, descriptor: &JavaStr, num_dimensions: u8) -> Result<()> {
		Ok(())
	}

	/// Visits an annotation on the type operand of the last visited instruction.
	fn visit_insn_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	/// Visits an exception table entry; `catch_type` is `None` for `finally` handlers.
	fn visit_try_catch_block(&mut self, start: Label, end: Label, handler: Label, catch_type: Option<&JavaStr>) -> Result<()> {
		Ok(())
	}

	/// Visits an annotation on the exception type of an exception table entry.
	fn visit_try_catch_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_local_variable(&mut self, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, start: Label, end: Label, index: u16) -> Result<()> {
		Ok(())
	}

	/// Visits an annotation on the type of a local variable. The parallel `start`/`end`/`index`
	/// slices give the bytecode ranges in which the variable lives, and its slot in each range.
	fn visit_local_variable_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, start: &[Label], end: &[Label], index: &[u16], descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		Ok(None)
	}

	fn visit_line_number(&mut self, line: u16, start: Label) -> Result<()> {
		Ok(())
	}

	fn visit_maxs(&mut self, max_stack: u16, max_locals: u16) -> Result<()> {
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}

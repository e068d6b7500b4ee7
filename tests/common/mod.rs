//! Support for the integration tests: a small raw class file builder and an event recording
//! visitor whose transcript the tests compare against the expected event order.

#![allow(dead_code)]

use anyhow::Result;
use java_string::JavaStr;
use earl::label::Label;
use earl::tree::{Attribute, Constant, FrameItem, Handle, TypePath};
use earl::visitor::annotation::{AnnotationVisitor, ElementValue};
use earl::visitor::class::ClassVisitor;
use earl::visitor::field::FieldVisitor;
use earl::visitor::method::MethodVisitor;
use earl::visitor::module::ModuleVisitor;

/// One constant pool entry of a test class file. `Long` and `Double` take two index slots.
pub enum Cp {
	Utf8(&'static str),
	Int(i32),
	Float(f32),
	Long(i64),
	Double(f64),
	Class(u16),
	Str(u16),
	FieldRef(u16, u16),
	MethodRef(u16, u16),
	InterfaceMethodRef(u16, u16),
	NameAndType(u16, u16),
	MethodHandle(u8, u16),
	MethodType(u16),
	InvokeDynamic(u16, u16),
	Module(u16),
	Package(u16),
}

pub struct RawAttribute {
	pub name_index: u16,
	pub content: Vec<u8>,
}

pub struct RawMember {
	pub access: u16,
	pub name_index: u16,
	pub descriptor_index: u16,
	pub attributes: Vec<RawAttribute>,
}

pub struct RawClass {
	pub major: u16,
	pub pool: Vec<Cp>,
	pub access: u16,
	pub this_class: u16,
	pub super_class: u16,
	pub interfaces: Vec<u16>,
	pub fields: Vec<RawMember>,
	pub methods: Vec<RawMember>,
	pub attributes: Vec<RawAttribute>,
}

fn push_u16(bytes: &mut Vec<u8>, value: u16) {
	bytes.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(bytes: &mut Vec<u8>, value: u32) {
	bytes.extend_from_slice(&value.to_be_bytes());
}

fn push_attributes(bytes: &mut Vec<u8>, attributes: &[RawAttribute]) {
	push_u16(bytes, attributes.len() as u16);
	for attribute in attributes {
		push_u16(bytes, attribute.name_index);
		push_u32(bytes, attribute.content.len() as u32);
		bytes.extend_from_slice(&attribute.content);
	}
}

impl RawClass {
	pub fn new(major: u16, pool: Vec<Cp>) -> RawClass {
		RawClass {
			major,
			pool,
			access: 0x0021, // public super
			this_class: 0,
			super_class: 0,
			interfaces: Vec::new(),
			fields: Vec::new(),
			methods: Vec::new(),
			attributes: Vec::new(),
		}
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE];
		push_u16(&mut bytes, 0);
		push_u16(&mut bytes, self.major);

		let slots: u16 = self.pool.iter()
			.map(|entry| match entry {
				Cp::Long(_) | Cp::Double(_) => 2,
				_ => 1,
			})
			.sum();
		push_u16(&mut bytes, slots + 1);
		for entry in &self.pool {
			match *entry {
				Cp::Utf8(string) => {
					bytes.push(1);
					push_u16(&mut bytes, string.len() as u16);
					bytes.extend_from_slice(string.as_bytes());
				},
				Cp::Int(value) => {
					bytes.push(3);
					push_u32(&mut bytes, value as u32);
				},
				Cp::Float(value) => {
					bytes.push(4);
					push_u32(&mut bytes, value.to_bits());
				},
				Cp::Long(value) => {
					bytes.push(5);
					bytes.extend_from_slice(&value.to_be_bytes());
				},
				Cp::Double(value) => {
					bytes.push(6);
					bytes.extend_from_slice(&value.to_bits().to_be_bytes());
				},
				Cp::Class(name_index) => {
					bytes.push(7);
					push_u16(&mut bytes, name_index);
				},
				Cp::Str(utf8_index) => {
					bytes.push(8);
					push_u16(&mut bytes, utf8_index);
				},
				Cp::FieldRef(class_index, name_and_type_index) => {
					bytes.push(9);
					push_u16(&mut bytes, class_index);
					push_u16(&mut bytes, name_and_type_index);
				},
				Cp::MethodRef(class_index, name_and_type_index) => {
					bytes.push(10);
					push_u16(&mut bytes, class_index);
					push_u16(&mut bytes, name_and_type_index);
				},
				Cp::InterfaceMethodRef(class_index, name_and_type_index) => {
					bytes.push(11);
					push_u16(&mut bytes, class_index);
					push_u16(&mut bytes, name_and_type_index);
				},
				Cp::NameAndType(name_index, descriptor_index) => {
					bytes.push(12);
					push_u16(&mut bytes, name_index);
					push_u16(&mut bytes, descriptor_index);
				},
				Cp::MethodHandle(kind, reference_index) => {
					bytes.push(15);
					bytes.push(kind);
					push_u16(&mut bytes, reference_index);
				},
				Cp::MethodType(descriptor_index) => {
					bytes.push(16);
					push_u16(&mut bytes, descriptor_index);
				},
				Cp::InvokeDynamic(bootstrap_index, name_and_type_index) => {
					bytes.push(18);
					push_u16(&mut bytes, bootstrap_index);
					push_u16(&mut bytes, name_and_type_index);
				},
				Cp::Module(name_index) => {
					bytes.push(19);
					push_u16(&mut bytes, name_index);
				},
				Cp::Package(name_index) => {
					bytes.push(20);
					push_u16(&mut bytes, name_index);
				},
			}
		}

		push_u16(&mut bytes, self.access);
		push_u16(&mut bytes, self.this_class);
		push_u16(&mut bytes, self.super_class);
		push_u16(&mut bytes, self.interfaces.len() as u16);
		for &interface in &self.interfaces {
			push_u16(&mut bytes, interface);
		}
		for members in [&self.fields, &self.methods] {
			push_u16(&mut bytes, members.len() as u16);
			for member in members.iter() {
				push_u16(&mut bytes, member.access);
				push_u16(&mut bytes, member.name_index);
				push_u16(&mut bytes, member.descriptor_index);
				push_attributes(&mut bytes, &member.attributes);
			}
		}
		push_attributes(&mut bytes, &self.attributes);
		bytes
	}
}

/// A `Code` attribute with the given bytecode, an empty exception table and the given
/// sub-attributes.
pub fn code_attribute(name_index: u16, max_stack: u16, max_locals: u16, code: &[u8], sub_attributes: Vec<RawAttribute>) -> RawAttribute {
	code_attribute_with_exceptions(name_index, max_stack, max_locals, code, &[], sub_attributes)
}

/// A `Code` attribute with an exception table of `(start_pc, end_pc, handler_pc, catch_type)`
/// entries.
pub fn code_attribute_with_exceptions(name_index: u16, max_stack: u16, max_locals: u16, code: &[u8], exception_table: &[(u16, u16, u16, u16)], sub_attributes: Vec<RawAttribute>) -> RawAttribute {
	let mut content = Vec::new();
	push_u16(&mut content, max_stack);
	push_u16(&mut content, max_locals);
	push_u32(&mut content, code.len() as u32);
	content.extend_from_slice(code);
	push_u16(&mut content, exception_table.len() as u16);
	for &(start_pc, end_pc, handler_pc, catch_type) in exception_table {
		push_u16(&mut content, start_pc);
		push_u16(&mut content, end_pc);
		push_u16(&mut content, handler_pc);
		push_u16(&mut content, catch_type);
	}
	push_attributes(&mut content, sub_attributes.as_slice());
	RawAttribute { name_index, content }
}

fn opt(value: Option<&JavaStr>) -> String {
	value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn join(values: &[java_string::JavaString]) -> String {
	values.iter().map(|value| value.to_string()).collect::<Vec<_>>().join(",")
}

fn path(type_path: Option<&TypePath>) -> String {
	match type_path {
		None => "-".to_string(),
		Some(type_path) => format!("{:?}", type_path.path),
	}
}

/// Records every event it sees, descending into every subtree.
#[derive(Default)]
pub struct Recorder {
	pub events: Vec<String>,
}

impl Recorder {
	pub fn new() -> Recorder {
		Recorder::default()
	}
}

impl ClassVisitor for Recorder {
	fn visit(&mut self, version: u32, access: u32, name: &JavaStr, signature: Option<&JavaStr>, super_name: Option<&JavaStr>, interfaces: &[java_string::JavaString]) -> Result<()> {
		self.events.push(format!("visit {version} {access:#x} {name} sig={} super={} itf=[{}]", opt(signature), opt(super_name), join(interfaces)));
		Ok(())
	}

	fn visit_source(&mut self, source: Option<&JavaStr>, debug: Option<&JavaStr>) -> Result<()> {
		self.events.push(format!("visitSource {} {}", opt(source), opt(debug)));
		Ok(())
	}

	fn visit_module(&mut self, name: &JavaStr, access: u16, version: Option<&JavaStr>) -> Result<Option<&mut dyn ModuleVisitor>> {
		self.events.push(format!("visitModule {name} {access:#x} {}", opt(version)));
		Ok(Some(self))
	}

	fn visit_outer_class(&mut self, owner: &JavaStr, name: Option<&JavaStr>, descriptor: Option<&JavaStr>) -> Result<()> {
		self.events.push(format!("visitOuterClass {owner} {} {}", opt(name), opt(descriptor)));
		Ok(())
	}

	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitAnnotation {descriptor} visible={visible}"));
		Ok(Some(self))
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitTypeAnnotation {type_reference:#010x} {} {descriptor} visible={visible}", path(type_path)));
		Ok(Some(self))
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		self.events.push(format!("visitAttribute {} {}b", attribute.name, attribute.content.len()));
		Ok(())
	}

	fn visit_inner_class(&mut self, name: Option<&JavaStr>, outer_name: Option<&JavaStr>, inner_name: Option<&JavaStr>, access: u16) -> Result<()> {
		self.events.push(format!("visitInnerClass {} {} {} {access:#x}", opt(name), opt(outer_name), opt(inner_name)));
		Ok(())
	}

	fn visit_field(&mut self, access: u32, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, value: Option<&Constant>) -> Result<Option<&mut dyn FieldVisitor>> {
		self.events.push(format!("visitField {access:#x} {name} {descriptor} sig={} value={value:?}", opt(signature)));
		Ok(Some(self))
	}

	fn visit_method(&mut self, access: u32, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, exceptions: &[java_string::JavaString]) -> Result<Option<&mut dyn MethodVisitor>> {
		self.events.push(format!("visitMethod {access:#x} {name} {descriptor} sig={} throws=[{}]", opt(signature), join(exceptions)));
		Ok(Some(self))
	}

	fn visit_end(&mut self) -> Result<()> {
		self.events.push("visitEnd".to_string());
		Ok(())
	}
}

impl FieldVisitor for Recorder {
	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitFieldAnnotation {descriptor} visible={visible}"));
		Ok(Some(self))
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitFieldTypeAnnotation {type_reference:#010x} {} {descriptor} visible={visible}", path(type_path)));
		Ok(Some(self))
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		self.events.push(format!("visitFieldAttribute {} {}b", attribute.name, attribute.content.len()));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.events.push("visitFieldEnd".to_string());
		Ok(())
	}
}

impl ModuleVisitor for Recorder {
	fn visit_main_class(&mut self, main_class: &JavaStr) -> Result<()> {
		self.events.push(format!("visitMainClass {main_class}"));
		Ok(())
	}

	fn visit_package(&mut self, package: &JavaStr) -> Result<()> {
		self.events.push(format!("visitPackage {package}"));
		Ok(())
	}

	fn visit_require(&mut self, module: &JavaStr, access: u16, version: Option<&JavaStr>) -> Result<()> {
		self.events.push(format!("visitRequire {module} {access:#x} {}", opt(version)));
		Ok(())
	}

	fn visit_export(&mut self, package: &JavaStr, access: u16, modules: &[java_string::JavaString]) -> Result<()> {
		self.events.push(format!("visitExport {package} {access:#x} [{}]", join(modules)));
		Ok(())
	}

	fn visit_open(&mut self, package: &JavaStr, access: u16, modules: &[java_string::JavaString]) -> Result<()> {
		self.events.push(format!("visitOpen {package} {access:#x} [{}]", join(modules)));
		Ok(())
	}

	fn visit_use(&mut self, service: &JavaStr) -> Result<()> {
		self.events.push(format!("visitUse {service}"));
		Ok(())
	}

	fn visit_provide(&mut self, service: &JavaStr, providers: &[java_string::JavaString]) -> Result<()> {
		self.events.push(format!("visitProvide {service} [{}]", join(providers)));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.events.push("visitModuleEnd".to_string());
		Ok(())
	}
}

impl AnnotationVisitor for Recorder {
	fn visit(&mut self, name: Option<&JavaStr>, value: &ElementValue) -> Result<()> {
		self.events.push(format!("annotationValue {} {value:?}", opt(name)));
		Ok(())
	}

	fn visit_enum(&mut self, name: Option<&JavaStr>, descriptor: &JavaStr, value: &JavaStr) -> Result<()> {
		self.events.push(format!("annotationEnum {} {descriptor} {value}", opt(name)));
		Ok(())
	}

	fn visit_annotation(&mut self, name: Option<&JavaStr>, descriptor: &JavaStr) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("annotationNested {} {descriptor}", opt(name)));
		Ok(Some(self))
	}

	fn visit_array(&mut self, name: Option<&JavaStr>) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("annotationArray {}", opt(name)));
		Ok(Some(self))
	}

	fn visit_end(&mut self) -> Result<()> {
		self.events.push("annotationEnd".to_string());
		Ok(())
	}
}

impl MethodVisitor for Recorder {
	fn visit_parameter(&mut self, name: Option<&JavaStr>, access: u16) -> Result<()> {
		self.events.push(format!("visitParameter {} {access:#x}", opt(name)));
		Ok(())
	}

	fn visit_annotation_default(&mut self) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push("visitAnnotationDefault".to_string());
		Ok(Some(self))
	}

	fn visit_annotation(&mut self, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitMethodAnnotation {descriptor} visible={visible}"));
		Ok(Some(self))
	}

	fn visit_type_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitMethodTypeAnnotation {type_reference:#010x} {} {descriptor} visible={visible}", path(type_path)));
		Ok(Some(self))
	}

	fn visit_annotable_parameter_count(&mut self, parameter_count: u8, visible: bool) -> Result<()> {
		self.events.push(format!("visitAnnotableParameterCount {parameter_count} visible={visible}"));
		Ok(())
	}

	fn visit_parameter_annotation(&mut self, parameter: u8, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitParameterAnnotation {parameter} {descriptor} visible={visible}"));
		Ok(Some(self))
	}

	fn visit_attribute(&mut self, attribute: Attribute) -> Result<()> {
		self.events.push(format!("visitMethodAttribute {} {}b", attribute.name, attribute.content.len()));
		Ok(())
	}

	fn visit_code(&mut self) -> Result<()> {
		self.events.push("visitCode".to_string());
		Ok(())
	}

	fn visit_frame(&mut self, frame_type: i32, local_count: u16, local: &[FrameItem], stack_count: u16, stack: &[FrameItem]) -> Result<()> {
		self.events.push(format!("visitFrame {frame_type} {local_count} {local:?} {stack_count} {stack:?}"));
		Ok(())
	}

	fn visit_insn(&mut self, opcode: u8) -> Result<()> {
		self.events.push(format!("visitInsn {opcode}"));
		Ok(())
	}

	fn visit_int_insn(&mut self, opcode: u8, operand: i32) -> Result<()> {
		self.events.push(format!("visitIntInsn {opcode} {operand}"));
		Ok(())
	}

	fn visit_var_insn(&mut self, opcode: u8, var: u16) -> Result<()> {
		self.events.push(format!("visitVarInsn {opcode} {var}"));
		Ok(())
	}

	fn visit_type_insn(&mut self, opcode: u8, type_name: &JavaStr) -> Result<()> {
		self.events.push(format!("visitTypeInsn {opcode} {type_name}"));
		Ok(())
	}

	fn visit_field_insn(&mut self, opcode: u8, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr) -> Result<()> {
		self.events.push(format!("visitFieldInsn {opcode} {owner}.{name} {descriptor}"));
		Ok(())
	}

	fn visit_method_insn(&mut self, opcode: u8, owner: &JavaStr, name: &JavaStr, descriptor: &JavaStr, is_interface: bool) -> Result<()> {
		self.events.push(format!("visitMethodInsn {opcode} {owner}.{name} {descriptor} itf={is_interface}"));
		Ok(())
	}

	fn visit_invoke_dynamic_insn(&mut self, name: &JavaStr, descriptor: &JavaStr, bootstrap_method_handle: &Handle, bootstrap_method_arguments: &[Constant]) -> Result<()> {
		self.events.push(format!("visitInvokeDynamicInsn {name} {descriptor} {bootstrap_method_handle:?} {bootstrap_method_arguments:?}"));
		Ok(())
	}

	fn visit_jump_insn(&mut self, opcode: u8, label: Label) -> Result<()> {
		self.events.push(format!("visitJumpInsn {opcode} {label:?}"));
		Ok(())
	}

	fn visit_label(&mut self, label: Label) -> Result<()> {
		self.events.push(format!("visitLabel {label:?}"));
		Ok(())
	}

	fn visit_ldc_insn(&mut self, value: &Constant) -> Result<()> {
		self.events.push(format!("visitLdcInsn {value:?}"));
		Ok(())
	}

	fn visit_iinc_insn(&mut self, var: u16, increment: i16) -> Result<()> {
		self.events.push(format!("visitIincInsn {var} {increment}"));
		Ok(())
	}

	fn visit_table_switch_insn(&mut self, min: i32, max: i32, default: Label, labels: &[Label]) -> Result<()> {
		self.events.push(format!("visitTableSwitchInsn {min} {max} {default:?} {labels:?}"));
		Ok(())
	}

	fn visit_lookup_switch_insn(&mut self, default: Label, keys: &[i32], labels: &[Label]) -> Result<()> {
		self.events.push(format!("visitLookupSwitchInsn {default:?} {keys:?} {labels:?}"));
		Ok(())
	}

	fn visit_multi_anew_array_insn(&mut self, descriptor: &JavaStr, num_dimensions: u8) -> Result<()> {
		self.events.push(format!("visitMultiANewArrayInsn {descriptor} {num_dimensions}"));
		Ok(())
	}

	fn visit_insn_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitInsnAnnotation {type_reference:#010x} {} {descriptor} visible={visible}", path(type_path)));
		Ok(Some(self))
	}

	fn visit_try_catch_block(&mut self, start: Label, end: Label, handler: Label, catch_type: Option<&JavaStr>) -> Result<()> {
		self.events.push(format!("visitTryCatchBlock {start:?} {end:?} {handler:?} {}", opt(catch_type)));
		Ok(())
	}

	fn visit_local_variable(&mut self, name: &JavaStr, descriptor: &JavaStr, signature: Option<&JavaStr>, start: Label, end: Label, index: u16) -> Result<()> {
		self.events.push(format!("visitLocalVariable {name} {descriptor} sig={} {start:?} {end:?} {index}", opt(signature)));
		Ok(())
	}

	fn visit_local_variable_annotation(&mut self, type_reference: i32, type_path: Option<&TypePath>, start: &[Label], end: &[Label], index: &[u16], descriptor: &JavaStr, visible: bool) -> Result<Option<&mut dyn AnnotationVisitor>> {
		self.events.push(format!("visitLocalVariableAnnotation {type_reference:#010x} {} {start:?} {end:?} {index:?} {descriptor} visible={visible}", path(type_path)));
		Ok(Some(self))
	}

	fn visit_line_number(&mut self, line: u16, start: Label) -> Result<()> {
		self.events.push(format!("visitLineNumber {line} {start:?}"));
		Ok(())
	}

	fn visit_maxs(&mut self, max_stack: u16, max_locals: u16) -> Result<()> {
		self.events.push(format!("visitMaxs {max_stack} {max_locals}"));
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		self.events.push("visitMethodEnd".to_string());
		Ok(())
	}
}

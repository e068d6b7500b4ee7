//! The streaming class file parser.
//!
//! A [`ClassReader`] indexes the constant pool at construction and, on [`ClassReader::accept`],
//! decodes the whole class file in one pass over its byte buffer, pushing events into the given
//! visitor tree. The byte buffer is never mutated and all reads use absolute offsets.

use anyhow::{anyhow, bail, Context as _, Result};
use java_string::{JavaStr, JavaString};
use log::trace;
use crate::{ClassFormatError, EXPAND_ASM_INSNS, EXPAND_FRAMES, SKIP_CODE, SKIP_DEBUG, SKIP_FRAMES};
use crate::class_constants::{attribute, frame, item, ASM_GOTO_W, ASM_IFEQ, ASM_IFNONNULL, ASM_IFNULL, ASM_IFNULL_OPCODE_DELTA, ASM_OPCODE_DELTA, WIDE_JUMP_OPCODE_DELTA};
use crate::class_reader::labels::Labels;
use crate::class_reader::pool::Pool;
use crate::jstring;
use crate::label::Label;
use crate::opcodes;
use crate::tree::{Attribute, Constant, FrameItem, TypePath, TypePathEntry};
use crate::tree::type_annotation as target;
use crate::visitor::annotation::{AnnotationVisitor, ElementValue};
use crate::visitor::class::ClassVisitor;
use crate::visitor::field::FieldVisitor;
use crate::visitor::method::MethodVisitor;
use crate::visitor::module::ModuleVisitor;

pub(crate) mod pool;
mod labels;

/// Bounds checked big endian reads at absolute offsets.
pub(crate) trait ClassBuf {
	fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]>;
	fn bytes_at(&self, offset: usize, length: usize) -> Result<&[u8]>;

	fn u8_at(&self, offset: usize) -> Result<u8> {
		Ok(u8::from_be_bytes(self.array_at(offset)?))
	}
	fn i8_at(&self, offset: usize) -> Result<i8> {
		Ok(i8::from_be_bytes(self.array_at(offset)?))
	}
	fn u16_at(&self, offset: usize) -> Result<u16> {
		Ok(u16::from_be_bytes(self.array_at(offset)?))
	}
	fn i16_at(&self, offset: usize) -> Result<i16> {
		Ok(i16::from_be_bytes(self.array_at(offset)?))
	}
	fn u32_at(&self, offset: usize) -> Result<u32> {
		Ok(u32::from_be_bytes(self.array_at(offset)?))
	}
	fn i32_at(&self, offset: usize) -> Result<i32> {
		Ok(i32::from_be_bytes(self.array_at(offset)?))
	}
	fn u64_at(&self, offset: usize) -> Result<u64> {
		Ok(u64::from_be_bytes(self.array_at(offset)?))
	}
	fn i64_at(&self, offset: usize) -> Result<i64> {
		Ok(i64::from_be_bytes(self.array_at(offset)?))
	}
}

impl ClassBuf for [u8] {
	fn array_at<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
		let bytes = self.bytes_at(offset, N)?;
		Ok(bytes.try_into().expect("bytes_at returned the requested length"))
	}
	fn bytes_at(&self, offset: usize, length: usize) -> Result<&[u8]> {
		self.get(offset..offset + length)
			.with_context(|| anyhow!("read of {length} bytes at offset {offset} is out of bounds, the class file has {} bytes", self.len()))
	}
}

/// Scratch state of one [`ClassReader::accept`] invocation. Never shared across invocations.
struct Context {
	parsing_options: u32,
	/// UTF-16 code unit scratch for the modified UTF-8 decoder, sized to the largest payload.
	char_buffer: Vec<u16>,
	/// Payload offsets of the entries of the `BootstrapMethods` attribute.
	bootstrap_method_offsets: Vec<usize>,

	current_method_access: u32,
	current_method_name: JavaString,
	current_method_descriptor: JavaString,
	/// The label table of the method currently being read.
	labels: Labels,

	current_type_annotation_target: i32,
	current_type_annotation_path: Option<TypePath>,
	current_local_variable_annotation_range_starts: Vec<Label>,
	current_local_variable_annotation_range_ends: Vec<Label>,
	current_local_variable_annotation_range_indices: Vec<u16>,

	current_frame_offset: i32,
	current_frame_type: i32,
	current_frame_local_count: u16,
	current_frame_local_count_delta: u16,
	current_frame_local_types: Vec<FrameItem>,
	current_frame_stack_count: u16,
	current_frame_stack_types: Vec<FrameItem>,
}

impl Context {
	fn new(parsing_options: u32, max_string_length: u32) -> Context {
		Context {
			parsing_options,
			char_buffer: Vec::with_capacity(max_string_length as usize),
			bootstrap_method_offsets: Vec::new(),
			current_method_access: 0,
			current_method_name: JavaString::new(),
			current_method_descriptor: JavaString::new(),
			labels: Labels::new(1),
			current_type_annotation_target: 0,
			current_type_annotation_path: None,
			current_local_variable_annotation_range_starts: Vec::new(),
			current_local_variable_annotation_range_ends: Vec::new(),
			current_local_variable_annotation_range_indices: Vec::new(),
			current_frame_offset: -1,
			current_frame_type: 0,
			current_frame_local_count: 0,
			current_frame_local_count_delta: 0,
			current_frame_local_types: Vec::new(),
			current_frame_stack_count: 0,
			current_frame_stack_types: Vec::new(),
		}
	}
}

/// Which of the two frame scratch arrays a `verification_type_info` goes into.
#[derive(Copy, Clone)]
enum FrameSlot {
	Local,
	Stack,
}

fn set_frame_item(items: &mut Vec<FrameItem>, index: usize, item: FrameItem) {
	if index >= items.len() {
		items.resize(index + 1, FrameItem::Top);
	}
	items[index] = item;
}

/// A parser that makes a [`ClassVisitor`] visit a `ClassFile` structure, as defined in the Java
/// Virtual Machine Specification. It parses the content of the byte buffer and calls the
/// appropriate visit methods of a given visitor for each field, method and bytecode instruction
/// encountered.
#[derive(Debug)]
pub struct ClassReader<'a> {
	b: &'a [u8],
	pool: Pool,
}

impl<'a> ClassReader<'a> {
	/// Indexes the constant pool of `class_file`. Fails for class files newer than major
	/// version 54 and for corrupt constant pools, see [`ClassFormatError`].
	pub fn new(class_file: &'a [u8]) -> Result<ClassReader<'a>> {
		let pool = Pool::parse(class_file)?;
		Ok(ClassReader { b: class_file, pool })
	}

	fn header(&self) -> usize {
		self.pool.header()
	}

	/// The raw access flags of the class. This value may not reflect `Deprecated` and
	/// `Synthetic` flags when the bytecode is before 1.5 and those flags are represented by
	/// attributes; [`ClassVisitor::visit`] receives the folded in value.
	pub fn access(&self) -> Result<u16> {
		self.b.u16_at(self.header())
	}

	/// The internal name of the class.
	pub fn class_name(&self) -> Result<JavaString> {
		let mut units = Vec::new();
		Ok(self.class_at(self.header() + 2, &mut units)?
			.with_context(|| anyhow!("the class has no name"))?
			.to_owned())
	}

	/// The internal name of the super class, `None` for `java/lang/Object`.
	pub fn super_name(&self) -> Result<Option<JavaString>> {
		let mut units = Vec::new();
		Ok(self.class_at(self.header() + 4, &mut units)?.map(|name| name.to_owned()))
	}

	/// The internal names of the directly implemented interfaces.
	pub fn interfaces(&self) -> Result<Vec<JavaString>> {
		let mut units = Vec::new();
		let mut current_offset = self.header() + 6;
		let interfaces_count = self.b.u16_at(current_offset)?;
		let mut interfaces = Vec::with_capacity(interfaces_count as usize);
		for _ in 0..interfaces_count {
			current_offset += 2;
			let interface = self.class_at(current_offset, &mut units)?
				.with_context(|| anyhow!("interface entry without a name"))?;
			interfaces.push(interface.to_owned());
		}
		Ok(interfaces)
	}

	/// The number of constant pool index slots, one more than the number of usable entries.
	pub fn item_count(&self) -> u16 {
		self.pool.item_count()
	}

	/// The payload length of the longest `Utf8` constant pool entry.
	pub fn max_string_length(&self) -> u32 {
		self.pool.max_string_length()
	}

	/// Decodes the loadable constant pool entry at `index`.
	pub fn read_const(&self, index: u16) -> Result<Constant> {
		let mut units = Vec::new();
		self.pool.constant(self.b, index, &mut units)
	}

	// The small read helpers below take the buffer offset of a constant pool *index* and follow
	// it; `optional` variants treat index zero as absent.

	fn utf8_at<'p>(&'p self, offset: usize, units: &mut Vec<u16>) -> Result<&'p JavaStr> {
		self.pool.utf8(self.b, self.b.u16_at(offset)?, units)
	}

	fn optional_utf8_at<'p>(&'p self, offset: usize, units: &mut Vec<u16>) -> Result<Option<&'p JavaStr>> {
		self.pool.optional_utf8(self.b, self.b.u16_at(offset)?, units)
	}

	/// Follows a `Class`, `Module` or `Package` entry to its name.
	fn class_at<'p>(&'p self, offset: usize, units: &mut Vec<u16>) -> Result<Option<&'p JavaStr>> {
		self.pool.optional_name(self.b, self.b.u16_at(offset)?, units)
	}

	fn required_class_at<'p>(&'p self, offset: usize, units: &mut Vec<u16>) -> Result<&'p JavaStr> {
		self.class_at(offset, units)?
			.with_context(|| anyhow!("constant pool index at offset {offset} must not be zero"))
	}

	/// The offset of the `attributes_count` of the class, behind all fields and methods.
	fn first_attribute_offset(&self) -> Result<usize> {
		let b = self.b;
		let mut current_offset = self.header() + 8 + b.u16_at(self.header() + 6)? as usize * 2;

		// fields and methods have the same shape
		for _ in 0..2 {
			let member_count = b.u16_at(current_offset)?;
			current_offset += 2;
			for _ in 0..member_count {
				let attributes_count = b.u16_at(current_offset + 6)?;
				current_offset += 8;
				for _ in 0..attributes_count {
					current_offset += 6 + b.u32_at(current_offset + 2)? as usize;
				}
			}
		}

		Ok(current_offset)
	}

	/// Makes `visitor` visit the class file, driven in the canonical event order.
	///
	/// `parsing_options` is an OR of [`crate::SKIP_CODE`], [`crate::SKIP_DEBUG`],
	/// [`crate::SKIP_FRAMES`], [`crate::EXPAND_FRAMES`] and [`crate::EXPAND_ASM_INSNS`].
	pub fn accept(&self, visitor: &mut dyn ClassVisitor, parsing_options: u32) -> Result<()> {
		let b = self.b;
		let mut context = Context::new(parsing_options, self.pool.max_string_length());
		let ctx = &mut context;

		let mut access_flags = b.u16_at(self.header())? as u32;
		let this_class = self.required_class_at(self.header() + 2, &mut ctx.char_buffer)?;
		let super_class = self.class_at(self.header() + 4, &mut ctx.char_buffer)?;
		let interfaces = self.interfaces()?;

		// scan the class attributes before emitting anything, the canonical event order differs
		// from the order attributes happen to be stored in
		let mut inner_classes_offset = 0;
		let mut enclosing_method_offset = 0;
		let mut signature = None;
		let mut source_file = None;
		let mut source_debug_extension: Option<JavaString> = None;
		let mut runtime_visible_annotations_offset = 0;
		let mut runtime_invisible_annotations_offset = 0;
		let mut runtime_visible_type_annotations_offset = 0;
		let mut runtime_invisible_type_annotations_offset = 0;
		let mut module_offset = 0;
		let mut module_packages_offset = 0;
		let mut module_main_class = None;
		let mut attributes = Vec::new();

		let attributes_count_offset = self.first_attribute_offset()?;
		let attributes_count = b.u16_at(attributes_count_offset)?;
		let mut current_attribute_offset = attributes_count_offset + 2;
		for _ in 0..attributes_count {
			let attribute_name = self.pool.utf8_bytes(b, b.u16_at(current_attribute_offset)?)?;
			let attribute_length = b.u32_at(current_attribute_offset + 2)? as usize;
			current_attribute_offset += 6;

			match attribute_name {
				attribute::SOURCE_FILE => {
					source_file = self.optional_utf8_at(current_attribute_offset, &mut ctx.char_buffer)?;
				},
				attribute::INNER_CLASSES => inner_classes_offset = current_attribute_offset,
				attribute::ENCLOSING_METHOD => enclosing_method_offset = current_attribute_offset,
				attribute::SIGNATURE => {
					signature = self.optional_utf8_at(current_attribute_offset, &mut ctx.char_buffer)?;
				},
				attribute::RUNTIME_VISIBLE_ANNOTATIONS => runtime_visible_annotations_offset = current_attribute_offset,
				attribute::RUNTIME_VISIBLE_TYPE_ANNOTATIONS => runtime_visible_type_annotations_offset = current_attribute_offset,
				attribute::DEPRECATED => access_flags |= opcodes::ACC_DEPRECATED,
				attribute::SYNTHETIC => access_flags |= opcodes::ACC_SYNTHETIC,
				attribute::SOURCE_DEBUG_EXTENSION => {
					let content = b.bytes_at(current_attribute_offset, attribute_length)?;
					source_debug_extension = Some(jstring::decode_modified_utf8(content, &mut ctx.char_buffer));
				},
				attribute::RUNTIME_INVISIBLE_ANNOTATIONS => runtime_invisible_annotations_offset = current_attribute_offset,
				attribute::RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => runtime_invisible_type_annotations_offset = current_attribute_offset,
				attribute::MODULE => module_offset = current_attribute_offset,
				attribute::MODULE_MAIN_CLASS => {
					module_main_class = self.class_at(current_attribute_offset, &mut ctx.char_buffer)?;
				},
				attribute::MODULE_PACKAGES => module_packages_offset = current_attribute_offset,
				attribute::BOOTSTRAP_METHODS => {
					let num_bootstrap_methods = b.u16_at(current_attribute_offset)?;
					let mut current_bootstrap_method_offset = current_attribute_offset + 2;
					for _ in 0..num_bootstrap_methods {
						ctx.bootstrap_method_offsets.push(current_bootstrap_method_offset);
						current_bootstrap_method_offset += 4 + b.u16_at(current_bootstrap_method_offset + 2)? as usize * 2;
					}
				},
				_ => attributes.push(self.read_attribute(current_attribute_offset, attribute_length, &mut ctx.char_buffer)?),
			}
			current_attribute_offset += attribute_length;
		}

		// the minor and major version sit just before the first constant pool entry
		let version_offset = self.pool.offset(1).map_or(4, |offset| offset - 7);
		let version = b.u32_at(version_offset)?;

		visitor.visit(version, access_flags, this_class, signature, super_class, &interfaces)?;

		if parsing_options & SKIP_DEBUG == 0 && (source_file.is_some() || source_debug_extension.is_some()) {
			visitor.visit_source(source_file, source_debug_extension.as_deref())?;
		}

		if module_offset != 0 {
			self.read_module(visitor, ctx, module_offset, module_packages_offset, module_main_class)?;
		}

		if enclosing_method_offset != 0 {
			let owner = self.required_class_at(enclosing_method_offset, &mut ctx.char_buffer)?;
			let method_index = b.u16_at(enclosing_method_offset + 2)?;
			let (name, descriptor) = if method_index == 0 {
				(None, None)
			} else {
				let name_and_type_offset = self.pool.offset(method_index)?;
				let name = self.utf8_at(name_and_type_offset, &mut ctx.char_buffer)?;
				let descriptor = self.utf8_at(name_and_type_offset + 2, &mut ctx.char_buffer)?;
				(Some(name), Some(descriptor))
			};
			visitor.visit_outer_class(owner, name, descriptor)?;
		}

		if runtime_visible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_annotation(annotation_descriptor, true)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_annotation(annotation_descriptor, false)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_visible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					true,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					false,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		for attribute in attributes.into_iter().rev() {
			visitor.visit_attribute(attribute)?;
		}

		if inner_classes_offset != 0 {
			let number_of_classes = b.u16_at(inner_classes_offset)?;
			let mut current_classes_offset = inner_classes_offset + 2;
			for _ in 0..number_of_classes {
				let name = self.class_at(current_classes_offset, &mut ctx.char_buffer)?;
				let outer_name = self.class_at(current_classes_offset + 2, &mut ctx.char_buffer)?;
				let inner_name = self.optional_utf8_at(current_classes_offset + 4, &mut ctx.char_buffer)?;
				let inner_access = b.u16_at(current_classes_offset + 6)?;
				visitor.visit_inner_class(name, outer_name, inner_name, inner_access)?;
				current_classes_offset += 8;
			}
		}

		let mut current_offset = self.header() + 8 + b.u16_at(self.header() + 6)? as usize * 2;
		let fields_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..fields_count {
			current_offset = self.read_field(visitor, ctx, current_offset)?;
		}
		let methods_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..methods_count {
			current_offset = self.read_method(visitor, ctx, current_offset)?;
		}

		visitor.visit_end()
	}

	fn read_attribute(&self, offset: usize, length: usize, units: &mut Vec<u16>) -> Result<Attribute> {
		// the name index sits six bytes before the content
		let name = self.utf8_at(offset - 6, units)?.to_owned();
		trace!("keeping unknown attribute {name} opaque ({length} bytes)");
		Ok(Attribute {
			name,
			content: self.b.bytes_at(offset, length)?.to_vec(),
		})
	}
}

// ------------------------------------------------------------------------------------------------
// fields and methods
// ------------------------------------------------------------------------------------------------

impl<'a> ClassReader<'a> {
	/// Reads the `field_info` at `field_info_offset` and drives the field visitor, if any.
	/// Returns the offset of the first byte past the structure.
	fn read_field(&self, visitor: &mut dyn ClassVisitor, ctx: &mut Context, field_info_offset: usize) -> Result<usize> {
		let b = self.b;
		let mut access_flags = b.u16_at(field_info_offset)? as u32;
		let name = self.utf8_at(field_info_offset + 2, &mut ctx.char_buffer)?;
		let descriptor = self.utf8_at(field_info_offset + 4, &mut ctx.char_buffer)?;
		let mut current_offset = field_info_offset + 6;

		let mut constant_value = None;
		let mut signature = None;
		let mut runtime_visible_annotations_offset = 0;
		let mut runtime_invisible_annotations_offset = 0;
		let mut runtime_visible_type_annotations_offset = 0;
		let mut runtime_invisible_type_annotations_offset = 0;
		let mut attributes = Vec::new();

		let attributes_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..attributes_count {
			let attribute_name = self.pool.utf8_bytes(b, b.u16_at(current_offset)?)?;
			let attribute_length = b.u32_at(current_offset + 2)? as usize;
			current_offset += 6;

			match attribute_name {
				attribute::CONSTANT_VALUE => {
					let constant_value_index = b.u16_at(current_offset)?;
					constant_value = if constant_value_index == 0 {
						None
					} else {
						Some(self.pool.constant(b, constant_value_index, &mut ctx.char_buffer)?)
					};
				},
				attribute::SIGNATURE => {
					signature = self.optional_utf8_at(current_offset, &mut ctx.char_buffer)?;
				},
				attribute::DEPRECATED => access_flags |= opcodes::ACC_DEPRECATED,
				attribute::SYNTHETIC => access_flags |= opcodes::ACC_SYNTHETIC,
				attribute::RUNTIME_VISIBLE_ANNOTATIONS => runtime_visible_annotations_offset = current_offset,
				attribute::RUNTIME_INVISIBLE_ANNOTATIONS => runtime_invisible_annotations_offset = current_offset,
				attribute::RUNTIME_VISIBLE_TYPE_ANNOTATIONS => runtime_visible_type_annotations_offset = current_offset,
				attribute::RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => runtime_invisible_type_annotations_offset = current_offset,
				_ => attributes.push(self.read_attribute(current_offset, attribute_length, &mut ctx.char_buffer)?),
			}
			current_offset += attribute_length;
		}

		let Some(field_visitor) = visitor.visit_field(access_flags, name, descriptor, signature, constant_value.as_ref())? else {
			return Ok(current_offset);
		};

		if runtime_visible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = field_visitor.visit_annotation(annotation_descriptor, true)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = field_visitor.visit_annotation(annotation_descriptor, false)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_visible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = field_visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					true,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = field_visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					false,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		for attribute in attributes.into_iter().rev() {
			field_visitor.visit_attribute(attribute)?;
		}

		field_visitor.visit_end()?;
		Ok(current_offset)
	}

	/// Reads the `method_info` at `method_info_offset` and drives the method visitor, if any.
	/// Returns the offset of the first byte past the structure.
	fn read_method(&self, visitor: &mut dyn ClassVisitor, ctx: &mut Context, method_info_offset: usize) -> Result<usize> {
		let b = self.b;
		let mut access_flags = b.u16_at(method_info_offset)? as u32;
		let name = self.utf8_at(method_info_offset + 2, &mut ctx.char_buffer)?;
		let descriptor = self.utf8_at(method_info_offset + 4, &mut ctx.char_buffer)?;
		ctx.current_method_name = name.to_owned();
		ctx.current_method_descriptor = descriptor.to_owned();
		let mut current_offset = method_info_offset + 6;

		let mut code_offset = 0;
		let mut exceptions_offset = 0;
		let mut signature = None;
		let mut runtime_visible_annotations_offset = 0;
		let mut runtime_invisible_annotations_offset = 0;
		let mut runtime_visible_type_annotations_offset = 0;
		let mut runtime_invisible_type_annotations_offset = 0;
		let mut runtime_visible_parameter_annotations_offset = 0;
		let mut runtime_invisible_parameter_annotations_offset = 0;
		let mut annotation_default_offset = 0;
		let mut method_parameters_offset = 0;
		let mut attributes = Vec::new();

		let attributes_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..attributes_count {
			let attribute_name = self.pool.utf8_bytes(b, b.u16_at(current_offset)?)?;
			let attribute_length = b.u32_at(current_offset + 2)? as usize;
			current_offset += 6;

			match attribute_name {
				attribute::CODE => {
					if ctx.parsing_options & SKIP_CODE == 0 {
						code_offset = current_offset;
					}
				},
				attribute::EXCEPTIONS => exceptions_offset = current_offset,
				attribute::SIGNATURE => {
					signature = self.optional_utf8_at(current_offset, &mut ctx.char_buffer)?;
				},
				attribute::DEPRECATED => access_flags |= opcodes::ACC_DEPRECATED,
				attribute::SYNTHETIC => access_flags |= opcodes::ACC_SYNTHETIC,
				attribute::RUNTIME_VISIBLE_ANNOTATIONS => runtime_visible_annotations_offset = current_offset,
				attribute::RUNTIME_INVISIBLE_ANNOTATIONS => runtime_invisible_annotations_offset = current_offset,
				attribute::RUNTIME_VISIBLE_TYPE_ANNOTATIONS => runtime_visible_type_annotations_offset = current_offset,
				attribute::RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => runtime_invisible_type_annotations_offset = current_offset,
				attribute::RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS => runtime_visible_parameter_annotations_offset = current_offset,
				attribute::RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => runtime_invisible_parameter_annotations_offset = current_offset,
				attribute::ANNOTATION_DEFAULT => annotation_default_offset = current_offset,
				attribute::METHOD_PARAMETERS => method_parameters_offset = current_offset,
				_ => attributes.push(self.read_attribute(current_offset, attribute_length, &mut ctx.char_buffer)?),
			}
			current_offset += attribute_length;
		}
		ctx.current_method_access = access_flags;

		let exceptions = if exceptions_offset == 0 {
			Vec::new()
		} else {
			let number_of_exceptions = b.u16_at(exceptions_offset)?;
			let mut exceptions = Vec::with_capacity(number_of_exceptions as usize);
			let mut current_exception_offset = exceptions_offset + 2;
			for _ in 0..number_of_exceptions {
				exceptions.push(self.required_class_at(current_exception_offset, &mut ctx.char_buffer)?.to_owned());
				current_exception_offset += 2;
			}
			exceptions
		};

		let Some(method_visitor) = visitor.visit_method(access_flags, name, descriptor, signature, &exceptions)? else {
			return Ok(current_offset);
		};

		if method_parameters_offset != 0 && ctx.parsing_options & SKIP_DEBUG == 0 {
			let parameters_count = b.u8_at(method_parameters_offset)?;
			let mut current_parameter_offset = method_parameters_offset + 1;
			for _ in 0..parameters_count {
				let parameter_name = self.optional_utf8_at(current_parameter_offset, &mut ctx.char_buffer)?;
				let parameter_access = b.u16_at(current_parameter_offset + 2)?;
				method_visitor.visit_parameter(parameter_name, parameter_access)?;
				current_parameter_offset += 4;
			}
		}

		if annotation_default_offset != 0 {
			let mut annotation_visitor = method_visitor.visit_annotation_default()?;
			self.read_element_value(&mut annotation_visitor, annotation_default_offset, None, ctx)?;
			if let Some(annotation_visitor) = annotation_visitor {
				annotation_visitor.visit_end()?;
			}
		}

		if runtime_visible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = method_visitor.visit_annotation(annotation_descriptor, true)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_annotations_offset + 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = method_visitor.visit_annotation(annotation_descriptor, false)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_visible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_visible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_visible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = method_visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					true,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_invisible_type_annotations_offset != 0 {
			let num_annotations = b.u16_at(runtime_invisible_type_annotations_offset)?;
			let mut current_annotation_offset = runtime_invisible_type_annotations_offset + 2;
			for _ in 0..num_annotations {
				current_annotation_offset = self.read_type_annotation_target(ctx, current_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = method_visitor.visit_type_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					false,
				)?;
				current_annotation_offset = self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
			}
		}

		if runtime_visible_parameter_annotations_offset != 0 {
			self.read_parameter_annotations(method_visitor, ctx, runtime_visible_parameter_annotations_offset, true)?;
		}

		if runtime_invisible_parameter_annotations_offset != 0 {
			self.read_parameter_annotations(method_visitor, ctx, runtime_invisible_parameter_annotations_offset, false)?;
		}

		for attribute in attributes.into_iter().rev() {
			method_visitor.visit_attribute(attribute)?;
		}

		if code_offset != 0 {
			method_visitor.visit_code()?;
			self.read_code(method_visitor, ctx, code_offset)
				.with_context(|| anyhow!("failed to read the code of method {:?} {:?}", ctx.current_method_name, ctx.current_method_descriptor))?;
		}

		method_visitor.visit_end()?;
		Ok(current_offset)
	}

	fn read_parameter_annotations(&self, method_visitor: &mut dyn MethodVisitor, ctx: &mut Context, runtime_parameter_annotations_offset: usize, visible: bool) -> Result<()> {
		let b = self.b;
		let parameters_count = b.u8_at(runtime_parameter_annotations_offset)?;
		method_visitor.visit_annotable_parameter_count(parameters_count, visible)?;
		let mut current_offset = runtime_parameter_annotations_offset + 1;
		for parameter in 0..parameters_count {
			let num_annotations = b.u16_at(current_offset)?;
			current_offset += 2;
			for _ in 0..num_annotations {
				let annotation_descriptor = self.utf8_at(current_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = method_visitor.visit_parameter_annotation(parameter, annotation_descriptor, visible)?;
				current_offset = self.read_element_values(annotation_visitor, current_offset + 2, true, ctx)?;
			}
		}
		Ok(())
	}
}

// ------------------------------------------------------------------------------------------------
// the Code attribute
// ------------------------------------------------------------------------------------------------

/// The absolute bytecode offset a branch with displacement `branch` lands on. Targets past the
/// code are rejected when the label is created.
fn branch_target(bytecode_offset: u16, branch: i32) -> Result<u16> {
	u16::try_from(bytecode_offset as i32 + branch)
		.map_err(|_| anyhow!("branch from bytecode offset {bytecode_offset} with displacement {branch} leaves the code"))
}

/// The bytecode offset targeted by the type annotation at `type_annotation_offsets[index]`,
/// `None` when the index is past the end or the annotation does not target an instruction.
fn type_annotation_bytecode_offset(b: &[u8], type_annotation_offsets: &[usize], index: usize) -> Result<Option<u16>> {
	match type_annotation_offsets.get(index) {
		Some(&offset) if b.u8_at(offset)? >= target::INSTANCEOF => Ok(Some(b.u16_at(offset + 1)?)),
		_ => Ok(None),
	}
}

impl<'a> ClassReader<'a> {
	/// Reads the content of a `Code` attribute (starting at `max_stack`) and drives the method
	/// visitor through it: two passes over the bytecode, the first to materialise the labels,
	/// the second to decode and emit the instructions.
	fn read_code(&self, visitor: &mut dyn MethodVisitor, ctx: &mut Context, code_offset: usize) -> Result<()> {
		let b = self.b;
		let parsing_options = ctx.parsing_options;

		let max_stack = b.u16_at(code_offset)?;
		let max_locals = b.u16_at(code_offset + 2)?;
		let code_length = b.u32_at(code_offset + 4)?;
		if code_length == 0 || code_length > u16::MAX as u32 {
			bail!("code_length must be greater than zero and less than 65536, got {code_length}");
		}
		let code_length = code_length as u16;
		let bytecode_start_offset = code_offset + 8;
		let bytecode_end_offset = bytecode_start_offset + code_length as usize;
		ctx.labels = Labels::new(code_length);

		// First pass: find the labels. Each branch, switch and reserved-opcode target becomes a
		// label; everything else is only stepped over by its width.
		let mut current_offset = bytecode_start_offset;
		while current_offset < bytecode_end_offset {
			let bytecode_offset = (current_offset - bytecode_start_offset) as u16;
			let opcode = b.u8_at(current_offset)?;
			match opcode {
				opcodes::NOP..=opcodes::DCONST_1 |
				opcodes::ILOAD_0..=opcodes::SALOAD |
				opcodes::ISTORE_0..=opcodes::LXOR |
				opcodes::I2L..=opcodes::DCMPG |
				opcodes::IRETURN..=opcodes::RETURN |
				opcodes::ARRAYLENGTH | opcodes::ATHROW |
				opcodes::MONITORENTER | opcodes::MONITOREXIT => current_offset += 1,
				opcodes::BIPUSH | opcodes::LDC |
				opcodes::ILOAD..=opcodes::ALOAD |
				opcodes::ISTORE..=opcodes::ASTORE |
				opcodes::RET | opcodes::NEWARRAY => current_offset += 2,
				opcodes::SIPUSH | opcodes::LDC_W | opcodes::LDC2_W | opcodes::IINC |
				opcodes::GETSTATIC..=opcodes::INVOKESTATIC |
				opcodes::NEW | opcodes::ANEWARRAY |
				opcodes::CHECKCAST | opcodes::INSTANCEOF => current_offset += 3,
				opcodes::IFEQ..=opcodes::JSR |
				opcodes::IFNULL | opcodes::IFNONNULL => {
					ctx.labels.create(branch_target(bytecode_offset, b.i16_at(current_offset + 1)? as i32)?)?;
					current_offset += 3;
				},
				ASM_IFEQ..=ASM_IFNONNULL => {
					// reserved opcodes carry unsigned offsets, they only ever jump forwards
					ctx.labels.create(branch_target(bytecode_offset, b.u16_at(current_offset + 1)? as i32)?)?;
					current_offset += 3;
				},
				opcodes::GOTO_W | opcodes::JSR_W | ASM_GOTO_W => {
					ctx.labels.create(branch_target(bytecode_offset, b.i32_at(current_offset + 1)?)?)?;
					current_offset += 5;
				},
				opcodes::TABLESWITCH => {
					current_offset += 4 - (bytecode_offset as usize & 3);
					ctx.labels.create(branch_target(bytecode_offset, b.i32_at(current_offset)?)?)?;
					let low = b.i32_at(current_offset + 4)?;
					let high = b.i32_at(current_offset + 8)?;
					current_offset += 12;
					// high below low leaves only the default target
					let num_table_entries = (high as i64 - low as i64 + 1).max(0);
					for _ in 0..num_table_entries {
						ctx.labels.create(branch_target(bytecode_offset, b.i32_at(current_offset)?)?)?;
						current_offset += 4;
					}
				},
				opcodes::LOOKUPSWITCH => {
					current_offset += 4 - (bytecode_offset as usize & 3);
					ctx.labels.create(branch_target(bytecode_offset, b.i32_at(current_offset)?)?)?;
					let num_pairs = b.i32_at(current_offset + 4)?;
					if num_pairs < 0 {
						bail!("lookupswitch with negative npairs {num_pairs}");
					}
					current_offset += 8;
					for _ in 0..num_pairs {
						ctx.labels.create(branch_target(bytecode_offset, b.i32_at(current_offset + 4)?)?)?;
						current_offset += 8;
					}
				},
				opcodes::INVOKEINTERFACE | opcodes::INVOKEDYNAMIC => current_offset += 5,
				opcodes::WIDE => match b.u8_at(current_offset + 1)? {
					opcodes::IINC => current_offset += 6,
					opcodes::ILOAD..=opcodes::ALOAD |
					opcodes::ISTORE..=opcodes::ASTORE |
					opcodes::RET => current_offset += 4,
					wide_opcode => return Err(ClassFormatError::UnknownOpcode { opcode: wide_opcode, bytecode_offset }.into()),
				},
				opcodes::MULTIANEWARRAY => current_offset += 4,
				opcode => return Err(ClassFormatError::UnknownOpcode { opcode, bytecode_offset }.into()),
			}
		}

		// The exception table entries are emitted right away: the visitor contract wants them
		// before the first visit of any of their labels.
		let mut current_offset = bytecode_end_offset;
		let exception_table_length = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..exception_table_length {
			let start = ctx.labels.create(b.u16_at(current_offset)?)?;
			let end = ctx.labels.create(b.u16_at(current_offset + 2)?)?;
			let handler = ctx.labels.create(b.u16_at(current_offset + 4)?)?;
			let catch_type = self.pool.optional_name(b, b.u16_at(current_offset + 6)?, &mut ctx.char_buffer)?;
			visitor.visit_try_catch_block(start, end, handler, catch_type)?;
			current_offset += 8;
		}

		let mut stack_map_frame_offset = 0;
		let mut stack_map_table_end_offset = 0;
		let mut compressed_frames = true;
		let mut local_variable_table_offset = 0;
		let mut local_variable_type_table_offset = 0;
		let mut visible_type_annotation_offsets = Vec::new();
		let mut invisible_type_annotation_offsets = Vec::new();
		let mut attributes = Vec::new();

		let attributes_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..attributes_count {
			let attribute_name = self.pool.utf8_bytes(b, b.u16_at(current_offset)?)?;
			let attribute_length = b.u32_at(current_offset + 2)? as usize;
			current_offset += 6;

			match attribute_name {
				attribute::LOCAL_VARIABLE_TABLE => {
					if parsing_options & SKIP_DEBUG == 0 {
						local_variable_table_offset = current_offset;
						let table_length = b.u16_at(current_offset)?;
						let mut current_entry_offset = current_offset + 2;
						for _ in 0..table_length {
							let start_pc = b.u16_at(current_entry_offset)?;
							let length = b.u16_at(current_entry_offset + 2)?;
							ctx.labels.create_debug(start_pc)?;
							ctx.labels.create_debug(start_pc.checked_add(length).context("local variable range leaves the code")?)?;
							current_entry_offset += 10;
						}
					}
				},
				attribute::LOCAL_VARIABLE_TYPE_TABLE => {
					if parsing_options & SKIP_DEBUG == 0 {
						local_variable_type_table_offset = current_offset;
					}
				},
				attribute::LINE_NUMBER_TABLE => {
					if parsing_options & SKIP_DEBUG == 0 {
						let table_length = b.u16_at(current_offset)?;
						let mut current_entry_offset = current_offset + 2;
						for _ in 0..table_length {
							let start_pc = b.u16_at(current_entry_offset)?;
							let line_number = b.u16_at(current_entry_offset + 2)?;
							let label = ctx.labels.create_debug(start_pc)?;
							ctx.labels.arena.add_line_number(label, line_number);
							current_entry_offset += 4;
						}
					}
				},
				attribute::RUNTIME_VISIBLE_TYPE_ANNOTATIONS => {
					visible_type_annotation_offsets = self.read_code_type_annotations(ctx, current_offset)?;
				},
				attribute::RUNTIME_INVISIBLE_TYPE_ANNOTATIONS => {
					invisible_type_annotation_offsets = self.read_code_type_annotations(ctx, current_offset)?;
				},
				attribute::STACK_MAP_TABLE => {
					if parsing_options & SKIP_FRAMES == 0 {
						stack_map_frame_offset = current_offset + 2;
						stack_map_table_end_offset = current_offset + attribute_length;
						compressed_frames = true;
					}
				},
				attribute::STACK_MAP => {
					if parsing_options & SKIP_FRAMES == 0 {
						// the legacy attribute stores uncompressed frames with absolute offsets
						stack_map_frame_offset = current_offset + 2;
						stack_map_table_end_offset = current_offset + attribute_length;
						compressed_frames = false;
					}
				},
				_ => attributes.push(self.read_attribute(current_offset, attribute_length, &mut ctx.char_buffer)?),
			}
			current_offset += attribute_length;
		}

		let expand_frames = parsing_options & EXPAND_FRAMES != 0;
		if stack_map_frame_offset != 0 {
			ctx.current_frame_offset = -1;
			ctx.current_frame_type = 0;
			ctx.current_frame_local_count = 0;
			ctx.current_frame_local_count_delta = 0;
			ctx.current_frame_local_types.clear();
			ctx.current_frame_stack_count = 0;
			ctx.current_frame_stack_types.clear();
			if expand_frames {
				self.compute_implicit_frame(ctx)?;
			}
			// Find the labels of NEW instructions referenced by uninitialized stack map items.
			// The tag byte cannot be told apart without decoding every frame, so every candidate
			// position is probed instead.
			for offset in stack_map_frame_offset..stack_map_table_end_offset.saturating_sub(2) {
				if b.u8_at(offset)? == item::UNINITIALIZED {
					let potential_bytecode_offset = b.u16_at(offset + 1)?;
					if (potential_bytecode_offset as usize) < code_length as usize
						&& b.u8_at(bytecode_start_offset + potential_bytecode_offset as usize)? == opcodes::NEW {
						ctx.labels.create(potential_bytecode_offset)?;
					}
				}
			}
		}

		// second pass
		let mut current_visible_type_annotation_index = 0;
		let mut current_visible_type_annotation_bytecode_offset =
			type_annotation_bytecode_offset(b, &visible_type_annotation_offsets, 0)?;
		let mut current_invisible_type_annotation_index = 0;
		let mut current_invisible_type_annotation_bytecode_offset =
			type_annotation_bytecode_offset(b, &invisible_type_annotation_offsets, 0)?;

		let mut insert_frame = false;
		let wide_jump_opcode_delta = if parsing_options & EXPAND_ASM_INSNS == 0 { WIDE_JUMP_OPCODE_DELTA } else { 0 };

		let mut current_offset = bytecode_start_offset;
		while current_offset < bytecode_end_offset {
			let current_bytecode_offset = (current_offset - bytecode_start_offset) as u16;

			if let Some(label) = ctx.labels.get(current_bytecode_offset) {
				ctx.labels.arena.accept(label, visitor, parsing_options & SKIP_DEBUG == 0)?;
			}

			while stack_map_frame_offset != 0
				&& (ctx.current_frame_offset == current_bytecode_offset as i32 || ctx.current_frame_offset == -1) {
				if ctx.current_frame_offset != -1 {
					if !compressed_frames || expand_frames {
						let local_count = ctx.current_frame_local_count;
						let stack_count = ctx.current_frame_stack_count;
						let local = ctx.current_frame_local_types.get(..local_count as usize)
							.with_context(|| anyhow!("stack map frame declares {local_count} locals"))?;
						let stack = ctx.current_frame_stack_types.get(..stack_count as usize)
							.with_context(|| anyhow!("stack map frame declares {stack_count} stack items"))?;
						visitor.visit_frame(opcodes::F_NEW, local_count, local, stack_count, stack)?;
					} else {
						let local_count_delta = ctx.current_frame_local_count_delta;
						let local = if ctx.current_frame_type == opcodes::F_CHOP {
							&[][..]
						} else {
							&ctx.current_frame_local_types[..local_count_delta as usize]
						};
						visitor.visit_frame(
							ctx.current_frame_type,
							local_count_delta,
							local,
							ctx.current_frame_stack_count,
							&ctx.current_frame_stack_types[..ctx.current_frame_stack_count as usize],
						)?;
					}
					// there is a frame for this offset, no need to insert one
					insert_frame = false;
				}
				if stack_map_frame_offset < stack_map_table_end_offset {
					stack_map_frame_offset = self.read_stack_map_frame(ctx, stack_map_frame_offset, compressed_frames, expand_frames)?;
				} else {
					stack_map_frame_offset = 0;
				}
			}
			if insert_frame {
				if expand_frames {
					visitor.visit_frame(opcodes::F_INSERT, 0, &[], 0, &[])?;
				}
				insert_frame = false;
			}

			let opcode = b.u8_at(current_offset)?;
			match opcode {
				opcodes::NOP..=opcodes::DCONST_1 |
				opcodes::IALOAD..=opcodes::SALOAD |
				opcodes::IASTORE..=opcodes::SASTORE |
				opcodes::POP..=opcodes::LXOR |
				opcodes::I2L..=opcodes::DCMPG |
				opcodes::IRETURN..=opcodes::RETURN |
				opcodes::ARRAYLENGTH | opcodes::ATHROW |
				opcodes::MONITORENTER | opcodes::MONITOREXIT => {
					visitor.visit_insn(opcode)?;
					current_offset += 1;
				},
				opcodes::ILOAD_0..=opcodes::ALOAD_3 => {
					let shifted = opcode - opcodes::ILOAD_0;
					visitor.visit_var_insn(opcodes::ILOAD + (shifted >> 2), (shifted & 0x3) as u16)?;
					current_offset += 1;
				},
				opcodes::ISTORE_0..=opcodes::ASTORE_3 => {
					let shifted = opcode - opcodes::ISTORE_0;
					visitor.visit_var_insn(opcodes::ISTORE + (shifted >> 2), (shifted & 0x3) as u16)?;
					current_offset += 1;
				},
				opcodes::IFEQ..=opcodes::JSR |
				opcodes::IFNULL | opcodes::IFNONNULL => {
					let target = branch_target(current_bytecode_offset, b.i16_at(current_offset + 1)? as i32)?;
					visitor.visit_jump_insn(opcode, ctx.labels.try_get(target)?)?;
					current_offset += 3;
				},
				opcodes::GOTO_W | opcodes::JSR_W => {
					let target = branch_target(current_bytecode_offset, b.i32_at(current_offset + 1)?)?;
					visitor.visit_jump_insn(opcode - wide_jump_opcode_delta, ctx.labels.try_get(target)?)?;
					current_offset += 5;
				},
				ASM_IFEQ..=ASM_IFNONNULL => {
					// A forward jump whose displacement overflowed the signed two byte field when
					// the class was last written. The offset here is unsigned; conditionals are
					// replaced by their inverse jumping over a goto_w to the real target.
					let opcode = if opcode < ASM_IFNULL {
						opcode - ASM_OPCODE_DELTA
					} else {
						opcode - ASM_IFNULL_OPCODE_DELTA
					};
					trace!("expanding reserved jump opcode at bytecode offset {current_bytecode_offset}");
					let target = branch_target(current_bytecode_offset, b.u16_at(current_offset + 1)? as i32)?;
					let target = ctx.labels.try_get(target)?;
					if opcode == opcodes::GOTO || opcode == opcodes::JSR {
						visitor.visit_jump_insn(opcode + WIDE_JUMP_OPCODE_DELTA, target)?;
					} else {
						let opcode = if opcode < opcodes::GOTO { ((opcode + 1) ^ 1) - 1 } else { opcode ^ 1 };
						let endif = ctx.labels.create(current_bytecode_offset.checked_add(3).context("jump expansion at the end of the code")?)?;
						visitor.visit_jump_insn(opcode, endif)?;
						visitor.visit_jump_insn(opcodes::GOTO_W, target)?;
					}
					// the instruction after the expansion heads a basic block without a frame
					insert_frame = true;
					current_offset += 3;
				},
				ASM_GOTO_W => {
					let target = branch_target(current_bytecode_offset, b.i32_at(current_offset + 1)?)?;
					visitor.visit_jump_insn(opcodes::GOTO_W, ctx.labels.try_get(target)?)?;
					insert_frame = true;
					current_offset += 5;
				},
				opcodes::WIDE => match b.u8_at(current_offset + 1)? {
					opcodes::IINC => {
						visitor.visit_iinc_insn(b.u16_at(current_offset + 2)?, b.i16_at(current_offset + 4)?)?;
						current_offset += 6;
					},
					wide_opcode @ (opcodes::ILOAD..=opcodes::ALOAD | opcodes::ISTORE..=opcodes::ASTORE | opcodes::RET) => {
						visitor.visit_var_insn(wide_opcode, b.u16_at(current_offset + 2)?)?;
						current_offset += 4;
					},
					wide_opcode => return Err(ClassFormatError::UnknownOpcode { opcode: wide_opcode, bytecode_offset: current_bytecode_offset }.into()),
				},
				opcodes::TABLESWITCH => {
					current_offset += 4 - (current_bytecode_offset as usize & 3);
					let default = ctx.labels.try_get(branch_target(current_bytecode_offset, b.i32_at(current_offset)?)?)?;
					let low = b.i32_at(current_offset + 4)?;
					let high = b.i32_at(current_offset + 8)?;
					current_offset += 12;
					let num_table_entries = (high as i64 - low as i64 + 1).max(0) as usize;
					let mut table = Vec::with_capacity(num_table_entries);
					for _ in 0..num_table_entries {
						table.push(ctx.labels.try_get(branch_target(current_bytecode_offset, b.i32_at(current_offset)?)?)?);
						current_offset += 4;
					}
					visitor.visit_table_switch_insn(low, high, default, &table)?;
				},
				opcodes::LOOKUPSWITCH => {
					current_offset += 4 - (current_bytecode_offset as usize & 3);
					let default = ctx.labels.try_get(branch_target(current_bytecode_offset, b.i32_at(current_offset)?)?)?;
					let num_pairs = b.i32_at(current_offset + 4)?.max(0) as usize;
					current_offset += 8;
					let mut keys = Vec::with_capacity(num_pairs);
					let mut table = Vec::with_capacity(num_pairs);
					for _ in 0..num_pairs {
						keys.push(b.i32_at(current_offset)?);
						table.push(ctx.labels.try_get(branch_target(current_bytecode_offset, b.i32_at(current_offset + 4)?)?)?);
						current_offset += 8;
					}
					visitor.visit_lookup_switch_insn(default, &keys, &table)?;
				},
				opcodes::ILOAD..=opcodes::ALOAD |
				opcodes::ISTORE..=opcodes::ASTORE |
				opcodes::RET => {
					visitor.visit_var_insn(opcode, b.u8_at(current_offset + 1)? as u16)?;
					current_offset += 2;
				},
				opcodes::BIPUSH => {
					visitor.visit_int_insn(opcode, b.i8_at(current_offset + 1)? as i32)?;
					current_offset += 2;
				},
				opcodes::SIPUSH => {
					visitor.visit_int_insn(opcode, b.i16_at(current_offset + 1)? as i32)?;
					current_offset += 3;
				},
				opcodes::NEWARRAY => {
					visitor.visit_int_insn(opcode, b.u8_at(current_offset + 1)? as i32)?;
					current_offset += 2;
				},
				opcodes::LDC => {
					let constant = self.pool.constant(b, b.u8_at(current_offset + 1)? as u16, &mut ctx.char_buffer)?;
					visitor.visit_ldc_insn(&constant)?;
					current_offset += 2;
				},
				opcodes::LDC_W | opcodes::LDC2_W => {
					let constant = self.pool.constant(b, b.u16_at(current_offset + 1)?, &mut ctx.char_buffer)?;
					visitor.visit_ldc_insn(&constant)?;
					current_offset += 3;
				},
				opcodes::GETSTATIC..=opcodes::PUTFIELD => {
					let (owner, name, descriptor, _) = self.pool.member_ref(b, b.u16_at(current_offset + 1)?, &mut ctx.char_buffer)?;
					visitor.visit_field_insn(opcode, owner, name, descriptor)?;
					current_offset += 3;
				},
				opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE => {
					let (owner, name, descriptor, is_interface) = self.pool.member_ref(b, b.u16_at(current_offset + 1)?, &mut ctx.char_buffer)?;
					visitor.visit_method_insn(opcode, owner, name, descriptor, is_interface)?;
					current_offset += if opcode == opcodes::INVOKEINTERFACE { 5 } else { 3 };
				},
				opcodes::INVOKEDYNAMIC => {
					current_offset = self.read_invoke_dynamic(visitor, ctx, current_offset)?;
				},
				opcodes::NEW | opcodes::ANEWARRAY |
				opcodes::CHECKCAST | opcodes::INSTANCEOF => {
					let type_name = self.pool.name(b, b.u16_at(current_offset + 1)?, &mut ctx.char_buffer)?;
					visitor.visit_type_insn(opcode, type_name)?;
					current_offset += 3;
				},
				opcodes::IINC => {
					visitor.visit_iinc_insn(b.u8_at(current_offset + 1)? as u16, b.i8_at(current_offset + 2)? as i16)?;
					current_offset += 3;
				},
				opcodes::MULTIANEWARRAY => {
					let descriptor = self.pool.name(b, b.u16_at(current_offset + 1)?, &mut ctx.char_buffer)?;
					visitor.visit_multi_anew_array_insn(descriptor, b.u8_at(current_offset + 3)?)?;
					current_offset += 4;
				},
				opcode => return Err(ClassFormatError::UnknownOpcode { opcode, bytecode_offset: current_bytecode_offset }.into()),
			}

			// annotations on the instruction just visited
			while current_visible_type_annotation_bytecode_offset == Some(current_bytecode_offset) {
				let type_annotation_offset = visible_type_annotation_offsets[current_visible_type_annotation_index];
				let current_annotation_offset = self.read_type_annotation_target(ctx, type_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_insn_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					true,
				)?;
				self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
				current_visible_type_annotation_index += 1;
				current_visible_type_annotation_bytecode_offset =
					type_annotation_bytecode_offset(b, &visible_type_annotation_offsets, current_visible_type_annotation_index)?;
			}
			while current_invisible_type_annotation_bytecode_offset == Some(current_bytecode_offset) {
				let type_annotation_offset = invisible_type_annotation_offsets[current_invisible_type_annotation_index];
				let current_annotation_offset = self.read_type_annotation_target(ctx, type_annotation_offset)?;
				let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
				let annotation_visitor = visitor.visit_insn_annotation(
					ctx.current_type_annotation_target,
					ctx.current_type_annotation_path.as_ref(),
					annotation_descriptor,
					false,
				)?;
				self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
				current_invisible_type_annotation_index += 1;
				current_invisible_type_annotation_bytecode_offset =
					type_annotation_bytecode_offset(b, &invisible_type_annotation_offsets, current_invisible_type_annotation_index)?;
			}
		}

		if let Some(end_label) = ctx.labels.get(code_length) {
			visitor.visit_label(end_label)?;
		}

		if local_variable_table_offset != 0 && parsing_options & SKIP_DEBUG == 0 {
			// the type table supplies the generic signatures, joined on (start_pc, index)
			struct TypeTableEntry {
				start_pc: u16,
				index: u16,
				signature_offset: usize,
			}
			let mut type_table = Vec::new();
			if local_variable_type_table_offset != 0 {
				let table_length = b.u16_at(local_variable_type_table_offset)?;
				let mut current_entry_offset = local_variable_type_table_offset + 2;
				for _ in 0..table_length {
					type_table.push(TypeTableEntry {
						start_pc: b.u16_at(current_entry_offset)?,
						index: b.u16_at(current_entry_offset + 8)?,
						signature_offset: current_entry_offset + 6,
					});
					current_entry_offset += 10;
				}
			}

			let table_length = b.u16_at(local_variable_table_offset)?;
			let mut current_entry_offset = local_variable_table_offset + 2;
			for _ in 0..table_length {
				let start_pc = b.u16_at(current_entry_offset)?;
				let length = b.u16_at(current_entry_offset + 2)?;
				let name = self.utf8_at(current_entry_offset + 4, &mut ctx.char_buffer)?;
				let descriptor = self.utf8_at(current_entry_offset + 6, &mut ctx.char_buffer)?;
				let index = b.u16_at(current_entry_offset + 8)?;
				current_entry_offset += 10;

				let signature = match type_table.iter().find(|entry| entry.start_pc == start_pc && entry.index == index) {
					Some(entry) => Some(self.utf8_at(entry.signature_offset, &mut ctx.char_buffer)?),
					None => None,
				};
				let start = ctx.labels.try_get(start_pc)?;
				let end = ctx.labels.try_get(start_pc.checked_add(length).context("local variable range leaves the code")?)?;
				visitor.visit_local_variable(name, descriptor, signature, start, end, index)?;
			}
		}

		for (type_annotation_offsets, visible) in [(&visible_type_annotation_offsets, true), (&invisible_type_annotation_offsets, false)] {
			for &type_annotation_offset in type_annotation_offsets {
				let target_type = b.u8_at(type_annotation_offset)?;
				if target_type == target::LOCAL_VARIABLE || target_type == target::RESOURCE_VARIABLE {
					let current_annotation_offset = self.read_type_annotation_target(ctx, type_annotation_offset)?;
					let annotation_descriptor = self.utf8_at(current_annotation_offset, &mut ctx.char_buffer)?;
					let annotation_visitor = visitor.visit_local_variable_annotation(
						ctx.current_type_annotation_target,
						ctx.current_type_annotation_path.as_ref(),
						&ctx.current_local_variable_annotation_range_starts,
						&ctx.current_local_variable_annotation_range_ends,
						&ctx.current_local_variable_annotation_range_indices,
						annotation_descriptor,
						visible,
					)?;
					self.read_element_values(annotation_visitor, current_annotation_offset + 2, true, ctx)?;
				}
			}
		}

		for attribute in attributes.into_iter().rev() {
			visitor.visit_attribute(attribute)?;
		}

		visitor.visit_maxs(max_stack, max_locals)
	}

	/// Resolves an invokedynamic call site: the name and descriptor from its name-and-type, the
	/// bootstrap method handle and the static arguments from the BootstrapMethods attribute of
	/// the class. Returns the offset past the instruction.
	fn read_invoke_dynamic(&self, visitor: &mut dyn MethodVisitor, ctx: &mut Context, insn_offset: usize) -> Result<usize> {
		let b = self.b;
		let entry_offset = self.pool.offset(b.u16_at(insn_offset + 1)?)?;
		let bootstrap_method_attr_index = b.u16_at(entry_offset)? as usize;
		let (name, descriptor) = self.pool.name_and_type(b, b.u16_at(entry_offset + 2)?, &mut ctx.char_buffer)?;

		let bootstrap_method_offset = *ctx.bootstrap_method_offsets.get(bootstrap_method_attr_index)
			.with_context(|| anyhow!("invokedynamic refers to bootstrap method {bootstrap_method_attr_index}, but the class has no such BootstrapMethods entry"))?;
		let handle = self.pool.method_handle(b, b.u16_at(bootstrap_method_offset)?, &mut ctx.char_buffer)?;
		let num_bootstrap_arguments = b.u16_at(bootstrap_method_offset + 2)?;
		let mut bootstrap_method_arguments = Vec::with_capacity(num_bootstrap_arguments as usize);
		for argument in 0..num_bootstrap_arguments as usize {
			let argument_index = b.u16_at(bootstrap_method_offset + 4 + argument * 2)?;
			bootstrap_method_arguments.push(self.pool.constant(b, argument_index, &mut ctx.char_buffer)?);
		}

		visitor.visit_invoke_dynamic_insn(name, descriptor, &handle, &bootstrap_method_arguments)?;
		Ok(insn_offset + 5)
	}
}

// ------------------------------------------------------------------------------------------------
// stack map frames
// ------------------------------------------------------------------------------------------------

impl<'a> ClassReader<'a> {
	/// Builds the expanded frame implicit at the start of the method from its descriptor: the
	/// receiver (uninitialized for constructors), then one local per parameter.
	fn compute_implicit_frame(&self, ctx: &mut Context) -> Result<()> {
		let descriptor = std::mem::take(&mut ctx.current_method_descriptor);
		ctx.current_frame_local_types.clear();
		let mut num_local = 0;

		if ctx.current_method_access & opcodes::ACC_STATIC == 0 {
			let this = if ctx.current_method_name == "<init>" {
				FrameItem::UninitializedThis
			} else {
				FrameItem::Object(self.class_name()?)
			};
			set_frame_item(&mut ctx.current_frame_local_types, num_local, this);
			num_local += 1;
		}

		let bytes = descriptor.as_bytes();
		let mut current = 1; // the '(' of the descriptor
		loop {
			let argument_start = current;
			let local = match bytes.get(current).copied() {
				Some(b'Z' | b'C' | b'B' | b'S' | b'I') => {
					current += 1;
					FrameItem::Integer
				},
				Some(b'F') => {
					current += 1;
					FrameItem::Float
				},
				Some(b'J') => {
					current += 1;
					FrameItem::Long
				},
				Some(b'D') => {
					current += 1;
					FrameItem::Double
				},
				Some(b'[') => {
					while bytes.get(current) == Some(&b'[') {
						current += 1;
					}
					if bytes.get(current) == Some(&b'L') {
						current += 1;
						while let Some(&byte) = bytes.get(current) {
							current += 1;
							if byte == b';' {
								break;
							}
						}
					} else {
						current += 1;
					}
					// array locals keep the whole descriptor
					FrameItem::Object(descriptor.as_java_str()[argument_start..current].to_owned())
				},
				Some(b'L') => {
					current += 1;
					let name_start = current;
					while let Some(&byte) = bytes.get(current) {
						if byte == b';' {
							break;
						}
						current += 1;
					}
					let local = FrameItem::Object(descriptor.as_java_str()[name_start..current].to_owned());
					current += 1;
					local
				},
				_ => break,
			};
			set_frame_item(&mut ctx.current_frame_local_types, num_local, local);
			num_local += 1;
		}

		ctx.current_frame_local_count = num_local as u16;
		ctx.current_method_descriptor = descriptor;
		Ok(())
	}

	/// Decodes one `stack_map_frame` into the context scratch and materialises the label at its
	/// offset. Returns the offset past the frame.
	fn read_stack_map_frame(&self, ctx: &mut Context, stack_map_frame_offset: usize, compressed: bool, expand: bool) -> Result<usize> {
		let b = self.b;
		let mut current_offset = stack_map_frame_offset;
		let frame_type = if compressed {
			let frame_type = b.u8_at(current_offset)?;
			current_offset += 1;
			frame_type
		} else {
			// legacy frames are always full and store absolute offsets
			ctx.current_frame_offset = -1;
			frame::FULL
		};

		ctx.current_frame_local_count_delta = 0;
		let offset_delta: u16;
		if frame_type < frame::SAME_LOCALS_1_STACK_ITEM {
			offset_delta = frame_type as u16;
			ctx.current_frame_type = opcodes::F_SAME;
			ctx.current_frame_stack_count = 0;
		} else if frame_type < frame::RESERVED {
			offset_delta = (frame_type - frame::SAME_LOCALS_1_STACK_ITEM) as u16;
			current_offset = self.read_verification_type_info(ctx, current_offset, FrameSlot::Stack, 0)?;
			ctx.current_frame_type = opcodes::F_SAME1;
			ctx.current_frame_stack_count = 1;
		} else if frame_type < frame::SAME_LOCALS_1_STACK_ITEM_EXTENDED {
			bail!("unknown stack map frame type {frame_type}");
		} else {
			offset_delta = b.u16_at(current_offset)?;
			current_offset += 2;
			if frame_type == frame::SAME_LOCALS_1_STACK_ITEM_EXTENDED {
				current_offset = self.read_verification_type_info(ctx, current_offset, FrameSlot::Stack, 0)?;
				ctx.current_frame_type = opcodes::F_SAME1;
				ctx.current_frame_stack_count = 1;
			} else if frame_type < frame::SAME_EXTENDED {
				ctx.current_frame_type = opcodes::F_CHOP;
				ctx.current_frame_local_count_delta = (frame::SAME_EXTENDED - frame_type) as u16;
				// the running count is only seeded (and only consumed) when frames are
				// expanded; in compressed mode chop frames emit the delta alone
				ctx.current_frame_local_count = ctx.current_frame_local_count
					.wrapping_sub(ctx.current_frame_local_count_delta);
				ctx.current_frame_stack_count = 0;
			} else if frame_type == frame::SAME_EXTENDED {
				ctx.current_frame_type = opcodes::F_SAME;
				ctx.current_frame_stack_count = 0;
			} else if frame_type < frame::FULL {
				// append frames write their new locals behind the existing ones when expanding,
				// and at the start of the scratch otherwise
				let mut local = if expand { ctx.current_frame_local_count as usize } else { 0 };
				for _ in 0..frame_type - frame::SAME_EXTENDED {
					current_offset = self.read_verification_type_info(ctx, current_offset, FrameSlot::Local, local)?;
					local += 1;
				}
				ctx.current_frame_type = opcodes::F_APPEND;
				ctx.current_frame_local_count_delta = (frame_type - frame::SAME_EXTENDED) as u16;
				ctx.current_frame_local_count = ctx.current_frame_local_count
					.wrapping_add(ctx.current_frame_local_count_delta);
				ctx.current_frame_stack_count = 0;
			} else {
				let number_of_locals = b.u16_at(current_offset)?;
				current_offset += 2;
				ctx.current_frame_type = opcodes::F_FULL;
				ctx.current_frame_local_count_delta = number_of_locals;
				ctx.current_frame_local_count = number_of_locals;
				for local in 0..number_of_locals as usize {
					current_offset = self.read_verification_type_info(ctx, current_offset, FrameSlot::Local, local)?;
				}
				let number_of_stack_items = b.u16_at(current_offset)?;
				current_offset += 2;
				ctx.current_frame_stack_count = number_of_stack_items;
				for stack in 0..number_of_stack_items as usize {
					current_offset = self.read_verification_type_info(ctx, current_offset, FrameSlot::Stack, stack)?;
				}
			}
		}

		ctx.current_frame_offset += offset_delta as i32 + 1;
		let frame_offset = u16::try_from(ctx.current_frame_offset)
			.map_err(|_| anyhow!("stack map frame offset {} out of bounds", ctx.current_frame_offset))?;
		ctx.labels.create(frame_offset)?;
		Ok(current_offset)
	}

	/// Decodes one `verification_type_info` into the given frame scratch slot. Returns the
	/// offset past it.
	fn read_verification_type_info(&self, ctx: &mut Context, verification_type_info_offset: usize, slot: FrameSlot, index: usize) -> Result<usize> {
		let b = self.b;
		let tag = b.u8_at(verification_type_info_offset)?;
		let (frame_item, new_offset) = match tag {
			item::TOP => (FrameItem::Top, verification_type_info_offset + 1),
			item::INTEGER => (FrameItem::Integer, verification_type_info_offset + 1),
			item::FLOAT => (FrameItem::Float, verification_type_info_offset + 1),
			item::DOUBLE => (FrameItem::Double, verification_type_info_offset + 1),
			item::LONG => (FrameItem::Long, verification_type_info_offset + 1),
			item::NULL => (FrameItem::Null, verification_type_info_offset + 1),
			item::UNINITIALIZED_THIS => (FrameItem::UninitializedThis, verification_type_info_offset + 1),
			item::OBJECT => {
				let class = self.pool.name(b, b.u16_at(verification_type_info_offset + 1)?, &mut ctx.char_buffer)?;
				(FrameItem::Object(class.to_owned()), verification_type_info_offset + 3)
			},
			item::UNINITIALIZED => {
				let label = ctx.labels.create(b.u16_at(verification_type_info_offset + 1)?)?;
				(FrameItem::Uninitialized(label), verification_type_info_offset + 3)
			},
			tag => bail!("unknown verification type tag {tag}"),
		};
		let items = match slot {
			FrameSlot::Local => &mut ctx.current_frame_local_types,
			FrameSlot::Stack => &mut ctx.current_frame_stack_types,
		};
		set_frame_item(items, index, frame_item);
		Ok(new_offset)
	}
}

// ------------------------------------------------------------------------------------------------
// annotations and type annotation targets
// ------------------------------------------------------------------------------------------------

impl<'a> ClassReader<'a> {
	/// Collects the offset of each `type_annotation` of a Runtime*TypeAnnotations attribute of a
	/// Code attribute, materialising the range labels of local and resource variable targets on
	/// the way. Element values are only stepped over here, they are decoded in the second pass.
	fn read_code_type_annotations(&self, ctx: &mut Context, runtime_type_annotations_offset: usize) -> Result<Vec<usize>> {
		let b = self.b;
		let num_annotations = b.u16_at(runtime_type_annotations_offset)?;
		let mut type_annotation_offsets = Vec::with_capacity(num_annotations as usize);
		let mut current_offset = runtime_type_annotations_offset + 2;
		for _ in 0..num_annotations {
			type_annotation_offsets.push(current_offset);
			let target_type = b.u8_at(current_offset)?;
			match target_type {
				target::LOCAL_VARIABLE | target::RESOURCE_VARIABLE => {
					let table_length = b.u16_at(current_offset + 1)?;
					current_offset += 3;
					for _ in 0..table_length {
						let start_pc = b.u16_at(current_offset)?;
						let length = b.u16_at(current_offset + 2)?;
						ctx.labels.create(start_pc)?;
						ctx.labels.create(start_pc.checked_add(length).context("local variable annotation range leaves the code")?)?;
						current_offset += 6;
					}
				},
				target::CAST |
				target::CONSTRUCTOR_INVOCATION_TYPE_ARGUMENT |
				target::METHOD_INVOCATION_TYPE_ARGUMENT |
				target::CONSTRUCTOR_REFERENCE_TYPE_ARGUMENT |
				target::METHOD_REFERENCE_TYPE_ARGUMENT => current_offset += 4,
				target::EXCEPTION_PARAMETER |
				target::INSTANCEOF |
				target::NEW |
				target::CONSTRUCTOR_REFERENCE |
				target::METHOD_REFERENCE => current_offset += 3,
				target_type => bail!("type annotation target {target_type:#04x} cannot occur inside a Code attribute"),
			}
			// step over the type path, the annotation type index and the element values
			let path_length = b.u8_at(current_offset)?;
			current_offset += 1 + 2 * path_length as usize;
			current_offset = self.read_element_values(None, current_offset + 2, true, ctx)?;
		}
		Ok(type_annotation_offsets)
	}

	/// Parses a `target_type`, its `target_info` and its `type_path` into the context scratch,
	/// normalising the target into the packed form described in [`crate::tree::type_annotation`]:
	/// the sort in the high byte, plus the kind specific payload bits. Returns the offset of the
	/// annotation's type index.
	fn read_type_annotation_target(&self, ctx: &mut Context, type_annotation_offset: usize) -> Result<usize> {
		let b = self.b;
		let raw_target = b.u32_at(type_annotation_offset)? as i32;
		let target_sort = ((raw_target as u32) >> 24) as u8;
		let mut current_offset = type_annotation_offset;
		let target_type = match target_sort {
			// one byte payload: a type parameter or formal parameter index
			target::CLASS_TYPE_PARAMETER |
			target::METHOD_TYPE_PARAMETER |
			target::METHOD_FORMAL_PARAMETER => {
				current_offset += 2;
				raw_target & 0xFFFF_0000u32 as i32
			},
			// no payload
			target::FIELD |
			target::METHOD_RETURN |
			target::METHOD_RECEIVER => {
				current_offset += 1;
				raw_target & 0xFF00_0000u32 as i32
			},
			// a table of ranges; the positions live in the labels, not in the packed target
			target::LOCAL_VARIABLE | target::RESOURCE_VARIABLE => {
				let table_length = b.u16_at(type_annotation_offset + 1)?;
				current_offset += 3;
				ctx.current_local_variable_annotation_range_starts.clear();
				ctx.current_local_variable_annotation_range_ends.clear();
				ctx.current_local_variable_annotation_range_indices.clear();
				for _ in 0..table_length {
					let start_pc = b.u16_at(current_offset)?;
					let length = b.u16_at(current_offset + 2)?;
					let index = b.u16_at(current_offset + 4)?;
					current_offset += 6;
					let start = ctx.labels.create(start_pc)?;
					let end = ctx.labels.create(start_pc.checked_add(length).context("local variable annotation range leaves the code")?)?;
					ctx.current_local_variable_annotation_range_starts.push(start);
					ctx.current_local_variable_annotation_range_ends.push(end);
					ctx.current_local_variable_annotation_range_indices.push(index);
				}
				raw_target & 0xFF00_0000u32 as i32
			},
			// a bytecode offset plus a type argument index; only the index is kept, the
			// position is implied by where the annotation is visited
			target::CAST |
			target::CONSTRUCTOR_INVOCATION_TYPE_ARGUMENT |
			target::METHOD_INVOCATION_TYPE_ARGUMENT |
			target::CONSTRUCTOR_REFERENCE_TYPE_ARGUMENT |
			target::METHOD_REFERENCE_TYPE_ARGUMENT => {
				current_offset += 4;
				raw_target & 0xFF00_00FFu32 as i32
			},
			// two byte payload identifying the annotated reference: a supertype, throws or
			// exception table index, or two bound indices
			target::CLASS_EXTENDS |
			target::CLASS_TYPE_PARAMETER_BOUND |
			target::METHOD_TYPE_PARAMETER_BOUND |
			target::THROWS |
			target::EXCEPTION_PARAMETER => {
				current_offset += 3;
				raw_target & 0xFFFF_FF00u32 as i32
			},
			// a two byte bytecode offset; dropped like the cast offsets, the position is
			// implied by where the annotation is visited
			target::INSTANCEOF |
			target::NEW |
			target::CONSTRUCTOR_REFERENCE |
			target::METHOD_REFERENCE => {
				current_offset += 3;
				raw_target & 0xFF00_0000u32 as i32
			},
			target_sort => bail!("unknown type annotation target {target_sort:#04x}"),
		};
		ctx.current_type_annotation_target = target_type;

		let path_length = b.u8_at(current_offset)?;
		ctx.current_type_annotation_path = if path_length == 0 {
			None
		} else {
			Some(self.read_type_path(current_offset)?)
		};
		Ok(current_offset + 1 + 2 * path_length as usize)
	}

	fn read_type_path(&self, type_path_offset: usize) -> Result<TypePath> {
		let b = self.b;
		let path_length = b.u8_at(type_path_offset)?;
		let mut path = Vec::with_capacity(path_length as usize);
		for step in 0..path_length as usize {
			let kind = b.u8_at(type_path_offset + 1 + 2 * step)?;
			let argument_index = b.u8_at(type_path_offset + 2 + 2 * step)?;
			path.push(match kind {
				0 => TypePathEntry::ArrayElement,
				1 => TypePathEntry::InnerType,
				2 => TypePathEntry::WildcardBound,
				3 => TypePathEntry::TypeArgument { index: argument_index },
				kind => bail!("unknown type path kind {kind}"),
			});
		}
		Ok(TypePath { path })
	}

	/// Reads `num_element_value_pairs` and the pairs, named or not, and closes the visitor.
	/// Returns the offset of the first byte past the values.
	fn read_element_values(&self, mut annotation_visitor: Option<&mut dyn AnnotationVisitor>, annotation_offset: usize, named: bool, ctx: &mut Context) -> Result<usize> {
		let b = self.b;
		let mut current_offset = annotation_offset;
		let num_element_value_pairs = b.u16_at(current_offset)?;
		current_offset += 2;
		if named {
			for _ in 0..num_element_value_pairs {
				let element_name = self.utf8_at(current_offset, &mut ctx.char_buffer)?;
				current_offset = self.read_element_value(&mut annotation_visitor, current_offset + 2, Some(element_name), ctx)?;
			}
		} else {
			for _ in 0..num_element_value_pairs {
				current_offset = self.read_element_value(&mut annotation_visitor, current_offset, None, ctx)?;
			}
		}
		if let Some(annotation_visitor) = annotation_visitor {
			annotation_visitor.visit_end()?;
		}
		Ok(current_offset)
	}

	/// The value of the `Integer` entry whose index is at `offset`.
	fn pool_i32(&self, offset: usize) -> Result<i32> {
		let index = self.b.u16_at(offset)?;
		self.b.i32_at(self.pool.offset(index)?)
	}

	/// The value of the `Long` or `Double` entry whose index is at `offset`.
	fn pool_i64(&self, offset: usize) -> Result<i64> {
		let index = self.b.u16_at(offset)?;
		self.b.i64_at(self.pool.offset(index)?)
	}

	/// Decodes a single `element_value`, dispatching on its tag byte. A skipped subtree (no
	/// visitor) is only walked for its width. Returns the offset past the value.
	fn read_element_value(&self, annotation_visitor: &mut Option<&mut dyn AnnotationVisitor>, element_value_offset: usize, element_name: Option<&JavaStr>, ctx: &mut Context) -> Result<usize> {
		let b = self.b;
		let mut current_offset = element_value_offset;
		if annotation_visitor.is_none() {
			return match b.u8_at(current_offset)? {
				b'e' => Ok(current_offset + 5),
				b'@' => self.read_element_values(None, current_offset + 3, true, ctx),
				b'[' => self.read_element_values(None, current_offset + 1, false, ctx),
				_ => Ok(current_offset + 3),
			};
		}
		let tag = b.u8_at(current_offset)?;
		current_offset += 1;
		let Some(visitor) = annotation_visitor.as_deref_mut() else {
			unreachable!("checked that it is Some above");
		};
		match tag {
			b'B' => {
				visitor.visit(element_name, &ElementValue::Byte(self.pool_i32(current_offset)? as i8))?;
				current_offset += 2;
			},
			b'C' => {
				visitor.visit(element_name, &ElementValue::Char(self.pool_i32(current_offset)? as u16))?;
				current_offset += 2;
			},
			b'D' => {
				visitor.visit(element_name, &ElementValue::Double(f64::from_bits(self.pool_i64(current_offset)? as u64)))?;
				current_offset += 2;
			},
			b'F' => {
				visitor.visit(element_name, &ElementValue::Float(f32::from_bits(self.pool_i32(current_offset)? as u32)))?;
				current_offset += 2;
			},
			b'I' => {
				visitor.visit(element_name, &ElementValue::Integer(self.pool_i32(current_offset)?))?;
				current_offset += 2;
			},
			b'J' => {
				visitor.visit(element_name, &ElementValue::Long(self.pool_i64(current_offset)?))?;
				current_offset += 2;
			},
			b'S' => {
				visitor.visit(element_name, &ElementValue::Short(self.pool_i32(current_offset)? as i16))?;
				current_offset += 2;
			},
			b'Z' => {
				visitor.visit(element_name, &ElementValue::Boolean(self.pool_i32(current_offset)? != 0))?;
				current_offset += 2;
			},
			b's' => {
				let string = self.utf8_at(current_offset, &mut ctx.char_buffer)?.to_owned();
				visitor.visit(element_name, &ElementValue::String(string))?;
				current_offset += 2;
			},
			b'e' => {
				let descriptor = self.utf8_at(current_offset, &mut ctx.char_buffer)?;
				let value = self.utf8_at(current_offset + 2, &mut ctx.char_buffer)?;
				visitor.visit_enum(element_name, descriptor, value)?;
				current_offset += 4;
			},
			b'c' => {
				let class = self.utf8_at(current_offset, &mut ctx.char_buffer)?.to_owned();
				visitor.visit(element_name, &ElementValue::Class(class))?;
				current_offset += 2;
			},
			b'@' => {
				let descriptor = self.utf8_at(current_offset, &mut ctx.char_buffer)?;
				let nested = visitor.visit_annotation(element_name, descriptor)?;
				current_offset = self.read_element_values(nested, current_offset + 2, true, ctx)?;
			},
			b'[' => {
				let num_values = b.u16_at(current_offset)?;
				current_offset += 2;
				if num_values == 0 {
					let array_visitor = visitor.visit_array(element_name)?;
					return self.read_element_values(array_visitor, current_offset - 2, false, ctx);
				}
				// arrays of a primitive element type arrive as one typed value; the element
				// tags are trusted to be homogeneous, like the original does
				match b.u8_at(current_offset)? {
					b'B' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i32(current_offset + 1)? as i8);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::ByteArray(values))?;
					},
					b'Z' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i32(current_offset + 1)? != 0);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::BooleanArray(values))?;
					},
					b'S' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i32(current_offset + 1)? as i16);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::ShortArray(values))?;
					},
					b'C' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i32(current_offset + 1)? as u16);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::CharArray(values))?;
					},
					b'I' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i32(current_offset + 1)?);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::IntegerArray(values))?;
					},
					b'J' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(self.pool_i64(current_offset + 1)?);
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::LongArray(values))?;
					},
					b'F' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(f32::from_bits(self.pool_i32(current_offset + 1)? as u32));
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::FloatArray(values))?;
					},
					b'D' => {
						let mut values = Vec::with_capacity(num_values as usize);
						for _ in 0..num_values {
							values.push(f64::from_bits(self.pool_i64(current_offset + 1)? as u64));
							current_offset += 3;
						}
						visitor.visit(element_name, &ElementValue::DoubleArray(values))?;
					},
					_ => {
						let array_visitor = visitor.visit_array(element_name)?;
						current_offset = self.read_element_values(array_visitor, current_offset - 2, false, ctx)?;
					},
				}
			},
			tag => bail!("unknown element value tag {:?}", tag as char),
		}
		Ok(current_offset)
	}
}

// ------------------------------------------------------------------------------------------------
// modules
// ------------------------------------------------------------------------------------------------

impl<'a> ClassReader<'a> {
	/// Reads the Module attribute (plus the ModulePackages list and main class collected from
	/// their own attributes) into the module visitor, if any.
	fn read_module(&self, visitor: &mut dyn ClassVisitor, ctx: &mut Context, module_offset: usize, module_packages_offset: usize, module_main_class: Option<&JavaStr>) -> Result<()> {
		let b = self.b;
		let mut current_offset = module_offset;
		let module_name = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?;
		let module_flags = b.u16_at(current_offset + 2)?;
		let module_version = self.pool.optional_utf8(b, b.u16_at(current_offset + 4)?, &mut ctx.char_buffer)?;
		current_offset += 6;

		let Some(module_visitor) = visitor.visit_module(module_name, module_flags, module_version)? else {
			return Ok(());
		};

		if let Some(main_class) = module_main_class {
			module_visitor.visit_main_class(main_class)?;
		}

		if module_packages_offset != 0 {
			let package_count = b.u16_at(module_packages_offset)?;
			let mut current_package_offset = module_packages_offset + 2;
			for _ in 0..package_count {
				let package = self.pool.name(b, b.u16_at(current_package_offset)?, &mut ctx.char_buffer)?;
				module_visitor.visit_package(package)?;
				current_package_offset += 2;
			}
		}

		let requires_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..requires_count {
			let requires = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?;
			let requires_flags = b.u16_at(current_offset + 2)?;
			let requires_version = self.pool.optional_utf8(b, b.u16_at(current_offset + 4)?, &mut ctx.char_buffer)?;
			module_visitor.visit_require(requires, requires_flags, requires_version)?;
			current_offset += 6;
		}

		let exports_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..exports_count {
			let exports = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned();
			let exports_flags = b.u16_at(current_offset + 2)?;
			let exports_to_count = b.u16_at(current_offset + 4)?;
			current_offset += 6;
			let mut exports_to = Vec::with_capacity(exports_to_count as usize);
			for _ in 0..exports_to_count {
				exports_to.push(self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned());
				current_offset += 2;
			}
			module_visitor.visit_export(&exports, exports_flags, &exports_to)?;
		}

		let opens_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..opens_count {
			let opens = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned();
			let opens_flags = b.u16_at(current_offset + 2)?;
			let opens_to_count = b.u16_at(current_offset + 4)?;
			current_offset += 6;
			let mut opens_to = Vec::with_capacity(opens_to_count as usize);
			for _ in 0..opens_to_count {
				opens_to.push(self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned());
				current_offset += 2;
			}
			module_visitor.visit_open(&opens, opens_flags, &opens_to)?;
		}

		let uses_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..uses_count {
			let service = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?;
			module_visitor.visit_use(service)?;
			current_offset += 2;
		}

		let provides_count = b.u16_at(current_offset)?;
		current_offset += 2;
		for _ in 0..provides_count {
			let provides = self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned();
			let provides_with_count = b.u16_at(current_offset + 2)?;
			current_offset += 4;
			let mut provides_with = Vec::with_capacity(provides_with_count as usize);
			for _ in 0..provides_with_count {
				provides_with.push(self.pool.name(b, b.u16_at(current_offset)?, &mut ctx.char_buffer)?.to_owned());
				current_offset += 2;
			}
			module_visitor.visit_provide(&provides, &provides_with)?;
		}

		module_visitor.visit_end()
	}
}

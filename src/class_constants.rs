//! Internal constants of the class file format that are not part of the public surface.

/// The first four bytes of every class file. Not verified when reading.
#[allow(unused)]
pub(crate) const MAGIC: u32 = 0xCAFE_BABE;

/// The highest supported major version. Construction fails for anything above.
pub(crate) const MAX_MAJOR_VERSION: u16 = 54;

/// The tags of `cp_info` structures.
pub(crate) mod pool {
	pub(crate) const UTF8: u8                 = 1;
	pub(crate) const INTEGER: u8              = 3;
	pub(crate) const FLOAT: u8                = 4;
	pub(crate) const LONG: u8                 = 5;
	pub(crate) const DOUBLE: u8               = 6;
	pub(crate) const CLASS: u8                = 7;
	pub(crate) const STRING: u8               = 8;
	pub(crate) const FIELD_REF: u8            = 9;
	pub(crate) const METHOD_REF: u8           = 10;
	pub(crate) const INTERFACE_METHOD_REF: u8 = 11;
	pub(crate) const NAME_AND_TYPE: u8        = 12;
	pub(crate) const METHOD_HANDLE: u8        = 15;
	pub(crate) const METHOD_TYPE: u8          = 16;
	pub(crate) const INVOKE_DYNAMIC: u8       = 18;
	pub(crate) const MODULE: u8               = 19;
	pub(crate) const PACKAGE: u8              = 20;
}

/// The names of the attributes this reader handles, as modified UTF-8 payload bytes. All of them
/// are plain ASCII, so a byte comparison against the constant pool payload is exact.
pub(crate) mod attribute {
	pub(crate) const CONSTANT_VALUE: &[u8]                         = b"ConstantValue";
	pub(crate) const CODE: &[u8]                                   = b"Code";
	pub(crate) const STACK_MAP_TABLE: &[u8]                        = b"StackMapTable";
	pub(crate) const STACK_MAP: &[u8]                              = b"StackMap";
	pub(crate) const EXCEPTIONS: &[u8]                             = b"Exceptions";
	pub(crate) const INNER_CLASSES: &[u8]                          = b"InnerClasses";
	pub(crate) const ENCLOSING_METHOD: &[u8]                       = b"EnclosingMethod";
	pub(crate) const SYNTHETIC: &[u8]                              = b"Synthetic";
	pub(crate) const SIGNATURE: &[u8]                              = b"Signature";
	pub(crate) const SOURCE_FILE: &[u8]                            = b"SourceFile";
	pub(crate) const SOURCE_DEBUG_EXTENSION: &[u8]                 = b"SourceDebugExtension";
	pub(crate) const LINE_NUMBER_TABLE: &[u8]                      = b"LineNumberTable";
	pub(crate) const LOCAL_VARIABLE_TABLE: &[u8]                   = b"LocalVariableTable";
	pub(crate) const LOCAL_VARIABLE_TYPE_TABLE: &[u8]              = b"LocalVariableTypeTable";
	pub(crate) const DEPRECATED: &[u8]                             = b"Deprecated";
	pub(crate) const RUNTIME_VISIBLE_ANNOTATIONS: &[u8]            = b"RuntimeVisibleAnnotations";
	pub(crate) const RUNTIME_INVISIBLE_ANNOTATIONS: &[u8]          = b"RuntimeInvisibleAnnotations";
	pub(crate) const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &[u8]  = b"RuntimeVisibleParameterAnnotations";
	pub(crate) const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &[u8] = b"RuntimeInvisibleParameterAnnotations";
	pub(crate) const RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &[u8]       = b"RuntimeVisibleTypeAnnotations";
	pub(crate) const RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &[u8]     = b"RuntimeInvisibleTypeAnnotations";
	pub(crate) const ANNOTATION_DEFAULT: &[u8]                     = b"AnnotationDefault";
	pub(crate) const BOOTSTRAP_METHODS: &[u8]                      = b"BootstrapMethods";
	pub(crate) const METHOD_PARAMETERS: &[u8]                      = b"MethodParameters";
	pub(crate) const MODULE: &[u8]                                 = b"Module";
	pub(crate) const MODULE_PACKAGES: &[u8]                        = b"ModulePackages";
	pub(crate) const MODULE_MAIN_CLASS: &[u8]                      = b"ModuleMainClass";
}

/// The tags of `verification_type_info` unions inside stack map frames.
pub(crate) mod item {
	pub(crate) const TOP: u8                = 0;
	pub(crate) const INTEGER: u8            = 1;
	pub(crate) const FLOAT: u8              = 2;
	pub(crate) const DOUBLE: u8             = 3;
	pub(crate) const LONG: u8               = 4;
	pub(crate) const NULL: u8               = 5;
	pub(crate) const UNINITIALIZED_THIS: u8 = 6;
	pub(crate) const OBJECT: u8             = 7;
	pub(crate) const UNINITIALIZED: u8      = 8;
}

/// The `frame_type` ranges of `stack_map_frame` unions.
pub(crate) mod frame {
	pub(crate) const SAME_LOCALS_1_STACK_ITEM: u8          = 64;
	pub(crate) const RESERVED: u8                          = 128;
	pub(crate) const SAME_LOCALS_1_STACK_ITEM_EXTENDED: u8 = 247;
	pub(crate) const CHOP: u8                              = 248;
	pub(crate) const SAME_EXTENDED: u8                     = 251;
	pub(crate) const FULL: u8                              = 255;
}

// Writer specific opcodes, used for jump instructions whose signed two byte offset overflowed.
// These carry *unsigned* two byte offsets, since such rewrites only happen on forward jumps.
pub(crate) const ASM_OPCODE_DELTA: u8 = 49;
pub(crate) const ASM_IFNULL_OPCODE_DELTA: u8 = 20;
pub(crate) const ASM_IFEQ: u8 = super::opcodes::IFEQ + ASM_OPCODE_DELTA;          // 202
#[allow(unused)]
pub(crate) const ASM_JSR: u8 = super::opcodes::JSR + ASM_OPCODE_DELTA;            // 217
pub(crate) const ASM_IFNULL: u8 = super::opcodes::IFNULL + ASM_IFNULL_OPCODE_DELTA;    // 218
pub(crate) const ASM_IFNONNULL: u8 = super::opcodes::IFNONNULL + ASM_IFNULL_OPCODE_DELTA; // 219
pub(crate) const ASM_GOTO_W: u8 = 220;

/// The distance between a wide jump opcode (`goto_w`, `jsr_w`) and its short form.
pub(crate) const WIDE_JUMP_OPCODE_DELTA: u8 = super::opcodes::GOTO_W - super::opcodes::GOTO; // 33

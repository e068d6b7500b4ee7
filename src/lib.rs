//! A streaming parser for [Java Class Files](https://docs.oracle.com/javase/specs/jvms/se10/html/jvms-4.html).
//!
//! A [`ClassReader`] is constructed over a byte buffer holding one compiled class. On
//! [`ClassReader::accept`] it decodes the class file and pushes events, depth first, into a tree
//! of caller supplied visitors, see the [`visitor`] module. Subtree producing operations return
//! `Option`s: `None` skips the subtree while the reader still advances past its bytes.
//!
//! ```no_run
//! # use anyhow::Result;
//! # fn example(bytes: &[u8]) -> Result<()> {
//! use earl::{ClassReader, visitor::class::ClassVisitor};
//!
//! struct MyVisitor;
//! impl ClassVisitor for MyVisitor {}
//!
//! let reader = ClassReader::new(bytes)?;
//! reader.accept(&mut MyVisitor, 0)?;
//! # Ok(())
//! # }
//! ```

pub mod opcodes;
pub mod tree;
pub mod visitor;
pub mod label;
mod class_reader;
mod jstring;

mod class_constants;

use thiserror::Error;

pub use class_reader::ClassReader;

/// A flag to skip the `Code` attributes. If this flag is set the `Code` attributes are neither
/// parsed nor visited.
pub const SKIP_CODE: u32 = 1;

/// A flag to skip the `SourceFile`, `SourceDebugExtension`, `LocalVariableTable`,
/// `LocalVariableTypeTable`, `LineNumberTable` and `MethodParameters` attributes. If this flag is
/// set these attributes are neither parsed nor visited.
pub const SKIP_DEBUG: u32 = 2;

/// A flag to skip the `StackMap` and `StackMapTable` attributes. If this flag is set these
/// attributes are neither parsed nor visited, i.e. no `visit_frame` calls happen.
pub const SKIP_FRAMES: u32 = 4;

/// A flag to expand the stack map frames. By default stack map frames are visited in their
/// original format (i.e. "expanded" for classes whose version is less than 50, and "compressed"
/// for the other classes). If this flag is set, stack map frames are always visited in expanded
/// format; this adds a decompression step.
pub const EXPAND_FRAMES: u32 = 8;

/// A flag to expand the reserved, writer specific instructions into an equivalent sequence of
/// standard bytecode instructions. When resolving a forward jump it may happen that the signed
/// two byte offset reserved for it is not sufficient to store the bytecode offset. In this case
/// the jump instruction is replaced with one using an unsigned two byte offset, see
/// [`label`]. This flag is used to re-read classes containing such instructions, in order
/// to replace them with standard instructions. In addition, when this flag is used, `goto_w` and
/// `jsr_w` are *not* converted into `goto` and `jsr`, to make sure that infinite round trips
/// between reading and writing cannot occur.
pub const EXPAND_ASM_INSNS: u32 = 256;

/// The structural failures the parser distinguishes.
///
/// Everything else (truncated buffers, offsets out of range, inconsistent counts) surfaces as a
/// plain [`anyhow::Error`] with positional context. Both kinds are fatal for the current
/// [`ClassReader::accept`] call, there is no partial-result recovery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassFormatError {
	/// The class file major version is not supported. Produced at construction.
	#[error("unsupported class file major version {0}, only up to 54 is supported")]
	UnsupportedVersion(u16),
	/// A constant pool entry carries an unknown tag. Produced at construction.
	#[error("unknown constant pool tag {tag} for entry {index}")]
	UnknownConstantPoolTag { index: u16, tag: u8 },
	/// The bytecode of some method contains an unknown opcode. Produced mid-stream.
	#[error("unknown opcode {opcode:#04x} at bytecode offset {bytecode_offset}")]
	UnknownOpcode { opcode: u8, bytecode_offset: u16 },
}

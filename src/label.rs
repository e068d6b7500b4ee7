//! Bytecode positions and the basic blocks starting at them.
//!
//! A [`Label`] designates a position in the bytecode of a method, and doubles as the basic block
//! starting at that position in the control flow graph of the method. Labels are small copyable
//! handles; the per-label bookkeeping (flag bits, line numbers, forward references, subroutine
//! membership, outgoing edges) lives in a [`LabelArena`] owned by the table of the current
//! method, see [`crate::class_reader`].

use std::fmt::{Debug, Formatter};
use anyhow::{anyhow, bail, Result};
use crate::class_constants::{ASM_IFNULL_OPCODE_DELTA, ASM_OPCODE_DELTA};
use crate::opcodes;
use crate::visitor::method::MethodVisitor;

// flag bits of a label
/// The label is only used for debug attributes. Cleared once a branch, switch, exception table
/// entry or stack map frame targets the position.
pub(crate) const FLAG_DEBUG_ONLY: u16 = 1;
/// The label is the target of a jump or switch instruction.
#[allow(unused)]
pub(crate) const FLAG_JUMP_TARGET: u16 = 2;
/// The bytecode offset of the label is known.
pub(crate) const FLAG_RESOLVED: u16 = 4;
/// The basic block of the label is reachable.
#[allow(unused)]
pub(crate) const FLAG_REACHABLE: u16 = 8;
/// The basic block of the label ends with a `jsr` instruction.
pub(crate) const FLAG_SUBROUTINE_CALLER: u16 = 16;
/// The basic block of the label is the start of a subroutine.
#[allow(unused)]
pub(crate) const FLAG_SUBROUTINE_START: u16 = 32;
/// The basic block of the label belongs to a subroutine.
#[allow(unused)]
pub(crate) const FLAG_SUBROUTINE_BODY: u16 = 64;
/// The basic block of the label ends with a `ret` instruction, i.e. it ends a subroutine.
pub(crate) const FLAG_SUBROUTINE_END: u16 = 128;

// the two kinds of forward references, stored in the high nibble of the reference word
const FORWARD_REFERENCE_TYPE_MASK: u32 = 0xF000_0000;
/// A forward reference patched as a signed two byte displacement.
pub const FORWARD_REFERENCE_TYPE_SHORT: u32 = 0x1000_0000;
/// A forward reference patched as a signed four byte displacement.
pub const FORWARD_REFERENCE_TYPE_WIDE: u32 = 0x2000_0000;
const FORWARD_REFERENCE_HANDLE_MASK: u32 = 0x0FFF_FFFF;

/// The `info` of an [`Edge`] corresponding to an exception handler.
pub const EDGE_EXCEPTION: i32 = 0x7FFF_FFFF;
/// The `info` of an [`Edge`] corresponding to a jump or to falling through behind a subroutine.
pub const EDGE_JUMP: i32 = 0;

/// A position in the bytecode of a method, and the basic block starting there.
///
/// Labels compare by identity: two labels received from the same [`crate::ClassReader::accept`]
/// call are equal exactly when they designate the same bytecode position of the same method.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
	pub(crate) id: u32,
}

impl Debug for Label {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "L{}", self.id)
	}
}

/// The end-of-worklist sentinel of the intrusive `next_list_element` chains.
const EMPTY_LIST: Label = Label { id: u32::MAX };

/// A directed edge of the control flow graph. Owned by its source label, in a singly linked list
/// headed at its label data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
	/// [`EDGE_EXCEPTION`] for edges into exception handlers, [`EDGE_JUMP`] otherwise.
	pub info: i32,
	pub successor: Label,
	pub next_edge: Option<EdgeId>,
}

/// An index into the edge storage of a [`LabelArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeId(u32);

/// A pending reference to a label whose bytecode offset is not known yet.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ForwardReference {
	/// The bytecode offset of the first byte of the referencing instruction.
	source_insn_bytecode_offset: u16,
	/// The reference kind in the high nibble, the offset where the displacement must be written
	/// in the low 28 bits.
	reference: u32,
}

#[derive(Debug, Default)]
pub(crate) struct LabelInfo {
	pub(crate) flags: u16,
	/// The primary source line of this position, `0` when none is known.
	line_number: u16,
	/// Further source lines, for positions several statements compile to.
	other_line_numbers: Vec<u16>,
	/// Only valid while [`FLAG_RESOLVED`] is set.
	pub(crate) bytecode_offset: u16,
	forward_references: Vec<ForwardReference>,
	/// The subroutine membership bitset, bit `i` set when the block belongs to subroutine `i`.
	/// Empty until the block is added to some subroutine.
	subroutines: Vec<u32>,
	/// The canonical label of the frame this label was coalesced into, if any.
	pub(crate) frame_owner: Option<Label>,
	pub(crate) outgoing_edges: Option<EdgeId>,
	/// Intrusive worklist pointer: `None` while not enqueued, [`EMPTY_LIST`] at the list end.
	next_list_element: Option<Label>,
}

/// Owns the per-label data and the [`Edge`]s of the labels of one method. This is the model a
/// bytecode producer builds its control flow graph in: forward references collect on the labels
/// until [`LabelArena::resolve`] patches them, and the subroutine traversals classify basic
/// blocks without recursing.
#[derive(Debug, Default)]
pub struct LabelArena {
	infos: Vec<LabelInfo>,
	edges: Vec<Edge>,
}

impl LabelArena {
	pub fn new_label(&mut self) -> Label {
		let id = self.infos.len() as u32;
		self.infos.push(LabelInfo::default());
		Label { id }
	}

	pub(crate) fn info(&self, label: Label) -> &LabelInfo {
		&self.infos[label.id as usize]
	}

	pub(crate) fn info_mut(&mut self, label: Label) -> &mut LabelInfo {
		&mut self.infos[label.id as usize]
	}

	/// The bytecode offset of the label, an error if the position has not been resolved yet.
	pub fn bytecode_offset(&self, label: Label) -> Result<u16> {
		let info = self.info(label);
		if info.flags & FLAG_RESOLVED == 0 {
			bail!("offset of label {label:?} has not been resolved yet");
		}
		Ok(info.bytecode_offset)
	}

	/// The label to use in place of `label` when frames have been coalesced: labels sharing a
	/// frame forward to the owner of that frame.
	pub fn canonical_instance(&self, label: Label) -> Label {
		self.info(label).frame_owner.unwrap_or(label)
	}

	/// Records that the position of `label` corresponds to the source line `line_number`.
	pub fn add_line_number(&mut self, label: Label, line_number: u16) {
		let info = self.info_mut(label);
		if info.line_number == 0 {
			info.line_number = line_number;
		} else {
			info.other_line_numbers.push(line_number);
		}
	}

	/// Emits `visit_label` for this label, followed by `visit_line_number` for its primary and
	/// additional source lines when `visit_line_numbers` is set.
	pub(crate) fn accept(&self, label: Label, visitor: &mut dyn MethodVisitor, visit_line_numbers: bool) -> Result<()> {
		visitor.visit_label(label)?;
		let info = self.info(label);
		if visit_line_numbers && info.line_number != 0 {
			visitor.visit_line_number(info.line_number, label)?;
			for &line_number in &info.other_line_numbers {
				visitor.visit_line_number(line_number, label)?;
			}
		}
		Ok(())
	}

	/// Registers a reference from the instruction at `source_insn_bytecode_offset` to `label`,
	/// to be patched at `handle` once the offset of `label` becomes known.
	pub fn add_forward_reference(&mut self, label: Label, source_insn_bytecode_offset: u16, reference_type: u32, handle: u16) {
		self.info_mut(label).forward_references.push(ForwardReference {
			source_insn_bytecode_offset,
			reference: reference_type | handle as u32,
		});
	}

	/// Fixes the bytecode offset of `label` and patches all its pending forward references into
	/// `code`. Returns whether an out-of-range short reference forced a rewrite of its source
	/// instruction to the reserved unsigned-offset form; callers must then re-read the produced
	/// bytecode with the expansion option, see [`crate::EXPAND_ASM_INSNS`].
	pub fn resolve(&mut self, label: Label, code: &mut [u8], bytecode_offset: u16) -> Result<bool> {
		let mut has_asm_instructions = false;

		let info = self.info_mut(label);
		info.flags |= FLAG_RESOLVED;
		info.bytecode_offset = bytecode_offset;

		for reference in std::mem::take(&mut self.info_mut(label).forward_references) {
			let relative_offset = bytecode_offset as i32 - reference.source_insn_bytecode_offset as i32;
			let handle = (reference.reference & FORWARD_REFERENCE_HANDLE_MASK) as usize;

			match reference.reference & FORWARD_REFERENCE_TYPE_MASK {
				FORWARD_REFERENCE_TYPE_SHORT => {
					if i16::try_from(relative_offset).is_err() {
						let source = reference.source_insn_bytecode_offset as usize;
						let opcode = *code.get(source)
							.ok_or_else(|| anyhow!("forward reference source {source} out of bounds"))?;
						code[source] = if opcode < opcodes::IFNULL {
							opcode + ASM_OPCODE_DELTA
						} else {
							opcode + ASM_IFNULL_OPCODE_DELTA
						};
						has_asm_instructions = true;
					}
					let bytes: &mut [u8] = code.get_mut(handle..handle + 2)
						.ok_or_else(|| anyhow!("forward reference handle {handle} out of bounds"))?;
					bytes.copy_from_slice(&(relative_offset as i16).to_be_bytes());
				},
				FORWARD_REFERENCE_TYPE_WIDE => {
					let bytes: &mut [u8] = code.get_mut(handle..handle + 4)
						.ok_or_else(|| anyhow!("forward reference handle {handle} out of bounds"))?;
					bytes.copy_from_slice(&relative_offset.to_be_bytes());
				},
				reference_type => bail!("unknown forward reference type {reference_type:#x}"),
			}
		}

		Ok(has_asm_instructions)
	}

	/// Prepends an edge from `from` to `successor` to the outgoing edge list of `from`.
	pub fn add_edge(&mut self, from: Label, info: i32, successor: Label) {
		let next_edge = self.info(from).outgoing_edges;
		let id = EdgeId(self.edges.len() as u32);
		self.edges.push(Edge { info, successor, next_edge });
		self.info_mut(from).outgoing_edges = Some(id);
	}

	pub fn edge(&self, id: EdgeId) -> Edge {
		self.edges[id.0 as usize]
	}

	fn is_in_subroutine(&self, label: Label, subroutine_id: u32) -> bool {
		self.info(label).subroutines
			.get(subroutine_id as usize / 32)
			.is_some_and(|&word| word & (1 << (subroutine_id % 32)) != 0)
	}

	/// Whether the two blocks belong to at least one common subroutine.
	fn is_in_same_subroutine(&self, a: Label, b: Label) -> bool {
		self.info(a).subroutines.iter()
			.zip(self.info(b).subroutines.iter())
			.any(|(x, y)| x & y != 0)
	}

	fn add_to_subroutine(&mut self, label: Label, subroutine_id: u32, num_subroutines: u32) {
		let words = (num_subroutines as usize + 31) / 32;
		let info = self.info_mut(label);
		if info.subroutines.len() < words {
			info.subroutines.resize(words, 0);
		}
		info.subroutines[subroutine_id as usize / 32] |= 1 << (subroutine_id % 32);
	}

	/// Enqueues the successors of `label` that are not yet enqueued, skipping the `jsr` target
	/// edge of subroutine caller blocks. Returns the new worklist head.
	fn push_successors(&mut self, label: Label, mut worklist: Label) -> Label {
		let mut outgoing_edge = self.info(label).outgoing_edges;
		while let Some(edge_id) = outgoing_edge {
			let edge = self.edge(edge_id);
			// The second edge of a block ending with a jsr is the jsr target, which starts a
			// different subroutine.
			let is_jsr_target = self.info(label).flags & FLAG_SUBROUTINE_CALLER != 0
				&& Some(edge_id) == self.info(label).outgoing_edges.map(|head| self.edge(head).next_edge).flatten();
			if !is_jsr_target && self.info(edge.successor).next_list_element.is_none() {
				self.info_mut(edge.successor).next_list_element = Some(worklist);
				worklist = edge.successor;
			}
			outgoing_edge = edge.next_edge;
		}
		worklist
	}

	/// Marks every basic block reachable from `start` as belonging to subroutine
	/// `subroutine_id`, by an iterative worklist traversal over the intrusive list pointers.
	pub fn mark_subroutine(&mut self, start: Label, subroutine_id: u32, num_subroutines: u32) {
		let mut worklist = start;
		self.info_mut(start).next_list_element = Some(EMPTY_LIST);
		while worklist != EMPTY_LIST {
			let basic_block = worklist;
			worklist = self.info(basic_block).next_list_element.expect("enqueued blocks have a list pointer");
			self.info_mut(basic_block).next_list_element = None;

			if !self.is_in_subroutine(basic_block, subroutine_id) {
				self.add_to_subroutine(basic_block, subroutine_id, num_subroutines);
				worklist = self.push_successors(basic_block, worklist);
			}
		}
	}

	/// Starting from the subroutine head `start`, finds the blocks ending the subroutine with a
	/// `ret` and gives each an edge to the block following the `jsr` of `caller`, so that the
	/// control flow through the subroutine continues behind its call site.
	pub fn add_subroutine_ret_successors(&mut self, start: Label, caller: Label) -> Result<()> {
		let return_target = {
			let head = self.info(caller).outgoing_edges
				.ok_or_else(|| anyhow!("subroutine caller {caller:?} has no outgoing edges"))?;
			self.edge(head).successor
		};

		let mut processed = EMPTY_LIST;
		let mut worklist = start;
		self.info_mut(start).next_list_element = Some(EMPTY_LIST);
		while worklist != EMPTY_LIST {
			let basic_block = worklist;
			worklist = self.info(basic_block).next_list_element.expect("enqueued blocks have a list pointer");
			// Keep visited blocks chained so the pointers can be cleared afterwards; the chain
			// also prevents re-enqueueing.
			self.info_mut(basic_block).next_list_element = Some(processed);
			processed = basic_block;

			if self.info(basic_block).flags & FLAG_SUBROUTINE_END != 0
				&& !self.is_in_same_subroutine(basic_block, caller) {
				self.add_edge(basic_block, EDGE_JUMP, return_target);
			}
			worklist = self.push_successors(basic_block, worklist);
		}

		while processed != EMPTY_LIST {
			let next = self.info(processed).next_list_element.expect("processed blocks stay chained");
			self.info_mut(processed).next_list_element = None;
			processed = next;
		}

		Ok(())
	}
}

use anyhow::{anyhow, bail, Context, Result};
use crate::label::{Label, LabelArena, FLAG_DEBUG_ONLY};

/// The label table of the method currently being read: one slot per bytecode offset, plus one
/// for the position just past the code. Owns the [`LabelArena`] of the method.
pub(crate) struct Labels {
	code_length: u16,
	table: Vec<Option<Label>>,
	pub(crate) arena: LabelArena,
}

impl Labels {
	pub(crate) fn new(code_length: u16) -> Labels {
		Labels {
			code_length,
			table: vec![None; code_length as usize + 1],
			arena: LabelArena::default(),
		}
	}

	fn check(&self, bytecode_offset: u16) -> Result<()> {
		// the position just past the last instruction is a valid label position
		if bytecode_offset > self.code_length {
			bail!("label at bytecode offset {bytecode_offset} out of bounds for code length {}", self.code_length);
		}
		Ok(())
	}

	/// The label at `bytecode_offset`, created if there is none yet.
	pub(crate) fn read(&mut self, bytecode_offset: u16) -> Result<Label> {
		self.check(bytecode_offset)?;
		Ok(match self.table[bytecode_offset as usize] {
			Some(label) => label,
			None => {
				let label = self.arena.new_label();
				self.table[bytecode_offset as usize] = Some(label);
				label
			},
		})
	}

	/// The label at `bytecode_offset` as a branch target, frame position or exception table
	/// position: existing or new, with [`FLAG_DEBUG_ONLY`] cleared.
	pub(crate) fn create(&mut self, bytecode_offset: u16) -> Result<Label> {
		let label = self.read(bytecode_offset)?;
		self.arena.info_mut(label).flags &= !FLAG_DEBUG_ONLY;
		Ok(label)
	}

	/// The label at `bytecode_offset` for a line number or local variable entry. A newly
	/// created label is marked [`FLAG_DEBUG_ONLY`]; an existing one keeps its flags.
	pub(crate) fn create_debug(&mut self, bytecode_offset: u16) -> Result<Label> {
		self.check(bytecode_offset)?;
		Ok(match self.table[bytecode_offset as usize] {
			Some(label) => label,
			None => {
				let label = self.read(bytecode_offset)?;
				self.arena.info_mut(label).flags |= FLAG_DEBUG_ONLY;
				label
			},
		})
	}

	pub(crate) fn get(&self, bytecode_offset: u16) -> Option<Label> {
		self.table.get(bytecode_offset as usize).copied().flatten()
	}

	/// Like [`Self::get`], but a missing label is an error: branch targets must have been
	/// materialised by the first pass.
	pub(crate) fn try_get(&self, bytecode_offset: u16) -> Result<Label> {
		self.get(bytecode_offset)
			.with_context(|| anyhow!("no label at bytecode offset {bytecode_offset}"))
	}
}

#[cfg(test)]
mod testing {
	use anyhow::Result;
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn labels_are_unique_per_offset() -> Result<()> {
		let mut labels = Labels::new(10);
		let a = labels.create(3)?;
		let b = labels.create(3)?;
		let c = labels.create(5)?;
		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(labels.get(3), Some(a));
		assert_eq!(labels.get(4), None);
		Ok(())
	}

	#[test]
	fn end_of_code_is_in_bounds() -> Result<()> {
		let mut labels = Labels::new(10);
		assert!(labels.create(10).is_ok());
		assert!(labels.create(11).is_err());
		Ok(())
	}

	#[test]
	fn debug_only_is_cleared_by_branch_targets() -> Result<()> {
		let mut labels = Labels::new(10);
		let label = labels.create_debug(2)?;
		assert_ne!(labels.arena.info(label).flags & FLAG_DEBUG_ONLY, 0);

		// an existing debug label becoming a branch target loses the marker
		let same = labels.create(2)?;
		assert_eq!(same, label);
		assert_eq!(labels.arena.info(label).flags & FLAG_DEBUG_ONLY, 0);

		// and a debug entry over an existing branch target does not set it
		let target = labels.create(7)?;
		labels.create_debug(7)?;
		assert_eq!(labels.arena.info(target).flags & FLAG_DEBUG_ONLY, 0);
		Ok(())
	}
}

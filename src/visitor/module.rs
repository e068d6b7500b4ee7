use anyhow::Result;
use java_string::{JavaStr, JavaString};

/// A visitor for a java module declaration. `visit_main_class` comes first when present, then
/// the packages, requires, exports, opens, uses and provides lists in this order, then
/// `visit_end`.
#[allow(unused_variables)]
pub trait ModuleVisitor {
	fn visit_main_class(&mut self, main_class: &JavaStr) -> Result<()> {
		Ok(())
	}

	fn visit_package(&mut self, package: &JavaStr) -> Result<()> {
		Ok(())
	}

	fn visit_require(&mut self, module: &JavaStr, access: u16, version: Option<&JavaStr>) -> Result<()> {
		Ok(())
	}

	fn visit_export(&mut self, package: &JavaStr, access: u16, modules: &[JavaString]) -> Result<()> {
		Ok(())
	}

	fn visit_open(&mut self, package: &JavaStr, access: u16, modules: &[JavaString]) -> Result<()> {
		Ok(())
	}

	fn visit_use(&mut self, service: &JavaStr) -> Result<()> {
		Ok(())
	}

	fn visit_provide(&mut self, service: &JavaStr, providers: &[JavaString]) -> Result<()> {
		Ok(())
	}

	fn visit_end(&mut self) -> Result<()> {
		Ok(())
	}
}

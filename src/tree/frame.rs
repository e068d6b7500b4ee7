use java_string::JavaString;
use crate::label::Label;

/// One entry of the locals or stack array of a stack map frame, i.e. a decoded
/// `verification_type_info` union.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameItem {
	Top,
	Integer,
	Float,
	Double,
	Long,
	Null,
	UninitializedThis,
	/// Holds the internal name of the class, or the full descriptor for array types.
	Object(JavaString),
	/// The value produced by a `new` instruction that has not had its constructor run yet. The
	/// label designates that `new` instruction.
	Uninitialized(Label),
}

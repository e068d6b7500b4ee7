//! The visitor capability traits the reader pushes events into.
//!
//! Every trait method has a default no-op body, so implementations only write out the events
//! they care about. Operations producing a subtree (an annotation, a field, a method, a module)
//! return `Result<Option<&mut dyn …>>`: returning `None` skips every event of that subtree,
//! while the reader still advances past its bytes.
//!
//! Visitor methods are fallible; an error returned from a visitor aborts the `accept` call and
//! is passed through to its caller unchanged.

pub mod class;
pub mod field;
pub mod method;
pub mod annotation;
pub mod module;

pub use class::ClassVisitor;
pub use field::FieldVisitor;
pub use method::MethodVisitor;
pub use annotation::AnnotationVisitor;
pub use module::ModuleVisitor;

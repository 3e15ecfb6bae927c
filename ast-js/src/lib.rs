//! Parse node arena for a single-pass JavaScript front end.
//!
//! Every node of a compilation unit lives in a [`ParseNodeArena`] and is addressed by a
//! [`NodeId`]. Nodes are rewritten in place as parsing learns more about them (a name becomes an
//! assignment, a binary chain becomes a list), so ids held elsewhere in the tree stay valid.
//!
//! Names take part in definition/use resolution: a definition heads a chain of uses linked through
//! [`ParseNode::next_use`], and each use points back at its definition. Building those chains is
//! the job of a binder layered on top of this crate; this crate provides the node model and the
//! primitive operations on it.

pub mod arena;
pub mod atom;
pub mod cast;
pub mod clone;
pub mod cookie;
pub mod definition;
pub mod dump;
pub mod error;
pub mod flags;
pub mod funbox;
pub mod kind;
pub mod list;
pub mod loc;
pub mod node;
pub mod num;
pub mod op;

pub use arena::AstOptions;
pub use arena::ParseNodeArena;
pub use atom::Atom;
pub use cookie::UpvarCookie;
pub use definition::DefinitionKind;
pub use error::AstError;
pub use error::AstResult;
pub use kind::ParseNodeKind;
pub use node::NodeId;
pub use node::ParseNode;
pub use op::JsOp;

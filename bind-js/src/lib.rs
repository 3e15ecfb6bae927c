//! Single-pass definition/use binding over an [`ast_js`] parse node arena.
//!
//! A parser drives a [`Binder`] as it builds nodes: it declares names as it meets declarations,
//! reports every other identifier as a use, and brackets function bodies, blocks, `with` bodies,
//! and loops. No second walk over the tree is needed.
//!
//! ## Scoping model
//!
//! - Function-level declarations (`var`, `const`, formals, function statements) live in the
//!   innermost function context, or in the outermost script context.
//! - `let` declarations inside a block live in that block; outside any block they behave like
//!   function-level declarations. A block `let` also takes over the uses of its name seen earlier
//!   in the same block.
//! - A use is only looked up in its own context. If nothing there declares the name, the use is
//!   linked to a *placeholder* definition in that context. A later declaration of the same name in
//!   the context promotes the placeholder in place, so forward references resolve without
//!   revisiting their uses.
//! - When a function body ends, its remaining placeholders are merged into the enclosing context:
//!   into a visible declaration there, into an existing placeholder, or kept as a new one. A
//!   named function expression's placeholder for its own name becomes its callee definition.
//! - Inside a `with` body, and for every outer name used by a context that calls `eval`, the
//!   static binding cannot be trusted. Such uses stay linked but are flagged
//!   [`ast_js::flags::DefnFlags::DEOPTIMIZED`].
//!
//! Once the whole unit is bound, [`analyze::analyze_functions`] decides which functions escape
//! and how each one captures its environment.

use ast_js::AstOptions;
use std::str::FromStr;

pub mod analyze;
pub mod binder;
pub mod context;
pub mod error;

pub use binder::Binder;
pub use binder::BoundUnit;
pub use binder::DeclKind;
pub use binder::FunctionSyntax;
pub use error::BindError;
pub use error::BindResult;

/// How definitions of the outermost script are stored at runtime.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TopLevelMode {
  /// Script code: top-level bindings are properties of the global object.
  #[default]
  Global,
  /// Code passed to `eval`: top-level bindings are looked up by name in the caller's scope.
  Eval,
}

impl FromStr for TopLevelMode {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "global" | "Global" => Ok(TopLevelMode::Global),
      "eval" | "Eval" => Ok(TopLevelMode::Eval),
      _ => Err(()),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BindOptions {
  pub top_level: TopLevelMode,
  pub ast: AstOptions,
  /// Run [`analyze::analyze_functions`] when the unit is finished.
  pub analyze_functions: bool,
}

impl Default for BindOptions {
  fn default() -> Self {
    Self {
      top_level: TopLevelMode::Global,
      ast: AstOptions::default(),
      analyze_functions: true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::TopLevelMode;

  #[test]
  fn top_level_mode_from_str() {
    assert_eq!("global".parse(), Ok(TopLevelMode::Global));
    assert_eq!("Eval".parse(), Ok(TopLevelMode::Eval));
    assert_eq!("module".parse::<TopLevelMode>(), Err(()));
  }
}

/// Failures that abort the current compilation unit.
///
/// Diagnostic codes (prefix `AST`) are assigned per variant and are stable:
/// - `AST0001`: [`AstError::OutOfMemory`]
///
/// Contract violations (wrong arity, releasing a live definition, a cycle in a
/// resolution chain) are programming errors and are asserted instead of being
/// reported here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
  /// The arena has handed out its configured maximum number of nodes and has nothing left on its
  /// freelist.
  #[error("parse node arena exhausted ({limit} nodes)")]
  OutOfMemory { limit: usize },
}

impl AstError {
  /// Stable diagnostic code for this error variant.
  pub fn code(&self) -> &'static str {
    match self {
      AstError::OutOfMemory { .. } => "AST0001",
    }
  }
}

pub type AstResult<T> = Result<T, AstError>;

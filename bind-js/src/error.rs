use ast_js::loc::TokenPos;
use ast_js::AstError;
use ast_js::DefinitionKind;

/// Errors reported while binding a compilation unit.
///
/// Stable diagnostic codes:
/// - `BND0001`: [`BindError::Redeclaration`]
/// - node arena failures keep their `AST` code.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
  #[error(transparent)]
  Ast(#[from] AstError),
  /// A name was declared twice in a way that cannot refer to one binding.
  #[error("redeclaration of {previous} {name}")]
  Redeclaration {
    name: String,
    previous: DefinitionKind,
    declared_as: DefinitionKind,
    pos: TokenPos,
  },
}

impl BindError {
  pub fn code(&self) -> &'static str {
    match self {
      BindError::Ast(err) => err.code(),
      BindError::Redeclaration { .. } => "BND0001",
    }
  }
}

pub type BindResult<T> = Result<T, BindError>;

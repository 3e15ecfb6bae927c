use serde::Serialize;

/// Syntactic category of a parse node. The variants at the end occupy contiguous ranges (equality,
/// unary, relational, shift, assignment operators) so that category tests are range comparisons.
///
/// Shapes by kind, for the kinds whose payload is not obvious:
/// - `Function` (func): `body` is `Upvars` if the body depends on outer names, `ArgsBody` if the
///   function has formal parameters, else the `StatementList` of the body.
/// - `ArgsBody` (list): the formals followed by the body `StatementList` as the last element.
/// - `Upvars` (nameset): lexical dependencies of the function plus the `ArgsBody` or
///   `StatementList` subtree.
/// - `Var`, `Const` (list): `Name` nodes (definitions or uses of an earlier definition) or
///   `Assign` nodes whose left side is such a name.
/// - `Dot` (name): `expr` is the object, `atom` the property name.
/// - `Lb` (binary): object and computed property.
/// - `Lp`, `New` (list): callee followed by arguments.
/// - `Add` (binary, or list once a left-associative chain is flattened): see the list flags
///   `STRCAT` and `CANTFOLD`.
/// - `Break`, `Continue` (nullary): optional label.
/// - `Colon` (name): labeled statement; (binary) inside `Rc`: property id and value.
/// - `LexicalScope` (name): `expr` is the block body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum ParseNodeKind {
  Semi,
  Comma,
  Conditional,
  Colon,
  Or,
  And,
  BitOr,
  BitXor,
  BitAnd,
  Pos,
  Neg,
  Add,
  Sub,
  Star,
  Div,
  Mod,
  PreIncrement,
  PostIncrement,
  PreDecrement,
  PostDecrement,
  Dot,
  Lb,
  Rb,
  StatementList,
  Rc,
  Lp,
  Name,
  Number,
  String,
  RegExp,
  True,
  False,
  Null,
  This,
  Function,
  If,
  Else,
  Switch,
  Case,
  Default,
  While,
  DoWhile,
  For,
  Break,
  Continue,
  In,
  Var,
  Const,
  With,
  Return,
  New,
  Delete,
  Try,
  Catch,
  CatchList,
  Finally,
  Throw,
  Instanceof,
  Debugger,
  Yield,
  ArrayComp,
  ArrayPush,
  LexicalScope,
  Let,
  Seq,
  ForIn,
  ForHead,
  ArgsBody,
  Upvars,

  // Equality operators.
  StrictEq,
  Eq,
  StrictNe,
  Ne,

  // Unary operators.
  Typeof,
  Void,
  Not,
  BitNot,

  // Relational operators.
  Lt,
  Le,
  Gt,
  Ge,

  // Shift operators.
  Lsh,
  Rsh,
  Ursh,

  // Assignment operators.
  Assign,
  AddAssign,
  SubAssign,
  BitOrAssign,
  BitXorAssign,
  BitAndAssign,
  LshAssign,
  RshAssign,
  UrshAssign,
  MulAssign,
  DivAssign,
  ModAssign,
}

impl ParseNodeKind {
  fn in_range(self, first: ParseNodeKind, last: ParseNodeKind) -> bool {
    (first as u8..=last as u8).contains(&(self as u8))
  }

  pub fn is_equality(self) -> bool {
    self.in_range(ParseNodeKind::StrictEq, ParseNodeKind::Ne)
  }

  pub fn is_unary_op(self) -> bool {
    self.in_range(ParseNodeKind::Typeof, ParseNodeKind::BitNot)
  }

  pub fn is_relational(self) -> bool {
    self.in_range(ParseNodeKind::Lt, ParseNodeKind::Ge)
  }

  pub fn is_shift(self) -> bool {
    self.in_range(ParseNodeKind::Lsh, ParseNodeKind::Ursh)
  }

  pub fn is_assignment(self) -> bool {
    self.in_range(ParseNodeKind::Assign, ParseNodeKind::ModAssign)
  }

  pub fn is_literal(self) -> bool {
    matches!(
      self,
      ParseNodeKind::Number
        | ParseNodeKind::String
        | ParseNodeKind::True
        | ParseNodeKind::False
        | ParseNodeKind::Null
    )
  }

  pub fn is_increment_or_decrement(self) -> bool {
    self.in_range(ParseNodeKind::PreIncrement, ParseNodeKind::PostDecrement)
  }
}

#[cfg(test)]
mod tests {
  use super::ParseNodeKind;

  #[test]
  fn range_tests_cover_exactly_their_families() {
    for kind in [
      ParseNodeKind::StrictEq,
      ParseNodeKind::Eq,
      ParseNodeKind::StrictNe,
      ParseNodeKind::Ne,
    ] {
      assert!(kind.is_equality());
      assert!(!kind.is_relational());
    }
    assert!(!ParseNodeKind::Upvars.is_equality());
    assert!(!ParseNodeKind::Typeof.is_equality());

    assert!(ParseNodeKind::Typeof.is_unary_op());
    assert!(ParseNodeKind::BitNot.is_unary_op());
    assert!(!ParseNodeKind::Neg.is_unary_op());

    assert!(ParseNodeKind::Lt.is_relational());
    assert!(ParseNodeKind::Ge.is_relational());
    assert!(!ParseNodeKind::Lsh.is_relational());

    assert!(ParseNodeKind::Ursh.is_shift());
    assert!(!ParseNodeKind::Assign.is_shift());

    assert!(ParseNodeKind::Assign.is_assignment());
    assert!(ParseNodeKind::ModAssign.is_assignment());
    assert!(!ParseNodeKind::Ursh.is_assignment());
    assert!(!ParseNodeKind::Add.is_assignment());
  }
}

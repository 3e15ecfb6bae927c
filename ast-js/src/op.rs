use crate::kind::ParseNodeKind;
use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Secondary label refining a node's kind for code generation, e.g. `AddAssign` nodes carry `Add`,
/// and a `Name` node becomes `GetArg` or `GetLocal` once it is bound to a frame slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub enum JsOp {
  #[default]
  Nop,

  // Binary arithmetic and logic.
  Or,
  And,
  BitOr,
  BitXor,
  BitAnd,
  Eq,
  Ne,
  StrictEq,
  StrictNe,
  Lt,
  Le,
  Gt,
  Ge,
  Lsh,
  Rsh,
  Ursh,
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  In,
  Instanceof,

  // Unary.
  Not,
  BitNot,
  Neg,
  Pos,
  Typeof,
  Void,
  DelName,
  DelProp,
  DelElem,
  IncName,
  NameInc,
  DecName,
  NameDec,

  // Names and slots.
  Name,
  CallName,
  SetName,
  BindName,
  GetArg,
  SetArg,
  GetLocal,
  SetLocal,
  GetUpvar,
  GetFcSlot,
  GetGname,
  /// A function expression's reference to its own name.
  Callee,

  // Literals.
  Double,
  String,
  Object,
  RegExp,
  True,
  False,
  Null,
  This,

  // Members, calls, and functions.
  GetProp,
  GetElem,
  InitProp,
  Call,
  New,
  Lambda,
  LambdaFc,
  DefFun,

  // Statements.
  Throw,
  Return,
  LeaveBlock,
  LeaveBlockExpr,
  Yield,
  ArrayComp,
}

impl JsOp {
  /// Ops whose operator chains parse left-associatively, and can therefore be flattened into a single list node.
  pub fn is_left_assoc(self) -> bool {
    matches!(
      self,
      JsOp::BitOr
        | JsOp::BitXor
        | JsOp::BitAnd
        | JsOp::Eq
        | JsOp::Ne
        | JsOp::StrictEq
        | JsOp::StrictNe
        | JsOp::Lt
        | JsOp::Le
        | JsOp::Gt
        | JsOp::Ge
        | JsOp::Lsh
        | JsOp::Rsh
        | JsOp::Ursh
        | JsOp::Add
        | JsOp::Sub
        | JsOp::Mul
        | JsOp::Div
        | JsOp::Mod
        | JsOp::In
        | JsOp::Instanceof
    )
  }

  /// Ops that address a binding by frame slot rather than by name.
  pub fn is_slot_access(self) -> bool {
    matches!(
      self,
      JsOp::GetArg | JsOp::SetArg | JsOp::GetLocal | JsOp::SetLocal
    )
  }
}

#[rustfmt::skip]
pub static DEFAULT_OPS: Lazy<HashMap<ParseNodeKind, JsOp>> = Lazy::new(|| {
  let mut map = HashMap::<ParseNodeKind, JsOp>::new();
  map.insert(ParseNodeKind::Or, JsOp::Or);
  map.insert(ParseNodeKind::And, JsOp::And);
  map.insert(ParseNodeKind::BitOr, JsOp::BitOr);
  map.insert(ParseNodeKind::BitXor, JsOp::BitXor);
  map.insert(ParseNodeKind::BitAnd, JsOp::BitAnd);
  map.insert(ParseNodeKind::Eq, JsOp::Eq);
  map.insert(ParseNodeKind::Ne, JsOp::Ne);
  map.insert(ParseNodeKind::StrictEq, JsOp::StrictEq);
  map.insert(ParseNodeKind::StrictNe, JsOp::StrictNe);
  map.insert(ParseNodeKind::Lt, JsOp::Lt);
  map.insert(ParseNodeKind::Le, JsOp::Le);
  map.insert(ParseNodeKind::Gt, JsOp::Gt);
  map.insert(ParseNodeKind::Ge, JsOp::Ge);
  map.insert(ParseNodeKind::Lsh, JsOp::Lsh);
  map.insert(ParseNodeKind::Rsh, JsOp::Rsh);
  map.insert(ParseNodeKind::Ursh, JsOp::Ursh);
  map.insert(ParseNodeKind::Add, JsOp::Add);
  map.insert(ParseNodeKind::Sub, JsOp::Sub);
  map.insert(ParseNodeKind::Star, JsOp::Mul);
  map.insert(ParseNodeKind::Div, JsOp::Div);
  map.insert(ParseNodeKind::Mod, JsOp::Mod);
  map.insert(ParseNodeKind::In, JsOp::In);
  map.insert(ParseNodeKind::Instanceof, JsOp::Instanceof);
  map.insert(ParseNodeKind::Not, JsOp::Not);
  map.insert(ParseNodeKind::BitNot, JsOp::BitNot);
  map.insert(ParseNodeKind::Neg, JsOp::Neg);
  map.insert(ParseNodeKind::Pos, JsOp::Pos);
  map.insert(ParseNodeKind::Typeof, JsOp::Typeof);
  map.insert(ParseNodeKind::Void, JsOp::Void);
  map.insert(ParseNodeKind::AddAssign, JsOp::Add);
  map.insert(ParseNodeKind::SubAssign, JsOp::Sub);
  map.insert(ParseNodeKind::BitOrAssign, JsOp::BitOr);
  map.insert(ParseNodeKind::BitXorAssign, JsOp::BitXor);
  map.insert(ParseNodeKind::BitAndAssign, JsOp::BitAnd);
  map.insert(ParseNodeKind::LshAssign, JsOp::Lsh);
  map.insert(ParseNodeKind::RshAssign, JsOp::Rsh);
  map.insert(ParseNodeKind::UrshAssign, JsOp::Ursh);
  map.insert(ParseNodeKind::MulAssign, JsOp::Mul);
  map.insert(ParseNodeKind::DivAssign, JsOp::Div);
  map.insert(ParseNodeKind::ModAssign, JsOp::Mod);
  map.insert(ParseNodeKind::Name, JsOp::Name);
  map.insert(ParseNodeKind::Number, JsOp::Double);
  map.insert(ParseNodeKind::String, JsOp::String);
  map.insert(ParseNodeKind::RegExp, JsOp::RegExp);
  map.insert(ParseNodeKind::True, JsOp::True);
  map.insert(ParseNodeKind::False, JsOp::False);
  map.insert(ParseNodeKind::Null, JsOp::Null);
  map.insert(ParseNodeKind::This, JsOp::This);
  map.insert(ParseNodeKind::Dot, JsOp::GetProp);
  map.insert(ParseNodeKind::Lb, JsOp::GetElem);
  map.insert(ParseNodeKind::Lp, JsOp::Call);
  map.insert(ParseNodeKind::New, JsOp::New);
  map.insert(ParseNodeKind::Throw, JsOp::Throw);
  map.insert(ParseNodeKind::Return, JsOp::Return);
  map.insert(ParseNodeKind::Yield, JsOp::Yield);
  map.insert(ParseNodeKind::ArrayPush, JsOp::ArrayComp);
  map
});

/// The op a freshly built node of `kind` carries unless the builder says otherwise.
pub fn default_op(kind: ParseNodeKind) -> JsOp {
  DEFAULT_OPS.get(&kind).copied().unwrap_or(JsOp::Nop)
}

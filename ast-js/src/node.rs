use crate::atom::Atom;
use crate::cookie::UpvarCookie;
use crate::flags::DefnFlags;
use crate::flags::ListFlags;
use crate::flags::NodeFlags;
use crate::funbox::FunctionBoxId;
use crate::kind::ParseNodeKind;
use crate::loc::TokenPos;
use crate::num::JsNumber;
use crate::op::JsOp;
use derive_more::derive::From;
use derive_more::derive::TryInto;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;

/// Stable identity of a node within its arena. Rewriting a node in place keeps its id, so every
/// link that targets it stays valid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Debug for NodeId {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Arity {
  Nullary,
  Unary,
  Binary,
  Ternary,
  List,
  Name,
  NameSet,
  Func,
}

/// Leaves: keywords, literals, and the optional label of `break`/`continue`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Nullary {
  #[default]
  Empty,
  Atom(Atom),
  Number(JsNumber),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct UnaryData {
  pub kid: Option<NodeId>,
  /// Synthesized by the parser rather than written by the user, e.g. the expression statement around
  /// a directive.
  pub hidden: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryData {
  pub left: NodeId,
  pub right: NodeId,
  /// Folded value of a `case` label.
  pub const_value: Option<JsNumber>,
  /// `for-in` iteration flags.
  pub iter_flags: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TernaryData {
  pub kid1: Option<NodeId>,
  pub kid2: Option<NodeId>,
  pub kid3: Option<NodeId>,
}

/// A singly-linked chain through `ParseNode::next`. `tail` is the last element, and is `None`
/// exactly when `count` is zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ListData {
  pub head: Option<NodeId>,
  pub tail: Option<NodeId>,
  pub count: u32,
  pub xflags: ListFlags,
  pub block_id: u32,
}

/// An identifier: a definition, a use of one, or a property name hanging off `Dot`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameData {
  pub atom: Atom,
  /// Initializer of a definition, object of a `Dot`, or body of a labeled or lexical scope node.
  /// Never set on a use.
  pub expr: Option<NodeId>,
  /// Definition this use resolved to. Only set on uses.
  pub lexdef: Option<NodeId>,
  pub cookie: UpvarCookie,
  pub dflags: DefnFlags,
  pub block_id: u32,
}

impl NameData {
  pub fn new(atom: Atom) -> NameData {
    NameData {
      atom,
      expr: None,
      lexdef: None,
      cookie: UpvarCookie::free(),
      dflags: DefnFlags::empty(),
      block_id: 0,
    }
  }
}

/// Names bound to definitions, plus the subtree they scope over.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NameSetData {
  pub names: BTreeMap<Atom, NodeId>,
  pub tree: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FuncData {
  pub funbox: FunctionBoxId,
  pub atom: Option<Atom>,
  pub body: Option<NodeId>,
  pub cookie: UpvarCookie,
  pub dflags: DefnFlags,
  pub block_id: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, From, TryInto)]
#[try_into(owned, ref, ref_mut)]
pub enum Payload {
  Nullary(Nullary),
  Unary(UnaryData),
  Binary(BinaryData),
  Ternary(TernaryData),
  List(ListData),
  Name(NameData),
  NameSet(NameSetData),
  Func(FuncData),
}

impl Payload {
  pub fn arity(&self) -> Arity {
    match self {
      Payload::Nullary(_) => Arity::Nullary,
      Payload::Unary(_) => Arity::Unary,
      Payload::Binary(_) => Arity::Binary,
      Payload::Ternary(_) => Arity::Ternary,
      Payload::List(_) => Arity::List,
      Payload::Name(_) => Arity::Name,
      Payload::NameSet(_) => Arity::NameSet,
      Payload::Func(_) => Arity::Func,
    }
  }

  /// Direct children, in source order.
  pub fn children(&self) -> Vec<NodeId> {
    match self {
      Payload::Nullary(_) => Vec::new(),
      Payload::Unary(u) => u.kid.into_iter().collect(),
      Payload::Binary(b) => vec![b.left, b.right],
      Payload::Ternary(t) => [t.kid1, t.kid2, t.kid3].into_iter().flatten().collect(),
      // List elements are reached through sibling links, which needs the arena.
      Payload::List(_) => Vec::new(),
      Payload::Name(n) => n.expr.into_iter().collect(),
      Payload::NameSet(s) => s.tree.into_iter().collect(),
      Payload::Func(f) => f.body.into_iter().collect(),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseNode {
  pub kind: ParseNodeKind,
  pub op: JsOp,
  pub flags: NodeFlags,
  pub pos: TokenPos,
  /// Next element when this node is in a list.
  pub next: Option<NodeId>,
  /// First use of this definition.
  pub use_head: Option<NodeId>,
  /// Next use of the same definition.
  pub next_use: Option<NodeId>,
  /// Next would-be method lambda of the enclosing function.
  pub next_method: Option<NodeId>,
  pub payload: Payload,
}

impl ParseNode {
  pub fn new(kind: ParseNodeKind, op: JsOp, pos: TokenPos, payload: Payload) -> ParseNode {
    ParseNode {
      kind,
      op,
      flags: NodeFlags::empty(),
      pos,
      next: None,
      use_head: None,
      next_use: None,
      next_method: None,
      payload,
    }
  }

  pub fn arity(&self) -> Arity {
    self.payload.arity()
  }

  pub fn is_kind(&self, kind: ParseNodeKind) -> bool {
    self.kind == kind
  }

  pub fn is_op(&self, op: JsOp) -> bool {
    self.op == op
  }

  pub fn is_in_parens(&self) -> bool {
    self.flags.contains(NodeFlags::PARENS)
  }

  pub fn set_in_parens(&mut self, enabled: bool) {
    self.flags.set(NodeFlags::PARENS, enabled);
  }

  pub fn is_used(&self) -> bool {
    self.flags.contains(NodeFlags::USED)
  }

  pub fn is_defn(&self) -> bool {
    self.flags.contains(NodeFlags::DEFN)
  }

  pub fn set_used(&mut self, used: bool) {
    debug_assert!(!(used && self.is_defn()), "a definition cannot be a use");
    self.flags.set(NodeFlags::USED, used);
  }

  pub fn set_defn(&mut self, defn: bool) {
    debug_assert!(!(defn && self.is_used()), "a use cannot be a definition");
    self.flags.set(NodeFlags::DEFN, defn);
  }

  pub fn as_nullary(&self) -> Option<&Nullary> {
    (&self.payload).try_into().ok()
  }

  pub fn as_unary(&self) -> Option<&UnaryData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_unary_mut(&mut self) -> Option<&mut UnaryData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_binary(&self) -> Option<&BinaryData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_binary_mut(&mut self) -> Option<&mut BinaryData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_ternary(&self) -> Option<&TernaryData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_ternary_mut(&mut self) -> Option<&mut TernaryData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_list(&self) -> Option<&ListData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_list_mut(&mut self) -> Option<&mut ListData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_name(&self) -> Option<&NameData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_name_mut(&mut self) -> Option<&mut NameData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_nameset(&self) -> Option<&NameSetData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_nameset_mut(&mut self) -> Option<&mut NameSetData> {
    (&mut self.payload).try_into().ok()
  }

  pub fn as_func(&self) -> Option<&FuncData> {
    (&self.payload).try_into().ok()
  }

  pub fn as_func_mut(&mut self) -> Option<&mut FuncData> {
    (&mut self.payload).try_into().ok()
  }

  /// The identifier of a name node, or the name of a named function.
  pub fn atom(&self) -> Option<Atom> {
    match &self.payload {
      Payload::Name(n) => Some(n.atom),
      Payload::Func(f) => f.atom,
      Payload::Nullary(Nullary::Atom(a)) => Some(*a),
      _ => None,
    }
  }

  pub fn number(&self) -> Option<JsNumber> {
    match self.payload {
      Payload::Nullary(Nullary::Number(n)) if self.kind == ParseNodeKind::Number => Some(n),
      _ => None,
    }
  }

  pub fn funbox(&self) -> Option<FunctionBoxId> {
    self.as_func().map(|f| f.funbox)
  }

  /// Initializer or sub-expression of a name node. Uses carry no expression.
  pub fn expr(&self) -> Option<NodeId> {
    debug_assert!(!self.is_used(), "expr() on a use");
    self.maybe_expr()
  }

  pub fn maybe_expr(&self) -> Option<NodeId> {
    match &self.payload {
      Payload::Name(n) if !self.is_used() => n.expr,
      _ => None,
    }
  }

  /// Definition a use is linked to.
  pub fn lexdef(&self) -> Option<NodeId> {
    debug_assert!(
      self.is_used() || self.test(DefnFlags::DEOPTIMIZED),
      "lexdef() on a node that is not a use"
    );
    self.maybe_lexdef()
  }

  pub fn maybe_lexdef(&self) -> Option<NodeId> {
    match &self.payload {
      Payload::Name(n) if self.is_used() || n.dflags.contains(DefnFlags::DEOPTIMIZED) => {
        n.lexdef
      }
      _ => None,
    }
  }

  pub fn dflags(&self) -> DefnFlags {
    match &self.payload {
      Payload::Name(n) => n.dflags,
      Payload::Func(f) => f.dflags,
      _ => DefnFlags::empty(),
    }
  }

  /// Definition flags of a name or function node; `None` for every other arity.
  pub fn dflags_mut(&mut self) -> Option<&mut DefnFlags> {
    match &mut self.payload {
      Payload::Name(n) => Some(&mut n.dflags),
      Payload::Func(f) => Some(&mut f.dflags),
      _ => None,
    }
  }

  pub fn test(&self, flag: DefnFlags) -> bool {
    debug_assert!(
      self.is_defn() || matches!(self.arity(), Arity::Name | Arity::Func),
      "definition flags tested on a {:?} node",
      self.arity()
    );
    self.dflags().intersects(flag)
  }

  pub fn add_dflags(&mut self, flags: DefnFlags) {
    if let Some(dflags) = self.dflags_mut() {
      *dflags |= flags;
    } else {
      debug_assert!(false, "definition flags set on a {:?} node", self.arity());
    };
  }

  pub fn is_let(&self) -> bool {
    self.test(DefnFlags::LET)
  }

  pub fn is_const(&self) -> bool {
    self.test(DefnFlags::CONST)
  }

  pub fn is_placeholder(&self) -> bool {
    self.test(DefnFlags::PLACEHOLDER)
  }

  pub fn is_deoptimized(&self) -> bool {
    self.test(DefnFlags::DEOPTIMIZED)
  }

  pub fn is_assigned(&self) -> bool {
    self.test(DefnFlags::ASSIGNED)
  }

  pub fn is_fun_arg(&self) -> bool {
    self.test(DefnFlags::FUNARG)
  }

  pub fn is_closed(&self) -> bool {
    self.test(DefnFlags::CLOSED)
  }

  pub fn is_bound(&self) -> bool {
    self.test(DefnFlags::BOUND)
  }

  pub fn is_initialized(&self) -> bool {
    self.test(DefnFlags::INITIALIZED)
  }

  pub fn is_top_level(&self) -> bool {
    self.test(DefnFlags::TOPLEVEL)
  }

  pub fn is_block_child(&self) -> bool {
    self.test(DefnFlags::BLOCKCHILD)
  }

  pub fn cookie(&self) -> UpvarCookie {
    match &self.payload {
      Payload::Name(n) => n.cookie,
      Payload::Func(f) => f.cookie,
      _ => UpvarCookie::free(),
    }
  }

  pub fn cookie_mut(&mut self) -> Option<&mut UpvarCookie> {
    match &mut self.payload {
      Payload::Name(n) => Some(&mut n.cookie),
      Payload::Func(f) => Some(&mut f.cookie),
      _ => None,
    }
  }

  pub fn block_id(&self) -> Option<u32> {
    match &self.payload {
      Payload::Name(n) => Some(n.block_id),
      Payload::Func(f) => Some(f.block_id),
      Payload::List(l) => Some(l.block_id),
      _ => None,
    }
  }

  pub fn set_block_id(&mut self, block_id: u32) {
    match &mut self.payload {
      Payload::Name(n) => n.block_id = block_id,
      Payload::Func(f) => f.block_id = block_id,
      Payload::List(l) => l.block_id = block_id,
      _ => {}
    }
  }

  pub fn is_assignment(&self) -> bool {
    self.kind.is_assignment() && self.arity() == Arity::Binary
  }

  /// Literals and the keywords `this`, `null`, `true`, `false`.
  pub fn is_literal(&self) -> bool {
    matches!(self.arity(), Arity::Nullary)
      && (self.kind.is_literal() || self.kind == ParseNodeKind::This)
  }

  pub fn is_number_literal(&self) -> bool {
    self.number().is_some()
  }

  pub fn is_string_literal(&self) -> bool {
    self.kind == ParseNodeKind::String && self.arity() == Arity::Nullary
  }

  /// An elided element of an array initializer, as in `[1, , 3]`.
  pub fn is_array_hole(&self) -> bool {
    self.kind == ParseNodeKind::Comma && self.arity() == Arity::Nullary
  }

  /// Literal whose value is known without evaluation.
  pub fn is_constant(&self) -> bool {
    matches!(
      self.kind,
      ParseNodeKind::Number
        | ParseNodeKind::String
        | ParseNodeKind::True
        | ParseNodeKind::False
        | ParseNodeKind::Null
    ) && self.arity() == Arity::Nullary
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::loc::TokenPos;

  #[test]
  fn payload_conversions_follow_arity() {
    let mut node = ParseNode::new(
      ParseNodeKind::Name,
      JsOp::Name,
      TokenPos::default(),
      NameData::new(Atom(3)).into(),
    );
    assert_eq!(node.arity(), Arity::Name);
    assert!(node.as_binary().is_none());
    assert!(node.as_list().is_none());
    assert_eq!(node.atom(), Some(Atom(3)));
    node.as_name_mut().unwrap().expr = Some(NodeId(9));
    assert_eq!(node.expr(), Some(NodeId(9)));
    assert_eq!(node.maybe_lexdef(), None);
  }

  #[test]
  fn expr_and_lexdef_are_mutually_exclusive_views() {
    let mut data = NameData::new(Atom(0));
    data.lexdef = Some(NodeId(1));
    let mut node = ParseNode::new(
      ParseNodeKind::Name,
      JsOp::Name,
      TokenPos::default(),
      data.into(),
    );
    assert_eq!(node.maybe_lexdef(), None);
    node.set_used(true);
    assert_eq!(node.lexdef(), Some(NodeId(1)));
    assert_eq!(node.maybe_expr(), None);
  }

  #[test]
  fn literal_predicates() {
    let hole = ParseNode::new(
      ParseNodeKind::Comma,
      JsOp::Nop,
      TokenPos::default(),
      Nullary::Empty.into(),
    );
    assert!(hole.is_array_hole());
    assert!(!hole.is_literal());
    let this = ParseNode::new(
      ParseNodeKind::This,
      JsOp::This,
      TokenPos::default(),
      Nullary::Empty.into(),
    );
    assert!(this.is_literal());
    assert!(!this.is_constant());
    let one = ParseNode::new(
      ParseNodeKind::Number,
      JsOp::Double,
      TokenPos::default(),
      Nullary::Number(JsNumber(1.0)).into(),
    );
    assert!(one.is_constant());
    assert_eq!(one.number(), Some(JsNumber(1.0)));
  }
}

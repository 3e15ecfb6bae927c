//! Typed views of nodes whose meaning depends on a particular kind, op, and arity together. Each
//! `as_*` accessor returns `None` unless the node has exactly that shape.

use crate::arena::ParseNodeArena;
use crate::atom::Atom;
use crate::error::AstResult;
use crate::kind::ParseNodeKind;
use crate::loc::TokenPos;
use crate::node::Arity;
use crate::node::NameData;
use crate::node::NodeId;
use crate::node::Nullary;
use crate::node::ParseNode;
use crate::op::JsOp;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BreakStatement {
  pub node: NodeId,
  pub label: Option<Atom>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContinueStatement {
  pub node: NodeId,
  pub label: Option<Atom>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConditionalExpression {
  pub node: NodeId,
  pub condition: NodeId,
  pub then_expression: NodeId,
  pub else_expression: NodeId,
}

/// `expression.name`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyAccess {
  pub node: NodeId,
  pub expression: NodeId,
  pub name: Atom,
}

/// `left[right]`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyByValue {
  pub node: NodeId,
  pub left: NodeId,
  pub right: NodeId,
}

fn loop_control_label(node: &ParseNode, kind: ParseNodeKind) -> Option<Option<Atom>> {
  if node.kind != kind || node.op != JsOp::Nop {
    return None;
  };
  match node.as_nullary()? {
    Nullary::Empty => Some(None),
    Nullary::Atom(label) => Some(Some(*label)),
    Nullary::Number(_) => None,
  }
}

impl ParseNodeArena {
  pub fn as_break_statement(&self, id: NodeId) -> Option<BreakStatement> {
    let label = loop_control_label(&self[id], ParseNodeKind::Break)?;
    Some(BreakStatement { node: id, label })
  }

  pub fn as_continue_statement(&self, id: NodeId) -> Option<ContinueStatement> {
    let label = loop_control_label(&self[id], ParseNodeKind::Continue)?;
    Some(ContinueStatement { node: id, label })
  }

  pub fn as_conditional_expression(&self, id: NodeId) -> Option<ConditionalExpression> {
    let node = &self[id];
    if node.kind != ParseNodeKind::Conditional || node.op != JsOp::Nop {
      return None;
    };
    let t = node.as_ternary()?;
    Some(ConditionalExpression {
      node: id,
      condition: t.kid1?,
      then_expression: t.kid2?,
      else_expression: t.kid3?,
    })
  }

  pub fn as_property_access(&self, id: NodeId) -> Option<PropertyAccess> {
    let node = &self[id];
    if node.kind != ParseNodeKind::Dot || node.op != JsOp::GetProp || node.is_used() {
      return None;
    };
    let name = node.as_name()?;
    Some(PropertyAccess {
      node: id,
      expression: name.expr?,
      name: name.atom,
    })
  }

  pub fn as_property_by_value(&self, id: NodeId) -> Option<PropertyByValue> {
    let node = &self[id];
    if node.kind != ParseNodeKind::Lb || node.op != JsOp::GetElem {
      return None;
    };
    let bin = node.as_binary()?;
    Some(PropertyByValue {
      node: id,
      left: bin.left,
      right: bin.right,
    })
  }

  pub fn new_break_statement(&mut self, label: Option<Atom>, pos: TokenPos) -> AstResult<NodeId> {
    let payload = label.map_or(Nullary::Empty, Nullary::Atom);
    self.allocate(ParseNodeKind::Break, JsOp::Nop, payload.into(), pos)
  }

  pub fn new_continue_statement(
    &mut self,
    label: Option<Atom>,
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    let payload = label.map_or(Nullary::Empty, Nullary::Atom);
    self.allocate(ParseNodeKind::Continue, JsOp::Nop, payload.into(), pos)
  }

  pub fn new_conditional_expression(
    &mut self,
    condition: NodeId,
    then_expression: NodeId,
    else_expression: NodeId,
  ) -> AstResult<NodeId> {
    let pos = self[condition].pos + self[else_expression].pos;
    self.new_ternary(
      ParseNodeKind::Conditional,
      JsOp::Nop,
      [Some(condition), Some(then_expression), Some(else_expression)],
      pos,
    )
  }

  pub fn new_property_access(
    &mut self,
    expression: NodeId,
    name: Atom,
    end: TokenPos,
  ) -> AstResult<NodeId> {
    let pos = self[expression].pos + end;
    let mut data = NameData::new(name);
    data.expr = Some(expression);
    self.allocate(ParseNodeKind::Dot, JsOp::GetProp, data.into(), pos)
  }

  pub fn new_property_by_value(&mut self, left: NodeId, right: NodeId) -> AstResult<NodeId> {
    self.new_binary(ParseNodeKind::Lb, JsOp::GetElem, left, right)
  }

  pub fn new_this(&mut self, pos: TokenPos) -> AstResult<NodeId> {
    self.new_nullary(ParseNodeKind::This, JsOp::This, pos)
  }

  pub fn new_null(&mut self, pos: TokenPos) -> AstResult<NodeId> {
    self.new_nullary(ParseNodeKind::Null, JsOp::Null, pos)
  }

  pub fn new_boolean(&mut self, value: bool, pos: TokenPos) -> AstResult<NodeId> {
    if value {
      self.new_nullary(ParseNodeKind::True, JsOp::True, pos)
    } else {
      self.new_nullary(ParseNodeKind::False, JsOp::False, pos)
    }
  }

  pub fn new_debugger_statement(&mut self, pos: TokenPos) -> AstResult<NodeId> {
    self.new_nullary(ParseNodeKind::Debugger, JsOp::Nop, pos)
  }

  /// An expression statement. Directives are marked hidden, as they are not ordinary statements.
  pub fn new_expression_statement(
    &mut self,
    expr: NodeId,
    directive: bool,
  ) -> AstResult<NodeId> {
    let pos = self[expr].pos;
    let stmt = self.new_unary(ParseNodeKind::Semi, JsOp::Nop, pos, Some(expr))?;
    if let Some(unary) = self[stmt].as_unary_mut() {
      unary.hidden = directive;
    };
    Ok(stmt)
  }

  /// The string of a statement consisting only of an unparenthesized string literal.
  pub fn string_expr_statement(&self, id: NodeId) -> Option<Atom> {
    let node = &self[id];
    if node.kind != ParseNodeKind::Semi {
      return None;
    };
    let kid = &self[node.as_unary()?.kid?];
    if !kid.is_string_literal() || kid.is_in_parens() {
      return None;
    };
    kid.atom()
  }

  pub fn is_string_expr_statement(&self, id: NodeId) -> bool {
    self.string_expr_statement(id).is_some()
  }

  /// True if the literal's source text is exactly its value between quotes, so that it contains no
  /// escapes or line continuations. Only such literals can be directives like `"use strict"`.
  pub fn is_escape_free_string_literal(&self, id: NodeId) -> bool {
    let node = &self[id];
    debug_assert!(node.is_string_literal() && !node.is_in_parens());
    let Some(atom) = node.atom() else {
      return false;
    };
    let pos = node.pos;
    pos.begin.lineno == pos.end.lineno
      && pos.begin.index as usize + self.atoms.js_len(atom) + 2 == pos.end.index as usize
  }

  pub fn is_directive_prologue_member(&self, id: NodeId) -> bool {
    let node = &self[id];
    node.kind == ParseNodeKind::Semi && node.as_unary().is_some_and(|u| u.hidden)
  }

  /// The statement list or argument-and-body list of a function, looking through any `Upvars`
  /// wrapper.
  pub fn function_body(&self, fun: NodeId) -> Option<NodeId> {
    let body = self[fun].as_func()?.body?;
    let node = &self[body];
    if node.kind == ParseNodeKind::Upvars {
      return node.as_nameset()?.tree;
    };
    Some(body)
  }

  /// For a call whose callee is a generator-expression lambda, the body of the lexical scope the
  /// generator expression was desugared into.
  pub fn generator_expr(&self, id: NodeId) -> Option<NodeId> {
    let node = &self[id];
    if node.kind != ParseNodeKind::Lp {
      return None;
    };
    let callee = node.as_list()?.head?;
    if self[callee].kind != ParseNodeKind::Function {
      return None;
    };
    let body = &self[self.function_body(callee)?];
    if body.kind != ParseNodeKind::LexicalScope || body.arity() != Arity::Name {
      return None;
    };
    body.maybe_expr()
  }

  pub fn is_generator_expr(&self, id: NodeId) -> bool {
    self.generator_expr(id).is_some()
  }
}

#[cfg(test)]
mod tests {
  use crate::arena::ParseNodeArena;
  use crate::kind::ParseNodeKind;
  use crate::loc::TokenPos;
  use crate::op::JsOp;

  #[test]
  fn break_casts_only_break() {
    let mut arena = ParseNodeArena::default();
    let label = arena.atoms.intern("outer");
    let brk = arena
      .new_break_statement(Some(label), TokenPos::default())
      .unwrap();
    let view = arena.as_break_statement(brk).unwrap();
    assert_eq!(view.label, Some(label));
    assert!(arena.as_continue_statement(brk).is_none());
    assert!(arena.as_conditional_expression(brk).is_none());

    let cont = arena.new_continue_statement(None, TokenPos::default()).unwrap();
    assert_eq!(arena.as_continue_statement(cont).unwrap().label, None);
  }

  #[test]
  fn property_views() {
    let mut arena = ParseNodeArena::default();
    let obj = arena.atoms.intern("obj");
    let prop = arena.atoms.intern("prop");
    let obj = arena.new_name(obj, TokenPos::on_line(1, 0, 3)).unwrap();
    let dot = arena
      .new_property_access(obj, prop, TokenPos::on_line(1, 4, 8))
      .unwrap();
    let view = arena.as_property_access(dot).unwrap();
    assert_eq!(view.expression, obj);
    assert_eq!(view.name, prop);
    assert_eq!(arena[dot].pos, TokenPos::on_line(1, 0, 8));
    assert!(arena.as_property_by_value(dot).is_none());

    let zero = arena.new_number(0.0, TokenPos::on_line(1, 12, 13)).unwrap();
    let elem = arena.new_property_by_value(dot, zero).unwrap();
    let view = arena.as_property_by_value(elem).unwrap();
    assert_eq!((view.left, view.right), (dot, zero));
  }

  #[test]
  fn conditional_requires_all_branches() {
    let mut arena = ParseNodeArena::default();
    let c = arena.new_boolean(true, TokenPos::on_line(1, 0, 4)).unwrap();
    let t = arena.new_this(TokenPos::on_line(1, 7, 11)).unwrap();
    let e = arena.new_null(TokenPos::on_line(1, 14, 18)).unwrap();
    let cond = arena.new_conditional_expression(c, t, e).unwrap();
    let view = arena.as_conditional_expression(cond).unwrap();
    assert_eq!(
      (view.condition, view.then_expression, view.else_expression),
      (c, t, e)
    );
    let partial = arena
      .new_ternary(
        ParseNodeKind::Conditional,
        JsOp::Nop,
        [Some(c), Some(t), None],
        TokenPos::default(),
      )
      .unwrap();
    assert!(arena.as_conditional_expression(partial).is_none());
  }

  #[test]
  fn directives() {
    let mut arena = ParseNodeArena::default();
    // "use strict" spans the quotes, so its source length is 12.
    let plain = arena
      .new_string("use strict", TokenPos::on_line(1, 0, 12))
      .unwrap();
    let stmt = arena.new_expression_statement(plain, true).unwrap();
    assert!(arena.is_string_expr_statement(stmt));
    assert!(arena.is_directive_prologue_member(stmt));
    assert!(arena.is_escape_free_string_literal(plain));

    // 'use\x20strict' has the same value but longer source text.
    let escaped = arena
      .new_string("use strict", TokenPos::on_line(2, 0, 15))
      .unwrap();
    assert!(!arena.is_escape_free_string_literal(escaped));

    let parenthesized = arena
      .new_string("use strict", TokenPos::on_line(3, 1, 13))
      .unwrap();
    arena[parenthesized].set_in_parens(true);
    let stmt = arena
      .new_expression_statement(parenthesized, false)
      .unwrap();
    assert!(!arena.is_string_expr_statement(stmt));
    assert!(!arena.is_directive_prologue_member(stmt));
  }

  #[test]
  fn generator_expression_call() {
    let mut arena = ParseNodeArena::default();
    let pos = TokenPos::default();
    let (lambda, _) = arena
      .new_function(JsOp::Lambda, None, None, false, pos)
      .unwrap();
    let yielded = arena.new_number(1.0, pos).unwrap();
    let scope_atom = arena.atoms.intern("");
    let scope = arena.new_name(scope_atom, pos).unwrap();
    arena[scope].kind = ParseNodeKind::LexicalScope;
    arena[scope].op = JsOp::LeaveBlock;
    arena[scope].as_name_mut().unwrap().expr = Some(yielded);
    arena[lambda].as_func_mut().unwrap().body = Some(scope);

    let call = arena
      .make_empty_list(ParseNodeKind::Lp, JsOp::Call, pos)
      .unwrap();
    arena.init_list(call, lambda);
    assert!(arena.is_generator_expr(call));
    assert_eq!(arena.generator_expr(call), Some(yielded));

    let plain = arena.new_number(2.0, pos).unwrap();
    assert!(!arena.is_generator_expr(plain));
  }
}

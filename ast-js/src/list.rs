use crate::arena::ParseNodeArena;
use crate::error::AstResult;
use crate::flags::ListFlags;
use crate::kind::ParseNodeKind;
use crate::loc::TokenPos;
use crate::node::ListData;
use crate::node::NodeId;
use crate::node::Payload;
use crate::op::JsOp;
use std::iter::FusedIterator;

/// Iterates the elements of a list node in order.
pub struct ListIter<'a> {
  arena: &'a ParseNodeArena,
  cur: Option<NodeId>,
}

impl<'a> Iterator for ListIter<'a> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.cur?;
    self.cur = self.arena[id].next;
    Some(id)
  }
}

impl<'a> FusedIterator for ListIter<'a> {}

impl ParseNodeArena {
  fn list(&self, list: NodeId) -> &ListData {
    match self[list].as_list() {
      Some(data) => data,
      None => panic!("{list:?} is a {:?} node, not a list", self[list].arity()),
    }
  }

  fn list_mut(&mut self, list: NodeId) -> &mut ListData {
    let arity = self[list].arity();
    match self[list].as_list_mut() {
      Some(data) => data,
      None => panic!("{list:?} is a {arity:?} node, not a list"),
    }
  }

  pub fn make_empty_list(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    self.allocate(kind, op, ListData::default().into(), pos)
  }

  /// Makes `first` the only element of the empty list `list`, taking over its span.
  pub fn init_list(&mut self, list: NodeId, first: NodeId) {
    debug_assert_eq!(self.list(list).count, 0, "init_list on a non-empty list");
    debug_assert!(self[first].next.is_none());
    let pos = self[first].pos;
    let data = self.list_mut(list);
    data.head = Some(first);
    data.tail = Some(first);
    data.count = 1;
    self[list].pos = pos;
  }

  /// Appends `node` after the current tail in constant time and extends the list's span to cover it.
  pub fn append(&mut self, list: NodeId, node: NodeId) {
    debug_assert!(self[node].next.is_none(), "{node:?} is already in a list");
    let end = self[node].pos.end;
    match self.list(list).tail {
      Some(tail) => self[tail].next = Some(node),
      None => self.list_mut(list).head = Some(node),
    };
    let data = self.list_mut(list);
    data.tail = Some(node);
    data.count += 1;
    let pos = &mut self[list].pos;
    if pos.end < end {
      pos.end = end;
    };
  }

  /// Forgets every element without recycling them.
  pub fn make_empty(&mut self, list: NodeId) {
    let data = self.list_mut(list);
    data.head = None;
    data.tail = None;
    data.count = 0;
  }

  pub fn last(&self, list: NodeId) -> Option<NodeId> {
    self.list(list).tail
  }

  pub fn list_count(&self, list: NodeId) -> u32 {
    self.list(list).count
  }

  pub fn list_iter(&self, list: NodeId) -> ListIter<'_> {
    ListIter {
      arena: self,
      cur: self.list(list).head,
    }
  }

  pub fn list_flags(&self, list: NodeId) -> ListFlags {
    self.list(list).xflags
  }

  /// Flags are only ever added to a list, never removed.
  pub fn add_list_flags(&mut self, list: NodeId, flags: ListFlags) {
    let kind = self[list].kind;
    debug_assert!(
      ListFlags::valid_for(kind).contains(flags),
      "{flags:?} are not meaningful on a {kind:?} list"
    );
    self.list_mut(list).xflags |= flags;
  }

  fn note_add_operand(&mut self, list: NodeId, operand: NodeId) {
    let operand = &self[operand];
    let flag = if operand.is_string_literal() {
      ListFlags::STRCAT
    } else if !operand.is_number_literal() {
      ListFlags::CANTFOLD
    } else {
      return;
    };
    self.add_list_flags(list, flag);
  }

  /// Joins `right` onto `left`, which already has `kind` and `op`. A binary `left` is first rewritten
  /// in place into a two-element list.
  fn join(&mut self, kind: ParseNodeKind, left: NodeId, right: NodeId) -> NodeId {
    if let Some(bin) = self[left].as_binary().copied() {
      let node = &mut self[left];
      node.payload = Payload::List(ListData {
        head: None,
        tail: None,
        count: 0,
        xflags: ListFlags::empty(),
        block_id: 0,
      });
      node.set_in_parens(false);
      let pos = node.pos;
      self.init_list(left, bin.left);
      self.append(left, bin.right);
      self[left].pos = pos;
      if kind == ParseNodeKind::Add {
        self.note_add_operand(left, bin.left);
        self.note_add_operand(left, bin.right);
      };
    };
    self.append(left, right);
    if kind == ParseNodeKind::Add {
      self.note_add_operand(left, right);
    };
    left
  }

  /// Combines two operands of a binary operator.
  ///
  /// - If `left` is already a `kind`/`op` node and `op` is left-associative, `right` is appended to
  ///   it, flattening `a + b + c` into one list.
  /// - Else if both sides of an `Add` are number literals and folding is enabled, the sum is folded
  ///   into `left` and `right` is recycled.
  /// - Else a new binary node is allocated.
  pub fn append_or_join(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    left: NodeId,
    right: NodeId,
  ) -> AstResult<NodeId> {
    let l = &self[left];
    if l.kind == kind && l.op == op && op.is_left_assoc() && l.as_nameset().is_none() {
      if l.as_binary().is_some() || l.as_list().is_some() {
        return Ok(self.join(kind, left, right));
      };
    };

    if kind == ParseNodeKind::Add && self.options().fold_constants {
      if let (Some(a), Some(b)) = (self[left].number(), self[right].number()) {
        let end = self[right].pos.end;
        let node = &mut self[left];
        node.payload = crate::node::Nullary::Number(a + b).into();
        node.pos.end = end;
        self.release_subtree(right);
        return Ok(left);
      };
    };

    self.new_binary(kind, op, left, right)
  }
}

#[cfg(test)]
mod tests {
  use crate::arena::AstOptions;
  use crate::arena::ParseNodeArena;
  use crate::flags::ListFlags;
  use crate::kind::ParseNodeKind;
  use crate::loc::TokenPos;
  use crate::node::Arity;
  use crate::num::JsNumber;
  use crate::op::JsOp;

  fn name(arena: &mut ParseNodeArena, text: &str, col: u32) -> crate::node::NodeId {
    let atom = arena.atoms.intern(text);
    arena
      .new_name(atom, TokenPos::on_line(1, col, col + 1))
      .unwrap()
  }

  #[test]
  fn chained_comparisons_flatten() {
    let mut arena = ParseNodeArena::default();
    let a = name(&mut arena, "a", 0);
    let b = name(&mut arena, "b", 4);
    let c = name(&mut arena, "c", 8);
    let ab = arena
      .append_or_join(ParseNodeKind::Lt, JsOp::Lt, a, b)
      .unwrap();
    assert_eq!(arena[ab].arity(), Arity::Binary);
    let abc = arena
      .append_or_join(ParseNodeKind::Lt, JsOp::Lt, ab, c)
      .unwrap();
    assert_eq!(abc, ab);
    assert_eq!(arena[abc].arity(), Arity::List);
    assert_eq!(arena.list_iter(abc).collect::<Vec<_>>(), vec![a, b, c]);
    assert_eq!(arena.last(abc), Some(c));
    assert_eq!(arena.list_count(abc), 3);
    assert_eq!(arena[abc].pos, TokenPos::on_line(1, 0, 9));
  }

  #[test]
  fn logical_or_is_never_flattened() {
    let mut arena = ParseNodeArena::default();
    let a = name(&mut arena, "a", 0);
    let b = name(&mut arena, "b", 5);
    let c = name(&mut arena, "c", 10);
    let ab = arena
      .append_or_join(ParseNodeKind::Or, JsOp::Or, a, b)
      .unwrap();
    let abc = arena
      .append_or_join(ParseNodeKind::Or, JsOp::Or, ab, c)
      .unwrap();
    assert_ne!(abc, ab);
    let bin = arena[abc].as_binary().unwrap();
    assert_eq!((bin.left, bin.right), (ab, c));
  }

  #[test]
  fn numeric_addition_folds() {
    let mut arena = ParseNodeArena::default();
    let one = arena.new_number(1.0, TokenPos::on_line(1, 0, 1)).unwrap();
    let two = arena.new_number(2.0, TokenPos::on_line(1, 4, 5)).unwrap();
    let sum = arena
      .append_or_join(ParseNodeKind::Add, JsOp::Add, one, two)
      .unwrap();
    assert_eq!(sum, one);
    assert_eq!(arena[sum].number(), Some(JsNumber(3.0)));
    assert_eq!(arena[sum].pos, TokenPos::on_line(1, 0, 5));
    assert!(!arena.is_live(two));
  }

  #[test]
  fn folding_can_be_disabled() {
    let mut arena = ParseNodeArena::new(AstOptions {
      fold_constants: false,
      ..Default::default()
    });
    let one = arena.new_number(1.0, TokenPos::default()).unwrap();
    let two = arena.new_number(2.0, TokenPos::default()).unwrap();
    let sum = arena
      .append_or_join(ParseNodeKind::Add, JsOp::Add, one, two)
      .unwrap();
    assert_eq!(arena[sum].arity(), Arity::Binary);
  }

  #[test]
  fn concatenation_records_fold_hints() {
    let mut arena = ParseNodeArena::default();
    let one = arena.new_number(1.0, TokenPos::default()).unwrap();
    let x = name(&mut arena, "x", 4);
    let pt = arena.new_string("pt", TokenPos::default()).unwrap();
    let sum = arena
      .append_or_join(ParseNodeKind::Add, JsOp::Add, one, x)
      .unwrap();
    let sum = arena
      .append_or_join(ParseNodeKind::Add, JsOp::Add, sum, pt)
      .unwrap();
    assert_eq!(
      arena.list_flags(sum),
      ListFlags::STRCAT | ListFlags::CANTFOLD
    );
  }

  #[test]
  fn empty_list_has_no_tail() {
    let mut arena = ParseNodeArena::default();
    let list = arena
      .make_empty_list(ParseNodeKind::StatementList, JsOp::Nop, TokenPos::default())
      .unwrap();
    assert_eq!(arena.last(list), None);
    assert_eq!(arena.list_iter(list).count(), 0);
    let a = name(&mut arena, "a", 0);
    arena.append(list, a);
    assert_eq!(arena.last(list), Some(a));
    arena.make_empty(list);
    assert_eq!(arena.list_count(list), 0);
    assert_eq!(arena.last(list), None);
  }
}

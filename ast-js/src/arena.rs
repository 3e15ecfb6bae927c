use crate::atom::Atom;
use crate::atom::AtomTable;
use crate::error::AstError;
use crate::error::AstResult;
use crate::funbox::FunctionBoxId;
use crate::funbox::FunctionBoxes;
use crate::kind::ParseNodeKind;
use crate::loc::TokenPos;
use crate::node::Arity;
use crate::node::BinaryData;
use crate::node::FuncData;
use crate::node::NameData;
use crate::node::NameSetData;
use crate::node::NodeId;
use crate::node::Nullary;
use crate::node::ParseNode;
use crate::node::Payload;
use crate::node::TernaryData;
use crate::node::UnaryData;
use crate::num::JsNumber;
use crate::op::default_op;
use crate::op::JsOp;
use crate::cookie::UpvarCookie;
use crate::flags::DefnFlags;
use crate::flags::NodeFlags;
use std::collections::BTreeMap;
use std::ops::Index;
use std::ops::IndexMut;
use tracing::debug;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AstOptions {
  /// Hard limit on the number of slots the arena may grow to. Recycled slots do not count twice.
  pub max_nodes: usize,
  /// Fold `number + number` while joining `Add` operands.
  pub fold_constants: bool,
}

impl Default for AstOptions {
  fn default() -> Self {
    Self {
      max_nodes: 1 << 22,
      fold_constants: true,
    }
  }
}

/// Owns every node of one compilation unit, plus the atoms and function boxes they refer to.
///
/// Slots freed by [`Self::release`] go on a freelist and are handed out again before the arena
/// grows. All nodes are dropped together with the arena.
#[derive(Debug, Default)]
pub struct ParseNodeArena {
  options: AstOptions,
  slots: Vec<Option<ParseNode>>,
  free_list: Vec<u32>,
  live: usize,
  pub atoms: AtomTable,
  pub funboxes: FunctionBoxes,
}

impl ParseNodeArena {
  pub fn new(options: AstOptions) -> ParseNodeArena {
    ParseNodeArena {
      options,
      ..Default::default()
    }
  }

  pub fn options(&self) -> &AstOptions {
    &self.options
  }

  pub fn live_count(&self) -> usize {
    self.live
  }

  /// Number of slots ever created, live or on the freelist.
  pub fn capacity(&self) -> usize {
    self.slots.len()
  }

  pub fn free_count(&self) -> usize {
    self.free_list.len()
  }

  pub fn is_live(&self, id: NodeId) -> bool {
    self.get(id).is_some()
  }

  pub fn get(&self, id: NodeId) -> Option<&ParseNode> {
    self.slots.get(id.index()).and_then(|s| s.as_ref())
  }

  pub fn allocate(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    payload: Payload,
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    let idx = match self.free_list.pop() {
      Some(idx) => idx as usize,
      None => {
        if self.slots.len() >= self.options.max_nodes {
          warn!(limit = self.options.max_nodes, "parse node arena exhausted");
          return Err(AstError::OutOfMemory {
            limit: self.options.max_nodes,
          });
        };
        self.slots.push(None);
        self.slots.len() - 1
      }
    };
    debug_assert!(
      self.slots[idx].is_none(),
      "free list returned an occupied slot"
    );
    self.slots[idx] = Some(ParseNode::new(kind, op, pos, payload));
    self.live += 1;
    Ok(NodeId(idx as u32))
  }

  pub fn new_nullary(&mut self, kind: ParseNodeKind, op: JsOp, pos: TokenPos) -> AstResult<NodeId> {
    self.allocate(kind, op, Nullary::Empty.into(), pos)
  }

  /// A leaf carrying an atom: string literals, regexps, and labels.
  pub fn new_atom_leaf(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    atom: Atom,
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    self.allocate(kind, op, Nullary::Atom(atom).into(), pos)
  }

  pub fn new_number(&mut self, value: f64, pos: TokenPos) -> AstResult<NodeId> {
    self.allocate(
      ParseNodeKind::Number,
      JsOp::Double,
      Nullary::Number(JsNumber(value)).into(),
      pos,
    )
  }

  pub fn new_string(&mut self, value: &str, pos: TokenPos) -> AstResult<NodeId> {
    let atom = self.atoms.intern(value);
    self.new_atom_leaf(ParseNodeKind::String, JsOp::String, atom, pos)
  }

  pub fn new_unary(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    pos: TokenPos,
    kid: Option<NodeId>,
  ) -> AstResult<NodeId> {
    let pos = match kid {
      Some(kid) => pos + self[kid].pos,
      None => pos,
    };
    self.allocate(kind, op, UnaryData { kid, hidden: false }.into(), pos)
  }

  /// A binary node spanning both operands.
  pub fn new_binary(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    left: NodeId,
    right: NodeId,
  ) -> AstResult<NodeId> {
    let pos = self[left].pos + self[right].pos;
    self.allocate(
      kind,
      op,
      BinaryData {
        left,
        right,
        const_value: None,
        iter_flags: 0,
      }
      .into(),
      pos,
    )
  }

  pub fn new_ternary(
    &mut self,
    kind: ParseNodeKind,
    op: JsOp,
    kids: [Option<NodeId>; 3],
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    let [kid1, kid2, kid3] = kids;
    self.allocate(kind, op, TernaryData { kid1, kid2, kid3 }.into(), pos)
  }

  /// A fresh, unresolved `Name` node.
  pub fn new_name(&mut self, atom: Atom, pos: TokenPos) -> AstResult<NodeId> {
    self.allocate(
      ParseNodeKind::Name,
      default_op(ParseNodeKind::Name),
      NameData::new(atom).into(),
      pos,
    )
  }

  pub fn new_nameset(
    &mut self,
    kind: ParseNodeKind,
    names: BTreeMap<Atom, NodeId>,
    tree: Option<NodeId>,
    pos: TokenPos,
  ) -> AstResult<NodeId> {
    self.allocate(kind, JsOp::Nop, NameSetData { names, tree }.into(), pos)
  }

  /// Allocates a `Function` node together with its function box.
  pub fn new_function(
    &mut self,
    op: JsOp,
    atom: Option<Atom>,
    parent: Option<FunctionBoxId>,
    in_loop: bool,
    pos: TokenPos,
  ) -> AstResult<(NodeId, FunctionBoxId)> {
    let level = parent.map_or(1, |p| self.funboxes[p].level + 1);
    let funbox = FunctionBoxId(self.funboxes.len() as u32);
    let node = self.allocate(
      ParseNodeKind::Function,
      op,
      FuncData {
        funbox,
        atom,
        body: None,
        cookie: UpvarCookie::free(),
        dflags: DefnFlags::empty(),
        block_id: 0,
      }
      .into(),
      pos,
    )?;
    let pushed = self.funboxes.push(node, parent, level, in_loop);
    debug_assert_eq!(pushed, funbox);
    Ok((node, funbox))
  }

  /// Returns a single node to the freelist. The caller must already have unlinked it from every list
  /// and use chain. Definitions live until the arena is dropped and are never recycled.
  pub fn release(&mut self, id: NodeId) {
    let Some(node) = self.get(id) else {
      debug_assert!(false, "double release of {id:?}");
      return;
    };
    debug_assert!(!node.is_defn(), "cannot release definition {id:?}");
    debug_assert!(!node.is_used(), "cannot release {id:?} while it is on a use chain");
    if node.is_defn() || node.is_used() {
      debug!(node = ?id, "refusing to release a bound name");
      return;
    };
    self.slots[id.index()] = None;
    self.free_list.push(id.0);
    self.live -= 1;
  }

  /// Detaches the children of `id` onto `stack` and reports whether `id` itself may be recycled.
  /// Bound names stay alive because use chains and scope maps still point at them. Function nodes
  /// stay alive because their function box refers to them.
  fn push_children(&mut self, id: NodeId, stack: &mut Vec<NodeId>) -> bool {
    let node = &mut self[id];
    let used = node.is_used();
    let bound = used || node.is_defn();
    let mut list_head = None;
    let mut detached_binary = false;
    let keep = match &mut node.payload {
      Payload::Nullary(_) => false,
      Payload::Unary(u) => {
        stack.extend(u.kid.take());
        false
      }
      Payload::Binary(b) => {
        stack.push(b.left);
        stack.push(b.right);
        detached_binary = true;
        false
      }
      Payload::Ternary(t) => {
        stack.extend(t.kid1.take());
        stack.extend(t.kid2.take());
        stack.extend(t.kid3.take());
        false
      }
      Payload::List(l) => {
        list_head = l.head.take();
        l.tail = None;
        l.count = 0;
        false
      }
      Payload::Name(n) => {
        if !used {
          stack.extend(n.expr.take());
        };
        false
      }
      Payload::NameSet(s) => {
        stack.extend(s.tree.take());
        false
      }
      Payload::Func(f) => {
        stack.extend(f.body.take());
        true
      }
    };
    if detached_binary {
      node.payload = Nullary::Empty.into();
    };
    let mut cur = list_head;
    while let Some(elem) = cur {
      stack.push(elem);
      cur = self[elem].next.take();
    }
    !bound && !keep
  }

  /// Recycles a dead subtree rooted at `id` and returns the node that followed it in its list, which
  /// is what should take its place in the parent. Definitions, uses, and function nodes found inside
  /// are kept alive and detached.
  pub fn release_subtree(&mut self, id: NodeId) -> Option<NodeId> {
    let saved_next = self[id].next.take();
    let mut stack = vec![id];
    let mut recycled = 0usize;
    while let Some(cur) = stack.pop() {
      self[cur].next = None;
      if self.push_children(cur, &mut stack) {
        self.release(cur);
        recycled += 1;
      };
    }
    debug!(root = ?id, recycled, "released subtree");
    saved_next
  }

  /// Recycles every descendant of `id`, but not `id` itself, so that its slot can be overwritten.
  pub fn prepare_for_mutation(&mut self, id: NodeId) {
    if self[id].arity() == Arity::Nullary {
      return;
    };
    let mut stack = Vec::new();
    self.push_children(id, &mut stack);
    while let Some(cur) = stack.pop() {
      self[cur].next = None;
      if self.push_children(cur, &mut stack) {
        self.release(cur);
      };
    }
  }

  /// Resets `id` to an empty statement, dropping its payload without recycling children.
  pub fn clear(&mut self, id: NodeId) {
    let node = &mut self[id];
    node.kind = ParseNodeKind::Semi;
    node.op = JsOp::Nop;
    node.flags = NodeFlags::empty();
    node.use_head = None;
    node.next_use = None;
    node.payload = Nullary::Empty.into();
  }

  /// Makes `dst` take on the shape and payload of `src`, then clears `src`. If `src` is a use, `dst`
  /// takes over its position in the use chain. `dst` keeps its own span and list position.
  pub fn become_node(&mut self, dst: NodeId, src: NodeId) {
    debug_assert!(!self[dst].is_defn(), "cannot overwrite a definition");
    debug_assert!(!self[src].is_defn(), "cannot move a definition");
    debug_assert!(!self[dst].is_used(), "cannot overwrite a use");

    if self[src].is_used() {
      if let Some(def) = self[src].maybe_lexdef() {
        self.replace_use(def, src, dst);
      };
      let next_use = self[src].next_use.take();
      self[src].set_used(false);
      let node = &mut self[dst];
      node.next_use = next_use;
      node.flags |= NodeFlags::USED;
    };

    let (kind, op, parens, payload) = {
      let src = &self[src];
      (src.kind, src.op, src.is_in_parens(), src.payload.clone())
    };
    let node = &mut self[dst];
    node.kind = kind;
    node.op = op;
    node.set_in_parens(parens);
    node.payload = payload;
    if let Some(funbox) = self[dst].funbox() {
      self.funboxes[funbox].node = dst;
    };
    self.clear(src);
  }

  /// Swaps `old` for `new` in the use chain of `def`.
  pub(crate) fn replace_use(&mut self, def: NodeId, old: NodeId, new: NodeId) {
    if self[def].use_head == Some(old) {
      self[def].use_head = Some(new);
      return;
    };
    let mut cur = self[def].use_head;
    while let Some(id) = cur {
      if self[id].next_use == Some(old) {
        self[id].next_use = Some(new);
        return;
      };
      cur = self[id].next_use;
    }
    debug_assert!(false, "{old:?} is not a use of {def:?}");
  }
}

impl Index<NodeId> for ParseNodeArena {
  type Output = ParseNode;

  fn index(&self, index: NodeId) -> &Self::Output {
    match self.slots.get(index.index()) {
      Some(Some(node)) => node,
      _ => panic!("access to released or foreign node {index:?}"),
    }
  }
}

impl IndexMut<NodeId> for ParseNodeArena {
  fn index_mut(&mut self, index: NodeId) -> &mut Self::Output {
    match self.slots.get_mut(index.index()) {
      Some(Some(node)) => node,
      _ => panic!("access to released or foreign node {index:?}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::loc::TokenPos;

  #[test]
  fn allocation_fails_at_limit() {
    let mut arena = ParseNodeArena::new(AstOptions {
      max_nodes: 2,
      ..Default::default()
    });
    let pos = TokenPos::default();
    let a = arena.new_nullary(ParseNodeKind::Null, JsOp::Null, pos).unwrap();
    arena.new_nullary(ParseNodeKind::Null, JsOp::Null, pos).unwrap();
    let err = arena
      .new_nullary(ParseNodeKind::Null, JsOp::Null, pos)
      .unwrap_err();
    assert_eq!(err, AstError::OutOfMemory { limit: 2 });
    assert_eq!(err.code(), "AST0001");

    // A recycled slot can be handed out again.
    arena.release(a);
    let b = arena.new_nullary(ParseNodeKind::True, JsOp::True, pos).unwrap();
    assert_eq!(a, b);
    assert_eq!(arena[b].kind, ParseNodeKind::True);
  }

  #[test]
  fn prepare_for_mutation_keeps_the_root() {
    let mut arena = ParseNodeArena::default();
    let one = arena.new_number(1.0, TokenPos::on_line(1, 0, 1)).unwrap();
    let two = arena.new_number(2.0, TokenPos::on_line(1, 4, 5)).unwrap();
    let sum = arena
      .new_binary(ParseNodeKind::Sub, JsOp::Sub, one, two)
      .unwrap();
    arena.prepare_for_mutation(sum);
    assert!(arena.is_live(sum));
    assert!(!arena.is_live(one));
    assert!(!arena.is_live(two));
    assert_eq!(arena.live_count(), 1);
    assert_eq!(arena[sum].pos, TokenPos::on_line(1, 0, 5));
  }

  #[test]
  fn clear_leaves_an_empty_statement() {
    let mut arena = ParseNodeArena::default();
    let n = arena.new_number(7.0, TokenPos::default()).unwrap();
    arena[n].set_in_parens(true);
    arena.clear(n);
    assert_eq!(arena[n].kind, ParseNodeKind::Semi);
    assert_eq!(arena[n].arity(), Arity::Nullary);
    assert!(!arena[n].is_in_parens());
  }

  #[test]
  fn become_moves_payload_and_function_box() {
    let mut arena = ParseNodeArena::default();
    let pos = TokenPos::default();
    let (fun, funbox) = arena
      .new_function(JsOp::Lambda, None, None, false, pos)
      .unwrap();
    let dst = arena.new_nullary(ParseNodeKind::Semi, JsOp::Nop, pos).unwrap();
    arena.become_node(dst, fun);
    assert_eq!(arena[dst].kind, ParseNodeKind::Function);
    assert_eq!(arena[dst].funbox(), Some(funbox));
    assert_eq!(arena.funboxes[funbox].node, dst);
    assert_eq!(arena[fun].kind, ParseNodeKind::Semi);
  }
}

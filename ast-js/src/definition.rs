use crate::arena::ParseNodeArena;
use crate::error::AstResult;
use crate::flags::DefnFlags;
use crate::flags::NodeFlags;
use crate::kind::ParseNodeKind;
use crate::node::Arity;
use crate::node::BinaryData;
use crate::node::NodeId;
use crate::node::ParseNode;
use crate::node::Payload;
use crate::op::JsOp;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

/// The binding form a definition was declared with. The first three are the binding forms proper.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefinitionKind {
  Var,
  Const,
  Let,
  Function,
  Arg,
  /// A placeholder for a name used but not (yet) declared.
  Unknown,
}

impl DefinitionKind {
  pub fn is_binding_form(self) -> bool {
    self <= DefinitionKind::Let
  }

  pub fn kind_string(self) -> &'static str {
    match self {
      DefinitionKind::Var => "var",
      DefinitionKind::Const => "const",
      DefinitionKind::Let => "let",
      DefinitionKind::Function => "function",
      DefinitionKind::Arg => "argument",
      DefinitionKind::Unknown => "unknown",
    }
  }
}

impl Display for DefinitionKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.kind_string())
  }
}

/// Iterates the uses of a definition, most recently linked first.
pub struct Uses<'a> {
  arena: &'a ParseNodeArena,
  cur: Option<NodeId>,
}

impl<'a> Iterator for Uses<'a> {
  type Item = NodeId;

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.cur?;
    self.cur = self.arena[id].next_use;
    Some(id)
  }
}

impl ParseNodeArena {
  pub fn definition_kind(&self, def: NodeId) -> DefinitionKind {
    let node = &self[def];
    if node.kind == ParseNodeKind::Function || node.op == JsOp::Callee {
      return DefinitionKind::Function;
    };
    debug_assert_eq!(node.kind, ParseNodeKind::Name);
    if node.op == JsOp::Nop {
      DefinitionKind::Unknown
    } else if node.op == JsOp::GetArg {
      DefinitionKind::Arg
    } else if node.is_const() {
      DefinitionKind::Const
    } else if node.is_let() {
      DefinitionKind::Let
    } else {
      DefinitionKind::Var
    }
  }

  /// Follows use-to-definition links, and the left side of any node that was rewritten into an
  /// assignment, until a definition is reached.
  pub fn resolve(&self, id: NodeId) -> NodeId {
    let mut cur = id;
    let mut steps = 0usize;
    while !self[cur].is_defn() {
      steps += 1;
      debug_assert!(
        steps <= self.capacity(),
        "resolution of {id:?} does not terminate"
      );
      let node = &self[cur];
      let next = if node.is_assignment() {
        node.as_binary().map(|b| b.left)
      } else {
        node.maybe_lexdef()
      };
      match next {
        Some(next) => cur = next,
        None => {
          debug_assert!(false, "{cur:?} is neither a definition nor linked to one");
          return cur;
        }
      };
    }
    cur
  }

  /// Links `use_node` into the use chain of `def`, passing its assignment, funarg, and closure flags
  /// on to the definition.
  pub fn link_use_to_def(&mut self, use_node: NodeId, def: NodeId) {
    debug_assert!(!self[use_node].is_used(), "{use_node:?} is already a use");
    debug_assert!(!self[use_node].is_defn(), "{use_node:?} is a definition");
    debug_assert!(self[def].is_defn(), "{def:?} is not a definition");
    debug_assert_ne!(Some(use_node), self[def].use_head);

    let inherited = self[use_node].dflags() & DefnFlags::USE2DEF;
    let head = self[def].use_head;
    let d = &mut self[def];
    d.use_head = Some(use_node);
    d.add_dflags(inherited);

    let u = &mut self[use_node];
    u.next_use = head;
    u.set_used(true);
    if let Some(name) = u.as_name_mut() {
      name.expr = None;
      name.lexdef = Some(def);
    };
  }

  /// Marks a function or name as escaping as a value, along with whatever it is bound to.
  pub fn set_fun_arg(&mut self, id: NodeId) {
    let node = &self[id];
    debug_assert!(!(node.is_defn() && node.is_used()));
    let def = if node.is_used() { node.maybe_lexdef() } else { None };
    if let Some(def) = def {
      self[def].add_dflags(DefnFlags::FUNARG);
    };
    self[id].add_dflags(DefnFlags::FUNARG);
  }

  /// Marks a use as the target of an assignment, along with its definition.
  pub fn note_lvalue(&mut self, id: NodeId) {
    let node = &self[id];
    let def = if node.is_used() { node.maybe_lexdef() } else { None };
    if let Some(def) = def {
      self[def].add_dflags(DefnFlags::ASSIGNED);
    };
    self[id].add_dflags(DefnFlags::ASSIGNED);
  }

  pub fn uses(&self, def: NodeId) -> Uses<'_> {
    Uses {
      arena: self,
      cur: self[def].use_head,
    }
  }

  /// Tests definition flags, checking in debug builds that use-to-definition flags were propagated.
  pub fn def_test(&self, def: NodeId, flag: DefnFlags) -> bool {
    let node = &self[def];
    let set = node.test(flag);
    if cfg!(debug_assertions)
      && node.is_defn()
      && flag.intersects(DefnFlags::ASSIGNED | DefnFlags::FUNARG)
      && !set
    {
      for u in self.uses(def) {
        debug_assert!(!self[u].is_defn());
        debug_assert!(
          !self[u].dflags().intersects(flag),
          "{flag:?} set on use {u:?} but not on its definition {def:?}"
        );
      }
    };
    set
  }

  /// A definition without a slot, or a global one, is looked up by name at runtime.
  pub fn is_free_var(&self, def: NodeId) -> bool {
    let node = &self[def];
    debug_assert!(node.is_defn());
    node.cookie().is_free() || node.test(DefnFlags::GVAR)
  }

  pub fn is_global(&self, def: NodeId) -> bool {
    let node = &self[def];
    debug_assert!(node.is_defn());
    node.test(DefnFlags::GVAR)
  }

  /// Moves every use of `from` to the front of `to`'s use chain, keeping their order. Returns the
  /// head of the moved uses, if there were any.
  pub fn move_uses(&mut self, from: NodeId, to: NodeId) -> Option<NodeId> {
    debug_assert!(self[from].is_defn() && self[to].is_defn());
    let mut last = None;
    let mut cur = self[from].use_head;
    while let Some(u) = cur {
      if let Some(name) = self[u].as_name_mut() {
        name.lexdef = Some(to);
      };
      last = Some(u);
      cur = self[u].next_use;
    }
    let last = last?;
    let moved = self[from].use_head.take();
    self[last].next_use = self[to].use_head;
    self[to].use_head = moved;
    moved
  }

  /// Moves the uses of `from` that satisfy `pred` to the front of `to`'s use chain, keeping their
  /// order and propagating their use-to-definition flags. Returns whether any use stayed on `from`.
  pub fn move_uses_if(
    &mut self,
    from: NodeId,
    to: NodeId,
    mut pred: impl FnMut(&ParseNode) -> bool,
  ) -> bool {
    debug_assert!(self[from].is_defn() && self[to].is_defn());
    let mut kept: (Option<NodeId>, Option<NodeId>) = (None, None);
    let mut moved: (Option<NodeId>, Option<NodeId>) = (None, None);
    let mut flags = DefnFlags::empty();
    let mut cur = self[from].use_head.take();
    while let Some(u) = cur {
      cur = self[u].next_use.take();
      let chain = if pred(&self[u]) {
        flags |= self[u].dflags() & DefnFlags::USE2DEF;
        if let Some(name) = self[u].as_name_mut() {
          name.lexdef = Some(to);
        };
        &mut moved
      } else {
        &mut kept
      };
      match chain.1 {
        Some(tail) => self[tail].next_use = Some(u),
        None => chain.0 = Some(u),
      };
      chain.1 = Some(u);
    }
    self[from].use_head = kept.0;
    if let (Some(head), Some(tail)) = moved {
      self[tail].next_use = self[to].use_head;
      self[to].use_head = Some(head);
      self[to].add_dflags(flags);
    };
    kept.0.is_some()
  }

  /// Merges the definition `dn` into `outer`: every use of `dn` becomes a use of `outer`, and `dn`
  /// itself becomes a forwarding use of `outer` at the front of the chain.
  pub fn splice_definition(&mut self, dn: NodeId, outer: NodeId) {
    if dn == outer {
      return;
    };
    debug_assert_eq!(self[dn].kind, ParseNodeKind::Name);
    self.move_uses(dn, outer);
    let flags = self[dn].dflags() & !DefnFlags::PLACEHOLDER;
    let head = self[outer].use_head;
    let o = &mut self[outer];
    o.use_head = Some(dn);
    o.add_dflags(flags);

    let d = &mut self[dn];
    d.next_use = head;
    d.flags.remove(NodeFlags::DEFN);
    d.flags.insert(NodeFlags::USED);
    if let Some(name) = d.as_name_mut() {
      name.expr = None;
      name.lexdef = Some(outer);
    };
  }

  /// Rewrites the name node `pn` in place into `pn = rhs`. The name moves to a fresh left child,
  /// taking over `pn`'s place in any use chain; links that still target `pn` reach the name through
  /// [`Self::resolve`]. Returns the new left child.
  pub fn make_assignment(&mut self, pn: NodeId, rhs: NodeId) -> AstResult<NodeId> {
    debug_assert_eq!(self[pn].arity(), Arity::Name);
    let original = self[pn].clone();
    let lhs = self.allocate(original.kind, original.op, original.payload.clone(), original.pos)?;
    {
      let l = &mut self[lhs];
      l.flags = original.flags;
      l.use_head = original.use_head;
      l.next_use = original.next_use;
    }
    if original.is_used() {
      if let Some(def) = original.maybe_lexdef() {
        self.replace_use(def, pn, lhs);
      };
    };

    let end = self[rhs].pos.end;
    let node = &mut self[pn];
    node.kind = ParseNodeKind::Assign;
    node.op = JsOp::Nop;
    node.flags = NodeFlags::empty();
    node.use_head = None;
    node.next_use = None;
    node.payload = Payload::Binary(BinaryData {
      left: lhs,
      right: rhs,
      const_value: None,
      iter_flags: 0,
    });
    node.pos.end = end;
    Ok(lhs)
  }
}

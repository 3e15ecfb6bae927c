use crate::arena::ParseNodeArena;
use crate::node::NodeId;
use bitflags::bitflags;
use serde::Serialize;
use std::ops::Index;
use std::ops::IndexMut;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionBoxId(pub(crate) u32);

impl FunctionBoxId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

bitflags! {
  /// What the body of a function was seen to do while it was parsed.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
  pub struct FunctionFlags: u16 {
    /// Calls `eval` directly.
    const USES_EVAL = 0x01;
    /// Declared lexically inside a `with` body.
    const IN_WITH = 0x02;
    /// Needs a materialized scope object at runtime.
    const HEAVYWEIGHT = 0x04;
    /// Its scope may gain bindings at runtime, so descendants cannot assume a static shape.
    const EXTENSIBLE_SCOPE = 0x08;
    /// Refers to `arguments`.
    const USES_ARGUMENTS = 0x10;
    /// Refers to its own name from inside its body.
    const USES_OWN_NAME = 0x20;
    /// Contains nested functions.
    const HAS_KIDS = 0x40;
    /// Method lambda that may share one function object across all instances.
    const JOINABLE = 0x80;
  }
}

/// How a function's environment is captured once the whole unit has been analyzed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
  /// Looks names up through a full scope chain.
  #[default]
  Interpreted,
  /// Uses no outer bindings, so needs no environment at all.
  Null,
  /// Copies every outer binding it uses into the closure at creation time.
  Flat,
}

/// Per-function bookkeeping shared between the binder and later whole-unit analyses.
#[derive(Clone, Debug)]
pub struct FunctionBox {
  /// The `Function` node. Kept up to date when the node is moved with `become_node`.
  pub node: NodeId,
  pub parent: Option<FunctionBoxId>,
  pub kids: Vec<FunctionBoxId>,
  /// Head of the chain of lambdas assigned as methods of `this` in this function, linked through
  /// `ParseNode::next_method`.
  pub methods: Option<NodeId>,
  pub queued: bool,
  /// Declared inside a loop of its parent function.
  pub in_loop: bool,
  /// Static nesting level; the outermost script is level 0.
  pub level: u16,
  pub flags: FunctionFlags,
  pub kind: FunctionKind,
}

#[derive(Clone, Debug, Default)]
pub struct FunctionBoxes {
  boxes: Vec<FunctionBox>,
}

impl FunctionBoxes {
  pub fn push(
    &mut self,
    node: NodeId,
    parent: Option<FunctionBoxId>,
    level: u16,
    in_loop: bool,
  ) -> FunctionBoxId {
    let id = FunctionBoxId(self.boxes.len() as u32);
    self.boxes.push(FunctionBox {
      node,
      parent,
      kids: Vec::new(),
      methods: None,
      queued: false,
      in_loop,
      level,
      flags: FunctionFlags::empty(),
      kind: FunctionKind::Interpreted,
    });
    if let Some(parent) = parent {
      let parent = &mut self.boxes[parent.index()];
      parent.kids.push(id);
      parent.flags |= FunctionFlags::HAS_KIDS;
    };
    id
  }

  pub fn len(&self) -> usize {
    self.boxes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = FunctionBoxId> {
    (0..self.boxes.len() as u32).map(FunctionBoxId)
  }

  /// Functions declared directly in the outermost script.
  pub fn roots(&self) -> impl Iterator<Item = FunctionBoxId> + '_ {
    self.ids().filter(|id| self[*id].parent.is_none())
  }

  /// True if this function or any enclosing one is inside a `with` body or has a scope that can
  /// grow at runtime.
  pub fn in_any_dynamic_scope(&self, id: FunctionBoxId) -> bool {
    let mut cur = Some(id);
    while let Some(id) = cur {
      let funbox = &self[id];
      if funbox
        .flags
        .intersects(FunctionFlags::IN_WITH | FunctionFlags::EXTENSIBLE_SCOPE)
      {
        return true;
      };
      cur = funbox.parent;
    }
    false
  }

  pub fn scope_is_extensible(&self, id: FunctionBoxId) -> bool {
    self[id].flags.contains(FunctionFlags::EXTENSIBLE_SCOPE)
  }

  /// A method lambda may share one function object across all instances if it captures nothing and
  /// never observes its own identity.
  pub fn joinable(&self, id: FunctionBoxId) -> bool {
    let funbox = &self[id];
    funbox.kind == FunctionKind::Null
      && !funbox
        .flags
        .intersects(FunctionFlags::USES_ARGUMENTS | FunctionFlags::USES_OWN_NAME)
  }
}

impl Index<FunctionBoxId> for FunctionBoxes {
  type Output = FunctionBox;

  fn index(&self, index: FunctionBoxId) -> &Self::Output {
    &self.boxes[index.index()]
  }
}

impl IndexMut<FunctionBoxId> for FunctionBoxes {
  fn index_mut(&mut self, index: FunctionBoxId) -> &mut Self::Output {
    &mut self.boxes[index.index()]
  }
}

impl ParseNodeArena {
  /// Records `lambda` as a would-be method of the function `owner`. Lambdas are neither definitions
  /// nor uses, so their `next_method` link is free for this chain.
  pub fn push_method(&mut self, owner: FunctionBoxId, lambda: NodeId) {
    debug_assert!(self[lambda].next_method.is_none());
    let head = self.funboxes[owner].methods;
    self[lambda].next_method = head;
    self.funboxes[owner].methods = Some(lambda);
  }

  /// Would-be methods of `owner`, most recently recorded first.
  pub fn methods(&self, owner: FunctionBoxId) -> impl Iterator<Item = NodeId> + '_ {
    let mut cur = self.funboxes[owner].methods;
    std::iter::from_fn(move || {
      let id = cur?;
      cur = self[id].next_method;
      Some(id)
    })
  }
}

/// Ring buffer of function boxes awaiting a whole-unit pass. Capacity is fixed up front; a box is
/// never queued twice at once.
#[derive(Debug)]
pub struct FunctionBoxQueue {
  vector: Vec<Option<FunctionBoxId>>,
  head: usize,
  tail: usize,
  length_mask: usize,
}

impl FunctionBoxQueue {
  /// Creates a queue for up to `count` boxes, rounded up to a power of two.
  pub fn with_capacity(count: usize) -> FunctionBoxQueue {
    let length = count.max(1).next_power_of_two();
    FunctionBoxQueue {
      vector: vec![None; length],
      head: 0,
      tail: 0,
      length_mask: length - 1,
    }
  }

  pub fn count(&self) -> usize {
    self.head - self.tail
  }

  pub fn length(&self) -> usize {
    self.length_mask + 1
  }

  pub fn is_empty(&self) -> bool {
    self.head == self.tail
  }

  /// Queues `id` unless it is already queued. Pushing into a full queue is a bug in the caller's
  /// sizing and panics.
  pub fn push(&mut self, boxes: &mut FunctionBoxes, id: FunctionBoxId) {
    let funbox = &mut boxes[id];
    if funbox.queued {
      return;
    };
    assert!(
      self.count() < self.length(),
      "function box queue overflow (capacity {})",
      self.length()
    );
    self.vector[self.head & self.length_mask] = Some(id);
    self.head += 1;
    funbox.queued = true;
  }

  pub fn pull(&mut self, boxes: &mut FunctionBoxes) -> Option<FunctionBoxId> {
    if self.tail == self.head {
      return None;
    };
    let id = self.vector[self.tail & self.length_mask].take()?;
    self.tail += 1;
    boxes[id].queued = false;
    Some(id)
  }
}

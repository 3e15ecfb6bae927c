use ast_js::funbox::FunctionBoxId;
use ast_js::Atom;
use ast_js::NodeId;
use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  pub struct ContextFlags: u8 {
    /// Context of a function body rather than the outermost script.
    const IN_FUNCTION = 0x1;
    /// Contains a direct `eval` call seen so far.
    const USES_EVAL = 0x2;
    /// Contains a `with` statement seen so far.
    const HAS_WITH = 0x4;
    /// Refers to `arguments` without declaring it.
    const USES_ARGUMENTS = 0x8;
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
  Block,
  /// Body of a `with` statement; name lookup cannot see past it statically.
  With,
}

#[derive(Clone, Debug)]
pub struct BlockScope {
  pub id: u32,
  pub kind: BlockKind,
  /// `let` bindings of this block.
  pub decls: BTreeMap<Atom, NodeId>,
}

/// Binding state of one function body (or the outermost script) while it is being parsed.
#[derive(Clone, Debug, Default)]
pub struct TreeContext {
  pub funbox: Option<FunctionBoxId>,
  pub fun_node: Option<NodeId>,
  /// Own name of a named function expression, visible only inside its body.
  pub lambda_name: Option<Atom>,
  /// Block id of the body itself; uses outside any block carry it. The outermost script is 0.
  pub body_id: u32,
  /// Definition standing for the implicit `arguments` object, created on first use.
  pub arguments_def: Option<NodeId>,
  pub level: u16,
  pub flags: ContextFlags,
  /// Function-level declarations: formals, `var`, `const`, and function statements. Entries may
  /// point at nodes since rewritten into assignments, so always look through `resolve`.
  pub decls: BTreeMap<Atom, NodeId>,
  /// Placeholders for names used here (or in closed inner functions) but not declared here.
  pub lexdeps: BTreeMap<Atom, NodeId>,
  pub blocks: Vec<BlockScope>,
  /// Formal parameter definitions in declaration order.
  pub args: Vec<NodeId>,
  pub var_count: u16,
  pub loop_depth: u32,
}

impl TreeContext {
  pub fn top_level() -> TreeContext {
    TreeContext::default()
  }

  pub fn function(
    funbox: FunctionBoxId,
    fun_node: NodeId,
    lambda_name: Option<Atom>,
    level: u16,
    body_id: u32,
  ) -> TreeContext {
    TreeContext {
      funbox: Some(funbox),
      fun_node: Some(fun_node),
      lambda_name,
      body_id,
      level,
      flags: ContextFlags::IN_FUNCTION,
      ..Default::default()
    }
  }

  pub fn in_function(&self) -> bool {
    self.flags.contains(ContextFlags::IN_FUNCTION)
  }

  pub fn in_with(&self) -> bool {
    self.blocks.iter().any(|b| b.kind == BlockKind::With)
  }

  pub fn in_loop(&self) -> bool {
    self.loop_depth > 0
  }

  /// Innermost non-`with` block, if any.
  pub fn innermost_block(&self) -> Option<&BlockScope> {
    self.blocks.iter().rev().find(|b| b.kind == BlockKind::Block)
  }

  pub fn innermost_block_mut(&mut self) -> Option<&mut BlockScope> {
    self
      .blocks
      .iter_mut()
      .rev()
      .find(|b| b.kind == BlockKind::Block)
  }

  /// Looks `atom` up among this context's own declarations, innermost block first.
  pub fn lookup(&self, atom: Atom) -> Lookup {
    let mut through_with = false;
    for block in self.blocks.iter().rev() {
      if block.kind == BlockKind::With {
        through_with = true;
        continue;
      };
      if let Some(def) = block.decls.get(&atom) {
        return Lookup {
          def: Some(*def),
          through_with,
        };
      };
    }
    Lookup {
      def: self.decls.get(&atom).copied(),
      through_with,
    }
  }

  pub fn next_slot(&mut self) -> u16 {
    let slot = self.var_count;
    self.var_count += 1;
    slot
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookup {
  pub def: Option<NodeId>,
  /// The lookup passed a `with` body, whose object may shadow `def` at runtime.
  pub through_with: bool,
}

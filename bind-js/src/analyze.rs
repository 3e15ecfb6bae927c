//! Whole-unit analyses over function boxes, run once every function has been bound.
//!
//! - [`mark_fun_args`] spreads the escaping (funarg) property: a function that escapes forces every
//!   function it refers to by name to escape too, since those can no longer be reached through the
//!   caller's frame.
//! - [`set_function_kinds`] decides how each function captures its environment.
//! - [`mark_joinable_methods`] flags method lambdas that can share one function object.

use ast_js::cookie::UpvarCookie;
use ast_js::flags::DefnFlags;
use ast_js::funbox::FunctionBoxId;
use ast_js::funbox::FunctionBoxQueue;
use ast_js::funbox::FunctionFlags;
use ast_js::funbox::FunctionKind;
use ast_js::loc::TokenPos;
use ast_js::DefinitionKind;
use ast_js::JsOp;
use ast_js::NodeId;
use ast_js::ParseNodeArena;
use ast_js::ParseNodeKind;
use tracing::debug;
use tracing::debug_span;

/// Outer definitions a function refers to, as listed by its `Upvars` body, resolved.
pub fn upvar_definitions(arena: &ParseNodeArena, id: FunctionBoxId) -> Vec<NodeId> {
  let fun = arena.funboxes[id].node;
  let Some(body) = arena[fun].as_func().and_then(|f| f.body) else {
    return Vec::new();
  };
  if arena[body].kind != ParseNodeKind::Upvars {
    return Vec::new();
  };
  match arena[body].as_nameset() {
    Some(set) => set.names.values().map(|dn| arena.resolve(*dn)).collect(),
    None => Vec::new(),
  }
}

/// Function a `Callee` definition stands for: the nearest enclosing function expression of `from`
/// (or `from` itself) with that name.
fn callee_function(
  arena: &ParseNodeArena,
  from: FunctionBoxId,
  def: NodeId,
) -> Option<FunctionBoxId> {
  let atom = arena[def].atom();
  let mut cur = Some(from);
  while let Some(id) = cur {
    let node = &arena[arena.funboxes[id].node];
    if node.op == JsOp::Lambda && node.atom() == atom {
      return Some(id);
    };
    cur = arena.funboxes[id].parent;
  }
  None
}

pub fn mark_fun_args(arena: &mut ParseNodeArena) {
  let mut queue = FunctionBoxQueue::with_capacity(arena.funboxes.len());
  let escaping: Vec<FunctionBoxId> = arena
    .funboxes
    .ids()
    .filter(|id| arena[arena.funboxes[*id].node].is_fun_arg())
    .collect();
  for id in escaping {
    queue.push(&mut arena.funboxes, id);
  }

  while let Some(id) = queue.pull(&mut arena.funboxes) {
    for def in upvar_definitions(arena, id) {
      let node = &arena[def];
      if arena.is_free_var(def) || node.is_fun_arg() {
        continue;
      };
      let target = if node.kind == ParseNodeKind::Function {
        node.funbox()
      } else if node.op == JsOp::Callee {
        callee_function(arena, id, def)
      } else {
        continue;
      };
      arena[def].add_dflags(DefnFlags::FUNARG);
      if let Some(target) = target {
        debug!(?target, "function escapes through an escaping closure");
        queue.push(&mut arena.funboxes, target);
      };
    }
  }
}

/// An outer binding can be copied into a closure when the copy can never go stale: it is never
/// reassigned, and it already holds its final value where the function is created.
fn can_flatten(arena: &ParseNodeArena, def: NodeId, fun_pos: TokenPos) -> bool {
  let node = &arena[def];
  if node.is_assigned() {
    return false;
  };
  match arena.definition_kind(def) {
    DefinitionKind::Arg | DefinitionKind::Function => true,
    DefinitionKind::Var | DefinitionKind::Const | DefinitionKind::Let => {
      node.is_initialized() && node.pos.precedes(fun_pos)
    }
    DefinitionKind::Unknown => false,
  }
}

pub fn set_function_kinds(arena: &mut ParseNodeArena) {
  let ids: Vec<FunctionBoxId> = arena.funboxes.ids().collect();
  // Children have larger ids than their parents, so this visits every function after its kids.
  for id in ids.into_iter().rev() {
    let funbox = &arena.funboxes[id];
    let fun = funbox.node;
    let kind = if funbox.flags.contains(FunctionFlags::HEAVYWEIGHT)
      || arena.funboxes.in_any_dynamic_scope(id)
      || funbox.level >= UpvarCookie::UPVAR_LEVEL_LIMIT
    {
      FunctionKind::Interpreted
    } else {
      let fun_pos = arena[fun].pos;
      let captured: Vec<NodeId> = upvar_definitions(arena, id)
        .into_iter()
        .filter(|def| !arena.is_free_var(*def))
        .collect();
      if captured.is_empty() {
        FunctionKind::Null
      } else if captured.iter().all(|def| can_flatten(arena, *def, fun_pos)) {
        FunctionKind::Flat
      } else {
        FunctionKind::Interpreted
      }
    };
    arena.funboxes[id].kind = kind;
    if kind == FunctionKind::Flat && arena[fun].op == JsOp::Lambda {
      arena[fun].op = JsOp::LambdaFc;
    };
  }
}

pub fn mark_joinable_methods(arena: &mut ParseNodeArena) {
  let owners: Vec<FunctionBoxId> = arena.funboxes.ids().collect();
  for owner in owners {
    let methods: Vec<NodeId> = arena.methods(owner).collect();
    for method in methods {
      let Some(funbox) = arena[method].funbox() else {
        continue;
      };
      if arena.funboxes.joinable(funbox) {
        arena.funboxes[funbox].flags |= FunctionFlags::JOINABLE;
      };
    }
  }
}

pub fn analyze_functions(arena: &mut ParseNodeArena) {
  let _span = debug_span!("analyze_functions", functions = arena.funboxes.len()).entered();
  mark_fun_args(arena);
  set_function_kinds(arena);
  mark_joinable_methods(arena);
  let mut counts = [0usize; 3];
  for id in arena.funboxes.ids() {
    counts[arena.funboxes[id].kind as usize] += 1;
  }
  debug!(
    interpreted = counts[FunctionKind::Interpreted as usize],
    null = counts[FunctionKind::Null as usize],
    flat = counts[FunctionKind::Flat as usize],
    "function kinds"
  );
}

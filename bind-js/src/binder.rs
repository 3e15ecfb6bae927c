use crate::analyze::analyze_functions;
use crate::context::BlockKind;
use crate::context::BlockScope;
use crate::context::ContextFlags;
use crate::context::TreeContext;
use crate::error::BindError;
use crate::error::BindResult;
use crate::BindOptions;
use crate::TopLevelMode;
use ast_js::flags::DefnFlags;
use ast_js::funbox::FunctionFlags;
use ast_js::loc::TokenPos;
use ast_js::Atom;
use ast_js::DefinitionKind;
use ast_js::JsOp;
use ast_js::NodeId;
use ast_js::ParseNode;
use ast_js::ParseNodeArena;
use ast_js::ParseNodeKind;
use ast_js::UpvarCookie;
use std::collections::BTreeMap;
use tracing::debug;
use tracing::trace;

/// Declaration forms a parser reports through [`Binder::define`]. Function statements go through
/// [`Binder::begin_function`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
  Var,
  Const,
  Let,
  Arg,
}

impl DeclKind {
  pub fn definition_kind(self) -> DefinitionKind {
    match self {
      DeclKind::Var => DefinitionKind::Var,
      DeclKind::Const => DefinitionKind::Const,
      DeclKind::Let => DefinitionKind::Let,
      DeclKind::Arg => DefinitionKind::Arg,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionSyntax {
  /// `function f() {}` as a statement; binds `f` in the enclosing scope.
  Statement,
  /// A function expression; its name, if any, is visible only inside its own body.
  Expression,
}

fn conflicts(previous: DefinitionKind, declared_as: DefinitionKind) -> bool {
  matches!(previous, DefinitionKind::Const | DefinitionKind::Let)
    || matches!(declared_as, DefinitionKind::Const | DefinitionKind::Let)
}

/// A fully bound compilation unit.
#[derive(Debug)]
pub struct BoundUnit {
  pub arena: ParseNodeArena,
  /// Function-level declarations of the outermost script.
  pub decls: BTreeMap<Atom, NodeId>,
  /// Placeholders for names used but never declared anywhere in the unit.
  pub free_variables: BTreeMap<Atom, NodeId>,
}

impl BoundUnit {
  /// Definition of a top-level declaration, looking through any rewrite into an assignment.
  pub fn declaration(&self, name: &str) -> Option<NodeId> {
    let atom = self.arena.atoms.lookup(name)?;
    self.decls.get(&atom).map(|def| self.arena.resolve(*def))
  }

  pub fn free_variable(&self, name: &str) -> Option<NodeId> {
    let atom = self.arena.atoms.lookup(name)?;
    self.free_variables.get(&atom).copied()
  }

  pub fn free_variable_names(&self) -> Vec<&str> {
    self
      .free_variables
      .keys()
      .map(|atom| self.arena.atoms.get(*atom))
      .collect()
  }
}

/// Links names to definitions while a parser builds the tree.
///
/// Nodes are built directly on [`Binder::arena`]; only name nodes and function nodes go through
/// the binder, since those take part in resolution.
#[derive(Debug)]
pub struct Binder {
  pub arena: ParseNodeArena,
  options: BindOptions,
  contexts: Vec<TreeContext>,
  next_block_id: u32,
}

impl Binder {
  pub fn new(options: BindOptions) -> Binder {
    Binder {
      arena: ParseNodeArena::new(options.ast),
      options,
      contexts: vec![TreeContext::top_level()],
      next_block_id: 1,
    }
  }

  pub fn options(&self) -> &BindOptions {
    &self.options
  }

  pub fn atom(&mut self, name: &str) -> Atom {
    self.arena.atoms.intern(name)
  }

  fn cx(&self) -> &TreeContext {
    &self.contexts[self.contexts.len() - 1]
  }

  fn cx_mut(&mut self) -> &mut TreeContext {
    let last = self.contexts.len() - 1;
    &mut self.contexts[last]
  }

  /// Static level of the innermost open context; the outermost script is level 0.
  pub fn level(&self) -> u16 {
    self.cx().level
  }

  /// Number of open contexts, including the outermost script.
  pub fn depth(&self) -> usize {
    self.contexts.len()
  }

  pub fn context(&self) -> &TreeContext {
    self.cx()
  }

  fn mark_funbox(&mut self, flags: FunctionFlags) {
    if let Some(funbox) = self.cx().funbox {
      self.arena.funboxes[funbox].flags |= flags;
    };
  }

  fn name_of(&self, atom: Atom) -> &str {
    self.arena.atoms.get(atom)
  }

  fn redeclaration(
    &self,
    atom: Atom,
    previous: NodeId,
    declared_as: DefinitionKind,
    pos: TokenPos,
  ) -> BindError {
    BindError::Redeclaration {
      name: self.name_of(atom).to_string(),
      previous: self.arena.definition_kind(previous),
      declared_as,
      pos,
    }
  }

  /// Function-level declarations may not share a name with a `let` of an enclosing block of the
  /// same context.
  fn check_block_conflict(
    &self,
    atom: Atom,
    declared_as: DefinitionKind,
    pos: TokenPos,
  ) -> BindResult<()> {
    let shadowed = self
      .cx()
      .blocks
      .iter()
      .rev()
      .find_map(|block| block.decls.get(&atom).copied());
    match shadowed {
      Some(previous) => Err(self.redeclaration(atom, previous, declared_as, pos)),
      None => Ok(()),
    }
  }

  /// Flags every binding declared at the current point gets, independent of its form.
  fn position_flags(&self) -> DefnFlags {
    let cx = self.cx();
    if cx.innermost_block().is_some() {
      DefnFlags::BLOCKCHILD
    } else if !cx.in_function() {
      DefnFlags::TOPLEVEL
    } else {
      DefnFlags::empty()
    }
  }

  fn current_block_id(&self) -> u32 {
    let cx = self.cx();
    cx.innermost_block().map_or(cx.body_id, |b| b.id)
  }

  fn fresh_block_id(&mut self) -> u32 {
    let id = self.next_block_id;
    self.next_block_id += 1;
    id
  }

  /// Gives a fresh or promoted definition its op, slot, and flags.
  fn make_definition(&mut self, dn: NodeId, kind: DeclKind) {
    let mut dflags = self.position_flags();
    let block_id = self.current_block_id();
    let global = !self.cx().in_function() && kind != DeclKind::Let;
    let level = self.level();
    let slot = match kind {
      DeclKind::Arg => Some(self.cx().args.len() as u16),
      _ if global => None,
      _ => Some(self.cx_mut().next_slot()),
    };
    let op = match kind {
      DeclKind::Arg => JsOp::GetArg,
      _ if global => JsOp::Name,
      _ => JsOp::GetLocal,
    };
    match kind {
      DeclKind::Arg => dflags |= DefnFlags::INITIALIZED,
      DeclKind::Const => dflags |= DefnFlags::CONST,
      DeclKind::Let => dflags |= DefnFlags::LET,
      DeclKind::Var => {}
    };
    if global && self.options.top_level == TopLevelMode::Global {
      dflags |= DefnFlags::GVAR;
    };
    let cookie = slot
      .filter(|_| !UpvarCookie::is_level_reserved(level))
      .map(|slot| UpvarCookie::new(level, slot));
    if cookie.is_some() {
      dflags |= DefnFlags::BOUND;
    };

    let node = &mut self.arena[dn];
    node.op = op;
    node.set_defn(true);
    node.set_block_id(block_id);
    if let Some(existing) = node.dflags_mut() {
      existing.remove(DefnFlags::PLACEHOLDER);
    };
    node.add_dflags(dflags);
    if let (Some(cookie), Some(c)) = (cookie, node.cookie_mut()) {
      c.set_from(cookie);
    };
  }

  /// Declares `atom`. Returns the node to place in the declaring list: a new definition, a
  /// placeholder promoted to a definition, or a use of an earlier declaration of the same name.
  pub fn define(&mut self, kind: DeclKind, atom: Atom, pos: TokenPos) -> BindResult<NodeId> {
    trace!(name = self.name_of(atom), ?kind, "define");
    let declared_as = kind.definition_kind();
    if kind == DeclKind::Let && self.cx().innermost_block().is_some() {
      return self.define_block_local(atom, pos);
    };
    self.check_block_conflict(atom, declared_as, pos)?;

    if let Some(existing) = self.cx().decls.get(&atom).copied() {
      let existing = self.arena.resolve(existing);
      if conflicts(self.arena.definition_kind(existing), declared_as) {
        return Err(self.redeclaration(atom, existing, declared_as, pos));
      };
      let flags = self.position_flags();
      let pn = self.arena.new_name(atom, pos)?;
      self.arena[pn].add_dflags(flags);
      self.arena.link_use_to_def(pn, existing);
      return Ok(pn);
    };

    let dn = match self.take_pending(atom) {
      Some(dn) => {
        debug!(name = self.name_of(atom), "promoting placeholder");
        self.arena[dn].pos = pos;
        dn
      }
      None => self.arena.new_name(atom, pos)?,
    };
    self.make_definition(dn, kind);
    let cx = self.cx_mut();
    cx.decls.insert(atom, dn);
    if kind == DeclKind::Arg {
      cx.args.push(dn);
    };
    Ok(dn)
  }

  fn define_block_local(&mut self, atom: Atom, pos: TokenPos) -> BindResult<NodeId> {
    let previous = self
      .cx()
      .innermost_block()
      .and_then(|block| block.decls.get(&atom).copied());
    if let Some(previous) = previous {
      return Err(self.redeclaration(atom, previous, DefinitionKind::Let, pos));
    };
    let shadowed = self.cx().lookup(atom).def.map(|def| self.arena.resolve(def));
    let pending = self.cx().lexdeps.get(&atom).copied();
    let dn = self.arena.new_name(atom, pos)?;
    self.make_definition(dn, DeclKind::Let);
    let block_id = self.current_block_id();
    if let Some(block) = self.cx_mut().innermost_block_mut() {
      block.decls.insert(atom, dn);
    };

    // Uses earlier in this block (or in functions nested in it) already went to whatever was
    // visible then. Block ids only grow, so everything inside this block has an id at least this
    // block's.
    let inside = move |u: &ParseNode| u.block_id().is_some_and(|id| id >= block_id);
    if let Some(outer) = shadowed {
      self.arena.move_uses_if(outer, dn, inside);
    };
    if let Some(placeholder) = pending {
      if !self.arena.move_uses_if(placeholder, dn, inside) {
        self.cx_mut().lexdeps.remove(&atom);
        if inside(&self.arena[placeholder]) {
          // Still listed in the upvar set of a closed inner function.
          self.arena.splice_definition(placeholder, dn);
        };
      };
    };
    Ok(dn)
  }

  /// Removes and returns the definition a declaration of `atom` takes over: a placeholder, or the
  /// implicit `arguments` definition.
  fn take_pending(&mut self, atom: Atom) -> Option<NodeId> {
    if let Some(dn) = self.cx_mut().lexdeps.remove(&atom) {
      return Some(dn);
    };
    let implicit = self
      .cx()
      .arguments_def
      .filter(|dn| self.arena[*dn].atom() == Some(atom))?;
    self.cx_mut().arguments_def = None;
    Some(implicit)
  }

  /// Attaches an initializer to a node returned by [`Self::define`]. A redeclaration becomes an
  /// assignment in place.
  pub fn initialize(&mut self, name: NodeId, rhs: NodeId) -> BindResult<()> {
    if self.arena[name].is_defn() {
      let end = self.arena[rhs].pos.end;
      let node = &mut self.arena[name];
      if let Some(data) = node.as_name_mut() {
        data.expr = Some(rhs);
      };
      node.add_dflags(DefnFlags::INITIALIZED);
      node.pos.end = node.pos.end.max(end);
      return Ok(());
    };
    let lhs = self.arena.make_assignment(name, rhs)?;
    self.arena.note_lvalue(lhs);
    Ok(())
  }

  /// Turns a function expression's placeholder for its own name into its callee definition.
  fn make_callee(&mut self, dn: NodeId, cx: &TreeContext) {
    let pos = cx.fun_node.map(|fun| self.arena[fun].pos);
    let node = &mut self.arena[dn];
    node.op = JsOp::Callee;
    if let Some(flags) = node.dflags_mut() {
      flags.remove(DefnFlags::PLACEHOLDER);
    };
    node.add_dflags(DefnFlags::BOUND | DefnFlags::INITIALIZED);
    if let Some(pos) = pos {
      node.pos = pos;
    };
    if !UpvarCookie::is_level_reserved(cx.level) {
      if let Some(cookie) = node.cookie_mut() {
        cookie.set(cx.level, UpvarCookie::CALLEE_SLOT);
      };
    };
    if let Some(funbox) = cx.funbox {
      self.arena.funboxes[funbox].flags |= FunctionFlags::USES_OWN_NAME;
    };
  }

  /// Definition standing for the current function's `arguments` object.
  fn arguments_definition(&mut self, atom: Atom) -> BindResult<NodeId> {
    if let Some(def) = self.cx().arguments_def {
      return Ok(def);
    };
    let pos = self.cx().fun_node.map_or_else(TokenPos::default, |fun| self.arena[fun].pos);
    let dn = self.arena.new_name(atom, pos)?;
    let node = &mut self.arena[dn];
    node.set_defn(true);
    node.add_dflags(DefnFlags::INITIALIZED);
    self.cx_mut().flags |= ContextFlags::USES_ARGUMENTS;
    self.mark_funbox(FunctionFlags::USES_ARGUMENTS);
    self.cx_mut().arguments_def = Some(dn);
    Ok(dn)
  }

  fn placeholder(&mut self, atom: Atom, pos: TokenPos) -> BindResult<NodeId> {
    if let Some(dn) = self.cx().lexdeps.get(&atom) {
      return Ok(*dn);
    };
    let block_id = self.cx().body_id;
    let dn = self.arena.new_name(atom, pos)?;
    let node = &mut self.arena[dn];
    node.op = JsOp::Nop;
    node.set_defn(true);
    node.add_dflags(DefnFlags::PLACEHOLDER);
    node.set_block_id(block_id);
    self.cx_mut().lexdeps.insert(atom, dn);
    Ok(dn)
  }

  pub fn use_name(&mut self, atom: Atom, pos: TokenPos) -> BindResult<NodeId> {
    self.use_name_with_flags(atom, pos, DefnFlags::empty())
  }

  /// Creates a use of `atom` and links it to the declaration visible in the current context, or to
  /// the context's placeholder for it. Declarations of enclosing functions are only consulted when
  /// the current function ends, since they may still be hoisted past this point. `flags` may carry
  /// `ASSIGNED` or `FUNARG` for uses the parser already knows to be targets or escaping values;
  /// they propagate to the definition.
  pub fn use_name_with_flags(
    &mut self,
    atom: Atom,
    pos: TokenPos,
    flags: DefnFlags,
  ) -> BindResult<NodeId> {
    let pn = self.arena.new_name(atom, pos)?;
    let mut flags = flags;
    if self.cx().innermost_block().is_some() {
      flags |= DefnFlags::BLOCKCHILD;
    };
    let block_id = self.current_block_id();
    let node = &mut self.arena[pn];
    node.add_dflags(flags);
    node.set_block_id(block_id);

    let found = self.cx().lookup(atom);
    let def = match found.def {
      Some(def) => self.arena.resolve(def),
      None if self.cx().in_function() && self.name_of(atom) == "arguments" => {
        self.arguments_definition(atom)?
      }
      None => self.placeholder(atom, pos)?,
    };
    if found.through_with {
      self.arena[pn].add_dflags(DefnFlags::DEOPTIMIZED);
    };
    self.arena.link_use_to_def(pn, def);
    trace!(name = self.name_of(atom), ?pn, "use");
    Ok(pn)
  }

  /// Marks a use as an assignment target.
  pub fn note_lvalue(&mut self, pn: NodeId) {
    self.arena.note_lvalue(pn);
  }

  /// Marks a use or function as escaping as a value.
  pub fn note_fun_arg(&mut self, pn: NodeId) {
    self.arena.set_fun_arg(pn);
  }

  /// Opens a function. Formals are declared with [`DeclKind::Arg`] afterwards, then the body is
  /// built, then [`Self::end_function`] closes it.
  pub fn begin_function(
    &mut self,
    atom: Option<Atom>,
    syntax: FunctionSyntax,
    pos: TokenPos,
  ) -> BindResult<NodeId> {
    let parent = self.cx().funbox;
    let in_loop = self.cx().in_loop();
    let op = match syntax {
      FunctionSyntax::Statement => JsOp::DefFun,
      FunctionSyntax::Expression => JsOp::Lambda,
    };
    let (fun, funbox) = self.arena.new_function(op, atom, parent, in_loop, pos)?;
    if self.cx().in_with() {
      self.arena.funboxes[funbox].flags |= FunctionFlags::IN_WITH;
    };
    let lambda_name = match (syntax, atom) {
      (FunctionSyntax::Statement, Some(atom)) => {
        self.bind_function_statement(atom, fun, pos)?;
        None
      }
      (FunctionSyntax::Statement, None) => None,
      (FunctionSyntax::Expression, atom) => {
        self.arena.set_fun_arg(fun);
        atom
      }
    };
    let level = self.arena.funboxes[funbox].level;
    let body_id = self.fresh_block_id();
    debug!(?fun, level, ?syntax, "begin function");
    self
      .contexts
      .push(TreeContext::function(funbox, fun, lambda_name, level, body_id));
    Ok(fun)
  }

  fn bind_function_statement(
    &mut self,
    atom: Atom,
    fun: NodeId,
    pos: TokenPos,
  ) -> BindResult<()> {
    self.check_block_conflict(atom, DefinitionKind::Function, pos)?;
    self.arena[fun].set_defn(true);
    if let Some(existing) = self.cx().decls.get(&atom).copied() {
      let dn = self.arena.resolve(existing);
      if conflicts(self.arena.definition_kind(dn), DefinitionKind::Function) {
        self.arena[fun].set_defn(false);
        return Err(self.redeclaration(atom, dn, DefinitionKind::Function, pos));
      };
      if self.arena[dn].kind == ParseNodeKind::Function {
        // The later statement wins; the earlier one stays in the tree as an unnamed binding.
        self.arena.move_uses(dn, fun);
        let inherited = self.arena[dn].dflags() & DefnFlags::USE2DEF;
        self.arena[fun].add_dflags(inherited);
        self.arena[dn].set_defn(false);
      } else {
        let rhs = self.arena[dn].maybe_expr();
        self.arena.splice_definition(dn, fun);
        if let Some(rhs) = rhs {
          self.arena.make_assignment(dn, rhs)?;
        };
      };
    } else if let Some(dn) = self.take_pending(atom) {
      self.arena.splice_definition(dn, fun);
    };

    let flags = self.position_flags();
    let block_id = self.current_block_id();
    let level = self.level();
    let cookie = if self.cx().in_function() && !UpvarCookie::is_level_reserved(level) {
      let slot = self.cx_mut().next_slot();
      Some(UpvarCookie::new(level, slot))
    } else {
      None
    };
    let global = !self.cx().in_function() && self.options.top_level == TopLevelMode::Global;
    let node = &mut self.arena[fun];
    node.add_dflags(flags);
    node.set_block_id(block_id);
    if let Some(cookie) = cookie {
      node.add_dflags(DefnFlags::BOUND);
      if let Some(c) = node.cookie_mut() {
        c.set_from(cookie);
      };
    } else if global {
      node.add_dflags(DefnFlags::GVAR);
    };
    self.cx_mut().decls.insert(atom, fun);
    Ok(())
  }

  fn mark_uses(&mut self, dn: NodeId, flags: DefnFlags) {
    let uses: Vec<NodeId> = self.arena.uses(dn).collect();
    for u in uses {
      self.arena[u].add_dflags(flags);
    }
  }

  /// Closes the function opened by [`Self::begin_function`] with its body `StatementList`.
  ///
  /// Formals are gathered with the body into an `ArgsBody` list. Names the function still depends
  /// on are merged into the enclosing context, and the body is wrapped in an `Upvars` name set
  /// listing every outer name it uses.
  pub fn end_function(&mut self, fun: NodeId, body: NodeId) -> BindResult<()> {
    debug_assert!(self.contexts.len() > 1, "end_function without begin_function");
    debug_assert_eq!(self.cx().fun_node, Some(fun), "unbalanced end_function");
    debug_assert!(self.cx().blocks.is_empty(), "function ended inside a block");
    let Some(cx) = self.contexts.pop() else {
      unreachable!("the outermost context is never popped here");
    };

    let mut body = body;
    if !cx.args.is_empty() {
      let pos = TokenPos::box_of(self.arena[cx.args[0]].pos, self.arena[body].pos);
      let list = self
        .arena
        .make_empty_list(ParseNodeKind::ArgsBody, JsOp::Nop, pos)?;
      for arg in &cx.args {
        self.arena.append(list, *arg);
      }
      self.arena.append(list, body);
      self.arena[list].pos = pos;
      body = list;
    };

    // An eval can declare any name in this function, and a `with` around it can supply any name
    // from its object, so no outer binding seen from here is certain.
    let deoptimize = cx.flags.contains(ContextFlags::USES_EVAL) || self.cx().in_with();
    let mut names = BTreeMap::new();
    for (&atom, &dn) in &cx.lexdeps {
      if cx.lambda_name == Some(atom) {
        self.make_callee(dn, &cx);
        continue;
      };
      let mut flags = DefnFlags::CLOSED;
      if deoptimize {
        flags |= DefnFlags::DEOPTIMIZED;
      };
      self.mark_uses(dn, flags);
      self.arena[dn].add_dflags(DefnFlags::CLOSED);
      let outer = match self.cx().lookup(atom).def {
        Some(outer) => Some(self.arena.resolve(outer)),
        None => self.cx().lexdeps.get(&atom).copied(),
      };
      match outer {
        Some(outer) => self.arena.splice_definition(dn, outer),
        None => {
          self.cx_mut().lexdeps.insert(atom, dn);
        }
      };
      names.insert(atom, dn);
    }

    if !names.is_empty() {
      let pos = self.arena[body].pos;
      body = self
        .arena
        .new_nameset(ParseNodeKind::Upvars, names, Some(body), pos)?;
    };
    let body_pos = self.arena[body].pos;
    let node = &mut self.arena[fun];
    if let Some(data) = node.as_func_mut() {
      data.body = Some(body);
    };
    node.pos.extend(body_pos);
    debug!(?fun, "end function");
    Ok(())
  }

  /// Opens a block scope for `let` declarations. Returns its id.
  pub fn enter_block(&mut self) -> u32 {
    self.push_block(BlockKind::Block)
  }

  pub fn leave_block(&mut self, id: u32) {
    self.pop_block(BlockKind::Block, id);
  }

  /// Opens the body of a `with` statement. The object expression must already have been bound.
  pub fn enter_with(&mut self) -> u32 {
    self.cx_mut().flags |= ContextFlags::HAS_WITH;
    self.mark_funbox(FunctionFlags::HEAVYWEIGHT);
    self.push_block(BlockKind::With)
  }

  pub fn leave_with(&mut self, id: u32) {
    self.pop_block(BlockKind::With, id);
  }

  fn push_block(&mut self, kind: BlockKind) -> u32 {
    let id = self.fresh_block_id();
    self.cx_mut().blocks.push(BlockScope {
      id,
      kind,
      decls: BTreeMap::new(),
    });
    id
  }

  fn pop_block(&mut self, kind: BlockKind, id: u32) {
    let block = self.cx_mut().blocks.pop();
    debug_assert!(
      matches!(&block, Some(b) if b.id == id && b.kind == kind),
      "unbalanced block {id}: {block:?}"
    );
  }

  /// Records a direct `eval` call in the current context.
  pub fn note_eval_call(&mut self) {
    self.cx_mut().flags |= ContextFlags::USES_EVAL;
    self.mark_funbox(
      FunctionFlags::USES_EVAL | FunctionFlags::HEAVYWEIGHT | FunctionFlags::EXTENSIBLE_SCOPE,
    );
  }

  pub fn enter_loop(&mut self) {
    self.cx_mut().loop_depth += 1;
  }

  pub fn leave_loop(&mut self) {
    let cx = self.cx_mut();
    debug_assert!(cx.loop_depth > 0, "unbalanced leave_loop");
    cx.loop_depth = cx.loop_depth.saturating_sub(1);
  }

  /// Records `lambda` as assigned to a property of `this` in the current function.
  pub fn note_method(&mut self, lambda: NodeId) {
    debug_assert_eq!(self.arena[lambda].kind, ParseNodeKind::Function);
    if let Some(funbox) = self.cx().funbox {
      self.arena.push_method(funbox, lambda);
    };
  }

  /// Ends the unit. Every function must have been closed.
  pub fn finish(mut self) -> BoundUnit {
    debug_assert_eq!(self.contexts.len(), 1, "unit finished inside a function");
    let top = self.contexts.swap_remove(0);
    if top.flags.contains(ContextFlags::USES_EVAL) {
      for dn in top.lexdeps.values() {
        self.mark_uses(*dn, DefnFlags::DEOPTIMIZED);
      }
    };
    if self.options.analyze_functions {
      analyze_functions(&mut self.arena);
    };
    debug!(
      nodes = self.arena.live_count(),
      functions = self.arena.funboxes.len(),
      free = top.lexdeps.len(),
      "bound unit"
    );
    BoundUnit {
      arena: self.arena,
      decls: top.decls,
      free_variables: top.lexdeps,
    }
  }
}

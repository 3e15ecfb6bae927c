use crate::kind::ParseNodeKind;
use bitflags::bitflags;

bitflags! {
  /// Bits common to every node.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
  pub struct NodeFlags: u8 {
    /// This expression was enclosed in parentheses.
    const PARENS = 0x1;
    /// This name node is on some definition's use chain.
    const USED = 0x2;
    /// This node is a definition.
    const DEFN = 0x4;
  }
}

bitflags! {
  /// Definition/use flags of name and function nodes.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
  pub struct DefnFlags: u16 {
    /// Block-scoped `let` binding.
    const LET = 0x001;
    /// `const` binding; orthogonal to `LET`.
    const CONST = 0x002;
    /// Declaration with an initializer.
    const INITIALIZED = 0x004;
    /// Binding is the target of an assignment other than its initializer.
    const ASSIGNED = 0x008;
    /// Binding of the outermost script, not of a function or block.
    const TOPLEVEL = 0x010;
    /// Use or definition is a direct child of a block.
    const BLOCKCHILD = 0x020;
    /// Global variable binding; may be deleted, so it cannot be closed over.
    const GVAR = 0x040;
    /// Placeholder definition for a name used before any declaration was seen.
    const PLACEHOLDER = 0x080;
    /// Function used as a value (downward or upward funarg).
    const FUNARG = 0x100;
    /// Bound to a stack or global slot.
    const BOUND = 0x200;
    /// Use still linked to its definition, but not eligible for slot or upvar fast paths.
    const DEOPTIMIZED = 0x400;
    /// Binding is captured by a nested closure.
    const CLOSED = 0x800;

    /// Flags a use passes on to its definition when linked.
    const USE2DEF = Self::ASSIGNED.bits() | Self::FUNARG.bits() | Self::CLOSED.bits();
  }
}

bitflags! {
  /// Extra flags of list nodes.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
  pub struct ListFlags: u16 {
    /// `Add` list has a string literal term.
    const STRCAT = 0x001;
    /// `Add` list has a term that is neither a string nor a number literal.
    const CANTFOLD = 0x002;
    /// `Var`/`Const` list whose last result needs popping.
    const POPVAR = 0x004;
    /// `Var` list that is the left side of a for-in head.
    const FORINVAR = 0x008;
    /// Array literal has a comma at the end.
    const ENDCOMMA = 0x010;
    /// `var [a, b] = [c, d]` group assignment.
    const GROUPINIT = 0x040;
    /// Braces are required because of a closure.
    const NEEDBRACES = 0x080;
    /// Call expression in an lvalue context.
    const SETCALL = 0x100;
    /// Destructuring shorthand, or destructuring formals evaluated before the body.
    const DESTRUCT = 0x200;
    /// Array initializer has holes.
    const HOLEY = 0x400;
    /// Initializer has non-constant elements.
    const NONCONST = 0x800;
    /// Statement list contains top-level function statements.
    const FUNCDEFS = 0x1000;
  }
}

impl ListFlags {
  /// The flags that are meaningful for a list of the given kind. Setting any other flag on such a list is a contract violation.
  pub fn valid_for(kind: ParseNodeKind) -> ListFlags {
    let common = ListFlags::NEEDBRACES;
    common
      | match kind {
        ParseNodeKind::Add => ListFlags::STRCAT | ListFlags::CANTFOLD,
        ParseNodeKind::Var | ParseNodeKind::Const | ParseNodeKind::Let => {
          ListFlags::POPVAR | ListFlags::FORINVAR | ListFlags::GROUPINIT | ListFlags::DESTRUCT
        }
        ParseNodeKind::Rb => {
          ListFlags::ENDCOMMA | ListFlags::HOLEY | ListFlags::NONCONST | ListFlags::DESTRUCT
        }
        ParseNodeKind::Rc => ListFlags::NONCONST | ListFlags::DESTRUCT,
        ParseNodeKind::Lp | ParseNodeKind::New => ListFlags::SETCALL,
        ParseNodeKind::StatementList | ParseNodeKind::ArgsBody => {
          ListFlags::FUNCDEFS | ListFlags::DESTRUCT
        }
        _ => ListFlags::empty(),
      }
  }
}

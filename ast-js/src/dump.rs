use crate::arena::ParseNodeArena;
use crate::cookie::UpvarCookie;
use crate::kind::ParseNodeKind;
use crate::node::NodeId;
use crate::node::Nullary;
use crate::node::Payload;
use crate::num::JsNumber;
use crate::op::JsOp;
use serde::Serialize;

fn is_nop(op: &JsOp) -> bool {
  *op == JsOp::Nop
}

fn is_free(cookie: &UpvarCookie) -> bool {
  cookie.is_free()
}

/// How a name node takes part in binding resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
  Def,
  Use,
}

/// An owned, serializable snapshot of a subtree, with atoms spelled out. Intended for tests and
/// debugging output; ids are not included, so equal shapes dump equally.
#[derive(Clone, Debug, Serialize)]
pub struct DumpNode {
  pub kind: ParseNodeKind,
  #[serde(skip_serializing_if = "is_nop")]
  pub op: JsOp,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<JsNumber>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub binding: Option<Binding>,
  /// Name of the definition a use resolves to.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub resolves_to: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub flags: Vec<&'static str>,
  #[serde(skip_serializing_if = "is_free")]
  pub cookie: UpvarCookie,
  /// Names bound by a name set node.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub names: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<DumpNode>,
}

impl ParseNodeArena {
  pub fn dump(&self, id: NodeId) -> DumpNode {
    let node = &self[id];
    let binding = if node.is_defn() {
      Some(Binding::Def)
    } else if node.is_used() {
      Some(Binding::Use)
    } else {
      None
    };
    let resolves_to = node
      .is_used()
      .then(|| self.resolve(id))
      .and_then(|def| self[def].atom())
      .map(|atom| self.atoms.get(atom).to_string());
    let value = match node.payload {
      Payload::Nullary(Nullary::Number(n)) => Some(n),
      _ => None,
    };
    let names = match node.as_nameset() {
      Some(set) => set
        .names
        .keys()
        .map(|atom| self.atoms.get(*atom).to_string())
        .collect(),
      None => Vec::new(),
    };
    let children = match node.as_list() {
      Some(_) => self.list_iter(id).map(|kid| self.dump(kid)).collect(),
      None => node
        .payload
        .children()
        .into_iter()
        .map(|kid| self.dump(kid))
        .collect(),
    };
    DumpNode {
      kind: node.kind,
      op: node.op,
      name: node.atom().map(|atom| self.atoms.get(atom).to_string()),
      value,
      binding,
      resolves_to,
      flags: node.dflags().iter_names().map(|(name, _)| name).collect(),
      cookie: node.cookie(),
      names,
      children,
    }
  }

  pub fn dump_json(&self, id: NodeId) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&self.dump(id))
  }
}

#[cfg(test)]
mod tests {
  use crate::arena::ParseNodeArena;
  use crate::flags::DefnFlags;
  use crate::kind::ParseNodeKind;
  use crate::loc::TokenPos;
  use crate::op::JsOp;
  use crate::util::test::assert_json_eq;
  use serde_json::json;

  #[test]
  fn dumps_bound_function_body() {
    let mut arena = ParseNodeArena::default();
    let x = arena.atoms.intern("x");
    let def = arena.new_name(x, TokenPos::on_line(1, 11, 12)).unwrap();
    {
      let node = &mut arena[def];
      node.op = JsOp::GetArg;
      node.set_defn(true);
      node.add_dflags(DefnFlags::INITIALIZED | DefnFlags::BOUND);
      node.cookie_mut().unwrap().set(1, 0);
    }
    let u = arena.new_name(x, TokenPos::on_line(1, 23, 24)).unwrap();
    arena.link_use_to_def(u, def);
    let one = arena.new_number(1.0, TokenPos::on_line(1, 27, 28)).unwrap();
    let sum = arena
      .new_binary(ParseNodeKind::Add, JsOp::Add, u, one)
      .unwrap();
    let ret = arena
      .new_unary(
        ParseNodeKind::Return,
        JsOp::Return,
        TokenPos::on_line(1, 16, 22),
        Some(sum),
      )
      .unwrap();
    let body = arena
      .make_empty_list(ParseNodeKind::StatementList, JsOp::Nop, TokenPos::on_line(1, 14, 15))
      .unwrap();
    arena.append(body, ret);
    let args = arena
      .make_empty_list(ParseNodeKind::ArgsBody, JsOp::Nop, TokenPos::on_line(1, 11, 12))
      .unwrap();
    arena.append(args, def);
    arena.append(args, body);

    assert_json_eq(
      json!({
        "kind": "ArgsBody",
        "children": [
          {
            "kind": "Name",
            "op": "GetArg",
            "name": "x",
            "binding": "def",
            "flags": ["INITIALIZED", "BOUND"],
            "cookie": [1, 0],
          },
          {
            "kind": "StatementList",
            "children": [{
              "kind": "Return",
              "op": "Return",
              "children": [{
                "kind": "Add",
                "op": "Add",
                "children": [
                  {
                    "kind": "Name",
                    "op": "Name",
                    "name": "x",
                    "binding": "use",
                    "resolves_to": "x",
                  },
                  { "kind": "Number", "op": "Double", "value": 1 },
                ],
              }],
            }],
          },
        ],
      }),
      &arena.dump(args),
    );
    assert!(arena.dump_json(args).unwrap().contains("\"resolves_to\": \"x\""));
  }
}

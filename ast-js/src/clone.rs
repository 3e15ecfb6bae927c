use crate::arena::ParseNodeArena;
use crate::error::AstResult;
use crate::flags::DefnFlags;
use crate::flags::NodeFlags;
use crate::kind::ParseNodeKind;
use crate::node::BinaryData;
use crate::node::NodeId;
use crate::node::Payload;
use crate::op::JsOp;

impl ParseNodeArena {
  /// Copies a leaf, or any node whose payload holds no links into the tree.
  fn clone_leaf(&mut self, id: NodeId) -> AstResult<NodeId> {
    let node = self[id].clone();
    debug_assert!(
      node.payload.children().is_empty(),
      "{id:?} is not a leaf"
    );
    let in_parens = node.is_in_parens();
    let copy = self.allocate(node.kind, node.op, node.payload, node.pos)?;
    self[copy].set_in_parens(in_parens);
    Ok(copy)
  }

  /// Clones an assignment target: a name, or an array or object destructuring pattern. Every cloned
  /// name is an additional use of whatever the original name is bound to, so that the clone and the
  /// original resolve to the same definition.
  pub fn clone_left_hand_side(&mut self, opn: NodeId) -> AstResult<NodeId> {
    let original = self[opn].clone();
    match &original.payload {
      Payload::List(data) => {
        debug_assert!(matches!(
          original.kind,
          ParseNodeKind::Rb | ParseNodeKind::Rc
        ));
        let pn = self.make_empty_list(original.kind, original.op, original.pos)?;
        let elems = self.list_iter(opn).collect::<Vec<_>>();
        for elem in elems {
          let pn2 = match self[elem].as_binary().copied() {
            Some(prop) if original.kind == ParseNodeKind::Rc => {
              debug_assert_eq!(self[elem].kind, ParseNodeKind::Colon);
              let tag = self.clone_leaf(prop.left)?;
              let target = self.clone_left_hand_side(prop.right)?;
              let pos = self[elem].pos;
              self.allocate(
                ParseNodeKind::Colon,
                JsOp::InitProp,
                BinaryData {
                  left: tag,
                  right: target,
                  const_value: None,
                  iter_flags: 0,
                }
                .into(),
                pos,
              )?
            }
            _ if self[elem].is_array_hole() => self.clone_leaf(elem)?,
            _ => self.clone_left_hand_side(elem)?,
          };
          self.append(pn, pn2);
        }
        let copy = &mut self[pn];
        copy.pos = original.pos;
        copy.set_in_parens(original.is_in_parens());
        if let Some(list) = copy.as_list_mut() {
          list.xflags = data.xflags;
          list.block_id = data.block_id;
        };
        Ok(pn)
      }
      Payload::Name(_) => {
        let pn = self.allocate(
          original.kind,
          JsOp::SetName,
          original.payload.clone(),
          original.pos,
        )?;
        self[pn].set_in_parens(original.is_in_parens());
        if original.is_used() {
          if let Some(def) = original.maybe_lexdef() {
            let head = self[def].use_head;
            self[def].use_head = Some(pn);
            let copy = &mut self[pn];
            copy.flags.insert(NodeFlags::USED);
            copy.next_use = head;
          };
        } else {
          let copy = &mut self[pn];
          if let Some(name) = copy.as_name_mut() {
            name.expr = None;
            if original.is_defn() {
              name.cookie.make_free();
              name.dflags.remove(DefnFlags::BOUND);
            };
          };
          if original.is_defn() {
            self.link_use_to_def(pn, opn);
          };
        };
        Ok(pn)
      }
      _ => self.clone_leaf(opn),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::arena::ParseNodeArena;
  use crate::kind::ParseNodeKind;
  use crate::loc::TokenPos;
  use crate::op::JsOp;

  #[test]
  fn cloned_names_share_a_definition() {
    let mut arena = ParseNodeArena::default();
    let pos = TokenPos::default();
    let a = arena.atoms.intern("a");
    let b = arena.atoms.intern("b");
    let k = arena.atoms.intern("k");

    let def_a = arena.new_name(a, pos).unwrap();
    arena[def_a].set_defn(true);
    let def_b = arena.new_name(b, pos).unwrap();
    arena[def_b].set_defn(true);
    let use_b = arena.new_name(b, pos).unwrap();
    arena.link_use_to_def(use_b, def_b);

    // [a, , {k: b}]
    let pattern = arena
      .make_empty_list(ParseNodeKind::Rb, JsOp::Nop, pos)
      .unwrap();
    arena.append(pattern, def_a);
    let hole = arena.new_nullary(ParseNodeKind::Comma, JsOp::Nop, pos).unwrap();
    arena.append(pattern, hole);
    let obj = arena
      .make_empty_list(ParseNodeKind::Rc, JsOp::Nop, pos)
      .unwrap();
    let key = arena.new_atom_leaf(ParseNodeKind::Name, JsOp::Nop, k, pos).unwrap();
    let prop = arena
      .new_binary(ParseNodeKind::Colon, JsOp::InitProp, key, use_b)
      .unwrap();
    arena.append(obj, prop);
    arena.append(pattern, obj);

    let copy = arena.clone_left_hand_side(pattern).unwrap();
    let elems = arena.list_iter(copy).collect::<Vec<_>>();
    assert_eq!(elems.len(), 3);
    assert_ne!(elems[0], def_a);
    assert!(arena[elems[0]].is_used());
    assert_eq!(arena.resolve(elems[0]), def_a);
    assert!(arena[elems[1]].is_array_hole());

    let copied_prop = arena.list_iter(elems[2]).next().unwrap();
    let target = arena[copied_prop].as_binary().unwrap().right;
    assert_ne!(target, use_b);
    assert_eq!(arena.resolve(target), def_b);
    assert_eq!(arena[target].op, JsOp::SetName);
    assert_eq!(arena.uses(def_b).count(), 2);
  }

  #[test]
  fn cloned_leaves_keep_parens() {
    let mut arena = ParseNodeArena::default();
    let pos = TokenPos::on_line(1, 0, 3);
    let pattern = arena
      .make_empty_list(ParseNodeKind::Rb, JsOp::Nop, pos)
      .unwrap();
    let hole = arena.new_nullary(ParseNodeKind::Comma, JsOp::Nop, pos).unwrap();
    arena[hole].set_in_parens(true);
    arena.append(pattern, hole);

    let copy = arena.clone_left_hand_side(pattern).unwrap();
    let copied = arena.list_iter(copy).next().unwrap();
    assert_ne!(copied, hole);
    assert!(arena[copied].is_array_hole());
    assert!(arena[copied].is_in_parens());
    assert_eq!(arena[copied].pos, pos);
  }
}

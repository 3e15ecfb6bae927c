use ast_js::flags::ListFlags;
use ast_js::loc::TokenPos;
use ast_js::AstError;
use ast_js::AstOptions;
use ast_js::JsOp;
use ast_js::NodeId;
use ast_js::ParseNodeArena;
use ast_js::ParseNodeKind;
use proptest::prelude::*;

fn numbers(arena: &mut ParseNodeArena, count: usize) -> Vec<NodeId> {
  (0..count)
    .map(|i| {
      let col = i as u32 * 3;
      arena
        .new_number(i as f64, TokenPos::on_line(1, col, col + 1))
        .unwrap()
    })
    .collect()
}

#[test]
fn released_slots_are_reused_before_growing() {
  let mut arena = ParseNodeArena::default();
  let kids = numbers(&mut arena, 2);
  let sum = arena
    .new_binary(ParseNodeKind::Sub, JsOp::Sub, kids[0], kids[1])
    .unwrap();
  let stmt = arena
    .new_unary(ParseNodeKind::Semi, JsOp::Nop, TokenPos::default(), Some(sum))
    .unwrap();
  assert_eq!(arena.live_count(), 4);

  assert_eq!(arena.release_subtree(stmt), None);
  assert_eq!(arena.live_count(), 0);
  assert_eq!(arena.free_count(), 4);
  let capacity = arena.capacity();

  let fresh = numbers(&mut arena, 4);
  assert_eq!(arena.capacity(), capacity);
  assert_eq!(arena.free_count(), 0);
  for id in fresh {
    assert!(arena.is_live(id));
  }
}

#[test]
fn release_subtree_keeps_bound_names() {
  let mut arena = ParseNodeArena::default();
  let x = arena.atoms.intern("x");
  let def = arena.new_name(x, TokenPos::default()).unwrap();
  arena[def].set_defn(true);
  let use_node = arena.new_name(x, TokenPos::default()).unwrap();
  arena.link_use_to_def(use_node, def);
  let one = arena.new_number(1.0, TokenPos::default()).unwrap();
  let sum = arena
    .new_binary(ParseNodeKind::Add, JsOp::Add, use_node, one)
    .unwrap();

  arena.release_subtree(sum);
  assert!(!arena.is_live(sum));
  assert!(!arena.is_live(one));
  assert!(arena.is_live(use_node));
  assert_eq!(arena.resolve(use_node), def);
}

#[test]
fn release_subtree_returns_next_sibling() {
  let mut arena = ParseNodeArena::default();
  let list = arena
    .make_empty_list(ParseNodeKind::StatementList, JsOp::Nop, TokenPos::default())
    .unwrap();
  let kids = numbers(&mut arena, 3);
  for kid in &kids {
    arena.append(list, *kid);
  }
  assert_eq!(arena.release_subtree(kids[1]), Some(kids[2]));
}

#[test]
fn exhaustion_is_reported() {
  let mut arena = ParseNodeArena::new(AstOptions {
    max_nodes: 2,
    ..Default::default()
  });
  numbers(&mut arena, 2);
  let err = arena
    .new_nullary(ParseNodeKind::This, JsOp::This, TokenPos::default())
    .unwrap_err();
  assert_eq!(err, AstError::OutOfMemory { limit: 2 });
  assert_eq!(err.code(), "AST0001");
}

proptest! {
  #[test]
  fn appended_lists_keep_order_tail_and_count(count in 0usize..40) {
    let mut arena = ParseNodeArena::default();
    let list = arena
      .make_empty_list(ParseNodeKind::StatementList, JsOp::Nop, TokenPos::default())
      .unwrap();
    let kids = numbers(&mut arena, count);
    for kid in &kids {
      arena.append(list, *kid);
      prop_assert_eq!(arena.last(list), Some(*kid));
    }
    prop_assert_eq!(arena.list_count(list) as usize, count);
    prop_assert_eq!(arena.list_iter(list).collect::<Vec<_>>(), kids.clone());
    if let Some(last) = kids.last() {
      prop_assert!(arena[*last].next.is_none());
      prop_assert_eq!(arena[list].pos.end, arena[*last].pos.end);
    }
  }

  #[test]
  fn add_chains_flatten_into_one_list(count in 2usize..20) {
    let mut arena = ParseNodeArena::new(AstOptions {
      fold_constants: false,
      ..Default::default()
    });
    let atoms: Vec<_> = (0..count).map(|i| arena.atoms.intern(format!("v{i}"))).collect();
    let names: Vec<NodeId> = atoms
      .iter()
      .map(|atom| arena.new_name(*atom, TokenPos::default()).unwrap())
      .collect();
    let mut acc = names[0];
    for name in &names[1..] {
      acc = arena
        .append_or_join(ParseNodeKind::Add, JsOp::Add, acc, *name)
        .unwrap();
    }
    if count == 2 {
      prop_assert!(arena[acc].as_binary().is_some());
    } else {
      prop_assert_eq!(arena.list_iter(acc).collect::<Vec<_>>(), names);
      prop_assert_eq!(arena.list_flags(acc), ListFlags::CANTFOLD);
    }
  }

  #[test]
  fn list_flags_accumulate(bits in proptest::collection::vec(any::<u16>(), 0..8)) {
    let mut arena = ParseNodeArena::default();
    let list = arena
      .make_empty_list(ParseNodeKind::Rb, JsOp::Nop, TokenPos::default())
      .unwrap();
    let valid = ListFlags::valid_for(ParseNodeKind::Rb);
    let mut expected = ListFlags::empty();
    for bits in bits {
      let flags = ListFlags::from_bits_truncate(bits) & valid;
      arena.add_list_flags(list, flags);
      expected |= flags;
      prop_assert_eq!(arena.list_flags(list), expected);
    }
  }
}

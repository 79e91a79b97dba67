//! Tests for the widget arena and child sequences.

use trellis_tree::{Sequence, Tree, TreeError};

// ========== arena ==========

#[test]
fn test_parent_links() {
    let mut tree = Tree::new();
    let root = tree.insert("root");
    let child = tree.insert("child");
    let grandchild = tree.insert("grandchild");
    tree.set_parent(child, root).unwrap();
    tree.set_parent(grandchild, child).unwrap();

    assert_eq!(tree.parent(grandchild), Some(child));
    assert_eq!(tree.ancestors(grandchild).collect::<Vec<_>>(), vec![child, root]);
    assert_eq!(tree.ancestors(root).count(), 0);
    assert_eq!(tree.get(child), Some(&"child"));
}

#[test]
fn test_second_parent_is_rejected() {
    let mut tree = Tree::new();
    let a = tree.insert(1);
    let b = tree.insert(2);
    let child = tree.insert(3);
    tree.set_parent(child, a).unwrap();
    assert_eq!(
        tree.set_parent(child, b),
        Err(TreeError::AlreadyParented { child, parent: a })
    );
    assert_eq!(tree.parent(child), Some(a), "unchanged");
}

#[test]
fn test_cycles_are_rejected() {
    let mut tree = Tree::new();
    let outer = tree.insert(());
    let inner = tree.insert(());
    tree.set_parent(inner, outer).unwrap();
    assert_eq!(
        tree.set_parent(outer, inner),
        Err(TreeError::Cycle {
            child: outer,
            parent: inner
        })
    );
    assert!(matches!(tree.set_parent(outer, outer), Err(TreeError::Cycle { .. })));
}

#[test]
fn test_parented_nodes_cannot_be_removed() {
    let mut tree = Tree::new();
    let parent = tree.insert("parent");
    let child = tree.insert("child");
    tree.set_parent(child, parent).unwrap();
    assert_eq!(tree.remove(child), Err(TreeError::StillParented(child)));

    assert_eq!(tree.unparent(child), Ok(parent));
    assert_eq!(tree.unparent(child), Err(TreeError::NotParented(child)));
    assert_eq!(tree.remove(child), Ok("child"));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_stale_ids_are_detected() {
    let mut tree = Tree::new();
    let old = tree.insert("old");
    let _ = tree.remove(old).unwrap();
    let new = tree.insert("new");
    assert_ne!(old, new);
    assert!(!tree.contains(old));
    assert_eq!(tree.get(old), None, "a stale id never aliases a newer node");
    assert_eq!(tree.remove(old), Err(TreeError::NoSuchNode(old)));
}

// ========== sequence ==========

#[test]
fn test_sequence_insert_positions() {
    let mut seq = Sequence::new();
    assert_eq!(seq.insert('a', None), 0);
    assert_eq!(seq.insert('c', Some(5)), 1, "out of range appends");
    assert_eq!(seq.insert('b', Some(1)), 1);
    assert_eq!(seq.as_slice(), ['a', 'b', 'c']);
    assert_eq!(seq.next('a'), Some('b'));
    assert_eq!(seq.prev('a'), None);
    assert_eq!(seq.last(), Some('c'));
}

#[test]
fn test_sequence_move_and_remove() {
    let mut seq: Sequence<u32> = (1..=4).collect();
    assert!(seq.move_to(1, None));
    assert_eq!(seq.iter().collect::<Vec<_>>(), vec![2, 3, 4, 1]);
    assert_eq!(seq.remove(3), Some(1));
    assert_eq!(seq.remove(3), None);
    assert!(!seq.move_to(3, Some(0)));
    assert_eq!(seq.position(1), Some(2));
}

#[test]
fn test_sorted_insert_keeps_equal_keys_in_order() {
    let mut seq: Sequence<(u32, char)> = [(1, 'a'), (2, 'b'), (3, 'c')].into_iter().collect();
    let index = seq.insert_sorted_by((2, 'z'), |a, b| a.0.cmp(&b.0));
    assert_eq!(index, 2, "after the existing 2");
    seq.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(seq.get(1), Some((2, 'b')), "sorting is stable");
    assert_eq!(seq.get(2), Some((2, 'z')));
}

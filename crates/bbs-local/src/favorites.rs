//! Favorites tree operations: load/save (JSON), mutation, and reorder.
//! The tree is a plain `Vec<FavNode>` at the root; [`FavNode::Folder`]
//! nests further `Vec<FavNode>` children. Depth is unbounded in principle.

use bbs_core::favorites::{FavNode, ReorderPosition};
use bbs_core::{Error, Result};

pub fn load(text: &str) -> Result<Vec<FavNode>> {
    serde_json::from_str(text).map_err(|e| Error::Parse(format!("favorites.json: {e}")))
}

pub fn save(tree: &[FavNode]) -> Result<String> {
    serde_json::to_string_pretty(tree).map_err(|e| Error::Parse(format!("favorites.json: {e}")))
}

/// Appends to the root.
pub fn add(tree: &mut Vec<FavNode>, node: FavNode) {
    tree.push(node);
}

pub fn add_folder(tree: &mut Vec<FavNode>, id: impl Into<String>, title: impl Into<String>) {
    tree.push(FavNode::Folder {
        id: id.into(),
        title: title.into(),
        children: Vec::new(),
    });
}

pub fn add_separator(tree: &mut Vec<FavNode>, id: impl Into<String>) {
    tree.push(FavNode::Separator { id: id.into() });
}

/// Deep removal by id. Returns `true` if a node was removed.
pub fn remove(tree: &mut Vec<FavNode>, id: &str) -> bool {
    if let Some(pos) = tree.iter().position(|n| n.id() == id) {
        tree.remove(pos);
        return true;
    }
    for node in tree.iter_mut() {
        if let FavNode::Folder { children, .. } = node {
            if remove(children, id) {
                return true;
            }
        }
    }
    false
}

fn find<'a>(tree: &'a [FavNode], id: &str) -> Option<&'a FavNode> {
    for node in tree {
        if node.id() == id {
            return Some(node);
        }
        if let FavNode::Folder { children, .. } = node {
            if let Some(found) = find(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_mut<'a>(tree: &'a mut [FavNode], id: &str) -> Option<&'a mut FavNode> {
    for node in tree.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
    }
    for node in tree.iter_mut() {
        if let FavNode::Folder { children, .. } = node {
            if let Some(found) = find_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// `true` if `ancestor_id` names a folder that (transitively) contains `id`.
fn is_descendant(tree: &[FavNode], ancestor_id: &str, id: &str) -> bool {
    let Some(FavNode::Folder { children, .. }) = find(tree, ancestor_id) else {
        return false;
    };
    children.iter().any(|n| n.id() == id || is_descendant(children, n.id(), id))
}

/// Deep removal of a node from wherever it currently lives, returning the
/// removed node.
fn take(tree: &mut Vec<FavNode>, id: &str) -> Option<FavNode> {
    if let Some(pos) = tree.iter().position(|n| n.id() == id) {
        return Some(tree.remove(pos));
    }
    for node in tree.iter_mut() {
        if let FavNode::Folder { children, .. } = node {
            if let Some(found) = take(children, id) {
                return Some(found);
            }
        }
    }
    None
}

/// Moves `node_id` into `folder_id`'s children (appended at the end).
/// Rejected if `folder_id` does not name a folder, or if it names the node
/// itself or one of its own descendants (would create a cycle).
pub fn move_to_folder(tree: &mut Vec<FavNode>, node_id: &str, folder_id: &str) -> Result<()> {
    if node_id == folder_id {
        return Err(Error::Validation("cannot move a folder into itself".to_string()));
    }
    if is_descendant(tree, node_id, folder_id) {
        return Err(Error::Validation("cannot move a folder into its own descendant".to_string()));
    }
    let Some(node) = take(tree, node_id) else {
        return Err(Error::Validation(format!("no such node: {node_id}")));
    };
    let Some(FavNode::Folder { children, .. }) = find_mut(tree, folder_id) else {
        return Err(Error::Validation(format!("{folder_id} is not a folder")));
    };
    children.push(node);
    Ok(())
}

/// Reorders `drag_id` relative to `drop_id`. `Inside` is legal only when
/// `drop_id` names a folder; any position is rejected if it would move a
/// folder into its own descendant.
pub fn reorder(tree: &mut Vec<FavNode>, drag_id: &str, drop_id: &str, position: ReorderPosition) -> Result<()> {
    if drag_id == drop_id {
        return Err(Error::Validation("cannot reorder a node relative to itself".to_string()));
    }
    if is_descendant(tree, drag_id, drop_id) {
        return Err(Error::Validation("cannot move a folder into its own descendant".to_string()));
    }
    if position == ReorderPosition::Inside {
        return move_to_folder(tree, drag_id, drop_id);
    }

    let Some(node) = take(tree, drag_id) else {
        return Err(Error::Validation(format!("no such node: {drag_id}")));
    };
    if !insert_relative(tree, drop_id, node.clone(), position) {
        // drop target vanished (shouldn't happen given the checks above);
        // put the node back at the root rather than losing it.
        tree.push(node);
        return Err(Error::Validation(format!("no such drop target: {drop_id}")));
    }
    Ok(())
}

fn insert_relative(tree: &mut Vec<FavNode>, drop_id: &str, node: FavNode, position: ReorderPosition) -> bool {
    if let Some(pos) = tree.iter().position(|n| n.id() == drop_id) {
        let idx = match position {
            ReorderPosition::Before => pos,
            ReorderPosition::After => pos + 1,
            ReorderPosition::Inside => unreachable!("handled by move_to_folder"),
        };
        tree.insert(idx, node);
        return true;
    }
    for n in tree.iter_mut() {
        if let FavNode::Folder { children, .. } = n {
            if insert_relative(children, drop_id, node.clone(), position) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbs_core::board::BoardType;

    fn item(id: &str) -> FavNode {
        FavNode::Item {
            id: id.to_string(),
            item_type: bbs_core::favorites::FavItemType::Board,
            url: format!("https://example/{id}/"),
            title: id.to_string(),
            board_type: BoardType::TwoCh,
        }
    }

    fn folder(id: &str, children: Vec<FavNode>) -> FavNode {
        FavNode::Folder {
            id: id.to_string(),
            title: id.to_string(),
            children,
        }
    }

    #[test]
    fn save_then_load_round_trips_structurally() {
        let tree = vec![folder("f1", vec![item("a")]), item("b")];
        let text = save(&tree).unwrap();
        let loaded = load(&text).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn remove_is_deep() {
        let mut tree = vec![folder("f1", vec![item("a"), item("b")])];
        assert!(remove(&mut tree, "b"));
        let FavNode::Folder { children, .. } = &tree[0] else { panic!() };
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), "a");
    }

    #[test]
    fn move_to_folder_relocates_node() {
        let mut tree = vec![folder("f1", vec![]), item("a")];
        move_to_folder(&mut tree, "a", "f1").unwrap();
        assert_eq!(tree.len(), 1);
        let FavNode::Folder { children, .. } = &tree[0] else { panic!() };
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), "a");
    }

    #[test]
    fn move_to_folder_rejects_moving_folder_into_own_descendant() {
        let mut tree = vec![folder("outer", vec![folder("inner", vec![])])];
        assert!(move_to_folder(&mut tree, "outer", "inner").is_err());
    }

    #[test]
    fn move_to_folder_rejects_non_folder_target() {
        let mut tree = vec![item("a"), item("b")];
        assert!(move_to_folder(&mut tree, "a", "b").is_err());
    }

    #[test]
    fn reorder_before_and_after() {
        let mut tree = vec![item("a"), item("b"), item("c")];
        reorder(&mut tree, "c", "a", ReorderPosition::Before).unwrap();
        assert_eq!(tree.iter().map(|n| n.id()).collect::<Vec<_>>(), vec!["c", "a", "b"]);

        let mut tree2 = vec![item("a"), item("b"), item("c")];
        reorder(&mut tree2, "a", "c", ReorderPosition::After).unwrap();
        assert_eq!(tree2.iter().map(|n| n.id()).collect::<Vec<_>>(), vec!["b", "c", "a"]);
    }

    #[test]
    fn reorder_inside_requires_folder_drop_target() {
        let mut tree = vec![item("a"), item("b")];
        assert!(reorder(&mut tree, "a", "b", ReorderPosition::Inside).is_err());

        let mut tree2 = vec![folder("f", vec![]), item("a")];
        reorder(&mut tree2, "a", "f", ReorderPosition::Inside).unwrap();
        let FavNode::Folder { children, .. } = &tree2[0] else { panic!() };
        assert_eq!(children.len(), 1);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavItemType {
    Board,
    Thread,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FavNode {
    Folder {
        id: String,
        title: String,
        children: Vec<FavNode>,
    },
    Item {
        id: String,
        #[serde(rename = "type")]
        item_type: FavItemType,
        url: String,
        title: String,
        board_type: crate::board::BoardType,
    },
    Separator {
        id: String,
    },
}

impl FavNode {
    pub fn id(&self) -> &str {
        match self {
            FavNode::Folder { id, .. } => id,
            FavNode::Item { id, .. } => id,
            FavNode::Separator { id } => id,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FavNode::Folder { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderPosition {
    Before,
    After,
    /// Legal only when `drop` is a folder.
    Inside,
}

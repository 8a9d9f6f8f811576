//! Pure assembly of a flat comment list into a renderable forest.
//!
//! Order is inherited entirely from the input (the store's ORDER BY);
//! nothing here sorts. Rebuilt from scratch on every read. Quadratic,
//! which is fine at tens to low hundreds of comments per post.

use crate::CommentView;

use uuid::Uuid;

/// A comment with its replies nested under it, recursively.
#[derive(serde::Serialize, serde::Deserialize, Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentView,
    pub replies: Vec<CommentNode>,
}

/// The comments with no parent, in input order.
pub fn roots(comments: &[CommentView]) -> Vec<&CommentView> {
    comments.iter().filter(|c| c.parent_id.is_none()).collect()
}

/// The direct replies to `id`, in input order.
pub fn children(comments: &[CommentView], id: Uuid) -> Vec<&CommentView> {
    comments
        .iter()
        .filter(|c| c.parent_id == Some(id))
        .collect()
}

/// Builds the forest. A comment whose `parent_id` names an id absent from
/// the input is neither a root nor anyone's reply: it is dropped from the
/// output while remaining in the input list.
pub fn build_forest(comments: &[CommentView]) -> Vec<CommentNode> {
    roots(comments)
        .into_iter()
        .map(|root| build_node(root, comments))
        .collect()
}

fn build_node(comment: &CommentView, all: &[CommentView]) -> CommentNode {
    CommentNode {
        replies: children(all, comment.id)
            .into_iter()
            .map(|reply| build_node(reply, all))
            .collect(),
        comment: comment.clone(),
    }
}

//! Arena storage for the game tree.
//!
//! Nodes live in one `Vec` and refer to each other by index. The search
//! allocates depth-first, so once a node is finished every node allocated
//! after its first child belongs to its subtree and can be reclaimed by
//! truncating the arena.

use crate::engine::{Board, PlayerMove};
use crate::error::{CrushError, Result};

/// Index of a node inside its [`SearchTree`].
pub type NodeId = usize;

/// Index of the root node.
pub const ROOT: NodeId = 0;

/// Lifecycle of a node during one search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// Created, children not generated yet.
    Unexpanded,
    /// Children generated.
    Expanded,
    /// Final score known.
    Evaluated,
    /// Skipped by alpha-beta; board dropped.
    Pruned,
}

/// One state of the game tree.
#[derive(Clone, Debug)]
pub struct SearchNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    board: Option<Board>,
    mv: Option<PlayerMove>,
    depth: usize,
    baseline: f64,
    evaluation: f64,
    state: NodeState,
}

impl SearchNode {
    fn new(
        parent: Option<NodeId>,
        board: Board,
        mv: Option<PlayerMove>,
        baseline: f64,
        depth: usize,
    ) -> Self {
        SearchNode {
            parent,
            children: Vec::new(),
            board: Some(board),
            mv,
            depth,
            baseline,
            evaluation: 0.0,
            state: NodeState::Unexpanded,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The board snapshot, `None` once released.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// The move that produced this node, `None` for the root of a full search.
    pub fn mv(&self) -> Option<&PlayerMove> {
        self.mv.as_ref()
    }

    /// Plies between the search root and this node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Unsigned heuristic score of the producing move on the parent board.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Backed-up score, valid once the node is `Evaluated`.
    pub fn evaluation(&self) -> f64 {
        self.evaluation
    }

    pub fn state(&self) -> NodeState {
        self.state
    }
}

/// Index-linked arena of [`SearchNode`]s rooted at [`ROOT`].
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    peak_len: usize,
}

impl SearchTree {
    /// Creates a tree whose root holds `board` with no move and a zero baseline.
    pub fn new(board: Board) -> Self {
        SearchTree {
            nodes: vec![SearchNode::new(None, board, None, 0.0, 0)],
            peak_len: 1,
        }
    }

    /// Creates a tree for a subtree searched on its own, e.g. on a worker thread.
    ///
    /// The root carries the move that led to it and keeps its depth in the full tree.
    pub fn detached(board: Board, mv: PlayerMove, baseline: f64, depth: usize) -> Self {
        SearchTree {
            nodes: vec![SearchNode::new(None, board, Some(mv), baseline, depth)],
            peak_len: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Largest number of nodes held at once.
    pub fn peak_len(&self) -> usize {
        self.peak_len
    }

    fn unknown(id: NodeId) -> CrushError {
        CrushError::Precondition(format!("unknown search node {}", id))
    }

    pub fn node(&self, id: NodeId) -> Result<&SearchNode> {
        self.nodes.get(id).ok_or_else(|| Self::unknown(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SearchNode> {
        self.nodes.get_mut(id).ok_or_else(|| Self::unknown(id))
    }

    /// Appends a child of `parent` reached by `mv`.
    ///
    /// # Errors
    /// Returns `CrushError::Precondition` if `parent` is not a node of this tree.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        board: Board,
        mv: PlayerMove,
        baseline: f64,
    ) -> Result<NodeId> {
        let depth = self.node(parent)?.depth + 1;
        let id = self.nodes.len();
        self.nodes
            .push(SearchNode::new(Some(parent), board, Some(mv), baseline, depth));
        let parent_node = self.node_mut(parent)?;
        parent_node.children.push(id);
        parent_node.state = NodeState::Expanded;
        self.peak_len = self.peak_len.max(self.nodes.len());
        Ok(id)
    }

    /// Takes the board out of a node, leaving it released.
    ///
    /// # Errors
    /// Returns `CrushError::Precondition` for an unknown node or one whose board
    /// was already released.
    pub fn take_board(&mut self, id: NodeId) -> Result<Board> {
        self.node_mut(id)?.board.take().ok_or_else(|| {
            CrushError::Precondition(format!("board of search node {} was released", id))
        })
    }

    /// Records the final score of a node.
    pub fn set_evaluation(&mut self, id: NodeId, evaluation: f64) -> Result<()> {
        let node = self.node_mut(id)?;
        node.evaluation = evaluation;
        node.state = NodeState::Evaluated;
        Ok(())
    }

    /// Marks a node skipped by pruning and drops its board.
    pub fn mark_pruned(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        node.board = None;
        node.state = NodeState::Pruned;
        Ok(())
    }

    /// Drops every descendant of `id`.
    ///
    /// When the subtree occupies the tail of the arena, which holds for a node
    /// that was just finished by the depth-first search, the arena is truncated.
    /// Otherwise only the links and boards are dropped.
    pub fn release_subtree(&mut self, id: NodeId) -> Result<()> {
        let first = match self.node(id)?.children.first() {
            Some(&first) => first,
            None => return Ok(()),
        };
        let tail_is_subtree = self.nodes[first..]
            .iter()
            .all(|n| matches!(n.parent, Some(p) if p == id || p >= first));

        if tail_is_subtree {
            self.nodes.truncate(first);
        } else {
            let mut stack = std::mem::take(&mut self.node_mut(id)?.children);
            while let Some(child) = stack.pop() {
                let node = self.node_mut(child)?;
                node.board = None;
                stack.append(&mut node.children);
            }
        }
        self.node_mut(id)?.children.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fixtures::no_move_board;

    fn some_move(board: &Board, x: usize) -> PlayerMove {
        PlayerMove::between(board, x, 0, x + 1, 0).unwrap()
    }

    #[test]
    fn test_root_has_no_move_and_zero_baseline() {
        let tree = SearchTree::new(no_move_board());
        let root = tree.node(ROOT).unwrap();
        assert!(root.parent().is_none());
        assert!(root.mv().is_none());
        assert_eq!(root.baseline(), 0.0);
        assert_eq!(root.depth(), 0);
        assert_eq!(root.state(), NodeState::Unexpanded);
        assert!(root.board().is_some());
    }

    #[test]
    fn test_add_child_links_both_ways() {
        let board = no_move_board();
        let mut tree = SearchTree::new(board.clone());
        let a = tree.add_child(ROOT, board.clone(), some_move(&board, 0), 10.0).unwrap();
        let b = tree.add_child(a, board.clone(), some_move(&board, 1), 20.0).unwrap();

        assert_eq!(tree.node(ROOT).unwrap().children(), &[a]);
        assert_eq!(tree.node(ROOT).unwrap().state(), NodeState::Expanded);
        assert_eq!(tree.node(b).unwrap().parent(), Some(a));
        assert_eq!(tree.node(b).unwrap().depth(), 2);
        assert!(tree.node(b).unwrap().mv().is_some());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_add_child_unknown_parent() {
        let board = no_move_board();
        let mut tree = SearchTree::new(board.clone());
        let result = tree.add_child(7, board.clone(), some_move(&board, 0), 0.0);
        assert!(matches!(result, Err(CrushError::Precondition(_))));
    }

    #[test]
    fn test_take_board_twice_fails() {
        let mut tree = SearchTree::new(no_move_board());
        assert!(tree.take_board(ROOT).is_ok());
        assert!(tree.node(ROOT).unwrap().board().is_none());
        assert!(matches!(
            tree.take_board(ROOT),
            Err(CrushError::Precondition(_))
        ));
    }

    #[test]
    fn test_release_subtree_truncates_tail() {
        let board = no_move_board();
        let mut tree = SearchTree::new(board.clone());
        let a = tree.add_child(ROOT, board.clone(), some_move(&board, 0), 0.0).unwrap();
        let b = tree.add_child(ROOT, board.clone(), some_move(&board, 1), 0.0).unwrap();
        let a1 = tree.add_child(a, board.clone(), some_move(&board, 2), 0.0).unwrap();
        tree.add_child(a1, board.clone(), some_move(&board, 3), 0.0).unwrap();
        tree.add_child(a, board.clone(), some_move(&board, 4), 0.0).unwrap();
        assert_eq!(tree.len(), 6);

        tree.release_subtree(a).unwrap();
        assert_eq!(tree.len(), 3);
        assert!(tree.node(a).unwrap().children().is_empty());
        assert_eq!(tree.node(ROOT).unwrap().children(), &[a, b]);
        assert_eq!(tree.peak_len(), 6);
    }

    #[test]
    fn test_release_subtree_not_at_tail_keeps_arena() {
        let board = no_move_board();
        let mut tree = SearchTree::new(board.clone());
        let a = tree.add_child(ROOT, board.clone(), some_move(&board, 0), 0.0).unwrap();
        let b = tree.add_child(ROOT, board.clone(), some_move(&board, 1), 0.0).unwrap();
        let a1 = tree.add_child(a, board.clone(), some_move(&board, 2), 0.0).unwrap();
        tree.add_child(b, board.clone(), some_move(&board, 3), 0.0).unwrap();

        tree.release_subtree(a).unwrap();
        assert_eq!(tree.len(), 5);
        assert!(tree.node(a).unwrap().children().is_empty());
        assert!(tree.node(a1).unwrap().board().is_none());
        assert_eq!(tree.node(b).unwrap().children().len(), 1);
    }

    #[test]
    fn test_evaluated_and_pruned_states() {
        let board = no_move_board();
        let mut tree = SearchTree::new(board.clone());
        let a = tree.add_child(ROOT, board.clone(), some_move(&board, 0), 0.0).unwrap();
        let b = tree.add_child(ROOT, board.clone(), some_move(&board, 1), 0.0).unwrap();
        tree.set_evaluation(a, 5.0).unwrap();
        assert_eq!(tree.node(a).unwrap().state(), NodeState::Evaluated);
        assert_eq!(tree.node(a).unwrap().evaluation(), 5.0);

        tree.mark_pruned(b).unwrap();
        assert_eq!(tree.node(b).unwrap().state(), NodeState::Pruned);
        assert!(tree.node(b).unwrap().board().is_none());
    }

    #[test]
    fn test_detached_root_keeps_move_and_depth() {
        let board = no_move_board();
        let mv = some_move(&board, 3);
        let tree = SearchTree::detached(board, mv, 42.0, 1);
        let root = tree.node(ROOT).unwrap();
        assert_eq!(root.mv(), Some(&mv));
        assert_eq!(root.baseline(), 42.0);
        assert_eq!(root.depth(), 1);
    }
}

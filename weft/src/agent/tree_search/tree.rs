//! Search tree stored as an index arena.
//!
//! Node `0` is the root. `parent` is only used to walk upwards; each parent
//! owns the list of its children's indices. Nodes are never removed.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchNode {
    pub id: usize,
    /// Action that produced this node; empty for the root.
    pub action: String,
    /// Description of the situation after `action`.
    pub state: String,
    pub visits: u32,
    /// Sum of values backpropagated into this node (or its own score for a
    /// freshly evaluated leaf).
    pub value: f64,
    pub terminal: bool,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl SearchNode {
    /// Mean value per visit; `0.0` when never visited.
    pub fn average(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / f64::from(self.visits)
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new("")
    }
}

impl SearchTree {
    pub const ROOT: usize = 0;

    pub fn new(root_state: impl Into<String>) -> Self {
        Self {
            nodes: vec![SearchNode {
                id: Self::ROOT,
                action: String::new(),
                state: root_state.into(),
                visits: 0,
                value: 0.0,
                terminal: false,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn get(&self, id: usize) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> &SearchNode {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    /// Appends an unvisited child of `parent`; `None` if `parent` does not exist.
    pub fn add_child(
        &mut self,
        parent: usize,
        action: impl Into<String>,
        state: impl Into<String>,
        terminal: bool,
    ) -> Option<usize> {
        if parent >= self.nodes.len() {
            return None;
        }
        let id = self.nodes.len();
        self.nodes.push(SearchNode {
            id,
            action: action.into(),
            state: state.into(),
            visits: 0,
            value: 0.0,
            terminal,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        Some(id)
    }

    /// Records the first evaluation of a leaf: one visit worth `score`.
    pub fn set_evaluation(&mut self, id: usize, score: f64) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visits = 1;
            node.value = score;
        }
    }

    /// `value/visits + c * sqrt(ln(parent_visits) / visits)`; `+inf` when
    /// unvisited. Parent visits are taken as at least 1.
    pub fn ucb_score(&self, id: usize, exploration_weight: f64) -> f64 {
        let Some(node) = self.nodes.get(id) else {
            return f64::NEG_INFINITY;
        };
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = node
            .parent
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.visits.max(1))
            .unwrap_or(1);
        let visits = f64::from(node.visits);
        node.value / visits
            + exploration_weight * (f64::from(parent_visits).ln() / visits).sqrt()
    }

    /// Descends from the root to a leaf: an unvisited child first (in list
    /// order), otherwise the child with the highest UCB score (first wins ties).
    pub fn select_leaf(&self, exploration_weight: f64) -> usize {
        let mut current = Self::ROOT;
        loop {
            let node = &self.nodes[current];
            if node.is_leaf() {
                return current;
            }
            if let Some(&unvisited) = node
                .children
                .iter()
                .find(|&&c| self.nodes[c].visits == 0)
            {
                return unvisited;
            }
            let mut best = node.children[0];
            let mut best_score = self.ucb_score(best, exploration_weight);
            for &child in &node.children[1..] {
                let score = self.ucb_score(child, exploration_weight);
                if score > best_score {
                    best = child;
                    best_score = score;
                }
            }
            current = best;
        }
    }

    /// Adds one visit and the child's value to every ancestor of `child`,
    /// root included. The child itself is left as evaluated.
    pub fn backpropagate(&mut self, child: usize) {
        let Some(node) = self.nodes.get(child) else {
            return;
        };
        let value = node.value;
        let mut cursor = node.parent;
        while let Some(id) = cursor {
            let ancestor = &mut self.nodes[id];
            ancestor.visits += 1;
            ancestor.value += value;
            cursor = ancestor.parent;
        }
    }

    /// Root-to-leaf path following the child with the highest average value
    /// (first wins ties).
    pub fn best_path(&self) -> Vec<usize> {
        let mut path = vec![Self::ROOT];
        let mut current = Self::ROOT;
        while let Some(&first) = self.nodes[current].children.first() {
            let mut best = first;
            for &child in &self.nodes[current].children[1..] {
                if self.nodes[child].average() > self.nodes[best].average() {
                    best = child;
                }
            }
            path.push(best);
            current = best;
        }
        path
    }

    /// Root-to-`id` path.
    pub fn path_to(&self, id: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cursor = self.nodes.get(id).map(|n| n.id);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.nodes[current].parent;
        }
        path.reverse();
        path
    }

    /// Numbered `action -> state` lines for prompts; the root shows its state only.
    pub fn describe_path(&self, path: &[usize]) -> String {
        path.iter()
            .filter_map(|&id| self.nodes.get(id))
            .enumerate()
            .map(|(step, node)| {
                if node.parent.is_none() {
                    format!("{}. {}", step, node.state)
                } else {
                    format!(
                        "{}. {} -> {} (avg {:.2})",
                        step,
                        node.action,
                        node.state,
                        node.average()
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

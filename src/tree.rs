use serde::Serialize;

pub type NodeId = usize;

/// Name given to the node attached where a parse fails.
pub const ERROR_NODE: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    NonTerminal,
    Terminal,
    Error,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Parse tree stored as an arena. Nodes are never freed; a node detached with
/// [`ParseTree::detach_last_children`] is expected to be re-attached with
/// [`ParseTree::adopt`] in the same step.
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    nodes: Vec<Node>,
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every node and starts over with a single root.
    pub fn reset_with_root(&mut self, name: &str, kind: NodeKind) -> NodeId {
        self.nodes.clear();
        self.push(name, kind, None)
    }

    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, name: &str, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.nodes[id].name.as_str()
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str, kind: NodeKind) -> NodeId {
        let id = self.push(name, kind, Some(parent));
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_error(&mut self, parent: NodeId) -> NodeId {
        self.add_child(parent, ERROR_NODE, NodeKind::Error)
    }

    /// Renames a node in place, e.g. when a terminal placeholder is matched to its token.
    pub fn rename(&mut self, id: NodeId, name: &str, kind: NodeKind) {
        let node = &mut self.nodes[id];
        node.name = name.to_string();
        node.kind = kind;
    }

    /// Detaches the last `n` children of `parent`, returned in their original order.
    pub fn detach_last_children(&mut self, parent: NodeId, n: usize) -> Vec<NodeId> {
        let children = &mut self.nodes[parent].children;
        let split = children.len().saturating_sub(n);
        let detached = children.split_off(split);
        for &child in &detached {
            self.nodes[child].parent = None;
        }
        detached
    }

    /// Appends detached nodes to `parent`'s children.
    pub fn adopt(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.nodes[child].parent = Some(parent);
        }
        self.nodes[parent].children.extend(children);
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_empty()
    }

    /// Terminal images under `id`, left to right.
    pub fn yield_of(&self, id: NodeId) -> Vec<&str> {
        let mut images = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.kind == NodeKind::Terminal {
                images.push(node.name.as_str());
            }
            stack.extend(node.children.iter().rev());
        }
        images
    }

    /// `name[child child ...]` rendering, leaves printed bare. Meant for logs and tests.
    pub fn to_bracketed(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        if node.children.is_empty() {
            return if node.kind == NodeKind::NonTerminal {
                format!("{}[]", node.name)
            } else {
                node.name.clone()
            };
        }
        format!(
            "{}[{}]",
            node.name,
            node.children
                .iter()
                .map(|&c| self.to_bracketed(c))
                .collect::<Vec<_>>()
                .join(" ")
        )
    }

    pub fn view(&self, id: NodeId) -> NodeView {
        let node = &self.nodes[id];
        NodeView {
            id,
            name: node.name.clone(),
            kind: node.kind,
            children: node.children.iter().map(|&c| self.view(c)).collect(),
        }
    }
}

/// Owned, nested copy of a subtree for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<NodeView>,
}

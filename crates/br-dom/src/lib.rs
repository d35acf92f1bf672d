//! DOM arena: nodes addressed by id, queried and mutated through the `Dom` handle.

use br_core::PageError;
use br_core::PageResult;

/// ID used to address nodes in the DOM arena.
pub type NodeId = usize;

/// Payload of a single arena node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Page document model.
///
/// Nodes never move: removal detaches a node from the tree but keeps its
/// arena slot, so held `NodeId`s stay addressable for the page lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            data: NodeData::Element {
                tag: "#document".to_owned(),
                attrs: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };

        Self {
            nodes: vec![root],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeData::Text(text.to_owned()))
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node < self.nodes.len()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(
            self.nodes.get(node).map(|node| &node.data),
            Some(NodeData::Element { .. })
        )
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|node| node.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> PageResult<()> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(PageError::new(
                "dom.node.missing",
                format!("append of {child} under {parent} references an absent node"),
            ));
        }

        if !self.is_element(parent) {
            return Err(PageError::new(
                "dom.append.text_parent",
                format!("node {parent} is a text node and cannot take children"),
            ));
        }

        if self.is_ancestor(child, parent) || child == parent {
            return Err(PageError::new(
                "dom.append.cycle",
                format!("appending {child} under {parent} would create a cycle"),
            ));
        }

        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    fn is_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(current) = cursor {
            if current == candidate {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Detaches a node from its parent. The node and its subtree stay in the
    /// arena and can be re-appended elsewhere.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };

        self.nodes[parent].children.retain(|child| *child != node);
        self.nodes[node].parent = None;
    }

    pub fn clear_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(node)
            .map(|node| node.children.clone())
            .unwrap_or_default();

        for child in children {
            self.detach(child);
        }
    }

    /// Replaces the node's children with a single text child.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> PageResult<()> {
        if !self.is_element(node) {
            return Err(PageError::new(
                "dom.node.missing",
                format!("set_text target {node} is not an element"),
            ));
        }

        self.clear_children(node);
        let child = self.create_text(text);
        self.append_child(node, child)
    }

    /// Concatenated text of the node's subtree, document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            let Some(entry) = self.nodes.get(current) else {
                continue;
            };

            if let NodeData::Text(text) = &entry.data {
                out.push_str(text);
            }
            for child in entry.children.iter().rev() {
                stack.push(*child);
            }
        }

        out
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element { attrs, .. }) => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> PageResult<()> {
        let name = name.to_ascii_lowercase();
        match self.nodes.get_mut(node).map(|node| &mut node.data) {
            Some(NodeData::Element { attrs, .. }) => {
                if let Some(slot) = attrs.iter_mut().find(|(key, _)| *key == name) {
                    slot.1 = value.to_owned();
                } else {
                    attrs.push((name, value.to_owned()));
                }
                Ok(())
            }
            _ => Err(PageError::new(
                "dom.node.missing",
                format!("set_attr target {node} is not an element"),
            )),
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(NodeData::Element { attrs, .. }) =
            self.nodes.get_mut(node).map(|node| &mut node.data)
        {
            attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .map(|list| list.split_ascii_whitespace().any(|entry| entry == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }

        let mut list = self.attr(node, "class").unwrap_or("").to_owned();
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(class);
        let _ = self.set_attr(node, "class", &list);
    }

    /// Returns whether the class is present after the toggle.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            true
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(current) = self.attr(node, "class") else {
            return;
        };

        let next = current
            .split_ascii_whitespace()
            .filter(|entry| *entry != class)
            .collect::<Vec<_>>()
            .join(" ");
        let _ = self.set_attr(node, "class", &next);
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.elements_by_class_in(self.root, class)
    }

    pub fn elements_by_class_in(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.elements_by_class(class).into_iter().next()
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements_by_tag_in(self.root, tag)
    }

    pub fn elements_by_tag_in(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        let tag = tag.to_ascii_lowercase();
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.tag(*node) == Some(tag.as_str()))
            .collect()
    }

    /// Element descendants of `scope` in document order, excluding `scope` itself.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            if self.is_element(current) {
                out.push(current);
            }
            for child in self.children(current).iter().rev() {
                stack.push(*child);
            }
        }

        out
    }

    /// Whether `node` sits inside the subtree rooted at `scope` (inclusive).
    pub fn is_within(&self, node: NodeId, scope: NodeId) -> bool {
        node == scope || self.is_ancestor(scope, node)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Dom;

    fn small_tree() -> (Dom, super::NodeId, super::NodeId) {
        let mut dom = Dom::new();
        let header = dom.create_element("header");
        let nav = dom.create_element("nav");
        assert!(dom.append_child(dom.root(), header).is_ok());
        assert!(dom.append_child(header, nav).is_ok());
        (dom, header, nav)
    }

    #[test]
    fn finds_elements_by_id_and_class() {
        let (mut dom, header, nav) = small_tree();
        assert!(dom.set_attr(nav, "id", "main-nav").is_ok());
        dom.add_class(header, "navbar");

        assert_eq!(dom.element_by_id("main-nav"), Some(nav));
        assert_eq!(dom.first_by_class("navbar"), Some(header));
        assert_eq!(dom.element_by_id("absent"), None);
    }

    #[test]
    fn class_list_adds_once_and_removes_cleanly() {
        let (mut dom, header, _) = small_tree();
        dom.add_class(header, "navbar-visible");
        dom.add_class(header, "navbar-visible");
        dom.add_class(header, "navbar-scrolled");

        assert_eq!(dom.attr(header, "class"), Some("navbar-visible navbar-scrolled"));

        dom.remove_class(header, "navbar-visible");
        assert!(!dom.has_class(header, "navbar-visible"));
        assert!(dom.has_class(header, "navbar-scrolled"));

        assert!(dom.toggle_class(header, "navbar-visible"));
        assert!(!dom.toggle_class(header, "navbar-visible"));
        assert!(!dom.has_class(header, "navbar-visible"));
    }

    #[test]
    fn set_text_replaces_children() {
        let (mut dom, _, nav) = small_tree();
        assert!(dom.set_text(nav, "Home").is_ok());
        assert!(dom.set_text(nav, "About").is_ok());
        assert_eq!(dom.text_content(nav), "About");
    }

    #[test]
    fn text_content_walks_subtree_in_order() {
        let mut dom = Dom::new();
        let para = dom.create_element("p");
        let strong = dom.create_element("strong");
        let lead = dom.create_text("fresh ");
        let word = dom.create_text("bread");
        assert!(dom.append_child(dom.root(), para).is_ok());
        assert!(dom.append_child(para, lead).is_ok());
        assert!(dom.append_child(para, strong).is_ok());
        assert!(dom.append_child(strong, word).is_ok());

        assert_eq!(dom.text_content(para), "fresh bread");
    }

    #[test]
    fn append_rejects_cycles_and_text_parents() {
        let (mut dom, header, nav) = small_tree();
        let text = dom.create_text("hello");
        assert!(dom.append_child(nav, text).is_ok());

        let cycle = dom.append_child(nav, header);
        assert_eq!(cycle.map_err(|error| error.code), Err("dom.append.cycle"));

        let bad_parent = dom.append_child(text, header);
        assert_eq!(
            bad_parent.map_err(|error| error.code),
            Err("dom.append.text_parent")
        );
    }

    #[test]
    fn detach_keeps_node_addressable() {
        let (mut dom, header, nav) = small_tree();
        dom.detach(nav);
        assert!(dom.children(header).is_empty());
        assert_eq!(dom.tag(nav), Some("nav"));

        // Re-append somewhere else.
        assert!(dom.append_child(dom.root(), nav).is_ok());
        assert_eq!(dom.parent(nav), Some(dom.root()));
    }

    #[test]
    fn scoped_queries_exclude_other_subtrees() {
        let (mut dom, header, nav) = small_tree();
        let footer = dom.create_element("footer");
        let link = dom.create_element("a");
        assert!(dom.append_child(dom.root(), footer).is_ok());
        assert!(dom.append_child(footer, link).is_ok());
        let nav_link = dom.create_element("a");
        assert!(dom.append_child(nav, nav_link).is_ok());

        assert_eq!(dom.elements_by_tag_in(header, "a"), vec![nav_link]);
        assert_eq!(dom.elements_by_tag("a").len(), 2);
        assert!(dom.is_within(nav_link, header));
        assert!(!dom.is_within(link, header));
    }
}

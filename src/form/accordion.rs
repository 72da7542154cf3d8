//! Exclusive-open accordion tree.
//!
//! Panels either sit at the top level or are nested under a parent.
//! Nested panels share a single open slot across the whole tree, opening a
//! nested panel opens its ancestors, and closing a panel closes everything
//! beneath it. Top-level panels open and close independently.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct Accordion<P> {
    /// Registration order
    panels: Vec<P>,
    /// Nested panel -> parent
    parents: HashMap<P, P>,
    open: HashSet<P>,
}

impl<P: Copy + Eq + Hash> Default for Accordion<P> {
    fn default() -> Self {
        Self {
            panels: Vec::new(),
            parents: HashMap::new(),
            open: HashSet::new(),
        }
    }
}

impl<P: Copy + Eq + Hash> Accordion<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level panel.
    pub fn with_panel(mut self, panel: P) -> Self {
        self.register(panel);
        self
    }

    /// Register `child` nested under `parent`, registering `parent` if needed.
    /// A link that would make a panel its own ancestor is ignored.
    pub fn with_child(mut self, parent: P, child: P) -> Self {
        if parent == child || self.is_ancestor(child, parent) {
            return self;
        }
        self.register(parent);
        self.register(child);
        self.parents.insert(child, parent);
        self
    }

    fn register(&mut self, panel: P) {
        if !self.panels.contains(&panel) {
            self.panels.push(panel);
        }
    }

    pub fn contains(&self, panel: P) -> bool {
        self.panels.contains(&panel)
    }

    pub fn parent(&self, panel: P) -> Option<P> {
        self.parents.get(&panel).copied()
    }

    pub fn children(&self, parent: P) -> Vec<P> {
        self.panels
            .iter()
            .copied()
            .filter(|p| self.parent(*p) == Some(parent))
            .collect()
    }

    pub fn is_open(&self, panel: P) -> bool {
        self.open.contains(&panel)
    }

    /// The nested panel that is currently open, if any.
    pub fn open_child(&self) -> Option<P> {
        self.panels
            .iter()
            .copied()
            .find(|p| self.parents.contains_key(p) && self.open.contains(p))
    }

    /// Open panels in registration order.
    pub fn open_panels(&self) -> Vec<P> {
        self.panels
            .iter()
            .copied()
            .filter(|p| self.open.contains(p))
            .collect()
    }

    /// Open a panel. Unknown panels are ignored.
    pub fn open(&mut self, panel: P) {
        if !self.contains(panel) {
            return;
        }

        if self.parents.contains_key(&panel) {
            if let Some(current) = self.open_child() {
                if current != panel && !self.is_ancestor(current, panel) {
                    self.close_nested_except_ancestors(panel);
                }
            }
            let mut ancestor = self.parent(panel);
            while let Some(p) = ancestor {
                self.open.insert(p);
                ancestor = self.parent(p);
            }
        }

        self.open.insert(panel);
    }

    /// Close a panel and everything nested beneath it.
    pub fn close(&mut self, panel: P) {
        self.open.remove(&panel);
        for child in self.children(panel) {
            self.close(child);
        }
    }

    pub fn toggle(&mut self, panel: P) {
        if self.is_open(panel) {
            self.close(panel);
        } else {
            self.open(panel);
        }
    }

    fn is_ancestor(&self, candidate: P, panel: P) -> bool {
        let mut current = self.parent(panel);
        while let Some(p) = current {
            if p == candidate {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Close every open nested panel that is not an ancestor of `panel`.
    fn close_nested_except_ancestors(&mut self, panel: P) {
        let to_close: Vec<P> = self
            .panels
            .iter()
            .copied()
            .filter(|p| {
                self.parents.contains_key(p)
                    && self.open.contains(p)
                    && *p != panel
                    && !self.is_ancestor(*p, panel)
            })
            .collect();
        for p in to_close {
            self.close(p);
        }
    }
}

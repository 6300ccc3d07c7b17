//! Tag paths and tag trees: navigation descriptors for elements in
//! nested data sets.
//!
//! A [`TagPath`] names one location: a plain element, a sequence, or an
//! item of a sequence (with a 1-based index), each relative to the path
//! of its enclosing structure. A [`TagTree`] describes a set of such
//! locations, where item steps may be left open to match any index; it
//! is the selection mechanism of the collect flow.

use std::fmt;

use crate::header::Tag;

/// A navigation path from the root of a data set to a single location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagPath {
    /// The empty path, pointing at the root data set itself.
    Empty,
    /// A path ending at a plain element.
    Tag {
        /// the path of the enclosing structure
        previous: Box<TagPath>,
        /// the element tag
        tag: Tag,
    },
    /// A path ending at a sequence element as a whole.
    Sequence {
        /// the path of the enclosing structure
        previous: Box<TagPath>,
        /// the sequence tag
        tag: Tag,
    },
    /// A path ending at one item of a sequence.
    Item {
        /// the path of the enclosing structure
        previous: Box<TagPath>,
        /// the sequence tag
        tag: Tag,
        /// the 1-based item index
        item: u32,
    },
}

impl TagPath {
    /// The empty path.
    pub fn empty() -> TagPath {
        TagPath::Empty
    }

    /// A root-level path to a plain element.
    pub fn from_tag(tag: Tag) -> TagPath {
        TagPath::Empty.then_tag(tag)
    }

    /// A root-level path to a sequence.
    pub fn from_sequence(tag: Tag) -> TagPath {
        TagPath::Empty.then_sequence(tag)
    }

    /// A root-level path to an item of a sequence.
    pub fn from_item(tag: Tag, item: u32) -> TagPath {
        TagPath::Empty.then_item(tag, item)
    }

    /// Extend this path with a plain element step.
    pub fn then_tag(self, tag: Tag) -> TagPath {
        TagPath::Tag {
            previous: Box::new(self),
            tag,
        }
    }

    /// Extend this path with a sequence step.
    pub fn then_sequence(self, tag: Tag) -> TagPath {
        TagPath::Sequence {
            previous: Box::new(self),
            tag,
        }
    }

    /// Extend this path with an item step.
    pub fn then_item(self, tag: Tag, item: u32) -> TagPath {
        TagPath::Item {
            previous: Box::new(self),
            tag,
            item,
        }
    }

    /// The path of the enclosing structure. The empty path is its own
    /// previous.
    pub fn previous(&self) -> &TagPath {
        match self {
            TagPath::Empty => self,
            TagPath::Tag { previous, .. }
            | TagPath::Sequence { previous, .. }
            | TagPath::Item { previous, .. } => previous,
        }
    }

    /// The tag of the final step, if any.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            TagPath::Empty => None,
            TagPath::Tag { tag, .. }
            | TagPath::Sequence { tag, .. }
            | TagPath::Item { tag, .. } => Some(*tag),
        }
    }

    /// The item index of the final step, if it is an item step.
    pub fn item(&self) -> Option<u32> {
        match self {
            TagPath::Item { item, .. } => Some(*item),
            _ => None,
        }
    }

    /// Whether this is the empty path.
    pub fn is_empty(&self) -> bool {
        matches!(self, TagPath::Empty)
    }

    /// Whether this path has exactly one step.
    pub fn is_root(&self) -> bool {
        !self.is_empty() && self.previous().is_empty()
    }

    /// The number of steps in the path.
    pub fn depth(&self) -> usize {
        self.nodes().len()
    }

    /// The steps of this path, from the root-most to the final one.
    pub fn nodes(&self) -> Vec<&TagPath> {
        let mut out = Vec::new();
        let mut cur = self;
        while !cur.is_empty() {
            out.push(cur);
            cur = cur.previous();
        }
        out.reverse();
        out
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for node in self.nodes() {
            if !first {
                write!(f, ".")?;
            }
            first = false;
            match node {
                TagPath::Empty => {}
                TagPath::Tag { tag, .. } | TagPath::Sequence { tag, .. } => write!(f, "{}", tag)?,
                TagPath::Item { tag, item, .. } => write!(f, "{}[{}]", tag, item)?,
            }
        }
        Ok(())
    }
}

/// A tree of tag paths, where item steps may match one index or all of
/// them. Used to express selection whitelists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagTree {
    /// The empty tree.
    Empty,
    /// A tree ending at a plain element.
    Tag {
        /// the enclosing tree
        previous: Box<TagTree>,
        /// the element tag
        tag: Tag,
    },
    /// A tree step matching every item of a sequence.
    AnyItem {
        /// the enclosing tree
        previous: Box<TagTree>,
        /// the sequence tag
        tag: Tag,
    },
    /// A tree step matching one item of a sequence.
    Item {
        /// the enclosing tree
        previous: Box<TagTree>,
        /// the sequence tag
        tag: Tag,
        /// the 1-based item index
        item: u32,
    },
}

impl TagTree {
    /// A root-level tree of a plain element.
    pub fn from_tag(tag: Tag) -> TagTree {
        TagTree::Empty.then_tag(tag)
    }

    /// A root-level tree matching every item of a sequence.
    pub fn from_any_item(tag: Tag) -> TagTree {
        TagTree::Empty.then_any_item(tag)
    }

    /// A root-level tree matching one item of a sequence.
    pub fn from_item(tag: Tag, item: u32) -> TagTree {
        TagTree::Empty.then_item(tag, item)
    }

    /// Extend this tree with a plain element step.
    pub fn then_tag(self, tag: Tag) -> TagTree {
        TagTree::Tag {
            previous: Box::new(self),
            tag,
        }
    }

    /// Extend this tree with a step matching every item of a sequence.
    pub fn then_any_item(self, tag: Tag) -> TagTree {
        TagTree::AnyItem {
            previous: Box::new(self),
            tag,
        }
    }

    /// Extend this tree with a step matching one item of a sequence.
    pub fn then_item(self, tag: Tag, item: u32) -> TagTree {
        TagTree::Item {
            previous: Box::new(self),
            tag,
            item,
        }
    }

    /// The tag of the root-most step, if any.
    pub fn head_tag(&self) -> Option<Tag> {
        self.nodes().first().and_then(|n| n.tag())
    }

    fn tag(&self) -> Option<Tag> {
        match self {
            TagTree::Empty => None,
            TagTree::Tag { tag, .. }
            | TagTree::AnyItem { tag, .. }
            | TagTree::Item { tag, .. } => Some(*tag),
        }
    }

    fn previous(&self) -> &TagTree {
        match self {
            TagTree::Empty => self,
            TagTree::Tag { previous, .. }
            | TagTree::AnyItem { previous, .. }
            | TagTree::Item { previous, .. } => previous,
        }
    }

    fn nodes(&self) -> Vec<&TagTree> {
        let mut out = Vec::new();
        let mut cur = self;
        while !matches!(cur, TagTree::Empty) {
            out.push(cur);
            cur = cur.previous();
        }
        out.reverse();
        out
    }

    /// Whether the given path is a trunk of this tree: every step of the
    /// path matches the corresponding step of the tree.
    pub fn has_trunk(&self, path: &TagPath) -> bool {
        let tree_nodes = self.nodes();
        let path_nodes = path.nodes();
        path_nodes.len() <= tree_nodes.len()
            && path_nodes
                .iter()
                .zip(&tree_nodes)
                .all(|(&p, &t)| node_matches(t, p))
    }

    /// Whether this tree is a trunk of the given path: every step of the
    /// tree matches the corresponding step of the path.
    pub fn is_trunk_of(&self, path: &TagPath) -> bool {
        let tree_nodes = self.nodes();
        let path_nodes = path.nodes();
        tree_nodes.len() <= path_nodes.len()
            && tree_nodes
                .iter()
                .zip(&path_nodes)
                .all(|(&t, &p)| node_matches(t, p))
    }
}

impl fmt::Display for TagTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for node in self.nodes() {
            if !first {
                write!(f, ".")?;
            }
            first = false;
            match node {
                TagTree::Empty => {}
                TagTree::Tag { tag, .. } => write!(f, "{}", tag)?,
                TagTree::AnyItem { tag, .. } => write!(f, "{}[*]", tag)?,
                TagTree::Item { tag, item, .. } => write!(f, "{}[{}]", tag, item)?,
            }
        }
        Ok(())
    }
}

fn node_matches(tree: &TagTree, path: &TagPath) -> bool {
    match (tree, path) {
        (TagTree::Tag { tag: t, .. }, TagPath::Tag { tag: p, .. })
        | (TagTree::Tag { tag: t, .. }, TagPath::Sequence { tag: p, .. })
        | (TagTree::Tag { tag: t, .. }, TagPath::Item { tag: p, .. })
        | (TagTree::AnyItem { tag: t, .. }, TagPath::Sequence { tag: p, .. })
        | (TagTree::AnyItem { tag: t, .. }, TagPath::Item { tag: p, .. })
        | (TagTree::Item { tag: t, .. }, TagPath::Sequence { tag: p, .. }) => t == p,
        (
            TagTree::Item {
                tag: t, item: i, ..
            },
            TagPath::Item {
                tag: p, item: j, ..
            },
        ) => t == p && i == j,
        _ => false,
    }
}

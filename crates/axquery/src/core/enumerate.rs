/*!
Descendant cursors.

All cursors are lazy: a node's children are only read when the cursor moves
past it, so a search that stops early never expands the rest of the tree. A
node whose children cannot be read is treated as a leaf.

Each cursor yields a node at most once. Children already reached through
another parent are skipped, so trees that report cycles still terminate.
*/

use std::collections::{HashSet, VecDeque};

use super::{Element, Traversal};
use crate::platform::NodeService;

/// Children of `node` not yet in `seen`, marking them as seen.
fn expand<S: NodeService>(node: &Element<S>, seen: &mut HashSet<S::Handle>) -> Vec<Element<S>> {
  let children = node.children().unwrap_or_else(|err| {
    log::debug!("Treating {} as a leaf: {err}", node.class());
    Vec::new()
  });
  children
    .into_iter()
    .filter(|child| {
      let fresh = seen.insert(child.handle().clone());
      if !fresh {
        log::debug!("Skipping {} reached again from {}", child.class(), node.class());
      }
      fresh
    })
    .collect()
}

fn seen_from<S: NodeService>(root: &Element<S>) -> HashSet<S::Handle> {
  HashSet::from([root.handle().clone()])
}

/// Breadth-first descendants: all children of a node before any grandchildren.
pub struct BreadthFirst<S: NodeService> {
  frontier: VecDeque<Element<S>>,
  current: std::vec::IntoIter<Element<S>>,
  seen: HashSet<S::Handle>,
}

impl<S: NodeService> BreadthFirst<S> {
  pub fn new(root: Element<S>) -> Self {
    Self {
      seen: seen_from(&root),
      frontier: VecDeque::from([root]),
      current: Vec::new().into_iter(),
    }
  }
}

impl<S: NodeService> Iterator for BreadthFirst<S> {
  type Item = Element<S>;

  fn next(&mut self) -> Option<Element<S>> {
    loop {
      if let Some(next) = self.current.next() {
        self.frontier.push_back(next.clone());
        return Some(next);
      }
      let node = self.frontier.pop_front()?;
      self.current = expand(&node, &mut self.seen).into_iter();
    }
  }
}

/// Pre-order depth-first descendants.
pub struct DepthFirst<S: NodeService> {
  stack: Vec<Element<S>>,
  pending: Option<Element<S>>,
  seen: HashSet<S::Handle>,
}

impl<S: NodeService> DepthFirst<S> {
  pub fn new(root: Element<S>) -> Self {
    Self {
      stack: Vec::new(),
      seen: seen_from(&root),
      pending: Some(root),
    }
  }
}

impl<S: NodeService> Iterator for DepthFirst<S> {
  type Item = Element<S>;

  fn next(&mut self) -> Option<Element<S>> {
    if let Some(node) = self.pending.take() {
      self.stack.extend(expand(&node, &mut self.seen).into_iter().rev());
    }
    let next = self.stack.pop()?;
    self.pending = Some(next.clone());
    Some(next)
  }
}

/// Pre-order depth-first descendants with their depth (the root's children are at 1).
pub struct DepthFirstWithLevel<S: NodeService> {
  stack: Vec<(Element<S>, usize)>,
  pending: Option<(Element<S>, usize)>,
  seen: HashSet<S::Handle>,
}

impl<S: NodeService> DepthFirstWithLevel<S> {
  pub fn new(root: Element<S>) -> Self {
    Self {
      stack: Vec::new(),
      seen: seen_from(&root),
      pending: Some((root, 0)),
    }
  }
}

impl<S: NodeService> Iterator for DepthFirstWithLevel<S> {
  type Item = (Element<S>, usize);

  fn next(&mut self) -> Option<(Element<S>, usize)> {
    if let Some((node, level)) = self.pending.take() {
      let children = expand(&node, &mut self.seen);
      self
        .stack
        .extend(children.into_iter().rev().map(|child| (child, level + 1)));
    }
    let next = self.stack.pop()?;
    self.pending = Some(next.clone());
    Some(next)
  }
}

/// Descendants in a configurable order.
pub enum Descendants<S: NodeService> {
  BreadthFirst(BreadthFirst<S>),
  DepthFirst(DepthFirst<S>),
}

impl<S: NodeService> Iterator for Descendants<S> {
  type Item = Element<S>;

  fn next(&mut self) -> Option<Element<S>> {
    match self {
      Self::BreadthFirst(cursor) => cursor.next(),
      Self::DepthFirst(cursor) => cursor.next(),
    }
  }
}

impl<S: NodeService> Element<S> {
  pub fn breadth_first(&self) -> BreadthFirst<S> {
    BreadthFirst::new(self.clone())
  }

  pub fn depth_first(&self) -> DepthFirst<S> {
    DepthFirst::new(self.clone())
  }

  pub fn depth_first_with_level(&self) -> DepthFirstWithLevel<S> {
    DepthFirstWithLevel::new(self.clone())
  }

  /// A fresh cursor over this element's descendants.
  pub fn descendants(&self, order: Traversal) -> Descendants<S> {
    match order {
      Traversal::BreadthFirst => Descendants::BreadthFirst(self.breadth_first()),
      Traversal::DepthFirst => Descendants::DepthFirst(self.depth_first()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::fixtures::{self, titles};
  use crate::platform::memory::MemoryTree;

  fn names(elements: impl Iterator<Item = Element<MemoryTree>>) -> Vec<String> {
    titles(&elements.collect::<Vec<_>>())
  }

  #[test]
  fn breadth_first_order() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    assert_eq!(
      names(window.breadth_first()),
      vec!["Group", "Group", "OK", "Remember", "Cancel"]
    );
  }

  #[test]
  fn depth_first_order() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    assert_eq!(
      names(window.depth_first()),
      vec!["Group", "OK", "Remember", "Group", "Cancel"]
    );
  }

  #[test]
  fn depth_first_with_level() {
    let (ax, nodes) = fixtures::tree();
    let app = ax.element(nodes.app).expect("app");
    let levels: Vec<usize> = app.depth_first_with_level().map(|(_, level)| level).collect();
    assert_eq!(levels, vec![1, 2, 3, 3, 2, 3]);
  }

  #[test]
  fn handles_follow_sibling_order() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let bfs: Vec<_> = window.breadth_first().map(|e| *e.handle()).collect();
    assert_eq!(bfs, vec![nodes.c1, nodes.c2, nodes.c1a, nodes.c1b, nodes.c2a]);
    let dfs: Vec<_> = window.depth_first().map(|e| *e.handle()).collect();
    assert_eq!(dfs, vec![nodes.c1, nodes.c1a, nodes.c1b, nodes.c2, nodes.c2a]);
  }

  #[test]
  fn broken_children_do_not_abort_traversal() {
    let (ax, nodes) = fixtures::tree();
    ax.service().break_children(nodes.c1);
    let window = ax.element(nodes.window).expect("window");
    let bfs: Vec<_> = window.breadth_first().map(|e| *e.handle()).collect();
    assert_eq!(bfs, vec![nodes.c1, nodes.c2, nodes.c2a]);
    let dfs: Vec<_> = window.depth_first().map(|e| *e.handle()).collect();
    assert_eq!(dfs, vec![nodes.c1, nodes.c2, nodes.c2a]);
  }

  #[test]
  fn cycles_and_shared_children_are_visited_once() {
    let (ax, nodes) = fixtures::tree();
    ax.service().link_child(nodes.c1a, nodes.window);
    ax.service().link_child(nodes.c1, nodes.c2);
    let window = ax.element(nodes.window).expect("window");
    let bfs: Vec<_> = window.breadth_first().map(|e| *e.handle()).collect();
    assert_eq!(bfs, vec![nodes.c1, nodes.c2, nodes.c1a, nodes.c1b, nodes.c2a]);
    let dfs: Vec<_> = window.depth_first().map(|e| *e.handle()).collect();
    assert_eq!(dfs, vec![nodes.c1, nodes.c1a, nodes.c1b, nodes.c2, nodes.c2a]);
    let levels: Vec<_> = window.depth_first_with_level().map(|(_, level)| level).collect();
    assert_eq!(levels, vec![1, 2, 2, 1, 2]);
  }

  #[test]
  fn breadth_first_is_lazy() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    let mut cursor = window.breadth_first();
    assert_eq!(cursor.next().map(|e| *e.handle()), Some(nodes.c1));
    let reads = ax.service().read_count();
    assert_eq!(cursor.next().map(|e| *e.handle()), Some(nodes.c2));
    assert_eq!(ax.service().read_count(), reads);
  }

  #[test]
  fn cursors_restart() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    assert_eq!(window.breadth_first().count(), 5);
    assert_eq!(window.descendants(Traversal::DepthFirst).count(), 5);
    assert_eq!(window.descendants(Traversal::BreadthFirst).count(), 5);
  }

  #[test]
  fn leaf_has_no_descendants() {
    let (ax, nodes) = fixtures::tree();
    let button = ax.element(nodes.c2a).expect("button");
    assert_eq!(button.breadth_first().count(), 0);
    assert_eq!(button.depth_first().count(), 0);
  }
}

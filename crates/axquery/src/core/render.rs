/*!
Human-readable renderings of elements: one-line descriptions, root-to-node
paths (used by search failures) and indented subtree dumps.
*/

use std::fmt;
use std::fmt::Write as _;

use super::Element;
use crate::platform::NodeService;

/// Attributes tried, in order, for the label shown next to the class name.
const LABELS: &[&str] = &["title", "value", "identifier"];

impl<S: NodeService> Element<S> {
  fn label(&self) -> Option<String> {
    LABELS.iter().find_map(|name| match self.try_attribute(name) {
      Ok(Some(value)) => value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_owned),
      Ok(None) => None,
      Err(err) => {
        log::trace!("No {name} label for {}: {err}", self.class());
        None
      }
    })
  }

  /// One-line description: class name and, when available, a label,
  /// e.g. `Button("OK")`.
  pub fn describe(&self) -> String {
    let class = self.class().name();
    match self.label() {
      Some(label) => format!("{class}({label:?})"),
      None => class.to_owned(),
    }
  }

  /// Descriptions from the root down to this element.
  pub fn path(&self) -> Vec<String> {
    match self.ancestry() {
      Ok(chain) => chain.iter().rev().map(Self::describe).collect(),
      Err(err) => {
        log::debug!("Incomplete path for {}: {err}", self.class());
        vec![self.describe()]
      }
    }
  }

  /// Indented dump of this element and its descendants, depth-first.
  pub fn text_tree(&self) -> String {
    let mut out = self.describe();
    for (node, level) in self.depth_first_with_level() {
      // Writing to a String cannot fail
      let _ = write!(out, "\n{:indent$}{}", "", node.describe(), indent = level * 2);
    }
    out
  }
}

impl<S: NodeService> fmt::Display for Element<S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.describe())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::fixtures;

  #[test]
  fn descriptions_prefer_title() {
    let (ax, nodes) = fixtures::tree();
    assert_eq!(ax.element(nodes.c1a).expect("button").describe(), r#"Button("OK")"#);
    assert_eq!(ax.element(nodes.c1).expect("group").to_string(), "Group");
  }

  #[test]
  fn descriptions_fall_back_to_string_values() {
    let (ax, nodes) = fixtures::tree();
    let field = ax.service().add_child(nodes.c2, &["AXTextField"]);
    ax.service().set_attribute(field, "AXValue", "hello".into());
    assert_eq!(ax.element(field).expect("field").describe(), r#"TextField("hello")"#);
  }

  #[test]
  fn path_runs_root_first() {
    let (ax, nodes) = fixtures::tree();
    let cancel = ax.element(nodes.c2a).expect("cancel");
    assert_eq!(
      cancel.path(),
      vec![
        r#"Application("Finder")"#,
        r#"Window("Docs")"#,
        "Group",
        r#"CloseButton("Cancel")"#,
      ]
    );
  }

  #[test]
  fn text_tree_indents_by_depth() {
    let (ax, nodes) = fixtures::tree();
    let window = ax.element(nodes.window).expect("window");
    assert_eq!(
      window.text_tree(),
      [
        r#"Window("Docs")"#,
        "  Group",
        r#"    Button("OK")"#,
        r#"    CheckBox("Remember")"#,
        "  Group",
        r#"    CloseButton("Cancel")"#,
      ]
      .join("\n")
    );
  }
}

/*!
axquery - attribute resolution and search over live accessibility trees

```
use axquery::platform::memory::MemoryTree;
use axquery::{AxQuery, Filters};

let tree = MemoryTree::new();
let app = tree.add_root(&["AXApplication"]);
let window = tree.add_child(app, &["AXWindow"]);
let close = tree.add_child(window, &["AXCloseButton", "AXButton"]);
tree.add_action(close, "AXPress");

let ax = AxQuery::new(tree)?;
let app = ax.element(app)?;

// Attributes by symbolic name
let window = app.find("window", &Filters::new())?;
assert_eq!(window.class().name(), "Window");

// "button" finds one (subclasses included), "buttons" finds all
let close = window.find("button", &Filters::new())?;
assert_eq!(close.class().name(), "CloseButton");
assert_eq!(window.find_all("buttons", &Filters::new())?.len(), 1);

close.perform_action("press")?;
# Ok::<(), axquery::AxError>(())
```
*/

mod core;

pub mod a11y;
pub mod platform;

mod types;
pub use types::*;

pub use crate::core::{
  Arg, AxQuery, AxQueryBuilder, BreadthFirst, Config, DepthFirst, DepthFirstWithLevel,
  Descendants, Dispatch, Element, FilterValue, Filters, Notified, Outcome, Predicate, SearchResult,
  Traversal, TypeMatch,
};
pub use crate::platform::{NodeService, NotificationCallback};

#[cfg(target_os = "macos")]
pub use crate::platform::macos::MacOs;

/*!
Canonical notification identifiers.

Notifications are resolved the same way attributes are: `value_changed`
resolves to `AXValueChanged`. Names without a canonical form are passed to
the service literally, so custom application notifications still work.
*/

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use super::naming::{intern, normalize, NameShape};

/// Notification identifiers known to the platform.
pub const NOTIFICATIONS: &[&str] = &[
  "AXAnnouncementRequested",
  "AXApplicationActivated",
  "AXApplicationDeactivated",
  "AXApplicationHidden",
  "AXApplicationShown",
  "AXCreated",
  "AXDrawerCreated",
  "AXElementBusyChanged",
  "AXFocusedUIElementChanged",
  "AXFocusedWindowChanged",
  "AXHelpTagCreated",
  "AXLayoutChanged",
  "AXMainWindowChanged",
  "AXMenuClosed",
  "AXMenuItemSelected",
  "AXMenuOpened",
  "AXMoved",
  "AXResized",
  "AXRowCollapsed",
  "AXRowCountChanged",
  "AXRowExpanded",
  "AXSelectedCellsChanged",
  "AXSelectedChildrenChanged",
  "AXSelectedChildrenMoved",
  "AXSelectedColumnsChanged",
  "AXSelectedRowsChanged",
  "AXSelectedTextChanged",
  "AXSheetCreated",
  "AXTitleChanged",
  "AXUIElementDestroyed",
  "AXUnitsChanged",
  "AXValueChanged",
  "AXWindowCreated",
  "AXWindowDeminiaturized",
  "AXWindowMiniaturized",
  "AXWindowMoved",
  "AXWindowResized",
];

/// Short names for notifications whose identifiers read awkwardly.
const ALIASES: &[(&str, &str)] = &[
  ("destroyed", "AXUIElementDestroyed"),
  ("focus_changed", "AXFocusedUIElementChanged"),
  ("selection_changed", "AXSelectedTextChanged"),
  ("children_changed", "AXLayoutChanged"),
];

fn shape() -> &'static Arc<NameShape> {
  static SHAPE: OnceLock<Arc<NameShape>> = OnceLock::new();
  SHAPE.get_or_init(|| intern(NOTIFICATIONS.iter().map(|n| (*n).to_owned()).collect()))
}

/// Resolve a symbolic notification name to its canonical identifier,
/// falling back to the literal name.
///
/// ```
/// use axquery::a11y::canonical_notification;
///
/// assert_eq!(canonical_notification("value_changed"), "AXValueChanged");
/// assert_eq!(canonical_notification("destroyed"), "AXUIElementDestroyed");
/// assert_eq!(canonical_notification("MyAppDidSync"), "MyAppDidSync");
/// ```
pub fn canonical_notification(name: &str) -> Cow<'_, str> {
  if let Some(id) = shape().resolve(name) {
    return Cow::Owned(id.to_owned());
  }
  let key = normalize(name);
  ALIASES
    .iter()
    .find(|(alias, _)| *alias == key)
    .map_or(Cow::Borrowed(name), |(_, id)| Cow::Borrowed(*id))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resolves_symbolic_names() {
    assert_eq!(canonical_notification("window_created"), "AXWindowCreated");
    assert_eq!(
      canonical_notification("focused_ui_element_changed"),
      "AXFocusedUIElementChanged"
    );
    assert_eq!(canonical_notification("moved"), "AXMoved");
  }

  #[test]
  fn canonical_identifiers_pass_through() {
    assert_eq!(canonical_notification("AXMenuOpened"), "AXMenuOpened");
  }

  #[test]
  fn aliases() {
    assert_eq!(canonical_notification("focus_changed"), "AXFocusedUIElementChanged");
    assert_eq!(canonical_notification("children-changed"), "AXLayoutChanged");
  }

  #[test]
  fn unknown_names_are_literal() {
    assert_eq!(canonical_notification("custom_event"), "custom_event");
  }
}

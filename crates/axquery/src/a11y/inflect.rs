/*!
Singularisation of search tokens.

Cardinality is inferred from grammatical number: `buttons` asks for every
button, `button` for one. Only the last word of a snake-case token is
inflected (`radio_buttons` → `radio_button`). Words the suffix rules get
wrong are listed explicitly in [`SINGULAR_WORDS`] and [`IRREGULAR_PLURALS`].
*/

/// Words that end like plurals but are singular (or uncountable).
///
/// Tokens ending in one of these are treated as singular queries.
pub const SINGULAR_WORDS: &[&str] = &[
  "access", "address", "alias", "analysis", "axis", "bus", "canvas", "class", "focus", "glass",
  "lens", "news", "process", "progress", "radius", "series", "species", "status", "success",
];

/// Plurals the suffix rules cannot derive, with their singular.
pub const IRREGULAR_PLURALS: &[(&str, &str)] = &[
  ("aliases", "alias"),
  ("axes", "axis"),
  ("buses", "bus"),
  ("canvases", "canvas"),
  ("children", "child"),
  ("indices", "index"),
  ("matrices", "matrix"),
  ("men", "man"),
  ("people", "person"),
  ("radii", "radius"),
  ("statuses", "status"),
  ("vertices", "vertex"),
  ("women", "woman"),
];

/// Whether the query asks for one element or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
  One,
  All,
}

/// Singularise the last word of a snake-case token.
///
/// ```
/// use axquery::a11y::singularize;
///
/// assert_eq!(singularize("radio_buttons"), "radio_button");
/// assert_eq!(singularize("check_boxes"), "check_box");
/// assert_eq!(singularize("menu_bar_items"), "menu_bar_item");
/// assert_eq!(singularize("status"), "status");
/// ```
pub fn singularize(token: &str) -> String {
  let (head, word) = match token.rfind('_') {
    Some(idx) => token.split_at(idx + 1),
    None => ("", token),
  };
  format!("{head}{}", singularize_word(word))
}

fn singularize_word(word: &str) -> String {
  if word.is_empty() || SINGULAR_WORDS.contains(&word) {
    return word.to_owned();
  }
  if let Some((_, singular)) = IRREGULAR_PLURALS.iter().find(|(plural, _)| *plural == word) {
    return (*singular).to_owned();
  }
  if let Some(stem) = word.strip_suffix("ies") {
    if !stem.is_empty() {
      return format!("{stem}y");
    }
  }
  for suffix in ["sses", "shes", "ches", "xes", "zzes"] {
    if word.ends_with(suffix) {
      return word[..word.len() - 2].to_owned();
    }
  }
  if word.ends_with("ss") {
    return word.to_owned();
  }
  match word.strip_suffix('s') {
    Some(stem) if !stem.is_empty() => stem.to_owned(),
    _ => word.to_owned(),
  }
}

/// Infer cardinality from a normalised token, returning the singular form.
pub fn cardinality(token: &str) -> (Cardinality, String) {
  let singular = singularize(token);
  if singular == token {
    (Cardinality::One, singular)
  } else {
    (Cardinality::All, singular)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn regular_plurals() {
    assert_eq!(singularize("buttons"), "button");
    assert_eq!(singularize("windows"), "window");
    assert_eq!(singularize("text_fields"), "text_field");
    assert_eq!(singularize("menus"), "menu");
  }

  #[test]
  fn sibilant_plurals() {
    assert_eq!(singularize("boxes"), "box");
    assert_eq!(singularize("check_boxes"), "check_box");
    assert_eq!(singularize("switches"), "switch");
    assert_eq!(singularize("processes"), "process");
  }

  #[test]
  fn y_plurals() {
    assert_eq!(singularize("entries"), "entry");
    assert_eq!(singularize("menu_bar_entries"), "menu_bar_entry");
  }

  #[test]
  fn singular_words_are_untouched() {
    for word in ["button", "status", "canvas", "progress", "radio_button", "glass"] {
      assert_eq!(singularize(word), word, "{word} should stay singular");
    }
  }

  #[test]
  fn irregulars() {
    assert_eq!(singularize("children"), "child");
    assert_eq!(singularize("statuses"), "status");
    assert_eq!(singularize("cell_indices"), "cell_index");
  }

  #[test]
  fn cardinality_follows_singularisation() {
    assert_eq!(cardinality("button"), (Cardinality::One, "button".to_owned()));
    assert_eq!(cardinality("buttons"), (Cardinality::All, "button".to_owned()));
    assert_eq!(cardinality("status"), (Cardinality::One, "status".to_owned()));
    assert_eq!(cardinality("series"), (Cardinality::One, "series".to_owned()));
  }

  #[test]
  fn degenerate_tokens() {
    assert_eq!(singularize(""), "");
    assert_eq!(singularize("s"), "s");
    assert_eq!(singularize("ss"), "ss");
  }
}

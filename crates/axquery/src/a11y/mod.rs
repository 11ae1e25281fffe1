/*!
Accessibility vocabulary.

- `naming` - symbolic name normalisation and per-shape resolution tables
- `role` - the lazily grown class taxonomy
- `value` - raw (wire) and massaged attribute values
- `notification` - canonical notification identifiers
- `inflect` - singularisation for cardinality inference
*/

mod inflect;
mod naming;
mod notification;
mod role;
mod value;

pub use inflect::{cardinality, singularize, Cardinality, IRREGULAR_PLURALS, SINGULAR_WORDS};
pub use naming::{intern, normalize, snake_case, unprefix, NameShape, PREDICATE_MARKER};
pub use notification::{canonical_notification, NOTIFICATIONS};
pub use role::{resolve_class, Class, BASE_CLASS};
pub use value::{RawValue, Value};

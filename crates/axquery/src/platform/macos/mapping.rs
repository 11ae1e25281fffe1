/*!
Mapping from macOS `AXError` codes to [`ServiceError`].
*/

use objc2_application_services::AXError;

use crate::types::ServiceError;

/// Map an `AXError` raised while doing `what` (e.g. "read AXTitle").
pub(super) fn service_error(err: AXError, what: &str) -> ServiceError {
  match err {
    AXError::APIDisabled => ServiceError::PermissionDenied,
    AXError::InvalidUIElement | AXError::InvalidUIElementObserver => ServiceError::InvalidHandle,
    AXError::CannotComplete => ServiceError::Timeout,
    AXError::AttributeUnsupported
    | AXError::ActionUnsupported
    | AXError::NotificationUnsupported
    | AXError::ParameterizedAttributeUnsupported
    | AXError::NotImplemented => ServiceError::NotSupported(what.to_owned()),
    other => ServiceError::Failed(format!("{what}: {other:?}")),
  }
}

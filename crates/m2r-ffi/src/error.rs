use std::cell::RefCell;
use std::ffi::CString;

use log::debug;
use m2r_core::MapError;

use crate::types::M2RStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `m2r_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

impl From<&MapError> for M2RStatus {
    fn from(err: &MapError) -> Self {
        match err {
            MapError::TypeMismatch { .. } => M2RStatus::ErrorTypeMismatch,
            MapError::LengthMismatch { .. } => M2RStatus::ErrorLengthMismatch,
            MapError::BroadcastIncompatible { .. } => M2RStatus::ErrorBroadcastIncompatible,
            MapError::InvalidView(_) | MapError::UnknownOrder(_) => {
                M2RStatus::ErrorInvalidArgument
            }
        }
    }
}

/// Record `err` as the last error and return its status code.
pub fn fail(err: MapError) -> M2RStatus {
    debug!("m2r-ffi: {}", err);
    let status = M2RStatus::from(&err);
    set_last_error(err.to_string());
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use m2r_core::{Argument, TypeMismatchKind};

    #[test]
    fn test_last_error_roundtrip() {
        set_last_error("boom".to_string());
        assert_eq!(take_last_error().unwrap().to_str().unwrap(), "boom");
        assert!(take_last_error().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let err = MapError::TypeMismatch {
            argument: Argument::Callback,
            kind: TypeMismatchKind::NotCallable,
        };
        assert_eq!(fail(err), M2RStatus::ErrorTypeMismatch);
        let msg = take_last_error().unwrap();
        assert_eq!(
            msg.to_str().unwrap(),
            "invalid argument `callback`: must be a function"
        );

        let err = MapError::UnknownOrder("7".to_string());
        assert_eq!(M2RStatus::from(&err), M2RStatus::ErrorInvalidArgument);
    }
}

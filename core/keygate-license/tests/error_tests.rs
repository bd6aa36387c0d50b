use keygate_license::{LicenseError, StoreError};

#[test]
fn error_display_invalid_key_format() {
    let err = LicenseError::InvalidKeyFormat("bad format".into());
    assert!(format!("{err}").contains("invalid license key format"));
}

#[test]
fn error_display_invalid_plan() {
    let err = LicenseError::InvalidPlan("7d".into());
    let msg = format!("{err}");
    assert!(msg.contains("invalid plan type"));
    assert!(msg.contains("7d"));
}

#[test]
fn error_display_not_found() {
    let err = LicenseError::NotFound("ABCD-EFGH-JKLM-NPQR".into());
    assert!(format!("{err}").contains("not found"));
}

#[test]
fn error_display_duplicate_key() {
    let err = StoreError::DuplicateKey("ABCD-EFGH-JKLM-NPQR".into());
    assert!(format!("{err}").contains("duplicate license key"));
}

#[test]
fn error_display_collisions_exhausted() {
    let err = StoreError::KeyCollisionsExhausted { attempts: 5 };
    let msg = format!("{err}");
    assert!(msg.contains("unique license key"));
    assert!(msg.contains('5'));
}

#[test]
fn error_from_store_error() {
    let err: LicenseError = StoreError::Backend("disk full".into()).into();
    assert!(err.is_store_error());
    assert!(format!("{err}").contains("storage"));
    assert!(format!("{err}").contains("disk full"));
}

#[test]
fn business_errors_are_not_store_errors() {
    assert!(!LicenseError::NotFound("x".into()).is_store_error());
    assert!(!LicenseError::InvalidPlan("x".into()).is_store_error());
}

#[test]
fn error_is_debug() {
    let err = LicenseError::Store(StoreError::Backend("x".into()));
    let _ = format!("{err:?}");
}

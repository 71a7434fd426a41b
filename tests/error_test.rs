use std::io;

use cfn_forge::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid stack".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid stack.");

    let err = Error::DuplicateName { category: "resource", name: "VPC".to_string() };
    assert_eq!(err.to_string(), "Duplicate name: resource 'VPC' is already defined.");

    let err = Error::UnsupportedValue {
        path: "Resources.Web.Properties.UserData".to_string(),
        reason: "raw bytes must be wrapped in Fn::Base64".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Unsupported value at Resources.Web.Properties.UserData: raw bytes must be wrapped in Fn::Base64."
    );
}

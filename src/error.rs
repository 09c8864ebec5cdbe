use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum VfioError {
    #[error("invalid configuration {path}: {reason}")]
    #[diagnostic(help("expected a YAML file with a top-level `usb-devices` mapping"))]
    InvalidConfig { path: String, reason: String },

    #[error("malformed device entry '{label}': {message}")]
    MalformedEntry { label: String, message: String },

    #[error("invalid USB id '{value}': {message}")]
    InvalidUsbId { value: String, message: String },

    #[error("cannot use path '{path}' in a udev rule: {message}")]
    #[diagnostic(help("move the executable or config file to a path without quotes or backslashes"))]
    UnsupportedRulePath { path: String, message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {message}")]
    ExternalCommand { command: String, message: String },
}

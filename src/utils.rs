//! # Utility Functions Module
//!
//! Small helpers that keep the external tool invocations readable.

/// Builds a `Vec<OsString>` of command line arguments.
///
/// Items may be anything `OsString` converts from (`&str`, `String`, `&Path`,
/// `PathBuf`, ...), so paths reach the tool byte for byte. Numbers go through
/// `to_string()` first.
///
/// # Example
/// ```rust,ignore
/// let args = args!["-q", quality.to_string(), "-mt", input, "-o", output];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        vec![$(::std::ffi::OsString::from($item)),*]
    };
}

//! # Utility Functions Module
//!
//! Small helpers for building engine argument vectors without
//! repeated `.to_string()` / `OsString::from` calls.

use std::ffi::OsString;

/// Converts an iterable of string-like items to `Vec<OsString>`.
///
/// Engine flags are plain strings while paths may not be valid UTF-8,
/// so the argument vector handed to the subprocess is kept as `OsString`.
///
/// # Example
/// ```rust
/// use video_format_converter::utils::to_os_args;
///
/// let args = to_os_args(["-c:v", "libx264"]);
/// assert_eq!(args.len(), 2);
/// ```
pub fn to_os_args<T, I>(items: I) -> Vec<OsString>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .map(|item| OsString::from(item.to_string()))
        .collect()
}

/// Macro for building engine flag lists from mixed types.
///
/// # Example
/// ```rust
/// use video_format_converter::engine_args;
///
/// let encoder = "aac";
/// let args = engine_args!["-c:a", encoder, "-ac", 2];
/// assert_eq!(args[3], "2");
/// ```
#[macro_export]
macro_rules! engine_args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_os_args([$($item.to_string()),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_os_args_literals() {
        let result = to_os_args(["-c", "copy"]);
        assert_eq!(result, vec![OsString::from("-c"), OsString::from("copy")]);
    }

    #[test]
    fn test_to_os_args_empty() {
        let result = to_os_args(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_engine_args_macro_mixed_types() {
        let encoder = String::from("libx264");
        let result = engine_args!["-c:v", encoder, "-threads", 0];
        assert_eq!(
            result,
            vec![
                OsString::from("-c:v"),
                OsString::from("libx264"),
                OsString::from("-threads"),
                OsString::from("0"),
            ]
        );
    }
}

use crate::error::{Error, ErrorKind};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//===========================================================================//

/// The report of a single file conversion, successful or not.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ConversionOutcome {
    /// Whether the icon file was written.
    pub success: bool,
    /// The path of the icon file, once known.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub output_file: Option<PathBuf>,
    /// A `"WxH"` label for each image in the icon, in directory order.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub resolutions: Vec<String>,
    /// Human-readable size of the icon file (e.g. `"12.3 KB"`).
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "String::is_empty")
    )]
    pub file_size: String,
    /// Exact size of the icon file, in bytes.
    #[cfg_attr(feature = "serde", serde(default))]
    pub file_size_bytes: u64,
    /// A short summary for humans.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "String::is_empty")
    )]
    pub message: String,
    /// The error message, on failure.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub error: Option<String>,
    /// The category of failure, on failure.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub error_code: Option<ErrorKind>,
}

impl ConversionOutcome {
    /// Builds the report for an icon file of `len` bytes written to
    /// `output`.
    pub fn success(
        output: &Path,
        resolutions: Vec<String>,
        len: u64,
    ) -> ConversionOutcome {
        ConversionOutcome {
            success: true,
            output_file: Some(output.to_path_buf()),
            resolutions,
            file_size: format_file_size(len),
            file_size_bytes: len,
            message: "ICO file generated successfully".to_string(),
            error: None,
            error_code: None,
        }
    }

    /// Builds the report for a failed conversion.
    pub fn failure(error: &Error) -> ConversionOutcome {
        ConversionOutcome {
            success: false,
            output_file: None,
            resolutions: Vec::new(),
            file_size: String::new(),
            file_size_bytes: 0,
            message: String::new(),
            error: Some(error.to_string()),
            error_code: Some(error.kind()),
        }
    }

    /// Returns the category of failure, or `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_code
    }
}

//===========================================================================//

/// Formats a byte count with 1024-based units and one decimal place, e.g.
/// `"500 B"`, `"1.5 KB"`, `"1.0 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: &[u8] = b"KMGTPE";
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut divisor = UNIT;
    let mut exponent = 0;
    let mut remaining = bytes / UNIT;
    while remaining >= UNIT {
        divisor *= UNIT;
        exponent += 1;
        remaining /= UNIT;
    }
    format!(
        "{:.1} {}B",
        bytes as f64 / divisor as f64,
        PREFIXES[exponent] as char
    )
}

//===========================================================================//


//===========================================================================//

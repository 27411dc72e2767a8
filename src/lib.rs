//! Converts a PNG image into a multi-resolution ICO file.
//!
//! The work happens in small, independently usable stages:
//!
//! 1. [`PixelBuffer::read_png`] decodes the source into 8-bit RGBA.
//! 2. [`resample::resize`] produces each size with a separable Lanczos
//!    filter.
//! 3. [`IconDirEntry::encode`] re-encodes each size as a standalone PNG (or
//!    a 32-bpp BMP) payload.
//! 4. [`IconDir::write`] lays out the header, the directory and the payloads.
//!
//! [`Converter`] drives the whole pipeline for a [`ResolutionPlan`], by
//! default 256, 128, 64, 48, 32 and 16 pixels.
//!
//! ```
//! use pngico::{Converter, IconDir, PixelBuffer};
//! use std::io::Cursor;
//!
//! let mut png = Vec::new();
//! PixelBuffer::filled(512, 512, [255, 0, 0, 255]).write_png(&mut png)?;
//! let ico = Converter::default().convert(&png)?;
//! let icondir = IconDir::read(Cursor::new(&ico))?;
//! let sizes: Vec<u32> = icondir.entries().iter().map(|e| e.width()).collect();
//! assert_eq!(sizes, [256, 128, 64, 48, 32, 16]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod bmp;
mod converter;
mod error;
pub mod fsio;
mod icondir;
mod image;
mod outcome;
mod plan;
pub mod resample;

pub use crate::converter::Converter;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::icondir::{
    read_directory, DirectoryRecord, IconDir, IconDirEntry, PayloadFormat,
    ENTRY_LEN, HEADER_LEN,
};
pub use crate::image::{PixelBuffer, MAX_DECODED_BYTES};
pub use crate::outcome::{format_file_size, ConversionOutcome};
pub use crate::plan::{PlanError, ResolutionPlan, MAX_SIZE, STANDARD_SIZES};

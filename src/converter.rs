use crate::error::{Error, Result};
use crate::fsio;
use crate::icondir::{IconDir, IconDirEntry, PayloadFormat};
use crate::image::PixelBuffer;
use crate::outcome::ConversionOutcome;
use crate::plan::ResolutionPlan;
use crate::resample;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::Path;

//===========================================================================//

/// Turns one PNG image into a multi-resolution ICO file.
///
/// The source is decoded once, then resized to every size in the plan and
/// each result re-encoded as its own payload.  Those jobs are independent
/// and run on the rayon pool when the `parallel` feature is enabled; the
/// entries are always assembled in plan order.
///
/// ```
/// use pngico::{Converter, PixelBuffer};
///
/// let mut png = Vec::new();
/// PixelBuffer::filled(64, 64, [255, 0, 0, 255]).write_png(&mut png)?;
/// let ico = Converter::default().convert(&png)?;
/// assert_eq!(&ico[..6], b"\x00\x00\x01\x00\x06\x00");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct Converter {
    plan: ResolutionPlan,
    payload_format: PayloadFormat,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl Default for Converter {
    fn default() -> Converter {
        Converter::new(ResolutionPlan::standard())
    }
}

impl Converter {
    /// Creates a converter for the given plan, writing PNG payloads.
    pub fn new(plan: ResolutionPlan) -> Converter {
        Converter { plan, payload_format: PayloadFormat::Png, parallel: true }
    }

    /// Sets how each image is encoded inside the icon.
    pub fn payload_format(mut self, format: PayloadFormat) -> Converter {
        self.payload_format = format;
        self
    }

    /// Sets whether sizes are rendered concurrently.  Has no effect without
    /// the `parallel` feature.
    pub fn parallel(mut self, parallel: bool) -> Converter {
        self.parallel = parallel;
        self
    }

    /// Returns the plan this converter renders.
    pub fn plan(&self) -> &ResolutionPlan {
        &self.plan
    }

    /// Decodes `source` and renders one entry per plan size.
    pub fn build(&self, source: &[u8]) -> Result<IconDir> {
        let image =
            PixelBuffer::read_png(source).map_err(Error::InvalidFormat)?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "decoded source image"
        );
        let entries = self.render_all(&image).map_err(Error::Encoding)?;
        let mut icondir = IconDir::new();
        for entry in entries {
            icondir.add_entry(entry);
        }
        Ok(icondir)
    }

    /// Converts PNG bytes into the bytes of an ICO file.
    pub fn convert(&self, source: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let len = self.convert_into(source, &mut output)?;
        debug_assert_eq!(output.len() as u64, len);
        Ok(output)
    }

    /// Converts PNG bytes into an ICO file written to `writer`, and returns
    /// the number of bytes written.  Any failure of `writer` is reported as
    /// [`Error::Encoding`].
    pub fn convert_into<W: Write>(
        &self,
        source: &[u8],
        writer: W,
    ) -> Result<u64> {
        let icondir = self.build(source)?;
        let len = icondir.encoded_len().map_err(Error::Encoding)?;
        icondir.write(writer).map_err(Error::Encoding)?;
        Ok(len)
    }

    /// Converts the PNG file at `input` into an ICO file at `output` and
    /// reports what happened.  The output is replaced atomically and is
    /// never left half-written.
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> ConversionOutcome {
        let span = tracing::info_span!(
            "convert",
            input = %input.display(),
            output = %output.display()
        );
        let _enter = span.enter();
        match self.try_convert_file(input, output) {
            Ok(len) => {
                tracing::info!(bytes = len, "wrote icon file");
                ConversionOutcome::success(output, self.plan.labels(), len)
            }
            Err(error) => {
                tracing::warn!(kind = error.kind().code(), "{}", error);
                ConversionOutcome::failure(&error)
            }
        }
    }

    fn try_convert_file(&self, input: &Path, output: &Path) -> Result<u64> {
        let source = fsio::load_source(input)?;
        let data = self.convert(&source)?;
        fsio::persist(output, &data)
    }

    fn render_all(
        &self,
        image: &PixelBuffer,
    ) -> io::Result<Vec<IconDirEntry>> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return self
                    .plan
                    .sizes()
                    .par_iter()
                    .map(|&size| self.render(image, size))
                    .collect();
            }
        }
        self.plan.iter().map(|size| self.render(image, size)).collect()
    }

    fn render(
        &self,
        image: &PixelBuffer,
        size: u32,
    ) -> io::Result<IconDirEntry> {
        let resized = resample::resize(image, size, size);
        let entry = IconDirEntry::encode(&resized, self.payload_format)?;
        tracing::debug!(
            size,
            png = entry.is_png(),
            bytes = entry.data().len(),
            "rendered icon image"
        );
        Ok(entry)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::Converter;
    use crate::error::{Error, ErrorKind};
    use crate::icondir::PayloadFormat;
    use crate::image::PixelBuffer;
    use crate::plan::ResolutionPlan;
    use std::io::{self, Write};

    fn png_bytes(image: &PixelBuffer) -> Vec<u8> {
        let mut data = Vec::new();
        image.write_png(&mut data).unwrap();
        data
    }

    #[test]
    fn entries_follow_plan_order() {
        let source = png_bytes(&PixelBuffer::filled(100, 50, [9, 8, 7, 255]));
        for &parallel in &[false, true] {
            let icondir =
                Converter::default().parallel(parallel).build(&source).unwrap();
            let sizes: Vec<u32> =
                icondir.entries().iter().map(|entry| entry.width()).collect();
            assert_eq!(sizes, vec![256, 128, 64, 48, 32, 16]);
            assert!(icondir.entries().iter().all(|e| e.width() == e.height()));
        }
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let mut rgba = Vec::new();
        for index in 0..(70 * 90) {
            rgba.extend_from_slice(&[
                (index % 251) as u8,
                (index % 13 * 19) as u8,
                (index / 70) as u8,
                (255 - index % 97) as u8,
            ]);
        }
        let source = png_bytes(&PixelBuffer::from_rgba_data(70, 90, rgba));
        let plan = ResolutionPlan::new(vec![64, 20, 3]).unwrap();
        let converter = Converter::new(plan).payload_format(PayloadFormat::Bmp);
        let sequential = converter.clone().parallel(false).convert(&source);
        let parallel = converter.parallel(true).convert(&source);
        assert_eq!(sequential.unwrap(), parallel.unwrap());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure_is_encoding_error() {
        let source = png_bytes(&PixelBuffer::filled(32, 32, [1, 2, 3, 255]));
        let error =
            Converter::default().convert_into(&source, BrokenPipe).unwrap_err();
        assert!(matches!(error, Error::Encoding(_)));
        assert_eq!(error.kind(), ErrorKind::EncodingError);

        let mut short = [0u8; 64];
        let error = Converter::default()
            .convert_into(&source, &mut short[..])
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EncodingError);
    }

    #[test]
    fn convert_into_reports_length() {
        let source = png_bytes(&PixelBuffer::filled(32, 32, [1, 2, 3, 255]));
        let mut output = Vec::new();
        let len = Converter::default().convert_into(&source, &mut output);
        assert_eq!(len.unwrap(), output.len() as u64);
        assert_eq!(output, Converter::default().convert(&source).unwrap());
    }

    #[test]
    fn invalid_source_is_invalid_format() {
        let error = Converter::default().convert(b"not an image").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidFormat);
        let error = Converter::default().convert(b"").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidFormat);
    }
}

//===========================================================================//

use std::io::{self, Read, Write};

//===========================================================================//

// Size limits for decoded images:
const MIN_WIDTH: u32 = 1;
const MIN_HEIGHT: u32 = 1;

/// The largest decoded image accepted from a PNG stream, in RGBA bytes
/// (a 16384x16384 image).
pub const MAX_DECODED_BYTES: u64 = 16384 * 16384 * 4;

//===========================================================================//

/// A decoded RGBA image with 8 bits per channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    rgba_data: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a new image with the given dimensions and RGBA data.  The
    /// `width` and `height` must be nonzero, and `rgba_data` must have `4 *
    /// width * height` bytes and be in row-major order from top to bottom.
    /// Panics if the dimensions are out of range or if `rgba_data` is the
    /// wrong length.
    pub fn from_rgba_data(
        width: u32,
        height: u32,
        rgba_data: Vec<u8>,
    ) -> PixelBuffer {
        if width < MIN_WIDTH {
            panic!(
                "Invalid width (was {}, but must be at least {})",
                width, MIN_WIDTH
            );
        }
        if height < MIN_HEIGHT {
            panic!(
                "Invalid height (was {}, but must be at least {})",
                height, MIN_HEIGHT
            );
        }
        let expected_data_len = (width as u64) * (height as u64) * 4;
        if (rgba_data.len() as u64) != expected_data_len {
            panic!(
                "Invalid data length (was {}, but must be {} for {}x{} image)",
                rgba_data.len(),
                expected_data_len,
                width,
                height
            );
        }
        PixelBuffer { width, height, rgba_data }
    }

    /// Creates an image where every pixel has the same RGBA value.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> PixelBuffer {
        let num_pixels = (width as usize) * (height as usize);
        PixelBuffer::from_rgba_data(width, height, rgba.repeat(num_pixels))
    }

    /// Decodes an image from PNG data.  Palette, grayscale, low bit-depth and
    /// 16-bit images are all normalized to 8-bit RGBA.  Returns an
    /// `InvalidData` error if the signature is wrong, the data is truncated
    /// or corrupt, or the encoding variant isn't supported.
    pub fn read_png<R: Read>(reader: R) -> io::Result<PixelBuffer> {
        let limits = png::Limits { bytes: MAX_DECODED_BYTES as usize };
        let mut decoder = png::Decoder::new_with_limits(reader, limits);
        decoder.set_transformations(
            png::Transformations::EXPAND | png::Transformations::STRIP_16,
        );
        let mut png_reader = match decoder.read_info() {
            Ok(png_reader) => png_reader,
            Err(error) => invalid_data!("Malformed PNG data: {}", error),
        };
        let info = png_reader.info();
        if info.width < MIN_WIDTH || info.height < MIN_HEIGHT {
            invalid_data!(
                "Invalid PNG dimensions (was {}x{}, but must be at least \
                 {}x{})",
                info.width,
                info.height,
                MIN_WIDTH,
                MIN_HEIGHT
            );
        }
        // The header alone decides the output size, so check it before
        // allocating anything for a possibly truncated stream.
        let decoded_len = info.width as u64 * info.height as u64 * 4;
        if decoded_len > MAX_DECODED_BYTES {
            invalid_data!(
                "PNG image too large (was {}x{}, at most {} RGBA bytes are \
                 allowed)",
                info.width,
                info.height,
                MAX_DECODED_BYTES
            );
        }
        let buffer_len = png_reader.output_buffer_size();
        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(buffer_len).is_err() {
            invalid_data!("Cannot allocate {} bytes for PNG data", buffer_len);
        }
        buffer.resize(buffer_len, 0u8);
        let frame = match png_reader.next_frame(&mut buffer) {
            Ok(frame) => frame,
            Err(error) => invalid_data!("Malformed PNG data: {}", error),
        };
        if frame.bit_depth != png::BitDepth::Eight {
            invalid_data!("Unsupported PNG bit depth: {:?}", frame.bit_depth);
        }
        buffer.truncate(frame.buffer_size());
        let rgba_data = match frame.color_type {
            png::ColorType::Rgba => buffer,
            png::ColorType::Rgb => {
                let mut rgba = Vec::with_capacity(buffer.len() / 3 * 4);
                for rgb in buffer.chunks_exact(3) {
                    rgba.extend_from_slice(rgb);
                    rgba.push(u8::MAX);
                }
                rgba
            }
            png::ColorType::GrayscaleAlpha => {
                let mut rgba = Vec::with_capacity(buffer.len() * 2);
                for gray_alpha in buffer.chunks_exact(2) {
                    let (gray, alpha) = (gray_alpha[0], gray_alpha[1]);
                    rgba.extend_from_slice(&[gray, gray, gray, alpha]);
                }
                rgba
            }
            png::ColorType::Grayscale => {
                let mut rgba = Vec::with_capacity(buffer.len() * 4);
                for gray in buffer {
                    rgba.extend_from_slice(&[gray, gray, gray, u8::MAX]);
                }
                rgba
            }
            png::ColorType::Indexed => {
                // EXPAND should have resolved the palette already.
                invalid_data!("Unsupported PNG color type: Indexed");
            }
        };
        let expected_len = (frame.width as usize) * (frame.height as usize) * 4;
        if rgba_data.len() != expected_len {
            invalid_data!(
                "Decoded PNG has wrong data length (was {}, but should be {})",
                rgba_data.len(),
                expected_len
            );
        }
        Ok(PixelBuffer::from_rgba_data(frame.width, frame.height, rgba_data))
    }

    /// Encodes the image as a standalone 8-bit RGBA PNG file.
    pub fn write_png<W: Write>(&self, writer: W) -> io::Result<()> {
        match self.write_png_enc(writer) {
            Ok(()) => Ok(()),
            Err(png::EncodingError::IoError(error)) => Err(error),
            Err(png::EncodingError::Format(error)) => {
                invalid_input!("PNG format error: {}", error);
            }
            Err(png::EncodingError::LimitsExceeded) => {
                invalid_input!("PNG limits exceeded");
            }
            Err(png::EncodingError::Parameter(error)) => {
                invalid_input!("PNG parameter error: {}", error);
            }
        }
    }

    fn write_png_enc<W: Write>(
        &self,
        writer: W,
    ) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.rgba_data)?;
        writer.finish()
    }

    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the RGBA data for this image, in row-major order from top to
    /// bottom.
    pub fn rgba_data(&self) -> &[u8] {
        &self.rgba_data
    }

    /// Returns the RGBA value of the pixel at column `x`, row `y`.  Panics
    /// if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let start = 4 * (y as usize * self.width as usize + x as usize);
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.rgba_data[start..start + 4]);
        rgba
    }

    /// Consumes the image and returns its RGBA data.
    pub fn into_rgba_data(self) -> Vec<u8> {
        self.rgba_data
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::PixelBuffer;
    use std::io;

    // A 1x1 RGBA PNG with a single fully transparent black pixel.
    const TINY_PNG: &[u8] = b"\
        \x89\x50\x4e\x47\x0d\x0a\x1a\x0a\x00\x00\x00\x0d\x49\x48\x44\x52\
        \x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00\x1f\x15\xc4\
        \x89\x00\x00\x00\x0a\x49\x44\x41\x54\x78\x9c\x63\x00\x01\x00\x00\
        \x05\x00\x01\x0d\x0a\x2d\xb4\x00\x00\x00\x00\x49\x45\x4e\x44\xae\
        \x42\x60\x82";

    #[test]
    fn read_tiny_rgba_png() {
        let image = PixelBuffer::read_png(TINY_PNG).unwrap();
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 1);
        assert_eq!(image.rgba_data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn read_grayscale_png() {
        let input: &[u8] = b"\
            \x89\x50\x4e\x47\x0d\x0a\x1a\x0a\x00\x00\x00\x0d\x49\x48\x44\x52\
            \x00\x00\x00\x02\x00\x00\x00\x02\x08\x00\x00\x00\x00\x57\xdd\x52\
            \xf8\x00\x00\x00\x0e\x49\x44\x41\x54\x78\x9c\x63\xb4\x77\x60\xdc\
            \xef\x00\x00\x04\x08\x01\x81\x86\x2e\xc9\x8d\x00\x00\x00\x00\x49\
            \x45\x4e\x44\xae\x42\x60\x82";
        let image = PixelBuffer::read_png(input).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        let rgba: &[u8] = b"\
            \x3f\x3f\x3f\xff\x7f\x7f\x7f\xff\
            \xbf\xbf\xbf\xff\xff\xff\xff\xff";
        assert_eq!(image.rgba_data(), rgba);
    }

    #[test]
    fn png_round_trip() {
        let width = 11;
        let height = 13;
        let mut rgba = Vec::new();
        for index in 0..(width * height) {
            rgba.push(if index % 2 == 0 { 0 } else { 255 });
            rgba.push(if index % 3 == 0 { 0 } else { 255 });
            rgba.push(if index % 5 == 0 { 0 } else { 255 });
            rgba.push(if index % 7 == 0 { 128 } else { 255 });
        }
        let image = PixelBuffer::from_rgba_data(width, height, rgba.clone());
        let mut data = Vec::new();
        image.write_png(&mut data).unwrap();
        let decoded = PixelBuffer::read_png(data.as_slice()).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn reject_empty_input() {
        let error = PixelBuffer::read_png(&b""[..]).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn reject_bad_signature() {
        let error = PixelBuffer::read_png(&b"not an image"[..]).unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn reject_truncated_png() {
        let truncated = &TINY_PNG[..TINY_PNG.len() - 20];
        assert!(PixelBuffer::read_png(truncated).is_err());
    }

    /// Appends one chunk, with its CRC, to `png`.
    fn push_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        png.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let start = png.len();
        png.extend_from_slice(kind);
        png.extend_from_slice(data);
        let mut crc = 0xffff_ffffu32;
        for &byte in &png[start..] {
            crc ^= byte as u32;
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xedb8_8320 & mask);
            }
        }
        png.extend_from_slice(&(!crc).to_be_bytes());
    }

    #[test]
    fn reject_huge_declared_size() {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&100_000u32.to_be_bytes());
        ihdr.extend_from_slice(&100_000u32.to_be_bytes());
        ihdr.extend_from_slice(b"\x08\x06\x00\x00\x00");
        push_chunk(&mut png, b"IHDR", &ihdr);
        let idat = b"\x78\x9c\x63\x00\x01\x00\x00\x05\x00\x01";
        push_chunk(&mut png, b"IDAT", idat);
        assert_eq!(png.len(), 55);
        let error = PixelBuffer::read_png(png.as_slice()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn filled_and_pixel() {
        let image = PixelBuffer::filled(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.rgba_data().len(), 24);
        assert_eq!(image.pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "Invalid data length")]
    fn wrong_data_length_panics() {
        PixelBuffer::from_rgba_data(2, 2, vec![0; 15]);
    }

    #[test]
    #[should_panic(expected = "Invalid width")]
    fn zero_width_panics() {
        PixelBuffer::from_rgba_data(0, 2, Vec::new());
    }
}

//===========================================================================//

//! 32-bpp BMP (DIB) payloads, the older in-container representation that
//! every ICO consumer understands.

use crate::image::PixelBuffer;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read};

//===========================================================================//

// The size of a BITMAPINFOHEADER struct, in bytes.
const BMP_HEADER_LEN: u32 = 40;

// The only color depth we write; it carries a full alpha channel.
const BMP_BITS_PER_PIXEL: u16 = 32;

//===========================================================================//

/// Encodes the image as a headerless 32-bpp BMP, the way ICO files embed
/// them: a BITMAPINFOHEADER with doubled height, bottom-up BGRA rows, then a
/// 1-bpp AND mask with each row padded to four bytes.
pub(crate) fn write_bmp(image: &PixelBuffer) -> io::Result<Vec<u8>> {
    let width = image.width();
    let height = image.height();
    let rgba = image.rgba_data();
    if width > i32::MAX as u32 || height > (i32::MAX / 2) as u32 {
        invalid_input!("Image too large for BMP ({}x{})", width, height);
    }

    let row_size = 4 * width as usize;
    let mask_row_data_size = (width as usize + 7) / 8;
    let mask_row_size = ((mask_row_data_size + 3) / 4) * 4;
    let mask_row_padding = vec![0u8; mask_row_size - mask_row_data_size];
    let data_size = BMP_HEADER_LEN as usize
        + height as usize * (row_size + mask_row_size);
    let mut data = Vec::<u8>::with_capacity(data_size);

    // Write the BITMAPINFOHEADER struct:
    data.write_u32::<LittleEndian>(BMP_HEADER_LEN)?;
    data.write_i32::<LittleEndian>(width as i32)?;
    data.write_i32::<LittleEndian>(2 * height as i32)?;
    data.write_u16::<LittleEndian>(1)?; // planes
    data.write_u16::<LittleEndian>(BMP_BITS_PER_PIXEL)?;
    data.write_u32::<LittleEndian>(0)?; // compression
    data.write_u32::<LittleEndian>(0)?; // image size
    data.write_i32::<LittleEndian>(0)?; // horz ppm
    data.write_i32::<LittleEndian>(0)?; // vert ppm
    data.write_u32::<LittleEndian>(0)?; // colors used
    data.write_u32::<LittleEndian>(0)?; // colors important
    debug_assert_eq!(data.len(), BMP_HEADER_LEN as usize);

    // Write the color data, starting from the *bottom* row:
    for row in rgba.chunks_exact(row_size).rev() {
        for pixel in row.chunks_exact(4) {
            data.extend_from_slice(&[pixel[2], pixel[1], pixel[0], pixel[3]]);
        }
    }

    // Write the mask data; a set bit marks a fully transparent pixel:
    for row in rgba.chunks_exact(row_size).rev() {
        let alphas: Vec<u8> = row.chunks_exact(4).map(|p| p[3]).collect();
        for group in alphas.chunks(8) {
            let mut byte = 0u8;
            for (bit, &alpha) in group.iter().enumerate() {
                if alpha == 0 {
                    byte |= 1 << (7 - bit);
                }
            }
            data.write_u8(byte)?;
        }
        data.extend_from_slice(&mask_row_padding);
    }

    debug_assert_eq!(data.len(), data_size);
    Ok(data)
}

/// Decodes a 32-bpp BMP payload as written by [`write_bmp`].  The alpha
/// channel is authoritative, so the AND mask is not consulted.
pub(crate) fn read_bmp<R: Read>(mut reader: R) -> io::Result<PixelBuffer> {
    let header_size = reader.read_u32::<LittleEndian>()?;
    if header_size != BMP_HEADER_LEN {
        invalid_data!(
            "Invalid BMP header size (was {}, must be {})",
            header_size,
            BMP_HEADER_LEN
        );
    }
    let width = reader.read_i32::<LittleEndian>()?;
    if width < 1 {
        invalid_data!("Invalid BMP width (was {}, must be >= 1)", width);
    }
    let height = reader.read_i32::<LittleEndian>()?;
    if height % 2 != 0 {
        // The height is stored doubled, counting the rows of both the color
        // data and the AND mask, so it should be divisible by 2.
        invalid_data!(
            "Invalid height field in BMP header \
             (was {}, but must be divisible by 2)",
            height
        );
    }
    let height = height / 2;
    if height < 1 {
        invalid_data!("Invalid BMP height (was {}, must be >= 1)", height);
    }
    let (width, height) = (width as u32, height as u32);
    let _planes = reader.read_u16::<LittleEndian>()?;
    let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
    if bits_per_pixel != BMP_BITS_PER_PIXEL {
        invalid_data!("Unsupported BMP bits-per-pixel ({})", bits_per_pixel);
    }
    let mut rest_of_header = [0u8; 24];
    reader.read_exact(&mut rest_of_header)?;

    let num_pixels = match width.checked_mul(height) {
        Some(num) => num as usize,
        None => invalid_data!("Width * Height is too large"),
    };
    let row_size = 4 * width as usize;
    let mut rgba = vec![0u8; num_pixels * 4];
    for row in rgba.chunks_exact_mut(row_size).rev() {
        reader.read_exact(row)?;
        for pixel in row.chunks_exact_mut(4) {
            pixel.swap(0, 2); // BGRA -> RGBA
        }
    }
    Ok(PixelBuffer::from_rgba_data(width, height, rgba))
}

//===========================================================================//


//===========================================================================//

use crate::bmp;
use crate::image::PixelBuffer;
use crate::plan::MAX_SIZE;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom, Write};

//===========================================================================//

// The signature that all PNG files start with.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

// The resource type number for icons (cursors would be 2).
const ICON_RESOURCE_TYPE: u16 = 1;

/// The size of the ICONDIR header, in bytes.
pub const HEADER_LEN: u32 = 6;

/// The size of one ICONDIRENTRY record, in bytes.
pub const ENTRY_LEN: u32 = 16;

// Every payload we write has a full 8-bit alpha channel.
const BITS_PER_PIXEL: u16 = 32;

// Images with more pixels than this go in as PNG under PayloadFormat::Auto.
const AUTO_PNG_MIN_PIXELS: u32 = 64 * 64;

//===========================================================================//

/// How each image is encoded inside the icon file.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PayloadFormat {
    /// Standalone PNG files (smaller; supported since Windows Vista).
    #[default]
    Png,
    /// Uncompressed 32-bpp BMP data (understood by every ICO reader).
    Bmp,
    /// PNG for images larger than 64x64 pixels, BMP for the rest.
    Auto,
}

impl PayloadFormat {
    fn use_png(self, image: &PixelBuffer) -> bool {
        match self {
            PayloadFormat::Png => true,
            PayloadFormat::Bmp => false,
            PayloadFormat::Auto => {
                image.width() * image.height() > AUTO_PNG_MIN_PIXELS
            }
        }
    }
}

//===========================================================================//

/// The raw contents of one 16-byte ICONDIRENTRY record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DirectoryRecord {
    /// Width in pixels; a stored byte of zero reads as 256.
    pub width: u32,
    /// Height in pixels; a stored byte of zero reads as 256.
    pub height: u32,
    /// Palette size, zero for true-color images.
    pub num_colors: u8,
    /// Color planes field.
    pub color_planes: u16,
    /// Bit depth field.
    pub bits_per_pixel: u16,
    /// Length of the payload, in bytes.
    pub data_size: u32,
    /// Absolute byte offset of the payload within the file.
    pub data_offset: u32,
}

/// Reads the ICONDIR header and directory records, without touching the
/// payloads.  Returns an error if the header is malformed or isn't for an
/// icon.
pub fn read_directory<R: Read>(
    mut reader: R,
) -> io::Result<Vec<DirectoryRecord>> {
    let reserved = reader.read_u16::<LittleEndian>()?;
    if reserved != 0 {
        invalid_data!(
            "Invalid reserved field value in ICONDIR \
             (was {}, but must be 0)",
            reserved
        );
    }
    let restype = reader.read_u16::<LittleEndian>()?;
    if restype != ICON_RESOURCE_TYPE {
        invalid_data!("Unsupported resource type ({})", restype);
    }
    let num_entries = reader.read_u16::<LittleEndian>()? as usize;
    let mut records = Vec::<DirectoryRecord>::with_capacity(num_entries);
    for _ in 0..num_entries {
        let width_byte = reader.read_u8()?;
        let height_byte = reader.read_u8()?;
        let num_colors = reader.read_u8()?;
        let reserved = reader.read_u8()?;
        if reserved != 0 {
            invalid_data!(
                "Invalid reserved field value in ICONDIRENTRY \
                 (was {}, but must be 0)",
                reserved
            );
        }
        let color_planes = reader.read_u16::<LittleEndian>()?;
        let bits_per_pixel = reader.read_u16::<LittleEndian>()?;
        let data_size = reader.read_u32::<LittleEndian>()?;
        let data_offset = reader.read_u32::<LittleEndian>()?;
        // One byte can't hold 256, so a zero byte stands for it.
        records.push(DirectoryRecord {
            width: if width_byte == 0 { 256 } else { width_byte as u32 },
            height: if height_byte == 0 { 256 } else { height_byte as u32 },
            num_colors,
            color_planes,
            bits_per_pixel,
            data_size,
            data_offset,
        });
    }
    Ok(records)
}

//===========================================================================//

/// A collection of images; the contents of a single ICO file.
#[derive(Clone, Debug, Default)]
pub struct IconDir {
    entries: Vec<IconDirEntry>,
}

impl IconDir {
    /// Creates a new, empty icon collection.
    pub fn new() -> IconDir {
        IconDir { entries: Vec::new() }
    }

    /// Returns the entries in this collection, in directory order.
    pub fn entries(&self) -> &[IconDirEntry] {
        &self.entries
    }

    /// Appends an entry; it will follow all existing entries in the
    /// directory.
    pub fn add_entry(&mut self, entry: IconDirEntry) {
        self.entries.push(entry);
    }

    /// Returns the `(offset, length)` of each entry's payload as it will be
    /// laid out by [`IconDir::write`].  The first payload starts right after
    /// the header and directory; each later one starts where the previous
    /// one ends.  Fails if the file would exceed 4 GiB.
    pub fn spans(&self) -> io::Result<Vec<(u32, u32)>> {
        if self.entries.len() > (u16::MAX as usize) {
            invalid_input!(
                "Too many entries in IconDir (was {}, but max is {})",
                self.entries.len(),
                u16::MAX
            );
        }
        let mut data_offset =
            HEADER_LEN + ENTRY_LEN * self.entries.len() as u32;
        let mut spans = Vec::with_capacity(self.entries.len());
        for entry in self.entries.iter() {
            let data_size = match u32::try_from(entry.data.len()) {
                Ok(size) => size,
                Err(_) => invalid_input!("Image payload too large"),
            };
            spans.push((data_offset, data_size));
            data_offset = match data_offset.checked_add(data_size) {
                Some(offset) => offset,
                None => invalid_input!("ICO file would exceed 4 GiB"),
            };
        }
        Ok(spans)
    }

    /// Returns the total size of the file [`IconDir::write`] would produce.
    pub fn encoded_len(&self) -> io::Result<u64> {
        let spans = self.spans()?;
        let header = HEADER_LEN as u64 + ENTRY_LEN as u64 * spans.len() as u64;
        let payloads: u64 = spans.iter().map(|&(_, size)| size as u64).sum();
        Ok(header + payloads)
    }

    /// Reads an ICO file into memory.
    pub fn read<R: Read + Seek>(mut reader: R) -> io::Result<IconDir> {
        let records = read_directory(&mut reader)?;
        let mut entries = Vec::<IconDirEntry>::with_capacity(records.len());
        for record in records.iter() {
            reader.seek(SeekFrom::Start(record.data_offset as u64))?;
            let mut data = Vec::new();
            (&mut reader)
                .take(record.data_size as u64)
                .read_to_end(&mut data)?;
            if data.len() as u64 != record.data_size as u64 {
                invalid_data!(
                    "ICO payload truncated (was {} bytes, but should be {})",
                    data.len(),
                    record.data_size
                );
            }
            entries.push(IconDirEntry {
                width: record.width,
                height: record.height,
                num_colors: record.num_colors,
                color_planes: record.color_planes,
                bits_per_pixel: record.bits_per_pixel,
                data,
            });
        }
        Ok(IconDir { entries })
    }

    /// Writes the ICO file: header, directory, then every payload back to
    /// back.  All offsets are computed before anything is written.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let spans = self.spans()?;
        writer.write_u16::<LittleEndian>(0)?; // reserved
        writer.write_u16::<LittleEndian>(ICON_RESOURCE_TYPE)?;
        writer.write_u16::<LittleEndian>(self.entries.len() as u16)?;
        for (entry, &(data_offset, data_size)) in
            self.entries.iter().zip(spans.iter())
        {
            writer.write_u8(dimension_byte(entry.width)?)?;
            writer.write_u8(dimension_byte(entry.height)?)?;
            writer.write_u8(entry.num_colors)?;
            writer.write_u8(0)?; // reserved
            writer.write_u16::<LittleEndian>(entry.color_planes)?;
            writer.write_u16::<LittleEndian>(entry.bits_per_pixel)?;
            writer.write_u32::<LittleEndian>(data_size)?;
            writer.write_u32::<LittleEndian>(data_offset)?;
        }
        for entry in self.entries.iter() {
            writer.write_all(&entry.data)?;
        }
        writer.flush()
    }
}

/// A width/height of exactly 256 is stored as a zero byte.
fn dimension_byte(size: u32) -> io::Result<u8> {
    match size {
        MAX_SIZE => Ok(0),
        1..=255 => Ok(size as u8),
        _ => invalid_input!(
            "Invalid icon dimension (was {}, but must be between 1 and {})",
            size,
            MAX_SIZE
        ),
    }
}

//===========================================================================//

/// One entry in an ICO file; a single encoded image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IconDirEntry {
    width: u32,
    height: u32,
    num_colors: u8,
    color_planes: u16,
    bits_per_pixel: u16,
    data: Vec<u8>,
}

impl IconDirEntry {
    /// Returns the width of the image, in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the image, in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the bits-per-pixel (color depth) recorded for the image.
    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    /// Returns the color planes field recorded for the image.
    pub fn color_planes(&self) -> u16 {
        self.color_planes
    }

    /// Returns true if the image is encoded as a PNG, or false if it is
    /// encoded as a BMP.
    pub fn is_png(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }

    /// Returns the raw, encoded image data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decodes this entry into an image.  Returns an error if the data is
    /// malformed or doesn't match the recorded dimensions.
    pub fn decode(&self) -> io::Result<PixelBuffer> {
        let image = if self.is_png() {
            PixelBuffer::read_png(self.data.as_slice())?
        } else {
            bmp::read_bmp(self.data.as_slice())?
        };
        if image.width() != self.width || image.height() != self.height {
            invalid_data!(
                "Encoded image has wrong dimensions \
                 (was {}x{}, but should be {}x{})",
                image.width(),
                image.height(),
                self.width,
                self.height
            );
        }
        Ok(image)
    }

    /// Encodes an image in a new entry using the given payload format.
    /// Returns an error if the image is larger than 256 pixels on a side or
    /// if encoding fails.
    pub fn encode(
        image: &PixelBuffer,
        format: PayloadFormat,
    ) -> io::Result<IconDirEntry> {
        dimension_byte(image.width())?;
        dimension_byte(image.height())?;
        let data = if format.use_png(image) {
            let mut data = Vec::new();
            image.write_png(&mut data)?;
            data
        } else {
            bmp::write_bmp(image)?
        };
        Ok(IconDirEntry {
            width: image.width(),
            height: image.height(),
            num_colors: 0,
            color_planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            data,
        })
    }

    /// Wraps already-encoded image data (a PNG file or a headerless 32-bpp
    /// BMP) of the given size in a new entry.
    pub fn from_encoded(
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> io::Result<IconDirEntry> {
        dimension_byte(width)?;
        dimension_byte(height)?;
        Ok(IconDirEntry {
            width,
            height,
            num_colors: 0,
            color_planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            data,
        })
    }
}

//===========================================================================//


//===========================================================================//

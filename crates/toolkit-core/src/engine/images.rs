//! Image to PDF conversion
//!
//! One page per image, sized to the image's pixel dimensions, with the image
//! drawn at the origin to fill the page exactly.

use super::{save_document, TransformOutput};
use crate::error::ToolkitError;
use crate::file_set::SelectedFile;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};

/// How an image file is embedded, chosen from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    fn from_mime(mime_type: &str) -> Result<Self, ToolkitError> {
        match mime_type.to_ascii_lowercase().as_str() {
            "image/png" => Ok(ImageEncoding::Png),
            "image/jpeg" | "image/jpg" => Ok(ImageEncoding::Jpeg),
            _ => Err(ToolkitError::UnsupportedImageFormat(mime_type.to_string())),
        }
    }
}

/// An image XObject added to the document
struct EmbeddedImage {
    id: ObjectId,
    width: u32,
    height: u32,
}

/// Convert images into a PDF, one page per image in input order
pub async fn images_to_pdf(files: &[SelectedFile]) -> Result<TransformOutput, ToolkitError> {
    if files.is_empty() {
        return Err(ToolkitError::OperationError("No images to convert".into()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(files.len());

    for file in files {
        let encoding = ImageEncoding::from_mime(&file.mime_type)?;
        let bytes = file.read().await?;

        let image = match encoding {
            ImageEncoding::Png => embed_png(&mut doc, &file.name, &bytes)?,
            ImageEncoding::Jpeg => embed_jpeg(&mut doc, &file.name, bytes)?,
        };
        tracing::debug!(
            name = %file.name,
            width = image.width,
            height = image.height,
            "embedded image"
        );

        kids.push(add_image_page(&mut doc, pages_id, &image)?);
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        (
            "Kids",
            Object::Array(kids.iter().map(|&id| Object::Reference(id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    save_document(&mut doc)
}

/// Add a page of exactly the image's size that draws the image edge to edge
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: &EmbeddedImage,
) -> Result<ObjectId, ToolkitError> {
    let (width, height) = (image.width as i64, image.height as i64);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ToolkitError::OperationError(format!("Failed to encode page: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image.id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);

    Ok(doc.add_object(page))
}

/// Embed a JPEG as-is with DCTDecode
fn embed_jpeg(
    doc: &mut Document,
    name: &str,
    bytes: Vec<u8>,
) -> Result<EmbeddedImage, ToolkitError> {
    let ((width, height), color_type) = {
        let decoder = JpegDecoder::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| invalid_image(name, e))?;
        (decoder.dimensions(), decoder.original_color_type())
    };

    let dict = jpeg_dictionary(width, height, color_type).ok_or_else(|| {
        invalid_image(name, format!("unsupported JPEG color type {:?}", color_type))
    })?;
    let id = doc.add_object(Stream::new(dict, bytes).with_compression(false));

    Ok(EmbeddedImage { id, width, height })
}

/// Decode a PNG and embed its pixels Flate-compressed, alpha as a soft mask
fn embed_png(
    doc: &mut Document,
    name: &str,
    bytes: &[u8],
) -> Result<EmbeddedImage, ToolkitError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    // Palette and low bit depths expand to 8-bit gray/RGB, tRNS becomes alpha
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder.read_info().map_err(|e| invalid_image(name, e))?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buffer)
        .map_err(|e| invalid_image(name, e))?;
    let pixels = &buffer[..frame.buffer_size()];

    let (color_space, channels, has_alpha): (&[u8], usize, bool) = match frame.color_type {
        png::ColorType::Grayscale => (b"DeviceGray", 1, false),
        png::ColorType::GrayscaleAlpha => (b"DeviceGray", 1, true),
        png::ColorType::Rgb => (b"DeviceRGB", 3, false),
        png::ColorType::Rgba => (b"DeviceRGB", 3, true),
        png::ColorType::Indexed => {
            return Err(invalid_image(name, "palette was not expanded"));
        }
    };

    let (color, alpha) = if has_alpha {
        split_alpha(pixels, channels)
    } else {
        (pixels.to_vec(), Vec::new())
    };

    let mut dict = image_dictionary(frame.width, frame.height, color_space, b"FlateDecode");
    if has_alpha {
        let mask_dict =
            image_dictionary(frame.width, frame.height, b"DeviceGray", b"FlateDecode");
        let mask = Stream::new(mask_dict, deflate(&alpha)?).with_compression(false);
        let mask_id = doc.add_object(mask);
        dict.set("SMask", Object::Reference(mask_id));
    }

    let id = doc.add_object(Stream::new(dict, deflate(&color)?).with_compression(false));

    Ok(EmbeddedImage {
        id,
        width: frame.width,
        height: frame.height,
    })
}

/// Image dictionary for a DCT-encoded JPEG, `None` for unsupported color types.
///
/// CMYK JPEGs are stored inverted (Adobe convention), so they get a
/// `Decode` array that flips every component back.
fn jpeg_dictionary(
    width: u32,
    height: u32,
    color_type: ExtendedColorType,
) -> Option<Dictionary> {
    let color_space: &[u8] = match color_type {
        ExtendedColorType::L8 => b"DeviceGray",
        ExtendedColorType::Rgb8 => b"DeviceRGB",
        ExtendedColorType::Cmyk8 => b"DeviceCMYK",
        _ => return None,
    };

    let mut dict = image_dictionary(width, height, color_space, b"DCTDecode");
    if color_type == ExtendedColorType::Cmyk8 {
        let decode = [1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect();
        dict.set("Decode", Object::Array(decode));
    }
    Some(dict)
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8], filter: &[u8]) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(filter.to_vec())),
    ])
}

/// Split interleaved color+alpha samples into separate planes
fn split_alpha(pixels: &[u8], color_channels: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_channels + 1;
    let count = pixels.len() / stride;
    let mut color = Vec::with_capacity(count * color_channels);
    let mut alpha = Vec::with_capacity(count);

    for pixel in pixels.chunks_exact(stride) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }

    (color, alpha)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ToolkitError> {
    let compress_error =
        |e: std::io::Error| ToolkitError::OperationError(format!("Failed to compress image: {}", e));

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(compress_error)?;
    encoder.finish().map_err(compress_error)
}

fn invalid_image(name: &str, reason: impl ToString) -> ToolkitError {
    ToolkitError::InvalidImage {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

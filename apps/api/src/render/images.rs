//! Turns uploaded photos into a PDF, one image per page.
//!
//! Images are decoded with the `image` crate, turned upright according to
//! their EXIF orientation, flattened to 8-bit RGB and re-encoded as baseline
//! JPEG so they can be embedded as DCTDecode XObjects. A JPEG that is already
//! upright three-component colour is embedded byte for byte instead. Each
//! image is scaled to fit inside the page margins (never enlarged) and centred.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use tracing::debug;

use crate::layout::PageGeometry;
use crate::render::pdf::media_box;
use crate::render::{finish_document, new_document, RenderError};

const JPEG_QUALITY: u8 = 90;

/// Placement of an image on the page: drawn size and lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
}

/// A DCT-encoded RGB image ready to embed.
struct JpegImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
    passthrough: bool,
}

/// Builds one PDF with a page per input image, in input order.
pub fn images_to_pdf(inputs: Vec<Vec<u8>>, geometry: &PageGeometry) -> Result<Vec<u8>, RenderError> {
    if inputs.is_empty() {
        return Err(RenderError::NoInput);
    }

    let (mut pdf, pages_id) = new_document();
    let media_box = media_box(geometry);
    let mut kids = Vec::with_capacity(inputs.len());

    for (index, bytes) in inputs.into_iter().enumerate() {
        let jpeg = prepare_jpeg(index, bytes)?;
        let placement = fit_to_page(jpeg.width as f32, jpeg.height as f32, geometry);
        debug!(
            index,
            px_width = jpeg.width,
            px_height = jpeg.height,
            passthrough = jpeg.passthrough,
            ?placement,
            "Placing image"
        );

        let image_id = pdf.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(jpeg.width),
                "Height" => i64::from(jpeg.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg.data,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        placement.width.into(),
                        Object::Integer(0),
                        Object::Integer(0),
                        placement.height.into(),
                        placement.x.into(),
                        placement.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        }
        .encode()
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content));

        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => image_id },
            },
            "Contents" => content_id,
        });
        kids.push(page_id);
    }

    finish_document(pdf, pages_id, kids, None)
}

/// Decodes one upload and produces the JPEG stream to embed, upright.
fn prepare_jpeg(index: usize, bytes: Vec<u8>) -> Result<JpegImage, RenderError> {
    let invalid = |e: ImageError| RenderError::InvalidImage {
        index,
        detail: e.to_string(),
    };

    let mut decoder = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| invalid(ImageError::IoError(e)))?
        .into_decoder()
        .map_err(invalid)?;
    let orientation = decoder.orientation().map_err(invalid)?;
    let (width, height) = decoder.dimensions();

    let upright = matches!(orientation, Orientation::NoTransforms);
    let is_jpeg = matches!(image::guess_format(&bytes), Ok(ImageFormat::Jpeg));
    if upright && is_jpeg && jpeg_components(&bytes) == Some(3) {
        drop(decoder);
        return Ok(JpegImage {
            width,
            height,
            data: bytes,
            passthrough: true,
        });
    }

    let mut decoded = DynamicImage::from_decoder(decoder).map_err(invalid)?;
    decoded.apply_orientation(orientation);
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut data = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY))?;
    Ok(JpegImage {
        width,
        height,
        data: data.into_inner(),
        passthrough: false,
    })
}

/// Component count from the first SOFn header of a JPEG stream.
///
/// Three components is YCbCr (or RGB), which PDF viewers decode as
/// DeviceRGB. Grayscale and CMYK files are re-encoded instead.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(pos + 1)?;
        match marker {
            // fill byte
            0xFF => pos += 1,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return bytes.get(pos + 9).copied();
            }
            // start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            _ => {
                let len = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]);
                pos += 2 + usize::from(len);
            }
        }
    }
}

/// Scales `width × height` to fit the area inside the margins, never upscaling,
/// and centres it on the page.
pub fn fit_to_page(width: f32, height: f32, geometry: &PageGeometry) -> Placement {
    let max_width = geometry.usable_width();
    let max_height = geometry.page_height - 2.0 * geometry.margin;
    let scale = (max_width / width).min(max_height / height).min(1.0);

    let drawn_width = width * scale;
    let drawn_height = height * scale;
    Placement {
        width: drawn_width,
        height: drawn_height,
        x: (geometry.page_width - drawn_width) / 2.0,
        y: (geometry.page_height - drawn_height) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::page_operations;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn jpeg(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    /// Splices an APP1 Exif segment carrying only an orientation tag after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        app1.extend_from_slice(&[0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        app1.extend_from_slice(&[0x00, 0x01]);
        app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut out = jpeg[..2].to_vec();
        out.extend(app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    /// The single image XObject of the first page: (Width, Height, stream bytes).
    fn embedded_image(pdf: &[u8]) -> (i64, i64, Vec<u8>) {
        let doc = lopdf::Document::load_mem(pdf).unwrap();
        let stream = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| matches!(s.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Image")))
            .unwrap();
        (
            stream.dict.get(b"Width").unwrap().as_i64().unwrap(),
            stream.dict.get(b"Height").unwrap().as_i64().unwrap(),
            stream.content.clone(),
        )
    }

    fn cm_operands(ops: &[Operation]) -> Vec<f32> {
        ops.iter()
            .find(|op| op.operator == "cm")
            .map(|op| op.operands.iter().map(|o| o.as_float().unwrap()).collect())
            .unwrap()
    }

    #[test]
    fn test_no_images() {
        let err = images_to_pdf(vec![], &PageGeometry::default()).unwrap_err();
        assert!(matches!(err, RenderError::NoInput));
    }

    #[test]
    fn test_small_image_is_centred_not_enlarged() {
        let bytes = images_to_pdf(vec![png(40, 20)], &PageGeometry::default()).unwrap();
        let pages = page_operations(&bytes);
        assert_eq!(pages.len(), 1);
        assert_eq!(cm_operands(&pages[0]), vec![40.0, 0.0, 0.0, 20.0, 286.0, 386.0]);
    }

    #[test]
    fn test_one_page_per_image() {
        let bytes = images_to_pdf(
            vec![png(10, 10), png(30, 60), png(5, 5)],
            &PageGeometry::default(),
        )
        .unwrap();
        assert_eq!(page_operations(&bytes).len(), 3);
    }

    #[test]
    fn test_wide_image_scaled_to_usable_width() {
        let p = fit_to_page(2000.0, 1000.0, &PageGeometry::default());
        assert!((p.width - 512.0).abs() < 1e-3);
        assert!((p.height - 256.0).abs() < 1e-3);
        assert!((p.x - 50.0).abs() < 1e-3);
        assert!((p.y - 268.0).abs() < 1e-3);
    }

    #[test]
    fn test_tall_image_scaled_to_usable_height() {
        let p = fit_to_page(1000.0, 4000.0, &PageGeometry::default());
        assert!((p.height - 692.0).abs() < 1e-3);
        assert!((p.width - 173.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_undecodable_image_reports_index() {
        let err = images_to_pdf(
            vec![png(4, 4), b"definitely not an image".to_vec()],
            &PageGeometry::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, RenderError::InvalidImage { index: 1, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_rgb_jpeg_embedded_unchanged() {
        let original = jpeg(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            30,
            10,
            image::Rgb([10, 120, 200]),
        )));
        let pdf = images_to_pdf(vec![original.clone()], &PageGeometry::default()).unwrap();
        let (width, height, data) = embedded_image(&pdf);
        assert_eq!((width, height), (30, 10));
        assert_eq!(data, original);
    }

    #[test]
    fn test_png_is_reencoded_as_jpeg() {
        let pdf = images_to_pdf(vec![png(12, 8)], &PageGeometry::default()).unwrap();
        let (width, height, data) = embedded_image(&pdf);
        assert_eq!((width, height), (12, 8));
        assert!(data.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_grayscale_jpeg_is_reencoded() {
        let gray = jpeg(DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            16,
            16,
            image::Luma([90]),
        )));
        assert_eq!(jpeg_components(&gray), Some(1));
        let pdf = images_to_pdf(vec![gray.clone()], &PageGeometry::default()).unwrap();
        let (_, _, data) = embedded_image(&pdf);
        assert_ne!(data, gray);
        assert_eq!(jpeg_components(&data), Some(3));
    }

    #[test]
    fn test_exif_rotation_applied_before_placement() {
        let landscape = jpeg(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            40,
            20,
            image::Rgb([0, 0, 0]),
        )));
        // orientation 6: stored sideways, displayed rotated 90° clockwise
        let rotated = with_exif_orientation(&landscape, 6);

        let pdf = images_to_pdf(vec![rotated.clone()], &PageGeometry::default()).unwrap();
        let (width, height, data) = embedded_image(&pdf);
        assert_eq!((width, height), (20, 40));
        assert_ne!(data, rotated);

        let pages = page_operations(&pdf);
        assert_eq!(cm_operands(&pages[0]), vec![20.0, 0.0, 0.0, 40.0, 296.0, 376.0]);
    }

    #[test]
    fn test_jpeg_components_rejects_garbage() {
        assert_eq!(jpeg_components(b"\xFF\xD8"), None);
        assert_eq!(jpeg_components(b"not a jpeg at all"), None);
    }
}

//! Normalization of user-attached files into inline data URLs.
//!
//! Images are recompressed (JPEG, bounded to 1024×1024) before upload to
//! keep completion requests small; PDFs are validated for a non-empty page
//! count and passed through as-is.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;

use crate::{Error, Result};

const MAX_DIMENSION: u32 = 1024;
const JPEG_QUALITY: u8 = 85;

/// Decode an image of any supported format, bound it to
/// `MAX_DIMENSION`×`MAX_DIMENSION` preserving aspect ratio, and return a
/// `data:image/jpeg` URL.
pub fn process_image(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| Error::FileProcessing(format!("image decode: {e}")))?;

    let img = if img.width() > MAX_DIMENSION || img.height() > MAX_DIMENSION {
        img.thumbnail(MAX_DIMENSION, MAX_DIMENSION)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .map_err(|e| Error::FileProcessing(format!("jpeg encode: {e}")))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        BASE64.encode(out.into_inner())
    ))
}

/// Validate a PDF (parseable, at least one page) and return a
/// `data:application/pdf` URL of the original bytes.
pub fn process_pdf(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::FileProcessing(format!("pdf parse: {e}")))?;

    if doc.get_pages().is_empty() {
        return Err(Error::FileProcessing("pdf has no pages".to_string()));
    }

    Ok(format!(
        "data:application/pdf;base64,{}",
        BASE64.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn decode_data_url(url: &str, prefix: &str) -> Vec<u8> {
        let b64 = url.strip_prefix(prefix).unwrap();
        BASE64.decode(b64).unwrap()
    }

    #[test]
    fn small_image_becomes_a_jpeg_data_url() {
        let url = process_image(&png_bytes(8, 8)).unwrap();
        let jpeg = decode_data_url(&url, "data:image/jpeg;base64,");
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn oversized_image_is_bounded_preserving_aspect() {
        let url = process_image(&png_bytes(2048, 512)).unwrap();
        let jpeg = decode_data_url(&url, "data:image/jpeg;base64,");
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 256));
    }

    #[test]
    fn garbage_image_bytes_are_rejected() {
        let err = process_image(b"not an image").unwrap_err();
        assert!(matches!(err, Error::FileProcessing(_)));
    }

    fn one_page_pdf() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn valid_pdf_round_trips_into_a_data_url() {
        let pdf = one_page_pdf();
        let url = process_pdf(&pdf).unwrap();
        assert_eq!(decode_data_url(&url, "data:application/pdf;base64,"), pdf);
    }

    #[test]
    fn garbage_pdf_bytes_are_rejected() {
        let err = process_pdf(b"%PDF-oops").unwrap_err();
        assert!(matches!(err, Error::FileProcessing(_)));
    }
}

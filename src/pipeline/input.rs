//! Input resolution: turn a file path or base64 payload into a decoded image.
//!
//! Card scans arrive either as files on disk (CLI) or as base64 strings from a
//! web client, sometimes as full `data:image/jpeg;base64,...` URLs. Both paths
//! end in the same validation: the bytes must sniff as PNG or JPEG. PDFs are
//! rejected with an explicit message instead of a decoder error.
//!
//! Phone cameras store portrait shots sideways plus an EXIF orientation tag;
//! the tag is applied at decode time so the model always sees the card upright.

use crate::error::ExtractError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Read and decode an image file.
pub fn load_image_file(path: impl AsRef<Path>) -> Result<DynamicImage, ExtractError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    decode_image_bytes(&bytes, &path.display().to_string())
}

/// Decode a base64 payload, accepting an optional `data:<mime>;base64,` prefix.
///
/// `mime_type` and `file_name` are hints only; they are used to give a clear
/// error for PDF uploads. The image format itself is sniffed from the bytes.
pub fn decode_base64_image(
    payload: &str,
    file_name: Option<&str>,
    mime_type: Option<&str>,
) -> Result<DynamicImage, ExtractError> {
    let (header_mime, data) = split_data_url(payload);
    let mime = header_mime.or(mime_type);

    let is_pdf = mime == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_lowercase().ends_with(".pdf"));
    let source_name = file_name.unwrap_or("<base64 payload>");
    if is_pdf {
        return Err(ExtractError::UnsupportedImage {
            source_name: source_name.to_string(),
            detail: "PDF documents are not supported; export the card page as an image".into(),
        });
    }

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| ExtractError::InvalidPayload {
            detail: e.to_string(),
        })?;

    decode_image_bytes(&bytes, source_name)
}

/// Split `data:<mime>;base64,<data>` into `(Some(mime), data)`.
///
/// Anything that is not a data URL is returned whole as the payload.
pub fn split_data_url(payload: &str) -> (Option<&str>, &str) {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let mime = header.split(';').next().filter(|m| !m.is_empty());
            return (mime, data);
        }
    }
    (None, payload)
}

fn decode_image_bytes(bytes: &[u8], source_name: &str) -> Result<DynamicImage, ExtractError> {
    if bytes.starts_with(b"%PDF") {
        return Err(ExtractError::UnsupportedImage {
            source_name: source_name.to_string(),
            detail: "PDF documents are not supported; export the card page as an image".into(),
        });
    }

    let format = image::guess_format(bytes).map_err(|e| ExtractError::UnsupportedImage {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(ExtractError::UnsupportedImage {
            source_name: source_name.to_string(),
            detail: format!("{format:?} images are not supported"),
        });
    }

    let unsupported = |e: image::ImageError| ExtractError::UnsupportedImage {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    };

    let mut decoder = ImageReader::with_format(Cursor::new(bytes), format)
        .into_decoder()
        .map_err(unsupported)?;
    // A malformed EXIF block is not worth rejecting the card over.
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut img = DynamicImage::from_decoder(decoder).map_err(unsupported)?;

    if orientation != Orientation::NoTransforms {
        debug!("{}: applying EXIF orientation {:?}", source_name, orientation);
        img.apply_orientation(orientation);
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    /// A 4x2 JPEG whose EXIF block says "rotate 90° clockwise to display".
    fn sideways_jpeg_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([200, 200, 200])));
        let mut jpeg = Vec::new();
        img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .expect("encode jpeg");

        #[rustfmt::skip]
        let app1: [u8; 36] = [
            0xFF, 0xE1, 0x00, 0x22,                         // APP1, length 34
            b'E', b'x', b'i', b'f', 0x00, 0x00,
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, // big-endian TIFF, IFD at 8
            0x00, 0x01,                                     // one entry
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, // Orientation, SHORT, 1
            0x00, 0x06, 0x00, 0x00,                         // value 6
            0x00, 0x00, 0x00, 0x00,                         // no next IFD
        ];

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_exif_orientation_is_applied() {
        let bytes = sideways_jpeg_bytes();
        let img = decode_image_bytes(&bytes, "portrait.jpg").expect("decodes");
        assert_eq!((img.width(), img.height()), (2, 4));

        let b64 = STANDARD.encode(&bytes);
        let img = decode_base64_image(&b64, Some("portrait.jpg"), None).expect("decodes");
        assert_eq!((img.width(), img.height()), (2, 4));
    }

    #[test]
    fn test_png_without_exif_keeps_dimensions() {
        let img = decode_image_bytes(&png_bytes(), "card.png").expect("decodes");
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_split_data_url() {
        assert_eq!(
            split_data_url("data:image/png;base64,AAAA"),
            (Some("image/png"), "AAAA")
        );
        assert_eq!(split_data_url("AAAA"), (None, "AAAA"));
        assert_eq!(split_data_url("data:;base64,AAAA"), (None, "AAAA"));
    }

    #[test]
    fn test_decode_plain_base64() {
        let b64 = STANDARD.encode(png_bytes());
        let img = decode_base64_image(&b64, Some("card.png"), None).expect("decodes");
        assert_eq!((img.width(), img.height()), (4, 3));
    }

    #[test]
    fn test_decode_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        assert!(decode_base64_image(&url, None, None).is_ok());
    }

    #[test]
    fn test_pdf_mime_rejected() {
        let err = decode_base64_image("JVBERi0=", None, Some("application/pdf")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedImage { .. }));
    }

    #[test]
    fn test_pdf_magic_rejected() {
        let b64 = STANDARD.encode(b"%PDF-1.7\n...");
        let err = decode_base64_image(&b64, None, None).unwrap_err();
        assert!(err.to_string().contains("PDF"));
    }

    #[test]
    fn test_bad_base64() {
        let err = decode_base64_image("!!not base64!!", None, None).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPayload { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_image_file("/definitely/not/here.jpg").unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.png");
        std::fs::write(&path, png_bytes()).unwrap();
        let img = load_image_file(&path).expect("loads");
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_text_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello, not an image").unwrap();
        let err = load_image_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedImage { .. }));
    }
}

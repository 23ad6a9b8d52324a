//! Local, network-free previews of staged image files.
//!
//! Images become a `data:` URL the UI can render directly. Documents,
//! archives and media get no preview; the UI shows an icon with the file
//! name and size instead.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::CandidateFile;
use crate::error::CoreError;

/// An in-memory preview of a staged image.
///
/// The encoded payload is owned by the handle, so replacing or dropping the
/// handle releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    data_url: String,
    dimensions: Option<(u32, u32)>,
}

impl PreviewHandle {
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Pixel `(width, height)` read from the image header, if recognizable.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

/// Build a preview for `file`, reading its bytes if it is an image.
///
/// Returns `Ok(None)` for non-image types without touching the file.
pub async fn preview(file: &CandidateFile) -> Result<Option<PreviewHandle>, CoreError> {
    if !file.is_image() {
        return Ok(None);
    }

    let bytes = file.read_bytes().await?;
    let dimensions = read_dimensions(&bytes);
    if dimensions.is_none() {
        tracing::debug!(file = %file.name, "Image header not recognized, previewing without dimensions");
    }

    Ok(Some(PreviewHandle {
        data_url: encode_data_url(&file.normalized_mime(), &bytes),
        dimensions,
    }))
}

/// Encode `bytes` as a base64 `data:` URL.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Header-only dimension extraction; never decodes pixel data.
fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn png_gets_data_url_and_dimensions() {
        let file = CandidateFile::from_bytes("qr.png", "image/png", png_bytes(4, 3));
        let handle = preview(&file).await.unwrap().expect("image should preview");

        assert!(handle.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(handle.dimensions(), Some((4, 3)));
    }

    #[tokio::test]
    async fn unparseable_image_still_previews() {
        let file = CandidateFile::from_bytes("raro.webp", "image/webp", vec![1, 2, 3, 4]);
        let handle = preview(&file).await.unwrap().unwrap();
        assert_eq!(handle.dimensions(), None);
        assert_eq!(handle.data_url(), "data:image/webp;base64,AQIDBA==");
    }

    #[tokio::test]
    async fn documents_have_no_preview() {
        let file = CandidateFile::from_bytes("bases.pdf", "application/pdf", vec![0; 8]);
        assert!(preview(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn document_on_disk_is_not_read() {
        let file = CandidateFile {
            name: "ausente.pdf".into(),
            size_bytes: 10,
            mime_type: "application/pdf".into(),
            source: super::super::FileSource::Disk("/definitely/not/here.pdf".into()),
        };
        assert!(preview(&file).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn image_on_disk_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portada.png");
        tokio::fs::write(&path, png_bytes(2, 2)).await.unwrap();

        let file = CandidateFile::from_path(&path, "image/png").await.unwrap();
        let handle = preview(&file).await.unwrap().unwrap();
        assert_eq!(handle.dimensions(), Some((2, 2)));
    }

    #[test]
    fn encode_data_url_format() {
        assert_eq!(encode_data_url("image/gif", b"GIF"), "data:image/gif;base64,R0lG");
    }
}

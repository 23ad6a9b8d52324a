//! Pre-staging file checks.

use super::policy::UploadPolicy;
use super::CandidateFile;

/// Reason a candidate file was not accepted into a slot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Unsupported file type '{mime_type}'")]
    UnsupportedType { mime_type: String },

    #[error("File is too large: {size_bytes} bytes exceeds the limit of {max_bytes} bytes")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

/// Check `file` against `policy`.
///
/// The type is checked before the size. A file exactly at the limit is
/// accepted.
pub fn validate(file: &CandidateFile, policy: &UploadPolicy) -> Result<(), Rejection> {
    if !policy.allows(&file.mime_type) {
        return Err(Rejection::UnsupportedType {
            mime_type: file.mime_type.clone(),
        });
    }

    if file.size_bytes > policy.max_bytes() {
        return Err(Rejection::TooLarge {
            size_bytes: file.size_bytes,
            max_bytes: policy.max_bytes(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::assets::policy::{AssetClass, BYTES_PER_MB};

    fn png(size: usize) -> CandidateFile {
        CandidateFile::from_bytes("foto.png", "image/png", vec![0u8; size])
    }

    #[test]
    fn accepts_allowed_type_within_limit() {
        let policy = UploadPolicy::new(["image/png"], 20 * BYTES_PER_MB);
        assert_eq!(validate(&png(512), &policy), Ok(()));
    }

    #[test]
    fn rejects_oversized_file() {
        let policy = UploadPolicy::new(["image/png"], 1024);
        assert_matches!(
            validate(&png(2048), &policy),
            Err(Rejection::TooLarge { size_bytes: 2048, max_bytes: 1024 })
        );
    }

    #[test]
    fn file_at_exact_limit_is_accepted() {
        let policy = UploadPolicy::new(["image/png"], 1024);
        assert!(validate(&png(1024), &policy).is_ok());
    }

    #[test]
    fn rejects_unlisted_type() {
        let policy = UploadPolicy::for_class(AssetClass::Image, BYTES_PER_MB);
        let pdf = CandidateFile::from_bytes("bases.pdf", "application/pdf", vec![0; 10]);
        assert_matches!(
            validate(&pdf, &policy),
            Err(Rejection::UnsupportedType { mime_type }) if mime_type == "application/pdf"
        );
    }

    #[test]
    fn type_is_checked_before_size() {
        let policy = UploadPolicy::new(["image/png"], 1);
        let pdf = CandidateFile::from_bytes("big.pdf", "application/pdf", vec![0; 10]);
        assert_matches!(validate(&pdf, &policy), Err(Rejection::UnsupportedType { .. }));
    }

    #[test]
    fn repeated_calls_give_identical_results() {
        let policy = UploadPolicy::new(["image/png", "image/jpeg"], 1000);
        let files = [
            png(10),
            png(5000),
            CandidateFile::from_bytes("a.gif", "image/gif", vec![0; 10]),
            CandidateFile::from_bytes("b.jpg", "IMAGE/JPEG", vec![0; 1000]),
        ];
        for file in &files {
            assert_eq!(validate(file, &policy), validate(file, &policy));
        }
    }
}

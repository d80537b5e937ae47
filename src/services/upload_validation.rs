use crate::models::upload::{UploadCandidate, UploadVerdict};

/// Largest selfie the service accepts (8 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 8 * 1024 * 1024;

const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/png", "image/jpeg", "image/heic", "image/heif"];

/// Classify a selfie by size and declared media type. Size is checked first.
pub fn classify(size_bytes: u64, media_type: &str) -> UploadVerdict {
    if size_bytes > MAX_UPLOAD_BYTES {
        return UploadVerdict::TooLarge;
    }

    let essence = media_type.split(';').next().unwrap_or_default().trim();
    if !ACCEPTED_MEDIA_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
    {
        return UploadVerdict::UnsupportedFormat;
    }

    UploadVerdict::Accepted
}

pub fn classify_candidate(candidate: &UploadCandidate) -> UploadVerdict {
    classify(candidate.size_bytes, &candidate.media_type)
}

/// Result of checking a whole batch of selfies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub verdicts: Vec<(String, UploadVerdict)>,
}

impl BatchReport {
    pub fn accepted(&self) -> usize {
        self.verdicts.iter().filter(|(_, v)| v.is_accepted()).count()
    }

    pub fn all_accepted(&self) -> bool {
        self.verdicts.iter().all(|(_, v)| v.is_accepted())
    }

    pub fn rejected(&self) -> Vec<(String, UploadVerdict)> {
        self.verdicts
            .iter()
            .filter(|(_, v)| !v.is_accepted())
            .cloned()
            .collect()
    }
}

pub fn classify_batch(candidates: &[UploadCandidate]) -> BatchReport {
    BatchReport {
        verdicts: candidates
            .iter()
            .map(|c| (c.name.clone(), classify_candidate(c)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_checked_before_format() {
        assert_eq!(classify(9 * 1024 * 1024, "image/png"), UploadVerdict::TooLarge);
        assert_eq!(classify(9 * 1024 * 1024, "image/gif"), UploadVerdict::TooLarge);
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert_eq!(classify(MAX_UPLOAD_BYTES, "image/jpeg"), UploadVerdict::Accepted);
        assert_eq!(classify(MAX_UPLOAD_BYTES + 1, "image/jpeg"), UploadVerdict::TooLarge);
    }

    #[test]
    fn test_unsupported_formats() {
        assert_eq!(classify(1024, "image/gif"), UploadVerdict::UnsupportedFormat);
        assert_eq!(classify(1024, "image/webp"), UploadVerdict::UnsupportedFormat);
        assert_eq!(classify(1024, ""), UploadVerdict::UnsupportedFormat);
        assert_eq!(classify(1024, "application/pdf"), UploadVerdict::UnsupportedFormat);
    }

    #[test]
    fn test_accepted_formats_case_insensitive() {
        assert_eq!(classify(1024, "image/HEIC"), UploadVerdict::Accepted);
        assert_eq!(classify(1024, "IMAGE/JPEG"), UploadVerdict::Accepted);
        assert_eq!(classify(1024, "image/heif"), UploadVerdict::Accepted);
        assert_eq!(classify(0, "image/png"), UploadVerdict::Accepted);
    }

    #[test]
    fn test_media_type_parameters_ignored() {
        assert_eq!(classify(1024, "image/png; q=0.9"), UploadVerdict::Accepted);
    }

    #[test]
    fn test_batch_report() {
        let batch = vec![
            UploadCandidate::new("a.png", 1024, "image/png"),
            UploadCandidate::new("b.gif", 1024, "image/gif"),
            UploadCandidate::new("c.jpg", MAX_UPLOAD_BYTES * 2, "image/jpeg"),
        ];
        let report = classify_batch(&batch);
        assert_eq!(report.accepted(), 1);
        assert!(!report.all_accepted());
        assert_eq!(
            report.rejected(),
            vec![
                ("b.gif".to_string(), UploadVerdict::UnsupportedFormat),
                ("c.jpg".to_string(), UploadVerdict::TooLarge),
            ]
        );
    }
}

//! File type and size checks

use crate::error::Warning;
use crate::file::CandidateFile;

/// One entry of an accept list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptPattern {
    /// `.png`, stored lower-cased with the leading dot
    Extension(String),
    /// `image/png`, or `image/*` when `subtype` is `None`
    MediaType {
        category: String,
        subtype: Option<String>,
    },
}

impl AcceptPattern {
    fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim().to_ascii_lowercase();
        if entry.is_empty() {
            return None;
        }

        if entry.starts_with('.') {
            return (entry.len() > 1).then_some(AcceptPattern::Extension(entry));
        }

        let (category, subtype) = entry.split_once('/')?;
        if category.is_empty() || category == "*" || subtype.is_empty() {
            return None;
        }
        Some(AcceptPattern::MediaType {
            category: category.to_string(),
            subtype: (subtype != "*").then(|| subtype.to_string()),
        })
    }

    fn matches(&self, file: &CandidateFile) -> bool {
        match self {
            // `.tar.gz` matches `backup.tar.gz`
            AcceptPattern::Extension(ext) => {
                let name = file.name().to_ascii_lowercase();
                name.len() > ext.len() && name.ends_with(ext.as_str())
            }
            AcceptPattern::MediaType { category, subtype } => {
                // Parameters such as `; charset=utf-8` are not part of the type.
                let essence = file
                    .media_type()
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                let Some((file_category, file_subtype)) = essence.split_once('/') else {
                    return false;
                };
                file_category == category
                    && subtype.as_deref().map_or(true, |s| s == file_subtype)
            }
        }
    }
}

/// Which files the drop zone takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptList {
    Any,
    Patterns(Vec<AcceptPattern>),
}

impl AcceptList {
    /// Parse a comma separated accept list such as `"image/*,.pdf"`.
    ///
    /// An empty string, `*` or `*/*` accept everything. Entries that cannot be
    /// parsed are skipped, so a list made only of garbage rejects every file.
    pub fn parse(accept: &str) -> Self {
        let accept = accept.trim();
        if accept.is_empty() {
            return AcceptList::Any;
        }

        let entries: Vec<&str> = accept.split(',').map(str::trim).collect();
        if entries.iter().any(|e| *e == "*" || *e == "*/*") {
            return AcceptList::Any;
        }

        AcceptList::Patterns(entries.into_iter().filter_map(AcceptPattern::parse).collect())
    }
}

impl Default for AcceptList {
    fn default() -> Self {
        AcceptList::Any
    }
}

pub fn validate_type(file: &CandidateFile, accept: &AcceptList) -> bool {
    match accept {
        AcceptList::Any => true,
        AcceptList::Patterns(patterns) => patterns.iter().any(|p| p.matches(file)),
    }
}

pub fn validate_size(file: &CandidateFile, max_bytes: Option<u64>) -> bool {
    max_bytes.map_or(true, |max| file.size() <= max)
}

/// Type and size constraints applied to every incoming file.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    pub accept: AcceptList,
    pub max_file_size: Option<u64>,
}

impl Validator {
    pub fn new(accept: AcceptList, max_file_size: Option<u64>) -> Self {
        Self {
            accept,
            max_file_size,
        }
    }

    /// `Ok` if the file may be uploaded, otherwise the rejection reason.
    /// The type check runs first.
    pub fn check(&self, file: &CandidateFile) -> Result<(), Warning> {
        if !validate_type(file, &self.accept) {
            return Err(Warning::TypeNotAccepted);
        }
        if !validate_size(file, self.max_file_size) {
            return Err(Warning::SizeExceeded);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: &str, size: usize) -> CandidateFile {
        CandidateFile::from_bytes(name, media_type, vec![0u8; size])
    }

    #[test]
    fn wildcards_accept_everything() {
        for accept in ["", "*", "*/*", "image/png, *"] {
            let list = AcceptList::parse(accept);
            assert_eq!(list, AcceptList::Any, "accept={accept:?}");
            assert!(validate_type(&file("a.bin", "application/x-foo", 1), &list));
        }
    }

    #[test]
    fn media_type_wildcard_subtype() {
        let list = AcceptList::parse("image/*");
        assert!(validate_type(&file("a.png", "image/png", 1), &list));
        assert!(validate_type(&file("a.svg", "IMAGE/SVG+XML", 1), &list));
        assert!(!validate_type(&file("b.txt", "text/plain", 1), &list));
    }

    #[test]
    fn exact_media_type_ignores_parameters() {
        let list = AcceptList::parse("text/plain");
        assert!(validate_type(&file("a.txt", "text/plain; charset=utf-8", 1), &list));
        assert!(!validate_type(&file("a.html", "text/html", 1), &list));
    }

    #[test]
    fn extensions_are_case_insensitive() {
        let list = AcceptList::parse(".PDF, .docx");
        assert!(validate_type(&file("report.pdf", "", 1), &list));
        assert!(validate_type(&file("Letter.DOCX", "", 1), &list));
        assert!(!validate_type(&file("pdf", "application/pdf", 1), &list));
    }

    #[test]
    fn multi_part_extensions_match_as_suffix() {
        let list = AcceptList::parse(".tar.gz");
        assert!(validate_type(&file("backup.TAR.GZ", "application/gzip", 1), &list));
        assert!(!validate_type(&file("backup.gz", "application/gzip", 1), &list));
        assert!(!validate_type(&file(".tar.gz", "application/gzip", 1), &list));
    }

    #[test]
    fn mixed_list_matches_either_kind() {
        let list = AcceptList::parse("image/*,.pdf");
        assert!(validate_type(&file("a.pdf", "application/pdf", 1), &list));
        assert!(validate_type(&file("a.gif", "image/gif", 1), &list));
        assert!(!validate_type(&file("a.zip", "application/zip", 1), &list));
    }

    #[test]
    fn no_usable_patterns_rejects_all() {
        let list = AcceptList::parse(" , ., /png");
        assert_eq!(list, AcceptList::Patterns(Vec::new()));
        assert!(!validate_type(&file("a.png", "image/png", 1), &list));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let f = file("a.png", "image/png", 1024);
        assert!(validate_size(&f, None));
        assert!(validate_size(&f, Some(1024)));
        assert!(!validate_size(&f, Some(1023)));
    }

    #[test]
    fn validator_reports_type_before_size() {
        let validator = Validator::new(AcceptList::parse("image/*"), Some(10));

        assert_eq!(validator.check(&file("a.png", "image/png", 5)), Ok(()));
        assert_eq!(
            validator.check(&file("a.png", "image/png", 11)),
            Err(Warning::SizeExceeded)
        );
        assert_eq!(
            validator.check(&file("a.txt", "text/plain", 11)),
            Err(Warning::TypeNotAccepted)
        );
    }
}

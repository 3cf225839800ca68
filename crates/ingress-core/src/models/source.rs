//! Output of source resolution.

use serde::Serialize;

use crate::constants::SOURCE_OBJECT_SUFFIX;

/// Canonical extension of the raw scratch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileExtension {
    Jpeg,
    Png,
}

impl FileExtension {
    /// Map an allowed content type to its extension. Parameters such as
    /// `; charset=binary` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .map(str::trim)
            .unwrap_or(content_type)
            .to_lowercase();
        match mime.as_str() {
            "image/jpeg" => Some(FileExtension::Jpeg),
            "image/png" => Some(FileExtension::Png),
            _ => None,
        }
    }

    /// Extension including the leading dot.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileExtension::Jpeg => ".jpeg",
            FileExtension::Png => ".png",
        }
    }
}

/// Concrete place the image bytes are retrieved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Final link after following redirects.
    Remote { url: String },
    /// Object in a named bucket, read anonymously.
    Bucket { bucket: String, key: String },
    /// Base64 payload carried in the message itself.
    Inline { payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub location: SourceLocation,
    pub file_extension: FileExtension,
}

impl ResolvedSource {
    pub fn remote(url: impl Into<String>, file_extension: FileExtension) -> Self {
        Self {
            location: SourceLocation::Remote { url: url.into() },
            file_extension,
        }
    }

    /// Bucket sources always point at `{link}.jpg` and are stored as `.jpeg`.
    pub fn bucket(bucket: impl Into<String>, link: &str) -> Self {
        Self {
            location: SourceLocation::Bucket {
                bucket: bucket.into(),
                key: format!("{}{}", link, SOURCE_OBJECT_SUFFIX),
            },
            file_extension: FileExtension::Jpeg,
        }
    }

    pub fn inline(payload: impl Into<String>) -> Self {
        Self {
            location: SourceLocation::Inline {
                payload: payload.into(),
            },
            file_extension: FileExtension::Jpeg,
        }
    }

    /// Human readable location for logs. Inline payloads are not echoed.
    pub fn effective_location(&self) -> String {
        match &self.location {
            SourceLocation::Remote { url } => url.clone(),
            SourceLocation::Bucket { bucket, key } => format!("{}/{}", bucket, key),
            SourceLocation::Inline { payload } => format!("inline ({} bytes)", payload.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_mapping() {
        assert_eq!(
            FileExtension::from_content_type("image/jpeg"),
            Some(FileExtension::Jpeg)
        );
        assert_eq!(
            FileExtension::from_content_type("image/PNG; charset=binary"),
            Some(FileExtension::Png)
        );
        assert_eq!(FileExtension::from_content_type("image/gif"), None);
        assert_eq!(FileExtension::from_content_type("text/html"), None);
    }

    #[test]
    fn bucket_source_appends_jpg_suffix() {
        let source = ResolvedSource::bucket("public-images", "cats/001");
        assert_eq!(
            source.location,
            SourceLocation::Bucket {
                bucket: "public-images".to_string(),
                key: "cats/001.jpg".to_string(),
            }
        );
        assert_eq!(source.file_extension.as_str(), ".jpeg");
        assert_eq!(source.effective_location(), "public-images/cats/001.jpg");
    }
}

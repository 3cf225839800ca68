//! Source resolution
//!
//! `s3_bucket` and `body_image` requests resolve without any network call. `url`
//! requests are validated with HEAD: 301 responses are followed up to the redirect
//! cap, and a 200 must carry an allowed image content type.

use ingress_core::models::{DataSource, FileExtension, IngestionRequest, ResolvedSource};
use ingress_core::{IngestError, IngestResult};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{StatusCode, Url};

/// Result of validating a remote link. Invalid links are a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCheck {
    Valid {
        location: String,
        extension: FileExtension,
    },
    Invalid {
        reason: String,
    },
}

impl LinkCheck {
    fn invalid(reason: impl Into<String>) -> Self {
        LinkCheck::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, LinkCheck::Valid { .. })
    }
}

#[derive(Clone)]
pub struct SourceResolver {
    client: reqwest::Client,
    max_redirects: u32,
}

impl SourceResolver {
    pub fn new(client: reqwest::Client, max_redirects: u32) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    pub async fn resolve(&self, request: &IngestionRequest) -> IngestResult<ResolvedSource> {
        match request.data_source {
            DataSource::S3Bucket => {
                let bucket = request.bucket().ok_or_else(|| {
                    IngestError::rejected("Data source is s3_bucket but no bucket_name given")
                })?;
                tracing::info!(
                    bucket = %bucket,
                    link = %request.url,
                    "Processing s3_bucket source"
                );
                Ok(ResolvedSource::bucket(bucket, &request.url))
            }
            DataSource::BodyImage => Ok(ResolvedSource::inline(request.url.clone())),
            DataSource::Url => match self.check_link(&request.url).await {
                LinkCheck::Valid {
                    location,
                    extension,
                } => Ok(ResolvedSource::remote(location, extension)),
                LinkCheck::Invalid { reason } => Err(IngestError::soft(format!(
                    "Could not process {}: {}",
                    request.url, reason
                ))),
            },
        }
    }

    /// HEAD `link`, following 301 responses. At most `max_redirects` hops are
    /// followed; one more 301 makes the link invalid.
    pub async fn check_link(&self, link: &str) -> LinkCheck {
        let mut current = match Url::parse(link.trim()) {
            Ok(url) => url,
            Err(e) => return LinkCheck::invalid(format!("invalid url: {}", e)),
        };
        let mut hops = 0u32;

        loop {
            if current.scheme() != "http" && current.scheme() != "https" {
                return LinkCheck::invalid(format!("unsupported scheme {}", current.scheme()));
            }

            let response = match self.client.head(current.clone()).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    tracing::warn!(url = %current, "Timeout reached during link check");
                    return LinkCheck::invalid(format!("timeout: {}", e));
                }
                Err(e) => {
                    tracing::warn!(url = %current, error = %e, "Link check request failed");
                    return LinkCheck::invalid(format!("request failed: {}", e));
                }
            };

            match response.status() {
                StatusCode::MOVED_PERMANENTLY => {
                    if hops >= self.max_redirects {
                        tracing::warn!(url = %link, hops, "Redirect limit reached");
                        return LinkCheck::invalid(format!(
                            "more than {} redirects",
                            self.max_redirects
                        ));
                    }
                    hops += 1;

                    let Some(location) = response
                        .headers()
                        .get(LOCATION)
                        .and_then(|value| value.to_str().ok())
                    else {
                        return LinkCheck::invalid("301 without Location header");
                    };

                    current = match current.join(location) {
                        Ok(next) => next,
                        Err(e) => {
                            return LinkCheck::invalid(format!("invalid redirect target: {}", e))
                        }
                    };
                    tracing::debug!(url = %current, hops, "Following redirect");
                }
                StatusCode::OK => {
                    let content_type = response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or_default();

                    return match FileExtension::from_content_type(content_type) {
                        Some(extension) => LinkCheck::Valid {
                            location: current.to_string(),
                            extension,
                        },
                        None => LinkCheck::invalid(format!(
                            "unsupported content type '{}'",
                            content_type
                        )),
                    };
                }
                status => return LinkCheck::invalid(format!("unexpected status {}", status)),
            }
        }
    }
}

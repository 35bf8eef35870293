//! Paste-service publishing.

use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://pastebin.com/api/api_post.php";
pub const DEFAULT_DOMAIN: &str = "pastebin.com";

#[derive(Debug, Error)]
pub enum PasteError {
    #[error("paste request failed")]
    Http(#[from] reqwest::Error),

    #[error("paste service returned an unexpected response: {0}")]
    Rejected(String),
}

/// Something that can publish text and answer with a raw response body.
pub trait PasteService {
    fn publish(&self, title: &str, content: &str) -> Result<String, PasteError>;
}

/// Pastebin's form-post API.
pub struct Pastebin {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl Pastebin {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, PasteError> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, endpoint: endpoint.into(), api_key: api_key.into() })
    }
}

impl PasteService for Pastebin {
    fn publish(&self, title: &str, content: &str) -> Result<String, PasteError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(&[
                ("api_option", "paste"),
                ("api_dev_key", self.api_key.as_str()),
                ("api_paste_name", title),
                ("api_paste_code", content),
            ])
            .send()?;
        Ok(response.text()?)
    }
}

/// Publish `content` and return the paste URL.
///
/// Success is recognised only by `domain` appearing in the response body;
/// anything else comes back as [`PasteError::Rejected`] with the raw body.
pub fn publish_report<S>(
    service: &S,
    title: &str,
    content: &str,
    domain: &str,
) -> Result<String, PasteError>
where
    S: PasteService + ?Sized,
{
    let body = service.publish(title, content)?;
    if body.contains(domain) {
        Ok(body.trim().to_string())
    } else {
        Err(PasteError::Rejected(body))
    }
}

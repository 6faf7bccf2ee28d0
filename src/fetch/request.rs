//! Intercepted request type.

use std::collections::BTreeMap;

use bytes::Bytes;
use url::Url;

// == Destination ==
/// What the page intends to do with the response.
///
/// Only `Document` matters to the strategies: a failed navigation may be
/// answered with the cached offline page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// Top-level navigation
    Document,
    Script,
    Style,
    Image,
    #[default]
    Other,
}

impl Destination {
    /// Maps a `Sec-Fetch-Dest` header value.
    pub fn from_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" => Destination::Document,
            "script" | "worker" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            _ => Destination::Other,
        }
    }
}

// == Request ==
/// A request issued by a controlled page.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Upper-case HTTP method
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    pub destination: Destination,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            destination: Destination::Other,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    /// A plain subresource GET.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A navigation GET, as issued when the user opens a page.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Scheme, host and port all match the serving origin.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }

    /// Whether a failed fetch should be answered with the JSON offline placeholder.
    ///
    /// True for `/api/` and JSON URLs, for requests accepting JSON, and for
    /// script-issued fetches (no destination). Navigations and asset loads
    /// never qualify unless their URL says otherwise.
    pub fn is_api_like(&self) -> bool {
        let url = self.url.as_str();
        if url.contains("/api/") || url.contains("json") {
            return true;
        }
        let accepts_json = self
            .headers
            .get("accept")
            .is_some_and(|accept| accept.contains("application/json"));
        accepts_json || self.destination == Destination::Other
    }
}

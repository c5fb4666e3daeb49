//! Minimal status-line + header responses for the request channel

use serde_json::json;

pub const NOT_FOUND_BODY: &str = "<h1>File Not Found</h1>\r\n";

/// Status line and headers of one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHead {
    Json,
    Binary,
    NotFound,
}

impl ResponseHead {
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Json | Self::Binary => "200 OK",
            Self::NotFound => "404 Not Found",
        }
    }

    pub const fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Binary => "application/octet-stream",
            Self::NotFound => "text/html",
        }
    }

    /// Serialized head, including the blank line that ends the headers
    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
            self.status(),
            self.content_type()
        )
        .into_bytes()
    }
}

/// `{"status":"<message>"}`
pub fn status_body(message: &str) -> String {
    json!({ "status": message }).to_string()
}

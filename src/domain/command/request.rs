//! Request-line routing

/// Longest request line the station reads
pub const MAX_REQUEST_LINE_LEN: usize = 1024;

/// Routes of the request-line channel, matched first-match in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRoute {
    List,
    Start,
    Stop,
    /// Any other `GET` target, as an absolute path in the storage namespace
    Download(String),
    /// Not a `GET` request line
    Unknown(String),
}

impl RequestRoute {
    /// Route a request line such as `GET /list HTTP/1.1`.
    ///
    /// Matching is by prefix, so `GET /listing.bin` routes to `List`.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with("GET /list") {
            Self::List
        } else if line.starts_with("GET /start") {
            Self::Start
        } else if line.starts_with("GET /stop") {
            Self::Stop
        } else if let Some(rest) = line.strip_prefix("GET /") {
            let target = rest.split(' ').next().unwrap_or_default();
            Self::Download(format!("/{}", target))
        } else {
            Self::Unknown(line.to_string())
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Download(_) => "download",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// True when `path` names something under the root: no `..` segments and
/// at least one non-empty segment.
pub fn is_traversal_free(path: &str) -> bool {
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    if segments.peek().is_none() {
        return false;
    }
    segments.all(|s| s != ".." && s != ".")
}

//! Request target representation.

use url::Url;

/// A request target split into the pieces the proxy rewrites.
///
/// `query` is stored raw, without the leading `?`. `scheme` and `host` are
/// empty for an origin-form target until something fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: String,
}

impl Uri {
    /// Parses an origin-form target such as `/chat?room=1`.
    pub fn from_origin_form(target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        Self {
            scheme: String::new(),
            host: String::new(),
            path: path.to_string(),
            query: query.to_string(),
        }
    }

    /// Parses a request-line target in either origin-form or absolute-form.
    ///
    /// Returns `None` for an absolute-form target the `url` crate rejects.
    pub fn from_request_target(target: &str) -> Option<Self> {
        if target.starts_with('/') || target == "*" {
            return Some(Self::from_origin_form(target));
        }

        Url::parse(target).ok().map(|url| Self::from(&url))
    }

    /// Renders the target for a request line. An empty path becomes `/`.
    pub fn path_and_query(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        if self.query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, self.query)
        }
    }
}

impl From<&Url> for Uri {
    fn from(url: &Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        Self {
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
            query: url.query().unwrap_or_default().to_string(),
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}://", self.scheme)?;
        }
        write!(f, "{}{}", self.host, self.path_and_query())
    }
}

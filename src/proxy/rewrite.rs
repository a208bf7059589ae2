//! Request target rewriting.

use url::Url;

use crate::http::request::Request;
use crate::http::uri::Uri;

/// Maps an inbound request onto the backend's target.
///
/// Implementations receive a copy of the inbound request and may change any
/// part of it; the proxy dials whatever `uri.host` holds afterwards.
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, request: &mut Request);
}

impl<F> Rewriter for F
where
    F: Fn(&mut Request) + Send + Sync,
{
    fn rewrite(&self, request: &mut Request) {
        self(request)
    }
}

/// Routes every request to one backend, prefixing its path and query.
///
/// With a target of `/foo` an inbound `/bar` is forwarded as `/foo/bar`.
#[derive(Debug, Clone)]
pub struct SingleHostRewriter {
    target: Uri,
}

impl SingleHostRewriter {
    pub fn new(target: &Url) -> Self {
        Self {
            target: Uri::from(target),
        }
    }

    pub fn target(&self) -> &Uri {
        &self.target
    }
}

impl Rewriter for SingleHostRewriter {
    fn rewrite(&self, request: &mut Request) {
        request.uri = rewrite_target(&self.target, &request.uri);
    }
}

/// Scheme and host come from `base`; path and query are merged.
pub fn rewrite_target(base: &Uri, inbound: &Uri) -> Uri {
    Uri {
        scheme: base.scheme.clone(),
        host: base.host.clone(),
        path: join_path(&base.path, &inbound.path),
        query: merge_query(&base.query, &inbound.query),
    }
}

/// Joins two paths with exactly one `/` between them.
pub fn join_path(a: &str, b: &str) -> String {
    let a_slash = a.ends_with('/');
    let b_slash = b.starts_with('/');
    match (a_slash, b_slash) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{}/{}", a, b),
        _ => format!("{}{}", a, b),
    }
}

pub fn merge_query(base: &str, inbound: &str) -> String {
    if base.is_empty() || inbound.is_empty() {
        format!("{}{}", base, inbound)
    } else {
        format!("{}&{}", base, inbound)
    }
}

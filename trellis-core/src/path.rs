//! Path composition helpers shared by the mounter and the route collector.
//!
//! Every path produced here is absolute, starts with `/`, and never contains
//! two consecutive slashes. Mount routes drop their trailing slash (except the
//! root itself); endpoint URLs keep one when the operation asks for it.

/// Collapse repeated slashes and strip the trailing one.
///
/// ```
/// use trellis_core::path::normalize_path;
///
/// assert_eq!(normalize_path("//test///my-route/"), "/test/my-route");
/// assert_eq!(normalize_path(""), "/");
/// ```
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Join two path fragments with `/` and normalize the result.
pub fn join_paths(base: &str, path: &str) -> String {
    let mut joined = String::with_capacity(base.len() + path.len() + 1);
    joined.push_str(base);
    joined.push('/');
    joined.push_str(path);
    normalize_path(&joined)
}

/// Returns `true` for the empty path and for paths made only of slashes.
pub fn is_root(path: &str) -> bool {
    path.chars().all(|c| c == '/')
}

/// Resolve the public URL of an operation mounted under `route`.
///
/// Root operations (`""` or `"/"`) and operation paths declared with a
/// trailing slash resolve to a URL ending in `/`.
///
/// ```
/// use trellis_core::path::endpoint_url;
///
/// assert_eq!(endpoint_url("/test/my-route", "/"), "/test/my-route/");
/// assert_eq!(endpoint_url("/test/my-route", "/:id"), "/test/my-route/:id");
/// ```
pub fn endpoint_url(route: &str, operation_path: &str) -> String {
    let mut url = join_paths(route, operation_path);
    if (is_root(operation_path) || operation_path.ends_with('/')) && !url.ends_with('/') {
        url.push('/');
    }
    url
}

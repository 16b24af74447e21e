/// Access level a request path requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Exact,
    Prefix,
}

#[derive(Debug, Clone, Copy)]
struct RouteRule {
    path: &'static str,
    matching: Match,
    class: RouteClass,
}

const fn exact(path: &'static str, class: RouteClass) -> RouteRule {
    RouteRule { path, matching: Match::Exact, class }
}

const fn prefix(path: &'static str, class: RouteClass) -> RouteRule {
    RouteRule { path, matching: Match::Prefix, class }
}

const RULES: &[RouteRule] = &[
    exact("/", RouteClass::Public),
    exact("/api/courses", RouteClass::Public),
    prefix("/courses", RouteClass::Public),
    prefix("/pricing", RouteClass::Public),
    prefix("/api/auth", RouteClass::Public),
    prefix("/health", RouteClass::Public),
    prefix("/dashboard", RouteClass::Protected),
    prefix("/api/user", RouteClass::Protected),
    prefix("/api/courses", RouteClass::Protected),
    prefix("/admin", RouteClass::AdminOnly),
    prefix("/api/admin", RouteClass::AdminOnly),
];

/// True when `path` equals `base` or continues it at a `/` boundary
fn segment_prefix(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || base.ends_with('/'),
        None => false,
    }
}

/// Classify a request path. An exact rule beats any prefix rule, the longest
/// matching prefix beats shorter ones, and unmatched paths are public.
pub fn classify(path: &str) -> RouteClass {
    // A trailing slash does not change the route
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    if let Some(rule) = RULES
        .iter()
        .find(|r| r.matching == Match::Exact && r.path == path)
    {
        return rule.class;
    }

    RULES
        .iter()
        .filter(|r| r.matching == Match::Prefix && segment_prefix(path, r.path))
        .max_by_key(|r| r.path.len())
        .map(|r| r.class)
        .unwrap_or(RouteClass::Public)
}

/// API requests get JSON errors; everything else is a page and gets redirects
pub fn is_api_path(path: &str) -> bool {
    segment_prefix(path, "/api")
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix that maps a page route onto its decision endpoint.
pub const API_PREFIX: &str = "/api";

const ROOT_LABEL: &str = "login";

/// Logical route a login page was served under.
///
/// Always starts with `/`, including after deserialization. The catch-all
/// suffix is kept exactly as received so policies can key on it; nothing here
/// decodes percent escapes or normalizes repeated or trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoutePath(String);

impl RoutePath {
    /// The `/` route.
    #[must_use]
    pub fn root() -> Self {
        Self("/".into())
    }

    /// Builds a route from a catch-all capture (`checkout/step-2`) or a full
    /// path (`/checkout/step-2`). One leading slash is dropped before joining.
    #[must_use]
    pub fn from_slug(slug: &str) -> Self {
        let slug = slug.strip_prefix('/').unwrap_or(slug);
        if slug.is_empty() {
            Self::root()
        } else {
            Self(format!("/{slug}"))
        }
    }

    /// Route as a path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the `/` route.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path without its leading slash; empty for the root.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.0.strip_prefix('/').unwrap_or(&self.0)
    }

    /// Display label: the slug, or `login` for the root route.
    #[must_use]
    pub fn pretty(&self) -> &str {
        if self.is_root() {
            ROOT_LABEL
        } else {
            self.slug()
        }
    }

    /// Endpoint path for this page: `/api` plus the page path.
    #[must_use]
    pub fn api_path(&self) -> String {
        if self.is_root() {
            API_PREFIX.to_string()
        } else {
            format!("{API_PREFIX}{}", self.0)
        }
    }
}

impl Default for RoutePath {
    fn default() -> Self {
        Self::root()
    }
}

impl From<String> for RoutePath {
    fn from(raw: String) -> Self {
        Self::from_slug(&raw)
    }
}

impl From<RoutePath> for String {
    fn from(route: RoutePath) -> Self {
        route.0
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_route_maps_to_bare_api_prefix() {
        let route = RoutePath::from_slug("");
        assert!(route.is_root());
        assert_eq!(route.as_str(), "/");
        assert_eq!(route.pretty(), "login");
        assert_eq!(route.api_path(), "/api");
    }

    #[test]
    fn nested_route_is_prefixed() {
        let route = RoutePath::from_slug("checkout/step-2");
        assert_eq!(route.as_str(), "/checkout/step-2");
        assert_eq!(route.slug(), "checkout/step-2");
        assert_eq!(route.pretty(), "checkout/step-2");
        assert_eq!(route.api_path(), "/api/checkout/step-2");
    }

    #[test]
    fn full_paths_and_slugs_agree() {
        assert_eq!(RoutePath::from_slug("/a/b"), RoutePath::from_slug("a/b"));
        assert_eq!(RoutePath::from_slug("/"), RoutePath::root());
    }

    #[test]
    fn odd_paths_are_kept_verbatim() {
        let route = RoutePath::from_slug("a//b/");
        assert_eq!(route.as_str(), "/a//b/");
        assert_eq!(route.api_path(), "/api/a//b/");
    }

    #[test]
    fn deserialized_routes_keep_the_leading_slash() {
        let empty: RoutePath = serde_json::from_str("\"\"").unwrap();
        assert!(empty.is_root());
        assert_eq!(empty.pretty(), "login");

        let bare: RoutePath = serde_json::from_str("\"checkout\"").unwrap();
        assert_eq!(bare.as_str(), "/checkout");
        assert_eq!(bare.slug(), "checkout");
        assert_eq!(bare.api_path(), "/api/checkout");

        let encoded = RoutePath::from_slug("caf%C3%A9/x%2Fy");
        assert_eq!(serde_json::to_string(&encoded).unwrap(), "\"/caf%C3%A9/x%2Fy\"");
        let back: RoutePath = serde_json::from_str("\"/caf%C3%A9/x%2Fy\"").unwrap();
        assert_eq!(back, encoded);
    }
}

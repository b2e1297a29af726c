//! URL ⇄ [`View`] codec.
//!
//! A view is written as `path?query#config`, where both `query` and
//! `config` are form-urlencoded with keys in sorted order. Empty maps are
//! left out entirely, so `{path: "/", query: {}, config: {}}` encodes to `/`.

use std::collections::BTreeMap;

use url::Url;

use crate::error::{Error, Result};
use crate::View;

/// Compose a URL (relative to the origin) out of a view.
pub fn encode(view: &View) -> String {
    let mut href = if view.path.is_empty() {
        "/".to_string()
    } else {
        view.path.clone()
    };
    if !view.query.is_empty() {
        href.push('?');
        href.push_str(&encode_params(&view.query));
    }
    if !view.config.is_empty() {
        href.push('#');
        href.push_str(&encode_params(&view.config));
    }
    href
}

/// Form-urlencode a flat string map.
pub fn encode_params(params: &BTreeMap<String, String>) -> String {
    // A map of strings always serializes.
    serde_urlencoded::to_string(params).unwrap_or_default()
}

/// Parse form-urlencoded text into a flat string map.
///
/// Undecodable input yields an empty map. When a key repeats, the last
/// value wins.
pub fn parse_params(text: &str) -> BTreeMap<String, String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(text)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

/// Decode `href` into a view.
///
/// `None` reads `location` itself; otherwise `href` is resolved against
/// `location` first, so relative URLs such as `../up` or `?page=2` work.
pub fn decode(location: &Url, href: Option<&str>) -> Result<View> {
    match href {
        None => Ok(view_of(location)),
        Some(href) => {
            let target = location.join(href).map_err(|source| Error::InvalidUrl {
                href: href.to_string(),
                source,
            })?;
            Ok(view_of(&target))
        }
    }
}

/// The view of an absolute URL.
pub fn view_of(url: &Url) -> View {
    let path = match url.path() {
        "" => "/".to_string(),
        p => p.to_string(),
    };
    View {
        path,
        query: parse_params(url.query().unwrap_or("")),
        config: parse_params(url.fragment().unwrap_or("")),
        desc: None,
    }
}

/// `pathname + search + hash` of a location, in the same shape [`encode`]
/// produces.
pub fn relative_href(url: &Url) -> String {
    let mut href = url.path().to_string();
    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        href.push('?');
        href.push_str(query);
    }
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        href.push('#');
        href.push_str(fragment);
    }
    href
}

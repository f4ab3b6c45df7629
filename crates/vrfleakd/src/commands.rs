//! Request builders for VRF store calls

use reqwest::Url;
use serde_json::{Map, Value};
use sonic_vrfleak_common::{LeakError, LeakResult};

use crate::tables::{fields, IMPORT_DIRECTION, TARGETS_RESOURCE, VRFS_RESOURCE};

/// Appends `segments` to the path of `base`
///
/// Dot segments would be dropped or collapsed by the URL parser, so they are
/// rejected instead of silently addressing a different resource.
fn with_segments(base: &Url, segments: &[&str]) -> LeakResult<Url> {
    if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(LeakError::config(format!(
            "'{}' cannot be used as a store path segment",
            dot
        )));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| LeakError::config(format!("store URL '{}' cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Build the VRF list URL
///
/// Lists every VRF, optionally restricted to one namespace
pub fn build_list_vrfs_url(base: &Url, namespace: Option<&str>) -> LeakResult<Url> {
    let mut url = with_segments(base, &[VRFS_RESOURCE, ""])?;
    if let Some(namespace) = namespace {
        url.query_pairs_mut().append_pair(fields::NAMESPACE, namespace);
    }
    Ok(url)
}

/// Build the add-import URL
///
/// The RT travels in the request body, see [`build_add_import_body`]
pub fn build_add_import_url(base: &Url, namespace: &str, name: &str) -> LeakResult<Url> {
    with_segments(
        base,
        &[VRFS_RESOURCE, namespace, name, TARGETS_RESOURCE, IMPORT_DIRECTION],
    )
}

/// Build the add-import request body
pub fn build_add_import_body(rt: &str) -> Value {
    let mut body = Map::new();
    body.insert(fields::RT.to_string(), Value::from(rt));
    Value::Object(body)
}

/// Build the remove-import URL
pub fn build_remove_import_url(
    base: &Url,
    namespace: &str,
    name: &str,
    rt: &str,
) -> LeakResult<Url> {
    with_segments(
        base,
        &[
            VRFS_RESOURCE,
            namespace,
            name,
            TARGETS_RESOURCE,
            IMPORT_DIRECTION,
            rt,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://127.0.0.1:8000").unwrap()
    }

    #[test]
    fn test_build_list_vrfs_url() {
        let url = build_list_vrfs_url(&base(), None).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/vrfs/");

        let url = build_list_vrfs_url(&base(), Some("tenant")).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/vrfs/?namespace=tenant");
    }

    #[test]
    fn test_build_add_import_url() {
        let url = build_add_import_url(&base(), "default", "red").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/vrfs/default/red/targets/import"
        );
    }

    #[test]
    fn test_build_add_import_body() {
        let body = build_add_import_body("65000:1");
        assert_eq!(body["rt"], "65000:1");
    }

    #[test]
    fn test_build_remove_import_url() {
        let url = build_remove_import_url(&base(), "default", "red", "65000:1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/vrfs/default/red/targets/import/65000:1"
        );
    }

    #[test]
    fn test_base_path_is_preserved() {
        let base = Url::parse("http://store.example:8000/api/").unwrap();
        let url = build_add_import_url(&base, "default", "red").unwrap();
        assert_eq!(
            url.as_str(),
            "http://store.example:8000/api/vrfs/default/red/targets/import"
        );
    }

    #[test]
    fn test_segment_escaping() {
        let url = build_add_import_url(&base(), "default", "red/../blue").unwrap();
        // Should be encoded to stay inside the VRF resource
        assert!(url.as_str().contains("red%2F..%2Fblue"));
    }

    #[test]
    fn test_dot_segments_rejected() {
        let err = build_add_import_url(&base(), "default", "..").unwrap_err();
        assert!(matches!(err, LeakError::Config { .. }));
        assert!(build_remove_import_url(&base(), "default", "red", ".").is_err());
        assert!(build_remove_import_url(&base(), ".", "red", "65000:1").is_err());

        // Dots inside a segment are ordinary characters
        let url = build_remove_import_url(&base(), "default", "red.v2", "65000:1").unwrap();
        assert!(url.as_str().ends_with("/red.v2/targets/import/65000:1"));
    }

    #[test]
    fn test_cannot_be_base() {
        let base = Url::parse("mailto:ops@example.com").unwrap();
        assert!(build_list_vrfs_url(&base, None).is_err());
    }
}

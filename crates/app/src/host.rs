use axum::http::{header, HeaderMap, HeaderName, Uri};

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const DEFAULT_PORTS: [&str; 2] = [":80", ":443"];

/// Extracts the host a request was addressed to.
///
/// `X-Forwarded-Host` is only consulted when the deployment trusts its proxy.
/// The `Host` header comes next, then the URI authority. A default port is
/// removed; any other port is kept for the resolver to deal with.
pub fn request_host(headers: &HeaderMap, uri: &Uri, use_forwarded_host: bool) -> Option<String> {
    let forwarded = if use_forwarded_host {
        header_str(headers, &X_FORWARDED_HOST).and_then(|value| value.split(',').next())
    } else {
        None
    };

    let raw = match forwarded.or_else(|| header_str(headers, &header::HOST)) {
        Some(value) => value.trim().to_string(),
        None => {
            let authority = uri.authority()?;
            match authority.port() {
                Some(port) => format!("{}:{}", authority.host(), port),
                None => authority.host().to_string(),
            }
        }
    };

    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_graphic()) {
        return None;
    }
    Some(strip_default_port(&raw).to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn strip_default_port(host: &str) -> &str {
    for suffix in DEFAULT_PORTS {
        if let Some(stripped) = host.strip_suffix(suffix) {
            if !stripped.is_empty() && !stripped.ends_with(':') {
                return stripped;
            }
        }
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn uses_host_header_and_keeps_custom_port() {
        let map = headers(&[("host", "example.com:8080")]);
        let host = request_host(&map, &Uri::from_static("/"), false);
        assert_eq!(host.as_deref(), Some("example.com:8080"));
    }

    #[test]
    fn drops_default_ports() {
        for (raw, expected) in [
            ("example.com:80", "example.com"),
            ("example.com:443", "example.com"),
            ("[::1]:80", "[::1]"),
            ("example.com:8080", "example.com:8080"),
        ] {
            let map = headers(&[("host", raw)]);
            assert_eq!(
                request_host(&map, &Uri::from_static("/"), false).as_deref(),
                Some(expected)
            );
        }
    }

    #[test]
    fn forwarded_host_requires_opt_in() {
        let map = headers(&[
            ("host", "internal:8000"),
            ("x-forwarded-host", "public.example, proxy.local"),
        ]);
        let uri = Uri::from_static("/");
        assert_eq!(
            request_host(&map, &uri, false).as_deref(),
            Some("internal:8000")
        );
        assert_eq!(
            request_host(&map, &uri, true).as_deref(),
            Some("public.example")
        );
    }

    #[test]
    fn falls_back_to_uri_authority() {
        let uri = Uri::from_static("http://example.com:443/admin/polls");
        assert_eq!(
            request_host(&HeaderMap::new(), &uri, false).as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn missing_host_is_none() {
        assert!(request_host(&HeaderMap::new(), &Uri::from_static("/"), false).is_none());
    }
}

/// Splits a request host into `(domain, port)`.
///
/// The host is lowercased. Bracketed IPv6 literals keep their brackets. A
/// single trailing dot is dropped from the domain. Malformed hosts yield a
/// pair of empty strings so callers can treat them as unknown.
pub fn split_domain_port(host: &str) -> (String, String) {
    let host = host.to_ascii_lowercase();

    let (domain, port) = if host.starts_with('[') {
        let Some(end) = host.find(']') else {
            return invalid();
        };
        let (literal, rest) = host.split_at(end + 1);
        if !is_ipv6_literal(literal) {
            return invalid();
        }
        match rest.strip_prefix(':') {
            Some(port) => (literal.to_string(), port.to_string()),
            None if rest.is_empty() => (literal.to_string(), String::new()),
            None => return invalid(),
        }
    } else {
        let (domain, port) = match host.rsplit_once(':') {
            Some((domain, port)) => (domain, port),
            None => (host.as_str(), ""),
        };
        if domain.is_empty() || !domain.chars().all(is_hostname_char) {
            return invalid();
        }
        (domain.to_string(), port.to_string())
    };

    if host.contains(':') && !host.starts_with('[') && port.is_empty() {
        return invalid();
    }
    if !port.chars().all(|c| c.is_ascii_digit()) {
        return invalid();
    }

    let domain = if domain.ends_with('.') {
        domain[..domain.len() - 1].to_string()
    } else {
        domain
    };
    (domain, port)
}

fn invalid() -> (String, String) {
    (String::new(), String::new())
}

fn is_hostname_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-'
}

fn is_ipv6_literal(literal: &str) -> bool {
    let inner = &literal[1..literal.len() - 1];
    let Some(first_colon) = inner.find(':') else {
        return false;
    };
    let head = &inner[..first_colon];
    let tail = &inner[first_colon + 1..];
    head.chars().all(|c| c.is_ascii_hexdigit())
        && !tail.is_empty()
        && tail
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.')
}

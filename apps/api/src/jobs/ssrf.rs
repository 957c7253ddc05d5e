//! Guards for fetching user-supplied URLs: only public http(s) hosts.

use std::net::IpAddr;

use reqwest::redirect::{Attempt, Policy};
use thiserror::Error;
use url::{Host, Url};

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum SsrfError {
    #[error("scheme '{0}' is not allowed, use http or https")]
    BlockedScheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("{0} is a private or reserved address")]
    BlockedIp(IpAddr),

    #[error("could not resolve host '{0}'")]
    Unresolvable(String),
}

/// Loopback, RFC 1918, link-local, CGNAT, multicast, broadcast, unspecified,
/// IPv6 unique-local and IPv4-mapped forms of any of those.
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || a == 0
                || (a == 100 && (b & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

fn literal_ip(url: &Url) -> Option<IpAddr> {
    match url.host()? {
        Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
        Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
        Host::Domain(_) => None,
    }
}

/// Checks the scheme, then every address the host resolves to.
pub async fn validate_public_url(url: &Url) -> Result<(), SsrfError> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SsrfError::BlockedScheme(url.scheme().to_string()));
    }

    if let Some(ip) = literal_ip(url) {
        if is_private_or_reserved(ip) {
            return Err(SsrfError::BlockedIp(ip));
        }
        return Ok(());
    }

    let host = url.host_str().ok_or(SsrfError::MissingHost)?;
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| SsrfError::Unresolvable(host.to_string()))?
        .collect();
    if addrs.is_empty() {
        return Err(SsrfError::Unresolvable(host.to_string()));
    }
    match addrs.iter().find(|a| is_private_or_reserved(a.ip())) {
        Some(addr) => Err(SsrfError::BlockedIp(addr.ip())),
        None => Ok(()),
    }
}

/// Redirect policy for page fetches: bounded hops and no hop onto a
/// non-http scheme or a private address literal.
pub fn redirect_policy() -> Policy {
    Policy::custom(|attempt: Attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let url = attempt.url();
        let blocked = !matches!(url.scheme(), "http" | "https")
            || literal_ip(url).is_some_and(is_private_or_reserved)
            || url.host_str().is_some_and(|h| h.eq_ignore_ascii_case("localhost"));
        if blocked {
            attempt.stop()
        } else {
            attempt.follow()
        }
    })
}

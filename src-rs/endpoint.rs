use reqwest::Url;

use crate::error::DashboardError;

/// Maps a page origin onto its live-update endpoint: `https` becomes `wss`,
/// anything else `ws`, host and port are kept as given.
pub fn derive_stream_endpoint(scheme: &str, host: &str) -> String {
    let scheme = scheme.trim_end_matches(':');
    let stream_scheme = if scheme.eq_ignore_ascii_case("https") {
        "wss"
    } else {
        "ws"
    };
    format!("{}://{}", stream_scheme, host)
}

/// Same as [`derive_stream_endpoint`] but starting from a full origin URL such
/// as `https://example.com:8080/`.
pub fn stream_endpoint_for(origin: &str) -> Result<String, DashboardError> {
    let url = Url::parse(origin).map_err(|err| DashboardError::InvalidEndpoint(format!("{origin}: {err}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| DashboardError::InvalidEndpoint(format!("{origin}: missing host")))?;
    let host = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok(derive_stream_endpoint(url.scheme(), &host))
}

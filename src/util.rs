use reqwest::Url;
use std::net::IpAddr;

/// Read an on/off switch from the environment. Unset or unrecognised
/// values count as absent.
pub fn env_switch(name: &str) -> Option<bool> {
    std::env::var(name).ok().as_deref().and_then(parse_switch)
}

pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// True when `url` names this machine: `localhost`, a loopback address or
/// the unspecified address.
pub fn is_local_endpoint_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    match bare.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => bare.eq_ignore_ascii_case("localhost"),
    }
}

/// Path under which the route layer serves a backend file.
pub fn file_path(file_id: &str) -> String {
    format!("/files/{file_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_words() {
        assert_eq!(parse_switch(" On "), Some(true));
        assert_eq!(parse_switch("1"), Some(true));
        assert_eq!(parse_switch("NO"), Some(false));
        assert_eq!(parse_switch(""), None);
        assert_eq!(parse_switch("sometimes"), None);
    }

    #[test]
    fn test_local_endpoints() {
        assert!(is_local_endpoint_url("http://localhost:3000/api/assistants"));
        assert!(is_local_endpoint_url("http://127.0.0.42/api"));
        assert!(is_local_endpoint_url("http://[::1]:3000/api"));
        assert!(is_local_endpoint_url("http://0.0.0.0:3000/api"));
    }

    #[test]
    fn test_remote_endpoints() {
        assert!(!is_local_endpoint_url("https://localhost.example.net/api"));
        assert!(!is_local_endpoint_url("https://10.0.0.5/api"));
        assert!(!is_local_endpoint_url("not a url"));
    }

    #[test]
    fn test_file_path_embeds_id() {
        assert_eq!(file_path("file-abc"), "/files/file-abc");
    }
}

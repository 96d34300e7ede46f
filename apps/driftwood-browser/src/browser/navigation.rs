use super::*;

/// Turns location-bar input into a loadable URL.
///
/// Empty input means "do nothing", not "load the empty URL". Inputs that
/// already carry a scheme pass through untouched, absolute filesystem paths
/// become `file://` URLs, and everything else gets a scheme inferred from
/// whether the host looks like a local network target.
pub(super) fn normalize_input_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains("://") || trimmed.starts_with("about:") {
        return Some(trimmed.to_owned());
    }

    if trimmed.starts_with('/') {
        return Url::from_file_path(trimmed)
            .map(|file_url| file_url.to_string())
            .ok();
    }

    let default_scheme = if is_local_network_input(trimmed) {
        "http"
    } else {
        "https"
    };
    Some(format!("{default_scheme}://{trimmed}"))
}

fn is_local_network_input(input: &str) -> bool {
    let probe = format!("http://{input}");
    let Ok(parsed) = Url::parse(&probe) else {
        return false;
    };
    parsed.host_str().is_some_and(is_local_network_host)
}

fn is_local_network_host(host: &str) -> bool {
    let normalized = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }

    if normalized == "localhost"
        || normalized.ends_with(".localhost")
        || normalized.ends_with(".local")
    {
        return true;
    }

    let Ok(ip) = normalized.parse::<std::net::IpAddr>() else {
        return false;
    };

    match ip {
        std::net::IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        std::net::IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unique_local()
                || v6.is_unicast_link_local()
                || v6.is_unspecified()
        }
    }
}

/// Tab-strip label: the page title cut to a fixed width, or `(Untitled)`.
pub(super) fn tab_display_title(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => truncate_title(title, TAB_TITLE_MAX_CHARS),
        _ => UNTITLED_TAB_TITLE.to_owned(),
    }
}

fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_owned();
    }
    title.chars().take(max_chars).collect()
}

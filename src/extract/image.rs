use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];
const IMAGE_HOST_HINTS: &[&str] = &["img", "image", "pic", "photo", "alicdn", "tbcdn", "jdimg", "360buyimg", "pddpic"];

/// Resolve a possibly relative image reference against the page URL.
pub fn normalize_image_url(src: &str, base_url: &str) -> String {
    let src = src.trim();
    if src.is_empty() { return String::new(); }

    if src.starts_with("//") {
        return format!("https:{}", src);
    }
    if src.starts_with('/') {
        return match Url::parse(base_url) {
            Ok(base) => match base.host_str() {
                Some(host) => match base.port() {
                    Some(port) => format!("{}://{}:{}{}", base.scheme(), host, port, src),
                    None => format!("{}://{}{}", base.scheme(), host, src),
                },
                None => src.to_string(),
            },
            Err(_) => src.to_string(),
        };
    }
    if src.starts_with("http") {
        return src.to_string();
    }

    Url::parse(base_url)
        .and_then(|base| base.join(src))
        .map(|u| u.to_string())
        .unwrap_or_default()
}

/// Heuristic allow-list: a known image extension in the path, or an image/CDN
/// hint in host or path. No request is made to confirm the content type.
pub fn is_image_url(candidate: &str) -> bool {
    if candidate.trim().is_empty() { return false; }
    let Ok(url) = Url::parse(candidate.trim()) else { return false };
    if !matches!(url.scheme(), "http" | "https") { return false; }

    let path = url.path().to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| path.contains(ext)) {
        return true;
    }

    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    IMAGE_HOST_HINTS.iter().any(|hint| host.contains(hint) || path.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            normalize_image_url("//cdn.example.com/a.jpg", "https://taobao.com/x"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn root_relative_uses_base_host() {
        assert_eq!(normalize_image_url("/img/a.png", "https://jd.com/item/1"), "https://jd.com/img/a.png");
        assert_eq!(
            normalize_image_url("/a.png", "http://localhost:8080/p/1"),
            "http://localhost:8080/a.png"
        );
    }

    #[test]
    fn absolute_is_untouched_and_relative_is_joined() {
        assert_eq!(normalize_image_url("http://x.com/a.gif", "https://jd.com/"), "http://x.com/a.gif");
        assert_eq!(
            normalize_image_url("pics/b.webp", "https://shop.example.com/items/42.html"),
            "https://shop.example.com/items/pics/b.webp"
        );
        assert_eq!(normalize_image_url("  ", "https://jd.com/"), "");
    }

    #[test]
    fn validator_allow_list() {
        assert!(is_image_url("https://img.alicdn.com/x"));
        assert!(is_image_url("https://shop.example.com/assets/a.JPG"));
        assert!(is_image_url("https://cdn.example.com/photo/123"));
        assert!(!is_image_url("https://example.com/page"));
        assert!(!is_image_url(""));
        assert!(!is_image_url("data:image/png;base64,AAAA"));
    }
}

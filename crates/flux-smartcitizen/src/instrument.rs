/// 请求耗时直方图的桶（秒）
pub const REQUEST_DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// 将 URL 路径归约为逻辑端点名
///
/// `/v0` -> `ping`，`/v0/me` -> `me`，`/v0/devices/123` -> `devices`
pub fn extract_endpoint(path: &str) -> String {
    path.split('/')
        .find(|part| !part.is_empty() && !is_version_prefix(part))
        .unwrap_or("ping")
        .to_string()
}

/// 状态码分类
pub fn status_category(code: u16) -> &'static str {
    match code {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500.. => "5xx",
        _ => "other",
    }
}

fn is_version_prefix(part: &str) -> bool {
    part.len() > 1
        && part.starts_with('v')
        && part[1..].chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_endpoint() {
        assert_eq!(extract_endpoint("/v0"), "ping");
        assert_eq!(extract_endpoint("/v0/"), "ping");
        assert_eq!(extract_endpoint("/v0/me"), "me");
        assert_eq!(extract_endpoint("/v0/devices/16549"), "devices");
        assert_eq!(extract_endpoint("/v0/sessions"), "sessions");
        assert_eq!(extract_endpoint("/videos"), "videos");
    }

    #[test]
    fn test_status_category() {
        assert_eq!(status_category(200), "2xx");
        assert_eq!(status_category(204), "2xx");
        assert_eq!(status_category(302), "other");
        assert_eq!(status_category(404), "4xx");
        assert_eq!(status_category(503), "5xx");
    }
}

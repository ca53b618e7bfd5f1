//! URL Templates
//!
//! Expands `{model}` placeholders and rewrites schemes for realtime endpoints.

/// Placeholder substituted with the request's model id
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// Replace every `{model}` in the template.
///
/// Without a model (or with an empty one) the template is returned unexpanded.
pub fn resolve(template: &str, model: Option<&str>) -> String {
    match model {
        Some(model) if !model.is_empty() => template.replace(MODEL_PLACEHOLDER, model),
        _ => template.to_string(),
    }
}

/// Rewrite `https://` to `wss://` and `http://` to `ws://`.
pub fn scheme_for_realtime(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model() {
        assert_eq!(
            resolve("https://api.example.com/{model}/v1", Some("gpt-4o")),
            "https://api.example.com/gpt-4o/v1"
        );
        assert_eq!(
            resolve("https://x/{model}/{model}", Some("m")),
            "https://x/m/m"
        );
    }

    #[test]
    fn test_resolve_without_model() {
        let template = "https://api.example.com/{model}/v1";
        assert_eq!(resolve(template, None), template);
        assert_eq!(resolve(template, Some("")), template);
    }

    #[test]
    fn test_resolve_idempotent() {
        let once = resolve("https://api.example.com/{model}/v1", Some("gpt-4o"));
        assert_eq!(resolve(&once, Some("gpt-4o")), once);
    }

    #[test]
    fn test_scheme_for_realtime() {
        assert_eq!(scheme_for_realtime("https://x/v1/realtime"), "wss://x/v1/realtime");
        assert_eq!(scheme_for_realtime("http://x/v1/realtime"), "ws://x/v1/realtime");
        assert_eq!(scheme_for_realtime("wss://x/v1/realtime"), "wss://x/v1/realtime");
        assert_eq!(scheme_for_realtime("ftp://x"), "ftp://x");

        let once = scheme_for_realtime("https://x/v1/realtime");
        assert_eq!(scheme_for_realtime(&once), once);
    }
}

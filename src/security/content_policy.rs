//! Content-Security-Policy for the main window session

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_SECURITY_POLICY};
use url::Url;

use crate::config::ConfigError;

/// Directives that do not depend on deployment.
/// `connect-src` is inserted after these with the backend origin.
const STATIC_DIRECTIVES: &[(&str, &str)] = &[
    ("default-src", "'self'"),
    ("script-src", "'self' 'unsafe-inline'"),
    ("style-src", "'self' 'unsafe-inline'"),
    ("img-src", "'self' data:"),
];

const TRAILING_DIRECTIVES: &[(&str, &str)] = &[
    ("font-src", "'self'"),
    ("object-src", "'none'"),
    ("base-uri", "'self'"),
    ("form-action", "'self'"),
    ("frame-ancestors", "'none'"),
];

/// The policy string is built once per window and never changes afterwards.
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    value: String,
    header: HeaderValue,
}

impl ContentPolicy {
    /// Build the policy allowing connections to `api_base_url`'s origin.
    pub fn build(api_base_url: &str) -> Result<Self, ConfigError> {
        let api = Url::parse(api_base_url).map_err(|e| ConfigError::Invalid {
            key: "api_base_url".to_string(),
            reason: e.to_string(),
        })?;
        let connect_origin = api.origin().ascii_serialization();

        let mut directives: Vec<String> = STATIC_DIRECTIVES
            .iter()
            .map(|(name, value)| format!("{} {}", name, value))
            .collect();
        directives.push(format!("connect-src 'self' {}", connect_origin));
        directives.extend(
            TRAILING_DIRECTIVES
                .iter()
                .map(|(name, value)| format!("{} {}", name, value)),
        );
        directives.push("upgrade-insecure-requests".to_string());

        let value = format!("{};", directives.join("; "));
        let header = HeaderValue::from_str(&value).map_err(|e| ConfigError::Invalid {
            key: "content_security_policy".to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(policy = %value, "Built content security policy");
        Ok(Self { value, header })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Value of a single directive, e.g. `directive("img-src") == Some("'self' data:")`
    pub fn directive(&self, name: &str) -> Option<&str> {
        self.value
            .trim_end_matches(';')
            .split("; ")
            .find_map(|d| {
                let (n, rest) = d.split_once(' ').unwrap_or((d, ""));
                (n == name).then_some(rest)
            })
    }

    /// Attach the policy to a response, replacing whatever the server sent.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(CONTENT_SECURITY_POLICY, self.header.clone());
    }

    /// The policy as a `<meta http-equiv>` may carry it. Browsers ignore
    /// `frame-ancestors` in meta tags, so it is left out.
    pub fn meta_value(&self) -> String {
        let directives: Vec<&str> = self
            .value
            .trim_end_matches(';')
            .split("; ")
            .filter(|d| !META_UNSUPPORTED.iter().any(|name| d.split(' ').next() == Some(*name)))
            .collect();
        format!("{};", directives.join("; "))
    }

    /// Document-start script that installs the policy as the first element
    /// of `<head>`. Used for pages whose responses the runtime cannot rewrite,
    /// such as a frontend dev server.
    pub fn meta_installer_script(&self) -> String {
        let policy = serde_json::Value::String(self.meta_value());
        format!(
            r#"(function () {{
  var policy = {policy};
  function install() {{
    if (!document.head) return false;
    if (document.head.querySelector('meta[http-equiv="Content-Security-Policy"][data-shell-policy]')) return true;
    var meta = document.createElement('meta');
    meta.httpEquiv = 'Content-Security-Policy';
    meta.content = policy;
    meta.setAttribute('data-shell-policy', '');
    document.head.prepend(meta);
    return true;
  }}
  if (!install()) {{
    var observer = new MutationObserver(function () {{
      if (install()) observer.disconnect();
    }});
    observer.observe(document, {{ childList: true, subtree: true }});
  }}
}})();"#
        )
    }
}

/// Directives with no effect when delivered through a meta tag
const META_UNSUPPORTED: &[&str] = &["frame-ancestors", "report-uri", "sandbox"];

/// Trusted-domain list consulted before any detector runs; a hit bypasses
/// the whole engine.
#[derive(Debug, Clone)]
pub struct Whitelist {
    exact: Vec<String>,
    suffixes: Vec<String>,
}

impl Whitelist {
    pub fn new(domains: &[String], suffixes: &[String]) -> Self {
        Self {
            exact: domains.iter().map(|d| d.to_lowercase()).collect(),
            suffixes: suffixes.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    pub fn is_listed(&self, hostname: &str) -> bool {
        let hostname = hostname.to_lowercase();
        if self.exact.iter().any(|d| *d == hostname) {
            return true;
        }
        self.suffixes
            .iter()
            .any(|s| hostname.ends_with(&format!(".{}", s)))
    }
}

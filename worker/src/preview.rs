use async_trait::async_trait;

// Must match the deployment platform's branch-alias rule exactly or probes
// will target the wrong host.
pub const SLUG_MAX_LEN: usize = 28;

pub fn branch_slug(branch_ref: &str) -> String {
    let mut slug = branch_ref.replace('/', "-").to_lowercase();
    if slug.len() > SLUG_MAX_LEN {
        let mut end = SLUG_MAX_LEN;
        while !slug.is_char_boundary(end) {
            end -= 1;
        }
        slug.truncate(end);
    }
    slug
}

pub fn preview_url(branch_ref: &str, domain: &str) -> String {
    format!("https://{}.{}", branch_slug(branch_ref), domain)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewProbe {
    pub url: String,
    pub ready: bool,
}

#[async_trait]
pub trait PreviewProber: Send + Sync {
    async fn probe(&self, branch_ref: &str) -> PreviewProbe;
}

pub struct HttpProber {
    http: reqwest::Client,
    domain: String,
}

impl HttpProber {
    pub fn new(domain: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            domain: domain.to_string(),
        }
    }
}

#[async_trait]
impl PreviewProber for HttpProber {
    // A probe failure of any kind is a "not ready" signal, never an error.
    async fn probe(&self, branch_ref: &str) -> PreviewProbe {
        let url = preview_url(branch_ref, &self.domain);
        let ready = match self.http.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        };
        PreviewProbe { url, ready }
    }
}

#[cfg(test)]
mod tests {
    use super::{branch_slug, preview_url, SLUG_MAX_LEN};

    #[test]
    fn slug_lowercases_and_replaces_path_separators() {
        assert_eq!(branch_slug("copilot/Fix-42"), "copilot-fix-42");
        assert_eq!(branch_slug("a/b/c"), "a-b-c");
    }

    #[test]
    fn slug_never_exceeds_max_length() {
        let cases = [
            "copilot/fix-42",
            "copilot/add-a-very-long-footer-description-branch",
            "x/y/z/deeply/nested/branch/name/here",
            "Ünïcode/branch-näme-that-is-long-enough-to-truncate",
        ];
        for case in cases {
            let slug = branch_slug(case);
            assert!(slug.len() <= SLUG_MAX_LEN, "slug too long for {case:?}");
            assert!(!slug.contains('/'));
            assert_eq!(slug, slug.to_lowercase());
        }
    }

    #[test]
    fn slug_truncation_respects_char_boundaries() {
        let branch = "ééééééééééééééééééééééééééé";
        let slug = branch_slug(branch);
        assert!(slug.len() <= SLUG_MAX_LEN);
        assert!(slug.chars().all(|c| c == 'é'));
    }

    #[test]
    fn preview_url_uses_slug_and_domain() {
        assert_eq!(
            preview_url("copilot/fix-42", "site.pages.dev"),
            "https://copilot-fix-42.site.pages.dev"
        );
    }
}

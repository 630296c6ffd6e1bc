//! Institutional email policy.

/// Restricts registration to one organisation's mail domain (and its
/// subdomains).
#[derive(Debug, Clone)]
pub struct EmailPolicy {
    domain: String,
}

impl EmailPolicy {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain: String = domain.into();
        Self {
            domain: domain.trim().trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn permits(&self, email: &str) -> bool {
        let Some((local, host)) = email.split_once('@') else {
            return false;
        };
        if local.is_empty() || host.contains('@') || self.domain.is_empty() {
            return false;
        }

        let host = host.to_ascii_lowercase();
        if host == self.domain {
            return true;
        }
        host.strip_suffix(&self.domain)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .is_some_and(|sub| !sub.is_empty() && !sub.ends_with('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> EmailPolicy {
        EmailPolicy::new("ku.edu.np")
    }

    #[test]
    fn test_institutional_domain_accepted() {
        assert!(policy().permits("student@ku.edu.np"));
        assert!(policy().permits("student@cs.ku.edu.np"));
        assert!(policy().permits("Student@KU.EDU.NP"));
    }

    #[test]
    fn test_other_domains_rejected() {
        assert!(!policy().permits("student@gmail.com"));
        assert!(!policy().permits("student@evilku.edu.np"));
        assert!(!policy().permits("student@ku.edu.np.evil.com"));
        assert!(!policy().permits("student@.ku.edu.np"));
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        assert!(!policy().permits("ku.edu.np"));
        assert!(!policy().permits("@ku.edu.np"));
        assert!(!policy().permits("a@b@ku.edu.np"));
        assert!(!policy().permits(""));
    }

    #[test]
    fn test_leading_dot_in_configured_domain_ignored() {
        let policy = EmailPolicy::new(".ku.edu.np");
        assert_eq!(policy.domain(), "ku.edu.np");
        assert!(policy.permits("student@ku.edu.np"));
    }
}

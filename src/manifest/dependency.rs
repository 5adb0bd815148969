use std::fmt;

/// One `DependsOn` token, e.g. `LibAddonMenu-2.0>=30`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRef {
    /// Folder name of the required add-on, or a direct URL
    pub name: String,
    /// Minimum add-on version, informational only
    pub min_version: Option<String>,
}

impl DependencyRef {
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if is_url(token) {
            return Self {
                name: token.to_string(),
                min_version: None,
            };
        }

        match token.split_once(">=") {
            Some((name, version)) if !version.is_empty() => Self {
                name: name.to_string(),
                min_version: Some(version.to_string()),
            },
            Some((name, _)) => Self {
                name: name.to_string(),
                min_version: None,
            },
            None => Self {
                name: token.to_string(),
                min_version: None,
            },
        }
    }

    pub fn is_url(&self) -> bool {
        is_url(&self.name)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.min_version {
            Some(version) => write!(f, "{}>={}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

pub(crate) fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_name() {
        let dep = DependencyRef::parse("LibStub");
        assert_eq!(dep.name, "LibStub");
        assert_eq!(dep.min_version, None);
        assert!(!dep.is_url());
    }

    #[test]
    fn test_parse_with_min_version() {
        let dep = DependencyRef::parse("LibAddonMenu-2.0>=30");
        assert_eq!(dep.name, "LibAddonMenu-2.0");
        assert_eq!(dep.min_version.as_deref(), Some("30"));
        assert_eq!(dep.to_string(), "LibAddonMenu-2.0>=30");
    }

    #[test]
    fn test_parse_dangling_constraint() {
        let dep = DependencyRef::parse("LibStub>=");
        assert_eq!(dep.name, "LibStub");
        assert_eq!(dep.min_version, None);
    }

    #[test]
    fn test_parse_url_is_kept_whole() {
        let dep = DependencyRef::parse("https://cdn.example.com/get?a>=1");
        assert!(dep.is_url());
        assert_eq!(dep.name, "https://cdn.example.com/get?a>=1");
        assert_eq!(dep.min_version, None);
    }
}

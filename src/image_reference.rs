use std::fmt;

/// An image composed from a repository, an image name and a tag.
///
/// Displays as `repository/name:tag`. The first two are joined and cleaned
/// like slash-separated paths: empty and `.` segments are dropped, `..`
/// removes the segment before it, and a leading `/` is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference {
    pub repository: String,
    pub name: String,
    pub tag: String,
}

impl ImageReference {
    pub fn new(repository: &str, name: &str, tag: &str) -> Self {
        Self {
            repository: repository.to_string(),
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }

    /// `repository` and `name` joined into a cleaned path.
    pub fn path(&self) -> String {
        let joined = [self.repository.as_str(), self.name.as_str()]
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() {
            return joined;
        }

        let rooted = joined.starts_with('/');
        let mut parts: Vec<&str> = Vec::new();
        for part in joined.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if parts.last().is_some_and(|last| *last != "..") {
                        parts.pop();
                    } else if !rooted {
                        // relative paths keep leading `..`
                        parts.push(part);
                    }
                }
                _ => parts.push(part),
            }
        }

        let cleaned = parts.join("/");
        if rooted {
            format!("/{}", cleaned)
        } else if cleaned.is_empty() {
            ".".to_string()
        } else {
            cleaned
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path(), self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let reference = ImageReference::new("docker.io/opensearchproject", "opensearch", "2.11.0");
        assert_eq!(
            reference.to_string(),
            "docker.io/opensearchproject/opensearch:2.11.0"
        );
    }

    #[test]
    fn test_trailing_slash_on_repository() {
        let reference = ImageReference::new("registry.local/mirror/", "busybox", "1.27.2-buildx");
        assert_eq!(reference.to_string(), "registry.local/mirror/busybox:1.27.2-buildx");
    }

    #[test]
    fn test_empty_repository() {
        let reference = ImageReference::new("", "opensearch", "1.3.0");
        assert_eq!(reference.to_string(), "opensearch:1.3.0");
    }

    #[test]
    fn test_dot_segments_are_resolved() {
        let reference = ImageReference::new("reg/./m/../x", "opensearch", "2.11.0");
        assert_eq!(reference.to_string(), "reg/x/opensearch:2.11.0");

        let reference = ImageReference::new("a/../../b", "opensearch", "2.11.0");
        assert_eq!(reference.to_string(), "../b/opensearch:2.11.0");
    }

    #[test]
    fn test_leading_slash_is_kept() {
        let reference = ImageReference::new("/reg/./m/../x", "opensearch", "2.11.0");
        assert_eq!(reference.to_string(), "/reg/x/opensearch:2.11.0");

        let reference = ImageReference::new("/../reg", "opensearch", "2.11.0");
        assert_eq!(reference.to_string(), "/reg/opensearch:2.11.0");
    }

    #[test]
    fn test_empty_tag_passes_through() {
        let reference = ImageReference::new("repo", "opensearch-dashboards", "");
        assert_eq!(reference.to_string(), "repo/opensearch-dashboards:");
    }
}

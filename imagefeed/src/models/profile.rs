use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: String,
    pub bio: Option<String>,
}

impl Profile {
    pub fn new(
        username: String,
        first_name: Option<String>,
        last_name: Option<String>,
        bio: Option<String>,
    ) -> Self {
        let display_name = display_name(first_name.as_deref(), last_name.as_deref());
        Self {
            username,
            first_name,
            last_name,
            display_name,
            bio,
        }
    }

    pub fn login_name(&self) -> String {
        format!("@{}", self.username)
    }
}

// absent or blank parts are left out, no placeholder
fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_joins_present_parts() {
        let p = Profile::new("jd".into(), Some("John".into()), Some("Doe".into()), None);
        assert_eq!(p.display_name, "John Doe");

        let p = Profile::new("jd".into(), Some("John".into()), None, None);
        assert_eq!(p.display_name, "John");

        let p = Profile::new("jd".into(), None, Some("Doe".into()), None);
        assert_eq!(p.display_name, "Doe");

        let p = Profile::new("jd".into(), None, None, None);
        assert_eq!(p.display_name, "");

        let p = Profile::new("jd".into(), Some("John".into()), Some("  ".into()), None);
        assert_eq!(p.display_name, "John");
    }

    #[test]
    fn test_login_name() {
        let p = Profile::new("ekaterina_nov".into(), None, None, None);
        assert_eq!(p.login_name(), "@ekaterina_nov");
    }
}

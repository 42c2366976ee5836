use std::collections::{HashMap, HashSet};

/// Marks a resource whose form submission must be checked against the
/// credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteTag {
    Register,
    Login,
}

impl RouteTag {
    pub fn is_login(self) -> bool {
        matches!(self, RouteTag::Login)
    }
}

/// Immutable resource routing configuration shared by every parser.
///
/// Built once at startup and handed to parsers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    index_page: String,
    default_html: HashSet<String>,
    tags: HashMap<String, RouteTag>,
    success_page: String,
    failure_page: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
            .default_html([
                "/index",
                "/register",
                "/login",
                "/welcome",
                "/video",
                "/picture",
            ])
            .tag("/register.html", RouteTag::Register)
            .tag("/login.html", RouteTag::Login)
    }
}

impl RouteTable {
    /// Empty table: only `/` maps to `/index.html`, nothing is tagged.
    pub fn new() -> Self {
        Self {
            index_page: "/index.html".into(),
            default_html: HashSet::new(),
            tags: HashMap::new(),
            success_page: "/welcome.html".into(),
            failure_page: "/error.html".into(),
        }
    }

    /// Adds shortcut names that resolve to `<name>.html`.
    pub fn default_html<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_html.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn tag(mut self, resource: impl Into<String>, tag: RouteTag) -> Self {
        self.tags.insert(resource.into(), tag);
        self
    }

    pub fn index_page(mut self, page: impl Into<String>) -> Self {
        self.index_page = page.into();
        self
    }

    /// Pages a verified form submission is redirected to.
    pub fn verification_pages(
        mut self,
        success: impl Into<String>,
        failure: impl Into<String>,
    ) -> Self {
        self.success_page = success.into();
        self.failure_page = failure.into();
        self
    }

    /// Maps a raw request path to the resource it names.
    pub fn resolve(&self, path: &str) -> String {
        if path.is_empty() || path == "/" {
            self.index_page.clone()
        } else if self.default_html.contains(path) {
            format!("{path}.html")
        } else {
            path.to_owned()
        }
    }

    pub fn tag_of(&self, resource: &str) -> Option<RouteTag> {
        self.tags.get(resource).copied()
    }

    pub fn verification_page(&self, verified: bool) -> &str {
        if verified {
            &self.success_page
        } else {
            &self.failure_page
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_index_and_shortcuts() {
        let routes = RouteTable::default();
        assert_eq!(routes.resolve(""), "/index.html");
        assert_eq!(routes.resolve("/"), "/index.html");
        assert_eq!(routes.resolve("/login"), "/login.html");
        assert_eq!(routes.resolve("/picture"), "/picture.html");
        assert_eq!(routes.resolve("/style.css"), "/style.css");
    }

    #[test]
    fn tags_login_and_register() {
        let routes = RouteTable::default();
        assert_eq!(routes.tag_of("/login.html"), Some(RouteTag::Login));
        assert_eq!(routes.tag_of("/register.html"), Some(RouteTag::Register));
        assert_eq!(routes.tag_of("/login"), None);
        assert!(RouteTag::Login.is_login());
        assert!(!RouteTag::Register.is_login());
    }

    #[test]
    fn custom_table() {
        let routes = RouteTable::new()
            .index_page("/home.html")
            .default_html(["/signin"])
            .tag("/signin.html", RouteTag::Login)
            .verification_pages("/ok.html", "/denied.html");

        assert_eq!(routes.resolve("/"), "/home.html");
        assert_eq!(routes.resolve("/signin"), "/signin.html");
        assert_eq!(routes.resolve("/login"), "/login");
        assert_eq!(routes.tag_of("/signin.html"), Some(RouteTag::Login));
        assert_eq!(routes.verification_page(true), "/ok.html");
        assert_eq!(routes.verification_page(false), "/denied.html");
    }
}

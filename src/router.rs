//! Navigation between the two viewer pages
//!
//! | path        | name       | page                          |
//! |-------------|------------|-------------------------------|
//! | `/`         |            | redirects to `/3dModel`       |
//! | `/3dModel`  | `3dModel`  | [`View::ModelViewer`]         |
//! | `/360house` | `house360` | [`View::PanoramaViewer`]      |
//!
//! The panorama page also answers to its older name `全景看房` in
//! [`Router::path_of`].
//!
//! Paths may carry a base prefix (for example `/viewer/3dModel`), which is
//! stripped before matching and added back by [`Router::href`].

use crate::error::{Result, ViewerError};

/// A page the application can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    ModelViewer,
    PanoramaViewer,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::ModelViewer => "3D Model",
            View::PanoramaViewer => "360° House",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Redirect(&'static str),
    Page(View),
}

#[derive(Debug, Clone)]
struct RouteRecord {
    path: &'static str,
    name: Option<&'static str>,
    aliases: &'static [&'static str],
    target: Target,
}

/// Where a path ended up after redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Path without the base prefix
    pub path: String,
    pub name: Option<&'static str>,
    pub view: View,
}

/// History-based router with the application's fixed route table
#[derive(Debug, Clone)]
pub struct Router {
    base: String,
    routes: Vec<RouteRecord>,
    history: Vec<ResolvedRoute>,
}

const MAX_REDIRECTS: usize = 8;

impl Default for Router {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Router {
    pub fn new(base: &str) -> Self {
        Self {
            base: normalize_base(base),
            routes: vec![
                RouteRecord {
                    path: "/",
                    name: None,
                    aliases: &[],
                    target: Target::Redirect("/3dModel"),
                },
                RouteRecord {
                    path: "/3dModel",
                    name: Some("3dModel"),
                    aliases: &[],
                    target: Target::Page(View::ModelViewer),
                },
                RouteRecord {
                    path: "/360house",
                    name: Some("house360"),
                    aliases: &["全景看房"],
                    target: Target::Page(View::PanoramaViewer),
                },
            ],
            history: Vec::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Matches `path`, following redirects
    ///
    /// # Errors
    /// [`ViewerError::RouteNotFound`] if nothing matches.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute> {
        let mut current = self.strip_base(path);

        for _ in 0..MAX_REDIRECTS {
            let record = self
                .routes
                .iter()
                .find(|route| route.path == current)
                .ok_or_else(|| ViewerError::RouteNotFound(path.to_string()))?;

            match record.target {
                Target::Redirect(to) => {
                    log::debug!("redirect {current} -> {to}");
                    current = to.to_string();
                }
                Target::Page(view) => {
                    return Ok(ResolvedRoute {
                        path: current,
                        name: record.name,
                        view,
                    })
                }
            }
        }
        Err(ViewerError::RouteNotFound(path.to_string()))
    }

    /// Path of the route called `name`
    pub fn path_of(&self, name: &str) -> Result<&'static str> {
        self.routes
            .iter()
            .find(|route| {
                route.name == Some(name) || route.aliases.iter().any(|alias| *alias == name)
            })
            .map(|route| route.path)
            .ok_or_else(|| ViewerError::RouteNotFound(name.to_string()))
    }

    /// Navigates to `path` and returns where it landed. History is left
    /// alone when the path does not match.
    pub fn push(&mut self, path: &str) -> Result<&ResolvedRoute> {
        let route = self.resolve(path)?;
        log::info!("navigate to {}", route.path);
        self.history.push(route);
        Ok(&self.history[self.history.len() - 1])
    }

    pub fn push_named(&mut self, name: &str) -> Result<&ResolvedRoute> {
        let path = self.path_of(name)?;
        self.push(path)
    }

    /// Returns to the previous entry. The first entry is never popped.
    pub fn back(&mut self) -> Option<&ResolvedRoute> {
        if self.history.len() > 1 {
            self.history.pop();
        }
        self.history.last()
    }

    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.history.last()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Full path including the base prefix
    pub fn href(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}{}", self.base, path)
    }

    fn strip_base(&self, path: &str) -> String {
        let stripped = path
            .strip_prefix(self.base.as_str())
            .or_else(|| path.strip_prefix(self.base.trim_end_matches('/')))
            .unwrap_or(path);
        let trimmed = stripped.trim_end_matches('/');
        format!("/{}", trimmed.trim_start_matches('/'))
    }
}

/// Always starts and ends with a slash
fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_redirects_to_model_viewer() {
        let router = Router::default();
        let route = router.resolve("/").unwrap();

        assert_eq!(route.path, "/3dModel");
        assert_eq!(route.name, Some("3dModel"));
        assert_eq!(route.view, View::ModelViewer);
    }

    #[test]
    fn panorama_route_resolves_by_path_and_name() {
        let router = Router::default();
        assert_eq!(router.resolve("/360house").unwrap().view, View::PanoramaViewer);
        assert_eq!(router.path_of("house360").unwrap(), "/360house");
        assert_eq!(router.path_of("全景看房").unwrap(), "/360house");
    }

    #[test]
    fn unknown_paths_and_names_are_errors() {
        let mut router = Router::default();

        assert!(matches!(
            router.resolve("/nowhere"),
            Err(ViewerError::RouteNotFound(path)) if path == "/nowhere"
        ));
        assert!(router.path_of("missing").is_err());
        assert!(router.push("/nowhere").is_err());
        assert_eq!(router.history_len(), 0);
    }

    #[test]
    fn base_path_is_stripped_and_restored() {
        let router = Router::new("viewer");
        assert_eq!(router.base(), "/viewer/");

        assert_eq!(router.resolve("/viewer/360house").unwrap().path, "/360house");
        assert_eq!(router.resolve("/viewer").unwrap().path, "/3dModel");
        assert_eq!(router.resolve("/viewer/").unwrap().path, "/3dModel");
        assert_eq!(router.href("/360house"), "/viewer/360house");
    }

    #[test]
    fn push_and_back_walk_history() {
        let mut router = Router::default();
        router.push("/").unwrap();
        router.push_named("house360").unwrap();
        assert_eq!(router.current().unwrap().view, View::PanoramaViewer);

        let previous = router.back().unwrap();
        assert_eq!(previous.view, View::ModelViewer);

        // The first entry stays
        assert_eq!(router.back().unwrap().path, "/3dModel");
        assert_eq!(router.history_len(), 1);
    }
}

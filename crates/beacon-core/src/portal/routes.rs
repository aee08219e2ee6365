use crate::{config::AdminPrefix, defaults::routes};

/// Administration routes below the admin prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRoute {
    /// The bare prefix: configuration form
    Home,
    Save,
    Reset,
    Stylesheet,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Captive landing page, for everything outside the admin prefix
    Landing,
    Admin(AdminRoute),
}

/// Map a request path, without query string, to a route.
///
/// After the prefix has moved, the administration route names under the
/// factory prefix are not found rather than taken for captive traffic. Every
/// other path outside the prefix is the landing page.
pub fn resolve(prefix: &AdminPrefix, path: &str) -> Route {
    let Some(rest) = prefix.strip(path) else {
        let stale = AdminPrefix::default()
            .strip(path)
            .is_some_and(is_admin_name);
        return if stale {
            Route::Admin(AdminRoute::NotFound)
        } else {
            Route::Landing
        };
    };

    Route::Admin(match rest {
        "" => AdminRoute::Home,
        routes::SAVE => AdminRoute::Save,
        routes::RESET => AdminRoute::Reset,
        routes::STYLESHEET => AdminRoute::Stylesheet,
        _ => AdminRoute::NotFound,
    })
}

fn is_admin_name(name: &str) -> bool {
    matches!(name, routes::SAVE | routes::RESET | routes::STYLESHEET)
}

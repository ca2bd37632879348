use super::session::Session;
use super::{Directory, Permissions, Role};
use grdlhub_shared::account::handle::AccessView;

/// Every page the application knows. Admins implicitly hold all of them.
pub const KNOWN_PAGES: &[&str] = &[
    "home",
    "content",
    "users",
    "translations",
    "settings",
    "availability",
    "availability-tracker",
];

/// A navigation link, keyed by the page it leads to.
pub struct NavLink {
    pub page: &'static str,
    pub requires_auth: bool,
}

pub const NAV_LINKS: &[NavLink] = &[
    NavLink {
        page: "home",
        requires_auth: true,
    },
    NavLink {
        page: "content",
        requires_auth: true,
    },
    NavLink {
        page: "users",
        requires_auth: true,
    },
    NavLink {
        page: "translations",
        requires_auth: true,
    },
    NavLink {
        page: "settings",
        requires_auth: true,
    },
    NavLink {
        page: "availability",
        requires_auth: true,
    },
    NavLink {
        page: "availability-tracker",
        requires_auth: true,
    },
];

/// Dashboard cards, keyed by the page each one opens.
pub const DASHBOARD_CARDS: &[&str] = &[
    "content",
    "users",
    "translations",
    "settings",
    "availability",
    "availability-tracker",
];

/// Resolve the permission set of an arbitrary user, bypassing any session
/// cache.
///
/// An administrator gets every known page no matter what the stored list
/// says; anyone else gets the stored list verbatim, stale ids included
/// (they never match a real page). Lookup failures resolve to no access.
pub fn permissions_of(directory: &Directory, account_id: u64) -> Permissions {
    match directory.user(account_id) {
        Ok(Some(user)) => {
            if user.role == Role::Admin {
                KNOWN_PAGES.iter().map(|page| page.to_string()).collect()
            } else {
                user.permissions
            }
        }
        _ => Vec::new(),
    }
}

/// Resolve the permission set of the identity behind a session, memoizing
/// the result on the session.
pub fn permissions_for_session(directory: &Directory, session: &Session) -> Permissions {
    if let Some(permissions) = session.cached_permissions() {
        return permissions;
    }
    let permissions = permissions_of(directory, session.identity.account_id);
    session.cache_permissions(permissions.clone());
    permissions
}

/// Direct role lookup. Lookup failures resolve to `None`.
pub fn role_of(directory: &Directory, account_id: u64) -> Option<Role> {
    match directory.user(account_id) {
        Ok(Some(user)) => Some(user.role),
        _ => None,
    }
}

/// Whether the user holds the admin role. Never consults a cache.
pub fn is_admin(directory: &Directory, account_id: u64) -> bool {
    role_of(directory, account_id) == Some(Role::Admin)
}

/// Whether a permission set grants a page.
///
/// A page id of the form `parent-child` is also granted when `parent`
/// itself is granted.
pub fn has_page_access(permissions: &[String], page: &str) -> bool {
    permissions.iter().any(|p| p == page)
        || page
            .split_once('-')
            .map_or(false, |(parent, _)| permissions.iter().any(|p| p == parent))
}

/// Project which navigation links a context may see.
///
/// With no session every gated link is hidden and the view is marked
/// unauthenticated. Pure projection, safe to call repeatedly.
pub fn filter_navigation(directory: &Directory, session: Option<&Session>) -> AccessView {
    match session {
        None => AccessView {
            authenticated: false,
            visible: NAV_LINKS
                .iter()
                .filter(|link| !link.requires_auth)
                .map(|link| link.page.to_string())
                .collect(),
        },
        Some(session) => {
            let permissions = permissions_for_session(directory, session);
            AccessView {
                authenticated: true,
                visible: NAV_LINKS
                    .iter()
                    .filter(|link| {
                        !link.requires_auth || has_page_access(&permissions, link.page)
                    })
                    .map(|link| link.page.to_string())
                    .collect(),
            }
        }
    }
}

/// Project which dashboard cards a context may see.
pub fn filter_dashboard(directory: &Directory, session: Option<&Session>) -> AccessView {
    match session {
        None => AccessView {
            authenticated: false,
            visible: Vec::new(),
        },
        Some(session) => {
            let permissions = permissions_for_session(directory, session);
            AccessView {
                authenticated: true,
                visible: DASHBOARD_CARDS
                    .iter()
                    .filter(|page| has_page_access(&permissions, page))
                    .map(|page| page.to_string())
                    .collect(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn page_access_is_exact_membership() {
        let permissions = perms(&["home", "content"]);
        assert!(has_page_access(&permissions, "home"));
        assert!(has_page_access(&permissions, "content"));
        assert!(!has_page_access(&permissions, "users"));
    }

    #[test]
    fn child_page_inherits_from_parent() {
        let permissions = perms(&["availability"]);
        assert!(has_page_access(&permissions, "availability-tracker"));
        assert!(!has_page_access(&permissions, "translations"));
    }

    #[test]
    fn unknown_grants_never_match() {
        let permissions = perms(&["posters", "home"]);
        assert!(has_page_access(&permissions, "home"));
        for page in DASHBOARD_CARDS {
            assert!(!has_page_access(&permissions, page));
        }
    }

    #[test]
    fn every_nav_link_is_a_known_page() {
        for link in NAV_LINKS {
            assert!(KNOWN_PAGES.contains(&link.page));
        }
        for page in DASHBOARD_CARDS {
            assert!(KNOWN_PAGES.contains(page));
        }
    }
}

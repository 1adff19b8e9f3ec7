use serde::Serialize;

use crate::auth::Role;

/// Entry of the dashboard side navigation
#[derive(Debug, Clone)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    /// Empty means every staff role
    pub roles: &'static [Role],
}

/// Navigation link as rendered in the layout
#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

const USER_ADMINS: &[Role] = &[Role::SpAdmin, Role::Admin];

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem { label: "Tableau de bord", href: "/dashboard", roles: &[] },
    NavItem { label: "Participants", href: "/dashboard/participants", roles: &[] },
    NavItem { label: "Utilisateurs système", href: "/dashboard/users", roles: USER_ADMINS },
    NavItem { label: "Visites de Pages", href: "/dashboard/page-visits", roles: &[] },
    NavItem { label: "Vidéos Regardées", href: "/dashboard/video-watches", roles: &[] },
];

impl NavItem {
    pub fn allows(&self, role: &Role) -> bool {
        role.is_staff() && (self.roles.is_empty() || self.roles.contains(role))
    }
}

fn matches(path: &str, href: &str) -> bool {
    path == href || path.strip_prefix(href).is_some_and(|rest| rest.starts_with('/'))
}

/// Links visible to `role`, the one owning `path` marked active
pub fn visible_for(role: &Role, path: &str) -> Vec<NavLink> {
    let active = owner(path).map(|item| item.href);
    NAV_ITEMS
        .iter()
        .filter(|item| item.allows(role))
        .map(|item| NavLink {
            label: item.label,
            href: item.href,
            active: Some(item.href) == active,
        })
        .collect()
}

/// Longest navigation entry that prefixes `path`
fn owner(path: &str) -> Option<&'static NavItem> {
    NAV_ITEMS
        .iter()
        .filter(|item| matches(path, item.href))
        .max_by_key(|item| item.href.len())
}

/// Roles allowed on `path` beyond the staff check, `None` when any staff
/// role may open it
pub fn required_roles(path: &str) -> Option<&'static [Role]> {
    owner(path)
        .map(|item| item.roles)
        .filter(|roles| !roles.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managers_do_not_see_system_users() {
        let links = visible_for(&Role::Manager, "/dashboard");
        assert_eq!(links.len(), 4);
        assert!(links.iter().all(|link| link.href != "/dashboard/users"));
        assert!(links[0].active);
    }

    #[test]
    fn admins_see_everything() {
        let links = visible_for(&Role::Admin, "/dashboard/users/12/edit");
        assert_eq!(links.len(), 5);
        let active: Vec<_> = links.iter().filter(|link| link.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].href, "/dashboard/users");
    }

    #[test]
    fn participants_see_nothing() {
        assert!(visible_for(&Role::User, "/dashboard").is_empty());
    }

    #[test]
    fn longest_prefix_decides_requirements() {
        assert_eq!(required_roles("/dashboard/users/new"), Some(USER_ADMINS));
        assert_eq!(required_roles("/dashboard/users"), Some(USER_ADMINS));
        assert_eq!(required_roles("/dashboard/participants/3"), None);
        assert_eq!(required_roles("/dashboard/usersettings"), None);
        assert_eq!(required_roles("/dashboard"), None);
    }
}

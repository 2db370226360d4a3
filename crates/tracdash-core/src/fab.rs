// ── Collection "add" action ──

use crate::permissions::Permissions;
use crate::route::Route;

/// The floating "add" action on a settings collection page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionFab {
    /// Creation form opened by the action, e.g. `/settings/device`.
    pub edit_path: &'static str,
}

impl CollectionFab {
    pub const fn new(edit_path: &'static str) -> Self {
        Self { edit_path }
    }

    /// The action's target, or `None` when the action is not offered.
    pub fn target(&self, permissions: &dyn Permissions) -> Option<Route> {
        permissions
            .administrator()
            .then_some(Route::NewItem(self.edit_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::StaticPermissions;

    #[test]
    fn shown_only_to_administrators() {
        let fab = CollectionFab::new("/settings/device");
        assert_eq!(fab.target(&StaticPermissions::default()), None);

        let admin = StaticPermissions {
            administrator: true,
            ..StaticPermissions::default()
        };
        assert_eq!(
            fab.target(&admin).map(|r| r.path()),
            Some("/settings/device".to_owned())
        );
    }
}

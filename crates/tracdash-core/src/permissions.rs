// ── Permission checks ──
//
// UI gating is expressed against the `Permissions` trait so views can be
// built and tested with any capability set.

use crate::model::{Server, User};

/// Capability checks for the signed-in account.
pub trait Permissions: Send + Sync {
    fn administrator(&self) -> bool;

    /// Device settings cannot be changed.
    fn device_readonly(&self) -> bool;

    /// The share menu entry is offered.
    fn can_share(&self) -> bool;
}

/// The signed-in user together with the server settings that constrain it.
#[derive(Debug, Clone, Default)]
pub struct Account {
    pub user: User,
    pub server: Server,
}

impl Permissions for Account {
    fn administrator(&self) -> bool {
        self.user.administrator
    }

    fn device_readonly(&self) -> bool {
        !self.administrator()
            && (self.server.readonly
                || self.user.readonly
                || self.server.device_readonly
                || self.user.device_readonly)
    }

    fn can_share(&self) -> bool {
        !self.server.share_disabled() && !self.user.temporary
    }
}

/// Fixed answers, for callers that already know the capability set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct StaticPermissions {
    pub administrator: bool,
    pub device_readonly: bool,
    pub can_share: bool,
}

impl Permissions for StaticPermissions {
    fn administrator(&self) -> bool {
        self.administrator
    }

    fn device_readonly(&self) -> bool {
        self.device_readonly
    }

    fn can_share(&self) -> bool {
        self.can_share
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_is_never_device_readonly() {
        let account = Account {
            user: User {
                administrator: true,
                readonly: true,
                ..User::default()
            },
            server: Server {
                device_readonly: true,
                ..Server::default()
            },
        };
        assert!(!account.device_readonly());
    }

    #[test]
    fn any_readonly_flag_applies_to_regular_user() {
        let account = Account {
            server: Server {
                readonly: true,
                ..Server::default()
            },
            ..Account::default()
        };
        assert!(account.device_readonly());
        assert!(!Account::default().device_readonly());
    }

    #[test]
    fn share_blocked_by_server_or_temporary_user() {
        assert!(Account::default().can_share());

        let temporary = Account {
            user: User {
                temporary: true,
                ..User::default()
            },
            ..Account::default()
        };
        assert!(!temporary.can_share());

        let disabled = Account {
            server: Server {
                attributes: json!({ "disableShare": true }).as_object().cloned().unwrap_or_default(),
                ..Server::default()
            },
            ..Account::default()
        };
        assert!(!disabled.can_share());
    }
}

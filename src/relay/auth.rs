//! Admin authorization.

use crate::config::ConfigData;

/// Identity of the sender of an inbound event, as far as the platform told us.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// A caller is admin when their id string-matches the default recipient id,
/// or their handle matches the developer handle (case-insensitive, leading
/// `@` ignored). No identity means no admin.
pub fn is_admin(config: &ConfigData, caller: &Caller) -> bool {
    let Some(id) = caller.id else {
        return false;
    };
    if !config.default_chat_id.is_empty() && id.to_string() == config.default_chat_id {
        return true;
    }
    let handle = config.developer.telegram.trim_start_matches('@');
    !handle.is_empty()
        && caller.username.as_deref().is_some_and(|u| u.eq_ignore_ascii_case(handle))
}

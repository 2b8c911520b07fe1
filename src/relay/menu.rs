//! Menu labels, keyboards and callback data.
//!
//! The label table is the single source for both matching inbound text and
//! laying out the reply keyboards, so the two cannot drift apart.

use crate::relay::transport::{InlineButton, Keyboard};

pub const SEND_MESSAGE: &str = "📩 Send message";
pub const SEND_TO_GROUP: &str = "👥 Send to group";
pub const BROADCAST: &str = "📣 Broadcast";
pub const SEND_DEFAULT: &str = "✉️ Send default text";
pub const SETTINGS: &str = "⚙️ Settings";
pub const ADMIN_PANEL: &str = "🛠 Admin panel";
pub const HELP: &str = "ℹ️ Help";
pub const DEVELOPER: &str = "👤 About developer";
pub const CHANGE_ID: &str = "🆔 Change default id";
pub const CHANGE_TEXT: &str = "📝 Change default text";
pub const CHANGE_HOST: &str = "🌐 Change host";
pub const BACK: &str = "⬅️ Main menu";

pub const CONFIRM_BROADCAST: &str = "confirm:broadcast";
pub const CANCEL_BROADCAST: &str = "cancel:broadcast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SendDirect,
    SendGroup,
    Broadcast,
    SendDefault,
    Settings,
    AdminPanel,
    Help,
    Developer,
    ChangeId,
    ChangeText,
    ChangeHost,
    Back,
}

const LABELS: &[(&str, MenuAction)] = &[
    (SEND_MESSAGE, MenuAction::SendDirect),
    (SEND_TO_GROUP, MenuAction::SendGroup),
    (BROADCAST, MenuAction::Broadcast),
    (SEND_DEFAULT, MenuAction::SendDefault),
    (SETTINGS, MenuAction::Settings),
    (ADMIN_PANEL, MenuAction::AdminPanel),
    (HELP, MenuAction::Help),
    (DEVELOPER, MenuAction::Developer),
    (CHANGE_ID, MenuAction::ChangeId),
    (CHANGE_TEXT, MenuAction::ChangeText),
    (CHANGE_HOST, MenuAction::ChangeHost),
    (BACK, MenuAction::Back),
];

impl MenuAction {
    pub fn from_label(text: &str) -> Option<Self> {
        LABELS.iter().find(|(label, _)| *label == text).map(|(_, action)| *action)
    }

    pub fn requires_admin(self) -> bool {
        matches!(
            self,
            Self::SendDirect
                | Self::SendGroup
                | Self::Broadcast
                | Self::SendDefault
                | Self::AdminPanel
                | Self::ChangeId
                | Self::ChangeText
                | Self::ChangeHost
        )
    }
}

pub fn main_keyboard() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![SEND_MESSAGE.into(), SEND_TO_GROUP.into()],
            vec![BROADCAST.into(), SEND_DEFAULT.into()],
            vec![SETTINGS.into(), ADMIN_PANEL.into()],
            vec![HELP.into(), DEVELOPER.into()],
        ],
        resize: true,
    }
}

pub fn settings_keyboard() -> Keyboard {
    Keyboard::Reply {
        rows: vec![
            vec![CHANGE_ID.into(), CHANGE_TEXT.into()],
            vec![CHANGE_HOST.into()],
            vec![BACK.into()],
        ],
        resize: true,
    }
}

pub fn broadcast_confirm_keyboard() -> Keyboard {
    Keyboard::Inline {
        rows: vec![vec![
            InlineButton::new("✅ Send it", CONFIRM_BROADCAST),
            InlineButton::new("❌ Cancel", CANCEL_BROADCAST),
        ]],
    }
}

//! Relay engine: the per-chat conversation state machine.
//!
//! Inbound text is dispatched in a fixed precedence order: slash command,
//! then pending flow step, then menu label, then silence. Pending state wins
//! over menu labels so a user mid-flow cannot fall out of it by typing
//! something that happens to look like a button.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ConfigStore;
use crate::relay::auth::{is_admin, Caller};
use crate::relay::broadcast::broadcast;
use crate::relay::menu::{self, MenuAction};
use crate::relay::state::{PendingAction, PendingStore};
use crate::relay::transport::{Keyboard, Transport};

const REJECTION: &str = "You are not allowed to do that.";
const NO_DEFAULT_ID: &str =
    "No default recipient id is configured. Set \"id\" in the config file first.";
const DELIVERED: &str = "Message delivered ✅";
const DELIVERY_FAILED: &str = "Could not deliver the message. Check the logs for details.";
const GROUP_DELIVERY_FAILED: &str =
    "Could not deliver to that group. Check the id and that the bot is a member.";
const SEND_USAGE: &str = "Usage: /send <text>";
const HELP_TEXT: &str = "How to use this bot:\n\
    - /start shows the main keyboard.\n\
    - /send <text> delivers <text> to the default recipient (admins only).\n\
    - The buttons cover group sends, broadcasts and settings.";

/// Which configuration value a settings flow is editing.
enum Setting {
    DefaultId,
    DefaultText,
}

pub struct RelayEngine<T: Transport> {
    config: Arc<ConfigStore>,
    transport: Arc<T>,
    pending: PendingStore,
}

impl<T: Transport> RelayEngine<T> {
    pub fn new(config: Arc<ConfigStore>, transport: Arc<T>) -> Self {
        Self { config, transport, pending: PendingStore::new() }
    }

    #[cfg(test)]
    pub(crate) fn pending_store(&self) -> &PendingStore {
        &self.pending
    }

    fn is_admin(&self, caller: &Caller) -> bool {
        self.config.read(|c| is_admin(c, caller))
    }

    /// Reply into the originating chat. Reply failures are logged and
    /// swallowed; there is nobody else to tell.
    async fn reply(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) {
        if let Err(e) = self.transport.send_message(&chat_id.to_string(), text, keyboard).await {
            warn!("Failed to reply in chat {chat_id}: {e}");
        }
    }

    /// Best-effort send of the default text to the default recipient, used
    /// once at startup.
    pub async fn announce_startup(&self) {
        let (target, text) =
            self.config.read(|c| (c.default_chat_id.clone(), c.default_text.clone()));
        if target.is_empty() {
            return;
        }
        match self.transport.send_message(&target, &text, None).await {
            Ok(_) => info!("Sent default text to {target} on startup"),
            Err(e) => warn!("Startup default send failed: {e}"),
        }
    }

    /// Dispatch one inbound text event.
    pub async fn handle_text(&self, chat_id: i64, caller: &Caller, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if let Some(command) = text.strip_prefix('/') {
            // Commands never touch pending state.
            return self.handle_command(chat_id, caller, command).await;
        }

        if let Some(action) = self.pending.take(chat_id) {
            return self.resume(chat_id, caller, action, text).await;
        }

        if let Some(action) = MenuAction::from_label(text) {
            return self.handle_menu(chat_id, caller, action).await;
        }

        // Unmatched free text gets no reply; echoing it back invites spam.
    }

    async fn handle_command(&self, chat_id: i64, caller: &Caller, command: &str) {
        let (name, rest) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };
        match name {
            "start" => {
                let name = caller.first_name.as_deref().unwrap_or("there");
                let welcome = format!(
                    "Hi {name}!\nThis bot relays messages for its operator.\nPick an action from the keyboard below."
                );
                self.reply(chat_id, &welcome, Some(menu::main_keyboard())).await;
            }
            "help" => self.reply(chat_id, HELP_TEXT, Some(menu::main_keyboard())).await,
            "send" => self.direct_send(chat_id, caller, rest).await,
            other => info!("Ignoring unknown command /{other} in chat {chat_id}"),
        }
    }

    async fn direct_send(&self, chat_id: i64, caller: &Caller, text: &str) {
        if !self.is_admin(caller) {
            return self.reply(chat_id, REJECTION, None).await;
        }
        if text.is_empty() {
            return self.reply(chat_id, SEND_USAGE, None).await;
        }
        let target = self.config.read(|c| c.default_chat_id.clone());
        if target.is_empty() {
            return self.reply(chat_id, NO_DEFAULT_ID, None).await;
        }
        match self.transport.send_message(&target, text, None).await {
            Ok(_) => self.reply(chat_id, DELIVERED, None).await,
            Err(e) => {
                warn!("Direct send to {target} failed: {e}");
                self.reply(chat_id, DELIVERY_FAILED, None).await;
            }
        }
    }

    async fn handle_menu(&self, chat_id: i64, caller: &Caller, action: MenuAction) {
        if action.requires_admin() && !self.is_admin(caller) {
            return self.reply(chat_id, REJECTION, None).await;
        }

        match action {
            MenuAction::SendDirect => {
                // Selecting a menu action replaces any pending flow, silently.
                self.pending.set(chat_id, PendingAction::AwaitDirectMessage);
                self.reply(
                    chat_id,
                    "Send the text to deliver to the default recipient.\nTip: /send <text> does the same in one step.",
                    None,
                )
                .await;
            }
            MenuAction::SendGroup => {
                self.pending.set(chat_id, PendingAction::AwaitGroupId);
                self.reply(chat_id, "Send the target group id (the bot must be a member).", None)
                    .await;
            }
            MenuAction::Broadcast => {
                self.pending.set(chat_id, PendingAction::AwaitBroadcastText);
                self.reply(chat_id, "Send the broadcast text.", None).await;
            }
            MenuAction::SendDefault => {
                let (target, text) =
                    self.config.read(|c| (c.default_chat_id.clone(), c.default_text.clone()));
                if target.is_empty() {
                    return self.reply(chat_id, NO_DEFAULT_ID, None).await;
                }
                match self.transport.send_message(&target, &text, None).await {
                    Ok(_) => self.reply(chat_id, DELIVERED, None).await,
                    Err(e) => {
                        warn!("Default send to {target} failed: {e}");
                        self.reply(chat_id, DELIVERY_FAILED, None).await;
                    }
                }
            }
            MenuAction::Settings => {
                self.reply(chat_id, "Settings: pick what to change.", Some(menu::settings_keyboard()))
                    .await;
            }
            MenuAction::AdminPanel => {
                let summary = self.config.read(|c| {
                    format!(
                        "Current settings:\n- default id: {}\n- host: {}\n- default text: {}\n- broadcast list: {} recipient(s)",
                        if c.default_chat_id.is_empty() { "(unset)" } else { c.default_chat_id.as_str() },
                        c.host,
                        c.default_text,
                        c.broadcast_list.len(),
                    )
                });
                self.reply(chat_id, &summary, None).await;
            }
            MenuAction::Help => self.reply(chat_id, HELP_TEXT, Some(menu::main_keyboard())).await,
            MenuAction::Developer => {
                let text = self.config.read(|c| {
                    format!("Developer: {}\nTelegram: {}", c.developer.name, c.developer.telegram)
                });
                self.reply(chat_id, &text, Some(menu::main_keyboard())).await;
            }
            MenuAction::ChangeId => {
                self.pending.set(chat_id, PendingAction::AwaitNewDefaultId);
                self.reply(chat_id, "Send the new default recipient id.", None).await;
            }
            MenuAction::ChangeText => {
                self.pending.set(chat_id, PendingAction::AwaitNewDefaultText);
                self.reply(chat_id, "Send the new default text.", None).await;
            }
            MenuAction::ChangeHost => {
                self.pending.set(chat_id, PendingAction::AwaitNewHost);
                self.reply(chat_id, "Send the new host label.", None).await;
            }
            MenuAction::Back => {
                self.reply(chat_id, "Main menu.", Some(menu::main_keyboard())).await;
            }
        }
    }

    /// Continue a pending flow with the text the chat just supplied. The
    /// entry has already been taken; steps that continue re-insert the next
    /// one, so a flow that ends here ends cleared.
    async fn resume(&self, chat_id: i64, caller: &Caller, action: PendingAction, text: &str) {
        match action {
            PendingAction::AwaitDirectMessage => {
                let target = self.config.read(|c| c.default_chat_id.clone());
                if target.is_empty() {
                    return self.reply(chat_id, NO_DEFAULT_ID, None).await;
                }
                match self.transport.send_message(&target, text, None).await {
                    Ok(_) => self.reply(chat_id, DELIVERED, None).await,
                    Err(e) => {
                        warn!("Direct send to {target} failed: {e}");
                        self.reply(chat_id, DELIVERY_FAILED, None).await;
                    }
                }
            }
            PendingAction::AwaitGroupId => {
                self.pending
                    .set(chat_id, PendingAction::AwaitGroupMessage { group_id: text.to_string() });
                self.reply(chat_id, "Now send the message for that group.", None).await;
            }
            PendingAction::AwaitGroupMessage { group_id } => {
                match self.transport.send_message(&group_id, text, None).await {
                    Ok(_) => self.reply(chat_id, DELIVERED, None).await,
                    Err(e) => {
                        warn!("Group send to {group_id} failed: {e}");
                        self.reply(chat_id, GROUP_DELIVERY_FAILED, None).await;
                    }
                }
            }
            PendingAction::AwaitBroadcastText | PendingAction::AwaitBroadcastConfirm { .. } => {
                // Typing again before confirming restages the message.
                self.pending
                    .set(chat_id, PendingAction::AwaitBroadcastConfirm { message: text.to_string() });
                let preview = format!("Broadcast this to every configured recipient?\n\n{text}");
                self.reply(chat_id, &preview, Some(menu::broadcast_confirm_keyboard())).await;
            }
            PendingAction::AwaitNewDefaultId => {
                self.apply_setting(chat_id, caller, Setting::DefaultId, text).await;
            }
            PendingAction::AwaitNewDefaultText => {
                self.apply_setting(chat_id, caller, Setting::DefaultText, text).await;
            }
            PendingAction::AwaitNewHost => {
                self.reply(
                    chat_id,
                    "Host changes are not supported from chat. Edit \"host\" in the config file and restart.",
                    None,
                )
                .await;
            }
        }
    }

    async fn apply_setting(&self, chat_id: i64, caller: &Caller, setting: Setting, value: &str) {
        // A non-admin can only reach a settings state if admin standing was
        // lost mid-flow; re-check anyway.
        if !self.is_admin(caller) {
            return self.reply(chat_id, REJECTION, None).await;
        }
        let value = value.to_string();
        let result = self.config.update(|c| match setting {
            Setting::DefaultId => c.default_chat_id = value,
            Setting::DefaultText => c.default_text = value,
        });
        match result {
            Ok(()) => self.reply(chat_id, "Saved ✅", None).await,
            Err(e) => {
                warn!("Failed to persist settings: {e}");
                self.reply(chat_id, "Could not save the new value. Nothing was changed.", None)
                    .await;
            }
        }
    }

    /// Resolve an inline confirm/cancel tap. Every callback is acknowledged
    /// exactly once, whatever branch ran; the platform keeps a spinner on the
    /// client until then.
    pub async fn handle_callback(&self, chat_id: Option<i64>, callback_id: &str, data: Option<&str>) {
        if let (Some(chat_id), Some(data)) = (chat_id, data) {
            match data {
                menu::CONFIRM_BROADCAST => self.confirm_broadcast(chat_id).await,
                menu::CANCEL_BROADCAST => {
                    self.pending.clear(chat_id);
                    self.reply(chat_id, "Broadcast cancelled.", None).await;
                }
                other => info!("Ignoring callback {other:?} in chat {chat_id}"),
            }
        }
        if let Err(e) = self.transport.answer_callback(callback_id).await {
            warn!("Failed to answer callback {callback_id}: {e}");
        }
    }

    async fn confirm_broadcast(&self, chat_id: i64) {
        // Peek, don't take: a stale confirm must not disturb whatever flow
        // the chat has moved on to.
        let staged = match self.pending.peek(chat_id) {
            Some(PendingAction::AwaitBroadcastConfirm { message }) => Some(message),
            _ => None,
        };
        let Some(message) = staged else {
            return self
                .reply(chat_id, "Nothing is staged for broadcast. Start again from the menu.", None)
                .await;
        };

        let targets = self.config.read(|c| c.broadcast_targets());
        if targets.is_empty() {
            self.pending.clear(chat_id);
            return self.reply(chat_id, "No broadcast destination is configured.", None).await;
        }

        self.pending.clear(chat_id);
        let outcome = broadcast(self.transport.as_ref(), &targets, &message).await;
        let report =
            format!("Broadcast finished: {} delivered, {} failed.", outcome.sent, outcome.failed);
        self.reply(chat_id, &report, None).await;
    }
}

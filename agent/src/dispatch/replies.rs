//! Reply texts and inline keyboards. All texts use the HTML parse mode;
//! `device` is expected to be HTML-escaped already.

use telegram_client::{Button, InlineKeyboard};

use crate::notification::NotificationStyle;
use crate::system_info;

pub const UNAUTHORIZED: &str = "⛔ Unauthorized. Use /start to subscribe, or contact the admin.";
pub const MENU_UNAUTHORIZED: &str =
    "⛔ Unauthorized. Only the admin chat can open the control panel.";
pub const SUBSCRIBED: &str = "✅ Subscribed! You will receive global broadcasts from this bot.\n\n\
                              If you are the admin, use /menu for controls.";
pub const GUEST_PONG: &str = "🏓 Pong! You are subscribed for broadcasts.";
pub const GUEST_HELP: &str = "<b>Bot commands</b>\n\n\
                              <code>/start</code> - Subscribe to broadcasts\n\
                              <code>msg all &lt;text&gt;</code> - (Admin only) broadcast to everyone\n\
                              \nIf you need admin access, ask the owner to add you.";

pub fn guest_status(device: &str) -> String {
    format!(
        "<b>{device}</b> is online.\n🌐 IP: {}\n🕐 Time: {}",
        system_info::local_ip(),
        system_info::clock_time()
    )
}

pub fn admin_status(device: &str) -> String {
    format!(
        "<b>{device} Status</b>\n\
         🏢 OS: {}\n\
         🌐 IP: {}\n\
         🕐 Time: {}\n\
         🤖 Bot: 🟢 ONLINE\n\
         📍 Popups: UPPER RIGHT CORNER",
        system_info::os_name(),
        system_info::local_ip(),
        system_info::clock_time()
    )
}

pub fn command_help(device: &str) -> String {
    format!(
        "<b>{device} Control Bot</b>\n\n\
         <code>msg {device} [text]</code> - Send message\n\
         <code>msg all [text]</code> - Broadcast message to all subscribers\n\
         <code>warning {device}</code> - Show warning\n\
         <code>alert {device}</code> - Emergency alert\n\
         <code>status {device}</code> - System status\n\
         <code>shutdown {device}</code> - Shutdown computer\n\
         <code>restart {device}</code> - Restart computer\n\
         <code>ping</code> - Check bot status\n\
         <code>test {device}</code> - Test popups\n\
         <code>demo</code> - Show popup demo\n\
         <code>help</code> - Show this help\n\n\
         📍 Popups appear in UPPER RIGHT CORNER\n\n\
         🔘 <b>Use /menu for button controls!</b>"
    )
}

pub fn button_help(device: &str) -> String {
    format!(
        "<b>{device} Control Bot - Buttons Edition</b>\n\n\
         🔘 <b>Button Controls:</b>\n\
         • 📊 Status - Check system status\n\
         • 📨 Send Message - Send different message types\n\
         • ⚠️ Warning - Show warning popup\n\
         • 🚨 Alert - Show emergency alert\n\
         • 🧪 Test Popups - Test popup system\n\
         • 🎬 Demo - Show all popup styles\n\
         • 🖥️ Shutdown - Shutdown computer\n\
         • 🔄 Restart - Restart computer\n\
         • 📋 Help - Show this help\n\
         • 🏓 Ping - Check if bot is alive\n\n\
         📍 Popups appear in UPPER RIGHT CORNER\n\n\
         💡 <b>You can still type commands:</b>\n\
         <code>/menu</code> - Show control panel\n\
         <code>test {device}</code> - Test popups\n\
         <code>status {device}</code> - Get status"
    )
}

pub fn menu(device: &str) -> (String, InlineKeyboard) {
    (
        format!("🤖 <b>{device} Control Panel</b>\n\nSelect an option below:"),
        InlineKeyboard::from_buttons([
            Button::new("📊 Status", "status"),
            Button::new("📨 Send Message", "send_msg"),
            Button::new("⚠️ Warning", "warning"),
            Button::new("🚨 Alert", "alert"),
            Button::new("🧪 Test Popups", "test"),
            Button::new("🎬 Demo", "demo"),
            Button::new("🖥️ Shutdown", "shutdown_confirm"),
            Button::new("🔄 Restart", "restart_confirm"),
            Button::new("📋 Help", "help"),
            Button::new("🏓 Ping", "ping"),
        ]),
    )
}

pub fn send_msg_menu(device: &str) -> (String, InlineKeyboard) {
    (
        format!("📨 Send message to {device}\n\nChoose a message type:"),
        InlineKeyboard::from_buttons([
            Button::new("ℹ️ Info", "msg_info"),
            Button::new("⚠️ Warning", "msg_warning"),
            Button::new("✅ Success", "msg_success"),
            Button::new("🚨 Emergency", "msg_emergency"),
            Button::new("🔙 Back", "menu"),
        ]),
    )
}

pub fn shutdown_confirm(device: &str) -> (String, InlineKeyboard) {
    (
        format!(
            "🖥️ Confirm Shutdown for {device}\n\n\
             ⚠️ <b>WARNING:</b> This will shutdown the computer immediately!"
        ),
        InlineKeyboard::from_buttons([
            Button::new("✅ Yes, Shutdown Now", "shutdown_now"),
            Button::new("❌ Cancel", "menu"),
        ]),
    )
}

pub fn restart_confirm(device: &str) -> (String, InlineKeyboard) {
    (
        format!(
            "🔄 Confirm Restart for {device}\n\n\
             ⚠️ <b>WARNING:</b> This will restart the computer immediately!"
        ),
        InlineKeyboard::from_buttons([
            Button::new("✅ Yes, Restart Now", "restart_now"),
            Button::new("❌ Cancel", "menu"),
        ]),
    )
}

/// Greeting sent to the admin when the agent comes online.
pub fn startup(device: &str) -> (String, InlineKeyboard) {
    (
        format!(
            "🚀 {device} is online!\n\
             📍 Popups enabled in UPPER RIGHT CORNER\n\n\
             💡 <b>New Feature:</b> Button Controls!\n\
             Type <code>/menu</code> or use buttons below:"
        ),
        InlineKeyboard::from_buttons([
            Button::new("📋 Open Control Panel", "menu"),
            Button::new("🧪 Test Popups", "test"),
            Button::new("📊 System Status", "status"),
        ]),
    )
}

/// Fixed popup sequences for `test` and `demo`: (delay ms, title, message, style).
pub type PopupStep = (u64, &'static str, &'static str, NotificationStyle);

pub const COMMAND_TEST_SEQUENCE: [PopupStep; 3] = [
    (500, "💡 INFO TEST", "Info style popup", NotificationStyle::Info),
    (1000, "⚠️ WARNING TEST", "Warning style popup", NotificationStyle::Warning),
    (1500, "✅ SUCCESS TEST", "Success style popup", NotificationStyle::Success),
];

pub const BUTTON_TEST_SEQUENCE: [PopupStep; 3] = [
    (500, "💡 BUTTON TEST", "Info popup via button", NotificationStyle::Info),
    (1000, "⚠️ BUTTON TEST", "Warning popup via button", NotificationStyle::Warning),
    (1500, "✅ BUTTON TEST", "Success popup via button", NotificationStyle::Success),
];

pub const DEMO_STEP_MS: u64 = 800;

pub fn demo_popup(style: NotificationStyle) -> (String, String) {
    (
        format!("{} DEMO", style.as_str().to_uppercase()),
        format!("This is {} style popup", style.as_str()),
    )
}

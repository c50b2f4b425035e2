//! Widget configuration from the environment

use crate::reply::ReplyDelay;
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ASSISTANT_NAME: &str = "Adam";
pub const DEFAULT_BRAND: &str = "KASSELWOOD FABRICATORS";

/// Landing-screen shortcut that opens a conversation with a canned prompt
pub const SEND_MESSAGE_PROMPT: &str = "Send us a message";

const DEFAULT_HELP_PROMPTS: [&str; 5] = [
    "How much does a kitchen renovation cost in Montreal?",
    "What's included in your free consultation?",
    "How long does a bathroom renovation take?",
    "Do you handle permits and inspections?",
    "Can I see examples of your recent projects?",
];

/// Everything the landing screen needs to render its menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingMenu {
    pub brand: String,
    pub greeting: String,
    pub send_message_prompt: String,
    pub help_prompts: Vec<String>,
}

impl LandingMenu {
    pub fn for_brand(brand: &str) -> Self {
        Self {
            brand: brand.to_string(),
            greeting: format!("👋 Hi, I'm the chatbot from {brand}. How can I help you today?"),
            send_message_prompt: SEND_MESSAGE_PROMPT.to_string(),
            help_prompts: DEFAULT_HELP_PROMPTS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Configuration for the widget server
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub port: u16,
    /// SQLite file backing the session; in-memory when absent
    pub db_path: Option<PathBuf>,
    pub assistant_name: String,
    pub reply_delay: ReplyDelay,
    pub menu: LandingMenu,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            db_path: None,
            assistant_name: DEFAULT_ASSISTANT_NAME.to_string(),
            reply_delay: ReplyDelay::default(),
            menu: LandingMenu::for_brand(DEFAULT_BRAND),
        }
    }
}

impl WidgetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparsable values fall back
    /// to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("CHAT_WIDGET_PORT").map_or(defaults.port, |raw| {
            raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid CHAT_WIDGET_PORT, using default");
                defaults.port
            })
        });

        let reply_delay = lookup("CHAT_WIDGET_REPLY_DELAY_MS").map_or(defaults.reply_delay, |raw| {
            raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(value = %raw, error = %e, "Invalid CHAT_WIDGET_REPLY_DELAY_MS, using default");
                defaults.reply_delay
            })
        });

        let assistant_name = lookup("CHAT_WIDGET_ASSISTANT_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.assistant_name);

        let menu = lookup("CHAT_WIDGET_BRAND")
            .filter(|brand| !brand.trim().is_empty())
            .map_or(defaults.menu, |brand| LandingMenu::for_brand(&brand));

        Self {
            port,
            db_path: lookup("CHAT_WIDGET_DB_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            assistant_name,
            reply_delay,
            menu,
        }
    }
}

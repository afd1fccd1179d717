use serde::{Deserialize, Serialize};

// ===== MENU MODELS =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: u32,
    pub label: String,
    pub action: String,
}

impl MenuOption {
    pub fn new(id: u32, label: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            action: action.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub title: String,
    pub options: Vec<MenuOption>,
    pub status: String,
}

/// Reply to one menu action.
///
/// `show_menu` tells the caller to render the main menu after the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuReply {
    pub text: String,
    pub show_menu: bool,
}

impl MenuReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show_menu: false,
        }
    }

    pub fn with_menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show_menu: true,
        }
    }
}

// Menu module
// Right-click menu pages and the actions their entries trigger

use crate::config::AnimationMode;
use crate::pet::Pet;

/// Scale presets offered in the menu
pub const SCALE_PRESETS: [f32; 6] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuPage {
    Main,
    Scale,
    Animations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Navigate to another page; handled by the shell
    Open(MenuPage),
    SetMode(AnimationMode),
    SetScale(f32),
    PlayAnimation(String),
    Talk,
    Walk,
    ToggleWalking,
    ToggleSound,
    ToggleDialog,
    VolumeUp,
    VolumeDown,
    ToggleVisibility,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub label: String,
    pub action: MenuAction,
}

impl MenuEntry {
    fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    fn toggle(label: &str, on: bool, action: MenuAction) -> Self {
        Self::new(format!("{} {}", check(on), label), action)
    }
}

fn check(on: bool) -> &'static str {
    if on {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Entries of `page` reflecting the pet's current settings
pub fn entries(page: MenuPage, pet: &Pet) -> Vec<MenuEntry> {
    let settings = pet.settings();
    match page {
        MenuPage::Main => {
            let mode = settings.animation_mode;
            vec![
                MenuEntry::toggle("Keep animation", mode == AnimationMode::Keep, MenuAction::SetMode(AnimationMode::Keep)),
                MenuEntry::toggle("Random animation", mode == AnimationMode::Random, MenuAction::SetMode(AnimationMode::Random)),
                MenuEntry::new("Animations >", MenuAction::Open(MenuPage::Animations)),
                MenuEntry::new(
                    format!("Scale ({:.0}%) >", settings.scale * 100.0),
                    MenuAction::Open(MenuPage::Scale),
                ),
                MenuEntry::new("Talk", MenuAction::Talk),
                MenuEntry::new("Walk", MenuAction::Walk),
                MenuEntry::toggle("Auto walk", pet.walking_enabled(), MenuAction::ToggleWalking),
                MenuEntry::toggle("Sound", settings.sound_enabled, MenuAction::ToggleSound),
                MenuEntry::toggle("Speech bubbles", settings.dialog_enabled, MenuAction::ToggleDialog),
                MenuEntry::new(
                    format!("Volume + ({:.0}%)", settings.volume * 100.0),
                    MenuAction::VolumeUp,
                ),
                MenuEntry::new("Volume -", MenuAction::VolumeDown),
                MenuEntry::new(if pet.is_visible() { "Hide" } else { "Show" }, MenuAction::ToggleVisibility),
                MenuEntry::new("Quit", MenuAction::Quit),
            ]
        }
        MenuPage::Scale => {
            let mut items: Vec<MenuEntry> = SCALE_PRESETS
                .iter()
                .map(|&scale| {
                    let current = (settings.scale - scale).abs() < 0.01;
                    MenuEntry::toggle(&format!("{:.0}%", scale * 100.0), current, MenuAction::SetScale(scale))
                })
                .collect();
            items.push(MenuEntry::new("< Back", MenuAction::Open(MenuPage::Main)));
            items
        }
        MenuPage::Animations => {
            let current = pet.player().current_name();
            let mut items: Vec<MenuEntry> = pet
                .player()
                .catalog()
                .menu_names()
                .into_iter()
                .map(|name| {
                    MenuEntry::toggle(name, current == Some(name), MenuAction::PlayAnimation(name.to_string()))
                })
                .collect();
            items.push(MenuEntry::new("< Back", MenuAction::Open(MenuPage::Main)));
            items
        }
    }
}

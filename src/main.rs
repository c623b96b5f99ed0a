// rpet - A desktop pet for Wayland
// Shows an animated character in a floating, always-on-top window that walks, talks and reacts to clicks

mod app;
mod behavior;
mod cli;
mod config;
mod dialog;
mod error;
mod image_loader;
mod menu;
mod pet;
mod player;
mod render;
mod sound;
mod store;
mod timer;
mod wayland;

use anyhow::Result;
use log::info;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = cli::parse_args()?;

    info!(
        "Starting rpet with assets: {:?}, settings: {:?}",
        args.assets_dir, args.config_path
    );

    // Load the character and restore saved settings
    let pet = app::build_pet(&args)?;

    // Run as a layer-shell overlay
    wayland::run(pet)
}

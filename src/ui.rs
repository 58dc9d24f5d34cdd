// UI layer: gathers the connection settings with `dialoguer` prompts and
// prints the end-of-run summary. When a previous run left a saved
// configuration behind, the user is offered it first and only re-enters the
// password.

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};

use crate::config::{self, RunConfig};
use crate::model::ExportedUser;
use std::path::Path;

/// Prompt for a full run configuration, offering the previous run's settings
/// for reuse when they exist. The password is always asked fresh.
pub fn gather_config() -> Result<RunConfig> {
    if let Some(saved) = config::load_saved() {
        let prompt = format!(
            "Reuse last configuration ({} as {}, folder '{}')?",
            saved.base_url, saved.username, saved.folder_name
        );
        if Confirm::new().with_prompt(prompt).default(true).interact()? {
            let password: String = Password::new().with_prompt("Password").interact()?;
            return Ok(RunConfig {
                base_url: saved.base_url,
                username: saved.username,
                password,
                folder_name: saved.folder_name,
            });
        }
    }

    let base_url: String = Input::new()
        .with_prompt("Base URL (e.g. https://192.168.1.64)")
        .interact_text()?;
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let password: String = Password::new().with_prompt("Password").interact()?;
    let folder_name: String = Input::new().with_prompt("Folder name").interact_text()?;

    Ok(RunConfig {
        base_url: base_url.trim().trim_end_matches('/').to_string(),
        username: username.trim().to_string(),
        password,
        folder_name: folder_name.trim().to_string(),
    })
}

/// Print the end-of-run totals: users processed, faces found, images on
/// disk, cards, and where everything was written.
pub fn print_summary(records: &[ExportedUser], output_dir: &Path) {
    let faces = records.iter().filter(|r| r.face_url.is_some()).count();
    let images = records.iter().filter(|r| r.local_image_path.is_some()).count();
    let cards: usize = records.iter().map(|r| r.cards.len()).sum();

    println!();
    println!("Export complete.");
    println!("  Users exported:    {}", records.len());
    println!("  Faces found:       {}", faces);
    println!("  Images downloaded: {}", images);
    println!("  Card records:      {}", cards);
    println!("  Output directory:  {}", output_dir.display());
}

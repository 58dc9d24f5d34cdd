// Entrypoint for the export CLI.
// - Keeps `main` small: gather configuration, build the device client, run
//   the pipeline, persist the snapshot and the reusable configuration.
// - Returns `anyhow::Result` so directory-creation and snapshot failures
//   abort the run with context.

use acsexport_cli::api::DeviceClient;
use acsexport_cli::export::{self, ExportOptions, PAGE_SIZE};
use acsexport_cli::{config, snapshot, ui};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let run_config = ui::gather_config()?;
    let output_dir = snapshot::create_run_dir(&run_config.folder_name)?;

    // These devices ship with self-signed certificates; the client accepts
    // them, and we say so once instead of silencing TLS warnings globally.
    warn!("TLS certificate verification is disabled for device requests");
    let client = DeviceClient::new(
        &run_config.base_url,
        &run_config.username,
        &run_config.password,
        true,
    )?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("Enumerating users...");
    let users = export::fetch_all_users(&client, PAGE_SIZE);
    spinner.finish_and_clear();

    let progress = ProgressBar::new(users.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap(),
    );
    progress.set_message("Exporting users");
    let records = export::run_export(
        &client,
        users,
        &output_dir,
        &ExportOptions::default(),
        &progress,
    );
    progress.finish_and_clear();

    snapshot::write_snapshot(&records, &output_dir)?;

    // Only a completed run is worth offering for reuse next time.
    config::save(&run_config.saved())?;

    ui::print_summary(&records, &output_dir);
    Ok(())
}

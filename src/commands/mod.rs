//! Command implementations

mod erase;
mod info;
mod list;
mod probe;
mod write;

pub use erase::{run_erase, run_mass_erase};
pub use info::run_info;
pub use list::{list_chips, list_targets};
pub use probe::run_probe;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for operations without a meaningful byte count
pub(crate) fn spinner(msg: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Byte progress bar with a trailing label
pub(crate) fn byte_bar(total: u64, label: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                label
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

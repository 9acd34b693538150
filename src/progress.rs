use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::downloader::ProgressFn;

const TEMPLATE: &str =
    "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Returns the default progress function, an `indicatif` bar on stderr.
pub fn default_progress_fn() -> ProgressFn {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }

    Arc::new(move |src: &str, current: u64, total: u64, _mib_per_sec: f64, complete: bool| {
        if bar.position() == 0 && bar.message().is_empty() {
            let name = src.rsplit('/').next().unwrap_or(src).to_owned();
            bar.set_message(format!("downloading {name}"));
        }
        if total > 0 {
            bar.set_length(total);
        }
        bar.set_position(current);
        if complete {
            bar.finish_and_clear();
        }
    })
}


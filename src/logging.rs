use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global tracing subscriber.
///
/// Terminal output goes to stderr so stdout stays reserved for status lines
/// and generated udev rules. When `log_file` is set, everything at debug
/// level is also appended there: udev throws away the output of `RUN`
/// programs, so the file is the only trace of a hotplug run. A log file that
/// cannot be opened is reported on stderr and otherwise ignored.
pub fn init(verbose: bool, log_file: Option<&Path>) {
    let terminal_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
            .add_directive("vfio_usb=info".parse().expect("valid log directive"))
    };

    let terminal_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(terminal_filter);

    let (file_layer, open_error) = match log_file.map(|path| (path, open_log_file(path))) {
        Some((_, Ok(file))) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(EnvFilter::new("vfio_usb=debug"));
            (Some(layer), None)
        }
        Some((path, Err(e))) => (None, Some((path, e))),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();

    if let Some((path, e)) = open_error {
        tracing::warn!(path = %path.display(), "could not open log file, logging to stderr only: {e}");
    }
}

/// Open `path` in append mode, creating parent directories as needed.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

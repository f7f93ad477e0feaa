use std::path::{Path, PathBuf};

use clap::Parser;

/// Download videos from facebook from your terminal
#[derive(Parser, Debug)]
#[command(name = "fbdl", version, long_about = None)]
pub struct Args {
    /// Video page URL, or a `videos_by` listing page to download every video on it
    pub url: String,

    /// Requested resolution (`sd`/`hd`). Accepted for compatibility; the page's
    /// published video URL is always used.
    pub resolution: Option<String>,

    /// Cookie file with `name=value;` lines (default: ./cookies, then ~/.facebook-cookies)
    #[arg(long)]
    pub cookies: Option<PathBuf>,

    /// Configuration file (default: ./fbdl.ron if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the videos are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// File to write instead of the derived name (single video only). A
    /// relative path is taken under the output directory.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Number of videos processed at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Split an `--output` path into the directory to write into and the bare
/// file name. `None` when the path does not end in a file name.
pub fn split_output(output_dir: &Path, output: &Path) -> Option<(PathBuf, String)> {
    let name = output.file_name()?.to_str()?.to_string();
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => output_dir.join(parent),
        _ => output_dir.to_path_buf(),
    };
    Some((dir, name))
}

//! Shared fixtures: a fake yt-dlp written as a shell script.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const SAMPLE_JSON: &str = r#"{
  "id": "abc123",
  "title": "Sample Clip",
  "thumbnail": "",
  "webpage_url": "https://example.com/watch?v=abc123",
  "formats": [
    {"format_id": "sb0", "ext": "mhtml", "resolution": "48x27", "format_note": "storyboard"},
    {"format_id": "140", "ext": "m4a", "resolution": "audio only", "abr": 129.5, "acodec": "mp4a.40.2", "vcodec": "none"},
    {"format_id": "251", "ext": "webm", "resolution": "audio only", "abr": 135.2, "acodec": "opus", "vcodec": "none"},
    {"format_id": "136", "ext": "mp4", "resolution": "1280x720", "width": 1280, "height": 720, "fps": 30, "vbr": 1500.0, "vcodec": "avc1", "acodec": "none"},
    {"format_id": "137", "ext": "mp4", "resolution": "1920x1080", "width": 1920, "height": 1080, "fps": 30, "vbr": 4400.5, "vcodec": "avc1", "acodec": "none"}
  ]
}"#;

/// Progress lines a download prints, `\r`-separated as on a terminal
pub const PROGRESS_OUTPUT: &str = concat!(
    "[download] Destination: clip.mp4\\n",
    "[download]   0.0%% of   10.00MiB at Unknown B/s ETA Unknown\\r",
    "[download]  42.5%% of ~ 10.00MiB at 2.00MiB/s ETA 00:02\\r",
    "[download] 100%% of   10.00MiB in 00:00:04 at 2.41MiB/s\\n",
);

/// Write an executable `yt-dlp` into `dir`.
///
/// The info invocation (`-j ...`) prints diagnostics around `SAMPLE_JSON`.
/// Any other invocation runs `download_body`.
#[cfg(unix)]
pub fn fake_ytdlp(dir: &Path, download_body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        "#!/bin/sh\n\
         if [ \"$1\" = \"-j\" ]; then\n\
         echo '[youtube] abc123: Downloading webpage'\n\
         echo 'WARNING: falling back to generic formats' >&2\n\
         cat <<'JSON'\n{}\nJSON\n\
         echo '[info] done'\n\
         exit 0\n\
         fi\n\
         if [ \"$1\" = \"--version\" ]; then\n\
         echo '2024.08.06'\n\
         exit 0\n\
         fi\n\
         {}\n",
        SAMPLE_JSON, download_body
    );

    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A download that prints progress and succeeds
pub fn successful_download() -> String {
    format!("printf '{}'\nexit 0", PROGRESS_OUTPUT)
}

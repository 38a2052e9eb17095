pub mod decoder;
pub mod models;
pub mod traits;
pub mod ytdlp;

pub use decoder::{decode_media_info, locate_json_object};
pub use models::{FormatBuckets, FormatKind, MediaFormat, MediaInfo, AUDIO_ONLY_SENTINEL};
pub use traits::Extractor;
pub use ytdlp::{find_ytdlp, YtDlpExtractor};

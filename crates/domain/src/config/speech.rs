use serde::{Deserialize, Serialize};

/// Text-to-speech output.
///
/// `command` is an external program that speaks its final argument, e.g.
/// `["say"]` on macOS or `["espeak-ng", "-s", "160"]` on Linux. Unset means
/// replies are only printed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeechConfig {
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

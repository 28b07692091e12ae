//! Environment fingerprint overrides
//!
//! A fixed set of overrides applied once per browser session: suppress the
//! automation-indicator properties and present plausible hardware and
//! plugin values instead of a headless default.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const HARDWARE_CONCURRENCY: &[u32] = &[4, 8, 12, 16];
const DEVICE_MEMORY: &[u32] = &[4, 8, 16];

const PLUGIN_NAMES: &[&str] = &[
    "PDF Viewer",
    "Chrome PDF Viewer",
    "Chromium PDF Viewer",
    "Microsoft Edge PDF Viewer",
    "WebKit built-in PDF",
];

/// Fingerprint values fixed for the lifetime of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProfile {
    pub hardware_concurrency: u32,
    pub device_memory: u32,
    pub languages: Vec<String>,
    pub plugins: Vec<String>,
}

impl FingerprintProfile {
    /// Generate a plausible profile
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            hardware_concurrency: *HARDWARE_CONCURRENCY.choose(&mut rng).unwrap(),
            device_memory: *DEVICE_MEMORY.choose(&mut rng).unwrap(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            plugins: PLUGIN_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Script injected once at session creation for embedded page drivers.
    /// Clears `navigator.webdriver` and replaces the headless giveaways.
    pub fn init_script(&self) -> String {
        let languages = serde_json::to_string(&self.languages).unwrap_or_default();
        let plugins = serde_json::to_string(&self.plugins).unwrap_or_default();

        format!(
            r#"Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
Object.defineProperty(navigator, 'hardwareConcurrency', {{ get: () => {concurrency} }});
Object.defineProperty(navigator, 'deviceMemory', {{ get: () => {memory} }});
Object.defineProperty(navigator, 'languages', {{ get: () => {languages} }});
Object.defineProperty(navigator, 'plugins', {{ get: () => {plugins}.map((name) => ({{ name }})) }});
window.chrome = window.chrome || {{ runtime: {{}} }};
"#,
            concurrency = self.hardware_concurrency,
            memory = self.device_memory,
            languages = languages,
            plugins = plugins,
        )
    }

    /// Client-hint headers consistent with the profile
    pub fn header_overrides(&self, platform: &str) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        let hint_platform = match platform {
            "MacIntel" => "\"macOS\"",
            "Linux x86_64" => "\"Linux\"",
            _ => "\"Windows\"",
        };
        headers.insert("Sec-CH-UA-Platform".to_string(), hint_platform.to_string());
        headers.insert("Sec-CH-UA-Mobile".to_string(), "?0".to_string());
        headers
    }
}

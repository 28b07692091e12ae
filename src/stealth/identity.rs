//! Rotating browser identities
//!
//! Most sessions reuse one of a curated set of realistic identities; the
//! rest draw from a broader generated pool so the population never looks
//! uniform.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A browser identity applied per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserIdentity {
    pub user_agent: String,
    pub accept_language: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub platform: String,
}

/// Curated identities: real UA strings paired with consistent platforms
const CURATED_IDENTITIES: &[(&str, &str)] = &[
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
        "MacIntel",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.3 Safari/605.1.15",
        "MacIntel",
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
        "MacIntel",
    ),
    (
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Linux x86_64",
    ),
    (
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
        "Linux x86_64",
    ),
];

const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1536, 864), (1440, 900), (2560, 1440)];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-US,en;q=0.9,de;q=0.7",
    "en-US,en;q=0.8",
];

/// Generate a random but realistic user agent string
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();

    // Chrome versions (recent)
    let chrome_versions = ["120.0.0.0", "121.0.0.0", "122.0.0.0", "123.0.0.0", "124.0.0.0"];

    // Firefox versions (recent)
    let firefox_versions = ["122.0", "123.0", "124.0", "125.0"];

    // Safari versions
    let safari_versions = ["17.2", "17.3", "17.4"];

    // Operating systems
    let os_strings = [
        "Windows NT 10.0; Win64; x64",
        "Macintosh; Intel Mac OS X 10_15_7",
        "Macintosh; Intel Mac OS X 14_2_1",
        "X11; Linux x86_64",
        "X11; Ubuntu; Linux x86_64",
    ];

    let os = os_strings.choose(&mut rng).unwrap();

    let browser_type: u8 = rng.gen_range(0..10);

    if browser_type < 6 {
        // Chrome (60% chance)
        let chrome = chrome_versions.choose(&mut rng).unwrap();
        format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
            os, chrome
        )
    } else if browser_type < 9 {
        // Firefox (30% chance)
        let firefox = firefox_versions.choose(&mut rng).unwrap();
        format!(
            "Mozilla/5.0 ({}; rv:{}) Gecko/20100101 Firefox/{}",
            os, firefox, firefox
        )
    } else {
        // Safari (10% chance), only plausible on a Mac
        let safari = safari_versions.choose(&mut rng).unwrap();
        format!(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{} Safari/605.1.15",
            safari
        )
    }
}

/// Picks identities: curated most of the time, generated for the rest
#[derive(Debug, Clone)]
pub struct IdentityRotator {
    curated_ratio: f64,
}

impl IdentityRotator {
    pub fn new(curated_ratio: f64) -> Self {
        Self {
            curated_ratio: curated_ratio.clamp(0.0, 1.0),
        }
    }

    /// Draw the next session identity
    pub fn next(&self) -> BrowserIdentity {
        let mut rng = rand::thread_rng();
        let (viewport_width, viewport_height) = *VIEWPORTS.choose(&mut rng).unwrap();
        let accept_language = ACCEPT_LANGUAGES.choose(&mut rng).unwrap().to_string();

        if rng.gen_bool(self.curated_ratio) {
            let (ua, platform) = CURATED_IDENTITIES.choose(&mut rng).unwrap();
            BrowserIdentity {
                user_agent: ua.to_string(),
                accept_language,
                viewport_width,
                viewport_height,
                platform: platform.to_string(),
            }
        } else {
            let user_agent = generate_user_agent();
            let platform = if user_agent.contains("Macintosh") {
                "MacIntel"
            } else if user_agent.contains("Linux") {
                "Linux x86_64"
            } else {
                "Win32"
            };
            BrowserIdentity {
                user_agent,
                accept_language,
                viewport_width,
                viewport_height,
                platform: platform.to_string(),
            }
        }
    }
}

impl Default for IdentityRotator {
    fn default() -> Self {
        Self::new(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_user_agent() {
        let ua = generate_user_agent();
        assert!(ua.starts_with("Mozilla/5.0"));
        assert!(ua.len() > 50);
    }

    #[test]
    fn test_identity_is_complete() {
        let identity = IdentityRotator::default().next();
        assert!(!identity.user_agent.is_empty());
        assert!(!identity.accept_language.is_empty());
        assert!(!identity.platform.is_empty());
        assert!(identity.viewport_width >= 1366);
    }

    #[test]
    fn test_full_curated_ratio_stays_in_list() {
        let rotator = IdentityRotator::new(1.0);
        for _ in 0..20 {
            let identity = rotator.next();
            assert!(CURATED_IDENTITIES
                .iter()
                .any(|(ua, _)| *ua == identity.user_agent));
        }
    }

    #[test]
    fn test_identities_vary() {
        let rotator = IdentityRotator::default();
        let identities: Vec<_> = (0..20).map(|_| rotator.next()).collect();
        let first = &identities[0].user_agent;
        assert!(!identities.iter().all(|i| &i.user_agent == first));
    }
}

//! Browser selection and launch planning
//!
//! Launching is left to the automation library; this module only decides
//! which browser to use and with which options.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    #[serde(alias = "chrome")]
    Chromium,
    Firefox,
    #[serde(alias = "safari")]
    Webkit,
    Edge,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
            Browser::Edge => "edge",
        }
    }

    pub fn is_chromium_family(&self) -> bool {
        matches!(self, Browser::Chromium | Browser::Edge)
    }

    /// Release channel passed to the chromium launcher
    pub fn channel(&self) -> Option<&'static str> {
        match self {
            Browser::Edge => Some("msedge"),
            _ => None,
        }
    }

    /// Resolve the `BROWSER` value, falling back to chromium for unknown names.
    pub fn resolve(raw: Option<&str>) -> Self {
        let requested = raw.map(str::trim).unwrap_or_default();
        match requested.parse::<Browser>() {
            Ok(browser) => {
                debug!(requested, resolved = browser.as_str(), "Resolved browser from env");
                browser
            }
            Err(_) => {
                warn!(
                    "Unknown BROWSER={:?}, defaulting to chromium. Use chromium|firefox|webkit|edge.",
                    requested
                );
                Browser::Chromium
            }
        }
    }
}

impl FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            "edge" => Ok(Browser::Edge),
            other => Err(Error::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen size used for non-maximized contexts and the environment report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayResolution {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayResolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl FromStr for DisplayResolution {
    type Err = Error;

    /// Parse `<width>x<height>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidConfig(format!("invalid display resolution: {:?}", s));
        let (w, h) = s.trim().split_once(|c: char| c == 'x' || c == 'X').ok_or_else(invalid)?;
        Ok(Self {
            width: w.trim().parse().map_err(|_| invalid())?,
            height: h.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for DisplayResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Options a scenario's browser and context are launched with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub browser: Browser,
    pub headless: bool,
    pub channel: Option<&'static str>,
    pub args: Vec<String>,
    /// `None` lets the page follow the window size
    pub viewport: Option<DisplayResolution>,
}

impl LaunchPlan {
    pub fn for_browser(browser: Browser, headless: bool, resolution: DisplayResolution) -> Self {
        let args = if browser.is_chromium_family() {
            vec!["--start-maximized".to_string()]
        } else {
            Vec::new()
        };

        // Viewport follows the window, except for headless edge.
        let edge_headless = browser == Browser::Edge && headless;
        let viewport = if browser.is_chromium_family() && !edge_headless {
            None
        } else {
            Some(resolution)
        };

        Self {
            browser,
            headless,
            channel: browser.channel(),
            args,
            viewport,
        }
    }
}

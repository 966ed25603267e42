use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_MIN_TTS_AMOUNT: f64 = 2.0;
pub const DEFAULT_MIN_SPOTIFY_AMOUNT: f64 = 1.0;
pub const DEFAULT_MIN_SPOTIFY_SKIP_AMOUNT: f64 = 5.0;

pub const DEFAULT_MUTE_VOLUME: u8 = 40;
pub const DEFAULT_RESTORE_VOLUME: u8 = 80;

pub const DEFAULT_SENDER: &str = "service@paypal.de";
pub const DEFAULT_USER_ID: &str = "me";

pub const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com";
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SINK_URL: &str = "https://api.saufen.neoxen.de/donations/";

// Labels of the cartDetails table in the notification mail
pub const CART_TABLE_ID: &str = "cartDetails";
pub const LABEL_TOTAL: &str = "Gesamtbetrag:";
pub const LABEL_DONOR: &str = "Wer sich beteiligt hat:";
pub const LABEL_MESSAGE: &str = "Nachricht:";

pub const SKIP_KEYWORD: &str = "skip";
pub const TRACK_URI_PREFIX: &str = "spotify:track:";
pub const DEFAULT_TITLE_SEPARATOR: &str = " von ";

/// Messages with more words than this are never treated as bar receipts.
pub const BAR_MAX_WORDS: usize = 2;
pub const TTS_MAX_CHARS: usize = 200;

pub const DEFAULT_BAR_WORDS: &[&str] = &[
    "bar",
    "bier",
    "shot",
    "shots",
    "drink",
    "drinks",
    "jägi",
    "jägermeister",
    "getränk",
    "cocktail",
    "wein",
    "schnaps",
    "whiskey",
    "wodka",
    "gin",
    "rum",
    "tequila",
    "prosecco",
    "sekt",
    "champagner",
    "liquor",
    "pils",
    "lager",
    "radler",
    "apfelwein",
    "weinschorle",
    "cola",
    "limonade",
    "wasser",
    "saft",
    "sprudel",
    "espresso",
    "kaffee",
    "latte",
    "capuccino",
];

pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("user-agent", concat!("donation-relay/", env!("CARGO_PKG_VERSION"))),
    ("accept", "application/json"),
];

pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (k, v) in DEFAULT_HEADERS {
        let name = HeaderName::from_static(k);
        if let Ok(val) = HeaderValue::from_str(v) {
            headers.insert(name, val);
        }
    }
    headers
}

pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

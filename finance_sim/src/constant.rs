pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";

pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Expires", "0"),
    ("Pragma", "no-cache"),
];

/// Paths that redirect anonymous visitors to the login page.
pub const PROTECTED_PATHS: [&str; 6] = ["/", "/buy", "/sell", "/quote", "/history", "/balance"];

pub const LOGGING_INCOMING_REQUEST: &str = "Incoming request";
pub const LOGGING_RESPONSE: &str = "Response sent";

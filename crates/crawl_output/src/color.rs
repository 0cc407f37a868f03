use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::Regex;

// ESC '[' parameters final-letter, e.g. "\x1b[1;33m".
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[a-zA-Z]").expect("valid ANSI escape pattern"));

/// Strip ANSI escape sequences. Borrows the input when nothing matched.
pub fn decolorize(data: &[u8]) -> Cow<'_, [u8]> {
    let mut out = match ANSI_ESCAPE.replace_all(data, &b""[..]) {
        Cow::Borrowed(_) => return Cow::Borrowed(data),
        Cow::Owned(out) => out,
    };
    // Removing one sequence can splice another together: "\x1b[\x1b[0mm".
    while ANSI_ESCAPE.is_match(&out) {
        out = ANSI_ESCAPE.replace_all(&out, &b""[..]).into_owned();
    }
    Cow::Owned(out)
}

/// SGR decoration for console text; a disabled colorizer returns text as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colorizer {
    enabled: bool,
}

impl Colorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint("34", text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn magenta(&self, text: &str) -> String {
        self.paint("35", text)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint("36", text)
    }

    pub fn bright_yellow(&self, text: &str) -> String {
        self.paint("93", text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled && !text.is_empty() {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{decolorize, Colorizer};

    #[test]
    fn disabled_colorizer_is_identity() {
        let plain = Colorizer::new(false);
        assert_eq!(plain.blue("body"), "body");
        assert_eq!(plain.bright_yellow("a"), "a");
    }

    #[test]
    fn enabled_colorizer_wraps_and_resets() {
        let colors = Colorizer::new(true);
        assert_eq!(colors.green("href"), "\x1b[32mhref\x1b[0m");
        assert_eq!(colors.green(""), "");
    }

    #[test]
    fn plain_input_is_borrowed() {
        let out = decolorize(b"GET http://x/a");
        assert!(matches!(out, std::borrow::Cow::Borrowed(_)));
    }

    #[test]
    fn strips_multi_parameter_sequences() {
        let out = decolorize(b"\x1b[1;4;93mtag\x1b[0m \x1b[Kend");
        assert_eq!(&out[..], b"tag end");
    }
}

//! Asset reference classification.
//!
//! Asset fields in a document are URL-shaped strings whose scheme determines
//! how they resolve: inline base64 (`data:`), a remote fetch (`http(s):`),
//! a temp-cache handle (`temp://`), or a bare package-relative path.
//! Classification is infallible — an unrecognized string is simply a
//! relative path — so the codec decides what to do with each form.

use std::fmt;

/// Scheme prefix for temp asset cache handles.
pub const TEMP_SCHEME: &str = "temp://";

/// A parsed asset reference.
///
/// Round-trips through [`Display`](fmt::Display) and [`parse`](Self::parse):
/// formatting a parsed reference yields the original string (modulo nothing —
/// no normalization is applied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// Inline base64 payload (`data:image/png;base64,AAAA`).
    Data { mime: String, payload: String },
    /// Remote `http://` or `https://` URL.
    Remote(String),
    /// Handle into the temp asset cache (`temp://{doc}/{file}`).
    Temp { doc: String, file: String },
    /// Bare relative path, resolved against a package's `assets/` folder.
    Relative(String),
}

impl AssetRef {
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("data:") {
            let (mime, payload) = match rest.split_once(',') {
                Some((head, payload)) => {
                    let mime = head.split(';').next().unwrap_or_default();
                    (mime.to_string(), payload.to_string())
                },
                // No comma: an empty data URL. Keep whatever came before.
                None => (rest.split(';').next().unwrap_or_default().to_string(), String::new()),
            };
            return Self::Data { mime, payload };
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::Remote(raw.to_string());
        }
        if let Some(rest) = raw.strip_prefix(TEMP_SCHEME)
            && let Some((doc, file)) = rest.split_once('/')
            && !doc.is_empty()
            && !file.is_empty()
        {
            return Self::Temp { doc: doc.to_string(), file: file.to_string() };
        }
        Self::Relative(raw.to_string())
    }

    /// File extension implied by this reference, for generated filenames.
    ///
    /// For data URLs this is the mime subtype ("image/png" → "png"); for
    /// URL-shaped references it is the extension of the final path segment.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::Data { mime, .. } => mime.split('/').nth(1).filter(|s| !s.is_empty()),
            Self::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let name = path.rsplit('/').next()?;
                name.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
            },
            Self::Temp { file, .. } | Self::Relative(file) => {
                file.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
            },
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data { mime, payload } => write!(f, "data:{mime};base64,{payload}"),
            Self::Remote(url) => f.write_str(url),
            Self::Temp { doc, file } => write!(f, "{TEMP_SCHEME}{doc}/{file}"),
            Self::Relative(path) => f.write_str(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_data_url() {
        let parsed = AssetRef::parse("data:image/png;base64,AAAA");
        assert_eq!(parsed, AssetRef::Data { mime: "image/png".into(), payload: "AAAA".into() });
        assert_eq!(parsed.extension(), Some("png"));
    }

    #[rstest]
    #[case("http://example.com/a.jpg")]
    #[case("https://example.com/images/b.webp?w=800")]
    fn parse_remote(#[case] url: &str) {
        assert!(matches!(AssetRef::parse(url), AssetRef::Remote(_)));
    }

    #[test]
    fn remote_extension_ignores_query() {
        let parsed = AssetRef::parse("https://example.com/images/b.webp?w=800");
        assert_eq!(parsed.extension(), Some("webp"));
    }

    #[test]
    fn parse_temp_handle() {
        let parsed = AssetRef::parse("temp://post-1/cover.png");
        assert_eq!(parsed, AssetRef::Temp { doc: "post-1".into(), file: "cover.png".into() });
    }

    #[rstest]
    #[case("assets/cover.png")]
    #[case("cover.png")]
    // A temp handle missing its file component is not a handle.
    #[case("temp://only-doc")]
    fn parse_relative(#[case] raw: &str) {
        assert!(matches!(AssetRef::parse(raw), AssetRef::Relative(_)));
    }

    #[rstest]
    #[case("data:image/png;base64,AAAA")]
    #[case("https://example.com/a.jpg")]
    #[case("temp://doc/file.png")]
    #[case("assets/cover.png")]
    fn display_round_trips(#[case] raw: &str) {
        assert_eq!(AssetRef::parse(raw).to_string(), raw);
    }
}

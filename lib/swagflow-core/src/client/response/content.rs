use mime::Mime;

pub(crate) const APP_JSON: &str = "application/json";
pub(crate) const APP_MSGPACK: &str = "application/msgpack";

/// How a response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentKind {
    /// `application/json` and `+json` variants.
    Json,
    /// `application/msgpack` and its vendor variants.
    MsgPack,
    /// Anything else, kept as text.
    Text,
}

impl ContentKind {
    /// Classifies a `Content-Type` header value, case-insensitively.
    ///
    /// Parameters such as `charset` are ignored.
    pub(crate) fn classify(content_type: &str) -> Self {
        let content_type = content_type.trim().to_ascii_lowercase();
        match content_type.parse::<Mime>() {
            Ok(mime) => Self::from_mime(&mime),
            Err(_) if content_type.starts_with(APP_JSON) => Self::Json,
            Err(_) if content_type.starts_with(APP_MSGPACK) => Self::MsgPack,
            Err(_) => Self::Text,
        }
    }

    fn from_mime(mime: &Mime) -> Self {
        if mime.type_() != mime::APPLICATION {
            return Self::Text;
        }
        let subtype = mime.subtype().as_str();
        let suffix = mime.suffix().map(|name| name.as_str());

        if subtype == "json" || suffix == Some("json") {
            Self::Json
        } else if is_msgpack(subtype) || suffix == Some("msgpack") {
            Self::MsgPack
        } else {
            Self::Text
        }
    }
}

fn is_msgpack(subtype: &str) -> bool {
    matches!(subtype, "msgpack" | "x-msgpack" | "vnd.msgpack") || subtype.ends_with(".msgpack")
}

/// Media type without parameters, lower-cased.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

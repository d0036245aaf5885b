use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Image formats accepted in upload data URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpg,
    Jpeg,
    Gif,
    Bmp,
    Webp,
}

impl ImageMime {
    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg | Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
        }
    }
}

/// Decoded image carried by an upload request.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Parse a `data:image/<subtype>;base64,<payload>` URI.
///
/// Returns `None` when the prefix is missing, the subtype is not one of
/// png/jpg/jpeg/gif/bmp/webp, or the payload is empty or not standard
/// base64.
pub fn parse_data_uri(uri: &str) -> Option<ImagePayload> {
    let rest = uri.strip_prefix("data:image/")?;
    let (subtype, payload) = rest.split_once(";base64,")?;
    let mime = ImageMime::from_subtype(subtype)?;

    let bytes = STANDARD.decode(payload).ok()?;
    if bytes.is_empty() {
        return None;
    }

    Some(ImagePayload { mime, bytes })
}

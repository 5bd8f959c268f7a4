//! Text sticker URLs (`attp` animated, `ttp` static). Pure URL construction.

use crate::types::Sticker;
use crate::{Error, ErrorContext, Result};

pub(crate) const PROVIDER_ID: &str = "sticker.erdwpe";
pub(crate) const ERDWPE_MAKER_URL: &str = "https://api.erdwpe.com/api/maker";
const ERDWPE_API_KEY: &str = "erdwpe";

pub(crate) fn build(base: &str, text: &str, animated: bool) -> Result<Sticker> {
    let mut url = url::Url::parse(base).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid sticker endpoint: {}", e),
            ErrorContext::new()
                .with_field_path(format!("endpoints.{}", PROVIDER_ID))
                .with_source(PROVIDER_ID),
        )
    })?;
    url.path_segments_mut()
        .map_err(|_| Error::configuration("sticker endpoint cannot take path segments"))?
        .pop_if_empty()
        .push(if animated { "attp" } else { "ttp" });
    url.query_pairs_mut()
        .append_pair("text", text)
        .append_pair("apikey", ERDWPE_API_KEY);

    Ok(Sticker {
        url: url.to_string(),
        animated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_query_encoded() {
        let sticker = build(ERDWPE_MAKER_URL, "a&b=c", false).unwrap();
        assert_eq!(
            sticker.url,
            "https://api.erdwpe.com/api/maker/ttp?text=a%26b%3Dc&apikey=erdwpe"
        );
        assert!(!sticker.animated);
    }

    #[test]
    fn test_bad_base_is_configuration_error() {
        assert!(matches!(
            build("::", "x", true).unwrap_err(),
            Error::Configuration { .. }
        ));
    }
}

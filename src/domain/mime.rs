//! MIME descriptor parsing and the type-support contract
//!
//! A descriptor is `type "/" subtype [";" spaces "codecs=" token]` where each
//! token is one or more word characters. Anything else, including trailing
//! parameters, is malformed and therefore unsupported.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::MimeParseError;

/// Container formats the recorder can be asked for at the MIME level.
///
/// `Webm` parses as supported by the contract but this build ships no WebM
/// muxer; recorder construction rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Ogg,
    Webm,
    Wave,
}

impl ContainerFormat {
    /// Canonical MIME string for the format
    pub const fn as_mime(&self) -> &'static str {
        match self {
            ContainerFormat::Ogg => "audio/ogg",
            ContainerFormat::Webm => "audio/webm",
            ContainerFormat::Wave => "audio/wave",
        }
    }

    /// Conventional file extension for the format
    pub const fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Ogg => "ogg",
            ContainerFormat::Webm => "webm",
            ContainerFormat::Wave => "wav",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Parsed MIME descriptor: media type, container subtype, optional codec token.
///
/// The empty string parses to an empty descriptor, which counts as supported
/// and selects the default container (Ogg).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeDescriptor {
    kind: String,
    subtype: String,
    codec: Option<String>,
}

impl MimeDescriptor {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn codec(&self) -> Option<&str> {
        self.codec.as_deref()
    }

    /// Whether this recorder accepts the described type.
    ///
    /// Audio only; `ogg` and `webm` allow no codec token or `opus`, `wave`
    /// and `wav` allow no codec token at all.
    pub fn is_supported(&self) -> bool {
        if self.kind.is_empty() && self.subtype.is_empty() {
            return true;
        }
        if self.kind != "audio" {
            return false;
        }
        match self.subtype.as_str() {
            "ogg" | "webm" => matches!(self.codec.as_deref(), None | Some("opus")),
            "wave" | "wav" => self.codec.is_none(),
            _ => false,
        }
    }

    /// Container selected by this descriptor, if it is supported.
    pub fn container_format(&self) -> Option<ContainerFormat> {
        if !self.is_supported() {
            return None;
        }
        match self.subtype.as_str() {
            "" | "ogg" => Some(ContainerFormat::Ogg),
            "webm" => Some(ContainerFormat::Webm),
            "wave" | "wav" => Some(ContainerFormat::Wave),
            _ => None,
        }
    }
}

impl FromStr for MimeDescriptor {
    type Err = MimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(MimeDescriptor {
                kind: String::new(),
                subtype: String::new(),
                codec: None,
            });
        }

        let err = || MimeParseError { input: s.to_string() };

        let (main, params) = match s.split_once(';') {
            Some((main, params)) => (main, Some(params)),
            None => (s, None),
        };

        let (kind, subtype) = main.split_once('/').ok_or_else(err)?;
        if !is_word_token(kind) || !is_word_token(subtype) {
            return Err(err());
        }

        let codec = match params {
            None => None,
            Some(params) => {
                let value = params
                    .trim_start_matches(' ')
                    .strip_prefix("codecs=")
                    .ok_or_else(err)?;
                if !is_word_token(value) {
                    return Err(err());
                }
                Some(value.to_string())
            }
        };

        Ok(MimeDescriptor {
            kind: kind.to_string(),
            subtype: subtype.to_string(),
            codec,
        })
    }
}

fn is_word_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `mime` names a configuration this recorder can be constructed for.
///
/// Malformed descriptors are unsupported rather than errors.
pub fn is_type_supported(mime: &str) -> bool {
    mime.parse::<MimeDescriptor>()
        .map(|d| d.is_supported())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_supported() {
        assert!(is_type_supported(""));
    }

    #[test]
    fn audio_containers_without_codec_are_supported() {
        assert!(is_type_supported("audio/ogg"));
        assert!(is_type_supported("audio/webm"));
        assert!(is_type_supported("audio/wave"));
        assert!(is_type_supported("audio/wav"));
    }

    #[test]
    fn opus_codec_token_allowed_for_ogg_and_webm() {
        assert!(is_type_supported("audio/ogg;codecs=opus"));
        assert!(is_type_supported("audio/webm;codecs=opus"));
        assert!(is_type_supported("audio/ogg; codecs=opus"));
    }

    #[test]
    fn non_opus_codec_token_rejected() {
        assert!(!is_type_supported("audio/ogg;codecs=vorbis"));
        assert!(!is_type_supported("audio/webm;codecs=pcm"));
    }

    #[test]
    fn wave_rejects_any_codec_token() {
        assert!(!is_type_supported("audio/wave;codecs=opus"));
        assert!(!is_type_supported("audio/wav;codecs=pcm"));
    }

    #[test]
    fn non_audio_types_rejected() {
        assert!(!is_type_supported("video/webm"));
        assert!(!is_type_supported("text/ogg"));
    }

    #[test]
    fn unknown_subtypes_rejected() {
        assert!(!is_type_supported("audio/mp4"));
        assert!(!is_type_supported("audio/mpeg"));
    }

    #[test]
    fn malformed_descriptors_rejected() {
        assert!(!is_type_supported("audio"));
        assert!(!is_type_supported("audio/"));
        assert!(!is_type_supported("/ogg"));
        assert!(!is_type_supported("audio/ogg;"));
        assert!(!is_type_supported("audio/ogg;rate=48000"));
        assert!(!is_type_supported("audio/ogg;codecs=opus;x=1"));
    }

    #[test]
    fn empty_descriptor_selects_default_container() {
        let d: MimeDescriptor = "".parse().unwrap();
        assert_eq!(d.container_format(), Some(ContainerFormat::Ogg));
    }

    #[test]
    fn wav_aliases_wave_container() {
        let d: MimeDescriptor = "audio/wav".parse().unwrap();
        assert_eq!(d.container_format(), Some(ContainerFormat::Wave));
    }

    #[test]
    fn codec_token_is_exposed() {
        let d: MimeDescriptor = "audio/ogg;codecs=opus".parse().unwrap();
        assert_eq!(d.codec(), Some("opus"));
        assert_eq!(d.subtype(), "ogg");
    }
}

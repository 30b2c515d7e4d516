//! Accept header negotiation
//!
//! Each supported type takes the quality of the most specific range that
//! matches it (`type/subtype` over `type/*` over `*/*`). Quality 0 rules a
//! type out. The highest quality wins; ties go to the earlier entry of
//! [`MediaType::SUPPORTED`], which lists JSON first.

/// Representations the endpoint can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Html,
}

impl MediaType {
    /// Supported types in order of server preference
    pub const SUPPORTED: [MediaType; 2] = [MediaType::Json, MediaType::Html];

    /// `type/subtype` form
    pub fn essence(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Html => "text/html",
        }
    }

    /// Value for the Content-Type response header
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::Html => "text/html; charset=utf-8",
        }
    }

    fn parts(&self) -> (&'static str, &'static str) {
        match self {
            MediaType::Json => ("application", "json"),
            MediaType::Html => ("text", "html"),
        }
    }
}

/// One media range of an Accept header
#[derive(Debug, Clone, PartialEq)]
struct MediaRange<'a> {
    kind: &'a str,
    subtype: &'a str,
    quality: f32,
}

impl MediaRange<'_> {
    /// 2 for an exact match, 1 for `type/*`, 0 for `*/*`, `None` if unrelated
    fn specificity(&self, kind: &str, subtype: &str) -> Option<u8> {
        if self.kind == "*" && self.subtype == "*" {
            Some(0)
        } else if !self.kind.eq_ignore_ascii_case(kind) {
            None
        } else if self.subtype == "*" {
            Some(1)
        } else if self.subtype.eq_ignore_ascii_case(subtype) {
            Some(2)
        } else {
            None
        }
    }
}

/// Parse an Accept header, skipping malformed ranges
fn parse_accept(header: &str) -> Vec<MediaRange<'_>> {
    header
        .split(',')
        .filter_map(|item| {
            let mut params = item.split(';');
            let media = params.next()?.trim();
            let (kind, subtype) = match media.split_once('/') {
                Some((k, s)) if !k.trim().is_empty() && !s.trim().is_empty() => (k.trim(), s.trim()),
                // Some clients send a bare `*`
                _ if media == "*" => ("*", "*"),
                _ => return None,
            };

            let mut quality = 1.0;
            for param in params {
                if let Some((name, value)) = param.split_once('=') {
                    if name.trim().eq_ignore_ascii_case("q") {
                        let q = value.trim().parse::<f32>().ok().filter(|q| q.is_finite())?;
                        quality = q.clamp(0.0, 1.0);
                    }
                }
            }

            Some(MediaRange {
                kind,
                subtype,
                quality,
            })
        })
        .collect()
}

/// Quality the client assigns to `media`, 0 when not acceptable
fn quality_of(ranges: &[MediaRange<'_>], media: MediaType) -> f32 {
    let (kind, subtype) = media.parts();
    ranges
        .iter()
        .filter_map(|r| r.specificity(kind, subtype).map(|s| (s, r.quality)))
        .fold(None, |best: Option<(u8, f32)>, (s, q)| match best {
            Some((bs, _)) if bs >= s => best,
            _ => Some((s, q)),
        })
        .map(|(_, q)| q)
        .unwrap_or(0.0)
}

/// Choose the representation for a request
///
/// A missing or blank header accepts anything. `None` means neither JSON
/// nor HTML is acceptable.
pub fn negotiate(accept: Option<&str>) -> Option<MediaType> {
    let header = match accept.map(str::trim) {
        Some(h) if !h.is_empty() => h,
        _ => "*/*",
    };
    let ranges = parse_accept(header);

    let mut best: Option<(MediaType, f32)> = None;
    for media in MediaType::SUPPORTED {
        let quality = quality_of(&ranges, media);
        if quality <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_quality)) if best_quality >= quality => {}
            _ => best = Some((media, quality)),
        }
    }
    best.map(|(media, _)| media)
}

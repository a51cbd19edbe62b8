use serde::{Deserialize, Serialize};

/// The media services an embed block can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedService {
    Youtube,
    Twitch,
    Twitter,
    /// Host not recognized; the embed carries captured markup only.
    Unknown,
}

impl EmbedService {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedService::Youtube => "youtube",
            EmbedService::Twitch => "twitch",
            EmbedService::Twitter => "twitter",
            EmbedService::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "youtube" => EmbedService::Youtube,
            "twitch" => EmbedService::Twitch,
            "twitter" => EmbedService::Twitter,
            _ => EmbedService::Unknown,
        }
    }

    /// Classify a URL by its host.
    pub fn from_url(url: &str) -> Self {
        let Some(host) = host_of(url) else {
            return EmbedService::Unknown;
        };
        match host {
            "youtube.com" | "m.youtube.com" | "youtube-nocookie.com" | "youtu.be" => {
                EmbedService::Youtube
            }
            "twitch.tv" | "player.twitch.tv" | "clips.twitch.tv" => EmbedService::Twitch,
            "twitter.com" | "x.com" => EmbedService::Twitter,
            _ => EmbedService::Unknown,
        }
    }

    /// Pull the media id out of a URL for this service, if the URL is one of
    /// the forms the service uses.
    ///
    /// YouTube: `watch?v=ID`, `youtu.be/ID`, `/embed/ID`, `/shorts/ID`.
    /// Twitch: `/videos/ID`, `player.twitch.tv/?video=ID`.
    /// Twitter: `/<user>/status/ID`.
    pub fn extract_id(self, url: &str) -> Option<String> {
        match self {
            EmbedService::Youtube => {
                if let Some(id) = query_param(url, "v") {
                    return non_empty(id);
                }
                let path = path_of(url)?;
                if host_of(url) == Some("youtu.be") {
                    return non_empty(path.split('/').find(|s| !s.is_empty())?);
                }
                for prefix in ["embed/", "shorts/", "live/"] {
                    if let Some(rest) = path.strip_prefix(prefix) {
                        return non_empty(rest.split(['/', '?']).next()?);
                    }
                }
                None
            }
            EmbedService::Twitch => {
                if let Some(id) = query_param(url, "video") {
                    return non_empty(id.trim_start_matches('v'));
                }
                let path = path_of(url)?;
                let rest = path.split("videos/").nth(1)?;
                non_empty(rest.split(['/', '?']).next()?)
            }
            EmbedService::Twitter => {
                let path = path_of(url)?;
                let rest = path.split("/status/").nth(1)?;
                non_empty(rest.split(['/', '?']).next()?)
            }
            EmbedService::Unknown => None,
        }
    }

    /// Rebuild a player URL from a stored id. `None` means the service has
    /// no stable player URL and render must fall back to captured markup.
    pub fn embed_url(self, id: &str) -> Option<String> {
        match self {
            EmbedService::Youtube => Some(format!("https://www.youtube.com/embed/{id}")),
            EmbedService::Twitch => Some(format!(
                "https://player.twitch.tv/?video=v{id}&autoplay=false"
            )),
            EmbedService::Twitter | EmbedService::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// The host part of a URL, with any `www.` prefix removed.
/// Scheme-relative (`//host/...`) and bare (`host/...`) forms are accepted.
fn host_of(url: &str) -> Option<&str> {
    let rest = url
        .split_once("://")
        .map(|(_, r)| r)
        .unwrap_or(url)
        .trim_start_matches("//");
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() || !host.contains('.') {
        None
    } else {
        Some(host)
    }
}

/// The path after the host, without a leading slash, query or fragment.
fn path_of(url: &str) -> Option<&str> {
    let rest = url
        .split_once("://")
        .map(|(_, r)| r)
        .unwrap_or(url)
        .trim_start_matches("//");
    let slash = rest.find('/')?;
    let path = &rest[slash + 1..];
    Some(path.split(['?', '#']).next().unwrap_or(path))
}

/// The value of a query parameter, if present.
fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or(query);
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_hosts() {
        assert_eq!(
            EmbedService::from_url("https://www.youtube.com/watch?v=abc"),
            EmbedService::Youtube
        );
        assert_eq!(
            EmbedService::from_url("https://youtu.be/abc"),
            EmbedService::Youtube
        );
        assert_eq!(
            EmbedService::from_url("https://www.twitch.tv/videos/123"),
            EmbedService::Twitch
        );
        assert_eq!(
            EmbedService::from_url("https://x.com/user/status/99"),
            EmbedService::Twitter
        );
        assert_eq!(
            EmbedService::from_url("https://example.com/a"),
            EmbedService::Unknown
        );
    }

    #[test]
    fn youtube_id_from_all_url_forms() {
        let forms = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ?feature=share",
            "https://m.youtube.com/watch?feature=x&v=dQw4w9WgXcQ",
        ];
        for url in forms {
            assert_eq!(
                EmbedService::Youtube.extract_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "url: {url}"
            );
        }
    }

    #[test]
    fn twitch_and_twitter_ids() {
        assert_eq!(
            EmbedService::Twitch
                .extract_id("https://www.twitch.tv/videos/1234567")
                .as_deref(),
            Some("1234567")
        );
        assert_eq!(
            EmbedService::Twitch
                .extract_id("https://player.twitch.tv/?video=v1234567&parent=example.com")
                .as_deref(),
            Some("1234567")
        );
        assert_eq!(
            EmbedService::Twitter
                .extract_id("https://twitter.com/someone/status/112233?s=20")
                .as_deref(),
            Some("112233")
        );
    }

    #[test]
    fn embed_url_reconstruction() {
        assert_eq!(
            EmbedService::Youtube.embed_url("abc").as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );
        assert!(EmbedService::Twitter.embed_url("1").is_none());
    }
}

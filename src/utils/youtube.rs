//! Extract video ids from the YouTube URL shapes members paste in when
//! setting room music.

/// Accepts `youtube.com/watch?v=`, `youtu.be/` and `youtube.com/embed/`
/// links, with or without scheme and `www.`. Returns `None` for anything
/// else.
pub fn video_id(url: &str) -> Option<&str> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);

    let candidate = if let Some(query) = rest.strip_prefix("youtube.com/watch?") {
        query.split('&').find_map(|pair| pair.strip_prefix("v="))
    } else if let Some(path) = rest.strip_prefix("youtu.be/") {
        Some(path)
    } else if let Some(path) = rest.strip_prefix("youtube.com/embed/") {
        Some(path)
    } else {
        None
    }?;

    let id = candidate.split(['&', '?', '#']).next()?;
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

pub fn embed_url(video_id: &str) -> String {
    format!(
        "https://www.youtube.com/embed/{video_id}?autoplay=1&mute=0&controls=1&rel=0&modestbranding=1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_the_common_url_shapes() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(video_id("youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(
            video_id("http://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn strips_trailing_query_parameters() {
        assert_eq!(
            video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=43s"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id("https://youtu.be/dQw4w9WgXcQ?si=share"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(video_id("https://vimeo.com/12345"), None);
        assert_eq!(video_id("not a url"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?list=only"), None);
        assert_eq!(video_id(""), None);
    }

    #[test]
    fn embed_url_targets_the_video() {
        assert!(embed_url("dQw4w9WgXcQ").contains("/embed/dQw4w9WgXcQ?"));
    }
}

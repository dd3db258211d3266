/// Strips every tag from user-supplied contest text.
///
/// Contest titles, descriptions and submissions are stored and served as
/// plain text: ammonia drops the markup (and `<script>` bodies entirely),
/// then the entities it wrote for the remaining text are turned back into
/// characters so `R&D` stays `R&D`. Clients escape on render.
pub fn clean_text(input: &str) -> String {
    let stripped = ammonia::Builder::empty().clean(input).to_string();
    unescape(stripped.trim())
}

/// Like `clean_text`, for optional fields. Blank results become `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input.map(clean_text).filter(|s| !s.is_empty())
}

// Inverse of the text-node escaping ammonia serializes with.
fn unescape(text: &str) -> String {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&nbsp;", '\u{a0}'),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_and_scripts_are_removed() {
        assert_eq!(clean_text("<b>Build</b> a dApp<script>alert(1)</script>"), "Build a dApp");
        assert_eq!(clean_optional(Some("  <i></i> ")), None);
        assert_eq!(clean_optional(None), None);
    }

    #[test]
    fn plain_text_survives_unchanged() {
        assert_eq!(clean_text("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(clean_text("R&D Sprint: a < b > c"), "R&D Sprint: a < b > c");
        assert_eq!(clean_text("R&D <Sprint> done"), "R&D  done");
        assert_eq!(clean_text("caf&eacute;"), "café");
    }
}

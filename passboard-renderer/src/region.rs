//! Listing region lookup inside an HTML document.
//!
//! This is a structural scan, not an HTML parser: it walks opening tags,
//! honours quoted attribute values and skips `<!-- -->` comments. That is
//! enough to find one `<tag class="...">` element and its matching close tag
//! while leaving every other byte of the document untouched.

use passboard_core::RegionMarker;

use crate::error::RenderError;

/// Byte offsets of the listing region.
///
/// `open_start..open_end` is the opening tag, `open_end..close_start` the
/// content, `close_start..close_end` the closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub open_start: usize,
    pub open_end: usize,
    pub close_start: usize,
    pub close_end: usize,
    attrs: Vec<Attr>,
}

impl Region {
    /// Current inner content of the region.
    pub fn inner<'a>(&self, document: &'a str) -> &'a str {
        &document[self.open_end..self.close_start]
    }

    /// Value of attribute `name` on the opening tag.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .and_then(|a| a.value.as_deref())
    }

    /// Whitespace preceding the opening tag on its line.
    pub fn indent<'a>(&self, document: &'a str) -> &'a str {
        let line_start = document[..self.open_start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &document[line_start..self.open_start];
        if prefix.chars().all(|c| c == ' ' || c == '\t') {
            prefix
        } else {
            ""
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attr {
    name: String,
    value: Option<String>,
    /// Absolute byte span of `name[=value]`.
    start: usize,
    end: usize,
}

#[derive(Debug)]
struct OpenTag<'a> {
    name: &'a str,
    attrs: Vec<Attr>,
    /// Offset just past `>`.
    end: usize,
    self_closing: bool,
}

/// Find exactly one element matching `marker`.
///
/// Zero matches is [`RenderError::RegionNotFound`], several (including nested
/// ones) is [`RenderError::AmbiguousRegion`].
pub fn locate_region(document: &str, marker: &RegionMarker) -> Result<Region, RenderError> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = document[cursor..].find('<') {
        let pos = cursor + rel;
        if document[pos..].starts_with("<!--") {
            cursor = skip_comment(document, pos);
            continue;
        }
        let Some(tag) = parse_open_tag(document, pos) else {
            cursor = pos + 1;
            continue;
        };
        if tag.name.eq_ignore_ascii_case(&marker.tag) && !tag.self_closing && has_class(&tag, &marker.class) {
            let (close_start, close_end) =
                find_matching_close(document, tag.end, &marker.tag).ok_or_else(|| {
                    RenderError::UnclosedRegion {
                        marker: marker.to_string(),
                        offset: pos,
                    }
                })?;
            found.push(Region {
                open_start: pos,
                open_end: tag.end,
                close_start,
                close_end,
                attrs: tag.attrs,
            });
        }
        cursor = tag.end;
    }

    match found.len() {
        0 => Err(RenderError::RegionNotFound {
            marker: marker.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(RenderError::AmbiguousRegion {
            marker: marker.to_string(),
            count,
        }),
    }
}

/// Rebuild `document` with the region's content replaced by `inner`.
///
/// When `label` is given, the opening tag's `aria-label` is set to it
/// (replacing an existing one). Bytes outside the region are copied as-is.
pub fn replace_region(document: &str, region: &Region, inner: &str, label: Option<&str>) -> String {
    let mut out = String::with_capacity(document.len() + inner.len());
    out.push_str(&document[..region.open_start]);
    match label {
        Some(label) => out.push_str(&relabel_open_tag(document, region, label)),
        None => out.push_str(&document[region.open_start..region.open_end]),
    }
    out.push_str(inner);
    out.push_str(&document[region.close_start..]);
    out
}

fn relabel_open_tag(document: &str, region: &Region, label: &str) -> String {
    let tag = &document[region.open_start..region.open_end];
    let attr = format!("aria-label=\"{}\"", escape_attr(label));
    if let Some(existing) = region
        .attrs
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case("aria-label"))
    {
        let start = existing.start - region.open_start;
        let end = existing.end - region.open_start;
        return format!("{}{}{}", &tag[..start], attr, &tag[end..]);
    }
    let insert_at = tag.trim_end_matches('>').trim_end_matches('/').trim_end().len();
    format!("{} {}{}", &tag[..insert_at], attr, &tag[insert_at..])
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn has_class(tag: &OpenTag<'_>, class: &str) -> bool {
    tag.attrs
        .iter()
        .filter(|a| a.name.eq_ignore_ascii_case("class"))
        .filter_map(|a| a.value.as_deref())
        .any(|v| v.split_ascii_whitespace().any(|c| c == class))
}

fn skip_comment(document: &str, pos: usize) -> usize {
    match document[pos + 4..].find("-->") {
        Some(rel) => pos + 4 + rel + 3,
        None => document.len(),
    }
}

/// Parse `<name attr=value ...>` starting at `pos` (which holds `<`).
fn parse_open_tag(document: &str, pos: usize) -> Option<OpenTag<'_>> {
    let bytes = document.as_bytes();
    let mut i = pos + 1;
    let name_start = i;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-') {
        i += 1;
    }
    let name = &document[name_start..i];
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i)? {
            b'>' => {
                return Some(OpenTag { name, attrs, end: i + 1, self_closing: false });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(OpenTag { name, attrs, end: i + 2, self_closing: true });
            }
            b'/' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let attr_name = document[attr_start..i].to_string();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if bytes.get(j) == Some(&b'=') {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            match bytes.get(j)? {
                quote @ (b'"' | b'\'') => {
                    let quote = *quote;
                    let value_start = j + 1;
                    let rel = bytes[value_start..].iter().position(|&b| b == quote)?;
                    value = Some(document[value_start..value_start + rel].to_string());
                    j = value_start + rel + 1;
                }
                _ => {
                    let value_start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = Some(document[value_start..j].to_string());
                }
            }
            i = j;
        }

        if attr_name.is_empty() {
            // Stray `=` with its value already consumed; otherwise step over
            // one whole char so the next slice stays on a char boundary.
            if i == attr_start {
                i += document[i..].chars().next().map_or(1, char::len_utf8);
            }
            continue;
        }
        attrs.push(Attr {
            name: attr_name,
            value,
            start: attr_start,
            end: i,
        });
    }
}

/// Find the close tag matching an element of `tag` whose content starts at
/// `from`, accounting for nested elements of the same name.
fn find_matching_close(document: &str, from: usize, tag: &str) -> Option<(usize, usize)> {
    let mut depth = 1usize;
    let mut cursor = from;

    while let Some(rel) = document[cursor..].find('<') {
        let pos = cursor + rel;
        let rest = &document[pos..];
        if rest.starts_with("<!--") {
            cursor = skip_comment(document, pos);
            continue;
        }
        if rest.starts_with("</") && is_tag_name_at(document, pos + 2, tag) {
            let end = pos + rest.find('>')? + 1;
            depth -= 1;
            if depth == 0 {
                return Some((pos, end));
            }
            cursor = end;
            continue;
        }
        if let Some(open) = parse_open_tag(document, pos) {
            if open.name.eq_ignore_ascii_case(tag) && !open.self_closing {
                depth += 1;
            }
            cursor = open.end;
            continue;
        }
        cursor = pos + 1;
    }
    None
}

fn is_tag_name_at(document: &str, at: usize, tag: &str) -> bool {
    let Some(candidate) = document.get(at..at + tag.len()) else {
        return false;
    };
    if !candidate.eq_ignore_ascii_case(tag) {
        return false;
    }
    match document.as_bytes().get(at + tag.len()) {
        Some(b) => b.is_ascii_whitespace() || *b == b'>',
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker() -> RegionMarker {
        RegionMarker::default()
    }

    #[test]
    fn finds_single_region_and_inner() {
        let doc = "<main>\n  <section class=\"list\" id=x>\n    old\n  </section>\n</main>\n";
        let region = locate_region(doc, &marker()).unwrap();
        assert_eq!(region.inner(doc), "\n    old\n  ");
        assert_eq!(region.attr("id"), Some("x"));
        assert_eq!(region.indent(doc), "  ");
    }

    #[test]
    fn class_must_match_a_whole_token() {
        let doc = "<section class=\"listing\"></section><section class='a list b'></section>";
        let region = locate_region(doc, &marker()).unwrap();
        assert_eq!(region.attr("class"), Some("a list b"));
    }

    #[test]
    fn missing_region_is_structural_error() {
        let err = locate_region("<div class=\"list\"></div>", &marker()).unwrap_err();
        assert!(matches!(err, RenderError::RegionNotFound { .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn two_regions_are_ambiguous() {
        let doc = "<section class=list></section><SECTION CLASS=\"list\"></SECTION>";
        let err = locate_region(doc, &marker()).unwrap_err();
        assert!(matches!(err, RenderError::AmbiguousRegion { count: 2, .. }));
    }

    #[test]
    fn commented_out_region_is_ignored() {
        let doc = "<!-- <section class=\"list\"></section> --><section class=\"list\">x</section>";
        let region = locate_region(doc, &marker()).unwrap();
        assert_eq!(region.inner(doc), "x");
    }

    #[test]
    fn nested_sections_match_outer_close() {
        let doc = "<section class=\"list\"><section>inner</section>tail</section><p>after</p>";
        let region = locate_region(doc, &marker()).unwrap();
        assert_eq!(region.inner(doc), "<section>inner</section>tail");
        assert_eq!(&doc[region.close_end..], "<p>after</p>");
    }

    #[test]
    fn unclosed_region_is_reported() {
        let err = locate_region("<section class=\"list\"><p>", &marker()).unwrap_err();
        assert!(matches!(err, RenderError::UnclosedRegion { offset: 0, .. }));
    }

    #[test]
    fn quoted_gt_inside_attribute_does_not_end_tag() {
        let doc = "<section data-x=\"a>b\" class=\"list\">in</section>";
        let region = locate_region(doc, &marker()).unwrap();
        assert_eq!(region.inner(doc), "in");
    }

    #[test]
    fn stray_equals_next_to_multibyte_text_is_skipped() {
        for doc in [
            "<section =\"x\"é class=\"list\">in</section>",
            "<section = é class=\"list\">in</section>",
            "<section =ü class=\"list\">in</section>",
        ] {
            let region = locate_region(doc, &marker()).unwrap();
            assert_eq!(region.inner(doc), "in", "doc: {doc}");
        }
    }

    #[test]
    fn replace_keeps_outside_bytes_and_sets_label() {
        let doc = "<p>keep</p><section class=\"list\" aria-label=\"old\">x</section><p>tail</p>";
        let region = locate_region(doc, &marker()).unwrap();
        let out = replace_region(doc, &region, "NEW", Some("Codes & \"keys\""));
        assert_eq!(
            out,
            "<p>keep</p><section class=\"list\" aria-label=\"Codes &amp; &quot;keys&quot;\">NEW</section><p>tail</p>"
        );
    }

    #[test]
    fn label_is_appended_when_absent() {
        let doc = "<section class=\"list\">x</section>";
        let region = locate_region(doc, &marker()).unwrap();
        let out = replace_region(doc, &region, "", Some("Codes"));
        assert_eq!(out, "<section class=\"list\" aria-label=\"Codes\"></section>");
    }
}

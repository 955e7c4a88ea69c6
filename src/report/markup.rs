//! Minimal tag scanning for report markup.
//!
//! Enough HTML to walk Extent reports: balanced matching of one tag name,
//! `class` filtering, and text extraction. Tag and attribute names match
//! case-insensitively on ASCII.

/// Byte offsets of one element within a [`Fragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    /// Offset of the `<` of the opening tag.
    pub start: usize,
    /// Offset just past the `>` of the opening tag.
    pub open_end: usize,
    /// Offset of the closing tag, or the fragment end if it never closes.
    pub inner_end: usize,
    /// Offset just past the closing tag.
    pub end: usize,
}

/// Owned lowercase copy of a document, used for case-insensitive searches.
pub struct Document<'a> {
    html: &'a str,
    lc: String,
}

impl<'a> Document<'a> {
    pub fn new(html: &'a str) -> Self {
        // ASCII lowercasing keeps byte offsets identical between both copies.
        Self {
            html,
            lc: html.to_ascii_lowercase(),
        }
    }

    pub fn root(&self) -> Fragment<'_> {
        Fragment {
            html: self.html,
            lc: &self.lc,
        }
    }
}

/// A slice of the document paired with its lowercase twin.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    html: &'a str,
    lc: &'a str,
}

impl<'a> Fragment<'a> {
    /// Top-level `tag` elements, optionally filtered by class.
    ///
    /// A matching element's contents are skipped, so nested matches are not
    /// reported twice. Non-matching elements are searched inside.
    pub fn elements(&self, tag: &str, class: Option<&str>) -> Vec<Element> {
        let mut found = Vec::new();
        let mut pos = 0;

        while let Some(start) = find_open(self.lc, tag, pos) {
            let Some(el) = element_at(self.lc, tag, start) else {
                break;
            };
            let matches = match class {
                Some(class) => has_class(&self.lc[el.start..el.open_end], class),
                None => true,
            };
            if matches {
                found.push(el);
                pos = el.end;
            } else {
                pos = el.open_end;
            }
        }

        found
    }

    pub fn first(&self, tag: &str, class: Option<&str>) -> Option<Element> {
        self.elements(tag, class).into_iter().next()
    }

    /// Contents of `el` as a new fragment.
    pub fn inner(&self, el: &Element) -> Fragment<'a> {
        Fragment {
            html: &self.html[el.open_end..el.inner_end],
            lc: &self.lc[el.open_end..el.inner_end],
        }
    }

    /// Visible text of `el`: tags stripped, entities decoded, whitespace collapsed.
    pub fn text(&self, el: &Element) -> String {
        normalize_ws(&decode_entities(&strip_tags(&self.html[el.open_end..el.inner_end])))
    }
}

fn is_tag_boundary(byte: Option<&u8>) -> bool {
    matches!(byte, Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
}

fn find_open(lc: &str, tag: &str, from: usize) -> Option<usize> {
    let needle = format!("<{tag}");
    let mut pos = from;
    loop {
        let at = lc.get(pos..)?.find(&needle)? + pos;
        if is_tag_boundary(lc.as_bytes().get(at + needle.len())) {
            return Some(at);
        }
        pos = at + needle.len();
    }
}

/// Returns `(start, end)` of the next closing tag for `tag`.
fn find_close(lc: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let needle = format!("</{tag}");
    let mut pos = from;
    loop {
        let at = lc.get(pos..)?.find(&needle)? + pos;
        let after = at + needle.len();
        if is_tag_boundary(lc.as_bytes().get(after)) {
            let end = lc[after..].find('>').map(|i| after + i + 1).unwrap_or(lc.len());
            return Some((at, end));
        }
        pos = after;
    }
}

fn element_at(lc: &str, tag: &str, start: usize) -> Option<Element> {
    let open_end = lc[start..].find('>')? + start + 1;

    let mut depth = 1usize;
    let mut pos = open_end;
    loop {
        let Some((close_start, close_end)) = find_close(lc, tag, pos) else {
            return Some(Element {
                start,
                open_end,
                inner_end: lc.len(),
                end: lc.len(),
            });
        };

        match find_open(lc, tag, pos) {
            Some(nested) if nested < close_start => {
                depth += 1;
                pos = nested + 1;
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(Element {
                        start,
                        open_end,
                        inner_end: close_start,
                        end: close_end,
                    });
                }
                pos = close_end;
            }
        }
    }
}

/// Value of attribute `name` in an opening tag (already lowercased).
fn attr_value<'t>(open_tag: &'t str, name: &str) -> Option<&'t str> {
    let bytes = open_tag.as_bytes();
    let mut pos = 0;

    while let Some(rel) = open_tag[pos..].find(name) {
        let at = pos + rel;
        pos = at + name.len();

        let preceded_by_space = at > 0 && bytes[at - 1].is_ascii_whitespace();
        if !preceded_by_space {
            continue;
        }

        let rest = open_tag[pos..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();

        return match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                Some(body.find(quote).map_or(body, |end| &body[..end]))
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .unwrap_or(rest.len());
                Some(&rest[..end])
            }
        };
    }

    None
}

fn has_class(open_tag: &str, class: &str) -> bool {
    attr_value(open_tag, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Remove all `<...>` tags.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities Extent emits. `&amp;` goes last so an
/// escaped entity is not decoded twice.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into one space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

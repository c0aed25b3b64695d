#![forbid(unsafe_code)]

//! Markup fragments and a tolerant fragment parser.
//!
//! Content handed to the popup arrives either as markup (`title`, `html`,
//! `footer`, button texts), as plain text (`titleText`, `text`), or as a
//! prebuilt element tree. [`Content`] carries that distinction through the
//! engine so the markup service can decide how to insert it.
//!
//! The parser is deliberately forgiving: unknown entities pass through
//! untouched, unmatched closing tags are ignored, and unclosed elements are
//! closed at the end of input. It never fails.

use crate::document::VOID_TAGS;

/// A detached element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Markup>,
    },
    Text(String),
}

impl Markup {
    /// Start an element.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Add an attribute (no-op on text nodes).
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Append a child (no-op on text nodes).
    #[must_use]
    pub fn child(mut self, child: Markup) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Tag name, if an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            Self::Text(_) => None,
        }
    }
}

/// Content for a text-bearing region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Parsed as markup on insertion.
    Html(String),
    /// Inserted verbatim as a text node.
    Text(String),
    /// A prebuilt element moved into the region.
    Element(Markup),
}

impl Content {
    /// Whether inserting this content produces nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Html(s) | Self::Text(s) => s.is_empty(),
            Self::Element(_) => false,
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Html(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Html(s)
    }
}

impl From<Markup> for Content {
    fn from(m: Markup) -> Self {
        Self::Element(m)
    }
}

/// Escape text for inclusion in markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let name = &rest[1..semi];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                "times" => Some('\u{d7}'),
                _ => name
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &rest[len..];
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

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eat_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !f(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn bump(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Parse `<tag attrs...>` after the `<`; returns (tag, attrs, self_closing).
    fn open_tag(&mut self) -> (String, Vec<(String, String)>, bool) {
        let tag = self
            .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
            .to_ascii_lowercase();
        let mut attrs = Vec::new();
        loop {
            self.eat_ws();
            if self.bump("/>") {
                return (tag, attrs, true);
            }
            if self.bump(">") || self.rest().is_empty() {
                return (tag, attrs, false);
            }
            let name = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'))
                .to_ascii_lowercase();
            if name.is_empty() {
                // Stray `/` or `=`; skip it.
                self.pos += self.rest().chars().next().map_or(0, char::len_utf8);
                continue;
            }
            self.eat_ws();
            let value = if self.bump("=") {
                self.eat_ws();
                if self.bump("\"") {
                    let v = self.take_while(|c| c != '"');
                    self.bump("\"");
                    v
                } else if self.bump("'") {
                    let v = self.take_while(|c| c != '\'');
                    self.bump("'");
                    v
                } else {
                    self.take_while(|c| !c.is_whitespace() && c != '>')
                }
            } else {
                ""
            };
            attrs.push((name, decode_entities(value)));
        }
    }
}

/// Parse a markup fragment into a forest of element trees.
pub fn parse_fragment(src: &str) -> Vec<Markup> {
    // Stack of open elements; index 0 collects top-level nodes.
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<Markup>)> =
        vec![(String::new(), Vec::new(), Vec::new())];
    let mut p = Parser { src, pos: 0 };

    fn close_top(stack: &mut Vec<(String, Vec<(String, String)>, Vec<Markup>)>) {
        if stack.len() < 2 {
            return;
        }
        if let Some((tag, attrs, children)) = stack.pop()
            && let Some(parent) = stack.last_mut()
        {
            parent.2.push(Markup::Element {
                tag,
                attrs,
                children,
            });
        }
    }

    while !p.rest().is_empty() {
        if p.bump("<!--") {
            match p.rest().find("-->") {
                Some(end) => p.pos += end + 3,
                None => p.pos = src.len(),
            }
        } else if p.rest().starts_with("</") {
            p.pos += 2;
            let tag = p
                .take_while(|c| c.is_ascii_alphanumeric() || c == '-')
                .to_ascii_lowercase();
            p.take_while(|c| c != '>');
            p.bump(">");
            if let Some(depth) = stack.iter().rposition(|(t, _, _)| *t == tag)
                && depth > 0
            {
                while stack.len() > depth {
                    close_top(&mut stack);
                }
            }
        } else if p.rest().starts_with('<')
            && p.rest()[1..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            p.pos += 1;
            let (tag, attrs, self_closing) = p.open_tag();
            if self_closing || VOID_TAGS.contains(&tag.as_str()) {
                if let Some(top) = stack.last_mut() {
                    top.2.push(Markup::Element {
                        tag,
                        attrs,
                        children: Vec::new(),
                    });
                }
            } else {
                stack.push((tag, attrs, Vec::new()));
            }
        } else {
            let start = p.pos;
            p.pos += p.rest().chars().next().map_or(1, char::len_utf8);
            p.take_while(|c| c != '<');
            let text = decode_entities(&src[start..p.pos]);
            if let Some(top) = stack.last_mut() {
                top.2.push(Markup::Text(text));
            }
        }
    }
    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(_, _, children)| children).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let parsed = parse_fragment(r#"<div class="a b" id=x><b>bold</b> tail</div>"#);
        assert_eq!(
            parsed,
            vec![
                Markup::element("div")
                    .attr("class", "a b")
                    .attr("id", "x")
                    .child(Markup::element("b").child(Markup::text("bold")))
                    .child(Markup::text(" tail"))
            ]
        );
    }

    #[test]
    fn void_and_self_closing_tags_have_no_children() {
        let parsed = parse_fragment("<input autofocus><br/>text");
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], Markup::element("input").attr("autofocus", ""));
        assert_eq!(parsed[1], Markup::element("br"));
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(parse_fragment("&times;"), vec![Markup::text("\u{d7}")]);
        assert_eq!(parse_fragment("a &amp; b &bogus;"), vec![Markup::text("a & b &bogus;")]);
    }

    #[test]
    fn unmatched_closers_are_ignored_and_open_tags_closed() {
        let parsed = parse_fragment("</p><span>x");
        assert_eq!(parsed, vec![Markup::element("span").child(Markup::text("x"))]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(parse_fragment("a<!-- hidden -->b"), vec![Markup::text("a"), Markup::text("b")]);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        assert_eq!(parse_fragment("1 < 2"), vec![Markup::text("1 "), Markup::text("< 2")]);
    }

    proptest::proptest! {
        #[test]
        fn escaped_text_parses_back_to_itself(s in "\\PC{0,40}") {
            let text: String = parse_fragment(&escape_text(&s))
                .into_iter()
                .map(|m| match m {
                    Markup::Text(t) => t,
                    Markup::Element { .. } => String::from("<element>"),
                })
                .collect();
            proptest::prop_assert_eq!(text, s);
        }

        #[test]
        fn parser_never_panics(s in "[<>/a-z =\"'&;!-]{0,60}") {
            let _ = parse_fragment(&s);
        }
    }

    #[test]
    fn escape_round_trip() {
        assert_eq!(escape_text("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attr("\"q\""), "&quot;q&quot;");
    }
}

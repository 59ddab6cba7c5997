//! HTML page generation: asset tag injection and minification.

use std::collections::HashSet;

use extpack_core::pipeline::{OutputOptions, StyleOptions};
use extpack_core::MinifyOptions;

/// Elements whose content is copied verbatim by the minifier.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

/// Elements whose neighbouring whitespace never renders. Whitespace next to
/// any other tag collapses to a single space.
const BLOCK_ELEMENTS: &[&str] = &[
    "html", "head", "body", "title", "meta", "link", "base", "script", "style", "noscript",
    "template", "div", "p", "ul", "ol", "li", "dl", "dt", "dd", "section", "article", "aside",
    "header", "footer", "main", "nav", "table", "thead", "tbody", "tfoot", "tr", "td", "th",
    "caption", "form", "fieldset", "legend", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "br",
    "pre", "blockquote", "figure", "figcaption", "details", "summary", "dialog", "select", "option",
];

/// Builds the `<script>` and `<link>` tags a page needs for `chunks`.
///
/// Stylesheet links are only emitted for chunks in `styled`.
pub fn asset_tags(
    chunks: &[String],
    styled: &HashSet<&str>,
    output: &OutputOptions,
    styles: &StyleOptions,
) -> String {
    let mut scripts = String::new();
    let mut links = String::new();
    for chunk in chunks {
        let script = output.filename.replace("[name]", chunk);
        scripts.push_str(&format!("<script defer=\"defer\" src=\"{script}\"></script>"));
        if styled.contains(chunk.as_str()) {
            let href = styles.file_name_for(chunk);
            links.push_str(&format!("<link href=\"{href}\" rel=\"stylesheet\">"));
        }
    }
    scripts + &links
}

/// Inserts `tags` right before `</head>`, or at the start of the document
/// when it has no head.
pub fn inject(template: &str, tags: &str) -> String {
    if tags.is_empty() {
        return template.to_string();
    }
    match find_ignore_case(template, "</head>") {
        Some(pos) => format!("{}{}{}", &template[..pos], tags, &template[pos..]),
        None => format!("{tags}{template}"),
    }
}

/// Minifies an HTML document according to `opts`.
pub fn minify(input: &str, opts: &MinifyOptions) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    // Whether the last thing written was a block-level tag (or nothing yet).
    let mut after_block = true;

    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").map(|i| i + 7).unwrap_or(rest.len());
            if !opts.remove_comments {
                out.push_str(&rest[..end]);
            }
            rest = &rest[end..];
            continue;
        }

        if starts_tag(rest) {
            let end = tag_end(rest);
            let tag = &rest[..end];
            after_block = is_block_tag(tag);
            if opts.remove_attribute_quotes {
                out.push_str(&unquote_attributes(tag));
            } else {
                out.push_str(tag);
            }
            rest = &rest[end..];

            if let Some(name) = raw_text_element(tag) {
                let close = format!("</{name}");
                let body_end = find_ignore_case(rest, &close).unwrap_or(rest.len());
                out.push_str(&rest[..body_end]);
                rest = &rest[body_end..];
            }
            continue;
        }

        let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        let text_end = rest[first..]
            .find('<')
            .map(|i| i + first)
            .unwrap_or(rest.len());
        let text = &rest[..text_end];
        rest = &rest[text_end..];
        if opts.collapse_whitespace {
            let before_block = next_tag_is_block(rest);
            push_collapsed(&mut out, text, after_block, before_block);
        } else {
            out.push_str(text);
        }
        after_block = false;
    }

    out
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Byte index just past the `>` closing the tag at the start of `s`.
fn tag_end(s: &str) -> usize {
    let mut quote = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    s.len()
}

fn raw_text_element(tag: &str) -> Option<&'static str> {
    if tag.starts_with("</") || tag.starts_with("<!") || tag.ends_with("/>") {
        return None;
    }
    let name = tag_name(tag);
    RAW_TEXT_ELEMENTS.iter().copied().find(|raw| *raw == name)
}

fn unquote_attributes(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut rest = tag;

    while let Some(pos) = rest.find(['"', '\'']) {
        let quote = if rest[pos..].starts_with('"') { '"' } else { '\'' };
        let Some(len) = rest[pos + 1..].find(quote) else {
            break;
        };
        let value = &rest[pos + 1..pos + 1 + len];
        let after = &rest[pos + 2 + len..];

        out.push_str(&rest[..pos]);
        if rest[..pos].ends_with('=') && can_unquote(value) && !after.starts_with('/') {
            out.push_str(value);
        } else {
            out.push(quote);
            out.push_str(value);
            out.push(quote);
        }
        rest = after;
    }

    out.push_str(rest);
    out
}

fn can_unquote(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '=' | '<' | '>'))
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Doctypes and other `<!` declarations count as block-level.
fn is_block_tag(tag: &str) -> bool {
    if tag.starts_with("<!") {
        return true;
    }
    let name = tag_name(tag);
    BLOCK_ELEMENTS.iter().any(|block| *block == name)
}

/// End of input counts as a block boundary. Comments are looked through.
fn next_tag_is_block(rest: &str) -> bool {
    let mut rest = rest;
    while rest.starts_with("<!--") {
        match rest[4..].find("-->") {
            Some(i) => rest = rest[i + 7..].trim_start(),
            None => return true,
        }
    }
    if rest.is_empty() {
        return true;
    }
    starts_tag(rest) && is_block_tag(&rest[..tag_end(rest)])
}

/// Writes `text` with whitespace runs collapsed to one space. Leading and
/// trailing runs are dropped when they touch a block-level tag.
fn push_collapsed(out: &mut String, text: &str, after_block: bool, before_block: bool) {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
                in_space = true;
            }
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    let mut collapsed = collapsed.as_str();
    if after_block || out.ends_with(' ') {
        collapsed = collapsed.trim_start_matches(' ');
    }
    if before_block {
        collapsed = collapsed.trim_end_matches(' ');
    }
    out.push_str(collapsed);
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

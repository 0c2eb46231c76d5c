//! Plain-text excerpts for feed summaries. The post body is flattened to text
//! and pruned to a fixed number of characters without splitting words.

use pulldown_cmark::{Event, Options, Parser, Tag};

/// The default excerpt length, in characters.
pub const DEFAULT_EXCERPT_LENGTH: usize = 180;

/// Appended to excerpts that were cut short.
const ELLIPSIS: char = '…';

/// Flattens markdown into plain text and prunes it to `length` characters.
pub fn excerpt(markdown: &str, length: usize) -> String {
    prune(&plain_text(markdown), length)
}

/// Renders markdown to plain text. Only text and inline code survive; line
/// breaks and block boundaries become single spaces.
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    let push_space = |out: &mut String| {
        if !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    };

    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => push_space(&mut out),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(_))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_)) => push_space(&mut out),
            _ => {}
        }
    }

    out.trim_end().to_owned()
}

/// Prunes `text` to at most `length` characters (ellipsis included) on a word
/// boundary. Text that already fits is returned unchanged.
pub fn prune(text: &str, length: usize) -> String {
    if text.chars().count() <= length {
        return text.to_owned();
    }
    if length == 0 {
        return String::new();
    }

    // Leave room for the ellipsis.
    let budget = length - 1;
    let cut = text
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or_else(|| text.len());

    // If the cut lands mid-word, back up to the previous whitespace.
    let head = &text[..cut];
    let mid_word = !text[cut..].starts_with(char::is_whitespace)
        && !head.ends_with(char::is_whitespace);
    let head = match mid_word {
        true => match head.rfind(char::is_whitespace) {
            Some(i) => &head[..i],
            None => head,
        },
        false => head,
    };

    let mut pruned = head
        .trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .to_owned();
    pruned.push(ELLIPSIS);
    pruned
}

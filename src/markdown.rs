use crate::post::Image;
use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag};
use url::{ParseError as UrlParseError, Url};

/// The result of converting a post body.
pub struct Rendered {
    /// The body as HTML.
    pub html: String,

    /// The first image in the body, if any.
    pub featured_image: Option<Image>,
}

/// Converts markdown to HTML. Relative link and image destinations are resolved
/// against `asset_base` (the post's asset directory URL, with a trailing
/// slash) so they keep working from feed pages and from a permalinked post
/// page.
pub fn to_html(markdown: &str, asset_base: &Url) -> Result<Rendered, UrlParseError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let event_converter = EventConverter { asset_base };
    let events = Parser::new_ext(markdown, options)
        .map(|ev| event_converter.convert(ev))
        .collect::<Result<Vec<Event>, UrlParseError>>()?;

    let featured_image = first_image(&events);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html, events.into_iter());
    Ok(Rendered {
        html,
        featured_image,
    })
}

/// Finds the first image and collects its alt text (the text events nested in
/// the image tag).
fn first_image(events: &[Event]) -> Option<Image> {
    let start = events.iter().position(|ev| match ev {
        Event::Start(Tag::Image(..)) => true,
        _ => false,
    })?;

    // Destinations were resolved already; anything still unparseable (an
    // empty or fragment-only destination) can't be a thumbnail.
    let src = match &events[start] {
        Event::Start(Tag::Image(_, dest, _)) => match Url::parse(dest) {
            Ok(src) => src,
            Err(_) => return None,
        },
        _ => return None,
    };

    let mut alt = String::new();
    for ev in &events[start + 1..] {
        match ev {
            Event::End(Tag::Image(..)) => break,
            Event::Text(text) | Event::Code(text) => alt.push_str(text),
            _ => {}
        }
    }

    Some(Image { src, alt })
}

struct EventConverter<'a> {
    asset_base: &'a Url,
}

impl<'a> EventConverter<'a> {
    fn convert<'b>(&self, ev: Event<'b>) -> Result<Event<'b>, UrlParseError> {
        Ok(match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)?),
            Event::End(tag) => Event::End(self.convert_tag(tag)?),
            _ => ev,
        })
    }

    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Result<Tag<'b>, UrlParseError> {
        Ok(match tag {
            Tag::Image(link_type, dest, title) => {
                Tag::Image(link_type, self.resolve(dest)?, title)
            }
            // Email autolinks carry a bare address; the renderer adds the
            // `mailto:` itself.
            Tag::Link(LinkType::Email, dest, title) => Tag::Link(LinkType::Email, dest, title),
            Tag::Link(link_type, dest, title) => Tag::Link(link_type, self.resolve(dest)?, title),
            _ => tag,
        })
    }

    fn resolve<'b>(&self, dest: CowStr<'b>) -> Result<CowStr<'b>, UrlParseError> {
        if dest.is_empty() || dest.starts_with('#') {
            return Ok(dest);
        }
        Ok(CowStr::Boxed(
            self.asset_base.join(&dest)?.to_string().into_boxed_str(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_relative_image_is_resolved() -> Result<(), UrlParseError> {
        let base = Url::parse("https://example.com/posts/bundle/")?;
        let rendered = to_html("Intro\n\n![A cover](cover.jpg)\n\n![Second](b.png)", &base)?;
        assert!(rendered
            .html
            .contains(r#"src="https://example.com/posts/bundle/cover.jpg""#));
        let featured = rendered.featured_image.expect("featured image");
        assert_eq!("https://example.com/posts/bundle/cover.jpg", featured.src.as_str());
        assert_eq!("A cover", featured.alt);
        Ok(())
    }

    #[test]
    fn test_absolute_and_fragment_links_are_kept() -> Result<(), UrlParseError> {
        let base = Url::parse("https://example.com/posts/")?;
        let rendered = to_html("[remote](https://rust-lang.org/) [anchor](#top)", &base)?;
        assert!(rendered.html.contains(r#"href="https://rust-lang.org/""#));
        assert!(rendered.html.contains(r##"href="#top""##));
        assert!(rendered.featured_image.is_none());
        Ok(())
    }
}

//! Conversions from view models into template [`Value`]s. Missing optional
//! values become [`Value::Nil`] so templates can test them with `{{if ...}}`.

use crate::author::Author;
use crate::config::{Header, NavLink, Seo};
use crate::post::Image;
use crate::render::PostSummary;
use crate::tag::Tag;
use gtmpl::Value;
use std::collections::HashMap;
use url::Url;

/// Builds a [`Value::Object`] from key/value pairs.
pub(crate) fn object<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Object(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<HashMap<String, Value>>(),
    )
}

pub(crate) fn string<S: Into<String>>(s: S) -> Value {
    Value::String(s.into())
}

pub(crate) fn href(url: &Url) -> Value {
    Value::String(url.to_string())
}

pub(crate) fn number(n: usize) -> Value {
    Value::from(n as i64)
}

pub(crate) fn option<T, F>(value: Option<T>, f: F) -> Value
where
    F: FnOnce(T) -> Value,
{
    match value {
        Some(value) => f(value),
        None => Value::Nil,
    }
}

pub(crate) fn array<T, I, F>(items: I, f: F) -> Value
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Value,
{
    Value::Array(items.into_iter().map(f).collect())
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        object(vec![("tag", string(t.name.as_str())), ("url", href(&t.url))])
    }
}

impl From<&Image> for Value {
    fn from(image: &Image) -> Value {
        object(vec![("src", href(&image.src)), ("alt", string(image.alt.as_str()))])
    }
}

impl From<&Author> for Value {
    fn from(author: &Author) -> Value {
        object(vec![
            ("id", string(author.id.as_str())),
            ("name", string(author.name.as_str())),
            ("avatar", Value::from(&author.avatar)),
        ])
    }
}

impl From<&PostSummary<'_>> for Value {
    /// Converts a [`PostSummary`] into an object with the summary's fields.
    /// `author` and `thumbnail` are nil when unresolved.
    fn from(summary: &PostSummary<'_>) -> Value {
        object(vec![
            ("slug", string(summary.slug.as_str())),
            ("title", string(summary.title.as_str())),
            ("display_slug", string(summary.display_slug.as_str())),
            ("url", href(&summary.url)),
            ("description", string(summary.description.as_str())),
            ("date", string(summary.date.as_str())),
            ("author", option(summary.author, Value::from)),
            ("thumbnail", option(summary.thumbnail.as_ref(), Value::from)),
            ("tags", array(&summary.tags, Value::from)),
        ])
    }
}

impl From<&Seo> for Value {
    fn from(seo: &Seo) -> Value {
        object(vec![
            ("title", string(seo.title.as_str())),
            ("images", array(&seo.images, href)),
            ("keywords", array(&seo.keywords, |k| string(k.as_str()))),
        ])
    }
}

impl From<&NavLink> for Value {
    fn from(link: &NavLink) -> Value {
        object(vec![("label", string(link.label.as_str())), ("href", href(&link.href))])
    }
}

impl From<&Header> for Value {
    fn from(header: &Header) -> Value {
        object(vec![
            ("logo", option(header.logo.as_ref(), href)),
            ("links", array(&header.links, Value::from)),
        ])
    }
}

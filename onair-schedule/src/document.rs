//! Typed query surface over the `scraper` HTML parser.
//!
//! The rest of the crate only sees [`Document`], [`Node`] and [`Query`];
//! CSS selector strings are compiled once into [`Query`] values and never
//! leave this crate.
use onair_common::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

use crate::ScheduleError;

/// A compiled CSS selector.
#[derive(Debug, Clone)]
pub struct Query {
    css: &'static str,
    selector: Selector,
}

impl Query {
    pub fn new(css: &'static str) -> Result<Self, ScheduleError> {
        let selector = Selector::parse(css).map_err(|e| ScheduleError::Selector {
            selector: css,
            message: e.to_string(),
        })?;
        Ok(Self { css, selector })
    }

    pub fn css(&self) -> &'static str {
        self.css
    }
}

/// A parsed HTML page.
///
/// Not `Send`: parse, query and drop it between suspension points.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Every element matching `query`, in document order.
    pub fn query<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = Node<'a>> {
        self.html.select(&query.selector).map(Node)
    }

    pub fn query_first<'a>(&'a self, query: &'a Query) -> Option<Node<'a>> {
        self.query(query).next()
    }
}

/// One element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(ElementRef<'a>);

impl<'a> Node<'a> {
    /// Descendants matching `query`, in document order.
    pub fn query<'q>(self, query: &'q Query) -> impl Iterator<Item = Node<'a>> + 'q
    where
        'a: 'q,
    {
        self.0.select(&query.selector).map(Node)
    }

    pub fn query_first<'q>(self, query: &'q Query) -> Option<Node<'a>>
    where
        'a: 'q,
    {
        self.query(query).next()
    }

    /// Raw concatenated text content (like DOM `textContent`).
    pub fn text_content(self) -> String {
        self.0.text().collect()
    }

    /// Text content trimmed with internal whitespace collapsed.
    pub fn text(self) -> String {
        collapse_whitespace(&self.text_content())
    }

    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// Rendered text, close to DOM `innerText`: whitespace runs collapse to
    /// one space and `<br>` / block boundaries become line breaks.
    pub fn rendered_text(self) -> String {
        let mut raw = String::new();
        for node in self.0.descendants().skip(1) {
            match node.value() {
                scraper::Node::Text(text) => raw.push_str(&text.replace('\n', " ")),
                scraper::Node::Element(el) => {
                    if matches!(el.name(), "br" | "p" | "div" | "li" | "tr") {
                        raw.push('\n');
                    }
                }
                _ => {}
            }
        }
        raw.split('\n')
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

use super::element_text;
use crate::text::clean_text;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("Invalid selector"));

static HTML_LANG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("html[lang]").expect("Invalid selector"));

static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).expect("Invalid selector"));

/// Page-level fallbacks: Open Graph and plain `<meta>` conventions.
pub(crate) struct MetaTags<'a> {
    document: &'a Html,
}

impl<'a> MetaTags<'a> {
    pub(crate) fn new(document: &'a Html) -> Self {
        Self { document }
    }

    /// `content` of the first `<meta>` whose `property` or `name` is `key`.
    fn meta(&self, key: &str) -> Option<String> {
        let selector =
            Selector::parse(&format!(r#"meta[property="{key}"], meta[name="{key}"]"#)).ok()?;
        self.document
            .select(&selector)
            .filter_map(|meta| meta.value().attr("content"))
            .map(clean_text)
            .find(|content| !content.is_empty())
    }

    pub(crate) fn title(&self) -> Option<String> {
        self.meta("og:title").or_else(|| {
            self.document
                .select(&H1_SELECTOR)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    pub(crate) fn description(&self) -> Option<String> {
        self.meta("og:description")
            .or_else(|| self.meta("description"))
    }

    pub(crate) fn image(&self) -> Option<String> {
        self.meta("og:image")
    }

    pub(crate) fn keywords(&self) -> Option<String> {
        self.meta("keywords")
    }

    /// `meta[name=author]`, else the site name when it is short enough to be
    /// a publication name rather than a tagline.
    pub(crate) fn author(&self, site_name_max_len: usize) -> Option<String> {
        self.meta("author").or_else(|| {
            self.site_name()
                .filter(|site| site.chars().count() < site_name_max_len)
        })
    }

    pub(crate) fn site_name(&self) -> Option<String> {
        self.meta("og:site_name")
    }

    /// `<html lang>`, else `og:locale`.
    pub(crate) fn language(&self) -> Option<String> {
        self.document
            .select(&HTML_LANG_SELECTOR)
            .filter_map(|html| html.value().attr("lang"))
            .map(clean_text)
            .find(|lang| !lang.is_empty())
            .or_else(|| self.meta("og:locale"))
    }

    pub(crate) fn canonical_url(&self) -> Option<String> {
        self.document
            .select(&CANONICAL_SELECTOR)
            .filter_map(|link| link.value().attr("href"))
            .map(clean_text)
            .find(|href| !href.is_empty())
            .or_else(|| self.meta("og:url"))
    }
}

// src/services/listing.rs

//! Extraction for auxiliary event-listing pages.
//!
//! Three strategies, tried in this order:
//! 1. [`SelectorStrategy`]: configured selectors for a known layout.
//! 2. [`ClassKeywordStrategy`]: containers whose class names look like
//!    event items.
//! 3. [`TextKeywordStrategy`]: the innermost elements whose text mentions a
//!    domain keyword.
//!
//! The heuristics trade precision for not coming back empty when the site's
//! markup drifts. The today-filter throws out most false positives.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{EventRecord, SourceConfig, SourceSelectors, non_empty};
use crate::services::extract::{ExtractContext, ExtractStrategy};
use crate::utils::{contains_ignore_case, element_text, parse_selector};

/// Date fragments as listing pages write them ("2025年8月15日", "8/15", ...).
static DATE_FRAGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:\d{4}\s*年\s*)?\d{1,2}\s*月\s*\d{1,2}\s*日|(?:\d{4}/)?\d{1,2}/\d{1,2}").ok()
});

const CONTAINER_TAGS: &str = "div, li, article, section, dl, tr";
const HEADING_TAGS: &str = "h1, h2, h3, h4, h5, h6";
const SKIPPED_TAGS: [&str; 6] = ["html", "head", "script", "style", "title", "noscript"];

/// Build the strategy list for a configured source.
pub fn strategies_for(source: &SourceConfig) -> Vec<Box<dyn ExtractStrategy>> {
    let mut strategies: Vec<Box<dyn ExtractStrategy>> = Vec::new();
    if let Some(selectors) = &source.selectors {
        strategies.push(Box::new(SelectorStrategy::new(selectors.clone())));
    }
    strategies.push(Box::new(ClassKeywordStrategy::new(
        source.class_keywords.clone(),
    )));
    strategies.push(Box::new(TextKeywordStrategy::new(
        source.text_keywords.clone(),
    )));
    strategies
}

/// First date-looking fragment in `text`, or an empty string.
pub fn find_date_fragment(text: &str) -> String {
    DATE_FRAGMENT
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// --- Targeted ---

/// Extraction with site-specific selectors.
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    selectors: SourceSelectors,
}

impl SelectorStrategy {
    pub fn new(selectors: SourceSelectors) -> Self {
        Self { selectors }
    }

    fn parse_item(
        item: &ElementRef<'_>,
        title_sel: &Selector,
        date_sel: Option<&Selector>,
        place_sel: Option<&Selector>,
        ctx: &ExtractContext,
    ) -> Option<EventRecord> {
        let title = item.select(title_sel).next().map(|el| element_text(&el))?;
        if title.is_empty() {
            return None;
        }

        let date = match date_sel {
            Some(sel) => item
                .select(sel)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_default(),
            None => find_date_fragment(&element_text(item)),
        };

        let mut record = ctx.record(title, date);
        record.place = place_sel
            .and_then(|sel| item.select(sel).next())
            .and_then(|el| non_empty(element_text(&el)));
        Some(record)
    }
}

impl ExtractStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        "configured-selectors"
    }

    fn extract(&self, document: &Html, ctx: &ExtractContext) -> Result<Vec<EventRecord>> {
        let item_sel = parse_selector(&self.selectors.item)?;
        let title_sel = parse_selector(&self.selectors.title)?;
        let date_sel = self
            .selectors
            .date
            .as_deref()
            .map(parse_selector)
            .transpose()?;
        let place_sel = self
            .selectors
            .place
            .as_deref()
            .map(parse_selector)
            .transpose()?;

        Ok(document
            .select(&item_sel)
            .filter_map(|item| {
                Self::parse_item(&item, &title_sel, date_sel.as_ref(), place_sel.as_ref(), ctx)
            })
            .collect())
    }
}

// --- Heuristic: class names ---

/// Accepts containers whose class attribute contains one of the keywords.
#[derive(Debug, Clone)]
pub struct ClassKeywordStrategy {
    keywords: Vec<String>,
}

impl ClassKeywordStrategy {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    fn class_matches(&self, element: &ElementRef<'_>) -> bool {
        element.value().attr("class").is_some_and(|class| {
            self.keywords
                .iter()
                .any(|keyword| contains_ignore_case(class, keyword))
        })
    }

    fn parse_container(
        container: &ElementRef<'_>,
        heading_sel: &Selector,
        link_sel: &Selector,
        time_sel: &Selector,
        ctx: &ExtractContext,
    ) -> Option<EventRecord> {
        let title = container
            .select(heading_sel)
            .map(|el| element_text(&el))
            .find(|t| !t.is_empty())
            .or_else(|| {
                container
                    .select(link_sel)
                    .map(|el| element_text(&el))
                    .find(|t| !t.is_empty())
            })?;

        let date = container
            .select(time_sel)
            .next()
            .map(|el| {
                el.value()
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&el))
            })
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| find_date_fragment(&element_text(container)));

        Some(ctx.record(title, date))
    }
}

impl ExtractStrategy for ClassKeywordStrategy {
    fn name(&self) -> &str {
        "class-keywords"
    }

    fn extract(&self, document: &Html, ctx: &ExtractContext) -> Result<Vec<EventRecord>> {
        let container_sel = parse_selector(CONTAINER_TAGS)?;
        let heading_sel = parse_selector(HEADING_TAGS)?;
        let link_sel = parse_selector("a")?;
        let time_sel = parse_selector("time, [class*=date], [class*=Date]")?;

        let mut candidates = Vec::new();
        for container in document.select(&container_sel) {
            if !self.class_matches(&container) {
                continue;
            }
            match Self::parse_container(&container, &heading_sel, &link_sel, &time_sel, ctx) {
                Some(record) => candidates.push((container, record)),
                None => log::debug!("[{}] container without a title skipped", ctx.label),
            }
        }

        // Innermost wins: a wrapper around other titled candidates is a list,
        // not an item.
        let wrappers: HashSet<_> = candidates
            .iter()
            .flat_map(|(container, _)| container.ancestors().map(|a| a.id()))
            .collect();

        Ok(candidates
            .into_iter()
            .filter(|(container, _)| !wrappers.contains(&container.id()))
            .map(|(_, record)| record)
            .collect())
    }
}

// --- Heuristic: page text ---

/// Accepts the innermost elements whose text contains a domain keyword.
#[derive(Debug, Clone)]
pub struct TextKeywordStrategy {
    keywords: Vec<String>,
}

impl TextKeywordStrategy {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    fn mentions_keyword(&self, text: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| contains_ignore_case(text, keyword))
    }
}

impl ExtractStrategy for TextKeywordStrategy {
    fn name(&self) -> &str {
        "text-keywords"
    }

    fn extract(&self, document: &Html, ctx: &ExtractContext) -> Result<Vec<EventRecord>> {
        if self.keywords.is_empty() {
            return Ok(Vec::new());
        }
        let all_sel = parse_selector("body *")?;

        let records = document
            .select(&all_sel)
            .filter(|el| !SKIPPED_TAGS.contains(&el.value().name()))
            .filter(|el| {
                let text = element_text(el);
                self.mentions_keyword(&text)
                    && !el
                        .children()
                        .filter_map(ElementRef::wrap)
                        .any(|child| self.mentions_keyword(&element_text(&child)))
            })
            .map(|el| {
                let text = element_text(&el);
                let date = find_date_fragment(&text);
                ctx.record(text, date)
            })
            .collect();
        Ok(records)
    }
}

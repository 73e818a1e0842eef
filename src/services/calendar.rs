// src/services/calendar.rs

//! Targeted extraction for the municipal calendar day view.
//!
//! The day view marks each day with a `dl.calendar_day` whose `.t_day span`
//! carries the day number. Events are `.cal_event_box` blocks inside it, with
//! time, place and contact given as `dt`/`dd` pairs labelled by an icon's
//! `alt` text.

use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::error::Result;
use crate::models::{EventRecord, non_empty};
use crate::services::extract::{ExtractContext, ExtractStrategy};
use crate::utils::{element_text, parse_selector};

const UNKNOWN_TITLE: &str = "タイトル不明";
const ALT_TIME: &str = "開催時間";
const ALT_PLACE: &str = "開催場所";
const ALT_CONTACT: &str = "お問い合わせ";

/// Day number written with its 日 suffix ("8月15日(金)" -> 15).
static DAY_SUFFIXED: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,2})\s*日").ok());
static DIGIT_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[0-9]+").ok());

/// Strategy reading the day block that matches the context date.
#[derive(Debug, Default)]
pub struct CalendarDayStrategy;

impl CalendarDayStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Find the `dl.calendar_day` block for `day`.
    ///
    /// Day labels outside a day block (mini calendars and the like) are
    /// passed over.
    fn find_day_block<'a>(document: &'a Html, day: u32) -> Result<Option<ElementRef<'a>>> {
        let day_sel = parse_selector(".t_day span")?;

        Ok(document
            .select(&day_sel)
            .filter(|el| day_number(&element_text(el)) == Some(day))
            .find_map(|el| {
                el.ancestors().filter_map(ElementRef::wrap).find(|a| {
                    a.value().name() == "dl" && a.value().classes().any(|c| c == "calendar_day")
                })
            }))
    }

    fn parse_event_box(event_box: &ElementRef<'_>, ctx: &ExtractContext) -> Result<EventRecord> {
        let title_sel = parse_selector(".article_title a")?;
        let category_sel = parse_selector(".cal_event_icon span")?;
        let comment_sel = parse_selector(".cal_event_comment")?;

        let title = event_box
            .select(&title_sel)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let date = ctx.date;
        let mut record = ctx.record(
            title,
            format!("{}年{}月{}日", date.year(), date.month(), date.day()),
        );
        record.category = first_text(event_box, &category_sel);
        record.comment = first_text(event_box, &comment_sel);
        record.time = labelled_value(event_box, ALT_TIME)?;
        record.place = labelled_value(event_box, ALT_PLACE)?;
        record.contact = labelled_value(event_box, ALT_CONTACT)?;
        Ok(record)
    }
}

impl ExtractStrategy for CalendarDayStrategy {
    fn name(&self) -> &str {
        "calendar-day"
    }

    fn extract(&self, document: &Html, ctx: &ExtractContext) -> Result<Vec<EventRecord>> {
        let Some(day_block) = Self::find_day_block(document, ctx.date.day())? else {
            log::info!(
                "[{}] no calendar block for {}月{}日",
                ctx.label,
                ctx.date.month(),
                ctx.date.day()
            );
            return Ok(Vec::new());
        };

        let box_sel = parse_selector(".cal_event_box")?;
        let mut records = Vec::new();
        for event_box in day_block.select(&box_sel) {
            match Self::parse_event_box(&event_box, ctx) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("[{}] skipping calendar entry: {}", ctx.label, e),
            }
        }

        log::info!(
            "[{}] {}月{}日 events: {}",
            ctx.label,
            ctx.date.month(),
            ctx.date.day(),
            records.len()
        );
        Ok(records)
    }
}

/// Day number of a day label: the digits before 日, else the first digit run.
fn day_number(text: &str) -> Option<u32> {
    let suffixed = DAY_SUFFIXED
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1));
    suffixed
        .or_else(|| DIGIT_RUN.as_ref().and_then(|re| re.find(text)))
        .and_then(|m| m.as_str().parse().ok())
}

fn first_text(scope: &ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|el| non_empty(element_text(&el)))
}

/// Text of the `dd` following the `dt` whose icon has the given `alt`.
fn labelled_value(scope: &ElementRef<'_>, alt: &str) -> Result<Option<String>> {
    let dt_sel = parse_selector("dt")?;
    let img_sel = parse_selector("img")?;

    let Some(dt) = scope.select(&dt_sel).find(|dt| {
        dt.select(&img_sel)
            .any(|img| img.value().attr("alt") == Some(alt))
    }) else {
        return Ok(None);
    };

    Ok(dt
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
        .and_then(|dd| non_empty(element_text(&dd))))
}

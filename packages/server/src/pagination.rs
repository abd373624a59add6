//! Page-number pagination for the list pages.

use serde::{Serialize, Serializer};

/// Pages shown at each end of an elided range.
pub const ON_ENDS: u64 = 2;
/// Pages shown on each side of the current page.
pub const ON_EACH_SIDE: u64 = 3;

/// One entry of a page-number navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Number(u64),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_u64(*n),
            Self::Ellipsis => serializer.serialize_str("…"),
        }
    }
}

/// Page numbers to display around `number`, with runs replaced by ellipses.
///
/// Nothing is elided while `num_pages <= (on_each_side + on_ends) * 2`.
pub fn elided_page_range(
    number: u64,
    num_pages: u64,
    on_each_side: u64,
    on_ends: u64,
) -> Vec<PageItem> {
    if num_pages <= (on_each_side + on_ends) * 2 {
        return (1..=num_pages).map(PageItem::Number).collect();
    }

    let mut items = Vec::new();
    if number > on_each_side + on_ends + 2 {
        items.extend((1..=on_ends).map(PageItem::Number));
        items.push(PageItem::Ellipsis);
        items.extend((number - on_each_side..=number).map(PageItem::Number));
    } else {
        items.extend((1..=number).map(PageItem::Number));
    }

    if number + on_each_side + on_ends + 1 < num_pages {
        items.extend((number + 1..=number + on_each_side).map(PageItem::Number));
        items.push(PageItem::Ellipsis);
        items.extend((num_pages - on_ends + 1..=num_pages).map(PageItem::Number));
    } else {
        items.extend((number + 1..=num_pages).map(PageItem::Number));
    }
    items
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("Page is not a number")]
    NotANumber,
    #[error("That page contains no results")]
    OutOfRange,
}

/// Current page plus navigation data.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub per_page: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub page_range: Vec<PageItem>,
}

impl Page {
    /// Resolve the `?page=` parameter against `count` items.
    ///
    /// A missing parameter means page 1 and `last` means the final page.
    /// There is always at least one page, even when `count` is zero.
    pub fn resolve(requested: Option<&str>, count: u64, per_page: u64) -> Result<Self, PageError> {
        let per_page = per_page.max(1);
        let num_pages = count.div_ceil(per_page).max(1);
        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<u64>().map_err(|_| PageError::NotANumber)?,
        };
        if number < 1 || number > num_pages {
            return Err(PageError::OutOfRange);
        }

        Ok(Self {
            number,
            num_pages,
            count,
            per_page,
            has_previous: number > 1,
            has_next: number < num_pages,
            page_range: elided_page_range(number, num_pages, ON_EACH_SIDE, ON_ENDS),
        })
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }
}

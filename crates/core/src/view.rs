//! Filter and paginate the catalog for display.

use serde::{Deserialize, Serialize};

use crate::models::GameSummary;

/// Games shown per page.
pub const PAGE_SIZE: usize = 8;

/// Category choices offered by the browse filters; empty means all.
pub const CATEGORY_CHOICES: [&str; 5] = ["", "Action", "Adventure", "RPG", "Sports"];

/// Transient browse inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Case-insensitive substring of the game name.
    pub search_text: String,
    /// Exact category, empty for any.
    pub category: String,
    /// Exact release year as text, empty for any.
    pub release_year: String,
    /// 1-based page number.
    pub page_number: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: String::new(),
            release_year: String::new(),
            page_number: 1,
        }
    }
}

/// What to show for a given query.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Entries on the requested page, in catalog order.
    pub page_items: Vec<GameSummary>,
    /// Number of pages in the filtered set; 0 when it is empty.
    pub total_pages: usize,
    /// Page the items were taken from.
    pub current_page: usize,
    /// Size of the filtered set.
    pub total_matches: usize,
}

/// Apply the search, category and year filters in that order.
pub fn filter<'a>(games: &'a [GameSummary], query: &ViewQuery) -> Vec<&'a GameSummary> {
    let needle = query.search_text.to_lowercase();
    games
        .iter()
        .filter(|game| needle.is_empty() || game.name.to_lowercase().contains(&needle))
        .filter(|game| query.category.is_empty() || game.category == query.category)
        .filter(|game| {
            query.release_year.is_empty()
                || game.release_year_label().as_deref() == Some(query.release_year.as_str())
        })
        .collect()
}

/// Filter `games` and slice out the requested page.
///
/// Page numbers past the end yield an empty page rather than being clamped.
pub fn project(games: &[GameSummary], query: &ViewQuery) -> Projection {
    let filtered = filter(games, query);
    let total_matches = filtered.len();
    let total_pages = total_matches.div_ceil(PAGE_SIZE);
    let current_page = query.page_number.max(1);
    let start = (current_page - 1).saturating_mul(PAGE_SIZE);

    let page_items = filtered
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .cloned()
        .collect();

    Projection {
        page_items,
        total_pages,
        current_page,
        total_matches,
    }
}

/// Caller-side browse state that resets the page when the result set changes.
#[derive(Debug, Clone, Default)]
pub struct BrowseView {
    query: ViewQuery,
    catalog_generation: u64,
}

impl BrowseView {
    /// Current query.
    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Project `games` with the current query.
    pub fn project(&self, games: &[GameSummary]) -> Projection {
        project(games, &self.query)
    }

    /// Replace the search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.query.search_text {
            self.query.search_text = text;
            self.query.page_number = 1;
        }
    }

    /// Replace the category filter.
    pub fn set_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        if category != self.query.category {
            self.query.category = category;
            self.query.page_number = 1;
        }
    }

    /// Replace the release year filter.
    pub fn set_release_year(&mut self, year: impl Into<String>) {
        let year = year.into();
        if year != self.query.release_year {
            self.query.release_year = year;
            self.query.page_number = 1;
        }
    }

    /// Move to the next entry of [`CATEGORY_CHOICES`], wrapping around.
    pub fn cycle_category(&mut self) -> &str {
        let position = CATEGORY_CHOICES
            .iter()
            .position(|choice| *choice == self.query.category)
            .map(|idx| (idx + 1) % CATEGORY_CHOICES.len())
            .unwrap_or(0);
        self.set_category(CATEGORY_CHOICES[position]);
        &self.query.category
    }

    /// Reset the page if the catalog was replaced since the last call.
    pub fn sync_catalog(&mut self, generation: u64) {
        if generation != self.catalog_generation {
            self.catalog_generation = generation;
            self.query.page_number = 1;
        }
    }

    /// Advance one page unless already on the last of `total_pages`.
    pub fn next_page(&mut self, total_pages: usize) -> bool {
        if self.query.page_number < total_pages {
            self.query.page_number += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page unless already on the first.
    pub fn prev_page(&mut self) -> bool {
        if self.query.page_number > 1 {
            self.query.page_number -= 1;
            true
        } else {
            false
        }
    }
}

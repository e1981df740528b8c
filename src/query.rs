//! Book query engine: exact-match filters, free-text search and ordering
//! applied to an in-memory candidate set.

use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::book::{BookEntry, BookQuery},
};

/// A recognized exact-match filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Title(String),
    AuthorName(String),
    PublicationYear(i32),
}

impl BookFilter {
    fn matches(&self, entry: &BookEntry) -> bool {
        match self {
            BookFilter::Title(title) => entry.book.title == *title,
            BookFilter::AuthorName(name) => entry.author_name == *name,
            BookFilter::PublicationYear(year) => entry.book.publication_year == *year,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Title,
    PublicationYear,
}

impl OrderField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(OrderField::Title),
            "publication_year" | "publicationYear" => Some(OrderField::PublicationYear),
            _ => None,
        }
    }

    fn compare(self, a: &BookEntry, b: &BookEntry) -> Ordering {
        match self {
            OrderField::Title => a.book.title.cmp(&b.book.title),
            OrderField::PublicationYear => a.book.publication_year.cmp(&b.book.publication_year),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub field: OrderField,
    pub direction: Direction,
}

impl OrderKey {
    pub const fn asc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(field: OrderField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    fn compare(&self, a: &BookEntry, b: &BookEntry) -> Ordering {
        match self.direction {
            Direction::Asc => self.field.compare(a, b),
            Direction::Desc => self.field.compare(b, a),
        }
    }
}

/// Structured filter / search / ordering for a book listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filters: Vec<BookFilter>,
    pub search: Option<String>,
    pub ordering: Vec<OrderKey>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            ordering: vec![OrderKey::asc(OrderField::Title)],
        }
    }
}

impl QuerySpec {
    /// Build a query from raw parameters.
    ///
    /// Fails with `InvalidQuery` on an unknown ordering field or a
    /// non-numeric year filter.
    pub fn from_params(params: &BookQuery) -> AppResult<Self> {
        let mut filters = Vec::new();
        if let Some(title) = &params.title {
            filters.push(BookFilter::Title(title.clone()));
        }
        if let Some(name) = &params.author_name {
            filters.push(BookFilter::AuthorName(name.clone()));
        }
        if let Some(year) = &params.publication_year {
            let year = year.trim().parse::<i32>().map_err(|_| {
                AppError::InvalidQuery(format!("publication_year must be an integer, got '{}'", year))
            })?;
            filters.push(BookFilter::PublicationYear(year));
        }

        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let ordering = match params.ordering.as_deref().map(str::trim) {
            None | Some("") => Self::default().ordering,
            Some(raw) => parse_ordering(raw)?,
        };

        Ok(Self {
            filters,
            search,
            ordering,
        })
    }

    fn matches(&self, entry: &BookEntry, needle: Option<&str>) -> bool {
        if !self.filters.iter().all(|f| f.matches(entry)) {
            return false;
        }
        match needle {
            Some(needle) => {
                entry.book.title.to_lowercase().contains(needle)
                    || entry.author_name.to_lowercase().contains(needle)
            }
            None => true,
        }
    }

    /// Filter, search and order the candidates. The sort is stable: entries
    /// that compare equal on every key keep their input order.
    pub fn apply(&self, candidates: Vec<BookEntry>) -> Vec<BookEntry> {
        let needle = self.search.as_ref().map(|s| s.to_lowercase());
        let mut out: Vec<BookEntry> = candidates
            .into_iter()
            .filter(|entry| self.matches(entry, needle.as_deref()))
            .collect();
        out.sort_by(|a, b| {
            self.ordering
                .iter()
                .map(|key| key.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        out
    }
}

fn parse_ordering(raw: &str) -> AppResult<Vec<OrderKey>> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let (name, direction) = match term.strip_prefix('-') {
                Some(name) => (name, Direction::Desc),
                None => (term, Direction::Asc),
            };
            OrderField::parse(name)
                .map(|field| OrderKey { field, direction })
                .ok_or_else(|| AppError::InvalidQuery(format!("Cannot order by '{}'", name)))
        })
        .collect()
}

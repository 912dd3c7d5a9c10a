//! Translates list parameters into a store query.
//!
//! Filters compose as `(title ∨ content) ∧ category ∧ tag`; each clause is
//! only present when its parameter is.

use sea_query::{Asterisk, Cond, Expr, Iden, Order, Query, SelectStatement};

use super::FindNotesQuery;

pub const DEFAULT_LIMIT: u64 = 50;

#[derive(Iden)]
pub enum Notes {
    Table,
    Id,
    Title,
    Content,
    Category,
    Tags,
    Color,
    CreatedAt,
    UpdatedAt,
}

pub const NOTE_COLUMNS: [Notes; 8] = [
    Notes::Id,
    Notes::Title,
    Notes::Content,
    Notes::Category,
    Notes::Tags,
    Notes::Color,
    Notes::CreatedAt,
    Notes::UpdatedAt,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl NoteFilter {
    pub fn from_query(query: &FindNotesQuery) -> Self {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        Self {
            search: non_empty(&query.search),
            category: non_empty(&query.category).map(|c| c.to_lowercase()),
            tag: non_empty(&query.tag).map(|t| t.to_lowercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.category.is_none() && self.tag.is_none()
    }

    pub fn condition(&self) -> Cond {
        let mut cond = Cond::all();

        if let Some(search) = &self.search {
            cond = cond.add(
                Cond::any()
                    .add(Expr::cust_with_values("contains_ci(title, ?)", [search.clone()]))
                    .add(Expr::cust_with_values("contains_ci(content, ?)", [search.clone()])),
            );
        }

        if let Some(category) = &self.category {
            cond = cond.add(Expr::col(Notes::Category).eq(category.clone()));
        }

        if let Some(tag) = &self.tag {
            cond = cond.add(Expr::cust_with_values(
                "EXISTS (SELECT 1 FROM json_each(notes.tags) WHERE json_each.value = ?)",
                [tag.clone()],
            ));
        }

        cond
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub skip: u64,
}

impl Pagination {
    /// Unparseable values fall back to the defaults. `limit` is clamped to
    /// `max_limit`, a negative `skip` to zero.
    pub fn from_params(limit: Option<&str>, skip: Option<&str>, max_limit: u64) -> Self {
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map_or(DEFAULT_LIMIT, |l| l as u64)
            .min(max_limit.max(1));

        let skip = skip
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map_or(0, |s| s.max(0) as u64);

        Self { limit, skip }
    }
}

fn filtered(mut query: SelectStatement, filter: &NoteFilter) -> SelectStatement {
    if !filter.is_empty() {
        query.cond_where(filter.condition());
    }
    query
}

pub fn select_notes(filter: &NoteFilter, page: Pagination) -> SelectStatement {
    let query = Query::select().columns(NOTE_COLUMNS).from(Notes::Table).to_owned();

    filtered(query, filter)
        .order_by(Notes::UpdatedAt, Order::Desc)
        .order_by_expr(Expr::cust("rowid"), Order::Desc)
        .limit(page.limit)
        .offset(page.skip)
        .to_owned()
}

pub fn count_notes(filter: &NoteFilter) -> SelectStatement {
    let query = Query::select().expr(Expr::col(Asterisk).count()).from(Notes::Table).to_owned();

    filtered(query, filter)
}

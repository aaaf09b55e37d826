//! Built-in ledger categories.

use crate::{Category, Error, Result, TransactionKind};
use once_cell::sync::Lazy;

/// Cached catalog - built once and reused across all operations
static CATEGORIES: Lazy<Vec<Category>> = Lazy::new(build_categories);

/// All built-in categories, income first
pub fn all() -> &'static [Category] {
    &CATEGORIES
}

/// Categories available for one kind of transaction
pub fn for_kind(kind: TransactionKind) -> impl Iterator<Item = &'static Category> {
    CATEGORIES.iter().filter(move |c| c.kind == kind)
}

/// Look up a category by id within a kind
pub fn lookup(kind: TransactionKind, id: &str) -> Result<&'static Category> {
    for_kind(kind)
        .find(|c| c.id == id)
        .ok_or_else(|| Error::UnknownCategory(format!("{:?} category {:?}", kind, id)))
}

/// Display name for a category id, or "Other" when unknown
pub fn display_name(id: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name)
        .unwrap_or("Other")
}

fn build_categories() -> Vec<Category> {
    use TransactionKind::{Expense, Income};

    vec![
        entry("salary", "Salary", Income, "#4CAF50"),
        entry("parttime", "Part-time", Income, "#8BC34A"),
        entry("investment", "Investment", Income, "#FFC107"),
        entry("gift", "Gift", Income, "#FF5722"),
        entry("transfer", "Transfer", Income, "#03A9F4"),
        entry("bonus", "Bonus", Income, "#FF9800"),
        entry("financial", "Wealth management", Income, "#9C27B0"),
        entry("other", "Other", Income, "#607D8B"),
        entry("food", "Food & dining", Expense, "#FF9800"),
        entry("transport", "Transport", Expense, "#2196F3"),
        entry("shopping", "Shopping", Expense, "#9C27B0"),
        entry("housing", "Housing", Expense, "#4CAF50"),
        entry("medical", "Medical", Expense, "#F44336"),
        entry("education", "Education", Expense, "#FF5722"),
        entry("entertainment", "Entertainment", Expense, "#E91E63"),
        entry("communication", "Communication", Expense, "#00BCD4"),
    ]
}

fn entry(
    id: &'static str,
    name: &'static str,
    kind: TransactionKind,
    color: &'static str,
) -> Category {
    Category {
        id,
        name,
        kind,
        color,
    }
}

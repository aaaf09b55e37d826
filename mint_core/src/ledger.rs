//! Expense and income ledger.
//!
//! Transactions are kept newest first. Statistics are computed over any
//! filtered slice so the host can show today, this month, this year or
//! everything.

use crate::{categories, Error, Result, Transaction, TransactionKind};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Time filter applied relative to a reference date
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Month,
    Year,
    All,
}

impl Period {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "today" => Some(Self::Today),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn includes(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Period::Today => date == today,
            Period::Month => date.year() == today.year() && date.month() == today.month(),
            Period::Year => date.year() == today.year(),
            Period::All => true,
        }
    }
}

/// Income and expense totals, in cents
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub net: i64,
}

/// Share of total expense for one category
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: String,
    pub name: String,
    pub amount_cents: i64,
    pub percentage: i64,
}

/// Transactions on one date
#[derive(Clone, Debug, PartialEq)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub transactions: Vec<&'a Transaction>,
}

impl Transaction {
    /// Build a transaction after checking amount and category
    pub fn new(
        kind: TransactionKind,
        amount_cents: i64,
        category: &str,
        date: NaiveDate,
    ) -> Result<Self> {
        if amount_cents <= 0 {
            return Err(Error::MalformedRecord(format!(
                "amount must be positive, got {}",
                amount_cents
            )));
        }
        let category = categories::lookup(kind, category)?;

        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount_cents,
            category: category.id.to_string(),
            note: String::new(),
            date,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// The full transaction list, newest first
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn from_transactions(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Insert at the front
    pub fn add(&mut self, transaction: Transaction) {
        tracing::info!(
            "Adding {:?} of {} cents in {}",
            transaction.kind,
            transaction.amount_cents,
            transaction.category
        );
        self.transactions.insert(0, transaction);
    }

    /// Delete by id
    pub fn remove(&mut self, id: Uuid) -> Result<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("transaction {}", id)))?;
        tracing::info!("Removing transaction {}", id);
        Ok(self.transactions.remove(index))
    }

    /// Transactions inside `period` relative to `today`
    pub fn filter(&self, period: Period, today: NaiveDate) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|t| period.includes(t.date, today))
            .cloned()
            .collect()
    }
}

/// Sum income and expense
pub fn summarize(transactions: &[Transaction]) -> LedgerSummary {
    let mut summary = LedgerSummary::default();
    for t in transactions {
        match t.kind {
            TransactionKind::Income => summary.total_income += t.amount_cents,
            TransactionKind::Expense => summary.total_expense += t.amount_cents,
        }
    }
    summary.net = summary.total_income - summary.total_expense;
    summary
}

/// Largest expense categories with their rounded share of total expense
///
/// Empty when there is no expense at all.
pub fn category_breakdown(transactions: &[Transaction], limit: usize) -> Vec<CategoryShare> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for t in transactions.iter().filter(|t| t.kind == TransactionKind::Expense) {
        *totals.entry(t.category.as_str()).or_insert(0) += t.amount_cents;
    }

    let total_expense: i64 = totals.values().sum();
    if total_expense == 0 {
        return Vec::new();
    }

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            category: category.to_string(),
            name: categories::display_name(category).to_string(),
            amount_cents: amount,
            percentage: (amount as f64 * 100.0 / total_expense as f64).round() as i64,
        })
        .collect();

    // Ties broken by id for a stable order
    shares.sort_by(|a, b| {
        b.amount_cents
            .cmp(&a.amount_cents)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares.truncate(limit);
    shares
}

/// Name of the biggest expense category
pub fn top_category(transactions: &[Transaction]) -> Option<String> {
    category_breakdown(transactions, 1)
        .into_iter()
        .next()
        .map(|s| s.name)
}

/// Group by date, newest date first, keeping input order within a day
pub fn group_by_date(transactions: &[Transaction]) -> Vec<DayGroup<'_>> {
    let mut groups: Vec<DayGroup<'_>> = Vec::new();
    for t in transactions {
        match groups.iter_mut().find(|g| g.date == t.date) {
            Some(group) => group.transactions.push(t),
            None => groups.push(DayGroup {
                date: t.date,
                transactions: vec![t],
            }),
        }
    }
    groups.sort_by(|a, b| b.date.cmp(&a.date));
    groups
}

/// Render cents as `1,234.56` with an optional currency symbol
pub fn format_amount(cents: i64, currency: Option<&str>) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let fraction = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let number = if fraction == 0 {
        grouped
    } else {
        format!("{}.{:02}", grouped, fraction)
    };
    format!("{}{}{}", sign, currency.unwrap_or(""), number)
}

/// Parse a user-entered amount like `38`, `12.5` or `1,200.00` into cents
pub fn parse_amount(input: &str) -> Result<i64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let invalid = || Error::MalformedRecord(format!("invalid amount {:?}", input));

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(invalid)
}

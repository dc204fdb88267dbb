//! Known row labels for each canonical quantity, most trusted first.

use crate::resolver::LabelQuery;

pub const OPERATING_INCOME: LabelQuery<'static> = LabelQuery::new(&["Operating Income"]);

pub const TOTAL_ASSETS: LabelQuery<'static> = LabelQuery::new(&["Total Assets"]);

// "Total Liabilities" is a last resort and overstates current liabilities.
pub const CURRENT_LIABILITIES: LabelQuery<'static> = LabelQuery::new(&[
    "Current Liabilities",
    "Total Current Liabilities",
    "Total Current Liab",
    "Total Liabilities",
]);

/// Zero is treated as "not reported". The keyword scan skips income rows so
/// that interest *earned* is never mistaken for interest paid.
pub const INTEREST_EXPENSE: LabelQuery<'static> = LabelQuery::new(&[
    "Interest Expense",
    "Interest Expense Non Operating",
    "Net Interest Income",
    "Total Other Finance Cost",
])
.non_zero()
.with_fallback("interest", Some("income"));

pub const NET_INCOME: LabelQuery<'static> =
    LabelQuery::new(&["Net Income", "Net Income Common Stockholders"]);

pub const REVENUE: LabelQuery<'static> = LabelQuery::new(&["Total Revenue", "Operating Revenue"]);

pub const OPERATING_CASH_FLOW: LabelQuery<'static> = LabelQuery::new(&[
    "Operating Cash Flow",
    "Total Cash From Operating Activities",
    "Cash Flow From Continuing Operating Activities",
]);

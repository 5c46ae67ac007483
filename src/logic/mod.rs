//! Club business logic: bracket engine, scoring, and the reporter boundary.

mod bracket;
mod reporter;
mod scoring;

pub use bracket::{
    can_resolve, generate_bracket, generate_bracket_with_rng, report_champion, resolve_and_report,
    resolve_match, round_name, round_names, MatchOutcome,
};
pub use reporter::{ReportError, WinnerReporter};
pub use scoring::{points_exchanged, record_casual_match, MatchRecord};

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::Serialize;
use tvr_reports::{state::AppState, status::StatusKind, ReportStats, ViolationReport};

#[derive(Serialize)]
struct JsonStatus<'a> {
    kind: StatusKind,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonDashboard<'a> {
    stats: ReportStats,
    search: &'a str,
    reports: Vec<&'a ViolationReport>,
    status: Option<JsonStatus<'a>>,
}

/// Machine-readable form of the dashboard, limited to the reports passing the search
pub fn dashboard_json(state: &AppState) -> serde_json::Result<String> {
    let view = JsonDashboard {
        stats: state.stats,
        search: state.search.trim(),
        reports: state.visible_reports(),
        status: state.status.as_ref().map(|b| JsonStatus {
            kind: b.status.kind,
            message: &b.status.message,
        }),
    };
    serde_json::to_string_pretty(&view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tvr_reports::state::{reduce, AppEvent};

    #[test]
    fn test_json_includes_stats_and_filtered_reports() {
        let state = reduce(&AppState::default(), AppEvent::SearchChanged("abc".into()));
        let json: serde_json::Value =
            serde_json::from_str(&dashboard_json(&state).unwrap()).unwrap();
        assert_eq!(json["stats"]["total"], 0);
        assert_eq!(json["search"], "abc");
        assert!(json["reports"].as_array().unwrap().is_empty());
        assert!(json["status"].is_null());
    }
}

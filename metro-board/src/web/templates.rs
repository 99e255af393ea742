//! Askama templates for the web frontend.

use askama::Template;

use crate::board::{BoardView, display_time};
use crate::controller::{PollState, StatusMessage};
use crate::domain::{ArrivalRecord, StopPair};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// The board page: arrivals, refresh buttons and the API key form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub stops: Vec<StopView>,
    pub panel: PanelView,
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// The arrivals panel, reloaded in place by the page script.
#[derive(Template)]
#[template(path = "panel.html")]
pub struct PanelTemplate {
    pub panel: PanelView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// A tracked stop, for the page header.
#[derive(Debug, Clone)]
pub struct StopView {
    pub code: String,
    pub label: String,
    pub line: String,
    pub line_color: String,
}

impl StopView {
    pub fn from_pair(stops: &StopPair) -> Vec<Self> {
        stops
            .iter()
            .map(|stop| StopView {
                code: stop.code.as_str().to_string(),
                label: stop.label.to_string(),
                line: stop.line.to_string(),
                line_color: stop.line_color.to_string(),
            })
            .collect()
    }
}

/// One row of the arrival list.
#[derive(Debug, Clone)]
pub struct ArrivalView {
    pub line: String,
    pub line_color: String,
    pub destination: String,
    pub time_text: String,
}

impl ArrivalView {
    pub fn from_record(record: &ArrivalRecord) -> Self {
        Self {
            line: record.line.clone(),
            line_color: record.line_color.clone(),
            destination: record.destination.clone(),
            time_text: display_time(record),
        }
    }
}

/// Everything the panel shows.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub arrivals: Vec<ArrivalView>,
    /// Shown in place of the list.
    pub message: Option<&'static str>,
    pub last_updated: Option<String>,
    pub status_text: &'static str,
    pub status_level: &'static str,
    pub poll_state: &'static str,
    pub has_credential: bool,
}

impl PanelView {
    pub fn new(
        view: &BoardView,
        last_updated: Option<String>,
        status: &StatusMessage,
        poll_state: PollState,
        has_credential: bool,
    ) -> Self {
        Self {
            arrivals: view.arrivals().iter().map(ArrivalView::from_record).collect(),
            message: view.message(),
            last_updated,
            status_text: status.text,
            status_level: status.level.as_str(),
            poll_state: poll_state.label(),
            has_credential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MUNI_METRO, NO_ESTIMATE_MINUTES};

    fn record(line: &str, minutes: Option<i64>) -> ArrivalRecord {
        ArrivalRecord {
            line: line.into(),
            line_color: "#5e81ac".into(),
            destination: "Embarcadero".into(),
            expected_arrival: minutes.map(|_| chrono::Utc::now()),
            minutes_until: minutes.unwrap_or(NO_ESTIMATE_MINUTES),
        }
    }

    fn panel(view: BoardView) -> PanelView {
        PanelView::new(&view, None, &StatusMessage::NO_KEY, PollState::Idle, false)
    }

    #[test]
    fn arrival_view_time_text() {
        assert_eq!(ArrivalView::from_record(&record("N", Some(1))).time_text, "1 minute");
        assert_eq!(ArrivalView::from_record(&record("N", Some(0))).time_text, "Arriving now");
        assert_eq!(
            ArrivalView::from_record(&record("J", None)).time_text,
            "Schedule unavailable"
        );
    }

    #[test]
    fn panel_renders_arrivals() {
        let template = PanelTemplate {
            panel: panel(BoardView::Arrivals(vec![
                record("J", Some(1)),
                record("N", Some(3)),
            ])),
        };
        let html = template.render().unwrap();

        assert!(html.contains("1 minute"));
        assert!(html.contains("3 minutes"));
        assert!(html.find(">J<").unwrap() < html.find(">N<").unwrap());
        assert!(!html.contains("No arrivals scheduled"));
    }

    #[test]
    fn panel_renders_placeholder_message() {
        let html = PanelTemplate {
            panel: panel(BoardView::LoadFailed),
        }
        .render()
        .unwrap();
        assert!(html.contains("Failed to load data"));
    }

    #[test]
    fn index_lists_both_stops() {
        let html = IndexTemplate {
            stops: StopView::from_pair(&MUNI_METRO),
            panel: panel(BoardView::Loading),
        }
        .render()
        .unwrap();

        assert!(html.contains("N Judah"));
        assert!(html.contains("J Church"));
        assert!(html.contains("Loading arrivals..."));
    }

    #[test]
    fn destination_is_escaped() {
        let mut arrival = record("N", Some(2));
        arrival.destination = "<script>".into();
        let html = PanelTemplate {
            panel: panel(BoardView::Arrivals(vec![arrival])),
        }
        .render()
        .unwrap();
        assert!(!html.contains("<script>"));
    }
}

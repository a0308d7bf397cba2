//! Presentation model for the agent dashboard.
//!
//! Cards, map markers and history rows are all derived from one
//! [`TaskStore`] on every render, so the list and the map cannot disagree.

use chrono::{DateTime, Utc};

use crate::protocol::{GeoPoint, Task, TaskDetails, TaskKind, TaskStatus};
use crate::store::TaskStore;
use crate::task::TaskAction;

/// Default map centre when no task has coordinates.
pub const NAIROBI: GeoPoint = GeoPoint::new(-1.286389, 36.817223);

/// Smallest span (degrees) a fitted viewport will show.
const MIN_SPAN_DEG: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCard {
    pub id: String,
    pub kind: TaskKind,
    pub title: String,
    pub location: String,
    pub blood_line: String,
    pub status: TaskStatus,
    /// The only action offered for this card.
    pub action: Option<TaskAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Pickup,
    Delivery,
}

impl From<TaskKind> for MarkerStyle {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Pickup => MarkerStyle::Pickup,
            TaskKind::Delivery => MarkerStyle::Delivery,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub task_id: String,
    pub style: MarkerStyle,
    pub position: GeoPoint,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub id: String,
    pub kind: TaskKind,
    pub summary: String,
    pub completed_at_ms: u64,
    pub completed_on: String,
}

/// Lat/lng bounds of the map area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl MapViewport {
    pub fn centered(center: GeoPoint, span: f64) -> Self {
        let half = span / 2.0;
        Self {
            min_lat: center.lat - half,
            max_lat: center.lat + half,
            min_lng: center.lng - half,
            max_lng: center.lng + half,
        }
    }

    /// Bounds enclosing every marker with a 10% margin.
    pub fn fit(markers: &[MapMarker]) -> Self {
        let mut points = markers.iter().map(|m| m.position);
        let Some(first) = points.next() else {
            return Self::centered(NAIROBI, 0.1);
        };
        let (mut min_lat, mut max_lat, mut min_lng, mut max_lng) =
            (first.lat, first.lat, first.lng, first.lng);
        for p in points {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }
        let span = (max_lat - min_lat).max(max_lng - min_lng).max(MIN_SPAN_DEG) * 1.2;
        let center = GeoPoint::new((min_lat + max_lat) / 2.0, (min_lng + max_lng) / 2.0);
        Self::centered(center, span)
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lng..=self.max_lng).contains(&p.lng)
    }
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub cards: Vec<TaskCard>,
    pub markers: Vec<MapMarker>,
    pub history: Vec<HistoryRow>,
    pub viewport: MapViewport,
}

impl DashboardView {
    /// Cards and markers both come from `active`.
    pub fn new(active: &[Task], completed: &[Task]) -> Self {
        let markers = map_markers(active);
        Self {
            cards: active.iter().map(task_card).collect(),
            viewport: MapViewport::fit(&markers),
            markers,
            history: completed.iter().filter_map(history_row).collect(),
        }
    }

    pub fn from_store(store: &TaskStore) -> Self {
        Self::new(store.active(), store.completed())
    }
}

pub fn task_card(task: &Task) -> TaskCard {
    TaskCard {
        id: task.id.clone(),
        kind: task.kind(),
        title: task.details.counterparty().to_string(),
        location: task.details.destination().to_string(),
        blood_line: blood_line(&task.details),
        status: task.status(),
        action: task.next_action(),
    }
}

/// Markers for tasks with plottable coordinates; others are left off the map.
pub fn map_markers(tasks: &[Task]) -> Vec<MapMarker> {
    tasks
        .iter()
        .filter_map(|task| {
            let position = task.details.coordinates().filter(GeoPoint::is_plottable)?;
            Some(MapMarker {
                task_id: task.id.clone(),
                style: task.kind().into(),
                position,
                label: format!("{}: {}", task.kind(), task.details.counterparty()),
            })
        })
        .collect()
}

fn history_row(task: &Task) -> Option<HistoryRow> {
    let completed_at_ms = task.completed_at_ms()?;
    let summary = match &task.details {
        TaskDetails::Pickup(d) => format!("Collected {} from {}", d.blood_type, d.donor_name),
        TaskDetails::Delivery(r) => format!(
            "Delivered {} of {} to {}",
            units(r.units),
            r.blood_type,
            r.hospital_name
        ),
    };
    Some(HistoryRow {
        id: task.id.clone(),
        kind: task.kind(),
        summary,
        completed_at_ms,
        completed_on: format_date(completed_at_ms),
    })
}

fn blood_line(details: &TaskDetails) -> String {
    match details {
        TaskDetails::Pickup(d) => format!("Blood type {}", d.blood_type),
        TaskDetails::Delivery(r) => format!("{} of {}", units(r.units), r.blood_type),
    }
}

fn units(n: u32) -> String {
    if n == 1 {
        "1 unit".to_string()
    } else {
        format!("{n} units")
    }
}

/// `YYYY-MM-DD` (UTC) for an epoch-millisecond timestamp, `-` when out of range.
pub fn format_date(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn store() -> TaskStore {
        let mut store = TaskStore::new();
        store.replace_all(sample::active_tasks(), sample::completed_tasks());
        store
    }

    #[test]
    fn cards_offer_only_the_legal_action() {
        let view = DashboardView::from_store(&store());
        let actions: Vec<_> = view.cards.iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            [
                Some(TaskAction::Accept),
                Some(TaskAction::Accept),
                Some(TaskAction::Start)
            ]
        );
        assert_eq!(view.cards[0].title, "Jane Doe");
        assert_eq!(view.cards[1].blood_line, "2 units of O-");
    }

    #[test]
    fn tasks_without_coordinates_stay_off_the_map() {
        let view = DashboardView::from_store(&store());
        assert_eq!(view.cards.len(), 3);
        let marked: Vec<_> = view.markers.iter().map(|m| m.task_id.as_str()).collect();
        assert_eq!(marked, ["TASK001", "TASK002"]);
        assert_eq!(view.markers[0].style, MarkerStyle::Pickup);
        assert_eq!(view.markers[1].style, MarkerStyle::Delivery);
        assert!(view.markers.iter().all(|m| view.viewport.contains(m.position)));
    }

    #[test]
    fn list_and_map_follow_a_status_change() {
        let mut store = store();
        store.advance("TASK001", 1).unwrap();
        let view = DashboardView::from_store(&store);
        assert_eq!(view.cards[0].status, TaskStatus::Accepted);
        assert_eq!(view.cards[0].action, Some(TaskAction::Start));
        assert_eq!(view.markers[0].task_id, "TASK001");

        store.advance("TASK001", 2).unwrap();
        store.advance("TASK001", 3).unwrap();
        let view = DashboardView::from_store(&store);
        assert!(view.cards.iter().all(|c| c.id != "TASK001"));
        assert!(view.markers.iter().all(|m| m.task_id != "TASK001"));
        assert_eq!(view.history[0].id, "TASK001");
    }

    #[test]
    fn history_rows_describe_completed_work() {
        let view = DashboardView::from_store(&store());
        assert_eq!(view.history.len(), 3);
        assert_eq!(
            view.history[0].summary,
            "Delivered 3 units of A+ to Aga Khan Hospital"
        );
        assert_eq!(view.history[0].completed_on, "2024-05-20");
        assert_eq!(view.history[1].summary, "Collected O+ from Peter Kamau");
        assert_eq!(
            view.history[2].summary,
            "Delivered 1 unit of AB- to Kenyatta National Hospital"
        );
    }

    #[test]
    fn empty_store_centres_on_nairobi() {
        let view = DashboardView::from_store(&TaskStore::new());
        assert!(view.cards.is_empty() && view.markers.is_empty() && view.history.is_empty());
        assert!(view.viewport.contains(NAIROBI));
    }

    #[test]
    fn unplottable_coordinates_are_skipped() {
        let mut tasks = sample::active_tasks();
        if let TaskDetails::Pickup(d) = &mut tasks[0].details {
            d.coordinates = Some(GeoPoint::new(f64::NAN, 36.8));
        }
        let markers = map_markers(&tasks);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].task_id, "TASK002");
    }

    #[test]
    fn formats_dates() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(1_716_023_700_000), "2024-05-18");
        assert_eq!(format_date(951_782_400_000), "2000-02-29");
        assert_eq!(format_date(u64::MAX), "-");
    }
}

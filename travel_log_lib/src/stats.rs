use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    haversine::path_distance_km,
    trip::{TransportMode, Trip},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelStats {
    pub trip_count: usize,
    pub total_distance_km: f64,
    pub favorite_mode: Option<TransportMode>,
}

impl TravelStats {
    pub fn from_trips(trips: &[Trip]) -> Self {
        let total_distance_km = trips.iter().map(|trip| path_distance_km(trip.path_points())).sum();
        let favorite_mode = count_in_order(trips.iter().map(|trip| trip.details.mode))
            .into_iter()
            .fold(None, |best: Option<(TransportMode, usize)>, (mode, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((mode, count)),
            })
            .map(|(mode, _)| mode);

        Self {
            trip_count: trips.len(),
            total_distance_km,
            favorite_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalytics {
    pub total_trips: usize,
    pub mode_distribution: Vec<(TransportMode, usize)>,
    pub top_activities: Vec<(String, usize)>,
}

impl RouteAnalytics {
    /// Summarises past trips between `origin` and `destination`, compared
    /// trimmed and case-insensitively. `None` if no trip matches.
    pub fn for_route(trips: &[Trip], origin: &str, destination: &str) -> Option<Self> {
        let origin = normalize(origin);
        let destination = normalize(destination);

        let matching: Vec<&Trip> = trips
            .iter()
            .filter(|trip| normalize(&trip.details.origin) == origin && normalize(&trip.details.destination) == destination)
            .collect();

        if matching.is_empty() {
            return None;
        }

        let mut mode_distribution = count_in_order(matching.iter().map(|trip| trip.details.mode));
        mode_distribution.sort_by(|a, b| b.1.cmp(&a.1));

        let mut top_activities: Vec<(String, usize)> = count_in_order(matching.iter().map(|trip| normalize(&trip.details.activity)))
            .into_iter()
            .map(|(activity, count)| (capitalize(&activity), count))
            .collect();
        top_activities.sort_by(|a, b| b.1.cmp(&a.1));
        top_activities.truncate(3);

        Some(Self {
            total_trips: matching.len(),
            mode_distribution,
            top_activities,
        })
    }
}

/// Live session clock, `HH:MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

/// Compact duration of a finished trip for listings.
pub fn format_trip_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let elapsed = end - start;
    if elapsed < chrono::Duration::zero() {
        return "N/A".into();
    }

    let total_minutes = elapsed.num_minutes();
    if total_minutes < 1 {
        return "< 1m".into();
    }

    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

// Counts keyed by first occurrence, so stable sorts keep ties in that order.
fn count_in_order<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{track_session::TrackedPath, trip::TripDetails, PathPoint};

    fn trip(origin: &str, destination: &str, mode: TransportMode, activity: &str, path: Vec<PathPoint>) -> Trip {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        Trip {
            id: format!("{origin}-{activity}"),
            details: TripDetails {
                origin: origin.into(),
                destination: destination.into(),
                date_time: start,
                mode,
                activity: activity.into(),
                accompanying: 0,
            },
            end_time: Some(start + Duration::minutes(20)),
            path: Some(TrackedPath::from_points(path)),
        }
    }

    #[test]
    fn empty_archive_stats() {
        let stats = TravelStats::from_trips(&[]);
        assert_eq!(stats.trip_count, 0);
        assert_eq!(stats.total_distance_km, 0.0);
        assert_eq!(stats.favorite_mode, None);
    }

    #[test]
    fn stats_sum_paths_and_pick_first_most_common_mode() {
        let leg = vec![PathPoint::new(10.0, 76.0), PathPoint::new(10.1, 76.0)];
        let trips = vec![
            trip("a", "b", TransportMode::Train, "x", leg.clone()),
            trip("a", "b", TransportMode::Bus, "x", leg.clone()),
            trip("a", "b", TransportMode::Bus, "x", vec![]),
            trip("a", "b", TransportMode::Train, "x", vec![PathPoint::new(1.0, 1.0)]),
        ];
        let stats = TravelStats::from_trips(&trips);
        assert_eq!(stats.trip_count, 4);
        assert!((stats.total_distance_km - 2. * path_distance_km(&leg)).abs() < 1e-9);
        assert_eq!(stats.favorite_mode, Some(TransportMode::Train));
    }

    #[test]
    fn route_analytics_matches_loosely() {
        let trips = vec![
            trip("Kochi", "Aluva", TransportMode::Bus, "shopping trip", vec![]),
            trip(" kochi ", "ALUVA", TransportMode::Car, "Shopping trip ", vec![]),
            trip("Kochi", "Aluva", TransportMode::Car, "leisure travel", vec![]),
            trip("Kochi", "Aluva", TransportMode::Car, "work", vec![]),
            trip("Kochi", "Aluva", TransportMode::Walk, "gym", vec![]),
            trip("Kochi", "Munnar", TransportMode::Bus, "hiking", vec![]),
        ];

        let analytics = RouteAnalytics::for_route(&trips, "kochi", " aluva").unwrap();
        assert_eq!(analytics.total_trips, 5);
        assert_eq!(analytics.mode_distribution[0], (TransportMode::Car, 3));
        assert_eq!(analytics.mode_distribution[1], (TransportMode::Bus, 1));
        assert_eq!(analytics.top_activities.len(), 3);
        assert_eq!(analytics.top_activities[0], ("Shopping trip".to_string(), 2));
        assert_eq!(analytics.top_activities[1], ("Leisure travel".to_string(), 1));

        assert!(RouteAnalytics::for_route(&trips, "Aluva", "Kochi").is_none());
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3725), "01:02:05");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
    }

    #[test]
    fn trip_duration_format() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(format_trip_duration(start, start - Duration::seconds(1)), "N/A");
        assert_eq!(format_trip_duration(start, start + Duration::seconds(59)), "< 1m");
        assert_eq!(format_trip_duration(start, start + Duration::minutes(45)), "45m");
        assert_eq!(format_trip_duration(start, start + Duration::minutes(125)), "2h 5m");
    }
}

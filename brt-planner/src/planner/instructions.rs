//! Human-readable step text for a journey.

use chrono::Duration;

use crate::domain::{Journey, JourneySegment};
use crate::geomath::{CompassPoint, TravelMode};

/// Segments shorter than this get no compass direction.
const MIN_DIRECTION_M: f64 = 20.0;

/// "350 m" or "2.4 km". Distances under a kilometre round to 10 m.
pub fn format_distance(meters: f64) -> String {
    let meters = meters.max(0.0);
    if meters < 995.0 {
        format!("{} m", ((meters / 10.0).round() * 10.0) as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// "about 7 min" or "about 1 h 5 min". Rounds up to whole minutes.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    let mins = ((secs + 59) / 60).max(1);
    if mins < 60 {
        format!("about {mins} min")
    } else if mins % 60 == 0 {
        format!("about {} h", mins / 60)
    } else {
        format!("about {} h {} min", mins / 60, mins % 60)
    }
}

fn distance_text(segment: &JourneySegment) -> String {
    let text = format_distance(segment.distance_meters());
    if segment.distance().is_measured() {
        text
    } else {
        format!("~{text}")
    }
}

fn fare_text(fare: u32) -> String {
    format!("Rs {fare}")
}

fn direction_text(segment: &JourneySegment) -> String {
    if segment.distance_meters() < MIN_DIRECTION_M {
        return String::new();
    }
    let point = CompassPoint::between(segment.from().coordinates, segment.to().coordinates);
    format!(" {point}")
}

/// One first- or last-mile step.
fn access_step(segment: &JourneySegment) -> String {
    let verb = match segment.mode() {
        TravelMode::Walking => "Walk",
        TravelMode::Rickshaw => "Take a rickshaw",
        TravelMode::RideHail => "Take a ride-hail",
        TravelMode::Bus => "Ride",
    };

    let mut details = vec![format_duration(segment.duration())];
    if segment.fare() > 0 {
        details.push(fare_text(segment.fare()));
    }

    format!(
        "{verb} {}{} from {} to {} ({})",
        distance_text(segment),
        direction_text(segment),
        segment.from().name,
        segment.to().name,
        details.join(", ")
    )
}

fn bus_steps(journey: &Journey, leg: &JourneySegment) -> Vec<String> {
    let summary = format!(
        "{}, {}, {}",
        distance_text(leg),
        format_duration(leg.duration()),
        fare_text(leg.fare())
    );

    match (journey.routes_used(), journey.transfer_stop()) {
        ([first, second, ..], Some(transfer)) => vec![
            format!(
                "Board the {first} at {} and ride to {}",
                leg.from().name,
                transfer.name
            ),
            format!(
                "Change to the {second} at {} and ride to {} ({summary} for the whole bus ride)",
                transfer.name,
                leg.to().name
            ),
        ],
        (routes, _) => vec![format!(
            "Board the {} at {} and ride to {} ({summary})",
            routes.join(" / "),
            leg.from().name,
            leg.to().name
        )],
    }
}

/// Render step-by-step instructions for a journey.
pub fn render(journey: &Journey) -> Vec<String> {
    let mut steps = vec![access_step(journey.to_stop())];

    if let Some(leg) = journey.bus_leg() {
        steps.extend(bus_steps(journey, leg));
    }
    if let Some(last) = journey.from_stop() {
        steps.push(access_step(last));
    }

    let mut total = format!(
        "Total: {}, {}",
        format_distance(journey.total_distance()),
        format_duration(journey.total_duration())
    );
    if journey.estimated_fare() > 0 {
        total.push_str(&format!(", {}", fare_text(journey.estimated_fare())));
    }
    if journey.has_estimates() {
        total.push_str(" (~ marks estimated distances)");
    }
    steps.push(total);

    steps
}

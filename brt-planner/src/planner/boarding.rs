//! Boarding stop selection.
//!
//! A stop is only a usable boarding point for destination stop `D` if some
//! route serving both visits it *before* `D`. Boarding anywhere after `D`
//! would need the bus to reverse. Among the valid stops, the few nearest
//! the user are scored by total road distance: user to stop, plus the ride
//! from stop to `D`.

use futures::future::{join, join_all};
use tracing::debug;

use crate::directions::{DirectionsPort, Profile};
use crate::domain::{Coordinates, RoadDistance, Stop, StopId};
use crate::geomath;
use crate::network::TransitGraph;

use super::config::PlannerConfig;
use super::measure::LegMeasurer;

/// Error from boarding selection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectionError {
    /// No direct or one-transfer route reaches the destination stop
    #[error("no bus route reaches {0}")]
    NoRoute(StopId),
}

/// How the traveller gets from a boarding stop to the destination stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardingChoice<'g> {
    /// One route, boarding before the destination stop.
    Direct { boarding: &'g Stop, route: &'g str },
    /// Ride `first_route` to `transfer`, then `second_route` on.
    Transfer {
        boarding: &'g Stop,
        transfer: &'g Stop,
        first_route: &'g str,
        second_route: &'g str,
    },
}

impl<'g> BoardingChoice<'g> {
    pub fn boarding(&self) -> &'g Stop {
        match self {
            BoardingChoice::Direct { boarding, .. } | BoardingChoice::Transfer { boarding, .. } => {
                *boarding
            }
        }
    }

    pub fn transfer(&self) -> Option<&'g Stop> {
        match self {
            BoardingChoice::Direct { .. } => None,
            BoardingChoice::Transfer { transfer, .. } => Some(*transfer),
        }
    }

    /// Routes ridden, in order.
    pub fn routes(&self) -> Vec<String> {
        match self {
            BoardingChoice::Direct { route, .. } => vec![route.to_string()],
            BoardingChoice::Transfer {
                first_route,
                second_route,
                ..
            } => vec![first_route.to_string(), second_route.to_string()],
        }
    }
}

/// The winning boarding choice with the distances it was scored on.
#[derive(Debug, Clone, Copy)]
pub struct BoardingSelection<'g> {
    pub choice: BoardingChoice<'g>,
    /// Straight-line distance from the user to the boarding stop
    pub local_distance: f64,
    /// Road distance from the user to the boarding stop
    pub access: RoadDistance,
    /// Road distance of the bus ride to the destination stop
    pub ride: RoadDistance,
}

impl BoardingSelection<'_> {
    /// Total road distance the choice was ranked by.
    pub fn score(&self) -> f64 {
        self.access.meters() + self.ride.meters()
    }
}

/// Picks where the traveller should board for a given destination stop.
pub struct BoardingSelector<'a> {
    graph: &'a TransitGraph,
    config: &'a PlannerConfig,
}

impl<'a> BoardingSelector<'a> {
    pub fn new(graph: &'a TransitGraph, config: &'a PlannerConfig) -> Self {
        Self { graph, config }
    }

    fn within_reach(&self, user: Coordinates, stop: &Stop) -> bool {
        geomath::distance(user, stop.coordinates) <= self.config.boarding_radius_m
    }

    /// Stops within reach of the user that precede `destination` on a shared
    /// route, in graph order.
    ///
    /// When several shared routes qualify, the one with the fewest stops
    /// between the two is ridden (ties by route name).
    pub fn direct_candidates(&self, user: Coordinates, destination: &Stop) -> Vec<BoardingChoice<'a>> {
        let graph = self.graph;

        graph
            .stops()
            .iter()
            .filter(|s| s.id != destination.id && self.within_reach(user, s))
            .filter_map(|s| {
                graph
                    .routes_shared_between(&s.id, &destination.id)
                    .into_iter()
                    .filter_map(|route| graph.hops(route, &s.id, &destination.id).map(|h| (h, route)))
                    .min_by_key(|&(hops, _)| hops)
                    .map(|(_, route)| BoardingChoice::Direct { boarding: s, route })
            })
            .collect()
    }

    /// One-transfer options: board `B` within reach, ride to `T`, change to
    /// a route on which `T` precedes `destination`.
    ///
    /// For each boarding stop only the transfer minimising straight-line
    /// `B→T + T→D` is kept.
    pub fn transfer_candidates(&self, user: Coordinates, destination: &Stop) -> Vec<BoardingChoice<'a>> {
        let graph = self.graph;
        let mut choices = Vec::new();

        for boarding in graph.stops() {
            if boarding.id == destination.id || !self.within_reach(user, boarding) {
                continue;
            }

            let mut best: Option<(f64, BoardingChoice<'a>)> = None;

            for first_route in &boarding.routes {
                let Some(route) = graph.route(first_route) else {
                    continue;
                };
                let Some(start) = graph.sequence_index(first_route, &boarding.id) else {
                    continue;
                };

                for transfer_id in &route.stops[start + 1..] {
                    if *transfer_id == destination.id {
                        continue;
                    }
                    let Some(transfer) = graph.stop(transfer_id) else {
                        continue;
                    };

                    for second_route in graph.routes_shared_between(&transfer.id, &destination.id) {
                        if second_route == first_route.as_str()
                            || !graph.precedes(second_route, &transfer.id, &destination.id)
                        {
                            continue;
                        }

                        let cost = geomath::distance(boarding.coordinates, transfer.coordinates)
                            + geomath::distance(transfer.coordinates, destination.coordinates);
                        if best.as_ref().is_none_or(|(c, _)| cost < *c) {
                            best = Some((
                                cost,
                                BoardingChoice::Transfer {
                                    boarding,
                                    transfer,
                                    first_route: first_route.as_str(),
                                    second_route,
                                },
                            ));
                        }
                    }
                }
            }

            if let Some((_, choice)) = best {
                choices.push(choice);
            }
        }

        choices
    }

    /// Direct candidates, or transfer candidates if there are none.
    pub fn candidates(&self, user: Coordinates, destination: &Stop) -> Vec<BoardingChoice<'a>> {
        let direct = self.direct_candidates(user, destination);
        if !direct.is_empty() {
            return direct;
        }

        debug!(destination = %destination.id, "No sequence-valid boarding stop, trying transfers");
        self.transfer_candidates(user, destination)
    }

    /// Choose the boarding option with the lowest total road distance.
    ///
    /// Only the `K` options nearest the user are measured, each with a
    /// driving request for the access leg and for the ride. Ties go to the
    /// option nearer the user.
    pub async fn select<P: DirectionsPort>(
        &self,
        measurer: &LegMeasurer<'_, P>,
        user: Coordinates,
        destination: &Stop,
    ) -> Result<BoardingSelection<'a>, SelectionError> {
        let mut ranked: Vec<(f64, BoardingChoice<'a>)> = self
            .candidates(user, destination)
            .into_iter()
            .map(|choice| (geomath::distance(user, choice.boarding().coordinates), choice))
            .collect();

        if ranked.is_empty() {
            return Err(SelectionError::NoRoute(destination.id.clone()));
        }

        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.truncate(self.config.candidate_limit.max(1));

        let futures: Vec<_> = ranked
            .into_iter()
            .map(|(local_distance, choice)| async move {
                let boarding = choice.boarding().coordinates;
                let target = destination.coordinates;
                let access = measurer.measure(user, boarding, Profile::Driving);
                let ride = async {
                    match choice.transfer() {
                        None => measurer.measure(boarding, target, Profile::Driving).await,
                        Some(transfer) => {
                            let (first, second) = join(
                                measurer.measure(boarding, transfer.coordinates, Profile::Driving),
                                measurer.measure(transfer.coordinates, target, Profile::Driving),
                            )
                            .await;
                            first.combine(&second)
                        }
                    }
                };
                let (access, ride) = join(access, ride).await;

                BoardingSelection {
                    choice,
                    local_distance,
                    access,
                    ride,
                }
            })
            .collect();

        let scored = join_all(futures).await;

        let mut best: Option<BoardingSelection<'a>> = None;
        for selection in scored {
            if best.as_ref().is_none_or(|b| selection.score() < b.score()) {
                best = Some(selection);
            }
        }

        let best = best.ok_or_else(|| SelectionError::NoRoute(destination.id.clone()))?;
        debug!(
            destination = %destination.id,
            boarding = %best.choice.boarding().id,
            transfer = ?best.choice.transfer().map(|t| t.id.as_str()),
            score = best.score(),
            "Selected boarding stop"
        );
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::{DirectionsError, RouteEstimate, StaticDirections};
    use crate::network::{NetworkDataset, RouteRecord, StopRecord};

    struct Yielding(StaticDirections);

    impl DirectionsPort for Yielding {
        async fn route(
            &self,
            origin: Coordinates,
            destination: Coordinates,
            profile: Profile,
        ) -> Result<RouteEstimate, DirectionsError> {
            tokio::task::yield_now().await;
            self.0.route(origin, destination, profile).await
        }
    }

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn stop(id: &str, name: &str, lat: f64, lng: f64) -> StopRecord {
        StopRecord {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            routes: Vec::new(),
        }
    }

    fn route(name: &str, stops: Vec<StopRecord>) -> RouteRecord {
        RouteRecord {
            name: name.into(),
            color: None,
            stops,
        }
    }

    /// Red Line runs north to south; Blue Line runs FH → SD → LH.
    fn karachi() -> TransitGraph {
        TransitGraph::from_dataset(NetworkDataset {
            routes: vec![
                route(
                    "Red Line",
                    vec![
                        stop("ZZ", "Jama Cloth", 24.8635, 67.0050),
                        stop("SD", "Saddar", 24.8560, 67.0190),
                        stop("FH", "Frere Hall", 24.8482, 67.0305),
                        stop("AA", "Teen Talwar", 24.8340, 67.0330),
                    ],
                ),
                route(
                    "Blue Line",
                    vec![
                        stop("FH", "Frere Hall", 24.8482, 67.0305),
                        stop("SD", "Saddar", 24.8560, 67.0190),
                        stop("LH", "Light House", 24.8600, 67.0030),
                    ],
                ),
            ],
        })
        .unwrap()
    }

    /// Green Line feeds TX; only Orange Line continues from TX to OD.
    fn transfer_network() -> TransitGraph {
        TransitGraph::from_dataset(NetworkDataset {
            routes: vec![
                route(
                    "Green Line",
                    vec![
                        stop("G1", "Gulshan", 24.9000, 67.1000),
                        stop("GX", "Gulistan", 24.8800, 67.0800),
                        stop("TX", "Tower Exchange", 24.8700, 67.0500),
                    ],
                ),
                route(
                    "Orange Line",
                    vec![
                        stop("TX", "Tower Exchange", 24.8700, 67.0500),
                        stop("OD", "Orangi", 24.8500, 67.0000),
                    ],
                ),
            ],
        })
        .unwrap()
    }

    fn boarding_ids(choices: &[BoardingChoice<'_>]) -> Vec<String> {
        choices
            .iter()
            .map(|c| c.boarding().id.as_str().to_string())
            .collect()
    }

    #[test]
    fn direct_candidates_respect_travel_order() {
        let graph = karachi();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let fh = graph.stop(&id("FH")).unwrap();

        let choices = selector.direct_candidates(c(24.85, 67.02), fh);

        // AA is after FH on Red; LH is after FH on Blue
        assert_eq!(boarding_ids(&choices), vec!["ZZ", "SD"]);
        for choice in &choices {
            let BoardingChoice::Direct { boarding, route } = choice else {
                panic!("expected direct choice");
            };
            assert!(graph.precedes(route, &boarding.id, &fh.id));
        }
    }

    #[test]
    fn direct_candidates_toward_end_of_line() {
        let graph = karachi();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let lh = graph.stop(&id("LH")).unwrap();

        let choices = selector.direct_candidates(c(24.85, 67.02), lh);

        assert_eq!(boarding_ids(&choices), vec!["SD", "FH"]);
        assert!(choices.iter().all(|c| c.routes() == vec!["Blue Line".to_string()]));
    }

    #[test]
    fn transfer_found_when_no_direct_stop_in_reach() {
        let graph = transfer_network();
        let config = PlannerConfig::default().with_boarding_radius(2_500.0);
        let selector = BoardingSelector::new(&graph, &config);
        let od = graph.stop(&id("OD")).unwrap();
        let user = c(24.9000, 67.1000);

        assert!(selector.direct_candidates(user, od).is_empty());

        let choices = selector.candidates(user, od);
        assert_eq!(choices.len(), 1);
        let BoardingChoice::Transfer {
            boarding,
            transfer,
            first_route,
            second_route,
        } = choices[0]
        else {
            panic!("expected transfer choice");
        };
        assert_eq!(boarding.id.as_str(), "G1");
        assert_eq!(transfer.id.as_str(), "TX");
        assert_eq!(first_route, "Green Line");
        assert_eq!(second_route, "Orange Line");
    }

    #[tokio::test]
    async fn rejects_closer_stop_after_destination() {
        let graph = karachi();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let fh = graph.stop(&id("FH")).unwrap();

        // Standing at Teen Talwar, which is after Frere Hall on the Red Line
        let user = c(24.8340, 67.0330);
        let selection = selector.select(&measurer, user, fh).await.unwrap();

        assert_ne!(selection.choice.boarding().id.as_str(), "AA");
        assert_eq!(selection.choice.boarding().id.as_str(), "SD");
        assert_eq!(selection.choice.routes(), vec!["Red Line".to_string()]);
    }

    #[tokio::test]
    async fn scores_by_total_distance() {
        let graph = karachi();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let fh = graph.stop(&id("FH")).unwrap();

        // Slightly nearer Jama Cloth, but Saddar is on the way to Frere Hall
        let user = c(24.8605, 67.0115);
        let selection = selector.select(&measurer, user, fh).await.unwrap();

        assert_eq!(selection.choice.boarding().id.as_str(), "SD");
        assert!(selection.access.is_measured());
        assert!(selection.ride.is_measured());
    }

    #[tokio::test]
    async fn measures_at_most_k_candidates() {
        let graph = karachi();
        let config = PlannerConfig::default().with_candidate_limit(1);
        let selector = BoardingSelector::new(&graph, &config);
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let fh = graph.stop(&id("FH")).unwrap();

        selector
            .select(&measurer, c(24.8635, 67.0050), fh)
            .await
            .unwrap();

        // One candidate, two legs
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn falls_back_to_estimates_when_provider_fails() {
        let graph = karachi();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let stub =
            StaticDirections::new().failing_with(DirectionsError::ProviderUnavailable("HTTP 503".into()));
        let measurer = LegMeasurer::new(&stub, 1.3);
        let fh = graph.stop(&id("FH")).unwrap();

        let selection = selector
            .select(&measurer, c(24.8340, 67.0330), fh)
            .await
            .unwrap();

        assert_eq!(selection.choice.boarding().id.as_str(), "SD");
        assert!(!selection.access.is_measured());
        assert!(!selection.ride.is_measured());
    }

    #[tokio::test]
    async fn transfer_ride_covers_both_legs() {
        let graph = transfer_network();
        let config = PlannerConfig::default().with_boarding_radius(2_500.0);
        let selector = BoardingSelector::new(&graph, &config);
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let od = graph.stop(&id("OD")).unwrap();
        let user = c(24.9000, 67.1000);

        let selection = selector.select(&measurer, user, od).await.unwrap();

        let g1 = graph.stop(&id("G1")).unwrap().coordinates;
        let tx = graph.stop(&id("TX")).unwrap().coordinates;
        let expected = (geomath::distance(g1, tx) + geomath::distance(tx, od.coordinates)) * 1.25;
        assert!((selection.ride.meters() - expected).abs() < 1e-6);
        assert!(selection.ride.is_measured());
    }

    #[tokio::test]
    async fn shared_transfer_leg_is_measured_once() {
        let graph = transfer_network();
        let config = PlannerConfig::default().with_boarding_radius(4_000.0);
        let selector = BoardingSelector::new(&graph, &config);
        let stub = Yielding(StaticDirections::new());
        let measurer = LegMeasurer::new(&stub, 1.3);
        let od = graph.stop(&id("OD")).unwrap();
        let tx = graph.stop(&id("TX")).unwrap().coordinates;

        // Between Gulshan and Gulistan, both of which change at TX
        let user = c(24.8900, 67.0900);
        assert_eq!(selector.candidates(user, od).len(), 2);

        selector.select(&measurer, user, od).await.unwrap();

        let tx_to_od = stub
            .0
            .requests()
            .iter()
            .filter(|r| r.origin == tx && r.destination == od.coordinates)
            .count();
        assert_eq!(tx_to_od, 1);
        // Two access legs, two first rides, one shared second ride
        assert_eq!(stub.0.calls(), 5);
    }

    #[tokio::test]
    async fn no_route_when_destination_starts_every_route() {
        let graph = transfer_network();
        let config = PlannerConfig::default();
        let selector = BoardingSelector::new(&graph, &config);
        let stub = StaticDirections::new();
        let measurer = LegMeasurer::new(&stub, 1.3);
        let g1 = graph.stop(&id("G1")).unwrap();

        let err = selector
            .select(&measurer, c(24.8800, 67.0800), g1)
            .await
            .unwrap_err();

        assert_eq!(err, SelectionError::NoRoute(id("G1")));
        assert_eq!(stub.calls(), 0);
    }
}

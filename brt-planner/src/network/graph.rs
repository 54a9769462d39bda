//! In-memory transit graph.
//!
//! Built once from a [`NetworkDataset`] and read-only afterwards. Besides
//! id/name lookup it keeps, for every route, the position of each stop in
//! the declared travel order. That position index is what boarding-stop
//! validation relies on.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::domain::{BusRoute, Coordinates, Stop, StopId};

use super::dataset::NetworkDataset;
use super::error::{DataIntegrityError, NetworkError};

/// Coordinates of a stop declared twice may differ by at most this much.
const SAME_STOP_TOLERANCE_DEG: f64 = 1e-6;

/// The bus network: stops, routes and per-route stop order.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    /// Stops in order of first appearance in the dataset.
    stops: Vec<Stop>,
    stop_index: HashMap<StopId, usize>,
    routes: Vec<BusRoute>,
    route_index: HashMap<String, usize>,
    /// Per route (aligned with `routes`): stop id to sequence position.
    positions: Vec<HashMap<StopId, usize>>,
}

impl TransitGraph {
    /// Build the graph from a parsed dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`DataIntegrityError`] if the dataset is inconsistent:
    /// blank names, duplicate or empty routes, a stop repeated within one
    /// route, one stop id with conflicting coordinates or names, or a stop
    /// declaring a route that doesn't list it.
    pub fn from_dataset(dataset: NetworkDataset) -> Result<Self, DataIntegrityError> {
        let mut graph = TransitGraph::default();
        let mut declared: Vec<(StopId, String)> = Vec::new();

        for record in dataset.routes {
            let route_name = record.name.trim().to_string();
            if route_name.is_empty() {
                return Err(DataIntegrityError::Blank("route name"));
            }
            if graph.route_index.contains_key(&route_name) {
                return Err(DataIntegrityError::DuplicateRoute(route_name));
            }
            if record.stops.is_empty() {
                return Err(DataIntegrityError::EmptyRoute(route_name));
            }

            let mut sequence = Vec::with_capacity(record.stops.len());
            let mut positions = HashMap::with_capacity(record.stops.len());

            for stop_record in record.stops {
                let id = StopId::parse(&stop_record.id)
                    .map_err(|_| DataIntegrityError::Blank("stop id"))?;
                let name = stop_record.name.trim();
                if name.is_empty() {
                    return Err(DataIntegrityError::Blank("stop name"));
                }
                let coordinates = Coordinates::new(stop_record.lat, stop_record.lng).map_err(
                    |e| DataIntegrityError::InvalidCoordinates {
                        stop: id.to_string(),
                        message: e.to_string(),
                    },
                )?;

                let idx = match graph.stop_index.get(&id) {
                    Some(&idx) => {
                        let existing = &graph.stops[idx];
                        if !existing
                            .coordinates
                            .approx_eq(&coordinates, SAME_STOP_TOLERANCE_DEG)
                        {
                            return Err(DataIntegrityError::ConflictingStop {
                                stop: id.to_string(),
                                field: "coordinates",
                            });
                        }
                        if existing.name != name {
                            return Err(DataIntegrityError::ConflictingStop {
                                stop: id.to_string(),
                                field: "names",
                            });
                        }
                        idx
                    }
                    None => {
                        graph.stops.push(Stop::new(id.clone(), name, coordinates));
                        let idx = graph.stops.len() - 1;
                        graph.stop_index.insert(id.clone(), idx);
                        idx
                    }
                };

                if positions.insert(id.clone(), sequence.len()).is_some() {
                    return Err(DataIntegrityError::RepeatedStop {
                        route: route_name,
                        stop: id.to_string(),
                    });
                }

                graph.stops[idx].routes.insert(route_name.clone());
                for declared_route in stop_record.routes {
                    declared.push((id.clone(), declared_route.trim().to_string()));
                }
                sequence.push(id);
            }

            graph
                .route_index
                .insert(route_name.clone(), graph.routes.len());
            graph
                .routes
                .push(BusRoute::new(route_name, sequence, record.color));
            graph.positions.push(positions);
        }

        // Declared memberships must match a route that actually lists the stop
        for (stop, route) in declared {
            if graph.sequence_index(&route, &stop).is_none() {
                return Err(DataIntegrityError::UnknownRoute {
                    stop: stop.to_string(),
                    route,
                });
            }
        }

        Ok(graph)
    }

    /// Parse a JSON dataset and build the graph.
    pub fn from_json_str(json: &str) -> Result<Self, NetworkError> {
        let dataset: NetworkDataset = serde_json::from_str(json)?;
        Ok(Self::from_dataset(dataset)?)
    }

    /// Load a JSON dataset from disk and build the graph.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| NetworkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Number of stops.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Number of routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// All stops, in dataset order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// All routes, in dataset order.
    pub fn routes(&self) -> &[BusRoute] {
        &self.routes
    }

    /// Look up a stop by id.
    pub fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stop_index.get(id).map(|&idx| &self.stops[idx])
    }

    /// Look up a stop by name (case-insensitive, surrounding whitespace ignored).
    pub fn find_by_name(&self, name: &str) -> Option<&Stop> {
        let wanted = name.trim().to_lowercase();
        self.stops.iter().find(|s| s.name.to_lowercase() == wanted)
    }

    /// Search stops whose name contains `query` (case-insensitive).
    ///
    /// Names starting with the query come first; otherwise dataset order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Stop> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut prefix = Vec::new();
        let mut contains = Vec::new();
        for stop in &self.stops {
            let name = stop.name.to_lowercase();
            if name.starts_with(&query) {
                prefix.push(stop);
            } else if name.contains(&query) {
                contains.push(stop);
            }
        }

        prefix.extend(contains);
        prefix.truncate(limit);
        prefix
    }

    /// Look up a route by name.
    pub fn route(&self, name: &str) -> Option<&BusRoute> {
        self.route_index.get(name).map(|&idx| &self.routes[idx])
    }

    /// Stops served by a route, in travel order.
    ///
    /// Returns `None` for an unknown route.
    pub fn stops_served_by(&self, route: &str) -> Option<Vec<&Stop>> {
        let route = self.route(route)?;
        Some(route.stops.iter().filter_map(|id| self.stop(id)).collect())
    }

    /// Names of routes serving both stops.
    pub fn routes_shared_between(&self, a: &StopId, b: &StopId) -> BTreeSet<&str> {
        match (self.stop(a), self.stop(b)) {
            (Some(a), Some(b)) => a
                .routes
                .intersection(&b.routes)
                .map(String::as_str)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Position of a stop in a route's travel order.
    ///
    /// Returns `None` if the route is unknown or doesn't serve the stop.
    pub fn sequence_index(&self, route: &str, stop: &StopId) -> Option<usize> {
        let &route_idx = self.route_index.get(route)?;
        self.positions[route_idx].get(stop).copied()
    }

    /// Returns true if `a` comes strictly before `b` on `route`.
    pub fn precedes(&self, route: &str, a: &StopId, b: &StopId) -> bool {
        match (self.sequence_index(route, a), self.sequence_index(route, b)) {
            (Some(ia), Some(ib)) => ia < ib,
            _ => false,
        }
    }

    /// Number of stops travelled from `a` to `b` on `route`, if `a` precedes `b`.
    pub fn hops(&self, route: &str, a: &StopId, b: &StopId) -> Option<usize> {
        let ia = self.sequence_index(route, a)?;
        let ib = self.sequence_index(route, b)?;
        (ia < ib).then(|| ib - ia)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::dataset::{RouteRecord, StopRecord};

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn stop_record(id: &str, name: &str, lat: f64, lng: f64) -> StopRecord {
        StopRecord {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
            routes: Vec::new(),
        }
    }

    fn route_record(name: &str, stops: Vec<StopRecord>) -> RouteRecord {
        RouteRecord {
            name: name.to_string(),
            color: None,
            stops,
        }
    }

    /// Red Line north to south; Blue Line runs the other way and shares FH, SD.
    fn sample() -> NetworkDataset {
        NetworkDataset {
            routes: vec![
                route_record(
                    "Red Line",
                    vec![
                        stop_record("ZZ", "Jama Cloth", 24.8635, 67.0050),
                        stop_record("SD", "Saddar", 24.8560, 67.0190),
                        stop_record("FH", "Frere Hall", 24.8482, 67.0305),
                        stop_record("AA", "Teen Talwar", 24.8340, 67.0330),
                    ],
                ),
                route_record(
                    "Blue Line",
                    vec![
                        stop_record("FH", "Frere Hall", 24.8482, 67.0305),
                        stop_record("SD", "Saddar", 24.8560, 67.0190),
                        stop_record("LH", "Light House", 24.8600, 67.0030),
                    ],
                ),
            ],
        }
    }

    #[test]
    fn builds_stops_and_routes() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        assert_eq!(graph.stop_count(), 5);
        assert_eq!(graph.route_count(), 2);

        let fh = graph.stop(&id("FH")).unwrap();
        assert_eq!(fh.name, "Frere Hall");
        assert!(fh.is_served_by("Red Line"));
        assert!(fh.is_served_by("Blue Line"));
    }

    #[test]
    fn preserves_declared_order_not_id_order() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        let names: Vec<_> = graph
            .stops_served_by("Red Line")
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, ["Jama Cloth", "Saddar", "Frere Hall", "Teen Talwar"]);

        // "ZZ" sorts last by id but is first in travel order
        assert_eq!(graph.sequence_index("Red Line", &id("ZZ")), Some(0));
        assert_eq!(graph.sequence_index("Red Line", &id("AA")), Some(3));
    }

    #[test]
    fn sequence_index_is_per_route() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        assert_eq!(graph.sequence_index("Red Line", &id("SD")), Some(1));
        assert_eq!(graph.sequence_index("Blue Line", &id("SD")), Some(1));
        assert_eq!(graph.sequence_index("Red Line", &id("FH")), Some(2));
        assert_eq!(graph.sequence_index("Blue Line", &id("FH")), Some(0));
        assert_eq!(graph.sequence_index("Blue Line", &id("ZZ")), None);
        assert_eq!(graph.sequence_index("Green Line", &id("FH")), None);
    }

    #[test]
    fn precedes_and_hops() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        assert!(graph.precedes("Red Line", &id("SD"), &id("FH")));
        assert!(!graph.precedes("Blue Line", &id("SD"), &id("FH")));
        assert_eq!(graph.hops("Red Line", &id("ZZ"), &id("FH")), Some(2));
        assert_eq!(graph.hops("Red Line", &id("FH"), &id("ZZ")), None);
    }

    #[test]
    fn shared_routes() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        let shared = graph.routes_shared_between(&id("SD"), &id("FH"));
        assert_eq!(shared.into_iter().collect::<Vec<_>>(), ["Blue Line", "Red Line"]);

        let shared = graph.routes_shared_between(&id("LH"), &id("ZZ"));
        assert!(shared.is_empty());

        let shared = graph.routes_shared_between(&id("NOPE"), &id("FH"));
        assert!(shared.is_empty());
    }

    #[test]
    fn lookup_by_name_and_search() {
        let graph = TransitGraph::from_dataset(sample()).unwrap();
        assert_eq!(graph.find_by_name(" frere hall ").unwrap().id, id("FH"));
        assert!(graph.find_by_name("Frere").is_none());

        let hits: Vec<_> = graph.search("a", 10).iter().map(|s| s.id.clone()).collect();
        // "a" is not a prefix of any name; all contain it, dataset order
        assert_eq!(hits, [id("ZZ"), id("SD"), id("FH"), id("AA")]);

        let hits: Vec<_> = graph.search("l", 10).iter().map(|s| s.id.clone()).collect();
        // "Light House" starts with "l", the others merely contain it
        assert_eq!(hits[0], id("LH"));

        assert!(graph.search("  ", 10).is_empty());
        assert_eq!(graph.search("a", 2).len(), 2);
    }

    #[test]
    fn rejects_conflicting_coordinates() {
        let mut dataset = sample();
        dataset.routes[1].stops[0].lat = 24.9;
        assert_eq!(
            TransitGraph::from_dataset(dataset).unwrap_err(),
            DataIntegrityError::ConflictingStop {
                stop: "FH".into(),
                field: "coordinates"
            }
        );
    }

    #[test]
    fn rejects_conflicting_names() {
        let mut dataset = sample();
        dataset.routes[1].stops[0].name = "Frere Hall Gate".into();
        assert!(matches!(
            TransitGraph::from_dataset(dataset),
            Err(DataIntegrityError::ConflictingStop { field: "names", .. })
        ));
    }

    #[test]
    fn rejects_unknown_declared_route() {
        let mut dataset = sample();
        dataset.routes[0].stops[0].routes = vec!["Orange Line".into()];
        assert_eq!(
            TransitGraph::from_dataset(dataset).unwrap_err(),
            DataIntegrityError::UnknownRoute {
                stop: "ZZ".into(),
                route: "Orange Line".into()
            }
        );
    }

    #[test]
    fn rejects_declared_route_that_skips_the_stop() {
        let mut dataset = sample();
        // Jama Cloth is not on the Blue Line's sequence
        dataset.routes[0].stops[0].routes = vec!["Blue Line".into()];
        assert!(matches!(
            TransitGraph::from_dataset(dataset),
            Err(DataIntegrityError::UnknownRoute { .. })
        ));
    }

    #[test]
    fn accepts_matching_declared_routes() {
        let mut dataset = sample();
        dataset.routes[0].stops[2].routes = vec!["Red Line".into(), "Blue Line".into()];
        assert!(TransitGraph::from_dataset(dataset).is_ok());
    }

    #[test]
    fn rejects_structural_problems() {
        let mut dataset = sample();
        dataset.routes[1].name = "Red Line".into();
        assert_eq!(
            TransitGraph::from_dataset(dataset).unwrap_err(),
            DataIntegrityError::DuplicateRoute("Red Line".into())
        );

        let mut dataset = sample();
        dataset.routes[1].stops.clear();
        assert_eq!(
            TransitGraph::from_dataset(dataset).unwrap_err(),
            DataIntegrityError::EmptyRoute("Blue Line".into())
        );

        let mut dataset = sample();
        let again = dataset.routes[0].stops[0].clone();
        dataset.routes[0].stops.push(again);
        assert!(matches!(
            TransitGraph::from_dataset(dataset),
            Err(DataIntegrityError::RepeatedStop { .. })
        ));

        let mut dataset = sample();
        dataset.routes[0].stops[0].id = "  ".into();
        assert_eq!(
            TransitGraph::from_dataset(dataset).unwrap_err(),
            DataIntegrityError::Blank("stop id")
        );

        let mut dataset = sample();
        dataset.routes[0].stops[0].lat = 123.0;
        assert!(matches!(
            TransitGraph::from_dataset(dataset),
            Err(DataIntegrityError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, serde_json::to_string(&sample()).unwrap()).unwrap();

        let graph = TransitGraph::load_path(&path).unwrap();
        assert_eq!(graph.stop_count(), 5);
    }

    #[test]
    fn load_reports_missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let missing = TransitGraph::load_path(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(NetworkError::Io { .. })));

        let bad = TransitGraph::from_json_str("{ \"routes\": 3 }");
        assert!(matches!(bad, Err(NetworkError::Parse(_))));
    }
}

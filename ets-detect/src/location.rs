//! Building location hierarchy from `" > "`-joined group range paths.
//!
//! ETS projects mix physical locations (`Ground Floor > Kitchen`) with
//! functional labels (`Lighting > Kitchen`). Top-level segments naming a
//! domain are not locations themselves, but their children are visited.

use ets_ir::{DetectedDevice, Location, LocationType, ParseWarning, WarningCode, slugify};
use ets_project::ga_parser::PATH_SEPARATOR;
use std::collections::{HashMap, HashSet};

/// Lowercase top-level labels treated as functional domains.
pub const DOMAIN_NAMES: &[&str] = &[
    "lighting",
    "beleuchtung",
    "licht",
    "blinds",
    "jalousie",
    "jalousien",
    "shutter",
    "shutters",
    "rolladen",
    "hvac",
    "climate",
    "klima",
    "heating",
    "heizung",
    "cooling",
    "sensors",
    "sensoren",
    "scenes",
    "szenen",
    "security",
    "sicherheit",
    "energy",
    "energie",
    "audio",
    "video",
    "media",
];

pub fn is_domain_name(name: &str) -> bool {
    DOMAIN_NAMES.contains(&name.to_lowercase().as_str())
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    has_addresses: bool,
    children: Vec<Node>,
}

impl Node {
    fn child_mut(&mut self, name: &str) -> &mut Node {
        let slot = match self.children.iter().position(|c| c.name == name) {
            Some(slot) => slot,
            None => {
                self.children.push(Node {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[slot]
    }

    fn insert(&mut self, path: &str) {
        let mut node = self;
        let mut inserted = false;
        for segment in segments(path) {
            node = node.child_mut(segment);
            inserted = true;
        }
        if inserted {
            node.has_addresses = true;
        }
    }
}

#[derive(Default)]
struct Walker {
    locations: Vec<Location>,
    /// Slug to the parent slug of its first occurrence.
    seen: HashMap<String, String>,
    ambiguous: HashSet<String>,
    warnings: Vec<ParseWarning>,
}

impl Walker {
    fn walk(&mut self, node: &Node, depth: usize, parent: &str) {
        if depth == 0 && is_domain_name(&node.name) {
            for child in &node.children {
                self.walk(child, depth + 1, parent);
            }
            return;
        }

        let slug = slugify(&node.name);
        match self.seen.get(&slug) {
            Some(first_parent) => {
                if first_parent != parent && self.ambiguous.insert(slug.clone()) {
                    self.warnings.push(
                        ParseWarning::new(
                            WarningCode::LocationAmbiguous,
                            format!(
                                "location '{}' appears under more than one parent, merged into the first",
                                node.name
                            ),
                        ),
                    );
                }
            }
            None => {
                self.seen.insert(slug.clone(), parent.to_string());
                self.locations.push(classify(node, &slug, parent));
            }
        }

        for child in &node.children {
            self.walk(child, depth + 1, &slug);
        }
    }
}

fn classify(node: &Node, slug: &str, parent: &str) -> Location {
    let is_room = node.has_addresses && node.children.is_empty();
    Location {
        id: slug.to_string(),
        name: node.name.clone(),
        location_type: if is_room {
            LocationType::Room
        } else {
            LocationType::Floor
        },
        parent_id: parent.to_string(),
        suggested_area_id: if is_room {
            parent.to_string()
        } else {
            slug.to_string()
        },
        suggested_room_id: if is_room {
            slug.to_string()
        } else {
            String::new()
        },
    }
}

/// Build the location list from hierarchy paths.
///
/// Floors come before rooms; within each kind, order follows first
/// appearance of the path.
pub fn build_locations<'a, I>(paths: I) -> (Vec<Location>, Vec<ParseWarning>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut root = Node::default();
    for path in paths {
        root.insert(path);
    }

    let mut walker = Walker::default();
    for node in &root.children {
        walker.walk(node, 0, "");
    }

    let (mut locations, rooms): (Vec<_>, Vec<_>) = walker
        .locations
        .into_iter()
        .partition(|l| l.location_type == LocationType::Floor);
    locations.extend(rooms);

    log::debug!("built {} locations", locations.len());
    (locations, walker.warnings)
}

/// Set `suggested_room` and `suggested_area` from the device's source
/// location.
///
/// Returns a `ROOM_NOT_FOUND` warning when the path names a location that
/// was not emitted. A path made of a single domain label carries no
/// location and is left alone.
pub fn assign_location(device: &mut DetectedDevice, locations: &[Location]) -> Option<ParseWarning> {
    let mut parts: Vec<&str> = segments(&device.source_location).collect();
    if parts.first().is_some_and(|s| is_domain_name(s)) {
        parts.remove(0);
    }
    let terminal = parts.last()?;
    let slug = slugify(terminal);

    match locations.iter().find(|l| l.id == slug) {
        Some(location) if location.location_type == LocationType::Room => {
            device.suggested_room = location.id.clone();
            device.suggested_area.clone_from(&location.parent_id);
            None
        }
        Some(location) => {
            device.suggested_area = location.id.clone();
            None
        }
        None => Some(
            ParseWarning::new(
                WarningCode::RoomNotFound,
                format!("no location found for '{}'", device.source_location),
            )
            .with_devices(vec![device.suggested_id.clone()]),
        ),
    }
}

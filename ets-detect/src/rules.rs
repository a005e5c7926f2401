//! Tier-2 detection rules and their matcher.
//!
//! Rules are evaluated top to bottom and the first match wins, so order is
//! part of the behavior:
//!
//! - `heating_actuator` precedes the blind rules. Valve and blind position
//!   addresses share datapoint `5.001`; the heating rule requires a keyword
//!   match and claims valve groups before `blind_tilt` can take them on
//!   datapoint alone.
//! - `presence_sensor` precedes `light_sensor`, so a presence detector with
//!   a lux output is not reported as a light sensor.
//! - `light_dimmer` precedes `light_switch`, and `light_switch` is capped at
//!   three addresses so it does not swallow dimmer groups.

use ets_ir::{AddressFlag, GroupAddress, MAX_CONFIDENCE, matches_datapoint};

/// Boost for matching every optional requirement, scaled by the matched share.
pub const OPTIONAL_BOOST: f64 = 0.1;
/// Boost per matched slot whose address name contains one of its keywords.
pub const KEYWORD_BOOST: f64 = 0.05;

const W: &[AddressFlag] = &[AddressFlag::Write];
const RT: &[AddressFlag] = &[AddressFlag::Read, AddressFlag::Transmit];
const WR: &[AddressFlag] = &[AddressFlag::Write, AddressFlag::Read];

/// One address slot of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct DatapointRequirement {
    /// Exact type (`"5.001"`), wildcard (`"1.*"`), or bare main type.
    pub dpt: &'static str,
    pub function: &'static str,
    /// Lowercase name keywords.
    pub keywords: &'static [&'static str],
    pub flags: &'static [AddressFlag],
}

impl DatapointRequirement {
    pub fn name_matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.keywords.iter().any(|kw| lower.contains(kw))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRule {
    /// Device type reported on match.
    pub name: &'static str,
    pub domain: &'static str,
    pub required: &'static [DatapointRequirement],
    pub optional: &'static [DatapointRequirement],
    /// Largest name group the rule accepts; 0 means unbounded.
    pub max_addresses: usize,
    /// Required slots must match by keyword, never by datapoint alone.
    pub strict_name_match: bool,
    pub min_confidence: f64,
}

/// An address bound to one requirement of a matched rule.
#[derive(Debug, Clone)]
pub struct MatchedSlot<'a> {
    pub requirement: &'a DatapointRequirement,
    pub address: &'a GroupAddress,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct RuleMatch<'a> {
    pub rule: &'a DetectionRule,
    /// Required slots first, then optional ones, each in rule order.
    pub slots: Vec<MatchedSlot<'a>>,
    pub confidence: f64,
}

impl DetectionRule {
    /// Match this rule against one name group.
    ///
    /// Every required slot must be filled, first by datapoint and keyword,
    /// then (unless `strict_name_match`) by datapoint alone. Optional slots
    /// are filled best-effort. No address fills two slots.
    pub fn try_match<'a>(&'a self, addresses: &'a [GroupAddress]) -> Option<RuleMatch<'a>> {
        if self.max_addresses > 0 && addresses.len() > self.max_addresses {
            return None;
        }

        let mut slots: Vec<MatchedSlot<'a>> = Vec::new();
        for req in self.required {
            let address = find_candidate(req, addresses, &slots, true).or_else(|| {
                if self.strict_name_match {
                    None
                } else {
                    find_candidate(req, addresses, &slots, false)
                }
            })?;
            slots.push(MatchedSlot {
                requirement: req,
                address,
                optional: false,
            });
        }

        for opt in self.optional {
            if slots.iter().any(|s| s.requirement.function == opt.function) {
                continue;
            }
            if let Some(address) = find_candidate(opt, addresses, &slots, true) {
                slots.push(MatchedSlot {
                    requirement: opt,
                    address,
                    optional: true,
                });
            }
        }

        let optional_matched = slots.iter().filter(|s| s.optional).count();
        let keyword_matches = slots
            .iter()
            .filter(|s| s.requirement.name_matches(&s.address.name))
            .count();
        let confidence = confidence(
            self.min_confidence,
            optional_matched,
            self.optional.len(),
            keyword_matches,
        );

        Some(RuleMatch {
            rule: self,
            slots,
            confidence,
        })
    }
}

fn find_candidate<'a>(
    req: &DatapointRequirement,
    addresses: &'a [GroupAddress],
    taken: &[MatchedSlot<'a>],
    require_keyword: bool,
) -> Option<&'a GroupAddress> {
    addresses.iter().find(|ga| {
        matches_datapoint(&ga.dpt, req.dpt)
            && !taken.iter().any(|s| s.address.address == ga.address)
            && (!require_keyword || req.keywords.is_empty() || req.name_matches(&ga.name))
    })
}

/// Rule confidence: base plus optional-coverage and keyword boosts, capped
/// at [`MAX_CONFIDENCE`].
pub fn confidence(
    min_confidence: f64,
    optional_matched: usize,
    optional_count: usize,
    keyword_matches: usize,
) -> f64 {
    let mut value = min_confidence;
    if optional_count > 0 {
        value += OPTIONAL_BOOST * optional_matched as f64 / optional_count as f64;
    }
    value += KEYWORD_BOOST * keyword_matches as f64;
    value.min(MAX_CONFIDENCE)
}

/// The built-in rule table in evaluation order.
pub fn default_detection_rules() -> Vec<DetectionRule> {
    DEFAULT_RULES.to_vec()
}

const DEFAULT_RULES: &[DetectionRule] = &[
    DetectionRule {
        name: "light_dimmer",
        domain: "lighting",
        required: &[
            DatapointRequirement {
                dpt: "1.001",
                function: "switch",
                keywords: &["switch", "on/off", "schalten", "ein/aus"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "brightness",
                keywords: &["dim", "brightness", "level", "helligkeit", "wert"],
                flags: W,
            },
        ],
        optional: &[
            DatapointRequirement {
                dpt: "1.001",
                function: "switch_status",
                keywords: &["switch", "status", "feedback", "rückmeldung", "state"],
                flags: RT,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "brightness_status",
                keywords: &[
                    "brightness",
                    "dim",
                    "status",
                    "feedback",
                    "rückmeldung",
                    "state",
                    "actual",
                ],
                flags: RT,
            },
        ],
        max_addresses: 0,
        strict_name_match: false,
        min_confidence: 0.85,
    },
    DetectionRule {
        name: "heating_actuator",
        domain: "climate",
        required: &[DatapointRequirement {
            dpt: "5.001",
            function: "valve",
            keywords: &["valve", "heating", "actuator", "ventil"],
            flags: W,
        }],
        optional: &[DatapointRequirement {
            dpt: "5.001",
            function: "valve_status",
            keywords: &["valve", "status", "feedback", "rückmeldung"],
            flags: RT,
        }],
        max_addresses: 0,
        strict_name_match: true,
        min_confidence: 0.85,
    },
    DetectionRule {
        name: "blind_tilt",
        domain: "blinds",
        required: &[
            DatapointRequirement {
                dpt: "5.001",
                function: "position",
                keywords: &["position", "height", "höhe"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "slat",
                keywords: &["slat", "lamelle", "tilt", "angle", "winkel"],
                flags: W,
            },
        ],
        optional: &[
            DatapointRequirement {
                dpt: "1.008",
                function: "move",
                keywords: &["move", "up/down", "auf/ab", "fahren"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "1.007",
                function: "stop",
                keywords: &["stop", "stopp"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "position_status",
                keywords: &["position", "status", "feedback", "rückmeldung", "actual"],
                flags: RT,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "slat_status",
                keywords: &["slat", "lamelle", "tilt", "status"],
                flags: RT,
            },
        ],
        max_addresses: 0,
        strict_name_match: false,
        min_confidence: 0.85,
    },
    DetectionRule {
        name: "blind_position",
        domain: "blinds",
        required: &[
            DatapointRequirement {
                dpt: "1.008",
                function: "move",
                keywords: &["move", "up/down", "auf/ab", "fahren", "blind", "shutter"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "position",
                keywords: &["position", "height", "höhe"],
                flags: W,
            },
        ],
        optional: &[
            DatapointRequirement {
                dpt: "1.007",
                function: "stop",
                keywords: &["stop", "stopp"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "position_status",
                keywords: &["status", "feedback", "rückmeldung"],
                flags: RT,
            },
        ],
        max_addresses: 0,
        strict_name_match: false,
        min_confidence: 0.80,
    },
    DetectionRule {
        name: "blind_switch",
        domain: "blinds",
        required: &[DatapointRequirement {
            dpt: "1.008",
            function: "move",
            keywords: &["blind", "shutter", "jalousie", "rollo", "move", "up", "down"],
            flags: W,
        }],
        optional: &[
            DatapointRequirement {
                dpt: "1.007",
                function: "stop",
                keywords: &["stop", "step"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "1.010",
                function: "stop",
                keywords: &["stop", "step"],
                flags: W,
            },
            DatapointRequirement {
                dpt: "5.001",
                function: "position",
                keywords: &["position", "height"],
                flags: W,
            },
        ],
        max_addresses: 0,
        strict_name_match: false,
        min_confidence: 0.75,
    },
    DetectionRule {
        name: "light_switch",
        domain: "lighting",
        required: &[DatapointRequirement {
            dpt: "1.001",
            function: "switch",
            keywords: &["switch", "light", "licht", "on/off", "schalten", "ch-"],
            flags: W,
        }],
        optional: &[DatapointRequirement {
            dpt: "1.001",
            function: "switch_status",
            keywords: &["status", "feedback", "rückmeldung", "state"],
            flags: RT,
        }],
        max_addresses: 3,
        strict_name_match: false,
        min_confidence: 0.75,
    },
    DetectionRule {
        name: "temperature_sensor",
        domain: "sensor",
        required: &[DatapointRequirement {
            dpt: "9.001",
            function: "temperature",
            keywords: &["temp", "temperatur"],
            flags: RT,
        }],
        optional: &[],
        max_addresses: 2,
        strict_name_match: false,
        min_confidence: 0.90,
    },
    DetectionRule {
        name: "humidity_sensor",
        domain: "sensor",
        required: &[DatapointRequirement {
            dpt: "9.007",
            function: "humidity",
            keywords: &["humid", "feucht", "rh"],
            flags: RT,
        }],
        optional: &[],
        max_addresses: 2,
        strict_name_match: false,
        min_confidence: 0.90,
    },
    DetectionRule {
        name: "presence_sensor",
        domain: "sensor",
        required: &[DatapointRequirement {
            dpt: "1.*",
            function: "presence",
            keywords: &["presence", "motion", "bewegung", "präsenz", "occupancy"],
            flags: RT,
        }],
        optional: &[DatapointRequirement {
            dpt: "9.004",
            function: "lux",
            keywords: &["lux", "brightness", "helligkeit"],
            flags: RT,
        }],
        max_addresses: 3,
        strict_name_match: false,
        min_confidence: 0.85,
    },
    DetectionRule {
        name: "light_sensor",
        domain: "sensor",
        required: &[DatapointRequirement {
            dpt: "9.004",
            function: "lux",
            keywords: &["lux", "brightness", "helligkeit", "light level"],
            flags: RT,
        }],
        optional: &[],
        max_addresses: 2,
        strict_name_match: false,
        min_confidence: 0.90,
    },
    DetectionRule {
        name: "thermostat",
        domain: "climate",
        required: &[
            DatapointRequirement {
                dpt: "9.001",
                function: "temperature",
                keywords: &["temp", "actual", "ist"],
                flags: RT,
            },
            DatapointRequirement {
                dpt: "9.001",
                function: "setpoint",
                keywords: &["setpoint", "target", "soll", "set"],
                flags: WR,
            },
        ],
        optional: &[
            DatapointRequirement {
                dpt: "1.001",
                function: "heating",
                keywords: &["heat", "heiz"],
                flags: RT,
            },
            DatapointRequirement {
                dpt: "1.001",
                function: "cooling",
                keywords: &["cool", "kühl"],
                flags: RT,
            },
        ],
        max_addresses: 0,
        strict_name_match: false,
        min_confidence: 0.85,
    },
];

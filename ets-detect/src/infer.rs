//! Keyword and datapoint lookup tables shared by both classifier tiers.

use ets_ir::AddressFlag;
use ets_ir::dpt::main_type;

/// Device type for a single address, judged by its datapoint alone.
pub fn infer_type_from_dpt(dpt: &str) -> &'static str {
    if dpt.is_empty() {
        return "unknown";
    }

    match dpt {
        "1.001" => "light_switch",
        "5.001" => "light_dimmer",
        "7.600" => "light_ct",
        "232.600" => "light_rgb",
        "251.600" => "light_rgbw",
        "1.008" | "1.017" => "blind_position",
        "1.009" => "window_sensor",
        "9.001" => "temperature_sensor",
        "9.007" => "humidity_sensor",
        "9.004" => "brightness_sensor",
        "9.005" => "wind_sensor",
        "1.002" => "motion_sensor",
        "1.018" => "presence_sensor",
        "17.001" | "18.001" => "scene_controller",
        "20.102" => "thermostat",
        _ => match main_type(dpt) {
            "1" => "switch",
            "3" | "5" => "light_dimmer",
            "9" => "sensor",
            "13" | "14" => "energy_meter",
            "20" => "thermostat",
            _ => "unknown",
        },
    }
}

pub fn infer_domain_from_dpt(dpt: &str) -> &'static str {
    match dpt {
        "" => "sensor",
        "1.001" | "5.001" | "7.600" | "232.600" | "251.600" => "lighting",
        "1.008" | "1.017" => "blinds",
        "9.001" | "9.007" | "20.102" => "climate",
        "1.009" => "security",
        "17.001" | "18.001" => "scene",
        _ => match main_type(dpt) {
            "1" | "3" | "5" => "lighting",
            "13" | "14" => "energy",
            "17" | "18" => "scene",
            "20" => "climate",
            _ => "sensor",
        },
    }
}

/// First match wins; compound keywords precede the single words they contain.
const NAME_FUNCTIONS: &[(&[&str], &str)] = &[
    (&["brightness status", "helligkeit status"], "brightness_status"),
    (&["switch", "schalten", "on/off", "ein/aus"], "switch"),
    (&["status", "feedback", "rückmeldung", "state", "zustand"], "switch_status"),
    (&["brightness", "dimm", "helligkeit", "level"], "brightness"),
    (&["position", "höhe", "height"], "position"),
    (&["slat", "lamelle", "tilt", "neigung", "angle", "winkel"], "slat"),
    (&["move", "fahren", "up/down", "auf/ab"], "move"),
    (&["stop", "stopp"], "stop"),
    (&["temperature", "temperatur", "temp"], "temperature"),
    (&["setpoint", "sollwert", "soll"], "setpoint"),
    (&["humidity", "feuchte", "luftfeuchte"], "humidity"),
    (&["co2", "kohlendioxid"], "co2"),
    (&["presence", "präsenz", "anwesenheit"], "presence"),
    (&["motion", "bewegung"], "motion"),
    (&["occupancy", "belegung"], "occupancy"),
    (&["lux", "brightness sensor"], "lux"),
    (&["wind", "windgeschwindigkeit"], "wind_speed"),
    (&["rain", "regen"], "rain"),
    (&["scene", "szene"], "scene_number"),
    (&["power", "leistung", "watt"], "power"),
    (&["energy", "energie", "verbrauch"], "active_energy"),
    (&["voltage", "spannung"], "voltage"),
    (&["current", "strom"], "current"),
];

/// Semantic function from English or German keywords in an address name.
pub fn infer_function_from_name(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    NAME_FUNCTIONS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| lower.contains(kw)))
        .map(|(_, function)| *function)
}

/// Semantic function of a datapoint type, `"value"` when unknown.
pub fn infer_function_from_dpt(dpt: &str) -> &'static str {
    match dpt {
        "1.001" => "switch",
        "1.002" => "presence",
        "1.003" => "enable",
        "1.008" => "move",
        "1.009" => "open_close",
        "1.010" => "start_stop",
        "1.017" => "trigger",
        "1.018" => "occupancy",
        "3.007" => "dimming_control",
        "3.008" => "blind_control",
        "5.001" => "brightness",
        "5.003" => "angle",
        "5.004" => "percentage",
        "9.001" => "temperature",
        "9.002" => "temperature_difference",
        "9.004" => "lux",
        "9.005" => "wind_speed",
        "9.007" => "humidity",
        "9.008" => "co2",
        "9.020" => "voltage",
        "9.021" => "current",
        "7.600" => "color_temperature",
        "232.600" => "rgb",
        "251.600" => "rgbw",
        "13.010" => "active_energy",
        "13.013" => "active_energy_kwh",
        "14.019" => "current",
        "14.027" => "voltage",
        "14.056" => "power",
        "17.001" => "scene_number",
        "18.001" => "scene_control",
        "20.102" => "hvac_mode",
        _ => "value",
    }
}

/// Name keywords first, datapoint table second.
pub fn infer_function(dpt: &str, name: &str) -> &'static str {
    infer_function_from_name(name).unwrap_or_else(|| infer_function_from_dpt(dpt))
}

/// Feedback and sensor addresses are read/transmit, everything else is a
/// write command.
pub fn infer_flags(dpt: &str, name: &str) -> Vec<AddressFlag> {
    let lower = name.to_lowercase();
    let feedback = ["status", "feedback", "rückmeldung"]
        .iter()
        .any(|kw| lower.contains(kw));
    if feedback || matches!(main_type(dpt), "9" | "14") {
        vec![AddressFlag::Read, AddressFlag::Transmit]
    } else {
        vec![AddressFlag::Write]
    }
}

/// Function suffixes, compound forms before the single words they end with.
const NAME_SUFFIXES: &[&str] = &[
    " brightness status",
    " helligkeit status",
    " helligkeit rückmeldung",
    " position status",
    " position rückmeldung",
    " slat status",
    " lamelle status",
    " lamelle rückmeldung",
    " switch status",
    " schalten status",
    " schalten rückmeldung",
    " step/stop",
    " step-stop",
    " up/down",
    " auf/ab",
    " on/off",
    " ein/aus",
    " switch",
    " switching",
    " status",
    " feedback",
    " rückmeldung",
    " dimming",
    " brightness",
    " helligkeit",
    " level",
    " position",
    " move",
    " stop",
    " slat",
    " lamelle",
    " tilt",
    " angle",
    " schalten",
    " step",
    " stopp",
    " control",
    " steuerung",
    " cmd",
    " command",
];

const FUNCTION_WORDS: &[&str] = &[
    "switch",
    "dimming",
    "status",
    "brightness",
    "position",
    "move",
    "stop",
    "value",
    "schalten",
    "dimmen",
    "wert",
    "control",
    "steuerung",
];

/// Device part of an address name: `"Kitchen Light Switch"` and
/// `"Kitchen Light : Switch"` both become `"Kitchen Light"`.
pub fn extract_name_prefix(name: &str) -> String {
    let name = match name.rfind(" : ").or_else(|| name.rfind(':')) {
        Some(idx) if idx > 0 => name[..idx].trim(),
        _ => name,
    };

    let lower = name.to_lowercase();
    for suffix in NAME_SUFFIXES {
        if lower.ends_with(suffix) {
            let keep = name.chars().count() - suffix.chars().count();
            let cut: String = name.chars().take(keep).collect();
            return cut.trim().to_string();
        }
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    if let [head @ .., last] = words.as_slice() {
        if !head.is_empty() && FUNCTION_WORDS.contains(&last.to_lowercase().as_str()) {
            return head.join(" ");
        }
    }

    name.to_string()
}

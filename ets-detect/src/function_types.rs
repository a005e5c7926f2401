//! ETS function type lookup for Tier-1 classification.

/// Resolved classification of an ETS `Function`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionClass {
    pub device_type: &'static str,
    pub domain: &'static str,
    pub confidence: f64,
}

impl FunctionClass {
    const fn new(device_type: &'static str, domain: &'static str, confidence: f64) -> Self {
        FunctionClass {
            device_type,
            domain,
            confidence,
        }
    }
}

const CUSTOM_CONFIDENCE: f64 = 0.98;

/// Comment prefixes of `Custom` functions, matched case-insensitively.
const COMMENT_TYPES: &[(&str, &str, &str)] = &[
    ("temperature_sensor", "temperature_sensor", "sensor"),
    ("humidity_sensor", "humidity_sensor", "sensor"),
    ("co2_sensor", "co2_sensor", "sensor"),
    ("weather_station", "weather_station", "sensor"),
    ("presence_detector", "presence_sensor", "sensor"),
    ("motion_sensor", "presence_sensor", "sensor"),
    ("light_sensor", "light_sensor", "sensor"),
    ("binary_input", "binary_input", "sensor"),
    ("energy_meter", "energy_meter", "energy"),
    ("solar_inverter", "solar_inverter", "energy"),
    ("ev_charger", "ev_charger", "energy"),
    ("ip_router", "ip_router", "energy"),
    ("power_supply", "power_supply", "energy"),
    ("scene_controller", "scene_controller", "lighting"),
    ("push_button", "push_button", "lighting"),
    ("switch_actuator", "light_switch", "lighting"),
    ("dimmer_actuator", "light_dimmer", "lighting"),
    ("blind_actuator", "blind_position", "blinds"),
    ("shutter_actuator", "blind_position", "blinds"),
    ("heating_actuator", "heating_actuator", "climate"),
    ("thermostat", "thermostat", "climate"),
];

/// Map an ETS function `Type` to a device classification. `Custom`
/// functions are classified by their free-text comment. Unknown types and
/// comments yield `None`.
pub fn classify_function(function_type: &str, comment: &str) -> Option<FunctionClass> {
    let class = match function_type {
        "SwitchableLight" => FunctionClass::new("light_switch", "lighting", 0.99),
        "DimmableLight" => FunctionClass::new("light_dimmer", "lighting", 0.99),
        "Sunblind" => FunctionClass::new("blind_position", "blinds", 0.95),
        "HeatingRadiator" => FunctionClass::new("thermostat", "climate", 0.99),
        "HeatingFloor" => FunctionClass::new("heating_actuator", "climate", 0.99),
        "HeatingSwitchingVariable" | "HeatingContinuousVariable" => {
            FunctionClass::new("heating_actuator", "climate", 0.95)
        }
        "Custom" => return classify_comment(comment),
        _ => return None,
    };
    Some(class)
}

/// Classify a `Custom` function comment such as `"push_button_4"`.
pub fn classify_comment(comment: &str) -> Option<FunctionClass> {
    let lower = comment.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    COMMENT_TYPES
        .iter()
        .find(|(prefix, _, _)| lower.starts_with(prefix))
        .map(|(_, device_type, domain)| FunctionClass::new(device_type, domain, CUSTOM_CONFIDENCE))
}

//! Customer profile — shared consultation state.
//!
//! A fixed schema of optional fields extracted from the conversation.
//! No agent owns the profile: each agent works on its own copy held in
//! the session, and the orchestrator copies fields across on handoff.
//! Updates arrive as loose JSON (tool-call arguments), so every setter
//! is lenient about scalar encodings and silently skips values that do
//! not fit the field's type — a dropped value is a debug-log line, never
//! a failed turn.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Fields that must be known before a meaningful consultation can start.
/// Agents use [`CustomerProfile::missing_critical`] to decide whether to
/// ask clarifying questions before recommending anything.
pub const CRITICAL_FIELDS: [&str; 5] = [
    "age",
    "driving_experience",
    "vehicle_type",
    "commute_distance",
    "current_driver_insurance",
];

/// A customer profile for driver-insurance consultation.
///
/// Scalar fields are overwritten on update; list fields accept
/// single-value upserts by appending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    // Personal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,

    // Driving
    /// Years behind the wheel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    /// Kilometres per year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_mileage: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accident_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traffic_violations: Vec<String>,
    /// Kilometres, one way
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute_distance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_driving_area: Option<String>,

    // Insurance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_insurance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_driver_insurance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_monthly: Option<u32>,
    /// "minimal", "standard", or "premium"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_preference: Option<String>,

    // Needs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority_coverage: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,

    // Account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inquiry_products: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_contact_method: Option<String>,
}

impl CustomerProfile {
    /// Apply extracted fields to the profile. Returns the names of the
    /// fields that were actually updated; unknown fields and type
    /// mismatches are skipped, not fatal.
    pub fn update(&mut self, fields: &Map<String, Value>) -> Vec<String> {
        let mut applied = Vec::new();

        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            let ok = match key.as_str() {
                "name" => set_string(&mut self.name, value),
                "age" => set_u32(&mut self.age, value),
                "gender" => set_string(&mut self.gender, value),
                "occupation" => set_string(&mut self.occupation, value),
                "driving_experience" => set_u32(&mut self.driving_experience, value),
                "vehicle_type" => set_string(&mut self.vehicle_type, value),
                "annual_mileage" => set_u32(&mut self.annual_mileage, value),
                "accident_history" => push_list(&mut self.accident_history, value),
                "traffic_violations" => push_list(&mut self.traffic_violations, value),
                "commute_distance" => set_u32(&mut self.commute_distance, value),
                "main_driving_area" => set_string(&mut self.main_driving_area, value),
                "current_insurance" => set_bool(&mut self.current_insurance, value),
                "current_driver_insurance" => set_bool(&mut self.current_driver_insurance, value),
                "budget_monthly" => set_u32(&mut self.budget_monthly, value),
                "coverage_preference" => set_string(&mut self.coverage_preference, value),
                "priority_coverage" => push_list(&mut self.priority_coverage, value),
                "pain_points" => push_list(&mut self.pain_points, value),
                "customer_id" => set_string(&mut self.customer_id, value),
                "inquiry_products" => push_list(&mut self.inquiry_products, value),
                "preferred_contact_method" => set_string(&mut self.preferred_contact_method, value),
                other => {
                    debug!(field = other, "Skipping unknown profile field");
                    false
                }
            };

            if ok {
                applied.push(key.clone());
            } else if Self::is_known_field(key) {
                debug!(field = %key, "Skipping profile value with mismatched type");
            }
        }

        applied
    }

    /// Copy every set field from `other` into this profile. Used by the
    /// orchestrator when control passes to another agent. Goes through
    /// the same lenient path as [`update`](Self::update), so any
    /// mismatch is skipped rather than propagated.
    pub fn merge_from(&mut self, other: &CustomerProfile) -> Vec<String> {
        self.update(&other.to_map())
    }

    /// The critical fields still unset, in declaration order regardless
    /// of how the profile was filled in.
    pub fn missing_critical(&self) -> Vec<&'static str> {
        CRITICAL_FIELDS
            .into_iter()
            .filter(|field| match *field {
                "age" => self.age.is_none(),
                "driving_experience" => self.driving_experience.is_none(),
                "vehicle_type" => self.vehicle_type.is_none(),
                "commute_distance" => self.commute_distance.is_none(),
                "current_driver_insurance" => self.current_driver_insurance.is_none(),
                _ => unreachable!("critical field list out of sync"),
            })
            .collect()
    }

    /// The set fields as a JSON object (unset fields omitted).
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// No field has been extracted yet.
    pub fn is_empty(&self) -> bool {
        self.to_map().is_empty()
    }

    /// A compact one-field-per-line summary for prompt context.
    pub fn summary(&self) -> String {
        self.to_map()
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("- {k}: {s}"),
                Value::Array(items) => format!(
                    "- {k}: {}",
                    items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                other => format!("- {k}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_known_field(key: &str) -> bool {
        matches!(
            key,
            "name"
                | "age"
                | "gender"
                | "occupation"
                | "driving_experience"
                | "vehicle_type"
                | "annual_mileage"
                | "accident_history"
                | "traffic_violations"
                | "commute_distance"
                | "main_driving_area"
                | "current_insurance"
                | "current_driver_insurance"
                | "budget_monthly"
                | "coverage_preference"
                | "priority_coverage"
                | "pain_points"
                | "customer_id"
                | "inquiry_products"
                | "preferred_contact_method"
        )
    }
}

fn set_string(slot: &mut Option<String>, value: &Value) -> bool {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => {
            *slot = Some(s.trim().to_string());
            true
        }
        _ => false,
    }
}

/// Models pass numbers both as JSON numbers and as digit strings.
fn set_u32(slot: &mut Option<u32>, value: &Value) -> bool {
    let parsed = value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
    match parsed {
        Some(n) if n <= u32::MAX as u64 => {
            *slot = Some(n as u32);
            true
        }
        _ => false,
    }
}

fn set_bool(slot: &mut Option<bool>, value: &Value) -> bool {
    let parsed = value.as_bool().or_else(|| {
        value.as_str().and_then(|s| match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" => Some(true),
            "false" | "no" | "n" => Some(false),
            _ => None,
        })
    });
    match parsed {
        Some(b) => {
            *slot = Some(b);
            true
        }
        None => false,
    }
}

/// Single-value upsert appends; arrays extend with their string items.
fn push_list(list: &mut Vec<String>, value: &Value) -> bool {
    match value {
        Value::String(s) if !s.trim().is_empty() => {
            let s = s.trim().to_string();
            if !list.contains(&s) {
                list.push(s);
            }
            true
        }
        Value::Array(items) => {
            let mut any = false;
            for item in items {
                if let Some(s) = item.as_str() {
                    let s = s.trim().to_string();
                    if !s.is_empty() && !list.contains(&s) {
                        list.push(s);
                        any = true;
                    }
                }
            }
            any
        }
        _ => false,
    }
}

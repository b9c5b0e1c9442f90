//! Profile extraction capability.
//!
//! The model calls this whenever the customer reveals a fact worth
//! keeping. Every parameter is optional; whatever subset arrives is
//! applied through the profile's lenient update path, so a hallucinated
//! type never fails the call. The response names the fields that stuck
//! and the critical fields still missing, which lets the model decide
//! what to ask next.

use async_trait::async_trait;
use serde_json::{Value, json};

use baton_core::{
    Capability, CapabilityContext, CapabilityError, CapabilityOutcome, ParameterSpec, ParameterType,
};

pub struct ProfileUpdateCapability;

#[async_trait]
impl Capability for ProfileUpdateCapability {
    fn name(&self) -> &str {
        "update_profile"
    }

    fn description(&self) -> &str {
        "Record customer facts learned in the conversation. Pass only the fields the customer actually stated. Returns which fields were stored and which critical fields are still unknown."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        use ParameterType::{Boolean, Integer, String};
        vec![
            ParameterSpec::optional("name", "Customer name", String, Value::Null),
            ParameterSpec::optional("age", "Age in years", Integer, Value::Null),
            ParameterSpec::optional("gender", "Gender", String, Value::Null),
            ParameterSpec::optional("occupation", "Occupation", String, Value::Null),
            ParameterSpec::optional(
                "driving_experience",
                "Years of driving experience",
                Integer,
                Value::Null,
            ),
            ParameterSpec::optional(
                "vehicle_type",
                "Vehicle type, e.g. sedan, SUV, truck",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "annual_mileage",
                "Kilometres driven per year",
                Integer,
                Value::Null,
            ),
            ParameterSpec::optional(
                "accident_history",
                "One accident to add to the history",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "traffic_violations",
                "One traffic violation to add",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "commute_distance",
                "One-way commute distance in kilometres",
                Integer,
                Value::Null,
            ),
            ParameterSpec::optional(
                "main_driving_area",
                "Where the customer mostly drives",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "current_insurance",
                "Whether the customer holds any car insurance",
                Boolean,
                Value::Null,
            ),
            ParameterSpec::optional(
                "current_driver_insurance",
                "Whether the customer holds driver insurance",
                Boolean,
                Value::Null,
            ),
            ParameterSpec::optional(
                "budget_monthly",
                "Monthly budget for premiums",
                Integer,
                Value::Null,
            ),
            ParameterSpec::optional(
                "coverage_preference",
                "Preferred coverage level: minimal, standard, or premium",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "priority_coverage",
                "One coverage item the customer cares most about",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "pain_points",
                "One complaint about current or past insurance",
                String,
                Value::Null,
            ),
            ParameterSpec::optional("customer_id", "Customer account id", String, Value::Null),
            ParameterSpec::optional(
                "inquiry_products",
                "One product the customer asked about",
                String,
                Value::Null,
            ),
            ParameterSpec::optional(
                "preferred_contact_method",
                "How the customer prefers to be contacted",
                String,
                Value::Null,
            ),
        ]
    }

    async fn invoke(
        &self,
        arguments: Value,
        cx: &mut CapabilityContext<'_>,
    ) -> Result<CapabilityOutcome, CapabilityError> {
        let Value::Object(fields) = arguments else {
            return Err(CapabilityError::ArgumentParse(
                "expected a JSON object of profile fields".into(),
            ));
        };

        let applied = cx.profile.update(&fields);
        let missing = cx.profile.missing_critical();
        tracing::debug!(
            agent = cx.agent,
            applied = applied.len(),
            missing = missing.len(),
            "Profile updated"
        );

        Ok(CapabilityOutcome::Data(json!({
            "updated": applied,
            "missing_critical": missing,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_core::{CustomerProfile, descriptor_for};

    #[tokio::test]
    async fn applies_fields_and_reports_missing() {
        let capability = ProfileUpdateCapability;
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "sales",
            profile: &mut profile,
        };

        let outcome = capability
            .invoke(json!({"age": 34, "vehicle_type": "SUV"}), &mut cx)
            .await
            .unwrap();

        let CapabilityOutcome::Data(data) = outcome else {
            panic!("expected data");
        };
        let updated = data["updated"].as_array().unwrap();
        assert_eq!(updated.len(), 2);
        let missing = data["missing_critical"].as_array().unwrap();
        assert!(missing.iter().any(|m| m == "driving_experience"));
        assert!(!missing.iter().any(|m| m == "age"));
        assert_eq!(profile.age, Some(34));
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let capability = ProfileUpdateCapability;
        let mut profile = CustomerProfile::default();
        let mut cx = CapabilityContext {
            agent: "sales",
            profile: &mut profile,
        };

        let err = capability.invoke(json!("age: 34"), &mut cx).await;
        assert!(matches!(err, Err(CapabilityError::ArgumentParse(_))));
    }

    #[test]
    fn every_parameter_is_optional() {
        let descriptor = descriptor_for(&ProfileUpdateCapability);
        assert!(descriptor.parameters["required"].as_array().unwrap().is_empty());
        let properties = descriptor.parameters["properties"].as_object().unwrap();
        assert!(properties.contains_key("age"));
        assert!(properties.contains_key("current_driver_insurance"));
        assert_eq!(properties["age"]["type"], "integer");
    }
}

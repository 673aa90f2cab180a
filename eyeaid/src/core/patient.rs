//! Patient metadata supplied once per run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Patient metadata accompanying a retinal image.
///
/// Fields are private: a context is read-only once built and is passed by
/// value (cloned) into every stage. `age` is optional at the type level so
/// that the intake gate, not deserialization, decides what happens when it
/// is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    age: Option<i64>,
    #[serde(default)]
    known_conditions: BTreeSet<String>,
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language_preference: Option<String>,
}

impl PatientContext {
    /// Creates a context for a patient of the given age.
    #[must_use]
    pub fn new(age: i64) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    /// Creates a context without an age, as received from an incomplete form.
    #[must_use]
    pub fn without_age() -> Self {
        Self::default()
    }

    /// Adds a known condition.
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.known_conditions.insert(condition.into());
        self
    }

    /// Replaces the known conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.known_conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a symptom.
    #[must_use]
    pub fn with_symptom(mut self, symptom: impl Into<String>) -> Self {
        self.symptoms.push(symptom.into());
        self
    }

    /// Replaces the symptoms.
    #[must_use]
    pub fn with_symptoms(mut self, symptoms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.symptoms = symptoms.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the preferred language for patient communication.
    #[must_use]
    pub fn with_language_preference(mut self, language: impl Into<String>) -> Self {
        self.language_preference = Some(language.into());
        self
    }

    /// The recorded age, if any.
    #[must_use]
    pub const fn age(&self) -> Option<i64> {
        self.age
    }

    /// Known conditions, in sorted order.
    #[must_use]
    pub const fn known_conditions(&self) -> &BTreeSet<String> {
        &self.known_conditions
    }

    /// Reported symptoms, in the order given.
    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    /// The preferred language, if any.
    #[must_use]
    pub fn language_preference(&self) -> Option<&str> {
        self.language_preference.as_deref()
    }

    /// Serializes to the compact JSON embedded in prompts.
    #[must_use]
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let ctx = PatientContext::new(59)
            .with_condition("diabetes")
            .with_symptom("blurred vision")
            .with_language_preference("English");

        assert_eq!(ctx.age(), Some(59));
        assert!(ctx.known_conditions().contains("diabetes"));
        assert_eq!(ctx.symptoms(), &["blurred vision".to_string()]);
        assert_eq!(ctx.language_preference(), Some("English"));
    }

    #[test]
    fn test_deserialize_without_age() {
        let ctx: PatientContext =
            serde_json::from_str(r#"{"known_conditions":["diabetes"]}"#).unwrap();

        assert_eq!(ctx.age(), None);
        assert!(ctx.symptoms().is_empty());
    }

    #[test]
    fn test_prompt_json_field_order() {
        let ctx = PatientContext::new(60)
            .with_conditions(["hypertension", "diabetes"])
            .with_symptoms(["eye pain", "blurred vision"]);

        assert_eq!(
            ctx.to_prompt_json(),
            r#"{"age":60,"known_conditions":["diabetes","hypertension"],"symptoms":["eye pain","blurred vision"]}"#
        );
    }

    #[test]
    fn test_missing_age_is_omitted_from_prompt() {
        let ctx = PatientContext::without_age();
        assert_eq!(ctx.to_prompt_json(), r#"{"known_conditions":[],"symptoms":[]}"#);
    }
}

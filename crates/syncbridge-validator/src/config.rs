/// Settings the validator needs. Deliberately narrower than
/// `syncbridge_core::Settings` — a pure function over `(EntityType,
/// RawPayload, ValidatorConfig)` shouldn't depend on unrelated fields.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub email_domain: String,
}

impl From<&syncbridge_core::Settings> for ValidatorConfig {
    fn from(settings: &syncbridge_core::Settings) -> Self {
        Self {
            email_domain: settings.validator_email_domain.clone(),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` is missing field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl DomainError {
    pub fn missing(entity: &'static str, field: &'static str) -> Self {
        Self::MissingField { entity, field }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid code: {0}")]
    Code(#[from] billing_types::CodeError),
    #[error("rule tables: {0}")]
    RuleTables(#[from] rule_tables::RuleTablesError),
    #[error("failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),
    #[error("failed to read charge file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize charges: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

pub type BillingResult<T> = std::result::Result<T, BillingError>;

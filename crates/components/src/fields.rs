use crate::config_map::ConfigMap;
use crate::report::ValidationError;
use regex::Regex;

pub const REQUIRED_REASON: &str = "A value is required";
pub const MAX_TOPIC_NAME_LEN: usize = 249;

/// Field specific rule. Sees the whole map so it can look at neighbouring
/// properties; returns the reason text when the field is invalid.
pub type FieldValidator = fn(&FieldSpec, &ConfigMap) -> Option<String>;

/// Shape a present value must have. Checked before any custom validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int { min: i64, max: i64 },
    Boolean,
    /// Case-insensitive choice between the listed values.
    Enum(&'static [&'static str]),
    /// Must equal the given literal exactly.
    Exact(&'static str),
    /// Comma separated list of regular expressions.
    RegexList,
    /// Usable as (a prefix of) a Kafka topic name.
    TopicName,
}

impl FieldType {
    pub const fn positive_int() -> Self {
        FieldType::Int {
            min: 1,
            max: i64::MAX,
        }
    }

    /// Returns the reason `raw` does not fit this type.
    pub fn check(&self, raw: &str) -> Option<String> {
        match self {
            FieldType::String => None,
            FieldType::Int { min, max } => match raw.parse::<i64>() {
                Err(_) => Some(format!("'{raw}' is not a valid integer")),
                Ok(v) if v < *min => Some(format!("Must be at least {min}")),
                Ok(v) if v > *max => Some(format!("Must be at most {max}")),
                Ok(_) => None,
            },
            FieldType::Boolean => {
                if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
                    None
                } else {
                    Some(format!("'{raw}' is not a valid boolean"))
                }
            }
            FieldType::Enum(allowed) => {
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(raw)) {
                    None
                } else {
                    Some(format!("Value must be one of {}", allowed.join(", ")))
                }
            }
            FieldType::Exact(expected) => {
                if raw == *expected {
                    None
                } else {
                    Some(format!("Expected '{expected}'"))
                }
            }
            FieldType::RegexList => raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .find(|item| Regex::new(item).is_err())
                .map(|item| format!("'{item}' is not a valid regular expression")),
            FieldType::TopicName => check_topic_name(raw),
        }
    }
}

fn check_topic_name(raw: &str) -> Option<String> {
    if raw.len() > MAX_TOPIC_NAME_LEN {
        return Some(format!(
            "Topic prefix '{raw}' is longer than {MAX_TOPIC_NAME_LEN} characters"
        ));
    }
    let legal = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if raw.chars().all(legal) {
        None
    } else {
        Some(format!("Topic prefix '{raw}' contains invalid characters"))
    }
}

/// Declaration of one configuration property of a connector type.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: &'static str,
    field_type: FieldType,
    required: bool,
    default: Option<&'static str>,
    description: &'static str,
    validator: Option<FieldValidator>,
}

impl FieldSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            required: false,
            default: None,
            description: "",
            validator: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn with_validator(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&'static str> {
        self.default
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Supplied value, falling back to the declared default.
    pub fn value<'a>(&self, config: &'a ConfigMap) -> Option<&'a str> {
        config.value(self.name).or(self.default)
    }

    pub fn int_value(&self, config: &ConfigMap) -> Option<i64> {
        self.value(config).and_then(|v| v.parse().ok())
    }

    pub fn bool_value(&self, config: &ConfigMap) -> Option<bool> {
        self.value(config).and_then(|v| v.to_ascii_lowercase().parse().ok())
    }

    /// Runs the checks for this field. Pure; the same map always yields the
    /// same answer.
    pub fn validate(&self, config: &ConfigMap) -> Option<ValidationError> {
        self.problem(config)
            .map(|reason| ValidationError::invalid_value(self.name, reason))
    }

    fn problem(&self, config: &ConfigMap) -> Option<String> {
        match config.value(self.name) {
            None if self.required && self.default.is_none() => {
                return Some(REQUIRED_REASON.to_string())
            }
            Some(raw) => {
                if let Some(reason) = self.field_type.check(raw) {
                    return Some(reason);
                }
            }
            None => {}
        }
        self.validator.and_then(|validator| validator(self, config))
    }
}

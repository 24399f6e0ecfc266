use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Current parameter assignment of a strategy, in declaration order.
pub type Parameters = IndexMap<SmolStr, ParamValue>;

/// A single strategy parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Dec(Decimal),
    Choice(SmolStr),
    Flag(bool),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Dec(v) => write!(f, "{v}"),
            Self::Choice(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
        }
    }
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Dec(v) => Some(*v),
            Self::Int(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            _ => None,
        }
    }
}

/// Parameter validation failure, raised synchronously on assignment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
pub enum ParameterError {
    #[error("parameter '{name}': {value} out of range [{min}, {max}]")]
    OutOfRange {
        name: SmolStr,
        value: String,
        min: String,
        max: String,
    },

    #[error("parameter '{name}': expected {expected}")]
    WrongKind {
        name: SmolStr,
        expected: &'static str,
    },

    #[error("parameter '{name}': '{value}' is not one of the declared choices")]
    UnknownChoice { name: SmolStr, value: SmolStr },
}

/// Declared search-space shape of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int {
        default: i64,
        min: i64,
        max: i64,
        step: i64,
    },
    Dec {
        default: Decimal,
        min: Decimal,
        max: Decimal,
        step: Decimal,
    },
    Choice {
        default: SmolStr,
        choices: Vec<SmolStr>,
    },
    Flag {
        default: bool,
    },
}

/// Declaration-table entry describing one strategy parameter.
///
/// Descriptors validate assignments and enumerate each dimension's discrete
/// grid for the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ParamDescriptor {
    pub name: SmolStr,
    pub kind: ParamKind,
    pub description: SmolStr,
}

impl ParamDescriptor {
    pub fn int(
        name: impl Into<SmolStr>,
        default: i64,
        min: i64,
        max: i64,
        step: i64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Int {
                default,
                min,
                max,
                step: step.max(1),
            },
            description: SmolStr::default(),
        }
    }

    pub fn dec(
        name: impl Into<SmolStr>,
        default: Decimal,
        min: Decimal,
        max: Decimal,
        step: Decimal,
    ) -> Self {
        let step = if step <= Decimal::ZERO {
            Decimal::new(1, 1)
        } else {
            step
        };
        Self {
            name: name.into(),
            kind: ParamKind::Dec {
                default,
                min,
                max,
                step,
            },
            description: SmolStr::default(),
        }
    }

    pub fn choice(name: impl Into<SmolStr>, default: impl Into<SmolStr>, choices: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Choice {
                default: default.into(),
                choices: choices.iter().map(|c| SmolStr::new(c)).collect(),
            },
            description: SmolStr::default(),
        }
    }

    pub fn flag(name: impl Into<SmolStr>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Flag { default },
            description: SmolStr::default(),
        }
    }

    pub fn describe(mut self, description: impl Into<SmolStr>) -> Self {
        self.description = description.into();
        self
    }

    pub fn default_value(&self) -> ParamValue {
        match &self.kind {
            ParamKind::Int { default, .. } => ParamValue::Int(*default),
            ParamKind::Dec { default, .. } => ParamValue::Dec(*default),
            ParamKind::Choice { default, .. } => ParamValue::Choice(default.clone()),
            ParamKind::Flag { default } => ParamValue::Flag(*default),
        }
    }

    /// Validate an assignment against the declared bounds.
    pub fn validate(&self, value: &ParamValue) -> Result<(), ParameterError> {
        match (&self.kind, value) {
            (ParamKind::Int { min, max, .. }, ParamValue::Int(v)) => {
                if v < min || v > max {
                    return Err(ParameterError::OutOfRange {
                        name: self.name.clone(),
                        value: v.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                Ok(())
            }
            (ParamKind::Dec { min, max, .. }, ParamValue::Dec(v)) => {
                if v < min || v > max {
                    return Err(ParameterError::OutOfRange {
                        name: self.name.clone(),
                        value: v.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
                Ok(())
            }
            (ParamKind::Choice { choices, .. }, ParamValue::Choice(v)) => {
                if choices.contains(v) {
                    Ok(())
                } else {
                    Err(ParameterError::UnknownChoice {
                        name: self.name.clone(),
                        value: v.clone(),
                    })
                }
            }
            (ParamKind::Flag { .. }, ParamValue::Flag(_)) => Ok(()),
            (kind, _) => Err(ParameterError::WrongKind {
                name: self.name.clone(),
                expected: match kind {
                    ParamKind::Int { .. } => "an integer",
                    ParamKind::Dec { .. } => "a decimal",
                    ParamKind::Choice { .. } => "one of the declared choices",
                    ParamKind::Flag { .. } => "a boolean",
                },
            }),
        }
    }

    /// The parameter's discrete grid, used by the optimizer.
    pub fn values(&self) -> Vec<ParamValue> {
        match &self.kind {
            ParamKind::Int { min, max, step, .. } => {
                let mut values = Vec::new();
                let mut v = *min;
                while v <= *max {
                    values.push(ParamValue::Int(v));
                    v += step;
                }
                values
            }
            ParamKind::Dec { min, max, step, .. } => {
                let mut values = Vec::new();
                let mut v = *min;
                while v <= *max {
                    values.push(ParamValue::Dec(v));
                    v += step;
                }
                values
            }
            ParamKind::Choice { choices, .. } => choices
                .iter()
                .map(|c| ParamValue::Choice(c.clone()))
                .collect(),
            ParamKind::Flag { .. } => vec![ParamValue::Flag(true), ParamValue::Flag(false)],
        }
    }
}

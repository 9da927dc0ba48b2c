use crate::checker::PolicyParameters;
use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu};
use crate::path::builder::BuildDirection;
use const_oid::ObjectIdentifier;

/// Path building inputs that come from configuration rather than from the
/// call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Maximum number of intermediate certificates; `None` is unlimited.
    pub max_path_length: Option<usize>,
    pub direction: BuildDirection,
    pub policy: PolicyParameters,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_path_length: Some(5),
            direction: BuildDirection::Forward,
            policy: PolicyParameters::default(),
        }
    }
}

impl PathConfig {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(max) = settings.get_int("max_path_length") {
            config.max_path_length = match (max, usize::try_from(max)) {
                (-1, _) => None,
                (_, Ok(n)) => Some(n),
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "max_path_length",
                        value: max.to_string(),
                        explanation: "Use -1 for unlimited or a non-negative length",
                    }
                    .fail();
                }
            };
        }
        if let Some(direction) = settings.get_string("build_direction") {
            config.direction = match direction.to_uppercase().as_str() {
                "FORWARD" => BuildDirection::Forward,
                "REVERSE" => BuildDirection::Reverse,
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "build_direction",
                        value: direction,
                        explanation: "Allowed values are FORWARD and REVERSE",
                    }
                    .fail();
                }
            };
        }
        let policy = &mut config.policy;
        let flags: [(&str, &mut bool); 4] = [
            ("initial_explicit_policy", &mut policy.explicit_policy_required),
            (
                "initial_policy_mapping_inhibit",
                &mut policy.policy_mapping_inhibited,
            ),
            ("initial_any_policy_inhibit", &mut policy.any_policy_inhibited),
            ("reject_policy_qualifiers", &mut policy.reject_policy_qualifiers),
        ];
        for (key, flag) in flags {
            if let Some(value) = settings.get_bool(key) {
                *flag = value;
            }
        }
        if let Some(list) = settings.get_string("initial_policy_set") {
            for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                let policy_id = ObjectIdentifier::new(entry).map_err(|e| {
                    InvalidParameterValueSnafu {
                        parameter: "initial_policy_set",
                        value: entry,
                        explanation: e.to_string(),
                    }
                    .build()
                })?;
                policy.initial_policies.insert(policy_id);
            }
        }
        Ok(config)
    }
}

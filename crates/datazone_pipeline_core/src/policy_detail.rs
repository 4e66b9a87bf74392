use serde::Serialize;

use crate::error::InvalidInput;
use crate::grant_request::PolicyType;

/// Policy-specific payload of a grant, keyed by policy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PolicyDetail {
    CreateProject {
        include_child_domain_units: bool,
    },
    AddToProjectMemberPool {
        include_child_domain_units: bool,
    },
    CreateGlossary {
        include_child_domain_units: bool,
    },
    CreateFormType {
        include_child_domain_units: bool,
    },
    CreateAssetType {
        include_child_domain_units: bool,
    },
    CreateEnvironmentProfile {
        domain_unit_id: Option<String>,
    },
    CreateEnvironment {},
    CreateEnvironmentFromBlueprint {
        include_child_domain_units: bool,
    },
    CreateProjectFromProjectProfile {
        include_child_domain_units: bool,
        project_profiles: Vec<String>,
    },
    CreateDomainUnit {
        include_child_domain_units: bool,
    },
}

impl PolicyDetail {
    pub fn include_child_domain_units(&self) -> Option<bool> {
        match self {
            Self::CreateProject {
                include_child_domain_units,
            }
            | Self::AddToProjectMemberPool {
                include_child_domain_units,
            }
            | Self::CreateGlossary {
                include_child_domain_units,
            }
            | Self::CreateFormType {
                include_child_domain_units,
            }
            | Self::CreateAssetType {
                include_child_domain_units,
            }
            | Self::CreateEnvironmentFromBlueprint {
                include_child_domain_units,
            }
            | Self::CreateProjectFromProjectProfile {
                include_child_domain_units,
                ..
            }
            | Self::CreateDomainUnit {
                include_child_domain_units,
            } => Some(*include_child_domain_units),
            Self::CreateEnvironmentProfile { .. } | Self::CreateEnvironment {} => None,
        }
    }
}

pub fn resolve_policy_detail(
    policy_type: PolicyType,
    include_child_domain_units: bool,
    domain_unit_id: Option<&str>,
) -> PolicyDetail {
    match policy_type {
        PolicyType::CreateProject => PolicyDetail::CreateProject {
            include_child_domain_units,
        },
        PolicyType::AddToProjectMemberPool => PolicyDetail::AddToProjectMemberPool {
            include_child_domain_units,
        },
        PolicyType::CreateGlossary => PolicyDetail::CreateGlossary {
            include_child_domain_units,
        },
        PolicyType::CreateFormType => PolicyDetail::CreateFormType {
            include_child_domain_units,
        },
        PolicyType::CreateAssetType => PolicyDetail::CreateAssetType {
            include_child_domain_units,
        },
        PolicyType::CreateEnvironmentProfile => PolicyDetail::CreateEnvironmentProfile {
            domain_unit_id: domain_unit_id.map(str::to_string),
        },
        PolicyType::CreateEnvironment => PolicyDetail::CreateEnvironment {},
        PolicyType::CreateEnvironmentFromBlueprint => {
            PolicyDetail::CreateEnvironmentFromBlueprint {
                include_child_domain_units,
            }
        }
        PolicyType::CreateProjectFromProjectProfile => {
            PolicyDetail::CreateProjectFromProjectProfile {
                include_child_domain_units,
                project_profiles: Vec::new(),
            }
        }
        PolicyType::CreateDomainUnit => PolicyDetail::CreateDomainUnit {
            include_child_domain_units,
        },
    }
}

/// String-keyed entry point for callers holding the raw property value.
pub fn resolve_policy_detail_str(
    policy_type: &str,
    include_child_domain_units: bool,
    domain_unit_id: Option<&str>,
) -> Result<PolicyDetail, InvalidInput> {
    Ok(resolve_policy_detail(
        policy_type.parse::<PolicyType>()?,
        include_child_domain_units,
        domain_unit_id,
    ))
}

use serde::Serialize;

use crate::error::InvalidInput;
use crate::grant_request::{PolicyType, PrincipalType, DOMAIN_UNIT_IDENTIFIER, PRINCIPAL_ARN};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrincipalDescriptor {
    User(UserPrincipal),
    Group {
        #[serde(rename = "groupIdentifier")]
        group_identifier: String,
    },
    Project(ProjectPrincipal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UserPrincipal {
    UserIdentifier(String),
    AllUsersGrantFilter {},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectDesignation {
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPrincipal {
    pub project_designation: ProjectDesignation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_grant_filter: Option<ProjectGrantFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGrantFilter {
    pub domain_unit_filter: DomainUnitFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainUnitFilter {
    pub domain_unit: String,
    pub include_child_domain_units: bool,
}

/// Picks the principal shape the grant API expects.
///
/// Environment profile and environment creation are always granted to the
/// owning project, whatever `principal_type` says. Every other policy type
/// is driven by `principal_type`; an unrecognized or absent value fails here,
/// before any remote call.
pub fn resolve_principal(
    principal_type: Option<&str>,
    policy_type: PolicyType,
    principal_arn: Option<&str>,
    domain_unit_id: Option<&str>,
    project_id: Option<&str>,
) -> Result<PrincipalDescriptor, InvalidInput> {
    match policy_type {
        PolicyType::CreateEnvironmentProfile => {
            let domain_unit = domain_unit_id
                .map(str::to_string)
                .ok_or(InvalidInput::MissingProperty(DOMAIN_UNIT_IDENTIFIER))?;
            return Ok(PrincipalDescriptor::Project(ProjectPrincipal {
                project_designation: ProjectDesignation::Owner,
                project_grant_filter: Some(ProjectGrantFilter {
                    domain_unit_filter: DomainUnitFilter {
                        domain_unit,
                        include_child_domain_units: false,
                    },
                }),
                project_identifier: project_id.map(str::to_string),
            }));
        }
        PolicyType::CreateEnvironment => {
            return Ok(PrincipalDescriptor::Project(ProjectPrincipal {
                project_designation: ProjectDesignation::Owner,
                project_grant_filter: None,
                project_identifier: project_id.map(str::to_string),
            }));
        }
        _ => {}
    }

    let principal_type = principal_type
        .ok_or_else(|| InvalidInput::InvalidPrincipalType("<missing>".to_string()))?
        .parse::<PrincipalType>()?;

    match principal_type {
        PrincipalType::IamUser | PrincipalType::IamRole => Ok(PrincipalDescriptor::User(
            UserPrincipal::UserIdentifier(require_arn(principal_arn)?),
        )),
        PrincipalType::IamGroup => Ok(PrincipalDescriptor::Group {
            group_identifier: require_arn(principal_arn)?,
        }),
        PrincipalType::Root => Ok(PrincipalDescriptor::User(
            UserPrincipal::AllUsersGrantFilter {},
        )),
    }
}

fn require_arn(principal_arn: Option<&str>) -> Result<String, InvalidInput> {
    principal_arn
        .map(str::to_string)
        .ok_or(InvalidInput::MissingProperty(PRINCIPAL_ARN))
}

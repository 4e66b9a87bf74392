use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::InvalidInput;
use crate::policy_detail::{resolve_policy_detail, PolicyDetail};
use crate::principal::{resolve_principal, PrincipalDescriptor};

pub const DOMAIN_IDENTIFIER: &str = "DomainIdentifier";
pub const DOMAIN_UNIT_IDENTIFIER: &str = "DomainUnitIdentifier";
pub const ENTITY_IDENTIFIER: &str = "EntityIdentifier";
pub const ENTITY_TYPE: &str = "EntityType";
pub const POLICY_TYPE: &str = "PolicyType";
pub const PRINCIPAL_TYPE: &str = "PrincipalType";
pub const PRINCIPAL_ARN: &str = "PrincipalArn";
pub const PROJECT_ID: &str = "project_id";
pub const PROJECT_IDENTIFIER: &str = "ProjectIdentifier";
pub const INCLUDE_CHILD_DOMAIN_UNITS: &str = "IncludeChildDomainUnits";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyType {
    CreateProject,
    AddToProjectMemberPool,
    CreateGlossary,
    CreateFormType,
    CreateAssetType,
    CreateEnvironmentProfile,
    CreateEnvironment,
    CreateEnvironmentFromBlueprint,
    CreateProjectFromProjectProfile,
    CreateDomainUnit,
}

impl PolicyType {
    pub const ALL: [Self; 10] = [
        Self::CreateProject,
        Self::AddToProjectMemberPool,
        Self::CreateGlossary,
        Self::CreateFormType,
        Self::CreateAssetType,
        Self::CreateEnvironmentProfile,
        Self::CreateEnvironment,
        Self::CreateEnvironmentFromBlueprint,
        Self::CreateProjectFromProjectProfile,
        Self::CreateDomainUnit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProject => "CREATE_PROJECT",
            Self::AddToProjectMemberPool => "ADD_TO_PROJECT_MEMBER_POOL",
            Self::CreateGlossary => "CREATE_GLOSSARY",
            Self::CreateFormType => "CREATE_FORM_TYPE",
            Self::CreateAssetType => "CREATE_ASSET_TYPE",
            Self::CreateEnvironmentProfile => "CREATE_ENVIRONMENT_PROFILE",
            Self::CreateEnvironment => "CREATE_ENVIRONMENT",
            Self::CreateEnvironmentFromBlueprint => "CREATE_ENVIRONMENT_FROM_BLUEPRINT",
            Self::CreateProjectFromProjectProfile => "CREATE_PROJECT_FROM_PROJECT_PROFILE",
            Self::CreateDomainUnit => "CREATE_DOMAIN_UNIT",
        }
    }
}

impl FromStr for PolicyType {
    type Err = InvalidInput;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy_type| policy_type.as_str() == value)
            .ok_or_else(|| InvalidInput::UnknownPolicyType(value.to_string()))
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PolicyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalType {
    IamUser,
    IamRole,
    IamGroup,
    Root,
}

impl PrincipalType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IamUser => "IAM_USER",
            Self::IamRole => "IAM_ROLE",
            Self::IamGroup => "IAM_GROUP",
            Self::Root => "root",
        }
    }
}

impl FromStr for PrincipalType {
    type Err = InvalidInput;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "IAM_USER" => Ok(Self::IamUser),
            "IAM_ROLE" => Ok(Self::IamRole),
            "IAM_GROUP" => Ok(Self::IamGroup),
            "root" => Ok(Self::Root),
            other => Err(InvalidInput::InvalidPrincipalType(other.to_string())),
        }
    }
}

/// Declarative grant built from the custom resource's `ResourceProperties`.
///
/// `principal_type` stays as the raw property value: some policy types fix
/// the principal shape and never look at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyGrantRequest {
    pub domain_id: String,
    pub domain_unit_id: Option<String>,
    pub entity_id: String,
    pub entity_type: String,
    pub policy_type: PolicyType,
    pub principal_type: Option<String>,
    pub principal_arn: Option<String>,
    pub project_id: Option<String>,
    pub include_child_domain_units: bool,
}

impl PolicyGrantRequest {
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self, InvalidInput> {
        let policy_type = required_string(properties, POLICY_TYPE)?.parse::<PolicyType>()?;

        Ok(Self {
            domain_id: required_string(properties, DOMAIN_IDENTIFIER)?,
            domain_unit_id: optional_string(properties, DOMAIN_UNIT_IDENTIFIER)?,
            entity_id: required_string(properties, ENTITY_IDENTIFIER)?,
            entity_type: required_string(properties, ENTITY_TYPE)?,
            policy_type,
            principal_type: optional_string(properties, PRINCIPAL_TYPE)?,
            principal_arn: optional_string(properties, PRINCIPAL_ARN)?,
            project_id: match optional_string(properties, PROJECT_ID)? {
                Some(value) => Some(value),
                None => optional_string(properties, PROJECT_IDENTIFIER)?,
            },
            include_child_domain_units: optional_flag(properties, INCLUDE_CHILD_DOMAIN_UNITS)?
                .unwrap_or(false),
        })
    }

    pub fn resolve(&self) -> Result<PolicyGrant, InvalidInput> {
        let principal = resolve_principal(
            self.principal_type.as_deref(),
            self.policy_type,
            self.principal_arn.as_deref(),
            self.domain_unit_id.as_deref(),
            self.project_id.as_deref(),
        )?;
        let detail = resolve_policy_detail(
            self.policy_type,
            self.include_child_domain_units,
            self.domain_unit_id.as_deref(),
        );

        Ok(PolicyGrant {
            domain_id: self.domain_id.clone(),
            entity_id: self.entity_id.clone(),
            entity_type: self.entity_type.clone(),
            policy_type: self.policy_type,
            principal,
            detail,
        })
    }
}

/// Fully shaped grant, ready for AddPolicyGrant / RemovePolicyGrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyGrant {
    pub domain_id: String,
    pub entity_id: String,
    pub entity_type: String,
    pub policy_type: PolicyType,
    pub principal: PrincipalDescriptor,
    pub detail: PolicyDetail,
}

fn required_string(
    properties: &Map<String, Value>,
    name: &'static str,
) -> Result<String, InvalidInput> {
    optional_string(properties, name)?.ok_or(InvalidInput::MissingProperty(name))
}

fn optional_string(
    properties: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, InvalidInput> {
    match properties.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.trim().to_string())),
        Some(other) => Err(InvalidInput::InvalidProperty {
            name,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

// CloudFormation stringifies booleans, so "false" must not read as true.
fn optional_flag(
    properties: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<bool>, InvalidInput> {
    match properties.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" | "" => Ok(Some(false)),
            _ => Err(InvalidInput::InvalidProperty {
                name,
                reason: format!("expected true or false, got '{text}'"),
            }),
        },
        Some(other) => Err(InvalidInput::InvalidProperty {
            name,
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn properties(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test properties are an object")
    }

    #[test]
    fn parses_full_property_set() {
        let request = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "DomainUnitIdentifier": "unit-1",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_PROJECT",
            "PrincipalType": "IAM_ROLE",
            "PrincipalArn": "arn:aws:iam::111122223333:role/Admin",
            "project_id": "prj-9",
            "IncludeChildDomainUnits": "true"
        })))
        .expect("request should parse");

        assert_eq!(request.domain_id, "dzd_123");
        assert_eq!(request.policy_type, PolicyType::CreateProject);
        assert_eq!(request.principal_type.as_deref(), Some("IAM_ROLE"));
        assert_eq!(request.project_id.as_deref(), Some("prj-9"));
        assert!(request.include_child_domain_units);
    }

    #[test]
    fn stringified_false_is_false() {
        let request = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_GLOSSARY",
            "IncludeChildDomainUnits": "False"
        })))
        .expect("request should parse");

        assert!(!request.include_child_domain_units);
    }

    #[test]
    fn project_identifier_alias_is_accepted() {
        let request = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "EntityIdentifier": "profile-1",
            "EntityType": "ENVIRONMENT_PROFILE",
            "PolicyType": "CREATE_ENVIRONMENT",
            "ProjectIdentifier": "prj-2"
        })))
        .expect("request should parse");

        assert_eq!(request.project_id.as_deref(), Some("prj-2"));
    }

    #[test]
    fn unknown_policy_type_is_rejected() {
        let error = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "DELETE_EVERYTHING"
        })))
        .expect_err("unknown policy type should fail");

        assert_eq!(
            error,
            InvalidInput::UnknownPolicyType("DELETE_EVERYTHING".to_string())
        );
    }

    #[test]
    fn missing_domain_is_rejected() {
        let error = PolicyGrantRequest::from_properties(&properties(json!({
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_PROJECT"
        })))
        .expect_err("missing domain should fail");

        assert_eq!(error, InvalidInput::MissingProperty(DOMAIN_IDENTIFIER));
    }

    #[test]
    fn garbage_flag_is_rejected() {
        let error = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_PROJECT",
            "IncludeChildDomainUnits": "yes please"
        })))
        .expect_err("flag should fail");

        assert!(matches!(
            error,
            InvalidInput::InvalidProperty {
                name: INCLUDE_CHILD_DOMAIN_UNITS,
                ..
            }
        ));
    }

    #[test]
    fn resolves_into_grant_shape() {
        let grant = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "DomainUnitIdentifier": "unit-1",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_PROJECT",
            "PrincipalType": "root",
            "IncludeChildDomainUnits": true
        })))
        .and_then(|request| request.resolve())
        .expect("grant should resolve");

        assert_eq!(
            serde_json::to_value(&grant).expect("grant serializes"),
            json!({
                "domain_id": "dzd_123",
                "entity_id": "unit-1",
                "entity_type": "DOMAIN_UNIT",
                "policy_type": "CREATE_PROJECT",
                "principal": {"user": {"allUsersGrantFilter": {}}},
                "detail": {"createProject": {"includeChildDomainUnits": true}}
            })
        );
    }

    #[test]
    fn unknown_principal_type_fails_resolution() {
        let error = PolicyGrantRequest::from_properties(&properties(json!({
            "DomainIdentifier": "dzd_123",
            "EntityIdentifier": "unit-1",
            "EntityType": "DOMAIN_UNIT",
            "PolicyType": "CREATE_GLOSSARY",
            "PrincipalType": "SERVICE"
        })))
        .and_then(|request| request.resolve())
        .expect_err("unknown principal type should fail");

        assert_eq!(error, InvalidInput::InvalidPrincipalType("SERVICE".to_string()));
    }

    #[test]
    fn policy_type_strings_round_trip() {
        for policy_type in PolicyType::ALL {
            assert_eq!(policy_type.as_str().parse::<PolicyType>(), Ok(policy_type));
        }
    }
}

use aws_sdk_datazone::error::DisplayErrorContext;
use aws_sdk_datazone::types as dz;
use datazone_pipeline_core::grant_request::PolicyGrant;
use datazone_pipeline_core::policy_detail::PolicyDetail;
use datazone_pipeline_core::principal::{PrincipalDescriptor, UserPrincipal};

use super::block_on;

pub trait PolicyGrantApi {
    fn add_policy_grant(&self, grant: &PolicyGrant) -> Result<(), String>;
    fn remove_policy_grant(&self, grant: &PolicyGrant) -> Result<(), String>;
}

pub struct DataZoneGrantApi {
    datazone_client: aws_sdk_datazone::Client,
}

impl DataZoneGrantApi {
    pub fn new(datazone_client: aws_sdk_datazone::Client) -> Self {
        Self { datazone_client }
    }
}

impl PolicyGrantApi for DataZoneGrantApi {
    fn add_policy_grant(&self, grant: &PolicyGrant) -> Result<(), String> {
        let request = self
            .datazone_client
            .add_policy_grant()
            .domain_identifier(&grant.domain_id)
            .entity_identifier(&grant.entity_id)
            .entity_type(dz::TargetEntityType::from(grant.entity_type.as_str()))
            .policy_type(dz::ManagedPolicyType::from(grant.policy_type.as_str()))
            .principal(sdk_principal(&grant.principal)?)
            .detail(sdk_detail(&grant.detail));

        block_on(request.send())
            .map(|_| ())
            .map_err(|error| format!("AddPolicyGrant failed: {}", DisplayErrorContext(&error)))
    }

    fn remove_policy_grant(&self, grant: &PolicyGrant) -> Result<(), String> {
        let request = self
            .datazone_client
            .remove_policy_grant()
            .domain_identifier(&grant.domain_id)
            .entity_identifier(&grant.entity_id)
            .entity_type(dz::TargetEntityType::from(grant.entity_type.as_str()))
            .policy_type(dz::ManagedPolicyType::from(grant.policy_type.as_str()))
            .principal(sdk_principal(&grant.principal)?);

        block_on(request.send())
            .map(|_| ())
            .map_err(|error| format!("RemovePolicyGrant failed: {}", DisplayErrorContext(&error)))
    }
}

fn sdk_principal(principal: &PrincipalDescriptor) -> Result<dz::PolicyGrantPrincipal, String> {
    let principal = match principal {
        PrincipalDescriptor::User(UserPrincipal::UserIdentifier(user_identifier)) => {
            dz::PolicyGrantPrincipal::User(dz::UserPolicyGrantPrincipal::UserIdentifier(
                user_identifier.clone(),
            ))
        }
        PrincipalDescriptor::User(UserPrincipal::AllUsersGrantFilter {}) => {
            dz::PolicyGrantPrincipal::User(dz::UserPolicyGrantPrincipal::AllUsersGrantFilter(
                dz::AllUsersGrantFilter::builder().build(),
            ))
        }
        PrincipalDescriptor::Group { group_identifier } => dz::PolicyGrantPrincipal::Group(
            dz::GroupPolicyGrantPrincipal::GroupIdentifier(group_identifier.clone()),
        ),
        PrincipalDescriptor::Project(project) => {
            let mut builder = dz::ProjectPolicyGrantPrincipal::builder()
                .project_designation(dz::ProjectDesignation::Owner)
                .set_project_identifier(project.project_identifier.clone());
            if let Some(filter) = &project.project_grant_filter {
                let domain_unit_filter = dz::DomainUnitFilterForProject::builder()
                    .domain_unit(&filter.domain_unit_filter.domain_unit)
                    .include_child_domain_units(
                        filter.domain_unit_filter.include_child_domain_units,
                    )
                    .build()
                    .map_err(|error| format!("invalid project grant filter: {error}"))?;
                builder = builder
                    .project_grant_filter(dz::ProjectGrantFilter::DomainUnitFilter(domain_unit_filter));
            }
            dz::PolicyGrantPrincipal::Project(
                builder
                    .build()
                    .map_err(|error| format!("invalid project principal: {error}"))?,
            )
        }
    };
    Ok(principal)
}

// The service models environment and blueprint grants as an empty structure,
// so the child-unit flag carried for CREATE_ENVIRONMENT_FROM_BLUEPRINT is
// only informational.
fn sdk_detail(detail: &PolicyDetail) -> dz::PolicyGrantDetail {
    match detail {
        PolicyDetail::CreateProject {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::CreateProject(
            dz::CreateProjectPolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
        PolicyDetail::AddToProjectMemberPool {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::AddToProjectMemberPool(
            dz::AddToProjectMemberPoolPolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
        PolicyDetail::CreateGlossary {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::CreateGlossary(
            dz::CreateGlossaryPolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
        PolicyDetail::CreateFormType {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::CreateFormType(
            dz::CreateFormTypePolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
        PolicyDetail::CreateAssetType {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::CreateAssetType(
            dz::CreateAssetTypePolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
        PolicyDetail::CreateEnvironmentProfile { domain_unit_id } => {
            dz::PolicyGrantDetail::CreateEnvironmentProfile(
                dz::CreateEnvironmentProfilePolicyGrantDetail::builder()
                    .set_domain_unit_id(domain_unit_id.clone())
                    .build(),
            )
        }
        PolicyDetail::CreateEnvironment {} => {
            dz::PolicyGrantDetail::CreateEnvironment(dz::Unit::builder().build())
        }
        PolicyDetail::CreateEnvironmentFromBlueprint { .. } => {
            dz::PolicyGrantDetail::CreateEnvironmentFromBlueprint(dz::Unit::builder().build())
        }
        PolicyDetail::CreateProjectFromProjectProfile {
            include_child_domain_units,
            project_profiles,
        } => dz::PolicyGrantDetail::CreateProjectFromProjectProfile(
            dz::CreateProjectFromProjectProfilePolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .set_project_profiles(Some(project_profiles.clone()))
                .build(),
        ),
        PolicyDetail::CreateDomainUnit {
            include_child_domain_units,
        } => dz::PolicyGrantDetail::CreateDomainUnit(
            dz::CreateDomainUnitPolicyGrantDetail::builder()
                .include_child_domain_units(*include_child_domain_units)
                .build(),
        ),
    }
}

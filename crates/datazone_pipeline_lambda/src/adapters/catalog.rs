use datazone_pipeline_core::asset_metadata::{AssetForm, AssetRecord};

use super::block_on;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub name: String,
    pub domain_unit_id: Option<String>,
}

/// Read-only view of the DataZone catalog.
pub trait CatalogReader {
    fn get_project(&self, domain_id: &str, project_id: &str) -> Result<ProjectSummary, String>;
    fn get_domain_unit_name(&self, domain_id: &str, domain_unit_id: &str)
        -> Result<String, String>;
    fn get_domain_name(&self, domain_id: &str) -> Result<String, String>;
    fn get_asset(&self, domain_id: &str, asset_id: &str) -> Result<AssetRecord, String>;
}

pub struct DataZoneCatalogReader {
    datazone_client: aws_sdk_datazone::Client,
}

impl DataZoneCatalogReader {
    pub fn new(datazone_client: aws_sdk_datazone::Client) -> Self {
        Self { datazone_client }
    }
}

impl CatalogReader for DataZoneCatalogReader {
    fn get_project(&self, domain_id: &str, project_id: &str) -> Result<ProjectSummary, String> {
        let request = self
            .datazone_client
            .get_project()
            .domain_identifier(domain_id)
            .identifier(project_id);
        let output = block_on(request.send()).map_err(|error| sdk_error("GetProject", &error))?;

        Ok(ProjectSummary {
            name: present(output.name, "GetProject name")?,
            domain_unit_id: output.domain_unit_id,
        })
    }

    fn get_domain_unit_name(
        &self,
        domain_id: &str,
        domain_unit_id: &str,
    ) -> Result<String, String> {
        let request = self
            .datazone_client
            .get_domain_unit()
            .domain_identifier(domain_id)
            .identifier(domain_unit_id);
        let output =
            block_on(request.send()).map_err(|error| sdk_error("GetDomainUnit", &error))?;

        present(output.name, "GetDomainUnit name")
    }

    fn get_domain_name(&self, domain_id: &str) -> Result<String, String> {
        let request = self.datazone_client.get_domain().identifier(domain_id);
        let output = block_on(request.send()).map_err(|error| sdk_error("GetDomain", &error))?;

        present(output.name, "GetDomain name")
    }

    fn get_asset(&self, domain_id: &str, asset_id: &str) -> Result<AssetRecord, String> {
        let request = self
            .datazone_client
            .get_asset()
            .domain_identifier(domain_id)
            .identifier(asset_id);
        let output = block_on(request.send()).map_err(|error| sdk_error("GetAsset", &error))?;

        let forms = present::<Vec<_>>(output.forms_output, "GetAsset formsOutput")?
            .into_iter()
            .map(|form| {
                Ok(AssetForm {
                    form_name: present(form.form_name, "GetAsset formName")?,
                    content: form.content,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(AssetRecord {
            name: present(output.name, "GetAsset name")?,
            revision: present(output.revision, "GetAsset revision")?,
            forms,
        })
    }
}

// Accepts both required (`T`) and optional (`Option<T>`) SDK output members.
fn present<T>(value: impl Into<Option<T>>, what: &str) -> Result<T, String> {
    value
        .into()
        .ok_or_else(|| format!("{what} missing from response"))
}

fn sdk_error<E>(operation: &str, error: &E) -> String
where
    E: std::error::Error,
{
    format!(
        "{operation} failed: {}",
        aws_sdk_datazone::error::DisplayErrorContext(error)
    )
}

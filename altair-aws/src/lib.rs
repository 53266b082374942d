//! Altair AWS
//!
//! Phase one of generation: the external lookups, resolved synchronously
//! before any declaration is built. Also the operator-visibility query that
//! reports on the declared instances. Everything here is read-only; resource
//! creation belongs to the reconciliation engine.

use aws_config::Region;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_ec2::types::Filter;
use aws_sdk_route53::Client as Route53Client;
use serde::Serialize;

use altair_core::config::{ImageQuery, ResolvedLookups, TopologyConfig};

/// Error type for lookup operations
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no machine image matches owners {owners:?} and pattern '{pattern}'")]
    ImageNotFound { owners: Vec<String>, pattern: String },

    #[error("hosted zone '{0}' does not exist")]
    ZoneNotFound(String),

    #[error("{0}")]
    Api(String),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Read-only AWS clients for the lookup phase
pub struct AwsLookups {
    ec2_client: Ec2Client,
    route53_client: Route53Client,
}

impl AwsLookups {
    /// Create clients for a region
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            ec2_client: Ec2Client::new(&config),
            route53_client: Route53Client::new(&config),
        }
    }

    /// Create with specific clients (for testing)
    pub fn with_clients(ec2_client: Ec2Client, route53_client: Route53Client) -> Self {
        Self {
            ec2_client,
            route53_client,
        }
    }

    /// Resolve every external lookup the topology needs. Either both values
    /// resolve or the whole pass fails; there is no partial generation.
    pub async fn resolve(&self, config: &TopologyConfig) -> LookupResult<ResolvedLookups> {
        let image_id = self.find_image(&config.image).await?;
        let hosted_zone_id = self.find_hosted_zone(&config.dns_zone_name).await?;
        Ok(ResolvedLookups {
            image_id,
            hosted_zone_id,
        })
    }

    /// Newest machine image matching the catalog query. The result is not
    /// pinned: a later pass may resolve a newer image.
    pub async fn find_image(&self, query: &ImageQuery) -> LookupResult<String> {
        let filter = Filter::builder()
            .name("name")
            .values(&query.name_pattern)
            .build();

        let result = self
            .ec2_client
            .describe_images()
            .set_owners(Some(query.owners.clone()))
            .filters(filter)
            .send()
            .await
            .map_err(|e| LookupError::Api(format!("Failed to describe images: {:?}", e)))?;

        let candidates: Vec<(String, String)> = result
            .images()
            .iter()
            .filter_map(|image| {
                Some((
                    image.image_id()?.to_string(),
                    image.creation_date()?.to_string(),
                ))
            })
            .collect();

        newest_image_id(&candidates).ok_or_else(|| LookupError::ImageNotFound {
            owners: query.owners.clone(),
            pattern: query.name_pattern.clone(),
        })
    }

    /// Identifier of the pre-existing hosted zone. Absence fails the pass:
    /// there is no fallback zone creation.
    pub async fn find_hosted_zone(&self, name: &str) -> LookupResult<String> {
        let wanted = canonical_zone_name(name);

        let result = self
            .route53_client
            .list_hosted_zones_by_name()
            .dns_name(name)
            .send()
            .await
            .map_err(|e| LookupError::Api(format!("Failed to list hosted zones: {:?}", e)))?;

        result
            .hosted_zones()
            .iter()
            .find(|zone| zone.name() == wanted)
            .map(|zone| strip_zone_id_prefix(zone.id()).to_string())
            .ok_or_else(|| LookupError::ZoneNotFound(name.to_string()))
    }

    /// One diagnostic record per declared instance name. Fields the cloud has
    /// not assigned yet (address of a node still launching, or a node not yet
    /// applied) come back as None rather than failing the query.
    pub async fn instance_reports(
        &self,
        config: &TopologyConfig,
    ) -> LookupResult<Vec<InstanceReport>> {
        let names = config.instance_names();
        let filter = Filter::builder()
            .name("tag:Name")
            .set_values(Some(names.clone()))
            .build();

        let result = self
            .ec2_client
            .describe_instances()
            .filters(filter)
            .send()
            .await
            .map_err(|e| LookupError::Api(format!("Failed to describe instances: {:?}", e)))?;

        let mut reports: Vec<InstanceReport> = result
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .map(|instance| {
                let name = instance
                    .tags()
                    .iter()
                    .find(|t| t.key() == Some("Name"))
                    .and_then(|t| t.value())
                    .unwrap_or_default()
                    .to_string();
                InstanceReport {
                    name,
                    id: instance.instance_id().map(String::from),
                    public_ip: instance.public_ip_address().map(String::from),
                    availability_zone: instance
                        .placement()
                        .and_then(|p| p.availability_zone())
                        .map(String::from),
                    private_ip: instance.private_ip_address().map(String::from),
                }
            })
            .collect();

        reports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(reports)
    }
}

/// Per-instance diagnostic record emitted for operator visibility
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceReport {
    pub name: String,
    pub id: Option<String>,
    #[serde(rename = "publicIp")]
    pub public_ip: Option<String>,
    #[serde(rename = "availabilityZone")]
    pub availability_zone: Option<String>,
    #[serde(rename = "privateIp")]
    pub private_ip: Option<String>,
}

/// Pick the most recent image from (image_id, creation_date) candidates.
/// Creation dates are RFC 3339, so lexical order is chronological order.
pub fn newest_image_id(candidates: &[(String, String)]) -> Option<String> {
    candidates
        .iter()
        .max_by(|a, b| a.1.cmp(&b.1))
        .map(|(id, _)| id.clone())
}

/// Hosted zone names come back from the API with a trailing dot
pub fn canonical_zone_name(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Zone identifiers come back as "/hostedzone/Z..."
pub fn strip_zone_id_prefix(id: &str) -> &str {
    id.strip_prefix("/hostedzone/").unwrap_or(id)
}

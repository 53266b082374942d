//! Execution identity: role assumable by EC2, registry-read and bucket
//! policies, instance profile

use std::collections::BTreeMap;

use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;

/// Container-registry read actions granted to every node
const ECR_READ_ACTIONS: [&str; 12] = [
    "ecr:GetAuthorizationToken",
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:GetRepositoryPolicy",
    "ecr:DescribeRepositories",
    "ecr:ListImages",
    "ecr:DescribeImages",
    "ecr:BatchGetImage",
    "ecr:GetLifecyclePolicy",
    "ecr:GetLifecyclePolicyPreview",
    "ecr:ListTagsForResource",
    "ecr:DescribeImageScanFindings",
];

fn trust_policy() -> Value {
    Value::from_json(&serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Action": "sts:AssumeRole",
                "Principal": { "Service": "ec2.amazonaws.com" },
                "Effect": "Allow",
                "Sid": "",
            }
        ],
    }))
}

fn registry_read_policy() -> Value {
    Value::from_json(&serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ECR_READ_ACTIONS,
                "Resource": ["*"],
            }
        ],
    }))
}

/// Read/list/write on the logs bucket and its objects. Built by hand rather
/// than from JSON: the bucket ARN is only known after apply, so both resource
/// entries are references into the bucket declaration.
fn bucket_access_policy() -> Value {
    let mut statement = BTreeMap::new();
    statement.insert("Effect".to_string(), Value::string("Allow"));
    statement.insert(
        "Action".to_string(),
        Value::List(vec![
            Value::string("s3:GetObject"),
            Value::string("s3:ListBucket"),
            Value::string("s3:PutObject"),
        ]),
    );
    statement.insert(
        "Resource".to_string(),
        Value::List(vec![
            Value::reference(names::LOGS_BUCKET, "arn"),
            Value::concat(vec![
                Value::reference(names::LOGS_BUCKET, "arn"),
                Value::string("/*"),
            ]),
        ]),
    );

    let mut doc = BTreeMap::new();
    doc.insert("Version".to_string(), Value::string("2012-10-17"));
    doc.insert(
        "Statement".to_string(),
        Value::List(vec![Value::Map(statement)]),
    );
    Value::Map(doc)
}

pub fn declare(manifest: &mut Manifest) -> Result<(), TopologyError> {
    manifest.add(
        Resource::new("iam_role", names::NODE_ROLE)
            .with_attribute("name", Value::string("ec2-Role-k8s"))
            .with_attribute("assume_role_policy", trust_policy()),
    )?;

    manifest.add(
        Resource::new("iam_role_policy", names::ECR_POLICY)
            .with_attribute("name", Value::string("ecrPolicy"))
            .with_attribute("role", Value::reference(names::NODE_ROLE, "name"))
            .with_attribute("policy", registry_read_policy()),
    )?;

    manifest.add(
        Resource::new("s3_bucket", names::LOGS_BUCKET)
            .with_attribute("name", Value::string("k8s-logs")),
    )?;

    manifest.add(
        Resource::new("iam_role_policy", names::BUCKET_POLICY)
            .with_attribute("name", Value::string("bucketPolicy"))
            .with_attribute("role", Value::reference(names::NODE_ROLE, "name"))
            .with_attribute("policy", bucket_access_policy()),
    )?;

    manifest.add(
        Resource::new("iam_instance_profile", names::NODE_PROFILE)
            .with_attribute("name", Value::string("ec2-Profile-k8s"))
            .with_attribute("role", Value::reference(names::NODE_ROLE, "name")),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair_core::graph;

    fn declared() -> Manifest {
        let mut manifest = Manifest::new();
        declare(&mut manifest).unwrap();
        manifest
    }

    #[test]
    fn trust_policy_allows_only_the_compute_service() {
        let policy = trust_policy().to_json();
        assert_eq!(
            policy["Statement"][0]["Principal"]["Service"],
            serde_json::json!("ec2.amazonaws.com")
        );
        assert_eq!(
            policy["Statement"][0]["Action"],
            serde_json::json!("sts:AssumeRole")
        );
    }

    #[test]
    fn registry_policy_grants_all_read_actions() {
        let policy = registry_read_policy().to_json();
        let actions = policy["Statement"][0]["Action"].as_array().unwrap();
        assert_eq!(actions.len(), ECR_READ_ACTIONS.len());
        assert!(actions.contains(&serde_json::json!("ecr:BatchGetImage")));
        assert_eq!(policy["Statement"][0]["Resource"], serde_json::json!(["*"]));
    }

    #[test]
    fn bucket_policy_references_the_bucket_arn() {
        let manifest = declared();
        let policy = manifest.get(names::BUCKET_POLICY).unwrap();

        // Ordering dependency: the policy cannot exist before the bucket
        let deps = graph::resource_dependencies(policy);
        assert!(deps.iter().any(|d| d.target == names::LOGS_BUCKET));

        let json = policy.attribute("policy").unwrap().to_json();
        assert_eq!(
            json["Statement"][0]["Resource"],
            serde_json::json!(["${logs_bucket.arn}", "${logs_bucket.arn}/*"])
        );
    }

    #[test]
    fn profile_wraps_the_role() {
        let manifest = declared();
        let profile = manifest.get(names::NODE_PROFILE).unwrap();
        assert_eq!(
            profile.attribute("role"),
            Some(&Value::reference(names::NODE_ROLE, "name"))
        );
    }
}

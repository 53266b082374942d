//! Logical names of the declared resources
//!
//! These are the reference namespace of the manifest; builders and tests use
//! them instead of repeating string literals. Cloud-facing names (Name tags,
//! record names) live in each resource's `name` attribute.

pub const VPC: &str = "vpc";
pub const GATEWAY: &str = "gateway";
pub const ROUTES: &str = "routes";

pub const SSH_GROUP: &str = "ssh_sg";
pub const WEB_GROUP: &str = "web_sg";
pub const CLUSTER_GROUP: &str = "k8s_sg";
pub const SSH_PEER_RULE: &str = "ssh_peer_rule";

pub const NODE_ROLE: &str = "node_role";
pub const ECR_POLICY: &str = "ecr_policy";
pub const LOGS_BUCKET: &str = "logs_bucket";
pub const BUCKET_POLICY: &str = "bucket_policy";
pub const NODE_PROFILE: &str = "node_profile";

pub const KEYPAIR: &str = "keypair";
pub const NLB: &str = "nlb";
pub const NLB_RECORD: &str = "nlb_record";

pub fn subnet(index: usize) -> String {
    format!("subnet_{}", index)
}

pub fn subnet_association(index: usize) -> String {
    format!("subnet_assoc_{}", index)
}

pub fn instance(index: usize) -> String {
    format!("instance_{}", index)
}

pub fn target_group(port: i64) -> String {
    format!("tg_{}", port)
}

pub fn attachment(port: i64, index: usize) -> String {
    format!("tg_{}_member_{}", port, index)
}

pub fn listener(port: i64) -> String {
    format!("listener_{}", port)
}

pub fn node_record(index: usize) -> String {
    format!("node_record_{}", index)
}

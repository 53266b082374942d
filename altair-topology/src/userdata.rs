//! Node boot script
//!
//! Passed verbatim as instance user data and executed once, as root, at
//! first boot by the guest environment. There is no feedback channel: the
//! script either converges the node or the node never joins.

/// Render the boot script for a cluster node. The cluster's API endpoint
/// alias (`k8s.<zone>`) is baked into the certificate SANs.
pub fn node_boot_script(dns_zone_name: &str) -> String {
    format!(
        r#"#!/bin/bash
sudo DEBIAN_FRONTEND=noninteractive apt-get update -y
sudo DEBIAN_FRONTEND=noninteractive apt-get upgrade -y
mkdir -p /var/snap/microk8s/common/
cat <<EOT >> /var/snap/microk8s/common/.microk8s.yaml
---
version: 0.1.0
addons:
  - name: dns
  - name: rbac
  - name: ingress
  - name: cert-manager
extraSANs:
  - k8s.{dns_zone_name}
EOT
snap install microk8s --classic --channel=1.28
snap install aws-cli --classic
usermod -a -G microk8s ubuntu
chown -f -R ubuntu /home/ubuntu/.kube
sed -i 's/--cluster-dns=10.152.183.10/--cluster-dns=10.152.183.10,1.1.1.1,8.8.8.8/g' /var/snap/microk8s/current/args/kubelet
"#
    )
}

//! CIDR arithmetic
//!
//! One parsed representation serves both roles: schema validation of CIDR
//! attributes and subnet derivation. Subnets take indexed slices of the VPC
//! block; a child block that would fall outside the parent is an error, not a
//! silently wrapped address.

use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CidrError {
    #[error("invalid CIDR '{0}': expected a.b.c.d/prefix")]
    Parse(String),

    #[error("prefix /{child} cannot subdivide /{parent}")]
    PrefixTooShort { parent: u8, child: u8 },

    #[error("subnet index {index} does not fit inside {parent}")]
    OutOfRange { index: u32, parent: String },
}

/// An IPv4 CIDR block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self, CidrError> {
        if prefix > 32 {
            return Err(CidrError::Parse(format!("{}/{}", addr, prefix)));
        }
        Ok(Self { addr, prefix })
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix)
        }
    }

    /// Network address (host bits masked off)
    pub fn network(&self) -> u32 {
        u32::from(self.addr) & self.mask()
    }

    /// Last address of the block
    fn end(&self) -> u32 {
        self.network() | !self.mask()
    }

    /// True if `other` is entirely inside this block
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        self.prefix <= other.prefix && (other.network() & self.mask()) == self.network()
    }

    /// True if the two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.network() <= other.end() && other.network() <= self.end()
    }

    /// The `index`-th child block of size `/new_prefix`, counted from the
    /// start of this block
    pub fn subnet(&self, index: u32, new_prefix: u8) -> Result<Ipv4Cidr, CidrError> {
        if new_prefix > 32 || new_prefix < self.prefix {
            return Err(CidrError::PrefixTooShort {
                parent: self.prefix,
                child: new_prefix,
            });
        }
        let block_size = 1u64 << (32 - new_prefix);
        let offset = u64::from(index) * block_size;
        let network = u64::from(self.network()) + offset;
        if network + block_size - 1 > u64::from(self.end()) {
            return Err(CidrError::OutOfRange {
                index,
                parent: self.to_string(),
            });
        }
        Ipv4Cidr::new(Ipv4Addr::from(network as u32), new_prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ip, prefix) = s
            .split_once('/')
            .ok_or_else(|| CidrError::Parse(s.to_string()))?;
        let addr: Ipv4Addr = ip.parse().map_err(|_| CidrError::Parse(s.to_string()))?;
        let prefix: u8 = prefix.parse().map_err(|_| CidrError::Parse(s.to_string()))?;
        Ipv4Cidr::new(addr, prefix).map_err(|_| CidrError::Parse(s.to_string()))
    }
}

impl std::fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.network()), self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let cidr: Ipv4Cidr = "10.90.0.0/16".parse().unwrap();
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.90.0.0/16");
    }

    #[test]
    fn display_masks_host_bits() {
        let cidr: Ipv4Cidr = "10.90.3.7/16".parse().unwrap();
        assert_eq!(cidr.to_string(), "10.90.0.0/16");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!("10.90.0.0".parse::<Ipv4Cidr>().is_err());
        assert!("10.90.0/16".parse::<Ipv4Cidr>().is_err());
        assert!("10.90.0.0/33".parse::<Ipv4Cidr>().is_err());
        assert!("banana/16".parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn indexed_subnets_of_a_sixteen() {
        let base: Ipv4Cidr = "10.90.0.0/16".parse().unwrap();
        assert_eq!(base.subnet(1, 24).unwrap().to_string(), "10.90.1.0/24");
        assert_eq!(base.subnet(2, 24).unwrap().to_string(), "10.90.2.0/24");
        assert_eq!(base.subnet(255, 24).unwrap().to_string(), "10.90.255.0/24");
    }

    #[test]
    fn subnet_out_of_range() {
        let base: Ipv4Cidr = "10.90.0.0/16".parse().unwrap();
        assert_eq!(
            base.subnet(256, 24),
            Err(CidrError::OutOfRange {
                index: 256,
                parent: "10.90.0.0/16".to_string()
            })
        );
    }

    #[test]
    fn subnet_prefix_must_not_widen() {
        let base: Ipv4Cidr = "10.90.0.0/24".parse().unwrap();
        assert!(matches!(
            base.subnet(0, 16),
            Err(CidrError::PrefixTooShort { .. })
        ));
    }

    #[test]
    fn containment_and_overlap() {
        let base: Ipv4Cidr = "10.90.0.0/16".parse().unwrap();
        let a = base.subnet(1, 24).unwrap();
        let b = base.subnet(2, 24).unwrap();
        let other: Ipv4Cidr = "10.91.0.0/16".parse().unwrap();

        assert!(base.contains(&a));
        assert!(base.contains(&b));
        assert!(!a.contains(&base));
        assert!(!base.contains(&other));

        assert!(base.overlaps(&a));
        assert!(!a.overlaps(&b));
        assert!(!base.overlaps(&other));
    }
}

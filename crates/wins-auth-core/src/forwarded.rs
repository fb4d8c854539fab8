//! Client address derivation from `X-Forwarded-For`.
//!
//! The hosting platform's router and load balancer each append an address,
//! so the real client sits `trusted_hop_count` entries from the end.
//! Anything to the left of it is caller-controlled and ignored.

use std::collections::HashSet;
use std::net::IpAddr;

use crate::error::{AuthError, ConfigError};

/// Hops appended by the platform in front of the application.
pub const DEFAULT_TRUSTED_HOP_COUNT: usize = 2;

/// Allow-list check on the client address derived from `X-Forwarded-For`.
#[derive(Debug, Clone)]
pub struct IpAllowList {
    allowed: HashSet<IpAddr>,
    trusted_hop_count: usize,
}

impl IpAllowList {
    pub fn new(allowed: HashSet<IpAddr>, trusted_hop_count: usize) -> Result<Self, ConfigError> {
        if trusted_hop_count == 0 {
            return Err(ConfigError::InvalidHopCount);
        }
        Ok(Self {
            allowed,
            trusted_hop_count,
        })
    }

    /// Parse allow-list entries, e.g. from a comma separated setting.
    pub fn parse<I, S>(entries: I, trusted_hop_count: usize) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = entries
            .into_iter()
            .map(|entry| {
                let entry = entry.as_ref().trim();
                entry
                    .parse::<IpAddr>()
                    .map_err(|_| ConfigError::InvalidIp(entry.to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()?;
        Self::new(allowed, trusted_hop_count)
    }

    pub fn trusted_hop_count(&self) -> usize {
        self.trusted_hop_count
    }

    /// The address the platform saw the request come from.
    pub fn client_ip<'a>(&self, forwarded_for: Option<&'a str>) -> Result<&'a str, AuthError> {
        let header = forwarded_for.ok_or(AuthError::MissingForwardedFor)?;
        let hops: Vec<&str> = header.split(',').map(str::trim).collect();

        if hops.len() < self.trusted_hop_count {
            return Err(AuthError::InsufficientForwardedHops {
                found: hops.len(),
                required: self.trusted_hop_count,
            });
        }
        Ok(hops[hops.len() - self.trusted_hop_count])
    }

    /// Derive the client address and require it to be allow-listed.
    pub fn check(&self, forwarded_for: Option<&str>) -> Result<IpAddr, AuthError> {
        let client = self.client_ip(forwarded_for)?;
        match client.parse::<IpAddr>() {
            Ok(ip) if self.allowed.contains(&ip) => Ok(ip),
            _ => Err(AuthError::UntrustedIp(client.to_string())),
        }
    }
}

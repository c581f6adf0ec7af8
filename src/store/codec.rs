//! Payload codec seam.
//!
//! Byte-level encode/decode of registry payloads is an external collaborator
//! concern; the registry only needs a typed surface over the four payload
//! kinds it publishes and consumes. [`BincodeCodec`] is the default pairing
//! (serde + bincode).

use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use crate::HostStatus;
use crate::ImportedService;
use crate::Result;
use crate::ServiceInstance;

#[cfg_attr(test, automock)]
pub trait Codec: Send + Sync + 'static {
    fn encode_instance(
        &self,
        instance: &ServiceInstance,
    ) -> Result<Vec<u8>>;

    fn decode_instance(
        &self,
        bytes: &[u8],
    ) -> Result<ServiceInstance>;

    fn encode_status(
        &self,
        status: &HostStatus,
    ) -> Result<Vec<u8>>;

    fn encode_dependency(
        &self,
        dependency: &ImportedService,
    ) -> Result<Vec<u8>>;

    fn encode_config(
        &self,
        overrides: &HashMap<String, String>,
    ) -> Result<Vec<u8>>;

    fn decode_config(
        &self,
        bytes: &[u8],
    ) -> Result<HashMap<String, String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn encode_instance(
        &self,
        instance: &ServiceInstance,
    ) -> Result<Vec<u8>> {
        Ok(bincode::serialize(instance)?)
    }

    fn decode_instance(
        &self,
        bytes: &[u8],
    ) -> Result<ServiceInstance> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn encode_status(
        &self,
        status: &HostStatus,
    ) -> Result<Vec<u8>> {
        Ok(bincode::serialize(status)?)
    }

    fn encode_dependency(
        &self,
        dependency: &ImportedService,
    ) -> Result<Vec<u8>> {
        Ok(bincode::serialize(dependency)?)
    }

    fn encode_config(
        &self,
        overrides: &HashMap<String, String>,
    ) -> Result<Vec<u8>> {
        Ok(bincode::serialize(overrides)?)
    }

    fn decode_config(
        &self,
        bytes: &[u8],
    ) -> Result<HashMap<String, String>> {
        Ok(bincode::deserialize(bytes)?)
    }
}

//! Descriptor validation
//!
//! Checks descriptor tables against the recognized schema before they become
//! module descriptors.

pub mod descriptor_validator;

pub use descriptor_validator::{DescriptorFields, DescriptorKey, DescriptorValidator};

//! Lowering configuration
//!
//! Policy that is data rather than logic: which named scalar types are boxed
//! when stored in an interface, whether host interop is available, and which
//! package is being compiled.

use crate::types::Type;
use glc_common::CompilerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host object bridging, enabled only when the target embeds in such a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInteropConfig {
    /// Import path of the host bridge package
    pub package: String,
    /// Name of the opaque host object type within that package
    pub object_type: String,
}

impl Default for HostInteropConfig {
    fn default() -> Self {
        Self {
            package: "github.com/gopherjs/gopherjs/js".to_string(),
            object_type: "Object".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerConfig {
    /// Named types whose values get a carrier box on conversion to interface
    pub boxed_scalars: BTreeSet<String>,
    pub host: Option<HostInteropConfig>,
    /// Objects of this package are emitted without qualification
    pub current_package: String,
}

impl Default for LowerConfig {
    fn default() -> Self {
        Self {
            boxed_scalars: BTreeSet::new(),
            host: None,
            current_package: "main".to_string(),
        }
    }
}

impl LowerConfig {
    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        let config: LowerConfig = serde_json::from_str(json)
            .map_err(|e| CompilerError::config(format!("invalid lowering config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        if self.current_package.is_empty() {
            return Err(CompilerError::config("current_package must not be empty"));
        }
        if let Some(host) = &self.host {
            if host.package.is_empty() || host.object_type.is_empty() {
                return Err(CompilerError::config(
                    "host interop needs both a package and an object type",
                ));
            }
        }
        Ok(())
    }

    pub fn with_boxed_scalar(mut self, type_name: &str) -> Self {
        self.boxed_scalars.insert(type_name.to_string());
        self
    }

    pub fn with_host(mut self, host: HostInteropConfig) -> Self {
        self.host = Some(host);
        self
    }

    /// Boxed-scalar policy query
    pub fn is_boxed(&self, ty: &Type) -> bool {
        match ty {
            Type::Named { name, .. } => self.boxed_scalars.contains(name),
            _ => false,
        }
    }

    /// Whether `package` is the host bridge package
    pub fn is_host_package(&self, package: Option<&str>) -> bool {
        match (&self.host, package) {
            (Some(host), Some(package)) => host.package == package,
            _ => false,
        }
    }

    /// Whether `ty` is the opaque host object type, or a pointer to it
    pub fn is_host_object(&self, ty: &Type) -> bool {
        let Some(host) = &self.host else {
            return false;
        };
        let qualified = format!("{}.{}", host.package, host.object_type);
        let ty = match ty {
            Type::Pointer { elem } => elem.as_ref(),
            other => other,
        };
        matches!(ty, Type::Named { name, .. } if *name == qualified)
    }
}

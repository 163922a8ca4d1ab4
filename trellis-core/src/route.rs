use serde::Serialize;
use serde_json::Value;

use crate::controller::{ControllerProvider, Operation, ParamMetadata};
use crate::path::endpoint_url;

/// One externally addressable endpoint, derived from a mounted controller
/// and one of its operations.
///
/// Descriptors are recomputed by
/// [`Platform::get_routes`](crate::platform::Platform::get_routes) on every
/// call; they carry no identity of their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRouteDetails {
    pub class_name: String,
    pub method: String,
    pub method_class_name: String,
    pub name: String,
    pub parameters: Vec<ParamMetadata>,
    pub raw_body: bool,
    pub url: String,
}

impl PlatformRouteDetails {
    pub(crate) fn new<H>(provider: &ControllerProvider<H>, operation: &Operation<H>, route: &str) -> Self {
        let class_name = provider.class_name().to_string();
        Self {
            name: format!("{}.{}()", class_name, operation.method_name),
            class_name,
            method: operation.verb.as_str().to_string(),
            method_class_name: operation.method_name.clone(),
            parameters: operation.parameters.clone(),
            raw_body: operation.raw_body,
            url: endpoint_url(route, &operation.path),
        }
    }

    /// JSON view with camelCase keys.
    pub fn to_json(&self) -> Value {
        let parameters: Vec<Value> = self
            .parameters
            .iter()
            .map(|p| {
                serde_json::json!({
                    "expression": p.expression,
                    "location": p.location,
                    "required": p.required,
                    "typeName": p.type_name,
                })
            })
            .collect();

        serde_json::json!({
            "className": self.class_name,
            "method": self.method,
            "methodClassName": self.method_class_name,
            "name": self.name,
            "parameters": parameters,
            "rawBody": self.raw_body,
            "url": self.url,
        })
    }
}

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::operation::{OperationDescriptor, sanitize_name};
use crate::SwaggerClientError;
use crate::spec::Spec;

const METHODS: [Method; 8] = [
    Method::GET,
    Method::PUT,
    Method::POST,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
    Method::PATCH,
    Method::TRACE,
];

/// A group of operations, named after a tag or the first path segment.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    operations: IndexMap<String, Arc<OperationDescriptor>>,
}

impl Resource {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            operations: IndexMap::new(),
        }
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation ids, in declaration order.
    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Finds an operation by id, or by its sanitized id.
    pub fn operation(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.operations.get(name).or_else(|| {
            self.operations
                .iter()
                .find(|(id, _)| sanitize_name(id) == name)
                .map(|(_, operation)| operation)
        })
    }
}

/// Groups all the operations of the specification into resources.
///
/// An operation belongs to every resource named by its tags; untagged
/// operations belong to the resource named after the first segment of
/// their path, e.g. `pet` for `/pet.json/{id}`.
pub(crate) fn build_resources(spec: &Arc<Spec>) -> Result<IndexMap<String, Resource>, SwaggerClientError> {
    let mut resources = IndexMap::<String, Resource>::new();
    let Some(paths) = spec.document().get("paths").and_then(Value::as_object) else {
        warn!("the specification declares no paths");
        return Ok(resources);
    };

    for (path_name, path_item) in paths {
        let path_item = spec.deref(path_item)?;
        for method in METHODS {
            let Some(operation) = path_item.get(method.as_str().to_ascii_lowercase()) else {
                continue;
            };
            let operation = Arc::new(OperationDescriptor::build(spec, method, path_name, path_item, operation)?);

            let resource_names = if operation.tags().is_empty() {
                vec![resource_name_from_path(path_name)?]
            } else {
                operation.tags().to_vec()
            };
            for resource_name in resource_names {
                debug!(resource = resource_name, operation = operation.operation_id(), "operation registered");
                resources
                    .entry(resource_name.clone())
                    .or_insert_with(|| Resource::new(&resource_name))
                    .operations
                    .insert(operation.operation_id().to_string(), Arc::clone(&operation));
            }
        }
    }

    Ok(resources)
}

fn resource_name_from_path(path_name: &str) -> Result<String, SwaggerClientError> {
    let segment = path_name
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    let name = segment.split_once('.').map_or(segment, |(name, _)| name);
    if name.is_empty() {
        return Err(SwaggerClientError::InvalidSpec {
            reason: format!("cannot derive a resource name from path '{path_name}', add a tag to its operations"),
        });
    }
    Ok(name.to_string())
}

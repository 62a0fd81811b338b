// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A recorded request made against the mock API server
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// A mock HTTP service that returns predefined responses based on request
/// method and path. Multiple responses may be queued for the same endpoint;
/// the last one repeats once the queue drains.
#[derive(Clone, Default)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.push("GET", path, status, body);
        self
    }

    /// Queue several responses for GET requests on the same path, returned
    /// in order across successive polls
    pub fn on_get_seq(self, path: &str, responses: &[(u16, &str)]) -> Self {
        for (status, body) in responses {
            self.push("GET", path, *status, body);
        }
        self
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.push("POST", path, status, body);
        self
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.push("PUT", path, status, body);
        self
    }

    /// Queue several responses for PUT requests on the same path
    pub fn on_put_seq(self, path: &str, responses: &[(u16, &str)]) -> Self {
        for (status, body) in responses {
            self.push("PUT", path, *status, body);
        }
        self
    }

    /// All requests the service has seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn push(&self, method: &str, path: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();

        let key = (method.to_string(), path.to_string());
        if let Some(queue) = responses.get_mut(&key) {
            return Some(next_response(queue));
        }

        // Prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), queue) in responses.iter_mut() {
            if m == method && path.starts_with(p.as_str()) {
                return Some(next_response(queue));
            }
        }

        None
    }
}

/// Pop the next queued response, keeping the final one as a repeating answer
fn next_response(queue: &mut VecDeque<(u16, String)>) -> (u16, String) {
    if queue.len() > 1 {
        queue.pop_front().unwrap()
    } else {
        queue.front().cloned().unwrap()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            use http_body_util::BodyExt;
            let body_bytes = req
                .into_body()
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            requests.lock().unwrap().push(RecordedRequest {
                method,
                path,
                body: String::from_utf8_lossy(&body_bytes).into_owned(),
            });

            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => {
                    // Default 404 for unmatched requests
                    let body = r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#;
                    Ok(Response::builder()
                        .status(404)
                        .header("content-type", "application/json")
                        .body(Body::from(body.as_bytes().to_vec()))
                        .unwrap())
                }
            }
        })
    }
}

/// Create an OperatorGroup JSON fixture
pub fn operator_group_json(name: &str, namespace: &str, targets: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "operators.coreos.com/v1",
        "kind": "OperatorGroup",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1"
        },
        "spec": {
            "targetNamespaces": targets
        }
    })
}

/// Create an OperatorGroupList JSON fixture
pub fn operator_group_list_json(items: &[serde_json::Value]) -> String {
    serde_json::json!({
        "apiVersion": "operators.coreos.com/v1",
        "kind": "OperatorGroupList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

/// Create a CatalogSource JSON fixture
pub fn catalog_source_json(name: &str, namespace: &str, state: Option<&str>) -> String {
    let mut value = serde_json::json!({
        "apiVersion": "operators.coreos.com/v1alpha1",
        "kind": "CatalogSource",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": { "sourceType": "grpc", "address": "127.0.0.1:50051" }
    });
    if let Some(state) = state {
        value["status"] = serde_json::json!({
            "connectionState": { "lastObservedState": state }
        });
    }
    value.to_string()
}

/// Create a Subscription JSON fixture, optionally referencing an install plan
pub fn subscription_json(
    name: &str,
    namespace: &str,
    package: &str,
    install_plan: Option<&str>,
) -> String {
    let mut value = serde_json::json!({
        "apiVersion": "operators.coreos.com/v1alpha1",
        "kind": "Subscription",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": {
            "source": "test-catalog",
            "sourceNamespace": namespace,
            "name": package,
            "channel": "stable",
            "installPlanApproval": "Manual"
        }
    });
    if let Some(plan) = install_plan {
        value["status"] = serde_json::json!({
            "installPlanRef": { "name": plan, "namespace": namespace }
        });
    }
    value.to_string()
}

/// Create an InstallPlan JSON fixture
pub fn install_plan_json(name: &str, namespace: &str, approved: bool, rv: &str) -> String {
    serde_json::json!({
        "apiVersion": "operators.coreos.com/v1alpha1",
        "kind": "InstallPlan",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": rv },
        "spec": { "approval": "Manual", "approved": approved }
    })
    .to_string()
}

/// Create a ClusterServiceVersion JSON fixture with the given phase
pub fn csv_json(name: &str, namespace: &str, phase: Option<&str>) -> String {
    let mut value = serde_json::json!({
        "apiVersion": "operators.coreos.com/v1alpha1",
        "kind": "ClusterServiceVersion",
        "metadata": { "name": name, "namespace": namespace, "resourceVersion": "1" },
        "spec": {}
    });
    if let Some(phase) = phase {
        value["status"] = serde_json::json!({ "phase": phase });
    }
    value.to_string()
}

/// Create a 409 conflict response body
pub fn conflict_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("Operation cannot be fulfilled on {} \"{}\": the object has been modified", resource, name),
        "reason": "Conflict",
        "code": 409
    })
    .to_string()
}

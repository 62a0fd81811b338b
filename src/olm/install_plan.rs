// SPDX-License-Identifier: Apache-2.0

//! Install plan discovery and approval.

use crate::config::Configuration;
use crate::constants::{approve, poll};
use crate::error::{InstallerError, Result};
use crate::kubernetes::{poll_until, post_params, retry_on_conflict};
use crate::types::olm::{InstallPlan, InstallPlanReference, Subscription};
use kube::Api;
use std::time::Duration;
use tracing::{debug, info};

pub struct InstallPlanApprover {
    cfg: Configuration,
}

impl InstallPlanApprover {
    pub fn new(cfg: &Configuration) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Poll the subscription until OLM has generated an install plan for it,
    /// returning the plan reference.
    pub async fn wait_for_install_plan(
        &self,
        subscription_name: &str,
        deadline: Duration,
    ) -> Result<InstallPlanReference> {
        let api: Api<Subscription> = Api::namespaced(self.cfg.client.clone(), &self.cfg.namespace);
        let what = format!(
            "install plan is not available for the subscription {}",
            subscription_name
        );

        poll_until(poll::INTERVAL, deadline, &what, || {
            let api = api.clone();
            let name = subscription_name.to_string();
            async move {
                let sub = api.get(&name).await?;
                Ok(sub.status.and_then(|s| s.install_plan_ref).is_some())
            }
        })
        .await?;

        let sub = api.get(subscription_name).await?;
        let ip_ref = sub
            .status
            .and_then(|s| s.install_plan_ref)
            .ok_or_else(|| InstallerError::NotReady(what))?;
        debug!(
            "Subscription {} references InstallPlan {}/{}",
            subscription_name, ip_ref.namespace, ip_ref.name
        );
        Ok(ip_ref)
    }

    /// Flip the plan's approval flag. OLM's catalog operator updates the plan
    /// concurrently, so the read-modify-write is retried on version conflict.
    pub async fn approve(&self, ip_ref: &InstallPlanReference) -> Result<()> {
        let api: Api<InstallPlan> = Api::namespaced(self.cfg.client.clone(), &ip_ref.namespace);
        let name = ip_ref.name.clone();

        retry_on_conflict(approve::MAX_ATTEMPTS, approve::BASE_BACKOFF, || {
            let api = api.clone();
            let name = name.clone();
            async move {
                let mut plan = api.get(&name).await?;
                plan.spec.approved = true;
                api.replace(&name, &post_params(), &plan).await?;
                Ok(())
            }
        })
        .await?;

        info!("Approved InstallPlan {}", ip_ref.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstallerError;
    use crate::test_utils::{conflict_json, install_plan_json, subscription_json, MockService};

    const SUB_PATH: &str =
        "/apis/operators.coreos.com/v1alpha1/namespaces/testns/subscriptions/my-op-sub";
    const IP_PATH: &str =
        "/apis/operators.coreos.com/v1alpha1/namespaces/testns/installplans/install-plan-1";

    fn config(mock: &MockService) -> Configuration {
        Configuration::new(mock.clone().into_client(), "testns")
    }

    fn plan_ref() -> InstallPlanReference {
        InstallPlanReference {
            name: "install-plan-1".to_string(),
            namespace: "testns".to_string(),
        }
    }

    #[tokio::test]
    async fn test_wait_for_install_plan_once_referenced() {
        let mock = MockService::new().on_get_seq(
            SUB_PATH,
            &[
                (200, &subscription_json("my-op-sub", "testns", "my-op", None)),
                (
                    200,
                    &subscription_json("my-op-sub", "testns", "my-op", Some("install-plan-1")),
                ),
            ],
        );
        let approver = InstallPlanApprover::new(&config(&mock));

        let ip_ref = approver
            .wait_for_install_plan("my-op-sub", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(ip_ref.name, "install-plan-1");
        assert_eq!(ip_ref.namespace, "testns");
    }

    #[tokio::test]
    async fn test_wait_for_install_plan_deadline_exceeded() {
        let mock = MockService::new().on_get(
            SUB_PATH,
            200,
            &subscription_json("my-op-sub", "testns", "my-op", None),
        );
        let approver = InstallPlanApprover::new(&config(&mock));

        let err = approver
            .wait_for_install_plan("my-op-sub", Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::NotReady(_)));
        // No approval may have been attempted.
        assert!(mock.requests().iter().all(|r| r.method != "PUT"));
    }

    #[tokio::test]
    async fn test_wait_for_install_plan_remote_error_passes_through() {
        let mock = MockService::new().on_get(
            SUB_PATH,
            500,
            r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"boom","reason":"InternalError","code":500}"#,
        );
        let approver = InstallPlanApprover::new(&config(&mock));

        let err = approver
            .wait_for_install_plan("my-op-sub", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallerError::Api(_)));
    }

    #[tokio::test]
    async fn test_approve_sets_approved_flag() {
        let mock = MockService::new()
            .on_get(IP_PATH, 200, &install_plan_json("install-plan-1", "testns", false, "1"))
            .on_put(IP_PATH, 200, &install_plan_json("install-plan-1", "testns", true, "2"));
        let approver = InstallPlanApprover::new(&config(&mock));

        approver.approve(&plan_ref()).await.unwrap();

        let puts: Vec<_> = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .collect();
        assert_eq!(puts.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&puts[0].body).unwrap();
        assert_eq!(body["spec"]["approved"], true);
    }

    #[tokio::test]
    async fn test_approve_retries_on_version_conflict() {
        let mock = MockService::new()
            .on_get(IP_PATH, 200, &install_plan_json("install-plan-1", "testns", false, "1"))
            .on_put_seq(
                IP_PATH,
                &[
                    (409, &conflict_json("installplans", "install-plan-1")),
                    (409, &conflict_json("installplans", "install-plan-1")),
                    (200, &install_plan_json("install-plan-1", "testns", true, "4")),
                ],
            );
        let approver = InstallPlanApprover::new(&config(&mock));

        approver.approve(&plan_ref()).await.unwrap();

        let puts = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .count();
        assert_eq!(puts, 3);
    }

    #[tokio::test]
    async fn test_approve_surfaces_conflict_after_retry_budget() {
        let mock = MockService::new()
            .on_get(IP_PATH, 200, &install_plan_json("install-plan-1", "testns", false, "1"))
            .on_put(IP_PATH, 409, &conflict_json("installplans", "install-plan-1"));
        let approver = InstallPlanApprover::new(&config(&mock));

        let err = approver.approve(&plan_ref()).await.unwrap_err();
        assert!(err.is_conflict());

        let puts = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .count();
        assert_eq!(puts as u32, approve::MAX_ATTEMPTS);
    }
}

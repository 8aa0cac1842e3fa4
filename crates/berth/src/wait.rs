use tracing::{debug, instrument};

use fluvio_future::timer::sleep;
use tokio::select;

use crate::client::WorkloadClient;
use crate::config::DeployConfig;
use crate::deploy::ReconcileOutcome;
use crate::error::DeployError;
use crate::progress::{DeployProgressMessage, ProgressRenderedText, ProgressRenderer};
use crate::selector::selector_from_labels;

const RUNNING_PHASE: &str = "Running";

/// Polls pods matching the outcome's label set until the readiness predicate
/// holds, a list call fails, or the configured deadline expires.
///
/// Ticks are strictly sequential: each list call completes before the next
/// tick's delay starts. Progress is reported once per tick.
#[instrument(skip(client, config, outcome, pb), fields(expected = outcome.expected_pods))]
pub(crate) async fn wait_for_pods(
    client: &dyn WorkloadClient,
    config: &DeployConfig,
    outcome: &ReconcileOutcome,
    pb: &ProgressRenderer,
) -> Result<(), DeployError> {
    let selector = selector_from_labels(&outcome.labels)?;
    debug!(%selector, namespace = %outcome.namespace, "waiting for pods");

    let mut deadline = config
        .ready_timeout()
        .map(|limit| (limit, sleep(limit)));

    loop {
        // pods are listed where the resource actually landed, which may not
        // be the configured namespace when the manifest names its own
        let pods = client
            .list_pods(&outcome.namespace, &selector)
            .await
            .map_err(DeployError::PodList)?;

        let total = pods.len();
        let running = pods
            .iter()
            .filter(|pod| pod.status.phase == RUNNING_PHASE)
            .count();

        debug!(running, total, "poll tick");
        pb.set_message(DeployProgressMessage::WaitingForPods { running, total }.msg());

        if is_ready(running, total, outcome.expected_pods) {
            return Ok(());
        }

        match deadline.as_mut() {
            Some((limit, timer)) => {
                select! {
                    _ = timer => return Err(DeployError::ReadyTimeout(*limit)),
                    _ = sleep(config.poll_interval()) => {}
                }
            }
            None => sleep(config.poll_interval()).await,
        }
    }
}

/// Ready means: at least one pod running, every observed pod running, and
/// exactly as many observed as expected. "Some running" would ignore
/// stragglers; "total equals expected" alone would ignore partial startup.
fn is_ready(running: usize, total: usize, expected: i32) -> bool {
    running > 0 && running == total && running as i32 == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_predicate() {
        // nothing observed yet
        assert!(!is_ready(0, 0, 3));
        // partial startup
        assert!(!is_ready(2, 3, 3));
        // more pods running than expected
        assert!(!is_ready(3, 3, 2));
        // converged
        assert!(is_ready(3, 3, 3));
    }

    #[test]
    fn test_zero_expected_never_ready() {
        assert!(!is_ready(0, 0, 0));
    }
}

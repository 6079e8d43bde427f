//! Traffic driver against a live service.

use std::time::{Duration, Instant};

use book_service::lifecycle::Shutdown;
use book_service::simulator::{run_plan, DelayRange, Operation, ScenarioPlan, ServiceClient};

mod common;

#[tokio::test]
async fn test_burst_issues_every_request() {
    let service = common::start_service(common::test_config()).await;
    let client = ServiceClient::new(service.url()).unwrap();
    assert!(client.check_connection().await);

    let mut plan = ScenarioPlan::burst();
    plan.workers = 4;
    plan.ops_per_worker = Some(5);
    plan.delay = DelayRange::between_millis(0, 10);

    let report = run_plan(&client, &plan, &Shutdown::new()).await;
    assert_eq!(report.total, 20);
    assert_eq!(report.failures(), 0, "{}", report);
    assert!(!report.cancelled);

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_every_operation_is_classified_expected() {
    let service = common::start_service(common::test_config()).await;
    let client = ServiceClient::new(service.url()).unwrap();

    let operations = [
        Operation::Home,
        Operation::Success,
        Operation::BadRequest,
        Operation::Error,
        Operation::Slow,
        Operation::GenerateError,
        Operation::Random,
        Operation::AddBook,
        Operation::GetBook { max_id: 5 },
        Operation::Health,
    ];
    for operation in operations {
        let probe = client.execute(operation).await.unwrap();
        assert!(probe.expected, "{} returned {}", operation, probe.status);
    }

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_cancels_scenario() {
    let service = common::start_service(common::test_config()).await;
    let client = ServiceClient::new(service.url()).unwrap();

    let mut plan = ScenarioPlan::sustained();
    plan.mix = vec![Operation::Success];
    plan.delay = DelayRange::fixed(Duration::from_secs(30));

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.trigger();
    });

    let start = Instant::now();
    let report = run_plan(&client, &plan, &shutdown).await;
    assert!(report.cancelled);
    assert_eq!(report.total, 1);
    assert!(start.elapsed() < Duration::from_secs(10));

    service.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_before_scenario_is_not_lost() {
    let service = common::start_service(common::test_config()).await;
    let client = ServiceClient::new(service.url()).unwrap();

    // Fired between scenarios, while no worker is listening yet.
    let shutdown = Shutdown::new();
    shutdown.trigger();

    let start = Instant::now();
    let report = run_plan(&client, &ScenarioPlan::sustained(), &shutdown).await;
    assert!(report.cancelled);
    assert_eq!(report.total, 0);
    assert!(start.elapsed() < Duration::from_secs(5));

    service.shutdown.trigger();
}

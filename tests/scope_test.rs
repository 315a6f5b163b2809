mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakePortal, cv, station};
use rotation_desk::error::AppError;
use rotation_desk::models::CvView;
use rotation_desk::scope::ViewScope;
use rotation_desk::services::CatalogLoader;

#[tokio::test]
async fn test_scope_passes_result_through() {
    let scope = ViewScope::new();
    let value = scope.run(async { Ok::<_, AppError>(7) }).await.expect("runs");
    assert_eq!(value, 7);
}

#[tokio::test]
async fn test_cancelled_scope_drops_work() {
    let scope = ViewScope::new();
    scope.cancel();
    assert!(scope.is_cancelled());

    let result = scope
        .run(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, AppError>(())
        })
        .await;
    assert!(matches!(result, Err(AppError::Cancelled)));
}

#[tokio::test]
async fn test_dropping_scope_cancels_in_flight_request() {
    let scope = ViewScope::new();
    let token = scope.token();

    let task = tokio::spawn(token.run(async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, AppError>(())
    }));

    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(scope);

    let result = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("finishes promptly")
        .expect("join");
    assert!(matches!(result, Err(AppError::Cancelled)));
}

#[tokio::test]
async fn test_load_in_live_scope() {
    let portal = Arc::new(FakePortal::new(
        vec![station("lab", 4)],
        vec![cv("c1", "John Doe", "111", vec![])],
    ));
    let loader = CatalogLoader::new(portal.clone());
    let scope = ViewScope::new();

    let snapshot = loader.load_in(scope.token(), CvView::Pending).await.expect("load");
    assert_eq!(snapshot.stations.len(), 1);
    assert_eq!(snapshot.cvs.len(), 1);
    assert_eq!(snapshot.view, CvView::Pending);
    assert!(snapshot.station("lab").is_some());

    scope.cancel();
    let err = loader
        .load_in(scope.token(), CvView::All)
        .await
        .expect_err("cancelled");
    assert!(matches!(err, AppError::Cancelled));
}

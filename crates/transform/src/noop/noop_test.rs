//! Tests for NoopFilter

use super::*;
use ferry_pipeline::test_utils::TestContext;
use ferry_pipeline::{PluginConfig, PluginKind};

#[test]
fn test_noop_passes_through() {
    let filter = NoopFilter::new();
    let item = Bytes::from_static(b"GET /health 200");
    assert_eq!(filter.apply(item.clone()), Ok(item));
}

#[test]
fn test_noop_keeps_empty_items() {
    let filter = NoopFilter::new();
    assert_eq!(filter.apply(Bytes::new()), Ok(Bytes::new()));
}

#[tokio::test]
async fn test_noop_bind_ignores_options() {
    let harness = TestContext::new(
        PluginKind::Filter,
        PluginConfig::new(NAME).with_option("anything", true),
    );
    assert!(NoopFilter::new().bind(&harness.ctx).await.is_ok());
}

use std::sync::Arc;

use chrono::Duration;
use counter_core::{
    ChannelHostBridge, CounterWidget, ManualClock, WidgetCommand, WidgetOptions,
};
use shared::{
    domain::{SlotIndex, WidgetVariant},
    protocol::HostMessage,
};
use storage::Storage;

#[tokio::test]
async fn tally_session_survives_a_reload() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let database_url = format!(
        "sqlite://{}",
        temp_root
            .path()
            .join("widget.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let clock = Arc::new(ManualClock::default());

    {
        let storage = Storage::new(&database_url).await.expect("db");
        let (bridge, mut host_rx) = ChannelHostBridge::new();
        let mut widget = CounterWidget::initialize(
            WidgetOptions::new(WidgetVariant::Koyaku),
            Arc::new(storage),
            Arc::new(bridge),
            clock.clone(),
        )
        .await;
        widget.mark_ready().await;

        for _ in 0..3 {
            widget.dispatch(WidgetCommand::Tap { slot: SlotIndex(0) }).await;
        }
        widget.dispatch(WidgetCommand::Reset).await;
        assert_eq!(widget.counters().total(), 0);

        clock.advance(Duration::seconds(3));
        widget.dispatch(WidgetCommand::Undo).await;
        assert_eq!(widget.counters().primary(), 3);

        widget
            .dispatch(WidgetCommand::Input {
                slot: SlotIndex(1),
                raw: "5.7".to_string(),
            })
            .await;
        widget.dispatch(WidgetCommand::Undo).await;
        assert_eq!(widget.counters().values(), vec![3, 5, 0, 0, 0, 0, 0]);

        let mut last_counts = None;
        while let Ok(message) = host_rx.try_recv() {
            if let HostMessage::ValueChanged(payload) = message {
                last_counts = Some(payload.counts);
            }
        }
        assert_eq!(last_counts, Some(vec![3, 5, 0, 0, 0, 0, 0]));
        widget.shutdown();
    }

    let storage = Storage::new(&database_url).await.expect("reopen db");
    let (bridge, _host_rx) = ChannelHostBridge::new();
    let widget = CounterWidget::initialize(
        WidgetOptions::new(WidgetVariant::Koyaku),
        Arc::new(storage),
        Arc::new(bridge),
        clock,
    )
    .await;
    assert_eq!(widget.counters().values(), vec![3, 5, 0, 0, 0, 0, 0]);
    assert!(widget.pending_undo().is_none());
}

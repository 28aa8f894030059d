//! Slot layouts for the two widget variants.

use shared::domain::{SlotSpec, WidgetVariant};

pub fn koyaku_slots() -> Vec<SlotSpec> {
    vec![
        SlotSpec::new("bell", "ベル", "#F2C94C", "#3B2F00"),
        SlotSpec::new("cherry", "チェリー", "#EB5757", "#FFFFFF"),
        SlotSpec::new("watermelon", "スイカ", "#27AE60", "#FFFFFF"),
        SlotSpec::new("replay", "リプレイ", "#2F80ED", "#FFFFFF"),
        SlotSpec::new("chance", "チャンス目", "#9B51E0", "#FFFFFF"),
        SlotSpec::new("strong_cherry", "強チェリー", "#B71C1C", "#FFFFFF").extra(),
        SlotSpec::new("strong_watermelon", "強スイカ", "#1B5E20", "#FFFFFF").extra(),
    ]
}

pub fn swipe_slots() -> Vec<SlotSpec> {
    vec![SlotSpec::new("count", "カウント", "#2F80ED", "#FFFFFF")]
}

pub fn slots_for(variant: WidgetVariant) -> Vec<SlotSpec> {
    match variant {
        WidgetVariant::Koyaku => koyaku_slots(),
        WidgetVariant::Swipe => swipe_slots(),
    }
}

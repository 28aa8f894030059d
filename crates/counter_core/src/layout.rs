use serde::{Deserialize, Serialize};
use shared::domain::WidgetVariant;

/// Pixel metrics used to estimate the frame height requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLayout {
    /// Header, total line and action buttons.
    pub chrome_px: u32,
    pub row_px: u32,
    pub columns: u32,
    pub caption_px: u32,
    /// Height of the swipe surface in the single-value variant.
    pub surface_px: u32,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            chrome_px: 96,
            row_px: 88,
            columns: 3,
            caption_px: 24,
            surface_px: 220,
        }
    }
}

impl FrameLayout {
    pub fn height_for(&self, variant: WidgetVariant, visible_slots: usize, has_caption: bool) -> u32 {
        let caption = if has_caption { self.caption_px } else { 0 };
        let body = match variant {
            WidgetVariant::Swipe => self.surface_px,
            WidgetVariant::Koyaku => {
                let visible = u32::try_from(visible_slots).unwrap_or(u32::MAX);
                let rows = visible.div_ceil(self.columns.max(1));
                rows.saturating_mul(self.row_px)
            }
        };
        self.chrome_px.saturating_add(body).saturating_add(caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn koyaku_height_grows_by_row() {
        let layout = FrameLayout::default();
        assert_eq!(layout.height_for(WidgetVariant::Koyaku, 5, false), 96 + 2 * 88);
        assert_eq!(layout.height_for(WidgetVariant::Koyaku, 7, false), 96 + 3 * 88);
        assert_eq!(layout.height_for(WidgetVariant::Koyaku, 6, true), 96 + 2 * 88 + 24);
    }

    #[test]
    fn swipe_height_ignores_slot_count() {
        let layout = FrameLayout::default();
        assert_eq!(layout.height_for(WidgetVariant::Swipe, 1, false), 96 + 220);
    }

    #[test]
    fn zero_columns_does_not_divide_by_zero() {
        let layout = FrameLayout {
            columns: 0,
            ..FrameLayout::default()
        };
        assert_eq!(layout.height_for(WidgetVariant::Koyaku, 2, false), 96 + 2 * 88);
    }
}

//! Ordered panorama list with a single active entry.

use serde::Serialize;

use crate::error::{Result, ViewerError};
use crate::panorama::{PanoramaId, PanoramaRecord};

/// Gallery state. When non-empty, exactly one entry is active once the first
/// panorama has been displayed.
#[derive(Debug, Default)]
pub struct Gallery {
    records: Vec<PanoramaRecord>,
    active: Option<PanoramaId>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PanoramaRecord] {
        &self.records
    }

    pub fn get(&self, id: &PanoramaId) -> Option<&PanoramaRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, id: &PanoramaId) -> bool {
        self.get(id).is_some()
    }

    pub fn first(&self) -> Option<&PanoramaRecord> {
        self.records.first()
    }

    /// Append a record at the end.
    pub fn push(&mut self, record: PanoramaRecord) {
        self.records.push(record);
    }

    pub fn active_id(&self) -> Option<&PanoramaId> {
        self.active.as_ref()
    }

    pub fn active(&self) -> Option<&PanoramaRecord> {
        self.active.as_ref().and_then(|id| self.get(id))
    }

    /// Mark `id` as the single active entry.
    pub fn set_active(&mut self, id: &PanoramaId) -> Result<()> {
        if !self.contains(id) {
            return Err(ViewerError::UnknownPanorama(id.to_string()));
        }
        self.active = Some(id.clone());
        Ok(())
    }

    /// Number of entries marked active (0 or 1).
    pub fn active_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| Some(&r.id) == self.active.as_ref())
            .count()
    }

    /// Delete a user entry.
    ///
    /// Presets are refused. Returns whether the deleted entry was active; in
    /// that case nothing is active until a replacement has been displayed.
    pub fn remove(&mut self, id: &PanoramaId) -> Result<bool> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| ViewerError::UnknownPanorama(id.to_string()))?;

        if !self.records[index].is_deletable() {
            return Err(ViewerError::PresetProtected(id.to_string()));
        }

        self.records.remove(index);

        let was_active = self.active.as_ref() == Some(id);
        if was_active {
            self.active = None;
        }
        Ok(was_active)
    }

    /// Entry after `id`, wrapping around.
    pub fn next_after(&self, id: &PanoramaId) -> Option<&PanoramaRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        self.records.get((index + 1) % self.records.len())
    }

    /// Entry before `id`, wrapping around.
    pub fn prev_before(&self, id: &PanoramaId) -> Option<&PanoramaRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        let prev = if index == 0 {
            self.records.len() - 1
        } else {
            index - 1
        };
        self.records.get(prev)
    }

    /// Counter text shown above the gallery.
    pub fn counter_label(&self) -> String {
        counter_label(self.records.len())
    }

    /// Serializable view of every entry, in order.
    pub fn entries(&self) -> Vec<GalleryEntry> {
        self.records
            .iter()
            .map(|r| GalleryEntry {
                id: r.id.to_string(),
                name: r.name.clone(),
                dimensions: r.dimensions_label().to_string(),
                origin_label: r.origin.label(),
                deletable: r.is_deletable(),
                active: Some(&r.id) == self.active.as_ref(),
                size: r.size,
            })
            .collect()
    }
}

/// `"1 изображение"` for one, `"{n} изображений"` otherwise.
pub fn counter_label(count: usize) -> String {
    if count == 1 {
        "1 изображение".to_string()
    } else {
        format!("{} изображений", count)
    }
}

/// One gallery card as exposed to the hosting page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryEntry {
    pub id: String,
    pub name: String,
    pub dimensions: String,
    pub origin_label: &'static str,
    pub deletable: bool,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panorama::{ImageSource, Origin, preset_panoramas};
    use std::sync::Arc;

    fn user_record(id: &str) -> PanoramaRecord {
        PanoramaRecord {
            id: PanoramaId::new(id),
            name: format!("{}.jpg", id),
            source: ImageSource::Embedded(Arc::from(vec![0u8; 4])),
            origin: Origin::User,
            size: Some(4),
            dimensions: Some("2 × 1".to_string()),
        }
    }

    fn gallery_with_presets() -> Gallery {
        let mut gallery = Gallery::new();
        for record in preset_panoramas("panoramas") {
            gallery.push(record);
        }
        gallery
    }

    #[test]
    fn test_counter_label() {
        assert_eq!(counter_label(0), "0 изображений");
        assert_eq!(counter_label(1), "1 изображение");
        assert_eq!(counter_label(6), "6 изображений");
        assert_eq!(gallery_with_presets().counter_label(), "6 изображений");
    }

    #[test]
    fn test_set_active_unknown() {
        let mut gallery = gallery_with_presets();
        let err = gallery.set_active(&PanoramaId::new("nope")).unwrap_err();
        assert_eq!(err, ViewerError::UnknownPanorama("nope".into()));
        assert!(gallery.active_id().is_none());
    }

    #[test]
    fn test_single_active() {
        let mut gallery = gallery_with_presets();
        gallery.set_active(&PanoramaId::new("p2")).unwrap();
        gallery.set_active(&PanoramaId::new("p4")).unwrap();
        assert_eq!(gallery.active_count(), 1);
        assert_eq!(gallery.active().unwrap().name, "Панорама 4");
    }

    #[test]
    fn test_presets_not_deletable() {
        let mut gallery = gallery_with_presets();
        let err = gallery.remove(&PanoramaId::new("p1")).unwrap_err();
        assert_eq!(err, ViewerError::PresetProtected("p1".into()));
        assert_eq!(gallery.len(), 6);
    }

    #[test]
    fn test_remove_active_leaves_nothing_active() {
        let mut gallery = gallery_with_presets();
        gallery.push(user_record("user-1"));
        gallery.set_active(&PanoramaId::new("user-1")).unwrap();

        assert!(gallery.remove(&PanoramaId::new("user-1")).unwrap());
        assert_eq!(gallery.active_id(), None);
        assert_eq!(gallery.active_count(), 0);
        assert_eq!(gallery.len(), 6);
    }

    #[test]
    fn test_remove_inactive_keeps_active() {
        let mut gallery = gallery_with_presets();
        gallery.push(user_record("user-1"));
        gallery.push(user_record("user-2"));
        gallery.set_active(&PanoramaId::new("user-2")).unwrap();

        assert!(!gallery.remove(&PanoramaId::new("user-1")).unwrap());
        assert_eq!(gallery.active_id(), Some(&PanoramaId::new("user-2")));
    }

    #[test]
    fn test_remove_last_entry_leaves_none_active() {
        let mut gallery = Gallery::new();
        gallery.push(user_record("user-1"));
        gallery.set_active(&PanoramaId::new("user-1")).unwrap();

        assert!(gallery.remove(&PanoramaId::new("user-1")).unwrap());
        assert!(gallery.is_empty());
        assert_eq!(gallery.active_count(), 0);
    }

    #[test]
    fn test_navigation_wraps() {
        let gallery = gallery_with_presets();
        let p1 = PanoramaId::new("p1");
        let p6 = PanoramaId::new("p6");
        assert_eq!(gallery.next_after(&p6).unwrap().id, p1);
        assert_eq!(gallery.prev_before(&p1).unwrap().id, p6);
        assert!(gallery.next_after(&PanoramaId::new("missing")).is_none());
    }

    #[test]
    fn test_entries_snapshot() {
        let mut gallery = gallery_with_presets();
        gallery.push(user_record("user-1"));
        gallery.set_active(&PanoramaId::new("p1")).unwrap();

        let entries = gallery.entries();
        assert_eq!(entries.len(), 7);
        assert!(entries[0].active);
        assert_eq!(entries[0].origin_label, "Демо");
        assert_eq!(entries[0].dimensions, "N/A");
        assert!(!entries[0].deletable);
        assert_eq!(entries[6].origin_label, "Загружено");
        assert!(entries[6].deletable);

        let json = serde_json::to_string(&entries[0]).unwrap();
        assert!(!json.contains("size"));
    }
}

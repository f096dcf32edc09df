use tracing::trace;

use crate::layer::LayerId;
use crate::map::{HandlerId, MapError, MapEvent, MapHandle, ScreenPoint};
use crate::query::PropertyFilter;
use crate::symbology::{THICK_LINE_WEIGHT, THIN_LINE_WEIGHT};

/// Property that identifies a tract across layers.
pub const HOVER_KEY: &str = "GEOID";

/// Thickens the outline of the parent-layer feature under the cursor.
#[derive(Debug)]
pub struct HoverHighlight {
    layer: LayerId,
    handlers: Option<(HandlerId, HandlerId)>,
    hovered: Option<String>,
}

impl HoverHighlight {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            handlers: None,
            hovered: None,
        }
    }

    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn is_attached(&self) -> bool {
        self.handlers.is_some()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Registers mouse handlers on the parent layer. Idempotent.
    pub fn attach(&mut self, map: &mut dyn MapHandle) -> Result<(), MapError> {
        if self.handlers.is_some() {
            return Ok(());
        }
        let moved = HandlerId::fresh();
        let left = HandlerId::fresh();
        map.on(MapEvent::MouseMove, &self.layer, moved)?;
        if let Err(err) = map.on(MapEvent::MouseLeave, &self.layer, left) {
            map.off(MapEvent::MouseMove, &self.layer, moved);
            return Err(err);
        }
        self.handlers = Some((moved, left));
        Ok(())
    }

    /// Unregisters exactly the handlers `attach` installed.
    pub fn detach(&mut self, map: &mut dyn MapHandle) {
        if let Some((moved, left)) = self.handlers.take() {
            map.off(MapEvent::MouseMove, &self.layer, moved);
            map.off(MapEvent::MouseLeave, &self.layer, left);
        }
        self.hovered = None;
    }

    pub fn handle(
        &mut self,
        map: &mut dyn MapHandle,
        event: MapEvent,
        point: ScreenPoint,
    ) -> Result<(), MapError> {
        if !self.is_attached() || !map.is_ready() {
            return Ok(());
        }
        match event {
            MapEvent::MouseMove => {
                let hit = map
                    .query_rendered_features(point, std::slice::from_ref(&self.layer))
                    .into_iter()
                    .find_map(|f| f.property(HOVER_KEY).map(str::to_string));
                match hit {
                    Some(key) if self.hovered.as_deref() != Some(&key) => {
                        trace!(layer = %self.layer, key = %key, "hover");
                        let filter = PropertyFilter::eq(HOVER_KEY, key.clone());
                        map.set_line_width(&self.layer, Some(&filter), THICK_LINE_WEIGHT)?;
                        self.hovered = Some(key);
                    }
                    Some(_) => {}
                    None => self.clear(map)?,
                }
            }
            MapEvent::MouseLeave => self.clear(map)?,
            MapEvent::Click => {}
        }
        Ok(())
    }

    fn clear(&mut self, map: &mut dyn MapHandle) -> Result<(), MapError> {
        if self.hovered.take().is_some() {
            map.set_line_width(&self.layer, None, THIN_LINE_WEIGHT)?;
        }
        Ok(())
    }
}

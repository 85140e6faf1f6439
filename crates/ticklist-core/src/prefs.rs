use ticklist_shared::{ThemeColor, ThemeMode};
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::persistence::KeyValueStore;

pub const THEME_KEY: &str = "theme";
pub const COLOR_KEY: &str = "themeColor";

/// Display preferences, loaded once at startup and written back on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub theme: ThemeMode,
    pub color: ThemeColor,
}

impl Preferences {
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let read = |key: &str| match storage.get(key) {
            Ok(value) => value,
            Err(error) => {
                warn!(key, %error, "failed reading preference; using default");
                None
            }
        };

        let prefs = Self {
            theme: ThemeMode::from_storage(read(THEME_KEY).as_deref()),
            color: ThemeColor::from_storage(read(COLOR_KEY).as_deref()),
        };
        debug!(?prefs, "preferences loaded");
        prefs
    }

    pub fn set_theme(
        &mut self,
        storage: &dyn KeyValueStore,
        theme: ThemeMode,
    ) -> Result<(), PersistenceError> {
        storage.set(THEME_KEY, theme.storage_value())?;
        self.theme = theme;
        Ok(())
    }

    pub fn set_color(
        &mut self,
        storage: &dyn KeyValueStore,
        color: ThemeColor,
    ) -> Result<(), PersistenceError> {
        storage.set(COLOR_KEY, color.storage_value())?;
        self.color = color;
        Ok(())
    }
}

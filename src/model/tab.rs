use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(u64);

/// A named, iconified reference to a navigable path. Tabs are value objects:
/// moving one between panes moves the value, it is never shared by reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub path: String,
    pub title: String,
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabDisplay {
    pub title: String,
    pub icon: String,
}

/// Maps a path to its display data. Owned by the presentation layer; must be
/// deterministic for a given path.
pub trait PathDisplay {
    fn display(&self, path: &str) -> TabDisplay;
}

/// Fallback resolver: title from the last path segment, icon from the leading
/// one.
#[derive(Default)]
pub struct DefaultPathDisplay;

impl PathDisplay for DefaultPathDisplay {
    fn display(&self, path: &str) -> TabDisplay {
        let trimmed = path.trim_matches('/');
        let title = trimmed.rsplit('/').next().filter(|s| !s.is_empty());
        let icon = trimmed.split('/').next().filter(|s| !s.is_empty());
        TabDisplay {
            title: title.unwrap_or("untitled").to_owned(),
            icon: icon.unwrap_or("page").to_owned(),
        }
    }
}

/// Builds tabs from paths. Owns the id counter so tab ids stay unique for the
/// lifetime of the workspace.
#[derive(Serialize, Deserialize)]
pub struct TabFactory {
    next_id: u64,
    #[serde(skip)]
    display: Box<dyn PathDisplay>,
}

impl Default for Box<dyn PathDisplay> {
    fn default() -> Self {
        Box::new(DefaultPathDisplay)
    }
}

impl Default for TabFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl TabFactory {
    pub fn new() -> Self {
        Self::with_display(Box::new(DefaultPathDisplay))
    }

    pub fn with_display(display: Box<dyn PathDisplay>) -> Self {
        TabFactory { next_id: 0, display }
    }

    pub fn make(&mut self, path: &str) -> Tab {
        let id = TabId(self.next_id);
        self.next_id += 1;
        let TabDisplay { title, icon } = self.display.display(path);
        Tab {
            id,
            path: path.to_owned(),
            title,
            icon,
        }
    }

    /// Points an existing tab at a new path, refreshing its derived display
    /// data. The tab keeps its id.
    pub fn relocate(&self, tab: &mut Tab, path: &str) {
        let TabDisplay { title, icon } = self.display.display(path);
        tab.path = path.to_owned();
        tab.title = title;
        tab.icon = icon;
    }
}
